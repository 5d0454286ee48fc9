//! Message transports.
//!
//! Inbound messages are any `Stream` of decoded messages; outbound messages
//! go through a [`MessageSink`]. Line-delimited JSON adapters cover sockets,
//! pipes and files.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;

use crate::error::TransportError;

/// Destination for outbound session messages.
#[async_trait]
pub trait MessageSink<M: Send + 'static>: Send {
    async fn send(&mut self, message: M) -> Result<(), TransportError>;
}

#[async_trait]
impl<M: Send + 'static> MessageSink<M> for mpsc::Sender<M> {
    async fn send(&mut self, message: M) -> Result<(), TransportError> {
        mpsc::Sender::send(self, message)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl<M: Send + 'static> MessageSink<M> for Vec<M> {
    async fn send(&mut self, message: M) -> Result<(), TransportError> {
        self.push(message);
        Ok(())
    }
}

/// Writes each message as one JSON line and flushes.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<M, W> MessageSink<M> for JsonLinesSink<W>
where
    M: Serialize + Send + 'static,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: M) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Decode one message per non-blank line of `reader`.
pub fn json_lines<R, M>(reader: R) -> BoxStream<'static, Result<M, TransportError>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    M: DeserializeOwned + Send + 'static,
{
    LinesStream::new(reader.lines())
        .filter(|line| {
            let blank = matches!(line, Ok(text) if text.trim().is_empty());
            futures::future::ready(!blank)
        })
        .map(|line: std::io::Result<String>| -> Result<M, TransportError> {
            let line = line?;
            Ok(serde_json::from_str(&line)?)
        })
        .boxed()
}
