//! Session controller.
//!
//! Drives one strategy through `AwaitingCreate -> Processing -> Finalizing
//! -> Closed`. Cancellation is observed between inbound messages and between
//! outbound chunks, and moves the session straight to finalizing, where the
//! state message is still written. Protocol and transport errors end the
//! session without finalizing.

use futures::{Stream, StreamExt};
use quant_core::traits::{Strategy, StrategyProvider};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::cancel::CancelToken;
use crate::context::{Phase, SessionContext, SessionLimits, SessionSummary};
use crate::debug::DebugCollector;
use crate::error::{SessionError, TransportError};
use crate::message::{
    BatchInput, BatchOutput, CreateRequest, SignalRecord, StreamInput, StreamOutput,
};
use crate::transport::MessageSink;

const FIRST_MESSAGE_ERROR: &str = "First message must be Create";
const REPEATED_CREATE_ERROR: &str = "Create is only allowed as the first message";

/// Runs sessions against strategies from a provider.
#[derive(Clone)]
pub struct SessionController {
    provider: Arc<dyn StrategyProvider>,
    limits: SessionLimits,
}

enum Next<M> {
    Message(M),
    End,
    Cancelled,
}

/// Wait for the next inbound message unless the session is cancelled first.
async fn next_message<I, M>(cancel: &CancelToken, inbound: &mut I) -> Result<Next<M>, SessionError>
where
    I: Stream<Item = Result<M, TransportError>> + Unpin,
{
    if cancel.is_cancelled() {
        return Ok(Next::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(Next::Cancelled),
        item = inbound.next() => match item {
            Some(Ok(message)) => Ok(Next::Message(message)),
            Some(Err(TransportError::Codec(err))) => {
                Err(SessionError::Protocol(format!("Unrecognized message: {err}")))
            }
            Some(Err(err)) => Err(err.into()),
            None => Ok(Next::End),
        },
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug_assert!(phase.can_advance_to(next), "{phase} -> {next}");
    debug!(from = %phase, to = %next, "session phase");
    *phase = next;
}

/// Strategy and accumulated output of a batched session.
struct BatchedRun {
    strategy: Box<dyn Strategy>,
    signals: Vec<SignalRecord>,
    debug: Option<DebugCollector>,
    summary: SessionSummary,
}

impl BatchedRun {
    fn new(strategy: Box<dyn Strategy>, request: &CreateRequest) -> Self {
        Self {
            strategy,
            signals: Vec::new(),
            debug: request.debug.then(DebugCollector::new),
            summary: SessionSummary::new(&request.name),
        }
    }

    fn apply(&mut self, message: BatchInput) -> Result<(), SessionError> {
        match message {
            BatchInput::Preload { candles } => {
                for candle in &candles {
                    self.strategy.preload(candle);
                }
                self.summary.preloaded += candles.len();
            }
            BatchInput::Update { candles } => {
                for candle in candles.iter().copied() {
                    if let Some(signal) = self.strategy.update(&candle) {
                        self.signals.push(SignalRecord::new(candle, signal));
                    }
                    if let Some(collector) = self.debug.as_mut() {
                        collector.record(&candle, self.strategy.debug(&candle));
                    }
                }
                self.summary.updated += candles.len();
            }
            BatchInput::Create(_) => {
                return Err(SessionError::Protocol(REPEATED_CREATE_ERROR.into()));
            }
        }
        Ok(())
    }
}

impl SessionController {
    pub fn new(provider: Arc<dyn StrategyProvider>, limits: SessionLimits) -> Self {
        Self { provider, limits }
    }

    pub fn provider(&self) -> &Arc<dyn StrategyProvider> {
        &self.provider
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Build the strategy named in `request`, restoring its state if given.
    fn open(&self, request: &CreateRequest) -> Result<Box<dyn Strategy>, SessionError> {
        let mut strategy = self.provider.create(&request.name, &request.config)?;
        if let Some(state) = request.resume_state() {
            strategy.restore(state).map_err(SessionError::Restore)?;
            debug!(strategy = %request.name, "restored strategy state");
        }
        Ok(strategy)
    }

    /// Run a batched session to completion.
    ///
    /// Errors before Create produce no outbound messages.
    pub async fn run_batched<I, O>(
        &self,
        ctx: &SessionContext,
        mut inbound: I,
        outbound: &mut O,
    ) -> Result<SessionSummary, SessionError>
    where
        I: Stream<Item = Result<BatchInput, TransportError>> + Unpin + Send,
        O: MessageSink<BatchOutput>,
    {
        let result = self
            .drive_batched(ctx, &mut inbound, outbound)
            .instrument(ctx.span.clone())
            .await;
        report(ctx, &result);
        result
    }

    async fn drive_batched<I, O>(
        &self,
        ctx: &SessionContext,
        inbound: &mut I,
        outbound: &mut O,
    ) -> Result<SessionSummary, SessionError>
    where
        I: Stream<Item = Result<BatchInput, TransportError>> + Unpin + Send,
        O: MessageSink<BatchOutput>,
    {
        let mut phase = Phase::AwaitingCreate;
        let request = match next_message(&ctx.cancel, inbound).await? {
            Next::Message(BatchInput::Create(request)) => request,
            Next::Message(_) | Next::End => {
                return Err(SessionError::Protocol(FIRST_MESSAGE_ERROR.into()))
            }
            Next::Cancelled => return Err(SessionError::Cancelled),
        };

        let strategy = info_span!("session.create", strategy = %request.name, debug = request.debug)
            .in_scope(|| self.open(&request))?;
        let mut run = BatchedRun::new(strategy, &request);
        advance(&mut phase, Phase::Processing);

        let cancelled = process_batched(&mut run, &ctx.cancel, inbound)
            .instrument(info_span!("session.process"))
            .await?;

        advance(&mut phase, Phase::Finalizing);
        let mut summary = self
            .finalize_batched(run, &ctx.cancel, outbound)
            .instrument(info_span!("session.finalize"))
            .await?;
        advance(&mut phase, Phase::Closed);

        summary.cancelled |= cancelled;
        Ok(summary)
    }

    async fn finalize_batched<O>(
        &self,
        run: BatchedRun,
        cancel: &CancelToken,
        outbound: &mut O,
    ) -> Result<SessionSummary, SessionError>
    where
        O: MessageSink<BatchOutput>,
    {
        let BatchedRun {
            strategy,
            signals,
            debug,
            mut summary,
        } = run;

        summary.signals = signals.len();
        let mut pending = signals.into_iter().peekable();
        while pending.peek().is_some() {
            if cancel.is_cancelled() {
                debug!("cancelled while sending signals");
                break;
            }
            let chunk: Vec<_> = pending.by_ref().take(self.limits.signal_chunk_size).collect();
            outbound.send(BatchOutput::Signals(chunk)).await?;
        }

        let state = strategy.checkpoint().map_err(SessionError::Checkpoint)?;
        outbound.send(BatchOutput::State { state }).await?;

        if let Some(collector) = debug {
            summary.debug_series = collector.len();
            let mut pending = collector.into_series().into_iter().peekable();
            while pending.peek().is_some() {
                if cancel.is_cancelled() {
                    debug!("cancelled while sending debug series");
                    break;
                }
                let chunk: Vec<_> = pending.by_ref().take(self.limits.debug_chunk_size).collect();
                outbound.send(BatchOutput::Debug(chunk)).await?;
            }
        }

        summary.cancelled = cancel.is_cancelled();
        Ok(summary)
    }

    /// Run an unbatched session: one `Tick` per update, then the state.
    pub async fn run_streaming<I, O>(
        &self,
        ctx: &SessionContext,
        mut inbound: I,
        outbound: &mut O,
    ) -> Result<SessionSummary, SessionError>
    where
        I: Stream<Item = Result<StreamInput, TransportError>> + Unpin + Send,
        O: MessageSink<StreamOutput>,
    {
        let result = self
            .drive_streaming(ctx, &mut inbound, outbound)
            .instrument(ctx.span.clone())
            .await;
        report(ctx, &result);
        result
    }

    async fn drive_streaming<I, O>(
        &self,
        ctx: &SessionContext,
        inbound: &mut I,
        outbound: &mut O,
    ) -> Result<SessionSummary, SessionError>
    where
        I: Stream<Item = Result<StreamInput, TransportError>> + Unpin + Send,
        O: MessageSink<StreamOutput>,
    {
        let mut phase = Phase::AwaitingCreate;
        let request = match next_message(&ctx.cancel, inbound).await? {
            Next::Message(StreamInput::Create(request)) => request,
            Next::Message(_) | Next::End => {
                return Err(SessionError::Protocol(FIRST_MESSAGE_ERROR.into()))
            }
            Next::Cancelled => return Err(SessionError::Cancelled),
        };

        let mut strategy = info_span!("session.create", strategy = %request.name)
            .in_scope(|| self.open(&request))?;
        let mut summary = SessionSummary::new(&request.name);
        advance(&mut phase, Phase::Processing);

        let cancelled = process_streaming(
            strategy.as_mut(),
            &mut summary,
            &ctx.cancel,
            inbound,
            outbound,
        )
        .instrument(info_span!("session.process"))
        .await?;

        advance(&mut phase, Phase::Finalizing);
        let state = info_span!("session.finalize")
            .in_scope(|| strategy.checkpoint())
            .map_err(SessionError::Checkpoint)?;
        outbound.send(StreamOutput::State { state }).await?;
        advance(&mut phase, Phase::Closed);

        summary.cancelled = cancelled || ctx.cancel.is_cancelled();
        Ok(summary)
    }
}

/// Feed batched messages until the stream ends. Returns whether it was cancelled.
async fn process_batched<I>(
    run: &mut BatchedRun,
    cancel: &CancelToken,
    inbound: &mut I,
) -> Result<bool, SessionError>
where
    I: Stream<Item = Result<BatchInput, TransportError>> + Unpin,
{
    loop {
        match next_message(cancel, inbound).await? {
            Next::Message(message) => run.apply(message)?,
            Next::End => return Ok(false),
            Next::Cancelled => return Ok(true),
        }
    }
}

async fn process_streaming<I, O>(
    strategy: &mut dyn Strategy,
    summary: &mut SessionSummary,
    cancel: &CancelToken,
    inbound: &mut I,
    outbound: &mut O,
) -> Result<bool, SessionError>
where
    I: Stream<Item = Result<StreamInput, TransportError>> + Unpin,
    O: MessageSink<StreamOutput>,
{
    loop {
        match next_message(cancel, inbound).await? {
            Next::Message(StreamInput::Preload { candle }) => {
                strategy.preload(&candle);
                summary.preloaded += 1;
            }
            Next::Message(StreamInput::Update { candle }) => {
                let signal = strategy.update(&candle);
                summary.updated += 1;
                summary.signals += usize::from(signal.is_some());
                outbound.send(StreamOutput::Tick { signal }).await?;
            }
            Next::Message(StreamInput::Create(_)) => {
                return Err(SessionError::Protocol(REPEATED_CREATE_ERROR.into()));
            }
            Next::End => return Ok(false),
            Next::Cancelled => return Ok(true),
        }
    }
}

fn report(ctx: &SessionContext, result: &Result<SessionSummary, SessionError>) {
    match result {
        Ok(summary) => info!(
            parent: &ctx.span,
            strategy = %summary.strategy,
            preloaded = summary.preloaded,
            updated = summary.updated,
            signals = summary.signals,
            debug_series = summary.debug_series,
            cancelled = summary.cancelled,
            "session closed"
        ),
        Err(err) => warn!(
            parent: &ctx.span,
            code = ?err.code(),
            error = %err,
            "session failed"
        ),
    }
}
