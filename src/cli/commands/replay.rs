//! Replay command: push a CSV file through one batched session.

use anyhow::{bail, Context, Result};
use quant_core::types::{Candle, Interval};
use quant_data::load_csv;
use quant_session::{
    BatchInput, BatchOutput, CancelToken, CreateRequest, DebugSeries, SessionContext,
    SessionController, SessionSummary, SignalRecord, TransportError,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use super::{load_settings, registry_for};
use crate::cli::{OutputFormat, ReplayArgs};

/// Outbound messages gathered from the session.
#[derive(Default)]
struct Collected {
    signals: Vec<SignalRecord>,
    state: Option<String>,
    debug: Vec<DebugSeries>,
}

impl Collected {
    fn push(&mut self, output: BatchOutput) {
        match output {
            BatchOutput::Signals(records) => self.signals.extend(records),
            BatchOutput::State { state } => self.state = Some(state),
            BatchOutput::Debug(series) => self.debug.extend(series),
        }
    }
}

pub async fn run(args: ReplayArgs, config_path: &Path) -> Result<()> {
    if args.batch_size == 0 {
        bail!("--batch-size must be at least 1");
    }
    let config = load_settings(config_path)?;
    let registry = registry_for(&config)?;

    let strategy_config = match &args.strategy_config {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => String::new(),
    };
    let state = match &args.state {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let interval: Interval = args.interval.parse()?;
    let candles = load_csv(&args.data, args.market, args.symbol, interval)
        .await
        .with_context(|| format!("Failed to load {}", args.data.display()))?;
    info!(
        strategy = %args.strategy,
        candles = candles.len(),
        preload = args.preload.min(candles.len()),
        "starting replay"
    );

    let mut create = CreateRequest::new(&args.strategy)
        .with_config(strategy_config)
        .with_debug(args.debug);
    create.state = state;
    let messages = batches(create, &candles, args.preload, args.batch_size);

    let controller = SessionController::new(Arc::new(registry), config.session);
    let ctx = SessionContext::new(CancelToken::new());
    let cancel = ctx.cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let (inbound_tx, inbound_rx) = mpsc::channel::<Result<BatchInput, TransportError>>(16);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<BatchOutput>(16);

    let session = tokio::spawn(async move {
        let mut sink = outbound_tx;
        controller
            .run_batched(&ctx, ReceiverStream::new(inbound_rx), &mut sink)
            .await
    });
    let feeder = tokio::spawn(async move {
        for message in messages {
            if inbound_tx.send(Ok(message)).await.is_err() {
                break;
            }
        }
    });

    let mut collected = Collected::default();
    while let Some(output) = outbound_rx.recv().await {
        if matches!(args.output, OutputFormat::Json) {
            println!("{}", serde_json::to_string(&output)?);
        }
        collected.push(output);
    }

    let summary = session.await??;
    feeder.await?;
    interrupt.abort();

    if matches!(args.output, OutputFormat::Text) {
        print_report(&summary, &collected);
    }

    if let Some(path) = &args.save_state {
        let state = collected
            .state
            .as_deref()
            .context("Session ended without a state message")?;
        tokio::fs::write(path, state)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved strategy state");
    }

    Ok(())
}

/// Split candles into the Create, Preload and Update messages of one session.
fn batches(create: CreateRequest, candles: &[Candle], preload: usize, batch_size: usize) -> Vec<BatchInput> {
    let (warmup, live) = candles.split_at(preload.min(candles.len()));
    let mut messages = vec![BatchInput::Create(create)];
    messages.extend(warmup.chunks(batch_size).map(|chunk| BatchInput::Preload {
        candles: chunk.to_vec(),
    }));
    messages.extend(live.chunks(batch_size).map(|chunk| BatchInput::Update {
        candles: chunk.to_vec(),
    }));
    messages
}

fn print_report(summary: &SessionSummary, collected: &Collected) {
    println!("Replay: {}", summary.strategy);
    println!("═══════════════════════════════════════════════════════════");
    println!("Preloaded candles: {}", summary.preloaded);
    println!("Updated candles:   {}", summary.updated);
    println!("Signals:           {}", summary.signals);
    if summary.cancelled {
        println!("Replay was cancelled; output may be incomplete.");
    }
    println!();

    for record in &collected.signals {
        let time = record
            .candle
            .datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| record.candle.timestamp.to_string());
        println!(
            "  {time}  {:<10}  confidence {:.3}  close {:.4}",
            record.kind.to_string(),
            record.confidence,
            record.candle.close
        );
    }

    if !collected.debug.is_empty() {
        println!();
        println!("Debug series:");
        for series in &collected.debug {
            let last = series.values.last().map(|p| p.value).unwrap_or(f64::NAN);
            println!(
                "  [{}] {:<24} {} points, last {:.4}",
                series.index,
                series.name,
                series.values.len(),
                last
            );
        }
    }

    if let Some(state) = &collected.state {
        println!();
        println!("Final state: {} bytes", state.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_split_preload_and_updates() {
        let candles: Vec<Candle> = (0..7).map(|i| Candle::from_close(i as f64)).collect();
        let messages = batches(CreateRequest::new("Turtle"), &candles, 3, 2);

        let shape: Vec<(&str, usize)> = messages
            .iter()
            .map(|m| match m {
                BatchInput::Create(_) => ("create", 0),
                BatchInput::Preload { candles } => ("preload", candles.len()),
                BatchInput::Update { candles } => ("update", candles.len()),
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                ("create", 0),
                ("preload", 2),
                ("preload", 1),
                ("update", 2),
                ("update", 2),
            ]
        );
    }

    #[test]
    fn test_preload_longer_than_data() {
        let candles: Vec<Candle> = (0..2).map(|i| Candle::from_close(i as f64)).collect();
        let messages = batches(CreateRequest::new("Aldo"), &candles, 10, 5);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[1], BatchInput::Preload { .. }));
    }
}
