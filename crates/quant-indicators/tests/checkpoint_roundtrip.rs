//! Property tests: checkpoints are lossless and resumed indicators continue
//! exactly where the source instance left off.

use proptest::prelude::*;
use quant_core::traits::Indicator;
use quant_core::types::Candle;
use quant_indicators::{Atr, Cci, Ema, Macd, Rsi, Sma, Smma};

fn candle_strategy() -> impl Strategy<Value = Candle> {
    (1.0f64..10_000.0, 0.0f64..50.0, 0.0f64..50.0, 0.0f64..1.0).prop_map(
        |(base, up, down, frac)| {
            let high = base + up;
            let low = base - down.min(base * 0.5);
            let close = low + (high - low) * frac;
            Candle::new(0, base, high, low, close, 1.0)
        },
    )
}

/// Feed `history`, checkpoint, restore into `fresh`, then feed `tail` to
/// both and require bit-identical values and identical checkpoints.
fn assert_resumes<I: Indicator>(mut live: I, mut fresh: I, history: &[Candle], tail: &[Candle]) {
    for candle in history {
        live.update(candle);
    }
    let saved = live.checkpoint().unwrap();
    fresh.restore(&saved).unwrap();
    assert_eq!(fresh.checkpoint().unwrap(), saved);

    for candle in tail {
        live.update(candle);
        fresh.update(candle);
        assert_eq!(fresh.value().to_bits(), live.value().to_bits());
        assert_eq!(fresh.is_ready(), live.is_ready());
    }
}

proptest! {
    #[test]
    fn sma_resumes_exactly(
        period in 1usize..30,
        history in prop::collection::vec(candle_strategy(), 0..80),
        tail in prop::collection::vec(candle_strategy(), 1..20),
    ) {
        assert_resumes(Sma::new(period), Sma::new(1), &history, &tail);
    }

    #[test]
    fn ema_resumes_exactly(
        period in 1usize..30,
        history in prop::collection::vec(candle_strategy(), 0..80),
        tail in prop::collection::vec(candle_strategy(), 1..20),
    ) {
        assert_resumes(Ema::new(period), Ema::new(1), &history, &tail);
    }

    #[test]
    fn smma_resumes_exactly(
        period in 1usize..30,
        history in prop::collection::vec(candle_strategy(), 0..80),
        tail in prop::collection::vec(candle_strategy(), 1..20),
    ) {
        assert_resumes(Smma::new(period), Smma::new(1), &history, &tail);
    }

    #[test]
    fn rsi_resumes_exactly(
        period in 1usize..30,
        history in prop::collection::vec(candle_strategy(), 0..80),
        tail in prop::collection::vec(candle_strategy(), 1..20),
    ) {
        assert_resumes(Rsi::new(period), Rsi::new(1), &history, &tail);
    }

    #[test]
    fn cci_resumes_exactly(
        period in 1usize..30,
        history in prop::collection::vec(candle_strategy(), 0..80),
        tail in prop::collection::vec(candle_strategy(), 1..20),
    ) {
        assert_resumes(Cci::new(period), Cci::new(1), &history, &tail);
    }

    #[test]
    fn atr_resumes_exactly(
        period in 1usize..30,
        history in prop::collection::vec(candle_strategy(), 0..80),
        tail in prop::collection::vec(candle_strategy(), 1..20),
    ) {
        assert_resumes(Atr::new(period), Atr::new(1), &history, &tail);
    }

    #[test]
    fn macd_resumes_exactly(
        fast in 1usize..15,
        slow in 1usize..30,
        signal in 1usize..15,
        history in prop::collection::vec(candle_strategy(), 0..80),
        tail in prop::collection::vec(candle_strategy(), 1..20),
    ) {
        assert_resumes(Macd::new(fast, slow, signal), Macd::standard(), &history, &tail);
    }

    #[test]
    fn sma_of_constant_series_is_the_constant(close in 0.01f64..1_000_000.0, period in 1usize..50) {
        let mut sma = Sma::new(period);
        for i in 0..period {
            prop_assert!(!sma.is_ready());
            sma.update(&Candle::from_close(close));
            prop_assert_eq!(sma.is_ready(), i + 1 == period);
        }
        prop_assert!((sma.value() - close).abs() <= close * 1e-12);
    }
}
