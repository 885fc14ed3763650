//! Integration tests for component interactions.
//!
//! These tests drive real strategies through the simulator and the runner
//! and check the engine-wide guarantees on the results.

use std::sync::Arc;

use backtester::{
    BacktestJob, BacktestRequest, BacktestRunner, BacktestSimulator, BarQuery, InMemoryBarSource,
    InMemoryRunRepository, RunRepository, RunStatus, SimulatorConfig,
};
use chrono::{Duration, TimeZone, Utc};
use indicators::{closes, rsi, sma};
use market_core::types::{MarketBar, Position, Timeframe, TradeType, FINAL_CLOSE_REASON, STOP_LOSS_REASON};
use market_core::EngineConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strategies::{
    available, BollingerBandsStrategy, MovingAverageCrossover, RsiStrategy, Strategy, StrategyId,
};

fn bars_from_closes(closes: impl IntoIterator<Item = i64>) -> Vec<MarketBar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .into_iter()
        .enumerate()
        .map(|(i, close)| {
            let close = Decimal::from(close);
            let spread = close / Decimal::ONE_HUNDRED;
            let volume = Decimal::from(100 + (i as i64 % 3) * 50);
            MarketBar::new(
                start + Duration::hours(i as i64),
                close,
                close + spread,
                close - spread,
                close,
                volume,
            )
        })
        .collect()
}

/// Triangle wave swinging between 80 and 120 every 40 bars.
fn wave(count: i64) -> Vec<MarketBar> {
    bars_from_closes((0..count).map(|i| 80 + ((i % 40) - 20).abs() * 2))
}

/// Test that every strategy holds on windows shorter than it needs.
#[test]
fn test_insufficient_data_for_all_strategies() {
    let bars = wave(3);
    for (id, strategy) in available() {
        let params = strategy.default_parameters();
        for window in [&bars[..0], &bars[..]] {
            let signal = strategy.analyze(window, None, &params).unwrap();
            assert!(signal.is_hold(), "{} acted on a short window", id);
            assert_eq!(signal.reason, "Insufficient data");
        }
    }
}

/// Test that strategies never buy with a position or sell without one.
#[test]
fn test_signals_respect_position_state() {
    let bars = wave(160);
    let position = Position::open(Decimal::ONE, dec!(100), bars[0].timestamp);

    for (id, strategy) in available() {
        let params = strategy.default_parameters();
        for i in 0..bars.len() {
            let window = &bars[..=i];
            assert!(!strategy.analyze(window, Some(&position), &params).unwrap().is_buy(), "{}", id);
            assert!(!strategy.analyze(window, None, &params).unwrap().is_sell(), "{}", id);
        }
    }
}

/// Test the golden cross scenario end to end.
#[test]
fn test_golden_cross_run() {
    let falling = (0..26).map(|i| 200 - i);
    let rising = (1..=20).map(|i| 175 + 4 * i);
    let bars = bars_from_closes(falling.chain(rising));
    let strategy = MovingAverageCrossover;

    let result = BacktestSimulator::default()
        .run(&strategy, &bars, &strategy.default_parameters())
        .unwrap();

    let buy = &result.trades[0];
    assert_eq!(buy.trade_type, TradeType::Buy);
    let index = bars.iter().position(|b| b.timestamp == buy.execution_timestamp).unwrap();
    assert!(index > 25);
    assert_eq!(buy.price, bars[index].close);

    let closes = closes(&bars[..=index]);
    assert!(sma(&closes, 9).unwrap() > sma(&closes, 21).unwrap());

    // Still rallying at the end, so the position is force-closed.
    let last = result.trades.last().unwrap();
    assert_eq!(last.reason, FINAL_CLOSE_REASON);
    assert_eq!(last.price, bars[bars.len() - 1].close);
}

/// Test the RSI oversold scenario end to end.
#[test]
fn test_rsi_oversold_run() {
    let bars = bars_from_closes((0..30).map(|i| 130 - i));
    let strategy = RsiStrategy;

    let result = BacktestSimulator::default()
        .run(&strategy, &bars, &strategy.default_parameters())
        .unwrap();

    let buy = &result.trades[0];
    assert_eq!(buy.trade_type, TradeType::Buy);
    assert_eq!(buy.execution_timestamp, bars[14].timestamp);
    assert_eq!(buy.price, dec!(116));
    assert!(rsi(&closes(&bars[..=14]), 14).unwrap() < dec!(30));
}

/// Test that a stop-loss fill pre-empts the strategy on the same bar.
#[test]
fn test_stop_loss_precedence() {
    let mut bars = bars_from_closes((0..15).map(|i| 130 - i));
    let crash_time = bars[14].timestamp + Duration::hours(1);
    bars.push(MarketBar::new(crash_time, dec!(108), dec!(108), dec!(104), dec!(105), dec!(500)));
    let strategy = RsiStrategy;

    let result = BacktestSimulator::default()
        .run(&strategy, &bars, &strategy.default_parameters())
        .unwrap();

    // RSI is still oversold on the crash bar, but no re-entry happens there.
    assert_eq!(result.trades.len(), 2);
    let stop = &result.trades[1];
    assert_eq!(stop.reason, STOP_LOSS_REASON);
    assert_eq!(stop.price, dec!(116) * dec!(0.95));
    assert_eq!(stop.execution_timestamp, crash_time);
}

/// Test that a market that never moves costs nothing in commission.
#[test]
fn test_flat_market_does_not_trade() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let price = dec!(100);
    let bars: Vec<MarketBar> = (0..41)
        .map(|i| MarketBar::new(start + Duration::hours(i), price, price, price, price, dec!(100)))
        .collect();
    let strategy = BollingerBandsStrategy;

    let result = BacktestSimulator::default()
        .run(&strategy, &bars, &strategy.default_parameters())
        .unwrap();

    assert_eq!(result.total_trades, 0);
    assert_eq!(result.final_balance, result.initial_balance);
    assert_eq!(result.total_commission, Decimal::ZERO);
}

/// Test result invariants for every built-in strategy.
#[test]
fn test_result_invariants() {
    let bars = wave(400);
    let simulator = BacktestSimulator::default();

    for (id, strategy) in available() {
        let result = simulator.run(strategy.as_ref(), &bars, &strategy.default_parameters()).unwrap();

        assert_eq!(result.total_trades, result.trades.len(), "{}", id);
        assert!(result.winning_trades + result.losing_trades <= result.total_trades, "{}", id);
        assert!(result.win_rate_percent >= Decimal::ZERO && result.win_rate_percent <= dec!(100));
        assert!(result.max_drawdown_percent >= Decimal::ZERO);
        assert_eq!(result.bars_processed, bars.len());

        // Trades alternate buy/sell and never leave a position open.
        for (i, trade) in result.trades.iter().enumerate() {
            let expected = if i % 2 == 0 { TradeType::Buy } else { TradeType::Sell };
            assert_eq!(trade.trade_type, expected, "{}", id);
        }
        assert_eq!(result.trades.len() % 2, 0, "{}", id);
    }
}

/// Test that identical inputs produce byte-identical results.
#[test]
fn test_runs_are_deterministic() {
    let bars = wave(300);
    let simulator = BacktestSimulator::default();

    for (_, strategy) in available() {
        let params = strategy.default_parameters();
        let first = simulator.run(strategy.as_ref(), &bars, &params).unwrap();
        let second = simulator.run(strategy.as_ref(), &bars, &params).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

/// Test that parallel batch simulation matches sequential runs.
#[test]
fn test_batch_matches_sequential() {
    let bars = wave(200);
    let simulator = BacktestSimulator::new(SimulatorConfig {
        commission_rate: dec!(0.002),
        ..Default::default()
    });
    let strategies = available();
    let params: Vec<_> = strategies.iter().map(|(_, s)| s.default_parameters()).collect();

    let jobs: Vec<BacktestJob<'_>> = strategies
        .iter()
        .zip(&params)
        .map(|((_, strategy), params)| BacktestJob {
            strategy: strategy.as_ref(),
            bars: &bars,
            params,
        })
        .collect();
    let batch = simulator.simulate_batch(&jobs);

    for (job, result) in jobs.iter().zip(batch) {
        let sequential = simulator.run(job.strategy, job.bars, job.params).unwrap();
        assert_eq!(result.unwrap(), sequential);
    }
}

/// Test the runner against the in-memory collaborators.
#[tokio::test]
async fn test_runner_end_to_end() {
    let bars = wave(250);
    let source = InMemoryBarSource::new();
    source.insert("BTCUSDT", Timeframe::Hour1, bars.clone());
    let runs = Arc::new(InMemoryRunRepository::new());
    let runner = BacktestRunner::new(Arc::new(source), runs.clone(), EngineConfig::default());

    let query = BarQuery::range("BTCUSDT", Timeframe::Hour1, bars[0].timestamp, bars[249].timestamp);
    let strategy = StrategyId::BollingerBands.strategy();
    let request = BacktestRequest::new(StrategyId::BollingerBands, strategy.default_parameters(), query);

    let run = runner.submit(request).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    let stored = runs.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::Completed);

    let direct = BacktestSimulator::default()
        .run(strategy.as_ref(), &bars, &strategy.default_parameters())
        .unwrap();
    assert_eq!(run.result.unwrap(), direct);
}

/// Test that an unknown strategy identifier is rejected up front.
#[test]
fn test_unknown_strategy_identifier() {
    assert!(strategies::resolve("martingale").is_err());
    assert!("2h".parse::<Timeframe>().is_err());
}
