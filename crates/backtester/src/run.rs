//! Backtest run lifecycle and the async runner that drives it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::join_all;
use market_core::{EngineConfig, Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strategies::{StrategyId, StrategyParameters};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::data_store::{BarQuery, BarSource};
use crate::metrics::BacktestResult;
use crate::simulator::{BacktestSimulator, SimulatorConfig};

/// Status of a backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Allowed: Pending -> Running -> Completed | Failed.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Running)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// What to backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub strategy: StrategyId,
    pub parameters: StrategyParameters,
    pub query: BarQuery,
    /// Overrides the engine default when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_balance: Option<Decimal>,
    /// Overrides the engine default when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Decimal>,
}

impl BacktestRequest {
    pub fn new(strategy: StrategyId, parameters: StrategyParameters, query: BarQuery) -> Self {
        Self {
            strategy,
            parameters,
            query,
            initial_balance: None,
            commission_rate: None,
        }
    }

    fn simulator_config(&self, defaults: &EngineConfig) -> SimulatorConfig {
        let mut config = SimulatorConfig::from(defaults);
        config.symbol = self.query.symbol.clone();
        if let Some(balance) = self.initial_balance {
            config.initial_balance = balance;
        }
        if let Some(rate) = self.commission_rate {
            config.commission_rate = rate;
        }
        config
    }
}

/// A backtest run as handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub id: Uuid,
    pub request: BacktestRequest,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall time from start to completion.
    pub duration_ms: Option<i64>,
    /// Failure message for a failed run.
    pub error: Option<String>,
    pub result: Option<BacktestResult>,
}

impl BacktestRun {
    pub fn new(id: Uuid, request: BacktestRequest) -> Self {
        Self {
            id,
            request,
            status: RunStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_ms: None,
            error: None,
            result: None,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(RunStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self, result: BacktestResult) -> Result<()> {
        self.transition(RunStatus::Completed)?;
        self.result = Some(result);
        self.stamp_completion();
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(RunStatus::Failed)?;
        self.error = Some(message.into());
        self.stamp_completion();
        Ok(())
    }

    fn transition(&mut self, next: RunStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::Simulation(format!(
                "Run {} cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    fn stamp_completion(&mut self) {
        let completed_at = Utc::now();
        let started_at = self.started_at.unwrap_or(self.created_at);
        self.completed_at = Some(completed_at);
        self.duration_ms = Some((completed_at - started_at).num_milliseconds());
    }
}

/// Persistence collaborator for run records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Store a newly created run.
    async fn save_run(&self, run: &BacktestRun) -> Result<()>;

    /// Replace the stored copy after a status transition.
    async fn update_run(&self, run: &BacktestRun) -> Result<()>;

    async fn get_run(&self, id: Uuid) -> Result<Option<BacktestRun>>;
}

/// Run records held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRunRepository {
    runs: DashMap<Uuid, BacktestRun>,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn save_run(&self, run: &BacktestRun) -> Result<()> {
        match self.runs.entry(run.id) {
            Entry::Occupied(_) => Err(Error::Persistence(format!("Run {} already exists", run.id))),
            Entry::Vacant(slot) => {
                slot.insert(run.clone());
                Ok(())
            }
        }
    }

    async fn update_run(&self, run: &BacktestRun) -> Result<()> {
        match self.runs.get_mut(&run.id) {
            Some(mut stored) => {
                *stored = run.clone();
                Ok(())
            }
            None => Err(Error::Persistence(format!("Run {} not found", run.id))),
        }
    }

    async fn get_run(&self, id: Uuid) -> Result<Option<BacktestRun>> {
        Ok(self.runs.get(&id).map(|r| r.clone()))
    }
}

/// Removes a run from the in-flight table when execution ends.
struct InFlightGuard<'a> {
    in_flight: &'a DashMap<Uuid, Arc<AtomicBool>>,
    id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}

/// Executes backtest requests against the market data and persistence
/// collaborators.
///
/// At most `max_concurrent_runs` simulations execute at once, and a run id
/// never executes twice concurrently.
pub struct BacktestRunner {
    bars: Arc<dyn BarSource>,
    runs: Arc<dyn RunRepository>,
    config: EngineConfig,
    permits: Arc<Semaphore>,
    in_flight: DashMap<Uuid, Arc<AtomicBool>>,
}

impl BacktestRunner {
    pub fn new(bars: Arc<dyn BarSource>, runs: Arc<dyn RunRepository>, config: EngineConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_runs.max(1)));
        Self {
            bars,
            runs,
            config,
            permits,
            in_flight: DashMap::new(),
        }
    }

    /// Execute a request under a fresh run id.
    pub async fn submit(&self, request: BacktestRequest) -> Result<BacktestRun> {
        self.execute(Uuid::new_v4(), request).await
    }

    /// Execute several requests concurrently, bounded by the runner's permits.
    /// Results come back in request order.
    pub async fn submit_all(&self, requests: Vec<BacktestRequest>) -> Vec<Result<BacktestRun>> {
        join_all(requests.into_iter().map(|request| self.submit(request))).await
    }

    /// Request cooperative cancellation of an executing run. Returns whether
    /// the run was executing.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.in_flight.get(&id) {
            Some(flag) => {
                flag.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, id: Uuid) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Validate, persist and execute one run.
    ///
    /// Invalid parameters or configuration fail before any run record is
    /// created. Failures after that point are recorded on the returned run
    /// with status `Failed`.
    pub async fn execute(&self, id: Uuid, request: BacktestRequest) -> Result<BacktestRun> {
        let strategy = request.strategy.strategy();
        strategy.validate_parameters(&request.parameters)?;
        let sim_config = request.simulator_config(&self.config);
        sim_config.validate()?;

        let cancel = Arc::new(AtomicBool::new(false));
        match self.in_flight.entry(id) {
            Entry::Occupied(_) => return Err(Error::RunInProgress(id)),
            Entry::Vacant(slot) => {
                slot.insert(cancel.clone());
            }
        }
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            id,
        };

        let mut run = BacktestRun::new(id, request);
        self.runs.save_run(&run).await?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Simulation("runner is shut down".to_string()))?;

        run.start()?;
        self.runs.update_run(&run).await?;
        info!(run_id = %id, strategy = %run.request.strategy, symbol = %run.request.query.symbol, "Backtest run started");

        let outcome = match self.bars.fetch_bars(&run.request.query).await {
            Ok(bars) if bars.is_empty() => Err(Error::DataSource(format!(
                "No bars for {} {} in the requested window",
                run.request.query.symbol, run.request.query.timeframe
            ))),
            Ok(bars) => {
                let params = run.request.parameters.clone();
                let simulator = BacktestSimulator::new(sim_config);
                tokio::task::spawn_blocking(move || {
                    simulator.run_with_cancel(strategy.as_ref(), &bars, &params, &cancel)
                })
                .await
                .unwrap_or_else(|e| Err(Error::Simulation(format!("simulation task failed: {}", e))))
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                info!(
                    run_id = %id,
                    final_balance = %result.final_balance,
                    trades = result.total_trades,
                    "Backtest run completed"
                );
                run.complete(result)?;
            }
            Err(e) => {
                warn!(run_id = %id, error = %e, "Backtest run failed");
                run.fail(e.to_string())?;
            }
        }

        if let Err(e) = self.runs.update_run(&run).await {
            error!(run_id = %id, error = %e, "Failed to record backtest run outcome");
            return Err(e);
        }

        Ok(run)
    }
}
