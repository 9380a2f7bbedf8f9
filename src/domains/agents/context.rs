use super::{ActivityCounters, Roster};
use crate::common::Clock;
use crate::config::{ArbitrationConfig, Config, TimingConfig, WalkMode};
use crate::domains::grid::Grid;
use crate::domains::DynLogger;
use std::sync::Arc;

/// Everything an agent task shares with the rest of the run.
#[derive(Clone)]
pub struct AgentContext {
    pub grid: Arc<Grid>,
    pub roster: Arc<Roster>,
    pub counters: Arc<ActivityCounters>,
    pub clock: Clock,
    /// Run-level events; expected to be non-blocking.
    pub log: DynLogger,
    pub timing: TimingConfig,
    pub arbitration: ArbitrationConfig,
    pub walk: WalkMode,
    pub min_steps: usize,
    pub max_steps: usize,
}

impl AgentContext {
    pub fn new(
        config: &Config,
        grid: Arc<Grid>,
        roster: Arc<Roster>,
        counters: Arc<ActivityCounters>,
        clock: Clock,
        log: DynLogger,
    ) -> Self {
        Self {
            grid,
            roster,
            counters,
            clock,
            log,
            timing: config.timing.clone(),
            arbitration: config.arbitration.clone(),
            walk: config.agents.walk,
            min_steps: config.agents.min_steps,
            max_steps: config.agents.max_steps,
        }
    }
}
