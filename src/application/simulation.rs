use super::TraceCollector;
use crate::adapters::outbound::init_buffered_logger;
use crate::common::{
    ApplicationResult, Clock, DomainError, DomainResult, Position, StartGate, TraceBatch,
    TraceHeader, TraceQueue,
};
use crate::config::Config;
use crate::domains::agents::{ActivityCounters, AgentContext, Roster, Traveler, WildTenant};
use crate::domains::grid::{CellSettings, CellSnapshot, Grid, Trap};
use crate::domains::{DynLogger, TraceSink};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

/// Attempts per free cell before traveler placement gives up.
const PLACEMENT_ATTEMPTS_PER_CELL: usize = 64;
/// Queue depth of the agents' buffered run log.
const AGENT_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub seed: u64,
    pub header: TraceHeader,
    pub batches: usize,
    pub traces: usize,
    /// Records handed over by traveler and wild-tenant tasks.
    pub agent_traces: usize,
    /// Records exported from the cell logs at shutdown.
    pub cell_traces: usize,
    /// Cell states after every agent finished, before the final export.
    pub residual: Vec<CellSnapshot>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn occupants(&self) -> Vec<usize> {
        self.residual.iter().filter_map(|c| c.occupant).collect()
    }
}

/// Coordinator of one simulation run.
pub struct Simulation {
    config: Config,
    logger: DynLogger,
}

impl Simulation {
    pub fn new(config: Config, logger: DynLogger) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run<S: TraceSink>(&self, sink: S) -> ApplicationResult<RunReport> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let clock = Clock::start();
        let size = self.config.board_size();
        let agents = &self.config.agents;

        self.logger.info(&format!(
            "run {}: {}x{} board, {} travelers, {} wild tenants, {} traps, seed {}",
            run_id,
            size.width,
            size.height,
            agents.travelers,
            agents.wild_tenants,
            agents.traps,
            seed
        ));

        let roster = Arc::new(Roster::new(agents.travelers, agents.wild_tenants));
        let grid = Arc::new(Grid::spawn(
            size,
            roster.clone(),
            clock,
            CellSettings::from_config(&self.config),
            rng.gen(),
        ));

        let header = TraceHeader {
            entity_count: self.config.entity_count(),
            width: size.width,
            height: size.height,
        };
        let (queue, collector) = TraceCollector::spawn(
            sink,
            header,
            self.config.output.order,
            self.config.output.queue_capacity,
        );

        self.place_traps(&grid, &mut rng).await;
        self.place_travelers(&grid, &roster, &mut rng).await?;

        let counters = Arc::new(ActivityCounters::new(agents.travelers, agents.wild_tenants));
        let (agent_log, log_forwarder) =
            init_buffered_logger(self.logger.clone(), AGENT_LOG_CAPACITY);
        let ctx = AgentContext::new(
            &self.config,
            grid.clone(),
            roster.clone(),
            counters,
            clock,
            agent_log.clone(),
        );
        let (gate, signal) = StartGate::new();
        let mut tasks = JoinSet::new();

        for id in 0..agents.travelers {
            let traveler = Traveler::new(id, ctx.clone(), StdRng::seed_from_u64(rng.gen()));
            let signal = signal.clone();
            let queue = queue.clone();
            tasks.spawn(async move {
                signal.wait().await;
                deliver(&queue, id, traveler.run().await).await
            });
        }

        let first_tenant = agents.travelers;
        for id in first_tenant..first_tenant + agents.wild_tenants {
            let tenant = WildTenant::new(id, ctx.clone(), StdRng::seed_from_u64(rng.gen()));
            let signal = signal.clone();
            let queue = queue.clone();
            tasks.spawn(async move {
                signal.wait().await;
                deliver(&queue, id, tenant.run().await).await
            });
        }
        drop(ctx);

        gate.release();
        let mut agent_traces = 0;
        while let Some(result) = tasks.join_next().await {
            agent_traces += result?;
        }
        debug!(run = %run_id, "all agents finished");

        let dropped = agent_log.dropped();
        drop(agent_log);
        log_forwarder.await?;
        if dropped > 0 {
            self.logger
                .warn(&format!("{} agent log messages dropped", dropped));
        }

        let residual = grid.snapshot().await?;
        let exported = grid.export_traces(&queue).await;
        drop(queue);
        let collected = collector.await??;

        match Arc::try_unwrap(grid) {
            Ok(grid) => grid.shutdown().await,
            Err(_) => warn!(run = %run_id, "grid still referenced at shutdown"),
        }

        let report = RunReport {
            run_id,
            seed,
            header,
            batches: collected.batches,
            traces: collected.traces,
            agent_traces,
            cell_traces: exported.traces,
            residual,
            elapsed: clock.elapsed(),
        };
        self.logger.info(&format!(
            "run {} finished in {:.3}s: {} traces in {} batches ({} cell logs)",
            run_id,
            report.elapsed.as_secs_f64(),
            report.traces,
            report.batches,
            exported.batches
        ));
        Ok(report)
    }

    /// Traps go to distinct random cells; each leaves one trace in its cell.
    async fn place_traps(&self, grid: &Grid, rng: &mut StdRng) {
        let agents = &self.config.agents;
        let first_id = agents.travelers + agents.wild_tenants;
        let mut positions: Vec<Position> = grid.size().positions().collect();
        positions.shuffle(rng);

        for (offset, pos) in positions.into_iter().take(agents.traps).enumerate() {
            let cell = grid.cell(pos);
            cell.add_trap(Trap::new(first_id + offset, pos)).await;
            cell.store_trace().await;
        }
        debug!(traps = agents.traps, "traps placed");
    }

    /// Puts every traveler on a random free, untrapped cell. The cell lock
    /// is kept and handed over to the traveler.
    async fn place_travelers(
        &self,
        grid: &Grid,
        roster: &Roster,
        rng: &mut StdRng,
    ) -> DomainResult<()> {
        let size = grid.size();
        let max_attempts = PLACEMENT_ATTEMPTS_PER_CELL * size.cell_count();
        let retry = self.config.timing.placement_retry();

        for id in 0..self.config.agents.travelers {
            let mut placed = false;
            for _ in 0..max_attempts {
                let pos = size.random_position(rng);
                let cell = grid.cell(pos);
                if cell.try_lock().await {
                    if !cell.is_occupied().await && !cell.check_trap().await {
                        cell.occupy(id).await;
                        roster.set_position(id, pos);
                        cell.store_trace().await;
                        placed = true;
                        break;
                    }
                    cell.unlock().await;
                }
                sleep(retry).await;
            }
            if !placed {
                self.logger
                    .error(&format!("no free cell left for traveler {}", id));
                return Err(DomainError::BoardExhausted {
                    what: format!("traveler {}", id),
                });
            }
        }
        Ok(())
    }
}

/// Hands an agent's history to the collector; returns how many records it
/// carried.
async fn deliver(queue: &TraceQueue, agent: usize, traces: TraceBatch) -> usize {
    let count = traces.len();
    if queue.send(traces).await.is_err() {
        warn!(agent, "collector closed before the agent's traces arrived");
    }
    count
}
