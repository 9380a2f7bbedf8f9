use super::AgentContext;
use crate::common::{Direction, Position, TraceBatch};
use crate::config::WalkMode;
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Result of a single step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    /// The destination lock could not be taken in time.
    Blocked,
    /// A wild tenant sat on the destination and could not be pushed away.
    EvictionFailed,
    Trapped,
}

/// Agent performing a bounded random walk. Active while its symbol is
/// uppercase; once lowercase it never moves again.
pub struct Traveler {
    id: usize,
    steps: usize,
    heading: Option<Direction>,
    rng: StdRng,
    ctx: AgentContext,
    traces: TraceBatch,
}

impl Traveler {
    pub fn new(id: usize, ctx: AgentContext, mut rng: StdRng) -> Self {
        let steps = rng.gen_range(ctx.min_steps..=ctx.max_steps);
        let heading = match ctx.walk {
            WalkMode::Random => None,
            WalkMode::Heading => Some(initial_heading(id, &mut rng)),
        };
        Self {
            id,
            steps,
            heading,
            rng,
            ctx,
            traces: Vec::new(),
        }
    }

    /// Overrides the step budget drawn at construction.
    pub fn with_step_budget(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn step_budget(&self) -> usize {
        self.steps
    }

    /// Walks until the budget is spent or the traveler stops, and hands back
    /// its own trace history.
    pub async fn run(mut self) -> TraceBatch {
        let mut taken = 0;
        let mut last = None;
        for _ in 0..self.steps {
            sleep(self.random_delay()).await;
            let outcome = self.step().await;
            debug!(traveler = self.id, ?outcome, "step");
            taken += 1;
            last = Some(outcome);
            if !self.is_active() {
                break;
            }
        }

        if self.is_active() {
            self.stop();
            self.record();
        }

        let message = match last {
            Some(StepOutcome::Trapped) => format!(
                "traveler {} caught by a trap after {}/{} steps",
                self.id, taken, self.steps
            ),
            Some(outcome @ (StepOutcome::Blocked | StepOutcome::EvictionFailed)) => format!(
                "traveler {} halted at {} after {}/{} steps ({:?})",
                self.id,
                self.position(),
                taken,
                self.steps,
                outcome
            ),
            _ => format!(
                "traveler {} stopped at {} after {} steps",
                self.id,
                self.position(),
                taken
            ),
        };
        self.ctx.log.info(&message);

        self.ctx.counters.traveler_finished();
        debug!(traveler = self.id, traces = self.traces.len(), "traveler finished");
        self.traces
    }

    pub async fn step(&mut self) -> StepOutcome {
        let grid = self.ctx.grid.clone();
        let current = self.ctx.roster.position(self.id);
        let direction = self
            .heading
            .unwrap_or_else(|| Direction::random(&mut self.rng));
        let target = grid.size().step(current, direction);
        let destination = grid.cell(target);

        if !destination.try_lock().await {
            self.stop();
            self.record();
            return StepOutcome::Blocked;
        }

        if !grid.move_wild_tenant(target).await {
            self.stop();
            self.record();
            // By default the destination stays locked, so the jam remains
            // visible in the output.
            if self.ctx.arbitration.release_on_eviction_failure {
                destination.unlock().await;
            }
            return StepOutcome::EvictionFailed;
        }

        let prior = grid.cell(current);
        prior.clear().await;
        destination.occupy(self.id).await;
        self.ctx.roster.set_position(self.id, target);

        let mut outcome = StepOutcome::Moved;
        if destination.check_trap().await {
            let triggered = self.symbol().to_ascii_lowercase();
            destination
                .spring_trap(
                    &self.ctx.roster,
                    self.id,
                    triggered,
                    self.ctx.timing.min_delay(),
                )
                .await;
            outcome = StepOutcome::Trapped;
        }

        self.record();
        prior.unlock().await;
        outcome
    }

    pub fn position(&self) -> Position {
        self.ctx.roster.position(self.id)
    }

    pub fn is_active(&self) -> bool {
        self.symbol().is_ascii_uppercase()
    }

    fn symbol(&self) -> char {
        self.ctx
            .roster
            .get(self.id)
            .map(|p| p.symbol)
            .unwrap_or_default()
    }

    fn stop(&mut self) {
        self.ctx.roster.update(self.id, |p| p.stop());
    }

    fn record(&mut self) {
        if let Some(trace) = self.ctx.roster.trace(self.id, &self.ctx.clock) {
            self.traces.push(trace);
        }
    }

    fn random_delay(&mut self) -> Duration {
        let min = self.ctx.timing.min_delay_ms;
        let max = self.ctx.timing.max_delay_ms;
        Duration::from_millis(self.rng.gen_range(min..=max))
    }
}

/// Even travelers walk vertically, odd ones horizontally.
fn initial_heading(id: usize, rng: &mut StdRng) -> Direction {
    let forward: bool = rng.gen();
    match (id % 2 == 0, forward) {
        (true, true) => Direction::Down,
        (true, false) => Direction::Up,
        (false, true) => Direction::Right,
        (false, false) => Direction::Left,
    }
}
