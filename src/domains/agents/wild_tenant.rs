use super::AgentContext;
use crate::common::{tenant_symbol, Position, TraceBatch};
use rand::rngs::StdRng;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Ephemeral obstacle: appears on a free cell, lives for a fixed lifetime,
/// vacates and reappears elsewhere until no traveler is left.
pub struct WildTenant {
    id: usize,
    rng: StdRng,
    ctx: AgentContext,
    born: Option<Instant>,
    traces: TraceBatch,
}

impl WildTenant {
    pub fn new(id: usize, ctx: AgentContext, rng: StdRng) -> Self {
        Self {
            id,
            rng,
            ctx,
            born: None,
            traces: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.born.is_some()
    }

    pub async fn run(mut self) -> TraceBatch {
        let lifetime = self.ctx.timing.wild_tenant_lifetime();
        loop {
            match self.born {
                None => self.appear().await,
                Some(born) if born.elapsed() > lifetime => self.vacate().await,
                Some(_) => {
                    // relocated onto a trap by an eviction
                    if self.ctx.roster.position(self.id).is_removed() {
                        self.born = None;
                        self.ctx
                            .log
                            .info(&format!("wild tenant {} caught by a trap", self.id));
                    }
                }
            }

            if self.ctx.counters.active_travelers() == 0 {
                break;
            }
            sleep(self.ctx.timing.tenant_poll()).await;
        }

        self.ctx.counters.tenant_finished();
        debug!(tenant = self.id, traces = self.traces.len(), "wild tenant finished");
        self.traces
    }

    /// Tries a bounded number of random cells; gives up silently until the
    /// next poll if none is free.
    pub async fn appear(&mut self) {
        let grid = self.ctx.grid.clone();
        let retry = self.ctx.timing.wild_tenant_lifetime() / 10;

        for _ in 0..self.ctx.arbitration.tenant_placement_attempts {
            let pos = grid.size().random_position(&mut self.rng);
            let cell = grid.cell(pos);

            if cell.try_lock().await {
                let free = !cell.is_occupied().await && !cell.check_trap().await;
                if free {
                    let id = self.id;
                    self.ctx.roster.update(id, |p| {
                        p.position = pos;
                        p.symbol = tenant_symbol(id);
                    });
                    cell.occupy(id).await;
                    self.born = Some(Instant::now());
                    self.record();
                    cell.unlock().await;
                    debug!(tenant = id, x = pos.x, y = pos.y, "wild tenant appeared");
                    return;
                }
                cell.unlock().await;
            }
            sleep(retry).await;
        }
        debug!(tenant = self.id, "no free cell for wild tenant");
    }

    /// Leaves the board if still recorded as the occupant of its cell.
    pub async fn vacate(&mut self) {
        let pos = self.ctx.roster.position(self.id);
        if pos.is_removed() {
            self.born = None;
            return;
        }

        let grid = self.ctx.grid.clone();
        let cell = grid.cell(pos);
        if !cell.try_lock().await {
            return;
        }

        match cell.occupant().await {
            Some(occupant) if occupant == self.id => {
                self.ctx.roster.set_position(self.id, Position::REMOVED);
                cell.clear().await;
                self.record();
                self.born = None;
                debug!(tenant = self.id, x = pos.x, y = pos.y, "wild tenant vacated");
            }
            // moved by an eviction after the position was read; retry there
            _ if self.ctx.roster.position(self.id) != pos => {}
            _ => self.born = None,
        }
        cell.unlock().await;
    }

    fn record(&mut self) {
        if let Some(trace) = self.ctx.roster.trace(self.id, &self.ctx.clock) {
            self.traces.push(trace);
        }
    }
}
