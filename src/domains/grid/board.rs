use super::{CellActor, CellHandle, CellSettings, CellSnapshot};
use crate::common::{BoardSize, Clock, DomainResult, Position, TraceQueue};
use crate::config::Config;
use crate::domains::agents::Roster;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

impl CellSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lock_timeout: config.timing.lock_timeout(),
            trigger_pause: config.timing.min_delay(),
            inbox_capacity: config.arbitration.cell_inbox_capacity,
        }
    }
}

/// Totals of one cell-log export.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub batches: usize,
    pub traces: usize,
}

/// Toroidal matrix of cell actors.
pub struct Grid {
    size: BoardSize,
    cells: Vec<CellHandle>,
    workers: Vec<JoinHandle<()>>,
}

impl Grid {
    /// Spawns one actor per cell. Each actor gets its own random stream
    /// derived from `seed`.
    pub fn spawn(
        size: BoardSize,
        roster: Arc<Roster>,
        clock: Clock,
        settings: CellSettings,
        seed: u64,
    ) -> Self {
        let (cells, workers) = size
            .positions()
            .enumerate()
            .map(|(index, position)| {
                let rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
                CellActor::spawn(position, roster.clone(), clock, rng, settings)
            })
            .unzip();
        Self {
            size,
            cells,
            workers,
        }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Handle of the cell at `pos`; coordinates wrap around the torus.
    pub fn cell(&self, pos: Position) -> &CellHandle {
        &self.cells[self.size.index(pos)]
    }

    pub fn cells(&self) -> &[CellHandle] {
        &self.cells
    }

    /// Distinct toroidal neighbors of `pos`, excluding `pos` itself.
    pub fn neighbors(&self, pos: Position) -> Vec<CellHandle> {
        let origin = self.size.wrap(pos.x, pos.y);
        let mut seen = Vec::with_capacity(4);
        for neighbor in self.size.neighbors(origin) {
            if neighbor != origin && !seen.contains(&neighbor) {
                seen.push(neighbor);
            }
        }
        seen.into_iter().map(|p| self.cell(p).clone()).collect()
    }

    /// Evicts a wild tenant from `pos` if there is one. Bounded by the
    /// lock timeout; `false` means the tenant is still there.
    pub async fn move_wild_tenant(&self, pos: Position) -> bool {
        self.cell(pos).move_wild_tenant(self.neighbors(pos)).await
    }

    /// Exports every non-empty cell log into `queue`, one task per cell.
    pub async fn export_traces(&self, queue: &TraceQueue) -> ExportSummary {
        let mut exports = JoinSet::new();
        for cell in &self.cells {
            let cell = cell.clone();
            let queue = queue.clone();
            exports.spawn(async move {
                let traces = cell.export_traces().await;
                let count = traces.len();
                if count == 0 || queue.send(traces).await.is_err() {
                    return 0;
                }
                count
            });
        }

        let mut summary = ExportSummary::default();
        while let Some(result) = exports.join_next().await {
            match result {
                Ok(0) => {}
                Ok(count) => {
                    summary.batches += 1;
                    summary.traces += count;
                }
                Err(e) => warn!("cell export task failed: {}", e),
            }
        }
        debug!(batches = summary.batches, traces = summary.traces, "cell logs exported");
        summary
    }

    /// Current state of every cell, in row-major order.
    pub async fn snapshot(&self) -> DomainResult<Vec<CellSnapshot>> {
        let mut snapshots = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            snapshots.push(cell.inspect().await?);
        }
        Ok(snapshots)
    }

    /// Drops every handle held by the grid and waits for the actors to
    /// drain. Actors stop once no handle to them remains anywhere.
    pub async fn shutdown(self) {
        drop(self.cells);
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!("cell actor ended abnormally: {}", e);
            }
        }
    }
}
