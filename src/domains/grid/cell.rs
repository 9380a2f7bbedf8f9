use super::Trap;
use crate::common::{Clock, DomainError, DomainResult, Position, Trace, TRIGGERED_TENANT_SYMBOL};
use crate::domains::agents::Roster;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Commands accepted by a cell actor. Each one is processed to completion
/// before the next is dequeued.
pub enum CellCommand {
    TryLock { reply: oneshot::Sender<bool> },
    Unlock { done: oneshot::Sender<()> },
    Occupy { occupant: usize, done: oneshot::Sender<()> },
    Clear { done: oneshot::Sender<()> },
    AddTrap { trap: Trap, done: oneshot::Sender<()> },
    CheckTrap { reply: oneshot::Sender<bool> },
    IsOccupied { reply: oneshot::Sender<bool> },
    Occupant { reply: oneshot::Sender<Option<usize>> },
    StoreTrace { done: oneshot::Sender<()> },
    ExportTraces { reply: oneshot::Sender<Vec<Trace>> },
    MoveWildTenant {
        neighbors: Vec<CellHandle>,
        reply: oneshot::Sender<bool>,
    },
    Inspect { reply: oneshot::Sender<CellSnapshot> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSnapshot {
    pub position: Position,
    pub locked: bool,
    pub occupant: Option<usize>,
    pub trapped: bool,
    pub trace_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct CellSettings {
    /// Deadline applied to `try_lock` and `move_wild_tenant`.
    pub lock_timeout: Duration,
    /// Pause between a trap firing and its victim leaving the board.
    pub trigger_pause: Duration,
    pub inbox_capacity: usize,
}

/// Cloneable address of a cell actor.
#[derive(Clone)]
pub struct CellHandle {
    position: Position,
    sender: mpsc::Sender<CellCommand>,
    lock_timeout: Duration,
}

impl CellHandle {
    pub fn position(&self) -> Position {
        self.position
    }

    pub async fn try_lock(&self) -> bool {
        let granted = self
            .bounded(|reply| CellCommand::TryLock { reply })
            .await
            .unwrap_or(false);
        debug!(x = self.position.x, y = self.position.y, granted, "try_lock");
        granted
    }

    pub async fn unlock(&self) {
        self.acknowledged(|done| CellCommand::Unlock { done }).await
    }

    pub async fn occupy(&self, occupant: usize) {
        self.acknowledged(|done| CellCommand::Occupy { occupant, done })
            .await
    }

    pub async fn clear(&self) {
        self.acknowledged(|done| CellCommand::Clear { done }).await
    }

    pub async fn add_trap(&self, trap: Trap) {
        self.acknowledged(|done| CellCommand::AddTrap { trap, done })
            .await
    }

    pub async fn check_trap(&self) -> bool {
        self.request(|reply| CellCommand::CheckTrap { reply })
            .await
            .unwrap_or(false)
    }

    pub async fn is_occupied(&self) -> bool {
        self.request(|reply| CellCommand::IsOccupied { reply })
            .await
            .unwrap_or(false)
    }

    pub async fn occupant(&self) -> Option<usize> {
        self.request(|reply| CellCommand::Occupant { reply })
            .await
            .flatten()
    }

    pub async fn store_trace(&self) {
        self.acknowledged(|done| CellCommand::StoreTrace { done })
            .await
    }

    pub async fn export_traces(&self) -> Vec<Trace> {
        self.request(|reply| CellCommand::ExportTraces { reply })
            .await
            .unwrap_or_default()
    }

    pub async fn inspect(&self) -> DomainResult<CellSnapshot> {
        self.request(|reply| CellCommand::Inspect { reply })
            .await
            .ok_or_else(|| DomainError::CellUnavailable {
                x: self.position.x,
                y: self.position.y,
            })
    }

    /// Asks this cell to push its wild tenant (if any) onto one of
    /// `neighbors`. `true` means the cell no longer holds a wild tenant.
    pub async fn move_wild_tenant(&self, neighbors: Vec<CellHandle>) -> bool {
        let moved = self
            .bounded(|reply| CellCommand::MoveWildTenant { neighbors, reply })
            .await
            .unwrap_or(false);
        debug!(x = self.position.x, y = self.position.y, moved, "move_wild_tenant");
        moved
    }

    /// Freezes `victim` on this (trapped, occupied) cell: one trace with the
    /// triggered symbol, then the victim leaves the board and the cell keeps
    /// only the trap.
    pub async fn spring_trap(
        &self,
        roster: &Roster,
        victim: usize,
        triggered: char,
        pause: Duration,
    ) {
        roster.update(victim, |p| p.symbol = triggered);
        self.store_trace().await;
        sleep(pause).await;
        roster.set_position(victim, Position::REMOVED);
        self.clear().await;
        self.store_trace().await;
        debug!(x = self.position.x, y = self.position.y, victim, "trap fired");
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> CellCommand,
    ) -> Option<T> {
        let (reply, response) = oneshot::channel();
        if self.sender.send(make(reply)).await.is_err() {
            warn!(x = self.position.x, y = self.position.y, "cell actor is gone");
            return None;
        }
        response.await.ok()
    }

    async fn acknowledged(&self, make: impl FnOnce(oneshot::Sender<()>) -> CellCommand) {
        let _ = self.request(make).await;
    }

    /// Request with a deadline. After the deadline the reply slot is closed,
    /// so the actor sees its reply as undeliverable and applies nothing; a
    /// reply that landed before the close is still honored.
    async fn bounded<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> CellCommand,
    ) -> Option<T> {
        let (reply, mut response) = oneshot::channel();
        let command = make(reply);
        let exchange = async {
            self.sender.send(command).await.ok()?;
            (&mut response).await.ok()
        };
        let outcome = timeout(self.lock_timeout, exchange).await;
        match outcome {
            Ok(value) => value,
            Err(_) => {
                response.close();
                response.try_recv().ok()
            }
        }
    }
}

pub struct CellActor {
    position: Position,
    locked: bool,
    occupant: Option<usize>,
    trap: Option<Trap>,
    traces: Vec<Trace>,
    roster: Arc<Roster>,
    clock: Clock,
    rng: StdRng,
    trigger_pause: Duration,
}

impl CellActor {
    pub fn spawn(
        position: Position,
        roster: Arc<Roster>,
        clock: Clock,
        rng: StdRng,
        settings: CellSettings,
    ) -> (CellHandle, JoinHandle<()>) {
        let (sender, inbox) = mpsc::channel(settings.inbox_capacity);
        let actor = Self {
            position,
            locked: false,
            occupant: None,
            trap: None,
            traces: Vec::new(),
            roster,
            clock,
            rng,
            trigger_pause: settings.trigger_pause,
        };
        let worker = tokio::spawn(actor.run(inbox));
        let handle = CellHandle {
            position,
            sender,
            lock_timeout: settings.lock_timeout,
        };
        (handle, worker)
    }

    async fn run(mut self, mut inbox: mpsc::Receiver<CellCommand>) {
        while let Some(command) = inbox.recv().await {
            self.handle(command).await;
        }
        debug!(x = self.position.x, y = self.position.y, "cell actor stopped");
    }

    async fn handle(&mut self, command: CellCommand) {
        match command {
            CellCommand::TryLock { reply } => {
                // The flag is only set once the grant has been delivered.
                if self.locked {
                    let _ = reply.send(false);
                } else if reply.send(true).is_ok() {
                    self.locked = true;
                }
            }
            CellCommand::Unlock { done } => {
                self.locked = false;
                let _ = done.send(());
            }
            CellCommand::Occupy { occupant, done } => {
                self.occupant = Some(occupant);
                let _ = done.send(());
            }
            CellCommand::Clear { done } => {
                self.occupant = None;
                let _ = done.send(());
            }
            CellCommand::AddTrap { trap, done } => {
                self.trap = Some(trap);
                let _ = done.send(());
            }
            CellCommand::CheckTrap { reply } => {
                let _ = reply.send(self.trap.is_some());
            }
            CellCommand::IsOccupied { reply } => {
                let _ = reply.send(self.occupant.is_some());
            }
            CellCommand::Occupant { reply } => {
                let _ = reply.send(self.occupant);
            }
            CellCommand::StoreTrace { done } => {
                self.record_trace();
                let _ = done.send(());
            }
            CellCommand::ExportTraces { reply } => {
                let _ = reply.send(self.traces.clone());
            }
            CellCommand::MoveWildTenant { neighbors, reply } => {
                self.move_wild_tenant(neighbors, reply).await;
            }
            CellCommand::Inspect { reply } => {
                let _ = reply.send(CellSnapshot {
                    position: self.position,
                    locked: self.locked,
                    occupant: self.occupant,
                    trapped: self.trap.is_some(),
                    trace_count: self.traces.len(),
                });
            }
        }
    }

    fn record_trace(&mut self) {
        let trace = match (self.occupant, &self.trap) {
            (Some(id), _) => self.roster.trace(id, &self.clock),
            (None, Some(trap)) => Some(trap.trace(&self.clock)),
            (None, None) => None,
        };
        self.traces.extend(trace);
    }

    async fn move_wild_tenant(
        &mut self,
        mut neighbors: Vec<CellHandle>,
        reply: oneshot::Sender<bool>,
    ) {
        let tenant = match self.occupant {
            Some(id) if self.roster.is_wild(id) => id,
            _ => {
                let _ = reply.send(true);
                return;
            }
        };

        neighbors.shuffle(&mut self.rng);
        for neighbor in neighbors {
            if reply.is_closed() {
                return;
            }
            if !neighbor.try_lock().await {
                continue;
            }
            if neighbor.is_occupied().await {
                neighbor.unlock().await;
                continue;
            }
            // The neighbor is reserved. Commit only if the requester still
            // waits for the answer.
            if reply.send(true).is_err() {
                neighbor.unlock().await;
                return;
            }
            self.relocate(tenant, &neighbor).await;
            return;
        }

        let _ = reply.send(false);
    }

    /// Moves the tenant onto the reserved `destination`. Only the destination
    /// logs the move; this cell is left empty and untrapped.
    async fn relocate(&mut self, tenant: usize, destination: &CellHandle) {
        destination.occupy(tenant).await;
        self.roster.set_position(tenant, destination.position());
        self.occupant = None;
        debug!(
            tenant,
            from_x = self.position.x,
            from_y = self.position.y,
            to_x = destination.position().x,
            to_y = destination.position().y,
            "wild tenant relocated"
        );

        let trapped = destination.check_trap().await;
        if trapped {
            destination
                .spring_trap(&self.roster, tenant, TRIGGERED_TENANT_SYMBOL, self.trigger_pause)
                .await;
        }
        if !trapped {
            destination.store_trace().await;
            destination.unlock().await;
        }
    }
}
