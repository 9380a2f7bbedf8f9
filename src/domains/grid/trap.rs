use crate::common::{Clock, Position, Trace, TRAP_SYMBOL};

/// Static hazard; never moves or changes once placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trap {
    pub id: usize,
    pub position: Position,
}

impl Trap {
    pub fn new(id: usize, position: Position) -> Self {
        Self { id, position }
    }

    pub fn trace(&self, clock: &Clock) -> Trace {
        clock.trace(self.id, self.position, TRAP_SYMBOL)
    }
}
