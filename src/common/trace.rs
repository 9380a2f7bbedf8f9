use crate::common::Position;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Symbol used for trap records.
pub const TRAP_SYMBOL: char = '#';
/// Symbol of a wild tenant that walked into a trap.
pub const TRIGGERED_TENANT_SYMBOL: char = '*';

pub fn traveler_symbol(id: usize) -> char {
    (b'A' + (id % 26) as u8) as char
}

pub fn tenant_symbol(id: usize) -> char {
    (b'0' + (id % 10) as u8) as char
}

/// Timestamped record of an entity's position and symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
    pub timestamp: Duration,
    pub id: usize,
    pub position: Position,
    pub symbol: char,
}

pub type TraceBatch = Vec<Trace>;

/// Producer side of the collector's queue.
pub type TraceQueue = mpsc::Sender<TraceBatch>;

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.9} {} {} {} {}",
            self.timestamp.as_secs_f64(),
            self.id,
            self.position.x,
            self.position.y,
            self.symbol
        )
    }
}

/// First line of the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceHeader {
    pub entity_count: usize,
    pub width: usize,
    pub height: usize,
}

impl fmt::Display for TraceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-1 {} {} {}", self.entity_count, self.width, self.height)
    }
}

/// Simulation clock; every trace is stamped relative to its start.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn trace(&self, id: usize, position: Position, symbol: char) -> Trace {
        Trace {
            timestamp: self.elapsed(),
            id,
            position,
            symbol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_line_uses_nine_decimals() {
        let trace = Trace {
            timestamp: Duration::from_millis(1500),
            id: 3,
            position: Position::new(4, 7),
            symbol: 'D',
        };
        assert_eq!(trace.to_string(), "1.500000000 3 4 7 D");
    }

    #[test]
    fn symbols_cycle() {
        assert_eq!(traveler_symbol(0), 'A');
        assert_eq!(traveler_symbol(27), 'B');
        assert_eq!(tenant_symbol(15), '5');
    }
}
