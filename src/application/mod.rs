pub mod simulation;
pub mod trace_collector;

pub use simulation::*;
pub use trace_collector::*;
