pub mod agents;
pub mod grid;
pub mod logger;
pub mod ports;

pub use agents::*;
pub use grid::*;
pub use logger::*;
pub use ports::*;
