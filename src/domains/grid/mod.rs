pub mod board;
pub mod cell;
pub mod trap;

pub use board::*;
pub use cell::*;
pub use trap::*;
