pub mod error;
pub mod position;
pub mod signal;
pub mod trace;

pub use error::*;
pub use position::*;
pub use signal::*;
pub use trace::*;
