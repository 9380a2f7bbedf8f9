pub mod buffered_logger;
pub mod console_logger;
pub mod file_logger;
pub mod memory_sink;
pub mod multi_logger;
pub mod noop_logger;
pub mod stdout_sink;

pub use buffered_logger::*;
pub use console_logger::*;
pub use file_logger::*;
pub use memory_sink::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use stdout_sink::*;
