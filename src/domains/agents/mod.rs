pub mod context;
pub mod counters;
pub mod player;
pub mod traveler;
pub mod wild_tenant;

pub use context::*;
pub use counters::*;
pub use player::*;
pub use traveler::*;
pub use wild_tenant::*;
