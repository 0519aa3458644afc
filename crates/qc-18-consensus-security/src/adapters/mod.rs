//! Adapters layer (Hexagonal Architecture)

mod audit;
mod cache;
mod time;

pub use audit::*;
pub use cache::*;
pub use time::*;
