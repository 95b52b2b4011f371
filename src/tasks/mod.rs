//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - Reaper: removes expired cache entries at a configured period

mod reaper;

pub use reaper::{Reaper, SHUTDOWN_GRACE};
