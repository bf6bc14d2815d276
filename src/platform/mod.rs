//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (`Date.now()` on web, `SystemTime` on native)

pub mod time;

pub use time::{Clock, ManualClock, SystemClock};
