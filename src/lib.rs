//! Rate Sync Library
//!
//! Audio-rate time synchronization engine for realtime stream scheduling.

pub mod sync;
pub mod time;

pub use sync::{RateSync, SyncMode, SyncReport, SyncStats};
pub use time::{diff, Clock, ClockError, Monotonic, Timestamp};
