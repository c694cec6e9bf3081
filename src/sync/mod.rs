//! 同步核心模块
//!
//! 包含：
//! - RateSync: 采样率时间同步器（状态机 + 补偿决策）
//! - SyncStats: 每路流的同步诊断统计

pub mod rate;
pub mod stats;

pub use rate::{RateSync, SyncMode, FRAME_THRESHOLD, STARTUP_DAMPING};
pub use stats::{IntervalStats, SyncReport, SyncStats};
