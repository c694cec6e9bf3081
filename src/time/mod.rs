//! 时间原语模块
//!
//! 包含：
//! - Timestamp: 原始单调时间点（秒 + 纳秒）
//! - Clock: 单调时钟接口与系统实现
//! - diff: 时间差与先后关系计算

pub mod clock;
pub mod delta;

pub use clock::{Clock, ClockError, Monotonic, Timestamp};
pub use delta::diff;
