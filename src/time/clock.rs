//! 单调时钟
//!
//! 同步计算只能依赖单调时间源：壁钟会被 NTP 校正和时区调整扰动，
//! 而补偿调度需要知道的是"真实流逝了多少"。
//!
//! Linux 上优先 CLOCK_MONOTONIC_RAW（不受 NTP 频率微调影响），
//! 其他 unix 平台退回 CLOCK_MONOTONIC；非 unix 平台用进程级
//! Instant 锚点模拟单调读数。

use std::time::Duration;

use thiserror::Error;

/// 每秒纳秒数
pub(crate) const NANOS_PER_SEC: u64 = 1_000_000_000;

/// 原始单调时间点（整秒 + 秒内纳秒）
///
/// 纳秒分量始终在 [0, 1e9) 区间内。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(secs: u64, nanos: u32) -> Self {
        debug_assert!(nanos < NANOS_PER_SEC as u32);
        Self { secs, nanos }
    }
}

impl From<Duration> for Timestamp {
    fn from(d: Duration) -> Self {
        Self::new(d.as_secs(), d.subsec_nanos())
    }
}

impl From<Timestamp> for Duration {
    fn from(t: Timestamp) -> Self {
        Duration::new(t.secs, t.nanos)
    }
}

/// 单调时钟读取失败
///
/// 唯一的错误类型：底层时钟读数失败（平台时钟不可用）。
/// 出现后当次调用的时间账目不可信，调用方应 reset 后再继续。
#[derive(Debug, Error)]
#[error("monotonic clock read failed: {0}")]
pub struct ClockError(#[from] pub std::io::Error);

/// 时钟接口：单调读数 + 阻塞等待
///
/// 生产实现为 [`Monotonic`]；测试通过注入假时钟模拟任意时间流逝。
pub trait Clock {
    /// 读取当前单调时间
    fn now(&self) -> Result<Timestamp, ClockError>;

    /// 阻塞当前线程指定时长
    fn sleep(&self, duration: Duration);
}

/// 系统单调时钟
#[derive(Clone, Copy, Debug, Default)]
pub struct Monotonic;

#[cfg(unix)]
impl Clock for Monotonic {
    fn now(&self) -> Result<Timestamp, ClockError> {
        // MONOTONIC_RAW 不受 adjtime/NTP 频率校正影响
        #[cfg(any(target_os = "linux", target_os = "android"))]
        const CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        const CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC;

        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        if unsafe { libc::clock_gettime(CLOCK_ID, &mut ts) } != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(Timestamp::new(ts.tv_sec as u64, ts.tv_nsec as u32))
    }

    fn sleep(&self, duration: Duration) {
        let mut req = libc::timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as _,
        };
        loop {
            let mut rem = libc::timespec {
                tv_sec: 0,
                tv_nsec: 0,
            };
            if unsafe { libc::nanosleep(&req, &mut rem) } == 0 {
                return;
            }
            // 被信号打断：以剩余时长继续补足
            if std::io::Error::last_os_error().raw_os_error() == Some(libc::EINTR) {
                req = rem;
                continue;
            }
            // 其他失败：截断本次等待，调用方随后仍会刷新时间戳
            return;
        }
    }
}

#[cfg(not(unix))]
impl Clock for Monotonic {
    fn now(&self) -> Result<Timestamp, ClockError> {
        use std::sync::OnceLock;
        use std::time::Instant;

        // 进程级锚点，只初始化一次；Instant 保证单调
        static ANCHOR: OnceLock<Instant> = OnceLock::new();
        let anchor = ANCHOR.get_or_init(Instant::now);
        Ok(Timestamp::from(anchor.elapsed()))
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
