//! 采样率时间同步
//!
//! 按已传输帧数推算音频时间应当前进多少，与单调时钟的实际流逝对比：
//! 流超前于真实时间就 sleep 补偿，滞后则立即返回。
//!
//! 两阶段跟踪：
//! - Startup: 以上次调用为参考点做逐次短区间跟踪。启动初期调度抖动大，
//!   直接锚定长期参考点会在 play/pause 之后出现可闻的卡顿
//! - Steady: 帧计数跨过阈值后切换，锚定单一参考时间戳做长期跟踪，
//!   避免短区间误差累计在数小时连续播放后造成 XRUN
//!
//! 切换单向，每个生命周期至多一次。阈值与阻尼系数都是经验调参值。

use std::cmp::Ordering;
use std::time::Duration;

use log::debug;

use crate::time::clock::NANOS_PER_SEC;
use crate::time::{diff, Clock, ClockError, Monotonic, Timestamp};

/// Startup → Steady 切换的帧数阈值（经验值）
pub const FRAME_THRESHOLD: u64 = 200_000;

/// Startup 模式下 idle 时间的阻尼系数
///
/// 短区间估计噪声大，只做部分补偿以免振荡（经验值）。
pub const STARTUP_DAMPING: f64 = 0.5;

/// 同步跟踪模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// 启动窗口：逐次短区间跟踪
    Startup,
    /// 稳态：锚定单一参考时间戳的长期跟踪
    Steady,
}

/// 采样率时间同步器（每路音频流一个实例）
///
/// 单线程使用；唯一的阻塞点是 [`sync`](RateSync::sync) 内部的补偿等待。
pub struct RateSync<C: Clock = Monotonic> {
    clock: C,
    /// 采样率（帧/秒），实例生命周期内不变
    rate: u32,
    /// 自上次计数器重置以来累计的帧数
    frames: u64,
    mode: SyncMode,
    /// 稳态参考时间戳（模式切换时从 ts 快照）
    ts0: Timestamp,
    /// 上次 sync 调用结束时的时间戳
    ts: Timestamp,
    /// 上次调用到本次调用之间的壁钟时间（诊断量）
    ts_busy: Duration,
    /// 上次计算出的 idle 时间：发生等待时为实际睡眠时长，
    /// 未等待时为已落后于计划的 overdue 时长
    ts_idle: Duration,
}

impl RateSync<Monotonic> {
    /// 以系统单调时钟创建同步器
    ///
    /// # Panics
    ///
    /// rate 为 0 时 panic。
    pub fn new(rate: u32) -> Result<Self, ClockError> {
        Self::with_clock(rate, Monotonic)
    }
}

impl<C: Clock> RateSync<C> {
    /// 以指定时钟创建同步器（测试注入假时钟用）
    pub fn with_clock(rate: u32, clock: C) -> Result<Self, ClockError> {
        assert!(rate > 0, "sample rate must be positive");
        let now = clock.now()?;
        Ok(Self {
            clock,
            rate,
            frames: 0,
            mode: SyncMode::Startup,
            ts0: now,
            ts: now,
            ts_busy: Duration::ZERO,
            ts_idle: Duration::ZERO,
        })
    }

    /// 流停止/重启时必须调用：清零帧计数并开启新的生命周期
    ///
    /// 时间推算依赖帧计数器保持线性，跨越停止边界继续累计会使其失效。
    pub fn reset(&mut self) -> Result<(), ClockError> {
        let now = self.clock.now()?;
        self.frames = 0;
        self.mode = SyncMode::Startup;
        self.ts0 = now;
        self.ts = now;
        self.ts_busy = Duration::ZERO;
        self.ts_idle = Duration::ZERO;
        Ok(())
    }

    /// 每传输一个 chunk 调用一次，必要时阻塞以维持恒定速率
    ///
    /// 返回本次是否发生了补偿等待。时钟读取失败时返回 [`ClockError`]：
    /// 首次读取失败不会触碰任何状态；末尾刷新失败则 ts 已过期，
    /// 调用方应视本流计时不可信并 [`reset`](RateSync::reset) 后再继续。
    pub fn sync(&mut self, frames: u64) -> Result<bool, ClockError> {
        // 先读时钟：失败时保持状态原样
        let now = self.clock.now()?;

        self.frames += frames;
        self.engage_steady(frames);

        let (span_frames, reference) = match self.mode {
            SyncMode::Steady => (self.frames, self.ts0),
            SyncMode::Startup => (frames, self.ts),
        };

        let expected = expected_interval(span_frames, self.rate);

        // 诊断量：两次调用之间的壁钟耗时，不参与调度决策
        self.ts_busy = diff(self.ts, now).0;

        // 自参考点的实际流逝，与该帧数应占用的音频时长做三路比较
        let running = diff(reference, now).0;
        let (idle, ahead) = diff(Timestamp::from(running), Timestamp::from(expected));
        self.ts_idle = idle;

        let blocked = ahead == Ordering::Greater;
        if blocked {
            if self.mode == SyncMode::Startup {
                self.ts_idle = self.ts_idle.mul_f64(STARTUP_DAMPING);
            }
            self.clock.sleep(self.ts_idle);
        }

        self.ts = self.clock.now()?;
        Ok(blocked)
    }

    /// 单向切换到稳态模式，每个生命周期至多触发一次
    fn engage_steady(&mut self, chunk: u64) {
        if self.mode == SyncMode::Steady {
            return;
        }
        if self.frames >= FRAME_THRESHOLD {
            debug!(
                "steady sync mode engaged ({} frames accumulated)",
                self.frames
            );
            self.mode = SyncMode::Steady;
            // 丢弃启动窗口的累计值，从本 chunk 重新起算
            self.frames = chunk;
            self.ts0 = self.ts;
        }
    }

    /// 采样率（帧/秒）
    #[inline]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// 当前计数周期内累计的帧数
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 当前跟踪模式
    #[inline]
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// 上次调用到本次调用之间的壁钟时间
    #[inline]
    pub fn busy(&self) -> Duration {
        self.ts_busy
    }

    /// busy 时间的微秒表示
    #[inline]
    pub fn busy_usec(&self) -> u64 {
        self.ts_busy.as_micros() as u64
    }

    /// 上次计算出的 idle / overdue 时长
    #[inline]
    pub fn idle(&self) -> Duration {
        self.ts_idle
    }

    /// 上次 sync 调用结束时的时间戳
    #[inline]
    pub fn last_sync(&self) -> Timestamp {
        self.ts
    }

    /// 稳态参考时间戳
    #[inline]
    pub fn reference(&self) -> Timestamp {
        self.ts0
    }
}

/// 按采样率推算 frames 帧对应的音频时长
///
/// 纯整数运算：整秒部分整除，余数乘以每帧纳秒数，重复调用无舍入漂移。
pub(crate) fn expected_interval(frames: u64, rate: u32) -> Duration {
    let rate = u64::from(rate);
    let secs = frames / rate;
    let nanos = (frames % rate) * (NANOS_PER_SEC / rate);
    Duration::new(secs, nanos as u32)
}
