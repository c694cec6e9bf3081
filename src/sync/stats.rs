//! 同步统计模块
//!
//! 记录每次同步调用的 busy/idle 耗时与等待次数，生成聚合报告。
//! 每路流单线程使用，无需原子操作；采样窗口只保留最近 N 次调用。

use std::fmt;
use std::time::Duration;

use super::rate::expected_interval;

/// 采样窗口大小：聚合只覆盖最近这么多次调用
const SAMPLE_WINDOW: usize = 256;

/// 同步统计收集器
///
/// 宿主在每次 [`RateSync::sync`](super::RateSync::sync) 之后投喂
/// busy/idle 读数与等待标志。
pub struct SyncStats {
    calls: u64,
    waits: u64,
    busy_ns: [u64; SAMPLE_WINDOW],
    idle_ns: [u64; SAMPLE_WINDOW],
    write_idx: usize,
}

impl SyncStats {
    pub fn new() -> Self {
        Self {
            calls: 0,
            waits: 0,
            busy_ns: [0; SAMPLE_WINDOW],
            idle_ns: [0; SAMPLE_WINDOW],
            write_idx: 0,
        }
    }

    /// 记录一次同步调用的结果
    pub fn record(&mut self, busy: Duration, idle: Duration, blocked: bool) {
        let idx = self.write_idx % SAMPLE_WINDOW;
        self.busy_ns[idx] = busy.as_nanos() as u64;
        self.idle_ns[idx] = idle.as_nanos() as u64;
        self.write_idx = self.write_idx.wrapping_add(1);

        self.calls += 1;
        if blocked {
            self.waits += 1;
        }
    }

    /// 窗口内的有效采样数
    fn filled(&self) -> usize {
        self.calls.min(SAMPLE_WINDOW as u64) as usize
    }

    /// 生成聚合报告
    ///
    /// expected 基准按 chunk 帧数与采样率推算，与同步器用同一套整数运算。
    pub fn report(&self, rate: u32, frames_per_chunk: u64) -> SyncReport {
        let n = self.filled();
        SyncReport {
            calls: self.calls,
            waits: self.waits,
            expected_interval_ns: expected_interval(frames_per_chunk, rate).as_nanos() as u64,
            busy: IntervalStats::over(&self.busy_ns[..n]),
            idle: IntervalStats::over(&self.idle_ns[..n]),
        }
    }

    /// 清空统计
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SyncStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 聚合报告
#[derive(Debug)]
pub struct SyncReport {
    pub calls: u64,
    pub waits: u64,
    pub expected_interval_ns: u64,
    pub busy: IntervalStats,
    pub idle: IntervalStats,
}

#[derive(Debug)]
pub struct IntervalStats {
    pub min_ns: u64,
    pub max_ns: u64,
    pub avg_ns: u64,
}

impl IntervalStats {
    fn over(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self {
                min_ns: 0,
                max_ns: 0,
                avg_ns: 0,
            };
        }
        Self {
            min_ns: *samples.iter().min().unwrap(),
            max_ns: *samples.iter().max().unwrap(),
            avg_ns: samples.iter().sum::<u64>() / samples.len() as u64,
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sync Statistics")?;
        writeln!(f, "===============")?;
        writeln!(f, "Total sync calls: {}", self.calls)?;
        writeln!(f, "Calls that waited: {}", self.waits)?;
        writeln!(
            f,
            "Expected chunk interval: {:.2} ms",
            self.expected_interval_ns as f64 / 1_000_000.0
        )?;
        writeln!(f, "Busy time (wall clock between calls):")?;
        write_interval(f, &self.busy)?;
        writeln!(f, "Idle time (compensating sleep / overdue):")?;
        write_interval(f, &self.idle)?;
        Ok(())
    }
}

fn write_interval(f: &mut fmt::Formatter<'_>, stats: &IntervalStats) -> fmt::Result {
    writeln!(f, "  Min: {:.2} ms", stats.min_ns as f64 / 1_000_000.0)?;
    writeln!(f, "  Max: {:.2} ms", stats.max_ns as f64 / 1_000_000.0)?;
    writeln!(f, "  Avg: {:.2} ms", stats.avg_ns as f64 / 1_000_000.0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let stats = SyncStats::new();
        let report = stats.report(48000, 1024);
        assert_eq!(report.calls, 0);
        assert_eq!(report.waits, 0);
        assert_eq!(report.busy.min_ns, 0);
        assert_eq!(report.busy.max_ns, 0);
        assert_eq!(report.idle.avg_ns, 0);
    }

    #[test]
    fn test_record_aggregates() {
        let mut stats = SyncStats::new();
        stats.record(Duration::from_millis(10), Duration::from_millis(2), true);
        stats.record(Duration::from_millis(20), Duration::ZERO, false);
        stats.record(Duration::from_millis(30), Duration::from_millis(4), true);

        let report = stats.report(48000, 480);
        assert_eq!(report.calls, 3);
        assert_eq!(report.waits, 2);
        // 480 * (1e9/48000)ns，整数取整
        assert_eq!(report.expected_interval_ns, 480 * 20833);
        assert_eq!(report.busy.min_ns, 10_000_000);
        assert_eq!(report.busy.max_ns, 30_000_000);
        assert_eq!(report.busy.avg_ns, 20_000_000);
        assert_eq!(report.idle.avg_ns, 2_000_000);
    }

    #[test]
    fn test_window_wraps() {
        let mut stats = SyncStats::new();
        for i in 0..(SAMPLE_WINDOW + 10) {
            stats.record(Duration::from_nanos(i as u64), Duration::ZERO, false);
        }

        let report = stats.report(44100, 1024);
        assert_eq!(report.calls, (SAMPLE_WINDOW + 10) as u64);
        // 窗口只保留最近 SAMPLE_WINDOW 个采样，最早的 10 个已被覆盖
        assert_eq!(report.busy.min_ns, 10);
        assert_eq!(report.busy.max_ns, (SAMPLE_WINDOW + 10 - 1) as u64);
    }

    #[test]
    fn test_reset_clears() {
        let mut stats = SyncStats::new();
        stats.record(Duration::from_millis(5), Duration::ZERO, true);
        stats.reset();

        let report = stats.report(48000, 1024);
        assert_eq!(report.calls, 0);
        assert_eq!(report.waits, 0);
    }
}
