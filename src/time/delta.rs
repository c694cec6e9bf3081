//! 时间差计算
//!
//! 计算两个时间点的绝对差值与先后关系。同秒分支只比较纳秒分量；
//! 跨秒时从晚者减去早者并做借位归一，保证结果的纳秒分量不为负。

use std::cmp::Ordering;
use std::time::Duration;

use super::clock::{Timestamp, NANOS_PER_SEC};

/// 计算 t1、t2 的绝对时间差，并返回 t2 相对 t1 的先后关系
///
/// 返回的 Ordering 等价于 `t2 - t1` 的符号：t2 晚于 t1 为 Greater，
/// 相同时间点为 Equal。
pub fn diff(t1: Timestamp, t2: Timestamp) -> (Duration, Ordering) {
    if t1.secs == t2.secs {
        let delta = t2.nanos.abs_diff(t1.nanos);
        return (Duration::new(0, delta), t2.nanos.cmp(&t1.nanos));
    }

    if t1.secs < t2.secs {
        (sub(t2, t1), Ordering::Greater)
    } else {
        (sub(t1, t2), Ordering::Less)
    }
}

/// 晚者减早者，纳秒不足时向秒借位
fn sub(later: Timestamp, earlier: Timestamp) -> Duration {
    if later.nanos >= earlier.nanos {
        Duration::new(later.secs - earlier.secs, later.nanos - earlier.nanos)
    } else {
        Duration::new(
            later.secs - 1 - earlier.secs,
            later.nanos + NANOS_PER_SEC as u32 - earlier.nanos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_equal_points() {
        let t = Timestamp::new(5, 123_456_789);
        assert_eq!(diff(t, t), (Duration::ZERO, Ordering::Equal));
    }

    #[test]
    fn test_diff_same_second() {
        let t1 = Timestamp::new(7, 100);
        let t2 = Timestamp::new(7, 350);
        assert_eq!(diff(t1, t2), (Duration::from_nanos(250), Ordering::Greater));
        assert_eq!(diff(t2, t1), (Duration::from_nanos(250), Ordering::Less));
    }

    #[test]
    fn test_diff_cross_second_borrow() {
        // 纳秒分量需要向秒借位
        let t1 = Timestamp::new(1, 900_000_000);
        let t2 = Timestamp::new(2, 100_000_000);
        let (d, ord) = diff(t1, t2);
        assert_eq!(d, Duration::from_millis(200));
        assert_eq!(ord, Ordering::Greater);
    }

    #[test]
    fn test_diff_whole_seconds() {
        let t1 = Timestamp::new(2, 400);
        let t2 = Timestamp::new(10, 500);
        assert_eq!(diff(t1, t2), (Duration::new(8, 100), Ordering::Greater));
    }

    #[test]
    fn test_diff_symmetric_abs() {
        let points = [
            (Timestamp::new(0, 0), Timestamp::new(0, 1)),
            (Timestamp::new(3, 999_999_999), Timestamp::new(4, 0)),
            (Timestamp::new(10, 500), Timestamp::new(2, 400)),
        ];
        for (a, b) in points {
            let (d1, o1) = diff(a, b);
            let (d2, o2) = diff(b, a);
            assert_eq!(d1, d2, "absolute difference must be symmetric");
            assert_eq!(o1, o2.reverse(), "orderings must be inverse");
        }
    }
}
