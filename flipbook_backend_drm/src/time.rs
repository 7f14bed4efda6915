// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host clock reads for the DRM backend.

use flipbook_core::time::HostTime;
use rustix::time::{ClockId, Timespec, clock_gettime};

/// Returns the current `CLOCK_MONOTONIC` time in nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    timespec_to_host_time(clock_gettime(ClockId::Monotonic))
}

fn timespec_to_host_time(timespec: Timespec) -> HostTime {
    let seconds = u64::try_from(timespec.tv_sec).unwrap_or(0);
    let nanos = u64::try_from(timespec.tv_nsec)
        .unwrap_or(0)
        .min(999_999_999);

    let ticks = u128::from(seconds)
        .saturating_mul(1_000_000_000)
        .saturating_add(u128::from(nanos));
    HostTime(u64::try_from(ticks).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_monotonic_non_decreasing() {
        let first = now();
        let second = now();
        assert!(second >= first, "monotonic clock should not go backwards");
    }

    #[test]
    fn timespec_conversion_builds_nanosecond_ticks() {
        let input = Timespec {
            tv_sec: 12,
            tv_nsec: 345_678_901,
        };
        assert_eq!(
            timespec_to_host_time(input),
            HostTime(12 * 1_000_000_000 + 345_678_901)
        );
    }

    #[test]
    fn timespec_conversion_saturates_on_large_values() {
        let input = Timespec {
            tv_sec: i64::MAX,
            tv_nsec: 999_999_999,
        };
        assert_eq!(timespec_to_host_time(input), HostTime(u64::MAX));
    }
}
