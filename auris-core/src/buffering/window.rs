//! Fixed-size windowing of a sample buffer.

/// A half-open range of consecutive samples scored as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Index of the first sample.
    pub start: usize,
    /// Number of samples covered. Equals the window size for every window
    /// except possibly the last one of a buffer.
    pub len: usize,
}

impl Window {
    /// Index of the last sample covered (inclusive).
    pub fn last_sample(&self) -> usize {
        self.start + self.len - 1
    }
}

/// Split `total_samples` into consecutive windows of `window_samples`.
///
/// The returned windows partition `[0, total_samples)` exactly, in
/// increasing order; only the final window may be short. An empty buffer
/// yields no windows.
pub fn divide(total_samples: usize, window_samples: usize) -> Vec<Window> {
    debug_assert!(window_samples > 0);
    let mut out = Vec::with_capacity(total_samples.div_ceil(window_samples));
    let mut start = 0;
    while start < total_samples {
        let len = window_samples.min(total_samples - start);
        out.push(Window { start, len });
        start += len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(total: usize, size: usize) {
        let windows = divide(total, size);
        assert_eq!(windows.len(), total.div_ceil(size));

        let mut expected_start = 0;
        for (i, w) in windows.iter().enumerate() {
            assert_eq!(w.start, expected_start, "window {i} not contiguous");
            if i + 1 < windows.len() {
                assert_eq!(w.len, size, "only the last window may be short");
            }
            expected_start += w.len;
        }
        assert_eq!(expected_start, total, "window lengths must sum to total");
    }

    #[test]
    fn empty_buffer_yields_no_windows() {
        assert!(divide(0, 512).is_empty());
    }

    #[test]
    fn exact_division_has_no_short_window() {
        let windows = divide(2_048, 512);
        assert_eq!(windows.len(), 4);
        assert!(windows.iter().all(|w| w.len == 512));
        assert_eq!(windows[3].last_sample(), 2_047);
    }

    #[test]
    fn trailing_remainder_becomes_a_short_window() {
        let windows = divide(1_000, 512);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1], Window { start: 512, len: 488 });
        assert_eq!(windows[1].last_sample(), 999);
    }

    #[test]
    fn buffer_shorter_than_one_window() {
        let windows = divide(100, 512);
        assert_eq!(windows, vec![Window { start: 0, len: 100 }]);
    }

    #[test]
    fn partitions_for_assorted_sizes() {
        for total in [1, 511, 512, 513, 1_000, 16_000, 31_999, 32_000] {
            for size in [1, 256, 512, 1_536] {
                assert_partition(total, size);
            }
        }
    }
}
