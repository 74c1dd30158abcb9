use std::collections::BTreeMap;

use crate::utils::ewma;

/// Maps window size (datagrams) to the smoothed delay (ms) observed while the
/// window had that size.
///
/// Keys are only ever added. Iteration is in ascending window order, which
/// both `smooth` and `closest_window` rely on.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayProfile {
    delays: BTreeMap<u32, f64>,
    alpha: f64,
    smoothing_threshold: f64,
}

impl DelayProfile {
    pub fn new(alpha: f64, smoothing_threshold_ms: f64) -> Self {
        Self {
            delays: BTreeMap::new(),
            alpha,
            smoothing_threshold: smoothing_threshold_ms,
        }
    }

    pub fn record(&mut self, window: u32, delay_ms: f64) {
        self.delays
            .entry(window)
            .and_modify(|d| *d = ewma(*d, delay_ms, self.alpha))
            .or_insert(delay_ms);
    }

    #[cfg(test)]
    pub fn get(&self, window: u32) -> Option<f64> {
        self.delays.get(&window).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// The largest profiled window and its delay.
    pub fn largest(&self) -> Option<(u32, f64)> {
        self.delays.last_key_value().map(|(w, d)| (*w, *d))
    }

    /// Clamp outliers so that neighbouring windows differ by at most the
    /// smoothing threshold. Each entry is compared against its already
    /// smoothed predecessor, so a second pass is a no-op.
    pub fn smooth(&mut self) {
        let threshold = self.smoothing_threshold;
        let mut prev: Option<f64> = None;
        for delay in self.delays.values_mut() {
            if let Some(prev) = prev {
                *delay = delay.clamp(prev - threshold, prev + threshold);
            }
            prev = Some(*delay);
        }
    }

    /// Window whose delay is closest to `target_ms`. On ties the smallest
    /// window wins. None if nothing was recorded yet.
    pub fn closest_window(&self, target_ms: f64) -> Option<u32> {
        let mut best: Option<(u32, f64)> = None;
        for (window, delay) in self.delays.iter() {
            let diff = (delay - target_ms).abs();
            match best {
                Some((_, best_diff)) if best_diff <= diff => {}
                _ => best = Some((*window, diff)),
            }
        }
        best.map(|(w, _)| w)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::DelayProfile;

    fn profile_from(entries: &[(u32, f64)]) -> DelayProfile {
        let mut p = DelayProfile::new(0.5, 10.);
        for (w, d) in entries {
            p.record(*w, *d);
        }
        p
    }

    #[test]
    fn test_record_inserts_then_blends() {
        let mut p = DelayProfile::new(0.7, 10.);
        p.record(10, 100.);
        assert_abs_diff_eq!(p.get(10).unwrap(), 100.);

        p.record(10, 0.);
        assert_abs_diff_eq!(p.get(10).unwrap(), 70.);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_smooth_clamps_outliers() {
        let mut p = profile_from(&[(5, 20.), (6, 80.), (7, 25.), (8, 0.)]);
        p.smooth();
        assert_abs_diff_eq!(p.get(5).unwrap(), 20.);
        assert_abs_diff_eq!(p.get(6).unwrap(), 30.);
        assert_abs_diff_eq!(p.get(7).unwrap(), 25.);
        assert_abs_diff_eq!(p.get(8).unwrap(), 15.);
    }

    #[test]
    fn test_smooth_idempotent() {
        let mut p = profile_from(&[(3, 50.), (4, 10.), (9, 90.), (12, 12.), (20, 200.)]);
        p.smooth();
        let once = p.clone();
        p.smooth();
        assert_eq!(p, once);
    }

    #[test]
    fn test_smooth_keeps_smooth_profile() {
        let mut p = profile_from(&[(3, 20.), (4, 25.), (5, 31.)]);
        let before = p.clone();
        p.smooth();
        assert_eq!(p, before);
    }

    #[test]
    fn test_closest_window() {
        let p = profile_from(&[(4, 20.), (8, 30.), (16, 60.)]);
        assert_eq!(p.closest_window(0.), Some(4));
        assert_eq!(p.closest_window(29.), Some(8));
        assert_eq!(p.closest_window(50.), Some(16));
        assert_eq!(p.closest_window(1000.), Some(16));
    }

    #[test]
    fn test_closest_window_tie_smallest_wins() {
        let p = profile_from(&[(4, 20.), (8, 30.)]);
        assert_eq!(p.closest_window(25.), Some(4));

        let flat = profile_from(&[(4, 20.), (5, 20.), (6, 20.)]);
        assert_eq!(flat.closest_window(20.), Some(4));
    }

    #[test]
    fn test_closest_window_empty() {
        let p = DelayProfile::new(0.5, 10.);
        assert!(p.is_empty());
        assert_eq!(p.closest_window(20.), None);
        assert_eq!(p.largest(), None);
    }
}
