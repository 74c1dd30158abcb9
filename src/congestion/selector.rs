use tracing::trace;

use super::delay_profile::DelayProfile;

/// Turns a target delay into a window, moving at most a bounded step per epoch.
///
/// Growth is capped harder than shrinking: overshooting the link is worse than
/// leaving some throughput unused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSelector {
    min_window: u32,
    max_window: Option<u32>,
    max_increase: u32,
    max_decrease: u32,
}

impl WindowSelector {
    pub fn new(
        min_window: u32,
        max_window: Option<u32>,
        max_increase: u32,
        max_decrease: u32,
    ) -> Self {
        Self {
            min_window,
            max_window,
            max_increase,
            max_decrease,
        }
    }

    pub fn clamp(&self, window: f64) -> f64 {
        let window = window.max(self.min_window as f64);
        match self.max_window {
            Some(max) => window.min(max as f64),
            None => window,
        }
    }

    fn candidate(&self, target_ms: f64, profile: &DelayProfile, current: f64) -> f64 {
        // The profile can't name a window larger than anything we've tried. If even
        // the largest one stays under target, probe upwards.
        if let Some((_, largest_delay)) = profile.largest() {
            if largest_delay < target_ms {
                return current + self.max_increase as f64;
            }
        }
        profile
            .closest_window(target_ms)
            .unwrap_or(self.min_window) as f64
    }

    pub fn select(&self, target_ms: f64, profile: &mut DelayProfile, current: f64) -> f64 {
        profile.smooth();
        let candidate = self.candidate(target_ms, profile, current);

        let next = if candidate > current {
            candidate.min(current + self.max_increase as f64)
        } else {
            candidate.max(current - self.max_decrease as f64)
        };
        let next = self.clamp(next);

        trace!(target_ms, current, candidate, next, "window selected");
        next
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::WindowSelector;
    use crate::congestion::delay_profile::DelayProfile;

    fn profile(entries: &[(u32, f64)]) -> DelayProfile {
        let mut p = DelayProfile::new(0.5, 10.);
        for (w, d) in entries {
            p.record(*w, *d);
        }
        p
    }

    #[test]
    fn test_growth_rate_limited() {
        let s = WindowSelector::new(3, None, 2, 16);
        let mut p = profile(&[(10, 20.), (20, 25.), (40, 30.)]);
        assert_abs_diff_eq!(s.select(30., &mut p, 10.), 12.);
    }

    #[test]
    fn test_shrink_rate_limited() {
        let s = WindowSelector::new(3, None, 2, 16);
        let mut p = profile(&[(4, 20.), (20, 28.), (40, 35.)]);
        assert_abs_diff_eq!(s.select(20., &mut p, 40.), 24.);
        assert_abs_diff_eq!(s.select(20., &mut p, 10.), 4.);
    }

    #[test]
    fn test_exact_candidate_within_limits() {
        let s = WindowSelector::new(3, None, 2, 16);
        let mut p = profile(&[(10, 20.), (11, 25.), (12, 30.)]);
        assert_abs_diff_eq!(s.select(25., &mut p, 10.), 11.);
        assert_abs_diff_eq!(s.select(25., &mut p, 11.), 11.);
    }

    #[test]
    fn test_probe_past_profile_edge() {
        let s = WindowSelector::new(3, None, 2, 16);
        let mut p = profile(&[(4, 20.), (5, 20.), (6, 20.)]);
        assert_abs_diff_eq!(s.select(22., &mut p, 6.), 8.);
    }

    #[test]
    fn test_empty_profile_selects_floor() {
        let s = WindowSelector::new(3, None, 2, 16);
        let mut p = DelayProfile::new(0.5, 10.);
        assert_abs_diff_eq!(s.select(20., &mut p, 10.), 3.);
    }

    #[test]
    fn test_bounds() {
        let s = WindowSelector::new(3, Some(11), 2, 16);
        let mut p = profile(&[(1, 20.), (50, 100.)]);
        assert_abs_diff_eq!(s.select(0., &mut p, 5.), 3.);
        assert_abs_diff_eq!(s.select(200., &mut p, 10.), 11.);
    }

    #[test]
    fn test_select_smooths_profile() {
        let s = WindowSelector::new(3, None, 2, 16);
        let mut p = profile(&[(4, 20.), (5, 90.), (6, 35.)]);
        s.select(25., &mut p, 5.);
        assert_abs_diff_eq!(p.get(5).unwrap(), 30.);
    }
}
