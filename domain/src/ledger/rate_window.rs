//! Fixed-window admission state for one provider.

use crate::catalog::RateLimit;
use std::time::{Duration, Instant};

/// Outcome of one admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may proceed; `remaining` admissions are left in this window
    Admitted { remaining: u32 },
    /// The window is exhausted until `retry_after` elapses
    WindowFull { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Admission window of a single provider.
///
/// `Idle` (no window yet) → `Admitting` → `Admitted` | `WindowFull`.
/// The count never exceeds the configured limit while `now < window_end`.
/// Callers must hold exclusive access (`&mut self`) for the whole
/// check-and-increment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateWindow {
    started_at: Option<Instant>,
    count: u32,
}

impl RateWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-increment in a single step.
    pub fn try_admit(&mut self, limit: &RateLimit, now: Instant) -> Admission {
        // An empty window never admits; it would otherwise restart on every call
        if limit.requests == 0 || limit.window_ms == 0 {
            return Admission::WindowFull {
                retry_after: limit.window(),
            };
        }

        match self.window_end(limit) {
            Some(end) if now < end => {
                if self.count < limit.requests {
                    self.count += 1;
                    Admission::Admitted {
                        remaining: limit.requests - self.count,
                    }
                } else {
                    Admission::WindowFull {
                        retry_after: end.saturating_duration_since(now),
                    }
                }
            }
            _ => {
                self.started_at = Some(now);
                self.count = 1;
                Admission::Admitted {
                    remaining: limit.requests - 1,
                }
            }
        }
    }

    /// Admissions recorded in the current window
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn window_end(&self, limit: &RateLimit) -> Option<Instant> {
        self.started_at.map(|start| start + limit.window())
    }

    pub fn is_idle(&self) -> bool {
        self.started_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_opens_window() {
        let mut window = RateWindow::new();
        assert!(window.is_idle());
        let admission = window.try_admit(&RateLimit::new(2, 1000), Instant::now());
        assert_eq!(admission, Admission::Admitted { remaining: 1 });
        assert_eq!(window.count(), 1);
    }

    #[test]
    fn full_window_reports_retry_after() {
        let limit = RateLimit::new(2, 1000);
        let start = Instant::now();
        let mut window = RateWindow::new();

        assert!(window.try_admit(&limit, start).is_admitted());
        assert!(window.try_admit(&limit, start).is_admitted());

        let later = start + Duration::from_millis(400);
        assert_eq!(
            window.try_admit(&limit, later),
            Admission::WindowFull {
                retry_after: Duration::from_millis(600)
            }
        );
        assert_eq!(window.count(), 2);
    }

    #[test]
    fn window_resets_after_elapsing() {
        let limit = RateLimit::new(1, 1000);
        let start = Instant::now();
        let mut window = RateWindow::new();

        assert!(window.try_admit(&limit, start).is_admitted());
        assert!(!window.try_admit(&limit, start).is_admitted());
        // now == window_end starts a fresh window
        assert!(
            window
                .try_admit(&limit, start + Duration::from_millis(1000))
                .is_admitted()
        );
        assert_eq!(window.count(), 1);
    }

    #[test]
    fn zero_length_window_never_admits() {
        let limit = RateLimit::new(2, 0);
        let now = Instant::now();
        let mut window = RateWindow::new();

        for _ in 0..5 {
            assert_eq!(
                window.try_admit(&limit, now),
                Admission::WindowFull {
                    retry_after: Duration::ZERO
                }
            );
        }
        assert_eq!(window.count(), 0);
        assert!(window.is_idle());
    }

    #[test]
    fn zero_limit_never_admits() {
        let mut window = RateWindow::new();
        let admission = window.try_admit(&RateLimit::new(0, 500), Instant::now());
        assert_eq!(
            admission,
            Admission::WindowFull {
                retry_after: Duration::from_millis(500)
            }
        );
        assert!(window.is_idle());
    }
}
