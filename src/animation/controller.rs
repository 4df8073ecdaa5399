use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Direction of a zoom animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    ZoomIn,
    ZoomOut,
}

/// Start instant and length of a running animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub start: Instant,
    pub duration: Duration,
}

impl Timing {
    /// Elapsed fraction of the animation, clamped to `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Running { kind: AnimationKind, timing: Timing },
}

/// Timer-driven interpolation producing a progress factor in `[0, 1]`.
///
/// The controller owns no timer. The host calls [`tick`](Self::tick) at the
/// configured frame rate while [`is_running`](Self::is_running) is true.
#[derive(Debug, Clone)]
pub struct AnimationController {
    state: AnimationState,
    factor: f64,
}

impl AnimationController {
    pub fn new() -> Self {
        Self {
            state: AnimationState::Idle,
            factor: 0.0,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, AnimationState::Running { .. })
    }

    pub fn kind(&self) -> Option<AnimationKind> {
        match self.state {
            AnimationState::Running { kind, .. } => Some(kind),
            AnimationState::Idle => None,
        }
    }

    /// Factor computed by the most recent tick.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Begins an animation. Returns false and changes nothing while another one
    /// is still running.
    pub fn start(&mut self, kind: AnimationKind, duration: Duration, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = AnimationState::Running {
            kind,
            timing: Timing {
                start: now,
                duration,
            },
        };
        self.factor = 0.0;
        log::debug!("{:?} animation started ({} ms)", kind, duration.as_millis());
        true
    }

    /// Advances the animation to `now`.
    ///
    /// While running, `on_frame` receives the new factor. The tick that reaches
    /// 1.0 also calls `on_complete` and returns the controller to idle. Idle
    /// ticks call nothing and return the last factor.
    pub fn tick<F, C>(&mut self, now: Instant, mut on_frame: F, on_complete: C) -> f64
    where
        F: FnMut(f64),
        C: FnOnce(),
    {
        let AnimationState::Running { kind, timing } = self.state else {
            return self.factor;
        };
        self.factor = timing.progress(now);
        on_frame(self.factor);
        if self.factor >= 1.0 {
            self.state = AnimationState::Idle;
            log::debug!("{:?} animation complete", kind);
            on_complete();
        }
        self.factor
    }

    /// Drops a running animation without completing it.
    pub fn cancel(&mut self) {
        self.state = AnimationState::Idle;
        self.factor = 0.0;
    }
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_progression_and_single_completion() {
        let t0 = Instant::now();
        let mut controller = AnimationController::new();
        assert!(controller.start(AnimationKind::ZoomIn, Duration::from_millis(500), t0));

        let mut frames = Vec::new();
        let mut completions = 0;
        let mut factors = Vec::new();
        for ms in [0, 250, 500, 600] {
            let f = controller.tick(
                t0 + Duration::from_millis(ms),
                |f| frames.push(f),
                || completions += 1,
            );
            factors.push(f);
        }

        assert_eq!(factors, vec![0.0, 0.5, 1.0, 1.0]);
        assert_eq!(frames, vec![0.0, 0.5, 1.0]);
        assert_eq!(completions, 1);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_start_while_running_is_rejected() {
        let t0 = Instant::now();
        let mut controller = AnimationController::new();
        assert!(controller.start(AnimationKind::ZoomIn, Duration::from_millis(500), t0));
        assert!(!controller.start(AnimationKind::ZoomOut, Duration::from_millis(100), t0));
        assert_eq!(controller.kind(), Some(AnimationKind::ZoomIn));
    }

    #[test]
    fn test_cancel_resets_without_completion() {
        let t0 = Instant::now();
        let mut controller = AnimationController::new();
        controller.start(AnimationKind::ZoomOut, Duration::from_millis(500), t0);
        controller.tick(t0 + Duration::from_millis(100), |_| {}, || {});
        controller.cancel();

        assert_eq!(controller.state(), AnimationState::Idle);
        let mut completed = false;
        let f = controller.tick(t0 + Duration::from_secs(5), |_| {}, || completed = true);
        assert_eq!(f, 0.0);
        assert!(!completed);
        // A fresh animation may start right away.
        assert!(controller.start(AnimationKind::ZoomIn, Duration::from_millis(10), t0));
    }

    #[test]
    fn test_clock_before_start_clamps_to_zero() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let timing = Timing {
            start: t0,
            duration: Duration::from_millis(500),
        };
        assert_eq!(timing.progress(Instant::now()), 0.0);
        let zero = Timing {
            start: t0,
            duration: Duration::ZERO,
        };
        assert_eq!(zero.progress(t0), 1.0);
    }
}
