// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame cadence: when to run the next simulate→raster→present cycle.
//!
//! The pacer is a passive state machine. It never sleeps or blocks itself —
//! it only computes *how long* the engine should suspend, and the engine
//! routes that through the backend's single suspension point (a blocking
//! dispatch in compositor-driven mode, a bounded event wait in timer-driven
//! mode). Keeping the pacer free of clock reads and syscalls makes every
//! cadence decision unit-testable with synthetic timestamps.

use core::num::NonZeroU32;

use crate::time::{Duration, HostTime};

/// What drives the frame cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacerMode {
    /// The backend's consumed-frame notification triggers each cycle; there
    /// is no independent timer.
    CompositorDriven,
    /// A fixed wall-clock interval of `1e9 / target_fps` nanoseconds
    /// triggers each cycle, decoupled from presentation feedback.
    TimerDriven {
        /// Target cadence in frames per second.
        target_fps: NonZeroU32,
    },
}

/// Where the pacer is within the current cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Waiting for the next trigger.
    #[default]
    Idle,
    /// Advancing entity state.
    Simulate,
    /// Filling the back buffer.
    Raster,
    /// Handing the buffer to the backend.
    Present,
}

/// Timing outcome of one finished cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleEnd {
    /// How long to suspend before the next cycle. `None` in
    /// compositor-driven mode, and in timer-driven mode when the cycle ran
    /// at or over budget (the next cycle starts immediately — never a
    /// negative sleep).
    pub sleep: Option<Duration>,
    /// Freshly measured frames per second, present once per rolling
    /// one-second window.
    pub fps: Option<f32>,
}

/// The frame-pacing state machine.
#[derive(Clone, Debug)]
pub struct FramePacer {
    mode: PacerMode,
    phase: Phase,
    frame_index: u64,
    cycle_start: Option<HostTime>,
    fps: FpsWindow,
}

impl FramePacer {
    /// Creates a pacer in the idle phase.
    #[must_use]
    pub const fn new(mode: PacerMode) -> Self {
        Self {
            mode,
            phase: Phase::Idle,
            frame_index: 0,
            cycle_start: None,
            fps: FpsWindow::new(),
        }
    }

    /// Returns the configured mode.
    #[must_use]
    pub const fn mode(&self) -> PacerMode {
        self.mode
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of cycles completed so far.
    #[must_use]
    pub const fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The per-frame time budget, or `None` in compositor-driven mode.
    #[must_use]
    pub const fn frame_budget(&self) -> Option<Duration> {
        match self.mode {
            PacerMode::CompositorDriven => None,
            PacerMode::TimerDriven { target_fps } => {
                Some(Duration(1_000_000_000 / target_fps.get() as u64))
            }
        }
    }

    /// Starts a cycle at `now`, entering the simulate phase.
    pub fn begin_cycle(&mut self, now: HostTime) {
        debug_assert_eq!(self.phase, Phase::Idle, "cycle started mid-cycle");
        self.cycle_start = Some(now);
        self.phase = Phase::Simulate;
    }

    /// Enters the raster phase.
    pub fn begin_raster(&mut self) {
        self.phase = Phase::Raster;
    }

    /// Enters the present phase.
    pub fn begin_present(&mut self) {
        self.phase = Phase::Present;
    }

    /// Ends the cycle at `now`, returning how long to suspend and any fresh
    /// FPS measurement. The pacer returns to idle.
    pub fn finish_cycle(&mut self, now: HostTime) -> CycleEnd {
        let sleep = match (self.frame_budget(), self.cycle_start) {
            (Some(budget), Some(start)) => {
                let elapsed = now.saturating_duration_since(start);
                let remaining = budget.saturating_sub(elapsed);
                (!remaining.is_zero()).then_some(remaining)
            }
            _ => None,
        };

        self.phase = Phase::Idle;
        self.cycle_start = None;
        self.frame_index += 1;

        CycleEnd {
            sleep,
            fps: self.fps.record(now),
        }
    }
}

/// Rolling one-second FPS window.
#[derive(Clone, Copy, Debug)]
struct FpsWindow {
    window_start: Option<HostTime>,
    frames: u32,
}

impl FpsWindow {
    const fn new() -> Self {
        Self {
            window_start: None,
            frames: 0,
        }
    }

    /// Counts one frame ending at `now`; returns the measured rate each
    /// time a full second has elapsed since the window opened.
    fn record(&mut self, now: HostTime) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed < Duration::SECOND {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.window_start = Some(now);
        self.frames = 0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(fps: u32) -> FramePacer {
        FramePacer::new(PacerMode::TimerDriven {
            target_fps: NonZeroU32::new(fps).unwrap(),
        })
    }

    #[test]
    fn phases_advance_through_one_cycle() {
        let mut pacer = FramePacer::new(PacerMode::CompositorDriven);
        assert_eq!(pacer.phase(), Phase::Idle);

        pacer.begin_cycle(HostTime(0));
        assert_eq!(pacer.phase(), Phase::Simulate);
        pacer.begin_raster();
        assert_eq!(pacer.phase(), Phase::Raster);
        pacer.begin_present();
        assert_eq!(pacer.phase(), Phase::Present);

        let end = pacer.finish_cycle(HostTime(1_000_000));
        assert_eq!(pacer.phase(), Phase::Idle);
        assert_eq!(end.sleep, None, "compositor-driven mode never sleeps");
        assert_eq!(pacer.frame_index(), 1);
    }

    #[test]
    fn fast_cycle_sleeps_the_remaining_budget() {
        // 50 fps → a 20ms budget; a 5ms cycle leaves 15ms.
        let mut pacer = timer(50);
        pacer.begin_cycle(HostTime(0));
        let end = pacer.finish_cycle(HostTime(Duration::from_millis(5).ticks()));
        assert_eq!(end.sleep, Some(Duration::from_millis(15)));
    }

    #[test]
    fn slow_cycle_never_produces_a_negative_sleep() {
        // 16ms-class budget (60 fps), 20ms cycle → no sleep at all.
        let mut pacer = timer(60);
        pacer.begin_cycle(HostTime(0));
        let end = pacer.finish_cycle(HostTime(Duration::from_millis(20).ticks()));
        assert_eq!(end.sleep, None);

        // Exactly on budget is also an immediate restart.
        let mut pacer = timer(50);
        pacer.begin_cycle(HostTime(0));
        let end = pacer.finish_cycle(HostTime(Duration::from_millis(20).ticks()));
        assert_eq!(end.sleep, None);
    }

    #[test]
    fn sixty_fps_budget_is_a_sixtieth_of_a_second() {
        assert_eq!(timer(60).frame_budget(), Some(Duration(16_666_666)));
        assert_eq!(
            FramePacer::new(PacerMode::CompositorDriven).frame_budget(),
            None
        );
    }

    #[test]
    fn fps_window_reports_once_per_second() {
        let mut pacer = timer(100);
        let budget = Duration::from_millis(10);

        let mut now = HostTime(0);
        let mut reports = 0;
        for frame in 1..=250_u64 {
            pacer.begin_cycle(now);
            now = now + budget;
            let end = pacer.finish_cycle(now);
            if let Some(fps) = end.fps {
                reports += 1;
                assert!(
                    (fps - 100.0).abs() < 2.0,
                    "frame {frame}: measured {fps} fps at a 10ms cadence"
                );
            }
        }
        assert_eq!(reports, 2, "two full seconds in 250 x 10ms frames");
    }
}
