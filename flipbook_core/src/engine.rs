// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine: one object owning the world, the pool, the pacer, and the
//! backend, driven by a single explicit control loop.
//!
//! Compositor completion callbacks do not re-arm themselves anywhere in
//! flipbook; backends only record that the notification arrived, and
//! [`Engine::step`] consumes it as a state-machine transition. That keeps
//! the control flow linear and lets the whole cycle run against a mock
//! backend in tests.
//!
//! # Failure handling
//!
//! A failed `present` is a per-frame event: it is logged, counted, and the
//! pool is left un-flipped so the same back buffer is reused next frame.
//! Errors from the event channel ([`PresentBackend::await_presented`] /
//! [`PresentBackend::service_events`]) mean the connection itself is gone
//! and propagate out of [`Engine::step`].

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::backend::PresentBackend;
use crate::entity::{ConfigError, SimConfig, World};
use crate::pacer::{FramePacer, PacerMode};
use crate::pool::{BufferPool, SwapMode};
use crate::raster::DamageRect;
use crate::time::Duration;

/// Engine construction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EngineConfig {
    /// Simulation payload configuration.
    pub sim: SimConfig,
    /// Frame cadence mode.
    pub mode: PacerMode,
    /// RNG seed; equal seeds reproduce identical runs.
    pub seed: u64,
}

/// Result of one engine step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// The cycle completed; keep stepping.
    Running {
        /// Freshly measured frames per second, once per second.
        fps: Option<f32>,
    },
    /// The display system asked the surface to close; stop stepping.
    CloseRequested,
}

/// The frame engine.
#[derive(Debug)]
pub struct Engine<B: PresentBackend> {
    backend: B,
    world: World,
    pool: BufferPool,
    pacer: FramePacer,
    /// Damage not yet visible on screen: the previous frame's footprint,
    /// plus anything a failed present left undisplayed.
    pending_damage: Option<DamageRect>,
    present_failures: u64,
}

impl<B: PresentBackend> Engine<B> {
    /// Builds an engine over `backend`, seeding the world from
    /// `config.seed`.
    ///
    /// The pool's swap mode follows the backend's buffer count.
    pub fn new(backend: B, config: EngineConfig) -> Result<Self, ConfigError> {
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let world = World::new(&config.sim, &mut rng)?;
        let swap = if backend.slot_count() >= 2 {
            SwapMode::Double
        } else {
            SwapMode::Single
        };

        Ok(Self {
            backend,
            world,
            pool: BufferPool::new(swap),
            pacer: FramePacer::new(config.mode),
            pending_damage: None,
            present_failures: 0,
        })
    }

    /// Runs one simulate→raster→present cycle, then suspends according to
    /// the pacing mode.
    pub fn step(&mut self) -> Result<StepOutcome, B::Error> {
        if self.backend.close_requested() {
            return Ok(StepOutcome::CloseRequested);
        }

        self.pacer.begin_cycle(self.backend.now());
        self.world.tick();

        self.pacer.begin_raster();
        let slot = self.pool.acquire_writable();
        let world = &self.world;
        self.backend.with_surface(slot, &mut |surface| {
            surface.clear();
            surface.paint(world.entities());
        })?;

        self.pacer.begin_present();
        let frame_damage = DamageRect::covering(self.world.entities(), self.world.bounds());
        let damage = match (self.pending_damage, frame_damage) {
            (Some(pending), Some(current)) => Some(pending.union(current)),
            (pending, current) => pending.or(current),
        };
        match self.backend.present(slot, damage) {
            Ok(()) => {
                self.pool.submit(slot);
                // Next frame must still repaint over this one on screen.
                self.pending_damage = frame_damage;
            }
            Err(error) => {
                self.present_failures += 1;
                log::warn!(
                    "present failed on frame {}: {error}",
                    self.pacer.frame_index()
                );
                // The screen did not change; carry the accumulated damage.
                self.pending_damage = damage;
            }
        }

        // Suspend. Compositor-driven mode parks on the consumed-frame
        // notification; timer-driven mode parks on the event channel for the
        // rest of the frame budget (or drains it without waiting when the
        // cycle ran over — never a negative sleep).
        let cycle = match self.pacer.mode() {
            PacerMode::CompositorDriven => {
                self.backend.await_presented()?;
                self.pacer.finish_cycle(self.backend.now())
            }
            PacerMode::TimerDriven { .. } => {
                let cycle = self.pacer.finish_cycle(self.backend.now());
                self.backend
                    .service_events(cycle.sleep.unwrap_or(Duration::ZERO))?;
                cycle
            }
        };

        if let Some(fps) = cycle.fps {
            log::debug!("{fps:.1} fps over the last second");
        }

        Ok(StepOutcome::Running { fps: cycle.fps })
    }

    /// Steps until `keep_running` turns false or the backend requests
    /// closing.
    pub fn run(&mut self, keep_running: impl Fn() -> bool) -> Result<(), B::Error> {
        while keep_running() {
            if let StepOutcome::CloseRequested = self.step()? {
                break;
            }
        }
        Ok(())
    }

    /// Returns the simulation state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns the pacer state.
    #[must_use]
    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    /// Number of presents that failed and were skipped.
    #[must_use]
    pub const fn present_failures(&self) -> u64 {
        self.present_failures
    }

    /// Consumes the engine, returning the backend for teardown.
    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use core::num::NonZeroU32;

    use crate::entity::{Bounds, Extent};
    use crate::pool::BufferSlot;
    use crate::raster::SurfaceView;
    use crate::time::HostTime;

    use super::*;

    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 48;

    /// Scripted in-memory backend: the clock advances a fixed amount per
    /// read, and every call is journaled for assertions.
    struct MockBackend {
        buffers: Vec<Vec<u32>>,
        now: Cell<u64>,
        tick: u64,
        presented: Vec<BufferSlot>,
        painted: Vec<BufferSlot>,
        awaited: u32,
        serviced: Vec<Duration>,
        fail_presents: bool,
        close: bool,
    }

    impl MockBackend {
        fn new(slots: usize) -> Self {
            Self {
                buffers: vec![vec![0; (WIDTH * HEIGHT) as usize]; slots],
                now: Cell::new(0),
                tick: 1_000_000, // 1ms per clock read
                presented: Vec::new(),
                painted: Vec::new(),
                awaited: 0,
                serviced: Vec::new(),
                fail_presents: false,
                close: false,
            }
        }
    }

    impl PresentBackend for MockBackend {
        type Error = &'static str;

        fn slot_count(&self) -> usize {
            self.buffers.len()
        }

        fn with_surface(
            &mut self,
            slot: BufferSlot,
            fill: &mut dyn FnMut(&mut SurfaceView<'_>),
        ) -> Result<(), Self::Error> {
            self.painted.push(slot);
            let buffer = self.buffers.get_mut(slot.0).ok_or("bad slot")?;
            let mut view =
                SurfaceView::new(buffer, WIDTH, HEIGHT, WIDTH * 4).map_err(|_| "bad view")?;
            fill(&mut view);
            Ok(())
        }

        fn present(
            &mut self,
            slot: BufferSlot,
            _damage: Option<DamageRect>,
        ) -> Result<(), Self::Error> {
            if self.fail_presents {
                return Err("present refused");
            }
            self.presented.push(slot);
            Ok(())
        }

        fn await_presented(&mut self) -> Result<(), Self::Error> {
            self.awaited += 1;
            Ok(())
        }

        fn service_events(&mut self, budget: Duration) -> Result<(), Self::Error> {
            self.serviced.push(budget);
            Ok(())
        }

        fn now(&self) -> HostTime {
            let t = self.now.get();
            self.now.set(t + self.tick);
            HostTime(t)
        }

        fn close_requested(&self) -> bool {
            self.close
        }
    }

    fn config(mode: PacerMode) -> EngineConfig {
        EngineConfig {
            sim: SimConfig::new(
                3,
                Bounds {
                    width: WIDTH as i32,
                    height: HEIGHT as i32,
                },
                Extent {
                    width: 8,
                    height: 8,
                },
            ),
            mode,
            seed: 7,
        }
    }

    fn timer_mode() -> PacerMode {
        PacerMode::TimerDriven {
            target_fps: NonZeroU32::new(60).unwrap(),
        }
    }

    #[test]
    fn double_buffered_steps_alternate_slots_and_never_paint_the_front() {
        let mut engine =
            Engine::new(MockBackend::new(2), config(PacerMode::CompositorDriven)).unwrap();

        for _ in 0..6 {
            let outcome = engine.step().unwrap();
            assert!(matches!(outcome, StepOutcome::Running { .. }));
        }

        let backend = engine.into_backend();
        assert_eq!(
            backend.painted,
            vec![
                BufferSlot(0),
                BufferSlot(1),
                BufferSlot(0),
                BufferSlot(1),
                BufferSlot(0),
                BufferSlot(1)
            ]
        );
        assert_eq!(backend.painted, backend.presented);
        for pair in backend.painted.windows(2) {
            assert_ne!(pair[0], pair[1], "paint target must alternate");
        }
        assert_eq!(backend.awaited, 6, "one blocking wait per cycle");
        assert!(backend.serviced.is_empty(), "no timed waits in this mode");
    }

    #[test]
    fn single_buffered_steps_reuse_the_only_slot() {
        let mut engine = Engine::new(MockBackend::new(1), config(timer_mode())).unwrap();
        for _ in 0..3 {
            engine.step().unwrap();
        }
        let backend = engine.into_backend();
        assert!(backend.painted.iter().all(|&slot| slot == BufferSlot(0)));
        assert_eq!(backend.awaited, 0, "timer mode never blocks on the display");
        assert_eq!(backend.serviced.len(), 3, "one timed wait per cycle");
    }

    #[test]
    fn timer_mode_waits_within_the_frame_budget() {
        let mut engine = Engine::new(MockBackend::new(2), config(timer_mode())).unwrap();
        engine.step().unwrap();

        let backend = engine.into_backend();
        let budget = Duration(1_000_000_000 / 60);
        let &waited = backend.serviced.first().unwrap();
        assert!(
            waited <= budget,
            "waited {waited:?}, longer than the {budget:?} budget"
        );
        assert!(
            !waited.is_zero(),
            "a cycle far under budget must leave sleep time"
        );
    }

    #[test]
    fn failed_presents_are_counted_and_do_not_flip_the_pool() {
        let mut backend = MockBackend::new(2);
        backend.fail_presents = true;
        let mut engine = Engine::new(backend, config(timer_mode())).unwrap();

        for _ in 0..3 {
            engine.step().unwrap();
        }
        assert_eq!(engine.present_failures(), 3);

        let backend = engine.into_backend();
        assert!(
            backend.painted.iter().all(|&slot| slot == BufferSlot(0)),
            "unsubmitted slot is reused while presents fail"
        );
        assert!(backend.presented.is_empty());
    }

    #[test]
    fn close_request_stops_the_run_loop() {
        let mut backend = MockBackend::new(2);
        backend.close = true;
        let mut engine = Engine::new(backend, config(PacerMode::CompositorDriven)).unwrap();

        engine.run(|| true).unwrap();
        assert_eq!(engine.pacer().frame_index(), 0, "no cycle ran after close");
    }

    #[test]
    fn run_respects_the_keep_running_flag() {
        let mut engine = Engine::new(MockBackend::new(2), config(timer_mode())).unwrap();
        let budget = Cell::new(4_u32);
        engine
            .run(|| {
                let left = budget.get();
                budget.set(left.saturating_sub(1));
                left > 0
            })
            .unwrap();
        assert_eq!(engine.pacer().frame_index(), 4);
    }

    #[test]
    fn identical_seeds_render_identical_frames() {
        let mut a = Engine::new(MockBackend::new(1), config(timer_mode())).unwrap();
        let mut b = Engine::new(MockBackend::new(1), config(timer_mode())).unwrap();
        for _ in 0..100 {
            a.step().unwrap();
            b.step().unwrap();
        }
        assert_eq!(a.world().entities(), b.world().entities());
        assert_eq!(
            a.into_backend().buffers,
            b.into_backend().buffers,
            "same seed, same pixels"
        );
    }

    #[test]
    fn painted_pixels_match_the_world() {
        let mut engine = Engine::new(MockBackend::new(1), config(timer_mode())).unwrap();
        engine.step().unwrap();

        let entities: Vec<_> = engine.world().entities().to_vec();
        let backend = engine.into_backend();
        let buffer = &backend.buffers[0];

        // The last visible entity's clipped box carries its own color
        // (painter's order), so probe its top-left visible pixel.
        let probe = entities
            .iter()
            .rev()
            .find(|e| {
                e.x < WIDTH as i32
                    && e.x + e.extent.width > 0
                    && e.y < HEIGHT as i32
                    && e.y + e.extent.height > 0
            })
            .unwrap();
        let x = probe.x.max(0) as usize;
        let y = probe.y.max(0) as usize;
        assert_eq!(buffer[y * WIDTH as usize + x], probe.color.0);
    }
}
