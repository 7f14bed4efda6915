// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bouncing-rectangle simulation.
//!
//! The simulation is deliberately simple — it exists as the payload the
//! frame pacer schedules. Each [`Entity`] is an axis-aligned rectangle with
//! integer position and velocity. A [`World::tick`] moves every entity by its
//! velocity and then reflects velocity on any axis where the *moved* position
//! sits at or beyond the containment bounds. Because reflection is evaluated
//! after the move, an entity can render one step outside the nominal bounds
//! for a single frame before the next tick pulls it back in; this overshoot
//! is part of the observable behavior and covered by tests.

use alloc::vec::Vec;
use core::fmt;

use rand::Rng;

/// A 32-bit packed ARGB color: alpha, red, green, blue bytes from most to
/// least significant.
///
/// The alpha byte is carried into the framebuffer verbatim. The raster
/// writer never blends; "semi-transparent" palette entries are literal
/// overwrites.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedArgb(pub u32);

impl PackedArgb {
    /// Fully transparent black, the clear color.
    pub const TRANSPARENT: Self = Self(0);

    /// Returns the alpha byte.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "byte extraction")]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl fmt::Debug for PackedArgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedArgb({:#010x})", self.0)
    }
}

/// Colors assigned to entities in creation order, cycling when there are
/// more entities than palette entries.
pub const PALETTE: [PackedArgb; 8] = [
    PackedArgb(0x80FF_0000), // red
    PackedArgb(0x8000_FF00), // green
    PackedArgb(0x8000_00FF), // blue
    PackedArgb(0x80FF_FF00), // yellow
    PackedArgb(0x80FF_00FF), // purple
    PackedArgb(0x8000_FFFF), // cyan
    PackedArgb(0x8000_0000), // black
    PackedArgb(0x80FF_FFFF), // white
];

/// Pixel dimensions of the containment area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

/// Fixed width and height of one rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Extent {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

/// One bouncing rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Entity {
    /// Left edge. May transiently sit outside the bounds (see module docs).
    pub x: i32,
    /// Top edge. May transiently sit outside the bounds (see module docs).
    pub y: i32,
    /// Horizontal velocity in pixels per tick.
    pub vx: i32,
    /// Vertical velocity in pixels per tick.
    pub vy: i32,
    /// Rectangle size, fixed for the entity's lifetime.
    pub extent: Extent,
    /// Fill color.
    pub color: PackedArgb,
}

impl Entity {
    fn tick(&mut self, bounds: Bounds) {
        self.x += self.vx;
        self.y += self.vy;

        if self.x <= 0 || self.x + self.extent.width >= bounds.width {
            self.vx = -self.vx;
        }
        if self.y <= 0 || self.y + self.extent.height >= bounds.height {
            self.vy = -self.vy;
        }
    }
}

/// Configuration for seeding a [`World`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SimConfig {
    /// Number of entities to seed.
    pub count: usize,
    /// Containment area.
    pub bounds: Bounds,
    /// Size shared by every entity.
    pub extent: Extent,
    /// Inclusive lower bound of the random per-axis speed.
    pub min_speed: i32,
    /// Inclusive upper bound of the random per-axis speed.
    pub max_speed: i32,
}

impl SimConfig {
    /// Default per-axis speed range.
    pub const SPEED_RANGE: (i32, i32) = (5, 14);

    /// Creates a configuration with the default speed range.
    #[must_use]
    pub const fn new(count: usize, bounds: Bounds, extent: Extent) -> Self {
        Self {
            count,
            bounds,
            extent,
            min_speed: Self::SPEED_RANGE.0,
            max_speed: Self::SPEED_RANGE.1,
        }
    }

    /// Validates the configuration.
    ///
    /// Rejects rather than clamps: degenerate bounds or extents, empty or
    /// non-positive speed ranges, and speed/bounds combinations that could
    /// overflow `i32` position arithmetic are all configuration errors, not
    /// runtime conditions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::NoEntities);
        }
        if self.bounds.width <= 0 || self.bounds.height <= 0 {
            return Err(ConfigError::DegenerateBounds(self.bounds));
        }
        if self.extent.width <= 0 || self.extent.height <= 0 {
            return Err(ConfigError::DegenerateExtent(self.extent));
        }
        if self.extent.width >= self.bounds.width || self.extent.height >= self.bounds.height {
            return Err(ConfigError::ExtentExceedsBounds {
                extent: self.extent,
                bounds: self.bounds,
            });
        }
        if self.min_speed <= 0 || self.max_speed < self.min_speed {
            return Err(ConfigError::BadSpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        // Positions stay within [-max_speed, bound + max_speed) and the
        // reflection test computes `position + extent`; both must fit in i32.
        let headroom = |bound: i32, extent: i32| {
            bound
                .checked_add(self.max_speed)
                .and_then(|v| v.checked_add(extent))
                .is_some()
        };
        if !headroom(self.bounds.width, self.extent.width)
            || !headroom(self.bounds.height, self.extent.height)
        {
            return Err(ConfigError::SpeedOverflowsBounds {
                max_speed: self.max_speed,
            });
        }
        Ok(())
    }
}

/// A rejected [`SimConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Entity count was zero.
    NoEntities,
    /// Bounds had a non-positive dimension.
    DegenerateBounds(Bounds),
    /// Extent had a non-positive dimension.
    DegenerateExtent(Extent),
    /// Entities would not fit inside the bounds.
    ExtentExceedsBounds {
        /// The offending extent.
        extent: Extent,
        /// The configured bounds.
        bounds: Bounds,
    },
    /// Speed range was empty or non-positive.
    BadSpeedRange {
        /// Configured minimum speed.
        min: i32,
        /// Configured maximum speed.
        max: i32,
    },
    /// Position arithmetic could overflow `i32` at the configured speed.
    SpeedOverflowsBounds {
        /// Configured maximum speed.
        max_speed: i32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEntities => write!(f, "entity count must be at least 1"),
            Self::DegenerateBounds(bounds) => {
                write!(f, "bounds {}x{} are degenerate", bounds.width, bounds.height)
            }
            Self::DegenerateExtent(extent) => {
                write!(f, "extent {}x{} is degenerate", extent.width, extent.height)
            }
            Self::ExtentExceedsBounds { extent, bounds } => write!(
                f,
                "extent {}x{} does not fit in bounds {}x{}",
                extent.width, extent.height, bounds.width, bounds.height
            ),
            Self::BadSpeedRange { min, max } => {
                write!(f, "speed range {min}..={max} is empty or non-positive")
            }
            Self::SpeedOverflowsBounds { max_speed } => {
                write!(f, "max speed {max_speed} overflows position arithmetic")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// The full simulation state: a set of entities inside fixed bounds.
#[derive(Clone, Debug)]
pub struct World {
    bounds: Bounds,
    entities: Vec<Entity>,
}

impl World {
    /// Seeds a world from a validated configuration and an RNG.
    ///
    /// Positions are uniform in `[0, bound - extent)` per axis and speeds
    /// uniform in `[min_speed, max_speed]` per axis. Seeding the RNG makes
    /// the whole simulation reproducible: the sequence of positions and
    /// velocities is a pure function of the seed and tick count.
    pub fn new(config: &SimConfig, rng: &mut impl Rng) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut entities = Vec::with_capacity(config.count);
        for i in 0..config.count {
            entities.push(Entity {
                x: rng.random_range(0..config.bounds.width - config.extent.width),
                y: rng.random_range(0..config.bounds.height - config.extent.height),
                vx: rng.random_range(config.min_speed..=config.max_speed),
                vy: rng.random_range(config.min_speed..=config.max_speed),
                extent: config.extent,
                color: PALETTE[i % PALETTE.len()],
            });
        }

        Ok(Self {
            bounds: config.bounds,
            entities,
        })
    }

    /// Advances every entity by one tick: move, then reflect per axis.
    pub fn tick(&mut self) {
        for entity in &mut self.entities {
            entity.tick(self.bounds);
        }
    }

    /// Returns the entities in creation order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns the containment bounds.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn config() -> SimConfig {
        SimConfig::new(
            8,
            Bounds {
                width: 1920,
                height: 1080,
            },
            Extent {
                width: 100,
                height: 100,
            },
        )
    }

    #[test]
    fn seeding_is_deterministic() {
        let mut a = World::new(&config(), &mut SmallRng::seed_from_u64(42)).unwrap();
        let mut b = World::new(&config(), &mut SmallRng::seed_from_u64(42)).unwrap();

        for _ in 0..100 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.entities(), b.entities(), "same seed, same trajectories");
    }

    #[test]
    fn different_seeds_diverge() {
        let a = World::new(&config(), &mut SmallRng::seed_from_u64(1)).unwrap();
        let b = World::new(&config(), &mut SmallRng::seed_from_u64(2)).unwrap();
        assert_ne!(a.entities(), b.entities());
    }

    #[test]
    fn seeded_entities_start_inside_bounds_with_valid_speeds() {
        let config = config();
        let world = World::new(&config, &mut SmallRng::seed_from_u64(7)).unwrap();

        for entity in world.entities() {
            assert!(entity.x >= 0 && entity.x < config.bounds.width - config.extent.width);
            assert!(entity.y >= 0 && entity.y < config.bounds.height - config.extent.height);
            assert!((config.min_speed..=config.max_speed).contains(&entity.vx));
            assert!((config.min_speed..=config.max_speed).contains(&entity.vy));
        }
    }

    #[test]
    fn palette_cycles_past_eight_entities() {
        let mut config = config();
        config.count = 10;
        let world = World::new(&config, &mut SmallRng::seed_from_u64(7)).unwrap();

        assert_eq!(world.entities()[8].color, PALETTE[0]);
        assert_eq!(world.entities()[9].color, PALETTE[1]);
    }

    #[test]
    fn corner_entity_reflects_both_axes() {
        let mut world = World::new(&config(), &mut SmallRng::seed_from_u64(0)).unwrap();
        let entity = &mut world.entities[0];
        entity.x = 0;
        entity.y = 0;
        entity.vx = -5;
        entity.vy = -5;

        world.tick();

        let entity = world.entities()[0];
        assert_eq!((entity.vx, entity.vy), (5, 5));
        assert_eq!((entity.x, entity.y), (-5, -5), "overshoot lasts one tick");
    }

    #[test]
    fn velocity_flips_iff_moved_position_hits_boundary() {
        let bounds = Bounds {
            width: 500,
            height: 400,
        };
        let mut rng = SmallRng::seed_from_u64(99);

        for _ in 0..10_000 {
            let extent = Extent {
                width: rng.random_range(1..200),
                height: rng.random_range(1..200),
            };
            let mut entity = Entity {
                x: rng.random_range(-50..bounds.width + 50),
                y: rng.random_range(-50..bounds.height + 50),
                vx: rng.random_range(-20..=20),
                vy: rng.random_range(-20..=20),
                extent,
                color: PALETTE[0],
            };
            let before = entity;
            entity.tick(bounds);

            let moved_x = before.x + before.vx;
            let should_flip_x = moved_x <= 0 || moved_x + extent.width >= bounds.width;
            assert_eq!(
                entity.vx == -before.vx || before.vx == 0,
                should_flip_x || before.vx == 0,
                "x reflection must match the moved position ({before:?})"
            );

            let moved_y = before.y + before.vy;
            let should_flip_y = moved_y <= 0 || moved_y + extent.height >= bounds.height;
            assert_eq!(
                entity.vy == -before.vy || before.vy == 0,
                should_flip_y || before.vy == 0,
                "y reflection must match the moved position ({before:?})"
            );
        }
    }

    #[test]
    fn overshoot_is_bounded_by_one_tick() {
        let config = config();
        let mut world = World::new(&config, &mut SmallRng::seed_from_u64(3)).unwrap();

        // The invariant holds per axis: reflection corrects an overshoot on
        // the very next tick, but the two axes bounce independently.
        let mut x_streak = [0_u32; 8];
        let mut y_streak = [0_u32; 8];
        for _ in 0..10_000 {
            world.tick();
            for (i, entity) in world.entities().iter().enumerate() {
                let inside_x =
                    entity.x >= 0 && entity.x <= config.bounds.width - entity.extent.width;
                let inside_y =
                    entity.y >= 0 && entity.y <= config.bounds.height - entity.extent.height;

                x_streak[i] = if inside_x { 0 } else { x_streak[i] + 1 };
                y_streak[i] = if inside_y { 0 } else { y_streak[i] + 1 };
                assert!(
                    x_streak[i] <= 1 && y_streak[i] <= 1,
                    "entity {i} stayed outside bounds on one axis for more \
                     than one tick: {entity:?}"
                );
            }
        }
    }

    #[test]
    fn validate_rejects_degenerate_configs() {
        let base = config();

        let mut c = base;
        c.count = 0;
        assert_eq!(c.validate(), Err(ConfigError::NoEntities));

        let mut c = base;
        c.bounds.width = 0;
        assert!(matches!(c.validate(), Err(ConfigError::DegenerateBounds(_))));

        let mut c = base;
        c.extent.height = -1;
        assert!(matches!(c.validate(), Err(ConfigError::DegenerateExtent(_))));

        let mut c = base;
        c.extent.width = c.bounds.width;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ExtentExceedsBounds { .. })
        ));

        let mut c = base;
        c.min_speed = 0;
        assert!(matches!(c.validate(), Err(ConfigError::BadSpeedRange { .. })));

        let mut c = base;
        c.max_speed = 4;
        assert!(matches!(c.validate(), Err(ConfigError::BadSpeedRange { .. })));
    }

    #[test]
    fn validate_rejects_overflowing_speed() {
        let mut c = SimConfig::new(
            1,
            Bounds {
                width: i32::MAX - 10,
                height: 1080,
            },
            Extent {
                width: 100,
                height: 100,
            },
        );
        c.max_speed = 1000;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::SpeedOverflowsBounds { .. })
        ));
    }
}
