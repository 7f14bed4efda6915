// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for platform presentation.
//!
//! Flipbook splits platform-specific work into *backend* crates. A backend
//! owns the connection to the display system, allocates the pixel buffers,
//! and implements [`PresentBackend`] so the engine can stay platform-free.
//! Each backend also provides a `now()` free function reading the platform
//! monotonic clock, and a `teardown()` inherent method releasing buffers and
//! the connection — teardown is not part of the trait because it consumes
//! the backend.
//!
//! # Suspension points
//!
//! The engine has exactly two places where it may block, both routed through
//! this trait:
//!
//! - [`await_presented`](PresentBackend::await_presented) — compositor-driven
//!   mode parks here until the backend confirms the previous frame was
//!   consumed.
//! - [`service_events`](PresentBackend::service_events) — timer-driven mode
//!   parks here for at most the remaining frame budget while keeping the
//!   backend's event channel drained. Implementations follow a cancellable
//!   read protocol: announce the read, flush outbound messages, wait on the
//!   connection descriptor no longer than `budget`, then either consume the
//!   data that arrived or cancel the read so no event is lost and no
//!   duplicate read is attempted.
//!
//! No other trait method may block.

use crate::pool::BufferSlot;
use crate::raster::{DamageRect, SurfaceView};
use crate::time::{Duration, HostTime};

/// A platform presentation backend: buffer storage plus the event channel.
pub trait PresentBackend {
    /// Backend failure type. Startup failures never reach the engine (they
    /// abort construction); values of this type are per-frame or
    /// connection-level failures.
    type Error: core::fmt::Display;

    /// Number of presentable buffers the backend allocated (1 or 2).
    fn slot_count(&self) -> usize;

    /// Grants `fill` scoped mutable access to `slot`'s pixels as a
    /// stride-aware surface view.
    ///
    /// Scoped access rather than a returned reference because some backends
    /// (KMS dumb buffers) only hold a valid mapping for the duration of a
    /// map call.
    fn with_surface(
        &mut self,
        slot: BufferSlot,
        fill: &mut dyn FnMut(&mut SurfaceView<'_>),
    ) -> Result<(), Self::Error>;

    /// Hands `slot` to the display for presentation, optionally restricted
    /// to `damage`. `None` means the whole surface changed.
    fn present(
        &mut self,
        slot: BufferSlot,
        damage: Option<DamageRect>,
    ) -> Result<(), Self::Error>;

    /// Blocks until the previously presented frame has been consumed.
    ///
    /// Returns immediately when no presentation is outstanding, so a failed
    /// present cannot deadlock the loop.
    fn await_presented(&mut self) -> Result<(), Self::Error>;

    /// Services the event channel for at most `budget`.
    ///
    /// A zero budget drains already-queued events without waiting.
    fn service_events(&mut self, budget: Duration) -> Result<(), Self::Error>;

    /// Reads the platform's monotonic clock.
    fn now(&self) -> HostTime;

    /// Whether the display system asked this surface to go away (e.g. a
    /// compositor close request). Display controllers have no such channel
    /// and keep the default.
    fn close_requested(&self) -> bool {
        false
    }
}
