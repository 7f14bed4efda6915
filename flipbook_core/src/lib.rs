// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame pacing and buffer-pool presentation for a bouncing-rectangle
//! payload.
//!
//! `flipbook_core` is the platform-free heart of flipbook: it decides *when*
//! a frame is computed and submitted, and how buffer ownership moves between
//! the raster writer and the presentation backend. It is `no_std` compatible
//! (with `alloc`); everything that touches a clock, a socket, or a display
//! lives in backend crates.
//!
//! # Architecture
//!
//! One control loop drives a fixed pipeline per frame:
//!
//! ```text
//!   FramePacer (cadence decision)
//!       │ begin_cycle
//!       ▼
//!   World::tick() ──► SurfaceView::{clear, paint} ──► BufferPool::submit()
//!                                                          │
//!                 ┌────────────────────────────────────────┘
//!                 ▼
//!   PresentBackend::present(slot, damage)
//!       │
//!       ├─ compositor-driven: await_presented() blocks until consumed
//!       └─ timer-driven:      service_events(remaining budget)
//! ```
//!
//! **[`entity`]** — The payload: seeded rectangle simulation with
//! move-then-reflect boundary handling and config validation.
//!
//! **[`raster`]** — Stride-aware surface views, the clipped painter, and
//! damage-rect bookkeeping for partial presents.
//!
//! **[`pool`]** — Front/back index bookkeeping; single- and double-buffer
//! modes.
//!
//! **[`pacer`]** — The cadence state machine: compositor-driven or
//! timer-driven, frame budgets, remaining-sleep computation, rolling FPS.
//!
//! **[`backend`]** — The [`PresentBackend`](backend::PresentBackend)
//! contract platform crates implement.
//!
//! **[`engine`]** — [`Engine`](engine::Engine): one object owning world,
//! pool, pacer, and backend, stepped by the application until shutdown.
//!
//! **[`time`]** — Nanosecond [`HostTime`](time::HostTime) /
//! [`Duration`](time::Duration) tick types.
//!
//! # Crate features
//!
//! - `std` (disabled by default): reserved for std-only conveniences in
//!   dependent crates; the core itself stays `no_std`.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod engine;
pub mod entity;
pub mod pacer;
pub mod pool;
pub mod raster;
pub mod time;
