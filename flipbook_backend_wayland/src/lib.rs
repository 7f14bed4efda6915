// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for flipbook.
//!
//! This crate presents frames through a compositor:
//!
//! - An `xdg_toplevel` surface backed by `wl_shm` buffers
//! - Frame-callback pacing for compositor-driven mode
//! - A prepare/flush/poll/read-or-cancel event pump for timer-driven mode
//!
//! # Queue ownership
//!
//! The backend owns its `EventQueue` outright: every protocol object it
//! creates uses the backend's own queue handle, and all dispatching happens
//! inside [`PresentBackend`] calls. Nothing here is meant to share a queue
//! with a host toolkit.

mod backend;
mod error;
mod shm;
mod state;
mod time;

pub use backend::{WaylandBackend, WaylandConfig};
pub use error::Error;
pub use flipbook_core::backend::PresentBackend;
pub use time::now;
