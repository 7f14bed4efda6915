// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DRM/KMS backend for flipbook.
//!
//! This crate presents frames straight to a display controller, without a
//! windowing system:
//!
//! - Connector scan and modeset on the first connected display
//! - One or two ARGB8888 dumb buffers, width-aligned for scanout
//! - Page flips with completion events read from the card descriptor
//!
//! The process needs DRM master on the card node, so this backend is for
//! bare consoles (a TTY without a running compositor).

mod backend;
mod device;
mod error;
mod time;

pub use backend::{DrmBackend, DrmConfig};
pub use error::Error;
pub use flipbook_core::backend::PresentBackend;
pub use time::now;
