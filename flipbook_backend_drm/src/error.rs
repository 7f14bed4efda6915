// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DRM backend failure taxonomy.
//!
//! Everything up to and including the initial modeset is a startup failure:
//! callers abort with a diagnostic before the frame loop starts. During the
//! loop, [`Error::FlipPending`] and [`Error::Flip`] are per-frame failures
//! the engine logs and skips; event-channel variants mean the card went
//! away.

use std::io;
use std::path::PathBuf;

use flipbook_core::pool::BufferSlot;
use flipbook_core::raster::SurfaceError;
use thiserror::Error;

/// DRM backend error.
#[derive(Debug, Error)]
pub enum Error {
    /// Opening the card node failed.
    #[error("failed to open DRM device {}: {source}", path.display())]
    Open {
        /// Device node that was tried last.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Reading card resources failed.
    #[error("failed to read DRM resources: {0}")]
    Resources(#[source] io::Error),
    /// No connector is attached to a display.
    #[error("no connected connector found")]
    NoConnector,
    /// The connected connector advertises no modes.
    #[error("connector reports no display modes")]
    NoMode,
    /// The card has no usable CRTC.
    #[error("no CRTC available")]
    NoCrtc,
    /// Creating a dumb buffer failed.
    #[error("dumb buffer allocation failed: {0}")]
    Allocate(#[source] io::Error),
    /// Registering a buffer as a framebuffer failed.
    #[error("framebuffer registration failed: {0}")]
    AddFramebuffer(#[source] io::Error),
    /// The initial modeset failed.
    #[error("initial modeset failed: {0}")]
    Modeset(#[source] io::Error),
    /// Mapping a dumb buffer failed.
    #[error("buffer mapping failed: {0}")]
    Map(#[source] io::Error),
    /// Queueing a page flip failed.
    #[error("page flip failed: {0}")]
    Flip(#[source] io::Error),
    /// A previous page flip has not completed yet.
    #[error("page flip still pending")]
    FlipPending,
    /// Reading completion events from the card failed.
    #[error("event read failed: {0}")]
    Events(#[source] io::Error),
    /// Polling the card descriptor failed.
    #[error("event poll failed: {0}")]
    Poll(#[source] io::Error),
    /// The engine asked for a slot this backend never allocated.
    #[error("unknown buffer slot {0:?}")]
    BadSlot(BufferSlot),
    /// The mapped buffer did not satisfy the surface description.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
