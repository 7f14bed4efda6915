// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend failure taxonomy.
//!
//! Connection, registry, and configure failures happen during construction
//! and are fatal to the caller. Once the frame loop runs, any error out of
//! the dispatch or wire variants means the compositor connection is gone;
//! there is nothing per-frame to retry against a dead socket.

use std::io;

use flipbook_core::pool::BufferSlot;
use flipbook_core::raster::SurfaceError;
use thiserror::Error;
use wayland_client::globals::{BindError, GlobalError};
use wayland_client::{ConnectError, DispatchError};

/// Wayland backend error.
#[derive(Debug, Error)]
pub enum Error {
    /// Connecting to the compositor socket failed.
    #[error("failed to connect to the compositor: {0}")]
    Connect(#[from] ConnectError),
    /// Initial registry enumeration failed.
    #[error("registry initialization failed: {0}")]
    Registry(#[from] GlobalError),
    /// A required global was not advertised.
    #[error("required global is missing: {0}")]
    MissingGlobal(#[from] BindError),
    /// The compositor never sent the initial configure.
    #[error("compositor never configured the surface")]
    NotConfigured,
    /// Creating or mapping the shared-memory pool failed.
    #[error("shared-memory buffer setup failed: {0}")]
    ShmSetup(#[from] io::Error),
    /// Dispatching queued events failed.
    #[error("event dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
    /// Socket I/O (flush or read) failed.
    #[error("wire I/O failed: {0}")]
    Wire(#[from] wayland_client::backend::WaylandError),
    /// Polling the connection descriptor failed.
    #[error("event poll failed: {0}")]
    Poll(#[source] io::Error),
    /// The engine asked for a slot this backend never allocated.
    #[error("unknown buffer slot {0:?}")]
    BadSlot(BufferSlot),
    /// The mapped buffer did not satisfy the surface description.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
