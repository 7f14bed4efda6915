// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared-memory buffer slots.
//!
//! Each slot is one `wl_shm_pool` over an anonymous temp file, holding one
//! `wl_buffer`. The pool file stays mapped for the slot's whole lifetime,
//! so painting needs no per-frame syscalls — unlike the mmap-per-frame KMS
//! side.

use std::fs::File;
use std::os::fd::AsFd;

use memmap2::MmapMut;
use wayland_client::QueueHandle;
use wayland_client::protocol::{
    wl_buffer::WlBuffer,
    wl_shm::{self, WlShm},
    wl_shm_pool::WlShmPool,
};

use crate::error::Error;
use crate::state::State;

/// One presentable shared-memory buffer.
#[derive(Debug)]
pub(crate) struct ShmSlot {
    _file: File,
    pub(crate) mmap: MmapMut,
    pool: WlShmPool,
    pub(crate) buffer: WlBuffer,
}

impl ShmSlot {
    /// Allocates a `width`×`height` ARGB8888 slot. The `index` rides along
    /// as the buffer's user data so release events find the right busy
    /// flag.
    #[expect(
        unsafe_code,
        reason = "mapping the shm pool file requires a raw mmap; the pool \
                  file is never truncated while the mapping lives"
    )]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "protocol arguments are i32; display dimensions fit easily"
    )]
    pub(crate) fn new(
        shm: &WlShm,
        qh: &QueueHandle<State>,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<Self, Error> {
        let stride = width * 4;
        let size = stride * height;

        let file = tempfile::tempfile()?;
        file.set_len(u64::from(size))?;
        let mmap = unsafe { MmapMut::map_mut(&file) }?;

        let pool = shm.create_pool(file.as_fd(), size as i32, qh, ());
        let buffer = pool.create_buffer(
            0,
            width as i32,
            height as i32,
            stride as i32,
            wl_shm::Format::Argb8888,
            qh,
            index,
        );

        log::debug!("created shm slot {index}: {size} bytes, stride {stride}");
        Ok(Self {
            _file: file,
            mmap,
            pool,
            buffer,
        })
    }

    /// Releases the protocol objects. The mapping and file drop with the
    /// slot.
    pub(crate) fn destroy(&self) {
        self.buffer.destroy();
        self.pool.destroy();
    }
}
