// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The KMS presentation backend.
//!
//! Scanout memory comes from dumb buffers: CPU-writable, kernel-allocated
//! surfaces registered as framebuffers. The initial `set_crtc` lights up
//! the display on the last (zero-filled) buffer; after that every present
//! is a page flip with the event flag, and flip completion arrives as a
//! readable event on the card descriptor.
//!
//! The legacy page-flip ioctl has no damage channel, so the damage rect a
//! present carries is dropped here — the flip swaps the whole scanout
//! buffer regardless.

use std::path::PathBuf;

use drm::buffer::{Buffer, DrmFourcc};
use drm::control::dumbbuffer::DumbBuffer;
use drm::control::{Device as ControlDevice, Event, PageFlipFlags, framebuffer};
use rustix::event::{PollFd, PollFlags, poll};
use rustix::io::Errno;
use rustix::time::Timespec;

use flipbook_core::backend::PresentBackend;
use flipbook_core::pool::{BufferSlot, SwapMode};
use flipbook_core::raster::{DamageRect, SurfaceView};
use flipbook_core::time::{Duration, HostTime};

use crate::device::{Card, Display, align_scanout_width, select_display};
use crate::error::Error;
use crate::time;

/// DRM backend construction parameters.
#[derive(Debug, Clone, Default)]
pub struct DrmConfig {
    /// Card node to open; `None` scans the default nodes.
    pub device: Option<PathBuf>,
    /// Single or double buffering.
    pub swap: Option<SwapMode>,
}

struct Slot {
    buffer: DumbBuffer,
    fb: framebuffer::Handle,
}

/// A display controller driven through KMS dumb buffers.
pub struct DrmBackend {
    card: Card,
    display: Display,
    slots: Vec<Slot>,
    width: u32,
    height: u32,
    flip_pending: bool,
}

impl DrmBackend {
    /// Opens the card, picks a display, allocates scanout buffers, and
    /// performs the initial modeset.
    ///
    /// Every failure in here is fatal for the caller: there is no display
    /// to fall back to.
    pub fn new(config: &DrmConfig) -> Result<Self, Error> {
        let card = Card::open(config.device.as_deref())?;
        let display = select_display(&card)?;

        let (width, height) = display.mode.size();
        let (width, height) = (u32::from(width), u32::from(height));
        let buffer_width = align_scanout_width(width);

        let swap = config.swap.unwrap_or(SwapMode::Double);
        let mut slots = Vec::with_capacity(swap.slot_count());
        for _ in 0..swap.slot_count() {
            let buffer = card
                .create_dumb_buffer((buffer_width, height), DrmFourcc::Argb8888, 32)
                .map_err(Error::Allocate)?;
            let fb = card
                .add_framebuffer(&buffer, 32, 32)
                .map_err(Error::AddFramebuffer)?;
            slots.push(Slot { buffer, fb });
        }

        // Light up the display on the last buffer; dumb buffers are
        // zero-filled on creation, so this shows black until the first
        // flip. The pool starts writing at slot 0, which is therefore
        // never on screen while being filled.
        let initial = slots.last().expect("slot_count is at least 1");
        card.set_crtc(
            display.crtc,
            Some(initial.fb),
            (0, 0),
            &[display.connector],
            Some(display.mode),
        )
        .map_err(Error::Modeset)?;

        log::info!(
            "scanout ready: {}x{} logical, {} buffer(s) of {} aligned pixels per row",
            width,
            height,
            slots.len(),
            buffer_width
        );

        Ok(Self {
            card,
            display,
            slots,
            width,
            height,
            flip_pending: false,
        })
    }

    /// Logical display size in pixels.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Drains readable completion events from the card.
    fn drain_events(&mut self) -> Result<(), Error> {
        let events = self.card.receive_events().map_err(Error::Events)?;
        for event in events {
            match event {
                Event::PageFlip(_) => self.flip_pending = false,
                Event::Vblank(_) | Event::Unknown(_) => {}
            }
        }
        Ok(())
    }

    /// Waits for the card descriptor to become readable, at most
    /// `timeout`. Interrupted waits count as timeouts.
    fn poll_card(&self, timeout: Duration) -> Result<bool, Error> {
        let timespec = Timespec {
            tv_sec: i64::try_from(timeout.ticks() / 1_000_000_000).unwrap_or(i64::MAX),
            tv_nsec: i64::try_from(timeout.ticks() % 1_000_000_000).unwrap_or(0),
        };
        let mut fds = [PollFd::new(&self.card, PollFlags::IN)];
        match poll(&mut fds, Some(&timespec)) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(fds[0].revents().contains(PollFlags::IN)),
            Err(Errno::INTR) => Ok(false),
            Err(errno) => Err(Error::Poll(errno.into())),
        }
    }

    /// Releases framebuffers, scanout buffers, and the card.
    ///
    /// Failures here are logged and swallowed — by the time teardown runs
    /// the process is exiting and the kernel reclaims everything anyway.
    pub fn teardown(self) {
        for slot in self.slots {
            if let Err(error) = self.card.destroy_framebuffer(slot.fb) {
                log::debug!("destroy_framebuffer: {error}");
            }
            if let Err(error) = self.card.destroy_dumb_buffer(slot.buffer) {
                log::debug!("destroy_dumb_buffer: {error}");
            }
        }
    }
}

impl std::fmt::Debug for DrmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrmBackend")
            .field("display", &self.display)
            .field("slots", &self.slots.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("flip_pending", &self.flip_pending)
            .finish_non_exhaustive()
    }
}

impl PresentBackend for DrmBackend {
    type Error = Error;

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn with_surface(
        &mut self,
        slot: BufferSlot,
        fill: &mut dyn FnMut(&mut SurfaceView<'_>),
    ) -> Result<(), Self::Error> {
        let Self {
            card,
            slots,
            width,
            height,
            ..
        } = self;
        let entry = slots.get_mut(slot.0).ok_or(Error::BadSlot(slot))?;
        let pitch = entry.buffer.pitch();

        // The mapping is only valid for the duration of this call; that is
        // why the contract hands out scoped access.
        let mut mapping = card
            .map_dumb_buffer(&mut entry.buffer)
            .map_err(Error::Map)?;
        let mut surface = SurfaceView::from_bytes(mapping.as_mut(), *width, *height, pitch)?;
        fill(&mut surface);
        Ok(())
    }

    fn present(
        &mut self,
        slot: BufferSlot,
        _damage: Option<DamageRect>,
    ) -> Result<(), Self::Error> {
        if self.flip_pending {
            // The completion may already be readable; drain before giving
            // up on this frame.
            if self.poll_card(Duration::ZERO)? {
                self.drain_events()?;
            }
            if self.flip_pending {
                return Err(Error::FlipPending);
            }
        }
        let entry = self.slots.get(slot.0).ok_or(Error::BadSlot(slot))?;
        self.card
            .page_flip(self.display.crtc, entry.fb, PageFlipFlags::EVENT, None)
            .map_err(Error::Flip)?;
        self.flip_pending = true;
        Ok(())
    }

    fn await_presented(&mut self) -> Result<(), Self::Error> {
        // Returns immediately when nothing is in flight (a failed present
        // queues no event), so the loop cannot park forever.
        while self.flip_pending {
            self.drain_events()?;
        }
        Ok(())
    }

    fn service_events(&mut self, budget: Duration) -> Result<(), Self::Error> {
        let start = time::now();
        let mut remaining = budget;
        loop {
            if !self.poll_card(remaining)? {
                // Timed out (or was interrupted): the frame budget is
                // spent, render the next frame.
                return Ok(());
            }
            self.drain_events()?;

            let elapsed = time::now().saturating_duration_since(start);
            remaining = budget.saturating_sub(elapsed);
            if remaining.is_zero() {
                return Ok(());
            }
        }
    }

    fn now(&self) -> HostTime {
        time::now()
    }
}
