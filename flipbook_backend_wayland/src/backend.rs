// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Wayland presentation backend.
//!
//! Compositor-driven pacing rides on `wl_surface.frame`: a callback is
//! requested with every commit, and [`PresentBackend::await_presented`]
//! blocks in `blocking_dispatch` until it fires. Timer-driven pacing never
//! blocks open-endedly; [`PresentBackend::service_events`] walks the
//! prepare/flush/poll/read protocol with the remaining frame budget as the
//! poll timeout, and cancels the read (drops the guard) when the budget
//! runs out. Dropping the guard leaves queued server events on the socket
//! for the next wait — nothing is lost, nothing is read twice.

use std::io;

use rustix::event::{PollFd, PollFlags, poll};
use rustix::io::Errno;
use rustix::time::Timespec;
use wayland_client::globals::registry_queue_init;
use wayland_client::protocol::{
    wl_compositor::WlCompositor, wl_shm::WlShm, wl_surface::WlSurface,
};
use wayland_client::{Connection, EventQueue, QueueHandle};
use wayland_protocols::xdg::shell::client::{
    xdg_surface::XdgSurface, xdg_toplevel::XdgToplevel, xdg_wm_base::XdgWmBase,
};

use flipbook_core::backend::PresentBackend;
use flipbook_core::pool::{BufferSlot, SwapMode};
use flipbook_core::raster::{DamageRect, SurfaceView};
use flipbook_core::time::{Duration, HostTime};

use crate::error::Error;
use crate::shm::ShmSlot;
use crate::state::State;
use crate::time;

/// Roundtrips allowed for the initial configure before giving up.
const CONFIGURE_ROUNDTRIPS: u32 = 10;

/// Wayland backend construction parameters.
#[derive(Debug, Clone)]
pub struct WaylandConfig {
    /// Surface width when the compositor leaves the size to us.
    pub width: u32,
    /// Surface height when the compositor leaves the size to us.
    pub height: u32,
    /// Toplevel title.
    pub title: String,
    /// Single or double buffering.
    pub swap: SwapMode,
}

/// A compositor connection presenting through `wl_shm` buffers.
pub struct WaylandBackend {
    conn: Connection,
    event_queue: EventQueue<State>,
    qh: QueueHandle<State>,
    state: State,
    surface: WlSurface,
    xdg_surface: XdgSurface,
    toplevel: XdgToplevel,
    slots: Vec<ShmSlot>,
    width: u32,
    height: u32,
}

impl WaylandBackend {
    /// Connects, binds globals, maps an `xdg_toplevel`, and allocates the
    /// shm buffers.
    ///
    /// The compositor may override the requested size in its first
    /// configure; buffers are allocated at whatever size was settled.
    pub fn new(config: &WaylandConfig) -> Result<Self, Error> {
        let conn = Connection::connect_to_env()?;
        let (globals, mut event_queue) = registry_queue_init::<State>(&conn)?;
        let qh = event_queue.handle();

        let compositor: WlCompositor = globals.bind(&qh, 1..=6, ())?;
        let shm: WlShm = globals.bind(&qh, 1..=1, ())?;
        let wm_base: XdgWmBase = globals.bind(&qh, 1..=6, ())?;

        let surface = compositor.create_surface(&qh, ());
        let xdg_surface = wm_base.get_xdg_surface(&surface, &qh, ());
        let toplevel = xdg_surface.get_toplevel(&qh, ());
        toplevel.set_title(config.title.clone());
        toplevel.set_app_id("flipbook".to_owned());
        surface.commit();

        let mut state = State::default();
        for _ in 0..CONFIGURE_ROUNDTRIPS {
            event_queue.roundtrip(&mut state)?;
            if state.configured {
                break;
            }
        }
        if !state.configured {
            return Err(Error::NotConfigured);
        }

        let (width, height) = state.pending_size.unwrap_or((config.width, config.height));
        log::info!("surface configured at {width}x{height}");

        let slot_count = config.swap.slot_count();
        let slots = (0..slot_count)
            .map(|index| ShmSlot::new(&shm, &qh, index, width, height))
            .collect::<Result<Vec<_>, _>>()?;
        state.busy = vec![false; slot_count];

        Ok(Self {
            conn,
            event_queue,
            qh,
            state,
            surface,
            xdg_surface,
            toplevel,
            slots,
            width,
            height,
        })
    }

    /// Logical surface size in pixels.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Waits for the connection descriptor to become readable, at most
    /// `timeout`. Interrupted waits count as timeouts.
    fn poll_connection(&self, timeout: Duration) -> Result<bool, Error> {
        let timespec = Timespec {
            tv_sec: i64::try_from(timeout.ticks() / 1_000_000_000).unwrap_or(i64::MAX),
            tv_nsec: i64::try_from(timeout.ticks() % 1_000_000_000).unwrap_or(0),
        };
        let backend = self.conn.backend();
        let fd = backend.poll_fd();
        let mut fds = [PollFd::new(&fd, PollFlags::IN)];
        match poll(&mut fds, Some(&timespec)) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(fds[0].revents().contains(PollFlags::IN)),
            Err(Errno::INTR) => Ok(false),
            Err(errno) => Err(Error::Poll(errno.into())),
        }
    }

    /// Destroys the protocol objects and flushes the goodbyes.
    pub fn teardown(self) {
        for slot in &self.slots {
            slot.destroy();
        }
        self.toplevel.destroy();
        self.xdg_surface.destroy();
        self.surface.destroy();
        if let Err(error) = self.conn.flush() {
            log::debug!("final flush: {error}");
        }
    }
}

impl std::fmt::Debug for WaylandBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaylandBackend")
            .field("state", &self.state)
            .field("slots", &self.slots.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PresentBackend for WaylandBackend {
    type Error = Error;

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn with_surface(
        &mut self,
        slot: BufferSlot,
        fill: &mut dyn FnMut(&mut SurfaceView<'_>),
    ) -> Result<(), Self::Error> {
        if self.state.busy.get(slot.0).copied().unwrap_or(false) {
            // Single-buffer (or overrun double-buffer) timer mode: the
            // compositor still reads this buffer. Tearing accepted.
            log::trace!("painting {slot:?} while the compositor holds it");
        }
        let entry = self.slots.get_mut(slot.0).ok_or(Error::BadSlot(slot))?;
        let mut surface =
            SurfaceView::from_bytes(&mut entry.mmap[..], self.width, self.height, self.width * 4)?;
        fill(&mut surface);
        Ok(())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "damage coordinates were clamped to the surface bounds"
    )]
    fn present(
        &mut self,
        slot: BufferSlot,
        damage: Option<DamageRect>,
    ) -> Result<(), Self::Error> {
        let entry = self.slots.get(slot.0).ok_or(Error::BadSlot(slot))?;

        // Keep exactly one frame callback in flight; its Done event is what
        // compositor-driven mode waits on.
        if !self.state.frame_pending {
            self.surface.frame(&self.qh, ());
            self.state.frame_pending = true;
        }
        self.state.frame_done = false;

        self.surface.attach(Some(&entry.buffer), 0, 0);
        match damage {
            Some(rect) => self
                .surface
                .damage_buffer(rect.x, rect.y, rect.width, rect.height),
            None => self
                .surface
                .damage_buffer(0, 0, self.width as i32, self.height as i32),
        }
        self.surface.commit();

        if let Some(busy) = self.state.busy.get_mut(slot.0) {
            *busy = true;
        }
        self.event_queue.flush()?;
        Ok(())
    }

    fn await_presented(&mut self) -> Result<(), Self::Error> {
        while !self.state.frame_done && !self.state.close_requested {
            self.event_queue.blocking_dispatch(&mut self.state)?;
        }
        self.state.frame_done = false;
        Ok(())
    }

    fn service_events(&mut self, budget: Duration) -> Result<(), Self::Error> {
        let start = time::now();
        let mut remaining = budget;

        loop {
            // Handlers first: anything already queued must not wait out the
            // budget.
            self.event_queue.dispatch_pending(&mut self.state)?;

            // Announce the read. `None` means events were queued between
            // the dispatch above and here — go dispatch them.
            let Some(guard) = self.event_queue.prepare_read() else {
                continue;
            };

            // Flush our own requests before sleeping on the socket.
            self.event_queue.flush()?;

            if self.poll_connection(remaining)? {
                match guard.read() {
                    Ok(_) => {}
                    // Another thread of the library raced us to the socket;
                    // the events are queued all the same.
                    Err(wayland_client::backend::WaylandError::Io(error))
                        if error.kind() == io::ErrorKind::WouldBlock => {}
                    Err(error) => return Err(Error::Wire(error)),
                }
            } else {
                // Timeout: cancel the read intent. The guard drop releases
                // the socket with all undelivered events intact.
                drop(guard);
                break;
            }

            let elapsed = time::now().saturating_duration_since(start);
            if elapsed >= budget {
                break;
            }
            remaining = budget - elapsed;
        }

        // Deliver whatever the final read pulled in.
        self.event_queue.dispatch_pending(&mut self.state)?;
        Ok(())
    }

    fn now(&self) -> HostTime {
        time::now()
    }

    fn close_requested(&self) -> bool {
        self.state.close_requested
    }
}
