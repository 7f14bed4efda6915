// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Front/back buffer bookkeeping.
//!
//! The pool is deliberately lock-free in the strongest sense: it holds no
//! concurrency primitives at all, just an index. The engine's single control
//! loop guarantees a submission is either confirmed (compositor-driven mode)
//! or its tearing risk accepted (timer-driven mode) before the next acquire,
//! so no further synchronization is needed.

use core::fmt;

/// Identifies one presentable buffer owned by the backend.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferSlot(pub usize);

impl fmt::Debug for BufferSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferSlot({})", self.0)
    }
}

/// How many presentable buffers the pool cycles through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapMode {
    /// One buffer shared between writer and display. Tearing is possible
    /// and accepted.
    Single,
    /// Two buffers; writes go to the one not being displayed.
    Double,
}

impl SwapMode {
    /// Number of buffers this mode requires.
    #[must_use]
    pub const fn slot_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }
}

/// Tracks which buffer is writable ("back") and which is presented
/// ("front").
#[derive(Clone, Debug)]
pub struct BufferPool {
    mode: SwapMode,
    back: usize,
    front: Option<usize>,
}

impl BufferPool {
    /// Creates a pool with no buffer presented yet.
    #[must_use]
    pub const fn new(mode: SwapMode) -> Self {
        Self {
            mode,
            back: 0,
            front: None,
        }
    }

    /// Returns the swap mode.
    #[must_use]
    pub const fn mode(&self) -> SwapMode {
        self.mode
    }

    /// Returns the buffer that is safe to write: the one not currently
    /// presented. In single-buffer mode this is always the same slot.
    #[must_use]
    pub const fn acquire_writable(&self) -> BufferSlot {
        BufferSlot(self.back)
    }

    /// Marks `slot` as the new front buffer. In double-buffer mode the
    /// writable index flips to the other slot.
    pub const fn submit(&mut self, slot: BufferSlot) {
        self.front = Some(slot.0);
        if let SwapMode::Double = self.mode {
            self.back = 1 - slot.0;
        }
    }

    /// Returns the currently presented buffer, if any frame has been
    /// submitted yet.
    #[must_use]
    pub const fn front(&self) -> Option<BufferSlot> {
        match self.front {
            Some(index) => Some(BufferSlot(index)),
            None => None,
        }
    }
}
