// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stride-aware pixel surfaces, the rectangle painter, and damage rects.
//!
//! A [`SurfaceView`] is a borrowed window onto one mapped buffer. It knows
//! the difference between the *logical* width (what is visible) and the
//! *allocated* row stride (what the display hardware requires, possibly
//! rounded up for alignment), and all addressing goes through the stride.
//! Painting clips to the logical area; [`SurfaceView::clear`] wipes the
//! whole allocation including alignment padding.

use core::fmt;

use crate::entity::{Bounds, Entity, PackedArgb};

/// An axis-aligned damaged region of a surface, in logical pixels.
///
/// Damage accompanies a present call so backends with a partial-update
/// channel can restrict the copy to what changed. Backends without one
/// ignore it; correctness never depends on damage being honored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels, always positive.
    pub width: i32,
    /// Height in pixels, always positive.
    pub height: i32,
}

impl DamageRect {
    /// The axis-aligned box currently covered by an entity.
    #[must_use]
    pub const fn of_entity(entity: &Entity) -> Self {
        Self {
            x: entity.x,
            y: entity.y,
            width: entity.extent.width,
            height: entity.extent.height,
        }
    }

    /// The smallest rect covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Clamps the rect to `bounds`, returning `None` if nothing remains.
    #[must_use]
    pub fn clamped(self, bounds: Bounds) -> Option<Self> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(bounds.width);
        let y1 = (self.y + self.height).min(bounds.height);
        (x1 > x0 && y1 > y0).then_some(Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    /// Union over the boxes of all `entities`, clamped to `bounds`.
    #[must_use]
    pub fn covering(entities: &[Entity], bounds: Bounds) -> Option<Self> {
        entities
            .iter()
            .map(Self::of_entity)
            .reduce(Self::union)
            .and_then(|rect| rect.clamped(bounds))
    }
}

/// A rejected surface description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    /// Stride is not a whole number of 32-bit pixels.
    StrideMisaligned {
        /// The offending stride in bytes.
        stride: u32,
    },
    /// Stride is smaller than the logical row width.
    StrideTooSmall {
        /// The offending stride in bytes.
        stride: u32,
        /// The logical width in pixels.
        width: u32,
    },
    /// The backing storage is smaller than `stride * height`.
    StorageTooShort {
        /// Pixels available in the backing storage.
        len: usize,
        /// Pixels required by the surface description.
        required: usize,
    },
    /// The backing bytes are not 4-byte aligned.
    StorageUnaligned,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrideMisaligned { stride } => {
                write!(f, "stride {stride} is not a multiple of 4 bytes")
            }
            Self::StrideTooSmall { stride, width } => {
                write!(f, "stride {stride} is less than {width} pixels * 4 bytes")
            }
            Self::StorageTooShort { len, required } => {
                write!(f, "storage holds {len} pixels, surface needs {required}")
            }
            Self::StorageUnaligned => write!(f, "storage is not 4-byte aligned"),
        }
    }
}

impl core::error::Error for SurfaceError {}

/// A mutable, stride-aware view of one frame buffer.
pub struct SurfaceView<'a> {
    pixels: &'a mut [u32],
    width: u32,
    height: u32,
    stride_px: usize,
}

impl<'a> SurfaceView<'a> {
    /// Wraps a pixel slice. `stride` is in bytes, as reported by the
    /// allocator; it must be a multiple of 4 and at least `width * 4`.
    pub fn new(
        pixels: &'a mut [u32],
        width: u32,
        height: u32,
        stride: u32,
    ) -> Result<Self, SurfaceError> {
        if stride % 4 != 0 {
            return Err(SurfaceError::StrideMisaligned { stride });
        }
        if u64::from(stride) < u64::from(width) * 4 {
            return Err(SurfaceError::StrideTooSmall { stride, width });
        }
        let stride_px = stride as usize / 4;
        let required = stride_px * height as usize;
        if pixels.len() < required {
            return Err(SurfaceError::StorageTooShort {
                len: pixels.len(),
                required,
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            stride_px,
        })
    }

    /// Wraps a raw mapped byte range, reinterpreting it as 32-bit pixels.
    pub fn from_bytes(
        bytes: &'a mut [u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> Result<Self, SurfaceError> {
        let pixels = bytemuck::try_cast_slice_mut(bytes)
            .map_err(|_| SurfaceError::StorageUnaligned)?;
        Self::new(pixels, width, height, stride)
    }

    /// Logical width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Logical height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Sets every pixel of the allocation — logical area and alignment
    /// padding alike — to transparent zero.
    pub fn clear(&mut self) {
        self.pixels.fill(PackedArgb::TRANSPARENT.0);
    }

    /// Paints all entities in creation order.
    ///
    /// Later entities overwrite earlier ones where boxes overlap; there is
    /// no blending. Boxes are clipped to the logical width and height, so
    /// entities in their one-tick overshoot state paint only their visible
    /// part.
    pub fn paint(&mut self, entities: &[Entity]) {
        for entity in entities {
            self.fill_box(
                entity.x,
                entity.y,
                entity.extent.width,
                entity.extent.height,
                entity.color,
            );
        }
    }

    fn fill_box(&mut self, x: i32, y: i32, width: i32, height: i32, color: PackedArgb) {
        let x0 = x.max(0) as usize;
        let y0 = y.max(0) as usize;
        let x1 = x.saturating_add(width).clamp(0, self.width as i32) as usize;
        let y1 = y.saturating_add(height).clamp(0, self.height as i32) as usize;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for row in y0..y1 {
            let offset = row * self.stride_px;
            self.pixels[offset + x0..offset + x1].fill(color.0);
        }
    }
}

impl fmt::Debug for SurfaceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceView")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride_px", &self.stride_px)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}
