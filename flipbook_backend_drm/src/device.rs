// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Card node access and display selection.

use std::fs::{File, OpenOptions};
use std::os::fd::{AsFd, BorrowedFd};
use std::path::{Path, PathBuf};

use drm::control::{Device as ControlDevice, Mode, connector, crtc};

use crate::error::Error;

/// Card nodes tried in order when no explicit path is configured.
const DEFAULT_CARDS: [&str; 2] = ["/dev/dri/card0", "/dev/dri/card1"];

/// An open DRM card node.
///
/// The `drm` crate attaches its device traits to anything that hands out
/// the file descriptor.
#[derive(Debug)]
pub(crate) struct Card(File);

impl AsFd for Card {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl drm::Device for Card {}
impl ControlDevice for Card {}

impl Card {
    /// Opens `path`, or the default card nodes in order.
    pub(crate) fn open(path: Option<&Path>) -> Result<Self, Error> {
        let candidates: Vec<PathBuf> = match path {
            Some(path) => vec![path.to_owned()],
            None => DEFAULT_CARDS.iter().map(PathBuf::from).collect(),
        };

        let mut last_error = None;
        for candidate in &candidates {
            match OpenOptions::new().read(true).write(true).open(candidate) {
                Ok(file) => {
                    log::info!("opened DRM device {}", candidate.display());
                    return Ok(Self(file));
                }
                Err(source) => last_error = Some((candidate.clone(), source)),
            }
        }
        let (path, source) = last_error.expect("at least one candidate path");
        Err(Error::Open { path, source })
    }
}

/// The display this backend drives: one connector, its preferred mode, and
/// the CRTC scanning it out.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Display {
    pub(crate) connector: connector::Handle,
    pub(crate) crtc: crtc::Handle,
    pub(crate) mode: Mode,
}

/// Scans connectors and picks the first connected one with its first
/// (preferred) mode.
pub(crate) fn select_display(card: &Card) -> Result<Display, Error> {
    let resources = card.resource_handles().map_err(Error::Resources)?;

    let connector = resources
        .connectors()
        .iter()
        .filter_map(|&handle| card.get_connector(handle, true).ok())
        .find(|info| info.state() == connector::State::Connected)
        .ok_or(Error::NoConnector)?;

    let mode = *connector.modes().first().ok_or(Error::NoMode)?;
    let crtc = *resources.crtcs().first().ok_or(Error::NoCrtc)?;

    let (width, height) = mode.size();
    log::info!(
        "using {:?}-{} at {}x{}@{}Hz",
        connector.interface(),
        connector.interface_id(),
        width,
        height,
        mode.vrefresh()
    );

    Ok(Display {
        connector: connector.handle(),
        crtc,
        mode,
    })
}

/// Rounds `width` up to the scanout alignment boundary of 16 pixels.
pub(crate) const fn align_scanout_width(width: u32) -> u32 {
    (width + 15) & !15
}

#[cfg(test)]
mod tests {
    use super::align_scanout_width;

    #[test]
    fn scanout_width_rounds_up_to_sixteen() {
        assert_eq!(align_scanout_width(0), 0);
        assert_eq!(align_scanout_width(1), 16);
        assert_eq!(align_scanout_width(16), 16);
        assert_eq!(align_scanout_width(17), 32);
        assert_eq!(align_scanout_width(1920), 1920);
        assert_eq!(align_scanout_width(1366), 1376);
    }
}
