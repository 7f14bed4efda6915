// Copyright 2026 the Flipbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bouncing rectangles on a bare display controller.
//!
//! Run from a TTY (no compositor): the process takes DRM master, modesets
//! the first connected display, and animates until SIGINT/SIGTERM. Pacing
//! defaults to the fixed-rate timer; flip [`VSYNC`] on to pace on page-flip
//! completions instead.

use std::num::NonZeroU32;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context as _;
use flipbook_backend_drm::{DrmBackend, DrmConfig};
use flipbook_core::engine::{Engine, EngineConfig};
use flipbook_core::entity::{Bounds, Extent, SimConfig};
use flipbook_core::pacer::PacerMode;

const RECT_COUNT: usize = 8;
const RECT_EXTENT: Extent = Extent {
    width: 100,
    height: 100,
};
const TARGET_FPS: NonZeroU32 = NonZeroU32::new(60).unwrap();
/// `true` paces on page-flip completions, `false` on the fixed-rate timer.
const VSYNC: bool = false;

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn request_shutdown(_signal: libc::c_int) {
    RUNNING.store(false, Ordering::SeqCst);
}

#[expect(
    unsafe_code,
    clippy::fn_to_numeric_cast_any,
    reason = "signal(2) registration takes the handler as a raw address"
)]
fn install_signal_handlers() {
    let handler = request_shutdown as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}

fn main() -> ExitCode {
    env_logger::init();
    install_signal_handlers();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("drm_rects: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let backend = DrmBackend::new(&DrmConfig::default()).context("display setup")?;
    let (width, height) = backend.size();

    let mode = if VSYNC {
        PacerMode::CompositorDriven
    } else {
        PacerMode::TimerDriven {
            target_fps: TARGET_FPS,
        }
    };
    let config = EngineConfig {
        sim: SimConfig::new(
            RECT_COUNT,
            Bounds {
                width: i32::try_from(width).context("display width")?,
                height: i32::try_from(height).context("display height")?,
            },
            RECT_EXTENT,
        ),
        mode,
        seed: flipbook_backend_drm::now().ticks(),
    };

    let mut engine = Engine::new(backend, config).context("engine setup")?;
    log::info!("animating {RECT_COUNT} rectangles in {width}x{height}");

    engine.run(|| RUNNING.load(Ordering::SeqCst))?;

    log::info!(
        "clean shutdown after {} frames ({} failed presents)",
        engine.pacer().frame_index(),
        engine.present_failures()
    );
    engine.into_backend().teardown();
    Ok(())
}
