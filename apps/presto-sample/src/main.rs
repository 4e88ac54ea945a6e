//! Presto sample application
//!
//! Opens a window and clears every frame to solid red until the window is
//! closed.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p presto-sample
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod clear;

use std::process::ExitCode;

use presto_app::{init_logging, GraphicsContext, Params};
use tracing::error;

use crate::clear::SolidClear;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const CLEAR_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

fn main() -> ExitCode {
    init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let mut ctx = GraphicsContext::create(Params::new("Presto Sample").with_size(WIDTH, HEIGHT))?;

    let clear = SolidClear::new(ctx.gpu().device().clone(), CLEAR_COLOR);
    let result = ctx.dispatch(None, |frame| {
        clear.record(frame);
        Ok(())
    });

    ctx.destroy();
    result
}
