//! `pokertool` launches the detection core against one table.
//!
//! Exit codes: `0` clean shutdown, `1` fatal init failure, `130` interrupted.
mod app;
mod cli;
mod frame_loop;
mod logging;
mod registry;

use std::process::ExitCode;

use clap::Parser;
use pt_capture::{Bounds, CaptureSource, WindowHandle};
use pt_compliance::Config;

use app::App;
use cli::Args;

/// Builds a source from the auto-detected backend, falling back to a
/// synthetic single-window handle for `--once` smoke runs.
fn synthetic_handle(table: &str) -> WindowHandle {
    WindowHandle { id: 0, title: table.to_string(), bounds: Bounds::default(), visible: true, z: 0, pid: 0 }
}

fn resolve_window(source: &CaptureSource, table: &str) -> Option<WindowHandle> {
    let windows = source.enumerate_windows().ok()?;
    windows
        .into_iter()
        .find(|w| w.title.to_lowercase().contains(&table.to_lowercase()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init();

    let config = match &args.config {
        Some(path) => match Config::load(std::path::Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("fatal: {e}");
                return ExitCode::from(1);
            }
        },
        None => Config::default(),
    };

    let strategies = registry::build(&config.strategies.enabled);
    let mut app = App::new(args.site.clone(), args.table.clone(), config, strategies);
    app.install_shutdown_handler();

    let mut source = CaptureSource::detect();
    let handle = resolve_window(&source, &args.table).unwrap_or_else(|| synthetic_handle(&args.table));

    if args.once {
        frame_loop::run_once(&mut app, &mut source, &handle, 0).await;
        log::info!("single frame complete (--once)");
        return ExitCode::from(0);
    }

    // `run` only returns once the shutdown flag has been set and the grace
    // window has elapsed, so reaching here always means an interrupt.
    frame_loop::run(&mut app, &mut source, &handle).await;
    log::info!("shutdown complete");
    ExitCode::from(130)
}
