use std::error::Error;
use std::path::PathBuf;
use std::{env, process};

use display::color::Color;
use display::display::{Display, DisplayConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod scene;

use scene::Scene;

const LOG_FILE_NAME: &str = "sprite-display.log";

struct Args {
    frames: u32,
    log_file: bool,
    background: Option<PathBuf>,
}

fn usage() -> ! {
    eprintln!("usage: sprite-display [--frames N] [--log-file] [BMP_PATH]");
    process::exit(2);
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 60,
        log_file: false,
        background: None,
    };

    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--frames" => {
                args.frames = it
                    .next()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or_else(|| usage());
            }
            "--log-file" => args.log_file = true,
            "-h" | "--help" => usage(),
            path if args.background.is_none() && !path.starts_with('-') => {
                args.background = Some(PathBuf::from(path));
            }
            _ => usage(),
        }
    }

    args
}

/// Logs to stderr, or to a file in the temp directory with `--log-file`.
/// The level comes from `RUST_LOG` and defaults to `info`.
fn init_logging(log_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_file {
        let path = env::temp_dir().join(LOG_FILE_NAME);
        let appender = tracing_appender::rolling::never(env::temp_dir(), LOG_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        eprintln!("Logging to file: {}", path.display());
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args();
    let _guard = init_logging(args.log_file);

    tracing::info!("sprite-display v{}", env!("CARGO_PKG_VERSION"));

    let config = DisplayConfig {
        width: 64,
        height: 24,
        background: Color::BLACK,
    };
    let mut display = Display::new(config);
    let mut scene = Scene::new(config.width, config.height, args.background.as_deref())?;

    let mut drawn = 0;
    for frame in 0..args.frames {
        scene.step(frame)?;
        if display.refresh(&mut scene.sprites) {
            drawn += 1;
        }
    }
    tracing::info!(frames = args.frames, drawn, "done");

    print!("{}", scene::to_ascii(display.buffer(), display.width()));
    Ok(())
}
