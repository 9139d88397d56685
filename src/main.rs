use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};

use famicore::cartridge::CartridgeError;
use famicore::{Config, Nes};

#[derive(Parser, Debug)]
#[command(name = "famicore", version, about = "NES emulator core")]
struct Args {
    /// iNES ROM image
    rom: PathBuf,

    /// Frames to run before exiting (headless runs default to 60)
    #[arg(long)]
    frames: Option<u64>,

    /// JSON config file
    #[arg(long, default_value = "famicore.json")]
    config: PathBuf,

    /// Save-state slot, overriding the config file
    #[arg(long)]
    state_slot: Option<u8>,

    /// Write the last frame as a PNG (needs the `screenshot` feature)
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Run without opening a window
    #[arg(long)]
    headless: bool,

    /// Log more: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Writes log records to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbose: u8) {
    // Only fails if a logger is already installed
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level_for(verbose));
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = Config::load_or_default(&args.config);
    if let Some(slot) = args.state_slot {
        config.state_slot = slot;
    }

    let mut nes = Nes::with_frame_buffer();
    match nes.load_rom(&args.rom) {
        Ok(()) => {}
        Err(CartridgeError::UnsupportedMapper { mapper_id, .. }) => {
            eprintln!("{}: mapper {} is not supported", args.rom.display(), mapper_id);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}: {}", args.rom.display(), e);
            return ExitCode::FAILURE;
        }
    }

    if args.headless || args.frames.is_some() || !cfg!(feature = "display") {
        let frames = args.frames.unwrap_or(60);
        for frame in 0..frames {
            // The final frame is always drawn so a screenshot has content
            let render = frame + 1 == frames || config.should_render(frame);
            nes.run_frame(render);
        }
        println!(
            "ran {} frames, PC=${:04X} A=${:02X} X=${:02X} Y=${:02X} SP=${:02X}",
            frames,
            nes.cpu().pc(),
            nes.cpu().a(),
            nes.cpu().x(),
            nes.cpu().y(),
            nes.cpu().sp()
        );
        return write_screenshot(&nes, args.screenshot.as_ref());
    }

    run_display(nes, config, &args)
}

#[cfg(feature = "screenshot")]
fn write_screenshot(nes: &Nes<famicore::FrameBuffer>, path: Option<&PathBuf>) -> ExitCode {
    let Some(path) = path else {
        return ExitCode::SUCCESS;
    };
    match nes.sink().save_png(path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("screenshot {}: {}", path.display(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "screenshot"))]
fn write_screenshot(_nes: &Nes<famicore::FrameBuffer>, path: Option<&PathBuf>) -> ExitCode {
    if path.is_some() {
        eprintln!("--screenshot requires building with the `screenshot` feature");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(feature = "display")]
fn run_display(nes: Nes<famicore::FrameBuffer>, config: Config, args: &Args) -> ExitCode {
    let state_dir = args
        .rom
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    match famicore::frontend::run(nes, config, state_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "display"))]
fn run_display(_nes: Nes<famicore::FrameBuffer>, _config: Config, _args: &Args) -> ExitCode {
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_log_level() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "famicore", "game.nes", "--frames", "10", "--state-slot", "3", "--headless", "-vv",
        ])
        .unwrap();
        assert_eq!(args.rom, PathBuf::from("game.nes"));
        assert_eq!(args.frames, Some(10));
        assert_eq!(args.state_slot, Some(3));
        assert!(args.headless);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, PathBuf::from("famicore.json"));
    }

    #[test]
    fn warnings_are_enabled_by_default() {
        init_logging(0);
        let warn = Metadata::builder().level(log::Level::Warn).build();
        let debug = Metadata::builder().level(log::Level::Debug).build();
        assert!(LOGGER.enabled(&warn));
        assert!(!LOGGER.enabled(&debug));
    }
}
