//! termctl - exercise the terminal backends from the command line
//!
//! # Quick Start
//!
//! ```text
//! termctl                 # Run the demo on the auto-selected backend
//! termctl size            # Print the visible window size
//! termctl pos             # Print the cursor position
//! termctl -b memory demo  # Run the demo against an in-memory console
//! ```

use std::env;
use std::io::Write;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use termctl::{
    BackendKind, Config, ConsoleSession, MemoryConsole, Position, Size, Stream, TerminalBackend,
};

/// A backend the demo can also write text through.
trait Canvas: TerminalBackend {
    /// Write `text` at the cursor with the current style.
    fn write_text(&mut self, text: &str) -> anyhow::Result<()>;
}

impl Canvas for dyn TerminalBackend {
    fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

impl Canvas for ConsoleSession<MemoryConsole> {
    fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        let device = self.device_mut();
        let at = device.cursor();
        device.write_str(at, text);
        Ok(())
    }
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Demo,
    Size,
    Pos,
}

/// Command line options
#[derive(Debug)]
struct Args {
    /// Backend requested on the command line, overrides config.toml
    backend: Option<BackendKind>,
    command: Command,
}

fn print_version() {
    eprintln!("termctl {}", VERSION);
}

fn print_help() {
    eprintln!("termctl {} - Terminal control demo", VERSION);
    eprintln!();
    eprintln!("Usage: termctl [OPTIONS] [COMMAND]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  demo                  Exercise every backend operation (default)");
    eprintln!("  size                  Print the visible window size");
    eprintln!("  pos                   Print the cursor position");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -b, --backend <KIND>  auto, native, ansi or memory");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: ~/.termctl/config.toml");
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args {
        backend: None,
        command: Command::Demo,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-b" | "--backend" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing backend argument".to_string());
                }
                parsed.backend = Some(args[i].parse()?);
            }
            "demo" => parsed.command = Command::Demo,
            "size" => parsed.command = Command::Size,
            "pos" => parsed.command = Command::Pos,
            arg => {
                return Err(format!("Unknown argument: {}", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn init_logging(config: &Config) {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("termctl.log"))
        .unwrap_or_else(|| std::path::PathBuf::from("termctl.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {}, using defaults", e);
        Config::default()
    });
    init_logging(&config);
    info!("termctl {} starting...", VERSION);

    let kind = args.backend.unwrap_or(config.backend);
    let options = config.session_options().unwrap_or_else(|e| {
        warn!("{}, using default scroll options", e);
        Default::default()
    });

    // The memory console has nothing to show on screen, so keep the concrete
    // session around and print what it holds afterwards.
    if kind == BackendKind::Memory {
        let mut session = ConsoleSession::init(MemoryConsole::new(60, 12))?.with_options(options);
        let result = run(&mut session, args.command);
        if let Err(e) = session.restore() {
            error!("Failed to restore console style: {}", e);
        }
        result?;
        println!("{}", session.device().window_text());
        return Ok(());
    }

    let mut backend = termctl::select(kind, options)?;
    let result = run(backend.as_mut(), args.command);

    // Whatever happened, hand the shell back its original colors
    if let Err(e) = backend.restore() {
        error!("Failed to restore terminal style: {}", e);
    }
    result
}

fn run<B: Canvas + ?Sized>(backend: &mut B, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Size => {
            let size = backend.window_size()?;
            println!("{}x{}", size.columns, size.rows);
        }
        Command::Pos => {
            let pos = backend.current_position()?;
            println!("{},{}", pos.x, pos.y);
        }
        Command::Demo => demo(backend)?,
    }
    Ok(())
}

fn demo<B: Canvas + ?Sized>(backend: &mut B) -> anyhow::Result<()> {
    let size = backend.window_size()?;
    let start = backend.current_position()?;
    info!(
        "Demo on {} backend: window {}x{}, cursor at {},{}",
        backend.name(),
        size.columns,
        size.rows,
        start.x,
        start.y
    );

    // Bright red and bright green: SGR parameters for ANSI, attribute masks
    // for the native console
    let (red, green) = match backend.name() {
        "ansi" => (91, 92),
        _ => (0x0C, 0x0A),
    };

    let width = u32::from(size.columns.min(40));
    let banner = backend.fill_region(Stream::Output, '=', width, Position::new(1, 1))?;
    info!("Banner wrote {} of {} cells", banner, width);

    backend.set_cursor_position(Position::new(3, 2))?;
    backend.set_style(Stream::Output, red)?;
    backend.write_text(&format!("termctl {}", VERSION))?;
    backend.unset_style(Stream::Output)?;

    backend.set_cursor_position(Position::new(3, 3))?;
    if let Err(e) = backend.set_style(Stream::Output, green) {
        // Style failures are not fatal
        warn!("{}", e);
    }
    backend.write_text(&format!("{}x{} window", size.columns, size.rows))?;
    backend.unset_style(Stream::Output)?;

    backend.fill_region(Stream::Output, '-', width, Position::new(1, 4))?;
    backend.scroll_up(1)?;

    if let Err(e) = backend.resize_buffer(Size::new(size.columns, size.rows.saturating_add(100))) {
        warn!("Buffer resize not applied: {}", e);
    }

    let end = Position::new(1, i32::from(size.rows.min(6)));
    backend.set_cursor_position(end)?;
    Ok(())
}
