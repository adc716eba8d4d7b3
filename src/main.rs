use std::fs::OpenOptions;
use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriter;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use ledgergrid::app::App;
use ledgergrid::fileio::FileIO;
use ledgergrid::style::Theme;

fn parse_args() -> (Option<PathBuf>, bool) {
    let args: Vec<String> = std::env::args().collect();
    let mut file_path: Option<PathBuf> = None;
    let mut read_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "--read-only" => {
                read_only = true;
                i += 1;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
            _ => {
                file_path = Some(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    (file_path, read_only)
}

fn print_help() {
    eprintln!("ledgergrid - a spreadsheet-style grid for reconciling ledger entries");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    ledgergrid [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("FILE may be a .csv (header row required) or a .json array of objects.");
    eprintln!("Without a file, a built-in sample ledger is loaded.");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    --read-only    Disable editing, pasting, and row mutations");
    eprintln!("    -h, --help     Print this help message");
    eprintln!();
    eprintln!("KEYS:");
    eprintln!("    f       filter the focused column    s   save    q   quit");
    eprintln!("    Ctrl+C  copy selection               Ctrl+V  paste");
}

/// Restore the terminal before the default hook prints the panic.
fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        let _ = disable_raw_mode();

        if let Some(location) = info.location() {
            error!(file = location.file(), line = location.line(), "panic occured");
        } else {
            error!("panic occured");
        }

        if let Some(s) = info.payload().downcast_ref::<&str>() {
            error!(message = %s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            error!(message = %s);
        }

        default_hook(info);
    }));
}

/// A `MakeWriter` for `tracing` that appends to a log file, since the
/// terminal itself is occupied by the grid. Silently drops log lines if the
/// file cannot be opened.
struct LogFileWriter;

fn log_path() -> PathBuf {
    std::env::var_os("LEDGERGRID_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("ledgergrid.log"))
}

impl<'a> MakeWriter<'a> for LogFileWriter {
    type Writer = Box<dyn Write>;

    fn make_writer(&'a self) -> Self::Writer {
        match OpenOptions::new().create(true).append(true).open(log_path()) {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(io::sink()),
        }
    }
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt().with_writer(LogFileWriter).with_ansi(false).init();
    info!("ledgergrid started");

    install_panic_hook();

    let (file_path, read_only) = parse_args();
    let file_io = FileIO::new(file_path, read_only);
    let load_result = file_io.load().map_err(|e| {
        error!(error = %e, "failed to load rows");
        e
    })?;

    let theme = Theme::load();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(load_result.rows, load_result.columns, file_io, theme);
    if !load_result.warnings.is_empty() {
        app.message = Some(load_result.warnings.join("; "));
    }

    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;

    result
}
