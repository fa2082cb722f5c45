use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lsc::console::{Console, LogWriter};
use lsc::terminal::{RawInput, RawModeGuard, TerminalInput, TerminalScreen, TerminalSink};
use lsc::{ControlSignal, LineEditor, LscError, Shell};
use lsc_config::{LogFormat, LscConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// lsc - interactive command console and `.lsf` script runner
#[derive(Parser, Debug)]
#[command(name = "lsc", version, about)]
struct Args {
    /// Script files to execute, in order
    scripts: Vec<PathBuf>,

    /// Execute one line and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Configuration file (replaces the default search path)
    #[arg(long)]
    config: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,

    /// Read raw stdin bytes and decode VT escape sequences
    #[arg(long)]
    vt: bool,

    /// Disable `$name` variables
    #[arg(long)]
    no_variables: bool,

    /// Match command names case-sensitively
    #[arg(long)]
    case_sensitive: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => lsc_config::load_from_file(path).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {e}, using defaults");
            LscConfig::default()
        }),
        None => lsc_config::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {e}, using defaults");
            LscConfig::default()
        }),
    };

    let log_writer = LogWriter::new();
    init_logging(&config, args.debug, log_writer.clone());

    let interactive = args.scripts.is_empty() && args.command.is_none();
    let mut builder = Shell::builder()
        .config(&config)
        .variables(config.console.variables && !args.no_variables)
        .case_sensitive(config.console.case_sensitive || args.case_sensitive)
        .with_builtins();
    if interactive {
        builder = builder.output(TerminalSink);
    }
    let mut shell = match builder.build() {
        Ok(shell) => shell,
        Err(e) => {
            error!("Failed to build shell: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let history_file = config.history.enabled.then(|| config.history.file_path());
    if let Some(path) = &history_file {
        if let Err(e) = shell.history_mut().load(path) {
            warn!(path = %path.display(), error = %e, "Failed to load history");
        }
    }

    let (shell, code) = if interactive {
        info!("lsc starting");
        let vt = config.console.vt_input || args.vt;
        match run_interactive(shell, &config.console.prompt, vt, &log_writer) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("lsc: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        let code = run_batch(&mut shell, &args);
        (shell, code)
    };

    if let Some(path) = &history_file {
        if let Err(e) = shell.history().save(path) {
            warn!(path = %path.display(), error = %e, "Failed to save history");
        }
    }

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn init_logging(config: &LscConfig, debug: bool, writer: LogWriter) {
    let directives = if debug {
        "debug".to_string()
    } else {
        config.logging.directives()
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives)),
        )
        .with_writer(writer);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Run scripts, then the `-c` line. Returns the process exit code.
fn run_batch(shell: &mut Shell, args: &Args) -> i32 {
    for script in &args.scripts {
        match shell.execute_lsf(script) {
            Ok(()) => {}
            Err(LscError::Signal(ControlSignal::Exit(code))) => return code,
            Err(e) => {
                eprintln!("lsc: {e}");
                return 1;
            }
        }
    }
    if let Some(line) = &args.command {
        match shell.execute_line(line) {
            Ok(()) => {}
            Err(LscError::Signal(ControlSignal::Exit(code))) => return code,
            Err(e) => {
                eprintln!("lsc: {e}");
                return 1;
            }
        }
    }
    0
}

fn run_interactive(
    shell: Shell,
    prompt: &str,
    vt: bool,
    log_writer: &LogWriter,
) -> io::Result<(Shell, i32)> {
    let _raw = RawModeGuard::enable()?;
    let editor = LineEditor::new(TerminalScreen::new(), prompt).with_vt_input(vt);
    let handle = if vt {
        Console::spawn(shell, editor, RawInput::spawn()?)?
    } else {
        Console::spawn(shell, editor, TerminalInput)?
    };

    log_writer.attach(handle.pauser());
    let outcome = handle.join();
    log_writer.detach();

    let outcome = outcome?;
    if let Some(e) = outcome.error {
        return Err(e);
    }
    Ok((outcome.shell, outcome.exit_code.unwrap_or(0)))
}
