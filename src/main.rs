mod config;
mod engine;
mod game;
mod logging;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use crossterm::{
    cursor::Show,
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};

use engine::{Engine, EngineSettings};
use game::PongScene;

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    debug: bool,
    config: Option<PathBuf>,
    seed: Option<u64>,
    help: bool,
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("twopong");
    let args = match parse_args(&args[1.min(args.len())..]) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            print_usage(program);
            std::process::exit(1);
        }
    };
    if args.help {
        print_usage(program);
        return Ok(());
    }

    logging::init(args.debug)?;

    let config = config::load_config(args.config.as_deref())?;
    config.validate().context("invalid configuration")?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let guard = TerminalGuard::enter()?;
    let reports_release = guard.keyboard_enhanced;
    info!(reports_release, "terminal ready");

    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let result = run(&mut terminal, &config, reports_release, rng);
    drop(guard);

    if let Err(ref e) = result {
        error!(error = %e, "game exited with error");
    }
    result
}

/// Raw mode and the alternate screen, restored when dropped.
struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self {
            keyboard_enhanced: false,
        };

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        if supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            guard.keyboard_enhanced = true;
        }
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = restore_screen(&mut io::stdout(), self.keyboard_enhanced) {
            warn!(error = %e, "failed to restore screen");
        }
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "failed to leave raw mode");
        }
    }
}

fn restore_screen<W: Write>(out: &mut W, keyboard_enhanced: bool) -> io::Result<()> {
    if keyboard_enhanced {
        execute!(out, PopKeyboardEnhancementFlags)?;
    }
    execute!(out, LeaveAlternateScreen, Show)
}

fn run<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    config: &config::Config,
    reports_release: bool,
    rng: StdRng,
) -> Result<()> {
    let settings = EngineSettings::from_config(config, reports_release)?;
    let scene = PongScene::new(config)?;
    let mut engine = Engine::boot(scene, settings, rng)?;
    engine.run(terminal)?;

    let score = engine.scene().score();
    info!(left = score.left, right = score.right, "session ended");
    Ok(())
}

/// Parse command line arguments (program name already stripped)
fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" | "-d" => parsed.debug = true,
            "--config" | "-c" => {
                let Some(path) = iter.next() else {
                    bail!("--config requires a path");
                };
                parsed.config = Some(PathBuf::from(path));
            }
            "--seed" | "-s" => {
                let Some(seed) = iter.next() else {
                    bail!("--seed requires a number");
                };
                let seed = seed
                    .parse()
                    .with_context(|| format!("invalid seed {:?}", seed))?;
                parsed.seed = Some(seed);
            }
            "--help" | "-h" => parsed.help = true,
            other => bail!("unknown argument: {}", other),
        }
    }

    Ok(parsed)
}

fn print_usage(program: &str) {
    println!("twopong - Two-Player Terminal Pong");
    println!();
    println!("Usage:");
    println!("  {} [options]", program);
    println!();
    println!("Options:");
    println!("  -c, --config <path>   Use a config file other than the default");
    println!("  -s, --seed <n>        Fix the random seed for serves and deflections");
    println!("  -d, --debug           Write a debug log to {}", logging::LOG_FILE_PATH);
    println!("  -h, --help            Show this help");
    println!();
    println!("Controls (defaults):");
    println!("  W/S       Left paddle");
    println!("  Up/Down   Right paddle");
    println!("  Space     Serve");
    println!("  P         Pause");
    println!("  Q/Esc     Quit");
    println!();
    println!("Default config file: {}", config::get_config_path().display());
}
