use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

mod counter;
mod histogram;
mod history;
mod storage;
mod util;

use counter::{RollCounter, MAX_FACE, MIN_FACE};
use histogram::Layout;
use storage::Storage;

const MIN_WIDTH: u16 = 40;

/// CLI flags
#[derive(Parser, Debug)]
#[command(
    name = "d20-tally",
    about = "Tally d20 rolls against the expected distribution"
)]
struct Args {
    /// Directory for persisted counts and history
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Fixed histogram width in columns (defaults to the terminal width)
    #[arg(long)]
    width: Option<u16>,

    /// Log at debug level
    #[arg(long)]
    verbose: bool,
}

struct App {
    counter: RollCounter,
    history: history::RollHistory,
    storage: Storage,
    width: Option<u16>,
}

impl App {
    fn new(storage: Storage, width: Option<u16>) -> Self {
        let counter = storage.load_counts();
        let history = storage.load_history();
        Self {
            counter,
            history,
            storage,
            width,
        }
    }

    fn handle_roll(&mut self, face: u8) {
        self.counter.record(face);
        self.history.push(face);
        self.storage.save_counts(&self.counter);
        self.storage.save_history(&self.history);
        debug!(face, total = self.counter.total(), "roll recorded");
    }

    fn handle_undo(&mut self) {
        // popping the history entry is what guarantees the retraction
        // targets a roll that was actually recorded
        let face = match self.history.pop() {
            Some(face) => face,
            None => return,
        };
        self.counter.retract(face);
        self.storage.save_counts(&self.counter);
        self.storage.save_history(&self.history);
        debug!(face, "roll retracted");
    }

    fn handle_reset(&mut self) {
        self.counter.reset();
        self.history.clear();
        self.storage.save_counts(&self.counter);
        self.storage.save_history(&self.history);
        debug!("counts and history reset");
    }

    /// Dispatches one input line. Returns false when the user quits.
    /// Anything unrecognized, including out-of-range rolls, is ignored.
    fn parse_command(&mut self, command: &str) -> bool {
        let op = match command.split_whitespace().next() {
            Some(op) => op,
            None => return true,
        };
        match op {
            "q" | "quit" => return false,
            "u" | "undo" => self.handle_undo(),
            "r" | "reset" => self.handle_reset(),
            _ => match op.parse::<u8>() {
                Ok(face) if (MIN_FACE..=MAX_FACE).contains(&face) => self.handle_roll(face),
                _ => debug!(input = command, "ignoring unrecognized input"),
            },
        }
        true
    }

    /// The drawing surface is the terminal, so its width is re-read on every
    /// draw; the layout is recomputed from whatever it currently is.
    fn surface_width(&self) -> f64 {
        let width = match self.width {
            Some(width) => width,
            None => crossterm::terminal::size().map(|(cols, _)| cols).unwrap_or(80),
        };
        width.max(MIN_WIDTH) as f64
    }

    fn draw(&self) {
        let layout = Layout::compute(self.surface_width(), &self.counter);
        println!("{}", histogram::render(&layout));
        println!(
            "Total rolls: {}   Expected average: {:.2}",
            self.counter.total(),
            self.counter.expected_average()
        );
        println!();
        println!("{}", self.counter.build_table());
        println!("History (latest first): {}", self.history.display_line());
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(io::stderr)
        .init();

    let storage = Storage::open(args.data_dir)?;
    let mut app = App::new(storage, args.width);
    info!(
        total = app.counter.total(),
        history_len = app.history.len(),
        "state loaded"
    );

    println!("d20 tally: enter a roll (1-20), u = undo, r = reset, q = quit");
    loop {
        app.draw();
        let line = match util::input("> ")? {
            Some(line) => line,
            None => break,
        };
        if !app.parse_command(&line) {
            break;
        }
    }
    Ok(())
}

// unit tests
#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(Some(dir.path().to_path_buf())).unwrap();
        (dir, App::new(storage, Some(80)))
    }

    #[test]
    fn unrecognized_input_is_ignored() {
        let (_dir, mut app) = test_app();
        for junk in ["0", "21", "300", "banana", "", "-3", "3.5"] {
            assert!(app.parse_command(junk));
        }
        assert_eq!(app.counter.total(), 0);
        assert!(app.history.is_empty());
    }

    #[test]
    fn undo_with_empty_history_is_a_noop() {
        let (_dir, mut app) = test_app();
        app.parse_command("u");
        assert_eq!(app.counter, RollCounter::new());
    }

    #[test]
    fn undo_only_reaches_rolls_still_in_history() {
        let (_dir, mut app) = test_app();
        for _ in 0..12 {
            app.parse_command("5");
        }
        for _ in 0..12 {
            app.parse_command("undo");
        }
        // the two oldest rolls were evicted from the bounded history and can
        // no longer be undone
        assert_eq!(app.counter.total(), 2);
        assert_eq!(app.counter.count(5), 2);
        assert!(app.history.is_empty());
    }

    #[test]
    fn reset_clears_counts_and_history() {
        let (_dir, mut app) = test_app();
        app.parse_command("9");
        app.parse_command("r");
        assert_eq!(app.counter, RollCounter::new());
        assert!(app.history.is_empty());
        assert!(!app.parse_command("q"));
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = Storage::open(Some(dir.path().to_path_buf())).unwrap();
            let mut app = App::new(storage, Some(80));
            app.parse_command("17");
            app.parse_command("17");
        }
        let storage = Storage::open(Some(dir.path().to_path_buf())).unwrap();
        let app = App::new(storage, Some(80));
        assert_eq!(app.counter.count(17), 2);
        assert_eq!(app.history.display_line(), "17, 17");
    }
}
