//! Status lines and the round spinner, written to stderr.
//!
//! Lines follow the `{label:>12} {message}` layout, with the label coloured
//! by its [`Tone`].

use std::io::Write;
use std::time::Duration;

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};

const LABEL_WIDTH: usize = 12;

/// What kind of event a status line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Work being done or finished (`Compiling`, `Finished`).
    Progress,
    /// What a round decided (`Fresh`, `Rebuilding`, `Deleted`).
    Info,
    /// Compiler diagnostics and failed cycles.
    Problem,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Progress => Style::new().green().bold(),
            Tone::Info => Style::new().cyan().bold(),
            Tone::Problem => Style::new().yellow().bold(),
        }
    }
}

/// One status line, without the trailing newline.
pub fn render(tone: Tone, label: &str, message: &str) -> String {
    let label = format!("{label:>LABEL_WIDTH$}");
    format!("{} {message}", tone.style().apply_to(label))
}

pub fn status(tone: Tone, label: &str, message: &str) {
    let _ = writeln!(std::io::stderr(), "{}", render(tone, label, message));
}

/// Spinner shown while a round of `target` runs; hidden when stderr is not a terminal.
pub fn round_spinner(target: &str) -> ProgressBar {
    if !Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("{target}: checking sources"));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
