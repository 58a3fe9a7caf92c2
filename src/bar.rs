//! Terminal progress bar for chunk completion, backed by indicatif.
//! Draws nothing when stderr isn't a TTY.

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};
use parfor_core::ProgressReporter;

fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var("NO_COLOR").unwrap_or_default().is_empty()
}

/// Reports finished chunks on an indicatif bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Bar labelled with `message`; its length is set when the call starts.
    pub fn new(message: &str) -> Self {
        let template = if use_color() {
            "{msg} {bar:30.cyan/dim} {pos}/{len} chunks"
        } else {
            "{msg} {bar:30} {pos}/{len} chunks"
        };
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Wrap an existing bar (e.g. one from a `MultiProgress`).
    pub fn from_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, total_chunks: usize) {
        self.bar.set_length(total_chunks as u64);
        self.bar.set_position(0);
    }

    fn chunk_completed(&self, _completed: usize, _total_chunks: usize) {
        // Counts can arrive out of order across workers; inc keeps the bar monotonic.
        self.bar.inc(1);
    }
}
