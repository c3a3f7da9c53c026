//! Spinner shown on stderr while CloudTrail pages are fetched.
//!
//! indicatif draws nothing when stderr is not a terminal, so piped output
//! stays clean.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner wrapper for page-by-page lookups
pub struct PageSpinner {
    bar: ProgressBar,
}

impl PageSpinner {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));

        Self { bar }
    }

    /// Report progress after a page arrived
    pub fn page(&self, pages: usize, events: usize) {
        self.bar.set_message(format!(
            "Fetched {} ({})",
            super::format::count_of(pages, "page"),
            super::format::count_of(events, "event")
        ));
    }

    /// Remove the spinner before results are printed
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for PageSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
