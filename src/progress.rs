// src/progress.rs
//! Spinner for the writeup resolution loop

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner on stderr, or nothing when disabled
#[derive(Clone)]
pub struct ProgressIndicator {
    spinner: Option<ProgressBar>,
}

impl ProgressIndicator {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self { spinner: None };
        }

        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            spinner: Some(spinner),
        }
    }

    /// Only spin for human output on an interactive stderr
    pub fn for_terminal(human_output: bool) -> Self {
        Self::new(human_output && is_terminal::is_terminal(std::io::stderr()))
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(msg.into());
        }
    }

    /// Hide the spinner while `f` writes to the terminal
    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        match self.spinner {
            Some(ref spinner) => spinner.suspend(f),
            None => f(),
        }
    }

    pub fn finish(&self) {
        if let Some(ref spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.spinner.is_some()
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_inert() {
        let progress = ProgressIndicator::new(false);
        assert!(!progress.is_enabled());

        progress.set_message("[1] baby rop");
        assert_eq!(progress.suspend(|| 7), 7);
        progress.finish();
    }

    #[test]
    fn test_enabled() {
        let progress = ProgressIndicator::new(true);
        assert!(progress.is_enabled());

        progress.set_message("[2] heap hop");
        progress.finish();
    }

    #[test]
    fn test_machine_output_never_spins() {
        assert!(!ProgressIndicator::for_terminal(false).is_enabled());
    }
}
