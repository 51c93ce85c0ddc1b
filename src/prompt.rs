// src/prompt.rs
//! Operator interaction: yes/no confirmations and credential prompts.
//!
//! Kept behind a trait so batch import and platform authentication can be
//! driven by scripted answers in tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::error::{MixtoError, Result};

pub trait Prompter: Send {
    /// Ask a yes/no question; only an explicit "y" counts as yes
    fn confirm(&mut self, message: &str) -> Result<bool>;

    /// Ask for a single line of input, returned trimmed
    fn ask(&mut self, label: &str) -> Result<String>;
}

/// Interactive prompter on stdin/stderr
#[derive(Debug, Default)]
pub struct StdinPrompter {
    assume_yes: bool,
}

impl StdinPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every confirmation with yes without reading stdin
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    fn read_line(&self) -> Result<String> {
        off_runtime(|| read_answer(&mut io::stdin().lock()))
    }
}

fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Run blocking terminal I/O without stalling a multi-threaded runtime worker
fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        let mut stderr = io::stderr();
        writeln!(stderr, "{}", message)?;
        if self.assume_yes {
            writeln!(stderr, "[Y/n] y")?;
            return Ok(true);
        }
        write!(stderr, "[Y/n] ")?;
        stderr.flush()?;
        Ok(is_yes(&self.read_line()?))
    }

    fn ask(&mut self, label: &str) -> Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{}: ", label)?;
        stderr.flush()?;
        self.read_line()
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Prompter that replays prepared answers and records every question
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirmations: VecDeque<bool>,
    answers: VecDeque<String>,
    pub confirm_messages: Vec<String>,
    pub asked_labels: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(mut self, answer: bool) -> Self {
        self.confirmations.push_back(answer);
        self
    }

    pub fn answer_with(mut self, answer: impl Into<String>) -> Self {
        self.answers.push_back(answer.into());
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        self.confirm_messages.push(message.to_string());
        self.confirmations
            .pop_front()
            .ok_or_else(|| MixtoError::Validation(format!("no scripted answer for {:?}", message)))
    }

    fn ask(&mut self, label: &str) -> Result<String> {
        self.asked_labels.push(label.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| MixtoError::Validation(format!("no scripted answer for {:?}", label)))
    }
}

/// Fail with Validation when any prompted credential is empty
pub fn require_non_empty(fields: &[(&str, &str)]) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(MixtoError::Validation(format!("{} is not provided", name)));
        }
    }
    Ok(())
}
