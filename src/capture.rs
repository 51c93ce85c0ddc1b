// src/capture.rs
//! Capture-and-commit: grab an artifact from stdin, a file, or a command's
//! output so it can be committed to an entry.

use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::LazyLock;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MixtoError, Result};

pub const UNTITLED: &str = "Untitled";

static ANSI_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[([0-9,;]*[mH])").expect("valid ansi regex"));

/// Remove colour and cursor-home escape sequences
pub fn strip_ansi(text: &str) -> String {
    ANSI_SEQUENCE.replace_all(text, "").into_owned()
}

/// Parse a `key=value` extra body field. Values that parse as JSON keep
/// their type (`true`, `3`, `["a"]`), anything else is a string.
pub fn parse_field(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| MixtoError::Validation(format!("field {:?} is not key=value", raw)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(MixtoError::Validation(format!("field {:?} has an empty key", raw)));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    Stdin,
    File(PathBuf),
    /// Run a program and capture its stdout
    Exec { program: String, args: Vec<String> },
}

impl CaptureSource {
    /// Pick the source from the command line: `--exec` wins, then `--file`,
    /// else stdin
    pub fn from_args(file: Option<PathBuf>, exec: &[String]) -> Self {
        if let Some((program, args)) = exec.split_first() {
            return CaptureSource::Exec {
                program: program.clone(),
                args: args.to_vec(),
            };
        }
        match file {
            Some(path) => CaptureSource::File(path),
            None => CaptureSource::Stdin,
        }
    }

    /// `(<program>) - <args>` for commands, `Untitled` otherwise
    pub fn default_title(&self) -> String {
        match self {
            CaptureSource::Exec { program, args } => {
                let name = std::path::Path::new(program)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| program.clone());
                format!("({}) - {}", name, args.join(" "))
            }
            _ => UNTITLED.to_string(),
        }
    }

    pub async fn read(&self) -> Result<String> {
        match self {
            CaptureSource::Stdin => {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await?;
                Ok(buf)
            }
            CaptureSource::File(path) => Ok(tokio::fs::read_to_string(path).await?),
            CaptureSource::Exec { program, args } => {
                debug!("Running {} {:?}", program, args);
                let output = Command::new(program).args(args).output().await?;
                if !output.status.success() {
                    warn!("{} exited with {}", program, output.status);
                }
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
        }
    }
}
