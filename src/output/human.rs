// src/output/human.rs
//! Human-readable colored terminal output

use crate::output::{poisoned, writeup_status, OutputHandler, Record};
use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

pub struct HumanOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
}

impl HumanOutput {
    /// Write to stdout, colored when stdout is a terminal
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, use_colors: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            use_colors,
        }
    }

    fn render(&self, record: &Record<'_>) -> String {
        let c = self.use_colors;
        match record {
            Record::Workspace(w) => {
                let count = w
                    .entries_count
                    .map(|n| format!(" ({} entries)", n))
                    .unwrap_or_default();
                format!("{}  {}{}", paint_id(&w.workspace_id, c), w.workspace_name, count)
            }
            Record::Entry(e) => {
                let mut line = format!(
                    "{}  {} {}",
                    paint_id(&e.entry_id, c),
                    paint_category(&e.category, c),
                    paint_title(&e.title, c)
                );
                for commit in e.commits.iter().flatten() {
                    line.push_str(&format!(
                        "\n    {} {} {}",
                        dim("commit", c),
                        commit.commit_id,
                        commit.title
                    ));
                }
                line
            }
            Record::Commit(commit) => {
                let header = format!(
                    "{}  {} {}",
                    paint_id(&commit.commit_id, c),
                    paint_category(&commit.commit_type, c),
                    paint_title(&commit.title, c)
                );
                if commit.data.is_empty() {
                    header
                } else {
                    format!("{}\n{}", header, commit.data)
                }
            }
            Record::Note(n) => {
                let title = if n.title.is_empty() { "Untitled" } else { n.title.as_str() };
                format!("{}  {}\n{}", paint_id(&n.note_id, c), paint_title(title, c), n.data)
            }
            Record::Planned(p) => format!(
                "{} {} {}",
                if c { "[dry-run]".yellow().to_string() } else { "[dry-run]".to_string() },
                paint_category(&p.category, c),
                p.title
            ),
            Record::Writeup(w) => {
                let status = writeup_status(w);
                let status = if c {
                    match status {
                        "imported" => status.green().bold().to_string(),
                        "no_writeup" => status.red().to_string(),
                        _ => status.yellow().to_string(),
                    }
                } else {
                    status.to_string()
                };
                format!(
                    "{} {} {}",
                    status,
                    paint_title(&w.title, c),
                    w.writeup.as_deref().unwrap_or("-")
                )
            }
        }
    }
}

fn paint_id(id: &str, colors: bool) -> String {
    if colors { id.dimmed().to_string() } else { id.to_string() }
}

fn paint_category(category: &str, colors: bool) -> String {
    let tag = format!("[{}]", category);
    if colors { tag.cyan().to_string() } else { tag }
}

fn paint_title(title: &str, colors: bool) -> String {
    if colors { title.bold().to_string() } else { title.to_string() }
}

fn dim(text: &str, colors: bool) -> String {
    if colors { text.dimmed().to_string() } else { text.to_string() }
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for HumanOutput {
    async fn emit(&self, record: Record<'_>) -> anyhow::Result<()> {
        let line = self.render(&record);
        let mut writer = self.writer.lock().map_err(poisoned)?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    async fn message(&self, text: &str) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().map_err(poisoned)?;
        if self.use_colors {
            writeln!(writer, "{} {}", "[+]".green().bold(), text)?;
        } else {
            writeln!(writer, "[+] {}", text)?;
        }
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().map_err(poisoned)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::SharedBuffer;
    use crate::types::{Commit, Entry};
    use crate::writeups::{WriteupResult, WriteupStatus};

    #[tokio::test]
    async fn test_entry_with_commits() {
        let buffer = SharedBuffer::default();
        let handler = HumanOutput::with_writer(Box::new(buffer.clone()), false);

        let entry = Entry {
            entry_id: "e1".to_string(),
            title: "Baby ROP".to_string(),
            category: "pwn".to_string(),
            workspace: "ws".to_string(),
            commits: Some(vec![Commit {
                commit_id: "c1".to_string(),
                entry_id: "e1".to_string(),
                commit_type: "tool".to_string(),
                title: "(gdb) - info registers".to_string(),
                data: String::new(),
                meta: Default::default(),
            }]),
        };

        handler.emit(Record::Entry(&entry)).await.unwrap();
        handler.message("1 entries").await.unwrap();

        let out = buffer.contents();
        assert!(out.starts_with("e1  [pwn] Baby ROP\n    commit c1 (gdb) - info registers\n"));
        assert!(out.ends_with("[+] 1 entries\n"));
    }

    #[tokio::test]
    async fn test_writeup_line() {
        let buffer = SharedBuffer::default();
        let handler = HumanOutput::with_writer(Box::new(buffer.clone()), false);
        let result = WriteupResult {
            entry_id: "e1".to_string(),
            title: "Baby ROP".to_string(),
            task_path: "/task/1".to_string(),
            writeup: None,
            commit_id: None,
            status: WriteupStatus::NoWriteup,
        };

        handler.emit(Record::Writeup(&result)).await.unwrap();
        assert_eq!(buffer.contents(), "no_writeup Baby ROP -\n");
    }
}
