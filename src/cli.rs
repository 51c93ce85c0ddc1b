// src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;
use crate::platforms::Platform;
use crate::types::CommitType;

/// mixto: command-line client for the Mixto notes and evidence service
///
/// Commit tool output to entries, manage notes, import CTF challenges from
/// scoring platforms and attach CTFtime writeups to solved entries.
#[derive(Parser, Debug, Clone)]
#[command(name = "mixto")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    // ===== Configuration =====
    /// Path to the JSON config file (default: ~/.mixto.json)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Mixto host, overrides MIXTO_HOST and the config file
    #[arg(long = "mixto-host", global = true)]
    pub mixto_host: Option<String>,

    /// Mixto API key, overrides MIXTO_API_KEY and the config file
    #[arg(long = "mixto-api-key", global = true)]
    pub mixto_api_key: Option<String>,

    // ===== Output Format =====
    /// Output results in JSONL format to stdout
    #[arg(short = 'j', long = "json", global = true)]
    pub json: bool,

    /// Output results in CSV format to stdout
    #[arg(long = "csv", global = true)]
    pub csv: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long = "yes", global = true)]
    pub yes: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List entries of a workspace
    Entries {
        /// Workspace id, overrides the configured one
        #[arg(short = 'w', long = "workspace")]
        workspace: Option<String>,

        /// Include each entry's commits
        #[arg(long = "commits")]
        commits: bool,
    },

    /// List workspaces visible to the API key
    Workspaces,

    /// Commit stdin, a file, or a command's output to an entry
    Commit {
        /// Entry id (MIXTO_ENTRY_ID takes precedence when set)
        #[arg(short = 'e', long = "entry-id")]
        entry_id: Option<String>,

        /// Commit title (default: "(<program>) - <args>" or "Untitled")
        #[arg(short = 't', long = "title")]
        title: Option<String>,

        /// Commit type
        #[arg(long = "type", value_enum, default_value = "tool")]
        commit_type: CommitType,

        /// Read the artifact from a file instead of stdin
        #[arg(short = 'f', long = "file", conflicts_with = "exec")]
        file: Option<PathBuf>,

        /// Strip ANSI color sequences before committing
        #[arg(long = "strip-ansi")]
        strip_ansi: bool,

        /// Extra body field as key=value (repeatable)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Run a command and commit its stdout; must come last
        #[arg(
            long = "exec",
            num_args = 1..,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        exec: Vec<String>,
    },

    /// Print the data of a commit
    ShowCommit {
        commit_id: String,
    },

    /// Read and write entry notes
    Notes {
        #[command(subcommand)]
        command: NotesCommand,
    },

    /// Import challenges from a CTF platform as entries
    Import {
        /// Platform to import from
        #[arg(short = 'p', long = "platform", value_enum)]
        platform: Platform,

        /// Platform base URL (not needed for custom)
        #[arg(long = "host")]
        host: Option<String>,

        /// JSON file of [{title, category}] for the custom platform
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,

        /// Workspace id, overrides the configured one
        #[arg(short = 'w', long = "workspace")]
        workspace: Option<String>,

        /// Show the entries that would be created without contacting Mixto
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// Attach CTFtime writeups to matching entries
    Ctftime {
        /// CTFtime event id
        #[arg(short = 'e', long = "event")]
        event: String,

        /// Resolve writeups but do not commit them
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Re-import entries that already have a writeup
        #[arg(long = "force")]
        force: bool,

        /// Writeup ledger path (default: ~/.mixto/ctftime.sqlite)
        #[arg(long = "db")]
        db: Option<PathBuf>,

        /// Workspace id, overrides the configured one
        #[arg(short = 'w', long = "workspace")]
        workspace: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum NotesCommand {
    /// List notes of an entry
    List {
        entry_id: String,
    },

    /// Add a note to an entry
    Add {
        entry_id: String,

        /// Note text; read from --file or stdin when omitted
        data: Option<String>,

        #[arg(short = 't', long = "title")]
        title: Option<String>,

        #[arg(short = 'f', long = "file", conflicts_with = "data")]
        file: Option<PathBuf>,
    },

    /// Replace the text of a note
    Update {
        note_id: String,

        /// New text; read from --file or stdin when omitted
        data: Option<String>,

        #[arg(short = 'f', long = "file", conflicts_with = "data")]
        file: Option<PathBuf>,
    },
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.json && self.csv {
            anyhow::bail!("Cannot specify multiple output formats. Choose one of: --json or --csv");
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        match &self.command {
            Command::Import {
                platform,
                host,
                file,
                ..
            } => match platform {
                Platform::Custom if file.is_none() => {
                    anyhow::bail!("--platform custom needs --file <challenges.json>")
                }
                Platform::Custom => {}
                _ if host.is_none() => {
                    anyhow::bail!("--platform {:?} needs --host <url>", platform)
                }
                _ => {}
            },
            Command::Ctftime { event, .. } => {
                if event.is_empty() || !event.chars().all(|c| c.is_ascii_digit()) {
                    anyhow::bail!("--event must be a CTFtime event id (digits only)");
                }
            }
            Command::Commit { fields, .. } => {
                if let Some(bad) = fields.iter().find(|f| !f.contains('=')) {
                    anyhow::bail!("--field {:?} is not key=value", bad);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Determine the output format based on flags
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Human
        }
    }

    /// Determine log level based on verbose/quiet flags
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_human() {
        let cli = Cli::parse_from(["mixto", "workspaces"]);
        assert_eq!(cli.output_format(), OutputFormat::Human);
        assert_eq!(cli.log_level(), "info");
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["mixto", "entries", "--commits", "--json", "-v"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
        assert_eq!(cli.log_level(), "debug");
        assert!(matches!(cli.command, Command::Entries { commits: true, .. }));
    }

    #[test]
    fn test_multiple_formats_invalid() {
        let cli = Cli::parse_from(["mixto", "workspaces", "--json", "--csv"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_verbose_and_quiet_invalid() {
        let cli = Cli::parse_from(["mixto", "workspaces", "--verbose", "--quiet"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_import_needs_host_or_file() {
        let cli = Cli::parse_from(["mixto", "import", "--platform", "ctfd"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["mixto", "import", "--platform", "custom"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["mixto", "import", "-p", "custom", "-f", "c.json", "--dry-run"]);
        assert!(cli.validate().is_ok());

        let cli = Cli::parse_from(["mixto", "import", "-p", "htb", "--host", "https://ctf.hackthebox.com"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_ctftime_event_must_be_digits() {
        let cli = Cli::parse_from(["mixto", "ctftime", "--event", "19a"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["mixto", "ctftime", "--event", "1900", "--force", "--db", "/tmp/l.sqlite"]);
        assert!(cli.validate().is_ok());
        match cli.command {
            Command::Ctftime { force, db, dry_run, .. } => {
                assert!(force);
                assert!(!dry_run);
                assert_eq!(db, Some(PathBuf::from("/tmp/l.sqlite")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_commit_exec_takes_remaining_args() {
        let cli = Cli::parse_from([
            "mixto", "commit", "-e", "entry-1", "--strip-ansi", "--field", "documentation=true",
            "--exec", "nmap", "-sV", "10.0.0.1",
        ]);
        assert!(cli.validate().is_ok());
        match cli.command {
            Command::Commit { entry_id, exec, fields, strip_ansi, commit_type, .. } => {
                assert_eq!(entry_id.as_deref(), Some("entry-1"));
                assert_eq!(exec, vec!["nmap", "-sV", "10.0.0.1"]);
                assert_eq!(fields, vec!["documentation=true"]);
                assert!(strip_ansi);
                assert_eq!(commit_type, CommitType::Tool);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_commit_file_conflicts_with_exec() {
        let res = Cli::try_parse_from(["mixto", "commit", "-f", "out.txt", "--exec", "id"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_bad_field_invalid() {
        let cli = Cli::parse_from(["mixto", "commit", "--field", "nokey"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_notes_subcommands() {
        let cli = Cli::parse_from(["mixto", "notes", "add", "entry-1", "found creds", "-t", "recon"]);
        match cli.command {
            Command::Notes { command: NotesCommand::Add { entry_id, data, title, .. } } => {
                assert_eq!(entry_id, "entry-1");
                assert_eq!(data.as_deref(), Some("found creds"));
                assert_eq!(title.as_deref(), Some("recon"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
