// src/main.rs
use anyhow::Context;
use clap::Parser;
use mixto_lite::capture::{parse_field, strip_ansi, CaptureSource};
use mixto_lite::cli::{Cli, Command, NotesCommand};
use mixto_lite::client::{MixtoClient, NewCommit};
use mixto_lite::config::ConfigResolver;
use mixto_lite::output::{OutputFormat, OutputHandler, Record};
use mixto_lite::platforms::import::ImportOutcome;
use mixto_lite::platforms::ChallengeImporter;
use mixto_lite::progress::ProgressIndicator;
use mixto_lite::prompt::StdinPrompter;
use mixto_lite::writeups::{default_ledger_path, CtftimeClient, ImportLedger, WriteupImporter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    // Initialize logging; stdout is reserved for results
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Resolve configuration once: flags > environment > config file
    let config = ConfigResolver::from_process_env()
        .config_path(cli.config.clone())
        .host(cli.mixto_host.clone())
        .api_key(cli.mixto_api_key.clone())
        .resolve()?;
    tracing::debug!("Resolved configuration: {:?}", config);

    let client = MixtoClient::new(config)?;
    let format = cli.output_format();
    let output = format.handler();

    run(cli, &client, format, output.as_ref()).await?;

    output.flush().await?;
    Ok(())
}

async fn run(
    cli: Cli,
    client: &MixtoClient,
    format: OutputFormat,
    output: &dyn OutputHandler,
) -> anyhow::Result<()> {
    let assume_yes = cli.yes;

    match cli.command {
        Command::Workspaces => {
            let workspaces = client.get_workspaces().await?;
            for workspace in &workspaces {
                output.emit(Record::Workspace(workspace)).await?;
            }
        }

        Command::Entries {
            workspace,
            commits,
        } => {
            let entries = client.list_entries(workspace.as_deref(), commits).await?;
            for entry in &entries {
                output.emit(Record::Entry(entry)).await?;
            }
            output
                .message(&format!("{} entries", entries.len()))
                .await?;
        }

        Command::Commit {
            entry_id,
            title,
            commit_type,
            file,
            strip_ansi: strip,
            fields,
            exec,
        } => {
            let source = CaptureSource::from_args(file, &exec);
            let mut data = source.read().await?;
            if strip {
                data = strip_ansi(&data);
            }
            if data.trim().is_empty() {
                tracing::warn!("Captured output is empty");
            }

            let title = title.unwrap_or_else(|| source.default_title());
            let mut commit = NewCommit::new(data).title(title).commit_type(commit_type);
            for raw in &fields {
                let (key, value) = parse_field(raw)?;
                commit = commit.field(key, value);
            }

            let added = client.add_commit(entry_id.as_deref(), commit).await?;
            output.emit(Record::Commit(&added)).await?;
        }

        Command::ShowCommit { commit_id } => {
            let data = client.get_commit_data(&commit_id).await?;
            println!("{}", data);
        }

        Command::Notes { command } => run_notes(command, client, output).await?,

        Command::Import {
            platform,
            host,
            file,
            workspace,
            dry_run,
        } => {
            let adapter = platform.adapter(host.as_deref(), file)?;
            let mut prompter = StdinPrompter::new().assume_yes(assume_yes);

            let outcome = ChallengeImporter::new(client)
                .workspace(workspace)
                .dry_run(dry_run)
                .run(adapter.as_ref(), &mut prompter)
                .await?;

            match &outcome {
                ImportOutcome::DryRun(entries) => {
                    for entry in entries {
                        output.emit(Record::Planned(entry)).await?;
                    }
                    output
                        .message(&format!("{} entries would be added", entries.len()))
                        .await?;
                }
                ImportOutcome::Created(entries) => {
                    for entry in entries {
                        output.emit(Record::Entry(entry)).await?;
                    }
                    output
                        .message(&format!("Entries added: {}", entries.len()))
                        .await?;
                }
            }
        }

        Command::Ctftime {
            event,
            dry_run,
            force,
            db,
            workspace,
        } => {
            let db_path: PathBuf = match db {
                Some(path) => path,
                None => default_ledger_path()
                    .context("Cannot locate the home directory, pass --db <path>")?,
            };
            let ledger = ImportLedger::open(&db_path)
                .await
                .with_context(|| format!("Failed to open writeup ledger {}", db_path.display()))?;
            let source = CtftimeClient::new()?;
            let progress = ProgressIndicator::for_terminal(format == OutputFormat::Human);

            let results = WriteupImporter::new(client, &source, &ledger, event)
                .workspace(workspace)
                .run(dry_run, force, &progress)
                .await?;

            for result in &results {
                output.emit(Record::Writeup(result)).await?;
            }
            ledger.close().await;
        }
    }

    Ok(())
}

async fn run_notes(
    command: NotesCommand,
    client: &MixtoClient,
    output: &dyn OutputHandler,
) -> anyhow::Result<()> {
    match command {
        NotesCommand::List { entry_id } => {
            let notes = client.get_notes(&entry_id).await?;
            for note in &notes {
                output.emit(Record::Note(note)).await?;
            }
        }

        NotesCommand::Add {
            entry_id,
            data,
            title,
            file,
        } => {
            let data = note_text(data, file).await?;
            let note_id = client
                .create_note(&entry_id, title.as_deref().unwrap_or_default(), &data)
                .await?;
            output
                .message(&format!("Added note {} to entry {}", note_id, entry_id))
                .await?;
        }

        NotesCommand::Update {
            note_id,
            data,
            file,
        } => {
            let data = note_text(data, file).await?;
            let note_id = client.update_note(&note_id, &data).await?;
            output
                .message(&format!("Updated note {}", note_id))
                .await?;
        }
    }
    Ok(())
}

/// Note text from the argument, else the file, else stdin
async fn note_text(data: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    match data {
        Some(data) => Ok(data),
        None => Ok(CaptureSource::from_args(file, &[]).read().await?),
    }
}
