use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quiznote::{
    NoteBuilder, NoteStore, NotionClientBuilder, NotionClientTrait, NotionError, PillarNormalizer,
    StoreError, StructuredNote, UpsertOutcome,
};
use thiserror::Error;

/// quiznote - keep explained exam questions in a Notion database
#[derive(Parser)]
#[command(name = "quiznote")]
#[command(about = "Save and list explained exam questions in a Notion database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Save a note, updating the record of the same question if one exists
    Save(SaveCommand),
    /// List every note in the database
    List(ListCommand),
    /// Print the canonical slug for each category label
    Normalize(NormalizeCommand),
}

/// Save a note read from a JSON file
#[derive(Parser)]
struct SaveCommand {
    /// JSON file holding the note, or `-` for stdin
    #[arg(value_name = "FILE")]
    file: String,

    /// Target database (defaults to NOTION_DATABASE_ID)
    #[arg(long, value_name = "ID")]
    database_id: Option<String>,
}

/// List notes
#[derive(Parser)]
struct ListCommand {
    /// Print the notes as a JSON array
    #[arg(long)]
    json: bool,

    /// Only show notes tagged with this category
    #[arg(short, long, value_name = "LABEL")]
    category: Option<String>,

    /// Source database (defaults to NOTION_DATABASE_ID)
    #[arg(long, value_name = "ID")]
    database_id: Option<String>,
}

/// Normalize category labels
#[derive(Parser)]
struct NormalizeCommand {
    #[arg(value_name = "LABEL", required = true)]
    labels: Vec<String>,
}

/// Problems with what the user asked for, as opposed to failures while doing it.
#[derive(Debug, Error)]
enum UsageError {
    #[error("No database id given; pass --database-id or set NOTION_DATABASE_ID")]
    MissingDatabaseId,
    #[error("Note input is empty")]
    EmptyInput,
}

fn main() {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Save(cmd) => handle_save(cmd),
        Commands::List(cmd) => handle_list(cmd),
        Commands::Normalize(cmd) => {
            execute_normalize(&cmd.labels);
            Ok(())
        }
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input or configuration: invalid notes, malformed
/// JSON, a database whose schema does not fit, missing credentials.
/// Everything else (network, server errors) is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.is::<UsageError>()
            || cause.is::<serde_json::Error>()
            || matches!(
                cause.downcast_ref::<StoreError>(),
                Some(StoreError::Validation(_) | StoreError::SchemaMismatch { .. })
            )
            || matches!(
                cause.downcast_ref::<NotionError>(),
                Some(NotionError::MissingApiKey | NotionError::InvalidUrl(_))
            )
    })
}

fn handle_save(cmd: &SaveCommand) -> Result<()> {
    let input = read_input(&cmd.file)?;
    let note = parse_note(&input)?;
    let database_id = resolve_database_id(cmd.database_id.as_deref())?;
    let client = connect()?;

    execute_save(&note, &NoteStore::new(client, database_id))
}

fn handle_list(cmd: &ListCommand) -> Result<()> {
    let database_id = resolve_database_id(cmd.database_id.as_deref())?;
    let client = connect()?;

    execute_list(
        &NoteStore::new(client, database_id),
        cmd.category.as_deref(),
        cmd.json,
    )
}

/// Executes the save command logic with a provided store.
///
/// This function is separated from `handle_save` to allow testing with the
/// in-memory store.
fn execute_save(note: &StructuredNote, store: &NoteStore) -> Result<()> {
    let outcome = store.upsert(note).context("Failed to save note")?;

    match &outcome {
        UpsertOutcome::Created(id) => println!("Note created (id: {id})"),
        UpsertOutcome::Updated(id) => println!("Note updated (id: {id})"),
    }
    Ok(())
}

fn execute_list(store: &NoteStore, category: Option<&str>, json: bool) -> Result<()> {
    let notes = filter_by_category(
        store.list_all().context("Failed to list notes")?,
        category,
    );

    if json {
        let rendered = serde_json::to_string_pretty(&notes).context("Failed to render notes")?;
        println!("{rendered}");
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes found.");
        return Ok(());
    }
    for note in &notes {
        println!("{}", summary_line(note));
    }
    Ok(())
}

fn execute_normalize(labels: &[String]) {
    for label in labels {
        println!("{label} -> {}", PillarNormalizer::normalize(label));
    }
}

fn filter_by_category(notes: Vec<StructuredNote>, category: Option<&str>) -> Vec<StructuredNote> {
    match category {
        Some(label) => notes
            .into_iter()
            .filter(|note| note.has_category(label))
            .collect(),
        None => notes,
    }
}

/// Formats one note as `[answer] question (categories)`.
fn summary_line(note: &StructuredNote) -> String {
    let answers: Vec<String> = note.correct_answer.iter().map(|n| n.to_string()).collect();
    let mut line = format!("[{}] {}", answers.join(","), note.question_text.trim());
    if !note.well_architected_categories.is_empty() {
        let categories: Vec<&str> = note
            .well_architected_categories
            .iter()
            .map(String::as_str)
            .collect();
        line.push_str(&format!(" ({})", categories.join(", ")));
    }
    line
}

/// Reads the note document from a file, or from stdin when `source` is `-`.
fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read note from stdin")?;
        return Ok(input);
    }

    let path = Path::new(source);
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read note file: {}", path.display()))
}

/// Parses a note document and fills in what the builder derives.
///
/// Missing choice explanations are synthesized from the choices, a missing
/// correct choice text is taken from the primary answer and category labels
/// are normalized.
fn parse_note(input: &str) -> Result<StructuredNote> {
    if input.trim().is_empty() {
        return Err(UsageError::EmptyInput.into());
    }

    let raw: StructuredNote = serde_json::from_str(input).context("Invalid note JSON")?;

    let mut builder = NoteBuilder::new()
        .question_text(raw.question_text)
        .choices(raw.choices)
        .correct_answer(raw.correct_answer)
        .explanation(raw.explanation)
        .related_services(raw.related_services)
        .categories(raw.well_architected_categories)
        .learning_points(raw.learning_points);
    if !raw.correct_choice_text.is_empty() {
        builder = builder.correct_choice_text(raw.correct_choice_text);
    }
    if !raw.choice_explanations.is_empty() {
        builder = builder.choice_explanations(raw.choice_explanations);
    }
    if let Some(diagram) = raw.architecture_diagram {
        builder = builder.architecture_diagram(diagram);
    }
    if let Some(hint) = raw.similar_questions_hint {
        builder = builder.similar_questions_hint(hint);
    }

    builder
        .build()
        .map_err(StoreError::from)
        .context("Invalid note")
}

fn resolve_database_id(flag: Option<&str>) -> Result<String> {
    flag.map(String::from)
        .or_else(|| std::env::var("NOTION_DATABASE_ID").ok())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| UsageError::MissingDatabaseId.into())
}

fn connect() -> Result<Arc<dyn NotionClientTrait>> {
    let client = NotionClientBuilder::new()
        .build()
        .context("Failed to configure Notion client")?;
    Ok(Arc::new(client))
}
