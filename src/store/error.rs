use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::codec::{OPTIONAL_PROPERTIES, REQUIRED_PROPERTIES, property_kind};
use crate::models::ValidationError;
use crate::notion::NotionError;

static MISSING_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^.]+?) is not a property that exists").expect("missing property pattern is valid")
});

static MISTYPED_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^.]+?) is expected to be \w+").expect("mistyped property pattern is valid")
});

/// Store call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Query,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// Errors returned by `NoteStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The note was rejected before any request was sent.
    #[error("invalid note: {0}")]
    Validation(#[from] ValidationError),

    /// The destination database lacks a property or declares it with another type.
    #[error(
        "Notion database {database_id} does not match the expected schema; missing or mistyped: {}. \
         Add each property with exactly this name and type, or check that NOTION_DATABASE_ID \
         points at the intended database",
        describe_fields(.fields)
    )]
    SchemaMismatch {
        fields: Vec<String>,
        database_id: String,
        #[source]
        source: NotionError,
    },

    /// Any other failure talking to the store.
    #[error("{operation} failed for database {database_id} ({input_size} bytes sent): {source}")]
    Transport {
        operation: Operation,
        input_size: usize,
        database_id: String,
        #[source]
        source: NotionError,
    },
}

impl StoreError {
    /// Classifies a client error from `operation`.
    pub(crate) fn from_notion(
        source: NotionError,
        operation: Operation,
        input_size: usize,
        database_id: &str,
    ) -> Self {
        match schema_mismatch_fields(&source) {
            Some(fields) => Self::SchemaMismatch {
                fields,
                database_id: database_id.to_string(),
                source,
            },
            None => Self::Transport {
                operation,
                input_size,
                database_id: database_id.to_string(),
                source,
            },
        }
    }

    /// Returns true for schema problems the user has to fix in the database.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }
}

/// Extracts the property names an API error complains about, or `None` when
/// the error is not about the schema.
pub(crate) fn schema_mismatch_fields(error: &NotionError) -> Option<Vec<String>> {
    let message = error.api_message()?;
    if !MISSING_PROPERTY.is_match(message) && !MISTYPED_PROPERTY.is_match(message) {
        return None;
    }

    let mut fields: Vec<String> = MISSING_PROPERTY
        .captures_iter(message)
        .chain(MISTYPED_PROPERTY.captures_iter(message))
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if fields.is_empty() {
        fields = REQUIRED_PROPERTIES
            .iter()
            .chain(OPTIONAL_PROPERTIES.iter())
            .filter(|name| message.contains(*name))
            .map(|name| name.to_string())
            .collect();
    }
    fields.dedup();
    Some(fields)
}

/// Renders `Name (type)` for each field, using the expected type when known.
fn describe_fields(fields: &[String]) -> String {
    if fields.is_empty() {
        return "unknown property".to_string();
    }
    fields
        .iter()
        .map(|name| match property_kind(name) {
            Some(kind) => format!("\"{name}\" ({})", kind.as_str()),
            None => format!("\"{name}\""),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
