//! Persistence of structured notes in a Notion database.
//!
//! `NoteStore` is the surface the rest of the application uses. It validates
//! notes, looks for an existing record of the same question, encodes the note
//! and writes it, and reads every note back with pagination.
//!
//! There is no locking around the duplicate check: two concurrent `upsert`
//! calls for a new question can both decide to create, leaving two records.

mod error;
mod resolver;

pub use error::{Operation, StoreError};
pub use resolver::{DEFAULT_PREFIX_LENGTH, MatchResolver, MatchStrategy, PrefixMatch};

use std::sync::Arc;

use log::{debug, info, warn};

use crate::codec::PropertyCodec;
use crate::models::{PageId, StructuredNote};
use crate::notion::{NotionClientTrait, QueryRequest};

/// Results requested per page when scanning the database.
pub const PAGE_SIZE: usize = 100;

/// What `upsert` did with a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No matching record existed; a new one was created.
    Created(PageId),
    /// A matching record was overwritten.
    Updated(PageId),
}

impl UpsertOutcome {
    /// Returns the id of the written record.
    pub fn id(&self) -> &PageId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }

    pub fn into_id(self) -> PageId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Notes stored in one Notion database.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use quiznote::notion::InMemoryNotion;
/// use quiznote::{NoteBuilder, NoteStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = NoteStore::new(Arc::new(InMemoryNotion::new()), "database-id");
///
/// let note = NoteBuilder::new()
///     .question_text("Which service provides block storage for EC2?")
///     .choices(["S3", "EBS", "EFS"])
///     .correct_answer(2)
///     .build()?;
///
/// let first = store.upsert(&note)?;
/// let second = store.upsert(&note)?;
/// assert_eq!(first.id(), second.id());
/// assert_eq!(store.list_all()?, vec![note]);
/// # Ok(())
/// # }
/// ```
pub struct NoteStore {
    client: Arc<dyn NotionClientTrait>,
    database_id: String,
    resolver: MatchResolver,
}

impl NoteStore {
    /// Creates a store writing to `database_id` with the default
    /// 50-character prefix duplicate check.
    pub fn new(client: Arc<dyn NotionClientTrait>, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
            resolver: MatchResolver::default(),
        }
    }

    /// Replaces the duplicate-detection strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl MatchStrategy + 'static) -> Self {
        self.resolver = MatchResolver::new(strategy);
        self
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Creates the note, or updates the record of the same question.
    ///
    /// Calling this twice with an unchanged note writes the same record
    /// twice and returns the same id.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if the note breaks a data-model invariant;
    ///   nothing is sent in that case.
    /// - `StoreError::SchemaMismatch` if the database lacks a property.
    /// - `StoreError::Transport` for any other failed write.
    pub fn upsert(&self, note: &StructuredNote) -> Result<UpsertOutcome, StoreError> {
        note.validate()?;

        let existing =
            self.resolver
                .find(self.client.as_ref(), &self.database_id, &note.question_text);
        let properties = PropertyCodec::encode(note);
        let input_size = properties.byte_len();

        match existing {
            Some(id) => {
                debug!("updating {id} with {} properties", properties.len());
                let id = self
                    .client
                    .update_page(&id, &properties)
                    .map_err(|e| {
                        StoreError::from_notion(e, Operation::Update, input_size, &self.database_id)
                    })?;
                info!("updated note {id}");
                Ok(UpsertOutcome::Updated(id))
            }
            None => {
                debug!("creating note with {} properties", properties.len());
                let id = self
                    .client
                    .create_page(&self.database_id, &properties)
                    .map_err(|e| {
                        StoreError::from_notion(e, Operation::Create, input_size, &self.database_id)
                    })?;
                info!("created note {id}");
                Ok(UpsertOutcome::Created(id))
            }
        }
    }

    /// Reads every note in the database.
    ///
    /// Pages through the whole database 100 records at a time. Records that
    /// cannot be decoded are logged and left out; they do not fail the scan.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` (or `SchemaMismatch`) if any page
    /// request fails.
    pub fn list_all(&self) -> Result<Vec<StructuredNote>, StoreError> {
        let mut notes = Vec::new();
        let mut cursor: Option<String> = None;
        let mut skipped = 0usize;

        loop {
            let request = QueryRequest::new(PAGE_SIZE).start_cursor(cursor.take());
            let page = self
                .client
                .query_database(&self.database_id, &request)
                .map_err(|e| {
                    StoreError::from_notion(
                        e,
                        Operation::Query,
                        request.start_cursor.as_ref().map_or(0, String::len),
                        &self.database_id,
                    )
                })?;

            for record in page.results {
                match PropertyCodec::decode(&record.properties) {
                    Some(note) => notes.push(note),
                    None => {
                        skipped += 1;
                        warn!("skipping record {} that could not be decoded", record.id);
                    }
                }
            }

            if !page.has_more {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    warn!("store reported more results without a cursor; stopping scan");
                    break;
                }
            }
        }

        debug!("listed {} notes ({skipped} skipped)", notes.len());
        Ok(notes)
    }
}

#[cfg(test)]
mod tests;
