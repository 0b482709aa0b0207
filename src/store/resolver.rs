//! Duplicate detection for incoming notes.

use log::{debug, warn};

use crate::codec::QUESTION_TEXT;
use crate::models::PageId;
use crate::notion::{NotionClientTrait, QueryFilter, QueryRequest};

/// Number of leading characters of the question used as the search key.
pub const DEFAULT_PREFIX_LENGTH: usize = 50;

/// Derives the text searched for when looking for an existing record.
///
/// Implementations decide what counts as "the same question". Returning
/// `None` means the question cannot be matched and always creates a record.
pub trait MatchStrategy: Send + Sync {
    fn search_key(&self, question_text: &str) -> Option<String>;
}

/// Matches on the first `length` characters of the question text.
///
/// Two different questions sharing that prefix are treated as the same
/// record, and editing the prefix of a stored question creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch {
    length: usize,
}

impl PrefixMatch {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for PrefixMatch {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX_LENGTH)
    }
}

impl MatchStrategy for PrefixMatch {
    fn search_key(&self, question_text: &str) -> Option<String> {
        let key: String = question_text.chars().take(self.length).collect();
        (!key.trim().is_empty()).then_some(key)
    }
}

/// Finds the record, if any, that an incoming note should update.
pub struct MatchResolver {
    strategy: Box<dyn MatchStrategy>,
}

impl Default for MatchResolver {
    fn default() -> Self {
        Self::new(PrefixMatch::default())
    }
}

impl MatchResolver {
    pub fn new(strategy: impl MatchStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    /// Returns the id of the first record whose title contains the search key.
    ///
    /// Query failures are logged and reported as "not found" so that the
    /// write still goes ahead; the cost is a possible duplicate record.
    pub fn find(
        &self,
        client: &dyn NotionClientTrait,
        database_id: &str,
        question_text: &str,
    ) -> Option<PageId> {
        let key = self.strategy.search_key(question_text)?;
        let request = QueryRequest::new(1).filter(QueryFilter::TitleContains {
            property: QUESTION_TEXT.to_string(),
            value: key,
        });

        match client.query_database(database_id, &request) {
            Ok(page) => {
                let found = page.results.into_iter().next().map(|page| page.id);
                debug!("duplicate check in {database_id}: {found:?}");
                found
            }
            Err(e) => {
                warn!("duplicate check failed, treating note as new: {e}");
                None
            }
        }
    }
}
