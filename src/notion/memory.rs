//! In-process implementation of the Notion record operations.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::wire::{QueryFilter, QueryPage, QueryRequest};
use super::{NotionClientTrait, NotionError, Page};
use crate::codec::{ExternalRecord, PropertyKind};
use crate::models::PageId;

/// Largest page size the remote API honours.
const MAX_PAGE_SIZE: usize = 100;

struct StoredPage {
    id: PageId,
    database_id: String,
    properties: ExternalRecord,
}

#[derive(Default)]
struct MemoryState {
    pages: Vec<StoredPage>,
    next_id: u64,
    creates: usize,
    updates: usize,
    queries: usize,
}

/// Database pages held in memory.
///
/// Behaves like the remote API for the operations the note store uses:
/// `contains` title filters, cursor pagination capped at 100 results and,
/// when a schema is declared, the same validation errors for unknown or
/// mistyped properties. Useful for tests and dry runs.
#[derive(Default)]
pub struct InMemoryNotion {
    state: Mutex<MemoryState>,
    schema: Option<BTreeMap<String, PropertyKind>>,
}

impl InMemoryNotion {
    /// Creates an empty store that accepts any property.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose databases declare exactly these properties.
    pub fn with_schema<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = (S, PropertyKind)>,
        S: Into<String>,
    {
        Self {
            state: Mutex::default(),
            schema: Some(
                properties
                    .into_iter()
                    .map(|(name, kind)| (name.into(), kind))
                    .collect(),
            ),
        }
    }

    /// Inserts a page directly, bypassing schema checks.
    pub fn insert_raw(&self, database_id: &str, properties: ExternalRecord) -> PageId {
        let mut state = self.lock();
        let id = Self::allocate_id(&mut state);
        state.pages.push(StoredPage {
            id: id.clone(),
            database_id: database_id.to_string(),
            properties,
        });
        id
    }

    /// Returns every page stored in `database_id`, in insertion order.
    pub fn pages(&self, database_id: &str) -> Vec<Page> {
        self.lock()
            .pages
            .iter()
            .filter(|page| page.database_id == database_id)
            .map(|page| Page {
                id: page.id.clone(),
                properties: page.properties.clone(),
            })
            .collect()
    }

    /// Number of pages across all databases.
    pub fn page_count(&self) -> usize {
        self.lock().pages.len()
    }

    /// Number of successful and failed create calls.
    pub fn create_calls(&self) -> usize {
        self.lock().creates
    }

    pub fn update_calls(&self) -> usize {
        self.lock().updates
    }

    pub fn query_calls(&self) -> usize {
        self.lock().queries
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_id(state: &mut MemoryState) -> PageId {
        state.next_id += 1;
        PageId::new(format!("page-{:04}", state.next_id))
    }

    /// Rejects properties the declared schema does not have, or has with a
    /// different type, using the remote API's message wording.
    fn check_schema(&self, properties: &ExternalRecord) -> Result<(), NotionError> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };

        let problems: Vec<String> = properties
            .iter()
            .filter_map(|(name, value)| match schema.get(name) {
                None => Some(format!("{name} is not a property that exists.")),
                Some(kind) if *kind != value.kind() => {
                    Some(format!("{name} is expected to be {}.", kind.as_str()))
                }
                Some(_) => None,
            })
            .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(NotionError::Api {
                status: 400,
                code: "validation_error".to_string(),
                message: problems.join(" "),
            })
        }
    }
}

fn matches_filter(properties: &ExternalRecord, filter: Option<&QueryFilter>) -> bool {
    match filter {
        None => true,
        Some(QueryFilter::TitleContains { property, value }) => properties
            .text(property)
            .is_some_and(|title| title.contains(value.as_str())),
    }
}

impl NotionClientTrait for InMemoryNotion {
    fn create_page(
        &self,
        database_id: &str,
        properties: &ExternalRecord,
    ) -> Result<PageId, NotionError> {
        self.lock().creates += 1;
        self.check_schema(properties)?;
        Ok(self.insert_raw(database_id, properties.clone()))
    }

    fn update_page(
        &self,
        page_id: &PageId,
        properties: &ExternalRecord,
    ) -> Result<PageId, NotionError> {
        self.lock().updates += 1;
        self.check_schema(properties)?;

        let mut state = self.lock();
        let page = state
            .pages
            .iter_mut()
            .find(|page| &page.id == page_id)
            .ok_or_else(|| NotionError::Api {
                status: 404,
                code: "object_not_found".to_string(),
                message: format!("Could not find page with ID: {page_id}."),
            })?;

        // Update semantics: listed properties are replaced, others are kept.
        for (name, value) in properties.iter() {
            page.properties.insert(name, value.clone());
        }
        Ok(page.id.clone())
    }

    fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryPage, NotionError> {
        let mut state = self.lock();
        state.queries += 1;

        let matching: Vec<&StoredPage> = state
            .pages
            .iter()
            .filter(|page| page.database_id == database_id)
            .filter(|page| matches_filter(&page.properties, request.filter.as_ref()))
            .collect();

        let start = match &request.start_cursor {
            None => 0,
            Some(cursor) => matching
                .iter()
                .position(|page| page.id.as_str() == cursor.as_str())
                .ok_or_else(|| NotionError::Api {
                    status: 400,
                    code: "validation_error".to_string(),
                    message: format!("start_cursor {cursor} is not valid."),
                })?,
        };

        let page_size = request.page_size.clamp(1, MAX_PAGE_SIZE);
        let end = (start + page_size).min(matching.len());
        let results = matching[start..end]
            .iter()
            .map(|page| Page {
                id: page.id.clone(),
                properties: page.properties.clone(),
            })
            .collect();
        let next_cursor = matching.get(end).map(|page| page.id.to_string());

        Ok(QueryPage {
            results,
            has_more: next_cursor.is_some(),
            next_cursor,
        })
    }
}
