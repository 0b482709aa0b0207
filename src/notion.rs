/// Notion database access.
///
/// This module provides the record operations the note store depends on
/// (create, update and paginated query) behind `NotionClientTrait`, with a
/// blocking HTTP implementation and an in-memory one.
mod client;
mod memory;
mod wire;

pub use client::{NotionClient, NotionClientBuilder, NotionClientTrait, NotionError};
pub use memory::InMemoryNotion;
pub use wire::{MAX_TEXT_SEGMENT, Page, QueryFilter, QueryPage, QueryRequest};
