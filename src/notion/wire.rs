//! JSON shapes exchanged with the Notion REST API.

use serde_json::{Map, Value, json};

use super::NotionError;
use crate::codec::{ExternalRecord, PropertyValue};
use crate::models::PageId;

/// Longest text a single rich-text segment may carry.
pub const MAX_TEXT_SEGMENT: usize = 2000;

/// Server-side filter for a database query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// Title property contains the given text.
    TitleContains { property: String, value: String },
}

/// One request for a page of database results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub filter: Option<QueryFilter>,
    pub start_cursor: Option<String>,
    pub page_size: usize,
}

impl QueryRequest {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: None,
            start_cursor: None,
            page_size,
        }
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn start_cursor(mut self, cursor: Option<String>) -> Self {
        self.start_cursor = cursor;
        self
    }
}

/// A stored record and its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: PageId,
    pub properties: ExternalRecord,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPage {
    pub results: Vec<Page>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Builds the `properties` object for a create or update request.
pub(crate) fn properties_to_json(record: &ExternalRecord) -> Value {
    let properties: Map<String, Value> = record
        .iter()
        .map(|(name, value)| {
            let body = match value {
                PropertyValue::Title(text) => json!({ "title": text_segments(text) }),
                PropertyValue::RichText(text) => json!({ "rich_text": text_segments(text) }),
                PropertyValue::Number(number) => json!({ "number": number }),
                PropertyValue::MultiSelect(tags) => json!({
                    "multi_select": tags.iter().map(|tag| json!({ "name": tag })).collect::<Vec<_>>()
                }),
            };
            (name.to_string(), body)
        })
        .collect();
    Value::Object(properties)
}

/// Splits text into segments no longer than `MAX_TEXT_SEGMENT` characters.
fn text_segments(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_TEXT_SEGMENT)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect()
}

/// Builds the body of a database query request.
pub(crate) fn query_body(request: &QueryRequest) -> Value {
    let mut body = json!({ "page_size": request.page_size });
    if let Some(cursor) = &request.start_cursor {
        body["start_cursor"] = json!(cursor);
    }
    if let Some(QueryFilter::TitleContains { property, value }) = &request.filter {
        body["filter"] = json!({
            "property": property,
            "title": { "contains": value },
        });
    }
    body
}

/// Reads the id of a page object returned by create or update.
pub(crate) fn page_id_from_json(value: &Value) -> Result<PageId, NotionError> {
    value
        .get("id")
        .and_then(Value::as_str)
        .map(PageId::new)
        .ok_or_else(|| NotionError::InvalidResponse("page object without an id".to_string()))
}

/// Parses a full page object. Properties of unsupported types are skipped.
pub(crate) fn page_from_json(value: &Value) -> Result<Page, NotionError> {
    let id = page_id_from_json(value)?;
    let mut properties = ExternalRecord::new();

    if let Some(map) = value.get("properties").and_then(Value::as_object) {
        for (name, property) in map {
            if let Some(parsed) = property_from_json(property) {
                properties.insert(name.clone(), parsed);
            }
        }
    }

    Ok(Page { id, properties })
}

fn property_from_json(property: &Value) -> Option<PropertyValue> {
    match property.get("type")?.as_str()? {
        "title" => Some(PropertyValue::Title(plain_text(property.get("title")?))),
        "rich_text" => Some(PropertyValue::RichText(plain_text(property.get("rich_text")?))),
        "number" => Some(PropertyValue::Number(
            property.get("number").and_then(Value::as_f64),
        )),
        "multi_select" => Some(PropertyValue::MultiSelect(
            property
                .get("multi_select")?
                .as_array()?
                .iter()
                .filter_map(|option| option.get("name").and_then(Value::as_str))
                .map(String::from)
                .collect(),
        )),
        _ => None,
    }
}

/// Concatenates the text of every segment in a rich-text array.
fn plain_text(segments: &Value) -> String {
    segments
        .as_array()
        .map(|segments| {
            segments
                .iter()
                .filter_map(|segment| {
                    segment
                        .get("plain_text")
                        .or_else(|| segment.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parses a query response.
pub(crate) fn query_page_from_json(value: &Value) -> Result<QueryPage, NotionError> {
    let results = value
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| NotionError::InvalidResponse("query response without results".to_string()))?
        .iter()
        .map(page_from_json)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryPage {
        results,
        has_more: value
            .get("has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        next_cursor: value
            .get("next_cursor")
            .and_then(Value::as_str)
            .map(String::from),
    })
}
