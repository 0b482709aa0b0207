use std::collections::BTreeMap;

/// Title property. Also the property the duplicate check searches.
pub const QUESTION_TEXT: &str = "Question Text";
pub const CHOICES: &str = "Choices";
pub const CORRECT_ANSWER: &str = "Correct Answer";
pub const CORRECT_CHOICE_TEXT: &str = "Correct Choice Text";
pub const EXPLANATION: &str = "Explanation";
pub const RELATED_SERVICES: &str = "Related Services";
pub const WELL_ARCHITECTED_CATEGORY: &str = "Well-Architected Category";
pub const CHOICE_EXPLANATIONS: &str = "Choice Explanations";
pub const LEARNING_POINTS: &str = "Learning Points";
pub const ARCHITECTURE_DIAGRAM: &str = "Architecture Diagram";
pub const SIMILAR_QUESTIONS_HINT: &str = "Similar Questions Hint";

/// Properties every destination must declare before the first write.
pub const REQUIRED_PROPERTIES: [&str; 9] = [
    QUESTION_TEXT,
    CHOICES,
    CORRECT_ANSWER,
    CORRECT_CHOICE_TEXT,
    EXPLANATION,
    RELATED_SERVICES,
    WELL_ARCHITECTED_CATEGORY,
    CHOICE_EXPLANATIONS,
    LEARNING_POINTS,
];

/// Properties written only when the note has a non-empty value for them.
pub const OPTIONAL_PROPERTIES: [&str; 2] = [ARCHITECTURE_DIAGRAM, SIMILAR_QUESTIONS_HINT];

/// Property type as declared in the destination schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Number,
    MultiSelect,
}

impl PropertyKind {
    /// Returns the store's name for this property type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Number => "number",
            Self::MultiSelect => "multi_select",
        }
    }
}

/// Returns the declared kind of a known property.
pub fn property_kind(name: &str) -> Option<PropertyKind> {
    match name {
        QUESTION_TEXT => Some(PropertyKind::Title),
        CORRECT_ANSWER => Some(PropertyKind::Number),
        RELATED_SERVICES | WELL_ARCHITECTED_CATEGORY => Some(PropertyKind::MultiSelect),
        CHOICES | CORRECT_CHOICE_TEXT | EXPLANATION | CHOICE_EXPLANATIONS | LEARNING_POINTS
        | ARCHITECTURE_DIAGRAM | SIMILAR_QUESTIONS_HINT => Some(PropertyKind::RichText),
        _ => None,
    }
}

/// A single typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    /// The store reports an unset number as null.
    Number(Option<f64>),
    MultiSelect(Vec<String>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Title(_) => PropertyKind::Title,
            Self::RichText(_) => PropertyKind::RichText,
            Self::Number(_) => PropertyKind::Number,
            Self::MultiSelect(_) => PropertyKind::MultiSelect,
        }
    }

    /// Approximate payload size in bytes, used for error context.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Title(s) | Self::RichText(s) => s.len(),
            Self::Number(_) => 8,
            Self::MultiSelect(tags) => tags.iter().map(String::len).sum(),
        }
    }
}

/// The flat property bag the external store accepts and returns.
///
/// Keys are exact, case-sensitive property names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExternalRecord {
    properties: BTreeMap<String, PropertyValue>,
}

impl ExternalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.insert(name.into(), value);
    }

    /// Builder-style variant of `insert`.
    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Returns the text of a title or rich-text property.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.properties.get(name)? {
            PropertyValue::Title(s) | PropertyValue::RichText(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value of a number property, if set.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.properties.get(name)? {
            PropertyValue::Number(n) => *n,
            _ => None,
        }
    }

    /// Returns the tag names of a multi-select property, or an empty slice.
    pub fn tags(&self, name: &str) -> &[String] {
        match self.properties.get(name) {
            Some(PropertyValue::MultiSelect(tags)) => tags,
            _ => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Total payload size in bytes across all properties.
    pub fn byte_len(&self) -> usize {
        self.properties
            .iter()
            .map(|(k, v)| k.len() + v.byte_len())
            .sum()
    }
}
