//! Translation between `StructuredNote` and the store's flat property bag.
//!
//! The external store only understands title, rich-text, number and
//! multi-select properties. Nested parts of a note are written into rich-text
//! properties using small delimiter formats:
//!
//! | Property | Format |
//! |---|---|
//! | `Choices` | `"1. <text>"` per line |
//! | `Choice Explanations` | `"【選択肢<N>】<✓ 正解\|✗ 不正解>\n<choice>\n<explanation>"` sections separated by a blank line |
//! | `Learning Points` | points joined by `"\n• "` |
//!
//! `Correct Answer` holds the lowest correct choice number. The `✓` status of
//! each explanation section carries any further correct choices, so
//! multi-answer questions survive a round trip.
//!
//! Nothing outside this module needs to know these property names or formats.
//!
//! # Examples
//!
//! ```
//! use quiznote::{NoteBuilder, PropertyCodec};
//!
//! let note = NoteBuilder::new()
//!     .question_text("Which service provides block storage for EC2?")
//!     .choices(["S3", "EBS", "EFS"])
//!     .correct_answer(2)
//!     .learning_points(["Use IAM roles", "Enable MFA"])
//!     .build()
//!     .unwrap();
//!
//! let record = PropertyCodec::encode(&note);
//! assert_eq!(record.text("Choices"), Some("1. S3\n2. EBS\n3. EFS"));
//!
//! let decoded = PropertyCodec::decode(&record).unwrap();
//! assert_eq!(decoded, note);
//! ```

mod decode;
mod encode;
mod record;

pub use record::{
    ARCHITECTURE_DIAGRAM, CHOICE_EXPLANATIONS, CHOICES, CORRECT_ANSWER, CORRECT_CHOICE_TEXT,
    EXPLANATION, ExternalRecord, LEARNING_POINTS, OPTIONAL_PROPERTIES, PropertyKind,
    PropertyValue, QUESTION_TEXT, RELATED_SERVICES, REQUIRED_PROPERTIES, SIMILAR_QUESTIONS_HINT,
    WELL_ARCHITECTED_CATEGORY, property_kind,
};

use crate::models::StructuredNote;

/// Encoder/decoder pair for the store's property schema.
pub struct PropertyCodec;

impl PropertyCodec {
    /// Encodes a note into its property bag.
    ///
    /// Total over notes that pass `StructuredNote::validate`. Optional
    /// properties are omitted, not written empty, when the note has no value.
    #[must_use]
    pub fn encode(note: &StructuredNote) -> ExternalRecord {
        encode::encode(note)
    }

    /// Decodes a property bag back into a note.
    ///
    /// Returns `None`, after logging the reason, when the record lacks a
    /// question, a choice list or an in-range correct answer. A damaged
    /// choice-explanation block never causes a failure: missing entries are
    /// rebuilt from the choices.
    #[must_use]
    pub fn decode(record: &ExternalRecord) -> Option<StructuredNote> {
        decode::decode(record)
    }
}
