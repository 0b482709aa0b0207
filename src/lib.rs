pub mod codec;
pub mod models;
pub mod normalizer;
pub mod notion;
pub mod store;

pub use codec::{ExternalRecord, PropertyCodec, PropertyValue};
pub use models::{
    ChoiceExplanation, CorrectAnswer, NoteBuilder, PageId, Pillar, StructuredNote,
    ValidationError,
};
pub use normalizer::PillarNormalizer;
pub use notion::{NotionClient, NotionClientBuilder, NotionClientTrait, NotionError};
pub use store::{MatchStrategy, NoteStore, PrefixMatch, StoreError, UpsertOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn store_accessible_from_crate_root() {
        let store = NoteStore::new(Arc::new(notion::InMemoryNotion::new()), "db");
        assert_eq!(store.database_id(), "db");
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        assert_eq!(PillarNormalizer::normalize("Cost Optimization"), "cost-optimization");
        assert_eq!(Pillar::Security.slug(), "security");

        let note = NoteBuilder::new()
            .question_text("Which service?")
            .choices(["S3", "EBS"])
            .correct_answer(1)
            .build()
            .unwrap();
        assert_eq!(note.correct_choice_text, "S3");
        assert_eq!(note.correct_answer, CorrectAnswer::single(1));

        let record: ExternalRecord = PropertyCodec::encode(&note);
        assert_eq!(PropertyCodec::decode(&record), Some(note));
    }
}
