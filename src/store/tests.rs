use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::codec::{
    CHOICES, CORRECT_ANSWER, ExternalRecord, OPTIONAL_PROPERTIES, PropertyValue, QUESTION_TEXT,
    REQUIRED_PROPERTIES, property_kind,
};
use crate::models::{ChoiceExplanation, NoteBuilder, ValidationError};
use crate::notion::{InMemoryNotion, NotionError, QueryPage};

const DB: &str = "db-test";

fn note(question: &str) -> StructuredNote {
    NoteBuilder::new()
        .question_text(question)
        .choices(["S3", "EBS", "EFS"])
        .correct_answer(2)
        .explanation("EBS provides block volumes.")
        .related_services(["EBS"])
        .categories(["Performance Efficiency"])
        .learning_points(["Use IAM roles", "Enable MFA"])
        .build()
        .expect("valid note")
}

fn full_schema() -> InMemoryNotion {
    InMemoryNotion::with_schema(
        REQUIRED_PROPERTIES
            .iter()
            .chain(OPTIONAL_PROPERTIES.iter())
            .map(|name| (*name, property_kind(name).expect("known property"))),
    )
}

fn store_with(notion: &Arc<InMemoryNotion>) -> NoteStore {
    NoteStore::new(notion.clone(), DB)
}

fn raw_record(title: &str) -> ExternalRecord {
    ExternalRecord::new()
        .with(QUESTION_TEXT, PropertyValue::Title(title.to_string()))
        .with(CHOICES, PropertyValue::RichText("1. yes\n2. no".to_string()))
        .with(CORRECT_ANSWER, PropertyValue::Number(Some(1.0)))
}

#[test]
fn upsert_creates_new_record() {
    let notion = Arc::new(full_schema());
    let store = store_with(&notion);

    let outcome = store.upsert(&note("Which service offers block storage?")).unwrap();

    assert!(outcome.is_created());
    assert_eq!(notion.page_count(), 1);
    assert_eq!(notion.pages(DB)[0].id, *outcome.id());
}

#[test]
fn upsert_twice_converges_on_one_record() {
    let notion = Arc::new(full_schema());
    let store = store_with(&notion);
    let note = note("Which service offers block storage?");

    let first = store.upsert(&note).unwrap();
    let stored_after_first = notion.pages(DB)[0].properties.clone();
    let second = store.upsert(&note).unwrap();

    assert!(first.is_created());
    assert_eq!(second, UpsertOutcome::Updated(first.id().clone()));
    assert_eq!(notion.page_count(), 1);
    assert_eq!(notion.pages(DB)[0].properties, stored_after_first);
}

#[test]
fn upsert_updates_record_with_same_prefix() {
    let notion = Arc::new(InMemoryNotion::new());
    let store = store_with(&notion);
    let prefix = "A company runs a stateful web tier on EC2 across two AZs";

    let first = store.upsert(&note(&format!("{prefix}. Version one?"))).unwrap();
    let mut revised = note(&format!("{prefix}. Version two?"));
    revised.explanation = "Revised explanation.".to_string();
    let second = store.upsert(&revised).unwrap();

    assert_eq!(first.id(), second.id());
    let stored = store.list_all().unwrap();
    assert_eq!(stored, vec![revised]);
}

#[test]
fn changed_prefix_creates_second_record() {
    let notion = Arc::new(InMemoryNotion::new());
    let store = store_with(&notion);

    store.upsert(&note("Which service offers block storage?")).unwrap();
    let outcome = store.upsert(&note("Which service offers file storage?")).unwrap();

    assert!(outcome.is_created());
    assert_eq!(notion.page_count(), 2);
}

#[test]
fn invalid_note_is_rejected_before_any_request() {
    let notion = Arc::new(InMemoryNotion::new());
    let store = store_with(&notion);
    let mut bad = note("Which service offers block storage?");
    bad.correct_answer = 7.into();

    let error = store.upsert(&bad).unwrap_err();

    assert!(matches!(
        error,
        StoreError::Validation(ValidationError::AnswerOutOfRange { answer: 7, .. })
    ));
    assert_eq!(notion.query_calls(), 0);
    assert_eq!(notion.create_calls(), 0);
}

#[test]
fn missing_property_becomes_schema_mismatch() {
    let notion = Arc::new(InMemoryNotion::with_schema(
        REQUIRED_PROPERTIES
            .iter()
            .filter(|name| **name != CHOICES)
            .map(|name| (*name, property_kind(name).expect("known property"))),
    ));
    let store = store_with(&notion);

    let error = store.upsert(&note("Which service offers block storage?")).unwrap_err();

    match &error {
        StoreError::SchemaMismatch {
            fields,
            database_id,
            ..
        } => {
            assert_eq!(fields, &vec![CHOICES.to_string()]);
            assert_eq!(database_id, DB);
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
    assert!(error.to_string().contains("\"Choices\" (rich_text)"));
    assert_eq!(notion.page_count(), 0);
}

#[test]
fn optional_properties_are_only_needed_when_present() {
    let notion = Arc::new(InMemoryNotion::with_schema(
        REQUIRED_PROPERTIES
            .iter()
            .map(|name| (*name, property_kind(name).expect("known property"))),
    ));
    let store = store_with(&notion);

    let plain = note("Which service offers block storage?");
    assert!(store.upsert(&plain).is_ok());

    let mut with_diagram = note("Which service offers object storage?");
    with_diagram.architecture_diagram = Some("graph LR\n  A --> B".to_string());
    let error = store.upsert(&with_diagram).unwrap_err();
    assert!(error.is_schema_mismatch());
}

/// Client double that fails chosen operations and counts calls.
#[derive(Default)]
struct FlakyNotion {
    inner: InMemoryNotion,
    fail_queries: bool,
    fail_writes: bool,
    writes: AtomicUsize,
}

fn server_error() -> NotionError {
    NotionError::Api {
        status: 503,
        code: "service_unavailable".to_string(),
        message: "Notion is unavailable".to_string(),
    }
}

impl NotionClientTrait for FlakyNotion {
    fn create_page(
        &self,
        database_id: &str,
        properties: &ExternalRecord,
    ) -> Result<PageId, NotionError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(server_error());
        }
        self.inner.create_page(database_id, properties)
    }

    fn update_page(
        &self,
        page_id: &PageId,
        properties: &ExternalRecord,
    ) -> Result<PageId, NotionError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(server_error());
        }
        self.inner.update_page(page_id, properties)
    }

    fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryPage, NotionError> {
        if self.fail_queries {
            return Err(server_error());
        }
        self.inner.query_database(database_id, request)
    }
}

#[test]
fn failed_duplicate_check_still_writes() {
    let notion = Arc::new(FlakyNotion {
        fail_queries: true,
        ..Default::default()
    });
    let store = NoteStore::new(notion.clone(), DB);

    let outcome = store.upsert(&note("Which service offers block storage?")).unwrap();

    assert!(outcome.is_created());
    assert_eq!(notion.writes.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_write_is_wrapped_with_context() {
    let notion = Arc::new(FlakyNotion {
        fail_writes: true,
        ..Default::default()
    });
    let store = NoteStore::new(notion, DB);

    let error = store.upsert(&note("Which service offers block storage?")).unwrap_err();

    match error {
        StoreError::Transport {
            operation,
            input_size,
            database_id,
            source,
        } => {
            assert_eq!(operation, Operation::Create);
            assert!(input_size > 0);
            assert_eq!(database_id, DB);
            assert!(matches!(source, NotionError::Api { status: 503, .. }));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn failed_scan_is_a_transport_error() {
    let store = NoteStore::new(
        Arc::new(FlakyNotion {
            fail_queries: true,
            ..Default::default()
        }),
        DB,
    );

    let error = store.list_all().unwrap_err();
    assert!(matches!(
        error,
        StoreError::Transport {
            operation: Operation::Query,
            ..
        }
    ));
}

#[test]
fn list_all_skips_undecodable_records() {
    let notion = Arc::new(InMemoryNotion::new());
    notion.insert_raw(DB, raw_record("First question?"));
    notion.insert_raw(DB, raw_record(""));
    notion.insert_raw(DB, raw_record("Third question?"));
    let store = store_with(&notion);

    let notes = store.list_all().unwrap();

    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].question_text, "First question?");
    assert_eq!(notes[1].question_text, "Third question?");
}

#[test]
fn list_all_follows_pagination() {
    let notion = Arc::new(InMemoryNotion::new());
    for i in 0..250 {
        notion.insert_raw(DB, raw_record(&format!("Question {i:03}?")));
    }
    let store = store_with(&notion);

    let notes = store.list_all().unwrap();

    assert_eq!(notes.len(), 250);
    assert_eq!(notes[249].question_text, "Question 249?");
    assert_eq!(notion.query_calls(), 3);
}

#[test]
fn list_all_on_empty_database_is_empty() {
    let notion = Arc::new(InMemoryNotion::new());
    assert!(store_with(&notion).list_all().unwrap().is_empty());
    assert_eq!(notion.query_calls(), 1);
}

#[test]
fn list_all_stops_when_cursor_is_missing() {
    struct CursorlessNotion {
        calls: Mutex<usize>,
    }

    impl NotionClientTrait for CursorlessNotion {
        fn create_page(&self, _: &str, _: &ExternalRecord) -> Result<PageId, NotionError> {
            unreachable!()
        }

        fn update_page(&self, _: &PageId, _: &ExternalRecord) -> Result<PageId, NotionError> {
            unreachable!()
        }

        fn query_database(&self, _: &str, _: &QueryRequest) -> Result<QueryPage, NotionError> {
            *self.calls.lock().unwrap() += 1;
            Ok(QueryPage {
                results: vec![crate::notion::Page {
                    id: PageId::new("only"),
                    properties: raw_record("Only question?"),
                }],
                has_more: true,
                next_cursor: None,
            })
        }
    }

    let client = Arc::new(CursorlessNotion {
        calls: Mutex::new(0),
    });
    let store = NoteStore::new(client.clone(), DB);

    assert_eq!(store.list_all().unwrap().len(), 1);
    assert_eq!(*client.calls.lock().unwrap(), 1);
}

#[test]
fn listed_notes_round_trip_rich_content() {
    let notion = Arc::new(full_schema());
    let store = store_with(&notion);

    let rich = NoteBuilder::new()
        .question_text("東京リージョンの複数AZで共有できるファイルストレージはどれですか？")
        .choices(["Amazon S3", "Amazon EBS", "Amazon EFS", "インスタンスストア"])
        .correct_answer(3)
        .explanation("EFSはリージョナルなNFSです。")
        .related_services(["EFS", "EC2"])
        .categories(["Reliability", "Sustainability"])
        .choice_explanations(vec![
            ChoiceExplanation::new(1, "Amazon S3", false, "オブジェクトストレージです。"),
            ChoiceExplanation::new(2, "Amazon EBS", false, "単一AZに閉じます。"),
            ChoiceExplanation::new(3, "Amazon EFS", true, "複数AZから同時にマウントできます。"),
            ChoiceExplanation::new(4, "インスタンスストア", false, "一時的なストレージです。"),
        ])
        .learning_points(["EFSはリージョナル", "EBSはAZ単位"])
        .architecture_diagram("graph TD\n  EC2 --> EFS")
        .similar_questions_hint("「共有」「複数AZ」がキーワード")
        .build()
        .unwrap();

    store.upsert(&rich).unwrap();
    assert_eq!(store.list_all().unwrap(), vec![rich]);
}

#[test]
fn custom_strategy_is_used_for_matching() {
    struct NeverMatch;

    impl MatchStrategy for NeverMatch {
        fn search_key(&self, _question_text: &str) -> Option<String> {
            None
        }
    }

    let notion = Arc::new(InMemoryNotion::new());
    let store = store_with(&notion).with_strategy(NeverMatch);
    let note = note("Which service offers block storage?");

    store.upsert(&note).unwrap();
    store.upsert(&note).unwrap();

    assert_eq!(notion.page_count(), 2);
    assert_eq!(notion.query_calls(), 0);
}
