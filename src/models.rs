mod choice_explanation;
mod correct_answer;
mod ids;
mod note;
mod pillar;
mod validation;

pub use choice_explanation::ChoiceExplanation;
pub use correct_answer::CorrectAnswer;
pub use ids::PageId;
pub use note::{NoteBuilder, StructuredNote};
pub use pillar::Pillar;
pub use validation::ValidationError;

/// Inclusive bounds on the number of choices a question may carry.
pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 8;
