//! Domain model layer.
//!
//! Pure data types shared by every pipeline stage. No IO, no AI.

pub mod draft;
pub mod question;
pub mod settings;

pub use draft::{QuizDraft, QuizMetadata};
pub use question::{Answer, Difficulty, Question, QuestionKind};
pub use settings::{
    GenerationMode, GenerationOptions, Language, ParsingMode, QuestionType, TitleDescription,
    TitleOptions, UploadedFile,
};
