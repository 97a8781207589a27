pub mod loaders;
pub mod project;
pub mod run;
pub mod test_case;

pub use loaders::{load_answer_key, load_test_cases, AnswerKey, TestCaseCatalog};
pub use project::{project_id_of, Project, DEFAULT_PROJECT_ID};
pub use run::{
    validate_document_id, ContentPart, Run, RunPayload, RunStatus, StepContent, StepRole,
    ToolCall, TranscriptStep,
};
pub use test_case::TestCase;
