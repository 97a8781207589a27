pub mod auth;
pub mod correlator;
pub mod exam_scorer;
pub mod grader;
pub mod llm_service;
pub mod run_store;
pub mod session_store;

pub use auth::CredentialStore;
pub use correlator::{correlate, normalize_url, summarize_projects, Correlation, Totals};
pub use exam_scorer::{ExamAnswers, ExamScore};
pub use grader::{AnswerGrader, GradeRequest};
pub use llm_service::{ChatModel, LlmService};
pub use run_store::RunStore;
pub use session_store::ClientStore;
