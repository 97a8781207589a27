pub mod json_loader;

pub use json_loader::{load_answer_key, load_test_cases, AnswerKey, TestCaseCatalog};
