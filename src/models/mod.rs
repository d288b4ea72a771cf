pub mod grade;
pub mod loaders;
pub mod question;
pub mod session;

pub use grade::{AnswerMap, GradeRequest, GradeResponse, GradeResult, QuestionOutcome};
pub use loaders::{load_toml_to_raw_test, parse_raw_test};
pub use question::{Question, QuizOption, RawQuestion, RawTest, TestId, TestRecord};
pub use session::{Phase, RevealKind, SessionState};
