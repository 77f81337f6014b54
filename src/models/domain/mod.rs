pub mod question;
pub mod quiz_result;
pub mod quiz_session;
pub mod refresh_token;
pub mod user;
pub use question::{BankQuestion, QuestionRecord};
pub use quiz_result::{QuizResult, ResultQuestion};
pub use quiz_session::QuizSession;
pub use refresh_token::RefreshToken;
pub use user::{User, UserStats};
