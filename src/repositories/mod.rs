pub mod question_repository;
pub mod refresh_token_repository;
pub mod result_repository;
pub mod session_store;
pub mod user_repository;

pub use question_repository::{MongoQuestionSource, QuestionSource};
pub use refresh_token_repository::{MongoRefreshTokenRepository, RefreshTokenRepository};
pub use result_repository::{MongoResultRepository, ResultRepository};
pub use session_store::{MongoSessionStore, SessionStore};
pub use user_repository::{MongoUserRepository, ProfileUpdate, UserRepository};
