pub mod auth_service;
pub mod mailer;
pub mod question_sampler;
pub mod quiz_session_service;
pub mod result_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use mailer::{LogMailer, Mailer};
pub use question_sampler::QuestionSampler;
pub use quiz_session_service::QuizSessionService;
pub use result_service::ResultService;
pub use user_service::UserService;
