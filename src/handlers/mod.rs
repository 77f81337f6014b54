pub mod auth_handler;
pub mod quiz_handler;
pub mod result_handler;
pub mod user_handler;

use actix_web::web;

use crate::{auth::AuthMiddleware, errors::AppError};

pub use user_handler::{health_check, health_check_ready};

/// Body extraction failures answer with the same JSON error body as every
/// other rejection.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

/// Registers every route. Callers supply `web::Data<Arc<AppState>>` and
/// `web::Data<JwtService>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health_check)
        .service(health_check_ready)
        .service(
            web::scope("/auth")
                .service(auth_handler::signup)
                .service(auth_handler::login)
                .service(auth_handler::refresh_token)
                .service(auth_handler::logout)
                .service(auth_handler::request_password_reset)
                .service(auth_handler::confirm_password_reset),
        )
        .service(
            web::scope("/api/user")
                .wrap(AuthMiddleware)
                .service(user_handler::get_profile)
                .service(user_handler::update_profile),
        )
        .service(
            web::scope("/quiz")
                .wrap(AuthMiddleware)
                .service(quiz_handler::start_quiz)
                .service(quiz_handler::sync_quiz)
                .service(quiz_handler::current_quiz)
                .service(quiz_handler::save_quiz_state)
                .service(quiz_handler::clear_quiz_state),
        )
        .service(
            web::scope("/results")
                .wrap(AuthMiddleware)
                .service(result_handler::finalize_quiz)
                .service(result_handler::list_results)
                .service(result_handler::get_result),
        );
}
