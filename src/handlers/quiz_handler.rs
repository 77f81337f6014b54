use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        quiz_dto::{SaveStateRequest, SyncRequest},
        response::MessageResponse,
    },
};

#[post("/start")]
pub async fn start_quiz(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let session = state.quiz_service.start(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[post("/sync")]
pub async fn sync_quiz(
    state: web::Data<Arc<AppState>>,
    request: web::Json<SyncRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let response = state
        .quiz_service
        .sync(
            auth.user_id(),
            request.current_question_index,
            request.user_answers,
        )
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/current")]
pub async fn current_quiz(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let session = state.quiz_service.get_current(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[post("/save-state")]
pub async fn save_quiz_state(
    state: web::Data<Arc<AppState>>,
    request: web::Json<SaveStateRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let response = state
        .quiz_service
        .save_state(
            auth.user_id(),
            request.current_question_index,
            request.user_answers,
            request.remaining_time,
        )
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[delete("/state")]
pub async fn clear_quiz_state(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.quiz_service.clear(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Quiz state cleared")))
}
