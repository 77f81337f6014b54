use std::sync::Arc;

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    middleware::get_request_id,
    models::dto::{quiz_dto::FinalizeRequest, request::PaginationParams},
};

#[post("")]
pub async fn finalize_quiz(
    req: HttpRequest,
    state: web::Data<Arc<AppState>>,
    request: web::Json<FinalizeRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state
        .result_service
        .finalize(auth.user_id(), request.into_inner())
        .await
        .inspect_err(|e| {
            log::warn!(
                "Finalize failed for user {} (request {}): {}",
                auth.user_id(),
                get_request_id(&req).unwrap_or_default(),
                e
            )
        })?;
    Ok(HttpResponse::Created().json(result))
}

#[get("")]
pub async fn list_results(
    state: web::Data<Arc<AppState>>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let pagination = query.into_inner();
    pagination.validate()?;

    let response = state
        .result_service
        .list_results(auth.user_id(), &pagination)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/{id}")]
pub async fn get_result(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state
        .result_service
        .get_result(auth.user_id(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}
