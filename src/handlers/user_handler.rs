use std::sync::Arc;

use actix_web::{get, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_self, AuthenticatedUser},
    errors::AppError,
    models::dto::request::UpdateProfileRequest,
};

#[get("/{id}")]
pub async fn get_profile(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_self(&auth.0, &id)?;

    let profile = state.user_service.get_profile(&id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[put("/{id}")]
pub async fn update_profile(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<UpdateProfileRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_self(&auth.0, &id)?;

    let profile = state
        .user_service
        .update_profile(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/health/ready")]
pub async fn health_check_ready(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let db_health = match &state.db {
        Some(db) => db.health_check().await.is_ok(),
        None => false,
    };

    let response = serde_json::json!({
        "status": if db_health { "ready" } else { "not_ready" },
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "mongodb": if db_health { "ok" } else { "error" }
        }
    });

    if db_health {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
