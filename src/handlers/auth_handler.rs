use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{AuthMiddleware, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{
            LoginRequest, RefreshTokenRequest, ResetPasswordConfirmRequest, ResetPasswordRequest,
            SignupRequest,
        },
        response::MessageResponse,
    },
};

#[post("/signup")]
pub async fn signup(
    state: web::Data<Arc<AppState>>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth_service.signup(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[post("/login")]
pub async fn login(
    state: web::Data<Arc<AppState>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth_service.login(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/refresh-token")]
pub async fn refresh_token(
    state: web::Data<Arc<AppState>>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AppError> {
    let tokens = state.auth_service.refresh(&request.refresh_token).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[post("/logout", wrap = "AuthMiddleware")]
pub async fn logout(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.auth_service.logout(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out successfully")))
}

#[post("/resetpassword")]
pub async fn request_password_reset(
    state: web::Data<Arc<AppState>>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    state
        .auth_service
        .request_password_reset(&request.email)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password reset email sent")))
}

#[post("/resetpassword/confirm")]
pub async fn confirm_password_reset(
    state: web::Data<Arc<AppState>>,
    request: web::Json<ResetPasswordConfirmRequest>,
) -> Result<HttpResponse, AppError> {
    state
        .auth_service
        .confirm_password_reset(request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password has been reset")))
}
