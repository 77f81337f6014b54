use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use validator::Validate;

use crate::{
    auth::{hash_password, hash_token, verify_password, JwtService},
    errors::{AppError, AppResult},
    models::{
        domain::User,
        dto::{
            request::{LoginRequest, ResetPasswordConfirmRequest, SignupRequest},
            response::{AuthResponse, ProfileDto, TokenPair},
        },
    },
    repositories::{RefreshTokenRepository, SessionStore, UserRepository},
    services::mailer::Mailer,
};

const RESET_TOKEN_LENGTH: usize = 48;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    sessions: Arc<dyn SessionStore>,
    mailer: Arc<dyn Mailer>,
    jwt: JwtService,
    password_reset_url: String,
    password_reset_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        sessions: Arc<dyn SessionStore>,
        mailer: Arc<dyn Mailer>,
        jwt: JwtService,
        password_reset_url: String,
        password_reset_ttl_minutes: i64,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            sessions,
            mailer,
            jwt,
            password_reset_url,
            password_reset_ttl: Duration::minutes(password_reset_ttl_minutes),
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "User with email '{}' already exists",
                request.email.trim()
            )));
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(
            request.name.trim(),
            request.surname.trim(),
            &request.email,
            &password_hash,
        );
        let user = self.users.create(user).await?;
        log::info!("Registered user {}", user.id_hex());

        let tokens = self.issue_tokens(&user).await?;
        Ok(AuthResponse {
            message: "User registered successfully".to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: ProfileDto::from(user),
        })
    }

    /// Unknown email and wrong password fail identically. A successful login
    /// abandons any quiz left over from an earlier session.
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &user.password) {
            log::info!("Rejected login for user {}", user.id_hex());
            return Err(invalid());
        }

        let user_id = user.id_hex();
        self.sessions.clear_session(&user_id).await?;

        let tokens = self.issue_tokens(&user).await?;
        log::info!("User {} logged in", user_id);

        Ok(AuthResponse {
            message: "Login successful".to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: ProfileDto::from(user),
        })
    }

    /// Exchanges a live refresh token for a new pair. The presented token is
    /// consumed before its successor is issued.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.jwt.verify_refresh(refresh_token)?;

        let stored = self
            .refresh_tokens
            .consume(&hash_token(refresh_token))
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("Refresh token has been revoked or is unknown".to_string())
            })?;

        if !stored.is_valid_at(Utc::now()) || stored.user_id != claims.sub {
            return Err(AppError::Unauthorized(
                "Refresh token has been revoked or expired".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        let tokens = self.issue_tokens(&user).await?;
        log::debug!("Rotated refresh token for user {}", claims.sub);

        Ok(tokens)
    }

    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let revoked = self.refresh_tokens.revoke_for_user(user_id).await?;
        self.sessions.clear_session(user_id).await?;
        log::info!("User {} logged out, {} refresh tokens revoked", user_id, revoked);
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("No account with that email".to_string()))?;

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RESET_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        let expires_at = Utc::now() + self.password_reset_ttl;

        self.users
            .set_reset_token(&user.id_hex(), &hash_token(&token), expires_at)
            .await?;

        let link = format!("{}?token={}", self.password_reset_url, token);
        self.mailer.send_password_reset(&user.email, &link).await?;
        log::info!("Issued password reset for user {}", user.id_hex());

        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        request: ResetPasswordConfirmRequest,
    ) -> AppResult<()> {
        request.validate()?;

        let invalid = || AppError::ValidationError("Reset token is invalid or expired".to_string());

        let user = self
            .users
            .find_by_reset_token(&hash_token(&request.token))
            .await?
            .ok_or_else(invalid)?;

        if !user.reset_token_valid_at(Utc::now()) {
            return Err(invalid());
        }

        let password_hash = hash_password(&request.new_password)?;
        let user_id = user.id_hex();
        self.users.set_password(&user_id, &password_hash).await?;
        self.refresh_tokens.revoke_for_user(&user_id).await?;
        log::info!("Password reset completed for user {}", user_id);

        Ok(())
    }

    async fn issue_tokens(&self, user: &User) -> AppResult<TokenPair> {
        let issued = self.jwt.issue(user)?;
        self.refresh_tokens.store(issued.record).await?;
        Ok(issued.pair)
    }
}
