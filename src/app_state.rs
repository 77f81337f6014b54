use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        MongoQuestionSource, MongoRefreshTokenRepository, MongoResultRepository,
        MongoSessionStore, MongoUserRepository, QuestionSource, RefreshTokenRepository,
        ResultRepository, SessionStore, UserRepository,
    },
    services::{
        AuthService, LogMailer, Mailer, QuestionSampler, QuizSessionService, ResultService,
        UserService,
    },
};

/// Storage seams the services are wired from.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub results: Arc<dyn ResultRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub questions: Arc<dyn QuestionSource>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub quiz_service: Arc<QuizSessionService>,
    pub result_service: Arc<ResultService>,
    pub jwt: JwtService,
    pub config: Arc<Config>,
    /// Absent when running on in-memory repositories.
    pub db: Option<Database>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let users = Arc::new(MongoUserRepository::new(&db, &config.users_collection));
        users.ensure_indexes().await?;

        let results = Arc::new(MongoResultRepository::new(&db, &config.results_collection));
        results.ensure_indexes().await?;

        let refresh_tokens = Arc::new(MongoRefreshTokenRepository::new(
            &db,
            &config.refresh_tokens_collection,
        ));
        refresh_tokens.ensure_indexes().await?;

        let repositories = Repositories {
            users,
            sessions: Arc::new(MongoSessionStore::new(&db, &config.users_collection)),
            results,
            refresh_tokens,
            questions: Arc::new(MongoQuestionSource::new(&db)),
            mailer: Arc::new(LogMailer),
        };

        let mut state = Self::with_repositories(config, repositories);
        state.db = Some(db);
        Ok(state)
    }

    pub fn with_repositories(config: Config, repositories: Repositories) -> Self {
        let jwt = JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
            config.jwt_refresh_expiration_hours,
        );

        let sampler = Arc::new(QuestionSampler::new(
            repositories.questions,
            config.question_collections.clone(),
            &config.quiz,
        ));

        let quiz_service = Arc::new(QuizSessionService::new(
            repositories.sessions.clone(),
            sampler,
            &config.quiz,
        ));

        let result_service = Arc::new(ResultService::new(
            repositories.results,
            repositories.sessions.clone(),
            repositories.users.clone(),
            config.quiz.default_duration,
        ));

        let auth_service = Arc::new(AuthService::new(
            repositories.users.clone(),
            repositories.refresh_tokens,
            repositories.sessions,
            repositories.mailer,
            jwt.clone(),
            config.password_reset_url.clone(),
            config.password_reset_ttl_minutes,
        ));

        let user_service = Arc::new(UserService::new(repositories.users));

        Self {
            auth_service,
            user_service,
            quiz_service,
            result_service,
            jwt,
            config: Arc::new(config),
            db: None,
        }
    }
}
