mod common;

use chrono::{Duration, Utc};
use mongodb::bson::{self, oid::ObjectId, Bson};

use common::{InMemoryRefreshTokenRepository, InMemoryUserStore};
use law_quiz_server::{
    auth::hash_token,
    errors::AppError,
    models::domain::{QuestionRecord, QuizResult, QuizSession, RefreshToken, User},
    repositories::{ProfileUpdate, RefreshTokenRepository, SessionStore, UserRepository},
};

fn make_session(count: usize) -> QuizSession {
    let questions = (0..count)
        .map(|i| QuestionRecord {
            question_id: format!("q{}", i),
            question: format!("Question {}", i),
            options: vec!["Yes".to_string(), "No".to_string()],
            correct_answer: "Yes".to_string(),
            category: "part1".to_string(),
        })
        .collect();
    QuizSession::new(questions, Utc::now(), 3000)
}

#[actix_rt::test]
async fn swap_applies_only_at_expected_revision() {
    let store = InMemoryUserStore::new();
    let user = store
        .insert(User::new("Test", "User", "swap@example.com", "hash"))
        .await;
    store.replace_session(&user, make_session(3)).await.unwrap();

    let mut next = make_session(3);
    next.current_question_index = 2;
    next.revision = 1;

    assert!(!store.swap_session(&user, 7, Some(next.clone())).await.unwrap());
    assert!(store.swap_session(&user, 0, Some(next.clone())).await.unwrap());
    assert!(!store.swap_session(&user, 0, Some(next)).await.unwrap());

    let stored = store.load_session(&user).await.unwrap().unwrap();
    assert_eq!(stored.current_question_index, 2);
    assert_eq!(stored.revision, 1);
}

#[actix_rt::test]
async fn swap_never_resurrects_a_cleared_session() {
    let store = InMemoryUserStore::new();
    let user = store
        .insert(User::new("Test", "User", "gone@example.com", "hash"))
        .await;
    store.replace_session(&user, make_session(2)).await.unwrap();
    store.clear_session(&user).await.unwrap();

    let applied = store
        .swap_session(&user, 0, Some(make_session(2)))
        .await
        .unwrap();

    assert!(!applied);
    assert!(store.load_session(&user).await.unwrap().is_none());
}

#[actix_rt::test]
async fn load_session_for_unknown_user_is_not_found() {
    let store = InMemoryUserStore::new();

    let result = store.load_session(&ObjectId::new().to_hex()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[actix_rt::test]
async fn user_email_lookup_is_case_insensitive_and_unique() {
    let store = InMemoryUserStore::new();
    store
        .create(User::new("Ada", "Lovelace", "Ada@Example.com", "hash"))
        .await
        .unwrap();

    let found = store.find_by_email("  ADA@example.COM ").await.unwrap();
    assert!(found.is_some());

    let duplicate = store
        .create(User::new("Other", "Person", "ada@example.com", "hash"))
        .await;
    assert!(matches!(duplicate, Err(AppError::AlreadyExists(_))));
}

#[actix_rt::test]
async fn profile_update_touches_only_supplied_fields() {
    let store = InMemoryUserStore::new();
    let user = store
        .insert(User::new("Ada", "Lovelace", "ada@example.com", "hash"))
        .await;

    let updated = store
        .update_profile(
            &user,
            ProfileUpdate {
                surname: Some("Byron".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Ada");
    assert_eq!(updated.surname, "Byron");
}

#[actix_rt::test]
async fn set_password_drops_reset_token() {
    let store = InMemoryUserStore::new();
    let user = store
        .insert(User::new("Ada", "Lovelace", "ada@example.com", "hash"))
        .await;
    let digest = hash_token("reset-me");
    store
        .set_reset_token(&user, &digest, Utc::now() + Duration::minutes(60))
        .await
        .unwrap();
    assert!(store.find_by_reset_token(&digest).await.unwrap().is_some());

    store.set_password(&user, "new-hash").await.unwrap();

    assert!(store.find_by_reset_token(&digest).await.unwrap().is_none());
    let stored = store.get(&user).await.unwrap();
    assert_eq!(stored.password, "new-hash");
}

#[actix_rt::test]
async fn refresh_token_is_consumed_exactly_once() {
    let repo = InMemoryRefreshTokenRepository::new();
    let digest = hash_token("one");
    repo.store(RefreshToken::new("user-1", digest.clone(), Utc::now() + Duration::days(7)))
        .await
        .unwrap();

    let first = repo.consume(&digest).await.unwrap();
    let second = repo.consume(&digest).await.unwrap();

    let first = first.unwrap();
    assert_eq!(first.user_id, "user-1");
    assert!(!first.revoked);
    assert!(second.is_none());
    assert!(repo.consume(&hash_token("unknown")).await.unwrap().is_none());
}

#[actix_rt::test]
async fn duplicate_digest_is_rejected() {
    let repo = InMemoryRefreshTokenRepository::new();
    let expiry = Utc::now() + Duration::days(7);
    repo.store(RefreshToken::new("user-1", hash_token("one"), expiry))
        .await
        .unwrap();

    let again = repo
        .store(RefreshToken::new("user-2", hash_token("one"), expiry))
        .await;

    assert!(matches!(again, Err(AppError::AlreadyExists(_))));
}

#[actix_rt::test]
async fn revoke_for_user_counts_only_live_tokens() {
    let repo = InMemoryRefreshTokenRepository::new();
    let expiry = Utc::now() + Duration::days(7);
    for raw in ["one", "two", "three"] {
        repo.store(RefreshToken::new("user-1", hash_token(raw), expiry))
            .await
            .unwrap();
    }
    repo.store(RefreshToken::new("user-2", hash_token("four"), expiry))
        .await
        .unwrap();
    repo.consume(&hash_token("one")).await.unwrap();

    assert_eq!(repo.revoke_for_user("user-1").await.unwrap(), 2);
    assert_eq!(repo.live_count("user-1").await, 0);
    assert_eq!(repo.live_count("user-2").await, 1);
}

#[test]
fn user_document_uses_client_field_names() {
    let mut user = User::new("Ada", "Lovelace", "ada@example.com", "hash");
    user.current_quiz = Some(make_session(2));

    let document = bson::to_document(&user).unwrap();

    assert!(document.contains_key("_id"));
    let quiz = document.get_document("currentQuiz").unwrap();
    for key in [
        "questions",
        "startTime",
        "currentQuestionIndex",
        "userAnswers",
        "remainingTime",
        "lastUpdated",
        "revision",
    ] {
        assert!(quiz.contains_key(key), "missing {}", key);
    }
    let first = quiz.get_array("questions").unwrap()[0]
        .as_document()
        .unwrap()
        .clone();
    assert!(first.contains_key("questionId"));
    assert!(first.contains_key("correctAnswer"));
}

#[test]
fn legacy_session_without_revision_reads_as_zero() {
    let mut document = bson::to_document(&make_session(1)).unwrap();
    document.remove("revision");

    let session: QuizSession = bson::from_document(document).unwrap();

    assert_eq!(session.revision, 0);
}

#[test]
fn result_document_stores_native_date_and_user_id() {
    let result = QuizResult::new(ObjectId::new(), 50, 50, vec![]);

    let document = bson::to_document(&result).unwrap();

    assert!(matches!(document.get("date"), Some(Bson::DateTime(_))));
    assert!(matches!(document.get("user"), Some(Bson::ObjectId(_))));
    assert!(document.contains_key("totalQuestions"));
}
