//! Integration tests for user provisioning
//!
//! Drives the username-collision and email-race retry paths with a scripted
//! user repository.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use cinelog_auth_core::{AuthConfig, AuthError, UserDirectory};
use cinelog_db::{
    CreateUser, DbResult, MemoryUserRepository, UniqueConstraint, UserRepository, UserTransaction,
};
use cinelog_types::{Identity, User, UserId, Username, VerifiedIdentity};
use tokio::task::yield_now;
use common::{Harness, InsertScript, MockUserRepository};

fn identity(email: &str, display_name: &str) -> Identity {
    Identity {
        email: email.to_string(),
        display_name: display_name.to_string(),
        avatar_url: None,
    }
}

fn directory(repo: &MockUserRepository) -> UserDirectory<MockUserRepository> {
    UserDirectory::new(Arc::new(repo.clone()), &AuthConfig::default())
}

/// In-memory users whose every call yields first, so two provisioning
/// runs driven by `tokio::join!` interleave step by step
#[derive(Clone, Default)]
struct InterleavedUsers {
    inner: MemoryUserRepository,
}

struct InterleavedTransaction {
    inner: Box<dyn UserTransaction>,
}

#[async_trait]
impl UserRepository for InterleavedUsers {
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        yield_now().await;
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        yield_now().await;
        self.inner.find_by_email(email).await
    }

    async fn begin(&self) -> DbResult<Box<dyn UserTransaction>> {
        yield_now().await;
        Ok(Box::new(InterleavedTransaction {
            inner: self.inner.begin().await?,
        }))
    }
}

#[async_trait]
impl UserTransaction for InterleavedTransaction {
    async fn find_by_email(&mut self, email: &str) -> DbResult<Option<User>> {
        yield_now().await;
        self.inner.find_by_email(email).await
    }

    async fn insert(&mut self, user: &CreateUser) -> DbResult<User> {
        yield_now().await;
        self.inner.insert(user).await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        yield_now().await;
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        self.inner.rollback().await
    }
}

fn matches_generated_pattern(s: &str) -> bool {
    let letters = s.chars().take_while(char::is_ascii_alphabetic).count();
    let digits = &s[letters..];
    letters >= 2 && (1..=6).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[tokio::test]
async fn test_three_collisions_then_success() {
    let repo = MockUserRepository::new();
    repo.reject_usernames(3);

    let (user, is_new) = directory(&repo)
        .read_or_create(&identity("a@x.com", ""))
        .await
        .unwrap();

    assert!(is_new);
    assert_eq!(repo.insert_attempts(), 4);
    assert_eq!(repo.user_count(), 1);
    assert_eq!(repo.commits(), 1);
    assert!(matches_generated_pattern(user.username.as_str()));
}

#[tokio::test]
async fn test_ten_collisions_exhaust_and_commit_nothing() {
    let repo = MockUserRepository::new();
    repo.reject_usernames(10);

    let err = directory(&repo)
        .read_or_create(&identity("a@x.com", ""))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ProvisioningExhausted { attempts: 10 }));
    assert_eq!(err.status_code(), 500);
    assert_eq!(repo.insert_attempts(), 10);
    assert_eq!(repo.user_count(), 0);
    assert_eq!(repo.commits(), 0);
    assert_eq!(repo.rollbacks(), 1);
}

#[tokio::test]
async fn test_nine_collisions_still_succeed() {
    let repo = MockUserRepository::new();
    repo.reject_usernames(9);

    let (_, is_new) = directory(&repo)
        .read_or_create(&identity("a@x.com", ""))
        .await
        .unwrap();

    assert!(is_new);
    assert_eq!(repo.insert_attempts(), 10);
}

#[tokio::test]
async fn test_colliding_display_name_is_replaced() {
    let repo = MockUserRepository::new();
    repo.reject_usernames(1);

    let (user, _) = directory(&repo)
        .read_or_create(&identity("a@x.com", "film_buff"))
        .await
        .unwrap();

    assert_ne!(user.username.as_str(), "film_buff");
    assert!(matches_generated_pattern(user.username.as_str()));
}

#[tokio::test]
async fn test_email_race_reruns_and_finds_winner() {
    let repo = MockUserRepository::new();
    repo.script(InsertScript::RaceWith(CreateUser {
        email: "a@x.com".to_string(),
        username: Username::parse("winner_name").unwrap(),
        avatar_url: None,
    }));

    let (user, is_new) = directory(&repo)
        .read_or_create(&identity("a@x.com", "loser_name"))
        .await
        .unwrap();

    assert!(!is_new);
    assert_eq!(user.username.as_str(), "winner_name");
    assert_eq!(repo.user_count(), 1);
    // Losing attempt rolled back, second attempt committed the lookup
    assert_eq!(repo.rollbacks(), 1);
    assert_eq!(repo.commits(), 1);
}

#[tokio::test]
async fn test_persistent_email_conflict_gives_up() {
    let repo = MockUserRepository::new();
    for _ in 0..3 {
        repo.script(InsertScript::Reject(UniqueConstraint::Email));
    }

    let err = directory(&repo)
        .read_or_create(&identity("a@x.com", ""))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::EmailConflict));
    assert_eq!(repo.insert_attempts(), 3);
    assert_eq!(repo.user_count(), 0);
}

#[tokio::test]
async fn test_other_constraint_is_fatal() {
    let repo = MockUserRepository::new();
    repo.script(InsertScript::Reject(UniqueConstraint::Other(
        "users_pkey".to_string(),
    )));

    let err = directory(&repo)
        .read_or_create(&identity("a@x.com", ""))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Infrastructure(_)));
    assert_eq!(repo.insert_attempts(), 1);
    assert_eq!(repo.user_count(), 0);
}

#[tokio::test]
async fn test_login_scenario_generated_username_then_same_user() {
    let harness = Harness::new();

    let first = harness
        .service
        .login(VerifiedIdentity::new("a@x.com", "", ""), false)
        .await
        .unwrap();
    assert!(first.is_new);
    assert!(matches_generated_pattern(first.user.username.as_str()));

    let second = harness
        .service
        .login(VerifiedIdentity::new("a@x.com", "", ""), false)
        .await
        .unwrap();
    assert!(!second.is_new);
    assert_eq!(second.user.id, first.user.id);
}

#[tokio::test]
async fn test_login_with_spaced_display_name_never_stores_it() {
    let harness = Harness::new();

    let login = harness
        .service
        .login(VerifiedIdentity::new("a@x.com", "Ada Lovelace", ""), false)
        .await
        .unwrap();

    assert_ne!(login.user.username.as_str(), "Ada Lovelace");
    assert!(!login.user.username.as_str().contains(' '));
}

#[tokio::test]
async fn test_interleaved_same_identity_provisions_once() {
    let users = InterleavedUsers::default();
    let directory = UserDirectory::new(Arc::new(users.clone()), &AuthConfig::default());
    let id = identity("a@x.com", "film_buff");

    let (a, b) = tokio::join!(directory.read_or_create(&id), directory.read_or_create(&id));
    let (a, a_new) = a.unwrap();
    let (b, b_new) = b.unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(a.username.as_str(), "film_buff");
    assert!(a_new != b_new);
    assert_eq!(users.inner.len().await, 1);
}

#[tokio::test]
async fn test_interleaved_username_clash_regenerates_for_loser() {
    let users = InterleavedUsers::default();
    let directory = UserDirectory::new(Arc::new(users.clone()), &AuthConfig::default());
    let first = identity("a@x.com", "film_buff");
    let second = identity("b@x.com", "film_buff");

    let (a, b) = tokio::join!(
        directory.read_or_create(&first),
        directory.read_or_create(&second)
    );
    let (a, a_new) = a.unwrap();
    let (b, b_new) = b.unwrap();

    assert!(a_new && b_new);
    assert_ne!(a.username, b.username);
    let winners = [&a, &b]
        .iter()
        .filter(|u| u.username.as_str() == "film_buff")
        .count();
    assert_eq!(winners, 1);
    assert_eq!(users.inner.len().await, 2);
}
