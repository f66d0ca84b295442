//! Mock repositories for testing

use async_trait::async_trait;
use chrono::Utc;
use cinelog_db::{
    CreateRefresh, CreateUser, DbError, DbResult, RefreshRepository, SessionCache,
    UniqueConstraint, UserRepository, UserTransaction,
};
use cinelog_types::{RefreshId, RefreshToken, Session, SessionId, User, UserId};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the next insert should run into
#[derive(Debug, Clone)]
pub enum InsertScript {
    /// Reject with a unique violation on the given constraint
    Reject(UniqueConstraint),
    /// Another request commits this user first, then the insert runs
    RaceWith(CreateUser),
}

/// In-memory user repository for testing
///
/// Inserts can be scripted to collide, so provisioning retry paths can be
/// driven deterministically.
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<i64, User>>,
    next_id: Arc<AtomicI64>,
    script: Arc<Mutex<VecDeque<InsertScript>>>,
    inserts: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` inserts on the username constraint
    pub fn reject_usernames(&self, n: usize) -> &Self {
        let mut script = self.script.lock().unwrap();
        for _ in 0..n {
            script.push_back(InsertScript::Reject(UniqueConstraint::Username));
        }
        self
    }

    /// Queue a scripted outcome for the next unscripted insert
    pub fn script(&self, step: InsertScript) -> &Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    /// Commit a user directly, bypassing scripts
    pub fn insert_user(&self, user: &CreateUser) -> User {
        let row = self.materialize(user);
        self.users.insert(row.id.0, row.clone());
        row
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn insert_attempts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub fn find_by_email_sync(&self, email: &str) -> Option<User> {
        self.users
            .iter()
            .find(|r| r.value().email == email)
            .map(|r| r.value().clone())
    }

    fn materialize(&self, user: &CreateUser) -> User {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        User {
            id: UserId(id),
            email: user.email.clone(),
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn conflict(&self, pending: &[User], user: &CreateUser) -> Option<UniqueConstraint> {
        let committed = self.users.iter().map(|r| r.value().clone());
        let mut all = committed.chain(pending.iter().cloned());
        all.find_map(|existing| {
            if existing.username == user.username {
                Some(UniqueConstraint::Username)
            } else if existing.email == user.email {
                Some(UniqueConstraint::Email)
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        Ok(self.users.get(&id.0).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self.find_by_email_sync(email))
    }

    async fn begin(&self) -> DbResult<Box<dyn UserTransaction>> {
        Ok(Box::new(MockUserTransaction {
            repo: self.clone(),
            pending: Vec::new(),
        }))
    }
}

/// Buffered transaction over a [`MockUserRepository`]
pub struct MockUserTransaction {
    repo: MockUserRepository,
    pending: Vec<User>,
}

#[async_trait]
impl UserTransaction for MockUserTransaction {
    async fn find_by_email(&mut self, email: &str) -> DbResult<Option<User>> {
        if let Some(user) = self.pending.iter().find(|u| u.email == email) {
            return Ok(Some(user.clone()));
        }
        Ok(self.repo.find_by_email_sync(email))
    }

    async fn insert(&mut self, user: &CreateUser) -> DbResult<User> {
        self.repo.inserts.fetch_add(1, Ordering::SeqCst);

        let step = self.repo.script.lock().unwrap().pop_front();
        match step {
            Some(InsertScript::Reject(constraint)) => {
                return Err(DbError::UniqueViolation(constraint));
            }
            Some(InsertScript::RaceWith(winner)) => {
                self.repo.insert_user(&winner);
            }
            None => {}
        }

        if let Some(constraint) = self.repo.conflict(&self.pending, user) {
            return Err(DbError::UniqueViolation(constraint));
        }

        let row = self.repo.materialize(user);
        self.pending.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let this = *self;
        for user in this.pending {
            this.repo.users.insert(user.id.0, user);
        }
        this.repo.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        self.repo.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory refresh repository for testing, joined against a
/// [`MockUserRepository`]
#[derive(Clone)]
pub struct MockRefreshRepository {
    users: MockUserRepository,
    tokens: Arc<DashMap<RefreshId, CreateRefresh>>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockRefreshRepository {
    pub fn new(users: MockUserRepository) -> Self {
        Self {
            users,
            tokens: Arc::new(DashMap::new()),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every call fail as if the database were unreachable
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, id: RefreshId) -> bool {
        self.tokens.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    fn check(&self) -> DbResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DbError::Timeout("refresh mock"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RefreshRepository for MockRefreshRepository {
    async fn create(&self, token: CreateRefresh) -> DbResult<()> {
        self.check()?;
        self.tokens.insert(token.id, token);
        Ok(())
    }

    async fn read(&self, id: RefreshId) -> DbResult<RefreshToken> {
        self.check()?;
        let token = self
            .tokens
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(DbError::NotFound)?;
        if token.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(DbError::NotFound);
        }
        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(DbError::NotFound)?;
        Ok(RefreshToken {
            id,
            user,
            expires_at: token.expires_at,
        })
    }

    async fn delete(&self, id: RefreshId) -> DbResult<()> {
        self.check()?;
        self.tokens.remove(&id);
        Ok(())
    }
}

/// In-memory session cache for testing, with switchable faults
#[derive(Default, Clone)]
pub struct MockSessionCache {
    sessions: Arc<DashMap<SessionId, Session>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockSessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, failing: bool) {
        self.fail_deletes.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Drop an entry as if it had expired
    pub fn evict(&self, id: &SessionId) {
        self.sessions.remove(id);
    }
}

#[async_trait]
impl SessionCache for MockSessionCache {
    async fn create(&self, session: &Session) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Timeout("session mock write"));
        }
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn read_and_refresh(&self, id: &SessionId) -> DbResult<Session> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DbError::Timeout("session mock read"));
        }
        self.sessions
            .get(id)
            .map(|r| r.value().clone())
            .ok_or(DbError::NotFound)
    }

    async fn delete(&self, id: &SessionId) -> DbResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(DbError::Timeout("session mock delete"));
        }
        self.sessions.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinelog_types::Username;

    fn create(email: &str, username: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            username: Username::parse(username).unwrap(),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_rejection_is_consumed_once() {
        let repo = MockUserRepository::new();
        repo.reject_usernames(1);

        let mut tx = repo.begin().await.unwrap();
        let err = tx.insert(&create("a@x.com", "first_try")).await.unwrap_err();
        assert_eq!(err.unique_violation(), Some(&UniqueConstraint::Username));

        tx.insert(&create("a@x.com", "second_try")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(repo.user_count(), 1);
        assert_eq!(repo.insert_attempts(), 2);
    }

    #[tokio::test]
    async fn test_race_commits_winner_first() {
        let repo = MockUserRepository::new();
        repo.script(InsertScript::RaceWith(create("a@x.com", "the_winner")));

        let mut tx = repo.begin().await.unwrap();
        let err = tx.insert(&create("a@x.com", "the_loser")).await.unwrap_err();
        assert_eq!(err.unique_violation(), Some(&UniqueConstraint::Email));
        assert_eq!(
            repo.find_by_email_sync("a@x.com").unwrap().username.as_str(),
            "the_winner"
        );
    }
}
