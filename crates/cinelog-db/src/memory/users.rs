//! In-memory user repository with transactional inserts

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use cinelog_types::{User, UserId};
use tokio::sync::Notify;

use crate::error::{DbError, DbResult, UniqueConstraint};
use crate::repo::{CreateUser, UserRepository, UserTransaction};

/// A unique key claimed by a row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Email(String),
    Username(String),
}

impl Key {
    fn for_user(email: &str, username: &str) -> [(Key, UniqueConstraint); 2] {
        [
            (Key::Email(email.to_string()), UniqueConstraint::Email),
            (Key::Username(username.to_string()), UniqueConstraint::Username),
        ]
    }
}

enum Claim {
    Free,
    Taken(UniqueConstraint),
    /// Held by another open transaction
    Contended,
}

#[derive(Debug, Default)]
struct UserTable {
    next_id: i64,
    next_tx: u64,
    rows: HashMap<i64, User>,
    /// Keys inserted by open transactions, with their owner
    reserved: HashMap<Key, u64>,
}

impl UserTable {
    fn by_email(&self, email: &str) -> Option<&User> {
        self.rows.values().find(|u| u.email == email)
    }

    fn committed(&self, key: &Key) -> bool {
        match key {
            Key::Email(email) => self.by_email(email).is_some(),
            Key::Username(name) => self.rows.values().any(|u| u.username.as_str() == name),
        }
    }

    /// Email is checked first, so a provisioning race always reports as one
    fn claim(&self, owner: u64, email: &str, username: &str) -> Claim {
        for (key, constraint) in Key::for_user(email, username) {
            if self.committed(&key) {
                return Claim::Taken(constraint);
            }
            match self.reserved.get(&key) {
                Some(holder) if *holder == owner => return Claim::Taken(constraint),
                Some(_) => return Claim::Contended,
                None => {}
            }
        }
        Claim::Free
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn allocate_tx(&mut self) -> u64 {
        self.next_tx += 1;
        self.next_tx
    }

    fn release(&mut self, owner: u64, user: &User) {
        for (key, _) in Key::for_user(&user.email, user.username.as_str()) {
            if self.reserved.get(&key) == Some(&owner) {
                self.reserved.remove(&key);
            }
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    table: Mutex<UserTable>,
    /// Signalled whenever a transaction gives up its reservations
    released: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, UserTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a row as `owner`, reserving its keys until the owner finishes.
    ///
    /// Like a unique index, an insert that hits a key held by another open
    /// transaction waits for that transaction before deciding.
    async fn reserve(&self, owner: u64, user: &CreateUser) -> DbResult<User> {
        loop {
            let released = self.released.notified();
            {
                let mut table = self.lock();
                match table.claim(owner, &user.email, user.username.as_str()) {
                    Claim::Taken(constraint) => return Err(DbError::UniqueViolation(constraint)),
                    Claim::Free => {
                        let row = materialize(table.allocate_id(), user);
                        for (key, _) in Key::for_user(&row.email, row.username.as_str()) {
                            table.reserved.insert(key, owner);
                        }
                        return Ok(row);
                    }
                    Claim::Contended => {}
                }
            }
            released.await;
        }
    }

    /// Publish or discard `owner`'s rows and wake waiting inserts
    fn finish(&self, owner: u64, pending: Vec<User>, commit: bool) {
        if pending.is_empty() {
            return;
        }
        {
            let mut table = self.lock();
            for user in pending {
                table.release(owner, &user);
                if commit {
                    table.rows.insert(user.id.0, user);
                }
            }
        }
        self.released.notify_waiters();
    }
}

/// User table held in process memory.
///
/// Inserts made inside a transaction are invisible to other readers until
/// commit, but their keys are reserved at insert time: a second insert of
/// the same email or username waits for the first transaction to finish.
/// Identifiers are allocated like a sequence: a rolled-back insert still
/// consumes its id.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    shared: Arc<Shared>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert and commit a user directly, outside any transaction
    pub async fn insert_committed(&self, user: &CreateUser) -> DbResult<User> {
        let owner = self.shared.lock().allocate_tx();
        let row = self.shared.reserve(owner, user).await?;
        self.shared.finish(owner, vec![row.clone()], true);
        Ok(row)
    }

    /// Number of committed users
    pub async fn len(&self) -> usize {
        self.shared.lock().rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn materialize(id: i64, user: &CreateUser) -> User {
    let now = Utc::now();
    User {
        id: UserId(id),
        email: user.email.clone(),
        username: user.username.clone(),
        avatar_url: user.avatar_url.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        Ok(self.shared.lock().rows.get(&id.0).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self.shared.lock().by_email(email).cloned())
    }

    async fn begin(&self) -> DbResult<Box<dyn UserTransaction>> {
        let id = self.shared.lock().allocate_tx();
        Ok(Box::new(MemoryUserTransaction {
            shared: Arc::clone(&self.shared),
            id,
            pending: Vec::new(),
        }))
    }
}

/// Buffered transaction over a [`MemoryUserRepository`]
///
/// Dropping it without commit rolls it back.
#[derive(Debug)]
pub struct MemoryUserTransaction {
    shared: Arc<Shared>,
    id: u64,
    pending: Vec<User>,
}

impl MemoryUserTransaction {
    fn finish(&mut self, commit: bool) {
        let pending = std::mem::take(&mut self.pending);
        self.shared.finish(self.id, pending, commit);
    }
}

impl Drop for MemoryUserTransaction {
    fn drop(&mut self) {
        self.finish(false);
    }
}

#[async_trait]
impl UserTransaction for MemoryUserTransaction {
    async fn find_by_email(&mut self, email: &str) -> DbResult<Option<User>> {
        if let Some(user) = self.pending.iter().find(|u| u.email == email) {
            return Ok(Some(user.clone()));
        }
        Ok(self.shared.lock().by_email(email).cloned())
    }

    async fn insert(&mut self, user: &CreateUser) -> DbResult<User> {
        let row = self.shared.reserve(self.id, user).await?;
        self.pending.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let mut this = self;
        this.finish(true);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        let mut this = self;
        this.finish(false);
        Ok(())
    }
}
