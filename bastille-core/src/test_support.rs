//! In-memory mocks shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Error;
use crate::error::StorageError;
use crate::lock::{AttemptLogEntry, LockId, LockRecord, NewLock, RequestContext, UnlockUpdate};
use crate::repositories::{
    AttemptLogRepository, AttemptLogRepositoryProvider, LockRepository, LockRepositoryProvider,
    RepositoryProvider,
};
use crate::resolver::IdentityResolver;
use crate::subject::{Subject, SubjectRef};

#[derive(Default)]
pub(crate) struct MockLockRepository {
    pub records: Mutex<Vec<LockRecord>>,
}

impl MockLockRepository {
    pub fn push(&self, record: LockRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl LockRepository for MockLockRepository {
    async fn create_lock(&self, subject: &SubjectRef, lock: NewLock) -> Result<LockRecord, Error> {
        let now = Utc::now();
        let record = LockRecord {
            id: LockId::generate(),
            subject: subject.clone(),
            locked_at: lock.locked_at.unwrap_or(now),
            unlocked_at: None,
            expires_at: lock.expires_at,
            reason: lock.reason,
            meta: lock.meta,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn find_active_lock(&self, subject: &SubjectRef) -> Result<Option<LockRecord>, Error> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| &r.subject == subject && r.is_active())
            .max_by_key(|r| r.locked_at)
            .cloned())
    }

    async fn has_active_lock(&self, subject: &SubjectRef) -> Result<bool, Error> {
        Ok(self.find_active_lock(subject).await?.is_some())
    }

    async fn mark_unlocked(
        &self,
        lock: &LockId,
        update: UnlockUpdate,
    ) -> Result<LockRecord, Error> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| &r.id == lock)
            .ok_or(StorageError::NotFound)?;

        record.unlocked_at = Some(Utc::now());
        update.apply_to(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| {
            let unlocked_old = r.unlocked_at.is_some_and(|t| t < cutoff);
            let expired_old = r.expires_at.is_some_and(|t| t < cutoff);
            !(unlocked_old || expired_old)
        });
        Ok((before - records.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct MockAttemptLogRepository {
    pub entries: Mutex<Vec<AttemptLogEntry>>,
}

#[async_trait]
impl AttemptLogRepository for MockAttemptLogRepository {
    async fn append(
        &self,
        identifier: &str,
        subject: Option<&SubjectRef>,
        context: &RequestContext,
    ) -> Result<AttemptLogEntry, Error> {
        let mut entries = self.entries.lock().unwrap();
        let entry = AttemptLogEntry {
            id: entries.len() as i64 + 1,
            identifier: identifier.to_string(),
            subject: subject.cloned(),
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
            attempted_at: Utc::now(),
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn count_since(&self, identifier: &str, since: DateTime<Utc>) -> Result<u64, Error> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.identifier == identifier && e.attempted_at >= since)
            .count() as u64)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.attempted_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct MockProvider {
    locks: MockLockRepository,
    attempt_logs: MockAttemptLogRepository,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_log_len(&self) -> usize {
        self.attempt_logs.entries.lock().unwrap().len()
    }

    pub fn lock_record_count(&self) -> usize {
        self.locks.records.lock().unwrap().len()
    }

    pub fn push_lock(&self, record: LockRecord) {
        self.locks.push(record);
    }
}

impl LockRepositoryProvider for MockProvider {
    type LockRepo = MockLockRepository;

    fn locks(&self) -> &Self::LockRepo {
        &self.locks
    }
}

impl AttemptLogRepositoryProvider for MockProvider {
    type AttemptLogRepo = MockAttemptLogRepository;

    fn attempt_logs(&self) -> &Self::AttemptLogRepo {
        &self.attempt_logs
    }
}

#[async_trait]
impl RepositoryProvider for MockProvider {
    async fn migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Resolver backed by a fixed identifier → subject map.
#[derive(Default)]
pub(crate) struct MockResolver {
    subjects: HashMap<String, SubjectRef>,
}

impl MockResolver {
    pub fn with_subject(identifier: &str, subject: SubjectRef) -> Self {
        let mut subjects = HashMap::new();
        subjects.insert(identifier.to_string(), subject);
        Self { subjects }
    }
}

#[async_trait]
impl IdentityResolver for MockResolver {
    async fn resolve(&self, identifier: &str) -> Result<Option<Subject>, Error> {
        Ok(self
            .subjects
            .get(identifier)
            .map(|subject| Subject::new(subject.clone()).with_identifier(identifier)))
    }

    async fn identifier_for(&self, subject: &SubjectRef) -> Result<Option<String>, Error> {
        Ok(self
            .subjects
            .iter()
            .find(|(_, candidate)| *candidate == subject)
            .map(|(identifier, _)| identifier.clone()))
    }
}
