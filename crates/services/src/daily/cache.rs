use std::sync::Arc;
use std::time::Duration;

use storage::repository::{KeyValueStore, StorageError};
use svenska_core::CalendarDay;
use svenska_core::model::UserId;

use super::plan::DailyProgram;
use super::progress::DailyCompletionSet;
use crate::config::DailyConfig;

const PROGRAM_KEY: &str = "dailyProgram";
const DATE_KEY: &str = "dailyProgramDate";
const COMPLETED_KEY: &str = "dailyCompleted";

/// Why a cached program could not be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Program or date marker absent, or the store could not be read.
    Missing,
    /// The marker names another day.
    DateMismatch,
    /// The marker could not be parsed.
    MalformedDate,
    /// The program JSON could not be parsed.
    MalformedProgram,
}

/// What the local store holds for today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedDay {
    Fresh {
        program: DailyProgram,
        completion: DailyCompletionSet,
    },
    Stale(StaleReason),
}

/// Today's program, date marker and completion set in the local store.
///
/// Every key is scoped to one learner: `{prefix}{user_id}:dailyProgram`.
/// Writes are best effort: a failure or timeout is logged and swallowed.
#[derive(Clone)]
pub struct DailyCache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    write_timeout: Duration,
}

impl DailyCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: &DailyConfig) -> Self {
        Self {
            store,
            prefix: config.key_prefix.clone(),
            write_timeout: config.write_timeout,
        }
    }

    #[must_use]
    pub fn program_key(&self, user_id: UserId) -> String {
        self.key(user_id, PROGRAM_KEY)
    }

    #[must_use]
    pub fn date_key(&self, user_id: UserId) -> String {
        self.key(user_id, DATE_KEY)
    }

    #[must_use]
    pub fn completed_key(&self, user_id: UserId) -> String {
        self.key(user_id, COMPLETED_KEY)
    }

    fn key(&self, user_id: UserId, name: &str) -> String {
        format!("{}{user_id}:{name}", self.prefix)
    }

    /// Load the learner's cached program if it belongs to `today`.
    pub async fn load(&self, user_id: UserId, today: CalendarDay) -> CachedDay {
        let marker = self.read(&self.date_key(user_id)).await;
        let raw_program = self.read(&self.program_key(user_id)).await;
        let (Some(marker), Some(raw_program)) = (marker, raw_program) else {
            return CachedDay::Stale(StaleReason::Missing);
        };

        let day = match CalendarDay::parse_marker(&marker) {
            Ok(day) => day,
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "cached date marker is malformed");
                return CachedDay::Stale(StaleReason::MalformedDate);
            }
        };
        if day != today {
            tracing::debug!(cached = %day, today = %today, "cached program is from another day");
            return CachedDay::Stale(StaleReason::DateMismatch);
        }

        let program: DailyProgram = match serde_json::from_str(&raw_program) {
            Ok(program) => program,
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "cached daily program is malformed");
                return CachedDay::Stale(StaleReason::MalformedProgram);
            }
        };

        let completion = self.load_completion(user_id).await;
        CachedDay::Fresh {
            program,
            completion,
        }
    }

    async fn load_completion(&self, user_id: UserId) -> DailyCompletionSet {
        let Some(raw) = self.read(&self.completed_key(user_id)).await else {
            return DailyCompletionSet::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "cached completion set is malformed; starting empty");
            DailyCompletionSet::new()
        })
    }

    /// Persist a freshly generated program for `day` with an empty completion set.
    pub async fn store_program(&self, user_id: UserId, day: CalendarDay, program: &DailyProgram) {
        match serde_json::to_string(program) {
            Ok(json) => self.write(&self.program_key(user_id), &json).await,
            Err(err) => tracing::warn!(error = %err, "failed to encode daily program"),
        }
        self.write(&self.date_key(user_id), &day.marker()).await;
        self.store_completion(user_id, &DailyCompletionSet::new()).await;
    }

    pub async fn store_completion(&self, user_id: UserId, completion: &DailyCompletionSet) {
        match serde_json::to_string(completion) {
            Ok(json) => self.write(&self.completed_key(user_id), &json).await,
            Err(err) => tracing::warn!(error = %err, "failed to encode completion set"),
        }
    }

    /// Forget the learner's cached program so the next load regenerates it.
    pub async fn clear(&self, user_id: UserId) {
        for key in [
            self.program_key(user_id),
            self.date_key(user_id),
            self.completed_key(user_id),
        ] {
            let result = tokio::time::timeout(self.write_timeout, self.store.remove(&key)).await;
            log_write_failure(&key, result);
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "local store read failed");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        let result = tokio::time::timeout(self.write_timeout, self.store.set(key, value)).await;
        log_write_failure(key, result);
    }
}

fn log_write_failure(
    key: &str,
    result: Result<Result<(), StorageError>, tokio::time::error::Elapsed>,
) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(key, error = %err, "local store write failed"),
        Err(_) => tracing::warn!(key, "local store write timed out"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily::test_support::program_of;
    use storage::repository::InMemoryRepository;

    fn day(d: u32) -> CalendarDay {
        CalendarDay::from_ymd(2024, 1, d).unwrap()
    }

    fn cache(store: &InMemoryRepository) -> DailyCache {
        DailyCache::new(Arc::new(store.clone()), &DailyConfig::default())
    }

    #[tokio::test]
    async fn empty_store_is_missing() {
        let store = InMemoryRepository::new();
        assert_eq!(
            cache(&store).load(UserId::generate(), day(1)).await,
            CachedDay::Stale(StaleReason::Missing)
        );
    }

    #[test]
    fn keys_carry_prefix_and_user() {
        let store = InMemoryRepository::new();
        let user = UserId::generate();
        let cache = cache(&store);
        assert_eq!(cache.program_key(user), format!("svenska:{user}:dailyProgram"));
        assert_eq!(cache.date_key(user), format!("svenska:{user}:dailyProgramDate"));
        assert_eq!(cache.completed_key(user), format!("svenska:{user}:dailyCompleted"));
    }

    #[tokio::test]
    async fn stored_program_is_fresh_for_same_day() {
        let store = InMemoryRepository::new();
        let user = UserId::generate();
        let cache = cache(&store);
        let program = program_of(8, 2);
        cache.store_program(user, day(1), &program).await;

        match cache.load(user, day(1)).await {
            CachedDay::Fresh {
                program: cached,
                completion,
            } => {
                assert_eq!(cached, program);
                assert!(completion.is_empty());
            }
            other => panic!("expected fresh cache, got {other:?}"),
        }
        assert_eq!(
            store.get(&cache.date_key(user)).await.unwrap().as_deref(),
            Some("2024-01-01")
        );
    }

    #[tokio::test]
    async fn learners_do_not_share_a_day() {
        let store = InMemoryRepository::new();
        let cache = cache(&store);
        let (alice, bob) = (UserId::generate(), UserId::generate());
        let program = program_of(3, 0);
        cache.store_program(alice, day(1), &program).await;
        let mut completion = DailyCompletionSet::new();
        completion.mark(&program, program.key_at(0).unwrap()).unwrap();
        cache.store_completion(alice, &completion).await;

        assert_eq!(
            cache.load(bob, day(1)).await,
            CachedDay::Stale(StaleReason::Missing)
        );

        cache.store_program(bob, day(1), &program_of(2, 0)).await;
        cache.clear(bob).await;
        match cache.load(alice, day(1)).await {
            CachedDay::Fresh { completion: loaded, .. } => assert_eq!(loaded, completion),
            other => panic!("expected fresh cache, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_day_is_stale() {
        let store = InMemoryRepository::new();
        let user = UserId::generate();
        let cache = cache(&store);
        cache.store_program(user, day(1), &program_of(2, 0)).await;
        assert_eq!(
            cache.load(user, day(2)).await,
            CachedDay::Stale(StaleReason::DateMismatch)
        );
    }

    #[tokio::test]
    async fn legacy_marker_is_understood() {
        let store = InMemoryRepository::new();
        let user = UserId::generate();
        let cache = cache(&store);
        cache.store_program(user, day(1), &program_of(2, 0)).await;
        store
            .set(&cache.date_key(user), "Mon Jan 01 2024")
            .await
            .unwrap();

        assert!(matches!(cache.load(user, day(1)).await, CachedDay::Fresh { .. }));
        assert_eq!(
            cache.load(user, day(2)).await,
            CachedDay::Stale(StaleReason::DateMismatch)
        );
    }

    #[tokio::test]
    async fn garbage_program_is_malformed() {
        let store = InMemoryRepository::new();
        let user = UserId::generate();
        let cache = cache(&store);
        cache.store_program(user, day(1), &program_of(2, 0)).await;
        store.set(&cache.program_key(user), "{not json").await.unwrap();
        assert_eq!(
            cache.load(user, day(1)).await,
            CachedDay::Stale(StaleReason::MalformedProgram)
        );

        store
            .set(&cache.date_key(user), "yesterday-ish")
            .await
            .unwrap();
        assert_eq!(
            cache.load(user, day(1)).await,
            CachedDay::Stale(StaleReason::MalformedDate)
        );
    }

    #[tokio::test]
    async fn garbage_completion_set_loads_empty() {
        let store = InMemoryRepository::new();
        let user = UserId::generate();
        let cache = cache(&store);
        cache.store_program(user, day(1), &program_of(2, 0)).await;
        store.set(&cache.completed_key(user), "nope").await.unwrap();

        match cache.load(user, day(1)).await {
            CachedDay::Fresh { completion, .. } => assert!(completion.is_empty()),
            other => panic!("expected fresh cache, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn completion_set_round_trips() {
        let store = InMemoryRepository::new();
        let user = UserId::generate();
        let cache = cache(&store);
        let program = program_of(3, 0);
        cache.store_program(user, day(1), &program).await;

        let mut completion = DailyCompletionSet::new();
        completion.mark(&program, program.key_at(1).unwrap()).unwrap();
        cache.store_completion(user, &completion).await;

        match cache.load(user, day(1)).await {
            CachedDay::Fresh { completion: loaded, .. } => assert_eq!(loaded, completion),
            other => panic!("expected fresh cache, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clear_forgets_everything() {
        let store = InMemoryRepository::new();
        let user = UserId::generate();
        let cache = cache(&store);
        cache.store_program(user, day(1), &program_of(2, 0)).await;
        cache.clear(user).await;
        assert_eq!(
            cache.load(user, day(1)).await,
            CachedDay::Stale(StaleReason::Missing)
        );
    }
}
