use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use services::daily::{DailyCache, StaleReason};
use services::{
    AnswerOutcome, Clock, DailyConfig, DailyLoopService, DailyServiceError, ProgramSource,
    SessionStatus,
};
use storage::repository::{InMemoryRepository, KeyValueStore, ProfileRepository, StorageError};
use svenska_core::model::{
    Badge, Catalog, CategoryId, Difficulty, DifficultyBand, Graded, UserId, UserProfile,
};

fn catalog() -> Arc<Catalog> {
    let mut categories = Vec::new();
    for (slug, name, difficulty) in [
        ("greetings", "Begroetingen", "easy"),
        ("food", "Eten", "medium"),
    ] {
        let phrases: Vec<String> = (1..=6)
            .map(|id| {
                format!(
                    r#"{{ "id": {id}, "swedish": "{slug} sv {id}", "dutch": "{slug} nl {id}", "difficulty": "{difficulty}" }}"#
                )
            })
            .collect();
        categories.push(format!(
            r#"{{ "id": "{slug}", "name": "{name}", "phrases": [{}] }}"#,
            phrases.join(",")
        ));
    }
    let raw = format!(
        r#"{{
            "categories": [{}],
            "grammar": {{
                "articles": [
                    {{ "id": 1, "prompt": "___ hus", "answer": "ett", "difficulty": "easy" }},
                    {{ "id": 2, "prompt": "___ bil", "answer": "en", "difficulty": "easy" }}
                ],
                "pronouns": [
                    {{ "id": 3, "prompt": "___ är glad (zij)", "answer": "hon", "alternatives": ["Hon"], "difficulty": "easy" }}
                ]
            }}
        }}"#,
        categories.join(",")
    );
    Arc::new(Catalog::from_json(&raw).unwrap())
}

fn clock_on(day: u32) -> Clock {
    Clock::fixed(Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap())
}

fn service_with(
    clock: Clock,
    local: Arc<dyn KeyValueStore>,
    profiles: Arc<dyn ProfileRepository>,
    config: DailyConfig,
) -> DailyLoopService {
    let cache = DailyCache::new(local, &config);
    DailyLoopService::new(clock, catalog(), cache, profiles, config).with_seed(42)
}

fn service(clock: Clock, repo: &InMemoryRepository) -> DailyLoopService {
    service_with(
        clock,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        DailyConfig::default(),
    )
}

fn cache_key(user: UserId, name: &str) -> String {
    format!("svenska:{user}:{name}")
}

fn expected_answer(state: &services::DailyState) -> String {
    state.current_item().unwrap().accepted_answers()[0].to_owned()
}

// ─── Failing stores ────────────────────────────────────────────────────────────

/// Local store whose writes always fail.
struct BrokenLocalStore;

#[async_trait]
impl KeyValueStore for BrokenLocalStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

/// Local store whose writes hang far beyond the write timeout.
struct SlowLocalStore(InMemoryRepository);

#[async_trait]
impl KeyValueStore for SlowLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        self.0.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.remove(key).await
    }
}

/// Account store that loads fine but refuses to save.
#[derive(Default)]
struct ReadOnlyProfiles(InMemoryRepository);

#[async_trait]
impl ProfileRepository for ReadOnlyProfiles {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StorageError> {
        self.0.get_profile(id).await
    }

    async fn save_profile(&self, _profile: &UserProfile) -> Result<(), StorageError> {
        Err(StorageError::Connection("account store unavailable".into()))
    }
}

// ─── Caching ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_the_same_day_reuses_the_program() {
    let repo = InMemoryRepository::new();
    let user = UserId::generate();

    let first = service(clock_on(1), &repo).open(user).await.unwrap();
    assert_eq!(first.source(), ProgramSource::Generated(StaleReason::Missing));
    assert_eq!(first.program().len(), 10);

    // A different seed would shuffle differently; the cache must win.
    let second = service(clock_on(1), &repo)
        .with_seed(7)
        .open(user)
        .await
        .unwrap();
    assert_eq!(second.source(), ProgramSource::Cached);
    assert_eq!(second.program(), first.program());
}

#[tokio::test]
async fn progress_survives_reload() {
    let repo = InMemoryRepository::new();
    let user = UserId::generate();
    let daily = service(clock_on(1), &repo);

    let mut state = daily.open(user).await.unwrap();
    for _ in 0..3 {
        let answer = expected_answer(&state);
        daily.answer(&mut state, &answer).await.unwrap();
    }

    let reloaded = daily.open(user).await.unwrap();
    assert_eq!(reloaded.progress().completed, 3);
    assert_eq!(reloaded.session().status(), SessionStatus::Presented(3));
    assert_eq!(reloaded.profile().total_points(), state.profile().total_points());
}

#[tokio::test]
async fn malformed_cache_is_regenerated() {
    let repo = InMemoryRepository::new();
    let user = UserId::generate();
    service(clock_on(1), &repo).open(user).await.unwrap();

    repo.set(&cache_key(user, "dailyProgram"), "[{\"kind\":\"mystery\"}]")
        .await
        .unwrap();
    let state = service(clock_on(1), &repo).open(user).await.unwrap();
    assert_eq!(
        state.source(),
        ProgramSource::Generated(StaleReason::MalformedProgram)
    );
    assert_eq!(state.program().len(), 10);
    assert!(state.completion().is_empty());
}

// ─── Date rollover ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn legacy_marker_from_yesterday_triggers_regeneration() {
    let repo = InMemoryRepository::new();
    let user = UserId::generate();
    let yesterday = service(clock_on(1), &repo);
    let mut state = yesterday.open(user).await.unwrap();
    let answer = expected_answer(&state);
    yesterday.answer(&mut state, &answer).await.unwrap();

    repo.set(&cache_key(user, "dailyProgramDate"), "Mon Jan 01 2024")
        .await
        .unwrap();

    let today = service(clock_on(2), &repo).open(user).await.unwrap();
    assert_eq!(
        today.source(),
        ProgramSource::Generated(StaleReason::DateMismatch)
    );
    assert!(today.completion().is_empty());
    assert_eq!(
        repo.get(&cache_key(user, "dailyProgramDate")).await.unwrap().as_deref(),
        Some("2024-01-02")
    );
    assert_eq!(
        repo.get(&cache_key(user, "dailyCompleted")).await.unwrap().as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn resume_after_midnight_rolls_over() {
    let repo = InMemoryRepository::new();
    let user = UserId::generate();
    let monday = service(clock_on(1), &repo);
    let mut state = monday.open(user).await.unwrap();
    let answer = expected_answer(&state);
    monday.answer(&mut state, &answer).await.unwrap();
    state.leave();

    let tuesday = service(clock_on(2), &repo);
    let status = tuesday.resume(&mut state).await.unwrap();

    assert_eq!(status, SessionStatus::Presented(0));
    assert_eq!(state.day().marker(), "2024-01-02");
    assert_eq!(state.progress().completed, 0);
}

// ─── Completion ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn finishing_the_day_records_it_once() {
    let repo = InMemoryRepository::new();
    let user = UserId::generate();
    let daily = service(clock_on(1), &repo);
    let mut state = daily.open(user).await.unwrap();

    let mut last = None;
    while state.session().status() != SessionStatus::DayComplete {
        let answer = expected_answer(&state);
        last = Some(daily.answer(&mut state, &answer).await.unwrap());
    }

    let last = last.unwrap();
    assert!(matches!(last.outcome, AnswerOutcome::DayComplete { .. }));
    assert!(last.progress.is_complete);
    assert_eq!(last.progress.percent(), 100);
    let signal = last.signal.expect("completion signal");
    assert_eq!(signal.dismiss_after, Duration::from_secs(3));
    assert!(signal.new_badges.contains(&Badge::FirstDailyProgram));

    // 4 practice, 4 writing, 2 grammar.
    assert_eq!(state.profile().total_points(), 4 * 10 + 4 * 15 + 2 * 20);
    assert_eq!(state.profile().completed_phrases().len(), 8);
    assert_eq!(state.profile().completed_days().len(), 1);

    let stored = repo.get_profile(user).await.unwrap().unwrap();
    assert_eq!(&stored, state.profile());

    // Reopening the finished day does not fire the signal again.
    let reopened = daily.open(user).await.unwrap();
    assert_eq!(reopened.session().status(), SessionStatus::DayComplete);
    assert!(reopened.signal().is_none());
    assert_eq!(reopened.profile().completed_days().len(), 1);
}

#[tokio::test]
async fn another_learner_gets_their_own_day() {
    let repo = InMemoryRepository::new();
    let daily = service(clock_on(1), &repo);
    let alice = UserId::generate();
    let mut state = daily.open(alice).await.unwrap();
    while state.session().status() != SessionStatus::DayComplete {
        let answer = expected_answer(&state);
        daily.answer(&mut state, &answer).await.unwrap();
    }

    let bob = UserId::generate();
    let mut bobs_profile = UserProfile::new(bob);
    bobs_profile.set_difficulty_preference(Some(DifficultyBand::Medium));
    repo.save_profile(&bobs_profile).await.unwrap();

    let bobs = daily.open(bob).await.unwrap();
    assert_eq!(bobs.source(), ProgramSource::Generated(StaleReason::Missing));
    assert_eq!(bobs.session().status(), SessionStatus::Presented(0));
    assert!(bobs.completion().is_empty());
    assert!(bobs.signal().is_none());
    assert!(bobs.profile().completed_days().is_empty());
    assert!(bobs.profile().badges().is_empty());
    assert!(
        bobs.program()
            .items()
            .iter()
            .filter(|item| !item.is_grammar())
            .all(|item| item.difficulty() == Difficulty::Medium)
    );

    // Bob rebuilding his day leaves Alice's finished one alone.
    let mut bobs = bobs;
    daily.reset_today(&mut bobs).await;
    let reopened = daily.open(alice).await.unwrap();
    assert_eq!(reopened.source(), ProgramSource::Cached);
    assert_eq!(reopened.session().status(), SessionStatus::DayComplete);
    assert_eq!(reopened.program(), state.program());
}

#[tokio::test]
async fn signal_expires_after_its_delay() {
    let repo = InMemoryRepository::new();
    let user = UserId::generate();
    let daily = service(clock_on(1), &repo);
    let mut state = daily.open(user).await.unwrap();
    while state.session().status() != SessionStatus::DayComplete {
        let answer = expected_answer(&state);
        daily.answer(&mut state, &answer).await.unwrap();
    }
    assert!(daily.poll_signal(&mut state).is_some());

    let mut later = clock_on(1);
    later.advance(chrono::Duration::seconds(5));
    let later = service(later, &repo);
    assert!(later.poll_signal(&mut state).is_none());
    assert!(state.signal().is_none());
}

#[tokio::test]
async fn wrong_answer_is_retried_without_reward() {
    let repo = InMemoryRepository::new();
    let daily = service(clock_on(1), &repo);
    let mut state = daily.open(UserId::generate()).await.unwrap();

    let result = daily.answer(&mut state, "fel svar").await.unwrap();
    assert_eq!(result.outcome, AnswerOutcome::Retry { index: 0 });
    assert!(result.reward.is_none());
    assert_eq!(state.profile().total_points(), 0);
}

#[tokio::test]
async fn skipped_items_come_back() {
    let repo = InMemoryRepository::new();
    let daily = service(clock_on(1), &repo);
    let mut state = daily.open(UserId::generate()).await.unwrap();

    assert_eq!(daily.skip(&mut state).unwrap(), 1);
    let answer = expected_answer(&state);
    let result = daily.answer(&mut state, &answer).await.unwrap();
    assert!(matches!(result.outcome, AnswerOutcome::Advanced { next: 0, .. }));
}

// ─── Preferences ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn preference_change_rebuilds_the_program() {
    let repo = InMemoryRepository::new();
    let user = UserId::generate();
    let daily = service(clock_on(1), &repo);
    let mut state = daily.open(user).await.unwrap();
    let answer = expected_answer(&state);
    daily.answer(&mut state, &answer).await.unwrap();

    let changed = daily
        .change_difficulty_preference(&mut state, Some(DifficultyBand::Medium))
        .await
        .unwrap();
    assert!(changed);
    assert_eq!(state.source(), ProgramSource::PreferencesChanged);
    assert!(state.completion().is_empty());
    assert_eq!(state.program().phrase_items().count(), 6);
    assert!(state
        .program()
        .phrase_items()
        .all(|p| p.difficulty == Difficulty::Medium));
    // Grammar still follows the level band.
    assert_eq!(state.program().grammar_count(), 2);

    let unchanged = daily
        .change_difficulty_preference(&mut state, Some(DifficultyBand::Medium))
        .await
        .unwrap();
    assert!(!unchanged);

    let stored = repo.get_profile(user).await.unwrap().unwrap();
    assert_eq!(stored.difficulty_preference(), Some(DifficultyBand::Medium));
}

#[tokio::test]
async fn toggling_categories_rebuilds_the_program() {
    let repo = InMemoryRepository::new();
    let daily = service(clock_on(1), &repo);
    let mut state = daily.open(UserId::generate()).await.unwrap();
    let food: CategoryId = "food".parse().unwrap();

    let enabled = daily.toggle_category(&mut state, &food).await.unwrap();
    assert!(!enabled);
    assert!(state
        .program()
        .phrase_items()
        .all(|p| p.category_id.as_str() == "greetings"));

    let greetings: CategoryId = "greetings".parse().unwrap();
    let err = daily.toggle_category(&mut state, &greetings).await.unwrap_err();
    assert!(matches!(err, DailyServiceError::Profile(_)));
}

// ─── Failure handling ──────────────────────────────────────────────────────────

#[tokio::test]
async fn broken_local_store_does_not_stop_play() {
    let repo = InMemoryRepository::new();
    let daily = service_with(
        clock_on(1),
        Arc::new(BrokenLocalStore),
        Arc::new(repo.clone()),
        DailyConfig::default(),
    );
    let mut state = daily.open(UserId::generate()).await.unwrap();
    assert_eq!(state.program().len(), 10);

    let answer = expected_answer(&state);
    let result = daily.answer(&mut state, &answer).await.unwrap();
    assert!(result.reward.is_some());
    assert_eq!(state.progress().completed, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_local_store_times_out() {
    let repo = InMemoryRepository::new();
    let config = DailyConfig::default().with_write_timeout(Duration::from_millis(100));
    let daily = service_with(
        clock_on(1),
        Arc::new(SlowLocalStore(repo.clone())),
        Arc::new(repo.clone()),
        config,
    );

    let user = UserId::generate();
    let mut state = daily.open(user).await.unwrap();
    let answer = expected_answer(&state);
    daily.answer(&mut state, &answer).await.unwrap();

    assert_eq!(state.progress().completed, 1);
    // Nothing reached the store.
    assert_eq!(repo.get(&cache_key(user, "dailyProgram")).await.unwrap(), None);
}

#[tokio::test]
async fn account_store_failure_is_reported_after_state_update() {
    let profiles = Arc::new(ReadOnlyProfiles::default());
    let user = UserId::generate();
    profiles.0.save_profile(&UserProfile::new(user)).await.unwrap();

    let local = InMemoryRepository::new();
    let daily = service_with(
        clock_on(1),
        Arc::new(local),
        profiles.clone(),
        DailyConfig::default(),
    );
    let mut state = daily.open(user).await.unwrap();
    let answer = expected_answer(&state);

    let err = daily.answer(&mut state, &answer).await.unwrap_err();
    assert!(matches!(err, DailyServiceError::Storage(_)));
    assert_eq!(state.progress().completed, 1);
    assert_eq!(state.profile().total_points(), 10);
    assert!(daily.sync_profile(&state).await.is_err());
}
