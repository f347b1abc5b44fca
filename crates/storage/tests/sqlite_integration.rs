use svenska_core::CalendarDay;
use svenska_core::model::{
    Badge, CategoryId, CompositeKey, DifficultyBand, UserId, UserProfile,
};
use storage::repository::{KeyValueStore, ProfileRepository, Storage};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_key_value_roundtrip() {
    let repo = connect("memdb_kv").await;

    assert_eq!(repo.get("dailyProgram").await.unwrap(), None);
    repo.set("dailyProgram", "[]").await.unwrap();
    repo.set("dailyProgram", "[1]").await.unwrap();
    assert_eq!(repo.get("dailyProgram").await.unwrap().as_deref(), Some("[1]"));

    repo.remove("dailyProgram").await.unwrap();
    assert_eq!(repo.get("dailyProgram").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.set("k", "v").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn sqlite_profile_roundtrip() {
    let repo = connect("memdb_profiles").await;

    let food = CategoryId::new("food").unwrap();
    let travel = CategoryId::new("travel").unwrap();
    let all = vec![food.clone(), travel.clone()];

    let mut profile = UserProfile::new(UserId::generate());
    profile.add_points(240, 3);
    profile.set_difficulty_preference(Some(DifficultyBand::EasyMedium));
    profile.toggle_category(&travel, &all).unwrap();
    profile.record_completed_phrase(CompositeKey::new(&food, 4));
    profile.record_completed_day(CalendarDay::from_ymd(2024, 1, 1).unwrap());
    profile.award_badge(Badge::FirstPhrase);

    repo.save_profile(&profile).await.unwrap();
    let fetched = repo.get_profile(profile.user_id()).await.unwrap();
    assert_eq!(fetched.as_ref(), Some(&profile));

    profile.add_points(10, 3);
    repo.save_profile(&profile).await.unwrap();
    let fetched = repo.get_profile(profile.user_id()).await.unwrap().unwrap();
    assert_eq!(fetched.total_points(), 250);

    assert_eq!(repo.get_profile(UserId::generate()).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_storage_wires_both_stores() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.local.set("dailyProgramDate", "2024-01-01").await.unwrap();
    let profile = UserProfile::new(UserId::generate());
    storage.profiles.save_profile(&profile).await.unwrap();

    assert_eq!(
        storage.local.get("dailyProgramDate").await.unwrap().as_deref(),
        Some("2024-01-01")
    );
    assert_eq!(
        storage.profiles.get_profile(profile.user_id()).await.unwrap(),
        Some(profile)
    );
}
