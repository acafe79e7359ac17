//! Integration tests for the perfect-day pipeline.

mod helpers;

use std::sync::atomic::Ordering;

use chrono::NaiveDate;

use questhub_database::store::AchievementStore;
use questhub_entity::achievement::AchievementType;
use questhub_worker::{RunStatus, StageStatus};

use helpers::{TestApp, sorted};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
}

#[tokio::test]
async fn test_reaching_threshold_unlocks_once() {
    let app = TestApp::new();
    let three = app.create_achievement(AchievementType::PerfectDayCount, 3).await;
    app.create_achievement(AchievementType::PerfectDayCount, 5).await;
    let user_id = app.seed_user(AchievementType::PerfectDayCount, 2).await;
    app.store.inner.record_quest(user_id, day(10), true).await;
    app.store.inner.record_quest(user_id, day(10), true).await;

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stages.len(), 3);
    assert_eq!(app.metric(user_id).await.perfect_day_count, 3);
    assert_eq!(app.unlocked(user_id).await, vec![three.id]);
    assert_eq!(app.store.inner.notifications().await.len(), 1);
    assert_eq!(app.notifier.calls(), vec![vec![user_id]]);
    assert_eq!(report.fanned_out, 1);
}

#[tokio::test]
async fn test_incomplete_day_is_not_counted() {
    let app = TestApp::new();
    app.create_achievement(AchievementType::PerfectDayCount, 1).await;
    let user_id = app.seed_user(AchievementType::PerfectDayCount, 0).await;
    app.store.inner.record_quest(user_id, day(10), true).await;
    app.store.inner.record_quest(user_id, day(10), false).await;

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert!(report.is_completed());
    assert_eq!(app.metric(user_id).await.perfect_day_count, 0);
    assert!(app.unlocked(user_id).await.is_empty());
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_only_checked_date_counts() {
    let app = TestApp::new();
    let user_id = app.seed_user(AchievementType::PerfectDayCount, 0).await;
    app.store.inner.record_quest(user_id, day(9), true).await;
    app.store.inner.record_quest(user_id, day(11), true).await;

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert!(report.is_completed());
    assert_eq!(report.stages[0].read_count, 0);
    assert_eq!(app.metric(user_id).await.perfect_day_count, 0);
}

#[tokio::test]
async fn test_one_unlock_per_day_in_target_order() {
    let app = TestApp::new();
    let one = app.create_achievement(AchievementType::PerfectDayCount, 1).await;
    let two = app.create_achievement(AchievementType::PerfectDayCount, 2).await;
    let user_id = app.seed_user(AchievementType::PerfectDayCount, 0).await;
    app.store.inner.record_quest(user_id, day(10), true).await;
    app.store.inner.record_quest(user_id, day(11), true).await;

    assert!(app.batch.run_perfect_day_check(day(10)).await.is_completed());
    assert_eq!(app.unlocked(user_id).await, vec![one.id]);

    assert!(app.batch.run_perfect_day_check(day(11)).await.is_completed());
    assert_eq!(app.unlocked(user_id).await, vec![one.id, two.id]);
    assert_eq!(app.metric(user_id).await.perfect_day_count, 2);
    assert_eq!(app.notifier.calls().len(), 2);
}

#[tokio::test]
async fn test_user_without_metric_starts_from_zero() {
    let app = TestApp::new();
    let one = app.create_achievement(AchievementType::PerfectDayCount, 1).await;
    let user_id = questhub_core::types::UserId::new();
    app.store.inner.record_quest(user_id, day(10), true).await;

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert!(report.is_completed());
    assert_eq!(app.metric(user_id).await.perfect_day_count, 1);
    assert_eq!(app.unlocked(user_id).await, vec![one.id]);
}

#[tokio::test]
async fn test_inactive_achievement_is_skipped() {
    let app = TestApp::new();
    let mut retired = app.create_achievement(AchievementType::PerfectDayCount, 1).await;
    retired.inactivate();
    app.store.inner.update(&retired).await.unwrap();
    let user_id = app.seed_user(AchievementType::PerfectDayCount, 0).await;
    app.store.inner.record_quest(user_id, day(10), true).await;

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert!(report.is_completed());
    assert_eq!(app.metric(user_id).await.perfect_day_count, 1);
    assert!(app.unlocked(user_id).await.is_empty());
    assert_eq!(report.fanned_out, 0);
}

#[tokio::test]
async fn test_many_users_across_chunks() {
    let app = TestApp::new();
    app.create_achievement(AchievementType::PerfectDayCount, 1).await;
    let mut users = Vec::new();
    for _ in 0..7 {
        let user_id = app.seed_user(AchievementType::PerfectDayCount, 0).await;
        app.store.inner.record_quest(user_id, day(10), true).await;
        users.push(user_id);
    }

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert!(report.is_completed());
    for stage in &report.stages {
        assert_eq!(stage.read_count, 7, "stage {}", stage.stage);
        assert_eq!(stage.chunks, 4, "stage {}", stage.stage);
    }
    assert_eq!(app.store.inner.unlocks().await.len(), 7);
    assert_eq!(app.notifier.calls().len(), 1);
    assert_eq!(sorted(app.notifier.calls()[0].clone()), sorted(users));
}

#[tokio::test]
async fn test_no_perfect_days_completes_without_fan_out() {
    let app = TestApp::new();
    app.create_achievement(AchievementType::PerfectDayCount, 1).await;

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert!(report.stages.iter().all(|s| s.status == StageStatus::Completed));
    assert_eq!(report.fanned_out, 0);
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_read_failure_stops_before_increment() {
    let app = TestApp::new();
    app.create_achievement(AchievementType::PerfectDayCount, 1).await;
    let user_id = app.seed_user(AchievementType::PerfectDayCount, 0).await;
    app.store.inner.record_quest(user_id, day(10), true).await;
    app.store.fail_reads.store(true, Ordering::SeqCst);

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.stages.len(), 1);
    assert_eq!(app.metric(user_id).await.perfect_day_count, 0);
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_retried_save_increments_once() {
    let app = TestApp::new();
    let one = app.create_achievement(AchievementType::PerfectDayCount, 1).await;
    let user_id = app.seed_user(AchievementType::PerfectDayCount, 0).await;
    app.store.inner.record_quest(user_id, day(10), true).await;
    app.store.write_failures.store(1, Ordering::SeqCst);

    let report = app.batch.run_perfect_day_check(day(10)).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stages[1].persist_retries, 1);
    assert_eq!(app.metric(user_id).await.perfect_day_count, 1);
    assert_eq!(app.unlocked(user_id).await, vec![one.id]);
    assert_eq!(app.notifier.calls(), vec![vec![user_id]]);
}

#[tokio::test]
async fn test_increment_keeps_concurrent_counter_updates() {
    let app = TestApp::new();
    let user_id = app.seed_user(AchievementType::CompletionCount, 10).await;
    app.store.inner.record_quest(user_id, day(11), true).await;
    app.store.race_completions.store(true, Ordering::SeqCst);

    let report = app.batch.run_perfect_day_check(day(11)).await;

    assert_eq!(report.status, RunStatus::Completed);
    let metric = app.metric(user_id).await;
    assert_eq!(metric.perfect_day_count, 1);
    assert_eq!(metric.completion_count, 11);
}
