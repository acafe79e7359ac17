//! Integration tests for the direct achievement check pipeline.

mod helpers;

use std::sync::atomic::Ordering;

use questhub_core::types::UserId;
use questhub_entity::achievement::AchievementType;
use questhub_worker::context::keys;
use questhub_worker::{RunContext, RunStatus, StageStatus};

use helpers::{TestApp, sorted};

#[tokio::test]
async fn test_unlocks_every_user_at_or_past_target() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::CompletionCount, 10).await;
    let mut qualified = Vec::new();
    for value in [10, 11, 25, 10, 12] {
        qualified.push(app.seed_user(AchievementType::CompletionCount, value).await);
    }
    let below = app.seed_user(AchievementType::CompletionCount, 9).await;
    app.seed_user(AchievementType::RegistrationCount, 50).await;

    let report = app.batch.run_direct_check(achievement.id).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stages[0].read_count, 5);
    assert_eq!(report.stages[0].write_count, 5);
    assert_eq!(report.stages[0].chunks, 3);
    for user_id in &qualified {
        assert_eq!(app.unlocked(*user_id).await, vec![achievement.id]);
    }
    assert!(app.unlocked(below).await.is_empty());
    assert_eq!(app.store.inner.notifications().await.len(), 5);

    let calls = app.notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(sorted(calls[0].clone()), sorted(qualified));
    assert_eq!(report.fanned_out, 5);
}

#[tokio::test]
async fn test_lowest_locked_target_unlocks_first() {
    let app = TestApp::new();
    let first = app.create_achievement(AchievementType::RegistrationCount, 1).await;
    let second = app.create_achievement(AchievementType::RegistrationCount, 2).await;
    let user_id = app.seed_user(AchievementType::RegistrationCount, 1).await;

    let report = app.batch.run_direct_check(first.id).await;
    assert!(report.is_completed());
    assert_eq!(app.unlocked(user_id).await, vec![first.id]);

    let report = app.batch.run_direct_check(second.id).await;
    assert!(report.is_completed());
    assert_eq!(report.stages[0].read_count, 0);
    assert_eq!(app.unlocked(user_id).await, vec![first.id]);
    assert_eq!(app.notifier.calls().len(), 1);
}

#[tokio::test]
async fn test_rerun_unlocks_nothing_twice() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::UserLevel, 3).await;
    let user_id = app.seed_user(AchievementType::UserLevel, 4).await;

    assert!(app.batch.run_direct_check(achievement.id).await.is_completed());
    let report = app.batch.run_direct_check(achievement.id).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stages[0].filter_count, 1);
    assert_eq!(report.fanned_out, 0);
    assert_eq!(app.unlocked(user_id).await.len(), 1);
    assert_eq!(app.store.inner.notifications().await.len(), 1);
    assert_eq!(app.notifier.calls().len(), 1);
}

#[tokio::test]
async fn test_streak_achievement_uses_longest_streak() {
    let app = TestApp::new();
    let achievement = app
        .create_achievement(AchievementType::ContinuousCompletionDays, 7)
        .await;
    let user_id = app
        .seed_user(AchievementType::ContinuousCompletionDays, 7)
        .await;

    let report = app.batch.run_direct_check(achievement.id).await;

    assert!(report.is_completed());
    assert_eq!(app.unlocked(user_id).await, vec![achievement.id]);
}

#[tokio::test]
async fn test_no_matching_users_completes_without_fan_out() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::CompletionCount, 100).await;
    app.seed_user(AchievementType::CompletionCount, 99).await;

    let report = app.batch.run_direct_check(achievement.id).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stages[0].chunks, 0);
    assert_eq!(report.fanned_out, 0);
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_read_failure_fails_run_without_fan_out() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::CompletionCount, 1).await;
    app.seed_user(AchievementType::CompletionCount, 5).await;
    app.store.fail_reads.store(true, Ordering::SeqCst);

    let report = app.batch.run_direct_check(achievement.id).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.stages[0].status, StageStatus::Failed);
    assert!(report.error.as_deref().unwrap_or_default().contains("Read failed"));
    assert!(app.store.inner.unlocks().await.is_empty());
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_transient_lookup_failures_are_retried() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::CompletionCount, 2).await;
    let mut users = Vec::new();
    for value in [2, 3, 4] {
        users.push(app.seed_user(AchievementType::CompletionCount, value).await);
    }
    app.store.lookup_failures.store(2, Ordering::SeqCst);

    let report = app.batch.run_direct_check(achievement.id).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stages[0].transform_retries, 2);
    assert_eq!(app.store.inner.unlocks().await.len(), 3);
    assert_eq!(sorted(app.notifier.calls()[0].clone()), sorted(users));
}

#[tokio::test]
async fn test_transient_write_failure_is_retried() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::CompletionCount, 2).await;
    let mut users = Vec::new();
    for value in [2, 3, 4] {
        users.push(app.seed_user(AchievementType::CompletionCount, value).await);
    }
    app.store.write_failures.store(1, Ordering::SeqCst);

    let report = app.batch.run_direct_check(achievement.id).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stages[0].persist_retries, 1);
    assert_eq!(app.store.inner.unlocks().await.len(), 3);
    assert_eq!(app.store.inner.notifications().await.len(), 3);
    assert_eq!(sorted(app.notifier.calls()[0].clone()), sorted(users));
}

#[tokio::test]
async fn test_failed_chunk_contributes_nothing_to_run_list() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::CompletionCount, 1).await;
    for value in [1, 2, 3, 4] {
        app.seed_user(AchievementType::CompletionCount, value).await;
    }
    app.store.healthy_writes.store(1, Ordering::SeqCst);
    app.store.break_writes.store(true, Ordering::SeqCst);

    let mut ctx = RunContext::new();
    let report = app
        .batch
        .direct_check_pipeline(achievement.id)
        .run_with(&mut ctx)
        .await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.error.as_deref().unwrap_or_default().contains("Persist failed"));

    let committed = app.store.inner.unlocks().await;
    assert_eq!(committed.len(), 2);
    let notified: Vec<UserId> = ctx.get_run(keys::NOTIFIED_USER_IDS).unwrap().unwrap();
    assert_eq!(
        sorted(notified),
        sorted(committed.iter().map(|u| u.user_id).collect())
    );
    assert!(ctx.stage_is_empty());
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_concurrent_unlock_is_reported_as_duplicate() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::CompletionCount, 1).await;
    app.seed_user(AchievementType::CompletionCount, 1).await;
    app.store.race_unlocks.store(true, Ordering::SeqCst);

    let report = app.batch.run_direct_check(achievement.id).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.stages[0].persist_retries, 0);
    assert!(report.error.as_deref().unwrap_or_default().contains("Duplicate unlock"));
    assert_eq!(app.store.inner.unlocks().await.len(), 1);
    assert!(app.store.inner.notifications().await.is_empty());
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_push_failure_does_not_fail_run() {
    let app = TestApp::new();
    let achievement = app.create_achievement(AchievementType::CompletionCount, 1).await;
    app.seed_user(AchievementType::CompletionCount, 1).await;
    app.notifier.fail.store(true, Ordering::SeqCst);

    let report = app.batch.run_direct_check(achievement.id).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.fanned_out, 1);
    assert_eq!(app.notifier.calls().len(), 1);
}
