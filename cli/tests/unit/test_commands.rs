//! End-to-end command tests against the scripted controller

mod common;

use std::fs;

use controller_api::{AppState, CrashInfo};

use paasctl::commands::logs::crash_logs;
use paasctl::commands::push::{push, PushRequest};
use paasctl::commands::start::{restart, start, stop};
use paasctl::commands::update::update;
use paasctl::commands::{CommandContext, CommandSettings, Outcome};
use paasctl::errors::CliError;
use paasctl::output::Reporter;
use paasctl::rollout::fsm::{AbortReason, RolloutPhase};
use paasctl::rollout::rollback::{FixedAnswer, RollbackPrompt};
use paasctl::utils::no_sleep;

use common::{app, reporter, FakeController, Reading, ResourceMode, UnreachablePrompt};

const KIB: usize = 1024;

struct Harness {
    scratch_root: tempfile::TempDir,
    settings: CommandSettings,
}

impl Harness {
    fn new() -> Self {
        let scratch_root = tempfile::tempdir().unwrap();
        let settings = CommandSettings {
            scratch_root: Some(scratch_root.path().to_path_buf()),
            ..Default::default()
        };
        Self {
            scratch_root,
            settings,
        }
    }

    fn context<'a>(
        &'a self,
        client: &'a FakeController,
        reporter: &'a Reporter,
        prompt: &'a dyn RollbackPrompt,
    ) -> CommandContext<'a> {
        CommandContext {
            client,
            reporter,
            settings: &self.settings,
            prompt,
            ticker: None,
            sleep_fn: no_sleep(),
        }
    }

    fn scratch_is_clean(&self) -> bool {
        fs::read_dir(self.scratch_root.path()).unwrap().next().is_none()
    }
}

/// Ten 500 KiB files with distinct contents
fn ten_file_app() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..10u8 {
        let rel = if i < 5 {
            format!("public/asset_{}.bin", i)
        } else {
            format!("lib/part_{}.bin", i)
        };
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let content: Vec<u8> = (0..500 * KIB).map(|n| (n % 251) as u8 ^ i).collect();
        fs::write(path, content).unwrap();
    }
    dir
}

fn small_app() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.ru"), b"run App").unwrap();
    fs::write(dir.path().join("app.rb"), b"class App; end").unwrap();
    dir
}

fn report(outcome: &Outcome) -> &paasctl::rollout::supervisor::RolloutReport {
    outcome.rollout().expect("command ran a rollout")
}

#[tokio::test]
async fn test_push_uploads_only_missing_files_and_reaches_running() {
    let src = ten_file_app();
    let known: Vec<String> = (0..5)
        .map(|i| format!("public/asset_{}.bin", i))
        .chain((5..8).map(|i| format!("lib/part_{}.bin", i)))
        .collect();
    let known: Vec<&str> = known.iter().map(String::as_str).collect();

    let client = FakeController::new()
        .with_known_files(src.path(), &known)
        .with_readings([Reading::running(4), Reading::running(7), Reading::running(10)])
        .readings_after_start();
    let harness = Harness::new();
    let (reporter, output) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let mut request = PushRequest::new("web", src.path());
    request.instances = 10;
    let outcome = push(&ctx, &request).await.unwrap();

    assert_eq!(outcome.exit_code(), 0);
    let report = report(&outcome);
    assert_eq!(report.phase, RolloutPhase::Healthy);
    assert_eq!(report.ticks, 3);
    assert!(output.contents().contains("Application 'web': RUNNING"));

    let state = client.state();
    assert_eq!(state.check_calls, 1);
    assert_eq!(state.created.len(), 1);
    assert_eq!(state.created[0].instances, 10);
    assert_eq!(state.created[0].state, AppState::Stopped);
    assert_eq!(state.updates, vec![("web".to_string(), Some(AppState::Started))]);

    assert_eq!(state.uploads.len(), 1);
    let upload = &state.uploads[0];
    assert_eq!(upload.app_name, "web");
    assert_eq!(upload.reused.len(), 8);
    assert_eq!(
        upload.entry_names(),
        vec!["lib/part_8.bin", "lib/part_9.bin"]
    );
    drop(state);

    assert!(harness.scratch_is_clean());
}

#[tokio::test]
async fn test_second_upload_of_unchanged_tree_sends_nothing() {
    let src = ten_file_app();
    let client = FakeController::new();
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let mut request = PushRequest::new("web", src.path());
    request.start_immediately = false;
    push(&ctx, &request).await.unwrap();
    update(&ctx, "web", src.path()).await.unwrap();

    let state = client.state();
    assert_eq!(state.uploads.len(), 2);
    assert_eq!(state.uploads[0].entry_names().len(), 10);
    assert!(state.uploads[0].reused.is_empty());
    assert!(state.uploads[1].entry_names().is_empty());
    assert_eq!(state.uploads[1].reused.len(), 10);
}

#[tokio::test]
async fn test_push_of_noise_only_tree_still_deploys() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("build.log"), b"...").unwrap();
    fs::write(src.path().join("notes.txt~"), b"...").unwrap();
    let client = FakeController::new()
        .with_readings([Reading::running(1)])
        .readings_after_start();
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let outcome = push(&ctx, &PushRequest::new("web", src.path())).await.unwrap();

    assert_eq!(report(&outcome).phase, RolloutPhase::Healthy);
    let state = client.state();
    assert_eq!(state.uploads.len(), 1);
    assert!(state.uploads[0].entry_names().is_empty());
}

#[tokio::test]
async fn test_push_existing_app_is_rejected() {
    let src = small_app();
    let client = FakeController::new().with_app(app("web", AppState::Stopped, 1));
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let result = push(&ctx, &PushRequest::new("web", src.path())).await;

    assert!(matches!(result, Err(CliError::AlreadyExists(_))));
    assert!(client.state().created.is_empty());
    assert!(client.state().uploads.is_empty());
}

#[tokio::test]
async fn test_push_requires_an_instance() {
    let src = small_app();
    let client = FakeController::new();
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let mut request = PushRequest::new("web", src.path());
    request.instances = 0;

    assert!(matches!(
        push(&ctx, &request).await,
        Err(CliError::ConfigError(_))
    ));
    assert_eq!(client.state().get_app_calls, 0);
}

#[tokio::test]
async fn test_push_packaging_failure_creates_nothing() {
    let missing = tempfile::tempdir().unwrap().path().join("nope");
    let client = FakeController::new();
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let result = push(&ctx, &PushRequest::new("web", &missing)).await;

    assert!(result.is_err());
    assert!(client.state().created.is_empty());
    assert!(harness.scratch_is_clean());
}

#[tokio::test]
async fn test_push_small_app_without_start() {
    let src = small_app();
    let client = FakeController::new().with_resources(ResourceMode::Panic);
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let mut request = PushRequest::new("web", src.path());
    request.start_immediately = false;
    let outcome = push(&ctx, &request).await.unwrap();

    assert!(matches!(outcome, Outcome::Uploaded { .. }));
    assert_eq!(outcome.exit_code(), 0);
    let state = client.state();
    assert!(state.updates.is_empty());
    assert!(state.uploads[0].reused.is_empty());
    assert_eq!(state.uploads[0].entry_names(), vec!["app.rb", "config.ru"]);
}

#[tokio::test]
async fn test_push_crash_offers_rollback() {
    let src = small_app();
    let client = FakeController::new()
        .with_readings([Reading::running(0)])
        .readings_after_start()
        .with_crashes_from_poll(1, vec![CrashInfo {
            instance_index: 0,
            since_ts: chrono::Utc::now().timestamp() + 3600,
        }]);
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let confirm = FixedAnswer(true);
    let ctx = harness.context(&client, &reporter, &confirm);

    let outcome = push(&ctx, &PushRequest::new("web", src.path())).await.unwrap();

    let report = report(&outcome);
    assert_eq!(report.phase, RolloutPhase::Crashed);
    assert!(report.rolled_back);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(client.state().deleted, vec!["web"]);
}

#[tokio::test]
async fn test_start_missing_app() {
    let client = FakeController::new();
    let harness = Harness::new();
    let (reporter, output) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let outcome = start(&ctx, "ghost").await.unwrap();

    let report = report(&outcome);
    assert_eq!(report.phase, RolloutPhase::Aborted);
    assert_eq!(report.abort_reason, Some(AbortReason::NotFound));
    assert_eq!(outcome.exit_code(), 1);
    assert!(output
        .contents()
        .contains("Application 'ghost' could not be found"));
}

#[tokio::test]
async fn test_start_already_started_app() {
    let client = FakeController::new().with_app(app("web", AppState::Started, 2));
    let harness = Harness::new();
    let (reporter, output) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let outcome = start(&ctx, "web").await.unwrap();

    assert_eq!(report(&outcome).abort_reason, Some(AbortReason::AlreadyStarted));
    assert_eq!(outcome.exit_code(), 0);
    assert!(client.state().updates.is_empty());
    assert!(output.contents().contains("already started"));
}

#[tokio::test]
async fn test_stop_is_a_no_op_when_stopped() {
    let client = FakeController::new().with_app(app("web", AppState::Stopped, 1));
    let harness = Harness::new();
    let (reporter, output) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let outcome = stop(&ctx, "web").await.unwrap();

    assert!(matches!(outcome, Outcome::Stopped { .. }));
    assert!(client.state().updates.is_empty());
    assert!(output.contents().contains("already stopped"));
}

#[tokio::test]
async fn test_restart_stops_then_supervises_start() {
    let client = FakeController::new()
        .with_app(app("web", AppState::Started, 2))
        .with_readings([Reading::running(1), Reading::running(2)])
        .readings_after_start();
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let outcome = restart(&ctx, "web").await.unwrap();

    assert_eq!(report(&outcome).phase, RolloutPhase::Healthy);
    assert_eq!(report(&outcome).ticks, 2);
    assert_eq!(
        client.state().updates,
        vec![
            ("web".to_string(), Some(AppState::Stopped)),
            ("web".to_string(), Some(AppState::Started)),
        ]
    );
}

#[tokio::test]
async fn test_update_restarts_a_running_app() {
    let src = small_app();
    let client = FakeController::new()
        .with_app(app("web", AppState::Started, 1))
        .with_readings([Reading::running(1)])
        .readings_after_start();
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let outcome = update(&ctx, "web", src.path()).await.unwrap();

    assert_eq!(report(&outcome).phase, RolloutPhase::Healthy);
    assert_eq!(client.state().uploads.len(), 1);
    assert_eq!(client.state().updates.len(), 2);
}

#[tokio::test]
async fn test_update_leaves_stopped_app_stopped() {
    let src = small_app();
    let client = FakeController::new().with_app(app("web", AppState::Stopped, 1));
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let outcome = update(&ctx, "web", src.path()).await.unwrap();

    assert!(matches!(outcome, Outcome::Uploaded { .. }));
    assert!(client.state().updates.is_empty());
}

#[tokio::test]
async fn test_update_missing_app() {
    let src = small_app();
    let client = FakeController::new();
    let harness = Harness::new();
    let (reporter, _) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    assert!(matches!(
        update(&ctx, "web", src.path()).await,
        Err(CliError::NotFound(_))
    ));
    assert!(client.state().uploads.is_empty());
}

#[tokio::test]
async fn test_crash_logs_command() {
    let client = FakeController::new()
        .with_app(app("web", AppState::Started, 2))
        .with_file("logs/err.log", 1, "boom")
        .with_file("app/logs/stderr.log", 1, "trace");
    let harness = Harness::new();
    let (reporter, output) = reporter();
    let ctx = harness.context(&client, &reporter, &UnreachablePrompt);

    let outcome = crash_logs(&ctx, "web", 1).await.unwrap();

    assert!(matches!(outcome, Outcome::Logs { shown: 2, .. }));
    let output = output.contents();
    assert!(output.contains("====> /logs/err.log (instance 1) <===="));
    assert!(output.contains("====> /app/logs/stderr.log (instance 1) <===="));
}

