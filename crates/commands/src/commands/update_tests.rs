//! Unit tests for the update command

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use serde_json::json;

use crate::commands::update::*;
use crate::test_helpers::*;
use glia_runtime::environment::Environment;
use glia_runtime::error::GliaError;
use glia_runtime::types::DeploymentTask;

fn select_current(fixture: &TestFixture) {
    let summary = serde_json::from_value(function_json("fn-1", "Greeter", None)).unwrap();
    fixture
        .store()
        .set_current_function(&summary, Utc::now())
        .unwrap();
}

fn expect_version(fixture: &mut TestFixture) {
    fixture
        .api
        .expect_create_version()
        .withf(|session, function_id, body| {
            session.environment == Environment::Beta
                && function_id == "fn-1"
                && body.code == "export default {}"
                && body.environment_variables.get("API_URL") == Some(&json!("https://x"))
        })
        .times(1)
        .returning(|_, _, _| Ok(json!({"self": "/functions/fn-1/tasks/t-1"})));
}

fn expect_polls(fixture: &mut TestFixture, tasks: Vec<serde_json::Value>) {
    let calls = Arc::new(AtomicU32::new(0));
    let count = tasks.len();
    fixture
        .api
        .expect_get_task()
        .times(count)
        .returning(move |_, _| {
            let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(DeploymentTask::from_value(tasks[n].clone()))
        });
}

fn args(fixture: &TestFixture) -> UpdateArgs {
    UpdateArgs {
        function_id: None,
        code: fixture.write_file("function.js", "export default {}"),
        env_file: fixture.write_file("env.json", r#"{"API_URL": "https://x"}"#),
        no_deploy: false,
        max_polls: None,
    }
}

#[tokio::test]
async fn test_update_polls_and_deploys_current_function() {
    let mut fixture = TestFixture::configured();
    select_current(&fixture);
    fixture.expect_login();
    expect_version(&mut fixture);
    expect_polls(
        &mut fixture,
        vec![
            json!({"status": "processing"}),
            json!({"status": "completed", "entity": {"id": "ver-5"}}),
        ],
    );
    fixture
        .async_runtime
        .expect_sleep()
        .withf(|d| *d == std::time::Duration::from_secs(5))
        .times(1)
        .returning(|_| ());
    fixture
        .api
        .expect_deploy_version()
        .withf(|_, function_id, version_id| function_id == "fn-1" && version_id == "ver-5")
        .times(1)
        .returning(|_, _, _| Ok(json!({"status": "deployed"})));
    let ui = fixture.ui.clone();
    let args = args(&fixture);
    let (deps, _dir) = fixture.to_deps();

    execute_with_deps(&deps, args).await.unwrap();

    assert!(ui.output_contains("Updating function Greeter"));
    assert!(ui.output_contains("version ver-5 deployed"));
    assert!(
        ui.get_spinner_messages()
            .iter()
            .any(|m| m.contains("Deploying version ver-5"))
    );
}

#[tokio::test]
async fn test_update_failed_task_does_not_deploy() {
    let mut fixture = TestFixture::configured();
    select_current(&fixture);
    fixture.expect_login();
    expect_version(&mut fixture);
    expect_polls(
        &mut fixture,
        vec![json!({"status": "failed", "error": "ReferenceError"})],
    );
    fixture.api.expect_deploy_version().times(0);
    let args = args(&fixture);
    let (deps, _dir) = fixture.to_deps();

    let err = execute_with_deps(&deps, args).await.unwrap_err();
    let glia = err.downcast_ref::<GliaError>().unwrap();
    assert!(matches!(glia, GliaError::TaskFailed { .. }));
    assert!(err.to_string().contains("ReferenceError"));
}

#[tokio::test]
async fn test_update_without_deploy() {
    let mut fixture = TestFixture::configured();
    select_current(&fixture);
    fixture.expect_login();
    expect_version(&mut fixture);
    expect_polls(
        &mut fixture,
        vec![json!({"status": "completed", "entity": {"id": "ver-8"}})],
    );
    fixture.api.expect_deploy_version().times(0);
    let ui = fixture.ui.clone();
    let mut args = args(&fixture);
    args.no_deploy = true;
    let (deps, _dir) = fixture.to_deps();

    execute_with_deps(&deps, args).await.unwrap();
    assert!(ui.output_contains("Version ver-8 built (not deployed)"));
}

#[tokio::test]
async fn test_update_requires_a_function() {
    let mut fixture = TestFixture::configured();
    fixture.authenticator.expect_authenticate().times(0);
    let args = args(&fixture);
    let (deps, _dir) = fixture.to_deps();

    let err = execute_with_deps(&deps, args).await.unwrap_err();
    assert!(err.to_string().contains("Function ID is required"));
}

#[tokio::test]
async fn test_update_rejects_non_object_env_file() {
    let mut fixture = TestFixture::configured();
    select_current(&fixture);
    fixture.authenticator.expect_authenticate().times(0);
    let mut args = args(&fixture);
    args.env_file = fixture.write_file("env.json", "[1, 2]");
    let (deps, _dir) = fixture.to_deps();

    let err = execute_with_deps(&deps, args).await.unwrap_err();
    assert!(err.to_string().contains("must contain a JSON object"));
}

#[tokio::test]
async fn test_update_cancelled_before_start() {
    let mut fixture = TestFixture::configured();
    select_current(&fixture);
    fixture.expect_login();
    fixture.api.expect_create_version().times(0);
    fixture.cancel.cancel();
    let ui = fixture.ui.clone();
    let args = args(&fixture);
    let (deps, _dir) = fixture.to_deps();

    let err = execute_with_deps(&deps, args).await.unwrap_err();
    assert!(err.downcast_ref::<GliaError>().unwrap().is_cancelled());
    assert!(ui.output_contains("Operation cancelled by user"));
}
