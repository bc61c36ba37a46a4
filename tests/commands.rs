// ABOUTME: Integration tests for the init, up, clean and status commands.
// ABOUTME: Cloud CLIs and terraform are recorded; cluster services are wiremock stubs.

mod support;

use caravan::commands::{self, InitArgs};
use caravan::error::{Error, ErrorKind};
use caravan::lifecycle::MESH_TARGET;
use caravan::state::{ProjectState, RunLock, STATE_DIR, Status};
use support::RecordingRunner;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn demo_args() -> InitArgs {
    InitArgs::new("demo", "aws", "eu-south-1").domain("example.com")
}

/// A server answering every health gate and issuing a scheduler token.
async fn healthy_cluster() -> MockServer {
    let server = MockServer::start().await;
    for gate in ["/v1/sys/health", "/v1/status/leader", "/v1/connect/ca/roots"] {
        Mock::given(method("GET"))
            .and(path(gate))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/v1/nomad/creds/bootstrap"))
        .and(header("X-Vault-Token", "s.root"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"data": {"secret_id": "nomad-secret"}})),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn init_checks_out_renders_and_creates_state_store() {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context(dir.path(), runner.clone());

    let state = commands::init(&mut ctx, demo_args()).await.unwrap();
    assert_eq!(state.status, Status::InitDone);

    let clones = runner.calls_to("git");
    assert_eq!(clones.len(), 4);
    assert!(clones[1].has_arg("https://github.com/bitrockteam/caravan-infra-aws.git"));
    assert!(clones.iter().all(|c| c.has_arg("--depth") && c.has_arg("main")));

    let aws = runner.calls_to("aws");
    assert!(aws.iter().any(|c| c.has_arg("create-bucket")
        && c.has_arg("demo-caravan-terraform-state")
        && c.has_arg("LocationConstraint=eu-south-1")));
    assert!(aws.iter().any(|c| c.has_arg("put-bucket-versioning")));
    assert!(aws.iter().any(|c| c.has_arg("create-table")
        && c.has_arg("demo-caravan-terraform-state-lock")));

    let layout = state.layout();
    assert!(layout.baking.var_file.is_file());
    let backend = std::fs::read_to_string(layout.infrastructure.backend_file.as_ref().unwrap())
        .unwrap();
    assert!(backend.contains("infrastructure/terraform/state"));
}

#[tokio::test]
async fn rerunning_init_makes_no_cloud_calls() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context(dir.path(), runner.clone());

    commands::init(&mut ctx, demo_args()).await.unwrap();
    runner.reset();

    let state = commands::init(&mut ctx, InitArgs::default()).await.unwrap();
    assert_eq!(state.status, Status::InitDone);
    assert_eq!(runner.count(), 0);
}

#[tokio::test]
async fn init_validates_before_touching_anything() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context(dir.path(), runner.clone());

    let args = InitArgs::new("demo", "aws", "mars-north-1").domain("example.com");
    let err = commands::init(&mut ctx, args).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(runner.count(), 0);
    assert!(!ProjectState::exists(dir.path()));
}

#[tokio::test]
async fn init_rejects_unknown_provider() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = support::context(dir.path(), RecordingRunner::new());

    let args = InitArgs::new("demo", "openstack", "r1").domain("example.com");
    let err = commands::init(&mut ctx, args).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownProvider);
}

#[tokio::test]
async fn existing_bucket_counts_as_created() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    runner.fail_when(
        "aws",
        "create-bucket",
        "An error occurred (BucketAlreadyOwnedByYou) when calling the CreateBucket operation",
    );
    let mut ctx = support::context(dir.path(), runner.clone());

    let state = commands::init(&mut ctx, demo_args()).await.unwrap();
    assert_eq!(state.status, Status::InitDone);
}

#[tokio::test]
async fn bake_initializes_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context(dir.path(), runner.clone());

    let state = commands::bake(&mut ctx, demo_args()).await.unwrap();

    assert_eq!(state.status, Status::BakingDone);
    assert_eq!(runner.calls_to("git").len(), 4);
    let terraform = runner.calls_to("terraform");
    assert_eq!(terraform.len(), 2);
    assert_eq!(terraform[1].dir.as_deref(), Some(state.layout().baking.dir.as_path()));
}

#[tokio::test]
async fn up_deploys_every_layer_and_is_rerunnable() {
    let server = healthy_cluster().await;
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context_with_endpoints(dir.path(), runner.clone(), &server.uri());

    let state = commands::init(&mut ctx, demo_args()).await.unwrap();
    support::write_root_token(&state, "s.root");
    runner.reset();

    let state = commands::up(&mut ctx, false).await.unwrap();
    assert_eq!(state.status, Status::ApplicationDeployDone);
    assert_eq!(state.vault_root_token.as_deref(), Some("s.root"));
    assert_eq!(state.nomad_token.as_deref(), Some("nomad-secret"));

    assert_eq!(
        runner.terraform_subcommands(),
        vec!["init", "apply", "init", "apply", "apply", "init", "apply"]
    );
    let terraform = runner.calls_to("terraform");
    assert!(terraform[4].has_arg(&format!("-target={MESH_TARGET}")));
    assert_eq!(terraform[6].env["NOMAD_TOKEN"], "nomad-secret");

    runner.reset();
    let again = commands::up(&mut ctx, false).await.unwrap();
    assert_eq!(again.status, Status::ApplicationDeployDone);
    assert_eq!(runner.count(), 0);
}

#[tokio::test]
async fn up_requires_init() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = support::context(dir.path(), RecordingRunner::new());

    let err = commands::up(&mut ctx, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("run init first"));
}

#[tokio::test]
async fn unhealthy_gate_stops_up_at_check_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context_with_endpoints(dir.path(), runner.clone(), &server.uri());
    commands::init(&mut ctx, demo_args()).await.unwrap();

    let err = commands::up(&mut ctx, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().contains("vault"));

    let state = ProjectState::load_from_storage(dir.path()).unwrap();
    assert_eq!(state.status, Status::InfraCheckRunning);
    assert!(state.vault_root_token.is_none());
}

#[tokio::test]
async fn clean_without_project_is_already_clean() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context(dir.path(), runner.clone());

    commands::clean(&mut ctx, false, false).await.unwrap();

    assert_eq!(runner.count(), 0);
    assert!(!dir.path().join(STATE_DIR).exists());
}

#[tokio::test]
async fn clean_leaves_a_non_empty_state_dir_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = support::context(dir.path(), RecordingRunner::new());
    commands::init(&mut ctx, demo_args()).await.unwrap();
    let notes = dir.path().join(STATE_DIR).join("notes.txt");
    std::fs::write(&notes, "kept").unwrap();

    commands::clean(&mut ctx, false, false).await.unwrap();

    assert!(!ProjectState::exists(dir.path()));
    assert_eq!(std::fs::read_to_string(&notes).unwrap(), "kept");
}

#[tokio::test]
async fn clean_destroys_in_reverse_and_removes_everything() {
    let server = healthy_cluster().await;
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context_with_endpoints(dir.path(), runner.clone(), &server.uri());

    let state = commands::init(&mut ctx, demo_args()).await.unwrap();
    support::write_root_token(&state, "s.root");
    commands::up(&mut ctx, false).await.unwrap();
    runner.reset();

    commands::clean(&mut ctx, false, false).await.unwrap();

    let destroys: Vec<_> = runner
        .calls_to("terraform")
        .into_iter()
        .filter(|c| c.args[0] == "destroy")
        .map(|c| c.dir.unwrap())
        .collect();
    assert_eq!(
        destroys,
        vec![
            state.layout().application_support.dir.clone(),
            state.layout().platform.dir.clone(),
            state.layout().infrastructure.dir.clone(),
        ]
    );
    let aws = runner.calls_to("aws");
    assert!(aws.iter().any(|c| c.has_arg("delete-table")));
    assert!(aws.iter().any(|c| c.has_arg("rb") && c.has_arg("--force")));

    assert!(!ProjectState::exists(dir.path()));
    assert!(!state.layout().project_dir.exists());

    runner.reset();
    commands::clean(&mut ctx, false, false).await.unwrap();
    assert_eq!(runner.count(), 0);
}

#[tokio::test]
async fn clean_survives_failing_destroys() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context(dir.path(), runner.clone());
    commands::init(&mut ctx, demo_args()).await.unwrap();

    let mut state = ProjectState::load_from_storage(dir.path()).unwrap();
    state.advance(Status::PlatformDeployDone).unwrap();

    runner.fail_when("terraform", "destroy", "Error: timeout while waiting for state");
    commands::clean(&mut ctx, false, false).await.unwrap();
    assert!(!ProjectState::exists(dir.path()));
}

#[tokio::test]
async fn state_store_failure_keeps_state_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context(dir.path(), runner.clone());
    commands::init(&mut ctx, demo_args()).await.unwrap();

    runner.fail_when("aws", "delete-table", "AccessDeniedException: not authorized");
    let err = commands::clean(&mut ctx, false, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
    assert!(ProjectState::exists(dir.path()));

    commands::clean(&mut ctx, true, false).await.unwrap();
    assert!(!ProjectState::exists(dir.path()));
}

#[tokio::test]
async fn forced_clean_respects_a_live_lock() {
    let dir = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let mut ctx = support::context(dir.path(), runner.clone());
    commands::init(&mut ctx, demo_args()).await.unwrap();
    runner.reset();

    let held = RunLock::acquire(dir.path(), Some("demo"), false).unwrap();

    let err = commands::clean(&mut ctx, true, false).await.unwrap_err();
    assert!(matches!(err, Error::Locked { .. }), "{err}");
    assert_eq!(runner.count(), 0);
    assert!(ProjectState::exists(dir.path()));

    commands::clean(&mut ctx, true, true).await.unwrap();
    assert!(!ProjectState::exists(dir.path()));
    held.release().unwrap();
}

#[tokio::test]
async fn branch_cannot_change_under_existing_checkouts() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = support::context(dir.path(), RecordingRunner::new());
    let state = commands::init(&mut ctx, demo_args()).await.unwrap();
    std::fs::create_dir_all(state.layout().platform.checkout.join(".git")).unwrap();

    let rerun = InitArgs {
        branch: Some("develop".to_string()),
        ..Default::default()
    };
    let err = commands::init(&mut ctx, rerun).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("develop"));
    let reloaded = ProjectState::load_from_storage(dir.path()).unwrap();
    assert_eq!(reloaded.branch, "main");

    let same = InitArgs {
        branch: Some("main".to_string()),
        ..Default::default()
    };
    commands::init(&mut ctx, same).await.unwrap();
}

#[tokio::test]
async fn status_reports_versions_once_deployed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"version": "1.15.2"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/agent/self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"config": {"Version": {"Version": "1.6.3"}}}),
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    support::aws_project(dir.path(), Status::InfraDeployDone);
    let ctx = support::context_with_endpoints(dir.path(), RecordingRunner::new(), &server.uri());

    let report = commands::status(&ctx).await.unwrap().unwrap();
    assert_eq!(report.status, Status::InfraDeployDone);
    let versions = report.versions.unwrap();
    assert_eq!(versions.vault, "1.15.2");
    assert_eq!(versions.nomad, "1.6.3");
    assert_eq!(versions.unavailable(), vec!["consul"]);
}

#[tokio::test]
async fn status_without_project_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = support::context(dir.path(), RecordingRunner::new());
    assert!(commands::status(&ctx).await.unwrap().is_none());
}
