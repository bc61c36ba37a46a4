// ABOUTME: Integration tests for configuration files rendered by init.
// ABOUTME: Every provider renders all layer files, and re-rendering is byte-stable.

mod support;

use caravan::commands::{self, InitArgs};
use caravan::provider::ProviderOptions;
use caravan::state::ProjectState;
use std::path::PathBuf;
use support::RecordingRunner;

fn rendered_files(state: &ProjectState) -> Vec<PathBuf> {
    let layout = state.layout();
    let mut files = vec![layout.baking.var_file.clone()];
    for paths in [
        &layout.infrastructure,
        &layout.platform,
        &layout.application_support,
    ] {
        files.push(paths.var_file.clone());
        files.push(paths.backend_file.clone().unwrap());
    }
    files
}

fn snapshot(state: &ProjectState) -> Vec<String> {
    rendered_files(state)
        .iter()
        .map(|path| std::fs::read_to_string(path).unwrap())
        .collect()
}

fn args_for(provider: &str) -> InitArgs {
    let (name, region, options) = match provider {
        "aws" => ("demo", "eu-west-1", ProviderOptions::default()),
        "gcp" => (
            "caravan-demo",
            "europe-west6",
            ProviderOptions {
                gcp_parent_project: Some("seed-project".to_string()),
                ..Default::default()
            },
        ),
        _ => (
            "caravan-demo",
            "westeurope",
            ProviderOptions {
                azure_resource_group: Some("caravan-rg".to_string()),
                azure_subscription_id: Some("sub-1".to_string()),
                azure_tenant_id: Some("tenant-1".to_string()),
                ..Default::default()
            },
        ),
    };
    InitArgs {
        options,
        ..InitArgs::new(name, provider, region).domain("example.com")
    }
}

#[tokio::test]
async fn every_provider_renders_all_layer_files() {
    for provider in ["aws", "gcp", "azure"] {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = support::context(dir.path(), RecordingRunner::new());

        let state = commands::init(&mut ctx, args_for(provider)).await.unwrap();

        for (path, content) in rendered_files(&state).iter().zip(snapshot(&state)) {
            assert!(!content.contains("{{"), "{provider}: {}", path.display());
            assert!(content.ends_with('\n'), "{provider}: {}", path.display());
        }
        let platform = std::fs::read_to_string(&state.layout().platform.var_file).unwrap();
        assert!(platform.contains("https://vault.example.com"), "{provider}");
    }
}

#[tokio::test]
async fn rerendering_is_byte_stable() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = support::context(dir.path(), RecordingRunner::new());

    let state = commands::init(&mut ctx, args_for("gcp")).await.unwrap();
    let first = snapshot(&state);

    // Nothing is checked out yet, so the branch may still change, and
    // the layer files do not depend on it.
    assert!(!state.layout().baking.checkout.join(".git").exists());
    let rerun = InitArgs {
        branch: Some("develop".to_string()),
        ..Default::default()
    };
    let state = commands::init(&mut ctx, rerun).await.unwrap();
    assert_eq!(state.branch, "develop");
    assert_eq!(snapshot(&state), first);
}

#[tokio::test]
async fn optional_gcp_ids_appear_once_given() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = support::context(dir.path(), RecordingRunner::new());

    let state = commands::init(&mut ctx, args_for("gcp")).await.unwrap();
    let infra = std::fs::read_to_string(&state.layout().infrastructure.var_file).unwrap();
    assert!(!infra.contains("billing_account_id"));

    let rerun = InitArgs {
        options: ProviderOptions {
            gcp_billing_account: Some("0000-AAAA".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let state = commands::init(&mut ctx, rerun).await.unwrap();
    let infra = std::fs::read_to_string(&state.layout().infrastructure.var_file).unwrap();
    assert!(infra.contains("0000-AAAA"));
    assert!(infra.contains(r#"parent_project_id      = "seed-project""#));
}
