//! Orchestrator tests against the scripted deployment service

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use deployctl::deploy::fsm::RunState;
use deployctl::deploy::{DeploymentOrchestrator, OrchestratorOptions};
use deployctl::errors::DeployError;
use deployctl::models::request::DeploymentRequest;
use deployctl::models::status::DeploymentStatus;
use deployctl::request::RequestBuilder;
use deployctl::storage::job::{CreateProcessBlock, CreateSnapshotBlock, DeployBlock};
use deployctl::storage::property_store::{MemoryPropertyStore, PropertyStore};
use deployctl::testing::{Call, ScriptedService};
use deployctl::vars::EnvVars;

fn block() -> DeployBlock {
    DeployBlock {
        deploy_app: "shop".to_string(),
        deploy_env: "prod".to_string(),
        deploy_proc: "Deploy All".to_string(),
        deploy_versions: "web:v2".to_string(),
        ..Default::default()
    }
}

fn request(block: DeployBlock) -> DeploymentRequest {
    RequestBuilder::new(&EnvVars::new()).build(&block).unwrap()
}

fn snapshot_block(deploy_with_snapshot: bool) -> DeployBlock {
    DeployBlock {
        create_snapshot: Some(CreateSnapshotBlock {
            snapshot_name: "release-42".to_string(),
            deploy_with_snapshot,
            include_only_deploy_versions: false,
        }),
        ..block()
    }
}

fn orchestrator(
    service: ScriptedService,
    store: Arc<MemoryPropertyStore>,
) -> DeploymentOrchestrator<ScriptedService> {
    DeploymentOrchestrator::new(Arc::new(service), store, OrchestratorOptions::default())
        .with_sleep_fn(|_| async {}.boxed())
}

fn position(calls: &[Call], pred: impl Fn(&Call) -> bool) -> Option<usize> {
    calls.iter().position(pred)
}

#[tokio::test]
async fn test_successful_deploy() {
    let service = ScriptedService::new()
        .with_statuses(["NONE", "NONE", "SUCCEEDED"])
        .with_application("app-1", "shop")
        .with_property("DB_HOST", "db.internal", false)
        .with_property("DB_PASSWORD", "hunter2", true);
    let store = Arc::new(MemoryPropertyStore::new());
    let orchestrator = orchestrator(service, store.clone());

    let outcome = orchestrator
        .run(&request(block()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, Some(DeploymentStatus::Succeeded));
    assert_eq!(
        outcome.audit_url,
        format!(
            "https://deploy.test/#applicationProcessRequest/{}",
            ScriptedService::REQUEST_ID
        )
    );
    assert_eq!(outcome.harvested, 1);
    assert_eq!(
        outcome.states,
        vec![
            RunState::Init,
            RunState::Submitting,
            RunState::Polling,
            RunState::Finalizing,
            RunState::Done,
        ]
    );
    assert_eq!(orchestrator.service().status_queries(), 3);
    assert_eq!(store.get("DB_HOST").await.unwrap().as_deref(), Some("db.internal"));
}

#[tokio::test]
async fn test_faulted_stops_polling() {
    let service = ScriptedService::new()
        .with_statuses(["NONE", "FAULTED", "SUCCEEDED"])
        .with_application("app-1", "shop");
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let err = orchestrator
        .run(&request(block()), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::ProcessFailureError(_)));
    assert!(err
        .to_string()
        .contains("Deployment process failed with result FAULTED"));

    let service = orchestrator.service();
    assert_eq!(service.status_queries(), 2);
    assert!(!service.calls().contains(&Call::ListApplications));
}

#[tokio::test]
async fn test_skip_wait_never_queries_status() {
    let service = ScriptedService::new().with_application("app-1", "shop");
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let outcome = orchestrator
        .run(
            &request(DeployBlock {
                skip_wait: true,
                ..block()
            }),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(outcome.status.is_none());
    assert!(!outcome.states.contains(&RunState::Polling));
    assert_eq!(orchestrator.service().status_queries(), 0);
    assert_eq!(orchestrator.service().submissions(), 1);
}

#[tokio::test]
async fn test_duration_includes_submission() {
    let service = ScriptedService::new()
        .with_application("app-1", "shop")
        .with_submit_latency(Duration::from_millis(40));
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let outcome = orchestrator
        .run(
            &request(DeployBlock {
                skip_wait: true,
                ..block()
            }),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(outcome.duration >= Duration::from_millis(40), "{:?}", outcome.duration);
}

#[tokio::test]
async fn test_harvest_failure_keeps_success() {
    let service = ScriptedService::new()
        .with_statuses(["SUCCEEDED"])
        .failing_on("list_applications");
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let outcome = orchestrator
        .run(&request(block()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.harvested, 0);
    assert_eq!(outcome.states.last(), Some(&RunState::Done));
}

#[tokio::test]
async fn test_harvest_disabled() {
    let service = ScriptedService::new().with_statuses(["SUCCEEDED"]);
    let orchestrator = DeploymentOrchestrator::new(
        Arc::new(service),
        Arc::new(MemoryPropertyStore::new()),
        OrchestratorOptions {
            harvest_properties: false,
            ..Default::default()
        },
    )
    .with_sleep_fn(|_| async {}.boxed());

    orchestrator
        .run(&request(block()), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!orchestrator.service().calls().contains(&Call::ListApplications));
}

#[tokio::test]
async fn test_eager_snapshot_is_deployed() {
    let service = ScriptedService::new()
        .with_statuses(["SUCCEEDED"])
        .with_snapshot_component("web", &[("ver-1", "v1")]);
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let outcome = orchestrator
        .run(&request(snapshot_block(true)), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.snapshot.as_deref(), Some("release-42"));
    assert_eq!(outcome.states[1], RunState::SnapshotPrep);

    let calls = orchestrator.service().calls();
    let removals: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, Call::RemoveVersion { .. }))
        .collect();
    let additions: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, Call::AddVersion { .. }))
        .collect();
    assert_eq!(
        removals,
        vec![&Call::RemoveVersion {
            component: "web".to_string(),
            version_id: "ver-1".to_string(),
        }]
    );
    assert_eq!(
        additions,
        vec![&Call::AddVersion {
            component: "web".to_string(),
            version: "v2".to_string(),
        }]
    );

    let removed_at = position(&calls, |c| matches!(c, Call::RemoveVersion { .. })).unwrap();
    let added_at = position(&calls, |c| matches!(c, Call::AddVersion { .. })).unwrap();
    let submitted_at = position(&calls, |c| matches!(c, Call::RequestProcess { .. })).unwrap();
    assert!(removed_at < added_at && added_at < submitted_at);

    // The desired versions travel with the snapshot
    assert!(calls.contains(&Call::RequestProcess {
        snapshot: Some("release-42".to_string()),
        versions: 1,
    }));
    assert!(calls.contains(&Call::UnfilledProperties {
        snapshot: Some("release-42".to_string()),
    }));
}

#[tokio::test]
async fn test_failed_snapshot_edit_blocks_submission() {
    let service = ScriptedService::new()
        .with_statuses(["SUCCEEDED"])
        .with_snapshot_component("web", &[("ver-1", "v1")])
        .failing_on("remove_version");
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let err = orchestrator
        .run(&request(snapshot_block(true)), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::CommunicationError(_)));
    assert_eq!(orchestrator.service().submissions(), 0);
}

#[tokio::test]
async fn test_reactive_snapshot_after_success() {
    let service = ScriptedService::new().with_statuses(["SUCCEEDED"]);
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let outcome = orchestrator
        .run(&request(snapshot_block(false)), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.snapshot.is_none());
    let calls = orchestrator.service().calls();
    let status_at = position(&calls, |c| matches!(c, Call::Status { .. })).unwrap();
    let snapshot_at = position(&calls, |c| {
        *c == Call::CreateEnvironmentSnapshot {
            name: "release-42".to_string(),
        }
    })
    .unwrap();
    assert!(status_at < snapshot_at);
    assert!(calls.contains(&Call::RequestProcess {
        snapshot: None,
        versions: 1,
    }));
}

#[tokio::test]
async fn test_reactive_snapshot_skipped_on_failure() {
    let service = ScriptedService::new().with_statuses(["FAILED TO START"]);
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    orchestrator
        .run(&request(snapshot_block(false)), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(!orchestrator
        .service()
        .calls()
        .iter()
        .any(|c| matches!(c, Call::CreateEnvironmentSnapshot { .. })));
}

#[tokio::test]
async fn test_reactive_snapshot_failure_is_fatal() {
    let service = ScriptedService::new()
        .with_statuses(["SUCCEEDED"])
        .failing_on("create_environment_snapshot");
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let err = orchestrator
        .run(&request(snapshot_block(false)), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::CommunicationError(_)));
    assert!(!orchestrator.service().calls().contains(&Call::ListApplications));
}

#[tokio::test]
async fn test_unfilled_properties_block_submission() {
    let service = ScriptedService::new()
        .with_statuses(["SUCCEEDED"])
        .with_missing_properties(&["approver", "ticket"]);
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let err = orchestrator
        .run(
            &request(DeployBlock {
                deploy_req_props: "ticket=CHG-1".to_string(),
                ..block()
            }),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::ValidationError(_)));
    assert!(err.to_string().contains("[approver]"));
    assert_eq!(orchestrator.service().submissions(), 0);
}

#[tokio::test]
async fn test_process_created_before_submission() {
    let service = ScriptedService::new().with_statuses(["SUCCEEDED"]);
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    orchestrator
        .run(
            &request(DeployBlock {
                create_process: Some(CreateProcessBlock {
                    process_component: "web".to_string(),
                    description: "generated".to_string(),
                }),
                ..block()
            }),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let calls = orchestrator.service().calls();
    assert_eq!(
        calls[0],
        Call::CreateProcess {
            process: "Deploy All".to_string()
        }
    );
}

#[tokio::test]
async fn test_process_creation_failure_is_fatal() {
    let service = ScriptedService::new()
        .with_statuses(["SUCCEEDED"])
        .failing_on("create_process");
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let err = orchestrator
        .run(
            &request(DeployBlock {
                create_process: Some(CreateProcessBlock::default()),
                ..block()
            }),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::CommunicationError(_)));
    assert_eq!(orchestrator.service().submissions(), 0);
}

#[tokio::test]
async fn test_status_query_failure_is_fatal() {
    let service = ScriptedService::new()
        .with_statuses(["NONE", "SUCCEEDED"])
        .failing_on("status");
    let orchestrator = orchestrator(service, Arc::new(MemoryPropertyStore::new()));

    let err = orchestrator
        .run(&request(block()), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::CommunicationError(_)));
    assert_eq!(orchestrator.service().status_queries(), 1);
}

#[tokio::test]
async fn test_cancel_interrupts_wait() {
    let service = ScriptedService::new().with_statuses(["NONE", "NONE", "SUCCEEDED"]);
    let cancel = CancellationToken::new();
    let sleeps = Arc::new(AtomicU32::new(0));

    let orchestrator = DeploymentOrchestrator::new(
        Arc::new(service),
        Arc::new(MemoryPropertyStore::new()),
        OrchestratorOptions::default(),
    )
    .with_sleep_fn({
        let cancel = cancel.clone();
        let sleeps = sleeps.clone();
        move |_| {
            sleeps.fetch_add(1, Ordering::SeqCst);
            cancel.cancel();
            futures::future::pending().boxed()
        }
    });

    let err = orchestrator
        .run(&request(block()), &cancel)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Process failure: Could not wait to check deployment result: wait interrupted"
    );
    assert_eq!(sleeps.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.service().status_queries(), 1);
    assert_eq!(orchestrator.service().submissions(), 1);
}
