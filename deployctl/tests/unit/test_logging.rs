//! Log output of a deployment run

use std::io;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use deployctl::deploy::{DeploymentOrchestrator, OrchestratorOptions};
use deployctl::request::RequestBuilder;
use deployctl::storage::job::{CreateSnapshotBlock, DeployBlock};
use deployctl::storage::property_store::MemoryPropertyStore;
use deployctl::testing::ScriptedService;
use deployctl::vars::EnvVars;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

fn block() -> DeployBlock {
    DeployBlock {
        deploy_app: "shop".to_string(),
        deploy_env: "prod".to_string(),
        deploy_proc: "Deploy All".to_string(),
        deploy_versions: "web:v2".to_string(),
        deploy_desc: "nightly".to_string(),
        deploy_req_props: "region=eu\ntier=gold".to_string(),
        ..Default::default()
    }
}

async fn run(service: ScriptedService) -> usize {
    let request = RequestBuilder::new(&EnvVars::new()).build(&block()).unwrap();
    let orchestrator = DeploymentOrchestrator::new(
        Arc::new(service),
        Arc::new(MemoryPropertyStore::new()),
        OrchestratorOptions::default(),
    )
    .with_sleep_fn(|_| async {}.boxed());

    orchestrator
        .run(&request, &CancellationToken::new())
        .await
        .unwrap()
        .harvested
}

fn index_of(logs: &str, needle: &str) -> usize {
    logs.find(needle)
        .unwrap_or_else(|| panic!("missing {:?} in logs:\n{}", needle, logs))
}

#[tokio::test]
async fn test_parameters_logged_before_submission() {
    let (captured, _guard) = capture();
    let service = ScriptedService::new()
        .with_statuses(["SUCCEEDED"])
        .with_application("app-1", "shop");

    run(service).await;
    let logs = captured.text();

    let order = [
        "Application: shop",
        "Environment: prod",
        "Process: Deploy All",
        "Description: nightly",
        "Request properties: [region, tier]",
        "Skip wait: false",
        "Application process requested",
    ];
    let positions: Vec<usize> = order.iter().map(|needle| index_of(&logs, needle)).collect();
    assert!(
        positions.windows(2).all(|pair| pair[0] < pair[1]),
        "unexpected order {:?} in logs:\n{}",
        positions,
        logs
    );
}

#[tokio::test]
async fn test_harvest_failure_is_logged_not_raised() {
    let (captured, _guard) = capture();
    let service = ScriptedService::new()
        .with_statuses(["SUCCEEDED"])
        .failing_on("list_applications");

    assert_eq!(run(service).await, 0);
    let logs = captured.text();

    let start = index_of(&logs, "Starting application property fetching");
    let failed = index_of(&logs, "Application property fetching failed");
    let end = index_of(&logs, "End application property fetching");
    assert!(start < failed && failed < end, "logs:\n{}", logs);
    assert!(logs.contains("WARN"));
}

#[test]
fn test_build_warning_reaches_installed_subscriber() {
    let (captured, _guard) = capture();
    let block = DeployBlock {
        deploy_versions: "snapshot=nightly".to_string(),
        create_snapshot: Some(CreateSnapshotBlock {
            snapshot_name: "release-42".to_string(),
            deploy_with_snapshot: true,
            include_only_deploy_versions: false,
        }),
        ..block()
    };

    let request = RequestBuilder::new(&EnvVars::new()).build(&block).unwrap();

    assert!(request.snapshot().is_none());
    let logs = captured.text();
    assert!(logs.contains("WARN"), "logs:\n{}", logs);
    assert!(logs.contains("additional snapshots may not be specified"), "logs:\n{}", logs);
}
