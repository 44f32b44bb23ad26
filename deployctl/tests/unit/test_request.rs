//! Request building tests

use deployctl::errors::DeployError;
use deployctl::models::request::SnapshotMode;
use deployctl::request::RequestBuilder;
use deployctl::storage::job::{CreateSnapshotBlock, DeployBlock};
use deployctl::vars::EnvVars;
use tokio_test::{assert_err, assert_ok};

fn vars() -> EnvVars {
    [
        ("APP".to_string(), "shop".to_string()),
        ("BUILD".to_string(), "1.4.2".to_string()),
    ]
    .into_iter()
    .collect()
}

fn block() -> DeployBlock {
    DeployBlock {
        deploy_app: "$APP".to_string(),
        deploy_env: "prod".to_string(),
        deploy_proc: "Deploy All".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_component_versions_grouped_in_order() {
    let vars = vars();
    let request = RequestBuilder::new(&vars)
        .build(&DeployBlock {
            deploy_versions: "web:${BUILD}\n\ndb:7\nweb:1.4.1\n".to_string(),
            ..block()
        })
        .unwrap();

    assert_eq!(request.application(), "shop");
    assert!(request.snapshot().is_none());

    let versions: Vec<_> = request.component_versions().iter().collect();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].0, "web");
    assert_eq!(versions[0].1, ["1.4.2".to_string(), "1.4.1".to_string()]);
    assert_eq!(versions[1].0, "db");
}

#[test]
fn test_snapshot_reference() {
    let vars = vars();
    let request = assert_ok!(RequestBuilder::new(&vars).build(&DeployBlock {
        deploy_versions: "  snapshot=nightly-$BUILD\n".to_string(),
        ..block()
    }));

    assert_eq!(request.snapshot(), Some("nightly-1.4.2"));
    assert!(request.component_versions().is_empty());
}

#[test]
fn test_request_properties() {
    let vars = vars();
    let request = RequestBuilder::new(&vars)
        .build(&DeployBlock {
            deploy_req_props: "url=https://x?a=b\nmode=fast\nmode=safe".to_string(),
            ..block()
        })
        .unwrap();

    assert_eq!(request.properties().get("url").map(String::as_str), Some("https://x?a=b"));
    assert_eq!(request.properties().get("mode").map(String::as_str), Some("safe"));
}

#[test]
fn test_malformed_lines_rejected() {
    let vars = vars();
    let builder = RequestBuilder::new(&vars);

    let err = assert_err!(builder.build(&DeployBlock {
        deploy_versions: "web-1.0".to_string(),
        ..block()
    }));
    assert!(matches!(err, DeployError::ValidationError(_)));

    let err = builder
        .build(&DeployBlock {
            deploy_req_props: "novalue".to_string(),
            ..block()
        })
        .unwrap_err();
    assert!(err.to_string().contains("novalue"));
}

#[test]
fn test_missing_environment() {
    let vars = vars();
    let err = RequestBuilder::new(&vars)
        .build(&DeployBlock {
            deploy_env: "  ".to_string(),
            ..block()
        })
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Validation error: Deploy Environment is a required field for deployment."
    );
}

#[test]
fn test_eager_snapshot_request() {
    let vars = vars();
    let request = RequestBuilder::new(&vars)
        .build(&DeployBlock {
            deploy_versions: "web:$BUILD".to_string(),
            create_snapshot: Some(CreateSnapshotBlock {
                snapshot_name: "release-$BUILD".to_string(),
                deploy_with_snapshot: true,
                include_only_deploy_versions: false,
            }),
            ..block()
        })
        .unwrap();

    let spec = request.create_snapshot().unwrap();
    assert_eq!(spec.name, "release-1.4.2");
    assert_eq!(spec.mode(), SnapshotMode::Eager);
    assert_eq!(request.component_versions().len(), 1);
}
