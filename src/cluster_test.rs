//! Tests for credential resolution and cluster queries

use super::*;
use std::io::Write;
use std::time::Duration;

/// Kubeconfig pointing at a port nothing listens on
const UNREACHABLE_KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: unreachable
  cluster:
    server: http://127.0.0.1:1
contexts:
- name: unreachable
  context:
    cluster: unreachable
    user: tester
current-context: unreachable
users:
- name: tester
  user: {}
"#;

fn write_kubeconfig(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config");
    let mut file = std::fs::File::create(&path).expect("create kubeconfig");
    file.write_all(contents.as_bytes())
        .expect("write kubeconfig");
    path
}

fn debug_config(kubeconfig: PathBuf) -> Config {
    Config {
        debug: true,
        kubeconfig: Some(kubeconfig),
        ..Config::default()
    }
}

/// Test that non-debug mode ignores any kubeconfig path
#[test]
fn test_non_debug_uses_in_cluster_credentials() {
    let config = Config {
        kubeconfig: Some(PathBuf::from("/ignored")),
        ..Config::default()
    };

    assert_eq!(
        CredentialSource::for_config(&config).unwrap(),
        CredentialSource::InCluster
    );
}

#[test]
fn test_debug_uses_explicit_kubeconfig() {
    let config = debug_config(PathBuf::from("/etc/kube/dev.yaml"));

    assert_eq!(
        CredentialSource::for_config(&config).unwrap(),
        CredentialSource::Kubeconfig(PathBuf::from("/etc/kube/dev.yaml"))
    );
}

#[test]
fn test_debug_defaults_to_home_kubeconfig() {
    let config = Config {
        debug: true,
        ..Config::default()
    };

    // HOME is normally set; without it resolution must fail cleanly
    match CredentialSource::for_config(&config) {
        Ok(CredentialSource::Kubeconfig(path)) => {
            assert!(path.ends_with(".kube/config"), "got {}", path.display());
        }
        Ok(other) => panic!("expected kubeconfig source, got {:?}", other),
        Err(e) => assert!(matches!(e, CredentialError::NoHomeDir)),
    }
}

/// Test that the default kubeconfig sits under the platform home directory
#[test]
fn test_default_kubeconfig_follows_home_dir() {
    match dirs::home_dir() {
        Some(home) => assert_eq!(
            default_kubeconfig_path().unwrap(),
            home.join(".kube").join("config")
        ),
        None => assert!(matches!(
            default_kubeconfig_path(),
            Err(CredentialError::NoHomeDir)
        )),
    }
}

/// Test that a missing kubeconfig is a credential error naming the path
#[tokio::test]
async fn test_missing_kubeconfig_is_credential_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = debug_config(dir.path().join("does-not-exist"));

    let err = new_client(&config).await.err().expect("should fail");

    assert!(
        matches!(
            err,
            ClusterError::Credential(CredentialError::Kubeconfig { .. })
        ),
        "unexpected error: {:?}",
        err
    );
    assert!(err.to_string().contains("does-not-exist"));
}

#[tokio::test]
async fn test_malformed_kubeconfig_is_credential_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(&dir, "clusters: [this is: not valid");

    let err = new_client(&debug_config(path)).await.err().expect("should fail");

    assert!(matches!(
        err,
        ClusterError::Credential(CredentialError::Kubeconfig { .. })
    ));
}

/// Test that client construction is lazy
#[tokio::test]
async fn test_valid_kubeconfig_builds_client_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(&dir, UNREACHABLE_KUBECONFIG);

    // The API server is unreachable, so success proves no call was made
    let result = new_client(&debug_config(path)).await;

    assert!(result.is_ok(), "client construction failed: {:?}", result.err());
}

/// Test that a transport failure surfaces as a query error
#[tokio::test]
async fn test_unreachable_api_server_is_query_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(&dir, UNREACHABLE_KUBECONFIG);
    let cluster = new_client(&debug_config(path)).await.unwrap();

    let err = tokio::time::timeout(Duration::from_secs(10), cluster.list_pods())
        .await
        .expect("query should fail fast")
        .expect_err("query should fail");

    assert!(matches!(err, ClusterError::Query { resource: "pods", .. }));
    assert!(err.to_string().starts_with("failed to list pods: "));
}

#[tokio::test]
async fn test_mock_cluster_returns_fixed_items() {
    let cluster = MockCluster::new(vec![Pod::default(), Pod::default()], vec![Node::default()]);

    assert_eq!(cluster.list_pods().await.unwrap().len(), 2);
    assert_eq!(cluster.list_nodes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_mock_cluster_failure_carries_message() {
    let cluster = MockCluster::failing("connection refused");

    let err = cluster.list_nodes().await.unwrap_err();

    assert!(err.to_string().contains("failed to list nodes"));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_mock_cluster_delay() {
    let cluster = MockCluster::new(Vec::new(), Vec::new()).with_delay(Duration::from_millis(50));

    let start = std::time::Instant::now();
    cluster.list_pods().await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(50));
}
