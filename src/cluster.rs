//! Kubernetes cluster access
//!
//! Resolves credentials once at startup and exposes the two read-only list
//! queries the badge handlers need. Building a client never touches the
//! network; the first request to the API server happens on the first query.
//!
//! Credential sources:
//! - debug mode: kubeconfig file (`APP_KUBECONFIG`, else `~/.kube/config`)
//! - otherwise: in-cluster service account token and CA

use crate::config::Config;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, ListParams};
use kube::config::{InClusterError, KubeConfigOptions, Kubeconfig, KubeconfigError};
use kube::Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Credential material could not be read or parsed
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to load kubeconfig {path}: {source}")]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: KubeconfigError,
    },

    #[error("failed to load in-cluster credentials: {0}")]
    InCluster(#[from] InClusterError),

    #[error("cannot locate home directory for the default kubeconfig")]
    NoHomeDir,
}

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("failed to build Kubernetes client: {0}")]
    Connection(#[source] kube::Error),

    #[error("failed to list {resource}: {source}")]
    Query {
        resource: &'static str,
        #[source]
        source: kube::Error,
    },
}

/// Where cluster credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Kubeconfig(PathBuf),
    InCluster,
}

impl CredentialSource {
    /// Pick the credential source for a configuration
    pub fn for_config(config: &Config) -> Result<Self, CredentialError> {
        if !config.debug {
            return Ok(CredentialSource::InCluster);
        }

        match &config.kubeconfig {
            Some(path) => Ok(CredentialSource::Kubeconfig(path.clone())),
            None => default_kubeconfig_path().map(CredentialSource::Kubeconfig),
        }
    }
}

/// `~/.kube/config` for the current user
pub fn default_kubeconfig_path() -> Result<PathBuf, CredentialError> {
    dirs::home_dir()
        .map(|home| home.join(".kube").join("config"))
        .ok_or(CredentialError::NoHomeDir)
}

/// Read-only view of cluster state used by the HTTP handlers
///
/// Production code uses `KubeCluster`. Tests use `MockCluster` to return fixed
/// records, errors, or slow responses without an API server.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// All pods across all namespaces
    async fn list_pods(&self) -> Result<Vec<Pod>, ClusterError>;

    /// All nodes
    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError>;
}

/// Cluster source backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterSource for KubeCluster {
    async fn list_pods(&self) -> Result<Vec<Pod>, ClusterError> {
        let pods = Api::<Pod>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(|source| ClusterError::Query {
                resource: "pods",
                source,
            })?;
        debug!(count = pods.items.len(), "Listed pods");
        Ok(pods.items)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError> {
        let nodes = Api::<Node>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(|source| ClusterError::Query {
                resource: "nodes",
                source,
            })?;
        debug!(count = nodes.items.len(), "Listed nodes");
        Ok(nodes.items)
    }
}

/// Build the cluster client for a configuration
///
/// Must be called from within a Tokio runtime.
pub async fn new_client(config: &Config) -> Result<KubeCluster, ClusterError> {
    let source = CredentialSource::for_config(config)?;
    let kube_config = match &source {
        CredentialSource::Kubeconfig(path) => kubeconfig_credentials(path).await?,
        CredentialSource::InCluster => kube::Config::incluster().map_err(CredentialError::from)?,
    };

    info!(
        source = ?source,
        cluster_url = %kube_config.cluster_url,
        "Resolved Kubernetes credentials"
    );

    let client = Client::try_from(kube_config).map_err(ClusterError::Connection)?;
    Ok(KubeCluster::new(client))
}

async fn kubeconfig_credentials(path: &Path) -> Result<kube::Config, CredentialError> {
    let to_error = |source: KubeconfigError| CredentialError::Kubeconfig {
        path: path.to_path_buf(),
        source,
    };

    let kubeconfig = Kubeconfig::read_from(path).map_err(to_error)?;
    kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(to_error)
}

/// Mock cluster for testing
#[cfg(test)]
pub struct MockCluster {
    pods: Vec<Pod>,
    nodes: Vec<Node>,
    failure: Option<String>,
    delay: Option<std::time::Duration>,
    panic: bool,
}

#[cfg(test)]
impl MockCluster {
    pub fn new(pods: Vec<Pod>, nodes: Vec<Node>) -> Self {
        Self {
            pods,
            nodes,
            failure: None,
            delay: None,
            panic: false,
        }
    }

    /// Every query fails with a transport-style error
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(Vec::new(), Vec::new())
        }
    }

    /// Every query panics
    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::new(Vec::new(), Vec::new())
        }
    }

    /// Sleep before answering each query
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn respond<T: Clone + Sync>(
        &self,
        resource: &'static str,
        items: &[T],
    ) -> Result<Vec<T>, ClusterError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic {
            panic!("mock cluster panicked listing {}", resource);
        }
        if let Some(message) = &self.failure {
            let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, message.clone());
            return Err(ClusterError::Query {
                resource,
                source: kube::Error::Service(Box::new(io)),
            });
        }
        Ok(items.to_vec())
    }
}

#[cfg(test)]
#[async_trait]
impl ClusterSource for MockCluster {
    async fn list_pods(&self) -> Result<Vec<Pod>, ClusterError> {
        self.respond("pods", &self.pods).await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError> {
        self.respond("nodes", &self.nodes).await
    }
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
