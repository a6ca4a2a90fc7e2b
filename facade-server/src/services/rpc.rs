use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::RemoteError;

/// Waits at most `wait` for a remote call, turning expiry into a timeout error.
pub async fn bounded<T, F>(call: &str, wait: Duration, future: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    tokio::time::timeout(wait, future)
        .await
        .map_err(|_| RemoteError::Timeout(call.to_string()))?
}

/// Actuation entry point of an area controller.
#[async_trait]
pub trait AreaControl: Send + Sync {
    async fn do_control(
        &self,
        area: &str,
        light_level: f64,
        facade_state: f64,
    ) -> Result<(), RemoteError>;
}

/// Resolves agent identities to their exported control entry points.
#[derive(Clone, Default)]
pub struct RpcRouter {
    peers: Arc<RwLock<HashMap<String, Arc<dyn AreaControl>>>>,
}

impl RpcRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, identity: impl Into<String>, peer: Arc<dyn AreaControl>) {
        self.peers.write().await.insert(identity.into(), peer);
    }

    pub async fn unregister(&self, identity: &str) -> bool {
        self.peers.write().await.remove(identity).is_some()
    }

    pub async fn do_control(
        &self,
        identity: &str,
        area: &str,
        light_level: f64,
        facade_state: f64,
    ) -> Result<(), RemoteError> {
        let peer = self
            .peers
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| RemoteError::Unavailable(identity.to_string()))?;

        peer.do_control(area, light_level, facade_state).await
    }
}
