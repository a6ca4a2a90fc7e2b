use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Owns a background agent task and its stop signal.
///
/// Dropping the handle also stops the agent.
pub struct AgentHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl AgentHandle {
    pub fn spawn<F, Fut>(agent: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();

        Self {
            stop: Some(stop_tx),
            task: tokio::spawn(agent(stop_rx)),
        }
    }

    /// Signals the agent and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        if let Err(e) = (&mut self.task).await {
            tracing::error!("Agent task failed: {}", e);
        }
    }
}
