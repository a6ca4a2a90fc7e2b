use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use facade_api::{ConfigAction, ConfigEvent, ConfigPattern};
use serde_json::Value;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{RwLock, broadcast};

use crate::errors::StoreError;

const CHANNEL_CAPACITY: usize = 256;

type Documents = RwLock<BTreeMap<String, BTreeMap<String, Value>>>;

/// Named JSON documents per agent identity, with change notifications.
pub struct ConfigStore {
    documents: Arc<Documents>,
    sender: broadcast::Sender<ConfigEvent>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Builds a store from `<root>/<identity>/<name>.json` files.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut documents = BTreeMap::new();

        for entry in fs::read_dir(root.as_ref())? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let identity = entry.file_name().to_string_lossy().to_string();
            let mut configs = BTreeMap::new();
            Self::load_configs(&entry.path(), "", &mut configs)?;

            tracing::info!("Loaded {} configs for {}", configs.len(), identity);
            documents.insert(identity, configs);
        }

        Ok(Self {
            documents: Arc::new(RwLock::new(documents)),
            ..Self::new()
        })
    }

    fn load_configs(
        dir: &Path,
        prefix: &str,
        configs: &mut BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();

            if entry.file_type()?.is_dir() {
                Self::load_configs(&path, &format!("{prefix}{file_name}/"), configs)?;
                continue;
            }

            let Some(stem) = file_name.strip_suffix(".json") else {
                continue;
            };

            let contents = serde_json::from_str(&fs::read_to_string(&path)?).map_err(|source| {
                StoreError::InvalidDocument {
                    path: path.display().to_string(),
                    source,
                }
            })?;
            configs.insert(format!("{prefix}{stem}"), contents);
        }

        Ok(())
    }

    fn validate_name(name: &str) -> Result<(), StoreError> {
        let valid = !name.is_empty()
            && name
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

        if valid {
            Ok(())
        } else {
            Err(StoreError::InvalidName(name.to_string()))
        }
    }

    /// Stores a document and announces it as `NEW` or `UPDATE`.
    pub async fn store(
        &self,
        identity: &str,
        name: &str,
        contents: Value,
    ) -> Result<ConfigAction, StoreError> {
        Self::validate_name(name)?;

        let mut documents = self.documents.write().await;
        let previous = documents
            .entry(identity.to_string())
            .or_default()
            .insert(name.to_string(), contents.clone());

        let action = match previous {
            Some(_) => ConfigAction::Update,
            None => ConfigAction::New,
        };

        self.notify(ConfigEvent {
            identity: identity.to_string(),
            name: name.to_string(),
            action,
            contents,
        });

        Ok(action)
    }

    /// Removes a document and announces it as `DELETE`.
    pub async fn delete(&self, identity: &str, name: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let removed = documents
            .get_mut(identity)
            .and_then(|configs| configs.remove(name));

        if removed.is_none() {
            return Err(StoreError::ConfigNotFound {
                identity: identity.to_string(),
                name: name.to_string(),
            });
        }

        self.notify(ConfigEvent {
            identity: identity.to_string(),
            name: name.to_string(),
            action: ConfigAction::Delete,
            contents: Value::Null,
        });

        Ok(())
    }

    pub async fn get(&self, identity: &str, name: &str) -> Option<Value> {
        self.documents
            .read()
            .await
            .get(identity)
            .and_then(|configs| configs.get(name))
            .cloned()
    }

    pub async fn list(&self, identity: &str) -> Vec<String> {
        self.documents
            .read()
            .await
            .get(identity)
            .map(|configs| configs.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn notify(&self, event: ConfigEvent) {
        tracing::debug!("Config {} {}/{}", event.action, event.identity, event.name);

        let _ = self.sender.send(event);
    }

    /// Subscribes to the configs of `identity` whose names match one of
    /// `patterns`.
    ///
    /// Documents already stored are replayed first as `NEW` events.
    pub async fn subscribe(&self, identity: &str, patterns: &[&str]) -> ConfigSubscription {
        let patterns: Vec<ConfigPattern> = patterns.iter().map(|p| ConfigPattern::parse(p)).collect();

        let documents = self.documents.read().await;
        let receiver = self.sender.subscribe();

        let mut subscription = ConfigSubscription {
            identity: identity.to_string(),
            patterns,
            pending: VecDeque::new(),
            known: BTreeSet::new(),
            documents: self.documents.clone(),
            receiver,
        };
        subscription.pending = subscription.snapshot(&documents, ConfigAction::New);
        drop(documents);

        subscription
    }
}

/// Filtered stream of config events for one agent.
pub struct ConfigSubscription {
    identity: String,
    patterns: Vec<ConfigPattern>,
    pending: VecDeque<ConfigEvent>,
    known: BTreeSet<String>,
    documents: Arc<Documents>,
    receiver: broadcast::Receiver<ConfigEvent>,
}

impl ConfigSubscription {
    fn accepts(&self, event: &ConfigEvent) -> bool {
        event.identity == self.identity
            && self.patterns.iter().any(|pattern| pattern.matches(&event.name))
    }

    /// Current matching documents of this identity as `action` events.
    fn snapshot(
        &self,
        documents: &BTreeMap<String, BTreeMap<String, Value>>,
        action: ConfigAction,
    ) -> VecDeque<ConfigEvent> {
        documents
            .get(&self.identity)
            .into_iter()
            .flatten()
            .filter(|(name, _)| self.patterns.iter().any(|pattern| pattern.matches(name)))
            .map(|(name, contents)| ConfigEvent {
                identity: self.identity.clone(),
                name: name.clone(),
                action,
                contents: contents.clone(),
            })
            .collect()
    }

    /// Rebuilds the pending queue from the stored documents after the
    /// receiver fell behind: every matching document as `UPDATE`, and a
    /// `DELETE` for each delivered name that no longer exists.
    async fn resync(&mut self) {
        // Stores notify under the write lock, so nothing is sent while this is held.
        let store = self.documents.clone();
        let documents = store.read().await;

        loop {
            match self.receiver.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        let mut pending = self.snapshot(&documents, ConfigAction::Update);
        drop(documents);

        let current: BTreeSet<&str> = pending.iter().map(|event| event.name.as_str()).collect();
        let deleted: Vec<ConfigEvent> = self
            .known
            .iter()
            .filter(|name| !current.contains(name.as_str()))
            .map(|name| ConfigEvent {
                identity: self.identity.clone(),
                name: name.clone(),
                action: ConfigAction::Delete,
                contents: Value::Null,
            })
            .collect();
        pending.extend(deleted);

        self.pending = pending;
    }

    fn deliver(&mut self, event: ConfigEvent) -> ConfigEvent {
        match event.action {
            ConfigAction::Delete => {
                self.known.remove(&event.name);
            }
            ConfigAction::New | ConfigAction::Update => {
                self.known.insert(event.name.clone());
            }
        }
        event
    }

    /// Next matching event, or `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<ConfigEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(self.deliver(event));
            }

            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Some(self.deliver(event)),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "{} missed {} config events, resyncing from the store",
                        self.identity,
                        skipped
                    );
                    self.resync().await;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
