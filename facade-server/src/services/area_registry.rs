use std::collections::BTreeMap;
use std::sync::Arc;

use facade_api::{AreaConfig, AreaContents, ConfigAction};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::AreaError;

/// Areas known to a controller, keyed by area name.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct AreaRegistry {
    areas: Arc<RwLock<BTreeMap<String, AreaConfig>>>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one config event to the area `name`.
    pub async fn apply(&self, name: &str, action: ConfigAction, contents: &Value) -> Result<(), AreaError> {
        match action {
            ConfigAction::New | ConfigAction::Update => self.upsert(name, contents).await,
            ConfigAction::Delete => {
                self.remove(name).await;
                Ok(())
            }
        }
    }

    /// Validates the area document, then replaces the stored area.
    ///
    /// The previous entry is left untouched when validation fails.
    pub async fn upsert(&self, name: &str, contents: &Value) -> Result<(), AreaError> {
        let contents = AreaContents::deserialize(contents)?;
        let config = AreaConfig::try_from(&contents)?;

        tracing::debug!("Area {} has {} endpoints", name, config.endpoints.len());

        self.areas.write().await.insert(name.to_string(), config);

        Ok(())
    }

    /// Removes the area; absent areas are ignored.
    pub async fn remove(&self, name: &str) -> bool {
        self.areas.write().await.remove(name).is_some()
    }

    pub async fn get(&self, name: &str) -> Option<AreaConfig> {
        self.areas.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.areas.read().await.keys().cloned().collect()
    }

    pub async fn snapshot(&self) -> BTreeMap<String, AreaConfig> {
        self.areas.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use facade_api::DeviceCategory;
    use serde_json::json;

    use super::*;

    fn area(devices: Value) -> Value {
        json!({"Devices": devices, "Control Options": {"mode": "auto"}})
    }

    #[tokio::test]
    async fn test_new_and_update() {
        let registry = AreaRegistry::new();

        registry
            .apply("A", ConfigAction::New, &area(json!([{"Type": "Light", "VOLTTRON Endpoint": "L1"}])))
            .await
            .unwrap();
        registry
            .apply("A", ConfigAction::Update, &area(json!([{"Type": "Glare", "VOLTTRON Endpoint": "G1"}])))
            .await
            .unwrap();

        let config = registry.get("A").await.unwrap();
        assert!(config.endpoints.get(DeviceCategory::Light).is_empty());
        assert_eq!(config.endpoints.get(DeviceCategory::Glare), ["G1"]);
        assert_eq!(config.control_options, Some(json!({"mode": "auto"})));
    }

    #[tokio::test]
    async fn test_unknown_category_keeps_previous() {
        let registry = AreaRegistry::new();
        registry
            .upsert("A", &area(json!([{"Type": "Light", "VOLTTRON Endpoint": "L1"}])))
            .await
            .unwrap();
        let before = registry.snapshot().await;

        let result = registry
            .apply(
                "A",
                ConfigAction::Update,
                &area(json!([
                    {"Type": "Light", "VOLTTRON Endpoint": "L2"},
                    {"Type": "Thermostat", "VOLTTRON Endpoint": "T1"}
                ])),
            )
            .await;

        assert!(matches!(result, Err(AreaError::UnsupportedCategory(_))));
        assert_eq!(registry.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_malformed_document_is_rejected() {
        let registry = AreaRegistry::new();

        let result = registry.upsert("A", &json!({"Devices": "none"})).await;

        assert!(matches!(result, Err(AreaError::InvalidContents(_))));
        assert!(registry.get("A").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let registry = AreaRegistry::new();
        registry.upsert("A", &area(json!([]))).await.unwrap();

        registry.apply("B", ConfigAction::Delete, &Value::Null).await.unwrap();
        assert_eq!(registry.names().await, ["A"]);

        registry.apply("A", ConfigAction::Delete, &Value::Null).await.unwrap();
        registry.apply("A", ConfigAction::Delete, &Value::Null).await.unwrap();
        assert!(registry.names().await.is_empty());
    }
}
