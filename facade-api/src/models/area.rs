use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DeviceCategory, Sample, UnsupportedCategory};

/// Ordered endpoint lists for every device category of an area.
///
/// Every category is always present; duplicates are kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaEndpoints {
    #[serde(rename = "Light")]
    pub light: Vec<String>,
    #[serde(rename = "Occupancy")]
    pub occupancy: Vec<String>,
    #[serde(rename = "Façade State")]
    pub facade_state: Vec<String>,
    #[serde(rename = "Glare")]
    pub glare: Vec<String>,
    #[serde(rename = "Illuminance")]
    pub illuminance: Vec<String>,
    #[serde(rename = "Solar Radiation")]
    pub solar_radiation: Vec<String>,
}

impl AreaEndpoints {
    pub fn get(&self, category: DeviceCategory) -> &[String] {
        match category {
            DeviceCategory::Light => &self.light,
            DeviceCategory::Occupancy => &self.occupancy,
            DeviceCategory::FacadeState => &self.facade_state,
            DeviceCategory::Glare => &self.glare,
            DeviceCategory::Illuminance => &self.illuminance,
            DeviceCategory::SolarRadiation => &self.solar_radiation,
        }
    }

    fn get_mut(&mut self, category: DeviceCategory) -> &mut Vec<String> {
        match category {
            DeviceCategory::Light => &mut self.light,
            DeviceCategory::Occupancy => &mut self.occupancy,
            DeviceCategory::FacadeState => &mut self.facade_state,
            DeviceCategory::Glare => &mut self.glare,
            DeviceCategory::Illuminance => &mut self.illuminance,
            DeviceCategory::SolarRadiation => &mut self.solar_radiation,
        }
    }

    pub fn push(&mut self, category: DeviceCategory, endpoint: impl Into<String>) {
        self.get_mut(category).push(endpoint.into());
    }

    /// Categories with their endpoints, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceCategory, &[String])> + '_ {
        DeviceCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, endpoints)| endpoints.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One entry of the `Devices` list of an area document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Declared device category, validated when the area is applied
    #[serde(rename = "Type")]
    pub device_type: String,
    /// Point address written to or read from
    #[serde(rename = "VOLTTRON Endpoint")]
    pub endpoint: String,
}

/// Area document as held by the config store under `areas/<name>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaContents {
    /// Devices installed in the area
    #[serde(rename = "Devices", default)]
    pub devices: Vec<DeviceEntry>,
    /// Free-form options handed to the control algorithm
    #[serde(rename = "Control Options", default, skip_serializing_if = "Option::is_none")]
    pub control_options: Option<Value>,
}

impl AreaContents {
    /// Sorts the devices into per-category endpoint lists.
    ///
    /// Fails on the first device whose type is not a known category.
    pub fn endpoints(&self) -> Result<AreaEndpoints, UnsupportedCategory> {
        let mut endpoints = AreaEndpoints::default();

        for device in &self.devices {
            let category = device.device_type.parse::<DeviceCategory>()?;
            endpoints.push(category, device.endpoint.clone());
        }

        Ok(endpoints)
    }
}

/// Area as held by the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Endpoints per category
    pub endpoints: AreaEndpoints,
    /// Options passed through to the control algorithm
    pub control_options: Option<Value>,
}

impl TryFrom<&AreaContents> for AreaConfig {
    type Error = UnsupportedCategory;

    fn try_from(contents: &AreaContents) -> Result<Self, Self::Error> {
        Ok(Self {
            endpoints: contents.endpoints()?,
            control_options: contents.control_options.clone(),
        })
    }
}

/// Historian samples of a single endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSummary {
    /// Endpoint identifier
    pub endpoint: String,
    /// Most recent samples, newest first
    pub values: Vec<Sample>,
}

/// Area configuration enriched with recent historian data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSummary {
    /// Endpoint samples per category
    pub endpoints: BTreeMap<DeviceCategory, Vec<EndpointSummary>>,
    /// Options passed through to the control algorithm
    pub control_options: Option<Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_endpoints_keep_order_and_duplicates() {
        let contents: AreaContents = serde_json::from_value(json!({
            "Devices": [
                {"Type": "Light", "VOLTTRON Endpoint": "devices/a/light/level"},
                {"Type": "Illuminance", "VOLTTRON Endpoint": "devices/a/lux"},
                {"Type": "Light", "VOLTTRON Endpoint": "devices/b/light/level"},
                {"Type": "Light", "VOLTTRON Endpoint": "devices/a/light/level"},
            ],
            "Control Options": {"mode": "auto"}
        }))
        .unwrap();

        let config = AreaConfig::try_from(&contents).unwrap();

        assert_eq!(
            config.endpoints.light,
            vec![
                "devices/a/light/level",
                "devices/b/light/level",
                "devices/a/light/level"
            ]
        );
        assert_eq!(config.endpoints.illuminance, vec!["devices/a/lux"]);
        assert!(config.endpoints.glare.is_empty());
        assert_eq!(config.control_options, Some(json!({"mode": "auto"})));
        assert_eq!(config.endpoints.len(), 4);
    }

    #[test]
    fn test_unknown_device_type() {
        let contents: AreaContents = serde_json::from_value(json!({
            "Devices": [
                {"Type": "Light", "VOLTTRON Endpoint": "l1"},
                {"Type": "Thermostat", "VOLTTRON Endpoint": "t1"},
            ]
        }))
        .unwrap();

        let err = contents.endpoints().unwrap_err();
        assert_eq!(err.0, "Thermostat");
    }

    #[test]
    fn test_endpoints_serialize_every_category() {
        let value = serde_json::to_value(AreaEndpoints::default()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 6);
        for category in DeviceCategory::ALL {
            assert_eq!(object[category.as_str()], json!([]));
        }
    }

    #[test]
    fn test_missing_categories_default_to_empty() {
        let endpoints: AreaEndpoints =
            serde_json::from_value(json!({"Illuminance": ["lux-1"]})).unwrap();

        assert_eq!(endpoints.get(DeviceCategory::Illuminance), ["lux-1"]);
        assert!(endpoints.get(DeviceCategory::Light).is_empty());
    }
}
