use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use facade_analyser::average_by_category;
use facade_api::{AreaEndpoints, DeviceCategory, QueryOrder, Sample};

use crate::services::{Historian, bounded};

/// Fetches the newest samples of `topic`, treating any failure as no data.
pub async fn fetch_series(
    historian: &dyn Historian,
    topic: &str,
    count: usize,
    timeout: Duration,
) -> Vec<Sample> {
    match bounded("query", timeout, historian.query(topic, count, QueryOrder::LastToFirst)).await {
        Ok(samples) => {
            if samples.is_empty() {
                tracing::info!("No data received for {}", topic);
            }
            samples
        }
        Err(e) => {
            tracing::error!("Failed to fetch data for {}: {}", topic, e);
            Vec::new()
        }
    }
}

/// Reduces the endpoints of an area to one scalar per category.
#[derive(Clone)]
pub struct InputAggregator {
    historian: Arc<dyn Historian>,
    sample_count: usize,
    timeout: Duration,
}

impl InputAggregator {
    pub fn new(historian: Arc<dyn Historian>, sample_count: usize, timeout: Duration) -> Self {
        Self {
            historian,
            sample_count,
            timeout,
        }
    }

    /// Recent series of every endpoint, grouped by category.
    pub async fn collect(&self, endpoints: &AreaEndpoints) -> BTreeMap<DeviceCategory, Vec<Vec<Sample>>> {
        let mut series = BTreeMap::new();

        for (category, topics) in endpoints.iter() {
            let mut category_series = Vec::with_capacity(topics.len());
            for topic in topics {
                category_series.push(
                    fetch_series(self.historian.as_ref(), topic, self.sample_count, self.timeout).await,
                );
            }
            series.insert(category, category_series);
        }

        series
    }

    pub async fn aggregate(&self, endpoints: &AreaEndpoints) -> BTreeMap<DeviceCategory, f64> {
        let series = self.collect(endpoints).await;
        tracing::debug!("Input data: {:?}", series);

        average_by_category(&series)
    }
}
