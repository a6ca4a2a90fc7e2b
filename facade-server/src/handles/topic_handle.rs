use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use facade_api::AnalysisHistoryEntry;
use time::OffsetDateTime;

use crate::services::{Historian, bounded, fetch_series};

/// Historian topics written by the analysis recorder start with this.
const ANALYSIS_TOPIC_ROOT: &str = "ofc_analysis";

#[derive(Clone)]
pub struct TopicState {
    pub historian: Arc<dyn Historian>,
    pub sample_count: usize,
    pub timeout: Duration,
}

pub fn topic_router(topic_state: TopicState) -> Router {
    Router::new()
        .route("/topics", get(get_topics))
        .route("/analysis", get(get_analysis_topics))
        .route("/analysis/*topic", get(get_analysis_history))
        .with_state(topic_state)
}

async fn topic_list(state: &TopicState) -> Vec<String> {
    match bounded("get_topic_list", state.timeout, state.historian.topic_list()).await {
        Ok(topics) => topics,
        Err(e) => {
            tracing::error!("Failed to list historian topics: {}", e);
            Vec::new()
        }
    }
}

/// Device topics, without the analysis output.
pub async fn get_topics(State(state): State<TopicState>) -> Json<Vec<String>> {
    let topics = topic_list(&state)
        .await
        .into_iter()
        .filter(|topic| !topic.starts_with(ANALYSIS_TOPIC_ROOT))
        .collect();

    Json(topics)
}

/// Analysis output prefixes, one per algorithm instance.
pub async fn get_analysis_topics(State(state): State<TopicState>) -> Json<Vec<String>> {
    let mut prefixes: Vec<String> = Vec::new();

    for topic in topic_list(&state).await {
        if !topic.starts_with(ANALYSIS_TOPIC_ROOT) {
            continue;
        }
        let prefix = match topic.rfind('/') {
            Some(index) => &topic[..index],
            None => topic.as_str(),
        };
        if !prefixes.iter().any(|known| known == prefix) {
            prefixes.push(prefix.to_string());
        }
    }

    Json(prefixes)
}

/// Action and reason history of an analysis prefix, oldest first.
pub async fn get_analysis_history(
    State(state): State<TopicState>,
    Path(topic): Path<String>,
) -> Json<Vec<AnalysisHistoryEntry>> {
    let topic = topic.trim_start_matches('/');
    let mut history: BTreeMap<OffsetDateTime, AnalysisHistoryEntry> = BTreeMap::new();

    let actions = fetch_series(
        state.historian.as_ref(),
        &format!("{topic}/action"),
        state.sample_count,
        state.timeout,
    )
    .await;
    let reasons = fetch_series(
        state.historian.as_ref(),
        &format!("{topic}/reason"),
        state.sample_count,
        state.timeout,
    )
    .await;

    for sample in actions {
        history
            .entry(sample.timestamp)
            .or_insert_with(|| AnalysisHistoryEntry {
                timestamp: sample.timestamp,
                action: None,
                reason: None,
            })
            .action = Some(sample.value);
    }
    for sample in reasons {
        history
            .entry(sample.timestamp)
            .or_insert_with(|| AnalysisHistoryEntry {
                timestamp: sample.timestamp,
                action: None,
                reason: None,
            })
            .reason = Some(sample.value);
    }

    Json(history.into_values().collect())
}
