//! Retail search-interest series from the Google Trends widget API.
//!
//! The API is a two-step dance: an `explore` call issues a short-lived token
//! for the time-series widget, which is then redeemed against
//! `widgetdata/multiline` for the actual timeline.

use async_trait::async_trait;
use chrono::{Days, Utc};
use configuration::ProviderSettings;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::MarketDataError;
use crate::SearchInterestProvider;
use core_types::{SearchInterest, SearchTrend};

const TRENDS_BASE: &str = "https://trends.google.com/trends/api";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Number of trailing samples treated as "recent" when classifying a series.
const RECENT_WINDOW: usize = 3;

/// A `SearchInterestProvider` backed by the Google Trends widget API.
pub struct GoogleTrendsClient {
    client: reqwest::Client,
    base_url: String,
    cache: TtlCache<SearchInterest>,
}

impl GoogleTrendsClient {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build reqwest client"),
            base_url: TRENDS_BASE.to_string(),
            cache: TtlCache::new(Duration::from_secs(settings.history_cache_ttl_secs)),
        }
    }

    async fn get_text(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<String, MarketDataError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(MarketDataError::Api(format!(
                "Google Trends returned {status}: {text}"
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl SearchInterestProvider for GoogleTrendsClient {
    async fn search_interest(
        &self,
        keyword: &str,
        window_days: u32,
    ) -> Result<SearchInterest, MarketDataError> {
        let cache_key = format!("{keyword}:{window_days}");
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        let end = Utc::now().date_naive();
        let start = end - Days::new(u64::from(window_days));
        let time_range = format!("{} {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"));

        let explore_req = serde_json::json!({
            "comparisonItem": [{ "keyword": keyword, "geo": "", "time": time_range }],
            "category": 0,
            "property": "",
        })
        .to_string();
        let text = self
            .get_text(
                format!("{}/explore", self.base_url),
                &[("hl", "en-US"), ("tz", "0"), ("req", &explore_req)],
            )
            .await?;
        let explore: ExploreResponse = parse_guarded_json(&text)?;

        let widget = explore
            .widgets
            .into_iter()
            .find(|w| w.id == "TIMESERIES")
            .ok_or_else(|| {
                MarketDataError::InvalidData("explore response has no TIMESERIES widget".to_string())
            })?;

        let widget_req = widget.request.to_string();
        let text = self
            .get_text(
                format!("{}/widgetdata/multiline", self.base_url),
                &[
                    ("hl", "en-US"),
                    ("tz", "0"),
                    ("req", &widget_req),
                    ("token", &widget.token),
                ],
            )
            .await?;
        let multiline: MultilineResponse = parse_guarded_json(&text)?;

        let timeline: Vec<u32> = multiline
            .default
            .timeline_data
            .iter()
            .filter_map(|point| point.value.first().copied())
            .collect();

        let interest = classify_interest(&timeline);
        self.cache.insert(cache_key, interest.clone());
        Ok(interest)
    }
}

/// Summarizes a timeline: mean of the trailing samples, classified against
/// the mean of everything before them (ratio above 1.3 is spiking, below 0.7
/// cooling, otherwise flat).
pub fn classify_interest(timeline: &[u32]) -> SearchInterest {
    fn mean(values: &[u32]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
    }

    if timeline.len() <= RECENT_WINDOW {
        return SearchInterest {
            recent_average: mean(timeline),
            trend: SearchTrend::Flat,
            timeline: timeline.to_vec(),
        };
    }

    let (prior, recent) = timeline.split_at(timeline.len() - RECENT_WINDOW);
    let recent_average = mean(recent);
    let prior_average = mean(prior);

    let trend = if prior_average <= 0.0 {
        SearchTrend::Flat
    } else {
        let ratio = recent_average / prior_average;
        if ratio > 1.3 {
            SearchTrend::Spiking
        } else if ratio < 0.7 {
            SearchTrend::Cooling
        } else {
            SearchTrend::Flat
        }
    };

    SearchInterest {
        recent_average,
        trend,
        timeline: timeline.to_vec(),
    }
}

// The payload is prefixed with an anti-XSSI guard line before the JSON body.
fn parse_guarded_json<T: DeserializeOwned>(text: &str) -> Result<T, MarketDataError> {
    let start = text.find('{').ok_or_else(|| {
        MarketDataError::Deserialization("no JSON object in response".to_string())
    })?;
    serde_json::from_str(&text[start..]).map_err(|e| MarketDataError::Deserialization(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    #[serde(default)]
    id: String,
    #[serde(default)]
    token: String,
    request: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: MultilineDefault,
}

#[derive(Debug, Deserialize)]
struct MultilineDefault {
    #[serde(rename = "timelineData")]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    value: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surging_tail_classifies_as_spiking() {
        let mut timeline = vec![30; 27];
        timeline.extend([80, 90, 85]);
        let interest = classify_interest(&timeline);
        assert_eq!(interest.trend, SearchTrend::Spiking);
        assert!((interest.recent_average - 85.0).abs() < 1e-9);
    }

    #[test]
    fn collapsing_tail_classifies_as_cooling() {
        let mut timeline = vec![80; 27];
        timeline.extend([10, 5, 9]);
        let interest = classify_interest(&timeline);
        assert_eq!(interest.trend, SearchTrend::Cooling);
    }

    #[test]
    fn steady_series_is_flat() {
        let timeline = vec![50; 30];
        let interest = classify_interest(&timeline);
        assert_eq!(interest.trend, SearchTrend::Flat);
        assert_eq!(interest.recent_average, 50.0);
    }

    #[test]
    fn short_series_defaults_to_flat() {
        let interest = classify_interest(&[90, 95]);
        assert_eq!(interest.trend, SearchTrend::Flat);
        assert!((interest.recent_average - 92.5).abs() < 1e-9);
    }

    #[test]
    fn zero_baseline_never_divides() {
        let mut timeline = vec![0; 27];
        timeline.extend([40, 50, 60]);
        assert_eq!(classify_interest(&timeline).trend, SearchTrend::Flat);
    }

    #[test]
    fn guarded_json_prefix_is_stripped() {
        let text = ")]}'\n{\"widgets\":[]}";
        let parsed: ExploreResponse = parse_guarded_json(text).unwrap();
        assert!(parsed.widgets.is_empty());
    }
}
