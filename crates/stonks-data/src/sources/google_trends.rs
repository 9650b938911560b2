//! Google Trends search-interest source.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use stonks_core::error::{FetchError, StonksResult};
use stonks_core::traits::{DataSource, FetchOutcome};
use stonks_core::types::{DateIndexedTable, FieldKey, KeySet, SymbolIdentity};
use tracing::debug;

use super::{network_error, SourceSettings};

pub const MONTHLY_INTEREST: &str = "Monthly Relative Interest";
pub const ANNUAL_INTEREST: &str = "Annual Relative Interest";
pub const MONTHLY_INTEREST_TO_SP: &str = "Monthly Relative Interest To S&P";
pub const ANNUAL_INTEREST_TO_SP: &str = "Annual Relative Interest To S&P";

/// Comparison keyword for the "To S&P" keys.
const SP_KEYWORD: &str = "S&P";

/// Which series a key reads and how its value is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrendSeries {
    window_days: i64,
    against_sp: bool,
}

impl TrendSeries {
    fn for_key(key: &str) -> Option<Self> {
        let (window_days, against_sp) = match key {
            MONTHLY_INTEREST => (30, false),
            ANNUAL_INTEREST => (365, false),
            MONTHLY_INTEREST_TO_SP => (30, true),
            ANNUAL_INTEREST_TO_SP => (365, true),
            _ => return None,
        };
        Some(Self {
            window_days,
            against_sp,
        })
    }

    /// Cell value from one point's per-keyword values.
    fn value(&self, values: &[f64]) -> Option<f64> {
        if self.against_sp {
            match values {
                [symbol, sp, ..] if *sp != 0.0 => Some(symbol / sp),
                _ => None,
            }
        } else {
            values.first().map(|v| v / 100.0)
        }
    }
}

/// One point of an interest-over-time series.
#[derive(Debug, Clone, PartialEq)]
struct TrendPoint {
    date: NaiveDate,
    values: Vec<f64>,
    is_partial: bool,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    time: String,
    #[serde(default)]
    value: Vec<f64>,
    #[serde(rename = "isPartial", default)]
    is_partial: bool,
}

/// Relative search interest from Google Trends.
pub struct GoogleTrendsSource {
    client: Client,
    base_url: String,
    geo: String,
    language: String,
    tz_offset: i32,
    keys: BTreeSet<FieldKey>,
}

impl GoogleTrendsSource {
    pub const NAME: &'static str = "google_trends";

    /// Create a source using the given settings.
    pub fn new(settings: &SourceSettings) -> StonksResult<Self> {
        Ok(Self {
            client: settings.http_client(true)?,
            base_url: settings.trends_base_url.trim_end_matches('/').to_string(),
            geo: settings.trends_geo.clone(),
            language: settings.trends_language.clone(),
            tz_offset: settings.trends_tz_offset,
            keys: Self::domain(),
        })
    }

    /// Every key this source supplies.
    pub fn domain() -> BTreeSet<FieldKey> {
        [
            MONTHLY_INTEREST,
            ANNUAL_INTEREST,
            MONTHLY_INTEREST_TO_SP,
            ANNUAL_INTEREST_TO_SP,
        ]
        .iter()
        .map(|k| k.to_string())
        .collect()
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().await.map_err(network_error)
    }

    /// Pick up the session cookie the API endpoints expect.
    async fn warm_up(&self) -> Result<(), FetchError> {
        let url = format!("{}/", self.base_url);
        self.get_text(&url, &[("geo", self.geo.clone())]).await?;
        Ok(())
    }

    async fn interest_over_time(
        &self,
        keywords: &[&str],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TrendPoint>, FetchError> {
        let timeframe = format!("{} {}", from, to);
        let comparison: Vec<Value> = keywords
            .iter()
            .map(|kw| json!({"keyword": kw, "time": timeframe, "geo": self.geo}))
            .collect();
        let explore_req = json!({"comparisonItem": comparison, "category": 0, "property": ""});

        let explore = self
            .get_text(
                &format!("{}/api/explore", self.base_url),
                &[
                    ("hl", self.language.clone()),
                    ("tz", self.tz_offset.to_string()),
                    ("req", explore_req.to_string()),
                ],
            )
            .await?;
        let (token, request) = timeseries_widget(&explore)?;

        let multiline = self
            .get_text(
                &format!("{}/api/widgetdata/multiline", self.base_url),
                &[
                    ("hl", self.language.clone()),
                    ("tz", self.tz_offset.to_string()),
                    ("req", request.to_string()),
                    ("token", token),
                ],
            )
            .await?;

        parse_timeline(&multiline)
    }
}

#[async_trait]
impl DataSource for GoogleTrendsSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn available_keys(&self) -> &BTreeSet<FieldKey> {
        &self.keys
    }

    async fn fetch(
        &self,
        keys: &KeySet,
        start: NaiveDate,
        end: NaiveDate,
        identity: &SymbolIdentity,
    ) -> Result<FetchOutcome, FetchError> {
        let wanted = self.applicable_keys(keys);
        if wanted.is_empty() {
            return Ok(FetchOutcome::NotApplicable);
        }

        self.warm_up().await?;

        let mut table = DateIndexedTable::new();
        for key in &wanted {
            let Some(series) = TrendSeries::for_key(key) else {
                continue;
            };
            table.add_column(key.clone());

            let keywords: Vec<&str> = if series.against_sp {
                vec![identity.symbol.as_str(), SP_KEYWORD]
            } else {
                vec![identity.symbol.as_str()]
            };

            for date in start.iter_days().take_while(|d| *d <= end) {
                let from = date - Duration::days(series.window_days);
                let points = self.interest_over_time(&keywords, from, date).await?;

                // Annual windows are weekly, so most dates have no point
                let value = points
                    .iter()
                    .find(|p| p.date == date && !p.is_partial)
                    .and_then(|p| series.value(&p.values));
                if let Some(value) = value {
                    table.set(date, key.clone(), value);
                }
            }
        }

        debug!(
            "Google Trends: {} returned {} rows for [{}]",
            identity.symbol,
            table.len(),
            wanted
        );
        Ok(FetchOutcome::Table(table))
    }
}

/// Drop the anti-hijacking prefix (`)]}'` and friends) before the JSON body.
fn strip_prefix(body: &str) -> &str {
    match body.find('{') {
        Some(idx) => &body[idx..],
        None => body,
    }
}

fn timeseries_widget(body: &str) -> Result<(String, Value), FetchError> {
    let explore: ExploreResponse = serde_json::from_str(strip_prefix(body))
        .map_err(|e| FetchError::Parse(format!("explore response: {}", e)))?;

    let widget = explore
        .widgets
        .into_iter()
        .find(|w| w.id == "TIMESERIES")
        .ok_or_else(|| FetchError::Provider("no TIMESERIES widget in explore response".to_string()))?;

    match (widget.token, widget.request) {
        (Some(token), Some(request)) => Ok((token, request)),
        _ => Err(FetchError::Parse("TIMESERIES widget lacks token or request".to_string())),
    }
}

fn parse_timeline(body: &str) -> Result<Vec<TrendPoint>, FetchError> {
    let response: MultilineResponse = serde_json::from_str(strip_prefix(body))
        .map_err(|e| FetchError::Parse(format!("timeline response: {}", e)))?;

    response
        .default
        .timeline_data
        .into_iter()
        .map(|point| {
            let secs: i64 = point
                .time
                .parse()
                .map_err(|_| FetchError::Parse(format!("bad timeline time '{}'", point.time)))?;
            let date = DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| FetchError::Parse(format!("timeline time out of range: {}", secs)))?;
            Ok(TrendPoint {
                date,
                values: point.value,
                is_partial: point.is_partial,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_server::serve;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, day).unwrap()
    }

    const EXPLORE: &str = ")]}'\n{\"widgets\": [{\"id\": \"GEO_MAP\"}, {\"id\": \"TIMESERIES\", \"token\": \"abc\", \"request\": {\"time\": \"2022-12-04 2023-01-03\"}}]}";

    // 2023-01-02 and 2023-01-03 at 00:00 UTC; the last point is partial
    const TIMELINE: &str = ")]}',\n{\"default\": {\"timelineData\": [
        {\"time\": \"1672617600\", \"value\": [40, 80]},
        {\"time\": \"1672704000\", \"value\": [50, 25], \"isPartial\": false},
        {\"time\": \"1672790400\", \"value\": [60, 30], \"isPartial\": true}
    ]}}";

    fn settings(base_url: &str) -> SourceSettings {
        SourceSettings {
            trends_base_url: base_url.to_string(),
            timeout_secs: 5,
            use_system_proxy: false,
            ..SourceSettings::default()
        }
    }

    #[test]
    fn test_series_values() {
        let monthly = TrendSeries::for_key(MONTHLY_INTEREST).unwrap();
        assert_eq!(monthly.value(&[50.0]), Some(0.5));

        let to_sp = TrendSeries::for_key(ANNUAL_INTEREST_TO_SP).unwrap();
        assert_eq!(to_sp.window_days, 365);
        assert_eq!(to_sp.value(&[50.0, 25.0]), Some(2.0));
        assert_eq!(to_sp.value(&[50.0, 0.0]), None);
        assert_eq!(to_sp.value(&[50.0]), None);

        assert!(TrendSeries::for_key("Close").is_none());
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix(")]}'\n{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_prefix("{}"), "{}");
    }

    #[test]
    fn test_timeseries_widget() {
        let (token, request) = timeseries_widget(EXPLORE).unwrap();
        assert_eq!(token, "abc");
        assert_eq!(request["time"], "2022-12-04 2023-01-03");

        let err = timeseries_widget("{\"widgets\": []}").unwrap_err();
        assert!(matches!(err, FetchError::Provider(_)));
    }

    #[test]
    fn test_parse_timeline() {
        let points = parse_timeline(TIMELINE).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].date, d(2));
        assert!(!points[0].is_partial);
        assert_eq!(points[1].values, vec![50.0, 25.0]);
        assert!(points[2].is_partial);
    }

    #[tokio::test]
    async fn test_out_of_domain_makes_no_request() {
        let source = GoogleTrendsSource::new(&settings("http://127.0.0.1:9")).unwrap();
        let ibm = SymbolIdentity::new("NYSE", "IBM", None);

        let outcome = source
            .fetch(&KeySet::from(["Open", "Close"]), d(3), d(3), &ibm)
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::NotApplicable);
    }

    #[tokio::test]
    async fn test_fetch_monthly_interest() {
        let base_url = serve(vec![
            (200, String::new()),
            (200, EXPLORE.to_string()),
            (200, TIMELINE.to_string()),
        ])
        .await;
        let source = GoogleTrendsSource::new(&settings(&base_url)).unwrap();
        let ibm = SymbolIdentity::new("NYSE", "IBM", None);

        let table = source
            .fetch(&KeySet::from(MONTHLY_INTEREST), d(3), d(3), &ibm)
            .await
            .unwrap()
            .into_table()
            .unwrap();

        assert_eq!(table.get(d(3), MONTHLY_INTEREST), Some(0.5));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_point_is_omitted() {
        let base_url = serve(vec![
            (200, String::new()),
            (200, EXPLORE.to_string()),
            (200, TIMELINE.to_string()),
        ])
        .await;
        let source = GoogleTrendsSource::new(&settings(&base_url)).unwrap();
        let ibm = SymbolIdentity::new("NYSE", "IBM", None);

        let table = source
            .fetch(&KeySet::from(MONTHLY_INTEREST_TO_SP), d(4), d(4), &ibm)
            .await
            .unwrap()
            .into_table()
            .unwrap();

        assert!(table.has_column(MONTHLY_INTEREST_TO_SP));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_warm_up_failure_is_reported() {
        let base_url = serve(vec![(429, String::new())]).await;
        let source = GoogleTrendsSource::new(&settings(&base_url)).unwrap();
        let ibm = SymbolIdentity::new("NYSE", "IBM", None);

        let err = source
            .fetch(&KeySet::from(ANNUAL_INTEREST), d(3), d(3), &ibm)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Http { status: 429, .. }));
    }
}
