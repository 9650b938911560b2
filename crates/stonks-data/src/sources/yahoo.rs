//! Yahoo Finance daily price source.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use stonks_core::error::{FetchError, StonksResult};
use stonks_core::traits::{DataSource, FetchOutcome};
use stonks_core::types::{DateIndexedTable, FieldKey, KeySet, SymbolIdentity};
use tracing::debug;

use super::{network_error, SourceSettings};
use crate::derived::{append_changes, base_key, change_key, with_base_keys};

/// Keys read straight from the provider's daily table.
pub const PRICE_KEYS: [&str; 7] = [
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Dividends",
    "Stock Splits",
];

/// Keys with a derived "Change" counterpart.
const CHANGE_BASES: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    events: Option<ChartEvents>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, Dividend>,
    #[serde(default)]
    splits: HashMap<String, Split>,
}

#[derive(Debug, Deserialize)]
struct Dividend {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct Split {
    date: i64,
    numerator: f64,
    denominator: f64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl QuoteColumns {
    fn column(&self, key: &str) -> Option<&[Option<f64>]> {
        match key {
            "Open" => Some(&self.open),
            "High" => Some(&self.high),
            "Low" => Some(&self.low),
            "Close" => Some(&self.close),
            "Volume" => Some(&self.volume),
            _ => None,
        }
    }
}

/// Daily OHLCV, dividends and splits from the Yahoo Finance chart API.
pub struct YahooFinanceSource {
    client: Client,
    base_url: String,
    keys: BTreeSet<FieldKey>,
}

impl YahooFinanceSource {
    pub const NAME: &'static str = "yahoo_finance";

    /// Create a source using the given settings.
    pub fn new(settings: &SourceSettings) -> StonksResult<Self> {
        Ok(Self {
            client: settings.http_client(false)?,
            base_url: settings.yahoo_base_url.trim_end_matches('/').to_string(),
            keys: Self::domain(),
        })
    }

    /// Every key this source supplies.
    pub fn domain() -> BTreeSet<FieldKey> {
        PRICE_KEYS
            .iter()
            .map(|k| k.to_string())
            .chain(CHANGE_BASES.iter().map(|k| change_key(k)))
            .collect()
    }

    /// Provider ticker: share classes are joined with a dash, `BRK.A` -> `BRK-A`.
    pub fn provider_ticker(identity: &SymbolIdentity) -> String {
        match &identity.extension {
            Some(ext) => format!("{}-{}", identity.symbol, ext),
            None => identity.symbol.clone(),
        }
    }

    async fn request_chart(
        &self,
        ticker: &str,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<String, FetchError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        // period2 is exclusive and compared against UTC open times
        let period1 = unix_midnight(first);
        let period2 = unix_midnight(last + Duration::days(2));

        debug!("Yahoo: {} {}..{}", ticker, first, last);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::SymbolNotFound(ticker.to_string()));
        }
        if !status.is_success() {
            if let Ok(ChartEnvelope { chart: Chart { error: Some(err), .. } }) =
                serde_json::from_str::<ChartEnvelope>(&body)
            {
                return Err(FetchError::Provider(format!("{}: {}", err.code, err.description)));
            }
            return Err(FetchError::Http {
                status: status.as_u16(),
                url,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl DataSource for YahooFinanceSource {
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

        // One extra leading day so the first change value has a predecessor
        let first = start - Duration::days(1);
        let ticker = Self::provider_ticker(identity);
        let body = self.request_chart(&ticker, first, end).await?;

        let mut table = parse_chart(&body, &with_base_keys(&wanted), first, end)?;
        let change_keys: KeySet = wanted
            .iter()
            .filter(|k| base_key(k).is_some())
            .cloned()
            .collect();
        append_changes(&mut table, &change_keys, start, end);

        debug!("Yahoo: {} returned {} rows for [{}]", ticker, table.len(), wanted);
        Ok(FetchOutcome::Table(table))
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn local_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

/// Parse a chart response into rows within `[first, last]`, keeping `columns`.
fn parse_chart(
    body: &str,
    columns: &KeySet,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<DateIndexedTable, FetchError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        return Err(FetchError::Provider(format!("{}: {}", err.code, err.description)));
    }
    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::Parse("chart response has no result".to_string()))?;

    let offset = result.meta.gmtoffset;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let price_keys: Vec<&str> = PRICE_KEYS
        .iter()
        .copied()
        .filter(|k| columns.contains(k))
        .collect();

    let mut table = DateIndexedTable::new();
    for key in &price_keys {
        table.add_column(*key);
    }

    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(date) = local_date(*ts, offset) else {
            continue;
        };
        if date < first || date > last {
            continue;
        }
        table.add_date(date);

        for key in &price_keys {
            match quote.column(key) {
                Some(values) => {
                    if let Some(Some(value)) = values.get(i) {
                        table.set(date, *key, *value);
                    }
                }
                // Event columns are zero unless an event lands on the day
                None => table.set(date, *key, 0.0),
            }
        }
    }

    let events = result.events.unwrap_or_default();
    if columns.contains("Dividends") {
        for dividend in events.dividends.values() {
            if let Some(date) = local_date(dividend.date, offset).filter(|d| table.contains_date(*d)) {
                table.set(date, "Dividends", dividend.amount);
            }
        }
    }
    if columns.contains("Stock Splits") {
        for split in events.splits.values() {
            if split.denominator == 0.0 {
                continue;
            }
            if let Some(date) = local_date(split.date, offset).filter(|d| table.contains_date(*d)) {
                table.set(date, "Stock Splits", split.numerator / split.denominator);
            }
        }
    }

    Ok(table)
}
