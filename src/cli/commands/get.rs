//! Get command implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use stonks_config::AppConfig;
use stonks_core::types::{DateIndexedTable, KeySet, RequestSpec, SymbolIdentity};
use stonks_data::{JsonFileStore, SourceRegistry, TableStore};
use stonks_engine::Stonks;
use tracing::{info, warn};

use crate::cli::{GetArgs, OutputFormat};

pub async fn run(args: GetArgs, config: &AppConfig) -> Result<()> {
    let identity: SymbolIdentity = args
        .symbol
        .parse()
        .with_context(|| format!("Invalid symbol '{}'", args.symbol))?;

    let store = if args.no_cache {
        None
    } else {
        config
            .cache_path()
            .map(|path| Arc::new(JsonFileStore::new(path)) as Arc<dyn TableStore>)
    };

    let stonks = Stonks::from_registry(
        &SourceRegistry::builtin(),
        &config.sources,
        &config.plugin_selection(),
        store,
    )
    .context("Failed to build data sources")?;

    let request = RequestSpec::new(KeySet::from(args.keys), args.start, args.end, identity)?;
    let aggregation = stonks.aggregate(&request).await?;

    let failed = aggregation.report.failures().count();
    if failed > 0 {
        warn!("{} source(s) failed; the result may have gaps", failed);
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&aggregation.table.to_nested())?,
        OutputFormat::Csv => to_csv(&aggregation.table)?,
    };
    println!("{}", output);

    if let Some(save_path) = &args.save {
        std::fs::write(save_path, &output)
            .with_context(|| format!("Failed to write {}", save_path.display()))?;
        info!("Results saved to {:?}", save_path);
    }

    Ok(())
}

/// `Date,<keys...>` header, one row per date, empty fields for nulls.
fn to_csv(table: &DateIndexedTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Date".to_string()];
    header.extend(table.columns().iter().cloned());
    writer.write_record(&header)?;

    for date in table.dates() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(table.columns().iter().map(|key| {
            table
                .get(date, key)
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_to_csv() {
        let d = |day| NaiveDate::from_ymd_opt(2023, 1, day).unwrap();
        let mut table = DateIndexedTable::new();
        table.set(d(3), "Close", 101.5);
        table.set(d(4), "Open", 7.0);

        let csv = to_csv(&table).unwrap();

        assert_eq!(csv, "Date,Close,Open\n2023-01-03,101.5,\n2023-01-04,,7\n");
    }
}
