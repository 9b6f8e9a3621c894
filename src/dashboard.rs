use log::{debug, info, warn};

use sales_metrics::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::time::Duration;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::dashboard::cache::FeedCache;
use crate::dashboard::config_reader::*;
use crate::dashboard::feed::FeedOutcome;

pub mod cache;
pub mod config_reader;
pub mod feed;
pub mod render;

#[derive(Debug, Snafu)]
pub enum DashError {
    #[snafu(display("Error fetching the feed from {url}"))]
    FetchFeed { source: ureq::Error, url: String },
    #[snafu(display("Error reading the feed body from {url}"))]
    ReadFeedBody { source: ureq::Error, url: String },
    #[snafu(display("Error reading the CSV header of the feed"))]
    CsvHeader { source: csv::Error },
    #[snafu(display("Error parsing a CSV line of the feed"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Could not resolve the required columns: {missing:?}"))]
    MissingColumns { missing: Vec<String> },
    #[snafu(display("No row with a parseable completion date survived"))]
    NoValidDates {},
    #[snafu(display("The feed contained no usable rows"))]
    EmptyFeed {},
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashError>;

pub fn run_dashboard(args: &Args) -> DashResult<()> {
    let config = load_config(args.config.as_deref())?;
    let tables = build_tables(&config)?;
    let url = args
        .source
        .clone()
        .or(config.source_url.clone())
        .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
    let ttl = Duration::from_secs(
        config
            .cache_ttl_seconds
            .unwrap_or(DEFAULT_CACHE_TTL_SECONDS),
    );

    let (records, outcome) = feed::fetch_and_normalize(&url, &tables, FeedCache::global(), ttl);
    match &outcome {
        FeedOutcome::Ok => {
            info!("Feed loaded cleanly: {} records", records.len());
        }
        FeedOutcome::Degraded { reason } => {
            println!("WARNING: the feed was loaded in degraded mode: {}", reason);
        }
        FeedOutcome::Fallback { reason } => {
            println!("WARNING: the feed is unusable: {}", reason);
            println!("Using the built-in sample dataset instead.");
        }
    }

    let view = args.view.as_deref().unwrap_or("monthly");
    let year = match args.year {
        Some(y) => y,
        None => latest_year(&records),
    };
    let months: Vec<Month> = if let Some(names) = &args.months {
        parse_months(names)?
    } else if view == "annual" {
        period_months(args.period.as_deref().unwrap_or("ano"))?
    } else {
        Month::ALL.to_vec()
    };
    let representatives: Vec<Representative> = match &args.reps {
        Some(names) => parse_representatives(names)?,
        None => Representative::ALL.to_vec(),
    };
    debug!(
        "run_dashboard: view {} year {} months {:?} representatives {:?}",
        view, year, months, representatives
    );

    let rows = aggregate(&records, year, &months, &representatives, &tables.quotas);

    match view {
        "intro" => render::render_intro(&records, &url, &outcome),
        "monthly" => render::render_monthly(&records, &rows, year, &months, &representatives),
        "annual" => render::render_annual(&rows, year, &months),
        "totals" => render::render_totals(&records),
        "help" => render::render_help(),
        x => whatever!("Unknown view: {:?} (expected intro, monthly, annual, totals or help)", x),
    }

    let summary_js = build_summary_js(&url, &outcome, year, &months, records.len(), &rows);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    if let Some(out) = &args.out {
        if out == "stdout" {
            println!("{}", pretty_js);
        } else {
            fs::write(out, &pretty_js).context(WritingSummarySnafu { path: out.clone() })?;
            info!("Summary written to {}", out);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference) = &args.reference {
        let summary_ref = read_summary(reference.clone())?;
        let pretty_js_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference summary");
            print_diff(pretty_js_ref.as_str(), pretty_js.as_str(), "\n");
            whatever!("Difference detected between the produced summary and the reference summary")
        }
    }

    Ok(())
}

/// The most recent year in the record set. The ingestion guarantees a
/// non-empty set, so the zero default is never seen in practice.
fn latest_year(records: &[CanonicalRecord]) -> i32 {
    records.iter().map(|r| r.year).max().unwrap_or(0)
}

fn parse_months(names: &[String]) -> DashResult<Vec<Month>> {
    let mut months: Vec<Month> = Vec::new();
    for name in names {
        match Month::parse(name) {
            Some(m) => months.push(m),
            None => whatever!("Unknown month name: {:?}", name),
        }
    }
    Ok(months)
}

fn parse_representatives(names: &[String]) -> DashResult<Vec<Representative>> {
    let mut reps: Vec<Representative> = Vec::new();
    for name in names {
        match Representative::parse(name) {
            Some(r) => reps.push(r),
            None => whatever!("Unknown representative name: {:?}", name),
        }
    }
    Ok(reps)
}

fn period_months(period: &str) -> DashResult<Vec<Month>> {
    match period {
        "ano" => Ok(Month::ALL.to_vec()),
        "sem1" => Ok(Month::FIRST_SEMESTER.to_vec()),
        "sem2" => Ok(Month::SECOND_SEMESTER.to_vec()),
        x => whatever!("Unknown period preset: {:?} (expected ano, sem1 or sem2)", x),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn outcome_to_json(outcome: &FeedOutcome) -> JSValue {
    match outcome {
        FeedOutcome::Ok => json!({ "status": "ok" }),
        FeedOutcome::Degraded { reason } => json!({ "status": "degraded", "reason": reason }),
        FeedOutcome::Fallback { reason } => json!({ "status": "fallback", "reason": reason }),
    }
}

fn build_summary_js(
    url: &str,
    outcome: &FeedOutcome,
    year: i32,
    months: &[Month],
    num_records: usize,
    rows: &[AggregateRow],
) -> JSValue {
    let totals = summarize(rows);
    let rows_js: Vec<JSValue> = rows
        .iter()
        .map(|r| {
            json!({
                "representative": r.representative.name(),
                "realized": r.realized,
                "quota": r.quota,
                "attainmentPct": round2(r.attainment_pct),
                "delta": r.delta,
            })
        })
        .collect();
    json!({
        "config": {
            "sourceUrl": url,
            "year": year,
            "months": months.iter().map(|m| m.name()).collect::<Vec<&str>>(),
        },
        "outcome": outcome_to_json(outcome),
        "records": num_records,
        "rows": rows_js,
        "totals": {
            "realized": totals.realized,
            "quota": totals.quota,
            "attainmentPct": round2(totals.attainment_pct),
            "delta": totals.delta,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn record(date: &str, representative: Representative) -> CanonicalRecord {
        let completed_on = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        CanonicalRecord {
            completed_on,
            year: completed_on.year(),
            month: Month::from_number(completed_on.month()).unwrap(),
            representative,
        }
    }

    #[test]
    fn month_filter_parsing() {
        let months = parse_months(&["Janeiro".to_string(), "february".to_string()]).unwrap();
        assert_eq!(months, vec![Month::Janeiro, Month::Fevereiro]);
        assert!(parse_months(&["Frimaire".to_string()]).is_err());
    }

    #[test]
    fn period_presets() {
        assert_eq!(period_months("ano").unwrap().len(), 12);
        assert_eq!(period_months("sem1").unwrap(), Month::FIRST_SEMESTER.to_vec());
        assert_eq!(period_months("sem2").unwrap(), Month::SECOND_SEMESTER.to_vec());
        assert!(period_months("trimester").is_err());
    }

    #[test]
    fn latest_year_picks_the_most_recent() {
        let records = vec![
            record("2024-03-01", Representative::Rafael),
            record("2025-01-01", Representative::Danilo),
            record("2023-12-31", Representative::Pamela),
        ];
        assert_eq!(latest_year(&records), 2025);
    }

    #[test]
    fn summary_json_shape() {
        let quotas = QuotaTable::default_table();
        let records = vec![
            record("2025-01-10", Representative::Rafael),
            record("2025-01-11", Representative::Rafael),
        ];
        let rows = aggregate(
            &records,
            2025,
            &[Month::Janeiro],
            &Representative::ALL,
            &quotas,
        );
        let js = build_summary_js(
            "https://example.com/feed.csv",
            &FeedOutcome::Ok,
            2025,
            &[Month::Janeiro],
            records.len(),
            &rows,
        );
        assert_eq!(js["records"], json!(2));
        assert_eq!(js["outcome"]["status"], json!("ok"));
        assert_eq!(js["config"]["year"], json!(2025));
        assert_eq!(js["rows"][0]["representative"], json!("Rafael"));
        assert_eq!(js["rows"][0]["quota"], json!(22));
        // 2 / 22 * 100, rounded to two decimals
        assert_eq!(js["rows"][0]["attainmentPct"], json!(9.09));
        assert_eq!(js["totals"]["delta"], json!(2 - 22));
    }
}
