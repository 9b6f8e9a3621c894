use crate::dashboard::*;

use std::fs;

use sales_metrics::{AliasTable, Month, QuotaTable, Representative};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

/// The published CSV export of the team spreadsheet.
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSlQ9u5x09qR0dAKJsMC-fXTvJWRWPzMrXpaGaojOPblRrJYbx4Q-xalzh2hmf2WtwHRoLVIBOdL_HC/pub?output=csv";

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuotaOverride {
    pub month: String,
    pub representative: String,
    pub quota: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AliasEntry {
    pub pattern: String,
    pub representative: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(rename = "sourceUrl")]
    pub source_url: Option<String>,
    #[serde(rename = "cacheTtlSeconds")]
    pub cache_ttl_seconds: Option<u64>,
    /// Entries applied on top of the default quota table.
    #[serde(rename = "quotas")]
    pub quotas: Option<Vec<QuotaOverride>>,
    /// Alias patterns appended to the default alias table. Earlier patterns
    /// still win, so an extra alias can only widen the mapping.
    #[serde(rename = "extraAliases")]
    pub extra_aliases: Option<Vec<AliasEntry>>,
}

/// The immutable configuration tables, built once at startup and passed by
/// reference to ingestion and aggregation.
#[derive(PartialEq, Debug, Clone)]
pub struct Tables {
    pub quotas: QuotaTable,
    pub aliases: AliasTable,
}

impl Tables {
    pub fn default_tables() -> Tables {
        Tables {
            quotas: QuotaTable::default_table(),
            aliases: AliasTable::default_table(),
        }
    }
}

pub fn load_config(path: Option<&str>) -> DashResult<DashConfig> {
    match path {
        None => Ok(DashConfig::default()),
        Some(p) => {
            let contents = fs::read_to_string(p).context(OpeningJsonSnafu { path: p })?;
            serde_json::from_str(&contents).context(ParsingJsonSnafu {})
        }
    }
}

pub fn build_tables(config: &DashConfig) -> DashResult<Tables> {
    let mut tables = Tables::default_tables();
    if let Some(overrides) = &config.quotas {
        for o in overrides.iter() {
            let month = match Month::parse(&o.month) {
                Some(m) => m,
                None => whatever!("Unknown month name in the configuration: {:?}", o.month),
            };
            let representative = match Representative::parse(&o.representative) {
                Some(r) => r,
                None => whatever!(
                    "Unknown representative name in the configuration: {:?}",
                    o.representative
                ),
            };
            tables.quotas.set(month, representative, o.quota);
        }
    }
    if let Some(extra) = &config.extra_aliases {
        for a in extra.iter() {
            let representative = match Representative::parse(&a.representative) {
                Some(r) => r,
                None => whatever!(
                    "Unknown representative name in the configuration: {:?}",
                    a.representative
                ),
            };
            tables.aliases.push(a.pattern.clone(), representative);
        }
    }
    Ok(tables)
}

pub fn read_summary(path: String) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
