mod config;
use log::debug;

use std::collections::HashMap;

pub use crate::config::*;

/// Computes the realized-vs-quota comparison for the given filter.
///
/// Arguments:
/// * `records` the canonical record set to aggregate over
/// * `year` the year to restrict to
/// * `months` the months to restrict to; also the months the quota is
///   summed over
/// * `representatives` the representatives to restrict to
/// * `quotas` the quota table
///
/// All three filters are conjunctive. Records are grouped by representative
/// in first-seen order, which is also the tie-break order when two rows have
/// the same attainment. Rows are sorted by descending attainment.
///
/// Pure function of its inputs: no hidden state, safe to call repeatedly.
pub fn aggregate(
    records: &[CanonicalRecord],
    year: i32,
    months: &[Month],
    representatives: &[Representative],
    quotas: &QuotaTable,
) -> Vec<AggregateRow> {
    debug!(
        "aggregate: {} records, year {}, {} months, {} representatives",
        records.len(),
        year,
        months.len(),
        representatives.len()
    );

    // Group in first-seen order.
    let mut order: Vec<Representative> = Vec::new();
    let mut counts: HashMap<Representative, u32> = HashMap::new();
    for r in records.iter() {
        if r.year != year
            || !months.contains(&r.month)
            || !representatives.contains(&r.representative)
        {
            continue;
        }
        if !counts.contains_key(&r.representative) {
            order.push(r.representative);
        }
        *counts.entry(r.representative).or_insert(0) += 1;
    }

    let mut rows: Vec<AggregateRow> = order
        .iter()
        .map(|&representative| {
            let realized = counts.get(&representative).copied().unwrap_or(0);
            let quota = quotas.quota_for(representative, months);
            let attainment_pct = if quota > 0 {
                realized as f64 / quota as f64 * 100.0
            } else {
                0.0
            };
            AggregateRow {
                representative,
                realized,
                quota,
                attainment_pct,
                delta: realized as i64 - quota as i64,
            }
        })
        .collect();

    // Stable sort: ties keep the first-seen group order.
    rows.sort_by(|a, b| {
        b.attainment_pct
            .partial_cmp(&a.attainment_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    debug!("aggregate: {} rows", rows.len());
    rows
}

/// Sums a set of aggregate rows into the overall summary numbers.
pub fn summarize(rows: &[AggregateRow]) -> Totals {
    let realized: u32 = rows.iter().map(|r| r.realized).sum();
    let quota: u32 = rows.iter().map(|r| r.quota).sum();
    let attainment_pct = if quota > 0 {
        realized as f64 / quota as f64 * 100.0
    } else {
        0.0
    };
    Totals {
        realized,
        quota,
        attainment_pct,
        delta: realized as i64 - quota as i64,
    }
}
