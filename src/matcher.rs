//! Pairs refunds with the purchases they cancel.
//!
//! A return is a row with a negative `Amount`. It cancels the active row with
//! the opposite amount and the same `Info` that is dated on or before it,
//! choosing the closest such purchase. Returns are visited in ascending id
//! order, so identical purchases are consumed first come, first served.

use std::collections::BTreeMap;

use crate::dataset::{Cell, Dataset, Row, AMOUNT, DATE, INFO};
use crate::error::Result;

pub const MATCHED_ID: &str = "Matched ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedPair {
    pub return_id: u64,
    pub purchase_id: u64,
    pub days: i64,
}

#[derive(Debug)]
pub struct ReturnReport {
    /// Audit table: every return that had a same-amount, same-info candidate.
    /// Resolved returns carry the purchase id in `Matched ID`.
    pub excluded: Dataset,
    pub pairs: Vec<MatchedPair>,
}

impl ReturnReport {
    pub fn unresolved(&self) -> usize {
        self.excluded.count_rows() - self.pairs.len()
    }
}

/// Remove purchase/return pairs from `data` in place.
pub fn remove_returns(data: &mut Dataset, audit_name: &str) -> Result<ReturnReport> {
    let mut returns: Vec<Row> = data
        .rows()
        .iter()
        .filter(|r| is_return(r))
        .cloned()
        .collect();
    returns.sort_by_key(|r| r.id);

    let mut unmatchable = Vec::new();
    let mut pairs = Vec::new();

    for ret in &returns {
        let Some(amount) = ret.number(AMOUNT) else {
            continue;
        };
        let info = ret.text(INFO);
        let candidates: Vec<&Row> = data
            .rows()
            .iter()
            .filter(|p| p.number(AMOUNT) == Some(-amount) && p.text(INFO) == info)
            .collect();
        if candidates.is_empty() {
            unmatchable.push(ret.id);
            continue;
        }

        let closest = ret.date(DATE).and_then(|ret_date| {
            candidates
                .iter()
                .filter_map(|p| {
                    let days = (ret_date - p.date(DATE)?).num_days();
                    (days >= 0).then_some((p.id, days))
                })
                .min_by_key(|(_, days)| *days)
        });
        let Some((purchase_id, days)) = closest else {
            tracing::debug!("return {} only has later purchases, leaving it", ret.id);
            continue;
        };

        data.drop_rows(&[purchase_id, ret.id])?;
        tracing::debug!("return {} cancels purchase {purchase_id} ({days} days)", ret.id);
        pairs.push(MatchedPair {
            return_id: ret.id,
            purchase_id,
            days,
        });
    }

    let columns: Vec<&str> = data.columns().iter().map(String::as_str).collect();
    let mut excluded = Dataset::new(audit_name, &columns);
    for ret in returns {
        if !unmatchable.contains(&ret.id) {
            excluded.push(ret)?;
        }
    }
    let matched: BTreeMap<u64, u64> = pairs.iter().map(|p| (p.return_id, p.purchase_id)).collect();
    excluded.set_values(MATCHED_ID, |row| match matched.get(&row.id) {
        Some(purchase_id) => Cell::Number(*purchase_id as f64),
        None => Cell::Empty,
    });

    tracing::info!(
        "{} return(s) matched, {} left for audit",
        pairs.len(),
        excluded.count_rows() - pairs.len()
    );
    Ok(ReturnReport { excluded, pairs })
}

fn is_return(row: &Row) -> bool {
    row.number(AMOUNT).is_some_and(|a| a < 0.0)
}
