//! Temporal filter builder: relation + time(s) to a bounded range clause.
//!
//! Every produced clause is a range on the observation timestamp field. The
//! default-window builders exist so unbounded time series can never be
//! scanned without a temporal bound (see the compiler).

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::json;

use crate::clause::Clause;
use crate::config::{DeploymentKind, TimeLimitConfig};
use crate::error::DataError;
use crate::models::{TemporalParams, TemporalRelation};

/// Field every temporal clause is issued against.
const TIME_FIELD: &str = "observationDateTime";

/// Builds the range clause for an explicit temporal predicate.
///
/// DURING/BETWEEN require an end time and a non-inverted window. BEFORE and
/// AFTER derive their missing bound from the deployment's lookback window;
/// an AFTER window never ends in the future.
pub fn build_temporal_clause(
    params: &TemporalParams,
    time_limit: &TimeLimitConfig,
) -> Result<Clause, DataError> {
    let start = parse_time(&params.time)?;
    let lookback = time_limit.lookback_days;

    let (window_start, window_end) = match params.relation {
        TemporalRelation::During | TemporalRelation::Between => {
            let Some(end_time) = params.end_time.as_deref() else {
                return Err(DataError::Validation(
                    "no end date provided for during/between temporal query".to_string(),
                ));
            };
            let end = parse_time(end_time)?;
            if start > end {
                return Err(DataError::EndBeforeStart);
            }
            (start, end)
        }
        TemporalRelation::Before => (start - Duration::days(lookback), start),
        TemporalRelation::After => after_window(start, lookback, Utc::now()),
    };

    Ok(range_clause(
        &window_start.to_rfc3339(),
        Some(&window_end.to_rfc3339()),
    ))
}

/// Builds the default temporal window applied when a TEMPORAL-capable
/// resource is queried without an explicit temporal predicate.
///
/// Production deployments bound only the past: `[now − lookback, +∞)`.
/// Fixture deployments hold static data, so the window is anchored on the
/// configured date: `[anchor − lookback, anchor]`.
pub fn default_window_clause(time_limit: &TimeLimitConfig) -> Result<Clause, DataError> {
    match time_limit.deployment {
        DeploymentKind::Production => {
            let start = Utc::now() - Duration::days(time_limit.lookback_days);
            Ok(range_clause(&start.to_rfc3339(), None))
        }
        DeploymentKind::Test => {
            let Some(anchor) = time_limit.anchor else {
                return Err(DataError::Config(
                    "invalid timeLimit config passed: fixture deployment without anchor date"
                        .to_string(),
                ));
            };
            let start = anchor - Duration::days(time_limit.lookback_days);
            Ok(range_clause(&start.to_rfc3339(), Some(&anchor.to_rfc3339())))
        }
    }
}

/// AFTER window arithmetic: `[start, start + lookback]`, end clamped to `now`.
fn after_window(
    start: DateTime<FixedOffset>,
    lookback_days: i64,
    now: DateTime<Utc>,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let end = start + Duration::days(lookback_days);
    if end.with_timezone(&Utc) > now {
        (start, now.with_timezone(start.offset()))
    } else {
        (start, end)
    }
}

fn parse_time(value: &str) -> Result<DateTime<FixedOffset>, DataError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| DataError::DateParse(value.to_string()))
}

fn range_clause(gte: &str, lte: Option<&str>) -> Clause {
    let mut range = json!({ "gte": gte });
    if let Some(lte) = lte {
        range["lte"] = json!(lte);
    }
    Clause::equivalent(json!({ "range": { TIME_FIELD: range } }))
}
