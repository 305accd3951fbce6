//! Progressive thinning of analysis history.
//!
//! Recent history is kept in full, older history is thinned to one analysis
//! per day, week and month, then to versioned analyses only, and finally
//! dropped. The current analysis is never selected.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::{config::ThinningSettings, models::PurgeableAnalysis};

/// Calendar unit a keep-one filter groups analyses by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    /// ISO week
    Week,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Grouping key: analyses with equal keys share an interval.
    fn key(&self, date: DateTime<Utc>) -> (i32, u32, u32) {
        match self {
            Period::Day => (date.year(), date.month(), date.day()),
            Period::Week => {
                let week = date.iso_week();
                (week.year(), week.week(), 0)
            }
            Period::Month => (date.year(), date.month(), 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisFilter {
    /// In `[start, end)`, keep a single analysis per period
    KeepOne {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: Period,
    },
    /// Before the date, keep only analyses that carry a version
    KeepWithVersion { before: DateTime<Utc> },
    /// Before the date, keep nothing
    DeleteAll { before: DateTime<Utc> },
}

impl AnalysisFilter {
    /// The default chain for a policy, applied in order.
    pub fn chain(
        now: DateTime<Utc>,
        max_analysis_age_days: u32,
        thinning: &ThinningSettings,
    ) -> Vec<AnalysisFilter> {
        let weeks = |w: u32| before(now, Duration::try_weeks(i64::from(w)));
        let keep_daily = before(
            now,
            Duration::try_hours(i64::from(thinning.hours_before_keeping_one_per_day)),
        );
        let keep_weekly = weeks(thinning.weeks_before_keeping_one_per_week);
        let keep_monthly = weeks(thinning.weeks_before_keeping_one_per_month);
        let keep_versioned = weeks(thinning.weeks_before_keeping_only_with_version);
        let delete_all = before(now, Duration::try_days(i64::from(max_analysis_age_days)));
        vec![
            AnalysisFilter::KeepOne {
                start: keep_weekly,
                end: keep_daily,
                period: Period::Day,
            },
            AnalysisFilter::KeepOne {
                start: keep_monthly,
                end: keep_weekly,
                period: Period::Week,
            },
            AnalysisFilter::KeepOne {
                start: delete_all,
                end: keep_monthly,
                period: Period::Month,
            },
            AnalysisFilter::KeepWithVersion {
                before: keep_versioned,
            },
            AnalysisFilter::DeleteAll { before: delete_all },
        ]
    }

    pub fn label(&self) -> String {
        match self {
            AnalysisFilter::KeepOne { period, .. } => format!("keep one per {}", period.as_str()),
            AnalysisFilter::KeepWithVersion { .. } => "keep only versioned".to_string(),
            AnalysisFilter::DeleteAll { .. } => "delete all".to_string(),
        }
    }

    /// Analyses of `history` this filter deletes. Never selects the last analysis.
    pub fn select<'a>(&self, history: &'a [PurgeableAnalysis]) -> Vec<&'a PurgeableAnalysis> {
        match self {
            AnalysisFilter::KeepOne { start, end, period } => {
                let mut intervals: BTreeMap<(i32, u32, u32), Vec<&PurgeableAnalysis>> =
                    BTreeMap::new();
                for analysis in history
                    .iter()
                    .filter(|a| a.date >= *start && a.date < *end)
                {
                    intervals
                        .entry(period.key(analysis.date))
                        .or_default()
                        .push(analysis);
                }
                intervals
                    .into_values()
                    .flat_map(thin_interval)
                    .collect()
            }
            AnalysisFilter::KeepWithVersion { before } => history
                .iter()
                .filter(|a| a.date < *before && !a.last)
                .filter(|a| a.version.as_deref().is_none_or(str::is_empty))
                .collect(),
            AnalysisFilter::DeleteAll { before } => history
                .iter()
                .filter(|a| a.date < *before && !a.last)
                .collect(),
        }
    }
}

/// Within one interval, keep the analyses that matter (current or with
/// events); if there are none, keep the most recent one.
fn thin_interval(mut interval: Vec<&PurgeableAnalysis>) -> Vec<&PurgeableAnalysis> {
    if interval.len() < 2 {
        return Vec::new();
    }
    interval.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.uuid.cmp(&b.uuid)));
    let has_keeper = interval.iter().any(|a| !a.is_thinnable());
    let mut deletable: Vec<_> = interval.into_iter().filter(|a| a.is_thinnable()).collect();
    if !has_keeper {
        deletable.pop();
    }
    deletable
}

/// Run the chain over `history`. Each filter only sees what earlier filters kept.
pub fn select_analyses_to_delete(
    history: Vec<PurgeableAnalysis>,
    filters: &[AnalysisFilter],
) -> Vec<PurgeableAnalysis> {
    let mut remaining = history;
    let mut deleted = Vec::new();

    for filter in filters {
        let selected: HashSet<String> = filter
            .select(&remaining)
            .into_iter()
            .map(|a| a.uuid.clone())
            .collect();
        if selected.is_empty() {
            continue;
        }
        tracing::debug!(
            filter = %filter.label(),
            count = selected.len(),
            "Analyses selected for deletion"
        );
        let (gone, kept): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|a| selected.contains(&a.uuid));
        deleted.extend(gone);
        remaining = kept;
    }

    deleted
}

/// `now - age`, clamped to the earliest representable instant.
///
/// A cutoff past the start of time selects nothing.
pub(crate) fn before(now: DateTime<Utc>, age: Option<Duration>) -> DateTime<Utc> {
    age.and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
