// Lead funnel service — response-time stats, rate metrics, and the
// speed-to-lead histogram.
//
// Day and week windows are computed against an explicit timezone: "today"
// starts at local midnight and the week starts Monday midnight (Monday by
// convention, not Sunday).

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::store::SalesStore;
use crate::types::{Lead, LeadMetrics, LeadStatus, SpeedToLeadDistribution};

/// Bucket label for leads with no region on file. Never dropped from the map.
const UNKNOWN_BUCKET: &str = "unknown";

/// Build funnel metrics from a store read.
pub fn metrics(store: &dyn SalesStore, now: DateTime<Utc>, tz: Tz) -> LeadMetrics {
    compute_metrics(&store.leads(), now, tz)
}

/// Roll up the lead funnel. Pure over its inputs; `now` and `tz` anchor the
/// today/week windows.
pub fn compute_metrics(leads: &[Lead], now: DateTime<Utc>, tz: Tz) -> LeadMetrics {
    let total = leads.len();

    let response_times: Vec<u64> = leads.iter().filter_map(|l| l.response_time_ms).collect();
    let avg_response_time_ms = if response_times.is_empty() {
        0.0
    } else {
        response_times.iter().sum::<u64>() as f64 / response_times.len() as f64
    };

    let auto_responded = leads.iter().filter(|l| l.auto_response_sent).count();
    let qualified = leads
        .iter()
        .filter(|l| l.status == LeadStatus::Qualified)
        .count();
    let converted = leads
        .iter()
        .filter(|l| l.status == LeadStatus::Converted)
        .count();

    let mut leads_by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut leads_by_source: BTreeMap<String, usize> = BTreeMap::new();
    let mut leads_by_region: BTreeMap<String, usize> = BTreeMap::new();
    for lead in leads {
        *leads_by_status
            .entry(lead.status.as_str().to_string())
            .or_default() += 1;
        *leads_by_source
            .entry(bucket_or_unknown(lead.source.as_deref()))
            .or_default() += 1;
        *leads_by_region
            .entry(bucket_or_unknown(lead.region.as_deref()))
            .or_default() += 1;
    }

    let day_start = start_of_today(now, tz);
    let week_start = start_of_week(now, tz);
    let today_lead_count = leads.iter().filter(|l| l.created_at >= day_start).count();
    let week_lead_count = leads.iter().filter(|l| l.created_at >= week_start).count();

    LeadMetrics {
        total_leads: total,
        avg_response_time_ms,
        auto_response_rate: round_rate(ratio(auto_responded, total)),
        qualification_rate: round_rate(ratio(qualified, total)),
        conversion_rate: round_rate(ratio(converted, total)),
        leads_by_status,
        leads_by_source,
        leads_by_region,
        today_lead_count,
        week_lead_count,
        speed_to_lead: speed_to_lead(leads),
    }
}

/// Histogram over first-response latency. Half-open second bins
/// [0,5) [5,15) [15,30) [30,60) [60,∞); leads without a response time are
/// not scored.
pub fn speed_to_lead(leads: &[Lead]) -> SpeedToLeadDistribution {
    let mut dist = SpeedToLeadDistribution::default();
    for ms in leads.iter().filter_map(|l| l.response_time_ms) {
        match ms {
            0..=4_999 => dist.under_5s += 1,
            5_000..=14_999 => dist.under_15s += 1,
            15_000..=29_999 => dist.under_30s += 1,
            30_000..=59_999 => dist.under_60s += 1,
            _ => dist.over_60s += 1,
        }
    }
    dist
}

fn bucket_or_unknown(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN_BUCKET.to_string(),
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Nearest-1% rounding of a 0–1 ratio: `round(x * 100) / 100`, exactly as the
/// rates have always been reported. Not a generic 2-decimal rounding.
fn round_rate(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn start_of_today(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local_midnight = now.with_timezone(&tz).date_naive().and_time(NaiveTime::MIN);
    local_to_utc(local_midnight, tz, now)
}

fn start_of_week(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local_date = now.with_timezone(&tz).date_naive();
    let monday = local_date - Duration::days(i64::from(local_date.weekday().num_days_from_monday()));
    local_to_utc(monday.and_time(NaiveTime::MIN), tz, now)
}

fn local_to_utc(local: chrono::NaiveDateTime, tz: Tz, fallback: DateTime<Utc>) -> DateTime<Utc> {
    // Midnight can be skipped or doubled on a DST boundary; take the earliest
    // valid instant and fall back to `now` only if the zone data is unusable.
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fallback)
}
