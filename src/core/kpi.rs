//! Reporting KPIs.
//!
//! Pure arithmetic over collections the caller already fetched; no I/O.
//! Every ratio computed over an empty set is `None` ("not available"), never
//! a NaN and never a numeric default.

use crate::models::{Complaint, ComplaintStatus, DispatchRow};
use std::fmt;

/// The three ratios shown on the reporting screen.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    /// Percentage of dispatches delivered at or before their scheduled time,
    /// over dispatches carrying both dates.
    pub on_time_rate: Option<f64>,
    /// Mean days between order creation and delivery, same subset.
    pub avg_lead_time_days: Option<f64>,
    /// Percentage of complaints in the resolved status.
    pub resolution_rate: Option<f64>,
}

impl fmt::Display for KpiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "on-time rate: {} | avg lead time: {} | resolution rate: {}",
            format_percent(self.on_time_rate),
            format_days(self.avg_lead_time_days),
            format_percent(self.resolution_rate),
        )
    }
}

#[must_use]
pub fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.1}%", v))
}

#[must_use]
pub fn format_days(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.1} days", v))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Percentage of dispatches delivered on time. Only rows with both dates
/// present participate; `None` when no row qualifies.
#[must_use]
pub fn on_time_rate(dispatches: &[DispatchRow]) -> Option<f64> {
    let flags: Vec<f64> = dispatches
        .iter()
        .filter_map(DispatchRow::on_time)
        .map(|on_time| if on_time { 100.0 } else { 0.0 })
        .collect();
    mean(&flags)
}

/// Mean lead time in days over dispatches with both dates present.
#[must_use]
pub fn avg_lead_time_days(dispatches: &[DispatchRow]) -> Option<f64> {
    let days: Vec<f64> = dispatches
        .iter()
        .filter(|d| d.on_time().is_some())
        .filter_map(DispatchRow::lead_time_days)
        .collect();
    mean(&days)
}

/// Percentage of complaints currently resolved.
#[must_use]
pub fn resolution_rate(complaints: &[Complaint]) -> Option<f64> {
    let flags: Vec<f64> = complaints
        .iter()
        .map(|c| {
            if c.status == ComplaintStatus::Resolved {
                100.0
            } else {
                0.0
            }
        })
        .collect();
    mean(&flags)
}

#[must_use]
pub fn compute_kpis(dispatches: &[DispatchRow], complaints: &[Complaint]) -> KpiSummary {
    KpiSummary {
        on_time_rate: on_time_rate(dispatches),
        avg_lead_time_days: avg_lead_time_days(dispatches),
        resolution_rate: resolution_rate(complaints),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn dispatch(
        id: i64,
        scheduled_offset_hours: Option<i64>,
        delivered_offset_hours: Option<i64>,
    ) -> DispatchRow {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        DispatchRow {
            id,
            order_id: id,
            scheduled_at: scheduled_offset_hours.map(|h| created + Duration::hours(h)),
            delivered_at: delivered_offset_hours.map(|h| created + Duration::hours(h)),
            carrier: None,
            status: None,
            client_id: 1,
            order_created_at: created,
        }
    }

    fn complaint(id: i64, status: ComplaintStatus) -> Complaint {
        Complaint {
            id,
            client_id: 1,
            description: "ten chars!".to_string(),
            status,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_inputs_report_not_available() {
        let summary = compute_kpis(&[], &[]);
        assert_eq!(summary.on_time_rate, None);
        assert_eq!(summary.avg_lead_time_days, None);
        assert_eq!(summary.resolution_rate, None);
        assert_eq!(
            summary.to_string(),
            "on-time rate: N/A | avg lead time: N/A | resolution rate: N/A"
        );
    }

    #[test]
    fn test_on_time_rate_ignores_incomplete_rows() {
        let dispatches = vec![
            dispatch(1, Some(48), Some(48)), // on time (equality counts)
            dispatch(2, Some(48), Some(72)), // late
            dispatch(3, Some(48), None),     // incomplete, excluded
            dispatch(4, None, Some(24)),     // incomplete, excluded
        ];
        assert_eq!(on_time_rate(&dispatches), Some(50.0));

        // Nothing but incomplete rows behaves like an empty collection.
        let incomplete = vec![dispatch(1, Some(48), None)];
        assert_eq!(on_time_rate(&incomplete), None);
    }

    #[test]
    fn test_avg_lead_time_days() {
        let dispatches = vec![
            dispatch(1, Some(48), Some(24)), // 1.0 day
            dispatch(2, Some(48), Some(72)), // 3.0 days
        ];
        assert_eq!(avg_lead_time_days(&dispatches), Some(2.0));
    }

    #[test]
    fn test_resolution_rate() {
        let complaints = vec![
            complaint(1, ComplaintStatus::Resolved),
            complaint(2, ComplaintStatus::Received),
            complaint(3, ComplaintStatus::UnderEvaluation),
            complaint(4, ComplaintStatus::Resolved),
        ];
        assert_eq!(resolution_rate(&complaints), Some(50.0));
    }
}
