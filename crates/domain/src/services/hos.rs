//! Hours-of-Service ledger.
//!
//! Maintains the duty-status log (at most one active interval per driver),
//! computes rolling-window summaries, and flags violations. The close-then-
//! open on a status change is a per-driver atomic read-modify-write.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::config::{CycleRule, HosConfig};
use crate::error::DomainError;
use crate::models::{
    ComplianceAlertResponse, EditHosLogRequest, HosLog, HosLogSource, HosStatus,
    HosSummaryResponse, HosViolation, HosViolationType, RecordDutyStatusRequest,
    ResolveViolationRequest, ViolationSeverity, DAILY_DRIVING_CAP_HOURS,
};
use crate::repositories::{
    DriverAvailabilityRepository, HosRepository, NewHosLog, NewHosViolation,
};
use crate::services::gateway::{PushEvent, Topic, TrackingGateway};
use crate::services::locks::KeyedLocks;

/// FMCSA 14-hour on-duty window limit.
const ON_DUTY_LIMIT_HOURS: f64 = 14.0;

/// Driving allowed before a 30-minute break is required.
const DRIVING_BEFORE_BREAK_HOURS: f64 = 8.0;

/// Minimum rest block that resets the break clock.
const QUALIFYING_BREAK_HOURS: f64 = 0.5;

pub struct HosService {
    hos: Arc<dyn HosRepository>,
    availability: Arc<dyn DriverAvailabilityRepository>,
    gateway: Arc<TrackingGateway>,
    config: HosConfig,
    locks: KeyedLocks,
}

#[derive(Debug, Default, Clone, Copy)]
struct WindowTotals {
    driving_today: f64,
    on_duty_today: f64,
    cycle_hours: f64,
    continuous_driving: f64,
}

impl HosService {
    pub fn new(
        hos: Arc<dyn HosRepository>,
        availability: Arc<dyn DriverAvailabilityRepository>,
        gateway: Arc<TrackingGateway>,
        config: HosConfig,
    ) -> Self {
        Self {
            hos,
            availability,
            gateway,
            config,
            locks: KeyedLocks::new(),
        }
    }

    /// Records a duty status change: closes the active log (if any) at the
    /// new timestamp, then opens a new one.
    pub async fn record_duty_status(
        &self,
        request: RecordDutyStatusRequest,
    ) -> Result<HosLog, DomainError> {
        request.validate()?;

        let start_time = Utc
            .timestamp_millis_opt(request.timestamp)
            .single()
            .ok_or_else(|| DomainError::Validation("Invalid timestamp".to_string()))?;

        let _guard = self.locks.acquire(request.driver_id).await;

        if let Some(active) = self.hos.active_log(request.driver_id).await? {
            if start_time < active.start_time {
                return Err(DomainError::InvalidTimestamp(format!(
                    "Timestamp {} precedes active log start {}",
                    start_time, active.start_time
                )));
            }
            self.hos.close_log(active.log_id, start_time).await?;
        }

        let log = self
            .hos
            .append_log(NewHosLog {
                driver_id: request.driver_id,
                status: request.status,
                start_time,
                latitude: request.latitude,
                longitude: request.longitude,
                odometer: request.odometer,
                source: request.source,
            })
            .await?;

        tracing::info!(
            driver_id = %request.driver_id,
            status = %request.status,
            "duty status recorded"
        );

        Ok(log)
    }

    /// Rolling-window compliance summary as of the given instant.
    pub async fn summary(
        &self,
        driver_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<HosSummaryResponse, DomainError> {
        let cycle_start = as_of - Duration::days(self.config.cycle_rule.window_days());
        let logs = self.hos.logs_since(driver_id, cycle_start).await?;
        let totals = compute_windows(&logs, as_of, self.config.cycle_rule);
        let cycle_limit = self.config.cycle_rule.limit_hours();

        Ok(HosSummaryResponse {
            driver_id,
            as_of,
            hours_driven_today: totals.driving_today,
            hours_available_drive: (DAILY_DRIVING_CAP_HOURS - totals.driving_today).max(0.0),
            hours_on_duty_today: totals.on_duty_today,
            hours_available_duty: (ON_DUTY_LIMIT_HOURS - totals.on_duty_today).max(0.0),
            hours_in_cycle: totals.cycle_hours,
            hours_available_cycle: (cycle_limit - totals.cycle_hours).max(0.0),
            cycle_limit,
            hours_until_break_required: (DRIVING_BEFORE_BREAK_HOURS - totals.continuous_driving)
                .max(0.0),
        })
    }

    /// Flags rule breaches. Idempotent: an unresolved violation of the same
    /// type is never duplicated. Also refreshes the driver's availability
    /// hour counters as a side effect.
    pub async fn evaluate_violations(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<HosViolation>, DomainError> {
        let as_of = Utc::now();
        let _guard = self.locks.acquire(driver_id).await;

        let cycle_start = as_of - Duration::days(self.config.cycle_rule.window_days());
        let logs = self.hos.logs_since(driver_id, cycle_start).await?;
        let totals = compute_windows(&logs, as_of, self.config.cycle_rule);

        let checks = [
            (
                HosViolationType::DriveTimeExceeded,
                totals.driving_today,
                DAILY_DRIVING_CAP_HOURS,
            ),
            (
                HosViolationType::OnDutyTimeExceeded,
                totals.on_duty_today,
                ON_DUTY_LIMIT_HOURS,
            ),
            (
                HosViolationType::CycleTimeExceeded,
                totals.cycle_hours,
                self.config.cycle_rule.limit_hours(),
            ),
            (
                HosViolationType::RequiredBreakMissed,
                totals.continuous_driving,
                DRIVING_BEFORE_BREAK_HOURS,
            ),
        ];

        let existing = self.hos.unresolved_violations(driver_id).await?;

        let mut created = Vec::new();
        for (violation_type, actual, limit) in checks {
            if actual <= limit {
                continue;
            }
            if existing.iter().any(|v| v.violation_type == violation_type) {
                continue;
            }

            let overage = actual - limit;
            let violation = self
                .hos
                .append_violation(NewHosViolation {
                    driver_id,
                    violation_type,
                    severity: ViolationSeverity::for_overage(overage),
                    actual_hours: actual,
                    limit_hours: limit,
                    overage_hours: overage,
                })
                .await?;

            tracing::warn!(
                driver_id = %driver_id,
                violation_type = %violation_type,
                actual_hours = actual,
                limit_hours = limit,
                "HOS violation flagged"
            );

            self.gateway.publish(
                Topic::Global,
                &PushEvent::ComplianceAlert(ComplianceAlertResponse::from(violation.clone())),
            );
            created.push(violation);
        }

        if let Some(mut availability) = self.availability.get(driver_id).await? {
            availability.hours_worked_today = totals.driving_today;
            availability.hours_worked_week = totals.cycle_hours;
            availability.updated_at = as_of;
            self.availability.update(&availability).await?;
        }

        Ok(created)
    }

    /// Edits a historical log. The edit reason is mandatory and the log is
    /// re-sourced as Edited; violations are re-evaluated afterwards.
    pub async fn edit_log(
        &self,
        log_id: Uuid,
        request: EditHosLogRequest,
    ) -> Result<HosLog, DomainError> {
        request.validate()?;

        let mut log = self
            .hos
            .get_log(log_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("HOS log {} not found", log_id)))?;

        let driver_id = log.driver_id;
        let guard = self.locks.acquire(driver_id).await;

        if let Some(status) = request.status {
            log.status = status;
        }
        if let Some(start_time) = request.start_time {
            log.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            log.end_time = Some(end_time);
        }
        if let Some(end) = log.end_time {
            if end <= log.start_time {
                return Err(DomainError::Validation(
                    "Log end must be after its start".to_string(),
                ));
            }
        }
        if request.odometer.is_some() {
            log.odometer = request.odometer;
        }
        log.source = HosLogSource::Edited;
        log.edit_reason = Some(request.edit_reason);

        let updated = self.hos.update_log(&log).await?;
        drop(guard);

        // The edited window may have gained or lost a breach.
        self.evaluate_violations(driver_id).await?;

        Ok(updated)
    }

    pub async fn resolve_violation(
        &self,
        violation_id: Uuid,
        request: ResolveViolationRequest,
    ) -> Result<HosViolation, DomainError> {
        request.validate()?;

        let violation = self.hos.get_violation(violation_id).await?.ok_or_else(|| {
            DomainError::NotFound(format!("Violation {} not found", violation_id))
        })?;
        if violation.resolved {
            return Ok(violation);
        }

        self.hos
            .resolve_violation(violation_id, &request.note, Utc::now())
            .await
    }

    pub async fn unresolved_violations(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<HosViolation>, DomainError> {
        self.hos.unresolved_violations(driver_id).await
    }

    /// Duty logs for the trailing `days`, clamped to 1-30.
    pub async fn recent_logs(
        &self,
        driver_id: Uuid,
        days: i64,
    ) -> Result<Vec<HosLog>, DomainError> {
        let since = Utc::now() - Duration::days(days.clamp(1, 30));
        self.hos.logs_since(driver_id, since).await
    }
}

/// Sums the rolling windows over a driver's logs.
///
/// The break clock accumulates driving time and resets on any off-duty or
/// sleeper block of at least 30 minutes; on-duty (not driving) intervals
/// neither accumulate nor reset it.
fn compute_windows(logs: &[HosLog], as_of: DateTime<Utc>, rule: CycleRule) -> WindowTotals {
    let day_start = as_of - Duration::hours(24);
    let cycle_start = as_of - Duration::days(rule.window_days());

    let mut sorted: Vec<&HosLog> = logs.iter().collect();
    sorted.sort_by_key(|log| log.start_time);

    let mut totals = WindowTotals::default();
    let mut continuous = 0.0;

    for log in sorted {
        let day_hours = clipped_hours(log, day_start, as_of);
        let cycle_hours = clipped_hours(log, cycle_start, as_of);

        match log.status {
            HosStatus::Driving => {
                totals.driving_today += day_hours;
                totals.on_duty_today += day_hours;
                totals.cycle_hours += cycle_hours;
                continuous += log.duration_hours(as_of);
            }
            HosStatus::OnDuty => {
                totals.on_duty_today += day_hours;
                totals.cycle_hours += cycle_hours;
            }
            HosStatus::OffDuty | HosStatus::SleeperBerth => {
                if log.duration_hours(as_of) >= QUALIFYING_BREAK_HOURS {
                    continuous = 0.0;
                }
            }
        }
    }

    totals.continuous_driving = continuous;
    totals
}

/// Overlap of the log's interval with `[window_start, as_of]`, in hours.
fn clipped_hours(log: &HosLog, window_start: DateTime<Utc>, as_of: DateTime<Utc>) -> f64 {
    let start = log.start_time.max(window_start);
    let end = log.end_time.unwrap_or(as_of).min(as_of);
    if end <= start {
        return 0.0;
    }
    (end - start).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(status: HosStatus, start_hours_ago: i64, duration_hours: Option<i64>) -> HosLog {
        let start = Utc::now() - Duration::hours(start_hours_ago);
        HosLog {
            log_id: Uuid::new_v4(),
            driver_id: Uuid::nil(),
            status,
            start_time: start,
            end_time: duration_hours.map(|h| start + Duration::hours(h)),
            latitude: None,
            longitude: None,
            odometer: None,
            source: HosLogSource::Eld,
            edit_reason: None,
            certified: false,
            created_at: start,
        }
    }

    #[test]
    fn test_windows_single_open_driving_log() {
        let logs = vec![log(HosStatus::Driving, 4, None)];
        let totals = compute_windows(&logs, Utc::now(), CycleRule::SeventyHour8Day);
        assert!((totals.driving_today - 4.0).abs() < 0.01);
        assert!((totals.on_duty_today - 4.0).abs() < 0.01);
        assert!((totals.cycle_hours - 4.0).abs() < 0.01);
        assert!((totals.continuous_driving - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_windows_clip_to_24h() {
        // 30 hours of driving, only the last 24 count for today
        let logs = vec![log(HosStatus::Driving, 30, None)];
        let totals = compute_windows(&logs, Utc::now(), CycleRule::SeventyHour8Day);
        assert!((totals.driving_today - 24.0).abs() < 0.01);
        assert!((totals.cycle_hours - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_qualifying_break_resets_continuous_driving() {
        let logs = vec![
            log(HosStatus::Driving, 10, Some(6)),
            log(HosStatus::OffDuty, 4, Some(1)),
            log(HosStatus::Driving, 3, None),
        ];
        let totals = compute_windows(&logs, Utc::now(), CycleRule::SeventyHour8Day);
        assert!((totals.driving_today - 9.0).abs() < 0.01);
        assert!((totals.continuous_driving - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_short_break_does_not_reset() {
        // A 15-minute break does not qualify
        let start = Utc::now() - Duration::hours(10);
        let mut short_break = log(HosStatus::OffDuty, 4, None);
        short_break.start_time = start + Duration::hours(6);
        short_break.end_time = Some(start + Duration::hours(6) + Duration::minutes(15));

        let logs = vec![log(HosStatus::Driving, 10, Some(6)), short_break, log(HosStatus::Driving, 3, None)];
        let totals = compute_windows(&logs, Utc::now(), CycleRule::SeventyHour8Day);
        assert!((totals.continuous_driving - 9.0).abs() < 0.01);
    }

    #[test]
    fn test_on_duty_counts_toward_duty_not_driving() {
        let logs = vec![
            log(HosStatus::OnDuty, 6, Some(2)),
            log(HosStatus::Driving, 4, None),
        ];
        let totals = compute_windows(&logs, Utc::now(), CycleRule::SeventyHour8Day);
        assert!((totals.driving_today - 4.0).abs() < 0.01);
        assert!((totals.on_duty_today - 6.0).abs() < 0.01);
    }
}
