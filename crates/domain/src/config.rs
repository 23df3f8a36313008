//! Tunable policy configuration consumed by the domain services.

use serde::Deserialize;

/// Auto-dispatch scoring weights.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_proximity_weight")]
    pub proximity_weight: f64,

    #[serde(default = "default_availability_weight")]
    pub availability_weight: f64,

    #[serde(default = "default_performance_weight")]
    pub performance_weight: f64,
}

fn default_proximity_weight() -> f64 {
    0.4
}

fn default_availability_weight() -> f64 {
    0.3
}

fn default_performance_weight() -> f64 {
    0.3
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            proximity_weight: default_proximity_weight(),
            availability_weight: default_availability_weight(),
            performance_weight: default_performance_weight(),
        }
    }
}

/// Live-tracking pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Geofence radius around pickup/delivery stops, statute miles.
    #[serde(default = "default_geofence_radius_miles")]
    pub geofence_radius_miles: f64,
}

fn default_geofence_radius_miles() -> f64 {
    0.5
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            geofence_radius_miles: default_geofence_radius_miles(),
        }
    }
}

/// Which FMCSA cycle rule the carrier operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleRule {
    /// 60 hours on duty in any 7 consecutive days.
    SixtyHour7Day,
    /// 70 hours on duty in any 8 consecutive days.
    SeventyHour8Day,
}

impl CycleRule {
    pub fn limit_hours(&self) -> f64 {
        match self {
            CycleRule::SixtyHour7Day => 60.0,
            CycleRule::SeventyHour8Day => 70.0,
        }
    }

    pub fn window_days(&self) -> i64 {
        match self {
            CycleRule::SixtyHour7Day => 7,
            CycleRule::SeventyHour8Day => 8,
        }
    }
}

/// Hours-of-Service ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HosConfig {
    #[serde(default = "default_cycle_rule")]
    pub cycle_rule: CycleRule,
}

fn default_cycle_rule() -> CycleRule {
    CycleRule::SeventyHour8Day
}

impl Default for HosConfig {
    fn default() -> Self {
        Self {
            cycle_rule: default_cycle_rule(),
        }
    }
}
