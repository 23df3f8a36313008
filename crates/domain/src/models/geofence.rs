//! Geofence alert domain model.
//!
//! Alerts are derived events: the tracking pipeline emits one per membership
//! edge (outside→inside or inside→outside) for a dispatch's pickup and
//! delivery zones. Repeated pings on the same side never duplicate an alert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which zone of the dispatch's load a membership state refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneKind {
    Pickup,
    Delivery,
}

/// Geofence alert type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeofenceAlertType {
    PickupZoneEntered,
    PickupZoneExited,
    DeliveryZoneEntered,
    DeliveryZoneExited,
    GeofenceEntered,
    GeofenceExited,
}

impl GeofenceAlertType {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeofenceAlertType::PickupZoneEntered => "PICKUP_ZONE_ENTERED",
            GeofenceAlertType::PickupZoneExited => "PICKUP_ZONE_EXITED",
            GeofenceAlertType::DeliveryZoneEntered => "DELIVERY_ZONE_ENTERED",
            GeofenceAlertType::DeliveryZoneExited => "DELIVERY_ZONE_EXITED",
            GeofenceAlertType::GeofenceEntered => "GEOFENCE_ENTERED",
            GeofenceAlertType::GeofenceExited => "GEOFENCE_EXITED",
        }
    }

    /// The alert type for a membership edge on the given zone.
    pub fn for_edge(zone: ZoneKind, entered: bool) -> Self {
        match (zone, entered) {
            (ZoneKind::Pickup, true) => GeofenceAlertType::PickupZoneEntered,
            (ZoneKind::Pickup, false) => GeofenceAlertType::PickupZoneExited,
            (ZoneKind::Delivery, true) => GeofenceAlertType::DeliveryZoneEntered,
            (ZoneKind::Delivery, false) => GeofenceAlertType::DeliveryZoneExited,
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(
            self,
            GeofenceAlertType::PickupZoneEntered
                | GeofenceAlertType::DeliveryZoneEntered
                | GeofenceAlertType::GeofenceEntered
        )
    }
}

impl fmt::Display for GeofenceAlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GeofenceAlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PICKUP_ZONE_ENTERED" => Ok(GeofenceAlertType::PickupZoneEntered),
            "PICKUP_ZONE_EXITED" => Ok(GeofenceAlertType::PickupZoneExited),
            "DELIVERY_ZONE_ENTERED" => Ok(GeofenceAlertType::DeliveryZoneEntered),
            "DELIVERY_ZONE_EXITED" => Ok(GeofenceAlertType::DeliveryZoneExited),
            "GEOFENCE_ENTERED" => Ok(GeofenceAlertType::GeofenceEntered),
            "GEOFENCE_EXITED" => Ok(GeofenceAlertType::GeofenceExited),
            _ => Err(format!("Invalid geofence alert type: {}", s)),
        }
    }
}

/// A geofence alert derived from a membership edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceAlert {
    pub alert_id: Uuid,
    pub alert_type: GeofenceAlertType,
    pub driver_id: Uuid,
    pub dispatch_id: Uuid,
    /// The location row that triggered the edge.
    pub location_id: i64,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
}

/// Request payload for acknowledging an alert.
#[derive(Debug, Clone, Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeAlertRequest {
    #[validate(length(min = 1, max = 100, message = "acknowledgedBy must be 1-100 characters"))]
    pub acknowledged_by: String,
}

/// Response payload for geofence alert reads and push events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceAlertResponse {
    pub alert_id: Uuid,
    pub alert_type: GeofenceAlertType,
    pub driver_id: Uuid,
    pub dispatch_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
}

impl From<GeofenceAlert> for GeofenceAlertResponse {
    fn from(a: GeofenceAlert) -> Self {
        Self {
            alert_id: a.alert_id,
            alert_type: a.alert_type,
            driver_id: a.driver_id,
            dispatch_id: a.dispatch_id,
            created_at: a.created_at,
            acknowledged: a.acknowledged,
            acknowledged_at: a.acknowledged_at,
            acknowledged_by: a.acknowledged_by,
        }
    }
}

/// Response for listing pending alerts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAlertsResponse {
    pub alerts: Vec<GeofenceAlertResponse>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_alert_type_round_trip() {
        for alert_type in [
            GeofenceAlertType::PickupZoneEntered,
            GeofenceAlertType::PickupZoneExited,
            GeofenceAlertType::DeliveryZoneEntered,
            GeofenceAlertType::DeliveryZoneExited,
            GeofenceAlertType::GeofenceEntered,
            GeofenceAlertType::GeofenceExited,
        ] {
            assert_eq!(GeofenceAlertType::from_str(alert_type.as_str()), Ok(alert_type));
        }
        assert!(GeofenceAlertType::from_str("invalid").is_err());
    }

    #[test]
    fn test_for_edge() {
        assert_eq!(
            GeofenceAlertType::for_edge(ZoneKind::Pickup, true),
            GeofenceAlertType::PickupZoneEntered
        );
        assert_eq!(
            GeofenceAlertType::for_edge(ZoneKind::Pickup, false),
            GeofenceAlertType::PickupZoneExited
        );
        assert_eq!(
            GeofenceAlertType::for_edge(ZoneKind::Delivery, true),
            GeofenceAlertType::DeliveryZoneEntered
        );
        assert_eq!(
            GeofenceAlertType::for_edge(ZoneKind::Delivery, false),
            GeofenceAlertType::DeliveryZoneExited
        );
    }

    #[test]
    fn test_is_entry() {
        assert!(GeofenceAlertType::PickupZoneEntered.is_entry());
        assert!(GeofenceAlertType::GeofenceEntered.is_entry());
        assert!(!GeofenceAlertType::DeliveryZoneExited.is_entry());
    }

    #[test]
    fn test_alert_response_serialization() {
        let response = GeofenceAlertResponse {
            alert_id: Uuid::new_v4(),
            alert_type: GeofenceAlertType::PickupZoneEntered,
            driver_id: Uuid::new_v4(),
            dispatch_id: Uuid::new_v4(),
            created_at: Utc::now(),
            acknowledged: false,
            acknowledged_at: None,
            acknowledged_by: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"alertType\":\"PICKUP_ZONE_ENTERED\""));
        assert!(json.contains("\"acknowledged\":false"));
        assert!(!json.contains("\"acknowledgedAt\""));
    }
}
