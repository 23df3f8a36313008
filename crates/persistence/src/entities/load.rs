//! Load entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{Load, LoadStatus, LoadStatusHistory, Stop};

use super::parse_enum;

/// Database row mapping for the loads table.
#[derive(Debug, Clone, FromRow)]
pub struct LoadEntity {
    pub load_id: Uuid,
    pub reference: String,
    pub customer_id: Uuid,
    pub carrier_id: Uuid,
    pub load_type: Option<String>,
    pub status: String,
    pub status_before_exception: Option<String>,
    pub pickup_address: String,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub pickup_window_start: Option<DateTime<Utc>>,
    pub pickup_window_end: Option<DateTime<Utc>>,
    pub delivery_address: String,
    pub delivery_latitude: f64,
    pub delivery_longitude: f64,
    pub delivery_window_start: Option<DateTime<Utc>>,
    pub delivery_window_end: Option<DateTime<Utc>>,
    pub linehaul_rate: f64,
    pub fuel_surcharge: f64,
    pub total_charge: f64,
    pub driver_id: Option<Uuid>,
    pub tractor_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub pod_document_id: Option<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LoadEntity> for Load {
    type Error = DomainError;

    fn try_from(entity: LoadEntity) -> Result<Self, Self::Error> {
        let status: LoadStatus = parse_enum(&entity.status, "loads.status")?;
        let status_before_exception = entity
            .status_before_exception
            .as_deref()
            .map(|s| parse_enum(s, "loads.status_before_exception"))
            .transpose()?;

        Ok(Load {
            load_id: entity.load_id,
            reference: entity.reference,
            customer_id: entity.customer_id,
            carrier_id: entity.carrier_id,
            load_type: entity.load_type,
            status,
            status_before_exception,
            pickup: Stop {
                address: entity.pickup_address,
                latitude: entity.pickup_latitude,
                longitude: entity.pickup_longitude,
                window_start: entity.pickup_window_start,
                window_end: entity.pickup_window_end,
            },
            delivery: Stop {
                address: entity.delivery_address,
                latitude: entity.delivery_latitude,
                longitude: entity.delivery_longitude,
                window_start: entity.delivery_window_start,
                window_end: entity.delivery_window_end,
            },
            linehaul_rate: entity.linehaul_rate,
            fuel_surcharge: entity.fuel_surcharge,
            total_charge: entity.total_charge,
            driver_id: entity.driver_id,
            tractor_id: entity.tractor_id,
            trailer_id: entity.trailer_id,
            picked_up_at: entity.picked_up_at,
            delivered_at: entity.delivered_at,
            pod_document_id: entity.pod_document_id,
            version: entity.version,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

/// Database row mapping for the load_status_history table.
#[derive(Debug, Clone, FromRow)]
pub struct LoadStatusHistoryEntity {
    pub id: i64,
    pub load_id: Uuid,
    pub previous_status: String,
    pub new_status: String,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    pub automatic: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reason: Option<String>,
}

impl TryFrom<LoadStatusHistoryEntity> for LoadStatusHistory {
    type Error = DomainError;

    fn try_from(entity: LoadStatusHistoryEntity) -> Result<Self, Self::Error> {
        Ok(LoadStatusHistory {
            id: entity.id,
            load_id: entity.load_id,
            previous_status: parse_enum(&entity.previous_status, "load_status_history.previous_status")?,
            new_status: parse_enum(&entity.new_status, "load_status_history.new_status")?,
            changed_at: entity.changed_at,
            changed_by: entity.changed_by,
            automatic: entity.automatic,
            latitude: entity.latitude,
            longitude: entity.longitude,
            reason: entity.reason,
        })
    }
}
