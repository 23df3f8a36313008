//! Real-time notification gateway.
//!
//! Topic-keyed fan-out of domain events to subscribed observers. Delivery is
//! at-most-once and best-effort: no persistence, no replay. A subscriber that
//! disconnects misses events published while it was away; closed channels are
//! pruned on the next publish to their topic.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::{
    ComplianceAlertResponse, DriverLocationResponse, GeofenceAlertResponse, LoadStatus,
};

/// Subscription topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Events about a single driver (location, zone edges).
    Driver(Uuid),
    /// Events about a single proof-of-delivery document.
    Pod(Uuid),
    /// Latest position of every actively dispatched driver.
    AllTrackers,
    /// Everything: dashboards that want the firehose.
    Global,
}

/// Payload of a load status change on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatusChangedEvent {
    pub load_id: Uuid,
    pub previous_status: LoadStatus,
    pub new_status: LoadStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    pub automatic: bool,
}

/// A pushed event. The tag/data envelope is the wire shape the SSE transport
/// forwards verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum PushEvent {
    LocationUpdated(DriverLocationResponse),
    ZoneEntered(GeofenceAlertResponse),
    ZoneExited(GeofenceAlertResponse),
    AlertAcknowledged(GeofenceAlertResponse),
    LoadStatusChanged(LoadStatusChangedEvent),
    PodReceived(LoadStatusChangedEvent),
    ComplianceAlert(ComplianceAlertResponse),
}

type SubscriberMap = HashMap<Topic, HashMap<String, mpsc::UnboundedSender<PushEvent>>>;

/// Topic registry with best-effort fan-out.
#[derive(Default)]
pub struct TrackingGateway {
    subscribers: Mutex<SubscriberMap>,
}

impl TrackingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `subscriber_id` on `topic` and returns the event receiver.
    /// Re-subscribing under the same id replaces the previous channel.
    pub fn subscribe(
        &self,
        subscriber_id: &str,
        topic: Topic,
    ) -> mpsc::UnboundedReceiver<PushEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subs = self.lock();
        subs.entry(topic)
            .or_default()
            .insert(subscriber_id.to_string(), tx);
        tracing::debug!(subscriber = subscriber_id, ?topic, "subscriber registered");
        rx
    }

    pub fn unsubscribe(&self, subscriber_id: &str, topic: Topic) {
        let mut subs = self.lock();
        if let Some(channels) = subs.get_mut(&topic) {
            channels.remove(subscriber_id);
            if channels.is_empty() {
                subs.remove(&topic);
            }
        }
    }

    /// Delivers `event` to every live subscriber of `topic`, pruning closed
    /// channels. Returns the number of subscribers reached.
    pub fn publish(&self, topic: Topic, event: &PushEvent) -> usize {
        let mut subs = self.lock();
        let Some(channels) = subs.get_mut(&topic) else {
            return 0;
        };

        let mut delivered = 0;
        channels.retain(|subscriber_id, tx| match tx.send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                tracing::debug!(subscriber = subscriber_id, ?topic, "pruning closed subscriber");
                false
            }
        });
        if channels.is_empty() {
            subs.remove(&topic);
        }
        delivered
    }

    /// Delivers `event` to a single subscriber of `topic`. Used for the
    /// snapshot push on subscribe. Returns false if the subscriber is gone.
    pub fn send_to(&self, subscriber_id: &str, topic: Topic, event: &PushEvent) -> bool {
        let subs = self.lock();
        subs.get(&topic)
            .and_then(|channels| channels.get(subscriber_id))
            .map(|tx| tx.send(event.clone()).is_ok())
            .unwrap_or(false)
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.lock().get(&topic).map(|c| c.len()).unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SubscriberMap> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location_event(driver_id: Uuid) -> PushEvent {
        PushEvent::LocationUpdated(DriverLocationResponse {
            driver_id,
            latitude: 43.6150,
            longitude: -116.2023,
            accuracy: 5.0,
            speed: None,
            heading: None,
            dispatch_id: None,
            recorded_at: Utc::now(),
            source: "mobile".to_string(),
        })
    }

    #[tokio::test]
    async fn test_publish_reaches_topic_subscribers_only() {
        let gateway = TrackingGateway::new();
        let driver_id = Uuid::new_v4();

        let mut rx = gateway.subscribe("dash-1", Topic::Driver(driver_id));
        let mut other = gateway.subscribe("dash-2", Topic::Driver(Uuid::new_v4()));

        let delivered = gateway.publish(Topic::Driver(driver_id), &location_event(driver_id));
        assert_eq!(delivered, 1);
        assert!(rx.try_recv().is_ok());
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let gateway = TrackingGateway::new();
        assert_eq!(gateway.publish(Topic::Global, &location_event(Uuid::new_v4())), 0);
    }

    #[tokio::test]
    async fn test_closed_subscribers_pruned_on_publish() {
        let gateway = TrackingGateway::new();
        let rx = gateway.subscribe("gone", Topic::AllTrackers);
        drop(rx);

        assert_eq!(gateway.subscriber_count(Topic::AllTrackers), 1);
        let delivered = gateway.publish(Topic::AllTrackers, &location_event(Uuid::new_v4()));
        assert_eq!(delivered, 0);
        assert_eq!(gateway.subscriber_count(Topic::AllTrackers), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let gateway = TrackingGateway::new();
        let _rx = gateway.subscribe("dash-1", Topic::Global);
        gateway.unsubscribe("dash-1", Topic::Global);
        assert_eq!(gateway.subscriber_count(Topic::Global), 0);
    }

    #[tokio::test]
    async fn test_send_to_single_subscriber() {
        let gateway = TrackingGateway::new();
        let driver_id = Uuid::new_v4();
        let mut rx = gateway.subscribe("dash-1", Topic::Driver(driver_id));
        let mut rx2 = gateway.subscribe("dash-2", Topic::Driver(driver_id));

        assert!(gateway.send_to("dash-1", Topic::Driver(driver_id), &location_event(driver_id)));
        assert!(rx.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());

        assert!(!gateway.send_to("missing", Topic::Driver(driver_id), &location_event(driver_id)));
    }

    #[test]
    fn test_event_envelope_shape() {
        let json = serde_json::to_string(&location_event(Uuid::nil())).unwrap();
        assert!(json.contains("\"event\":\"location-updated\""));
        assert!(json.contains("\"data\":{"));
    }
}
