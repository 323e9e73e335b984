use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User-facing events that fan out to push endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    BookingConfirmed {
        booking_id: Uuid,
        session_id: Uuid,
        starts_at: DateTime<Utc>,
    },
    BookingCancelled {
        booking_id: Uuid,
        session_id: Uuid,
    },
    MessageReceived {
        sender_name: String,
        preview: String,
    },
}

/// JSON body delivered to the push service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub tag: String,
}

const PREVIEW_CHARS: usize = 120;

impl From<&NotificationEvent> for PushPayload {
    fn from(event: &NotificationEvent) -> Self {
        match event {
            NotificationEvent::BookingConfirmed {
                booking_id,
                starts_at,
                ..
            } => PushPayload {
                title: "Booking confirmed".to_string(),
                body: format!(
                    "Your session on {} is booked.",
                    starts_at.format("%a %d %b, %H:%M UTC")
                ),
                url: "/bookings".to_string(),
                tag: format!("booking-{}", booking_id),
            },
            NotificationEvent::BookingCancelled { booking_id, .. } => PushPayload {
                title: "Booking cancelled".to_string(),
                body: "Your trainer cancelled one of your sessions.".to_string(),
                url: "/bookings".to_string(),
                tag: format!("booking-{}", booking_id),
            },
            NotificationEvent::MessageReceived {
                sender_name,
                preview,
            } => PushPayload {
                title: format!("New message from {}", sender_name),
                body: preview.chars().take(PREVIEW_CHARS).collect(),
                url: "/messages".to_string(),
                tag: "messages".to_string(),
            },
        }
    }
}

/// How a single push attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushDelivery {
    Delivered,
    /// 404/410 from the push service; the subscription will never work again.
    Gone,
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub pruned: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushEndpointKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Browser `PushSubscription.toJSON()` shape.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPushEndpointModel {
    pub endpoint: String,
    pub keys: PushEndpointKeys,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemovePushEndpointModel {
    pub endpoint: String,
}
