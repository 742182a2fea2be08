use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnknownVariant;

/// Delivery state of an invitation link.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Superseded,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Superseded => "superseded",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            "superseded" => Ok(DeliveryStatus::Superseded),
            other => Err(UnknownVariant::new("delivery status", other)),
        }
    }
}

/// A tokenized link granting a candidate access to one stage event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    pub event_id: String,
    /// Opaque token; resolves to exactly one event.
    pub token: String,
    pub meeting_link: String,
    pub expires_at: DateTime<Utc>,
    pub delivery_status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Issues a new invitation with a fresh token expiring `ttl` after `now`.
    pub fn issue(event_id: &str, meeting_link: &str, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: event_id.to_string(),
            token: Uuid::new_v4().to_string(),
            meeting_link: meeting_link.to_string(),
            expires_at: now + ttl,
            delivery_status: DeliveryStatus::Pending,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the token may still be handed out.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && self.delivery_status != DeliveryStatus::Superseded
    }
}
