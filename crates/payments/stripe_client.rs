use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signatures older or newer than this are replays.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verifies and decodes Stripe webhook deliveries.
pub struct StripeWebhooks {
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: Option<String>,
    pub subscription: Option<String>,
    pub customer: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct StripeInvoice {
    pub id: Option<String>,
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: Option<String>,
}

impl StripeWebhooks {
    pub fn new(webhook_secret: String) -> Self {
        Self { webhook_secret }
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent> {
        self.verify_at(payload, signature_header, Utc::now().timestamp())
    }

    pub(crate) fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let part = part.trim();
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest);
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signatures.push(rest);
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| anyhow!("missing timestamp in stripe-signature"))?;
        if signatures.is_empty() {
            bail!("missing v1 in stripe-signature");
        }

        let issued_at: i64 = timestamp
            .parse()
            .map_err(|_| anyhow!("malformed timestamp in stripe-signature"))?;
        if (now - issued_at).abs() > SIGNATURE_TOLERANCE_SECS {
            bail!("stripe-signature timestamp outside tolerance");
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        // Stripe sends one v1 per active secret during rotation.
        let matched = signatures.iter().any(|signature| {
            hex::decode(signature)
                .map(|provided| mac.clone().verify_slice(&provided).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            bail!("invalid webhook signature");
        }

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }

    pub fn extract_checkout_session(event: &StripeEvent) -> Option<StripeCheckoutSession> {
        serde_json::from_value(event.data.object.clone()).ok()
    }

    pub fn extract_invoice(event: &StripeEvent) -> Option<StripeInvoice> {
        serde_json::from_value(event.data.object.clone()).ok()
    }

    pub fn extract_subscription(event: &StripeEvent) -> Option<StripeSubscription> {
        serde_json::from_value(event.data.object.clone()).ok()
    }
}

#[cfg(test)]
pub(crate) fn sign_for_test(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={},v1={}", timestamp, signature)
}
