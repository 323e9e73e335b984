use anyhow::{Result, anyhow};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

use crate::domain::value_objects::notifications::{PushDelivery, PushPayload};

/// Seconds the push service may hold an undelivered message.
const PUSH_TTL_SECS: u32 = 60 * 60 * 24;

/// Posts the JSON payload as-is: no VAPID auth or aes128gcm encryption, so the stored
/// `p256dh`/`auth` keys go unused and real browser push services will reject it.
pub struct WebPushClient {
    client: Client,
}

impl WebPushClient {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }

    pub async fn deliver(&self, endpoint: &str, payload: &PushPayload) -> PushDelivery {
        let endpoint = match Url::parse(endpoint) {
            Ok(url) => url,
            Err(_) => return PushDelivery::Failed("endpoint is not a valid url".to_string()),
        };

        let response = self
            .client
            .post(endpoint)
            .header("TTL", PUSH_TTL_SECS.to_string())
            .json(payload)
            .send()
            .await;

        match response {
            Ok(response) => classify_status(response.status()),
            Err(err) => PushDelivery::Failed(sanitize_reqwest_error(err).to_string()),
        }
    }
}

pub fn classify_status(status: StatusCode) -> PushDelivery {
    if status.is_success() {
        return PushDelivery::Delivered;
    }
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => PushDelivery::Gone,
        other => PushDelivery::Failed(format!("push service returned {}", other)),
    }
}

// Endpoint URLs carry per-device tokens; keep them out of error text.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("push request timed out");
    }
    if error.is_connect() {
        return anyhow!("push service connection failed");
    }
    anyhow!("push request failed")
}

/// Only https endpoints are accepted at registration.
pub fn validate_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).map_err(|_| anyhow!("Invalid push endpoint"))?;
    if url.scheme() != "https" || url.host_str().is_none() {
        return Err(anyhow!("Push endpoint must be an https url"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gone_statuses_mark_endpoint_for_pruning() {
        assert_eq!(classify_status(StatusCode::GONE), PushDelivery::Gone);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), PushDelivery::Gone);
    }

    #[test]
    fn success_and_transient_statuses() {
        assert_eq!(classify_status(StatusCode::CREATED), PushDelivery::Delivered);
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            PushDelivery::Failed(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            PushDelivery::Failed(_)
        ));
    }

    #[test]
    fn endpoint_must_be_https() {
        assert!(validate_endpoint("https://push.example.com/abc").is_ok());
        assert!(validate_endpoint("http://push.example.com/abc").is_err());
        assert!(validate_endpoint("not a url").is_err());
    }
}
