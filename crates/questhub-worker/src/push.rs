//! Push service clients.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use questhub_core::config::PushConfig;
use questhub_core::error::{AppError, ErrorKind};
use questhub_core::result::AppResult;
use questhub_core::traits::PushNotifier;
use questhub_core::types::UserId;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewNotificationsRequest<'a> {
    user_ids: &'a [UserId],
}

/// Posts the "new notifications" signal to the push service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPushNotifier {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpPushNotifier {
    /// Build a client with the configured endpoint and request timeout.
    pub fn new(config: &PushConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build push client", e)
            })?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl PushNotifier for HttpPushNotifier {
    async fn notify_new_notifications(&self, user_ids: &[UserId]) -> AppResult<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&NewNotificationsRequest { user_ids })
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Push service unreachable", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "Push service returned {}",
                status
            )));
        }

        debug!(endpoint = %self.endpoint, users = user_ids.len(), "Push signal accepted");
        Ok(())
    }
}

/// Stands in for the push service when it is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPushNotifier;

#[async_trait]
impl PushNotifier for DisabledPushNotifier {
    async fn notify_new_notifications(&self, user_ids: &[UserId]) -> AppResult<()> {
        info!(users = user_ids.len(), "Push disabled, signal dropped");
        Ok(())
    }
}

/// Pick the push client for `config`.
pub fn notifier_from_config(config: &PushConfig) -> AppResult<Arc<dyn PushNotifier>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledPushNotifier));
    }
    Ok(Arc::new(HttpPushNotifier::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_uses_camel_case() {
        let ids = [UserId::new()];
        let body = serde_json::to_value(NewNotificationsRequest { user_ids: &ids }).unwrap();
        assert_eq!(body["userIds"][0], serde_json::json!(ids[0].to_string()));
    }

    #[tokio::test]
    async fn test_disabled_notifier_accepts_everything() {
        let notifier = DisabledPushNotifier;
        assert!(notifier.notify_new_notifications(&[UserId::new()]).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_external_service_error() {
        let notifier = HttpPushNotifier::new(&PushConfig {
            enabled: true,
            endpoint: "http://127.0.0.1:9/notifications".to_string(),
            timeout_seconds: 1,
        })
        .unwrap();

        let err = notifier
            .notify_new_notifications(&[UserId::new()])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
    }

    #[test]
    fn test_disabled_config_selects_disabled_notifier() {
        let config = PushConfig {
            enabled: false,
            ..Default::default()
        };
        let notifier = notifier_from_config(&config).unwrap();
        assert_eq!(format!("{:?}", notifier), "DisabledPushNotifier");
    }
}
