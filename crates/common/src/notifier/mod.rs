//! Cross-service drug notifier
//!
//! After a drug is stored locally, its joined projection is forwarded to the
//! inventory/execution service. The call is best-effort: any failure or
//! timeout becomes a negative [`Confirmation`] next to the created drug and
//! the local write stands.

use crate::db::models::DrugOut;
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Outcome reported back to the caller as `execs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub confirmation: bool,
    pub message: String,
}

impl Confirmation {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            confirmation: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("notification timed out after {0:?}")]
    Timeout(Duration),

    #[error("notification disabled")]
    Disabled,
}

/// Sink for drug-created events
#[async_trait]
pub trait DrugNotifier: Send + Sync {
    async fn drug_created(&self, drug: &DrugOut) -> Result<Confirmation, NotifyError>;
}

/// Optional value carried as `{"value": ...}`; absence is an explicit `null`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapped<T> {
    pub value: T,
}

fn wrap<T: Clone>(value: Option<&T>) -> Option<Wrapped<T>> {
    value.cloned().map(|value| Wrapped { value })
}

fn wrap_text(value: Option<&String>) -> Option<Wrapped<String>> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| Wrapped { value: v.clone() })
}

/// Wire shape sent to the execution service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugMessage {
    pub id: i64,
    pub brand_name: String,
    pub dose: String,

    pub api_id: i64,
    pub api_name: String,
    pub dosage_id: i64,
    pub dosage_name: String,
    pub route_id: i64,
    pub route_name: String,
    pub strength_id: i64,
    pub strength_name: String,

    pub authority_holder_id: Option<Wrapped<i64>>,
    pub authority_holder_name: Option<Wrapped<String>>,
    pub authority_holder_country: Option<Wrapped<String>>,

    pub manufacturing_site_id: Option<Wrapped<i64>>,
    pub manufacturing_site_name: Option<Wrapped<String>>,
    pub manufacturing_site_country: Option<Wrapped<String>>,

    pub marketing_id: Option<Wrapped<i64>>,
    pub marketing_name: Option<Wrapped<String>>,
    pub marketing_country: Option<Wrapped<String>>,
}

impl From<&DrugOut> for DrugMessage {
    fn from(d: &DrugOut) -> Self {
        Self {
            id: d.id,
            brand_name: d.brand_name.clone(),
            dose: d.dose.clone(),
            api_id: d.api_id,
            api_name: d.api_name.clone(),
            dosage_id: d.dosage_id,
            dosage_name: d.dosage_name.clone(),
            route_id: d.route_id,
            route_name: d.route_name.clone(),
            strength_id: d.strength_id,
            strength_name: d.strength_name.clone(),
            authority_holder_id: wrap(d.authority_holder_id.as_ref()),
            authority_holder_name: wrap_text(d.authority_holder_name.as_ref()),
            authority_holder_country: wrap_text(d.authority_holder_country.as_ref()),
            manufacturing_site_id: wrap(d.manufacturing_site_id.as_ref()),
            manufacturing_site_name: wrap_text(d.manufacturing_site_name.as_ref()),
            manufacturing_site_country: wrap_text(d.manufacturing_site_country.as_ref()),
            marketing_id: wrap(d.marketing_id.as_ref()),
            marketing_name: wrap_text(d.marketing_name.as_ref()),
            marketing_country: wrap_text(d.marketing_country.as_ref()),
        }
    }
}

/// HTTP client for the execution service
pub struct ExecsClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExecsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DrugNotifier for ExecsClient {
    async fn drug_created(&self, drug: &DrugOut) -> Result<Confirmation, NotifyError> {
        let url = format!("{}/drugs", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&DrugMessage::from(drug))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        Ok(response.json().await?)
    }
}

/// Used when no execution service is configured
pub struct DisabledNotifier;

#[async_trait]
impl DrugNotifier for DisabledNotifier {
    async fn drug_created(&self, _drug: &DrugOut) -> Result<Confirmation, NotifyError> {
        Err(NotifyError::Disabled)
    }
}

/// Notify under `timeout`, folding every failure into a negative confirmation.
///
/// Dropping the returned future cancels the in-flight call.
pub async fn notify_created(
    notifier: &dyn DrugNotifier,
    drug: &DrugOut,
    timeout: Duration,
) -> Confirmation {
    let start = Instant::now();

    let outcome = match tokio::time::timeout(timeout, notifier.drug_created(drug)).await {
        Ok(result) => result,
        Err(_) => Err(NotifyError::Timeout(timeout)),
    };

    let confirmation = match outcome {
        Ok(confirmation) => {
            info!(
                drug_id = drug.id,
                confirmed = confirmation.confirmation,
                "Drug notification delivered"
            );
            confirmation
        }
        Err(NotifyError::Disabled) => Confirmation::failed(NotifyError::Disabled.to_string()),
        Err(e) => {
            warn!(drug_id = drug.id, error = %e, "Drug notification failed");
            Confirmation::failed(e.to_string())
        }
    };

    metrics::record_notification(start.elapsed().as_secs_f64(), confirmation.confirmation);
    confirmation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::projection::fixtures::drug;
    use httpmock::prelude::*;
    use serde_json::{json, Value};

    fn with_marketing() -> DrugOut {
        let mut d = drug(7, "Amoxil");
        d.marketing_id = Some(5);
        d.marketing_name = Some("EMA-2025-001".into());
        d.marketing_country = Some(String::new());
        d
    }

    #[test]
    fn test_message_wraps_optionals_and_nulls_empty_text() {
        let value = serde_json::to_value(DrugMessage::from(&with_marketing())).unwrap();

        assert_eq!(value["marketing_id"], json!({ "value": 5 }));
        assert_eq!(value["marketing_name"], json!({ "value": "EMA-2025-001" }));
        assert_eq!(value["marketing_country"], Value::Null);
        assert_eq!(value["authority_holder_id"], Value::Null);
        assert!(value.as_object().unwrap().contains_key("manufacturing_site_name"));
        assert_eq!(value["api_name"], "Paracetamol");
    }

    #[tokio::test]
    async fn test_confirmation_passed_through() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/drugs")
                    .json_body_partial(r#"{"id": 7, "brand_name": "Amoxil"}"#);
                then.status(200)
                    .json_body(json!({ "confirmation": true, "message": "stored" }));
            })
            .await;

        let client = ExecsClient::new(server.base_url(), Duration::from_secs(3)).unwrap();
        let confirmation = notify_created(&client, &with_marketing(), Duration::from_secs(3)).await;

        mock.assert_async().await;
        assert_eq!(
            confirmation,
            Confirmation { confirmation: true, message: "stored".into() }
        );
    }

    #[tokio::test]
    async fn test_remote_error_becomes_negative_confirmation() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/drugs");
                then.status(503).body("unavailable");
            })
            .await;

        let client = ExecsClient::new(server.base_url(), Duration::from_secs(3)).unwrap();
        let confirmation = notify_created(&client, &drug(1, "Brufen"), Duration::from_secs(3)).await;

        assert!(!confirmation.confirmation);
        assert!(confirmation.message.contains("503"), "{}", confirmation.message);
    }

    #[tokio::test]
    async fn test_timeout_becomes_negative_confirmation() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/drugs");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({ "confirmation": true, "message": "late" }));
            })
            .await;

        let client = ExecsClient::new(server.base_url(), Duration::from_secs(3)).unwrap();
        let confirmation =
            notify_created(&client, &drug(1, "Brufen"), Duration::from_millis(50)).await;

        assert!(!confirmation.confirmation);
        assert!(confirmation.message.contains("timed out"), "{}", confirmation.message);
    }

    #[tokio::test]
    async fn test_disabled_notifier_reports_unconfirmed() {
        let confirmation =
            notify_created(&DisabledNotifier, &drug(1, "Brufen"), Duration::from_secs(1)).await;
        assert_eq!(confirmation, Confirmation::failed("notification disabled"));
    }
}
