//! HTTP gateway client
//!
//! REST access to the hosted backend: exact-match column filters
//! (`?col=eq.value`) against the membership table and the joined view,
//! upsert-style writes with `Prefer: return=representation`, storage upload
//! with public-URL resolution, and a polling change feed for one record.

use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use shared::{MemberPayload, MemberRecord, MemberWithNames, ReferenceItem};

use super::{ChangeFeed, GatewayError, GatewayResult, MemberChange, MembershipGateway};
use crate::config::Config;

/// HTTP client for the remote data gateway.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
    view: String,
    bucket: String,
    poll_interval: Duration,
}

impl HttpGateway {
    pub fn new(config: &Config) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_s))
            .build()?;

        Ok(Self {
            client,
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            api_key: config.gateway_key.clone(),
            table: config.membership_table.clone(),
            view: config.membership_view.clone(),
            bucket: config.photo_bucket.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    fn rest_url(&self, relation: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, relation)
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    /// Map the HTTP response to a typed result in one place.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
                StatusCode::FORBIDDEN => Err(GatewayError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(GatewayError::NotFound(text)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(GatewayError::Validation(text))
                }
                _ => Err(GatewayError::Internal(text)),
            };
        }

        response.json().await.map_err(Into::into)
    }

    /// Fetch rows matching the natural key from a table or view.
    async fn rows_by_key<T: DeserializeOwned>(
        &self,
        relation: &str,
        civil_id: &str,
        dob: &str,
    ) -> GatewayResult<Vec<T>> {
        let request = self
            .client
            .get(self.rest_url(relation))
            .query(&[
                ("select", "*".to_string()),
                ("civil_id", format!("eq.{civil_id}")),
                ("dob", format!("eq.{dob}")),
            ]);
        Self::handle_response(self.auth(request).send().await?).await
    }

    async fn reference_list(&self, relation: &str) -> GatewayResult<Vec<ReferenceItem>> {
        let request = self.client.get(self.rest_url(relation)).query(&[
            ("select", "id,name".to_string()),
            ("order", "name".to_string()),
        ]);
        Self::handle_response(self.auth(request).send().await?).await
    }
}

#[async_trait::async_trait]
impl MembershipGateway for HttpGateway {
    async fn find_view(&self, civil_id: &str, dob: &str) -> GatewayResult<Option<MemberWithNames>> {
        let rows: Vec<MemberWithNames> = self.rows_by_key(&self.view, civil_id, dob).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_base(&self, civil_id: &str, dob: &str) -> GatewayResult<Option<MemberRecord>> {
        let rows: Vec<MemberRecord> = self.rows_by_key(&self.table, civil_id, dob).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, payload: &MemberPayload) -> GatewayResult<MemberRecord> {
        let request = self
            .client
            .post(self.rest_url(&self.table))
            .header("Prefer", "return=representation")
            .json(&[payload]);
        let rows: Vec<MemberRecord> = Self::handle_response(self.auth(request).send().await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidResponse("insert returned no row".into()))
    }

    async fn update(
        &self,
        civil_id: &str,
        dob: &str,
        payload: &MemberPayload,
    ) -> GatewayResult<MemberRecord> {
        let request = self
            .client
            .patch(self.rest_url(&self.table))
            .header("Prefer", "return=representation")
            .query(&[
                ("civil_id", format!("eq.{civil_id}")),
                ("dob", format!("eq.{dob}")),
            ])
            .json(payload);
        let rows: Vec<MemberRecord> = Self::handle_response(self.auth(request).send().await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(format!("member {civil_id}")))
    }

    async fn upload_photo(&self, filename: &str, bytes: Vec<u8>) -> GatewayResult<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, filename);
        let request = self
            .client
            .post(&url)
            .header("x-upsert", "true")
            .header(header::CONTENT_TYPE, "image/jpeg")
            .body(bytes);

        let response = self.auth(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Internal(format!("photo upload {status}: {text}")));
        }

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, filename
        ))
    }

    async fn districts(&self) -> GatewayResult<Vec<ReferenceItem>> {
        self.reference_list("district").await
    }

    async fn areas(&self) -> GatewayResult<Vec<ReferenceItem>> {
        self.reference_list("area").await
    }

    /// Change feed for one record.
    ///
    /// The transport is a bounded-interval poll of the view row; an event is
    /// pushed whenever the stored status differs from the last observed one.
    /// The poll task ends when the feed handle is dropped.
    async fn subscribe(&self, civil_id: &str, dob: &str) -> GatewayResult<ChangeFeed> {
        let (tx, rx) = mpsc::channel(16);
        let gateway = self.clone();
        let civil_id = civil_id.to_string();
        let dob = dob.to_string();

        let task = tokio::spawn(async move {
            let mut last_status = None;
            let mut ticker = tokio::time::interval(gateway.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let row = match gateway.find_view(&civil_id, &dob).await {
                    Ok(row) => row,
                    Err(e) => {
                        warn!(civil_id = %civil_id, error = %e, "change feed poll failed");
                        continue;
                    }
                };
                let Some(row) = row else { continue };

                match last_status {
                    None => last_status = Some(row.status),
                    Some(previous) if previous != row.status => {
                        debug!(civil_id = %civil_id, status = ?row.status, "status change detected");
                        last_status = Some(row.status);
                        if tx.send(MemberChange { status: row.status }).await.is_err() {
                            break;
                        }
                    }
                    Some(_) => {}
                }
            }
        });

        Ok(ChangeFeed::new(rx, Some(task)))
    }
}
