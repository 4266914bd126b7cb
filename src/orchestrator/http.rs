//! REST client for the schedule backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use super::api::ScheduleApi;
use super::rows::{AvailabilityRecord, RowId, ScheduleRow, StoredRow};
use crate::config::ApiConfig;
use crate::error::{ScheduleError, ScheduleResult};

#[derive(Deserialize)]
struct Created {
    id: RowId,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// [`ScheduleApi`] over HTTP.
pub struct HttpScheduleApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpScheduleApi {
    /// Builds a client for `config.base_url`.
    ///
    /// ## Errors
    /// Returns a network error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> ScheduleResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, op: &str) -> ScheduleResult<Response> {
        let resp = self.authorized(request).send().await?;

        let status = resp.status();
        if status.is_success() {
            debug!(op, status = status.as_u16(), "schedule API call succeeded");
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        warn!(op, status = status.as_u16(), body = %text, "schedule API error");
        Err(ScheduleError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ScheduleApi for HttpScheduleApi {
    async fn create_schedule(&self, row: &ScheduleRow) -> ScheduleResult<RowId> {
        let request = self.client.post(self.url("schedules")).json(row);
        let created: Created = self.send(request, "create_schedule").await?.json().await?;
        Ok(created.id)
    }

    async fn update_schedule(&self, id: RowId, row: &ScheduleRow) -> ScheduleResult<()> {
        let request = self.client.put(self.url(&format!("schedules/{}", id))).json(row);
        self.send(request, "update_schedule").await?;
        Ok(())
    }

    async fn delete_schedule(&self, id: RowId) -> ScheduleResult<()> {
        let request = self.client.delete(self.url(&format!("schedules/{}", id)));
        self.send(request, "delete_schedule").await?;
        Ok(())
    }

    async fn list_schedules(&self) -> ScheduleResult<Vec<StoredRow>> {
        let request = self.client.get(self.url("schedules"));
        Ok(self.send(request, "list_schedules").await?.json().await?)
    }

    async fn list_teacher_availabilities(&self) -> ScheduleResult<Vec<AvailabilityRecord>> {
        let request = self.client.get(self.url("teacher-availabilities"));
        Ok(self.send(request, "list_teacher_availabilities").await?.json().await?)
    }
}
