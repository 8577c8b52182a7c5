//! HTTP implementation of [`CargoApi`].

use crate::domain::model::{
    Alerts, CargoItem, CargoList, ImportReport, Metrics, NewCargo, Recommendation,
    RetrievalResult, ReturnPlan, ReturnPlanRequest, SimulateRequest, SimulationResult,
};
use crate::domain::ports::{CargoApi, ConfigProvider, ExportFormat};
use crate::utils::error::{Result, StowageError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Health checks never wait longer than this.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpCargoClient<C: ConfigProvider> {
    client: Client,
    config: C,
}

impl<C: ConfigProvider> HttpCargoClient<C> {
    pub fn new(config: C) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(self.config.api_base_url())
            .map_err(|e| StowageError::config(format!("invalid api_base_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StowageError::config("api_base_url cannot be used as a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request built by `build`, retrying up to `retry_attempts`
    /// more times. Connection failures are always retried; timeouts and 5xx
    /// responses only for idempotent methods, so a POST is never replayed.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let attempts = self.config.retry_attempts() + 1;
        let delay = Duration::from_millis(self.config.retry_delay_ms());

        let mut attempt = 1;
        loop {
            let request = build().build()?;
            let idempotent = request.method().is_idempotent();

            let error = match self.client.execute(request).await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    StowageError::ApiStatusError { status, body }
                }
                Err(e) => StowageError::ApiError(e),
            };

            if attempt >= attempts || !error.is_retryable(idempotent) {
                return Err(error);
            }

            tracing::warn!(
                "⚠️ Request failed (attempt {}/{}): {}, retrying in {}ms",
                attempt,
                attempts,
                error,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn json<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let response = self.send(build).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl<C: ConfigProvider> CargoApi for HttpCargoClient<C> {
    async fn health(&self) -> Result<serde_json::Value> {
        let url = self.endpoint(&["health"])?;
        let timeout = HEALTH_TIMEOUT.min(Duration::from_secs(self.config.timeout_secs()));
        self.json(|| self.client.get(url.clone()).timeout(timeout)).await
    }

    async fn list_cargo(&self) -> Result<CargoList> {
        let url = self.endpoint(&["get_cargo"])?;
        self.json(|| self.client.get(url.clone())).await
    }

    async fn add_cargo(&self, cargo: &NewCargo) -> Result<CargoItem> {
        let url = self.endpoint(&["add_cargo"])?;
        tracing::debug!("Adding cargo '{}'", cargo.name);
        self.json(|| self.client.post(url.clone()).json(cargo)).await
    }

    async fn delete_cargo(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["delete_cargo", id])?;
        self.send(|| self.client.delete(url.clone())).await?;
        Ok(())
    }

    async fn recommend(&self, cargo: &NewCargo) -> Result<Recommendation> {
        let url = self.endpoint(&["placement"])?;
        self.json(|| self.client.post(url.clone()).json(cargo)).await
    }

    async fn return_plan(&self, request: &ReturnPlanRequest) -> Result<ReturnPlan> {
        let url = self.endpoint(&["waste", "return-plan"])?;
        self.json(|| self.client.post(url.clone()).json(request)).await
    }

    async fn retrieve(&self, id: &str) -> Result<RetrievalResult> {
        let url = self.endpoint(&["retrieve", id])?;
        self.json(|| self.client.post(url.clone())).await
    }

    async fn simulate(&self, days: i64) -> Result<SimulationResult> {
        let url = self.endpoint(&["simulate", "day"])?;
        let request = SimulateRequest { days };
        self.json(|| self.client.post(url.clone()).json(&request)).await
    }

    async fn export_arrangement(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let mut url = self.endpoint(&["export", "arrangement"])?;
        url.query_pairs_mut().append_pair("format", format.as_str());

        let response = self.send(|| self.client.get(url.clone())).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn import_items(&self, items: &[NewCargo]) -> Result<ImportReport> {
        let url = self.endpoint(&["import", "items"])?;
        let body = serde_json::json!({ "items": items });
        tracing::debug!("Importing {} items", items.len());
        self.json(|| self.client.post(url.clone()).json(&body)).await
    }

    async fn alerts(&self) -> Result<Alerts> {
        let url = self.endpoint(&["alerts"])?;
        self.json(|| self.client.get(url.clone())).await
    }

    async fn metrics(&self) -> Result<Metrics> {
        let url = self.endpoint(&["metrics"])?;
        self.json(|| self.client.get(url.clone())).await
    }
}
