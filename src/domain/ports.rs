use crate::domain::model::{
    Alerts, CargoItem, CargoList, ImportReport, Metrics, NewCargo, Recommendation,
    RetrievalResult, ReturnPlan, ReturnPlanRequest, SimulationResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn timeout_secs(&self) -> u64;
    fn retry_attempts(&self) -> u32;
    fn retry_delay_ms(&self) -> u64;
}

/// Export payload formats offered by `/api/export/arrangement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Zip,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Zip => "zip",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::utils::error::StowageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "zip" => Ok(Self::Zip),
            other => Err(crate::utils::error::StowageError::validation(format!(
                "unsupported export format '{}', expected csv, json or zip",
                other
            ))),
        }
    }
}

/// Client-side view of the cargo API, one method per endpoint.
#[async_trait]
pub trait CargoApi: Send + Sync {
    async fn health(&self) -> Result<serde_json::Value>;
    async fn list_cargo(&self) -> Result<CargoList>;
    async fn add_cargo(&self, cargo: &NewCargo) -> Result<CargoItem>;
    async fn delete_cargo(&self, id: &str) -> Result<()>;
    async fn recommend(&self, cargo: &NewCargo) -> Result<Recommendation>;
    async fn return_plan(&self, request: &ReturnPlanRequest) -> Result<ReturnPlan>;
    async fn retrieve(&self, id: &str) -> Result<RetrievalResult>;
    async fn simulate(&self, days: i64) -> Result<SimulationResult>;
    async fn export_arrangement(&self, format: ExportFormat) -> Result<Vec<u8>>;
    async fn import_items(&self, items: &[NewCargo]) -> Result<ImportReport>;
    async fn alerts(&self) -> Result<Alerts>;
    async fn metrics(&self) -> Result<Metrics>;
}
