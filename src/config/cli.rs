use crate::domain::model::NewCargo;
use crate::domain::ports::{ConfigProvider, ExportFormat, Storage};
use crate::utils::error::{Result, StowageError};
use crate::utils::validation::{
    validate_file_extensions, validate_path, validate_range, validate_url, Validate,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "stowage")]
#[command(about = "Cargo placement and inventory API for the station hold")]
pub struct ServerConfig {
    #[arg(long, env = "STOWAGE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: String,

    #[arg(long, env = "STOWAGE_LAYOUT", help = "Warehouse layout TOML")]
    pub layout: Option<String>,

    #[arg(long, env = "DEBUG_MODE", help = "Enable verbose output")]
    pub debug: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub log_json: bool,

    #[arg(long, help = "Sample process CPU/memory")]
    pub monitor: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e: std::net::AddrParseError| StowageError::InvalidValueError {
                field: "bind".to_string(),
                value: self.bind.clone(),
                reason: e.to_string(),
            })
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if let Some(layout) = &self.layout {
            validate_path("layout", layout)?;
            validate_file_extensions("layout", std::slice::from_ref(layout), &["toml"])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "stowage-client")]
#[command(about = "Command-line client for the stowage API")]
pub struct ClientConfig {
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000/api")]
    pub api_base_url: String,

    #[arg(long, env = "REFRESH_INTERVAL", default_value = "300", help = "Seconds between watch refreshes")]
    pub refresh_interval: u64,

    #[arg(long, default_value = "10", help = "Request timeout in seconds")]
    pub timeout: u64,

    #[arg(long, default_value = "3")]
    pub retries: u32,

    #[arg(long, default_value = "500")]
    pub retry_delay_ms: u64,

    #[arg(long, env = "DEBUG_MODE", help = "Enable verbose output")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check API health
    Health,
    /// List stored cargo
    List,
    /// Ask for a placement without storing
    Recommend(CargoArgs),
    /// Store a new item at the recommended slot
    Add(CargoArgs),
    /// Delete an item
    Delete { id: String },
    /// Retrieve an item and print the unstacking steps
    Retrieve { id: String },
    /// Plan which expiring cargo goes on the return vehicle
    ReturnPlan {
        #[arg(long, default_value = "7")]
        days_threshold: i64,
        #[arg(long, default_value = "500")]
        max_weight: f64,
        #[arg(long, default_value = "0")]
        priority_threshold: u32,
    },
    /// Advance the simulated clock
    Simulate {
        #[arg(long, default_value = "1")]
        days: i64,
    },
    /// Download the current arrangement
    Export {
        #[arg(long, default_value = "zip")]
        format: String,
        #[arg(long, default_value = "./output")]
        output_dir: String,
    },
    /// Bulk import cargo from a CSV manifest
    Import {
        file: String,
        #[arg(long, help = "Write the import report as JSON")]
        report: Option<String>,
    },
    /// Poll health and metrics every refresh interval
    Watch,
}

#[derive(Debug, Clone, Args)]
pub struct CargoArgs {
    pub name: String,
    #[arg(long, help = "Volume in m³")]
    pub size: f64,
    #[arg(long)]
    pub priority: u32,
    #[arg(long, default_value = "30")]
    pub expiry_days: u32,
    #[arg(long)]
    pub temperature_sensitive: bool,
    #[arg(long)]
    pub hazardous: bool,
    #[arg(long)]
    pub fragile: bool,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub zone: Option<String>,
    #[arg(long)]
    pub mass: Option<f64>,
    #[arg(long)]
    pub id: Option<String>,
}

impl From<CargoArgs> for NewCargo {
    fn from(args: CargoArgs) -> Self {
        Self {
            id: args.id,
            expiry_days: args.expiry_days,
            temperature_sensitive: args.temperature_sensitive,
            hazardous: args.hazardous,
            fragile: args.fragile,
            description: args.description,
            zone: args.zone,
            mass: args.mass,
            ..NewCargo::new(args.name, args.size, args.priority)
        }
    }
}

impl ConfigProvider for ClientConfig {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout
    }

    fn retry_attempts(&self) -> u32 {
        self.retries
    }

    fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_base_url", &self.api_base_url)?;
        validate_range("refresh_interval", self.refresh_interval, 30, 3600)?;
        validate_range("timeout", self.timeout, 1, 300)?;
        validate_range("retries", self.retries, 0, 10)?;

        match &self.command {
            Command::Import { file, report } => {
                validate_path("file", file)?;
                validate_file_extensions("file", std::slice::from_ref(file), &["csv"])?;
                if let Some(report) = report {
                    validate_path("report", report)?;
                }
            }
            Command::Export { format, output_dir } => {
                format.parse::<ExportFormat>()?;
                validate_path("output_dir", output_dir)?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(args: &[&str]) -> ClientConfig {
        let mut argv = vec!["stowage-client"];
        argv.extend_from_slice(args);
        ClientConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_client_defaults() {
        let config = client(&["--api-base-url", "http://localhost:8000/api", "health"]);

        assert_eq!(config.timeout_secs(), 10);
        assert_eq!(config.retry_attempts(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_refresh_interval_range() {
        let config = client(&[
            "--api-base-url",
            "http://localhost:8000/api",
            "--refresh-interval",
            "10",
            "watch",
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_add_arguments_map_to_new_cargo() {
        let config = client(&[
            "add",
            "Insulin",
            "--size",
            "0.5",
            "--priority",
            "95",
            "--temperature-sensitive",
            "--zone",
            "A",
        ]);

        let Command::Add(args) = config.command else {
            panic!("expected add command");
        };
        let cargo = NewCargo::from(args);
        assert_eq!(cargo.name, "Insulin");
        assert_eq!(cargo.priority, 95);
        assert!(cargo.temperature_sensitive);
        assert_eq!(cargo.zone.as_deref(), Some("A"));
        assert_eq!(cargo.expiry_days, 30);
    }

    #[test]
    fn test_import_requires_csv_file() {
        let config = client(&["--api-base-url", "http://localhost:8000/api", "import", "manifest.xlsx"]);
        assert!(config.validate().is_err());

        let config = client(&["--api-base-url", "http://localhost:8000/api", "export", "--format", "pdf"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_bind_validation() {
        let config = ServerConfig::try_parse_from(["stowage", "--bind", "127.0.0.1:9000"]).unwrap();
        assert_eq!(config.socket_addr().unwrap().port(), 9000);
        assert!(config.validate().is_ok());

        let config = ServerConfig::try_parse_from(["stowage", "--bind", "not-an-address"]).unwrap();
        assert!(config.validate().is_err());

        let config =
            ServerConfig::try_parse_from(["stowage", "--bind", "127.0.0.1:9000", "--layout", "hold.yaml"]).unwrap();
        assert!(config.validate().is_err());
    }
}
