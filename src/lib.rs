pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{ClientConfig, LocalStorage, ServerConfig};

pub use client::HttpCargoClient;
pub use config::LayoutConfig;
pub use core::{ImportJob, Inventory, PlacementEngine};
pub use server::{create_router, AppState};
pub use utils::error::{Result, StowageError};
