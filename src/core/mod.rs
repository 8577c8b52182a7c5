pub mod arrangement;
pub mod geometry;
pub mod import;
pub mod inventory;
pub mod placement;
pub mod simulation;
pub mod waste;

pub use crate::domain::ports::{CargoApi, ConfigProvider, Storage};
pub use crate::utils::error::Result;
pub use import::ImportJob;
pub use inventory::Inventory;
pub use placement::PlacementEngine;
