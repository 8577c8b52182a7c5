#[cfg(feature = "cli")]
pub mod cli;
pub mod layout;

#[cfg(feature = "cli")]
pub use cli::{ClientConfig, Command, LocalStorage, ServerConfig};
pub use layout::LayoutConfig;
