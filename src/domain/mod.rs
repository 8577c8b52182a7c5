// Domain layer: cargo models and ports. No axum or reqwest types in here.

pub mod model;
pub mod ports;
