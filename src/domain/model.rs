use crate::utils::error::{Result, StowageError};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point in the hold, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Box extents: `width` along x, `depth` along y, `height` along z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn cube_of_volume(volume: f64) -> Self {
        let side = volume.cbrt();
        Self {
            width: side,
            depth: side,
            height: side,
        }
    }

    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }
}

/// A labelled storage region of the hold.
///
/// `y` is measured from the zone's access face, so `origin.y` is the face
/// crew members reach in from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub origin: [f64; 3],
    pub size: [f64; 3],
    #[serde(default)]
    pub temperature_controlled: bool,
    #[serde(default)]
    pub hazard_rated: bool,
    #[serde(default)]
    pub priority_access: bool,
}

impl Zone {
    pub fn volume(&self) -> f64 {
        self.size[0] * self.size[1] * self.size[2]
    }

    /// Matches either the short id ("A") or the display name ("Zone A").
    pub fn matches(&self, key: &str) -> bool {
        let key = key.trim();
        self.id.eq_ignore_ascii_case(key) || self.name.eq_ignore_ascii_case(key)
    }
}

/// Payload for placement, add and import requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCargo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub size: f64,
    pub priority: u32,
    #[serde(default = "default_expiry_days")]
    pub expiry_days: u32,
    #[serde(default)]
    pub temperature_sensitive: bool,
    #[serde(default)]
    pub hazardous: bool,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
}

pub fn default_expiry_days() -> u32 {
    30
}

impl NewCargo {
    pub fn new(name: impl Into<String>, size: f64, priority: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            size,
            priority,
            expiry_days: default_expiry_days(),
            temperature_sensitive: false,
            hazardous: false,
            fragile: false,
            description: String::new(),
            zone: None,
            width: None,
            depth: None,
            height: None,
            mass: None,
        }
    }

    /// Explicit dimensions when all three were given, otherwise a cube.
    pub fn dimensions(&self) -> Dimensions {
        match (self.width, self.depth, self.height) {
            (Some(width), Some(depth), Some(height)) => Dimensions {
                width,
                depth,
                height,
            },
            _ => Dimensions::cube_of_volume(self.size),
        }
    }
}

impl Validate for NewCargo {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)?;
        validate_range("size", self.size, 0.1, 10.0)?;
        validate_range("priority", self.priority, 1, 100)?;
        validate_range("expiry_days", self.expiry_days, 1, 365)?;

        if let Some(id) = &self.id {
            validate_non_empty_string("id", id)?;
        }
        if let Some(mass) = self.mass {
            validate_range("mass", mass, 0.001, 100_000.0)?;
        }

        // 尺寸必須三個都給或都不給
        match (self.width, self.depth, self.height) {
            (None, None, None) => {}
            (Some(width), Some(depth), Some(height)) => {
                validate_range("width", width, 0.01, 100.0)?;
                validate_range("depth", depth, 0.01, 100.0)?;
                validate_range("height", height, 0.01, 100.0)?;
            }
            _ => {
                return Err(StowageError::validation(
                    "width, depth and height must be given together",
                ))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryStatus {
    Critical,
    Warning,
    Good,
}

impl ExpiryStatus {
    pub fn from_days_remaining(days: i64) -> Self {
        if days <= 3 {
            Self::Critical
        } else if days <= 7 {
            Self::Warning
        } else {
            Self::Good
        }
    }
}

/// A stored cargo item. Field names follow what dashboards consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoItem {
    pub id: String,
    pub name: String,
    pub size: f64,
    pub priority: u32,
    pub mass: f64,
    pub temperature_sensitive: bool,
    pub hazardous: bool,
    pub fragile: bool,
    pub description: String,
    pub zone: String,
    pub zone_id: String,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub expiry_date: NaiveDate,
    /// Days remaining, refreshed whenever the item is read out.
    pub expiry_days: i64,
    pub status: ExpiryStatus,
    pub stored_at: NaiveDate,
}

impl CargoItem {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position_x, self.position_y, self.position_z)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            depth: self.depth,
            height: self.height,
        }
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days().max(0)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date <= today
    }

    /// Copy with `expiry_days`/`status` computed against `today`.
    pub fn as_of(&self, today: NaiveDate) -> Self {
        let days = self.days_remaining(today);
        Self {
            expiry_days: days,
            status: ExpiryStatus::from_days_remaining(days),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoList {
    pub cargo: Vec<CargoItem>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementOption {
    pub zone: String,
    pub zone_id: String,
    pub confidence: f64,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_zone: String,
    pub zone_id: String,
    pub confidence: f64,
    pub reasoning: String,
    pub position: Vec3,
    pub factors: BTreeMap<String, String>,
    pub alternatives: Vec<PlacementOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPlanRequest {
    #[serde(default = "default_days_threshold")]
    pub days_threshold: i64,
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
    #[serde(default)]
    pub priority_threshold: u32,
}

fn default_days_threshold() -> i64 {
    7
}

fn default_max_weight() -> f64 {
    500.0
}

impl Default for ReturnPlanRequest {
    fn default() -> Self {
        Self {
            days_threshold: default_days_threshold(),
            max_weight: default_max_weight(),
            priority_threshold: 0,
        }
    }
}

impl Validate for ReturnPlanRequest {
    fn validate(&self) -> Result<()> {
        validate_range("days_threshold", self.days_threshold, 0, 365)?;
        validate_range("max_weight", self.max_weight, 0.001, 1_000_000.0)?;
        validate_range("priority_threshold", self.priority_threshold, 0, 100)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub id: String,
    pub name: String,
    pub zone: String,
    pub days_remaining: i64,
    pub mass: f64,
    pub size: f64,
    pub priority: u32,
    pub status: ExpiryStatus,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPlan {
    pub items: Vec<ReturnItem>,
    pub total_mass: f64,
    pub total_volume: f64,
    pub excluded: Vec<String>,
    pub generated_at: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateRequest {
    #[serde(default = "default_simulate_days")]
    pub days: i64,
}

fn default_simulate_days() -> i64 {
    1
}

impl Default for SimulateRequest {
    fn default() -> Self {
        Self {
            days: default_simulate_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiredItem {
    pub id: String,
    pub name: String,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub previous_date: NaiveDate,
    pub new_date: NaiveDate,
    pub days_advanced: i64,
    pub expired_items: Vec<ExpiredItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalAction {
    Move,
    Retrieve,
    PlaceBack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalStep {
    pub step: usize,
    pub action: RetrievalAction,
    pub item_id: String,
    pub item_name: String,
    /// Where a `place_back` step puts the box; differs from its old slot
    /// when that slot lost its support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub item: CargoItem,
    pub retrieved_at: NaiveDate,
    pub steps: Vec<RetrievalStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub items: Vec<NewCargo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedImport {
    pub index: usize,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub success_count: usize,
    pub imported: Vec<String>,
    pub failed_items: Vec<FailedImport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrangementRow {
    pub item_id: String,
    pub zone: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub id: String,
    pub name: String,
    pub zone: String,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alerts {
    pub critical: Vec<AlertEntry>,
    pub warning: Vec<AlertEntry>,
    pub notice: Vec<AlertEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneUtilization {
    pub zone: String,
    pub zone_id: String,
    pub items: usize,
    pub used_volume: f64,
    pub capacity: f64,
    pub utilization_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_items: usize,
    pub expiring_within_3_days: usize,
    pub average_priority: f64,
    pub utilization_percent: f64,
    pub zones: Vec<ZoneUtilization>,
    pub current_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cargo_defaults_from_json() {
        let cargo: NewCargo = serde_json::from_value(serde_json::json!({
            "name": "New Supply Package",
            "size": 1.0,
            "priority": 50
        }))
        .unwrap();

        assert_eq!(cargo.expiry_days, 30);
        assert!(!cargo.hazardous);
        assert!(cargo.zone.is_none());
        assert_eq!(cargo.description, "");
    }

    #[test]
    fn test_dimensions_fall_back_to_cube() {
        let mut cargo = NewCargo::new("Crate", 8.0, 10);
        let dims = cargo.dimensions();
        assert!((dims.width - 2.0).abs() < 1e-9);
        assert!((dims.volume() - 8.0).abs() < 1e-9);

        // 只給部分尺寸時仍然視為立方體
        cargo.width = Some(4.0);
        assert!((cargo.dimensions().width - 2.0).abs() < 1e-9);

        cargo.depth = Some(1.0);
        cargo.height = Some(2.0);
        assert_eq!(cargo.dimensions().width, 4.0);
    }

    #[test]
    fn test_request_validation() {
        let mut cargo = NewCargo::new("Crate", 1.0, 50);
        assert!(cargo.validate().is_ok());

        cargo.width = Some(1.0);
        let err = cargo.validate().unwrap_err();
        assert!(err.to_string().contains("given together"));

        let request = ReturnPlanRequest {
            days_threshold: 7,
            max_weight: -5.0,
            priority_threshold: 0,
        };
        assert!(request.validate().is_err());
        assert!(ReturnPlanRequest { max_weight: 100.0, ..request }.validate().is_ok());
    }

    #[test]
    fn test_expiry_status_thresholds() {
        assert_eq!(ExpiryStatus::from_days_remaining(0), ExpiryStatus::Critical);
        assert_eq!(ExpiryStatus::from_days_remaining(3), ExpiryStatus::Critical);
        assert_eq!(ExpiryStatus::from_days_remaining(4), ExpiryStatus::Warning);
        assert_eq!(ExpiryStatus::from_days_remaining(7), ExpiryStatus::Warning);
        assert_eq!(ExpiryStatus::from_days_remaining(8), ExpiryStatus::Good);
    }

    #[test]
    fn test_zone_matches_id_or_name() {
        let zone = Zone {
            id: "C".to_string(),
            name: "Zone C".to_string(),
            origin: [7.0, 0.0, 0.0],
            size: [3.0, 10.0, 5.0],
            temperature_controlled: false,
            hazard_rated: true,
            priority_access: false,
        };

        assert!(zone.matches("C"));
        assert!(zone.matches("zone c"));
        assert!(zone.matches(" Zone C "));
        assert!(!zone.matches("Zone A"));
    }
}
