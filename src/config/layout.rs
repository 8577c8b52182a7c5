use crate::core::geometry::Cuboid;
use crate::core::placement::PlacementSettings;
use crate::domain::model::{Dimensions, Vec3, Zone};
use crate::utils::error::{Result, StowageError};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub placement: PlacementSettings,
    #[serde(default = "default_zones")]
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub name: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    /// 模擬時鐘起始日，未設定時使用伺服器啟動當天
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// kg/m³，用於推算未提供質量的貨物
    #[serde(default = "default_density")]
    pub default_density: f64,
}

fn default_density() -> f64 {
    50.0
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            name: "Station Cargo Hold".to_string(),
            width: 10.0,
            depth: 10.0,
            height: 5.0,
            start_date: None,
            default_density: default_density(),
        }
    }
}

/// Three zones side by side along the hold's width.
pub fn default_zones() -> Vec<Zone> {
    vec![
        Zone {
            id: "A".to_string(),
            name: "Zone A".to_string(),
            origin: [0.0, 0.0, 0.0],
            size: [4.0, 10.0, 5.0],
            temperature_controlled: true,
            hazard_rated: false,
            priority_access: true,
        },
        Zone {
            id: "B".to_string(),
            name: "Zone B".to_string(),
            origin: [4.0, 0.0, 0.0],
            size: [3.0, 10.0, 5.0],
            temperature_controlled: false,
            hazard_rated: false,
            priority_access: false,
        },
        Zone {
            id: "C".to_string(),
            name: "Zone C".to_string(),
            origin: [7.0, 0.0, 0.0],
            size: [3.0, 10.0, 5.0],
            temperature_controlled: false,
            hazard_rated: true,
            priority_access: false,
        },
    ]
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            warehouse: WarehouseConfig::default(),
            placement: PlacementSettings::default(),
            zones: default_zones(),
        }
    }
}

impl LayoutConfig {
    /// 從 TOML 檔案載入倉庫配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析倉庫配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| StowageError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${STATION_NAME})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| StowageError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("warehouse.name", &self.warehouse.name)?;
        for (field, value) in [
            ("warehouse.width", self.warehouse.width),
            ("warehouse.depth", self.warehouse.depth),
            ("warehouse.height", self.warehouse.height),
            ("warehouse.default_density", self.warehouse.default_density),
        ] {
            if !(value > 0.0) {
                return Err(invalid(field, value, "must be positive"));
            }
        }

        // 驗證評分權重
        let weights = self.placement.weights;
        for (field, value) in [
            ("placement.weights.accessibility", weights.accessibility),
            ("placement.weights.utilization", weights.utilization),
            ("placement.weights.zone_fit", weights.zone_fit),
        ] {
            if !(value >= 0.0) {
                return Err(invalid(field, value, "must not be negative"));
            }
        }
        if weights.accessibility + weights.utilization + weights.zone_fit <= 0.0 {
            return Err(StowageError::config("placement weights must not all be zero"));
        }
        validate_positive_number("placement.max_candidates", self.placement.max_candidates, 1)?;

        self.validate_zones()
    }

    fn validate_zones(&self) -> Result<()> {
        if self.zones.is_empty() {
            return Err(StowageError::config("layout must define at least one zone"));
        }

        let hold = Zone {
            id: String::new(),
            name: self.warehouse.name.clone(),
            origin: [0.0, 0.0, 0.0],
            size: [self.warehouse.width, self.warehouse.depth, self.warehouse.height],
            temperature_controlled: false,
            hazard_rated: false,
            priority_access: false,
        };

        let mut seen = HashSet::new();
        let mut bounds: Vec<(&str, Cuboid)> = Vec::with_capacity(self.zones.len());

        for zone in &self.zones {
            validate_non_empty_string("zones.id", &zone.id)?;
            validate_non_empty_string("zones.name", &zone.name)?;
            if !seen.insert(zone.id.to_ascii_uppercase()) {
                return Err(StowageError::config(format!("duplicate zone id '{}'", zone.id)));
            }
            if zone.size.iter().any(|s| !(*s > 0.0)) {
                return Err(StowageError::config(format!(
                    "zone '{}' must have a positive size",
                    zone.id
                )));
            }

            let cuboid = zone_bounds(zone);
            if !cuboid.within_zone(&hold) {
                return Err(StowageError::config(format!(
                    "zone '{}' extends outside the {} x {} x {} m hold",
                    zone.id, self.warehouse.width, self.warehouse.depth, self.warehouse.height
                )));
            }
            if let Some((other, _)) = bounds.iter().find(|(_, b)| b.overlaps(&cuboid)) {
                return Err(StowageError::config(format!(
                    "zones '{}' and '{}' overlap",
                    other, zone.id
                )));
            }
            bounds.push((zone.id.as_str(), cuboid));
        }

        Ok(())
    }
}

fn zone_bounds(zone: &Zone) -> Cuboid {
    Cuboid::new(
        Vec3::new(zone.origin[0], zone.origin[1], zone.origin[2]),
        Dimensions {
            width: zone.size[0],
            depth: zone.size[1],
            height: zone.size[2],
        },
    )
}

fn invalid(field: &str, value: f64, reason: &str) -> StowageError {
    StowageError::InvalidValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl Validate for LayoutConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_layout_is_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.zones.len(), 3);
        assert!(config.zones[0].temperature_controlled);
        assert!(config.zones[2].hazard_rated);
    }

    #[test]
    fn test_parse_layout_toml() {
        let toml_content = r#"
[warehouse]
name = "Gateway Hold"
width = 6.0
depth = 4.0
height = 3.0
start_date = "2026-03-01"

[placement]
max_candidates = 2

[placement.weights]
accessibility = 0.5
utilization = 0.2
zone_fit = 0.3

[[zones]]
id = "F"
name = "Fridge"
origin = [0.0, 0.0, 0.0]
size = [2.0, 4.0, 3.0]
temperature_controlled = true

[[zones]]
id = "G"
name = "General"
origin = [2.0, 0.0, 0.0]
size = [4.0, 4.0, 3.0]
"#;

        let config = LayoutConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.warehouse.name, "Gateway Hold");
        assert_eq!(config.warehouse.start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(config.warehouse.default_density, 50.0);
        assert_eq!(config.placement.max_candidates, 2);
        assert_eq!(config.placement.weights.accessibility, 0.5);
        assert_eq!(config.zones.len(), 2);
        assert!(!config.zones[1].priority_access);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = LayoutConfig::from_toml_str("").unwrap();
        assert_eq!(config, LayoutConfig::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_STOWAGE_HOLD_NAME", "Lunar Depot");

        let toml_content = r#"
[warehouse]
name = "${TEST_STOWAGE_HOLD_NAME}"
width = 10.0
depth = 10.0
height = 5.0
"#;

        let config = LayoutConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.warehouse.name, "Lunar Depot");

        std::env::remove_var("TEST_STOWAGE_HOLD_NAME");
    }

    #[test]
    fn test_rejects_overlapping_zones() {
        let mut config = LayoutConfig::default();
        config.zones[1].origin = [3.0, 0.0, 0.0];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_rejects_zone_outside_hold() {
        let mut config = LayoutConfig::default();
        config.zones[2].size = [4.0, 10.0, 5.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_ids_and_empty_layout() {
        let mut config = LayoutConfig::default();
        config.zones[1].id = "a".to_string();
        assert!(config.validate().is_err());

        config.zones.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut config = LayoutConfig::default();
        config.placement.weights.utilization = -0.1;
        assert!(config.validate().is_err());

        config.placement.weights.accessibility = 0.0;
        config.placement.weights.utilization = 0.0;
        config.placement.weights.zone_fit = 0.0;
        assert!(config.validate().is_err());

        let mut config = LayoutConfig::default();
        config.placement.max_candidates = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layout_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[warehouse]\nname = \"File Hold\"\nwidth = 10.0\ndepth = 10.0\nheight = 5.0\n")
            .unwrap();

        let config = LayoutConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.warehouse.name, "File Hold");
        assert_eq!(config.zones, default_zones());
    }
}
