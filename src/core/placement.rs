//! Placement recommender
//!
//! Every zone is first screened against the hard safety rules:
//! - hazardous cargo only in hazard-rated zones, and nothing else in them
//! - temperature-sensitive cargo only in temperature-controlled zones
//! - the item must fit a free, supported slot
//!
//! The best slot of each surviving zone is then scored by a weighted set of
//! [`PlacementScorer`]s (accessibility, utilization, zone fit) and the zones are
//! ranked by the resulting confidence.

use crate::core::geometry::{find_slot, Occupant};
use crate::domain::model::{Dimensions, NewCargo, PlacementOption, Recommendation, Vec3, Zone};
use crate::utils::error::{Result, StowageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Priority at which cargo counts as urgent for zone fit.
pub const HIGH_PRIORITY: u32 = 70;

/// Expiry horizon (days) beyond which shelf life adds no urgency.
const EXPIRY_HORIZON_DAYS: f64 = 30.0;

/// Free volume share below which a zone is considered nearly full.
const HEADROOM_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementWeights {
    pub accessibility: f64,
    pub utilization: f64,
    pub zone_fit: f64,
}

impl Default for PlacementWeights {
    fn default() -> Self {
        Self {
            accessibility: 0.35,
            utilization: 0.25,
            zone_fit: 0.40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSettings {
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default)]
    pub weights: PlacementWeights,
}

fn default_max_candidates() -> usize {
    3
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            weights: PlacementWeights::default(),
        }
    }
}

/// Contents of one zone as seen by the recommender.
#[derive(Debug, Clone)]
pub struct ZoneState<'a> {
    pub zone: &'a Zone,
    pub occupants: Vec<Occupant>,
    pub used_volume: f64,
}

/// Everything a scorer may look at for one zone's best slot.
pub struct ScoreContext<'a> {
    pub item: &'a NewCargo,
    pub zone: &'a Zone,
    pub position: Vec3,
    pub dims: Dimensions,
    pub used_volume: f64,
}

impl ScoreContext<'_> {
    /// 0..1, the larger of priority and expiry pressure.
    pub fn urgency(&self) -> f64 {
        let priority = f64::from(self.item.priority.min(100)) / 100.0;
        let expiry = 1.0 - f64::from(self.item.expiry_days).min(EXPIRY_HORIZON_DAYS) / EXPIRY_HORIZON_DAYS;
        priority.max(expiry)
    }

    fn fill_after(&self) -> f64 {
        let capacity = self.zone.volume();
        if capacity <= 0.0 {
            return 1.0;
        }
        ((self.used_volume + self.dims.volume()) / capacity).min(1.0)
    }
}

/// A soft placement criterion. Scores are in `[0, 1]`, higher is better.
pub trait PlacementScorer: Send + Sync {
    fn score(&self, ctx: &ScoreContext<'_>) -> f64;

    /// Key used in the recommendation's `factors` map.
    fn name(&self) -> &str;

    fn explain(&self, ctx: &ScoreContext<'_>) -> String;
}

/// Urgent cargo goes near the access face and low down.
#[derive(Debug, Clone, Default)]
pub struct AccessibilityScorer;

impl AccessibilityScorer {
    fn raw(ctx: &ScoreContext<'_>) -> f64 {
        let [_, zy, zz] = ctx.zone.origin;
        let [_, depth, height] = ctx.zone.size;
        let depth_share = if depth > 0.0 { (ctx.position.y - zy) / depth } else { 0.0 };
        let height_share = if height > 0.0 { (ctx.position.z - zz) / height } else { 0.0 };
        (1.0 - (depth_share + height_share) / 2.0).clamp(0.0, 1.0)
    }
}

impl PlacementScorer for AccessibilityScorer {
    fn score(&self, ctx: &ScoreContext<'_>) -> f64 {
        // 不急的貨物對位置不敏感，往 0.5 收斂
        let urgency = ctx.urgency();
        Self::raw(ctx) * urgency + (1.0 - urgency) * 0.5
    }

    fn name(&self) -> &str {
        "priority"
    }

    fn explain(&self, ctx: &ScoreContext<'_>) -> String {
        format!(
            "priority {} (urgency {:.2}), slot {:.2} m from the access face at {:.2} m height",
            ctx.item.priority,
            ctx.urgency(),
            ctx.position.y - ctx.zone.origin[1],
            ctx.position.z - ctx.zone.origin[2]
        )
    }
}

/// Bin-packing: prefer zones that end up fuller, but not nearly full.
#[derive(Debug, Clone, Default)]
pub struct UtilizationScorer;

impl PlacementScorer for UtilizationScorer {
    fn score(&self, ctx: &ScoreContext<'_>) -> f64 {
        let fill = ctx.fill_after();
        let penalty = if 1.0 - fill < HEADROOM_THRESHOLD { 0.1 } else { 0.0 };
        (fill - penalty).max(0.0)
    }

    fn name(&self) -> &str {
        "space"
    }

    fn explain(&self, ctx: &ScoreContext<'_>) -> String {
        let fill = ctx.fill_after();
        if 1.0 - fill < HEADROOM_THRESHOLD {
            format!("{} would be {:.1}% full after placement (little headroom left)", ctx.zone.name, fill * 100.0)
        } else {
            format!("{} would be {:.1}% full after placement", ctx.zone.name, fill * 100.0)
        }
    }
}

/// Matches cargo class to zone purpose.
#[derive(Debug, Clone, Default)]
pub struct ZoneFitScorer;

impl PlacementScorer for ZoneFitScorer {
    fn score(&self, ctx: &ScoreContext<'_>) -> f64 {
        let urgent = ctx.item.priority >= HIGH_PRIORITY;
        let mut fit = match (urgent, ctx.zone.priority_access) {
            (true, true) => 1.0,
            (true, false) => 0.6,
            // 快取區留給急件
            (false, true) => 0.7,
            (false, false) => 1.0,
        };
        if ctx.zone.temperature_controlled && !ctx.item.temperature_sensitive {
            fit *= 0.8;
        }
        fit
    }

    fn name(&self) -> &str {
        "zone"
    }

    fn explain(&self, ctx: &ScoreContext<'_>) -> String {
        let urgent = ctx.item.priority >= HIGH_PRIORITY;
        let mut text = match (urgent, ctx.zone.priority_access) {
            (true, true) => format!("{} offers priority access for urgent cargo", ctx.zone.name),
            (true, false) => format!("{} has no priority access", ctx.zone.name),
            (false, true) => format!("{} priority access is kept for urgent cargo", ctx.zone.name),
            (false, false) => format!("{} is standard storage", ctx.zone.name),
        };
        if ctx.zone.temperature_controlled && !ctx.item.temperature_sensitive {
            text.push_str(", cold storage reserved for sensitive cargo");
        }
        text
    }
}

/// Hard safety rules. `Err` carries the human-readable rejection reason.
pub fn check_constraints(zone: &Zone, item: &NewCargo) -> std::result::Result<(), String> {
    if item.hazardous && !zone.hazard_rated {
        return Err("hazardous cargo requires a hazard-rated zone".to_string());
    }
    if !item.hazardous && zone.hazard_rated {
        return Err("hazard-rated zones only hold hazardous cargo".to_string());
    }
    if item.temperature_sensitive && !zone.temperature_controlled {
        return Err("temperature-sensitive cargo requires temperature control".to_string());
    }
    Ok(())
}

fn temperature_factor(zone: &Zone, item: &NewCargo) -> String {
    if item.temperature_sensitive {
        format!("temperature sensitive, {} is temperature controlled", zone.name)
    } else if zone.temperature_controlled {
        "not temperature sensitive, occupies controlled storage".to_string()
    } else {
        "no temperature control needed".to_string()
    }
}

fn hazard_factor(zone: &Zone, item: &NewCargo) -> String {
    if item.hazardous {
        format!("hazardous, isolated in hazard-rated {}", zone.name)
    } else {
        "non-hazardous, kept out of hazard-rated zones".to_string()
    }
}

/// A scored slot in one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub zone_id: String,
    pub zone_name: String,
    pub position: Vec3,
    pub confidence: f64,
    pub factors: BTreeMap<String, String>,
}

impl Candidate {
    fn reasoning(&self) -> String {
        let part = |key: &str| self.factors.get(key).cloned().unwrap_or_default();
        format!(
            "{} recommended with {:.1}% confidence: {}; {}; {}; {}.",
            self.zone_name,
            self.confidence,
            part("temperature"),
            part("hazard"),
            part("priority"),
            part("space")
        )
    }

    fn as_option(&self) -> PlacementOption {
        PlacementOption {
            zone: self.zone_name.clone(),
            zone_id: self.zone_id.clone(),
            confidence: self.confidence,
            position: self.position,
        }
    }
}

pub struct PlacementEngine {
    settings: PlacementSettings,
    scorers: Vec<(Box<dyn PlacementScorer>, f64)>,
}

impl PlacementEngine {
    pub fn new(settings: PlacementSettings) -> Self {
        let weights = settings.weights;
        let scorers: Vec<(Box<dyn PlacementScorer>, f64)> = vec![
            (Box::new(AccessibilityScorer), weights.accessibility),
            (Box::new(UtilizationScorer), weights.utilization),
            (Box::new(ZoneFitScorer), weights.zone_fit),
        ];
        Self { settings, scorers }
    }

    pub fn settings(&self) -> &PlacementSettings {
        &self.settings
    }

    fn confidence(&self, ctx: &ScoreContext<'_>) -> f64 {
        let total_weight: f64 = self.scorers.iter().map(|(_, w)| *w).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = self
            .scorers
            .iter()
            .map(|(scorer, weight)| scorer.score(ctx).clamp(0.0, 1.0) * weight)
            .sum();
        let percent = (100.0 * weighted / total_weight).clamp(0.0, 100.0);
        (percent * 10.0).round() / 10.0
    }

    /// All feasible zones, best first. Fails when no zone can take the item.
    pub fn rank(&self, item: &NewCargo, zones: &[ZoneState<'_>]) -> Result<Vec<Candidate>> {
        let dims = item.dimensions();
        let mut rejections = Vec::new();
        let mut candidates = Vec::new();

        for state in zones {
            let zone = state.zone;
            if let Err(reason) = check_constraints(zone, item) {
                rejections.push(format!("{}: {}", zone.name, reason));
                continue;
            }

            let Some(position) = find_slot(zone, &state.occupants, dims) else {
                rejections.push(format!(
                    "{}: no free slot fits {:.2} x {:.2} x {:.2} m",
                    zone.name, dims.width, dims.depth, dims.height
                ));
                continue;
            };

            let ctx = ScoreContext {
                item,
                zone,
                position,
                dims,
                used_volume: state.used_volume,
            };

            let mut factors = BTreeMap::new();
            factors.insert("temperature".to_string(), temperature_factor(zone, item));
            factors.insert("hazard".to_string(), hazard_factor(zone, item));
            for (scorer, _) in &self.scorers {
                factors.insert(scorer.name().to_string(), scorer.explain(&ctx));
            }

            candidates.push(Candidate {
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                position,
                confidence: self.confidence(&ctx),
                factors,
            });
        }

        if candidates.is_empty() {
            tracing::debug!(item = %item.name, ?rejections, "no feasible zone");
            return Err(StowageError::NoFeasiblePlacement {
                item: item.name.clone(),
                reasons: rejections,
            });
        }

        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.zone_id.cmp(&b.zone_id))
        });
        Ok(candidates)
    }

    pub fn recommend(&self, item: &NewCargo, zones: &[ZoneState<'_>]) -> Result<Recommendation> {
        let ranked = self.rank(item, zones)?;
        let best = &ranked[0];
        let alternatives = ranked
            .iter()
            .skip(1)
            .take(self.settings.max_candidates.saturating_sub(1))
            .map(Candidate::as_option)
            .collect();

        Ok(Recommendation {
            recommended_zone: best.zone_name.clone(),
            zone_id: best.zone_id.clone(),
            confidence: best.confidence,
            reasoning: best.reasoning(),
            position: best.position,
            factors: best.factors.clone(),
            alternatives,
        })
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new(PlacementSettings::default())
    }
}
