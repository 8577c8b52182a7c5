//! In-memory cargo inventory: the state behind every API endpoint.

use crate::config::layout::LayoutConfig;
use crate::core::geometry::{find_slot, is_supported, Cuboid, Occupant};
use crate::core::placement::{PlacementEngine, ZoneState};
use crate::core::simulation::{newly_expired, SimulationClock};
use crate::core::waste::plan_return;
use crate::domain::model::{
    AlertEntry, Alerts, ArrangementRow, CargoItem, CargoList, ExpiryStatus, FailedImport,
    ImportReport, Metrics, NewCargo, Recommendation, RetrievalAction, RetrievalResult,
    RetrievalStep, ReturnPlan, ReturnPlanRequest, SimulationResult, Vec3, Zone, ZoneUtilization,
};
use crate::utils::error::{Result, StowageError};
use crate::utils::validation::Validate;
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, HashSet};

const EPS: f64 = 1e-9;

pub struct Inventory {
    zones: Vec<Zone>,
    engine: PlacementEngine,
    items: BTreeMap<String, CargoItem>,
    clock: SimulationClock,
    next_id: u64,
    default_density: f64,
}

impl Inventory {
    /// Starts the clock at the layout's `start_date`, or today (UTC).
    pub fn new(layout: LayoutConfig) -> Result<Self> {
        let start = layout
            .warehouse
            .start_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        Self::with_start_date(layout, start)
    }

    pub fn with_start_date(layout: LayoutConfig, start: NaiveDate) -> Result<Self> {
        layout.validate()?;

        tracing::info!(
            warehouse = %layout.warehouse.name,
            zones = layout.zones.len(),
            start_date = %start,
            "📦 Inventory initialised"
        );

        Ok(Self {
            zones: layout.zones,
            engine: PlacementEngine::new(layout.placement),
            items: BTreeMap::new(),
            clock: SimulationClock::new(start),
            next_id: 1,
            default_density: layout.warehouse.default_density,
        })
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn resolve_zone(&self, key: &str) -> Result<&Zone> {
        self.zones
            .iter()
            .find(|zone| zone.matches(key))
            .ok_or_else(|| StowageError::not_found("Zone", key.trim()))
    }

    fn zone_states(&self, only: Option<&Zone>) -> Vec<ZoneState<'_>> {
        self.zones
            .iter()
            .filter(|zone| only.map_or(true, |wanted| wanted.id == zone.id))
            .map(|zone| {
                let occupants: Vec<Occupant> = self
                    .items
                    .values()
                    .filter(|item| item.zone_id == zone.id)
                    .map(occupant)
                    .collect();
                let used_volume = occupants.iter().map(|o| o.bounds.dims.volume()).sum();
                ZoneState {
                    zone,
                    occupants,
                    used_volume,
                }
            })
            .collect()
    }

    fn states_for(&self, cargo: &NewCargo) -> Result<Vec<ZoneState<'_>>> {
        let only = match cargo.zone.as_deref() {
            Some(key) if !key.trim().is_empty() => Some(self.resolve_zone(key)?),
            _ => None,
        };
        Ok(self.zone_states(only))
    }

    pub fn recommend(&self, cargo: &NewCargo) -> Result<Recommendation> {
        cargo.validate()?;
        let states = self.states_for(cargo)?;
        self.engine.recommend(cargo, &states)
    }

    fn generate_id(&mut self) -> String {
        loop {
            let id = format!("ITEM-{:04}", self.next_id);
            self.next_id += 1;
            if !self.items.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn add(&mut self, cargo: NewCargo) -> Result<CargoItem> {
        cargo.validate()?;

        if let Some(id) = &cargo.id {
            if self.items.contains_key(id.trim()) {
                return Err(StowageError::conflict(format!("item id '{}' already exists", id.trim())));
            }
        }

        let best = {
            let states = self.states_for(&cargo)?;
            let mut ranked = self.engine.rank(&cargo, &states)?;
            ranked.swap_remove(0)
        };

        // 放置成功後才分配編號
        let id = match &cargo.id {
            Some(id) => id.trim().to_string(),
            None => self.generate_id(),
        };

        let today = self.today();
        let expiry_date = today
            .checked_add_days(Days::new(u64::from(cargo.expiry_days)))
            .ok_or_else(|| StowageError::validation("expiry date out of range"))?;
        let dims = cargo.dimensions();

        let item = CargoItem {
            id: id.clone(),
            name: cargo.name.trim().to_string(),
            size: cargo.size,
            priority: cargo.priority,
            mass: cargo.mass.unwrap_or(cargo.size * self.default_density),
            temperature_sensitive: cargo.temperature_sensitive,
            hazardous: cargo.hazardous,
            fragile: cargo.fragile,
            description: cargo.description,
            zone: best.zone_name,
            zone_id: best.zone_id,
            position_x: best.position.x,
            position_y: best.position.y,
            position_z: best.position.z,
            width: dims.width,
            depth: dims.depth,
            height: dims.height,
            expiry_date,
            expiry_days: i64::from(cargo.expiry_days),
            status: ExpiryStatus::from_days_remaining(i64::from(cargo.expiry_days)),
            stored_at: today,
        };

        tracing::info!(
            id = %item.id,
            zone = %item.zone,
            confidence = best.confidence,
            "✅ Cargo stored at ({:.2}, {:.2}, {:.2})",
            item.position_x,
            item.position_y,
            item.position_z
        );

        self.items.insert(id, item.clone());
        Ok(item.as_of(today))
    }

    pub fn list(&self) -> CargoList {
        let today = self.today();
        let cargo: Vec<CargoItem> = self.items.values().map(|item| item.as_of(today)).collect();
        CargoList {
            total: cargo.len(),
            cargo,
        }
    }

    pub fn get(&self, id: &str) -> Result<CargoItem> {
        self.items
            .get(id)
            .map(|item| item.as_of(self.today()))
            .ok_or_else(|| StowageError::not_found("Item", id))
    }

    /// Refuses while another box rests on the item; retrieving it re-stows
    /// the boxes above instead.
    pub fn delete(&mut self, id: &str) -> Result<CargoItem> {
        let target = self
            .items
            .get(id)
            .ok_or_else(|| StowageError::not_found("Item", id))?;

        let top = bounds(target);
        let resting: Vec<&str> = self
            .items
            .values()
            .filter(|other| other.zone_id == target.zone_id && other.id != target.id)
            .filter(|other| {
                let b = bounds(other);
                (b.origin.z - top.top()).abs() < EPS && b.footprint_overlaps(&top)
            })
            .map(|other| other.id.as_str())
            .collect();
        if !resting.is_empty() {
            return Err(StowageError::conflict(format!(
                "cannot delete {}: {} rests on it, retrieve it instead",
                id,
                resting.join(", ")
            )));
        }

        let item = self
            .items
            .remove(id)
            .ok_or_else(|| StowageError::not_found("Item", id))?;
        tracing::info!(id = %item.id, zone = %item.zone, "🗑️ Cargo deleted");
        Ok(item.as_of(self.today()))
    }

    /// Items that must be moved out of the way to reach `target`, in the
    /// order they come off.
    ///
    /// Front blockers are taken nearest the access face first, each after
    /// whatever is stacked on it; then the boxes stacked on the target.
    fn blockers(&self, target: &CargoItem) -> Vec<&CargoItem> {
        let target_bounds = bounds(target);
        let others: Vec<&CargoItem> = self
            .items
            .values()
            .filter(|other| other.zone_id == target.zone_id && other.id != target.id)
            .collect();

        let mut front: Vec<&CargoItem> = others
            .iter()
            .copied()
            .filter(|other| {
                let b = bounds(other);
                b.origin.y < target_bounds.origin.y - EPS
                    && b.x_overlaps(&target_bounds)
                    && b.z_overlaps(&target_bounds)
            })
            .collect();
        front.sort_by(|a, b| {
            a.position_y
                .total_cmp(&b.position_y)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for blocker in front {
            clear_above(blocker, &others, &mut seen, &mut order);
            if seen.insert(blocker.id.as_str()) {
                order.push(blocker);
            }
        }
        clear_above(target, &others, &mut seen, &mut order);
        order
    }

    /// Where each blocker goes back once `target` is gone, in place-back
    /// order.
    ///
    /// Blockers return to their old slot when it is still free and
    /// supported; the rest (typically boxes that were resting on the
    /// target) are re-stowed through the slot search afterwards.
    fn place_back_plan(
        &self,
        target: &CargoItem,
        blockers: &[&CargoItem],
    ) -> Result<Vec<(usize, Vec3)>> {
        let zone = self.resolve_zone(&target.zone_id)?;
        let moved: HashSet<&str> = blockers.iter().map(|b| b.id.as_str()).collect();

        let mut occupants: Vec<Occupant> = self
            .items
            .values()
            .filter(|item| item.zone_id == target.zone_id && item.id != target.id)
            .filter(|item| !moved.contains(item.id.as_str()))
            .map(occupant)
            .collect();

        let mut plan = Vec::with_capacity(blockers.len());
        let mut deferred = Vec::new();
        for (index, blocker) in blockers.iter().enumerate().rev() {
            let slot = bounds(blocker);
            let free = !occupants.iter().any(|o| o.bounds.overlaps(&slot));
            if free && is_supported(&slot, zone, &occupants) {
                occupants.push(occupant(blocker));
                plan.push((index, blocker.position()));
            } else {
                deferred.push(index);
            }
        }

        for index in deferred {
            let blocker = blockers[index];
            let dims = blocker.dimensions();
            let position = find_slot(zone, &occupants, dims).ok_or_else(|| {
                StowageError::NoFeasiblePlacement {
                    item: blocker.name.clone(),
                    reasons: vec![format!(
                        "{}: no supported slot left to re-stow {} after retrieving {}",
                        zone.name, blocker.id, target.id
                    )],
                }
            })?;
            occupants.push(Occupant {
                bounds: Cuboid::new(position, dims),
                fragile: blocker.fragile,
            });
            plan.push((index, position));
        }
        Ok(plan)
    }

    /// Fails without changing anything when a displaced box cannot be
    /// re-stowed.
    pub fn retrieve(&mut self, id: &str) -> Result<RetrievalResult> {
        let target = self
            .items
            .get(id)
            .ok_or_else(|| StowageError::not_found("Item", id))?;

        let blockers = self.blockers(target);
        let plan = self.place_back_plan(target, &blockers)?;
        let blocker_count = blockers.len();

        let mut steps = Vec::with_capacity(blockers.len() * 2 + 1);
        let mut push = |action: RetrievalAction, item: &CargoItem, position: Option<Vec3>| {
            steps.push(RetrievalStep {
                step: steps.len() + 1,
                action,
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                position,
            });
        };

        for blocker in blockers.iter().copied() {
            push(RetrievalAction::Move, blocker, None);
        }
        push(RetrievalAction::Retrieve, target, None);

        let mut restowed = Vec::new();
        for (index, position) in &plan {
            let blocker = blockers[*index];
            push(RetrievalAction::PlaceBack, blocker, Some(*position));
            if blocker.position() != *position {
                restowed.push((blocker.id.clone(), *position));
            }
        }

        let today = self.today();
        let item = self
            .items
            .remove(id)
            .ok_or_else(|| StowageError::not_found("Item", id))?;

        for (blocker_id, position) in &restowed {
            if let Some(blocker) = self.items.get_mut(blocker_id) {
                blocker.position_x = position.x;
                blocker.position_y = position.y;
                blocker.position_z = position.z;
            }
        }

        tracing::info!(
            id = %item.id,
            zone = %item.zone,
            blockers = blocker_count,
            restowed = restowed.len(),
            "📤 Cargo retrieved"
        );

        Ok(RetrievalResult {
            item: item.as_of(today),
            retrieved_at: today,
            steps,
        })
    }

    /// First-fit decreasing: largest boxes are placed first.
    pub fn import(&mut self, items: Vec<NewCargo>) -> ImportReport {
        let mut order: Vec<(usize, NewCargo)> = items.into_iter().enumerate().collect();
        order.sort_by(|(ia, a), (ib, b)| {
            b.dimensions()
                .volume()
                .total_cmp(&a.dimensions().volume())
                .then(ia.cmp(ib))
        });

        let mut report = ImportReport::default();
        for (index, cargo) in order {
            let name = cargo.name.clone();
            match self.add(cargo) {
                Ok(item) => {
                    report.success_count += 1;
                    report.imported.push(item.id);
                }
                Err(e) => {
                    tracing::warn!(index, name = %name, "⚠️ Import row rejected: {}", e);
                    report.failed_items.push(FailedImport {
                        index,
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.failed_items.sort_by_key(|failed| failed.index);

        tracing::info!(
            imported = report.success_count,
            failed = report.failed_items.len(),
            "📥 Bulk import finished"
        );
        report
    }

    pub fn return_plan(&self, request: &ReturnPlanRequest) -> Result<ReturnPlan> {
        plan_return(self.items.values(), self.today(), request)
    }

    pub fn simulate(&mut self, days: i64) -> Result<SimulationResult> {
        let (previous_date, new_date) = self.clock.advance(days)?;
        let expired_items = newly_expired(self.items.values(), previous_date, new_date);

        tracing::info!(
            %previous_date,
            %new_date,
            expired = expired_items.len(),
            "⏩ Simulated {} day(s)",
            days
        );

        Ok(SimulationResult {
            previous_date,
            new_date,
            days_advanced: days,
            expired_items,
        })
    }

    pub fn arrangement(&self) -> Vec<ArrangementRow> {
        let mut rows: Vec<ArrangementRow> = self
            .items
            .values()
            .map(|item| ArrangementRow {
                item_id: item.id.clone(),
                zone: item.zone.clone(),
                name: item.name.clone(),
                x: item.position_x,
                y: item.position_y,
                z: item.position_z,
                width: item.width,
                depth: item.depth,
                height: item.height,
            })
            .collect();
        rows.sort_by(|a, b| a.zone.cmp(&b.zone).then_with(|| a.item_id.cmp(&b.item_id)));
        rows
    }

    /// Critical ≤1 day, warning 2-3 days, notice 4-7 days.
    pub fn alerts(&self) -> Alerts {
        let today = self.today();
        let mut entries: Vec<AlertEntry> = self
            .items
            .values()
            .map(|item| AlertEntry {
                id: item.id.clone(),
                name: item.name.clone(),
                zone: item.zone.clone(),
                days_remaining: item.days_remaining(today),
            })
            .filter(|entry| entry.days_remaining <= 7)
            .collect();
        entries.sort_by(|a, b| {
            a.days_remaining
                .cmp(&b.days_remaining)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut alerts = Alerts::default();
        for entry in entries {
            match entry.days_remaining {
                d if d <= 1 => alerts.critical.push(entry),
                d if d <= 3 => alerts.warning.push(entry),
                _ => alerts.notice.push(entry),
            }
        }
        alerts
    }

    pub fn metrics(&self) -> Metrics {
        let today = self.today();
        let zones: Vec<ZoneUtilization> = self
            .zone_states(None)
            .iter()
            .map(|state| {
                let capacity = state.zone.volume();
                ZoneUtilization {
                    zone: state.zone.name.clone(),
                    zone_id: state.zone.id.clone(),
                    items: state.occupants.len(),
                    used_volume: (state.used_volume * 1000.0).round() / 1000.0,
                    capacity,
                    utilization_percent: percent(state.used_volume, capacity),
                }
            })
            .collect();

        let used: f64 = self.items.values().map(|item| item.dimensions().volume()).sum();
        let capacity: f64 = self.zones.iter().map(Zone::volume).sum();
        let average_priority = if self.items.is_empty() {
            0.0
        } else {
            let total: u32 = self.items.values().map(|item| item.priority).sum();
            round1(f64::from(total) / self.items.len() as f64)
        };

        Metrics {
            total_items: self.items.len(),
            expiring_within_3_days: self
                .items
                .values()
                .filter(|item| item.days_remaining(today) <= 3)
                .count(),
            average_priority,
            utilization_percent: percent(used, capacity),
            zones,
            current_date: today,
        }
    }
}

fn bounds(item: &CargoItem) -> Cuboid {
    Cuboid::new(item.position(), item.dimensions())
}

fn occupant(item: &CargoItem) -> Occupant {
    Occupant {
        bounds: bounds(item),
        fragile: item.fragile,
    }
}

/// Appends everything stacked above `base` to `order`, top-down, each box
/// after whatever rests on it.
fn clear_above<'a>(
    base: &CargoItem,
    others: &[&'a CargoItem],
    seen: &mut HashSet<&'a str>,
    order: &mut Vec<&'a CargoItem>,
) {
    let base_bounds = bounds(base);
    let mut above: Vec<&'a CargoItem> = others
        .iter()
        .copied()
        .filter(|other| {
            let b = bounds(other);
            b.footprint_overlaps(&base_bounds) && b.origin.z >= base_bounds.top() - EPS
        })
        .collect();
    above.sort_by(|a, b| {
        b.position_z
            .total_cmp(&a.position_z)
            .then_with(|| a.id.cmp(&b.id))
    });

    for item in above {
        if seen.contains(item.id.as_str()) {
            continue;
        }
        clear_above(item, others, seen, order);
        if seen.insert(item.id.as_str()) {
            order.push(item);
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(used: f64, capacity: f64) -> f64 {
    if capacity <= 0.0 {
        return 0.0;
    }
    round1(100.0 * used / capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layout::WarehouseConfig;
    use crate::domain::model::Vec3;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn inventory() -> Inventory {
        Inventory::with_start_date(LayoutConfig::default(), start()).unwrap()
    }

    /// 單一 1 x 3 x 3 m 區域，方便推算擺放位置
    fn narrow_inventory() -> Inventory {
        let layout = LayoutConfig {
            warehouse: WarehouseConfig {
                name: "Narrow Hold".to_string(),
                width: 1.0,
                depth: 3.0,
                height: 3.0,
                start_date: None,
                default_density: 50.0,
            },
            zones: vec![Zone {
                id: "N".to_string(),
                name: "Zone N".to_string(),
                origin: [0.0, 0.0, 0.0],
                size: [1.0, 3.0, 3.0],
                temperature_controlled: false,
                hazard_rated: false,
                priority_access: false,
            }],
            ..LayoutConfig::default()
        };
        Inventory::with_start_date(layout, start()).unwrap()
    }

    fn cargo(name: &str, size: f64, priority: u32) -> NewCargo {
        NewCargo::new(name, size, priority)
    }

    #[test]
    fn test_add_generates_sequential_ids_and_defaults() {
        let mut inv = inventory();

        let first = inv.add(cargo("Food Package A", 1.0, 50)).unwrap();
        let second = inv.add(cargo("Food Package B", 1.0, 50)).unwrap();

        assert_eq!(first.id, "ITEM-0001");
        assert_eq!(second.id, "ITEM-0002");
        assert_eq!(first.zone, "Zone B");
        assert_eq!(first.position(), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(second.position(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(first.mass, 50.0);
        assert_eq!(first.expiry_date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        assert_eq!(first.expiry_days, 30);
        assert_eq!(first.status, ExpiryStatus::Good);
        assert_eq!(inv.len(), 2);
    }

    #[test]
    fn test_generated_ids_skip_taken_ones() {
        let mut inv = inventory();
        let mut custom = cargo("Custom", 1.0, 50);
        custom.id = Some("ITEM-0001".to_string());
        inv.add(custom).unwrap();

        let generated = inv.add(cargo("Generated", 1.0, 50)).unwrap();
        assert_eq!(generated.id, "ITEM-0002");
    }

    #[test]
    fn test_duplicate_id_is_conflict() {
        let mut inv = inventory();
        let mut item = cargo("Water", 1.0, 50);
        item.id = Some("W-1".to_string());
        inv.add(item.clone()).unwrap();

        let err = inv.add(item).unwrap_err();
        assert!(matches!(err, StowageError::ConflictError { .. }));
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn test_validation_rejects_bad_payloads() {
        let mut inv = inventory();

        assert!(inv.add(cargo("", 1.0, 50)).is_err());
        assert!(inv.add(cargo("Too Big", 10.5, 50)).is_err());
        assert!(inv.add(cargo("Zero Priority", 1.0, 0)).is_err());

        let mut partial = cargo("Partial Dims", 1.0, 50);
        partial.width = Some(1.0);
        assert!(matches!(
            inv.add(partial).unwrap_err(),
            StowageError::ValidationError { .. }
        ));
        assert!(inv.is_empty());
    }

    #[test]
    fn test_explicit_zone_restricts_search() {
        let mut inv = inventory();

        let mut item = cargo("Tools", 1.0, 50);
        item.zone = Some("zone a".to_string());
        let stored = inv.add(item).unwrap();
        assert_eq!(stored.zone_id, "A");

        let mut unknown = cargo("Tools", 1.0, 50);
        unknown.zone = Some("Zone Z".to_string());
        assert!(matches!(
            inv.add(unknown).unwrap_err(),
            StowageError::NotFoundError { kind: "Zone", .. }
        ));

        // 非危險品不能放進 C 區
        let mut forbidden = cargo("Tools", 1.0, 50);
        forbidden.zone = Some("C".to_string());
        assert!(matches!(
            inv.add(forbidden).unwrap_err(),
            StowageError::NoFeasiblePlacement { .. }
        ));
    }

    #[test]
    fn test_delete_frees_slot() {
        let mut inv = inventory();
        let first = inv.add(cargo("Food Package A", 1.0, 50)).unwrap();
        inv.delete(&first.id).unwrap();

        let again = inv.add(cargo("Food Package B", 1.0, 50)).unwrap();
        assert_eq!(again.position(), first.position());
        assert!(matches!(
            inv.delete("ITEM-9999").unwrap_err(),
            StowageError::NotFoundError { .. }
        ));
    }

    #[test]
    fn test_recommend_does_not_change_state() {
        let inv = inventory();
        let rec = inv.recommend(&cargo("Medical Supplies", 1.0, 90)).unwrap();
        assert_eq!(rec.zone_id, "A");
        assert!(inv.is_empty());
    }

    #[test]
    fn test_retrieve_moves_front_blockers() {
        let mut inv = narrow_inventory();
        for name in ["Front", "Middle", "Back"] {
            inv.add(cargo(name, 1.0, 50)).unwrap();
        }

        let result = inv.retrieve("ITEM-0003").unwrap();
        let steps: Vec<(RetrievalAction, &str)> = result
            .steps
            .iter()
            .map(|s| (s.action, s.item_id.as_str()))
            .collect();

        assert_eq!(
            steps,
            vec![
                (RetrievalAction::Move, "ITEM-0001"),
                (RetrievalAction::Move, "ITEM-0002"),
                (RetrievalAction::Retrieve, "ITEM-0003"),
                (RetrievalAction::PlaceBack, "ITEM-0002"),
                (RetrievalAction::PlaceBack, "ITEM-0001"),
            ]
        );
        assert_eq!(result.steps[2].step, 3);
        assert_eq!(result.steps[3].position, Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(inv.len(), 2);
        assert!(inv.get("ITEM-0003").is_err());
    }

    #[test]
    fn test_retrieve_unstacks_boxes_on_top() {
        let mut inv = narrow_inventory();
        // 前三個填滿地板，第四、五個疊在 0001、0002 上
        for i in 0..5 {
            inv.add(cargo(&format!("Box {}", i + 1), 1.0, 50)).unwrap();
        }
        assert_eq!(inv.get("ITEM-0004").unwrap().position(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(inv.get("ITEM-0005").unwrap().position(), Vec3::new(0.0, 1.0, 1.0));

        let result = inv.retrieve("ITEM-0002").unwrap();
        let steps: Vec<(RetrievalAction, &str)> = result
            .steps
            .iter()
            .map(|s| (s.action, s.item_id.as_str()))
            .collect();

        // 0004 壓在前方的 0001 上，必須先搬開
        assert_eq!(
            steps,
            vec![
                (RetrievalAction::Move, "ITEM-0004"),
                (RetrievalAction::Move, "ITEM-0001"),
                (RetrievalAction::Move, "ITEM-0005"),
                (RetrievalAction::Retrieve, "ITEM-0002"),
                (RetrievalAction::PlaceBack, "ITEM-0001"),
                (RetrievalAction::PlaceBack, "ITEM-0004"),
                (RetrievalAction::PlaceBack, "ITEM-0005"),
            ]
        );

        // 0005 失去支撐，改放到空出來的地板位置
        assert_eq!(result.steps[6].position, Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(inv.get("ITEM-0005").unwrap().position(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(inv.get("ITEM-0004").unwrap().position(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_retrieve_moves_boxes_stacked_on_front_blockers() {
        let mut inv = narrow_inventory();
        for i in 0..4 {
            inv.add(cargo(&format!("Box {}", i + 1), 1.0, 50)).unwrap();
        }
        assert_eq!(inv.get("ITEM-0004").unwrap().position(), Vec3::new(0.0, 0.0, 1.0));

        let result = inv.retrieve("ITEM-0003").unwrap();
        let steps: Vec<(RetrievalAction, &str)> = result
            .steps
            .iter()
            .map(|s| (s.action, s.item_id.as_str()))
            .collect();

        assert_eq!(
            steps,
            vec![
                (RetrievalAction::Move, "ITEM-0004"),
                (RetrievalAction::Move, "ITEM-0001"),
                (RetrievalAction::Move, "ITEM-0002"),
                (RetrievalAction::Retrieve, "ITEM-0003"),
                (RetrievalAction::PlaceBack, "ITEM-0002"),
                (RetrievalAction::PlaceBack, "ITEM-0001"),
                (RetrievalAction::PlaceBack, "ITEM-0004"),
            ]
        );
        // 原位仍有支撐，全部放回原處
        assert_eq!(result.steps[6].position, Some(Vec3::new(0.0, 0.0, 1.0)));
        assert_eq!(inv.get("ITEM-0004").unwrap().position(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_retrieve_restows_boxes_left_unsupported() {
        let mut inv = narrow_inventory();
        for i in 0..4 {
            inv.add(cargo(&format!("Box {}", i + 1), 1.0, 50)).unwrap();
        }

        let result = inv.retrieve("ITEM-0001").unwrap();
        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.steps[2].action, RetrievalAction::PlaceBack);
        assert_eq!(result.steps[2].position, Some(Vec3::new(0.0, 0.0, 0.0)));

        // 不再懸空，新貨物疊在它上面而不是塞到下方
        assert_eq!(inv.get("ITEM-0004").unwrap().position(), Vec3::new(0.0, 0.0, 0.0));
        let next = inv.add(cargo("Box 5", 1.0, 50)).unwrap();
        assert_eq!(next.position(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_delete_refuses_supporting_box() {
        let mut inv = narrow_inventory();
        for i in 0..4 {
            inv.add(cargo(&format!("Box {}", i + 1), 1.0, 50)).unwrap();
        }

        let err = inv.delete("ITEM-0001").unwrap_err();
        assert!(matches!(err, StowageError::ConflictError { .. }));
        assert!(err.to_string().contains("ITEM-0004"));
        assert_eq!(inv.len(), 4);

        // 先移除上層即可刪除
        inv.delete("ITEM-0004").unwrap();
        inv.delete("ITEM-0001").unwrap();
        assert_eq!(inv.len(), 2);
    }

    #[test]
    fn test_retrieve_unknown_item() {
        let mut inv = inventory();
        assert!(matches!(
            inv.retrieve("missing").unwrap_err(),
            StowageError::NotFoundError { kind: "Item", .. }
        ));
    }

    #[test]
    fn test_import_places_largest_first() {
        let mut inv = inventory();
        let mut reactive = cargo("Reactive Reagent", 1.0, 50);
        reactive.hazardous = true;
        reactive.temperature_sensitive = true;

        let report = inv.import(vec![
            cargo("Small", 0.5, 50),
            cargo("Large", 2.0, 50),
            reactive,
            cargo("Invalid", 0.0, 50),
        ]);

        assert_eq!(report.success_count, 2);
        assert_eq!(inv.get("ITEM-0001").unwrap().name, "Large");
        assert_eq!(inv.get("ITEM-0002").unwrap().name, "Small");

        let failed: Vec<usize> = report.failed_items.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![2, 3]);
        assert!(report.failed_items[0].error.contains("No feasible placement"));
    }

    #[test]
    fn test_simulation_reports_crossed_expiries() {
        let mut inv = inventory();
        let mut fruit = cargo("Fresh Fruit", 0.5, 40);
        fruit.expiry_days = 2;
        inv.add(fruit).unwrap();

        let day1 = inv.simulate(1).unwrap();
        assert!(day1.expired_items.is_empty());

        let day2 = inv.simulate(1).unwrap();
        assert_eq!(day2.new_date, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert_eq!(day2.expired_items.len(), 1);
        assert_eq!(day2.expired_items[0].name, "Fresh Fruit");

        // 過期不會自動移除
        let listed = inv.list();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.cargo[0].expiry_days, 0);
        assert_eq!(listed.cargo[0].status, ExpiryStatus::Critical);

        assert!(inv.simulate(0).is_err());
    }

    #[test]
    fn test_return_plan_uses_simulated_date() {
        let mut inv = inventory();
        let mut soon = cargo("Yogurt", 0.5, 40);
        soon.expiry_days = 10;
        inv.add(soon).unwrap();
        inv.add(cargo("Rice", 1.0, 40)).unwrap();

        assert!(inv.return_plan(&ReturnPlanRequest::default()).unwrap().items.is_empty());

        inv.simulate(5).unwrap();
        let plan = inv.return_plan(&ReturnPlanRequest::default()).unwrap();
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].reason, "Expiring in 5 days");
        assert_eq!(plan.total_mass, 25.0);
    }

    #[test]
    fn test_alerts_bucket_by_days_remaining() {
        let mut inv = inventory();
        for (name, days) in [("Milk", 1), ("Bread", 3), ("Eggs", 6), ("Rice", 30)] {
            let mut item = cargo(name, 0.5, 50);
            item.expiry_days = days;
            inv.add(item).unwrap();
        }

        let alerts = inv.alerts();
        assert_eq!(alerts.critical.len(), 1);
        assert_eq!(alerts.critical[0].name, "Milk");
        assert_eq!(alerts.warning[0].name, "Bread");
        assert_eq!(alerts.notice[0].name, "Eggs");
    }

    #[test]
    fn test_metrics_and_arrangement() {
        let mut inv = inventory();
        inv.add(cargo("Food Package A", 1.0, 50)).unwrap();
        inv.add(cargo("Medical Supplies", 1.0, 90)).unwrap();

        let metrics = inv.metrics();
        assert_eq!(metrics.total_items, 2);
        assert_eq!(metrics.average_priority, 70.0);
        assert_eq!(metrics.utilization_percent, 0.4);
        assert_eq!(metrics.zones[1].zone_id, "B");
        assert_eq!(metrics.zones[1].utilization_percent, 0.7);
        assert_eq!(metrics.current_date, start());

        let rows = inv.arrangement();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].zone, "Zone A");
        assert_eq!(rows[1].zone, "Zone B");
    }
}
