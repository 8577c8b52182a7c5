use crate::domain::model::{CargoItem, ExpiryStatus, ReturnItem, ReturnPlan, ReturnPlanRequest};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use chrono::NaiveDate;

/// Picks expiring cargo for the return vehicle.
///
/// Eligible items are taken soonest-to-expire first (then lowest priority,
/// then id) and loaded first-fit: an item that would overflow `max_weight` is
/// listed in `excluded` while lighter items behind it are still considered.
pub fn plan_return<'a>(
    items: impl IntoIterator<Item = &'a CargoItem>,
    today: NaiveDate,
    request: &ReturnPlanRequest,
) -> Result<ReturnPlan> {
    request.validate()?;

    let mut eligible: Vec<(&CargoItem, i64)> = items
        .into_iter()
        .map(|item| (item, item.days_remaining(today)))
        .filter(|(item, days)| {
            *days <= request.days_threshold && item.priority >= request.priority_threshold
        })
        .collect();

    eligible.sort_by(|(a, a_days), (b, b_days)| {
        a_days
            .cmp(b_days)
            .then(a.priority.cmp(&b.priority))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut plan = ReturnPlan {
        items: Vec::new(),
        total_mass: 0.0,
        total_volume: 0.0,
        excluded: Vec::new(),
        generated_at: today,
    };

    for (item, days) in eligible {
        if plan.total_mass + item.mass > request.max_weight + 1e-9 {
            plan.excluded.push(item.id.clone());
            continue;
        }

        plan.total_mass += item.mass;
        plan.total_volume += item.size;
        plan.items.push(ReturnItem {
            id: item.id.clone(),
            name: item.name.clone(),
            zone: item.zone.clone(),
            days_remaining: days,
            mass: item.mass,
            size: item.size,
            priority: item.priority,
            status: ExpiryStatus::from_days_remaining(days),
            reason: if days == 0 {
                "Expired".to_string()
            } else {
                format!("Expiring in {} days", days)
            },
        });
    }

    tracing::debug!(
        selected = plan.items.len(),
        excluded = plan.excluded.len(),
        total_mass = plan.total_mass,
        "return plan built"
    );
    Ok(plan)
}
