//! Zone occupancy and free-slot search.
//!
//! Candidate origins are generated with the extreme-point heuristic: the zone
//! origin plus, for every box already in the zone, the three corners that sit
//! right of it, behind it and on top of it. The first feasible candidate in
//! `(z, y, x)` order wins, so cargo fills floor first, then front to back,
//! then left to right.

use crate::domain::model::{Dimensions, Vec3, Zone};
use std::cmp::Ordering;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    pub origin: Vec3,
    pub dims: Dimensions,
}

impl Cuboid {
    pub fn new(origin: Vec3, dims: Dimensions) -> Self {
        Self { origin, dims }
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.dims.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.dims.depth
    }

    pub fn top(&self) -> f64 {
        self.origin.z + self.dims.height
    }

    /// Interiors intersect; shared faces do not count.
    pub fn overlaps(&self, other: &Cuboid) -> bool {
        self.origin.x < other.max_x() - EPS
            && other.origin.x < self.max_x() - EPS
            && self.origin.y < other.max_y() - EPS
            && other.origin.y < self.max_y() - EPS
            && self.origin.z < other.top() - EPS
            && other.origin.z < self.top() - EPS
    }

    pub fn footprint_overlaps(&self, other: &Cuboid) -> bool {
        self.origin.x < other.max_x() - EPS
            && other.origin.x < self.max_x() - EPS
            && self.origin.y < other.max_y() - EPS
            && other.origin.y < self.max_y() - EPS
    }

    pub fn x_overlaps(&self, other: &Cuboid) -> bool {
        self.origin.x < other.max_x() - EPS && other.origin.x < self.max_x() - EPS
    }

    pub fn z_overlaps(&self, other: &Cuboid) -> bool {
        self.origin.z < other.top() - EPS && other.origin.z < self.top() - EPS
    }

    fn footprint_contains(&self, x: f64, y: f64) -> bool {
        x >= self.origin.x - EPS
            && x <= self.max_x() + EPS
            && y >= self.origin.y - EPS
            && y <= self.max_y() + EPS
    }

    pub fn within_zone(&self, zone: &Zone) -> bool {
        let [zx, zy, zz] = zone.origin;
        let [zw, zd, zh] = zone.size;
        self.origin.x >= zx - EPS
            && self.origin.y >= zy - EPS
            && self.origin.z >= zz - EPS
            && self.max_x() <= zx + zw + EPS
            && self.max_y() <= zy + zd + EPS
            && self.top() <= zz + zh + EPS
    }
}

/// A box already stored in a zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupant {
    pub bounds: Cuboid,
    pub fragile: bool,
}

/// Resting on the floor, or centred on the top face of a non-fragile box,
/// with no fragile box underneath any part of the footprint.
pub fn is_supported(candidate: &Cuboid, zone: &Zone, occupants: &[Occupant]) -> bool {
    let base = candidate.origin.z;

    let crushes_fragile = occupants.iter().any(|o| {
        o.fragile && (o.bounds.top() - base).abs() < EPS && o.bounds.footprint_overlaps(candidate)
    });
    if crushes_fragile {
        return false;
    }

    if (base - zone.origin[2]).abs() < EPS {
        return true;
    }

    let cx = candidate.origin.x + candidate.dims.width / 2.0;
    let cy = candidate.origin.y + candidate.dims.depth / 2.0;
    occupants.iter().any(|o| {
        !o.fragile && (o.bounds.top() - base).abs() < EPS && o.bounds.footprint_contains(cx, cy)
    })
}

pub fn candidate_points(zone: &Zone, occupants: &[Occupant]) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(1 + occupants.len() * 3);
    points.push(Vec3::new(zone.origin[0], zone.origin[1], zone.origin[2]));

    for occupant in occupants {
        let b = &occupant.bounds;
        points.push(Vec3::new(b.max_x(), b.origin.y, b.origin.z));
        points.push(Vec3::new(b.origin.x, b.max_y(), b.origin.z));
        if !occupant.fragile {
            points.push(Vec3::new(b.origin.x, b.origin.y, b.top()));
        }
    }

    points.sort_by(|a, b| compare_points(a, b));
    points.dedup_by(|a, b| {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS && (a.z - b.z).abs() < EPS
    });
    points
}

fn compare_points(a: &Vec3, b: &Vec3) -> Ordering {
    a.z.total_cmp(&b.z)
        .then(a.y.total_cmp(&b.y))
        .then(a.x.total_cmp(&b.x))
}

/// Lowest, front-most, left-most origin where `dims` fits, if any.
pub fn find_slot(zone: &Zone, occupants: &[Occupant], dims: Dimensions) -> Option<Vec3> {
    candidate_points(zone, occupants).into_iter().find(|point| {
        let candidate = Cuboid::new(*point, dims);
        candidate.within_zone(zone)
            && !occupants.iter().any(|o| o.bounds.overlaps(&candidate))
            && is_supported(&candidate, zone, occupants)
    })
}
