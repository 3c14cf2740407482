//! Narrow-phase: exact shape-pair collision tests.

use super::{
    broadphase::CandidateSet,
    entity::{Entity, EntityId},
    shape::Shape,
};
use std::collections::{BTreeMap, BTreeSet};
use vek::*;


/// Pair of distinct entities whose shapes overlap. Always ordered so that `a < b`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ConfirmedPair {
    pub a: EntityId,
    pub b: EntityId,
}

impl ConfirmedPair {
    /// Canonical ordering of an unordered pair, or `None` for a self pair.
    pub fn new(a: EntityId, b: EntityId) -> Option<Self> {
        if a < b {
            Some(ConfirmedPair { a, b })
        } else if b < a {
            Some(ConfirmedPair { a: b, b: a })
        } else {
            None
        }
    }
}

/// Filter broad-phase candidates down to confirmed colliding pairs.
///
/// Each unordered pair is tested at most once, self pairs are skipped, and the output is sorted.
/// Candidates naming an id absent from `entities` are ignored.
pub fn narrowphase(
    entities: &BTreeMap<EntityId, Entity>,
    candidate_sets: &[CandidateSet],
) -> Vec<ConfirmedPair> {
    let pairs = candidate_sets.iter()
        .flat_map(|set| set.candidates.iter()
            .filter_map(move |&other| ConfirmedPair::new(set.entity, other)))
        .collect::<BTreeSet<_>>();

    pairs.into_iter()
        .filter(|pair| match (entities.get(&pair.a), entities.get(&pair.b)) {
            (Some(a), Some(b)) => collides(a, b),
            _ => false,
        })
        .collect()
}

/// Do the shapes of `a` and `b` overlap at their current positions? Symmetric.
pub fn collides(a: &Entity, b: &Entity) -> bool {
    match (*a.shape(), *b.shape()) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) =>
            circle_vs_circle(a.position, ra, b.position, rb),
        (Shape::Rectangle { .. }, Shape::Rectangle { .. }) =>
            rect_vs_rect(a, b),
        (Shape::Circle { radius }, Shape::Rectangle { .. }) =>
            circle_vs_rect(a.position, radius, b.position, b.shape().half_extents()),
        (Shape::Rectangle { .. }, Shape::Circle { radius }) =>
            circle_vs_rect(b.position, radius, a.position, a.shape().half_extents()),
    }
}

/// Touching circles collide.
pub fn circle_vs_circle(pa: Vec2<f64>, ra: f64, pb: Vec2<f64>, rb: f64) -> bool {
    let r = ra + rb;
    pa.distance_squared(pb) <= r * r
}

/// Separating axis test on the two world-space rectangles. Touching rectangles collide.
pub fn rect_vs_rect(a: &Entity, b: &Entity) -> bool {
    let (a, b) = (a.world_rect(), b.world_rect());
    let (a_max, b_max) = (a.max(), b.max());
    (0..2).all(|i| b.pos[i] <= a_max[i] && a.pos[i] <= b_max[i])
}

/// Circle at `pc` with `radius` against the rectangle centered at `pr` with half extents `half`.
pub fn circle_vs_rect(pc: Vec2<f64>, radius: f64, pr: Vec2<f64>, half: Extent2<f64>) -> bool {
    let dist = Vec2::new((pc.x - pr.x).abs(), (pc.y - pr.y).abs());

    if !(dist.x <= half.w + radius && dist.y <= half.h + radius) {
        return false;
    }
    if dist.x <= half.w || dist.y <= half.h {
        return true;
    }

    // closest point is a corner
    let corner = dist - Vec2::new(half.w, half.h);
    corner.magnitude_squared() <= radius * radius
}


#[cfg(test)]
fn circle(id: EntityId, r: f64, pos: [f64; 2]) -> Entity {
    Entity::new(id, Shape::circle(r).unwrap(), 1.0).unwrap().at(pos)
}

#[cfg(test)]
fn rect(id: EntityId, w: f64, h: f64, pos: [f64; 2]) -> Entity {
    Entity::new(id, Shape::rectangle([0.0, 0.0], [w, h]).unwrap(), 1.0).unwrap().at(pos)
}

#[test]
fn circle_circle_boundary() {
    assert!(collides(&circle(1, 5.0, [0.0, 0.0]), &circle(2, 5.0, [7.0, 0.0])));
    assert!(collides(&circle(1, 2.0, [0.0, 0.0]), &circle(2, 3.0, [3.0, 4.0])));
    assert!(!collides(&circle(1, 2.0, [0.0, 0.0]), &circle(2, 3.0, [3.0, 4.0001])));
}

#[test]
fn rect_rect_needs_both_axes() {
    let a = rect(1, 4.0, 2.0, [0.0, 0.0]);
    assert!(collides(&a, &rect(2, 2.0, 2.0, [3.0, 1.5])));
    assert!(collides(&a, &rect(2, 2.0, 2.0, [3.0, 2.0])));
    // overlaps on x only
    assert!(!collides(&a, &rect(2, 2.0, 2.0, [1.0, 2.5])));
    // overlaps on y only
    assert!(!collides(&a, &rect(2, 2.0, 2.0, [3.5, 0.0])));
}

#[test]
fn circle_rect_cases() {
    let r = rect(1, 4.0, 2.0, [0.0, 0.0]);
    // side contact
    assert!(collides(&circle(2, 1.0, [3.0, 0.0]), &r));
    assert!(!collides(&circle(2, 1.0, [3.01, 0.0]), &r));
    // inside
    assert!(collides(&circle(2, 0.1, [0.5, 0.2]), &r));
    // near a corner: corner at (2, 1)
    assert!(collides(&circle(2, 1.0, [2.6, 1.6]), &r));
    assert!(!collides(&circle(2, 1.0, [2.8, 1.8]), &r));
}

#[test]
fn tests_are_symmetric() {
    use rand::prelude::*;

    let mut rng = rand_pcg::Pcg64Mcg::seed_from_u64(99);
    let mut random_entity = |id| {
        let pos = [rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)];
        if rng.gen() {
            circle(id, rng.gen_range(0.5..5.0), pos)
        } else {
            rect(id, rng.gen_range(0.5..8.0), rng.gen_range(0.5..8.0), pos)
        }
    };
    for _ in 0..2000 {
        let a = random_entity(1);
        let b = random_entity(2);
        assert_eq!(collides(&a, &b), collides(&b, &a));
    }
}

#[test]
fn dedups_and_skips_self_pairs() {
    let entities = [circle(1, 5.0, [0.0, 0.0]), circle(2, 5.0, [7.0, 0.0]), circle(3, 1.0, [50.0, 0.0])]
        .into_iter()
        .map(|e| (e.id(), e))
        .collect::<BTreeMap<_, _>>();
    let sets = vec![
        CandidateSet { entity: 1, candidates: vec![1, 2] },
        CandidateSet { entity: 2, candidates: vec![2, 1, 3] },
        CandidateSet { entity: 3, candidates: vec![3, 2, 42] },
    ];
    assert_eq!(narrowphase(&entities, &sets), vec![ConfirmedPair { a: 1, b: 2 }]);
}

#[test]
fn nan_position_never_collides() {
    let nan = [f64::NAN, 0.0];
    let shapes = [circle(2, 1.0, [0.0, 0.0]), rect(2, 2.0, 2.0, [0.0, 0.0])];
    for other in &shapes {
        for lost in [circle(1, 1.0, nan), rect(1, 2.0, 2.0, nan)] {
            assert!(!collides(&lost, other));
            assert!(!collides(other, &lost));
        }
    }
}
