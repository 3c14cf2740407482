//! Broad-phase: cheap bounding box filtering of collision candidates.

use super::{
    entity::{Entity, EntityId},
    quadtree::QuadTree,
};


/// An entity together with every entity whose bounding box overlaps its own.
///
/// Not deduplicated against other candidate sets, and may contain the entity itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    pub entity: EntityId,
    pub candidates: Vec<EntityId>,
}

/// Rebuild `tree` from `entities` and query it once per entity.
///
/// Never misses an overlapping pair. May report pairs whose shapes do not actually touch.
pub fn broadphase<'a, I>(tree: &mut QuadTree, entities: I) -> Vec<CandidateSet>
where
    I: IntoIterator<Item = &'a Entity>,
    I::IntoIter: Clone,
{
    let entities = entities.into_iter();

    tree.clear();
    for entity in entities.clone() {
        tree.insert(entity.id(), entity.bounding_box());
    }

    entities
        .map(|entity| CandidateSet {
            entity: entity.id(),
            candidates: tree.query(entity.bounding_box()),
        })
        .collect()
}


#[test]
fn recall_matches_brute_force() {
    use super::{aa_box::AaBox, shape::Shape};
    use rand::prelude::*;

    let mut rng = rand_pcg::Pcg64Mcg::seed_from_u64(7);
    let entities = (1..=400)
        .map(|id| {
            let shape = if rng.gen() {
                Shape::circle(rng.gen_range(0.5..20.0)).unwrap()
            } else {
                let w = rng.gen_range(0.5..30.0);
                let h = rng.gen_range(0.5..30.0);
                Shape::rectangle([-w / 2.0, -h / 2.0], [w / 2.0, h / 2.0]).unwrap()
            };
            Entity::new(id, shape, rng.gen_range(0.1..10.0)).unwrap()
                .at([rng.gen_range(-600.0..600.0), rng.gen_range(-600.0..600.0)])
        })
        .collect::<Vec<_>>();

    let mut tree = QuadTree::new(AaBox::centered_square(100_000.0), 8, 12);
    let sets = broadphase(&mut tree, &entities);
    assert_eq!(sets.len(), entities.len());

    for (set, e) in sets.iter().zip(&entities) {
        assert_eq!(set.entity, e.id());
        for f in &entities {
            if e.bounding_box().intersects(f.bounding_box()) {
                assert!(
                    set.candidates.contains(&f.id()),
                    "entity {} missing candidate {}", e.id(), f.id(),
                );
            }
        }
    }
}
