//! Collision response.
//!
//! The response is a plain exchange of linear velocities between the two bodies of each pair. It
//! ignores mass, contact normal and penetration depth, does no positional correction, and leaves
//! angular velocity alone. Momentum and kinetic energy of a pair are only conserved when the two
//! masses are equal.

use super::{
    entity::{Entity, EntityId},
    narrowphase::ConfirmedPair,
};
use std::collections::BTreeMap;


/// Resolve each pair in order by swapping the velocities of its two entities.
///
/// Pairs naming a missing entity are skipped.
pub fn resolve(entities: &mut BTreeMap<EntityId, Entity>, pairs: &[ConfirmedPair]) {
    for pair in pairs {
        let (Some(va), Some(vb)) = (
            entities.get(&pair.a).map(|e| e.velocity),
            entities.get(&pair.b).map(|e| e.velocity),
        ) else {
            warn!(?pair, "resolving pair with missing entity");
            continue;
        };
        if let Some(a) = entities.get_mut(&pair.a) {
            a.velocity = vb;
        }
        if let Some(b) = entities.get_mut(&pair.b) {
            b.velocity = va;
        }
    }
}


#[test]
fn swaps_velocities_only() {
    use super::shape::Shape;
    use vek::*;

    let a = Entity::new(1, Shape::circle(5.0).unwrap(), 2.0).unwrap()
        .at([0.0, 0.0])
        .moving([1.0, 0.0]);
    let mut b = Entity::new(2, Shape::rectangle([0.0, 0.0], [3.0, 1.0]).unwrap(), 7.0).unwrap()
        .at([7.0, 0.0])
        .moving([-1.0, 0.5]);
    b.angular_velocity = 3.0;
    b.angle = 0.25;

    let mut entities = [a.clone(), b.clone()].into_iter()
        .map(|e| (e.id(), e))
        .collect::<BTreeMap<_, _>>();
    resolve(&mut entities, &[ConfirmedPair { a: 1, b: 2 }]);

    let (a2, b2) = (&entities[&1], &entities[&2]);
    assert_eq!(a2.velocity, Vec2::new(-1.0, 0.5));
    assert_eq!(b2.velocity, Vec2::new(1.0, 0.0));
    assert_eq!(a2.position, a.position);
    assert_eq!(b2.position, b.position);
    assert_eq!(a2.mass(), a.mass());
    assert_eq!(b2.mass(), b.mass());
    assert_eq!((b2.angle, b2.angular_velocity), (b.angle, b.angular_velocity));
}
