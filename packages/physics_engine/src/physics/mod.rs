//! Rigid body physics.
//!
//! Bodies are circles and axis-aligned rectangles. The pipeline run each step is:
//!
//! - `Entity::integrate` advances every body with semi-implicit Euler.
//! - `broadphase` rebuilds a `QuadTree` over the bodies' bounding boxes and produces, per body, the
//!   bodies whose boxes overlap its own.
//! - `narrowphase` deduplicates those candidates into canonical pairs and keeps the ones whose
//!   shapes actually overlap.
//! - `resolve` applies the collision response to the confirmed pairs.

pub mod aa_box;
pub mod shape;
pub mod entity;
pub mod quadtree;
pub mod broadphase;
pub mod narrowphase;
pub mod resolve;


/// Physics system common re-exports.
pub mod prelude {
    pub use super::{
        aa_box::AaBox,
        shape::Shape,
        entity::{
            Entity,
            EntityId,
        },
        quadtree::QuadTree,
        broadphase::{
            broadphase,
            CandidateSet,
        },
        narrowphase::{
            narrowphase,
            collides,
            ConfirmedPair,
        },
        resolve::resolve,
    };
}
