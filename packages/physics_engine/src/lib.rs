//! Real-time 2D rigid body physics engine.
//!
//! Owns a set of circles and axis-aligned rectangles, advances their motion under accumulated
//! forces and torques, detects collisions between them, and applies a simple collision response,
//! once per step. Other subsystems feed it through bounded ingress queues of `Note`s.

#[macro_use]
extern crate tracing;

pub mod logging;
pub mod settings;
pub mod physics;
pub mod note;
pub mod note_codec;
pub mod ingress;
pub mod engine;
pub mod tick_mgr;


pub use crate::{
    engine::{
        PhysicsEngine,
        IngressSenders,
        StepReport,
    },
    note::{
        Note,
        NoteKind,
        Subsystem,
        Payload,
    },
    settings::EngineSettings,
};
