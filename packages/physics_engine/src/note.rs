//! Notes: messages passed into the physics engine by other subsystems.
//!
//! A note carries raw `u32` tags for its kind and sender, exactly as they travel between
//! processes, plus a typed payload. Producers build notes with the typed constructors, which
//! always produce consistent tags. Notes decoded from bytes may carry arbitrary tags, which the
//! engine validates when it drains them.

use crate::physics::{
    entity::EntityId,
    shape::Shape,
};
use serde::{Serialize, Deserialize};
use vek::*;


/// What a note is for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u32)]
pub enum NoteKind {
    Collision = 0,
    Input = 1,
    Spawn = 2,
    Kill = 3,
    /// Apply a force and torque to an entity.
    ForceUpdate = 4,
}

impl NoteKind {
    pub fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => NoteKind::Collision,
            1 => NoteKind::Input,
            2 => NoteKind::Spawn,
            3 => NoteKind::Kill,
            4 => NoteKind::ForceUpdate,
            _ => return None,
        })
    }

    pub fn tag(self) -> u32 {
        self as u32
    }
}

/// Known subsystems which exchange notes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u32)]
pub enum Subsystem {
    GameEngine = 4862,
    PhysicsEngine = 5913,
    Client = 8177,
}

impl Subsystem {
    pub fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            4862 => Subsystem::GameEngine,
            5913 => Subsystem::PhysicsEngine,
            8177 => Subsystem::Client,
            _ => return None,
        })
    }

    pub fn tag(self) -> u32 {
        self as u32
    }
}


/// Message to the physics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// `NoteKind` tag.
    pub kind: u32,
    /// `Subsystem` tag of the sender.
    pub from: u32,
    pub payload: Payload,
}

/// Note body. Which variant is expected is determined by the note's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Collision {
        a: EntityId,
        b: EntityId,
    },
    /// Opaque input state, interpreted by the game layer.
    Input(Vec<u8>),
    Spawn(SpawnSpec),
    Kill(EntityId),
    ForceUpdate(ForceUpdate),
}

impl Payload {
    /// The kind of note this payload belongs in.
    pub fn kind(&self) -> NoteKind {
        match self {
            Payload::Collision { .. } => NoteKind::Collision,
            Payload::Input(_) => NoteKind::Input,
            Payload::Spawn(_) => NoteKind::Spawn,
            Payload::Kill(_) => NoteKind::Kill,
            Payload::ForceUpdate(_) => NoteKind::ForceUpdate,
        }
    }
}

/// Force and torque to add to an entity's accumulators.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceUpdate {
    pub entity: EntityId,
    /// Missing means zero.
    pub force: Option<Vec2<f64>>,
    pub torque: f64,
}

/// Initial state of an entity to spawn.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSpec {
    pub id: EntityId,
    pub shape: Shape,
    pub mass: f64,
    pub position: Vec2<f64>,
    pub velocity: Vec2<f64>,
    pub angle: f64,
    pub angular_velocity: f64,
}

impl SpawnSpec {
    /// Spec for a body at rest at `position`.
    pub fn at_rest(id: EntityId, shape: Shape, mass: f64, position: Vec2<f64>) -> Self {
        SpawnSpec {
            id,
            shape,
            mass,
            position,
            velocity: Vec2::zero(),
            angle: 0.0,
            angular_velocity: 0.0,
        }
    }
}

impl Note {
    /// Note with the kind tag matching `payload`.
    pub fn new(from: Subsystem, payload: Payload) -> Self {
        Note {
            kind: payload.kind().tag(),
            from: from.tag(),
            payload,
        }
    }

    pub fn force_update<F>(from: Subsystem, entity: EntityId, force: F, torque: f64) -> Self
    where
        F: Into<Option<Vec2<f64>>>,
    {
        Note::new(from, Payload::ForceUpdate(ForceUpdate {
            entity,
            force: force.into(),
            torque,
        }))
    }

    pub fn spawn(from: Subsystem, spec: SpawnSpec) -> Self {
        Note::new(from, Payload::Spawn(spec))
    }

    pub fn kill(from: Subsystem, entity: EntityId) -> Self {
        Note::new(from, Payload::Kill(entity))
    }

    pub fn input(from: Subsystem, input: Vec<u8>) -> Self {
        Note::new(from, Payload::Input(input))
    }

    pub fn collision(from: Subsystem, a: EntityId, b: EntityId) -> Self {
        Note::new(from, Payload::Collision { a, b })
    }

    /// Decoded kind tag, if known.
    pub fn kind(&self) -> Option<NoteKind> {
        NoteKind::from_tag(self.kind)
    }

    /// Decoded sender tag, if known.
    pub fn sender(&self) -> Option<Subsystem> {
        Subsystem::from_tag(self.from)
    }
}


#[test]
fn tags_round_trip() {
    for kind in [
        NoteKind::Collision,
        NoteKind::Input,
        NoteKind::Spawn,
        NoteKind::Kill,
        NoteKind::ForceUpdate,
    ] {
        assert_eq!(NoteKind::from_tag(kind.tag()), Some(kind));
    }
    for sys in [Subsystem::GameEngine, Subsystem::PhysicsEngine, Subsystem::Client] {
        assert_eq!(Subsystem::from_tag(sys.tag()), Some(sys));
    }
    assert_eq!(NoteKind::from_tag(5), None);
    assert_eq!(Subsystem::from_tag(0), None);
}

#[test]
fn constructors_set_matching_tags() {
    let note = Note::force_update(Subsystem::Client, 9, Vec2::new(1.0, 2.0), 0.5);
    assert_eq!(note.kind(), Some(NoteKind::ForceUpdate));
    assert_eq!(note.sender(), Some(Subsystem::Client));
    assert_eq!(note.from, 8177);

    let note = Note::kill(Subsystem::GameEngine, 3);
    assert_eq!(note.kind, 3);
    assert_eq!(note.payload.kind(), NoteKind::Kill);
}
