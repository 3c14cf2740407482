//! The physics engine step loop.
//!
//! A `PhysicsEngine` owns every entity and is stepped by a single thread. Other subsystems talk
//! to it only through its two ingress queues: a general one for notes of any kind, and one
//! reserved for force updates. Each step:
//!
//! 1. Measures the wall-clock time since the previous step.
//! 2. Drains the general note queue, routing each note by sender and kind.
//! 3. Drains the force update queue, applying forces and torques to their entities.
//! 4. Integrates every entity.
//! 5. Runs the broad-phase and narrow-phase to find colliding pairs.
//! 6. Resolves the colliding pairs.
//! 7. Records the time of this step.
//!
//! A bad note never aborts a step. It is logged, counted in the `StepReport`, and skipped.

mod clock;
mod route;

pub use self::clock::StepClock;

use crate::{
    ingress::{
        ingress_queue,
        IngressSender,
        IngressReceiver,
    },
    physics::prelude::*,
    settings::EngineSettings,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Instant,
};
use anyhow::*;


/// Producer handles to both of an engine's ingress queues. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IngressSenders {
    /// General note queue.
    pub notes: IngressSender,
    /// Queue for `ForceUpdate` notes.
    pub forces: IngressSender,
}

/// Counters describing what happened during a step.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Time step used, in seconds.
    pub dt: f64,
    /// Notes from the general queue which were applied.
    pub notes_handled: usize,
    /// Notes from the general queue which were dropped.
    pub notes_dropped: usize,
    /// Force updates from the force queue which were applied.
    pub forces_applied: usize,
    /// Notes from the force queue which were dropped.
    pub forces_dropped: usize,
    /// Total broad-phase candidates, before deduplication.
    pub candidates: usize,
    /// Confirmed colliding pairs.
    pub collisions: usize,
}

/// 2D rigid body physics engine.
pub struct PhysicsEngine {
    settings: EngineSettings,

    entities: BTreeMap<EntityId, Entity>,
    // ids which have been killed, and so may not be spawned again
    retired: BTreeSet<EntityId>,

    quadtree: QuadTree,
    last_collisions: Vec<ConfirmedPair>,

    recv_notes: IngressReceiver,
    recv_forces: IngressReceiver,

    clock: StepClock,
    steps: u64,
}

impl PhysicsEngine {
    /// Construct with no entities, along with the senders for its ingress queues.
    pub fn new(settings: EngineSettings) -> Result<(Self, IngressSenders)> {
        settings.validate()?;

        let (notes, recv_notes) = ingress_queue(settings.queue_capacity, settings.enqueue_timeout());
        let (forces, recv_forces) = ingress_queue(settings.queue_capacity, settings.enqueue_timeout());
        let quadtree = QuadTree::new(
            AaBox::centered_square(settings.world_half_extent),
            settings.quadtree_node_capacity,
            settings.quadtree_max_depth,
        );
        let engine = PhysicsEngine {
            clock: StepClock::new(settings.max_dt),
            settings,
            entities: BTreeMap::new(),
            retired: BTreeSet::new(),
            quadtree,
            last_collisions: Vec::new(),
            recv_notes,
            recv_forces,
            steps: 0,
        };
        Ok((engine, IngressSenders { notes, forces }))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Add an entity. Errors if its id is zero, in use, or was used by a killed entity.
    pub fn spawn(&mut self, entity: Entity) -> Result<()> {
        let id = entity.id();
        ensure!(id != 0, "entity id 0 is reserved");
        ensure!(!self.entities.contains_key(&id), "entity {} already exists", id);
        ensure!(!self.retired.contains(&id), "entity id {} was already used", id);
        if !self.quadtree.bounds().contains_box(entity.bounding_box()) {
            warn!(id, position = ?entity.position, "spawning entity outside the world extent");
        }
        debug!(id, "spawning entity");
        self.entities.insert(id, entity);
        Ok(())
    }

    /// Remove an entity, returning it if it existed. Its id can't be spawned again.
    pub fn kill(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        debug!(id, "killed entity");
        self.retired.insert(id);
        Some(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// All entities, in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of steps done so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Colliding pairs found by the most recent step.
    pub fn last_collisions(&self) -> &[ConfirmedPair] {
        &self.last_collisions
    }

    /// Do a step, advancing by the wall-clock time since the previous step.
    pub fn step(&mut self) -> StepReport {
        let dt = self.clock.dt(Instant::now());
        let report = self.step_dt(dt);
        self.clock.mark(Instant::now());
        report
    }

    /// Do a step, advancing by `dt` seconds.
    pub fn step_dt(&mut self, mut dt: f64) -> StepReport {
        if !(dt.is_finite() && dt >= 0.0) {
            warn!(dt, "invalid time step, using 0");
            dt = 0.0;
        }
        let mut report = StepReport { dt, ..Default::default() };

        self.drain_notes(&mut report);
        self.drain_forces(&mut report);

        for entity in self.entities.values_mut() {
            entity.integrate(dt);
        }

        let candidate_sets = broadphase(&mut self.quadtree, self.entities.values());
        report.candidates = candidate_sets.iter().map(|set| set.candidates.len()).sum();
        let pairs = narrowphase(&self.entities, &candidate_sets);
        resolve(&mut self.entities, &pairs);
        report.collisions = pairs.len();
        self.last_collisions = pairs;

        self.steps += 1;
        trace!(step = self.steps, ?report, "did step");
        report
    }
}


#[cfg(test)]
fn engine_with(entities: Vec<Entity>) -> (PhysicsEngine, IngressSenders) {
    let (mut engine, senders) = PhysicsEngine::new(EngineSettings::default()).unwrap();
    for entity in entities {
        engine.spawn(entity).unwrap();
    }
    (engine, senders)
}

#[cfg(test)]
fn ball(id: EntityId, pos: [f64; 2], vel: [f64; 2]) -> Entity {
    Entity::new(id, Shape::circle(5.0).unwrap(), 1.0).unwrap().at(pos).moving(vel)
}

#[test]
fn head_on_circles_swap_velocities() {
    use vek::*;

    let (mut engine, _senders) = engine_with(vec![
        ball(1, [0.0, 0.0], [1.0, 0.0]),
        ball(2, [7.0, 0.0], [-1.0, 0.0]),
    ]);
    let report = engine.step_dt(0.0);
    assert_eq!(report.collisions, 1);
    assert_eq!(engine.last_collisions(), &[ConfirmedPair { a: 1, b: 2 }]);
    assert_eq!(engine.entity(1).unwrap().velocity, Vec2::new(-1.0, 0.0));
    assert_eq!(engine.entity(2).unwrap().velocity, Vec2::new(1.0, 0.0));
}

#[test]
fn pair_resolved_once_per_step() {
    use vek::*;

    // both entities see each other as candidates, the swap must still happen exactly once
    let (mut engine, _senders) = engine_with(vec![
        ball(1, [0.0, 0.0], [2.0, 0.0]),
        ball(2, [1.0, 0.0], [0.0, 3.0]),
        ball(3, [500.0, 0.0], [0.0, 0.0]),
    ]);
    let report = engine.step_dt(0.0);
    assert!(report.candidates >= 5);
    assert_eq!(report.collisions, 1);
    assert_eq!(engine.entity(1).unwrap().velocity, Vec2::new(0.0, 3.0));
    assert_eq!(engine.entity(2).unwrap().velocity, Vec2::new(2.0, 0.0));
}

#[test]
fn unknown_kind_does_not_stop_drain() {
    use crate::note::*;
    use vek::*;

    let (mut engine, senders) = engine_with(vec![ball(1, [0.0, 0.0], [0.0, 0.0])]);
    let mut bad = Note::kill(Subsystem::GameEngine, 1);
    bad.kind = 99;
    senders.notes.enqueue(bad).unwrap();
    senders.notes.enqueue(Note::force_update(Subsystem::GameEngine, 1, Vec2::new(4.0, 0.0), 0.0)).unwrap();

    let report = engine.step_dt(0.5);
    assert_eq!(report.notes_dropped, 1);
    assert_eq!(report.notes_handled, 1);
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.entity(1).unwrap().velocity, Vec2::new(2.0, 0.0));
}

#[test]
fn unknown_sender_dropped() {
    use crate::note::*;

    let (mut engine, senders) = engine_with(vec![ball(1, [0.0, 0.0], [0.0, 0.0])]);
    let mut bad = Note::kill(Subsystem::GameEngine, 1);
    bad.from = 1234;
    senders.notes.enqueue(bad).unwrap();
    senders.notes.enqueue(Note::kill(Subsystem::PhysicsEngine, 1)).unwrap();

    let report = engine.step_dt(0.0);
    assert_eq!(report.notes_dropped, 2);
    assert!(engine.entity(1).is_some());
}

#[test]
fn force_update_for_missing_entity() {
    use crate::note::*;
    use vek::*;

    let (mut engine, senders) = engine_with(vec![ball(1, [0.0, 0.0], [1.0, 1.0])]);
    let before = engine.entity(1).unwrap().clone();
    senders.forces.enqueue(Note::force_update(Subsystem::GameEngine, 42, Vec2::new(1.0, 0.0), 1.0)).unwrap();

    let report = engine.step_dt(0.0);
    assert_eq!(report.forces_dropped, 1);
    assert_eq!(report.forces_applied, 0);
    assert_eq!(engine.steps(), 1);
    assert_eq!(engine.entity(1), Some(&before));
}

#[test]
fn force_queue_applies_and_clears() {
    use crate::note::*;
    use vek::*;

    let (mut engine, senders) = engine_with(vec![ball(1, [0.0, 0.0], [0.0, 0.0])]);
    senders.forces.enqueue(Note::force_update(Subsystem::Client, 1, None::<Vec2<f64>>, 2.0)).unwrap();
    senders.forces.enqueue(Note::force_update(Subsystem::Client, 1, Vec2::new(0.0, -3.0), 0.0)).unwrap();
    senders.forces.enqueue(Note::kill(Subsystem::GameEngine, 1)).unwrap();

    let report = engine.step_dt(1.0);
    assert_eq!(report.forces_applied, 2);
    assert_eq!(report.forces_dropped, 1);

    let e = engine.entity(1).unwrap();
    assert_eq!(e.velocity, Vec2::new(0.0, -3.0));
    assert_eq!(e.position, Vec2::new(0.0, -3.0));
    assert_eq!(e.force(), Vec2::zero());
    assert_eq!(e.torque(), 0.0);

    engine.step_dt(1.0);
    assert_eq!(engine.entity(1).unwrap().velocity, Vec2::new(0.0, -3.0));
}

#[test]
fn spawn_and_kill_notes() {
    use crate::note::*;
    use vek::*;

    let (mut engine, senders) = engine_with(vec![]);
    let spec = SpawnSpec::at_rest(7, Shape::circle(1.0).unwrap(), 3.0, Vec2::new(10.0, 10.0));
    senders.notes.enqueue(Note::spawn(Subsystem::GameEngine, spec)).unwrap();
    // clients may not spawn
    senders.notes.enqueue(Note::spawn(Subsystem::Client, SpawnSpec { id: 8, ..spec })).unwrap();
    // invalid mass
    senders.notes.enqueue(Note::spawn(Subsystem::GameEngine, SpawnSpec { id: 9, mass: 0.0, ..spec })).unwrap();
    let report = engine.step_dt(0.0);
    assert_eq!((report.notes_handled, report.notes_dropped), (1, 2));
    assert_eq!(engine.entities().map(|e| e.id()).collect::<Vec<_>>(), vec![7]);
    assert_eq!(engine.entity(7).unwrap().position, Vec2::new(10.0, 10.0));

    senders.notes.enqueue(Note::kill(Subsystem::GameEngine, 7)).unwrap();
    senders.notes.enqueue(Note::kill(Subsystem::GameEngine, 7)).unwrap();
    senders.notes.enqueue(Note::spawn(Subsystem::GameEngine, spec)).unwrap();
    let report = engine.step_dt(0.0);
    assert_eq!((report.notes_handled, report.notes_dropped), (1, 2));
    assert!(engine.is_empty());
}

#[test]
fn spawn_rejects_reused_ids() {
    let (mut engine, _senders) = engine_with(vec![ball(1, [0.0, 0.0], [0.0, 0.0])]);
    assert!(engine.spawn(ball(1, [50.0, 0.0], [0.0, 0.0])).is_err());
    assert!(engine.spawn(ball(0, [50.0, 0.0], [0.0, 0.0])).is_err());
    assert!(engine.kill(1).is_some());
    assert!(engine.kill(1).is_none());
    assert!(engine.spawn(ball(1, [0.0, 0.0], [0.0, 0.0])).is_err());
    engine.spawn(ball(2, [0.0, 0.0], [0.0, 0.0])).unwrap();
}

#[test]
fn input_and_collision_notes_accepted() {
    use crate::note::*;

    let (mut engine, senders) = engine_with(vec![]);
    senders.notes.enqueue(Note::input(Subsystem::Client, vec![1, 2, 3])).unwrap();
    senders.notes.enqueue(Note::collision(Subsystem::GameEngine, 1, 2)).unwrap();
    senders.notes.enqueue(Note::collision(Subsystem::Client, 1, 2)).unwrap();
    let report = engine.step_dt(0.0);
    assert_eq!((report.notes_handled, report.notes_dropped), (2, 1));
}

#[test]
fn mismatched_payload_dropped() {
    use crate::note::*;

    let (mut engine, senders) = engine_with(vec![ball(1, [0.0, 0.0], [0.0, 0.0])]);
    let mut note = Note::kill(Subsystem::GameEngine, 1);
    note.kind = NoteKind::Input.tag();
    senders.notes.enqueue(note).unwrap();
    let report = engine.step_dt(0.0);
    assert_eq!(report.notes_dropped, 1);
    assert_eq!(engine.len(), 1);
}

#[test]
fn wall_clock_steps() {
    let (mut engine, _senders) = engine_with(vec![ball(1, [0.0, 0.0], [1.0, 0.0])]);
    let max_dt = engine.settings().max_dt.unwrap();
    for _ in 0..3 {
        let report = engine.step();
        assert!(report.dt >= 0.0 && report.dt <= max_dt);
    }
    assert_eq!(engine.steps(), 3);
    assert!(engine.entity(1).unwrap().position.x >= 0.0);
}

#[test]
fn invalid_dt_treated_as_zero() {
    let (mut engine, _senders) = engine_with(vec![ball(1, [0.0, 0.0], [1.0, 0.0])]);
    assert_eq!(engine.step_dt(f64::NAN).dt, 0.0);
    assert_eq!(engine.step_dt(-1.0).dt, 0.0);
    assert_eq!(engine.entity(1).unwrap().position.x, 0.0);
}

#[cfg(test)]
fn crate_at(id: EntityId, pos: [f64; 2], vel: [f64; 2]) -> Entity {
    Entity::new(id, Shape::rectangle([0.0, 0.0], [2.0, 2.0]).unwrap(), 1.0).unwrap().at(pos).moving(vel)
}

#[test]
fn non_finite_force_dropped() {
    use crate::note::*;
    use vek::*;

    let (mut engine, senders) = engine_with(vec![
        crate_at(1, [0.0, 0.0], [0.0, 0.0]),
        crate_at(2, [5000.0, 0.0], [1.0, 0.0]),
    ]);
    senders.forces.enqueue(Note::force_update(Subsystem::Client, 1, Vec2::new(f64::NAN, 0.0), 0.0)).unwrap();
    senders.forces.enqueue(Note::force_update(Subsystem::Client, 1, Vec2::new(1.0, 0.0), f64::INFINITY)).unwrap();
    senders.notes.enqueue(Note::force_update(Subsystem::GameEngine, 2, Vec2::new(0.0, f64::NEG_INFINITY), 0.0)).unwrap();

    let report = engine.step_dt(0.1);
    assert_eq!((report.forces_applied, report.forces_dropped), (0, 2));
    assert_eq!((report.notes_handled, report.notes_dropped), (0, 1));
    assert_eq!(report.collisions, 0);
    assert!(engine.last_collisions().is_empty());

    let a = engine.entity(1).unwrap();
    assert_eq!(a.position, Vec2::zero());
    assert_eq!(a.velocity, Vec2::zero());
    assert_eq!(a.angular_velocity, 0.0);
    let b = engine.entity(2).unwrap();
    assert_eq!(b.velocity, Vec2::new(1.0, 0.0));
    assert!(b.position.x.is_finite() && b.position.y.is_finite());
}

#[test]
fn non_finite_spawn_dropped() {
    use crate::note::*;
    use vek::*;

    let (mut engine, senders) = engine_with(vec![crate_at(1, [0.0, 0.0], [0.0, 0.0])]);
    let spec = SpawnSpec::at_rest(2, Shape::rectangle([0.0, 0.0], [2.0, 2.0]).unwrap(), 1.0, Vec2::new(f64::NAN, 0.0));
    senders.notes.enqueue(Note::spawn(Subsystem::GameEngine, spec)).unwrap();
    let moving = SpawnSpec { id: 3, position: Vec2::new(1.0, 0.0), velocity: Vec2::new(f64::INFINITY, 0.0), ..spec };
    senders.notes.enqueue(Note::spawn(Subsystem::GameEngine, moving)).unwrap();
    let spinning = SpawnSpec { id: 4, position: Vec2::new(1.0, 0.0), angle: f64::NAN, ..spec };
    senders.notes.enqueue(Note::spawn(Subsystem::GameEngine, spinning)).unwrap();

    let report = engine.step_dt(0.1);
    assert_eq!((report.notes_handled, report.notes_dropped), (0, 3));
    assert_eq!(engine.entities().map(|e| e.id()).collect::<Vec<_>>(), vec![1]);
    assert_eq!(engine.entity(1).unwrap().velocity, Vec2::zero());
    assert_eq!(report.collisions, 0);
}

#[test]
fn dropped_notes_leave_other_entities_untouched() {
    use crate::note::*;
    use vek::*;

    let (mut engine, senders) = engine_with(vec![
        ball(1, [0.0, 0.0], [1.0, 1.0]),
        crate_at(2, [100.0, 0.0], [0.0, -2.0]),
        ball(3, [-100.0, 50.0], [0.5, 0.0]),
    ]);
    let before = engine.entities().cloned().collect::<Vec<_>>();

    senders.forces.enqueue(Note::force_update(Subsystem::GameEngine, 42, Vec2::new(1.0, 0.0), 1.0)).unwrap();
    senders.forces.enqueue(Note::force_update(Subsystem::Client, 2, Vec2::new(f64::NAN, 0.0), 0.0)).unwrap();
    senders.notes.enqueue(Note::kill(Subsystem::Client, 3)).unwrap();
    let mut unknown = Note::kill(Subsystem::GameEngine, 1);
    unknown.kind = 99;
    senders.notes.enqueue(unknown).unwrap();

    let report = engine.step_dt(0.0);
    assert_eq!(report.forces_dropped, 2);
    assert_eq!(report.notes_dropped, 2);
    assert_eq!(engine.entities().cloned().collect::<Vec<_>>(), before);
}
