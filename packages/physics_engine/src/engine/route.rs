//! Routing of drained notes to their handlers.

use super::{
    PhysicsEngine,
    StepReport,
};
use crate::{
    note::*,
    physics::prelude::*,
};
use anyhow::*;


impl PhysicsEngine {
    /// Drain the general note queue.
    pub(super) fn drain_notes(&mut self, report: &mut StepReport) {
        while let Some(note) = self.recv_notes.poll() {
            let (kind, from) = (note.kind, note.from);
            if let Err(e) = self.on_note(note) {
                warn!(kind, from, "dropping note: {:#}", e);
                report.notes_dropped += 1;
            } else {
                report.notes_handled += 1;
            }
        }
    }

    /// Drain the force update queue.
    pub(super) fn drain_forces(&mut self, report: &mut StepReport) {
        while let Some(note) = self.recv_forces.poll() {
            let (kind, from) = (note.kind, note.from);
            if let Err(e) = self.on_force_note(note) {
                warn!(kind, from, "dropping force note: {:#}", e);
                report.forces_dropped += 1;
            } else {
                report.forces_applied += 1;
            }
        }
    }

    fn on_force_note(&mut self, note: Note) -> Result<()> {
        sender(&note)?;
        match (note.kind(), note.payload) {
            (Some(NoteKind::ForceUpdate), Payload::ForceUpdate(update)) =>
                self.on_force_update(update),
            (Some(NoteKind::ForceUpdate), _) => bail!("payload does not match kind"),
            _ => bail!("only force updates may be sent on the force queue"),
        }
    }

    fn on_note(&mut self, note: Note) -> Result<()> {
        let from = sender(&note)?;
        let Some(kind) = note.kind() else {
            bail!("unknown kind tag {}", note.kind);
        };
        ensure!(
            note.payload.kind() == kind,
            "{:?} note carries {:?} payload", kind, note.payload.kind(),
        );
        match from {
            Subsystem::GameEngine => self.on_game_engine_note(note.payload),
            Subsystem::Client => self.on_client_note(note.payload),
            Subsystem::PhysicsEngine => bail!("note claims to come from the physics engine itself"),
        }
    }

    /// The game engine may send notes of any kind.
    fn on_game_engine_note(&mut self, payload: Payload) -> Result<()> {
        match payload {
            Payload::Collision { a, b } => {
                debug!(a, b, "collision note from game engine");
                Ok(())
            }
            Payload::Input(input) => {
                debug!(len = input.len(), "input note from game engine");
                Ok(())
            }
            Payload::Spawn(spec) => self.on_spawn(spec),
            Payload::Kill(id) => match self.kill(id) {
                Some(_) => Ok(()),
                None => bail!("no entity {} to kill", id),
            },
            Payload::ForceUpdate(update) => self.on_force_update(update),
        }
    }

    /// Clients may only send input and force updates.
    fn on_client_note(&mut self, payload: Payload) -> Result<()> {
        match payload {
            Payload::Input(input) => {
                debug!(len = input.len(), "input note from client");
                Ok(())
            }
            Payload::ForceUpdate(update) => self.on_force_update(update),
            other => bail!("clients may not send {:?} notes", other.kind()),
        }
    }

    fn on_spawn(&mut self, spec: SpawnSpec) -> Result<()> {
        let state = [
            spec.position.x, spec.position.y,
            spec.velocity.x, spec.velocity.y,
            spec.angle, spec.angular_velocity,
        ];
        ensure!(
            state.iter().all(|c| c.is_finite()),
            "non-finite initial state for entity {}", spec.id,
        );
        let mut entity = Entity::new(spec.id, spec.shape, spec.mass)?;
        entity.position = spec.position;
        entity.velocity = spec.velocity;
        entity.angle = spec.angle;
        entity.angular_velocity = spec.angular_velocity;
        self.spawn(entity)
    }

    fn on_force_update(&mut self, update: ForceUpdate) -> Result<()> {
        ensure!(
            update.force.map_or(true, |f| f.x.is_finite() && f.y.is_finite())
                && update.torque.is_finite(),
            "non-finite force or torque for entity {}", update.entity,
        );
        let Some(entity) = self.entities.get_mut(&update.entity) else {
            bail!("no entity {} to apply force to", update.entity);
        };
        entity.apply_forces(update.force, update.torque);
        Ok(())
    }
}

fn sender(note: &Note) -> Result<Subsystem> {
    note.sender().ok_or_else(|| anyhow!("unknown sender tag {}", note.from))
}
