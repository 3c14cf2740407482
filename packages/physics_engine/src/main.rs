//! Runs the physics engine on its own, with a stand-in producer feeding it force updates.

#[macro_use]
extern crate tracing;

use physics_engine::{
    logging::init_logging,
    note::*,
    physics::prelude::*,
    settings::{
        EngineSettings,
        SETTINGS_FILE_NAME,
    },
    tick_mgr::TickMgr,
    PhysicsEngine,
    IngressSenders,
};
use std::{
    sync::{
        Arc,
        atomic::{
            AtomicBool,
            Ordering,
        },
    },
    thread,
    time::Duration,
};
use anyhow::*;
use vek::*;


fn main() {
    let settings = EngineSettings::read(SETTINGS_FILE_NAME);
    init_logging(settings.log_file.as_deref());
    if let Err(e) = run(settings) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(settings: EngineSettings) -> Result<()> {
    info!(?settings, "loaded settings");
    let tick = settings.tick();

    let (mut engine, senders) = PhysicsEngine::new(settings)?;
    spawn_scene(&mut engine)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("error setting ctrlc handler")?;
    }
    let producer = thread::spawn({
        let running = Arc::clone(&running);
        move || push_forces(senders, running)
    });

    let mut tick_mgr = TickMgr::new(tick);
    while running.load(Ordering::SeqCst) {
        let report = engine.step();
        if report.collisions > 0 {
            debug!(tick = tick_mgr.tick(), pairs = ?engine.last_collisions(), "collisions");
        }
        tick_mgr.on_tick_done();
        thread::sleep(tick_mgr.next_tick().saturating_duration_since(std::time::Instant::now()));
    }

    info!("shutting down");
    if producer.join().is_err() {
        error!("producer thread panicked");
    }
    for entity in engine.entities() {
        info!(id = entity.id(), position = ?entity.position, velocity = ?entity.velocity, "final state");
    }
    Ok(())
}

/// A row of balls heading into each other, and a crate in the middle.
fn spawn_scene(engine: &mut PhysicsEngine) -> Result<()> {
    for i in 0..4 {
        let x = -60.0 + 40.0 * i as f64;
        let dir = if i < 2 { 1.0 } else { -1.0 };
        engine.spawn(Entity::with_defaults(i + 1).at([x, 0.0]).moving([5.0 * dir, 0.0]))?;
    }
    let crate_shape = Shape::rectangle([-8.0, -8.0], [8.0, 8.0])?;
    engine.spawn(Entity::new(10, crate_shape, 40.0)?.at([0.0, 40.0]))?;
    Ok(())
}

/// Stand-in for the game engine: periodically nudges the crate downwards.
fn push_forces(senders: IngressSenders, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        let note = Note::force_update(Subsystem::GameEngine, 10, Vec2::new(0.0, -400.0), 5.0);
        if let Err(e) = senders.forces.enqueue(note) {
            warn!(%e, "force update not delivered");
        }
        thread::sleep(Duration::from_millis(250));
    }
}
