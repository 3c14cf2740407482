//! Engine configuration.

use std::{
    path::{
        Path,
        PathBuf,
    },
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
    time::Duration,
};
use serde::{Serialize, Deserialize};
use anyhow::*;


pub const SETTINGS_FILE_NAME: &'static str = "physics_engine.json";


/// Physics engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// The spatial index covers `[-world_half_extent, world_half_extent]` on both axes. Entities
    /// are expected to stay inside it.
    pub world_half_extent: f64,
    /// Capacity of each ingress queue.
    pub queue_capacity: usize,
    /// How long a producer waits on a full ingress queue before giving up.
    pub enqueue_timeout_ms: u64,
    /// Upper bound on the wall-clock time step, in seconds. `None` for no bound.
    pub max_dt: Option<f64>,
    pub quadtree_node_capacity: usize,
    pub quadtree_max_depth: u32,
    /// Step cadence used when running the engine on its own thread.
    pub tick_millis: u64,
    /// File that logs are also written to. `None` to log to stdout only.
    pub log_file: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            world_half_extent: 100_000.0,
            queue_capacity: 10_000,
            enqueue_timeout_ms: 100,
            max_dt: Some(0.25),
            quadtree_node_capacity: 8,
            quadtree_max_depth: 12,
            tick_millis: 16,
            log_file: Some("log".into()),
        }
    }
}

impl EngineSettings {
    pub fn read(path: impl AsRef<Path>) -> Self {
        Self::try_read(path).unwrap_or_else(|e| {
            debug!(%e, "using default settings");
            Self::default()
        })
    }

    pub fn try_read(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }

    /// Check for values the engine can't run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.world_half_extent.is_finite() && self.world_half_extent > 0.0,
            "world_half_extent must be positive, got {}", self.world_half_extent,
        );
        ensure!(self.queue_capacity > 0, "queue_capacity must be positive");
        ensure!(self.quadtree_node_capacity > 0, "quadtree_node_capacity must be positive");
        ensure!(self.tick_millis > 0, "tick_millis must be positive");
        if let Some(max_dt) = self.max_dt {
            ensure!(max_dt.is_finite() && max_dt > 0.0, "max_dt must be positive, got {}", max_dt);
        }
        Ok(())
    }

    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}


#[test]
fn partial_json_fills_defaults() {
    let settings: EngineSettings = serde_json::from_str(r#"{ "queue_capacity": 5, "max_dt": null }"#).unwrap();
    assert_eq!(settings.queue_capacity, 5);
    assert_eq!(settings.max_dt, None);
    assert_eq!(settings.world_half_extent, 100_000.0);
    settings.validate().unwrap();
}

#[test]
fn log_file_can_be_disabled() {
    assert_eq!(EngineSettings::default().log_file, Some(PathBuf::from("log")));
    let settings: EngineSettings = serde_json::from_str(r#"{ "log_file": null }"#).unwrap();
    assert_eq!(settings.log_file, None);
    let settings: EngineSettings = serde_json::from_str(r#"{ "log_file": "engine.log" }"#).unwrap();
    assert_eq!(settings.log_file, Some(PathBuf::from("engine.log")));
}

#[test]
fn validate_rejects_nonsense() {
    let mut settings = EngineSettings::default();
    settings.validate().unwrap();
    settings.max_dt = Some(-1.0);
    assert!(settings.validate().is_err());
    settings.max_dt = None;
    settings.queue_capacity = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn write_then_read() {
    let path = std::env::temp_dir().join(format!("physics_engine_settings_{}.json", std::process::id()));
    let mut settings = EngineSettings::default();
    settings.tick_millis = 50;
    settings.write(&path).unwrap();
    assert_eq!(EngineSettings::try_read(&path).unwrap(), settings);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn read_missing_file_uses_defaults() {
    let path = std::env::temp_dir().join(format!("physics_engine_missing_{}.json", std::process::id()));
    assert_eq!(EngineSettings::read(&path), EngineSettings::default());
}
