//! See `TickMgr`.

use std::time::{
    Instant,
    Duration,
};


/// Schedules engine steps at a steady cadence.
pub struct TickMgr {
    tick: u64,
    tick_duration: Duration,
    next_tick: Instant,
}

impl TickMgr {
    /// Construct with the first tick due now.
    pub fn new(tick_duration: Duration) -> Self {
        TickMgr {
            tick: 0,
            tick_duration,
            next_tick: Instant::now(),
        }
    }

    /// Get the number of ticks done so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Get the time that the next tick is scheduled to occur ideally.
    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }

    /// Call this after doing a tick, so as to schedule the next tick.
    ///
    /// If ticks have fallen behind schedule the missed ones are skipped rather than run back to
    /// back.
    pub fn on_tick_done(&mut self) {
        self.on_tick_done_at(Instant::now());
    }

    fn on_tick_done_at(&mut self, now: Instant) {
        self.tick += 1;

        self.next_tick += self.tick_duration;
        if self.next_tick < now {
            let tick_nanos = self.tick_duration.as_nanos().max(1);
            let behind_ticks = (now - self.next_tick).as_nanos().div_ceil(tick_nanos);
            let behind_ticks = u32::try_from(behind_ticks).unwrap_or(u32::MAX);
            warn!("running too slow, skipping {behind_ticks} ticks");
            self.next_tick += self.tick_duration * behind_ticks;
        }
    }
}


#[test]
fn skips_missed_ticks() {
    let mut mgr = TickMgr::new(Duration::from_millis(10));
    let t0 = mgr.next_tick();

    mgr.on_tick_done_at(t0);
    assert_eq!(mgr.next_tick(), t0 + Duration::from_millis(10));

    mgr.on_tick_done_at(t0 + Duration::from_millis(45));
    assert_eq!(mgr.tick(), 2);
    assert_eq!(mgr.next_tick(), t0 + Duration::from_millis(50));
}
