//! Game loop orchestrator
//!
//! Owns the run state machine and sequences the subsystems once per frame:
//! nitro → progression → spawn → steering → obstacle motion → score → crash
//! check. Frames arrive as timestamps from the platform's frame driver; the
//! orchestrator keeps the handle of the one frame it has requested so pausing
//! or crashing can cancel it.

use super::collision::first_hit;
use super::obstacles::ObstacleField;
use super::progression::LevelTable;
use super::state::{Control, GameMode, GamePhase, Obstacle, RunState, Steering, Vehicle};
use crate::Tuning;
use crate::consts::*;
use crate::persistence::{KeyValueStore, Profile};
use crate::platform::{FrameHandle, FrameScheduler};
use crate::ui::{
    ENDLESS_LABEL, Hud, PresentationSink, RunSummary, Snapshot, SoundCue, TerminalMessage,
};

/// External collaborators the game talks to
pub struct Host {
    pub store: Box<dyn KeyValueStore>,
    pub sink: Box<dyn PresentationSink>,
    pub scheduler: Box<dyn FrameScheduler>,
}

impl Host {
    pub fn new(
        store: impl KeyValueStore + 'static,
        sink: impl PresentationSink + 'static,
        scheduler: impl FrameScheduler + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            sink: Box::new(sink),
            scheduler: Box::new(scheduler),
        }
    }
}

/// The whole game: run state, subsystems and the persisted profile
pub struct Game {
    tuning: Tuning,
    levels: LevelTable,
    profile: Profile,
    run: RunState,
    vehicle: Vehicle,
    field: ObstacleField,
    host: Host,
    /// Frame requested from the scheduler and not yet fired
    pending_frame: Option<FrameHandle>,
    /// Timestamp the next delta is measured from
    last_timestamp: f64,
}

impl Game {
    /// Create an idle game; loads the profile from the host's store
    pub fn new(tuning: Tuning, seed: u64, host: Host) -> Self {
        let profile = Profile::load(host.store.as_ref());
        Self {
            run: RunState::new(GameMode::Free, &tuning),
            tuning,
            levels: LevelTable::new(),
            profile,
            vehicle: Vehicle::default(),
            field: ObstacleField::new(seed),
            host,
            pending_frame: None,
            last_timestamp: 0.0,
        }
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.run.phase
    }

    #[inline]
    pub fn run(&self) -> &RunState {
        &self.run
    }

    #[inline]
    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    #[inline]
    pub fn obstacles(&self) -> &[Obstacle] {
        self.field.obstacles()
    }

    #[inline]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[inline]
    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    #[inline]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Whether a frame callback is outstanding
    #[inline]
    pub fn is_frame_pending(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Current view for the presentation layer
    pub fn snapshot(&self) -> Snapshot<'_> {
        build_snapshot(
            &self.run,
            &self.vehicle,
            self.field.obstacles(),
            &self.profile,
            &self.levels,
        )
    }

    // === State machine ===

    /// Begin a run in `mode`; valid from Idle or Terminal only
    ///
    /// Mission runs require the level to be unlocked.
    pub fn start(&mut self, mode: GameMode, now: f64) -> bool {
        if self.run.is_running() {
            log::debug!("Ignoring start: run already in progress");
            return false;
        }
        if let GameMode::Level { level } = mode {
            if !self.profile.is_unlocked(level) {
                log::warn!(
                    "Level {level} is locked (unlocked up to {})",
                    self.profile.unlocked_levels
                );
                return false;
            }
        }

        self.run = RunState::new(mode, &self.tuning);
        self.run.phase = GamePhase::Running;
        self.vehicle = Vehicle::default();
        self.field.clear();
        self.last_timestamp = now;

        match mode {
            GameMode::Free => log::info!("Free run started"),
            GameMode::Level { level } => log::info!(
                "Level {level} started: speed {:.1}, spawn every {}ms, target {}",
                self.run.base_speed,
                self.run.spawn_interval_ms,
                self.levels.get(level).target
            ),
        }

        self.host.sink.on_cue(SoundCue::EngineStart);
        self.publish_frame();
        self.schedule_frame();
        true
    }

    /// Suspend a running game; the pending frame is cancelled
    pub fn pause(&mut self) -> bool {
        if self.run.phase != GamePhase::Running {
            return false;
        }
        self.run.phase = GamePhase::Paused;
        self.cancel_frame();
        log::info!("Paused at {:.0}ms", self.run.elapsed_ms);
        self.host.sink.on_cue(SoundCue::EngineStop);
        self.publish_frame();
        true
    }

    /// Continue a paused game; the clock is re-anchored at `now`
    pub fn resume(&mut self, now: f64) -> bool {
        if self.run.phase != GamePhase::Paused {
            return false;
        }
        self.run.phase = GamePhase::Running;
        self.last_timestamp = now;
        log::info!("Resumed");
        self.host.sink.on_cue(SoundCue::EngineStart);
        self.publish_frame();
        self.schedule_frame();
        true
    }

    /// Pause if running, resume if paused, otherwise nothing
    pub fn toggle_pause(&mut self, now: f64) -> bool {
        match self.run.phase {
            GamePhase::Running => self.pause(),
            GamePhase::Paused => self.resume(now),
            _ => false,
        }
    }

    // === Input ===

    /// Control pressed; ignored outside a run
    pub fn press(&mut self, control: Control) {
        if !self.run.is_running() {
            log::debug!("Ignoring {control:?} press outside a run");
            return;
        }
        match control {
            Control::Left => self.vehicle.press(Steering::Left),
            Control::Right => self.vehicle.press(Steering::Right),
            Control::Boost => {
                if self.run.nitro.press() {
                    self.host.sink.on_cue(SoundCue::Nitro);
                } else {
                    log::debug!("Nitro tank empty");
                }
            }
        }
    }

    /// Control released
    pub fn release(&mut self, control: Control) {
        match control {
            Control::Left => self.vehicle.release(Steering::Left),
            Control::Right => self.vehicle.release(Steering::Right),
            Control::Boost => self.run.nitro.release(),
        }
    }

    // === Frame step ===

    /// Frame callback; no-op unless running
    pub fn tick(&mut self, timestamp: f64) {
        if self.run.phase != GamePhase::Running {
            return;
        }
        // Whatever frame was outstanding is spent or stale now
        self.cancel_frame();

        let delta = (timestamp - self.last_timestamp).clamp(0.0, MAX_FRAME_DELTA_MS);
        self.last_timestamp = timestamp;

        if self.step(delta) {
            self.end_run();
        } else {
            self.publish_frame();
            self.schedule_frame();
        }
    }

    /// Advance the simulation by `delta` ms; returns `true` on a crash
    fn step(&mut self, delta: f64) -> bool {
        let tuning = &self.tuning;
        let run = &mut self.run;

        run.elapsed_ms += delta;
        run.spawn_timer_ms += delta;

        if run.apply_difficulty_ramp(delta, tuning) > 0 {
            log::debug!(
                "Difficulty up: speed {:.1}, spawn every {}ms",
                run.base_speed,
                run.spawn_interval_ms
            );
        }

        if run.nitro.regulate(delta, tuning) {
            log::debug!("Nitro depleted");
        }

        if run.mode.level().is_some() && run.progression.update(&self.levels, run.score) {
            log::info!("Reached level {}", run.progression.current_level);
        }

        if run.spawn_timer_ms >= run.spawn_interval_ms {
            run.spawn_timer_ms = 0.0;
            self.field.spawn(run.base_speed, run.elapsed_ms, tuning);
        }

        self.vehicle.steer(delta);

        self.field.advance(delta, run.nitro.speed_bonus(tuning));
        self.field.retire();

        run.score += run.score_increment(delta, tuning);

        match first_hit(&self.vehicle, self.field.obstacles()) {
            Some(hit) => {
                log::info!(
                    "Crashed into car {} in lane {} after {:.1}s",
                    hit.id,
                    hit.lane,
                    run.elapsed_ms / 1000.0
                );
                true
            }
            None => false,
        }
    }

    /// Collision: record results and stop the loop
    fn end_run(&mut self) {
        self.run.phase = GamePhase::Terminal;
        self.run.nitro.release();
        self.cancel_frame();
        self.host.sink.on_cue(SoundCue::Crash);

        let score = self.run.score;
        let new_high_score = self.profile.record_score(self.host.store.as_mut(), score);
        if new_high_score {
            log::info!("New high score: {score}");
            self.host.sink.on_cue(SoundCue::HighScore);
        }

        let (message, unlocked_level) = match self.run.mode {
            GameMode::Free => (TerminalMessage::FreePlaySummary, None),
            GameMode::Level { level } => {
                let mut unlocked_level = None;
                if let Some(next) =
                    self.levels
                        .unlock_after(self.profile.unlocked_levels, level, score)
                {
                    if self.profile.unlock(self.host.store.as_mut(), next) {
                        log::info!("Unlocked level {next}");
                        unlocked_level = Some(next);
                    }
                }
                let message = if !self.levels.is_complete(level, score) {
                    TerminalMessage::GameOver { level }
                } else if level >= self.levels.len() {
                    TerminalMessage::AllLevelsComplete
                } else {
                    TerminalMessage::LevelComplete { level }
                };
                (message, unlocked_level)
            }
        };

        let summary = RunSummary {
            mode: self.run.mode,
            score,
            high_score: self.profile.high_score,
            new_high_score,
            unlocked_level,
            message,
        };
        log::info!("{}", summary.headline());

        self.publish_frame();
        self.host.sink.on_run_ended(&summary);
    }

    // === Host plumbing ===

    fn publish_frame(&mut self) {
        let snapshot = build_snapshot(
            &self.run,
            &self.vehicle,
            self.field.obstacles(),
            &self.profile,
            &self.levels,
        );
        self.host.sink.on_frame_rendered(&snapshot);
    }

    fn schedule_frame(&mut self) {
        self.cancel_frame();
        self.pending_frame = self.host.scheduler.request_frame();
        if self.pending_frame.is_none() {
            log::warn!("Frame request refused; game loop stalled");
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.host.scheduler.cancel_frame(handle);
        }
    }
}

fn build_snapshot<'a>(
    run: &RunState,
    vehicle: &'a Vehicle,
    obstacles: &'a [Obstacle],
    profile: &Profile,
    levels: &LevelTable,
) -> Snapshot<'a> {
    let (level_label, mission_percent) = match run.mode {
        GameMode::Free => (ENDLESS_LABEL.to_string(), None),
        GameMode::Level { level } => {
            let current = levels.get(run.progression.current_level);
            (
                format!("Level {}: {}", current.ordinal, current.name),
                Some(levels.progress_percent(level, run.score)),
            )
        }
    };

    Snapshot {
        phase: run.phase,
        mode: run.mode,
        vehicle,
        obstacles,
        hud: Hud {
            score: run.score,
            high_score: profile.high_score,
            level_label,
            nitro_percent: run.nitro.percent(),
            boost_active: run.nitro.is_active(),
            mission_percent,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use super::*;
    use crate::persistence::{MemoryStore, UNLOCKED_LEVELS_KEY};
    use crate::platform::ManualScheduler;
    use crate::sim::level_target;

    #[derive(Default)]
    struct Recorded {
        frames: Vec<Hud>,
        summaries: Vec<RunSummary>,
        cues: Vec<SoundCue>,
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Rc<RefCell<Recorded>>);

    impl PresentationSink for RecordingSink {
        fn on_frame_rendered(&mut self, snapshot: &Snapshot<'_>) {
            self.0.borrow_mut().frames.push(snapshot.hud.clone());
        }

        fn on_run_ended(&mut self, summary: &RunSummary) {
            self.0.borrow_mut().summaries.push(summary.clone());
        }

        fn on_cue(&mut self, cue: SoundCue) {
            self.0.borrow_mut().cues.push(cue);
        }
    }

    fn harness(store: MemoryStore) -> (Game, RecordingSink, ManualScheduler) {
        let sink = RecordingSink::default();
        let scheduler = ManualScheduler::new();
        let host = Host::new(store, sink.clone(), scheduler.clone());
        (Game::new(Tuning::default(), 12345, host), sink, scheduler)
    }

    /// Park a stationary car on top of the player
    fn block_player(game: &mut Game) {
        let pos = game.vehicle.pos;
        game.field.insert(Obstacle {
            id: 0,
            pos,
            size: Vec2::new(OBSTACLE_WIDTH, OBSTACLE_HEIGHT),
            speed: 0.0,
            variant: 0,
            lane: crate::lane_at(pos.x, VEHICLE_WIDTH),
        });
    }

    #[test]
    fn test_free_run_scores_without_traffic() {
        let (mut game, _sink, scheduler) = harness(MemoryStore::new());
        assert!(game.start(GameMode::Free, 0.0));

        for i in 1..=10 {
            assert!(scheduler.take_pending().is_some());
            game.tick(i as f64 * 16.0);
        }

        assert_eq!(game.obstacles().len(), 0);
        // Each tick adds round((1 + 3/4) * 16/16) = 2
        assert_eq!(game.run().score, 20);
        assert_eq!(game.phase(), GamePhase::Running);
        assert!(scheduler.pending().is_some());
    }

    #[test]
    fn test_level_five_seeds_difficulty() {
        let mut store = MemoryStore::new();
        store.set(UNLOCKED_LEVELS_KEY, "5").unwrap();
        let (mut game, sink, _scheduler) = harness(store);

        assert!(game.start(GameMode::Level { level: 5 }, 0.0));
        assert!((game.run().base_speed - 4.2).abs() < 0.0001);
        assert_eq!(game.run().spawn_interval_ms, 1420.0);
        assert_eq!(game.run().progression.current_level, 5);

        let recorded = sink.0.borrow();
        let hud = recorded.frames.last().unwrap();
        assert_eq!(hud.level_label, "Level 5: Desert Highway I");
        assert_eq!(hud.mission_percent, Some(0));
    }

    #[test]
    fn test_locked_level_is_rejected() {
        let (mut game, _sink, scheduler) = harness(MemoryStore::new());
        assert!(!game.start(GameMode::Level { level: 2 }, 0.0));
        assert!(!game.start(GameMode::Level { level: 0 }, 0.0));
        assert_eq!(game.phase(), GamePhase::Idle);
        assert_eq!(scheduler.requested_count(), 0);
    }

    #[test]
    fn test_start_ignored_mid_run() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        assert!(game.start(GameMode::Free, 0.0));
        game.tick(16.0);
        assert!(!game.start(GameMode::Free, 20.0));
        assert_eq!(game.run().score, 2);
    }

    #[test]
    fn test_unlock_survives_restart() {
        let store = MemoryStore::new();
        let (mut game, sink, scheduler) = harness(store.clone());
        assert_eq!(game.profile().unlocked_levels, 1);

        assert!(game.start(GameMode::Level { level: 1 }, 0.0));
        game.run.score = level_target(1);
        block_player(&mut game);
        game.tick(16.0);

        assert_eq!(game.phase(), GamePhase::Terminal);
        assert_eq!(game.profile().unlocked_levels, 2);
        assert_eq!(store.peek(UNLOCKED_LEVELS_KEY).as_deref(), Some("2"));
        assert!(scheduler.pending().is_none());
        {
            let recorded = sink.0.borrow();
            let summary = recorded.summaries.last().unwrap();
            assert_eq!(summary.message, TerminalMessage::LevelComplete { level: 1 });
            assert_eq!(summary.unlocked_level, Some(2));
        }

        // Simulated restart: a new game over the same storage
        let (mut restarted, _sink, _scheduler) = harness(store);
        assert_eq!(restarted.profile().unlocked_levels, 2);
        assert!(restarted.start(GameMode::Level { level: 2 }, 0.0));
    }

    #[test]
    fn test_missed_target_does_not_unlock() {
        let store = MemoryStore::new();
        let (mut game, sink, _scheduler) = harness(store.clone());

        assert!(game.start(GameMode::Level { level: 1 }, 0.0));
        block_player(&mut game);
        game.tick(16.0);

        assert_eq!(game.profile().unlocked_levels, 1);
        assert_eq!(store.peek(UNLOCKED_LEVELS_KEY), None);
        let recorded = sink.0.borrow();
        assert_eq!(
            recorded.summaries[0].message,
            TerminalMessage::GameOver { level: 1 }
        );
    }

    #[test]
    fn test_final_level_reports_full_completion() {
        let mut store = MemoryStore::new();
        store.set(UNLOCKED_LEVELS_KEY, &LEVEL_COUNT.to_string()).unwrap();
        let (mut game, sink, _scheduler) = harness(store);

        assert!(game.start(GameMode::Level { level: LEVEL_COUNT }, 0.0));
        game.run.score = level_target(LEVEL_COUNT);
        block_player(&mut game);
        game.tick(16.0);

        let recorded = sink.0.borrow();
        let summary = &recorded.summaries[0];
        assert_eq!(summary.message, TerminalMessage::AllLevelsComplete);
        assert_eq!(summary.unlocked_level, None);
    }

    #[test]
    fn test_crash_records_high_score_and_stops_loop() {
        let store = MemoryStore::new();
        let (mut game, sink, scheduler) = harness(store.clone());

        assert!(game.start(GameMode::Free, 0.0));
        game.tick(16.0);
        block_player(&mut game);
        game.tick(32.0);

        assert_eq!(game.phase(), GamePhase::Terminal);
        assert!(!game.is_frame_pending());
        assert!(scheduler.pending().is_none());
        assert_eq!(game.profile().high_score, 4);
        assert_eq!(store.peek("highScore").as_deref(), Some("4"));

        let recorded = sink.0.borrow();
        assert!(recorded.cues.contains(&SoundCue::Crash));
        assert!(recorded.cues.contains(&SoundCue::HighScore));
        let summary = &recorded.summaries[0];
        assert_eq!(summary.message, TerminalMessage::FreePlaySummary);
        assert!(summary.new_high_score);
        drop(recorded);

        // Late callbacks do nothing
        game.tick(48.0);
        assert_eq!(game.run().score, 4);
        assert!(scheduler.pending().is_none());
    }

    #[test]
    fn test_restart_after_crash_resets_run() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        assert!(game.start(GameMode::Free, 0.0));
        game.press(Control::Left);
        game.tick(16.0);
        block_player(&mut game);
        game.tick(32.0);
        assert_eq!(game.phase(), GamePhase::Terminal);

        assert!(game.start(GameMode::Free, 1000.0));
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.run().score, 0);
        assert_eq!(game.run().elapsed_ms, 0.0);
        assert!(game.obstacles().is_empty());
        assert_eq!(game.vehicle().pos, Vehicle::default().pos);
        assert_eq!(game.vehicle().steering, Steering::Straight);
    }

    #[test]
    fn test_pause_cancels_frame_and_resume_reanchors() {
        let (mut game, sink, scheduler) = harness(MemoryStore::new());
        assert!(game.start(GameMode::Free, 0.0));
        game.tick(16.0);
        let pending = scheduler.pending().unwrap();

        assert!(game.pause());
        assert_eq!(game.phase(), GamePhase::Paused);
        assert!(scheduler.pending().is_none());
        assert!(scheduler.cancelled().contains(&pending));

        // Stale callback while paused
        game.tick(5000.0);
        assert_eq!(game.run().score, 2);
        assert_eq!(game.run().elapsed_ms, 16.0);
        assert!(scheduler.pending().is_none());

        assert!(game.resume(10_000.0));
        assert!(scheduler.pending().is_some());
        game.tick(10_016.0);
        assert_eq!(game.run().elapsed_ms, 32.0);
        assert_eq!(game.run().score, 4);

        let cues = sink.0.borrow().cues.clone();
        assert_eq!(
            cues,
            vec![SoundCue::EngineStart, SoundCue::EngineStop, SoundCue::EngineStart]
        );
    }

    #[test]
    fn test_pause_outside_run_is_noop() {
        let (mut game, _sink, scheduler) = harness(MemoryStore::new());
        assert!(!game.pause());
        assert!(!game.resume(0.0));
        assert!(!game.toggle_pause(0.0));
        assert_eq!(game.phase(), GamePhase::Idle);
        assert_eq!(scheduler.requested_count(), 0);
    }

    #[test]
    fn test_toggle_pause_round_trip() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Free, 0.0);
        assert!(game.toggle_pause(10.0));
        assert_eq!(game.phase(), GamePhase::Paused);
        assert!(game.toggle_pause(20.0));
        assert_eq!(game.phase(), GamePhase::Running);
    }

    #[test]
    fn test_long_gap_is_clamped() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Free, 0.0);
        game.tick(1000.0);
        assert_eq!(game.run().elapsed_ms, MAX_FRAME_DELTA_MS);
        // round(1.75 * 40/16)
        assert_eq!(game.run().score, 4);
    }

    #[test]
    fn test_backwards_timestamp_simulates_nothing() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Free, 100.0);
        game.tick(50.0);
        assert_eq!(game.run().elapsed_ms, 0.0);
        assert_eq!(game.run().score, 0);
    }

    #[test]
    fn test_tick_while_idle_is_noop() {
        let (mut game, sink, scheduler) = harness(MemoryStore::new());
        game.tick(16.0);
        assert_eq!(game.phase(), GamePhase::Idle);
        assert_eq!(scheduler.requested_count(), 0);
        assert!(sink.0.borrow().frames.is_empty());
    }

    #[test]
    fn test_first_spawn_waits_for_interval() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Free, 0.0);

        let mut now = 0.0;
        for _ in 0..37 {
            now += 40.0;
            game.tick(now);
        }
        assert_eq!(game.obstacles().len(), 0);

        now += 40.0;
        game.tick(now);
        assert_eq!(game.obstacles().len(), 1);
        assert_eq!(game.run().spawn_timer_ms, 0.0);
        assert!(game.obstacles()[0].pos.y < 0.0);
    }

    #[test]
    fn test_boost_on_empty_tank_stays_off() {
        let (mut game, sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Free, 0.0);
        game.run.nitro.set_level(0.0);

        game.press(Control::Boost);
        assert!(!game.run().nitro.is_active());
        game.tick(16.0);
        assert!(!game.run().nitro.is_active());
        assert!(!sink.0.borrow().cues.contains(&SoundCue::Nitro));
        // No boost bonus in the score
        assert_eq!(game.run().score, 2);
    }

    #[test]
    fn test_boost_adds_score_and_drains() {
        let (mut game, sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Free, 0.0);

        game.press(Control::Boost);
        game.tick(16.0);
        assert!(game.run().nitro.is_active());
        // round((1 + 0.75 + 2) * 1)
        assert_eq!(game.run().score, 4);
        assert!(game.run().nitro.level() < game.tuning().nitro_max);
        assert!(sink.0.borrow().cues.contains(&SoundCue::Nitro));

        game.release(Control::Boost);
        assert!(!game.run().nitro.is_active());
    }

    #[test]
    fn test_steering_clamps_at_track_edge() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Free, 0.0);
        game.press(Control::Left);

        let mut now = 0.0;
        for _ in 0..30 {
            now += 40.0;
            game.tick(now);
        }
        assert_eq!(game.vehicle().pos.x, 0.0);

        game.press(Control::Right);
        game.release(Control::Left);
        for _ in 0..30 {
            now += 40.0;
            game.tick(now);
        }
        assert_eq!(game.vehicle().pos.x, TRACK_WIDTH - VEHICLE_WIDTH);
        assert_eq!(game.vehicle().steering, Steering::Right);
    }

    #[test]
    fn test_input_ignored_while_idle() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        game.press(Control::Left);
        game.press(Control::Boost);
        assert_eq!(game.vehicle().steering, Steering::Straight);
        assert!(!game.run().nitro.is_requested());
    }

    #[test]
    fn test_level_label_follows_progression() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Level { level: 1 }, 0.0);
        game.run.score = level_target(1);
        game.tick(16.0);

        assert_eq!(game.run().progression.current_level, 1);
        assert_eq!(game.snapshot().hud.level_label, "Level 1: Suburb Sprint I");
        assert_eq!(game.snapshot().hud.mission_percent, Some(100));

        game.run.score = level_target(2);
        game.tick(32.0);
        assert_eq!(game.run().progression.current_level, 2);
        assert_eq!(game.snapshot().hud.level_label, "Level 2: Harbor Run I");
    }

    #[test]
    fn test_crash_while_frame_outstanding_leaves_nothing_scheduled() {
        let (mut game, _sink, scheduler) = harness(MemoryStore::new());
        assert!(game.start(GameMode::Free, 0.0));
        let first = scheduler.pending().unwrap();

        // Frame fires without the platform consuming the handle
        block_player(&mut game);
        game.tick(16.0);

        assert_eq!(game.phase(), GamePhase::Terminal);
        assert!(!game.is_frame_pending());
        assert!(scheduler.pending().is_none());
        assert!(scheduler.cancelled().contains(&first));
    }

    #[test]
    fn test_pause_then_crash_on_restart_leaves_no_orphan() {
        let (mut game, _sink, scheduler) = harness(MemoryStore::new());
        assert!(game.start(GameMode::Free, 0.0));
        game.tick(16.0);
        assert!(game.pause());
        assert!(scheduler.pending().is_none());
        assert!(game.resume(100.0));
        let resumed = scheduler.pending().unwrap();

        block_player(&mut game);
        game.tick(116.0);
        assert_eq!(game.phase(), GamePhase::Terminal);
        assert!(scheduler.pending().is_none());
        assert!(scheduler.cancelled().contains(&resumed));

        // Restart from Terminal schedules exactly one fresh frame
        let before = scheduler.requested_count();
        assert!(game.start(GameMode::Free, 200.0));
        assert_eq!(scheduler.requested_count(), before + 1);
        let fresh = scheduler.pending().unwrap();
        assert_ne!(fresh, resumed);
        assert!(game.is_frame_pending());

        // Crash again before the fresh frame is consumed
        block_player(&mut game);
        game.tick(216.0);
        assert!(scheduler.pending().is_none());
        assert!(!game.is_frame_pending());
        assert!(scheduler.cancelled().contains(&fresh));
    }

    #[test]
    fn test_free_mode_snapshot_is_endless() {
        let (mut game, _sink, _scheduler) = harness(MemoryStore::new());
        game.start(GameMode::Free, 0.0);
        let snapshot = game.snapshot();
        assert_eq!(snapshot.hud.level_label, ENDLESS_LABEL);
        assert_eq!(snapshot.hud.mission_percent, None);
        assert_eq!(snapshot.hud.nitro_percent, 100);
    }
}
