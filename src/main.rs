//! Lane Rush entry point
//!
//! Browser: wires the DOM, input and requestAnimationFrame to the game.
//! Native: runs a headless session driven by the autopilot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, HtmlSelectElement,
        KeyboardEvent,
    };

    use lane_rush::audio::AudioManager;
    use lane_rush::autopilot::Autopilot;
    use lane_rush::consts::*;
    use lane_rush::platform::Clock;
    use lane_rush::platform::web::{LocalStorageStore, PerformanceClock, RafScheduler};
    use lane_rush::sim::{Control, Game, GameMode, GamePhase, Host, LevelTable};
    use lane_rush::ui::{PresentationSink, RunSummary, Snapshot, SoundCue};
    use lane_rush::{Settings, Tuning};

    const ROAD_COLOR: &str = "#2b2b2b";
    const LANE_LINE_COLOR: &str = "#d8d8d8";
    const PLAYER_COLOR: &str = "#2ecc71";
    const PLAYER_BOOST_COLOR: &str = "#00e5ff";
    const TRAFFIC_COLORS: [&str; OBSTACLE_VARIANTS as usize] =
        ["#e74c3c", "#3498db", "#f1c40f", "#9b59b6"];

    /// Canvas drawing, HUD text, overlays and audio
    struct DomSink {
        document: Document,
        ctx: Option<CanvasRenderingContext2d>,
        /// Shared with [`App`] so settings changes reach live voices
        audio: Rc<RefCell<AudioManager>>,
        levels: LevelTable,
    }

    impl DomSink {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_visible(&self, id: &str, visible: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let classes = el.class_list();
                let _ = if visible {
                    classes.remove_1("hidden")
                } else {
                    classes.add_1("hidden")
                };
            }
        }

        /// Solid-color shapes; sprites are out of scope
        fn draw(&self, snapshot: &Snapshot<'_>) {
            let Some(ctx) = &self.ctx else { return };

            ctx.set_fill_style_str(ROAD_COLOR);
            ctx.fill_rect(0.0, 0.0, TRACK_WIDTH as f64, TRACK_HEIGHT as f64);

            ctx.set_fill_style_str(LANE_LINE_COLOR);
            for lane in 1..LANE_COUNT {
                let x = (lane as f32 * LANE_WIDTH) as f64;
                ctx.fill_rect(x - 2.0, 0.0, 4.0, TRACK_HEIGHT as f64);
            }

            for obstacle in snapshot.obstacles {
                let color = TRAFFIC_COLORS[obstacle.variant as usize % TRAFFIC_COLORS.len()];
                ctx.set_fill_style_str(color);
                ctx.fill_rect(
                    obstacle.pos.x as f64,
                    obstacle.pos.y as f64,
                    obstacle.size.x as f64,
                    obstacle.size.y as f64,
                );
            }

            let vehicle = snapshot.vehicle;
            ctx.set_fill_style_str(if snapshot.hud.boost_active {
                PLAYER_BOOST_COLOR
            } else {
                PLAYER_COLOR
            });
            ctx.fill_rect(
                vehicle.pos.x as f64,
                vehicle.pos.y as f64,
                vehicle.size.x as f64,
                vehicle.size.y as f64,
            );
        }
    }

    impl PresentationSink for DomSink {
        fn on_frame_rendered(&mut self, snapshot: &Snapshot<'_>) {
            self.draw(snapshot);

            let hud = &snapshot.hud;
            self.set_text("score", &hud.score.to_string());
            self.set_text("high-score", &hud.high_score.to_string());
            self.set_text("level", &hud.level_label);
            self.set_text("nitro", &format!("{}%", hud.nitro_percent));
            if let Some(el) = self
                .document
                .get_element_by_id("nitro-bar")
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                let _ = el
                    .style()
                    .set_property("width", &format!("{}%", hud.nitro_percent));
            }
            self.set_visible("mission", hud.mission_percent.is_some());
            if let Some(percent) = hud.mission_percent {
                self.set_text("mission", &format!("Mission {percent}%"));
            }

            self.set_visible("menu", snapshot.phase == GamePhase::Idle);
            self.set_visible("pause-overlay", snapshot.phase == GamePhase::Paused);
            self.set_visible("game-over", snapshot.phase == GamePhase::Terminal);
        }

        fn on_run_ended(&mut self, summary: &RunSummary) {
            self.set_text("game-over-message", &summary.headline());
            self.set_visible("new-high-score", summary.new_high_score);
            if let Some(unlocked) = summary.unlocked_level {
                populate_level_select(&self.document, &self.levels, unlocked);
            }
        }

        fn on_cue(&mut self, cue: SoundCue) {
            self.audio.borrow_mut().play(cue);
        }
    }

    /// Shared browser-side state
    struct App {
        document: Document,
        game: RefCell<Game>,
        clock: PerformanceClock,
        settings: RefCell<Settings>,
        audio: Rc<RefCell<AudioManager>>,
        /// Autopilot drives instead of the player
        demo: Cell<bool>,
        autopilot: Autopilot,
    }

    impl App {
        fn now(&self) -> f64 {
            self.clock.now_ms()
        }

        fn frame(&self, time: f64) {
            let mut game = self.game.borrow_mut();
            if self.demo.get() {
                self.autopilot.drive(&mut game);
            }
            game.tick(time);
        }

        fn start(&self) {
            let mode = selected_mode(&self.document);
            let now = self.now();
            if !self.game.borrow_mut().start(mode, now) {
                log::warn!("Could not start {mode:?}");
            }
        }

        fn toggle_pause(&self) {
            let now = self.now();
            self.game.borrow_mut().toggle_pause(now);
        }

        fn auto_pause(&self, reason: &str) {
            if !self.settings.borrow().pause_on_blur {
                return;
            }
            if self.game.borrow_mut().pause() {
                log::info!("Auto-paused ({reason})");
            }
        }

        fn toggle_mute(&self) {
            let mut settings = self.settings.borrow_mut();
            let muted = settings.toggle_muted(&mut LocalStorageStore::open());
            self.audio.borrow_mut().apply_settings(&settings);
            log::info!("Muted: {muted}");
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Lane Rush starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document; cannot start");
            return;
        };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        let ctx = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .and_then(|canvas| {
                canvas.set_width(TRACK_WIDTH as u32);
                canvas.set_height(TRACK_HEIGHT as u32);
                canvas.get_context("2d").ok().flatten()
            })
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
        if ctx.is_none() {
            log::warn!("No 2D canvas, drawing disabled");
        }

        let settings = Settings::load_from(&LocalStorageStore::open());
        let audio = Rc::new(RefCell::new(AudioManager::new(&settings)));
        let sink = DomSink {
            document: document.clone(),
            ctx,
            audio: Rc::clone(&audio),
            levels: LevelTable::new(),
        };

        let scheduler = RafScheduler::new();
        let seed = js_sys::Date::now() as u64;
        let host = Host::new(LocalStorageStore::open(), sink, scheduler.clone());
        let game = Game::new(Tuning::default(), seed, host);
        populate_level_select(&document, game.levels(), game.profile().unlocked_levels);
        log::info!("Game initialized with seed: {seed}");

        let app = Rc::new(App {
            document,
            game: RefCell::new(game),
            clock: PerformanceClock::new(),
            settings: RefCell::new(settings),
            audio,
            demo: Cell::new(false),
            autopilot: Autopilot::new(),
        });

        {
            let app = Rc::downgrade(&app);
            scheduler.set_handler(move |time| {
                if let Some(app) = app.upgrade() {
                    app.frame(time);
                }
            });
        }

        setup_keyboard(&app);
        setup_touch_controls(&app);
        setup_buttons(&app);
        setup_auto_pause(&app);

        log::info!("Lane Rush ready!");
    }

    /// Mode picked in the level selector; anything but a level number is free play
    fn selected_mode(document: &Document) -> GameMode {
        document
            .get_element_by_id("level-select")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
            .and_then(|select| select.value().parse::<u32>().ok())
            .map(|level| GameMode::Level { level })
            .unwrap_or(GameMode::Free)
    }

    /// Free play plus every unlocked mission
    fn populate_level_select(document: &Document, levels: &LevelTable, unlocked: u32) {
        let Some(select) = document.get_element_by_id("level-select") else {
            return;
        };
        select.set_inner_html("");

        let free = std::iter::once(("free".to_string(), "Free Play".to_string()));
        let missions = levels
            .iter()
            .take(unlocked as usize)
            .map(|l| (l.ordinal.to_string(), format!("Level {}: {}", l.ordinal, l.name)));

        for (value, label) in free.chain(missions) {
            let Ok(option) = document.create_element("option") else {
                continue;
            };
            let _ = option.set_attribute("value", &value);
            option.set_text_content(Some(&label));
            let _ = select.append_child(&option);
        }
    }

    fn key_control(key: &str) -> Option<Control> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(Control::Left),
            "ArrowRight" | "d" | "D" => Some(Control::Right),
            "ArrowUp" | "w" | "W" | "Shift" => Some(Control::Boost),
            _ => None,
        }
    }

    fn setup_keyboard(app: &Rc<App>) {
        let Some(window) = web_sys::window() else { return };

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                // Held keys must not re-press boost after a refill
                if event.repeat() {
                    return;
                }
                let key = event.key();
                if let Some(control) = key_control(&key) {
                    event.prevent_default();
                    app.game.borrow_mut().press(control);
                    return;
                }
                match key.as_str() {
                    "p" | "P" | "Escape" => app.toggle_pause(),
                    " " | "Enter" => {
                        let phase = app.game.borrow().phase();
                        if matches!(phase, GamePhase::Idle | GamePhase::Terminal) {
                            app.start();
                        }
                    }
                    "i" | "I" => {
                        app.demo.set(!app.demo.get());
                        log::info!("Demo mode: {}", app.demo.get());
                    }
                    "m" | "M" => app.toggle_mute(),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(control) = key_control(&event.key()) {
                    app.game.borrow_mut().release(control);
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// On-screen hold buttons for touch devices
    fn setup_touch_controls(app: &Rc<App>) {
        const EVENTS: [(&str, bool); 6] = [
            ("touchstart", true),
            ("mousedown", true),
            ("touchend", false),
            ("touchcancel", false),
            ("mouseup", false),
            ("mouseleave", false),
        ];

        for (id, control) in [
            ("btn-left", Control::Left),
            ("btn-right", Control::Right),
            ("btn-boost", Control::Boost),
        ] {
            let Some(button) = app.document.get_element_by_id(id) else {
                continue;
            };
            for (event_name, pressed) in EVENTS {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                    event.prevent_default();
                    let mut game = app.game.borrow_mut();
                    if pressed {
                        game.press(control);
                    } else {
                        game.release(control);
                    }
                });
                let _ = button
                    .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_buttons(app: &Rc<App>) {
        let actions: [(&str, fn(&App)); 4] = [
            ("start-btn", App::start),
            ("restart-btn", App::start),
            ("pause-btn", App::toggle_pause),
            ("resume-btn", App::toggle_pause),
        ];

        for (id, action) in actions {
            let Some(button) = app.document.get_element_by_id(id) else {
                continue;
            };
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                action(&app);
            });
            let _ =
                button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(app: &Rc<App>) {
        let Some(window) = web_sys::window() else { return };

        // Tab switch, minimize
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if app.document.visibility_state() == web_sys::VisibilityState::Hidden {
                    app.auto_pause("tab hidden");
                }
            });
            let _ = app.document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Click outside the page
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                app.auto_pause("window blur");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use anyhow::{Context, Result, bail};
    use clap::{Parser, ValueEnum};

    use lane_rush::Tuning;
    use lane_rush::autopilot::Autopilot;
    use lane_rush::persistence::JsonFileStore;
    use lane_rush::platform::{Clock, ManualScheduler, SteppedClock};
    use lane_rush::sim::{Game, GameMode, Host};
    use lane_rush::ui::{PresentationSink, RunSummary, Snapshot, SoundCue};

    /// Frames between progress lines
    const REPORT_EVERY: u64 = 600;

    #[derive(Parser, Debug)]
    #[command(name = "lane-rush")]
    #[command(about = "Headless Lane Rush session driven by the autopilot")]
    pub struct Cli {
        #[arg(long, value_enum, default_value_t = CliMode::Free)]
        mode: CliMode,
        /// Mission to play with `--mode level`
        #[arg(long, default_value_t = 1)]
        level: u32,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Stop after this many frames even if the car is still alive
        #[arg(long, default_value_t = 36_000)]
        max_frames: u64,
        /// Simulated frame length in milliseconds
        #[arg(long, default_value_t = 16.0)]
        frame_ms: f64,
        /// Profile file holding the high score and unlocked missions
        #[arg(long, default_value = "lane-rush-profile.json")]
        profile: PathBuf,
        /// Balance overrides as JSON
        #[arg(long)]
        tuning: Option<PathBuf>,
    }

    #[derive(Clone, Copy, Debug, ValueEnum)]
    enum CliMode {
        Free,
        Level,
    }

    /// Logs progress and keeps the final summary
    struct LogSink {
        frames: u64,
        summary: Rc<RefCell<Option<RunSummary>>>,
    }

    impl PresentationSink for LogSink {
        fn on_frame_rendered(&mut self, snapshot: &Snapshot<'_>) {
            self.frames += 1;
            if self.frames % REPORT_EVERY == 0 {
                let hud = &snapshot.hud;
                log::info!(
                    "frame {}: score {}, {}, nitro {}%, {} cars",
                    self.frames,
                    hud.score,
                    hud.level_label,
                    hud.nitro_percent,
                    snapshot.obstacles.len()
                );
            }
        }

        fn on_run_ended(&mut self, summary: &RunSummary) {
            *self.summary.borrow_mut() = Some(summary.clone());
        }

        fn on_cue(&mut self, cue: SoundCue) {
            log::trace!("cue {cue:?}");
        }
    }

    fn load_tuning(cli: &Cli) -> Result<Tuning> {
        let Some(path) = &cli.tuning else {
            return Ok(Tuning::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        Tuning::from_json(&json).with_context(|| format!("invalid tuning {}", path.display()))
    }

    pub fn run(cli: Cli) -> Result<()> {
        let tuning = load_tuning(&cli)?;
        let store = JsonFileStore::open(&cli.profile)
            .with_context(|| format!("failed opening profile {}", cli.profile.display()))?;

        let summary = Rc::new(RefCell::new(None));
        let sink = LogSink {
            frames: 0,
            summary: summary.clone(),
        };
        let scheduler = ManualScheduler::new();
        let clock = SteppedClock::new(0.0);
        let mut game = Game::new(tuning, cli.seed, Host::new(store, sink, scheduler.clone()));

        let mode = match cli.mode {
            CliMode::Free => GameMode::Free,
            CliMode::Level => GameMode::Level { level: cli.level },
        };
        if !game.start(mode, clock.now_ms()) {
            bail!(
                "cannot start level {} (unlocked up to {})",
                cli.level,
                game.profile().unlocked_levels
            );
        }

        let pilot = Autopilot::new();
        let mut frames = 0;
        while frames < cli.max_frames && scheduler.take_pending().is_some() {
            pilot.drive(&mut game);
            game.tick(clock.advance(cli.frame_ms));
            frames += 1;
        }

        match summary.borrow().as_ref() {
            Some(summary) => println!("{}", summary.headline()),
            None => println!(
                "Still driving after {frames} frames. Score: {}",
                game.run().score
            ),
        }
        println!(
            "High score: {} | Missions unlocked: {}",
            game.profile().high_score,
            game.profile().unlocked_levels
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Lane Rush (headless) starting...");
    headless::run(headless::Cli::parse())
}
