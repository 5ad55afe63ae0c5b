//! The engine singleton and its main loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::context::{CommandQueue, EngineContext, FrameInfo};
use crate::error::{EngineError, RegistryError};
use crate::game::Game;
use crate::module::{Module, Stage};
use crate::rate::RateCounter;
use crate::registry::ModuleRegistry;
use crate::time::{Delta, EngineClock, IntervalTimer};

/// Set while an [`Engine`] is alive; enforces one instance per process.
static ENGINE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Owner of the module registry, the active game, and the main loop.
///
/// Exactly one engine may be alive per process; a second construction
/// fails with [`EngineError::AlreadyActive`]. The loop is single-threaded:
/// update stages, the game hook, and the render stage run strictly
/// sequentially within one iteration, and the only deliberate suspension
/// point is the frame-governor sleep. Shutdown is cooperative — a close
/// request is observed at the iteration boundary, so in-flight work for
/// the current iteration always completes.
///
/// Each iteration:
/// 1. runs the `Always` stage,
/// 2. when the update tick is due (always, unless an update rate is
///    configured), samples the update delta, ticks the UPS counter, runs
///    `PreUpdate`/`Update`/`PostUpdate`, then the game's update hook,
/// 3. sleeps out the remainder of the frame budget when a frame-rate cap
///    is set,
/// 4. samples the render delta, ticks the FPS counter, runs `Render`,
/// 5. applies deferred commands (game swap, close request).
pub struct Engine {
    registry: ModuleRegistry,
    game: Option<Box<dyn Game>>,
    commands: CommandQueue,

    argv0: String,
    time_offset: f64,
    fps_limit: f64,
    update_rate: f64,
    running: bool,
    close_error: bool,

    clock: EngineClock,
    delta_update: Delta,
    delta_render: Delta,
    update_timer: Option<IntervalTimer>,
    ups: RateCounter,
    fps: RateCounter,
    frame_start: f64,
}

impl Engine {
    /// Constructs the process-wide engine instance.
    ///
    /// The registry starts empty; register modules and install a game
    /// before calling [`run`](Self::run). `argv0` is the program identity
    /// (conventionally the first command-line argument) and is queryable
    /// afterwards.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyActive`] when another instance is alive.
    pub fn new(argv0: impl Into<String>) -> Result<Self, EngineError> {
        if ENGINE_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::AlreadyActive);
        }
        Ok(Self {
            registry: ModuleRegistry::new(),
            game: None,
            commands: CommandQueue::default(),
            argv0: argv0.into(),
            time_offset: 0.0,
            fps_limit: 0.0,
            update_rate: 0.0,
            running: true,
            close_error: false,
            clock: EngineClock::new(),
            delta_update: Delta::new(),
            delta_render: Delta::new(),
            update_timer: None,
            ups: RateCounter::new(),
            fps: RateCounter::new(),
            frame_start: 0.0,
        })
    }

    // --- Module management ---

    /// Registers a module; see [`ModuleRegistry::add`].
    pub fn add_module<M: Module>(&mut self, stage: Stage, module: M) -> Result<(), RegistryError> {
        self.registry.add(stage, module)
    }

    /// Unregisters and drops a module; see [`ModuleRegistry::remove`].
    pub fn remove_module<M: Module>(&mut self) -> bool {
        self.registry.remove::<M>()
    }

    pub fn has_module<M: Module>(&self) -> bool {
        self.registry.has::<M>()
    }

    pub fn get_module<M: Module>(&self) -> Option<&M> {
        self.registry.get::<M>()
    }

    pub fn get_module_mut<M: Module>(&mut self) -> Option<&mut M> {
        self.registry.get_mut::<M>()
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn modules_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    // --- Game management ---

    /// Installs the active game, dropping any previous instance.
    pub fn set_game(&mut self, game: Box<dyn Game>) {
        self.game = Some(game);
    }

    /// Detaches and returns the active game.
    pub fn take_game(&mut self) -> Option<Box<dyn Game>> {
        self.game.take()
    }

    pub fn has_game(&self) -> bool {
        self.game.is_some()
    }

    // --- Time surface ---

    /// Offset-adjusted engine time in seconds.
    pub fn time(&self) -> f64 {
        self.clock.now() + self.time_offset
    }

    /// Raw monotonic time in seconds, ignoring the offset.
    pub fn raw_time(&self) -> f64 {
        self.clock.now()
    }

    /// The current local date and time, formatted `dd-mm-YYYY HH:MM:SS`.
    pub fn date_time() -> String {
        chrono::Local::now().format("%d-%m-%Y %H:%M:%S").to_string()
    }

    /// The caller-controlled offset added to raw time (pause/fast-forward).
    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub fn set_time_offset(&mut self, offset: f64) {
        self.time_offset = offset;
    }

    /// Seconds between the two most recent update ticks.
    pub fn delta(&self) -> f64 {
        self.delta_update.latest()
    }

    /// Seconds between the two most recent render phases.
    pub fn delta_render(&self) -> f64 {
        self.delta_render.latest()
    }

    /// Published update ticks per second. Provisional during the first
    /// second of a run.
    pub fn ups(&self) -> u32 {
        self.ups.value()
    }

    /// Published render phases per second. Provisional during the first
    /// second of a run.
    pub fn fps(&self) -> u32 {
        self.fps.value()
    }

    /// The frame-rate cap; values `<= 0` mean unlimited.
    pub fn fps_limit(&self) -> f64 {
        self.fps_limit
    }

    /// Sets the frame-rate cap. Pass `0` (or any non-positive value) to
    /// disable throttling. The governor is soft: under load it only
    /// approximates the target.
    pub fn set_fps_limit(&mut self, fps_limit: f64) {
        self.fps_limit = fps_limit;
    }

    /// The configured update rate in ticks per second; `<= 0` means the
    /// update phase runs every iteration.
    pub fn update_rate(&self) -> f64 {
        self.update_rate
    }

    /// Decouples update cadence from render cadence. With a positive
    /// `rate`, update stages and the game hook tick at most `rate` times
    /// per second while `Always` and `Render` keep running every
    /// iteration. Non-positive restores update-every-iteration (the
    /// default).
    pub fn set_update_rate(&mut self, rate: f64) {
        self.update_rate = rate;
        self.update_timer = (rate > 0.0).then(|| IntervalTimer::new(1.0 / rate, self.time()));
    }

    // --- Lifecycle ---

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The program identity string passed at construction.
    pub fn argv0(&self) -> &str {
        &self.argv0
    }

    /// Requests shutdown, observed at the next iteration boundary.
    /// Idempotent: once stopped, later calls change nothing.
    pub fn request_close(&mut self, error: bool) {
        if self.running {
            self.running = false;
            self.close_error = error;
            debug!(error, "close requested");
        }
    }

    /// Runs the main loop to completion.
    ///
    /// Blocks until a close is requested, then tears down the game and the
    /// registry (reverse registration order) and returns the exit status:
    /// `0` for a clean shutdown, `1` when the close was error-flagged.
    pub fn run(&mut self) -> i32 {
        info!(
            argv0 = %self.argv0,
            modules = self.registry.len(),
            "engine loop starting"
        );
        while self.running {
            self.iterate();
        }
        self.game = None;
        self.registry.clear();
        let status = i32::from(self.close_error);
        info!(status, "engine loop stopped");
        status
    }

    fn iterate(&mut self) {
        let now = self.time();

        // Always-stage modules run every iteration, gated or not.
        self.run_update_stage(Stage::Always);

        let tick_due = match self.update_timer.as_mut() {
            Some(timer) => timer.elapsed(now),
            None => true,
        };
        if tick_due {
            let tick_now = self.time();
            self.delta_update.sample(tick_now);
            self.ups.tick(tick_now);
            self.run_update_stage(Stage::PreUpdate);
            self.run_update_stage(Stage::Update);
            self.run_update_stage(Stage::PostUpdate);
            self.run_game_update();
        }

        self.throttle();

        let render_now = self.time();
        self.delta_render.sample(render_now);
        self.fps.tick(render_now);
        self.run_render_stage();

        self.drain_commands();
    }

    /// Soft frame governor: sleeps out the remainder of the frame budget,
    /// measured from the previous governed frame start. The one
    /// intentional suspension point in the loop, bounded by the budget.
    fn throttle(&mut self) {
        if self.fps_limit <= 0.0 {
            return;
        }
        let budget = 1.0 / self.fps_limit;
        let remaining = budget - (self.clock.now() - self.frame_start);
        if remaining > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(remaining));
        }
        self.frame_start = self.clock.now();
    }

    fn frame_info(&self) -> FrameInfo {
        FrameInfo {
            time: self.clock.now() + self.time_offset,
            delta: self.delta_update.latest(),
            delta_render: self.delta_render.latest(),
            ups: self.ups.value(),
            fps: self.fps.value(),
        }
    }

    fn run_update_stage(&mut self, stage: Stage) {
        let frame = self.frame_info();
        let Self {
            registry, commands, ..
        } = self;
        let mut ctx = EngineContext::new(frame, commands);
        registry.for_each_in_stage(stage, |module| module.update(&mut ctx));
    }

    fn run_render_stage(&mut self) {
        let frame = self.frame_info();
        let Self {
            registry, commands, ..
        } = self;
        let mut ctx = EngineContext::new(frame, commands);
        registry.for_each_in_stage(Stage::Render, |module| module.render(&mut ctx));
    }

    fn run_game_update(&mut self) {
        let frame = self.frame_info();
        let Self { game, commands, .. } = self;
        if let Some(game) = game.as_mut() {
            let mut ctx = EngineContext::new(frame, commands);
            game.update(&mut ctx);
        }
    }

    fn drain_commands(&mut self) {
        if let Some(game) = self.commands.pending_game.take() {
            debug!("swapping game object");
            // Drop the outgoing instance before installing the new one so
            // its destruction precedes the replacement's first update.
            self.game = None;
            self.game = Some(game);
        }
        if let Some(error) = self.commands.close.take() {
            self.request_close(error);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        ENGINE_ACTIVE.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::{Mutex, MutexGuard};

    // Engine instances are process-exclusive, so every test that
    // constructs one serializes on this lock.
    static ENGINE_LOCK: Mutex<()> = Mutex::new(());

    fn engine_guard() -> MutexGuard<'static, ()> {
        ENGINE_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    type Count = Rc<Cell<u32>>;
    type Log = Rc<RefCell<Vec<String>>>;

    /// Requests a close after a fixed number of update invocations.
    struct CloseAfter {
        remaining: u32,
        error: bool,
    }

    impl Module for CloseAfter {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn update(&mut self, ctx: &mut EngineContext<'_>) {
            if self.remaining == 0 {
                ctx.request_close(self.error);
            } else {
                self.remaining -= 1;
            }
        }
    }

    /// Requests a close once the engine clock passes a deadline.
    struct CloseAt {
        deadline: f64,
    }

    impl Module for CloseAt {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn update(&mut self, ctx: &mut EngineContext<'_>) {
            if ctx.time() >= self.deadline {
                ctx.request_close(false);
            }
        }
    }

    struct UpdateCounter {
        count: Count,
    }

    impl Module for UpdateCounter {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn update(&mut self, _ctx: &mut EngineContext<'_>) {
            self.count.set(self.count.get() + 1);
        }
    }

    struct IterationCounter {
        count: Count,
    }

    impl Module for IterationCounter {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn update(&mut self, _ctx: &mut EngineContext<'_>) {
            self.count.set(self.count.get() + 1);
        }
    }

    struct RenderCounter {
        count: Count,
    }

    impl Module for RenderCounter {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn render(&mut self, _ctx: &mut EngineContext<'_>) {
            self.count.set(self.count.get() + 1);
        }
    }

    struct DoubleClose;

    impl Module for DoubleClose {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn update(&mut self, ctx: &mut EngineContext<'_>) {
            // The first flag must win.
            ctx.request_close(false);
            ctx.request_close(true);
        }
    }

    struct FirstGame {
        log: Log,
    }

    impl Game for FirstGame {
        fn update(&mut self, ctx: &mut EngineContext<'_>) {
            self.log.borrow_mut().push("first:update".into());
            ctx.set_game(Box::new(SecondGame {
                log: Rc::clone(&self.log),
            }));
        }
    }

    impl Drop for FirstGame {
        fn drop(&mut self) {
            self.log.borrow_mut().push("first:drop".into());
        }
    }

    struct SecondGame {
        log: Log,
    }

    impl Game for SecondGame {
        fn update(&mut self, ctx: &mut EngineContext<'_>) {
            self.log.borrow_mut().push("second:update".into());
            ctx.request_close(false);
        }
    }

    #[test]
    fn test_second_construction_fails_while_first_is_alive() {
        let _guard = engine_guard();
        let first = Engine::new("a").unwrap();
        let second = Engine::new("b");
        assert!(matches!(second, Err(EngineError::AlreadyActive)));
        drop(first);
        // The slot frees once the first instance is gone.
        assert!(Engine::new("c").is_ok());
    }

    #[test]
    fn test_clean_close_returns_zero() {
        let _guard = engine_guard();
        let mut engine = Engine::new("test").unwrap();
        engine
            .add_module(
                Stage::Always,
                CloseAfter {
                    remaining: 0,
                    error: false,
                },
            )
            .unwrap();
        assert_eq!(engine.run(), 0);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_error_close_returns_one() {
        let _guard = engine_guard();
        let mut engine = Engine::new("test").unwrap();
        engine
            .add_module(
                Stage::Always,
                CloseAfter {
                    remaining: 2,
                    error: true,
                },
            )
            .unwrap();
        assert_eq!(engine.run(), 1);
    }

    #[test]
    fn test_double_close_keeps_first_flag() {
        let _guard = engine_guard();
        let mut engine = Engine::new("test").unwrap();
        engine.add_module(Stage::Always, DoubleClose).unwrap();
        assert_eq!(engine.run(), 0);
    }

    #[test]
    fn test_rerun_after_stop_preserves_status() {
        let _guard = engine_guard();
        let mut engine = Engine::new("test").unwrap();
        engine
            .add_module(
                Stage::Always,
                CloseAfter {
                    remaining: 0,
                    error: true,
                },
            )
            .unwrap();
        assert_eq!(engine.run(), 1);
        // The running flag is never re-set; a second run exits immediately.
        assert_eq!(engine.run(), 1);
    }

    #[test]
    fn test_closing_iteration_still_renders() {
        let _guard = engine_guard();
        let renders = Count::default();
        let mut engine = Engine::new("test").unwrap();
        engine
            .add_module(
                Stage::Always,
                CloseAfter {
                    remaining: 0,
                    error: false,
                },
            )
            .unwrap();
        engine
            .add_module(
                Stage::Render,
                RenderCounter {
                    count: Rc::clone(&renders),
                },
            )
            .unwrap();
        engine.run();
        // The close is observed at the iteration boundary, after render.
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn test_fps_cap_governs_render_rate() {
        let _guard = engine_guard();
        let renders = Count::default();
        let mut engine = Engine::new("test").unwrap();
        engine.set_fps_limit(30.0);
        engine
            .add_module(Stage::Always, CloseAt { deadline: 1.0 })
            .unwrap();
        engine
            .add_module(
                Stage::Render,
                RenderCounter {
                    count: Rc::clone(&renders),
                },
            )
            .unwrap();
        engine.run();
        let frames = renders.get();
        assert!(
            (27..=31).contains(&frames),
            "expected ~30 governed frames in 1s, got {frames}"
        );
    }

    #[test]
    fn test_update_gating_decouples_update_from_render() {
        let _guard = engine_guard();
        let updates = Count::default();
        let iterations = Count::default();
        let mut engine = Engine::new("test").unwrap();
        engine.set_update_rate(50.0);
        engine
            .add_module(
                Stage::Always,
                IterationCounter {
                    count: Rc::clone(&iterations),
                },
            )
            .unwrap();
        engine
            .add_module(Stage::Always, CloseAt { deadline: 0.25 })
            .unwrap();
        engine
            .add_module(
                Stage::Update,
                UpdateCounter {
                    count: Rc::clone(&updates),
                },
            )
            .unwrap();
        engine.run();
        let ticks = updates.get();
        // ~12 gated ticks in 0.25s at 50 Hz; the ungated loop spins far
        // more iterations than that.
        assert!(
            (8..=15).contains(&ticks),
            "expected ~12 gated ticks, got {ticks}"
        );
        assert!(iterations.get() > ticks);
    }

    #[test]
    fn test_game_swap_drops_old_before_new_updates() {
        let _guard = engine_guard();
        let log = Log::default();
        let mut engine = Engine::new("test").unwrap();
        engine.set_game(Box::new(FirstGame {
            log: Rc::clone(&log),
        }));
        assert_eq!(engine.run(), 0);
        assert_eq!(
            *log.borrow(),
            vec!["first:update", "first:drop", "second:update"]
        );
    }

    #[test]
    fn test_shutdown_tears_down_game_and_modules() {
        let _guard = engine_guard();
        let mut engine = Engine::new("test").unwrap();
        engine
            .add_module(
                Stage::Always,
                CloseAfter {
                    remaining: 0,
                    error: false,
                },
            )
            .unwrap();
        engine.run();
        assert!(engine.modules().is_empty());
        assert!(!engine.has_game());
    }

    #[test]
    fn test_time_offset_shifts_reported_time() {
        let _guard = engine_guard();
        let mut engine = Engine::new("test").unwrap();
        engine.set_time_offset(100.0);
        assert!(engine.time() >= 100.0);
        assert!(engine.raw_time() < 100.0);
        assert_eq!(engine.time_offset(), 100.0);
    }

    #[test]
    fn test_date_time_format_shape() {
        let formatted = Engine::date_time();
        // dd-mm-YYYY HH:MM:SS
        assert_eq!(formatted.len(), 19);
        assert_eq!(formatted.as_bytes()[2], b'-');
        assert_eq!(formatted.as_bytes()[10], b' ');
        assert_eq!(formatted.as_bytes()[13], b':');
    }

    #[test]
    fn test_module_management_surface() {
        let _guard = engine_guard();
        let count = Count::default();
        let mut engine = Engine::new("orrery").unwrap();
        assert_eq!(engine.argv0(), "orrery");
        assert!(!engine.has_module::<UpdateCounter>());

        engine
            .add_module(
                Stage::Update,
                UpdateCounter {
                    count: Rc::clone(&count),
                },
            )
            .unwrap();
        assert!(engine.has_module::<UpdateCounter>());
        assert!(engine.get_module::<UpdateCounter>().is_some());
        engine.get_module_mut::<UpdateCounter>().unwrap().count.set(5);
        assert_eq!(count.get(), 5);

        assert!(engine.remove_module::<UpdateCounter>());
        assert!(engine.get_module::<UpdateCounter>().is_none());
    }

    #[test]
    fn test_unlimited_cap_is_default() {
        let _guard = engine_guard();
        let engine = Engine::new("test").unwrap();
        assert!(engine.fps_limit() <= 0.0);
        assert!(engine.update_rate() <= 0.0);
    }
}
