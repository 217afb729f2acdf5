//! Knockdown entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

    use knockdown::Settings;
    use knockdown::camera::{OrbitCamera, Viewport};
    use knockdown::consts::*;
    use knockdown::hud;
    use knockdown::input::{self, KeyAction, RollKeys};
    use knockdown::persistence;
    use knockdown::physics::RapierWorld;
    use knockdown::platform;
    use knockdown::renderer::MeshRenderState;
    use knockdown::sim::{
        FrameInput, GameEvent, GameSession, RoomLayout, World, controller, frame, history,
    };

    const LEFT_BUTTON: i16 = 0;
    const RIGHT_BUTTON: i16 = 2;

    struct Game {
        session: GameSession,
        world: World<RapierWorld>,
        camera: OrbitCamera,
        settings: Settings,
        render_state: Option<MeshRenderState>,
        /// Canvas size in CSS pixels
        viewport: Viewport,
        roll_keys: RollKeys,
        /// Right button held: camera is orbiting
        orbiting: bool,
        last_time: f64,
    }

    impl Game {
        fn new(seed: u64, settings: Settings, viewport: Viewport) -> Self {
            let mut session = GameSession::new(seed);
            let mut world = World::new(RapierWorld::new());
            controller::start_session(&mut session, &mut world);

            let mut camera = OrbitCamera::default();
            camera.set_aspect(viewport);

            Self {
                session,
                world,
                camera,
                settings,
                render_state: None,
                viewport,
                roll_keys: RollKeys::default(),
                orbiting: false,
                last_time: 0.0,
            }
        }

        /// Track a new canvas size; returns the backbuffer size to apply
        fn resize(&mut self, viewport: Viewport, pixel_ratio: f64) -> (u32, u32) {
            let (width, height) = viewport.backbuffer_size(pixel_ratio);
            self.viewport = viewport;
            self.camera.set_aspect(viewport);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height);
            }
            (width, height)
        }

        fn ground_y(&self) -> f32 {
            RoomLayout::for_room(self.session.room.index, self.session.seed).ground_top()
        }

        fn pointer_down(&mut self, cursor: Vec2) {
            let action = input::translate_pointer_down(
                &self.camera,
                self.viewport,
                cursor,
                &self.world.collectible_positions(),
                self.ground_y(),
            );
            log::debug!("Pointer down at {cursor}: {action:?}");
            controller::apply_pointer(&mut self.session, &mut self.world, action);
        }

        fn pointer_move(&mut self, cursor: Vec2, movement: Vec2) {
            if self.orbiting {
                let (yaw, pitch) = self.settings.orbit_delta(movement.x, movement.y);
                self.camera.orbit(yaw, pitch);
                return;
            }
            let aim = input::aim_point(&self.camera, self.viewport, cursor, self.ground_y());
            controller::set_aim(&mut self.session, aim);
        }

        fn key_command(&mut self, action: KeyAction) {
            match action {
                KeyAction::Shoot => {
                    controller::shoot(&mut self.session, &mut self.world);
                }
                KeyAction::Undo => {
                    controller::undo(&mut self.session, &mut self.world);
                }
                KeyAction::Save => {
                    let snapshot = history::capture(&self.session, &self.world);
                    if let Err(e) = persistence::save(&snapshot) {
                        log::warn!("Save failed: {e}");
                    }
                }
                KeyAction::Load => match persistence::load() {
                    Ok(Some(snapshot)) => {
                        history::restore(&mut self.session, &mut self.world, &snapshot);
                        self.session.history.clear();
                    }
                    Ok(None) => log::info!("No saved game"),
                    Err(e) => log::warn!("Load failed: {e}"),
                },
                KeyAction::DeleteSave => {
                    if let Err(e) = persistence::delete() {
                        log::warn!("Delete failed: {e}");
                    }
                }
            }
        }

        /// Advance one frame; returns alert texts to show once the borrow ends
        fn update(&mut self, dt: f32) -> Vec<&'static str> {
            let input = FrameInput {
                roll: self.roll_keys.direction(&self.camera),
            };
            let events = frame(&mut self.session, &mut self.world, &input, dt);

            let mut alerts = Vec::new();
            for event in &events {
                match event {
                    GameEvent::BallCountChanged { held } => {
                        platform::set_text(hud::BALL_COUNT_ELEMENT, &hud::ball_count_text(*held));
                    }
                    GameEvent::RoomEntered { index } => log::info!("Entered room {index}"),
                    _ => {}
                }
                alerts.extend(hud::alert_for(event));
            }
            alerts
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.world.scene, &self.camera) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => render_state.reconfigure(),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }
    }

    fn js_err(context: &str, e: impl std::fmt::Debug) -> JsValue {
        JsValue::from_str(&format!("{context}: {e:?}"))
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Knockdown starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no #canvas element"))?
            .dyn_into()?;

        let settings = Settings::load();

        // Backbuffer at a capped device pixel ratio
        let viewport = canvas_viewport(&canvas);
        let (width, height) =
            viewport.backbuffer_size(settings.pixel_ratio(platform::device_pixel_ratio()));
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, settings.clone(), viewport)));
        log::info!("Game initialized with seed: {}", seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| js_err("create surface", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| js_err("request adapter", e))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = MeshRenderState::new(surface, &adapter, width, height, &settings)
            .await
            .map_err(|e| js_err("request device", e))?;
        game.borrow_mut().render_state = Some(render_state);

        platform::set_text(hud::BALL_COUNT_ELEMENT, &hud::ball_count_text(0));
        if settings.show_controls_hint {
            platform::set_text(hud::CONTROLS_ELEMENT, hud::CONTROLS_MESSAGE);
        }

        setup_pointer_handlers(&canvas, game.clone());
        setup_key_handlers(&window, game.clone());
        setup_resize_handler(&window, canvas, game.clone());

        request_animation_frame(game);

        log::info!("Knockdown running!");
        Ok(())
    }

    fn canvas_viewport(canvas: &HtmlCanvasElement) -> Viewport {
        Viewport::new(
            canvas.client_width().max(1) as f32,
            canvas.client_height().max(1) as f32,
        )
    }

    fn setup_resize_handler(
        window: &web_sys::Window,
        canvas: HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            let pixel_ratio = g.settings.pixel_ratio(platform::device_pixel_ratio());
            let (width, height) = g.resize(canvas_viewport(&canvas), pixel_ratio);
            canvas.set_width(width);
            canvas.set_height(height);
            log::debug!("Canvas resized to {width}x{height}");
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Left: equip or move. Right: start orbiting.
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                match event.button() {
                    LEFT_BUTTON => {
                        let cursor = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                        g.pointer_down(cursor);
                    }
                    RIGHT_BUTTON => g.orbiting = true,
                    _ => {}
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Button release anywhere ends orbiting
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() == RIGHT_BUTTON {
                    game.borrow_mut().orbiting = false;
                }
            });
            if let Some(window) = web_sys::window() {
                let _ = window
                    .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let cursor = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                let movement = Vec2::new(event.movement_x() as f32, event.movement_y() as f32);
                game.borrow_mut().pointer_move(cursor, movement);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Right-drag orbits, so no context menu
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
            });
            let _ = canvas
                .add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: WheelEvent| {
                event.prevent_default();
                let factor = if event.delta_y() > 0.0 { 1.1 } else { 1.0 / 1.1 };
                game.borrow_mut().camera.zoom(factor);
            });
            let _ = canvas
                .add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_key_handlers(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                let mut g = game.borrow_mut();
                if g.roll_keys.set(&code, true) {
                    event.prevent_default();
                    return;
                }
                if let Some(action) = input::key_action(&code) {
                    event.prevent_default();
                    if !event.repeat() {
                        g.key_command(action);
                    }
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().roll_keys.set(&event.code(), false);
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keys released while unfocused never send keyup
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().roll_keys.clear();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let alerts = {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                PHYSICS_DT
            };
            g.last_time = time;

            let alerts = g.update(dt);
            g.render();
            alerts
        };

        // alert() blocks; don't hold the borrow across it
        if !alerts.is_empty() {
            for message in alerts {
                platform::alert(message);
            }
            // Time spent in the modal is not game time
            game.borrow_mut().last_time = 0.0;
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Startup failed: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Knockdown (native) starting...");
    log::info!("Native mode has no window - run with `trunk serve` for the web version");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play a scripted session without rendering: pick up every ball, fire them
/// all at the cube and report the outcome
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use knockdown::consts::PHYSICS_DT;
    use knockdown::physics::RapierWorld;
    use knockdown::sim::{FrameInput, GameEvent, GameSession, World, controller, frame};

    let mut session = GameSession::new(42);
    let mut world = World::new(RapierWorld::new());
    controller::start_session(&mut session, &mut world);

    while let Some((ball, _)) = world.collectible_positions().first().copied() {
        controller::equip(&mut session, &mut world, ball);
    }
    let target = world
        .puzzle_block()
        .and_then(|id| world.pose_of(id))
        .map(|pose| pose.position);
    controller::set_aim(&mut session, target);

    let input = FrameInput::default();
    for step in 0..600 {
        if step % 30 == 0 {
            controller::shoot(&mut session, &mut world);
        }
        for event in frame(&mut session, &mut world, &input, PHYSICS_DT) {
            match event {
                GameEvent::Won { room } => log::info!("Room {room}: cube knocked down"),
                GameEvent::Lost { room } => log::info!("Room {room}: out of balls"),
                _ => {}
            }
        }
    }
    log::info!(
        "Demo finished: {} shots, outcome {:?}",
        session.balls_used,
        session.room.outcome
    );
}
