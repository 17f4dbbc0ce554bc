//! Sprite Runner entry point
//!
//! Browser build: requestAnimationFrame loop, DOM HUD, input plumbing and a
//! Canvas2D mirror of the scene graph. Native build: headless autoplay.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement, KeyboardEvent,
        MouseEvent, TouchEvent,
    };

    use sprite_runner::consts::VIEW_SIZE;
    use sprite_runner::sim::{NodeId, NodeKind, SceneChange, TextureId};
    use sprite_runner::{InputSignal, LoopControl, Session, Tuning};

    const TEXTURES: [(TextureId, &str); 3] = [
        (TextureId::Player, "assets/player.png"),
        (TextureId::Decal, "assets/decal.png"),
        (TextureId::Actor, "assets/actor.png"),
    ];

    fn rgb(color: glam::Vec3) -> String {
        let c = (color.clamp(glam::Vec3::ZERO, glam::Vec3::ONE) * 255.0).round();
        format!("rgb({}, {}, {})", c.x as u8, c.y as u8, c.z as u8)
    }

    fn texture_for(kind: NodeKind) -> Option<TextureId> {
        match kind {
            NodeKind::Player => Some(TextureId::Player),
            NodeKind::SpiralDecal => Some(TextureId::Decal),
            NodeKind::BounceActor | NodeKind::OscillateActor => Some(TextureId::Actor),
            NodeKind::Obstacle | NodeKind::BouncePlatform | NodeKind::ZoomHalo => None,
        }
    }

    fn fallback_fill(kind: NodeKind) -> &'static str {
        match kind {
            NodeKind::Player => "#5ad1ff",
            NodeKind::Obstacle => "#ff5a5a",
            NodeKind::SpiralDecal => "#ffd25a",
            NodeKind::BounceActor | NodeKind::OscillateActor => "#9dff7a",
            NodeKind::BouncePlatform => "#8888aa",
            NodeKind::ZoomHalo => "rgba(255, 255, 255, 0.25)",
        }
    }

    struct Game {
        session: Session,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        images: BTreeMap<TextureId, HtmlImageElement>,
        /// Renderer-side copy of live node ids, kept in sync from scene changes
        mirror: BTreeMap<NodeId, NodeKind>,
    }

    impl Game {
        fn sync_mirror(&mut self) {
            for change in self.session.state_mut().scene.drain_changes() {
                match change {
                    SceneChange::Added(id, kind) => {
                        self.mirror.insert(id, kind);
                    }
                    SceneChange::Removed(id) => {
                        self.mirror.remove(&id);
                    }
                }
            }
        }

        fn render(&mut self) {
            self.sync_mirror();

            let width = self.canvas.width() as f64;
            let height = self.canvas.height() as f64;
            let state = self.session.state();
            let scale = height * state.camera.zoom as f64 / VIEW_SIZE as f64;
            let to_screen = |x: f32, y: f32| (width / 2.0 + x as f64 * scale, height / 2.0 - y as f64 * scale);

            self.ctx.set_global_alpha(1.0);
            self.ctx.set_fill_style_str(&rgb(state.screen.current()));
            self.ctx.fill_rect(0.0, 0.0, width, height);

            let ground = to_screen(0.0, state.tuning.world.ground_y).1;
            self.ctx.set_fill_style_str("#111122");
            self.ctx.fill_rect(0.0, ground, width, height - ground);

            for (id, kind) in &self.mirror {
                let Some(node) = state.scene.get(*id) else {
                    continue;
                };
                let (cx, cy) = to_screen(node.pos.x, node.pos.y);
                let w = node.scale.x as f64 * scale;
                let h = node.scale.y as f64 * scale;
                self.ctx.set_global_alpha(node.alpha as f64);

                let image = texture_for(*kind)
                    .filter(|t| state.assets.is_loaded(*t))
                    .and_then(|t| self.images.get(&t));
                match image {
                    Some(image) => {
                        let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                            image,
                            cx - w / 2.0,
                            cy - h / 2.0,
                            w,
                            h,
                        );
                    }
                    None => {
                        self.ctx.set_fill_style_str(fallback_fill(*kind));
                        self.ctx.fill_rect(cx - w / 2.0, cy - h / 2.0, w, h);
                    }
                }
            }

            for sprite in state.particle_sprites() {
                let (cx, cy) = to_screen(sprite.pos.x, sprite.pos.y);
                self.ctx.set_global_alpha(sprite.alpha as f64);
                self.ctx.set_fill_style_str(&rgb(sprite.tint));
                self.ctx.begin_path();
                let radius = (sprite.size as f64 * scale / 2.0).max(1.0);
                let _ = self.ctx.arc(cx, cy, radius, 0.0, std::f64::consts::TAU);
                self.ctx.fill();
            }
            self.ctx.set_global_alpha(1.0);
        }

        fn update_hud(&self, document: &Document) {
            let ui = self.session.ui();
            if let Some(el) = document.get_element_by_id("score") {
                el.set_text_content(Some(&ui.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("start-prompt") {
                let _ = el.set_attribute("class", if ui.show_start_prompt { "" } else { "hidden" });
            }
            if let Some(el) = document.get_element_by_id("game-over") {
                match ui.game_over {
                    Some(score) => {
                        let _ = el.set_attribute("class", "");
                        if let Some(final_el) = document.get_element_by_id("final-score") {
                            final_el.set_text_content(Some(&score.to_string()));
                        }
                    }
                    None => {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
            }
        }
    }

    fn document() -> Result<Document, JsValue> {
        web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
        log::info!("Sprite Runner starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = document()?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;
        let dpr = window.device_pixel_ratio();
        canvas.set_width((canvas.client_width() as f64 * dpr) as u32);
        canvas.set_height((canvas.client_height() as f64 * dpr) as u32);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(Tuning::load(), seed)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let game = Rc::new(RefCell::new(Game {
            session,
            canvas: canvas.clone(),
            ctx,
            images: BTreeMap::new(),
            mirror: BTreeMap::new(),
        }));

        load_textures(&game)?;
        setup_input_handlers(&canvas, game.clone())?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        // Draw the idle scene once; the loop only runs while playing
        let mut g = game.borrow_mut();
        g.render();
        g.update_hud(&document);
        log::info!("Sprite Runner ready (seed {})", seed);
        Ok(())
    }

    fn load_textures(game: &Rc<RefCell<Game>>) -> Result<(), JsValue> {
        for (id, url) in TEXTURES {
            let image = HtmlImageElement::new()?;
            let onload = {
                let game = game.clone();
                Closure::<dyn FnMut()>::new(move || {
                    game.borrow_mut().session.state_mut().assets.mark_loaded(id);
                })
            };
            image.set_onload(Some(onload.as_ref().unchecked_ref()));
            onload.forget();
            image.set_src(url);
            game.borrow_mut().images.insert(id, image);
        }
        Ok(())
    }

    fn dispatch(game: &Rc<RefCell<Game>>, signal: InputSignal) {
        let restart_loop = game.borrow_mut().session.handle(signal);
        if restart_loop {
            request_animation_frame(game.clone());
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        // Mouse
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                dispatch(&game, InputSignal::Pointer);
            });
            canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                dispatch(&game, InputSignal::Pointer);
            });
            canvas.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                match event.key().as_str() {
                    " " | "ArrowUp" => dispatch(&game, InputSignal::Pointer),
                    "e" | "E" => dispatch(&game, InputSignal::ActivateEffect),
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
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
        let control = {
            let mut g = game.borrow_mut();
            let control = g.session.frame(time);
            g.render();
            if let Ok(document) = document() {
                g.update_hud(&document);
            }
            control
        };

        // Game over leaves no frame pending
        if control == LoopControl::Continue {
            request_animation_frame(game);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use sprite_runner::sim::{AssetRegistry, GameState};
    use sprite_runner::{InputSignal, Session, Tuning, TuningError};

    const DEFAULT_FRAMES: u64 = 3600;

    /// Jump so the apex of the arc lines up with the nearest obstacle
    fn should_jump(state: &GameState) -> bool {
        let world = &state.tuning.world;
        let lead = world.game_speed * world.jump_velocity / world.gravity;
        state.player.on_ground()
            && state.obstacles.iter().any(|o| {
                let distance = o.pos.x - state.player.x;
                distance > 0.0 && distance <= lead
            })
    }

    pub fn run(args: &[String]) -> Result<(), TuningError> {
        let tuning = match args.first() {
            Some(path) => Tuning::from_json_file(path)?,
            None => Tuning::load(),
        };
        let frames = args
            .get(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FRAMES);

        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let mut session = Session::new(tuning, seed)?;
        session.state_mut().assets = AssetRegistry::all_loaded();
        session.handle(InputSignal::Pointer);

        for _ in 0..frames {
            if should_jump(session.state()) {
                session.handle(InputSignal::Pointer);
            }
            let outcome = session.step(1.0);
            if outcome.passed > 0 {
                log::debug!("Score {}", session.state().score);
            }
            if outcome.collided {
                break;
            }
        }

        let state = session.state();
        match session.ui().game_over {
            Some(score) => log::info!("Crashed after {} frames with score {}", state.frame_count, score),
            None => log::info!("Survived {} frames with score {}", state.frame_count, state.score),
        }
        println!("{}", state.score);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Sprite Runner (native) starting headless autoplay");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = headless::run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}
