//! Swipe Pong entry point
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
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        Document, Element, HtmlCanvasElement, HtmlElement, HtmlImageElement, PointerEvent,
    };

    use swipe_pong::audio::web::WebAudioBackend;
    use swipe_pong::avatars::{AVATAR_FILES, AvatarCatalog, AvatarEntry};
    use swipe_pong::game::VictoryText;
    use swipe_pong::platform::haptics;
    use swipe_pong::renderer::{Letterbox, SdfRenderState};
    use swipe_pong::session::Phase;
    use swipe_pong::sim::{Paddle, Side};
    use swipe_pong::{GameContext, Settings};

    const HINT: &str = "Swipe to move. A fast swipe makes a super hit.";

    /// What the DOM currently shows, so unchanged text is not rewritten every frame
    #[derive(Default, PartialEq)]
    struct Hud {
        score: String,
        status: &'static str,
        phase: Option<Phase>,
        countdown: Option<(&'static str, &'static str)>,
        banner: Option<&'static str>,
        victory: Option<VictoryText>,
    }

    /// Game instance holding all state
    struct App {
        game: GameContext,
        render_state: Option<SdfRenderState>,
        canvas: HtmlCanvasElement,
        /// CSS-pixel letterbox for pointer input and face overlays
        letterbox: Letterbox,
        max_dpr: f64,
        hud: Hud,
    }

    impl App {
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else { return };
            let css_w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
            let css_h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
            let dpr = window.device_pixel_ratio().clamp(1.0, self.max_dpr);

            let width = (css_w * dpr).floor().max(1.0) as u32;
            let height = (css_h * dpr).floor().max(1.0) as u32;
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            if let Some(rs) = self.render_state.as_mut() {
                rs.resize(width, height);
            }
            self.letterbox = Letterbox::new(css_w as f32, css_h as f32, &self.game.state().world);
        }

        /// Pointer y in CSS pixels to world y
        fn world_y(&self, event: &PointerEvent) -> f32 {
            let rect = self.canvas.get_bounding_client_rect();
            let screen = Vec2::new(
                (event.client_x() as f64 - rect.left()) as f32,
                (event.client_y() as f64 - rect.top()) as f32,
            );
            self.letterbox.screen_to_world(screen).y
        }

        fn render(&mut self, time: f64) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            let view = self.game.render_view(time);
            match render_state.render(&view, time) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of GPU memory!");
                }
                Err(e) => {
                    log::warn!("Render error: {:?}", e);
                }
            }
        }

        /// Sync score, status, overlays and face positions
        fn update_hud(&mut self, time: f64) {
            let Some(document) = document() else { return };
            let view = self.game.render_view(time);

            let next = Hud {
                score: view.score_text(),
                status: view.status,
                phase: Some(view.phase),
                countdown: view.countdown.map(|s| (s.label, s.caption)),
                banner: view.banner,
                victory: view.victory,
            };

            if next.score != self.hud.score {
                set_text(&document, "score", &next.score);
            }
            if next.status != self.hud.status {
                set_text(&document, "status", next.status);
            }
            if next.phase != self.hud.phase {
                set_hidden(&document, "menu", view.phase != Phase::Menu);
                set_hidden(&document, "intro", view.phase != Phase::Intro);
                set_hidden(&document, "victory", view.phase != Phase::Victory);
                let label = if view.phase == Phase::Paused { "Resume" } else { "Pause" };
                set_text(&document, "btnPause", label);
            }
            if next.countdown != self.hud.countdown
                && let Some((label, caption)) = next.countdown
            {
                set_text(&document, "countdownNumber", label);
                set_text(&document, "countdownText", caption);
            }
            if next.banner != self.hud.banner {
                set_text(&document, "banner", next.banner.unwrap_or(""));
                set_hidden(&document, "banner", next.banner.is_none());
            }
            if next.victory != self.hud.victory
                && let Some(text) = next.victory
            {
                set_text(&document, "victoryTitle", text.title);
                set_text(&document, "victoryName", text.name);
                if let Some(winner) = self.game.session().winner()
                    && let Some(img) = image(&document, "victoryFace")
                {
                    img.set_src(self.game.selection().get(winner));
                }
            }

            for (id, paddle) in [("playerFace", view.player), ("cpuFace", view.computer)] {
                place_face(&document, id, &self.letterbox, paddle);
            }

            self.hud = next;
        }

        fn flush_haptics(&mut self) {
            for pattern in self.game.drain_haptics() {
                haptics::vibrate(pattern);
            }
        }

        /// Rebuild both face grids and point the paddle images at the selection
        fn refresh_faces(&self) {
            let Some(document) = document() else { return };
            for (grid_id, side) in [("playerFaces", Side::Player), ("cpuFaces", Side::Computer)] {
                if let Some(grid) = document.get_element_by_id(grid_id) {
                    let selected = self.game.selection().get(side);
                    build_face_grid(&document, &grid, self.game.avatars(), selected);
                }
            }
            if let Some(img) = image(&document, "playerFace") {
                img.set_src(&self.game.selection().player);
            }
            if let Some(img) = image(&document, "cpuFace") {
                img.set_src(&self.game.selection().computer);
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn now_ms() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn image(document: &Document, id: &str) -> Option<HtmlImageElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    /// Line a face image up with its paddle's socket
    fn place_face(document: &Document, id: &str, lb: &Letterbox, paddle: &Paddle) {
        let Some(el) = document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let center = lb.world_to_screen(paddle.pos);
        let size = lb.length(paddle.face_radius * 2.0);
        let style = el.style();
        let _ = style.set_property("left", &format!("{:.1}px", center.x - size / 2.0));
        let _ = style.set_property("top", &format!("{:.1}px", center.y - size / 2.0));
        let _ = style.set_property("width", &format!("{:.1}px", size));
        let _ = style.set_property("height", &format!("{:.1}px", size));
        let _ = style.set_property("transform", &format!("rotate({:.3}rad)", paddle.tilt));
    }

    fn build_face_grid(
        document: &Document,
        grid: &Element,
        catalog: &AvatarCatalog,
        selected: &str,
    ) {
        grid.set_inner_html("");
        for entry in catalog.entries() {
            let Ok(btn) = document.create_element("div") else { continue };
            let class = if entry.src == selected { "faceBtn selected" } else { "faceBtn" };
            let _ = btn.set_attribute("class", class);
            let _ = btn.set_attribute("data-src", &entry.src);

            if let Ok(img) = document.create_element("img") {
                let _ = img.set_attribute("src", &entry.src);
                let _ = btn.append_child(&img);
            }
            if let Ok(name) = document.create_element("div") {
                let _ = name.set_attribute("class", "faceName");
                name.set_text_content(Some(entry.name()));
                let _ = btn.append_child(&name);
            }
            let _ = grid.append_child(&btn);
        }
    }

    /// Resolves to `true` once the image decodes, `false` on error
    fn load_image(src: &'static str) -> js_sys::Promise {
        js_sys::Promise::new(&mut |resolve, _reject| {
            let Ok(img) = HtmlImageElement::new() else {
                let _ = resolve.call1(&JsValue::NULL, &JsValue::FALSE);
                return;
            };
            let on_ok = resolve.clone();
            let onload = Closure::once_into_js(move || {
                let _ = on_ok.call1(&JsValue::NULL, &JsValue::TRUE);
            });
            let onerror = Closure::once_into_js(move || {
                let _ = resolve.call1(&JsValue::NULL, &JsValue::FALSE);
            });
            img.set_onload(Some(onload.unchecked_ref()));
            img.set_onerror(Some(onerror.unchecked_ref()));
            img.set_src(src);
        })
    }

    /// Load every avatar in one parallel batch
    async fn load_avatars() -> AvatarCatalog {
        let promises: js_sys::Array = AVATAR_FILES.iter().map(|&src| load_image(src)).collect();
        let results = match JsFuture::from(js_sys::Promise::all(&promises)).await {
            Ok(v) => js_sys::Array::from(&v),
            Err(e) => {
                log::warn!("Avatar batch failed: {:?}", e);
                js_sys::Array::new()
            }
        };
        AvatarCatalog::from_results(AVATAR_FILES.iter().enumerate().map(|(i, src)| {
            AvatarEntry::new(*src, results.get(i as u32).as_bool().unwrap_or(false))
        }))
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Swipe Pong starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("game")
            .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #game canvas");
            return;
        };

        let settings = Settings::load();
        let max_dpr = settings.quality.max_pixel_ratio();
        let seed = js_sys::Date::now() as u64;
        let game = GameContext::new(seed, settings, WebAudioBackend::opener());
        let letterbox = Letterbox::new(1.0, 1.0, &game.state().world);

        let app = Rc::new(RefCell::new(App {
            game,
            render_state: None,
            canvas: canvas.clone(),
            letterbox,
            max_dpr,
            hud: Hud::default(),
        }));
        app.borrow_mut().resize();

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        let (w, h) = (canvas.width(), canvas.height());
                        match SdfRenderState::new(surface, &adapter, w, h).await {
                            Ok(mut render_state) => {
                                render_state.set_start_time(now_ms());
                                app.borrow_mut().render_state = Some(render_state);
                            }
                            Err(e) => log::error!("Failed to create device: {}", e),
                        }
                    }
                    Err(e) => log::error!("Failed to get adapter: {}", e),
                }
            }
            Err(e) => log::error!("Failed to create surface: {}", e),
        }

        set_text(&document, "hint", HINT);
        setup_auto_pause(&document, app.clone());
        setup_resize(app.clone());

        // The menu stays inert until every face has settled
        let catalog = load_avatars().await;
        {
            let mut a = app.borrow_mut();
            a.game.set_avatars(catalog);
            a.refresh_faces();
        }
        setup_input_handlers(&canvas, app.clone());
        setup_buttons(&document, app.clone());
        setup_face_grids(&document, app.clone());

        request_animation_frame(app);

        log::info!("Swipe Pong running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                let y = a.world_y(&event);
                a.game.pointer_down(y, now_ms());
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut a = app.borrow_mut();
                let y = a.world_y(&event);
                a.game.pointer_move(y, now_ms());
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release anywhere, not just over the canvas
        let Some(window) = web_sys::window() else { return };
        for name in ["pointerup", "pointercancel"] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().game.pointer_up();
            });
            let _ = window.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut a = app.borrow_mut();
                let now = now_ms();
                match event.key().as_str() {
                    " " | "p" | "P" => {
                        a.game.toggle_pause(now);
                    }
                    "Escape" => {
                        if a.game.phase() == Phase::Menu {
                            a.game.close_menu(now);
                        } else {
                            a.game.open_menu(now);
                        }
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(
        document: &Document,
        id: &str,
        app: &Rc<RefCell<App>>,
        action: fn(&mut GameContext, f64),
    ) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing #{}", id);
            return;
        };
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            action(&mut app.borrow_mut().game, now_ms());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, app: Rc<RefCell<App>>) {
        on_click(document, "btnRestart", &app, |g, now| {
            g.rematch(now);
        });
        on_click(document, "btnPause", &app, |g, now| {
            g.toggle_pause(now);
        });
        on_click(document, "btnMenu", &app, |g, now| {
            g.open_menu(now);
        });
        on_click(document, "btnCloseMenu", &app, |g, now| {
            g.close_menu(now);
        });
        on_click(document, "btnMenuStart", &app, |g, now| {
            g.start(now);
        });
        on_click(document, "btnVictoryAgain", &app, |g, now| {
            g.rematch(now);
        });
        on_click(document, "btnVictoryClose", &app, |g, now| {
            g.close_victory(now);
        });

        // A tap on the intro or victory overlay also unlocks audio
        for id in ["intro", "victory"] {
            let Some(el) = document.get_element_by_id(id) else { continue };
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().game.user_gesture();
            });
            let _ = el.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_face_grids(document: &Document, app: Rc<RefCell<App>>) {
        for (grid_id, side) in [("playerFaces", Side::Player), ("cpuFaces", Side::Computer)] {
            let Some(grid) = document.get_element_by_id(grid_id) else { continue };
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
                let src = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest(".faceBtn").ok().flatten())
                    .and_then(|btn| btn.get_attribute("data-src"));
                let Some(src) = src else { return };

                let mut a = app.borrow_mut();
                if a.game.select_avatar(side, &src) {
                    a.refresh_faces();
                }
            });
            let _ = grid.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(document: &Document, app: Rc<RefCell<App>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                app.borrow_mut().game.visibility_lost(now_ms());
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            a.game.frame(time);
            a.flush_haptics();
            a.render(time);
            a.update_hud(time);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Swipe Pong (native) starting...");
    log::info!("Native mode has no window - running a headless match against the computer");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    headless_match(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Self-play: the "human" swipe tracks the ball with a little lag
#[cfg(not(target_arch = "wasm32"))]
fn headless_match(seed: u64) {
    use swipe_pong::audio::AudioBackend;
    use swipe_pong::session::Phase;
    use swipe_pong::{GameContext, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const LIMIT_MS: f64 = 15.0 * 60.0 * 1000.0;

    let silent = Box::new(|| None::<Box<dyn AudioBackend>>);
    let mut game = GameContext::new(seed, Settings::default(), silent);
    let mut now = 0.0;
    game.frame(now);
    game.start(now);

    let mut pressed = false;
    while now < LIMIT_MS && game.phase() != Phase::Victory {
        now += FRAME_MS;
        if game.phase() == Phase::Playing {
            let ball = game.state().ball.pos;
            if !pressed {
                game.pointer_down(ball.y, now);
                pressed = true;
            }
            game.pointer_move(ball.y, now);
        }
        game.frame(now);
        game.drain_haptics();
    }

    let score = game.state().score;
    match game.session().winner() {
        Some(winner) => println!(
            "Seed {}: {} wins {} : {} after {:.1}s",
            seed,
            winner.key(),
            score.player,
            score.computer,
            now / 1000.0
        ),
        None => println!(
            "Seed {}: no winner after {:.0}s ({} : {})",
            seed,
            now / 1000.0,
            score.player,
            score.computer
        ),
    }
}
