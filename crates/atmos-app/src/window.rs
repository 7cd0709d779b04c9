//! Window creation and event handling via winit.
//!
//! [`GlobeApp`] implements winit's [`ApplicationHandler`]: it owns the scene,
//! creates the GPU context once the window exists, and redraws continuously.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use atmos_config::Config;
use atmos_render::{
    FrameEncoder, GlobeRenderer, GlobeTexture, GpuTextureAllocator, RenderContext, SPACE_BLACK,
    SurfaceError, init_render_context_blocking,
};
use atmos_scene::SceneState;
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::game_loop::{TICK_DT, TickClock};
use crate::wiring::{
    DragTracker, load_request, scene_inputs, scene_settings, scroll_lines, texture_fetcher,
    window_title,
};

pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// Everything that only exists once a window and device do.
struct Graphics {
    context: RenderContext,
    allocator: GpuTextureAllocator,
    renderer: GlobeRenderer,
}

pub struct GlobeApp {
    config: Config,
    window: Option<Arc<Window>>,
    graphics: Option<Graphics>,
    scene: SceneState<GlobeTexture>,
    clock: TickClock,
    drag: DragTracker,
    shown_status: Option<&'static str>,
}

impl GlobeApp {
    pub fn new(config: Config) -> Self {
        let mut scene = SceneState::new(scene_settings(&config, config.window.width as f64));
        scene.set_inputs(scene_inputs(&config));
        scene.set_on_camera_animation_complete(|phase| {
            debug!(?phase, "camera animation complete");
        });
        Self {
            config,
            window: None,
            graphics: None,
            scene,
            clock: TickClock::new(),
            drag: DragTracker::default(),
            shown_status: None,
        }
    }

    pub fn scene(&self) -> &SceneState<GlobeTexture> {
        &self.scene
    }

    pub fn title(&self) -> String {
        window_title(&self.config.window.title, self.scene.globe().status_label())
    }

    fn initialize_graphics(&mut self, window: Arc<Window>) -> Result<(), String> {
        let mut context = init_render_context_blocking(window).map_err(|e| e.to_string())?;
        context.set_vsync(self.config.window.vsync);

        let mut allocator = GpuTextureAllocator::new(&context.device, &context.queue);
        let (width, height) = context.size();
        let mut renderer = GlobeRenderer::new(
            &context.device,
            &mut allocator,
            context.surface_format,
            width,
            height,
            self.config.globe.segments,
        )
        .map_err(|e| e.to_string())?;
        renderer.set_fov_degrees(self.config.camera.fov_degrees);

        self.scene.globe_mut().load(
            load_request(&self.config),
            texture_fetcher(&self.config),
            &mut allocator,
        );
        info!(
            preview = %self.config.textures.preview_url,
            full = %self.config.textures.full_url,
            "Streaming earth imagery"
        );

        self.graphics = Some(Graphics {
            context,
            allocator,
            renderer,
        });
        Ok(())
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        if let Some(gfx) = self.graphics.as_mut() {
            gfx.context.resize(size.width, size.height);
            let (width, height) = gfx.context.size();
            gfx.renderer.resize(&gfx.context.device, width, height);
        }
        let logical = size.to_logical::<f64>(scale_factor);
        self.scene
            .set_dimensions(self.config.globe.dimensions(logical.width));
        debug!(
            "Resized to {}x{} (logical width {:.0})",
            size.width, size.height, logical.width
        );
    }

    fn refresh_title(&mut self) {
        let status = self.scene.globe().status_label();
        if status != self.shown_status {
            self.shown_status = status;
            if let Some(window) = &self.window {
                window.set_title(&self.title());
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as i64);
        for _ in 0..self.clock.frame() {
            self.scene.update(TICK_DT, now_ms);
        }

        let Some(gfx) = self.graphics.as_mut() else {
            return;
        };
        if self.scene.globe_mut().poll(&mut gfx.allocator) {
            debug!(status = ?self.scene.globe().status(), "Globe texture changed");
        }

        gfx.renderer
            .prepare(&gfx.context.device, &gfx.context.queue, &self.scene);
        match gfx.context.get_current_texture() {
            Ok(surface_texture) => {
                let mut frame = FrameEncoder::new(&gfx.context.device, surface_texture);
                {
                    let mut pass = frame.begin_scene_pass(gfx.renderer.depth(), SPACE_BLACK);
                    gfx.renderer.draw(&mut pass, &self.scene);
                }
                frame.finish(&gfx.context.queue);
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("Surface out of memory, exiting");
                self.shutdown(event_loop);
                return;
            }
            Err(e) => warn!("Skipping frame: {e}"),
        }

        if self.clock.frames().is_multiple_of(600) {
            debug!(
                ticks = self.clock.ticks(),
                textures = gfx.allocator.live_textures(),
                "Frame stats"
            );
        }
        self.refresh_title();
    }

    /// Release GPU resources and stop the event loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut gfx) = self.graphics.take() {
            self.scene.unmount(&mut gfx.allocator);
            gfx.renderer.destroy(&mut gfx.allocator);
            debug!(live = gfx.allocator.live_textures(), "GPU textures released");
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for GlobeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.initialize_graphics(window.clone()) {
            error!("GPU initialization failed: {e}");
            event_loop.exit();
            return;
        }
        self.handle_resize(window.inner_size(), window.scale_factor());
        window.set_title(&self.title());
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                self.handle_resize(size, scale);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.handle_resize(size, scale_factor);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.drag.set_pressed(state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((dx, dy)) = self.drag.moved(position.x, position.y) {
                    self.scene.orbit_rotate(dx, dy);
                }
            }
            WindowEvent::CursorLeft { .. } => self.drag.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => self.scene.orbit_zoom(scroll_lines(delta)),
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Run the viewer until its window closes.
#[instrument(skip(config))]
pub fn run(config: Config) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = GlobeApp::new(config);
    event_loop.run_app(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atmos_geo::GeoPoint;

    #[test]
    fn test_new_app_has_no_window() {
        let app = GlobeApp::new(Config::default());
        assert!(app.window.is_none());
        assert!(app.graphics.is_none());
    }

    #[test]
    fn test_unloaded_globe_title_reports_fallback() {
        let app = GlobeApp::new(Config::default());
        assert_eq!(app.title(), "Atmos Weather Globe - Procedural fallback active");
    }

    #[test]
    fn test_config_location_becomes_focus() {
        let mut config = Config::default();
        config.scene.location = Some(GeoPoint::new(35.68, 139.69));
        let app = GlobeApp::new(config);
        assert_eq!(app.scene().inputs().focus, Some(GeoPoint::new(35.68, 139.69)));
    }

    #[test]
    fn test_resize_without_gpu_updates_dimensions() {
        let mut app = GlobeApp::new(Config::default());
        app.handle_resize(PhysicalSize::new(640, 480), 2.0);
        let narrow = app.scene().dimensions();
        app.handle_resize(PhysicalSize::new(3840, 2160), 1.0);
        assert!(
            narrow.radius < app.scene().dimensions().radius,
            "320 logical pixels should get a smaller globe"
        );
    }

    #[test]
    fn test_window_attributes_from_config() {
        let _attrs = window_attributes_from_config(&Config::default());
    }
}
