//! Standalone visualization window backed by winit.
//!
//! The viewer owns the per-frame display loop: every redraw advances a
//! slow camera orbit, forwards `update` (which polls in completed sorts)
//! and `render` to the splat renderer, and requests the next redraw.
//! Camera input handling is intentionally absent; the orbit alone keeps
//! the view matrix changing, which continuously exercises the
//! asynchronous sort path.
//!
//! ```no_run
//! # use luster::{splat::SplatModel, Viewer};
//! # fn model() -> SplatModel { unimplemented!() }
//! Viewer::builder()
//!     .with_model(model())
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::{sync::Arc, time::Instant};

use glam::Vec3;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    camera::Camera,
    error::LusterError,
    gpu::render_context::RenderContext,
    options::Options,
    splat::{SplatInstance, SplatModel, SplatRenderer},
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    models: Vec<SplatModel>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    /// Builder with sensible defaults (title "Luster", no models, default
    /// options).
    fn new() -> Self {
        Self {
            models: Vec::new(),
            options: None,
            title: "Luster".into(),
        }
    }

    /// Add a splat model to render.
    #[must_use]
    pub fn with_model(mut self, model: SplatModel) -> Self {
        self.models.push(model);
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            models: self.models,
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// Standalone splat viewer window.
pub struct Viewer {
    models: Vec<SplatModel>,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start building a viewer.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop until it is closed.
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Viewer`] if the event loop cannot be
    /// created or fails while running.
    pub fn run(self) -> Result<(), LusterError> {
        let event_loop = EventLoop::new()
            .map_err(|e| LusterError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            models: self.models,
            options: self.options,
            title: self.title,
            window: None,
            context: None,
            renderer: None,
            camera: None,
            orbit_angle: 0.0,
            last_frame_time: Instant::now(),
        };
        event_loop
            .run_app(&mut app)
            .map_err(|e| LusterError::Viewer(e.to_string()))
    }
}

// ── Application ──────────────────────────────────────────────────────────

struct ViewerApp {
    models: Vec<SplatModel>,
    options: Options,
    title: String,
    window: Option<Arc<Window>>,
    context: Option<RenderContext>,
    renderer: Option<SplatRenderer>,
    camera: Option<Camera>,
    orbit_angle: f32,
    last_frame_time: Instant,
}

impl ViewerApp {
    fn redraw(&mut self) {
        let (Some(window), Some(context), Some(renderer), Some(camera)) = (
            &self.window,
            &mut self.context,
            &mut self.renderer,
            &mut self.camera,
        ) else {
            return;
        };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        // Keep the view matrix changing so re-sorts are continuously
        // requested and coalesced.
        self.orbit_angle += self.options.camera.orbit_speed * dt;
        let distance = self.options.camera.distance;
        camera.eye = Vec3::new(
            distance * self.orbit_angle.cos(),
            distance * 0.3,
            distance * self.orbit_angle.sin(),
        );

        if let Err(e) =
            renderer.update(context, camera, None, &self.options.display)
        {
            log::error!("update failed: {e}");
            return;
        }

        let frame = match context.get_next_frame() {
            Ok(frame) => frame,
            Err(
                wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost,
            ) => {
                let inner = window.inner_size();
                context.resize(inner.width, inner.height);
                return;
            }
            Err(e) => {
                log::error!("render error: {e:?}");
                return;
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = context.create_encoder();
        {
            let bg = self.options.display.background;
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Splat Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: f64::from(bg[0]),
                                    g: f64::from(bg[1]),
                                    b: f64::from(bg[2]),
                                    a: f64::from(bg[3]),
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: None,
                    ..Default::default()
                });

            if let Err(e) = renderer.render(&mut pass) {
                log::error!("draw failed: {e}");
            }
        }
        context.submit(encoder);
        frame.present();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs =
            Window::default_attributes().with_title(self.title.clone());
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let context = match pollster::block_on(RenderContext::new(
            window.clone(),
            (size.width.max(1), size.height.max(1)),
        )) {
            Ok(context) => context,
            Err(e) => {
                log::error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut renderer = SplatRenderer::new();
        for model in self.models.drain(..) {
            log::info!("adding splat instance with {} splats", model.len());
            if let Err(e) =
                renderer.add_instance(&context, SplatInstance::new(model))
            {
                log::error!("failed to add splat instance: {e}");
            }
        }
        if let Err(e) = renderer.acquire(&context) {
            log::error!("renderer initialization failed: {e}");
            event_loop.exit();
            return;
        }

        let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
        self.camera =
            Some(Camera::from_options(&self.options.camera, aspect));

        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
        self.renderer = Some(renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) = renderer.release() {
                        log::error!("renderer teardown failed: {e}");
                    }
                }
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(context) = &mut self.context {
                    context.resize(size.width, size.height);
                }
                if let Some(camera) = &mut self.camera {
                    camera.aspect =
                        size.width.max(1) as f32 / size.height.max(1) as f32;
                }
            }

            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => (),
        }
    }
}
