use std::{sync::Arc, time::Instant};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::SceneConfig,
    error::{Result, SceneError},
    gfx::{
        scene::{ModelLoader, Scene, SceneEvent},
        ui::{panel, UiManager},
        RenderEngine,
    },
    interaction::key_name,
};

/// The desk scene application: a window, the scene and its render loop
pub struct DeskSceneApp {
    event_loop: EventLoop<SceneEvent>,
    app_state: AppState,
}

struct AppState {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    cursor: (f32, f32),
    last_frame: Instant,
    error: Option<SceneError>,
}

impl DeskSceneApp {
    /// Creates the event loop and the (still empty) scene, and starts loading
    /// every configured model in the background
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        let event_loop = EventLoop::<SceneEvent>::with_user_event().build()?;

        let scene = Scene::new(&config, config.window.width, config.window.height);

        let requests = config
            .models
            .iter()
            .map(|spec| (spec.slot, config.model_path(spec)))
            .collect();
        ModelLoader::spawn(requests, event_loop.create_proxy());

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                cursor: (0.0, 0.0),
                last_frame: Instant::now(),
                error: None,
            },
        })
    }

    /// Runs the event loop until the window closes
    ///
    /// Fails if the window or GPU could not be initialised, or if a frame hit
    /// an unrecoverable surface error.
    pub fn run(mut self) -> Result<()> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.config.window;
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(window_config.title.clone())
                    .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
            )?,
        );

        let (width, height) = window.inner_size().into();
        let renderer = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            self.config.background,
        ))?;

        self.scene.resize(width, height);

        let ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: SceneError) {
        log::error!("{}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }

        match &event.logical_key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Named(NamedKey::F1) => {
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.toggle();
                }
            }
            key => {
                if let Some(name) = key_name(key) {
                    self.scene.press_key(&name, Instant::now());
                }
            }
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return Ok(());
        };

        let now = Instant::now();
        let delta_time = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.scene.update(delta_time, now);
        render_engine.update(self.scene.camera_manager.camera.uniform, &self.scene.lights);
        render_engine.sync_scene(&mut self.scene);

        let stats = self.scene.get_statistics();
        let last_click = self.scene.last_click().cloned();
        let overlay = self
            .ui_manager
            .as_mut()
            .filter(|ui_manager| ui_manager.is_visible())
            .map(|ui_manager| {
                move |device: &wgpu::Device,
                      queue: &wgpu::Queue,
                      encoder: &mut wgpu::CommandEncoder,
                      view: &wgpu::TextureView| {
                    ui_manager.draw(device, queue, encoder, window, view, |ui| {
                        panel::scene_debug(ui, &stats, last_click.as_ref());
                    });
                }
            });

        render_engine.render_frame(&self.scene, overlay)
    }
}

impl ApplicationHandler<SceneEvent> for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.init_graphics(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            SceneEvent::ModelLoaded { slot, result } => self.scene.on_model_loaded(slot, result),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_input(&window, window_id, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                self.scene.cursor_moved(self.cursor.0, self.cursor.1);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                match state {
                    ElementState::Pressed => self.scene.pointer_down(x, y),
                    ElementState::Released => {
                        self.scene.pointer_up(x, y);
                    }
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene.resize(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if self.window.is_none() {
            return;
        }

        if let Some(ui_manager) = self.ui_manager.as_ref() {
            if ui_manager.wants_input() {
                return;
            }
        }

        self.scene.camera_manager.process_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}
