use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};
use worldsim_client::{
    ClientConfig, LoopState, PAUSE_ELEMENT, RefreshClock, RefreshTimer, RenderClient,
    START_ELEMENT, SURFACE_ELEMENT,
};
use worldsim_stream::TcpChannel;

#[derive(Parser)]
#[command(name = "worldsim-viewer", about = "Live viewer for the world simulation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Address of the snapshot source
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    server: String,

    /// Surface width in pixels
    #[arg(long, default_value = "500")]
    width: u32,

    /// Surface height in pixels
    #[arg(long, default_value = "500")]
    height: u32,
}

/// Application state, independent of the GPU.
struct AppState {
    client: RenderClient<TcpChannel, RefreshClock>,
    server: String,
    texture: Option<egui::TextureHandle>,
    timer: RefreshTimer,
    last_frame: Instant,
}

impl AppState {
    fn new(config: &ClientConfig) -> Result<Self> {
        let channel = TcpChannel::open(config.server.clone())?;
        let client = RenderClient::from_config(config, channel, RefreshClock::new())?;
        Ok(Self {
            client,
            server: config.server.clone(),
            texture: None,
            timer: RefreshTimer::new(120),
            last_frame: Instant::now(),
        })
    }

    /// Runs once per display refresh.
    fn update(&mut self) {
        let now = Instant::now();
        self.timer.record(now - self.last_frame);
        self.last_frame = now;
        self.client.refresh();
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }
        match key {
            KeyCode::KeyS => self.client.click(START_ELEMENT),
            KeyCode::KeyP => self.client.click(PAUSE_ELEMENT),
            _ => {}
        }
    }

    fn sync_texture(&mut self, ctx: &EguiContext) {
        let dirty = self.client.take_dirty();
        let surface = self.client.surface();
        let image = || {
            egui::ColorImage::from_rgba_unmultiplied(
                [surface.width() as usize, surface.height() as usize],
                &surface.as_bytes(),
            )
        };
        if let Some(texture) = &mut self.texture {
            if dirty {
                texture.set(image(), egui::TextureOptions::NEAREST);
            }
        } else {
            self.texture = Some(ctx.load_texture(
                SURFACE_ELEMENT,
                image(),
                egui::TextureOptions::NEAREST,
            ));
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        self.sync_texture(ctx);

        egui::SidePanel::left("controls")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("World Simulation");
                ui.label(format!("Source: {}", self.server));
                if self.client.link_down() {
                    ui.colored_label(egui::Color32::LIGHT_RED, "Connection lost");
                }
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Start (S)").clicked() {
                        self.client.click(START_ELEMENT);
                    }
                    if ui.button("Pause (P)").clicked() {
                        self.client.click(PAUSE_ELEMENT);
                    }
                });
                let state = match self.client.state() {
                    LoopState::Idle => "idle",
                    LoopState::Requesting { .. } => "requesting",
                };
                ui.label(format!("Loop: {state}"));
                ui.separator();

                ui.heading("Frame");
                ui.label(format!(
                    "Date: {}",
                    self.client.last_date().unwrap_or("none yet")
                ));
                let census = self.client.last_census();
                ui.label(format!("Humans: {}", census.humans));
                ui.label(format!("Animals: {}", census.animals));
                ui.label(format!("Insects: {}", census.insects));
                if census.other > 0 {
                    ui.label(format!("Unrecognized: {}", census.other));
                }
                ui.separator();

                ui.heading("Stats");
                let stats = self.client.stats();
                ui.label(format!("Requests: {}", stats.requests_emitted));
                ui.label(format!("Frames painted: {}", stats.frames_painted));
                ui.label(format!("Invalid frames: {}", stats.invalid_frames));
                ui.label(format!(
                    "Refresh: {:.0} Hz (worst {:.1} ms)",
                    self.timer.rate_hz(),
                    self.timer.max().as_secs_f64() * 1000.0
                ));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.texture {
                ui.add(
                    egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                        .bg_fill(egui::Color32::WHITE),
                );
            }
        });
    }
}

/// Window, GPU and egui plumbing created on resume.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("World Simulation")
            .with_inner_size(PhysicalSize::new(820u32, 560));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("worldsim_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
    }
}

struct ViewerApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl ViewerApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        self.state.update();

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });

        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 0.1,
                                g: 0.1,
                                b: 0.15,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize window: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.client.pause();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(gpu) = &self.gpu {
                    gpu.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("worldsim-viewer starting");

    let config = ClientConfig {
        server: cli.server,
        surface_width: cli.width,
        surface_height: cli.height,
        ..ClientConfig::default()
    };
    let state = AppState::new(&config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
