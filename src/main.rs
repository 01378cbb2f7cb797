use donut3d::chart::{ChartSpec, Clock, DonutChart, SectionLabel, SystemClock};
use donut3d::geometry::MeshArena;
use donut3d::render::{Camera, ChartRenderer, GpuContext, PresentationControls, Viewport};
use glam::Mat4;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const CAMERA_ZOOM: f32 = 100.0;

struct App {
    window: Option<Arc<Window>>,
    context: Option<GpuContext<'static>>,
    renderer: Option<ChartRenderer>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    chart: DonutChart,
    clock: SystemClock,
    camera: Camera,
    controls: PresentationControls,
    mouse_pos: (f32, f32),
    gui_hovered: bool,
}

impl App {
    fn new(chart: DonutChart) -> Self {
        Self {
            window: None,
            context: None,
            renderer: None,
            egui_state: None,
            egui_renderer: None,
            chart,
            clock: SystemClock::new(),
            camera: Camera::orthographic(Viewport::new(1280, 720), CAMERA_ZOOM),
            controls: PresentationControls::default(),
            mouse_pos: (0.0, 0.0),
            gui_hovered: false,
        }
    }

    fn update(&mut self) {
        if let (Some(context), Some(renderer)) = (self.context.as_ref(), self.renderer.as_mut()) {
            let mut meshes = renderer.mesh_target(&context.device);
            self.chart.tick(self.clock.now(), &mut meshes);
        }
        self.controls.update();
    }

    fn teardown(&mut self) {
        match (self.context.as_ref(), self.renderer.as_mut()) {
            (Some(context), Some(renderer)) => {
                self.chart.unmount(&mut renderer.mesh_target(&context.device));
                renderer.clear();
            }
            _ => self.chart.unmount(&mut MeshArena::new()),
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(context), Some(renderer), Some(egui_state)) = (
            self.window.as_ref(),
            self.context.as_mut(),
            self.renderer.as_ref(),
            self.egui_state.as_mut(),
        ) else {
            return;
        };

        let output = match context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                context.reconfigure();
                return;
            }
            Err(e) => {
                log::error!("surface error: {e:?}");
                return;
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let model = self.controls.transform().to_matrix();
        renderer.render(context, &view, &self.camera, model);

        let raw_input = egui_state.take_egui_input(window);
        let egui_ctx = egui_state.egui_ctx().clone();

        let camera = &self.camera;
        let labels = self.chart.labels();
        let collapsible = self.chart.spec().config.collapsible_labels;
        let mut toggled = Vec::new();

        let full_output = egui_ctx.run(raw_input, |ctx| {
            draw_labels(ctx, labels, camera, model, collapsible, &mut toggled);
        });

        self.gui_hovered = egui_ctx.is_pointer_over_area();
        egui_state.handle_platform_output(window, full_output.platform_output);
        let clipped_primitives = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [context.size.width, context.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        toggled.sort_unstable();
        toggled.dedup();
        for index in toggled {
            self.chart.toggle_label(index);
        }

        self.render_egui(&view, clipped_primitives, screen_descriptor, full_output.textures_delta);

        output.present();
    }

    fn render_egui(
        &mut self,
        view: &wgpu::TextureView,
        clipped_primitives: Vec<egui::ClippedPrimitive>,
        screen_descriptor: egui_wgpu::ScreenDescriptor,
        textures_delta: egui::TexturesDelta,
    ) {
        let (Some(context), Some(egui_renderer)) = (self.context.as_ref(), self.egui_renderer.as_mut()) else {
            return;
        };

        for (id, delta) in &textures_delta.set {
            egui_renderer.update_texture(&context.device, &context.queue, *id, delta);
        }

        let mut encoder = context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Egui Encoder"),
        });

        let callback_buffers = egui_renderer.update_buffers(
            &context.device,
            &context.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        context
            .queue
            .submit(callback_buffers.into_iter().chain(std::iter::once(encoder.finish())));

        for id in &textures_delta.free {
            egui_renderer.free_texture(id);
        }
    }
}

/// Section cards pinned to the projected label anchors.
fn draw_labels(
    ctx: &egui::Context,
    labels: &[SectionLabel],
    camera: &Camera,
    model: Mat4,
    collapsible: bool,
    toggled: &mut Vec<usize>,
) {
    let pixels_per_point = ctx.pixels_per_point();

    for label in labels {
        let Some([x, y]) = camera.project(model.transform_point3(label.anchor)) else {
            continue;
        };
        let border = egui::Color32::from_rgb(label.color.r, label.color.g, label.color.b);

        egui::Area::new(egui::Id::new(("section-label", label.index)))
            .fixed_pos(egui::pos2(x / pixels_per_point, y / pixels_per_point))
            .pivot(egui::Align2::CENTER_CENTER)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::default()
                    .fill(egui::Color32::WHITE)
                    .stroke(egui::Stroke::new(2.0, border))
                    .corner_radius(8.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        let title = egui::RichText::new(&label.title).strong().color(egui::Color32::BLACK);
                        if collapsible {
                            if ui.selectable_label(label.expanded, title).clicked() {
                                toggled.push(label.index);
                            }
                        } else {
                            ui.label(title);
                        }
                        if label.expanded {
                            ui.label(egui::RichText::new(&label.subtitle).color(egui::Color32::DARK_GRAY));
                        }
                    });
            });
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Donut Chart")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let context = match pollster::block_on(GpuContext::new(window.clone())) {
            Ok(context) => context,
            Err(e) => {
                log::error!("failed to initialise GPU: {e}");
                event_loop.exit();
                return;
            }
        };
        self.camera.set_viewport(context.viewport());

        let colors = self
            .chart
            .spec()
            .sections
            .iter()
            .map(|section| section.color.to_linear_rgba())
            .collect();
        let renderer = ChartRenderer::new(&context, colors);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx,
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(&context.device, context.config.format, None, 1, false);

        self.context = Some(context);
        self.renderer = Some(renderer);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);

        self.chart.mount(self.clock.now());
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let (Some(egui_state), Some(window)) = (&mut self.egui_state, &self.window) {
            let response = egui_state.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.teardown();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(context) = &mut self.context {
                    context.resize(size);
                    self.camera.set_viewport(context.viewport());
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        match code {
                            KeyCode::Escape => {
                                self.teardown();
                                event_loop.exit();
                            }
                            KeyCode::KeyR => self.controls.reset(),
                            _ => {}
                        }
                    }
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed if !self.gui_hovered => self.controls.begin_drag(),
                ElementState::Pressed => {}
                ElementState::Released => self.controls.end_drag(),
            },

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.controls.drag(x - self.mouse_pos.0, y - self.mouse_pos.1);
                self.mouse_pos = (x, y);
            }

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

fn load_chart() -> Result<DonutChart, donut3d::ChartError> {
    let spec = match std::env::args().nth(1) {
        Some(path) => ChartSpec::from_json_file(&path).unwrap_or_else(|err| {
            log::error!("could not load chart from {path}: {err}, showing the built-in chart");
            ChartSpec::demo()
        }),
        None => ChartSpec::demo(),
    };
    DonutChart::new(spec)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let chart = match load_chart() {
        Ok(chart) => chart,
        Err(err) => {
            log::error!("invalid chart: {err}, showing the built-in chart");
            DonutChart::new(ChartSpec::demo())?
        }
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(chart);
    event_loop.run_app(&mut app)?;
    Ok(())
}
