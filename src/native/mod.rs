//! Native window frontend using winit and wgpu.
//!
//! The event loop is pumped from the session thread, so input is collected
//! in the same loop that edits and saves. Each presented frame is uploaded
//! as a texture and drawn as a fullscreen quad; the window is sized to the
//! displayed image and pointer positions are scaled back to image pixels.

mod gpu;
mod pipeline;

use std::sync::Arc;
use std::time::Duration;

use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use crate::editor::{PointerButton, PointerEvent};
use crate::frontend::{Frame, Frontend, FrontendError, InputEvent};
use crate::geometry::Point;
use crate::keybindings::{KeyBindings, KeyInput};

pub use gpu::{GpuContext, GpuError};
use pipeline::FramePipeline;

impl From<GpuError> for FrontendError {
    fn from(e: GpuError) -> Self {
        FrontendError::Render(e.to_string())
    }
}

/// Window showing the composed frames.
pub struct NativeFrontend {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    gpu: GpuContext,
    pipeline: FramePipeline,
    bindings: KeyBindings,
    /// Last cursor position in window pixels
    cursor: Option<PhysicalPosition<f64>>,
    /// Size of the image currently shown
    image_size: (u32, u32),
    title: String,
}

impl NativeFrontend {
    pub fn new(title: &str, bindings: KeyBindings) -> Result<Self, FrontendError> {
        let event_loop = EventLoop::new()
            .map_err(|e| FrontendError::EventLoop(format!("Failed to create event loop: {}", e)))?;

        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(800, 600))
            .build(&event_loop)
            .map_err(|e| FrontendError::Window(format!("Failed to create window: {}", e)))?;
        let window = Arc::new(window);

        let gpu = pollster::block_on(GpuContext::new(Arc::clone(&window)))?;
        let pipeline = FramePipeline::new(&gpu);
        log::info!("Window ready ({}x{})", gpu.width(), gpu.height());

        Ok(Self {
            event_loop,
            window,
            gpu,
            pipeline,
            bindings,
            cursor: None,
            image_size: (0, 0),
            title: title.to_string(),
        })
    }
}

impl Frontend for NativeFrontend {
    fn poll_events(&mut self, timeout: Duration) -> Result<Vec<InputEvent>, FrontendError> {
        let mut events = Vec::new();
        let mut redraw = false;
        let image_size = self.image_size;
        let bindings = &self.bindings;
        let cursor = &mut self.cursor;
        let gpu = &mut self.gpu;

        let status = self.event_loop.pump_events(Some(timeout), |event, _elwt| {
            let Event::WindowEvent { event, .. } = event else {
                return;
            };
            match event {
                WindowEvent::CloseRequested => events.push(InputEvent::Closed),
                WindowEvent::Resized(size) => {
                    gpu.resize(size.width, size.height);
                    redraw = true;
                }
                WindowEvent::RedrawRequested => redraw = true,
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed {
                        return;
                    }
                    if let Some(key) = key_input(&event.logical_key).and_then(|k| bindings.editor_key(k))
                    {
                        events.push(InputEvent::Key(key));
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    *cursor = Some(position);
                    let at = to_image_point(position, (gpu.width(), gpu.height()), image_size);
                    events.push(InputEvent::Pointer(PointerEvent::Move { at }));
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    let button = match button {
                        MouseButton::Left => PointerButton::Primary,
                        MouseButton::Right => PointerButton::Secondary,
                        _ => return,
                    };
                    let Some(position) = *cursor else {
                        return;
                    };
                    let at = to_image_point(position, (gpu.width(), gpu.height()), image_size);
                    events.push(InputEvent::Pointer(match state {
                        ElementState::Pressed => PointerEvent::Press { button, at },
                        ElementState::Released => PointerEvent::Release { button, at },
                    }));
                }
                _ => {}
            }
        });

        if let PumpStatus::Exit(code) = status {
            log::debug!("Event loop exited with code {}", code);
            events.push(InputEvent::Closed);
        }

        if redraw && self.pipeline.has_frame() {
            self.draw()?;
        }
        if !events.is_empty() {
            log::trace!("Polled {} events", events.len());
        }
        Ok(events)
    }

    fn present(&mut self, frame: &Frame<'_>) -> Result<(), FrontendError> {
        if self.title != frame.title {
            self.window.set_title(frame.title);
            self.title = frame.title.to_string();
        }

        let size = frame.pixels.dimensions();
        if size != self.image_size {
            self.image_size = size;
            if let Some(granted) = self.window.request_inner_size(PhysicalSize::new(size.0, size.1)) {
                self.gpu.resize(granted.width, granted.height);
            }
        }

        self.pipeline
            .upload(&self.gpu, frame.pixels.as_raw(), size.0, size.1);
        self.draw()
    }
}

impl NativeFrontend {
    fn draw(&mut self) -> Result<(), FrontendError> {
        match self.pipeline.render(&self.gpu) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.gpu.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                Ok(())
            }
            Err(e) => Err(FrontendError::Render(e.to_string())),
        }
    }
}

/// Translate a logical key into a frontend-independent key press.
fn key_input(key: &Key) -> Option<KeyInput> {
    match key {
        Key::Named(NamedKey::Backspace) => Some(KeyInput::Backspace),
        Key::Named(NamedKey::Escape) => Some(KeyInput::Escape),
        Key::Named(NamedKey::Enter) => Some(KeyInput::Enter),
        Key::Character(text) => text.chars().next().map(KeyInput::Char),
        _ => None,
    }
}

/// Scale a window position to a pixel of the image stretched over the window.
pub fn to_image_point(position: PhysicalPosition<f64>, surface: (u32, u32), image: (u32, u32)) -> Point {
    let scale = |pos: f64, surface: u32, image: u32| -> i32 {
        let surface = f64::from(surface.max(1));
        (pos * f64::from(image) / surface).floor() as i32
    };
    Point::new(
        scale(position.x, surface.0, image.0),
        scale(position.y, surface.1, image.1),
    )
}
