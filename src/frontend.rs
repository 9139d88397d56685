#![doc = r#"
Windowed frontend (feature `display`).

One emulated frame per redraw, paced to NTSC field rate. The frame buffer is
copied into a `pixels` surface scaled by `Config::window_scale`.

Keys
- L / K: A / B
- Backspace / Enter: Select / Start
- W A S D: D-pad
- F5 / F9: save / load the configured state slot
- Escape: quit
"#]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::Config;
use crate::controller::Button;
use crate::nes::Nes;
use crate::ppu::{FrameBuffer, NES_HEIGHT, NES_WIDTH};

const FRAME_TIME: Duration = Duration::from_nanos(16_639_267);

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation failed: {0}")]
    Os(#[from] winit::error::OsError),
    #[error("pixel surface error: {0}")]
    Pixels(#[from] pixels::Error),
}

fn button_for(key: KeyCode) -> Option<Button> {
    Some(match key {
        KeyCode::KeyL => Button::A,
        KeyCode::KeyK => Button::B,
        KeyCode::Backspace => Button::Select,
        KeyCode::Enter => Button::Start,
        KeyCode::KeyW => Button::Up,
        KeyCode::KeyS => Button::Down,
        KeyCode::KeyA => Button::Left,
        KeyCode::KeyD => Button::Right,
        _ => return None,
    })
}

struct App {
    nes: Nes<FrameBuffer>,
    config: Config,
    state_dir: PathBuf,

    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    buttons: u8,
    frame: u64,
    next_frame: Instant,
    error: Option<FrontendError>,
}

impl App {
    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<(), FrontendError> {
        let scale = self.config.window_scale.max(1);
        let size = LogicalSize::new(NES_WIDTH as u32 * scale, NES_HEIGHT as u32 * scale);
        let attrs = Window::default_attributes()
            .with_title("famicore")
            .with_inner_size(size)
            .with_min_inner_size(LogicalSize::new(NES_WIDTH as u32, NES_HEIGHT as u32));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let inner = window.inner_size();
        let surface = SurfaceTexture::new(inner.width, inner.height, Arc::clone(&window));
        let pixels = Pixels::new(NES_WIDTH as u32, NES_HEIGHT as u32, surface)?;

        self.window = Some(window);
        self.pixels = Some(pixels);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: FrontendError) {
        error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn on_key(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        if let Some(button) = button_for(code) {
            if pressed {
                self.buttons |= button.mask();
            } else {
                self.buttons &= !button.mask();
            }
            return;
        }

        if !pressed || event.repeat {
            return;
        }
        let slot = self.config.state_slot;
        let result = match code {
            KeyCode::F5 => self.nes.save_state_slot(&self.state_dir, slot),
            KeyCode::F9 => self.nes.load_state_slot(&self.state_dir, slot),
            _ => return,
        };
        if let Err(e) = result {
            error!("save state slot {slot}: {e}");
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let render = self.config.should_render(self.frame);
        self.nes.set_controller(0, self.buttons);
        self.nes.run_frame(render);
        self.frame += 1;

        if !render {
            return;
        }
        let Some(pixels) = self.pixels.as_mut() else {
            return;
        };
        self.nes.sink().copy_to(pixels.frame_mut());
        if let Err(e) = pixels.render() {
            self.fail(event_loop, e.into());
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_surface(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(pixels) = self.pixels.as_mut() {
                    if let Err(e) = pixels.resize_surface(size.width, size.height) {
                        error!("resize failed: {e}");
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                } else {
                    self.on_key(&event);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame {
            self.next_frame = (self.next_frame + FRAME_TIME).max(now);
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

/// Open a window and run until it is closed.
pub fn run(nes: Nes<FrameBuffer>, config: Config, state_dir: PathBuf) -> Result<(), FrontendError> {
    let event_loop = EventLoop::new()?;
    let mut app = App {
        nes,
        config,
        state_dir,
        window: None,
        pixels: None,
        buttons: 0,
        frame: 0,
        next_frame: Instant::now(),
        error: None,
    };
    info!("starting display frontend");
    event_loop.run_app(&mut app)?;
    app.error.map_or(Ok(()), Err)
}
