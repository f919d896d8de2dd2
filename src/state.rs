use crate::animator::{FrameOutcome, ParticleAnimator};
use crate::canvas::PixelCanvas;
use crate::render::Render;
use crate::scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
use crate::{Profile, SimulationConfig, Viewport};
use anyhow::{anyhow, Context, Result};
use rand::{rngs::SmallRng, SeedableRng};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
  dpi::{LogicalSize, PhysicalSize},
  event::{ElementState, Event, KeyEvent, StartCause, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  keyboard::{KeyCode, PhysicalKey},
  window::{Window, WindowBuilder},
};

/// Spacing of host callbacks in headless mode (~60 Hz).
const HEADLESS_FRAME: Duration = Duration::from_micros(16_667);

#[derive(Clone, Debug)]
pub struct RunOptions {
  /// Window size, or the simulated viewport when headless.
  pub viewport: Viewport,
  pub profile: Option<Profile>,
  pub count: Option<usize>,
  pub seed: Option<u64>,
  pub headless: bool,
  /// Host callbacks to deliver before a headless run ends.
  pub frames: Option<u64>,
}

impl RunOptions {
  /// Configuration for a mount at `viewport_width`, with any overrides applied.
  pub fn config_for(&self, viewport_width: u32) -> SimulationConfig {
    let mut config = match self.profile {
      Some(profile) => profile.config(),
      None => SimulationConfig::for_viewport_width(viewport_width),
    };
    if let Some(count) = self.count {
      config.count = count;
    }
    config
  }

  fn rng(&self) -> SmallRng {
    match self.seed {
      Some(seed) => SmallRng::seed_from_u64(seed),
      None => SmallRng::from_entropy(),
    }
  }
}

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  fn new(title: &str, viewport: Viewport) -> Result<Self> {
    let event_loop = EventLoop::new().context("creating event loop")?;
    let window = WindowBuilder::new()
      .with_title(title)
      .with_inner_size(LogicalSize::new(viewport.width, viewport.height))
      .build(&event_loop)
      .context("creating window")?;
    Ok(Self {
      event_loop,
      window: Arc::new(window),
    })
  }
}

/// Frame scheduler backed by the window's redraw requests.
struct WindowScheduler {
  window: Arc<Window>,
  next_id: u64,
  pending: Option<FrameHandle>,
}

impl WindowScheduler {
  fn new(window: Arc<Window>) -> Self {
    Self {
      window,
      next_id: 0,
      pending: None,
    }
  }

  fn take_pending(&mut self) -> Option<FrameHandle> {
    self.pending.take()
  }
}

impl FrameScheduler for WindowScheduler {
  fn request_frame(&mut self) -> FrameHandle {
    self.next_id += 1;
    let handle = FrameHandle::new(self.next_id);
    self.pending = Some(handle);
    self.window.request_redraw();
    handle
  }

  fn cancel_frame(&mut self, handle: FrameHandle) {
    if self.pending == Some(handle) {
      self.pending = None;
    }
  }
}

struct GpuContext {
  adapter: wgpu::Adapter,
  device: wgpu::Device,
  queue: wgpu::Queue,
}

impl GpuContext {
  async fn init(instance: &wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<Self> {
    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(surface),
        force_fallback_adapter: false,
      })
      .await
      .context("no compatible GPU adapter")?;

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await
      .context("requesting GPU device")?;

    Ok(Self {
      adapter,
      device,
      queue,
    })
  }
}

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn configure(
    context: &GpuContext,
    surface: wgpu::Surface<'static>,
    size: PhysicalSize<u32>,
  ) -> Result<Self> {
    let mut config = surface
      .get_default_config(&context.adapter, size.width.max(1), size.height.max(1))
      .context("window surface not supported by the adapter")?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&context.device, &config);
    Ok(Self { surface, config })
  }

  fn resize(&mut self, context: &GpuContext, size: PhysicalSize<u32>) {
    if size.width == 0 || size.height == 0 {
      return;
    }
    self.config.width = size.width;
    self.config.height = size.height;
    self.surface.configure(&context.device, &self.config);
  }

  /// Next texture to draw into, or `None` when the frame should be skipped.
  ///
  /// Only running out of memory is an error; a surface that stays outdated
  /// after reconfiguring (a minimised window, say) just skips frames.
  fn acquire(&mut self, context: &GpuContext) -> Result<Option<wgpu::SurfaceTexture>> {
    let err = match self.surface.get_current_texture() {
      Ok(frame) => return Ok(Some(frame)),
      Err(err) => err,
    };
    let err = match err {
      wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost => {
        self.surface.configure(&context.device, &self.config);
        match self.surface.get_current_texture() {
          Ok(frame) => return Ok(Some(frame)),
          Err(err) => err,
        }
      }
      err => err,
    };
    if skips_frame(&err) {
      log::warn!("surface texture unavailable ({err}), skipping frame");
      Ok(None)
    } else {
      Err(anyhow!("acquiring surface texture: {err}"))
    }
  }
}

/// Whether a surface error only costs the current frame.
fn skips_frame(err: &wgpu::SurfaceError) -> bool {
  matches!(
    err,
    wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost
  )
}

/// Puts the canvas on screen.
struct Presenter {
  context: GpuContext,
  surface: SurfaceWrapper,
  render: Render,
}

impl Presenter {
  async fn new(window: Arc<Window>) -> Result<Self> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    let size = window.inner_size();
    let surface = instance
      .create_surface(window)
      .context("creating window surface")?;
    let context = GpuContext::init(&instance, &surface).await?;
    let surface = SurfaceWrapper::configure(&context, surface, size)?;
    let render = Render::init(&surface.config, &context.device);
    Ok(Self {
      context,
      surface,
      render,
    })
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    self.surface.resize(&self.context, size);
  }

  fn present(&mut self, canvas: &PixelCanvas) -> Result<()> {
    let Some(frame) = self.surface.acquire(&self.context)? else {
      return Ok(());
    };
    let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
      format: Some(self.surface.config.view_formats[0]),
      ..wgpu::TextureViewDescriptor::default()
    });
    self
      .render
      .render(&view, &self.context.device, &self.context.queue, canvas);
    frame.present();
    Ok(())
  }
}

fn logical_viewport(window: &Window) -> Viewport {
  let size: LogicalSize<u32> = window.inner_size().to_logical(window.scale_factor());
  Viewport::new(size.width, size.height)
}

fn elapsed_ms(since: Instant) -> f64 {
  since.elapsed().as_secs_f64() * 1000.0
}

async fn start(options: RunOptions) -> Result<()> {
  let window_loop = EventLoopWrapper::new("Particle Field", options.viewport)?;
  let window = window_loop.window.clone();
  let mut presenter = match Presenter::new(window.clone()).await {
    Ok(presenter) => Some(presenter),
    Err(err) => {
      log::warn!("drawing context unavailable, nothing will be shown: {err:#}");
      None
    }
  };

  let mut rng = options.rng();
  let mut canvas = PixelCanvas::default();
  let mut animator: Option<ParticleAnimator<WindowScheduler>> = None;
  let launched = Instant::now();
  let fatal = Rc::new(Cell::new(None));
  let fatal_in_loop = fatal.clone();

  window_loop.event_loop.run(
    move |event, target: &EventLoopWindowTarget<()>| match event {
      Event::NewEvents(StartCause::Init) => {
        let viewport = logical_viewport(&window);
        animator = Some(ParticleAnimator::start_with_config(
          options.config_for(viewport.width),
          viewport,
          WindowScheduler::new(window.clone()),
          &mut rng,
          &mut canvas,
        ));
      }
      Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
        WindowEvent::CloseRequested
        | WindowEvent::KeyboardInput {
          event:
            KeyEvent {
              state: ElementState::Pressed,
              physical_key: PhysicalKey::Code(KeyCode::Escape),
              ..
            },
          ..
        } => {
          if let Some(animator) = animator.as_mut() {
            animator.stop();
          }
          target.exit();
        }
        WindowEvent::Resized(size) => {
          if let Some(presenter) = presenter.as_mut() {
            presenter.resize(size);
          }
          if let Some(animator) = animator.as_mut() {
            animator.resize(logical_viewport(&window), &mut canvas);
          }
        }
        WindowEvent::RedrawRequested => {
          let Some(animator) = animator.as_mut() else {
            return;
          };
          let Some(handle) = animator.scheduler_mut().take_pending() else {
            return;
          };
          let outcome = animator.on_frame(handle, elapsed_ms(launched), &mut canvas);
          if let (FrameOutcome::Stepped { .. }, Some(presenter)) = (outcome, presenter.as_mut()) {
            if let Err(err) = presenter.present(&canvas) {
              animator.stop();
              fatal_in_loop.set(Some(err));
              target.exit();
            }
          }
        }
        _ => {}
      },
      Event::LoopExiting => {
        if let Some(animator) = animator.as_mut() {
          animator.stop();
        }
      }
      _ => {}
    },
  )?;

  match fatal.take() {
    Some(err) => Err(err),
    None => Ok(()),
  }
}

fn run_headless(options: &RunOptions) -> Result<()> {
  let interrupted = Arc::new(AtomicBool::new(false));
  {
    let interrupted = interrupted.clone();
    ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
      .context("installing Ctrl-C handler")?;
  }

  let mut rng = options.rng();
  let mut canvas = PixelCanvas::default();
  let mut animator = ParticleAnimator::start_with_config(
    options.config_for(options.viewport.width),
    options.viewport,
    ManualScheduler::new(),
    &mut rng,
    &mut canvas,
  );

  let launched = Instant::now();
  let mut delivered = 0u64;
  let mut last_links = 0;
  while !interrupted.load(Ordering::SeqCst) && options.frames.map_or(true, |n| delivered < n) {
    let Some(handle) = animator.scheduler_mut().take_pending() else {
      break;
    };
    if let FrameOutcome::Stepped { links } =
      animator.on_frame(handle, elapsed_ms(launched), &mut canvas)
    {
      last_links = links;
      let stepped = animator.stats().stepped;
      if stepped % 30 == 0 {
        log::info!("step {stepped}: {links} links");
      }
    }
    delivered += 1;
    std::thread::sleep(HEADLESS_FRAME);
  }

  let stats = animator.stats();
  animator.stop();
  println!(
    "{delivered} callbacks, {} steps, {} throttled, {last_links} links in the last frame",
    stats.stepped, stats.throttled
  );
  Ok(())
}

pub fn run(options: RunOptions) -> Result<()> {
  if options.headless {
    run_headless(&options)
  } else {
    pollster::block_on(start(options))
  }
}
