use anyhow::{anyhow, bail, Context as _, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;

/// Instance, device and swapchain for the gallery window.
pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub surface_format: wgpu::TextureFormat,
    /// Largest square the device can render; bounds the slot resolution.
    pub max_texture_dimension: u32,
}

impl GpuContext {
    pub(crate) fn new<T>(window: &T, window_size: PhysicalSize<u32>) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });
        let surface = create_window_surface(&instance, window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no GPU adapter can present to the gallery window")?;
        let info = adapter.get_info();
        info!(adapter = %info.name, backend = ?info.backend, "using GPU adapter");

        let limits = adapter.limits();
        let max_texture_dimension = limits.max_texture_dimension_2d;
        let size = PhysicalSize::new(window_size.width.max(1), window_size.height.max(1));
        if size.width > max_texture_dimension || size.height > max_texture_dimension {
            bail!(
                "window {}x{} exceeds the GPU texture limit of {max_texture_dimension}",
                size.width,
                size.height
            );
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("filtrandmill device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("GPU adapter refused to open a device")?;

        let capabilities = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&capabilities.formats)
            .ok_or_else(|| anyhow!("gallery surface supports no texture formats"))?;
        if surface_format.is_srgb() {
            warn!(?surface_format, "only sRGB surface formats available; tiles will look brighter");
        }
        let present_mode = choose_present_mode(&capabilities.present_modes);
        let alpha_mode = capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        debug!(?surface_format, ?present_mode, ?alpha_mode, "configuring gallery surface");

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: Vec::new(),
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            surface_config,
            size,
            surface_format,
            max_texture_dimension,
        })
    }

    /// Reconfigures the swapchain; a minimised (zero-sized) window is ignored.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(&self.device, &self.surface_config);
    }
}

fn create_window_surface<T>(instance: &wgpu::Instance, window: &T) -> Result<wgpu::Surface<'static>>
where
    T: HasDisplayHandle + HasWindowHandle,
{
    let raw_display_handle = window
        .display_handle()
        .map_err(|err| anyhow!("gallery window has no display handle: {err}"))?
        .as_raw();
    let raw_window_handle = window
        .window_handle()
        .map_err(|err| anyhow!("gallery window has no window handle: {err}"))?
        .as_raw();

    // The window outlives the surface: both are owned by the event loop state.
    unsafe {
        instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
            raw_display_handle,
            raw_window_handle,
        })
    }
    .context("failed to create the gallery surface")
}

/// Slot texels are already display-encoded, so a linear format is preferred.
fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first().copied())
}

fn choose_present_mode(modes: &[wgpu::PresentMode]) -> wgpu::PresentMode {
    if modes.contains(&wgpu::PresentMode::Fifo) {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::AutoVsync
    }
}
