use crate::canvas::PixelCanvas;
use crate::surface::DrawSurface;
use std::borrow::Cow;

/// Texture holding the latest canvas upload.
struct CanvasTexture {
  texture: wgpu::Texture,
  bind_group: wgpu::BindGroup,
  width: u32,
  height: u32,
}

/// Blits a [`PixelCanvas`] onto the window surface, stretched to fill it.
pub struct Render {
  render_pipeline: wgpu::RenderPipeline,
  bind_group_layout: wgpu::BindGroupLayout,
  sampler: wgpu::Sampler,
  canvas_texture: Option<CanvasTexture>,
}

impl Render {
  #[must_use]
  pub fn init(config: &wgpu::SurfaceConfiguration, device: &wgpu::Device) -> Self {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("present"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/present.wgsl"))),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      label: Some("canvas_bind_group_layout"),
      entries: &[
        wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::FRAGMENT,
          ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 1,
          visibility: wgpu::ShaderStages::FRAGMENT,
          ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
          count: None,
        },
      ],
    });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[&bind_group_layout],
      push_constant_ranges: &[],
    });
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Render Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &shader,
        entry_point: "main_vs",
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        buffers: &[],
      },
      fragment: Some(wgpu::FragmentState {
        module: &shader,
        entry_point: "main_fs",
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        targets: &[Some(config.view_formats[0].into())],
      }),
      primitive: wgpu::PrimitiveState::default(),
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
      label: Some("canvas_sampler"),
      mag_filter: wgpu::FilterMode::Linear,
      min_filter: wgpu::FilterMode::Linear,
      ..Default::default()
    });

    Render {
      render_pipeline,
      bind_group_layout,
      sampler,
      canvas_texture: None,
    }
  }

  fn ensure_canvas_texture(&mut self, device: &wgpu::Device, width: u32, height: u32) {
    let stale = self
      .canvas_texture
      .as_ref()
      .map_or(true, |t| (t.width, t.height) != (width, height));
    if stale {
      log::debug!("allocating {width}x{height} canvas texture");
      let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Canvas Texture"),
        size: wgpu::Extent3d {
          width,
          height,
          depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
      });
      let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
      let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("canvas_bind_group"),
        layout: &self.bind_group_layout,
        entries: &[
          wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(&view),
          },
          wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
          },
        ],
      });
      self.canvas_texture = Some(CanvasTexture {
        texture,
        bind_group,
        width,
        height,
      });
    }
  }

  pub fn render(
    &mut self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    canvas: &PixelCanvas,
  ) {
    let (width, height) = canvas.size();
    if width == 0 || height == 0 {
      return;
    }
    self.ensure_canvas_texture(device, width, height);
    let Some(canvas_texture) = self.canvas_texture.as_ref() else {
      return;
    };
    let size = wgpu::Extent3d {
      width,
      height,
      depth_or_array_layers: 1,
    };
    queue.write_texture(
      wgpu::ImageCopyTexture {
        texture: &canvas_texture.texture,
        mip_level: 0,
        origin: wgpu::Origin3d::ZERO,
        aspect: wgpu::TextureAspect::All,
      },
      canvas.as_bytes(),
      wgpu::ImageDataLayout {
        offset: 0,
        bytes_per_row: Some(4 * width),
        rows_per_image: Some(height),
      },
      size,
    );

    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      rpass.set_pipeline(&self.render_pipeline);
      rpass.set_bind_group(0, &canvas_texture.bind_group, &[]);
      rpass.draw(0..3, 0..1);
    }
    queue.submit(Some(command_encoder.finish()));
  }
}
