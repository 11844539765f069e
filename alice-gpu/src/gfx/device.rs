//! wgpu device/surface lifecycle and the real [`GpuBackend`].
//!
//! WgpuBackend owns the device, queue, surface and config. Each frame it
//! acquires the swapchain texture, opens one encoder and one render pass
//! cleared to the configured color, and keeps both open until the module's
//! per-frame export returns.

use std::borrow::Cow;
use std::sync::Arc;

use alice_core::codec::VertexFormat;
use alice_core::Rect;
use wgpu::{
    Backends, Device, DeviceDescriptor, Instance, InstanceDescriptor, PowerPreference, Queue,
    RequestAdapterOptions, Surface, SurfaceConfiguration, SurfaceTarget, TextureUsages,
    TextureViewDescriptor,
};

use super::convert;
use super::pipeline::CanvasLayout;
use crate::backend::{BackendError, BufferDesc, DrawCall, GpuBackend, SamplerDesc, TextureDesc};
use crate::shader::ValidatedShader;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    /// RGBA, 0.0..=1.0.
    pub clear_color: [f64; 4],
    pub high_performance: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            high_performance: true,
        }
    }
}

pub struct WgpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct WgpuPipeline {
    pipeline: wgpu::RenderPipeline,
}

pub struct WgpuFrame {
    // Declared first so the pass is dropped before its encoder.
    pass: wgpu::RenderPass<'static>,
    encoder: wgpu::CommandEncoder,
    output: wgpu::SurfaceTexture,
}

/// Owns all GPU state. Created once per window.
pub struct WgpuBackend {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    layout: CanvasLayout,
    clear: wgpu::Color,
}

impl WgpuBackend {
    /// Initialize wgpu against a window. Blocks until the adapter is ready.
    pub fn new(
        window: impl Into<SurfaceTarget<'static>>,
        size: (u32, u32),
        options: SurfaceOptions,
    ) -> Result<Self, BackendError> {
        let width = size.0.max(1);
        let height = size.1.max(1);

        let instance = Instance::new(&InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let power_preference = if options.high_performance {
            PowerPreference::HighPerformance
        } else {
            PowerPreference::LowPower
        };

        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| BackendError::NoAdapter(e.to_string()))?;

        tracing::info!(
            "GPU adapter: {} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            label: Some("alice-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))?;

        // Validation failures the naga pre-check cannot see (binding sizes,
        // buffer usage) land here instead of aborting the process.
        device.on_uncaptured_error(Arc::new(|error| {
            tracing::error!(target: "alice::bridge", "wgpu: {error}");
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        // Module shaders emit linear values; prefer a non-sRGB target.
        let format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(BackendError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let layout = CanvasLayout::new(&device);
        let [r, g, b, a] = options.clear_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            layout,
            clear: wgpu::Color { r, g, b, a },
        })
    }

    /// Handle window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }
}

impl GpuBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Texture = WgpuTexture;
    type Sampler = wgpu::Sampler;
    type Shader = wgpu::ShaderModule;
    type Pipeline = WgpuPipeline;
    type Frame = WgpuFrame;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<wgpu::Buffer, BackendError> {
        // Static and dynamic buffers get the same usage set.
        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("module-buffer"),
            size: wgpu::util::align_to(desc.size, wgpu::COPY_BUFFER_ALIGNMENT),
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::INDEX
                | wgpu::BufferUsages::UNIFORM
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }))
    }

    fn write_buffer(&mut self, buffer: &mut wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<WgpuTexture, BackendError> {
        let limit = self.device.limits().max_texture_dimension_2d;
        if desc.width > limit || desc.height > limit {
            return Err(BackendError::Unsupported(format!(
                "{}x{} exceeds the device limit of {limit}",
                desc.width, desc.height
            )));
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("module-texture"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert::texture_format(desc.format),
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());
        Ok(WgpuTexture { texture, view })
    }

    fn write_texture(
        &mut self,
        texture: &mut WgpuTexture,
        region: Rect,
        bytes_per_pixel: u32,
        data: &[u8],
    ) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x0,
                    y: region.y0,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(region.width() * bytes_per_pixel),
                rows_per_image: Some(region.height()),
            },
            wgpu::Extent3d {
                width: region.width(),
                height: region.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<wgpu::Sampler, BackendError> {
        Ok(self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("module-sampler"),
            mag_filter: convert::filter_mode(desc.mag_filter),
            min_filter: convert::filter_mode(desc.min_filter),
            ..Default::default()
        }))
    }

    fn create_shader(&mut self, shader: &ValidatedShader) -> Result<wgpu::ShaderModule, BackendError> {
        Ok(self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("module-shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shader.source.clone())),
        }))
    }

    fn create_pipeline(
        &mut self,
        shader: &wgpu::ShaderModule,
        vertex_format: &VertexFormat,
    ) -> Result<WgpuPipeline, BackendError> {
        let attributes = convert::vertex_attributes(vertex_format)?;
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.layout.pipeline(
            &self.device,
            shader,
            vertex_format.stride as u64,
            &attributes,
            self.config.format,
        );
        // An invalid pipeline would poison every pass it is set on.
        if let Some(error) = pollster::block_on(scope.pop()) {
            return Err(BackendError::Unsupported(error.to_string()));
        }
        Ok(WgpuPipeline { pipeline })
    }

    fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    fn extent(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn begin_frame(&mut self) -> Result<Option<WgpuFrame>, BackendError> {
        let output = match self.surface.get_current_texture() {
            Ok(tex) => tex,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(BackendError::OutOfMemory),
            Err(e) => {
                tracing::warn!("Surface error: {:?}", e);
                return Ok(None);
            }
        };

        let view = output
            .texture
            .create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("canvas-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        Ok(Some(WgpuFrame {
            pass,
            encoder,
            output,
        }))
    }

    fn draw(&mut self, frame: &mut WgpuFrame, call: DrawCall<'_, Self>) {
        // No depth attachment exists; depth_test is accepted and ignored.
        let bind_group = self.layout.bind_group(
            &self.device,
            &call.texture.view,
            call.sampler,
            call.constant_buffer,
        );

        let pass = &mut frame.pass;
        let vp = call.viewport;
        pass.set_viewport(
            vp.x0 as f32,
            vp.y0 as f32,
            vp.width() as f32,
            vp.height() as f32,
            0.0,
            1.0,
        );
        let clip = call.scissor;
        pass.set_scissor_rect(clip.x0, clip.y0, clip.width(), clip.height());
        pass.set_pipeline(&call.pipeline.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, call.vertex_buffer.slice(..));
        pass.set_index_buffer(call.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(call.indices, 0, 0..1);
    }

    fn submit_frame(&mut self, frame: WgpuFrame) {
        let WgpuFrame {
            pass,
            encoder,
            output,
        } = frame;
        drop(pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
