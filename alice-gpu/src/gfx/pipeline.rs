// alice-gpu/src/gfx/pipeline.rs
//! Render pipeline construction for module shaders.
//!
//! Every module pipeline shares one bind group layout:
//!   binding 0: 2D float texture, fragment stage
//!   binding 1: filtering sampler, fragment stage
//!   binding 2: uniform (constant) buffer, vertex stage
//! and draws triangle lists with premultiplied-alpha blending into the
//! surface format. Bind groups are built per draw from the draw's handles.

use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, PipelineLayout, RenderPipeline, Sampler};

use crate::shader::{FRAGMENT_ENTRY, VERTEX_ENTRY};

// ════════════════════════════════════════════════════════════════════
// Shared Layout
// ════════════════════════════════════════════════════════════════════

pub struct CanvasLayout {
    pub bind_group_layout: BindGroupLayout,
    pub pipeline_layout: PipelineLayout,
}

impl CanvasLayout {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("canvas-bgl"),
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
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("canvas-pl"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Self {
            bind_group_layout,
            pipeline_layout,
        }
    }

    pub fn bind_group(
        &self,
        device: &Device,
        texture: &wgpu::TextureView,
        sampler: &Sampler,
        constants: &Buffer,
    ) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("canvas-draw-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: constants.as_entire_binding(),
                },
            ],
        })
    }

    /// Build a pipeline from a shader module exposing `vs_main`/`fs_main`.
    pub fn pipeline(
        &self,
        device: &Device,
        shader: &wgpu::ShaderModule,
        stride: u64,
        attributes: &[wgpu::VertexAttribute],
        target: wgpu::TextureFormat,
    ) -> RenderPipeline {
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("canvas-pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            cache: None,
            multiview_mask: None,
        })
    }
}
