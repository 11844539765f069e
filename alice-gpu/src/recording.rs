//! Headless backend that records every call instead of touching a device.
//!
//! Used by the integration tests and by `alice-host --headless`. Objects are
//! plain ids plus the bytes written into them, so tests can check both what
//! was issued and what a module uploaded.

use std::ops::Range;

use alice_core::codec::VertexFormat;
use alice_core::formats::TextureFormat;
use alice_core::Rect;

use crate::backend::{BackendError, BufferDesc, DrawCall, GpuBackend, SamplerDesc, TextureDesc};
use crate::gfx::convert;
use crate::shader::ValidatedShader;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer { id: u32, size: u64 },
    WriteBuffer { id: u32, offset: u64, len: usize },
    CreateTexture { id: u32, format: TextureFormat, width: u32, height: u32 },
    WriteTexture { id: u32, region: Rect, len: usize },
    CreateSampler { id: u32 },
    CreateShader { id: u32, entry_points: usize },
    CreatePipeline { id: u32, shader: u32, stride: u16, attributes: usize },
    BeginFrame { frame: u64 },
    Draw(RecordedDraw),
    Submit { frame: u64, draws: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub pipeline: u32,
    pub constant_buffer: u32,
    pub vertex_buffer: u32,
    pub index_buffer: u32,
    pub texture: u32,
    pub sampler: u32,
    pub indices: Range<u32>,
    pub depth_test: bool,
    pub viewport: Rect,
    pub scissor: Rect,
}

#[derive(Debug)]
pub struct RecordedBuffer {
    pub id: u32,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct RecordedTexture {
    pub id: u32,
    pub width: u32,
    pub bytes_per_pixel: u32,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct RecordedObject {
    pub id: u32,
}

#[derive(Debug)]
pub struct RecordedFrame {
    pub frame: u64,
    pub draws: usize,
}

#[derive(Debug)]
pub struct RecordingBackend {
    width: u32,
    height: u32,
    next_id: u32,
    frames: u64,
    lose_next_frame: bool,
    commands: Vec<Command>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_id: 0,
            frames: 0,
            lose_next_frame: false,
            commands: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// The next `begin_frame` finds no target image, as with a lost surface.
    pub fn lose_next_frame(&mut self) {
        self.lose_next_frame = true;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn submitted_frames(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Submit { .. }))
            .count()
    }

    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl GpuBackend for RecordingBackend {
    type Buffer = RecordedBuffer;
    type Texture = RecordedTexture;
    type Sampler = RecordedObject;
    type Shader = RecordedObject;
    type Pipeline = RecordedObject;
    type Frame = RecordedFrame;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<RecordedBuffer, BackendError> {
        if desc.size > self.limits().max_buffer_size {
            return Err(BackendError::Unsupported(format!(
                "{} bytes exceeds the buffer limit",
                desc.size
            )));
        }
        let len = usize::try_from(desc.size).map_err(|_| BackendError::OutOfMemory)?;
        let id = self.id();
        self.commands.push(Command::CreateBuffer { id, size: desc.size });
        Ok(RecordedBuffer {
            id,
            bytes: vec![0; len],
        })
    }

    fn write_buffer(&mut self, buffer: &mut RecordedBuffer, offset: u64, data: &[u8]) {
        let start = offset as usize;
        buffer.bytes[start..start + data.len()].copy_from_slice(data);
        self.commands.push(Command::WriteBuffer {
            id: buffer.id,
            offset,
            len: data.len(),
        });
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<RecordedTexture, BackendError> {
        let bpp = desc.format.bytes_per_pixel();
        let limit = self.limits().max_texture_dimension_2d;
        if desc.width > limit || desc.height > limit {
            return Err(BackendError::Unsupported(format!(
                "{}x{} exceeds the dimension limit of {limit}",
                desc.width, desc.height
            )));
        }
        let len = (desc.width as u64)
            .checked_mul(desc.height as u64)
            .and_then(|pixels| pixels.checked_mul(bpp as u64))
            .and_then(|len| usize::try_from(len).ok())
            .ok_or(BackendError::OutOfMemory)?;
        let id = self.id();
        self.commands.push(Command::CreateTexture {
            id,
            format: desc.format,
            width: desc.width,
            height: desc.height,
        });
        Ok(RecordedTexture {
            id,
            width: desc.width,
            bytes_per_pixel: bpp,
            bytes: vec![0; len],
        })
    }

    fn write_texture(
        &mut self,
        texture: &mut RecordedTexture,
        region: Rect,
        bytes_per_pixel: u32,
        data: &[u8],
    ) {
        let row = region.width() as usize * bytes_per_pixel as usize;
        let pitch = texture.width as usize * texture.bytes_per_pixel as usize;
        let left = region.x0 as usize * bytes_per_pixel as usize;
        for (y, src) in data.chunks_exact(row).enumerate() {
            let start = (region.y0 as usize + y) * pitch + left;
            texture.bytes[start..start + row].copy_from_slice(src);
        }
        self.commands.push(Command::WriteTexture {
            id: texture.id,
            region,
            len: data.len(),
        });
    }

    fn create_sampler(&mut self, _desc: &SamplerDesc) -> Result<RecordedObject, BackendError> {
        let id = self.id();
        self.commands.push(Command::CreateSampler { id });
        Ok(RecordedObject { id })
    }

    fn create_shader(&mut self, shader: &ValidatedShader) -> Result<RecordedObject, BackendError> {
        let id = self.id();
        self.commands.push(Command::CreateShader {
            id,
            entry_points: shader.entry_points.len(),
        });
        Ok(RecordedObject { id })
    }

    fn create_pipeline(
        &mut self,
        shader: &RecordedObject,
        vertex_format: &VertexFormat,
    ) -> Result<RecordedObject, BackendError> {
        // Same fetch-format rules as the device.
        convert::vertex_attributes(vertex_format)?;
        let id = self.id();
        self.commands.push(Command::CreatePipeline {
            id,
            shader: shader.id,
            stride: vertex_format.stride,
            attributes: vertex_format.attributes.len(),
        });
        Ok(RecordedObject { id })
    }

    fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self) -> Result<Option<RecordedFrame>, BackendError> {
        if std::mem::take(&mut self.lose_next_frame) {
            return Ok(None);
        }
        self.frames += 1;
        self.commands.push(Command::BeginFrame { frame: self.frames });
        Ok(Some(RecordedFrame {
            frame: self.frames,
            draws: 0,
        }))
    }

    fn draw(&mut self, frame: &mut RecordedFrame, call: DrawCall<'_, Self>) {
        frame.draws += 1;
        self.commands.push(Command::Draw(RecordedDraw {
            pipeline: call.pipeline.id,
            constant_buffer: call.constant_buffer.id,
            vertex_buffer: call.vertex_buffer.id,
            index_buffer: call.index_buffer.id,
            texture: call.texture.id,
            sampler: call.sampler.id,
            indices: call.indices,
            depth_test: call.depth_test,
            viewport: call.viewport,
            scissor: call.scissor,
        }));
    }

    fn submit_frame(&mut self, frame: RecordedFrame) {
        self.commands.push(Command::Submit {
            frame: frame.frame,
            draws: frame.draws,
        });
    }
}
