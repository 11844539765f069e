//! Resource operations.
//!
//! `Bridge` owns the backend and the handle table. Every module-facing
//! operation resolves handles through the table, validates ranges against
//! the recorded resource metadata and the module's memory view, and only
//! then calls the backend. Errors come back as [`BridgeError`]; the caller
//! decides whether they end the session (`is_fatal`).

use alice_core::codec::{DRAW_COMMAND_SIZE, DrawCommand, VERTEX_ALIGNMENT, VertexFormat};
use alice_core::formats::{BufferMode, FilterMode, TextureFormat};
use alice_core::{
    BridgeError, Handle, HandleTable, LinearMemory, ProtocolError, Rect, ResourceKind, Tagged,
};

use crate::backend::{BufferDesc, DrawCall, GpuBackend, SamplerDesc, TextureDesc};
use crate::frame::{FrameStats, OpenFrame};
use crate::shader::{self, EntryPoint};

/// Queue copies must start and end on 4-byte boundaries.
pub const COPY_ALIGNMENT: u64 = 4;

/// Indices are always `u32`.
const INDEX_SIZE: u64 = 4;

// ════════════════════════════════════════════════════════════════════
// Resource entries
// ════════════════════════════════════════════════════════════════════

struct BufferEntry<T> {
    object: T,
    size: u64,
    mode: BufferMode,
}

struct TextureEntry<T> {
    object: T,
    format: TextureFormat,
    width: u32,
    height: u32,
}

struct SamplerEntry<T> {
    object: T,
}

struct ShaderEntry<T> {
    object: T,
    entry_points: Vec<EntryPoint>,
    renderable: bool,
}

struct PipelineEntry<T> {
    object: T,
    stride: u16,
    attributes: usize,
}

/// One live entry in the handle table.
enum Resource<B: GpuBackend> {
    Buffer(BufferEntry<B::Buffer>),
    Texture(TextureEntry<B::Texture>),
    Sampler(SamplerEntry<B::Sampler>),
    Shader(ShaderEntry<B::Shader>),
    Pipeline(PipelineEntry<B::Pipeline>),
}

impl<B: GpuBackend> Tagged for Resource<B> {
    fn kind(&self) -> ResourceKind {
        match self {
            Resource::Buffer(_) => ResourceKind::Buffer,
            Resource::Texture(_) => ResourceKind::Texture,
            Resource::Sampler(_) => ResourceKind::Sampler,
            Resource::Shader(_) => ResourceKind::Shader,
            Resource::Pipeline(_) => ResourceKind::Pipeline,
        }
    }
}

impl<B: GpuBackend> Resource<B> {
    fn as_buffer(&self) -> Option<&BufferEntry<B::Buffer>> {
        match self {
            Resource::Buffer(e) => Some(e),
            _ => None,
        }
    }

    fn as_buffer_mut(&mut self) -> Option<&mut BufferEntry<B::Buffer>> {
        match self {
            Resource::Buffer(e) => Some(e),
            _ => None,
        }
    }

    fn as_texture(&self) -> Option<&TextureEntry<B::Texture>> {
        match self {
            Resource::Texture(e) => Some(e),
            _ => None,
        }
    }

    fn as_texture_mut(&mut self) -> Option<&mut TextureEntry<B::Texture>> {
        match self {
            Resource::Texture(e) => Some(e),
            _ => None,
        }
    }

    fn as_sampler(&self) -> Option<&SamplerEntry<B::Sampler>> {
        match self {
            Resource::Sampler(e) => Some(e),
            _ => None,
        }
    }

    fn as_shader(&self) -> Option<&ShaderEntry<B::Shader>> {
        match self {
            Resource::Shader(e) => Some(e),
            _ => None,
        }
    }

    fn as_pipeline(&self) -> Option<&PipelineEntry<B::Pipeline>> {
        match self {
            Resource::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

fn mismatch(handle: Handle, expected: ResourceKind, actual: ResourceKind) -> BridgeError {
    BridgeError::KindMismatch {
        handle,
        expected,
        actual,
    }
}

/// Typed lookup: `NotFound` for a dead handle, `KindMismatch` for a live
/// handle of another kind.
fn resolve<'t, B: GpuBackend, T>(
    table: &'t HandleTable<Resource<B>>,
    handle: Handle,
    kind: ResourceKind,
    pick: impl FnOnce(&'t Resource<B>) -> Option<&'t T>,
) -> Result<&'t T, BridgeError> {
    let resource = table.lookup(handle)?;
    pick(resource).ok_or_else(|| mismatch(handle, kind, resource.kind()))
}

fn resolve_mut<'t, B: GpuBackend, T>(
    table: &'t mut HandleTable<Resource<B>>,
    handle: Handle,
    kind: ResourceKind,
    pick: impl FnOnce(&'t mut Resource<B>) -> Option<&'t mut T>,
) -> Result<&'t mut T, BridgeError> {
    let resource = table.lookup_mut(handle)?;
    let actual = resource.kind();
    pick(resource).ok_or_else(|| mismatch(handle, kind, actual))
}

fn check_aligned(what: &'static str, value: u64) -> Result<(), ProtocolError> {
    if value % COPY_ALIGNMENT != 0 {
        return Err(ProtocolError::Misaligned {
            what,
            value,
            align: COPY_ALIGNMENT,
        });
    }
    Ok(())
}

/// Layout rules the device enforces at pipeline creation.
fn check_vertex_layout(format: &VertexFormat, limits: &wgpu::Limits) -> Result<(), BridgeError> {
    let reject = |reason: String| Err(BridgeError::rejected(ResourceKind::Pipeline, reason));
    let stride = format.stride;

    if stride % VERTEX_ALIGNMENT != 0 {
        return reject(format!("stride {stride} is not a multiple of {VERTEX_ALIGNMENT}"));
    }
    if stride as u32 > limits.max_vertex_buffer_array_stride {
        return reject(format!(
            "stride {stride} exceeds the limit of {}",
            limits.max_vertex_buffer_array_stride
        ));
    }
    if let Some((index, attribute)) = format.attribute_outside_stride() {
        return reject(format!(
            "attribute {index} ({} at offset {}) overruns stride {stride}",
            attribute.format, attribute.offset
        ));
    }
    if let Some((index, attribute)) = format.misaligned_attribute() {
        return reject(format!(
            "attribute {index} ({}) at misaligned offset {}",
            attribute.format, attribute.offset
        ));
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════
// Bridge
// ════════════════════════════════════════════════════════════════════

/// What happened to one flushed draw that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    Issued,
    /// Viewport or clip was empty after clamping to the target.
    Culled,
}

pub struct Bridge<B: GpuBackend> {
    backend: B,
    limits: wgpu::Limits,
    resources: HandleTable<Resource<B>>,
    frames: u64,
}

impl<B: GpuBackend> Bridge<B> {
    pub fn new(backend: B) -> Self {
        let limits = backend.limits();
        Self {
            backend,
            limits,
            resources: HandleTable::new(),
            frames: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of live resources of `kind`.
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.resources.count(kind)
    }

    pub fn kind_of(&self, handle: Handle) -> Option<ResourceKind> {
        self.resources.lookup(handle).ok().map(Tagged::kind)
    }

    fn destroy_as(&mut self, handle: Handle, kind: ResourceKind) -> Result<(), BridgeError> {
        // Dropping the entry releases the bridge's reference now; the device
        // frees the memory once in-flight work retires.
        drop(self.resources.release_as(handle, kind)?);
        Ok(())
    }

    // ── Buffers ─────────────────────────────────────────────────────

    pub fn buffer_allocate(&mut self, bytes: u32, mode: u32) -> Result<Handle, BridgeError> {
        let mode = BufferMode::from_wire(mode)?;
        if bytes as u64 > self.limits.max_buffer_size {
            return Err(BridgeError::rejected(
                ResourceKind::Buffer,
                format!(
                    "{bytes} bytes exceeds the buffer limit of {}",
                    self.limits.max_buffer_size
                ),
            ));
        }
        let desc = BufferDesc {
            size: bytes as u64,
            mode,
        };
        let object = self
            .backend
            .create_buffer(&desc)
            .map_err(|e| e.into_bridge(ResourceKind::Buffer))?;

        self.resources.allocate(Resource::Buffer(BufferEntry {
            object,
            size: desc.size,
            mode,
        }))
    }

    /// Copy `bytes` bytes from module memory at `data_ptr` into the buffer
    /// at `offset`.
    pub fn buffer_download(
        &mut self,
        handle: Handle,
        offset: u32,
        bytes: u32,
        memory: &LinearMemory<'_>,
        data_ptr: u32,
    ) -> Result<(), BridgeError> {
        let (offset, len) = (offset as u64, bytes as u64);
        check_aligned("buffer download offset", offset)?;
        check_aligned("buffer download length", len)?;

        let entry = resolve_mut(
            &mut self.resources,
            handle,
            ResourceKind::Buffer,
            Resource::as_buffer_mut,
        )?;

        if offset.checked_add(len).is_none_or(|end| end > entry.size) {
            return Err(BridgeError::OutOfBounds {
                offset,
                len,
                size: entry.size,
            });
        }

        let data = memory.read(data_ptr as u64, len)?;
        if data.is_empty() {
            return Ok(());
        }

        tracing::trace!(%handle, offset, len, mode = ?entry.mode, "buffer download");
        self.backend.write_buffer(&mut entry.object, offset, data);
        Ok(())
    }

    pub fn buffer_destroy(&mut self, handle: Handle) -> Result<(), BridgeError> {
        self.destroy_as(handle, ResourceKind::Buffer)
    }

    // ── Textures ────────────────────────────────────────────────────

    pub fn texture_allocate(
        &mut self,
        format: u32,
        width: u32,
        height: u32,
    ) -> Result<Handle, BridgeError> {
        let format = TextureFormat::from_wire(format)?;
        if width == 0 || height == 0 {
            return Err(BridgeError::rejected(
                ResourceKind::Texture,
                format!("zero-sized {width}x{height} texture"),
            ));
        }
        let limit = self.limits.max_texture_dimension_2d;
        if width > limit || height > limit {
            return Err(BridgeError::rejected(
                ResourceKind::Texture,
                format!("{width}x{height} exceeds the dimension limit of {limit}"),
            ));
        }

        let desc = TextureDesc {
            format,
            width,
            height,
        };
        let object = self
            .backend
            .create_texture(&desc)
            .map_err(|e| e.into_bridge(ResourceKind::Texture))?;

        self.resources.allocate(Resource::Texture(TextureEntry {
            object,
            format,
            width,
            height,
        }))
    }

    /// Copy a `(x0, y0) -> (x1, y1)` region of tightly packed pixels from
    /// module memory into the texture.
    pub fn texture_download(
        &mut self,
        handle: Handle,
        format: u32,
        region: [u32; 4],
        memory: &LinearMemory<'_>,
        data_ptr: u32,
    ) -> Result<(), BridgeError> {
        let format = TextureFormat::from_wire(format)?;
        let [x0, y0, x1, y1] = region;
        let region = Rect::new(x0, y0, x1, y1)?;

        let entry = resolve_mut(
            &mut self.resources,
            handle,
            ResourceKind::Texture,
            Resource::as_texture_mut,
        )?;

        if format.bytes_per_pixel() != entry.format.bytes_per_pixel() {
            return Err(ProtocolError::FormatMismatch {
                download: format,
                texture: entry.format,
            }
            .into());
        }
        if !region.fits_within(entry.width, entry.height) {
            return Err(BridgeError::RegionOutOfBounds {
                region,
                width: entry.width,
                height: entry.height,
            });
        }
        if region.is_empty() {
            return Ok(());
        }

        let bpp = entry.format.bytes_per_pixel();
        let len = region.area() * bpp as u64;
        let data = memory.read(data_ptr as u64, len)?;

        tracing::trace!(%handle, ?region, len, "texture download");
        self.backend.write_texture(&mut entry.object, region, bpp, data);
        Ok(())
    }

    pub fn texture_destroy(&mut self, handle: Handle) -> Result<(), BridgeError> {
        self.destroy_as(handle, ResourceKind::Texture)
    }

    // ── Samplers ────────────────────────────────────────────────────

    pub fn sampler_create(&mut self, mag: u32, min: u32) -> Result<Handle, BridgeError> {
        let desc = SamplerDesc {
            mag_filter: FilterMode::from_wire(mag)?,
            min_filter: FilterMode::from_wire(min)?,
        };
        let object = self
            .backend
            .create_sampler(&desc)
            .map_err(|e| e.into_bridge(ResourceKind::Sampler))?;
        self.resources
            .allocate(Resource::Sampler(SamplerEntry { object }))
    }

    pub fn sampler_destroy(&mut self, handle: Handle) -> Result<(), BridgeError> {
        self.destroy_as(handle, ResourceKind::Sampler)
    }

    // ── Shaders ─────────────────────────────────────────────────────

    /// Create a shader from `len` bytes of UTF-8 WGSL at `ptr`.
    pub fn shader_create(
        &mut self,
        memory: &LinearMemory<'_>,
        ptr: u32,
        len: u32,
    ) -> Result<Handle, BridgeError> {
        let bytes = memory.read(ptr as u64, len as u64)?;
        let source = std::str::from_utf8(bytes).map_err(|e| {
            BridgeError::rejected(ResourceKind::Shader, format!("source is not UTF-8: {e}"))
        })?;

        let validated = shader::validate_wgsl(source)
            .map_err(|diagnostic| BridgeError::rejected(ResourceKind::Shader, diagnostic))?;

        let object = self
            .backend
            .create_shader(&validated)
            .map_err(|e| e.into_bridge(ResourceKind::Shader))?;

        let handle = self.resources.allocate(Resource::Shader(ShaderEntry {
            object,
            renderable: validated.is_renderable(),
            entry_points: validated.entry_points,
        }))?;
        tracing::info!(%handle, bytes = len, "shader created");
        Ok(handle)
    }

    pub fn shader_destroy(&mut self, handle: Handle) -> Result<(), BridgeError> {
        self.destroy_as(handle, ResourceKind::Shader)
    }

    // ── Pipelines ───────────────────────────────────────────────────

    pub fn pipeline_create(
        &mut self,
        shader: Handle,
        memory: &LinearMemory<'_>,
        vertex_format_ptr: u32,
    ) -> Result<Handle, BridgeError> {
        let entry = resolve(
            &self.resources,
            shader,
            ResourceKind::Shader,
            Resource::as_shader,
        )?;
        let vertex_format = VertexFormat::decode(memory, vertex_format_ptr as u64)?;

        if !entry.renderable {
            let names: Vec<&str> = entry.entry_points.iter().map(|e| e.name.as_str()).collect();
            return Err(BridgeError::rejected(
                ResourceKind::Pipeline,
                format!(
                    "shader {shader} needs @vertex {} and @fragment {}, has {names:?}",
                    shader::VERTEX_ENTRY,
                    shader::FRAGMENT_ENTRY
                ),
            ));
        }
        check_vertex_layout(&vertex_format, &self.limits)?;

        let object = self
            .backend
            .create_pipeline(&entry.object, &vertex_format)
            .map_err(|e| e.into_bridge(ResourceKind::Pipeline))?;

        let handle = self.resources.allocate(Resource::Pipeline(PipelineEntry {
            object,
            stride: vertex_format.stride,
            attributes: vertex_format.attributes.len(),
        }))?;
        tracing::info!(
            %handle,
            %shader,
            stride = vertex_format.stride,
            attributes = vertex_format.attributes.len(),
            "pipeline created"
        );
        Ok(handle)
    }

    pub fn pipeline_destroy(&mut self, handle: Handle) -> Result<(), BridgeError> {
        self.destroy_as(handle, ResourceKind::Pipeline)
    }

    // ── Frames ──────────────────────────────────────────────────────

    /// Open the command stream and render pass for one frame. `Ok(None)`
    /// means the target is unavailable and the whole cycle should be skipped.
    pub fn begin_frame(&mut self) -> Result<Option<OpenFrame<B>>, BridgeError> {
        let extent = self.backend.extent();
        let target = self
            .backend
            .begin_frame()
            .map_err(|e| BridgeError::Unavailable(e.to_string()))?;

        Ok(target.map(|target| {
            self.frames += 1;
            OpenFrame {
                target,
                extent,
                stats: FrameStats {
                    index: self.frames,
                    ..FrameStats::default()
                },
            }
        }))
    }

    /// Decode the Draw Command Record at `ptr` and issue it into `frame`.
    ///
    /// A missing or wrongly typed handle skips only this draw: the error is
    /// returned non-fatal and the frame stays open.
    pub fn frame_flush(
        &mut self,
        frame: &mut OpenFrame<B>,
        memory: &LinearMemory<'_>,
        ptr: u32,
    ) -> Result<DrawOutcome, BridgeError> {
        let record: [u8; DRAW_COMMAND_SIZE] = memory.read_array(ptr as u64)?;
        let command = DrawCommand::decode(&record)?;

        let result = self.issue(frame, &command);
        if matches!(&result, Err(e) if !e.is_fatal()) {
            frame.stats.draws_skipped += 1;
        }
        result
    }

    fn issue(
        &mut self,
        frame: &mut OpenFrame<B>,
        command: &DrawCommand,
    ) -> Result<DrawOutcome, BridgeError> {
        let table = &self.resources;
        let buffer = |h| resolve(table, h, ResourceKind::Buffer, Resource::as_buffer);

        let constant_buffer = buffer(command.constant_buffer)?;
        let vertex_buffer = buffer(command.vertex_buffer)?;
        let index_buffer = buffer(command.index_buffer)?;
        let pipeline = resolve(table, command.pipeline, ResourceKind::Pipeline, Resource::as_pipeline)?;
        let texture = resolve(table, command.texture, ResourceKind::Texture, Resource::as_texture)?;
        let sampler = resolve(table, command.sampler, ResourceKind::Sampler, Resource::as_sampler)?;

        let max_constants = self.limits.max_uniform_buffer_binding_size as u64;
        if constant_buffer.size == 0 || constant_buffer.size > max_constants {
            return Err(BridgeError::rejected(
                ResourceKind::Buffer,
                format!(
                    "constant buffer {} is {} bytes, must be 1..={max_constants}",
                    command.constant_buffer, constant_buffer.size
                ),
            ));
        }

        let first = command.index_offset;
        let end = first as u64 + command.index_count as u64;
        if end * INDEX_SIZE > index_buffer.size {
            return Err(BridgeError::rejected(
                ResourceKind::Buffer,
                format!(
                    "indices {first}..{end} overrun index buffer {} ({} bytes)",
                    command.index_buffer, index_buffer.size
                ),
            ));
        }

        let (width, height) = frame.extent;
        let viewport = command.viewport.clamp_to(width, height);
        let scissor = command.clip.clamp_to(width, height);
        if viewport.is_empty() || scissor.is_empty() {
            frame.stats.draws_culled += 1;
            return Ok(DrawOutcome::Culled);
        }

        tracing::trace!(
            pipeline = %command.pipeline,
            stride = pipeline.stride,
            attributes = pipeline.attributes,
            first,
            count = command.index_count,
            "draw"
        );

        self.backend.draw(
            &mut frame.target,
            DrawCall {
                pipeline: &pipeline.object,
                constant_buffer: &constant_buffer.object,
                vertex_buffer: &vertex_buffer.object,
                index_buffer: &index_buffer.object,
                texture: &texture.object,
                sampler: &sampler.object,
                // end <= size / 4 <= u32::MAX
                indices: first..end as u32,
                depth_test: command.depth_test,
                viewport,
                scissor,
            },
        );
        frame.stats.draws_issued += 1;
        Ok(DrawOutcome::Issued)
    }

    /// End the pass and submit the frame's commands exactly once.
    pub fn submit(&mut self, frame: OpenFrame<B>) -> FrameStats {
        let stats = frame.stats;
        self.backend.submit_frame(frame.target);
        stats
    }
}

impl<B: GpuBackend> std::fmt::Debug for Bridge<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("resources", &self.resources)
            .field("frames", &self.frames)
            .finish()
    }
}
