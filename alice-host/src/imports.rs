// alice-host/src/imports.rs
//! The `env` import set.
//!
//! Every import funnels through [`settle`]: fatal bridge errors trap the
//! module call, anything else is logged, recorded on the context and the
//! import returns its zero value (handle 0 for creates).
//!
//!   core_stream_write           (stream, ptr, len)
//!   core_unix_time              () -> i64
//!   core_panic                  (ptr, len)
//!   platform_set_shared_memory  (addr)
//!   gpu_buffer_*  gpu_texture_*  gpu_sampler_*  gpu_shader_*  gpu_pipeline_*
//!   gpu_frame_flush             (draw_ptr)

use alice_core::{BridgeError, Handle, LinearMemory, ProtocolError};
use alice_gpu::GpuBackend;
use wasmtime::{Caller, Extern, Linker, Memory};

use crate::context::HostContext;

pub const MODULE: &str = "env";

pub const STREAM_INFO: u32 = 1;
pub const STREAM_ERROR: u32 = 2;

type Ctx<'a, B> = Caller<'a, HostContext<B>>;

// ════════════════════════════════════════════════════════════════════
// Plumbing
// ════════════════════════════════════════════════════════════════════

fn settle<B: GpuBackend, R: Default>(
    ctx: &mut HostContext<B>,
    op: &'static str,
    result: Result<R, BridgeError>,
) -> wasmtime::Result<R> {
    match result {
        Ok(value) => Ok(value),
        Err(error) if error.is_fatal() => {
            tracing::error!(target: "alice::bridge", op, %error, "fatal");
            Err(wasmtime::Error::new(error))
        }
        Err(error) => {
            tracing::warn!(target: "alice::bridge", op, %error, "skipped");
            ctx.report(error);
            Ok(R::default())
        }
    }
}

fn memory_of<B: GpuBackend>(caller: &mut Ctx<'_, B>) -> Result<Memory, BridgeError> {
    if let Some(memory) = caller.data().memory {
        return Ok(memory);
    }
    caller
        .get_export("memory")
        .and_then(Extern::into_memory)
        .ok_or_else(|| ProtocolError::NoMemory.into())
}

/// Run `f` with the context and a fresh view over the module's memory.
fn with_memory<B: GpuBackend, R: Default>(
    caller: &mut Ctx<'_, B>,
    op: &'static str,
    f: impl FnOnce(&mut HostContext<B>, &LinearMemory<'_>) -> Result<R, BridgeError>,
) -> wasmtime::Result<R> {
    let memory = match memory_of(caller) {
        Ok(memory) => memory,
        Err(error) => return settle(caller.data_mut(), op, Err(error)),
    };
    let (bytes, ctx) = memory.data_and_store_mut(&mut *caller);
    let view = LinearMemory::new(bytes);
    let result = f(ctx, &view);
    settle(ctx, op, result)
}

fn with_context<B: GpuBackend, R: Default>(
    caller: &mut Ctx<'_, B>,
    op: &'static str,
    f: impl FnOnce(&mut HostContext<B>) -> Result<R, BridgeError>,
) -> wasmtime::Result<R> {
    let ctx = caller.data_mut();
    let result = f(ctx);
    settle(ctx, op, result)
}

fn read_text(memory: &LinearMemory<'_>, ptr: u32, len: u32) -> Result<String, BridgeError> {
    let bytes = memory.read(ptr as u64, len as u64)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn handle(raw: u32) -> Handle {
    Handle::from_raw(raw)
}

// ════════════════════════════════════════════════════════════════════
// Linking
// ════════════════════════════════════════════════════════════════════

/// Register every import on `linker`.
pub fn link<B: GpuBackend>(linker: &mut Linker<HostContext<B>>) -> wasmtime::Result<()> {
    link_core(linker)?;
    link_buffers(linker)?;
    link_textures(linker)?;
    link_samplers(linker)?;
    link_shaders(linker)?;
    link_pipelines(linker)?;
    link_frame(linker)?;
    Ok(())
}

fn link_core<B: GpuBackend>(linker: &mut Linker<HostContext<B>>) -> wasmtime::Result<()> {
    linker.func_wrap(
        MODULE,
        "core_stream_write",
        |mut caller: Ctx<'_, B>, stream: u32, ptr: u32, len: u32| {
            with_memory(&mut caller, "core_stream_write", |_, memory| {
                let text = read_text(memory, ptr, len)?;
                let text = text.trim_end_matches('\n');
                match stream {
                    STREAM_INFO => tracing::info!(target: "alice::guest", "{text}"),
                    STREAM_ERROR => tracing::error!(target: "alice::guest", "{text}"),
                    other => tracing::warn!(target: "alice::guest", stream = other, "{text}"),
                }
                Ok(())
            })
        },
    )?;

    linker.func_wrap(MODULE, "core_unix_time", |_: Ctx<'_, B>| -> i64 {
        chrono::Utc::now().timestamp_millis()
    })?;

    linker.func_wrap(
        MODULE,
        "core_panic",
        |mut caller: Ctx<'_, B>, ptr: u32, len: u32| {
            with_memory(&mut caller, "core_panic", |_, memory| {
                let text = read_text(memory, ptr, len)?;
                Err::<(), _>(BridgeError::GuestPanic(text))
            })
        },
    )?;

    linker.func_wrap(
        MODULE,
        "platform_set_shared_memory",
        |mut caller: Ctx<'_, B>, addr: u32| {
            with_context(&mut caller, "platform_set_shared_memory", |ctx| {
                if let Some(previous) = ctx.shared_memory.replace(addr) {
                    tracing::warn!(
                        target: "alice::bridge",
                        previous,
                        addr,
                        "shared memory address replaced"
                    );
                } else {
                    tracing::debug!(addr, "shared memory registered");
                }
                Ok(())
            })
        },
    )?;
    Ok(())
}

fn link_buffers<B: GpuBackend>(linker: &mut Linker<HostContext<B>>) -> wasmtime::Result<()> {
    linker.func_wrap(
        MODULE,
        "gpu_buffer_allocate",
        |mut caller: Ctx<'_, B>, bytes: u32, mode: u32| {
            with_context(&mut caller, "gpu_buffer_allocate", |ctx| {
                ctx.bridge.buffer_allocate(bytes, mode).map(Handle::raw)
            })
        },
    )?;

    linker.func_wrap(
        MODULE,
        "gpu_buffer_download",
        |mut caller: Ctx<'_, B>, h: u32, offset: u32, bytes: u32, data_ptr: u32| {
            with_memory(&mut caller, "gpu_buffer_download", |ctx, memory| {
                ctx.bridge
                    .buffer_download(handle(h), offset, bytes, memory, data_ptr)
            })
        },
    )?;

    linker.func_wrap(
        MODULE,
        "gpu_buffer_destroy",
        |mut caller: Ctx<'_, B>, h: u32| {
            with_context(&mut caller, "gpu_buffer_destroy", |ctx| {
                ctx.bridge.buffer_destroy(handle(h))
            })
        },
    )?;
    Ok(())
}

fn link_textures<B: GpuBackend>(linker: &mut Linker<HostContext<B>>) -> wasmtime::Result<()> {
    linker.func_wrap(
        MODULE,
        "gpu_texture_allocate",
        |mut caller: Ctx<'_, B>, format: u32, width: u32, height: u32| {
            with_context(&mut caller, "gpu_texture_allocate", |ctx| {
                ctx.bridge
                    .texture_allocate(format, width, height)
                    .map(Handle::raw)
            })
        },
    )?;

    linker.func_wrap(
        MODULE,
        "gpu_texture_download",
        |mut caller: Ctx<'_, B>,
         h: u32,
         format: u32,
         x0: u32,
         y0: u32,
         x1: u32,
         y1: u32,
         data_ptr: u32| {
            with_memory(&mut caller, "gpu_texture_download", |ctx, memory| {
                ctx.bridge
                    .texture_download(handle(h), format, [x0, y0, x1, y1], memory, data_ptr)
            })
        },
    )?;

    linker.func_wrap(
        MODULE,
        "gpu_texture_destroy",
        |mut caller: Ctx<'_, B>, h: u32| {
            with_context(&mut caller, "gpu_texture_destroy", |ctx| {
                ctx.bridge.texture_destroy(handle(h))
            })
        },
    )?;
    Ok(())
}

fn link_samplers<B: GpuBackend>(linker: &mut Linker<HostContext<B>>) -> wasmtime::Result<()> {
    linker.func_wrap(
        MODULE,
        "gpu_sampler_create",
        |mut caller: Ctx<'_, B>, mag: u32, min: u32| {
            with_context(&mut caller, "gpu_sampler_create", |ctx| {
                ctx.bridge.sampler_create(mag, min).map(Handle::raw)
            })
        },
    )?;

    linker.func_wrap(
        MODULE,
        "gpu_sampler_destroy",
        |mut caller: Ctx<'_, B>, h: u32| {
            with_context(&mut caller, "gpu_sampler_destroy", |ctx| {
                ctx.bridge.sampler_destroy(handle(h))
            })
        },
    )?;
    Ok(())
}

fn link_shaders<B: GpuBackend>(linker: &mut Linker<HostContext<B>>) -> wasmtime::Result<()> {
    linker.func_wrap(
        MODULE,
        "gpu_shader_create",
        |mut caller: Ctx<'_, B>, ptr: u32, len: u32| {
            with_memory(&mut caller, "gpu_shader_create", |ctx, memory| {
                ctx.bridge.shader_create(memory, ptr, len).map(Handle::raw)
            })
        },
    )?;

    linker.func_wrap(
        MODULE,
        "gpu_shader_destroy",
        |mut caller: Ctx<'_, B>, h: u32| {
            with_context(&mut caller, "gpu_shader_destroy", |ctx| {
                ctx.bridge.shader_destroy(handle(h))
            })
        },
    )?;
    Ok(())
}

fn link_pipelines<B: GpuBackend>(linker: &mut Linker<HostContext<B>>) -> wasmtime::Result<()> {
    linker.func_wrap(
        MODULE,
        "gpu_pipeline_create",
        |mut caller: Ctx<'_, B>, shader: u32, vertex_format_ptr: u32| {
            with_memory(&mut caller, "gpu_pipeline_create", |ctx, memory| {
                ctx.bridge
                    .pipeline_create(handle(shader), memory, vertex_format_ptr)
                    .map(Handle::raw)
            })
        },
    )?;

    linker.func_wrap(
        MODULE,
        "gpu_pipeline_destroy",
        |mut caller: Ctx<'_, B>, h: u32| {
            with_context(&mut caller, "gpu_pipeline_destroy", |ctx| {
                ctx.bridge.pipeline_destroy(handle(h))
            })
        },
    )?;
    Ok(())
}

fn link_frame<B: GpuBackend>(linker: &mut Linker<HostContext<B>>) -> wasmtime::Result<()> {
    linker.func_wrap(
        MODULE,
        "gpu_frame_flush",
        |mut caller: Ctx<'_, B>, draw_ptr: u32| {
            with_memory(&mut caller, "gpu_frame_flush", |ctx, memory| {
                let HostContext { bridge, frame, .. } = ctx;
                let frame = frame.as_mut().ok_or(ProtocolError::NoOpenFrame)?;
                bridge.frame_flush(frame, memory, draw_ptr).map(|_| ())
            })
        },
    )?;
    Ok(())
}
