use std::any::Any;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn,wasmtime=warn,cranelift=warn";

pub fn init_tracing(fallback: Option<&str>) {
    // RUST_LOG=alice::guest=debug,alice::bridge=warn
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact()
        .try_init();
}

/// Log host panics under `alice::bridge` with the thread that raised them,
/// then hand off to the previously installed hook.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());

        tracing::error!(
            target: "alice::bridge",
            thread = thread.name().unwrap_or("unnamed"),
            %location,
            "host panicked: {}",
            panic_message(info.payload())
        );
        previous(info);
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string payload"
    }
}
