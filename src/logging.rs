use std::path::Path;

pub const LOG_FILE_BASENAME: &str = "task-client";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 5;

pub const ENV_LOG: &str = "TASK_CLIENT_LOG";

/// Keep dependency logs at WARN by default; our crate is more verbose in debug builds.
pub fn default_log_spec() -> &'static str {
    if cfg!(debug_assertions) {
        "warn,task_client=debug"
    } else {
        "warn,task_client=info"
    }
}

/// `TASK_CLIENT_LOG`, then `RUST_LOG`, then the built-in default. Blank values are skipped.
pub fn resolve_log_spec(env: impl Fn(&str) -> Option<String>) -> String {
    [ENV_LOG, "RUST_LOG"]
        .into_iter()
        .find_map(|key| env(key).filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| default_log_spec().to_string())
}

pub fn log_file_path(log_dir: &Path) -> std::path::PathBuf {
    log_dir.join(format!("{LOG_FILE_BASENAME}.{LOG_FILE_SUFFIX}"))
}

/// Starts file logging. The returned handle must stay alive for buffered lines to be flushed.
/// Nothing is duplicated to stdout: the terminal UI owns it.
#[cfg(all(feature = "app", not(test)))]
pub fn init_logging(
    log_dir: &Path,
) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    use flexi_logger::{detailed_format, Cleanup, Criterion, FileSpec, Logger, Naming, WriteMode};

    std::fs::create_dir_all(log_dir)?;

    let spec = resolve_log_spec(|key| std::env::var(key).ok());
    let handle = Logger::try_with_str(spec)?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME)
                .suffix(LOG_FILE_SUFFIX)
                .suppress_timestamp(),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        .start()?;

    install_panic_hook();

    log::info!(
        "logger initialized file={} rotate_size_bytes={} keep_files={}",
        log_file_path(log_dir).display(),
        LOG_ROTATE_SIZE_BYTES,
        LOG_ROTATE_KEEP_FILES
    );
    Ok(handle)
}

#[cfg(all(feature = "app", not(test)))]
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");
        let location = info
            .location()
            .map(|loc| format!("{loc}"))
            .unwrap_or_else(|| "<unknown>".to_string());
        let backtrace = std::backtrace::Backtrace::force_capture();

        log::error!("panic: payload={payload} location={location}\nbacktrace:\n{backtrace}");
        default_hook(info);
    }));
}
