pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod models;
pub mod state;
#[cfg(feature = "app")]
pub mod tui;
pub mod view;

#[cfg(all(feature = "app", not(test)))]
use crate::api::HttpTaskApi;
#[cfg(all(feature = "app", not(test)))]
use crate::client::TaskClient;
#[cfg(all(feature = "app", not(test)))]
use crate::config::ClientConfig;
#[cfg(all(feature = "app", not(test)))]
use crate::logging::init_logging;
#[cfg(all(feature = "app", not(test)))]
use crate::state::ViewState;

/// Loads configuration, starts logging and runs the terminal UI against the configured backend.
#[cfg(all(feature = "app", not(test)))]
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::load()?;
    let _logger = init_logging(&config.resolved_log_dir())?;
    log::info!(
        "starting api_base={} timeout={:?}",
        config.api_base,
        config.request_timeout()
    );

    // Requests run on the runtime's workers; this thread stays on the terminal.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let api = HttpTaskApi::new(&config.api_base, config.request_timeout())?;
    let client = TaskClient::new(api, ViewState::new());
    let result = tui::run(client);

    log::info!("exiting");
    Ok(result?)
}
