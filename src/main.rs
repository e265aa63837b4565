use portico::{Frontend, FrontendConfig};
use portico_core::{
    Application,
    logging::{error, info, warn},
};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match FrontendConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("portico: {err}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = config.log_config().init();

    let frontend = match Frontend::from_config(&config) {
        Ok(frontend) => Arc::new(frontend),
        Err(err) => {
            error!(error = %err, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    if config.csrf_key.is_none() {
        warn!("PORTICO_CSRF_KEY is not set; anti-forgery checks are off");
    }

    spawn_reload_on_hangup(Arc::clone(&frontend));

    let app = Application::new(frontend.router());
    info!(address = %config.http, site = %config.site_name, "starting portico");

    match app.listen_until(config.http, shutdown_signal()).await {
        Ok(()) => {
            info!("stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "server failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn spawn_reload_on_hangup(frontend: Arc<Frontend>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(err) => {
            warn!(error = %err, "cannot listen for SIGHUP; template reload disabled");
            return;
        }
    };

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match frontend.reload_templates() {
                Ok(()) => info!("templates reloaded"),
                Err(err) => error!(error = %err, "template reload failed; keeping previous set"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_frontend: Arc<Frontend>) {}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
