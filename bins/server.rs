use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // load .env first so RUST_LOG / LOG_FORMAT / JWT_SECRET are visible
    dotenv().ok();
    common::utils::logging::init_logging_default();
    info!(service = "account_service", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "account_service",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    // config.toml first, then TOKIO_WORKER_THREADS
    let cfg = match configs::AppConfig::load_or_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "account_service", event = "config_invalid", error = %e, "configuration rejected");
            return std::process::ExitCode::FAILURE;
        }
    };
    let worker_threads = cfg
        .server
        .worker_threads
        .or_else(|| std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()));

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "account_service", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "account_service",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "account service starting"
    );

    rt.block_on(async move {
        let server_task = tokio::spawn(async move {
            if let Err(e) = server::run(cfg).await {
                error!(service = "account_service", event = "run_failed", error = %e, "server::run returned error");
                Err(e)
            } else {
                Ok(())
            }
        });

        tokio::select! {
            res = server_task => match res {
                Ok(Ok(())) => {
                    info!(service = "account_service", event = "stop", %service_id, pid, "server stopped normally");
                    std::process::ExitCode::SUCCESS
                }
                // already logged inside the task
                Ok(Err(_)) => std::process::ExitCode::FAILURE,
                Err(e) => {
                    error!(service = "account_service", event = "task_join_error", error = %e, "server task join error");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(service = "account_service", event = "shutdown_signal", %service_id, pid, "received Ctrl+C, shutting down");
                std::process::ExitCode::SUCCESS
            }
        }
    })
}
