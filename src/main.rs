use std::{env, path::PathBuf, sync::Arc};

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use invite_console::{
    api::ApiClient,
    config::Config,
    console,
    dashboard::Dashboard,
    error::Error,
    state::{InviteStore, ProjectStore},
};

fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.get_log_directory() {
        Some(log_directory) => {
            let appender = tracing_appender::rolling::daily(log_directory, "invite-console.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config_path: Option<PathBuf> = env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    let _guard = init_tracing(&config);
    info!("invite console starting against {}", config.get_api_base_url());

    let api = Arc::new(ApiClient::new(&config)?);
    let invites = Arc::new(InviteStore::new(api.to_owned()));
    let projects = Arc::new(ProjectStore::new(api));
    let dashboard = Arc::new(Dashboard::new(invites, projects, &config));

    tokio::select! {
        result = console::run(dashboard) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            Ok(())
        }
    }
}
