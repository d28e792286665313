use soundwatch_engine::config::{DEBUG_ENV, env_flag};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init() -> Result<(), String> {
    let level = if env_flag(DEBUG_ENV) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("failed to install log subscriber: {e}"))
}
