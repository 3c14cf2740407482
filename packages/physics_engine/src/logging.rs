//! Global logging system.

use std::{
    fs::File,
    path::Path,
    sync::Arc,
    env,
    panic,
};
use backtrace::Backtrace;
use tracing_subscriber::{
    fmt::{
        self,
        time::uptime,
    },
    prelude::*,
    Registry,
    EnvFilter,
};


/// Default logging environment filter. This crate is debug, everything else is warn.
const DEFAULT_FILTER: &'static str = "warn,physics_engine=debug";

/// Initializes a `tracing` logging backend which outputs to stdout and also to `log_file`, if
/// given and creatable. Accepts ecosystem-standard `RUST_LOG` env filters. Also routes panics
/// through the logging system.
pub fn init_logging(log_file: Option<&Path>) {
    let format = fmt::format()
        .compact()
        .with_timer(uptime())
        .with_line_number(true);
    let stdout_log = fmt::layer()
        .event_format(format);

    // no subscriber exists yet to report this through
    let log_file_log = log_file
        .and_then(|path| File::create(path)
            .map_err(|e| eprintln!("unable to create log file {}: {}", path.display(), e))
            .ok())
        .map(|file| fmt::layer()
            .with_ansi(false)
            .with_writer(Arc::new(file)));

    let mut filter = DEFAULT_FILTER.to_owned();
    if let Ok(env_filter) = env::var(EnvFilter::DEFAULT_ENV) {
        filter.push(',');
        filter.push_str(&env_filter);
    }

    let subscriber = Registry::default()
        .with(EnvFilter::new(filter))
        .with(stdout_log)
        .with(log_file_log);
    tracing::subscriber::set_global_default(subscriber)
        .expect("unable to install log subscriber");
    info!("starting program");

    panic::set_hook(Box::new(|info| {
        error!("{}", info);
        if env::var("RUST_BACKTRACE").map(|val| val == "1").unwrap_or(true) {
            error!("{:?}", Backtrace::new());
        }
    }));
    trace!("installed custom panic hook");
}
