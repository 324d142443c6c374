use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Filter used when `RUST_LOG` is unset.
///
/// `--verbose` forces debug for the testbench crates regardless of the
/// configured level.
pub fn default_directives(verbose: bool, level: &str) -> String {
    let level = if verbose { "debug" } else { level.trim() };
    let level = if level.is_empty() { "info" } else { level };
    format!(
        "testbench_cli={level},testbench_core={level},testbench_metrics={level},testbench_generators={level},warn"
    )
}

/// Lets the configured log level replace the startup filter.
pub struct LogHandle {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
    pinned: bool,
}

impl LogHandle {
    /// Whether `--verbose` or `RUST_LOG` fixed the filter at startup.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Switch to the level from the config file unless pinned.
    pub fn apply_config_level(&self, level: &str) {
        if self.pinned {
            return;
        }
        if let Some(handle) = &self.handle {
            let _ = handle.reload(EnvFilter::new(default_directives(false, level)));
        }
    }
}

/// Installs the subscriber from CLI flags, before any config is read.
pub fn init_logging(verbose: bool) -> LogHandle {
    let from_env = if verbose {
        None
    } else {
        EnvFilter::try_from_default_env().ok()
    };
    let pinned = verbose || from_env.is_some();
    let filter = from_env.unwrap_or_else(|| EnvFilter::new(default_directives(verbose, "")));

    let (filter, handle) = reload::Layer::new(filter);
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok();

    LogHandle {
        handle: installed.then_some(handle),
        pinned,
    }
}
