//! Log output for the server
//!
//! Development writes pretty, human-readable events; production writes one
//! JSON object per line, with the fields of the enclosing request span
//! (`request_id`, method, path) attached. `RUST_LOG` replaces the default
//! filter in both (e.g. `RUST_LOG=debug,lgn_api=trace`).

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

/// Install the global subscriber for `env`
///
/// Must be called once, before the server starts.
pub fn init_tracing(env: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    let pretty = env.is_development().then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .pretty()
    });
    let json = env.is_production().then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .flatten_event(true)
            .with_target(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();

    tracing::info!(environment = ?env, "Logging initialized");
}

/// Filter used when `RUST_LOG` is unset
///
/// Token exchanges and authentication service calls go through `reqwest`
/// and `hyper_util`, which are kept quiet unless something fails.
fn default_directives(env: Environment) -> &'static str {
    match env {
        Environment::Development => "debug,hyper_util=info,reqwest=info,tower_governor=info",
        Environment::Production => "info,hyper_util=warn,reqwest=warn,tower_governor=warn",
    }
}
