//! Console logging for the CLI.
//!
//! Logs go to stderr so stdout carries only editor content. `RUST_LOG`
//! overrides the default filter.

use htmlgo_core::Environment;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default level for our own targets: debug when running against a local
/// server, info otherwise. Dependencies only report warnings.
pub fn default_level(environment: Environment) -> Level {
    if environment.is_local() {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

fn default_filter(environment: Environment) -> String {
    let level = default_level(environment).as_str().to_lowercase();
    format!("warn,htmlgo={level},htmlgo_core={level}")
}

pub fn init(environment: Environment) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry().with(console_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_by_environment() {
        assert_eq!(
            default_filter(Environment::Local),
            "warn,htmlgo=debug,htmlgo_core=debug"
        );
        assert_eq!(
            default_filter(Environment::Production),
            "warn,htmlgo=info,htmlgo_core=info"
        );
    }
}
