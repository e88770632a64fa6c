//! Tracing subscriber setup.
//!
//! `RUST_LOG` selects levels (default `craftbook=info,tower_http=info`);
//! `CRAFTBOOK_LOG_FORMAT=json` switches to one JSON object per line. Logs go
//! to stderr so command output on stdout stays clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing() {
    let log_format = std::env::var("CRAFTBOOK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "craftbook=info,craftbook_core=info,tower_http=info".into());

    // try_init: tests and embedders may have installed a subscriber already
    match log_format.as_str() {
        "json" => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init();
        }
        _ => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
        }
    }
}
