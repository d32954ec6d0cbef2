// Logger setup for the host binary
// Library code only uses the log facade; installing a backend is the binary's job

use chrono::{SecondsFormat, Utc};
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Default level when `RUST_LOG` is unset
fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Install `env_logger` once; later calls are no-ops
///
/// `RUST_LOG` overrides the default level.
pub fn init() {
    INIT.call_once(|| {
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter()));
        builder.format(|buf, record| {
            let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            writeln!(buf, "{} {:<5} {}", ts, record.level(), record.args())
        });
        if let Err(e) = builder.try_init() {
            eprintln!("Logger already installed: {}", e);
        }
    });
}
