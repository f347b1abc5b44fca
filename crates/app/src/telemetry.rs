//! Tracing setup for the binary.
//!
//! `SVENSKA_LOG` holds the filter directives (default `warn`), and
//! `SVENSKA_LOG_FORMAT` picks `pretty` (default) or `json`. Logs go to stderr
//! so they never interleave with the exercise prompts on stdout.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("SVENSKA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match std::env::var("SVENSKA_LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
