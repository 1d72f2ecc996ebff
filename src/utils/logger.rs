use std::io::Write;

use chrono::Utc;
use env_logger::{Builder, Env, Target};
use log::info;

/// Logger setup for the client binaries
pub struct ClientLogger;

impl ClientLogger {
    /// `RUST_LOG` wins over `default_level`. Output goes to stderr so it
    /// does not interleave with the interactive prompt on stdout.
    pub fn init(default_level: &str) {
        let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
        builder
            .target(Target::Stderr)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{}] [{}] [{}] {}",
                    Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            });
        if builder.try_init().is_ok() {
            info!("Buzzzy client logger initialized");
        }
    }
}
