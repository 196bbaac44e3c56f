use askweb_common::observability::{init_logging, LogConfig, LogFormat};
use std::path::PathBuf;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Mirror test logs on stderr and keep the files under `target/test-logs`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let log_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../target/test-logs");
        let config = LogConfig {
            app_name: "askweb-tests",
            log_dir: Some(log_dir),
            emit_stderr: true,
            format: LogFormat::from_env(),
            default_filter: "debug",
        };
        if let Err(e) = init_logging(config) {
            eprintln!("test logging unavailable: {e}");
        }
    });
}
