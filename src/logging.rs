use std::sync::Once;

use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter, Registry};

static INIT: Once = Once::new();

/// Initialize logging.  If the environment variable `RUST_LOG` is set to a
/// non-empty value it is interpreted as an `EnvFilter` directive and a compact
/// fmt layer is installed; otherwise nothing is logged.  Calling this more
/// than once is harmless, which matters for tests that all want logging.
pub fn init_logging() {
    INIT.call_once(|| {
        // Our scripts frequently set RUST_LOG unconditionally but potentially
        // with an empty value, and we don't want that to be interpreted as a
        // desire to enable logging.
        let rustlog = match std::env::var("RUST_LOG") {
            Ok(value) if !value.is_empty() => value,
            _ => return,
        };
        let env_filter = match EnvFilter::try_new(&rustlog) {
            Ok(filter) => filter,
            Err(err) => {
                eprintln!("Ignoring unparseable RUST_LOG {:?}: {}", rustlog, err);
                return;
            }
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
            .compact()
            // Output mostly ends up in log files, where ANSI isn't helpful.
            .with_ansi(false)
            // Wall time takes up a lot of columns and we rarely care.
            .without_time()
            .with_writer(std::io::stderr)
            .with_filter(env_filter);

        // A test harness may have installed a subscriber already.
        let _ = Registry::default().with(layer).try_init();
    });
}
