//! Logging setup for hxmacro
//!
//! Everything logs through the `log` facade; binaries pick a backend here.
//!
//! ```rust,ignore
//! use compiler::logging;
//!
//! logging::init();                                   // warn and above
//! logging::init_with_level(log::LevelFilter::Debug); // explicit level
//! logging::init_from_env();                          // RUST_LOG, default warn
//! ```
//!
//! Levels used by the macro system:
//!
//! - `warn!` - rejected registrations, passes started with frames still active
//! - `debug!` - registrations, invocations, expansion summaries
//! - `trace!` - position stack push/pop and individual substitutions
//!
//! ```bash
//! RUST_LOG=debug hxmacro invoke makeArray --args '[3]'
//! RUST_LOG=compiler::macro_system::context=trace hxmacro invoke sum --args '[1, 2]'
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize at Warn level. Later calls do nothing.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize at `level`. Later calls do nothing.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize from `RUST_LOG`, falling back to `default_level` when it is unset
pub fn init_from_env_or(default_level: LevelFilter) {
    INIT.call_once(|| {
        let default = default_level.to_string().to_lowercase();
        Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
    });
}

/// Initialize from `RUST_LOG`, defaulting to Warn
pub fn init_from_env() {
    init_from_env_or(LevelFilter::Warn);
}

/// Logger for tests: captured output, Warn unless `RUST_LOG` says otherwise
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .is_test(true)
        .try_init();
}

/// Parse a level name as written in `hxmacro.toml` (`off`, `error` ... `trace`)
pub fn parse_level(name: &str) -> Result<LevelFilter, String> {
    name.trim()
        .parse::<LevelFilter>()
        .map_err(|_| format!("unknown log level '{}'", name))
}
