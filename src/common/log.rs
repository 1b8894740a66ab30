//! Logging backend emitting JSON lines on stderr.
//!
//! Code logs through the `log` macros; this module only wires `env_logger`
//! up with the line schema `{"ts","level","mod","msg"}`.

use std::io::Write;

use log::LevelFilter;
use serde_json::json;

use crate::common::time;

/// Install the JSON-lines logger. Later calls are no-ops.
pub fn init(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_env("BOOKREC_LOG")
        .format(|buf, record| {
            let line = json!({
                "ts": time::now_ms() as u64,
                "level": record.level().as_str(),
                "mod": record.target(),
                "msg": record.args().to_string(),
            });
            writeln!(buf, "{line}")
        })
        .try_init();
}
