use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A filesystem modification time, stable across platforms and across
/// serialize/deserialize round-trips.
///
/// Stored as seconds + nanoseconds since the Unix epoch rather than the raw
/// `SystemTime`, whose internal representation is platform-specific and not
/// guaranteed stable across bincode round-trips. Only equality is meaningful
/// here — the probe never needs ordering, just "did this change".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModTime {
    secs: i64,
    nanos: u32,
}

impl ModTime {
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self {
                secs: d.as_secs() as i64,
                nanos: d.subsec_nanos(),
            },
            // Pre-epoch mtimes exist on some filesystems (e.g. restored
            // archives); fall back to a negative second count.
            Err(e) => {
                let d = e.duration();
                Self {
                    secs: -(d.as_secs() as i64) - i64::from(d.subsec_nanos() > 0),
                    nanos: (1_000_000_000 - d.subsec_nanos()) % 1_000_000_000,
                }
            }
        }
    }
}
