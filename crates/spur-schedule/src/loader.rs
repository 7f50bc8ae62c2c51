//! CSV spawn schedule loader.
//!
//! # CSV format
//!
//! One row per spawned agent.  The last three columns may be left empty.
//!
//! ```csv
//! agent,tour,time,priority,respawn_delay,max_cycles
//! IC-101,northbound,0,0,,
//! IC-102,northbound,300,1,,
//! shuttle,loop,60,0,900,4
//! ```
//!
//! | Column          | Meaning                                               |
//! |-----------------|-------------------------------------------------------|
//! | `agent`         | Unique agent name                                     |
//! | `tour`          | Tour name, resolved by the model builder              |
//! | `time`          | Spawn time in simulated seconds                       |
//! | `priority`      | Queue priority (empty = 0)                            |
//! | `respawn_delay` | Seconds before a cyclic respawn (empty = never)       |
//! | `max_cycles`    | Respawn bound (empty = unbounded, if cyclic)          |
//!
//! Rows are returned sorted by spawn time, ties kept in file order.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use spur_core::SimTime;

use crate::{RespawnPolicy, ScheduleError, SpawnEntry};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SpawnRecord {
    agent:         String,
    tour:          String,
    time:          u64,
    #[serde(default)]
    priority:      Option<i32>,
    #[serde(default)]
    respawn_delay: Option<u64>,
    #[serde(default)]
    max_cycles:    Option<u32>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load spawn entries from a CSV file.
pub fn load_spawns_csv(path: &Path) -> Result<Vec<SpawnEntry>, ScheduleError> {
    let file = std::fs::File::open(path).map_err(ScheduleError::Io)?;
    load_spawns_reader(file)
}

/// Like [`load_spawns_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or embedding schedules.
pub fn load_spawns_reader<R: Read>(reader: R) -> Result<Vec<SpawnEntry>, ScheduleError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut entries = Vec::new();

    for (line, result) in csv_reader.deserialize::<SpawnRecord>().enumerate() {
        let row = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
        if row.agent.is_empty() || row.tour.is_empty() {
            return Err(ScheduleError::Parse(format!(
                "row {}: agent and tour names must not be empty",
                line + 1
            )));
        }
        if row.max_cycles.is_some() && row.respawn_delay.is_none() {
            return Err(ScheduleError::Parse(format!(
                "row {}: max_cycles given for agent {:?} without a respawn_delay",
                line + 1,
                row.agent
            )));
        }

        let respawn = match row.respawn_delay {
            None => RespawnPolicy::Never,
            Some(delay_secs) => RespawnPolicy::Cyclic { delay_secs, max_cycles: row.max_cycles },
        };

        entries.push(SpawnEntry {
            agent:    row.agent,
            tour:     row.tour,
            time:     SimTime(row.time),
            priority: row.priority.unwrap_or(0),
            respawn,
        });
    }

    // Stable sort keeps file order among agents sharing a spawn time.
    entries.sort_by_key(|e| e.time);
    Ok(entries)
}
