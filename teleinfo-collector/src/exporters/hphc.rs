//! HP/HC (peak/off-peak tariff) consumption exporters.
//!
//! Extracts the power and index fields relevant to the HP/HC tariff from a
//! historic frame and either prints them as JSON or persists them to SQLite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teleinfo_protocol::Frame;

use crate::database::Database;
use crate::exporters::{Exporter, ExporterSettings, Result};

/// One consumption sample extracted from a frame.
///
/// Missing or non-numeric fields read as zero, matching the original
/// best-effort extraction: a meter on another tariff simply exports zeroed
/// indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpHcRecord {
    pub timestamp: DateTime<Utc>,
    /// Apparent power (VA), field `PAPP`.
    pub papp_va: u32,
    /// Off-peak index (Wh), field `HCHC`.
    pub hc_wh: u32,
    /// Peak index (Wh), field `HCHP`.
    pub hp_wh: u32,
    /// Whether the current tariff period is peak (`PTEC == "HP.."`).
    pub is_hp: bool,
}

impl HpHcRecord {
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            timestamp: Utc::now(),
            papp_va: frame.get_uint_field("PAPP").unwrap_or(0),
            hc_wh: frame.get_uint_field("HCHC").unwrap_or(0),
            hp_wh: frame.get_uint_field("HCHP").unwrap_or(0),
            is_hp: frame.get_string_field("PTEC") == Some("HP.."),
        }
    }
}

/// Prints one JSON document per frame on stdout.
pub struct JsonExporter;

pub fn new_json_exporter(_settings: &ExporterSettings) -> Result<Box<dyn Exporter>> {
    Ok(Box::new(JsonExporter))
}

impl Exporter for JsonExporter {
    fn export_frame(&mut self, frame: &Frame) -> Result<()> {
        let record = HpHcRecord::from_frame(frame);
        let doc = serde_json::to_string(&record)?;
        println!("{}", doc);
        Ok(())
    }
}

/// Persists records into the collector database.
pub struct SqliteExporter {
    db: Database,
}

pub fn new_sqlite_exporter(settings: &ExporterSettings) -> Result<Box<dyn Exporter>> {
    let db = Database::open(&settings.database_path)?;
    Ok(Box::new(SqliteExporter { db }))
}

impl Exporter for SqliteExporter {
    fn export_frame(&mut self, frame: &Frame) -> Result<()> {
        let record = HpHcRecord::from_frame(frame);
        self.db.insert_record(&record)?;
        Ok(())
    }
}
