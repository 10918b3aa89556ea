// 💾 Result Recorder
// Persists each submission plus the rounded point estimate into the
// cars_resale table. Persistence is best-effort telemetry: a failed write
// becomes a warning, never an error on the prediction path.

use crate::features::{flag_as_int, VehicleInput};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Round to exactly 2 decimal places. Applied to the point estimate at the
/// persistence boundary only; the displayed range keeps full precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// RESALE RECORD
// ============================================================================

/// One persisted prediction row. Created once per successful prediction,
/// never mutated or deleted by this system.
#[derive(Debug, Clone, Serialize)]
pub struct ResaleRecord {
    /// Stable row identity
    pub id: String,
    pub recorded_at: DateTime<Utc>,

    pub brand: String,
    pub model: String,
    pub registration_year: i64,
    pub fuel_type: String,
    /// Display form, e.g. "5 Seats"
    pub seats: String,
    pub rto_state: String,
    pub transmission_type: String,
    pub ownership: String,
    pub engine_cc: i64,
    pub kms_driven: i64,
    pub engine_power_bhp: f64,
    pub mileage_kmpl: f64,
    pub has_parking_sensors: i64,
    pub has_automatic_climate_control: i64,
    pub has_rear_ac_vents: i64,
    pub has_central_locking: i64,
    pub has_air_purifier: i64,
    /// Point estimate, rounded to 2dp
    pub vehicle_price_lakhs: f64,
    /// User-declared current market value
    pub new_vehicle_price_lakhs: f64,
}

impl ResaleRecord {
    pub fn from_submission(input: &VehicleInput, point_estimate: f64) -> Self {
        ResaleRecord {
            id: uuid::Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            brand: input.brand.clone(),
            model: input.model.clone(),
            registration_year: input.registration_year,
            fuel_type: input.fuel_type.clone(),
            seats: format!("{} Seats", input.seats),
            rto_state: input.rto_state.clone(),
            transmission_type: input.transmission_type.clone(),
            ownership: input.ownership.clone(),
            engine_cc: input.engine_cc,
            kms_driven: input.kms_driven,
            engine_power_bhp: input.engine_power_bhp,
            mileage_kmpl: input.mileage_kmpl,
            has_parking_sensors: flag_as_int(input.has_parking_sensors),
            has_automatic_climate_control: flag_as_int(input.has_automatic_climate_control),
            has_rear_ac_vents: flag_as_int(input.has_rear_ac_vents),
            has_central_locking: flag_as_int(input.has_central_locking),
            has_air_purifier: flag_as_int(input.has_air_purifier),
            vehicle_price_lakhs: round2(point_estimate),
            new_vehicle_price_lakhs: input.new_vehicle_price_lakhs,
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cars_resale (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_uuid TEXT UNIQUE NOT NULL,
            recorded_at TEXT NOT NULL,
            brand TEXT NOT NULL,
            model TEXT NOT NULL,
            registration_year INTEGER NOT NULL,
            fuel_type TEXT NOT NULL,
            seats TEXT NOT NULL,
            rto_state TEXT NOT NULL,
            transmission_type TEXT NOT NULL,
            ownership TEXT NOT NULL,
            engine_cc INTEGER NOT NULL,
            kms_driven INTEGER NOT NULL,
            engine_power_bhp REAL NOT NULL,
            mileage_kmpl REAL NOT NULL,
            has_parking_sensors INTEGER NOT NULL,
            has_automatic_climate_control INTEGER NOT NULL,
            has_rear_ac_vents INTEGER NOT NULL,
            has_central_locking INTEGER NOT NULL,
            has_air_purifier INTEGER NOT NULL,
            vehicle_price_lakhs REAL NOT NULL,
            new_vehicle_price_lakhs REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_resale_brand ON cars_resale(brand)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_resale_recorded_at ON cars_resale(recorded_at)",
        [],
    )?;

    Ok(())
}

pub fn insert_resale_record(conn: &Connection, record: &ResaleRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO cars_resale (
            record_uuid, recorded_at, brand, model, registration_year, fuel_type,
            seats, rto_state, transmission_type, ownership, engine_cc, kms_driven,
            engine_power_bhp, mileage_kmpl, has_parking_sensors,
            has_automatic_climate_control, has_rear_ac_vents, has_central_locking,
            has_air_purifier, vehicle_price_lakhs, new_vehicle_price_lakhs
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            record.id,
            record.recorded_at.to_rfc3339(),
            record.brand,
            record.model,
            record.registration_year,
            record.fuel_type,
            record.seats,
            record.rto_state,
            record.transmission_type,
            record.ownership,
            record.engine_cc,
            record.kms_driven,
            record.engine_power_bhp,
            record.mileage_kmpl,
            record.has_parking_sensors,
            record.has_automatic_climate_control,
            record.has_rear_ac_vents,
            record.has_central_locking,
            record.has_air_purifier,
            record.vehicle_price_lakhs,
            record.new_vehicle_price_lakhs,
        ],
    )
    .context("Failed to insert resale record")?;

    Ok(())
}

pub fn count_resale_records(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM cars_resale", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// RECORDER
// ============================================================================

/// Outcome of the best-effort write. Callers may inspect it; neither
/// variant ever unwinds the prediction response.
#[derive(Debug, Clone, Serialize)]
pub enum RecordOutcome {
    Saved,
    Failed(String),
}

impl RecordOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, RecordOutcome::Saved)
    }

    /// The non-blocking warning to surface, if any.
    pub fn warning(&self) -> Option<&str> {
        match self {
            RecordOutcome::Saved => None,
            RecordOutcome::Failed(msg) => Some(msg),
        }
    }
}

/// Writes one row per submission on a fresh connection (open, insert,
/// close). Submissions are human-paced, so connection setup cost per write
/// is acceptable and no pooling is done.
#[derive(Debug, Clone)]
pub struct Recorder {
    db_path: PathBuf,
}

impl Recorder {
    pub fn new<P: Into<PathBuf>>(db_path: P) -> Self {
        Recorder {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Persist one submission with its rounded point estimate. Every
    /// failure mode (sink unreachable, schema trouble, constraint
    /// violation) collapses into `RecordOutcome::Failed`; no retry, no
    /// rollback of anything already shown to the user.
    pub fn record(&self, input: &VehicleInput, point_estimate: f64) -> RecordOutcome {
        match self.try_record(input, point_estimate) {
            Ok(()) => RecordOutcome::Saved,
            Err(e) => RecordOutcome::Failed(format!("{:#}", e)),
        }
    }

    fn try_record(&self, input: &VehicleInput, point_estimate: f64) -> Result<()> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open sink database: {:?}", self.db_path))?;
        setup_database(&conn)?;

        let record = ResaleRecord::from_submission(input, point_estimate);
        insert_resale_record(&conn, &record)?;

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
