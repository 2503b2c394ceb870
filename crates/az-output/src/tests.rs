//! Unit tests for az-output.

use std::str::FromStr;

use az_core::{EdgeId, SimTime, Timestep, VehicleId, ZoneId};
use az_exposure::{StepRecord, VehicleEntry, ZoneRef};

use crate::{CsvExposureWriter, ExposureWriter};

fn ts(s: &str) -> Timestep {
    Timestep::from_str(s).unwrap()
}

fn record_with_vehicle(time: i64) -> StepRecord {
    StepRecord {
        time: SimTime(time),
        zone_timestep: ts("10-00-00"),
        vehicles: vec![VehicleEntry {
            vehicle: VehicleId::new("p1_0"),
            inserted_at: ts("10-00-00"),
            speed: 8.5,
            edge: EdgeId::new("e2"),
            zones: vec![
                ZoneRef {
                    zone: ZoneId::new("z_10-00-00"),
                    timestep: ts("10-00-00"),
                },
                ZoneRef {
                    zone: ZoneId::new("w_10-00-00"),
                    timestep: ts("10-00-00"),
                },
            ],
        }],
    }
}

fn empty_record(time: i64) -> StepRecord {
    StepRecord {
        time: SimTime(time),
        zone_timestep: ts("10-00-00"),
        vehicles: vec![],
    }
}

// ── CSV backend ───────────────────────────────────────────────────────────────

#[test]
fn csv_writer_flattens_zone_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CsvExposureWriter::new(dir.path()).unwrap();
    writer.write_step(&record_with_vehicle(0)).unwrap();
    writer.write_step(&empty_record(1)).unwrap();
    writer.finish().unwrap();

    let exposure = std::fs::read_to_string(dir.path().join("zone_exposure.csv")).unwrap();
    let lines: Vec<&str> = exposure.lines().collect();
    assert_eq!(lines.len(), 3, "header + one row per occupied zone");
    assert_eq!(
        lines[0],
        "time,zone_timestep,vehicle,inserted_at,speed,edge,zone,zone_ts"
    );
    assert!(lines[1].starts_with("0,10-00-00,p1_0,10-00-00,8.5,e2,z_10-00-00"));
    assert!(lines[2].contains("w_10-00-00"));

    let summaries = std::fs::read_to_string(dir.path().join("step_summaries.csv")).unwrap();
    let lines: Vec<&str> = summaries.lines().collect();
    assert_eq!(lines.len(), 3, "header + one row per step");
    assert_eq!(lines[1], "0,10-00-00,1");
    assert_eq!(lines[2], "1,10-00-00,0");
}

#[test]
fn csv_output_is_readable_before_finish() {
    // The writer flushes per step, so an aborted run still leaves the
    // completed steps on disk.
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CsvExposureWriter::new(dir.path()).unwrap();
    writer.write_step(&record_with_vehicle(0)).unwrap();

    let exposure = std::fs::read_to_string(dir.path().join("zone_exposure.csv")).unwrap();
    assert_eq!(exposure.lines().count(), 3);
    drop(writer);
}

#[test]
fn csv_finish_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CsvExposureWriter::new(dir.path()).unwrap();
    writer.write_step(&empty_record(0)).unwrap();
    writer.finish().unwrap();
    writer.finish().unwrap();
}

// ── SQLite backend ────────────────────────────────────────────────────────────

#[cfg(feature = "db")]
mod sqlite_tests {
    use super::*;
    use crate::SqliteExposureWriter;

    #[test]
    fn sqlite_writer_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SqliteExposureWriter::new(dir.path()).unwrap();
        writer.write_step(&record_with_vehicle(0)).unwrap();
        writer.write_step(&empty_record(1)).unwrap();
        writer.finish().unwrap();
        drop(writer);

        let conn = rusqlite::Connection::open(dir.path().join("exposure.db")).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM zone_exposure", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 2);

        let steps: i64 = conn
            .query_row("SELECT COUNT(*) FROM step_summaries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(steps, 2);

        let vehicle: String = conn
            .query_row(
                "SELECT vehicle FROM zone_exposure WHERE zone = 'z_10-00-00'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(vehicle, "p1_0");
    }
}
