//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `zone_exposure.csv` — one row per (step, vehicle, occupied zone)
//! - `step_summaries.csv` — one row per step

use std::fs::File;
use std::path::Path;

use csv::Writer;

use az_exposure::StepRecord;

use crate::writer::ExposureWriter;
use crate::OutputResult;

/// Writes the exposure log to two CSV files, flushing after every step.
pub struct CsvExposureWriter {
    exposure: Writer<File>,
    summaries: Writer<File>,
    finished: bool,
}

impl CsvExposureWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut exposure = Writer::from_path(dir.join("zone_exposure.csv"))?;
        exposure.write_record([
            "time",
            "zone_timestep",
            "vehicle",
            "inserted_at",
            "speed",
            "edge",
            "zone",
            "zone_ts",
        ])?;

        let mut summaries = Writer::from_path(dir.join("step_summaries.csv"))?;
        summaries.write_record(["time", "zone_timestep", "vehicles_in_zones"])?;

        Ok(Self {
            exposure,
            summaries,
            finished: false,
        })
    }
}

impl ExposureWriter for CsvExposureWriter {
    fn write_step(&mut self, record: &StepRecord) -> OutputResult<()> {
        for entry in &record.vehicles {
            for zone in &entry.zones {
                self.exposure.write_record(&[
                    record.time.0.to_string(),
                    record.zone_timestep.to_string(),
                    entry.vehicle.to_string(),
                    entry.inserted_at.to_string(),
                    entry.speed.to_string(),
                    entry.edge.to_string(),
                    zone.zone.to_string(),
                    zone.timestep.to_string(),
                ])?;
            }
        }
        self.summaries.write_record(&[
            record.time.0.to_string(),
            record.zone_timestep.to_string(),
            record.vehicles.len().to_string(),
        ])?;

        // Per-step flush keeps partial output valid if the run aborts.
        self.exposure.flush()?;
        self.summaries.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.exposure.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
