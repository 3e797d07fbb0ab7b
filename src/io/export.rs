//! CSV telemetry export for tick records and JSON export for the session report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::sim::kpi::SessionReport;
use crate::sim::types::TickRecord;

/// Column header for CSV telemetry export.
const HEADER: &str = "time_ms,capacity,consumption,status,demand_spike,failures,\
                       serviced,shortfalls,broken_sources,energy_collected";

/// Failure while writing telemetry or the report.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exports tick records to a CSV file at the given path.
///
/// Writes a header row followed by one row per tick. Produces deterministic
/// output for identical inputs.
///
/// # Errors
///
/// Returns an `ExportError` if file creation or writing fails.
pub fn export_csv(records: &[TickRecord], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(records, BufWriter::new(file))
}

/// Writes tick records as CSV to any writer.
///
/// Shortfall names are joined with `;` into a single column.
///
/// # Errors
///
/// Returns an `ExportError` if writing fails.
pub fn write_csv(records: &[TickRecord], writer: impl Write) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.time_ms.to_string(),
            format!("{:.4}", r.capacity),
            format!("{:.4}", r.consumption),
            r.status.to_string(),
            r.demand_spike.to_string(),
            r.failures.to_string(),
            r.serviced.to_string(),
            r.shortfalls.join(";"),
            r.broken_sources.to_string(),
            format!("{:.4}", r.energy_collected),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the session report as pretty-printed JSON to a file.
///
/// # Errors
///
/// Returns an `ExportError` if file creation or serialization fails.
pub fn export_report_json(report: &SessionReport, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_report_json(report, BufWriter::new(file))
}

/// Writes the session report as pretty-printed JSON to any writer.
///
/// # Errors
///
/// Returns an `ExportError` if serialization or writing fails.
pub fn write_report_json(report: &SessionReport, mut writer: impl Write) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::{BlackoutCause, GridStatus};

    fn make_record(t: u64) -> TickRecord {
        TickRecord {
            time_ms: t * 1000,
            capacity: 42.5,
            consumption: 1.0,
            status: GridStatus::Normal,
            demand_spike: false,
            failures: 0,
            serviced: 1,
            shortfalls: Vec::new(),
            broken_sources: 0,
            energy_collected: 12.0,
        }
    }

    #[test]
    fn header_matches_schema() {
        let mut buf = Vec::new();
        write_csv(&[make_record(1)], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "time_ms,capacity,consumption,status,demand_spike,failures,\
             serviced,shortfalls,broken_sources,energy_collected"
        );
    }

    #[test]
    fn row_count_matches_tick_count() {
        let records: Vec<TickRecord> = (1..=30).map(make_record).collect();
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        assert_eq!(lines.len(), 31);
    }

    #[test]
    fn status_and_shortfalls_columns() {
        let mut r = make_record(5);
        r.status = GridStatus::Blackout(BlackoutCause::BuildingFailures);
        r.shortfalls = vec!["Hospital".to_string(), "Factory".to_string()];
        let mut buf = Vec::new();
        write_csv(&[r], &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let rows: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][3], "blackout:building_failures");
        assert_eq!(&rows[0][7], "Hospital;Factory");
        assert!(rows[0][1].parse::<f32>().is_ok());
    }

    #[test]
    fn report_json_has_outcome_fields() {
        let report = SessionReport::from_records(&[make_record(1)], None, 12.0, 2);
        let mut buf = Vec::new();
        write_report_json(&report, &mut buf).ok();
        let value: Option<serde_json::Value> = serde_json::from_slice(&buf).ok();
        let value = value.as_ref();
        assert_eq!(value.and_then(|v| v["ticks"].as_u64()), Some(1));
        assert_eq!(value.and_then(|v| v["repairs_completed"].as_u64()), Some(2));
        assert_eq!(value.map(|v| v["outcome"].is_null()), Some(true));
    }
}
