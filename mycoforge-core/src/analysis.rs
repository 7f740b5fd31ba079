use crate::{
    error::MycoforgeError,
    logger::LogEntry,
    simulation::{
        engine::SimulationRun,
        state::{RunStatus, RunWarning},
    },
};
use mycoforge_schemas::{preset::GrowthPhase, record::GrowthRecord};
use serde::{Deserialize, Serialize};

/// Days at which the report quotes the projected yield.
pub const DEFAULT_CHECKPOINT_DAYS: [f64; 6] = [0.0, 20.0, 25.0, 30.0, 35.0, 40.0];

/// Mycelium density treated as full colonisation.
pub const COLONISATION_THRESHOLD: f64 = 0.95;

const TIME_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSummary {
    pub preset_id: String,
    pub phase: GrowthPhase,
    pub status: RunStatus,
    pub records: usize,
    pub final_time: Option<f64>,
    pub final_yield: Option<f64>,
    pub peak_temperature: Option<f64>,
    pub peak_co2: Option<f64>,
    pub final_colonisation: Option<f64>,
    /// First time mycelium density reached [`COLONISATION_THRESHOLD`].
    pub colonised_at: Option<f64>,
    pub unstable_samples: usize,
    pub warnings: Vec<RunWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldCheckpoint {
    pub day: f64,
    /// Yield of the last record at or before `day`, if the run got that far.
    pub mushroom_yield: Option<f64>,
}

/// Largest finite value of `field` across `records`.
fn peak<F>(records: &[GrowthRecord], field: F) -> Option<f64>
where
    F: Fn(&GrowthRecord) -> f64,
{
    records
        .iter()
        .map(field)
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

pub fn summarize(run: &SimulationRun) -> GrowthSummary {
    let last = run.final_record();
    GrowthSummary {
        preset_id: run.preset_id.clone(),
        phase: run.phase,
        status: run.status.clone(),
        records: run.records.len(),
        final_time: last.map(|r| r.time),
        final_yield: last.map(|r| r.mushroom_yield),
        peak_temperature: peak(&run.records, |r| r.temperature),
        peak_co2: peak(&run.records, |r| r.co2),
        final_colonisation: last.map(|r| r.mycelium_density),
        colonised_at: run
            .records
            .iter()
            .find(|r| r.mycelium_density >= COLONISATION_THRESHOLD)
            .map(|r| r.time),
        unstable_samples: run.unstable_count(),
        warnings: run.warnings.clone(),
    }
}

/// The last record whose time is at or before `day`.
pub fn record_at_day(records: &[GrowthRecord], day: f64) -> Option<&GrowthRecord> {
    records.iter().take_while(|r| r.time <= day + TIME_TOLERANCE).last()
}

pub fn yield_checkpoints(records: &[GrowthRecord], days: &[f64]) -> Vec<YieldCheckpoint> {
    let end = records.last().map(|r| r.time);
    days.iter()
        .map(|&day| YieldCheckpoint {
            day,
            mushroom_yield: match end {
                Some(end) if day <= end + TIME_TOLERANCE => record_at_day(records, day).map(|r| r.mushroom_yield),
                _ => None,
            },
        })
        .collect()
}

/// Reads a time-series CSV written by [`crate::logger::TimeSeriesLogger`].
pub fn read_growth_log(log_path: &str) -> Result<Vec<LogEntry>, MycoforgeError> {
    let mut reader = csv::Reader::from_path(log_path)
        .map_err(|e| MycoforgeError::CsvError(log_path.to_string(), e))?;

    let mut entries = Vec::new();
    for result in reader.deserialize() {
        let entry: LogEntry = result.map_err(|e| MycoforgeError::CsvError(log_path.to_string(), e))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Records of one phase from a parsed log, in file order.
pub fn records_for_phase(entries: &[LogEntry], phase: GrowthPhase) -> Vec<GrowthRecord> {
    entries
        .iter()
        .filter(|e| e.phase == phase)
        .map(LogEntry::to_record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time: f64, mushroom_yield: f64, density: f64, temperature: f64) -> GrowthRecord {
        GrowthRecord {
            time,
            co2: 428.0 + time,
            complex_carbon: 300.0,
            mushroom_yield,
            mycelium_density: density,
            nitrogen: 10.0,
            simple_carbon: 90.0,
            available_space: 0.1,
            temperature,
            unstable: false,
        }
    }

    fn sample_run() -> SimulationRun {
        SimulationRun {
            preset_id: "mushroom-default".to_string(),
            phase: GrowthPhase::Mushroom,
            records: vec![
                record(0.0, 0.0, 0.90, 25.0),
                record(10.0, 5.0, 0.96, 27.5),
                record(20.0, 12.0, 0.99, 26.0),
                record(30.0, 20.0, 1.00, 25.5),
            ],
            status: RunStatus::Completed { steps: 3 },
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&sample_run());
        assert_eq!(summary.records, 4);
        assert_eq!(summary.final_time, Some(30.0));
        assert_eq!(summary.final_yield, Some(20.0));
        assert_eq!(summary.peak_temperature, Some(27.5));
        assert_eq!(summary.peak_co2, Some(458.0));
        assert_eq!(summary.colonised_at, Some(10.0));
        assert_eq!(summary.unstable_samples, 0);
    }

    #[test]
    fn test_peak_skips_non_finite_values() {
        let mut run = sample_run();
        run.records[2].temperature = f64::NAN;
        run.records[3].temperature = f64::INFINITY;
        assert_eq!(summarize(&run).peak_temperature, Some(27.5));
    }

    #[test]
    fn test_empty_run_summary() {
        let mut run = sample_run();
        run.records.clear();
        let summary = summarize(&run);
        assert_eq!(summary.final_yield, None);
        assert_eq!(summary.peak_co2, None);
        assert_eq!(summary.colonised_at, None);
    }

    #[test]
    fn test_checkpoints_use_last_record_at_or_before_day() {
        let records = sample_run().records;
        let checkpoints = yield_checkpoints(&records, &[0.0, 15.0, 20.0, 30.0, 40.0]);
        let yields: Vec<Option<f64>> = checkpoints.iter().map(|c| c.mushroom_yield).collect();
        assert_eq!(yields, vec![Some(0.0), Some(5.0), Some(12.0), Some(20.0), None]);
    }

    #[test]
    fn test_record_at_day_before_start() {
        let records = sample_run().records;
        assert!(record_at_day(&records, -1.0).is_none());
        assert!(yield_checkpoints(&[], &DEFAULT_CHECKPOINT_DAYS).iter().all(|c| c.mushroom_yield.is_none()));
    }

    #[test]
    fn test_missing_log_is_csv_error() {
        let result = read_growth_log("/nonexistent/mycoforge/growth.csv");
        assert!(matches!(result, Err(MycoforgeError::CsvError(..))));
    }
}
