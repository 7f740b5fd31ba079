use csv::Writer;
use mycoforge_schemas::{preset::GrowthPhase, record::GrowthRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// One row of a growth time-series CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub phase: GrowthPhase,
    pub preset_id: String,
    pub time: f64,
    pub co2: f64,
    pub complex_carbon: f64,
    pub mushroom_yield: f64,
    pub mycelium_density: f64,
    pub nitrogen: f64,
    pub simple_carbon: f64,
    pub available_space: f64,
    pub temperature: f64,
    pub unstable: bool,
}

impl LogEntry {
    pub fn new(phase: GrowthPhase, preset_id: &str, record: &GrowthRecord) -> Self {
        Self {
            phase,
            preset_id: preset_id.to_string(),
            time: record.time,
            co2: record.co2,
            complex_carbon: record.complex_carbon,
            mushroom_yield: record.mushroom_yield,
            mycelium_density: record.mycelium_density,
            nitrogen: record.nitrogen,
            simple_carbon: record.simple_carbon,
            available_space: record.available_space,
            temperature: record.temperature,
            unstable: record.unstable,
        }
    }

    pub fn to_record(&self) -> GrowthRecord {
        GrowthRecord {
            time: self.time,
            co2: self.co2,
            complex_carbon: self.complex_carbon,
            mushroom_yield: self.mushroom_yield,
            mycelium_density: self.mycelium_density,
            nitrogen: self.nitrogen,
            simple_carbon: self.simple_carbon,
            available_space: self.available_space,
            temperature: self.temperature,
            unstable: self.unstable,
        }
    }
}

pub struct TimeSeriesLogger {
    writer: Writer<fs::File>,
}

impl TimeSeriesLogger {
    pub fn new(path: &str) -> Result<Self, io::Error> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log_record(&mut self, phase: GrowthPhase, preset_id: &str, record: &GrowthRecord) -> Result<(), anyhow::Error> {
        self.writer.serialize(LogEntry::new(phase, preset_id, record))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), anyhow::Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_round_trips_record() {
        let record = GrowthRecord {
            time: 1.2,
            co2: 430.0,
            complex_carbon: 290.0,
            mushroom_yield: 0.4,
            mycelium_density: 0.92,
            nitrogen: 9.8,
            simple_carbon: 95.0,
            available_space: 0.08,
            temperature: 25.3,
            unstable: false,
        };
        let entry = LogEntry::new(GrowthPhase::Mushroom, "mushroom-default", &record);
        assert_eq!(entry.preset_id, "mushroom-default");
        assert_eq!(entry.to_record(), record);
    }

    #[test]
    fn test_writes_header_and_rows() {
        let path = std::env::temp_dir().join(format!("mycoforge-logger-{}.csv", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        let mut logger = TimeSeriesLogger::new(&path_str).unwrap();
        let record = GrowthRecord {
            time: 0.0,
            co2: 428.0,
            complex_carbon: 300.0,
            mushroom_yield: 0.0,
            mycelium_density: 0.9,
            nitrogen: 10.0,
            simple_carbon: 90.0,
            available_space: 0.1,
            temperature: 25.0,
            unstable: false,
        };
        logger.log_record(GrowthPhase::Mycelium, "mycelium-default", &record).unwrap();
        logger.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "phase,preset_id,time,co2,complex_carbon,mushroom_yield,mycelium_density,nitrogen,simple_carbon,available_space,temperature,unstable"
        );
        assert!(lines.next().unwrap().starts_with("mycelium,mycelium-default,0.0,428.0"));
        fs::remove_file(path).ok();
    }
}
