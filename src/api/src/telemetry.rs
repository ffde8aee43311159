//! Race calendar, driver lists and sample telemetry.
//!
//! Live timing integration is not wired in; everything here is served from
//! static tables and a local sample file.

use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

/// Driver whose sample telemetry stands in for unknown drivers
pub const DEFAULT_SAMPLE_DRIVER: &str = "VER";

/// Race calendar entry
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RaceSummary {
    pub id: &'static str,
    pub name: &'static str,
}

/// Driver entry for a race
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DriverSummary {
    #[serde(rename = "driverId")]
    pub driver_id: &'static str,
    pub name: &'static str,
}

const RACES_2023: [RaceSummary; 17] = [
    RaceSummary { id: "2023-01-bahrain", name: "Bahrain GP 2023" },
    RaceSummary { id: "2023-02-jeddah", name: "Saudi Arabia GP 2023" },
    RaceSummary { id: "2023-03-auc", name: "Australia GP 2023" },
    RaceSummary { id: "2023-04-miami", name: "Miami GP 2023" },
    RaceSummary { id: "2023-05-italy", name: "Monaco GP 2023" },
    RaceSummary { id: "2023-06-spanish", name: "Spain GP 2023" },
    RaceSummary { id: "2023-07-austria", name: "Austria GP 2023" },
    RaceSummary { id: "2023-08-belgium", name: "Belgium GP 2023" },
    RaceSummary { id: "2023-09-netherlands", name: "Netherlands GP 2023" },
    RaceSummary { id: "2023-10-sanmarino", name: "San Marino GP 2023" },
    RaceSummary { id: "2023-11-singapore", name: "Singapore GP 2023" },
    RaceSummary { id: "2023-12-japan", name: "Japan GP 2023" },
    RaceSummary { id: "2023-13-austin", name: "United States GP 2023" },
    RaceSummary { id: "2023-14-mexico", name: "Mexico GP 2023" },
    RaceSummary { id: "2023-15-sao_paulo", name: "Brazil GP 2023" },
    RaceSummary { id: "2023-16-las_vegas", name: "Las Vegas GP 2023" },
    RaceSummary { id: "2023-17-abudhabi", name: "Abu Dhabi GP 2023" },
];

const FALLBACK_DRIVERS: [DriverSummary; 4] = [
    DriverSummary { driver_id: "VER", name: "Max Verstappen" },
    DriverSummary { driver_id: "LEC", name: "Charles Leclerc" },
    DriverSummary { driver_id: "HAM", name: "Lewis Hamilton" },
    DriverSummary { driver_id: "ALO", name: "Fernando Alonso" },
];

/// Available races.
pub fn list_races() -> &'static [RaceSummary] {
    &RACES_2023
}

/// Drivers for a race. Every race currently shares the fallback grid.
pub fn drivers_for_race(race_id: &str) -> &'static [DriverSummary] {
    tracing::debug!(race_id, "Serving fallback driver list");
    &FALLBACK_DRIVERS
}

/// Sample telemetry for a driver.
///
/// Unknown drivers get the default driver's sample. An unreadable file
/// yields an error document rather than a failure.
pub fn read_sample(path: &Path, driver_id: &str) -> Value {
    match load_samples(path) {
        Ok(Value::Object(samples)) => samples
            .get(driver_id)
            .or_else(|| samples.get(DEFAULT_SAMPLE_DRIVER))
            .cloned()
            .unwrap_or(Value::Null),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Sample telemetry is not a JSON object");
            unavailable()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Sample telemetry unavailable");
            unavailable()
        }
    }
}

fn load_samples(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)?;
    // Tolerate a UTF-8 byte order mark
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    Ok(serde_json::from_str(content)?)
}

fn unavailable() -> Value {
    json!({ "error": "sample telemetry unavailable" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const SAMPLES: &str = r#"{
        "VER": {"laps": [{"lap": 1, "time": 96.2, "speed": 212.4, "sector": [31.0, 33.1, 32.1]}], "tyres": ["SOFT"]},
        "LEC": {"laps": [{"lap": 1, "time": 96.9, "speed": 210.8, "sector": [31.2, 33.4, 32.3]}], "tyres": ["MEDIUM"]}
    }"#;

    #[test]
    fn test_list_races() {
        let races = list_races();
        assert_eq!(races.len(), 17);
        assert_eq!(races[0].id, "2023-01-bahrain");
        assert_eq!(races[16].name, "Abu Dhabi GP 2023");
    }

    #[test]
    fn test_driver_json_shape() {
        let json = serde_json::to_value(drivers_for_race("2023-01-bahrain")).unwrap();
        assert_eq!(json[0]["driverId"], "VER");
        assert_eq!(json[3]["name"], "Fernando Alonso");
    }

    #[test]
    fn test_read_known_driver() {
        let file = sample_file(SAMPLES);
        let sample = read_sample(file.path(), "LEC");
        assert_eq!(sample["tyres"][0], "MEDIUM");
    }

    #[test]
    fn test_unknown_driver_falls_back() {
        let file = sample_file(SAMPLES);
        let sample = read_sample(file.path(), "XYZ");
        assert_eq!(sample["tyres"][0], "SOFT");
    }

    #[test]
    fn test_byte_order_mark_is_tolerated() {
        let file = sample_file(&format!("\u{feff}{}", SAMPLES));
        let sample = read_sample(file.path(), "VER");
        assert_eq!(sample["laps"][0]["lap"], 1);
    }

    #[test]
    fn test_no_default_sample_is_null() {
        let file = sample_file(r#"{"HAM": {"laps": [], "tyres": []}}"#);
        assert_eq!(read_sample(file.path(), "XYZ"), Value::Null);
    }

    #[test]
    fn test_missing_file_reports_unavailable() {
        let sample = read_sample(Path::new("no/such/telemetry.json"), "VER");
        assert_eq!(sample["error"], "sample telemetry unavailable");
    }

    #[test]
    fn test_malformed_file_reports_unavailable() {
        let file = sample_file("[1, 2, 3]");
        let sample = read_sample(file.path(), "VER");
        assert_eq!(sample["error"], "sample telemetry unavailable");

        let file = sample_file("not json");
        let sample = read_sample(file.path(), "VER");
        assert_eq!(sample["error"], "sample telemetry unavailable");
    }
}
