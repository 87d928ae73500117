use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::WriterBuilder;
use tracing::info;

use crate::measurement::Sample;

/// Header printed above the console rows.
pub const CONSOLE_HEADER: &str = "Time (s), Voltage (V), Current (A)";

const CSV_HEADER: [&str; 3] = ["elapsed_s", "voltage_V", "current_A"];

/// Write the header and one row per sample.
///
/// The header is written even if there are no samples.
pub fn write_csv<W: io::Write>(writer: W, samples: &[Sample]) -> io::Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for sample in samples {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn csv_file_name(started: DateTime<Local>) -> String {
    started.format("xdm_log_%Y-%m-%d_%H-%M-%S.csv").to_string()
}

/// Save the samples to a timestamped CSV file inside `dir`.
pub fn save_csv(
    dir: impl AsRef<Path>,
    started: DateTime<Local>,
    samples: &[Sample],
) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir.as_ref())?;
    let path = dir.as_ref().join(csv_file_name(started));

    let file = File::create(&path)?;
    write_csv(file, samples)?;

    info!("Measurements saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn samples() -> Vec<Sample> {
        vec![
            Sample {
                elapsed: Duration::ZERO,
                voltage: 1.234,
                current: Some(0.5),
            },
            Sample {
                elapsed: Duration::from_millis(1500),
                voltage: -0.25,
                current: None,
            },
        ]
    }

    #[test]
    fn header_and_rows() {
        let mut out = Vec::new();
        write_csv(&mut out, &samples()).expect("csv");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "elapsed_s,voltage_V,current_A");

        let first: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(first[0].parse::<f64>().expect("time"), 0.0);
        assert_eq!(first[1].parse::<f64>().expect("volt"), 1.234);
        assert_eq!(first[2].parse::<f64>().expect("amp"), 0.5);

        let second: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(second[0].parse::<f64>().expect("time"), 1.5);
        assert_eq!(second[2], "");
    }

    #[test]
    fn empty_run_still_has_header() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).expect("csv");
        assert_eq!(
            String::from_utf8(out).expect("utf8").trim_end(),
            "elapsed_s,voltage_V,current_A"
        );
    }

    #[test]
    fn file_name_carries_start_time() {
        let started = Local
            .with_ymd_and_hms(2025, 2, 1, 20, 46, 5)
            .single()
            .expect("local time");
        assert_eq!(csv_file_name(started), "xdm_log_2025-02-01_20-46-05.csv");
    }

    #[test]
    fn saved_into_directory() {
        let dir = std::env::temp_dir().join(format!("xdmctrl-test-{}", std::process::id()));
        let started = Local::now();
        let path = save_csv(&dir, started, &samples()).expect("save");
        assert!(path.starts_with(&dir));
        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text.lines().count(), 3);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
