use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::HospitalRecord;

pub const CSV_HEADERS: [&str; 6] = ["Name", "Address", "Phone", "Website", "Latitude", "Longitude"];

/// Wrap in double quotes, doubling any quote inside
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// One CSV line for a record. Text columns are always quoted, coordinates never.
pub fn csv_row(record: &HospitalRecord) -> String {
    [
        quoted(&record.name),
        quoted(&record.address),
        quoted(record.phone.as_deref().unwrap_or("")),
        quoted(record.website.as_deref().unwrap_or("")),
        record.latitude.to_string(),
        record.longitude.to_string(),
    ]
    .join(",")
}

/// Render the header plus one line per record, `\n` separated
pub fn to_csv(records: &[HospitalRecord]) -> String {
    std::iter::once(CSV_HEADERS.join(","))
        .chain(records.iter().map(csv_row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `hospitals_in_<city>.csv` with whitespace runs turned into underscores
pub fn export_file_name(city: &str) -> PathBuf {
    let slug = city.split_whitespace().collect::<Vec<_>>().join("_");
    PathBuf::from(format!("hospitals_in_{}.csv", slug))
}

pub fn write_csv(path: &Path, records: &[HospitalRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writer.write_all(to_csv(records).as_bytes())?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    #[test]
    fn test_quotes_are_doubled() {
        let record = HospitalRecord::new(
            "St. Mary's",
            "1 Oak \"St\", London",
            Coordinates::new(51.5, -0.12),
        );

        let row = csv_row(&record);
        assert!(row.starts_with(r#""St. Mary's","1 Oak ""St"", London""#));
        assert_eq!(row, r#""St. Mary's","1 Oak ""St"", London","","",51.5,-0.12"#);
    }

    #[test]
    fn test_to_csv() {
        let mut record = HospitalRecord::new("General", "2 High St", Coordinates::new(39.78, -89.65));
        record.phone = Some("+1 555".to_string());
        record.website = Some("https://general.example".to_string());

        let csv = to_csv(&[record]);
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], "Name,Address,Phone,Website,Latitude,Longitude");
        assert_eq!(
            lines[1],
            r#""General","2 High St","+1 555","https://general.example",39.78,-89.65"#
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(to_csv(&[]), "Name,Address,Phone,Website,Latitude,Longitude");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("New  York City"),
            PathBuf::from("hospitals_in_New_York_City.csv")
        );
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let record = HospitalRecord::new("A", "B", Coordinates::new(1.5, 2.5));

        write_csv(&path, &[record]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_csv(&[HospitalRecord::new("A", "B", Coordinates::new(1.5, 2.5))]));
    }
}
