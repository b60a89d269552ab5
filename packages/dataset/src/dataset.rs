//! Loading and saving the working dataset as CSV.

use std::fs::File;
use std::path::Path;

use station_geocoder_models::{
    Coordinates, DERIVED_COLUMNS, GeocodingStatus, LOCATION_COLUMN, Record, SUBDISTRICT_COLUMN,
};

use crate::DatasetError;

/// An ordered list of records plus the header layout to write them back
/// with.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

/// Where a header's values live on a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    Location,
    Subdistrict,
    SearchAddress,
    FormattedAddress,
    Latitude,
    Longitude,
    PlaceId,
    Status,
    Types,
    /// Position among the unrecognized columns.
    Extra(usize),
}

impl Column {
    fn classify(name: &str, extra_index: usize) -> Self {
        match name {
            LOCATION_COLUMN => Self::Location,
            SUBDISTRICT_COLUMN => Self::Subdistrict,
            "search_address" => Self::SearchAddress,
            "formatted_address" => Self::FormattedAddress,
            "latitude" => Self::Latitude,
            "longitude" => Self::Longitude,
            "place_id" => Self::PlaceId,
            "geocoding_status" => Self::Status,
            "geocoding_types" => Self::Types,
            _ => Self::Extra(extra_index),
        }
    }

    /// Classifies a header row. Unrecognized columns are numbered in order,
    /// so repeated names stay distinct.
    fn classify_all(headers: &[String]) -> Vec<Self> {
        let mut extras = 0;
        headers
            .iter()
            .map(|h| {
                let column = Self::classify(h, extras);
                if matches!(column, Self::Extra(_)) {
                    extras += 1;
                }
                column
            })
            .collect()
    }

    fn cell(&self, record: &Record) -> String {
        fn opt(value: Option<&String>) -> String {
            value.cloned().unwrap_or_default()
        }

        match self {
            Self::Location => record.location.clone(),
            Self::Subdistrict => record.subdistrict.clone(),
            Self::SearchAddress => opt(record.search_address.as_ref()),
            Self::FormattedAddress => opt(record.formatted_address.as_ref()),
            Self::Latitude => record.latitude().map(|v| v.to_string()).unwrap_or_default(),
            Self::Longitude => record.longitude().map(|v| v.to_string()).unwrap_or_default(),
            Self::PlaceId => opt(record.place_id.as_ref()),
            Self::Status => record
                .geocoding_status
                .as_ref()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            Self::Types => opt(record.geocoding_types.as_ref()),
            Self::Extra(i) => record
                .extra
                .get(*i)
                .map(|(_, value)| value.clone())
                .unwrap_or_default(),
        }
    }
}

/// Opens `path` for CSV reading, distinguishing a missing file from other
/// failures.
pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<File>, DatasetError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DatasetError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            DatasetError::Io(e)
        }
    })?;

    Ok(csv::ReaderBuilder::new().has_headers(true).from_reader(file))
}

/// Reads the header row, stripping a leading byte-order mark.
pub(crate) fn read_headers(
    reader: &mut csv::Reader<File>,
    path: &Path,
) -> Result<Vec<String>, DatasetError> {
    let headers = reader.headers().map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_coordinate(
    row: usize,
    column: &'static str,
    value: &str,
) -> Result<Option<f64>, DatasetError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| DatasetError::InvalidValue {
            row,
            column,
            value: value.to_string(),
        })
}

fn parse_record(
    row: usize,
    headers: &[String],
    columns: &[Column],
    raw: &csv::StringRecord,
) -> Result<Record, DatasetError> {
    let mut record = Record::default();
    let mut latitude = None;
    let mut longitude = None;

    for ((header, column), value) in headers.iter().zip(columns).zip(raw.iter()) {
        match column {
            Column::Location => record.location = value.to_string(),
            Column::Subdistrict => record.subdistrict = value.to_string(),
            Column::SearchAddress => record.search_address = non_empty(value),
            Column::FormattedAddress => record.formatted_address = non_empty(value),
            Column::Latitude => latitude = parse_coordinate(row, "latitude", value)?,
            Column::Longitude => longitude = parse_coordinate(row, "longitude", value)?,
            Column::PlaceId => record.place_id = non_empty(value),
            Column::Status => record.geocoding_status = non_empty(value).map(GeocodingStatus::from),
            Column::Types => record.geocoding_types = non_empty(value),
            Column::Extra(_) => record.extra.push((header.clone(), value.to_string())),
        }
    }

    record.coordinates = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        (None, None) => None,
        _ => {
            log::warn!("Row {}: dropping half-filled coordinate pair", row + 1);
            None
        }
    };

    Ok(record)
}

impl Dataset {
    /// Builds a dataset from records, writing them with `columns` followed
    /// by any derived columns that `columns` lacks.
    #[must_use]
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        let mut columns = columns;
        for derived in DERIVED_COLUMNS {
            if !columns.iter().any(|c| c == derived) {
                columns.push(derived.to_string());
            }
        }
        Self { columns, records }
    }

    /// Loads a dataset from a CSV file.
    ///
    /// # Errors
    ///
    /// * [`DatasetError::NotFound`] if the file does not exist
    /// * [`DatasetError::Read`] if the CSV is malformed
    /// * [`DatasetError::MissingColumn`] if `location` or `subdistrict` is
    ///   absent
    /// * [`DatasetError::DuplicateColumn`] if a source or derived column
    ///   appears more than once
    /// * [`DatasetError::InvalidValue`] if a coordinate cell is not a number
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let mut reader = open_reader(path)?;
        let headers = read_headers(&mut reader, path)?;

        for required in [LOCATION_COLUMN, SUBDISTRICT_COLUMN] {
            if !headers.iter().any(|h| h == required) {
                return Err(DatasetError::MissingColumn { column: required });
            }
        }

        let columns = Column::classify_all(&headers);
        for (i, column) in columns.iter().enumerate() {
            if !matches!(column, Column::Extra(_)) && columns[..i].contains(column) {
                return Err(DatasetError::DuplicateColumn {
                    column: headers[i].clone(),
                });
            }
        }

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let raw = result.map_err(|source| DatasetError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            records.push(parse_record(row, &headers, &columns, &raw)?);
        }

        log::info!("Loaded {} rows from {}", records.len(), path.display());

        Ok(Self::new(headers, records))
    }

    /// Writes the full dataset to `path`, replacing any existing file, and
    /// syncs it to disk.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Write`] if the file cannot be created,
    /// written, or synced.
    pub fn write_to(&self, path: &Path) -> Result<(), DatasetError> {
        let write_err = |source: std::io::Error| DatasetError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(|e| write_err(e.into()))?;
        writer
            .write_record(&self.columns)
            .map_err(|e| write_err(e.into()))?;

        let columns = Column::classify_all(&self.columns);
        for record in &self.records {
            writer
                .write_record(columns.iter().map(|c| c.cell(record)))
                .map_err(|e| write_err(e.into()))?;
        }

        let file = writer.into_inner().map_err(|e| write_err(e.into_error()))?;
        file.sync_all().map_err(write_err)
    }

    /// Output header order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All records, in file order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable access to all records.
    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("station_geocoder_dataset_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn appends_missing_derived_columns_after_input_columns() {
        let dir = scratch("append_columns");
        let path = dir.join("in.csv");
        std::fs::write(&path, "province,location,subdistrict\nกรุงเทพ,โรงเรียน,บางรัก\n").unwrap();

        let dataset = Dataset::load(&path).unwrap();
        let mut expected = vec!["province", "location", "subdistrict"];
        expected.extend(DERIVED_COLUMNS);
        assert_eq!(dataset.columns(), expected.as_slice());

        let record = &dataset.records()[0];
        assert_eq!(record.location, "โรงเรียน");
        assert_eq!(record.extra_value("province"), Some("กรุงเทพ"));
        assert!(record.search_address.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn round_trips_non_ascii_and_extra_columns() {
        let dir = scratch("round_trip");
        let input = dir.join("in.csv");
        let output = dir.join("out.csv");
        std::fs::write(
            &input,
            "location,note,subdistrict,latitude,longitude,geocoding_status\n\
             วัดสุทธิวราราม,\"a, b\",ช่องนนทรี,13.7052,100.5341,OK\n\
             ศาลาประชาคม,,ยานนาวา,,,\n",
        )
        .unwrap();

        let dataset = Dataset::load(&input).unwrap();
        dataset.write_to(&output).unwrap();
        let reloaded = Dataset::load(&output).unwrap();

        assert_eq!(reloaded, dataset);
        assert_eq!(reloaded.records()[0].extra_value("note"), Some("a, b"));
        assert_eq!(
            reloaded.records()[0].geocoding_status,
            Some(GeocodingStatus::Ok)
        );
        assert_eq!(reloaded.records()[1].location, "ศาลาประชาคม");

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("location,note,subdistrict,latitude,longitude,geocoding_status,"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn repeated_extra_headers_keep_their_own_values() {
        let dir = scratch("repeated_extra");
        let input = dir.join("in.csv");
        let output = dir.join("out.csv");
        std::fs::write(&input, "location,subdistrict,note,note\na,b,first,second\n").unwrap();

        let dataset = Dataset::load(&input).unwrap();
        assert_eq!(
            dataset.records()[0].extra,
            vec![
                ("note".to_string(), "first".to_string()),
                ("note".to_string(), "second".to_string()),
            ]
        );

        dataset.write_to(&output).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("location,subdistrict,note,note,"));
        assert!(lines.next().unwrap().starts_with("a,b,first,second,"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_repeated_known_headers() {
        let dir = scratch("repeated_known");
        let path = dir.join("in.csv");
        std::fs::write(&path, "location,subdistrict,latitude,latitude\na,b,1,2\n").unwrap();

        assert!(matches!(
            Dataset::load(&path),
            Err(DatasetError::DuplicateColumn { column }) if column == "latitude"
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn preserves_row_order() {
        let dir = scratch("row_order");
        let path = dir.join("in.csv");
        let mut body = String::from("location,subdistrict\n");
        for i in 0..50 {
            body.push_str(&format!("loc{i},sub{i}\n"));
        }
        std::fs::write(&path, body).unwrap();

        let dataset = Dataset::load(&path).unwrap();
        dataset.write_to(&path).unwrap();
        let reloaded = Dataset::load(&path).unwrap();

        for (i, record) in reloaded.records().iter().enumerate() {
            assert_eq!(record.location, format!("loc{i}"));
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn drops_half_filled_coordinates() {
        let dir = scratch("half_coords");
        let path = dir.join("in.csv");
        std::fs::write(&path, "location,subdistrict,latitude,longitude\na,b,13.7,\n").unwrap();

        let dataset = Dataset::load(&path).unwrap();
        assert!(dataset.records()[0].coordinates.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_non_numeric_coordinates() {
        let dir = scratch("bad_coords");
        let path = dir.join("in.csv");
        std::fs::write(&path, "location,subdistrict,latitude,longitude\na,b,north,100.5\n").unwrap();

        let err = Dataset::load(&path).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidValue { row: 0, column: "latitude", .. }
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn requires_source_columns() {
        let dir = scratch("missing_column");
        let path = dir.join("in.csv");
        std::fs::write(&path, "location,district\na,b\n").unwrap();

        assert!(matches!(
            Dataset::load(&path),
            Err(DatasetError::MissingColumn {
                column: "subdistrict"
            })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = scratch("missing_file");
        assert!(matches!(
            Dataset::load(&dir.join("absent.csv")),
            Err(DatasetError::NotFound { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn strips_byte_order_mark_from_first_header() {
        let dir = scratch("bom");
        let path = dir.join("in.csv");
        std::fs::write(&path, "\u{feff}location,subdistrict\na,b\n").unwrap();

        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.columns()[0], "location");
        assert_eq!(dataset.records()[0].location, "a");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
