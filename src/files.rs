// File codecs for a `Collection<Car>`: the `;`-delimited text format and
// the length-prefixed binary layout.
//
// Both importers APPEND to the collection they are given. Text import is
// lenient per row (bad rows become diagnostics, not failures); binary load
// is strict and all-or-nothing per call.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::collection::{handle, Collection};
use crate::error::FileError;
use crate::record::{Car, CarType, Condition};

/// Header line of the delimited-text format, split into fields.
pub const CSV_HEADER: [&str; 9] = [
    "Manufacturer",
    "Model",
    "Year",
    "Price",
    "Type",
    "Condition",
    "Scale",
    "Color",
    "LimitedEdition",
];

/// Upper bound on a single length-prefixed string in the binary format.
/// Lengths beyond this are treated as corruption rather than allocated.
const MAX_STRING_LEN: u64 = 1 << 20;

// ============================================================================
// IMPORT REPORT
// ============================================================================

/// One skipped row from a text import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based line number in the source file (the header is line 1).
    pub line: usize,
    pub reason: String,
}

/// Outcome of a text import: how many rows were appended, and which rows
/// were skipped and why. A report with skips is still a successful import.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<RowIssue>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

// ============================================================================
// DELIMITED TEXT
// ============================================================================

/// Write the full collection as `;`-delimited text to `destination`.
pub fn export_csv(collection: &Collection<Car>, destination: &Path) -> Result<(), FileError> {
    let file = File::create(destination).map_err(|source| FileError::Unavailable {
        path: destination.to_path_buf(),
        source,
    })?;
    write_csv(collection, BufWriter::new(file))
}

/// Serialize to any writer. Exposed separately so tests can target an
/// in-memory buffer.
pub fn write_csv<W: Write>(collection: &Collection<Car>, writer: W) -> Result<(), FileError> {
    let mut out = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    out.write_record(CSV_HEADER)?;
    for item in collection {
        let car = item.borrow();
        let year = car.year.to_string();
        let price = format!("{:.2}", car.price);
        out.write_record([
            car.manufacturer.as_str(),
            car.model.as_str(),
            year.as_str(),
            price.as_str(),
            car.car_type.as_str(),
            car.condition.as_str(),
            car.scale.as_str(),
            car.color.as_str(),
            if car.limited_edition { "Yes" } else { "No" },
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Read `;`-delimited text from `source`, appending every well-formed row
/// to `collection`. Rows with a wrong field count or an unparsable numeric
/// field are skipped and reported; unknown type/condition labels fall back
/// to their documented defaults.
pub fn import_csv(
    collection: &mut Collection<Car>,
    source: &Path,
) -> Result<ImportReport, FileError> {
    let file = File::open(source).map_err(|source_err| FileError::Unavailable {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    read_csv(collection, BufReader::new(file)).map_err(|err| match err {
        // Re-attach the path for the header diagnostic
        FileError::MissingHeader { .. } => FileError::MissingHeader {
            path: source.to_path_buf(),
        },
        other => other,
    })
}

/// Deserialize from any reader, appending to `collection`.
pub fn read_csv<R: Read>(
    collection: &mut Collection<Car>,
    reader: R,
) -> Result<ImportReport, FileError> {
    let mut input = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = input.records();

    // The header is mandatory; its absence fails the whole import. Row
    // problems below the header are per-row diagnostics only.
    let header = match rows.next() {
        Some(Ok(record)) => record,
        Some(Err(_)) | None => {
            return Err(FileError::MissingHeader {
                path: PathBuf::new(),
            })
        }
    };
    if header.len() != CSV_HEADER.len() || header.iter().ne(CSV_HEADER) {
        return Err(FileError::MissingHeader {
            path: PathBuf::new(),
        });
    }

    let mut report = ImportReport::default();
    for (row_index, row) in rows.enumerate() {
        let line = row_index + 2;
        let record = match row {
            Ok(record) => record,
            Err(err) => {
                skip_row(&mut report, line, format!("unreadable row: {err}"));
                continue;
            }
        };

        match parse_row(&record) {
            Ok(car) => {
                collection.add(handle(car));
                report.imported += 1;
            }
            Err(reason) => skip_row(&mut report, line, reason),
        }
    }

    Ok(report)
}

fn skip_row(report: &mut ImportReport, line: usize, reason: String) {
    warn!(line, %reason, "skipping malformed row");
    report.skipped.push(RowIssue { line, reason });
}

fn parse_row(record: &csv::StringRecord) -> Result<Car, String> {
    if record.len() != CSV_HEADER.len() {
        return Err(format!(
            "expected {} fields, got {}",
            CSV_HEADER.len(),
            record.len()
        ));
    }

    let year: i32 = record[2]
        .parse()
        .map_err(|_| format!("invalid year {:?}", &record[2]))?;
    let price: f64 = record[3]
        .parse()
        .map_err(|_| format!("invalid price {:?}", &record[3]))?;

    Ok(Car::new(
        &record[0],
        &record[1],
        year,
        price,
        CarType::parse_label_lenient(&record[4]),
        Condition::parse_label_lenient(&record[5]),
        &record[6],
        &record[7],
        &record[8] == "Yes" || &record[8] == "1",
    ))
}

// ============================================================================
// BINARY
// ============================================================================

/// Save the full collection in the fixed little-endian binary layout.
pub fn save_binary(collection: &Collection<Car>, destination: &Path) -> Result<(), FileError> {
    let file = File::create(destination).map_err(|source| FileError::Unavailable {
        path: destination.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_binary(collection, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Serialize to any writer in the binary layout:
///
/// ```text
/// count: u64 LE
/// per record:
///   manufacturer, model: u64 LE length + UTF-8 bytes
///   year: i32 LE
///   price: f64 LE
///   type, condition: u32 LE variant index
///   scale, color: u64 LE length + UTF-8 bytes
///   limited: u8 (0/1)
/// ```
///
/// No magic number, no version field, no checksum. Output is
/// byte-deterministic for a given collection.
pub fn write_binary<W: Write>(collection: &Collection<Car>, writer: &mut W) -> Result<(), FileError> {
    writer.write_all(&(collection.len() as u64).to_le_bytes())?;

    for item in collection {
        let car = item.borrow();
        write_string(writer, &car.manufacturer)?;
        write_string(writer, &car.model)?;
        writer.write_all(&car.year.to_le_bytes())?;
        writer.write_all(&car.price.to_le_bytes())?;
        writer.write_all(&car.car_type.wire_index().to_le_bytes())?;
        writer.write_all(&car.condition.wire_index().to_le_bytes())?;
        write_string(writer, &car.scale)?;
        write_string(writer, &car.color)?;
        writer.write_all(&[u8::from(car.limited_edition)])?;
    }
    Ok(())
}

/// Load records from `source`, appending them to `collection`. The load is
/// all-or-nothing: a short read or garbage field aborts with
/// [`FileError::CorruptData`] and leaves the collection untouched.
pub fn load_binary(collection: &mut Collection<Car>, source: &Path) -> Result<usize, FileError> {
    let file = File::open(source).map_err(|source_err| FileError::Unavailable {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    read_binary(collection, &mut BufReader::new(file))
}

/// Deserialize from any reader, appending to `collection` only after the
/// whole stream has decoded. Returns the number of appended records.
pub fn read_binary<R: Read>(
    collection: &mut Collection<Car>,
    reader: &mut R,
) -> Result<usize, FileError> {
    let count = read_u64(reader, 0)? as usize;

    // Decode into a scratch buffer so a mid-stream failure commits nothing.
    let mut decoded = Vec::with_capacity(count.min(1024));
    for record in 0..count {
        decoded.push(read_record(reader, record)?);
    }

    let appended = decoded.len();
    for car in decoded {
        collection.add(handle(car));
    }
    Ok(appended)
}

fn read_record<R: Read>(reader: &mut R, record: usize) -> Result<Car, FileError> {
    let manufacturer = read_string(reader, record)?;
    let model = read_string(reader, record)?;
    let year = read_i32(reader, record)?;
    let price = read_f64(reader, record)?;

    let type_index = read_u32(reader, record)?;
    let car_type = CarType::from_wire_index(type_index).ok_or_else(|| FileError::CorruptData {
        record,
        detail: format!("unknown car type index {type_index}"),
    })?;

    let condition_index = read_u32(reader, record)?;
    let condition =
        Condition::from_wire_index(condition_index).ok_or_else(|| FileError::CorruptData {
            record,
            detail: format!("unknown condition index {condition_index}"),
        })?;

    let scale = read_string(reader, record)?;
    let color = read_string(reader, record)?;
    let limited_edition = read_u8(reader, record)? != 0;

    Ok(Car::new(
        manufacturer,
        model,
        year,
        price,
        car_type,
        condition,
        scale,
        color,
        limited_edition,
    ))
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<(), FileError> {
    writer.write_all(&(value.len() as u64).to_le_bytes())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn read_string<R: Read>(reader: &mut R, record: usize) -> Result<String, FileError> {
    let len = read_u64(reader, record)?;
    if len > MAX_STRING_LEN {
        return Err(FileError::CorruptData {
            record,
            detail: format!("string length {len} exceeds limit"),
        });
    }

    let mut bytes = vec![0u8; len as usize];
    fill(reader, &mut bytes, record)?;
    String::from_utf8(bytes).map_err(|_| FileError::CorruptData {
        record,
        detail: "string field is not valid UTF-8".to_string(),
    })
}

fn read_u64<R: Read>(reader: &mut R, record: usize) -> Result<u64, FileError> {
    let mut buf = [0u8; 8];
    fill(reader, &mut buf, record)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R, record: usize) -> Result<u32, FileError> {
    let mut buf = [0u8; 4];
    fill(reader, &mut buf, record)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32<R: Read>(reader: &mut R, record: usize) -> Result<i32, FileError> {
    let mut buf = [0u8; 4];
    fill(reader, &mut buf, record)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R, record: usize) -> Result<f64, FileError> {
    let mut buf = [0u8; 8];
    fill(reader, &mut buf, record)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_u8<R: Read>(reader: &mut R, record: usize) -> Result<u8, FileError> {
    let mut buf = [0u8; 1];
    fill(reader, &mut buf, record)?;
    Ok(buf[0])
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8], record: usize) -> Result<(), FileError> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            FileError::CorruptData {
                record,
                detail: "stream ended mid-record".to_string(),
            }
        } else {
            FileError::Io(err)
        }
    })
}

// csv::Error wraps io::Error among other causes; surface it through the
// crate's error type without inventing a new variant for each cause.
impl From<csv::Error> for FileError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => FileError::Io(io_err),
            other => FileError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("csv error: {other:?}"),
            )),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
