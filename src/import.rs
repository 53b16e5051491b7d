// 📥 Record sources - built-in seed list or uploaded spreadsheet files
//
// Best-effort column mapping: one row becomes one record, unknown columns are
// ignored and bad cells fall back to defaults. Only an unreadable file fails.

use crate::catalog::Catalog;
use crate::college::{seed_colleges, CollegeRecord, CollegeType};
use crate::error::ImportError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name given to rows without one.
pub const PLACEHOLDER_NAME: &str = "Unnamed College";

// ============================================================================
// CORE TYPES
// ============================================================================

/// Where a record set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Seed,
    Csv,
    Tsv,
    Json,
}

impl SourceKind {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceKind::Seed => "Built-in list",
            SourceKind::Csv => "CSV spreadsheet",
            SourceKind::Tsv => "TSV spreadsheet",
            SourceKind::Json => "JSON export",
        }
    }

    /// Column delimiter for tabular kinds
    fn delimiter(&self) -> u8 {
        match self {
            SourceKind::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// Spreadsheet columns the importer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Name,
    Location,
    State,
    Type,
    EstablishedYear,
    Rating,
    Fees,
    Branches,
    Rank,
    Quota,
    Category,
    HostelAvailable,
    Phone,
    Website,
    Image,
}

impl Column {
    /// Map a header cell to a column, ignoring case, spaces and punctuation.
    /// "Established Year", "established_year" and "establishedYear" all match.
    pub fn from_header(header: &str) -> Option<Column> {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        let column = match key.as_str() {
            "id" => Column::Id,
            "name" | "collegename" => Column::Name,
            "location" | "city" => Column::Location,
            "state" => Column::State,
            "type" | "collegetype" => Column::Type,
            "establishedyear" | "established" | "year" => Column::EstablishedYear,
            "rating" => Column::Rating,
            "fees" | "fee" => Column::Fees,
            "branches" | "courses" => Column::Branches,
            "rank" | "cutoffrank" | "cutoff" => Column::Rank,
            "quota" => Column::Quota,
            "category" => Column::Category,
            "hostelavailable" | "hostel" => Column::HostelAvailable,
            "phone" => Column::Phone,
            "website" => Column::Website,
            "image" => Column::Image,
            _ => return None,
        };
        Some(column)
    }
}

/// Result of one import, with what had to be defaulted along the way
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub records: Vec<CollegeRecord>,
    /// Header cells that did not map to any column
    pub ignored_columns: Vec<String>,
    /// Cells that were present but could not be parsed
    pub defaulted_cells: usize,
}

impl ImportReport {
    pub fn ranked_count(&self) -> usize {
        self.records.iter().filter(|c| c.is_ranked()).count()
    }
}

// ============================================================================
// RECORD SOURCE TRAIT
// ============================================================================

/// RecordSource - produces a full working set for the catalog
pub trait RecordSource: Send + Sync {
    /// Load every record, defaulting malformed cells
    fn load(&self) -> Result<ImportReport, ImportError>;

    /// What kind of source this is
    fn kind(&self) -> SourceKind;

    /// Label shown next to the loaded catalog
    fn label(&self) -> String {
        self.kind().name().to_string()
    }
}

/// Built-in list shipped with the binary
pub struct SeedSource;

impl RecordSource for SeedSource {
    fn load(&self) -> Result<ImportReport, ImportError> {
        Ok(ImportReport {
            records: seed_colleges(),
            ..Default::default()
        })
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Seed
    }
}

/// Delimited spreadsheet export (first sheet = whole file)
pub struct DelimitedSource {
    path: PathBuf,
    kind: SourceKind,
}

impl DelimitedSource {
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        DelimitedSource {
            path: path.into(),
            kind: SourceKind::Csv,
        }
    }

    pub fn tsv(path: impl Into<PathBuf>) -> Self {
        DelimitedSource {
            path: path.into(),
            kind: SourceKind::Tsv,
        }
    }
}

impl RecordSource for DelimitedSource {
    fn load(&self) -> Result<ImportReport, ImportError> {
        let file = open(&self.path)?;
        let report = import_delimited(file, self.kind.delimiter())?;
        info!(
            path = %self.path.display(),
            records = report.records.len(),
            defaulted = report.defaulted_cells,
            "spreadsheet imported"
        );
        Ok(report)
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn label(&self) -> String {
        file_label(&self.path)
    }
}

/// JSON array of objects using the same column names
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonSource { path: path.into() }
    }
}

impl RecordSource for JsonSource {
    fn load(&self) -> Result<ImportReport, ImportError> {
        let file = open(&self.path)?;
        let report = import_json(file)?;
        info!(
            path = %self.path.display(),
            records = report.records.len(),
            "json imported"
        );
        Ok(report)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Json
    }

    fn label(&self) -> String {
        file_label(&self.path)
    }
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Detect source kind from the file extension
pub fn detect_source(path: &Path) -> Result<SourceKind, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => Ok(SourceKind::Csv),
        "tsv" | "tab" => Ok(SourceKind::Tsv),
        "json" => Ok(SourceKind::Json),
        other => Err(ImportError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            format!(".{}", other)
        })),
    }
}

/// Get the source for a file, choosing the reader from its extension
pub fn source_for_path(path: &Path) -> Result<Box<dyn RecordSource>, ImportError> {
    let source: Box<dyn RecordSource> = match detect_source(path)? {
        SourceKind::Csv => Box::new(DelimitedSource::csv(path)),
        SourceKind::Tsv => Box::new(DelimitedSource::tsv(path)),
        SourceKind::Json => Box::new(JsonSource::new(path)),
        SourceKind::Seed => Box::new(SeedSource),
    };
    Ok(source)
}

/// Working set for startup: the given file, or the built-in list.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog, ImportError> {
    let source: Box<dyn RecordSource> = match path {
        Some(path) => source_for_path(path)?,
        None => Box::new(SeedSource),
    };
    let report = source.load()?;
    Ok(Catalog::new(report.records, source.label()))
}

// ============================================================================
// READERS
// ============================================================================

/// Import delimited text from any reader. The first row is the header.
pub fn import_delimited<R: Read>(reader: R, delimiter: u8) -> Result<ImportReport, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.byte_headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::MissingHeader);
    }

    let mut report = ImportReport::default();
    let mut columns = Vec::with_capacity(headers.len());
    for header in headers.iter() {
        let header = String::from_utf8_lossy(header);
        let column = Column::from_header(&header);
        if column.is_none() && !header.trim().is_empty() {
            report.ignored_columns.push(header.trim().to_string());
        }
        columns.push(column);
    }

    if columns.iter().all(Option::is_none) {
        return Err(ImportError::NoRecognizedColumns);
    }

    let mut row_number = 0;
    let mut row = csv::ByteRecord::new();
    while reader.read_byte_record(&mut row)? {
        row_number += 1;
        let mut builder = RowBuilder::new(row_number);
        for (column, cell) in columns.iter().zip(row.iter()) {
            if let Some(column) = column {
                builder.set(*column, &String::from_utf8_lossy(cell));
            }
        }
        report.defaulted_cells += builder.defaulted;
        report.records.push(builder.finish());
    }

    Ok(report)
}

/// Import a JSON array of objects. Keys map like spreadsheet headers.
pub fn import_json<R: Read>(reader: R) -> Result<ImportReport, ImportError> {
    let rows: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate() {
        let mut builder = RowBuilder::new(index + 1);
        if let Some(object) = row.as_object() {
            for (key, value) in object {
                match Column::from_header(key) {
                    Some(column) => builder.set(column, &json_cell(value)),
                    None => {
                        if !report.ignored_columns.contains(key) {
                            report.ignored_columns.push(key.clone());
                        }
                    }
                }
            }
        } else {
            debug!(row = index + 1, "non-object json row defaulted");
        }
        report.defaulted_cells += builder.defaulted;
        report.records.push(builder.finish());
    }

    Ok(report)
}

fn json_cell(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(json_cell)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn open(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}

// ============================================================================
// ROW BUILDER
// ============================================================================

/// Accumulates one row's cells into a record with defaults applied
struct RowBuilder {
    row_number: usize,
    record: CollegeRecord,
    defaulted: usize,
}

impl RowBuilder {
    fn new(row_number: usize) -> Self {
        RowBuilder {
            row_number,
            record: CollegeRecord::default(),
            defaulted: 0,
        }
    }

    fn set(&mut self, column: Column, cell: &str) {
        let cell = cell.trim();
        let record = &mut self.record;

        match column {
            Column::Id => record.id = cell.to_string(),
            Column::Name => record.name = cell.to_string(),
            Column::Location => record.location = cell.to_string(),
            Column::State => record.state = cell.to_string(),
            Column::Type => record.college_type = CollegeType::parse(cell),
            Column::Fees => record.fees = cell.to_string(),
            Column::Quota => record.quota = cell.to_string(),
            Column::Category => record.category = cell.to_string(),
            Column::Phone => record.phone = cell.to_string(),
            Column::Website => record.website = cell.to_string(),
            Column::Image => record.image = cell.to_string(),
            Column::Branches => record.branches = split_branches(cell),
            Column::HostelAvailable => record.hostel_available = parse_flag(cell),
            Column::EstablishedYear => {
                let year = self.number(cell, "establishedYear").unwrap_or(0);
                self.record.established_year = year;
            }
            Column::Rank => {
                let rank = self.number(cell, "rank").filter(|r| *r > 0);
                self.record.rank = rank;
            }
            Column::Rating => {
                let rating = self.rating(cell);
                self.record.rating = rating;
            }
        }
    }

    /// Whole non-negative number, tolerating thousands separators and "50.0".
    fn number(&mut self, cell: &str, field: &str) -> Option<u32> {
        if cell.is_empty() {
            return None;
        }
        let cleaned: String = cell.chars().filter(|c| *c != ',' && *c != '_').collect();

        let parsed = cleaned.parse::<u32>().ok().or_else(|| {
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u32)
        });

        if parsed.is_none() {
            self.defaulted += 1;
            debug!(row = self.row_number, field, value = cell, "unparseable number defaulted");
        }
        parsed
    }

    fn rating(&mut self, cell: &str) -> f64 {
        if cell.is_empty() {
            return 0.0;
        }
        match cell.parse::<f64>() {
            Ok(r) if r.is_finite() => r.clamp(0.0, 5.0),
            _ => {
                self.defaulted += 1;
                debug!(row = self.row_number, value = cell, "unparseable rating defaulted");
                0.0
            }
        }
    }

    fn finish(mut self) -> CollegeRecord {
        if self.record.id.is_empty() {
            self.record.id = format!("row-{}", self.row_number);
        }
        if self.record.name.is_empty() {
            self.record.name = PLACEHOLDER_NAME.to_string();
        }
        self.record
    }
}

fn split_branches(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(cell: &str) -> bool {
    matches!(
        cell.to_lowercase().as_str(),
        "yes" | "y" | "true" | "1" | "available"
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_source_by_extension() {
        assert_eq!(detect_source(Path::new("colleges.csv")).unwrap(), SourceKind::Csv);
        assert_eq!(detect_source(Path::new("COLLEGES.TSV")).unwrap(), SourceKind::Tsv);
        assert_eq!(detect_source(Path::new("dump.json")).unwrap(), SourceKind::Json);
        assert!(matches!(
            detect_source(Path::new("sheet.xlsx")),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_header_mapping_variants() {
        assert_eq!(Column::from_header("Established Year"), Some(Column::EstablishedYear));
        assert_eq!(Column::from_header("established_year"), Some(Column::EstablishedYear));
        assert_eq!(Column::from_header("cutoffRank"), Some(Column::Rank));
        assert_eq!(Column::from_header(" NAME "), Some(Column::Name));
        assert_eq!(Column::from_header("principal"), None);
    }

    #[test]
    fn test_import_csv_recognized_columns() {
        let csv = "name,location,state,type,establishedYear,rating,fees,branches,rank,notes\n\
                   AIIMS,New Delhi,Delhi,Medical,1956,4.9,\"₹1,628\",\"MBBS, MD\",50,ignored\n";
        let report = import_delimited(csv.as_bytes(), b',').unwrap();

        assert_eq!(report.records.len(), 1);
        let c = &report.records[0];
        assert_eq!(c.id, "row-1");
        assert_eq!(c.name, "AIIMS");
        assert_eq!(c.college_type, CollegeType::Medical);
        assert_eq!(c.established_year, 1956);
        assert_eq!(c.fees, "₹1,628");
        assert_eq!(c.branches, vec!["MBBS", "MD"]);
        assert_eq!(c.rank, Some(50));
        assert_eq!(report.ignored_columns, vec!["notes"]);
        assert_eq!(report.defaulted_cells, 0);
    }

    #[test]
    fn test_import_defaults_bad_cells() {
        let csv = "name,establishedYear,rating,rank,branches\n\
                   ,abc,9.5,-3,\n\
                   Second,2001,not-a-number,,\n";
        let report = import_delimited(csv.as_bytes(), b',').unwrap();

        assert_eq!(report.records.len(), 2, "Malformed rows are kept, not dropped");
        let first = &report.records[0];
        assert_eq!(first.name, PLACEHOLDER_NAME);
        assert_eq!(first.established_year, 0);
        assert_eq!(first.rating, 5.0, "Rating clamped into range");
        assert_eq!(first.rank, None);
        assert!(first.branches.is_empty());

        let second = &report.records[1];
        assert_eq!(second.rating, 0.0);
        assert_eq!(second.rank, None);
        assert_eq!(report.defaulted_cells, 3);
    }

    #[test]
    fn test_import_short_rows_and_flags() {
        let csv = "id,name,hostel,rank\n\
                   a,Alpha,Yes,12.0\n\
                   b,Beta\n";
        let report = import_delimited(csv.as_bytes(), b',').unwrap();

        assert_eq!(report.records[0].rank, Some(12));
        assert!(report.records[0].hostel_available);
        assert_eq!(report.records[1].rank, None);
        assert!(!report.records[1].hostel_available);
    }

    #[test]
    fn test_import_tsv() {
        let tsv = "Name\tState\tCutoff Rank\nNIT Trichy\tTamil Nadu\t1200\n";
        let report = import_delimited(tsv.as_bytes(), b'\t').unwrap();
        assert_eq!(report.records[0].state, "Tamil Nadu");
        assert_eq!(report.records[0].rank, Some(1200));
    }

    #[test]
    fn test_import_rejects_unrecognized_header() {
        let csv = "foo,bar\n1,2\n";
        assert!(matches!(
            import_delimited(csv.as_bytes(), b','),
            Err(ImportError::NoRecognizedColumns)
        ));
    }

    #[test]
    fn test_import_json_rows() {
        let json = r#"[
            {"id": "x1", "name": "KGMU", "cutoffRank": 2400, "branches": ["MBBS", "BDS"], "hostelAvailable": true},
            {"name": "Broken", "rank": "n/a", "extra": 1},
            42
        ]"#;
        let report = import_json(json.as_bytes()).unwrap();

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[0].rank, Some(2400));
        assert_eq!(report.records[0].branches, vec!["MBBS", "BDS"]);
        assert!(report.records[0].hostel_available);
        assert_eq!(report.records[1].rank, None);
        assert_eq!(report.records[2].name, PLACEHOLDER_NAME);
        assert_eq!(report.ignored_columns, vec!["extra"]);
    }

    #[test]
    fn test_seed_source() {
        let report = SeedSource.load().unwrap();
        assert!(!report.records.is_empty());
        assert_eq!(SeedSource.kind(), SourceKind::Seed);
    }

    #[test]
    fn test_load_catalog_defaults_to_seed() {
        let catalog = load_catalog(None).unwrap();
        assert_eq!(catalog.source(), "Built-in list");
        assert_eq!(catalog.len(), seed_colleges().len());
    }

    #[test]
    fn test_delimited_source_missing_file() {
        let source = DelimitedSource::csv("/definitely/not/here.csv");
        assert!(matches!(source.load(), Err(ImportError::Io { .. })));
        assert_eq!(source.label(), "here.csv");
    }
}
