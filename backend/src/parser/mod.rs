//! CSV redirect sheet parser with encoding and delimiter auto-detection.
//!
//! Turns raw CSV text into an ordered sequence of [`Row`]s. The first
//! record is the header; data records are zipped against it with a relaxed
//! column count (short records lack trailing columns, surplus values are
//! dropped). After all rows exist the duplicate detector runs once.

use std::path::Path;

use crate::config::RedirectConfig;
use crate::error::{ParseError, ParseResult};
use crate::models::{RawRecord, Row, RowCounter};
use crate::validation::{conflicting_rules, detect_duplicates};

/// Delimiters the sniffer chooses between.
const DELIMITERS: [char; 2] = [',', ';'];

/// Decoded CSV text with the encoding it was read as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCsv {
    pub text: String,
    pub encoding: String,
}

/// Options for one parse run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Rows may lack the document type column or leave it empty.
    pub allow_no_doctype: bool,
    /// Keep going after a rejected row instead of failing.
    pub ignore_on_invalid_data: bool,
    /// Return duplicate rows (marked E07) instead of failing.
    pub allow_duplicates: bool,
    /// Compare duplicate identities case-insensitively.
    pub case_insensitive: bool,
    /// Index given to the first created row.
    pub first_index: usize,
}

impl ParseOptions {
    /// Options derived from the redirect configuration.
    pub fn from_config(config: &RedirectConfig, allow_duplicates: bool) -> Self {
        Self {
            allow_no_doctype: config.allow_no_doctype,
            ignore_on_invalid_data: config.ignore_on_invalid_data,
            allow_duplicates,
            case_insensitive: config.case_insensitive_redirs,
            first_index: 1,
        }
    }

    /// Start row indices at `first_index`.
    pub fn starting_at(mut self, first_index: usize) -> Self {
        self.first_index = first_index;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::from_config(&RedirectConfig::default(), false)
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding, lossily if needed.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decode uploaded bytes and normalise line endings to `\n`.
pub fn decode_bytes(bytes: &[u8]) -> DecodedCsv {
    let encoding = detect_encoding(bytes);
    let text = decode_content(bytes, &encoding).replace("\r\n", "\n");
    DecodedCsv { text, encoding }
}

/// Read a CSV file from disk, see [`decode_bytes`].
pub fn read_csv_file<P: AsRef<Path>>(path: P) -> ParseResult<DecodedCsv> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(decode_bytes(&bytes))
}

/// Pick `,` or `;` by counting occurrences in the header line.
///
/// Comma wins ties, including a header with neither.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = DELIMITERS[0];
    let mut best_count = 0;
    for &sep in &DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read the header and data records of `text`.
pub fn read_records(text: &str, delimiter: char) -> ParseResult<(Vec<String>, Vec<RawRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ParseError::MalformedCsv(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ParseError::MalformedCsv(e.to_string()))?;
        let values: Vec<&str> = record.iter().collect();
        records.push(RawRecord::new(&headers, &values));
    }

    Ok((headers, records))
}

/// Build the row sequence from raw CSV text.
///
/// `on_accept` sees every row that will produce a redirect rule,
/// `on_reject` every other row, with `None` for malformed records that do
/// not become rows at all. The returned rows keep reading order and include
/// invalid ones.
///
/// # Errors
/// - [`ParseError::EmptyInput`] for zero-length text
/// - [`ParseError::RejectedRow`] on the first rejected row unless
///   `ignore_on_invalid_data` is set
/// - [`ParseError::NoValidRows`] if no row could be created
/// - [`ParseError::DuplicatesFound`] when two enabled, valid rows share an
///   identity, unless `allow_duplicates` is set
pub fn create_rows<A, R>(
    text: &str,
    options: &ParseOptions,
    mut on_accept: A,
    mut on_reject: R,
) -> ParseResult<Vec<Row>>
where
    A: FnMut(&Row),
    R: FnMut(Option<&Row>),
{
    if text.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let delimiter = detect_delimiter(text);
    let (_, records) = read_records(text, delimiter)?;

    let mut counter = RowCounter::new(options.first_index);
    let mut rows = Vec::new();

    for record in &records {
        let Some(row) = counter.create_row(record, options.allow_no_doctype) else {
            on_reject(None);
            continue;
        };

        if row.is_valid_and_enabled() {
            on_accept(&row);
        } else {
            on_reject(Some(&row));
            if !options.ignore_on_invalid_data {
                return Err(ParseError::RejectedRow {
                    index: row.index(),
                    errors: row.errors().to_vec(),
                });
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ParseError::NoValidRows);
    }

    detect_duplicates(&mut rows, options.case_insensitive);
    if !options.allow_duplicates {
        let conflicts = conflicting_rules(&rows, options.case_insensitive);
        if !conflicts.is_empty() {
            return Err(ParseError::DuplicatesFound(conflicts.into_iter().collect()));
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;

    const FIVE_ROWS: &str = "PID,document type,URL,enabled\n\
        123-E,data,http://test.test/123-E,1\n\
        124-E,representation,http://test.test/124-E,1\n\
        125-A,data,http://test.test/125-A,0\n\
        126-A,representation,http://test.test/126-A,1\n\
        127-B,data,http://test.test/127-B,1\n";

    fn parse(text: &str, options: &ParseOptions) -> (ParseResult<Vec<Row>>, usize, usize) {
        let mut accepted = 0;
        let mut rejected = 0;
        let result = create_rows(text, options, |_| accepted += 1, |_| rejected += 1);
        (result, accepted, rejected)
    }

    #[test]
    fn test_empty_input() {
        let (result, accepted, rejected) = parse("", &ParseOptions::default());
        assert!(matches!(result, Err(ParseError::EmptyInput)));
        assert_eq!((accepted, rejected), (0, 0));
    }

    #[test]
    fn test_comma_separated() {
        let (result, accepted, rejected) = parse(FIVE_ROWS, &ParseOptions::default());
        let rows = result.unwrap();

        assert_eq!(accepted, 4);
        assert_eq!(rejected, 1);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2].pid(), "125-A");
        assert!(!rows[2].is_valid_and_enabled());
        let indices: Vec<usize> = rows.iter().map(Row::index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_semicolon_separated() {
        let text = "PID;document type;URL;enabled\n123-E;data;http://test.test/123-E;1\n";
        let (result, accepted, rejected) = parse(text, &ParseOptions::default());
        assert_eq!(result.unwrap().len(), 1);
        assert_eq!((accepted, rejected), (1, 0));
    }

    #[test]
    fn test_short_record_is_malformed() {
        let text = "PID;document type;URL;enabled\n123-Edata;http://test.test/123-E;1\n";
        let (result, accepted, rejected) = parse(text, &ParseOptions::default());
        assert!(matches!(result, Err(ParseError::NoValidRows)));
        assert_eq!((accepted, rejected), (0, 1));
    }

    #[test]
    fn test_missing_delimiters() {
        let text = "PID;document type;URL;enabled\n123-Edatahttp://test.test/123-E1\n";
        let (result, _, rejected) = parse(text, &ParseOptions::default());
        assert!(matches!(result, Err(ParseError::NoValidRows)));
        assert_eq!(rejected, 1);

        let bad_header = "POD;doctype;URL;enabled\n123-Edatahttp://test.test/123-E1\n";
        let (result, _, rejected) = parse(bad_header, &ParseOptions::default());
        assert!(matches!(result, Err(ParseError::NoValidRows)));
        assert_eq!(rejected, 1);
    }

    #[test]
    fn test_header_only() {
        let (result, _, _) = parse("PID,document type,URL,enabled\n", &ParseOptions::default());
        assert!(matches!(result, Err(ParseError::NoValidRows)));
    }

    #[test]
    fn test_duplicates_policy() {
        let text = "PID,document type,URL,enabled\n\
            123-E,data,http://test.test/123-E,1\n\
            123-E,data,http://test.test/124-E,1\n";

        let (result, accepted, rejected) = parse(text, &ParseOptions::default());
        match result {
            Err(ParseError::DuplicatesFound(ids)) => assert_eq!(ids, vec!["DATA/123-E"]),
            other => panic!("expected duplicates, got {:?}", other),
        }
        assert_eq!((accepted, rejected), (2, 0));

        let tolerant = ParseOptions {
            allow_duplicates: true,
            ..ParseOptions::default()
        };
        let (result, _, _) = parse(text, &tolerant);
        let rows = result.unwrap();
        assert_eq!(rows[1].duplicate_of(), Some(rows[0].index()));
        assert!(rows[1].has_error(ErrorCode::Duplicate));
    }

    #[test]
    fn test_disabled_row_replaced_by_enabled_one() {
        let text = "PID,document type,URL,enabled\n\
            123-E,data,http://old.test/123-E,0\n\
            123-E,data,http://new.test/123-E,1\n";

        let (result, accepted, rejected) = parse(text, &ParseOptions::default());
        let rows = result.unwrap();
        assert_eq!((accepted, rejected), (1, 1));
        assert!(rows[1].is_valid_and_enabled());
        assert_eq!(rows[1].duplicate_of(), Some(rows[0].index()));
    }

    #[test]
    fn test_strict_mode_aborts() {
        let strict = ParseOptions {
            ignore_on_invalid_data: false,
            ..ParseOptions::default()
        };
        let (result, accepted, rejected) = parse(FIVE_ROWS, &strict);
        match result {
            Err(ParseError::RejectedRow { index, errors }) => {
                assert_eq!(index, 3);
                assert!(errors.is_empty());
            }
            other => panic!("expected rejected row, got {:?}", other),
        }
        assert_eq!((accepted, rejected), (2, 1));
    }

    #[test]
    fn test_first_index_and_quotes() {
        let text = "URL,PID,enabled,document type\n\"http://test.test/a,b\",a,1,data\n";
        let options = ParseOptions::default().starting_at(2);
        let (result, accepted, _) = parse(text, &options);
        let rows = result.unwrap();

        assert_eq!(accepted, 1);
        assert_eq!(rows[0].index(), 2);
        assert_eq!(rows[0].url(), "http://test.test/a,b");
        assert_eq!(rows[0].columns(), &["B", "D", "A", "C"].map(String::from));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let text = "PID,document type,URL,enabled\na,data,http://test.test/a,1,extra,more\n";
        let (result, accepted, _) = parse(text, &ParseOptions::default());
        assert_eq!(result.unwrap().len(), 1);
        assert_eq!(accepted, 1);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_decode_bytes_normalises_newlines() {
        let decoded = decode_bytes(b"PID,URL\r\na,b\r\n");
        assert_eq!(decoded.text, "PID,URL\na,b\n");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_read_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redirects.csv");
        std::fs::write(&path, FIVE_ROWS.replace('\n', "\r\n")).unwrap();

        let decoded = read_csv_file(&path).unwrap();
        assert_eq!(decoded.text, FIVE_ROWS);

        let missing = read_csv_file(dir.path().join("nope.csv"));
        assert!(matches!(missing, Err(ParseError::Io(_))));
    }
}
