//! Cell and range references
//!
//! Accepts `A1`, `Sheet1!A1`, `A1:D5`, `Sheet1!A1:D5` (sheet names may be
//! quoted: `'Q1 Plan'!B2`). Coordinates are zero-based internally.

use crate::error::{DocfillError, DocfillResult};
use std::fmt;

/// Last addressable column (XFD) and row in an .xlsx worksheet
pub const MAX_COLUMN: u32 = 16_383;
pub const MAX_ROW: u32 = 1_048_575;

/// Zero-based (row, column) position on a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoordinate {
    pub row: u32,
    pub col: u32,
}

impl CellCoordinate {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse a one-based A1 reference (`B7`, `$B$7`)
    pub fn parse(reference: &str) -> DocfillResult<Self> {
        let trimmed = reference.trim();
        let cleaned: String = trimmed.chars().filter(|c| *c != '$').collect();

        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| DocfillError::cell_reference(trimmed, "missing row number"))?;
        let (letters, digits) = cleaned.split_at(split);

        if letters.is_empty() {
            return Err(DocfillError::cell_reference(trimmed, "missing column letters"));
        }
        let col = column_letters_to_index(letters)
            .ok_or_else(|| DocfillError::cell_reference(trimmed, "invalid column letters"))?;

        let row_number: u32 = digits
            .parse()
            .map_err(|_| DocfillError::cell_reference(trimmed, "invalid row number"))?;
        if row_number == 0 || row_number - 1 > MAX_ROW {
            return Err(DocfillError::cell_reference(trimmed, "row out of bounds"));
        }

        Ok(Self {
            row: row_number - 1,
            col,
        })
    }

    /// Render back to A1 notation
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_index_to_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for CellCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Convert column letters to a zero-based index (A→0, Z→25, AA→26)
pub fn column_letters_to_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }

    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let value = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        index = index * 26 + value;
    }

    let index = index - 1;
    if index > MAX_COLUMN {
        return None;
    }
    Some(index)
}

/// Convert a zero-based column index to letters (0→A, 25→Z, 26→AA, 702→AAA)
pub fn column_index_to_letters(index: u32) -> String {
    let mut result = String::new();
    let mut num = index;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}

/// Inclusive rectangular region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellCoordinate,
    pub end: CellCoordinate,
}

impl CellRange {
    /// Build a range; `start` must not be below or right of `end`
    pub fn new(start: CellCoordinate, end: CellCoordinate) -> DocfillResult<Self> {
        if start.row > end.row || start.col > end.col {
            return Err(DocfillError::InvalidRange(format!("{}:{}", start, end)));
        }
        Ok(Self { start, end })
    }

    pub fn single(coordinate: CellCoordinate) -> Self {
        Self {
            start: coordinate,
            end: coordinate,
        }
    }

    /// Parse `A1:D5` (no sheet prefix)
    pub fn parse(reference: &str) -> DocfillResult<Self> {
        let (start, end) = reference
            .split_once(':')
            .ok_or_else(|| DocfillError::InvalidRange(reference.to_string()))?;
        if end.contains(':') {
            return Err(DocfillError::InvalidRange(reference.to_string()));
        }
        let start = CellCoordinate::parse(start)?;
        let end = CellCoordinate::parse(end)?;
        Self::new(start, end).map_err(|_| DocfillError::InvalidRange(reference.to_string()))
    }

    pub fn rows(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn contains(&self, coordinate: CellCoordinate) -> bool {
        coordinate.row >= self.start.row
            && coordinate.row <= self.end.row
            && coordinate.col >= self.start.col
            && coordinate.col <= self.end.col
    }

    /// The top-left cell
    pub fn anchor(&self) -> CellCoordinate {
        self.start
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Split an optional `Sheet!` prefix from a reference
pub fn split_sheet(reference: &str) -> (Option<String>, &str) {
    match reference.rsplit_once('!') {
        Some((sheet, rest)) => {
            let sheet = sheet.trim();
            let sheet = sheet
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .map(|s| s.replace("''", "'"))
                .unwrap_or_else(|| sheet.to_string());
            (Some(sheet), rest.trim())
        }
        None => (None, reference.trim()),
    }
}

/// Sheet-qualified single cell (`Sheet1!A1` or `A1`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAddress {
    pub sheet: Option<String>,
    pub coordinate: CellCoordinate,
}

impl CellAddress {
    pub fn parse(reference: &str) -> DocfillResult<Self> {
        let (sheet, cell) = split_sheet(reference);
        let coordinate = CellCoordinate::parse(cell)
            .map_err(|_| DocfillError::cell_reference(reference, "expected A1-style cell"))?;
        Ok(Self { sheet, coordinate })
    }
}

/// Sheet-qualified range (`Sheet1!A1:D5` or `A1:D5`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeAddress {
    pub sheet: Option<String>,
    pub range: CellRange,
}

impl RangeAddress {
    pub fn parse(reference: &str) -> DocfillResult<Self> {
        let (sheet, range) = split_sheet(reference);
        if !range.contains(':') {
            return Err(DocfillError::InvalidRange(reference.to_string()));
        }
        let range =
            CellRange::parse(range).map_err(|_| DocfillError::InvalidRange(reference.to_string()))?;
        Ok(Self { sheet, range })
    }
}

/// Whether a mapping key targets a range rather than a single cell
pub fn is_range_reference(reference: &str) -> bool {
    split_sheet(reference).1.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_to_letters() {
        assert_eq!(column_index_to_letters(0), "A");
        assert_eq!(column_index_to_letters(25), "Z");
        assert_eq!(column_index_to_letters(26), "AA");
        assert_eq!(column_index_to_letters(51), "AZ");
        assert_eq!(column_index_to_letters(702), "AAA");
    }

    #[test]
    fn test_column_letters_to_index() {
        assert_eq!(column_letters_to_index("A"), Some(0));
        assert_eq!(column_letters_to_index("z"), Some(25));
        assert_eq!(column_letters_to_index("AB"), Some(27));
        assert_eq!(column_letters_to_index("XFD"), Some(MAX_COLUMN));
        assert_eq!(column_letters_to_index("XFE"), None);
        assert_eq!(column_letters_to_index("A1"), None);
        assert_eq!(column_letters_to_index(""), None);
    }

    #[test]
    fn test_parse_cell_coordinate() {
        assert_eq!(CellCoordinate::parse("A1").unwrap(), CellCoordinate::new(0, 0));
        assert_eq!(CellCoordinate::parse("c10").unwrap(), CellCoordinate::new(9, 2));
        assert_eq!(CellCoordinate::parse("$B$7").unwrap(), CellCoordinate::new(6, 1));
        assert!(CellCoordinate::parse("A0").is_err());
        assert!(CellCoordinate::parse("12").is_err());
        assert!(CellCoordinate::parse("AB").is_err());
        assert!(CellCoordinate::parse("A1B").is_err());
    }

    #[test]
    fn test_coordinate_round_trip_display() {
        assert_eq!(CellCoordinate::new(4, 27).to_string(), "AB5");
    }

    #[test]
    fn test_parse_range() {
        let range = CellRange::parse("A1:D5").unwrap();
        assert_eq!(range.rows(), 5);
        assert_eq!(range.cols(), 4);
        assert!(range.contains(CellCoordinate::new(4, 3)));
        assert!(!range.contains(CellCoordinate::new(5, 0)));
    }

    #[test]
    fn test_inverted_range_is_configuration_error() {
        let err = CellRange::parse("D5:A1").unwrap_err();
        assert!(matches!(err, DocfillError::InvalidRange(_)));
    }

    #[test]
    fn test_range_address_requires_colon() {
        let err = RangeAddress::parse("Sheet1!A1").unwrap_err();
        assert!(matches!(err, DocfillError::InvalidRange(_)));
    }

    #[test]
    fn test_sheet_qualified_references() {
        let addr = CellAddress::parse("Sheet2!C3").unwrap();
        assert_eq!(addr.sheet.as_deref(), Some("Sheet2"));
        assert_eq!(addr.coordinate, CellCoordinate::new(2, 2));

        let addr = CellAddress::parse("'Q1 Plan'!B2").unwrap();
        assert_eq!(addr.sheet.as_deref(), Some("Q1 Plan"));

        let range = RangeAddress::parse("Data!A2:B6").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Data"));
        assert_eq!(range.range.rows(), 5);

        let range = RangeAddress::parse("A1:B2").unwrap();
        assert!(range.sheet.is_none());
    }

    #[test]
    fn test_is_range_reference() {
        assert!(is_range_reference("A1:B2"));
        assert!(is_range_reference("Sheet1!A1:B2"));
        assert!(!is_range_reference("Sheet1!A1"));
    }
}
