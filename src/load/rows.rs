//! Row extraction from a worksheet range

use anyhow::{Result, bail};
use calamine::{Data, Range};
use chrono::NaiveDateTime;

use crate::config::mapping::FieldMappings;

/// One value read from a spreadsheet cell, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    fn from_cell(cell: Option<&Data>) -> Self {
        match cell {
            None | Some(Data::Empty) => CellValue::Null,
            Some(Data::String(s)) => CellValue::Text(s.clone()),
            Some(Data::Int(i)) => CellValue::Int(*i),
            Some(Data::Float(f)) => CellValue::Float(*f),
            Some(Data::Bool(b)) => CellValue::Bool(*b),
            Some(Data::DateTime(dt)) => match dt.as_datetime() {
                Some(dt) => CellValue::DateTime(dt),
                // Out-of-range serial dates keep their raw serial number
                None => CellValue::Float(dt.as_f64()),
            },
            Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => CellValue::Text(s.clone()),
            // Formula errors load as their display text, e.g. "#DIV/0!"
            Some(Data::Error(e)) => CellValue::Text(e.to_string()),
        }
    }
}

/// Single-pass iterator over the data rows of a sheet.
///
/// Yields `(row_index, values)` with 1-based spreadsheet row indices, one
/// value per mapped field in mapping order. Consumed exactly once by the
/// load driver.
pub struct RowIter<'a> {
    range: &'a Range<Data>,
    mapping: &'a FieldMappings,
    next_row: u32,
    max_row: u32,
}

impl RowIter<'_> {
    /// Last data row of the sheet, 1-based
    pub fn max_row(&self) -> u32 {
        self.max_row
    }
}

impl Iterator for RowIter<'_> {
    type Item = (u32, Vec<CellValue>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row > self.max_row {
            return None;
        }
        let row = self.next_row;
        self.next_row += 1;

        let values = self
            .mapping
            .0
            .iter()
            // Spreadsheet coordinates are 1-based, the range's are 0-based
            .map(|(_, column)| CellValue::from_cell(self.range.get_value((row - 1, column - 1))))
            .collect();

        Some((row, values))
    }
}

/// Iterate the rows `skip_rows + 1 ..= max_row`, reading the mapped columns
/// of each. Fails when the sheet's row count cannot be determined.
pub fn extract_rows<'a>(
    range: &'a Range<Data>,
    skip_rows: u32,
    mapping: &'a FieldMappings,
) -> Result<RowIter<'a>> {
    let Some((end_row, _)) = range.end() else {
        bail!("Worksheet is empty, cannot determine its row count");
    };

    Ok(RowIter {
        range,
        mapping,
        next_row: skip_rows + 1,
        max_row: end_row + 1,
    })
}
