//! Cell-to-parameter conversion against the statement's inferred types

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use sqlx::postgres::{PgArguments, PgStatement, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Either, Postgres, Statement, TypeInfo};

use super::rows::CellValue;

/// Bind type used for one statement parameter, held for every row of the run.
///
/// Postgres fixes each parameter's type when the statement is prepared, so
/// every row must encode the same wire type per column. Letting each cell's
/// own type pick the bind would reject NULLs for non-text columns and
/// misread mixed int/float columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Numeric,
    Bool,
    Timestamp,
    TimestampTz,
    Date,
    Text,
}

impl ColumnType {
    fn of(info: &PgTypeInfo) -> Self {
        match info.name() {
            "INT2" => ColumnType::SmallInt,
            "INT4" => ColumnType::Int,
            "INT8" => ColumnType::BigInt,
            "FLOAT4" => ColumnType::Real,
            "FLOAT8" => ColumnType::Double,
            "NUMERIC" => ColumnType::Numeric,
            "BOOL" => ColumnType::Bool,
            "TIMESTAMP" => ColumnType::Timestamp,
            "TIMESTAMPTZ" => ColumnType::TimestampTz,
            "DATE" => ColumnType::Date,
            // Text family; anything more exotic gets utf8 text as well and
            // the server decides whether it fits
            _ => ColumnType::Text,
        }
    }
}

/// Parameter types the server inferred for the prepared insert, one per
/// mapped field in statement order.
pub fn column_types(statement: &PgStatement<'_>, fields: usize) -> Vec<ColumnType> {
    match statement.parameters() {
        Some(Either::Left(types)) => types.iter().map(ColumnType::of).collect(),
        _ => vec![ColumnType::Text; fields],
    }
}

/// Bind one cell as the column's wire type.
pub fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    column: ColumnType,
    value: &CellValue,
) -> Result<Query<'q, Postgres, PgArguments>> {
    Ok(match column {
        ColumnType::SmallInt => query.bind(
            to_int(value)?
                .map(i16::try_from)
                .transpose()
                .with_context(|| format!("{} does not fit a smallint column", describe(value)))?,
        ),
        ColumnType::Int => query.bind(
            to_int(value)?
                .map(i32::try_from)
                .transpose()
                .with_context(|| format!("{} does not fit an integer column", describe(value)))?,
        ),
        ColumnType::BigInt => query.bind(to_int(value)?),
        ColumnType::Real => query.bind(to_float(value)?.map(|f| f as f32)),
        ColumnType::Double => query.bind(to_float(value)?),
        ColumnType::Numeric => query.bind(to_decimal(value)?),
        ColumnType::Bool => query.bind(to_bool(value)?),
        ColumnType::Timestamp => query.bind(to_datetime(value)?),
        ColumnType::TimestampTz => query.bind(
            to_datetime(value)?.map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)),
        ),
        ColumnType::Date => query.bind(to_date(value)?),
        ColumnType::Text => query.bind(to_text(value)),
    })
}

fn to_int(value: &CellValue) -> Result<Option<i64>> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::Int(i) => Ok(Some(*i)),
        // Spreadsheets store whole numbers as floats
        CellValue::Float(f)
            if f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(f) =>
        {
            Ok(Some(*f as i64))
        }
        other => bail!("Cannot load {} into an integer column", describe(other)),
    }
}

fn to_float(value: &CellValue) -> Result<Option<f64>> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::Int(i) => Ok(Some(*i as f64)),
        CellValue::Float(f) => Ok(Some(*f)),
        other => bail!(
            "Cannot load {} into a floating-point column",
            describe(other)
        ),
    }
}

fn to_decimal(value: &CellValue) -> Result<Option<Decimal>> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::Int(i) => Ok(Some(Decimal::from(*i))),
        CellValue::Float(f) => Ok(Some(Decimal::from_f64(*f).with_context(|| {
            format!("{} does not fit a numeric column", describe(value))
        })?)),
        other => bail!("Cannot load {} into a numeric column", describe(other)),
    }
}

fn to_bool(value: &CellValue) -> Result<Option<bool>> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::Bool(b) => Ok(Some(*b)),
        CellValue::Int(0) => Ok(Some(false)),
        CellValue::Int(1) => Ok(Some(true)),
        other => bail!("Cannot load {} into a boolean column", describe(other)),
    }
}

fn to_datetime(value: &CellValue) -> Result<Option<NaiveDateTime>> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::DateTime(dt) => Ok(Some(*dt)),
        // ods workbooks surface dates as ISO text
        CellValue::Text(s) => {
            if let Ok(dt) = s.parse::<NaiveDateTime>() {
                Ok(Some(dt))
            } else if let Ok(d) = s.parse::<NaiveDate>() {
                Ok(Some(d.and_time(NaiveTime::MIN)))
            } else {
                bail!("Cannot load text {s:?} into a timestamp column")
            }
        }
        other => bail!("Cannot load {} into a timestamp column", describe(other)),
    }
}

fn to_date(value: &CellValue) -> Result<Option<NaiveDate>> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::DateTime(dt) => Ok(Some(dt.date())),
        CellValue::Text(s) => {
            if let Ok(d) = s.parse::<NaiveDate>() {
                Ok(Some(d))
            } else if let Ok(dt) = s.parse::<NaiveDateTime>() {
                Ok(Some(dt.date()))
            } else {
                bail!("Cannot load text {s:?} into a date column")
            }
        }
        other => bail!("Cannot load {} into a date column", describe(other)),
    }
}

fn to_text(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Null => None,
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Int(i) => Some(i.to_string()),
        CellValue::Float(f) => Some(f.to_string()),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::DateTime(dt) => Some(dt.to_string()),
    }
}

fn describe(value: &CellValue) -> String {
    match value {
        CellValue::Null => "a null cell".into(),
        CellValue::Text(s) => format!("text {s:?}"),
        CellValue::Int(i) => format!("number {i}"),
        CellValue::Float(f) => format!("number {f}"),
        CellValue::Bool(b) => format!("boolean {b}"),
        CellValue::DateTime(dt) => format!("datetime {dt}"),
    }
}
