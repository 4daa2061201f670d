//! Load driver: one connection, one transaction, one insert per row

mod bind;
pub mod rows;
pub mod statement;

use std::fs::File;
use std::io::{BufReader, Write};

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Sheets};
use sqlx::{Connection, Executor, PgConnection};

use crate::config::database::DatabaseConfig;
use crate::config::mapping::MappingConfig;
use bind::ColumnType;
use statement::TableRef;

/// Run one load end to end: connect, select the sheet, then insert every
/// data row.
pub async fn run(
    db: &DatabaseConfig,
    map: &MappingConfig,
    workbook: &mut Sheets<BufReader<File>>,
    clear: bool,
) -> Result<()> {
    eprintln!("Connecting to database");
    let options = db.connect_options()?;
    let mut conn = PgConnection::connect_with(&options)
        .await
        .with_context(|| format!("Failed to connect to database \"{}\"", db.dbname))?;

    let sheet_name = workbook
        .sheet_names()
        .get(map.sheet)
        .cloned()
        .with_context(|| format!("No worksheet at index {}", map.sheet))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read worksheet: {sheet_name}"))?;

    load(&mut conn, map, &range, clear).await
}

/// Insert the sheet's data rows inside a single transaction: build and
/// prepare the statement, optionally clear the target table, bind and
/// execute once per row, commit.
///
/// Ordering is fixed as workbook open (done by the caller) → connect →
/// build statement → clear → insert. A failure at any row aborts the whole
/// transaction, including the clear.
async fn load(
    conn: &mut PgConnection,
    map: &MappingConfig,
    range: &Range<Data>,
    clear: bool,
) -> Result<()> {
    let table = TableRef::from_mapping(map);
    let insert = statement::build_insert(&table, map.mapping.fields());
    eprintln!("Generated statement:");
    eprintln!("{insert}");
    eprintln!();

    // Prepared once and reused for every row. The server infers one
    // parameter type per column here; all binds below must encode that type,
    // whatever each row's cell happens to hold.
    let prepared = conn
        .prepare(insert.as_str())
        .await
        .with_context(|| format!("Failed to prepare insert statement for {table}"))?;
    let column_types = bind::column_types(&prepared, map.mapping.len());

    let mut tx = conn.begin().await.context("Failed to begin transaction")?;

    if clear {
        eprintln!("Clearing {table}");
        sqlx::query(&statement::build_delete(&table))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to clear {table}"))?;
    }

    let row_iter = rows::extract_rows(range, map.skip_rows, &map.mapping)?;
    let max_row = row_iter.max_row();
    let mut inserted = 0u32;

    for (row_index, values) in row_iter {
        eprint!("\rInserting row {row_index} out of {max_row}");
        std::io::stderr().flush().ok();

        let mut query = sqlx::query(&insert);
        for (i, value) in values.iter().enumerate() {
            let column = column_types.get(i).copied().unwrap_or(ColumnType::Text);
            query = bind::bind_value(query, column, value).with_context(|| {
                format!(
                    "Failed to bind \"{}\" on row {row_index}",
                    map.mapping.0[i].0
                )
            })?;
        }
        query
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert row {row_index}"))?;
        inserted += 1;
    }
    eprintln!();

    tx.commit().await.context("Failed to commit transaction")?;
    log::info!("Committed {inserted} rows into {table}");
    Ok(())
}
