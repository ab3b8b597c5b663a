// ABOUTME: Schema introspection for the CRM tables
// ABOUTME: Reads column metadata from information_schema and renders it as aligned text

use crate::error::{AdminError, AdminResult};
use tokio_postgres::Client;

pub const DEFAULT_TABLES: &[&str] = &["users", "companies", "company_users"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub max_length: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table: String,
    /// In declaration order (`ordinal_position`).
    pub columns: Vec<ColumnInfo>,
}

/// Get columns of a table in the `public` schema, in declaration order.
pub async fn get_table_columns(client: &Client, table: &str) -> AdminResult<Vec<ColumnInfo>> {
    let rows = client
        .query(
            "SELECT column_name::text,
                    data_type::text,
                    character_maximum_length::int4
             FROM information_schema.columns
             WHERE table_schema = 'public' AND table_name = $1
             ORDER BY ordinal_position",
            &[&table],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| ColumnInfo {
            name: row.get(0),
            data_type: row.get(1),
            max_length: row.get(2),
        })
        .collect())
}

/// Inspect each table in turn.
///
/// Stops at the first failing query; the error names the failing table and the
/// tables that were never inspected, so a partial result is never mistaken for a
/// complete one.
pub async fn inspect_tables(client: &Client, tables: &[String]) -> AdminResult<Vec<TableSchema>> {
    let mut schemas = Vec::with_capacity(tables.len());

    for (index, table) in tables.iter().enumerate() {
        match get_table_columns(client, table).await {
            Ok(columns) => schemas.push(TableSchema {
                table: table.clone(),
                columns,
            }),
            Err(e) => return Err(annotate_failure(e, table, &tables[index + 1..])),
        }
    }

    Ok(schemas)
}

/// Name the failing table and the tables never reached, keeping the error's kind and SQLSTATE.
fn annotate_failure(err: AdminError, table: &str, remaining: &[String]) -> AdminError {
    let skipped = if remaining.is_empty() {
        String::new()
    } else {
        format!("; not inspected: {}", remaining.join(", "))
    };
    err.with_context(format!("while inspecting '{}'", table), skipped)
}

/// Render one table the way the inspector prints it.
pub fn render_table(schema: &TableSchema) -> String {
    let rule = "=".repeat(60);
    let mut out = format!(
        "{}\n{} TABLE STRUCTURE\n{}\n",
        rule,
        schema.table.to_uppercase(),
        rule
    );

    if schema.columns.is_empty() {
        out.push_str("  (table not found)\n");
        return out;
    }

    for column in &schema.columns {
        let max_length = column
            .max_length
            .map(|len| len.to_string())
            .unwrap_or_default();
        let line = format!(
            "  {:<30} {:<20} {}",
            column.name, column.data_type, max_length
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

pub fn render_tables(schemas: &[TableSchema]) -> String {
    schemas
        .iter()
        .map(render_table)
        .collect::<Vec<_>>()
        .join("\n")
}
