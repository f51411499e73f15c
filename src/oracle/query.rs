//! Query helpers shared by the components: numeric lookups, the generic
//! `invokeSql` operation and result-set to property-list conversion.

use std::collections::HashMap;
use std::fmt::Write;

use super::connection::{QueryRows, Session};
use super::error::Result;
use super::operations::{SqlMode, SqlRequest};
use crate::plugin::{OperationResult, PropertyList, PropertyMap};

/// Runs a two-column `(name, value)` query into a name -> number map.
///
/// Rows whose value is null or not numeric are left out.
pub fn numeric_value_map(session: &dyn Session, sql: &str) -> Result<HashMap<String, f64>> {
    let rows = session.query(sql, &[])?;
    let mut values = HashMap::with_capacity(rows.len());
    for record in rows.records() {
        let (Some(name), Some(raw)) = (record.value(0), record.value(1)) else {
            continue;
        };
        match parse_number(raw) {
            Some(value) => {
                values.insert(name.to_string(), value);
            }
            None => log::trace!("Skipping non-numeric value for {}: {}", name, raw),
        }
    }
    Ok(values)
}

/// Runs a single-value query. `None` when there is no row, or the value is
/// null or not numeric.
pub fn single_numeric_value(session: &dyn Session, sql: &str, params: &[&str]) -> Result<Option<f64>> {
    let rows = session.query(sql, params)?;
    Ok(rows.first_value().and_then(parse_number))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Executes caller-supplied SQL.
///
/// Updates report `"Query updated {n} rows"` under `result`. Queries report
/// `"Query returned {n} rows"` under `result` and the rendered table under
/// `contents`.
pub fn invoke_sql(session: &dyn Session, request: &SqlRequest) -> Result<OperationResult> {
    let mut result = OperationResult::new();
    match request.mode {
        SqlMode::Update => {
            let update_count = session.execute(&request.sql, &[])?;
            log::info!("invokeSql updated {} rows", update_count);
            result.put_simple("result", format!("Query updated {} rows", update_count));
        }
        SqlMode::Query => {
            let rows = session.query(&request.sql, &[])?;
            log::info!("invokeSql returned {} rows", rows.len());
            result.put_simple("result", format!("Query returned {} rows", rows.len()));
            result.put_simple("contents", render_html_table(&rows));
        }
    }
    Ok(result)
}

/// Renders a result set as
/// `<table><th><td>col (TYPE)</td>...</th><tr><td>value</td>...</tr>...</table>`.
///
/// Nulls render as `null`; values are not escaped.
pub fn render_html_table(rows: &QueryRows) -> String {
    let mut buf = String::from("<table><th>");
    for column in &rows.columns {
        let _ = write!(buf, "<td>{} ({})</td>", column.name, column.type_name);
    }
    buf.push_str("</th>");

    for row in &rows.rows {
        buf.push_str("<tr>");
        for value in row {
            let _ = write!(buf, "<td>{}</td>", value.as_deref().unwrap_or("null"));
        }
        buf.push_str("</tr>");
    }

    buf.push_str("</table>");
    buf
}

/// Maps each row into a named property map.
///
/// `fields` pairs a property name with the column it is read from.
pub fn property_list(
    rows: &QueryRows,
    list_name: &str,
    item_name: &str,
    fields: &[(&str, &str)],
) -> PropertyList {
    let mut list = PropertyList::new(list_name);
    for record in rows.records() {
        let mut item = PropertyMap::new(item_name);
        for (property, column) in fields {
            item.put_simple(*property, record.get(column).map(str::to_string));
        }
        list.add(item);
    }
    list
}
