//! Report writer: the inverse of `parser`, used to generate synthetic reports.
//!
//! Output uses Arlo-style decorated labels (`######## CONTESTS ########`),
//! sections in canonical order, a blank line between sections, and LF line
//! endings. Cells are quoted only when needed. Header names are written as-is
//! (the parser splits headers on plain commas).
//!
//! Lossy corner: a record that lacks a header column is written with an empty
//! cell, so it re-parses with that key present and empty.

use crate::csv_line::{join_fields, quote_field};
use crate::report::{Report, SectionKind, Table};

/// Render `report` in the sectioned text format.
pub fn write_report(report: &Report) -> String {
    let mut out = String::new();
    for kind in SectionKind::ALL {
        out.push_str("######## ");
        out.push_str(kind.label());
        out.push_str(" ########\n");

        if let Some(map) = report.packed(kind) {
            for (key, value) in map {
                out.push_str(&quote_field(key));
                out.push(',');
                out.push_str(&quote_field(value));
                out.push('\n');
            }
        } else if let Some(table) = report.table(kind) {
            write_table(&mut out, table);
        }
        out.push('\n');
    }
    out
}

fn write_table(out: &mut String, table: &Table) {
    if table.header.is_empty() && table.records.is_empty() {
        return;
    }
    out.push_str(&table.header.join(","));
    out.push('\n');
    for rec in &table.records {
        let cells: Vec<&str> = table
            .header
            .iter()
            .map(|col| rec.get(col).unwrap_or(""))
            .collect();
        out.push_str(&join_fields(&cells));
        out.push('\n');
    }
}
