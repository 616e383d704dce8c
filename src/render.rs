//! Documentation renderer for configuration trees.
//!
//! Walks a finalized group and produces a plain-text table for embedding
//! in generated docs. Members are partitioned into value entries and
//! subgroup entries; each partition is rendered through caller-supplied
//! column templates, either as two separate tables or as one combined,
//! definition-ordered table.
//!
//! The renderer is a pure read-only consumer of the tree; its only
//! failure mode is a column template referencing an unknown field.

use crate::error::RenderError;
use crate::group::ConfigGroup;
use crate::value::ConfigValue;
use crate::visit::{walk, Visitor};
use regex::Regex;
use std::sync::LazyLock;

/// `{field}` references inside column templates.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern"));

/// Payload reprs longer than this are cut for table cells.
const VAL_REPR_MAX: usize = 48;

/// One table column: a header plus a format string over per-entry
/// fields `{name}`, `{path}`, `{doc}`, `{value}`, `{val_repr}`,
/// `{defined_in}`.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub header: String,
    pub template: String,
}

impl ColumnSpec {
    pub fn new(header: &str, template: &str) -> Self {
        Self {
            header: header.to_string(),
            template: template.to_string(),
        }
    }
}

/// How to lay out the rendered documentation.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Columns for value entries.
    pub value_columns: Vec<ColumnSpec>,
    /// Columns for subgroup entries.
    pub group_columns: Vec<ColumnSpec>,
    /// One definition-ordered table mixing both kinds instead of two
    /// per-kind tables.
    pub combined: bool,
    /// Descend into subgroups instead of listing only direct members.
    pub recurse: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            value_columns: vec![
                ColumnSpec::new("name", "{path}"),
                ColumnSpec::new("default", "{val_repr}"),
                ColumnSpec::new("defined in", "{defined_in}"),
                ColumnSpec::new("description", "{doc}"),
            ],
            group_columns: vec![
                ColumnSpec::new("group", "[{path}]"),
                ColumnSpec::new("description", "{doc}"),
            ],
            combined: true,
            recurse: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Value,
    Group,
}

/// Field values for one table row.
struct Entry {
    kind: RowKind,
    name: String,
    path: String,
    doc: String,
    value: Option<String>,
    val_repr: Option<String>,
    defined_in: String,
}

impl Entry {
    fn from_value(name: &str, value: &ConfigValue) -> Self {
        let repr = value.value.to_string();
        Entry {
            kind: RowKind::Value,
            name: name.to_string(),
            path: value.dotted_path(),
            doc: single_line(&value.doc),
            val_repr: Some(truncate(&repr, VAL_REPR_MAX)),
            value: Some(repr),
            defined_in: value.definer.to_string(),
        }
    }

    fn from_group(name: &str, group: &ConfigGroup) -> Self {
        Entry {
            kind: RowKind::Group,
            name: name.to_string(),
            path: group.dotted_path(),
            doc: single_line(group.doc()),
            value: None,
            val_repr: None,
            defined_in: group.definer().to_string(),
        }
    }

    fn field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "path" => Some(&self.path),
            "doc" => Some(&self.doc),
            "defined_in" => Some(&self.defined_in),
            "value" => self.value.as_deref(),
            "val_repr" => self.val_repr.as_deref(),
            _ => None,
        }
    }
}

/// Render the documentation table(s) for `group`.
///
/// A partition with zero entries produces no output at all; an entirely
/// empty group renders as the empty string, never an error.
pub fn render(group: &ConfigGroup, options: &RenderOptions) -> Result<String, RenderError> {
    let entries = collect(group, options.recurse);
    if entries.is_empty() {
        return Ok(String::new());
    }

    if options.combined {
        render_combined(&entries, options)
    } else {
        render_partitioned(&entries, options)
    }
}

/// Collect entries in definition order, optionally descending.
fn collect(group: &ConfigGroup, recurse: bool) -> Vec<Entry> {
    struct Collector {
        recurse: bool,
        entries: Vec<Entry>,
    }
    impl Visitor for Collector {
        fn visit_value(&mut self, name: &str, value: &ConfigValue) {
            self.entries.push(Entry::from_value(name, value));
        }
        fn enter_group(&mut self, name: &str, group: &ConfigGroup) -> bool {
            self.entries.push(Entry::from_group(name, group));
            self.recurse
        }
    }

    let mut collector = Collector {
        recurse,
        entries: Vec::new(),
    };
    walk(group, &mut collector);
    collector.entries
}

fn expand(template: &str, entry: &Entry) -> Result<String, RenderError> {
    let mut out = String::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let whole = caps.get(0).expect("match");
        let field = &caps[1];
        out.push_str(&template[last..whole.start()]);
        match entry.field(field) {
            Some(text) => out.push_str(text),
            None => {
                return Err(RenderError::UnknownField {
                    field: field.to_string(),
                    template: template.to_string(),
                })
            }
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

fn expand_row(entry: &Entry, columns: &[ColumnSpec]) -> Result<Vec<String>, RenderError> {
    columns.iter().map(|col| expand(&col.template, entry)).collect()
}

/// Two per-kind tables, each with a header row.
fn render_partitioned(entries: &[Entry], options: &RenderOptions) -> Result<String, RenderError> {
    let mut out = String::new();
    for (kind, columns) in [
        (RowKind::Value, &options.value_columns),
        (RowKind::Group, &options.group_columns),
    ] {
        let rows: Vec<Vec<String>> = entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| expand_row(e, columns))
            .collect::<Result<_, _>>()?;
        if rows.is_empty() {
            continue;
        }

        let mut widths: Vec<usize> = columns.iter().map(|c| c.header.len()).collect();
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        if !out.is_empty() {
            out.push('\n');
        }
        push_row(
            &mut out,
            &columns.iter().map(|c| c.header.clone()).collect::<Vec<_>>(),
            &widths,
        );
        push_row(
            &mut out,
            &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
            &widths,
        );
        for row in &rows {
            push_row(&mut out, row, &widths);
        }
    }
    Ok(out)
}

/// One definition-ordered table mixing both kinds.
///
/// Column widths are computed per run of consecutive same-kind rows, so
/// the columns of one kind are free to span across rows of the other.
fn render_combined(entries: &[Entry], options: &RenderOptions) -> Result<String, RenderError> {
    let rows: Vec<(RowKind, Vec<String>)> = entries
        .iter()
        .map(|e| {
            let columns = match e.kind {
                RowKind::Value => &options.value_columns,
                RowKind::Group => &options.group_columns,
            };
            Ok((e.kind, expand_row(e, columns)?))
        })
        .collect::<Result<_, RenderError>>()?;

    let mut out = String::new();
    let mut start = 0;
    while start < rows.len() {
        let kind = rows[start].0;
        let mut end = start + 1;
        while end < rows.len() && rows[end].0 == kind {
            end += 1;
        }
        let run = &rows[start..end];

        let columns = run.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for (_, cells) in run {
            for (w, cell) in widths.iter_mut().zip(cells) {
                *w = (*w).max(cell.len());
            }
        }
        for (_, cells) in run {
            push_row(&mut out, cells, &widths);
        }
        start = end;
    }
    Ok(out)
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        if i + 1 == cells.len() {
            // No trailing padding on the last cell.
            out.push_str(cell);
        } else {
            out.push_str(&format!("{:<width$}", cell, width = *width));
        }
    }
    out.push('\n');
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Definer;
    use serde_json::json;

    fn sample() -> ConfigGroup {
        let mut g = ConfigGroup::new_root("exam settings", Definer::Class("Exam".into()));
        g.new_value("points", json!(10), "Total points awarded.").unwrap();
        let build = g.new_group("build", "Build pipeline options.").unwrap();
        build
            .new_value("latex_runs", json!(2), "LaTeX passes per document.")
            .unwrap();
        g.new_value("shuffle", json!(true), "Shuffle question order.").unwrap();
        g
    }

    #[test]
    fn empty_group_renders_to_nothing() {
        let g = ConfigGroup::new_root("", Definer::Class("Empty".into()));
        let out = render(&g, &RenderOptions::default()).unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn partitioned_tables_have_headers_and_skip_empty_partitions() {
        let options = RenderOptions {
            combined: false,
            recurse: false,
            ..RenderOptions::default()
        };
        let mut g = ConfigGroup::new_root("", Definer::Class("Exam".into()));
        g.new_value("points", json!(10), "Total points.").unwrap();

        let out = render(&g, &options).unwrap();
        assert!(out.starts_with("name"));
        assert!(out.contains("points"));
        // No group partition at all.
        assert!(!out.contains("[points]"));
        assert!(!out.contains("group"));
    }

    #[test]
    fn combined_table_keeps_definition_order() {
        let out = render(&sample(), &RenderOptions::default()).unwrap();
        let points = out.find("points").unwrap();
        let build = out.find("[build]").unwrap();
        let runs = out.find("build.latex_runs").unwrap();
        let shuffle = out.find("shuffle").unwrap();
        assert!(points < build && build < runs && runs < shuffle);
    }

    #[test]
    fn combined_widths_are_per_run() {
        // Two value rows around a group row: the value run before the
        // group and the one after are padded independently.
        let out = render(&sample(), &RenderOptions::default()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("[build]"));
    }

    #[test]
    fn unknown_field_is_an_error() {
        let options = RenderOptions {
            value_columns: vec![ColumnSpec::new("x", "{nonsense}")],
            ..RenderOptions::default()
        };
        let err = render(&sample(), &options).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nonsense"), "{msg}");
    }

    #[test]
    fn group_column_referencing_value_field_is_an_error() {
        let options = RenderOptions {
            group_columns: vec![ColumnSpec::new("g", "{val_repr}")],
            ..RenderOptions::default()
        };
        let err = render(&sample(), &options).unwrap_err();
        assert!(matches!(err, RenderError::UnknownField { .. }));
    }

    #[test]
    fn long_payloads_are_truncated() {
        let long: String = "x".repeat(200);
        let mut g = ConfigGroup::new_root("", Definer::Class("Exam".into()));
        g.new_value("blob", json!(long), "").unwrap();
        let out = render(&g, &RenderOptions::default()).unwrap();
        assert!(out.contains("..."));
        assert!(!out.contains(&"x".repeat(60)));
    }
}
