use std::collections::HashMap;
use std::fmt::Write as _;

use crate::component::{display_value, ColumnDescriptor, FormatContext, Record};
use crate::renderer::RowRecord;
use crate::template::{escape_braces, CellTemplates, Template, TemplateError};

/// Header cell applied once per data column.
pub const HEADER_CELL_TEMPLATE: &str = "<th>{text}</th>";

/// Body cell applied once per data column; yields `<td>{<dataIndex>}</td>`.
pub const BODY_CELL_TEMPLATE: &str = "<td>{{{dataIndex}}}</td>";

/// Row-level field holding the hierarchical indent.
pub const INDENT_FIELD: &str = "indent";

/// Header markup and row template built for one column set.
/// 針對一組欄位所建立的表頭標記與列樣板。
#[derive(Debug, Clone)]
pub struct TableLayout {
    header: String,
    row: Template,
    column_count: usize,
}

impl TableLayout {
    /// First template pass: expands the cell templates over the data-bearing columns.
    pub fn build(
        columns: &[ColumnDescriptor],
        cells: &CellTemplates,
    ) -> Result<Self, TemplateError> {
        let mut header = String::from("<tr>");
        let mut row = String::from("<tr>");
        for column in columns {
            let Some(data_index) = column.data_index() else {
                continue;
            };
            let lookup = |name: &str| match name {
                "text" => Some(escape_braces(&column.text)),
                "dataIndex" => Some(escape_braces(data_index)),
                _ => None,
            };
            header.push_str(&cells.header.render(lookup));
            row.push_str(&cells.body.render(lookup));
        }
        header.push_str("</tr>");
        row.push_str("</tr>");

        Ok(Self {
            header: Template::parse(&header)?.render(|_| None),
            row: Template::parse(&row)?,
            column_count: columns.len(),
        })
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn row_template(&self) -> &Template {
        &self.row
    }

    /// Every visible column, data-bearing or not.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Second template pass: renders the table around the prepared rows.
    pub fn render(&self, rows: &[RowRecord]) -> String {
        let mut output = String::from("<table>");
        let _ = write!(output, "<thead>{}</thead>", self.header);
        for record in rows {
            output.push_str(&self.row.render(|name| row_field(record, name)));
            if let Some(row_body) = record.row_body.as_deref().filter(|body| !body.is_empty()) {
                let _ = write!(
                    output,
                    "<tr><td colspan=\"{}\">{}</td></tr>",
                    self.column_count, row_body
                );
            }
        }
        output.push_str("</table>");
        output
    }
}

fn row_field(record: &RowRecord, name: &str) -> Option<String> {
    if name == INDENT_FIELD {
        if let Some(indent) = &record.indent {
            return Some(indent.clone());
        }
    }
    record.values.get(name).cloned()
}

/// Formats the fields of `record` that match a visible column.
///
/// Fields without a matching column are dropped. A matching column's formatter
/// receives the raw value with the row index and the column's position among
/// all visible columns.
pub fn format_record(
    record: &Record,
    columns: &[ColumnDescriptor],
    row_index: usize,
) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for (key, value) in record {
        let Some((column_index, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.data_index() == Some(key.as_str()))
        else {
            continue;
        };
        let formatted = match &column.formatter {
            Some(formatter) => formatter(
                value,
                &FormatContext {
                    record,
                    row_index,
                    column_index,
                },
            ),
            None => display_value(value),
        };
        values.insert(key.clone(), formatted);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid_cells() -> CellTemplates {
        CellTemplates::compile(HEADER_CELL_TEMPLATE, BODY_CELL_TEMPLATE).unwrap()
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn non_data_columns_are_skipped_but_counted() {
        let columns = vec![
            ColumnDescriptor::non_data("Expander"),
            ColumnDescriptor::new("name", "Name"),
        ];
        let layout = TableLayout::build(&columns, &grid_cells()).unwrap();
        assert_eq!(layout.header(), "<tr><th>Name</th></tr>");
        assert_eq!(layout.column_count(), 2);
        let placeholders: Vec<&str> = layout.row_template().placeholders().collect();
        assert_eq!(placeholders, ["name"]);
    }

    #[test]
    fn braces_in_headers_survive_both_passes() {
        let columns = vec![ColumnDescriptor::new("total", "Total {EUR}")];
        let layout = TableLayout::build(&columns, &grid_cells()).unwrap();
        assert_eq!(layout.header(), "<tr><th>Total {EUR}</th></tr>");
    }

    #[test]
    fn row_body_spans_all_columns() {
        let columns = vec![
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::non_data(""),
        ];
        let layout = TableLayout::build(&columns, &grid_cells()).unwrap();
        let rows = vec![
            RowRecord {
                values: HashMap::from([("name".to_string(), "Alice".to_string())]),
                row_body: Some("<p>details</p>".into()),
                indent: None,
            },
            RowRecord {
                values: HashMap::from([("name".to_string(), "Bob".to_string())]),
                row_body: Some(String::new()),
                indent: None,
            },
        ];
        assert_eq!(
            layout.render(&rows),
            "<table><thead><tr><th>Name</th></tr></thead>\
             <tr><td>Alice</td></tr><tr><td colspan=\"2\"><p>details</p></td></tr>\
             <tr><td>Bob</td></tr></table>"
        );
    }

    #[test]
    fn unmatched_fields_are_dropped() {
        let columns = vec![ColumnDescriptor::new("name", "Name")];
        let values = format_record(&record(json!({"name": "Alice", "secret": 7})), &columns, 0);
        assert_eq!(values.len(), 1);
        assert_eq!(values["name"], "Alice");
    }

    #[test]
    fn formatter_sees_column_position_among_all_columns() {
        let columns = vec![
            ColumnDescriptor::non_data("Expander"),
            ColumnDescriptor::new("price", "Price").with_formatter(|value, ctx| {
                format!("{}@{}:{}", value, ctx.row_index, ctx.column_index)
            }),
        ];
        let values = format_record(&record(json!({"price": 9.5})), &columns, 4);
        assert_eq!(values["price"], "9.5@4:1");
    }
}
