use log::debug;

use crate::component::Component;
use crate::registry::RendererId;
use crate::renderer::table::{
    format_record, TableLayout, BODY_CELL_TEMPLATE, HEADER_CELL_TEMPLATE,
};
use crate::renderer::{missing_capability, BodyFragmentProducer, RenderError, RowRecord};
use crate::template::{shared_cache, CellTemplates};

/// Renders a grid as a plain table: one header row, one row per store record,
/// and a spanning row for every visible expanded row body.
/// 將表格元件輸出為簡單的 HTML 表格。
#[derive(Debug, Clone)]
pub struct GridRenderer {
    id: RendererId,
    header_cell: &'static str,
    body_cell: &'static str,
}

impl Default for GridRenderer {
    fn default() -> Self {
        Self {
            id: RendererId::GRID,
            header_cell: HEADER_CELL_TEMPLATE,
            body_cell: BODY_CELL_TEMPLATE,
        }
    }
}

impl GridRenderer {
    /// Grid renderer with its own cell templates, cached under `id`.
    ///
    /// `body_cell` is expanded per column with `{dataIndex}` in scope and must
    /// produce a template that references the row field, e.g. `<td>{{{dataIndex}}}</td>`.
    pub fn with_templates(
        id: impl Into<RendererId>,
        header_cell: &'static str,
        body_cell: &'static str,
    ) -> Self {
        Self {
            id: id.into(),
            header_cell,
            body_cell,
        }
    }

    fn cell_templates(&self) -> Result<std::sync::Arc<CellTemplates>, RenderError> {
        Ok(shared_cache().get_or_compile(&self.id, || {
            CellTemplates::compile(self.header_cell, self.body_cell)
        })?)
    }
}

impl BodyFragmentProducer for GridRenderer {
    fn prepare_render_data(
        &self,
        component: &dyn Component,
    ) -> Result<Vec<RowRecord>, RenderError> {
        let table = component
            .as_table()
            .ok_or_else(|| missing_capability(component, "tabular"))?;
        let columns = table.visible_columns(true);
        let bodies = table.row_bodies();

        let rows: Vec<RowRecord> = table
            .records()
            .iter()
            .enumerate()
            .map(|(row_index, record)| RowRecord {
                values: format_record(record, &columns, row_index),
                row_body: bodies
                    .get(row_index)
                    .filter(|body| body.visible)
                    .and_then(|body| body.inner_html.clone()),
                indent: None,
            })
            .collect();
        debug!("grid '{}': prepared {} rows", component.id(), rows.len());
        Ok(rows)
    }

    fn body_fragment(
        &self,
        component: &dyn Component,
        rows: &[RowRecord],
    ) -> Result<String, RenderError> {
        let table = component
            .as_table()
            .ok_or_else(|| missing_capability(component, "tabular"))?;
        let columns = table.visible_columns(true);
        let cells = self.cell_templates()?;
        let layout = TableLayout::build(&columns, &cells)?;
        Ok(layout.render(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ColumnDescriptor, Record, RowBodyElement, TableSource};
    use serde_json::json;
    use std::cell::Cell;

    struct People {
        columns: Vec<ColumnDescriptor>,
        records: Vec<Record>,
        bodies: Vec<RowBodyElement>,
        refreshes: Cell<usize>,
    }

    impl People {
        fn new(columns: Vec<ColumnDescriptor>) -> Self {
            let records = [json!({"name": "Alice"}), json!({"name": "Bob"})]
                .iter()
                .map(|value| value.as_object().cloned().unwrap())
                .collect();
            Self {
                columns,
                records,
                bodies: Vec::new(),
                refreshes: Cell::new(0),
            }
        }
    }

    impl TableSource for People {
        fn visible_columns(&self, refresh: bool) -> Vec<ColumnDescriptor> {
            if refresh {
                self.refreshes.set(self.refreshes.get() + 1);
            }
            self.columns.clone()
        }

        fn records(&self) -> Vec<Record> {
            self.records.clone()
        }

        fn row_bodies(&self) -> Vec<RowBodyElement> {
            self.bodies.clone()
        }
    }

    impl Component for People {
        fn type_tags(&self) -> &str {
            "component/panel/gridpanel"
        }

        fn id(&self) -> &str {
            "people"
        }

        fn as_table(&self) -> Option<&dyn TableSource> {
            Some(self)
        }
    }

    fn render(grid: &People) -> String {
        let renderer = GridRenderer::default();
        let rows = renderer.prepare_render_data(grid).unwrap();
        renderer.body_fragment(grid, &rows).unwrap()
    }

    #[test]
    fn expander_column_is_left_out_of_cells() {
        let grid = People::new(vec![
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::non_data("Expander"),
        ]);
        assert_eq!(
            render(&grid),
            "<table><thead><tr><th>Name</th></tr></thead>\
             <tr><td>Alice</td></tr><tr><td>Bob</td></tr></table>"
        );
        assert_eq!(grid.refreshes.get(), 2);
    }

    #[test]
    fn formatter_receives_row_and_column_positions() {
        let grid = People::new(vec![
            ColumnDescriptor::non_data("Expander"),
            ColumnDescriptor::new("name", "Name").with_formatter(|value, ctx| {
                format!(
                    "{}#{}/{}",
                    value.as_str().unwrap_or_default().to_uppercase(),
                    ctx.row_index,
                    ctx.column_index
                )
            }),
        ]);
        let html = render(&grid);
        assert!(html.contains("<td>ALICE#0/1</td>"));
        assert!(html.contains("<td>BOB#1/1</td>"));
    }

    #[test]
    fn only_visible_row_bodies_are_printed() {
        let mut grid = People::new(vec![
            ColumnDescriptor::non_data(""),
            ColumnDescriptor::new("name", "Name"),
        ]);
        grid.bodies = vec![
            RowBodyElement::hidden("<i>hidden</i>"),
            RowBodyElement::visible("<b>shown</b>"),
        ];
        let rows = GridRenderer::default().prepare_render_data(&grid).unwrap();
        assert_eq!(rows[0].row_body, None);
        assert_eq!(rows[1].row_body.as_deref(), Some("<b>shown</b>"));
        assert!(render(&grid).ends_with(
            "<tr><td>Bob</td></tr><tr><td colspan=\"2\"><b>shown</b></td></tr></table>"
        ));
    }

    #[test]
    fn component_without_table_is_rejected() {
        struct Plain;
        impl Component for Plain {
            fn type_tags(&self) -> &str {
                "gridpanel"
            }
            fn id(&self) -> &str {
                "plain"
            }
        }
        let err = GridRenderer::default().prepare_render_data(&Plain).unwrap_err();
        assert!(matches!(err, RenderError::MissingCapability { capability: "tabular", .. }));
    }
}
