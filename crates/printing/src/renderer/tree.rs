use log::debug;

use crate::component::{ColumnDescriptor, Component, TreeNode};
use crate::registry::RendererId;
use crate::renderer::table::{format_record, TableLayout, HEADER_CELL_TEMPLATE};
use crate::renderer::{missing_capability, BodyFragmentProducer, RenderError, RowRecord};
use crate::template::{shared_cache, CellTemplates};

/// Body cell for tree rows: every data cell is prefixed with the row indent.
pub const TREE_BODY_CELL_TEMPLATE: &str = "<td>{{indent}}{{{dataIndex}}}</td>";

/// Indent repeated once per depth level.
pub const DEFAULT_INDENT_UNIT: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";

const LEAF_MARKER: &str = "&nbsp;&nbsp;";
const EXPANDED_MARKER: &str = "-";
const COLLAPSED_MARKER: &str = "+";

/// Renders a tree as an indented table of its expanded, visible nodes.
/// 將樹狀元件輸出為具縮排的表格。
#[derive(Debug, Clone)]
pub struct TreeRenderer {
    id: RendererId,
    indent_unit: String,
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self {
            id: RendererId::TREE,
            indent_unit: DEFAULT_INDENT_UNIT.to_string(),
        }
    }
}

impl TreeRenderer {
    pub fn with_indent_unit(mut self, unit: impl Into<String>) -> Self {
        self.indent_unit = unit.into();
        self
    }

    /// Depth padding followed by the leaf / expanded / collapsed marker.
    pub fn indent_for(&self, node: &dyn TreeNode) -> String {
        let marker = if node.is_leaf() {
            LEAF_MARKER
        } else if node.is_expanded() {
            EXPANDED_MARKER
        } else {
            COLLAPSED_MARKER
        };
        let mut indent = self.indent_unit.repeat(node.depth());
        indent.push_str(marker);
        indent
    }

    fn collect(
        &self,
        node: &dyn TreeNode,
        walk: &mut TreeWalk<'_>,
        rows: &mut Vec<RowRecord>,
    ) {
        let expanded = node.is_expanded();
        let included = node.is_visible() && (!node.is_root() || walk.root_visible);
        if included {
            rows.push(RowRecord {
                values: format_record(node.data(), walk.columns, walk.row_index),
                row_body: None,
                indent: Some(self.indent_for(node)),
            });
        }
        // Skipped nodes still consume a row index.
        walk.row_index += 1;

        if expanded {
            for child in node.children() {
                self.collect(child, walk, rows);
            }
        }
    }
}

struct TreeWalk<'a> {
    columns: &'a [ColumnDescriptor],
    root_visible: bool,
    row_index: usize,
}

impl BodyFragmentProducer for TreeRenderer {
    fn prepare_render_data(
        &self,
        component: &dyn Component,
    ) -> Result<Vec<RowRecord>, RenderError> {
        let tree = component
            .as_tree()
            .ok_or_else(|| missing_capability(component, "hierarchical"))?;
        let columns = tree.visible_columns(true);
        let mut walk = TreeWalk {
            columns: &columns,
            root_visible: tree.root_visible(),
            row_index: 0,
        };
        let mut rows = Vec::new();
        self.collect(tree.root(), &mut walk, &mut rows);
        debug!(
            "tree '{}': {} of {} visited nodes printable",
            component.id(),
            rows.len(),
            walk.row_index
        );
        Ok(rows)
    }

    fn body_fragment(
        &self,
        component: &dyn Component,
        rows: &[RowRecord],
    ) -> Result<String, RenderError> {
        let tree = component
            .as_tree()
            .ok_or_else(|| missing_capability(component, "hierarchical"))?;
        let columns = tree.visible_columns(true);
        let cells = shared_cache().get_or_compile(&self.id, || {
            CellTemplates::compile(HEADER_CELL_TEMPLATE, TREE_BODY_CELL_TEMPLATE)
        })?;
        let layout = TableLayout::build(&columns, &cells)?;
        Ok(layout.render(rows))
    }
}
