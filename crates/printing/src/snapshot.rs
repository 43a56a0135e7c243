//! Serializable in-memory components.
//!
//! Snapshots describe a component the way the host would expose it at print time,
//! so it can be printed without a live host (command line, tests).

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::component::{
    CellFormatter, ColumnDescriptor, Component, FormatContext, Record, RowBodyElement,
    TableSource, TreeNode, TreeSource,
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

/// Column as described in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSnapshot {
    #[serde(default)]
    pub data_index: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub hidden: bool,
}

impl ColumnSnapshot {
    pub fn new(data_index: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            data_index: Some(data_index.into()),
            text: text.into(),
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBodySnapshot {
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshot {
    #[serde(default)]
    pub columns: Vec<ColumnSnapshot>,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub row_bodies: Vec<RowBodySnapshot>,
}

/// Node depths are assigned on construction and deserialisation. Call
/// [`TreeSnapshot::reassign_depths`] after editing `root` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TreeSnapshotFields")]
pub struct TreeSnapshot {
    pub columns: Vec<ColumnSnapshot>,
    pub root: NodeSnapshot,
    pub root_visible: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeSnapshotFields {
    #[serde(default)]
    columns: Vec<ColumnSnapshot>,
    root: NodeSnapshot,
    #[serde(default = "default_true")]
    root_visible: bool,
}

impl From<TreeSnapshotFields> for TreeSnapshot {
    fn from(fields: TreeSnapshotFields) -> Self {
        Self::new(fields.columns, fields.root, fields.root_visible)
    }
}

impl TreeSnapshot {
    pub fn new(columns: Vec<ColumnSnapshot>, root: NodeSnapshot, root_visible: bool) -> Self {
        let mut tree = Self {
            columns,
            root,
            root_visible,
        };
        tree.reassign_depths();
        tree
    }

    /// Recomputes every node depth from its position below `root`.
    pub fn reassign_depths(&mut self) {
        self.root.assign_depth(0);
    }
}

/// Tree node; depth is derived from the node's position.
/// 樹狀節點；深度由節點位置推算。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(default)]
    pub data: Record,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Defaults to "has no children".
    #[serde(default)]
    pub leaf: Option<bool>,
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
    #[serde(skip)]
    depth: usize,
}

impl NodeSnapshot {
    pub fn new(data: Value) -> Self {
        Self {
            data: data.as_object().cloned().unwrap_or_default(),
            visible: true,
            ..Self::default()
        }
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_children(mut self, children: Vec<NodeSnapshot>) -> Self {
        self.children = children;
        self
    }

    fn assign_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            child.assign_depth(depth + 1);
        }
    }
}

impl TreeNode for NodeSnapshot {
    fn data(&self) -> &Record {
        &self.data
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn is_root(&self) -> bool {
        self.depth == 0
    }

    fn is_leaf(&self) -> bool {
        self.leaf.unwrap_or(self.children.is_empty())
    }

    fn is_expanded(&self) -> bool {
        self.expanded
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        self.children
            .iter()
            .map(|child| child as &dyn TreeNode)
            .collect()
    }
}

fn default_true() -> bool {
    true
}

/// A printable component captured as plain data.
/// 以純資料擷取的可列印元件。
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSnapshot {
    /// Slash-delimited type tags, most general first.
    #[serde(default)]
    pub xtypes: String,
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub grid: Option<GridSnapshot>,
    #[serde(default)]
    pub tree: Option<TreeSnapshot>,
    #[serde(skip)]
    formatters: HashMap<String, CellFormatter>,
}

impl std::fmt::Debug for ComponentSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSnapshot")
            .field("xtypes", &self.xtypes)
            .field("id", &self.id)
            .field("title", &self.title)
            .field("grid", &self.grid)
            .field("tree", &self.tree)
            .field("formatters", &self.formatters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ComponentSnapshot {
    pub fn new(xtypes: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            xtypes: xtypes.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn from_json(input: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(input)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_grid(mut self, grid: GridSnapshot) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn with_tree(mut self, mut tree: TreeSnapshot) -> Self {
        tree.reassign_depths();
        self.tree = Some(tree);
        self
    }

    /// Attaches a formatter to every column bound to `data_index`.
    pub fn with_formatter<F>(mut self, data_index: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&Value, &FormatContext<'_>) -> String + Send + Sync + 'static,
    {
        self.formatters
            .insert(data_index.into(), std::sync::Arc::new(formatter));
        self
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        if self.id.trim().is_empty() {
            return Err(SnapshotError::Invalid("component id must not be empty".into()));
        }
        if self.grid.is_some() && self.tree.is_some() {
            return Err(SnapshotError::Invalid(format!(
                "component '{}' declares both grid and tree data",
                self.id
            )));
        }
        Ok(())
    }

    fn columns(&self, columns: &[ColumnSnapshot]) -> Vec<ColumnDescriptor> {
        columns
            .iter()
            .filter(|column| !column.hidden)
            .map(|column| ColumnDescriptor {
                data_index: column.data_index.clone(),
                text: column.text.clone(),
                formatter: column
                    .data_index
                    .as_ref()
                    .and_then(|index| self.formatters.get(index).cloned()),
            })
            .collect()
    }
}

impl Component for ComponentSnapshot {
    fn type_tags(&self) -> &str {
        &self.xtypes
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn element_html(&self) -> Option<String> {
        self.html.clone()
    }

    fn body_html(&self) -> Option<String> {
        self.body_html.clone().or_else(|| self.html.clone())
    }

    fn as_table(&self) -> Option<&dyn TableSource> {
        self.grid.as_ref().map(|_| self as &dyn TableSource)
    }

    fn as_tree(&self) -> Option<&dyn TreeSource> {
        self.tree.as_ref().map(|_| self as &dyn TreeSource)
    }
}

impl TableSource for ComponentSnapshot {
    fn visible_columns(&self, _refresh: bool) -> Vec<ColumnDescriptor> {
        self.grid
            .as_ref()
            .map(|grid| self.columns(&grid.columns))
            .unwrap_or_default()
    }

    fn records(&self) -> Vec<Record> {
        self.grid
            .as_ref()
            .map(|grid| grid.records.clone())
            .unwrap_or_default()
    }

    fn row_bodies(&self) -> Vec<RowBodyElement> {
        self.grid
            .iter()
            .flat_map(|grid| grid.row_bodies.iter())
            .map(|body| RowBodyElement {
                visible: body.visible,
                inner_html: body.html.clone(),
            })
            .collect()
    }
}

impl TreeSource for ComponentSnapshot {
    fn visible_columns(&self, _refresh: bool) -> Vec<ColumnDescriptor> {
        self.tree
            .as_ref()
            .map(|tree| self.columns(&tree.columns))
            .unwrap_or_default()
    }

    fn root(&self) -> &dyn TreeNode {
        match &self.tree {
            Some(tree) => &tree.root,
            None => &*EMPTY_ROOT,
        }
    }

    fn root_visible(&self) -> bool {
        self.tree.as_ref().is_some_and(|tree| tree.root_visible)
    }
}

static EMPTY_ROOT: Lazy<NodeSnapshot> = Lazy::new(|| NodeSnapshot {
    leaf: Some(true),
    ..NodeSnapshot::default()
});
