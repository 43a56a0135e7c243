use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Raw field values of a store record, keyed by field name.
/// 資料儲存區中單筆記錄的原始欄位值。
pub type Record = Map<String, Value>;

/// Positional context handed to a column formatter.
/// 傳遞給欄位格式化函式的位置資訊。
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    pub record: &'a Record,
    pub row_index: usize,
    pub column_index: usize,
}

/// Shared per-column value formatter. Its output is inserted into the table as markup.
/// 欄位值格式化函式，輸出內容會以標記形式插入表格。
pub type CellFormatter = Arc<dyn Fn(&Value, &FormatContext<'_>) -> String + Send + Sync>;

/// Column definition exposed by a tabular or hierarchical component.
/// 表格或樹狀元件所提供的欄位定義。
#[derive(Clone, Default)]
pub struct ColumnDescriptor {
    /// `None` marks a non-data column (row expander, checkbox...).
    pub data_index: Option<String>,
    pub text: String,
    pub formatter: Option<CellFormatter>,
}

impl ColumnDescriptor {
    pub fn new(data_index: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            data_index: Some(data_index.into()),
            text: text.into(),
            formatter: None,
        }
    }

    /// Column that occupies space in the grid but carries no data.
    pub fn non_data(text: impl Into<String>) -> Self {
        Self {
            data_index: None,
            text: text.into(),
            formatter: None,
        }
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value, &FormatContext<'_>) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Returns the data index when the column carries data.
    pub fn data_index(&self) -> Option<&str> {
        self.data_index.as_deref().filter(|index| !index.is_empty())
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("data_index", &self.data_index)
            .field("text", &self.text)
            .field("formatter", &self.formatter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Expanded secondary-content element rendered under a grid row.
/// 表格列下方展開的次要內容元素。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBodyElement {
    pub visible: bool,
    /// Inner markup of the row-body cell, when the element contains one.
    pub inner_html: Option<String>,
}

impl RowBodyElement {
    pub fn visible(inner_html: impl Into<String>) -> Self {
        Self {
            visible: true,
            inner_html: Some(inner_html.into()),
        }
    }

    pub fn hidden(inner_html: impl Into<String>) -> Self {
        Self {
            visible: false,
            inner_html: Some(inner_html.into()),
        }
    }
}

/// Host component contract consumed by the printer.
/// 印表機所使用的宿主元件介面。
pub trait Component {
    /// Slash-delimited type tags, most general first (`"component/panel/gridpanel"`).
    fn type_tags(&self) -> &str;

    fn id(&self) -> &str;

    fn title(&self) -> Option<String> {
        None
    }

    /// Inner markup of the component's rendered element.
    fn element_html(&self) -> Option<String> {
        None
    }

    /// Inner markup of the component's body region.
    fn body_html(&self) -> Option<String> {
        self.element_html()
    }

    fn as_table(&self) -> Option<&dyn TableSource> {
        None
    }

    fn as_tree(&self) -> Option<&dyn TreeSource> {
        None
    }
}

/// Flat tabular data exposed by grid-like components.
/// 表格類元件提供的平面資料。
pub trait TableSource {
    /// Currently visible columns; `refresh` forces the host to rebuild any cached column list.
    fn visible_columns(&self, refresh: bool) -> Vec<ColumnDescriptor>;

    /// Backing store records in display order.
    fn records(&self) -> Vec<Record>;

    /// Expanded row-body elements matched positionally to records.
    fn row_bodies(&self) -> Vec<RowBodyElement> {
        Vec::new()
    }
}

/// Hierarchical data exposed by tree-like components.
/// 樹狀元件提供的階層資料。
pub trait TreeSource {
    fn visible_columns(&self, refresh: bool) -> Vec<ColumnDescriptor>;

    fn root(&self) -> &dyn TreeNode;

    fn root_visible(&self) -> bool;
}

/// Single node of a [`TreeSource`].
pub trait TreeNode {
    fn data(&self) -> &Record;

    /// Depth below the root; the root itself has depth zero.
    fn depth(&self) -> usize;

    fn is_root(&self) -> bool;

    fn is_leaf(&self) -> bool;

    fn is_expanded(&self) -> bool;

    fn is_visible(&self) -> bool;

    fn children(&self) -> Vec<&dyn TreeNode>;
}

/// Ordered chain of type tags, most general first.
/// 由一般到特定排列的型別標籤鏈。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTagChain(Vec<String>);

impl TypeTagChain {
    /// Splits a `/`-delimited tag string. Returns `None` when no tag remains.
    pub fn parse(tags: &str) -> Option<Self> {
        let tags: Vec<String> = tags
            .split('/')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        if tags.is_empty() {
            None
        } else {
            Some(Self(tags))
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn most_specific(&self) -> &str {
        // Non-empty by construction.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Iterates from the most specific tag to the most general one.
    pub fn specific_first(&self) -> impl Iterator<Item = &str> {
        self.0.iter().rev().map(String::as_str)
    }
}

impl fmt::Display for TypeTagChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Deterministic print-surface name for a component.
///
/// Repeated prints of the same component address the same surface. Hyphens and
/// spaces are not valid in window names and are replaced by underscores.
pub fn surface_name(component: &dyn Component) -> String {
    match TypeTagChain::parse(component.type_tags()) {
        Some(chain) => format!(
            "print_{}_{}",
            chain.most_specific(),
            component.id().replace(['-', ' '], "_")
        ),
        None => "print".to_string(),
    }
}

/// Display string of a raw record value.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}
