//! Search tree nodes and their handles.

use std::collections::BTreeSet;
use std::fmt;

use crate::layout::UNKNOWN_LINE;
use crate::models::{FieldSpec, HorizontalStatus, ROOT_NAME, SearchParams, ValueType};
use crate::value::ExtractedValue;

/// Handle of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of a node in a field's search chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    /// Synthetic root holding every field.
    Root,
    /// One configured field.
    Field,
    /// Anchor match of the field's first expression.
    Line,
    /// Intermediate step for expression `i`.
    Search(usize),
    /// Last step; extracts the typed value.
    Terminal,
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeLabel::Root => f.write_str("Root"),
            NodeLabel::Field => f.write_str("Field"),
            NodeLabel::Line => f.write_str("Line"),
            NodeLabel::Search(i) => write!(f, "Search({i})"),
            NodeLabel::Terminal => f.write_str("Terminal"),
        }
    }
}

/// Non-empty ordered set of candidate line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLines(BTreeSet<u32>);

impl CandidateLines {
    /// A set holding only `line`.
    pub fn single(line: u32) -> Self {
        Self(BTreeSet::from([line]))
    }

    /// The "position unknown" sentinel.
    pub fn unknown() -> Self {
        Self::single(UNKNOWN_LINE)
    }

    /// Lowest candidate, the one resolution works on.
    pub fn primary(&self) -> u32 {
        self.0.first().copied().unwrap_or(UNKNOWN_LINE)
    }

    pub fn is_unknown(&self) -> bool {
        self.primary() == UNKNOWN_LINE
    }

    /// Replace every candidate with `line`.
    pub fn set(&mut self, line: u32) {
        self.0.clear();
        self.0.insert(line);
    }

    pub fn insert(&mut self, line: u32) {
        self.0.insert(line);
    }

    pub fn contains(&self, line: u32) -> bool {
        self.0.contains(&line)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A node of the search tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchNode {
    pub label: NodeLabel,
    /// Name of the owning field.
    pub field: String,
    pub value_type: ValueType,
    /// Regex pattern of the node's expression.
    pub pattern: String,
    /// Expected text of the match; only anchor nodes carry one.
    pub check: Option<String>,
    pub params: SearchParams,
    /// Index of the node's expression in the field's chain.
    pub expression_index: usize,
    pub lines: CandidateLines,
    /// Horizontal coordinate of the node's own match.
    pub anchor: Option<f64>,
    /// Matched table cell (row, col) of table nodes.
    pub cell: Option<(usize, usize)>,
    pub success: bool,
    /// Matched text, or the typed value on terminals.
    pub found: Option<ExtractedValue>,
    pub phonetic: bool,
    pub grid: Option<(usize, usize)>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SearchNode {
    fn blank(label: NodeLabel, field: &str) -> Self {
        Self {
            label,
            field: field.to_string(),
            value_type: ValueType::default(),
            pattern: String::new(),
            check: None,
            params: SearchParams::default(),
            expression_index: 0,
            lines: CandidateLines::unknown(),
            anchor: None,
            cell: None,
            success: false,
            found: None,
            phonetic: false,
            grid: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Self::blank(NodeLabel::Root, ROOT_NAME)
    }

    /// Field node carrying the field's check value and value type.
    pub fn field(spec: &FieldSpec) -> Self {
        Self {
            value_type: spec.value_type,
            check: spec.check_value().map(str::to_string),
            phonetic: spec.phonetic,
            grid: spec.grid_cell(),
            ..Self::blank(NodeLabel::Field, &spec.name)
        }
    }

    /// Line node at the unknown line, matching the first expression.
    pub fn line(spec: &FieldSpec) -> Option<Self> {
        let mut node = Self::step(spec, 0, NodeLabel::Line)?;
        node.check = spec.check_value().map(str::to_string);
        Some(node)
    }

    /// Chain node for expression `index`; the last expression is the terminal.
    pub fn chain(spec: &FieldSpec, index: usize) -> Option<Self> {
        let label = if index + 1 == spec.expressions.len() {
            NodeLabel::Terminal
        } else {
            NodeLabel::Search(index)
        };
        Self::step(spec, index, label)
    }

    fn step(spec: &FieldSpec, index: usize, label: NodeLabel) -> Option<Self> {
        let expression = spec.expressions.get(index)?;
        Some(Self {
            value_type: spec.value_type,
            pattern: expression.pattern.clone(),
            params: expression.params(spec.value_type),
            expression_index: index,
            phonetic: spec.phonetic,
            grid: spec.grid_cell(),
            ..Self::blank(label, &spec.name)
        })
    }

    /// Copy of this node at another line, without children or results.
    pub fn sibling_at(&self, line: u32) -> Self {
        Self {
            lines: CandidateLines::single(line),
            anchor: None,
            cell: None,
            success: false,
            found: None,
            parent: None,
            children: Vec::new(),
            ..self.clone()
        }
    }

    /// Index of the first expression of this node's children, if it may have any.
    pub fn next_expression(&self) -> Option<usize> {
        match self.label {
            NodeLabel::Line => Some(0),
            NodeLabel::Search(i) => Some(i + 1),
            NodeLabel::Root | NodeLabel::Field | NodeLabel::Terminal => None,
        }
    }

    /// Line offset relative to the parent match (positional nodes).
    pub fn line_offset(&self) -> i32 {
        match self.params {
            SearchParams::Positional { line_offset, .. } => line_offset,
            SearchParams::Table { .. } => 0,
        }
    }

    /// Horizontal scope relative to the parent anchor (positional nodes).
    pub fn status(&self) -> HorizontalStatus {
        match self.params {
            SearchParams::Positional { status, .. } => status,
            SearchParams::Table { .. } => HorizontalStatus::Whole,
        }
    }

    /// Cell offset relative to the parent match (table nodes).
    pub fn cell_offset(&self) -> (i32, i32) {
        match self.params {
            SearchParams::Table {
                row_offset,
                col_offset,
            } => (row_offset, col_offset),
            SearchParams::Positional { .. } => (0, 0),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.label == NodeLabel::Terminal
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
