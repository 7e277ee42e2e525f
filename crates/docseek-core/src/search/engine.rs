//! Resolution of fields against a document by walking the search tree.
//!
//! Positional fields start with a document-wide scan for their anchor, then
//! follow line offsets down the chain, retrying nearby lines when an
//! expected line does not match. Table fields match a cell and follow cell
//! offsets. Fields restricted to a grid segment are tried there first and
//! rolled back on failure.

use regex::Regex;
use tracing::{debug, trace};

use super::matcher::{Matcher, PatternCache, match_values};
use super::node::NodeId;
use super::tree::SearchTree;
use crate::error::{SearchError, TreeError};
use crate::layout::{Document, Table, TextModel, TextUnit, UNKNOWN_LINE, units_in_scope};
use crate::models::{FieldConfig, FieldSpec, ScalarType};
use crate::similarity::SimilarityScorer;
use crate::value::{ExtractedValue, ValueExtractor};

/// Lines examined on each side of a failed line.
pub const OFFSET_WINDOW: usize = 5;

/// Maximum siblings with the same label at the same line under one parent.
pub const DUPLICATE_CAP: usize = 2;

#[derive(Clone, Copy)]
struct Scope<'s> {
    text: &'s TextModel,
    tables: &'s [Table],
}

/// Walks a populated [`SearchTree`] against a document.
pub struct SearchEngine<'a> {
    tree: SearchTree,
    matcher: Matcher<'a>,
    values: &'a ValueExtractor,
    patterns: PatternCache,
}

impl<'a> SearchEngine<'a> {
    pub fn new(tree: SearchTree, scorer: &'a SimilarityScorer, values: &'a ValueExtractor) -> Self {
        Self {
            tree,
            matcher: Matcher::new(scorer),
            values,
            patterns: PatternCache::new(),
        }
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    pub fn into_tree(self) -> SearchTree {
        self.tree
    }

    /// Resolve every configured field in order.
    pub fn resolve_all(
        &mut self,
        config: &FieldConfig,
        document: &Document,
    ) -> Result<(), SearchError> {
        for spec in &config.fields {
            self.resolve_field(spec, document)?;
        }
        Ok(())
    }

    /// Resolve one field. Returns whether any terminal succeeded.
    pub fn resolve_field(
        &mut self,
        spec: &FieldSpec,
        document: &Document,
    ) -> Result<bool, SearchError> {
        let field = self.tree.field_node(&spec.name).ok_or_else(|| {
            TreeError::InvalidArgument(format!("field {} is not in the tree", spec.name))
        })?;
        debug!("Resolving field {} ({})", spec.name, spec.value_type);

        if let Some((row, col)) = spec.grid_cell() {
            match document.grid().segment(row, col) {
                Some(segment) => {
                    let snapshot = self.tree.snapshot(field);
                    let scope = Scope {
                        text: &segment.text,
                        tables: &segment.tables,
                    };
                    if self.resolve_in(field, spec, scope)? {
                        debug!("Field {} found in grid segment ({}, {})", spec.name, row, col);
                        return Ok(true);
                    }
                    debug!(
                        "Field {} not found in grid segment ({}, {}), searching the whole document",
                        spec.name, row, col
                    );
                    self.tree.restore(snapshot);
                }
                None => {
                    let (rows, cols) = document.grid().dimensions();
                    debug!(
                        "Field {} grid ({}, {}) is outside the {}x{} grid",
                        spec.name, row, col, rows, cols
                    );
                }
            }
        }

        let scope = Scope {
            text: document.text(),
            tables: document.tables(),
        };
        let found = self.resolve_in(field, spec, scope)?;
        debug!("Field {} resolved: {}", spec.name, found);
        Ok(found)
    }

    fn resolve_in(
        &mut self,
        field: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<bool, SearchError> {
        if spec.value_type.is_table() {
            self.resolve_table_field(field, spec, scope)?;
        } else {
            self.resolve_positional_field(field, spec, scope)?;
        }
        Ok(self.tree[field].success)
    }

    fn resolve_positional_field(
        &mut self,
        field: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<(), SearchError> {
        let unknown: Vec<NodeId> = self
            .tree
            .children(field)
            .iter()
            .copied()
            .filter(|c| self.tree[*c].lines.is_unknown())
            .collect();
        for sentinel in unknown {
            self.resolve_undefined(field, sentinel, spec, scope)?;
        }

        let lines = self.tree.children(field).to_vec();
        for line in lines {
            if !self.tree[line].lines.is_unknown() {
                self.resolve_node(line, spec, scope)?;
            }
        }
        Ok(())
    }

    /// Replace the unknown-line sentinel with the best-scoring anchors.
    fn resolve_undefined(
        &mut self,
        field: NodeId,
        sentinel: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<(), SearchError> {
        let template = self.tree[sentinel].clone();
        let re = self.patterns.get(&template.field, &template.pattern)?;
        let check = template.check.as_deref();
        let candidates = self.matcher.scan_undefined(scope.text, &re, check, template.phonetic);

        let Some(best) = candidates.first() else {
            debug!("No anchor found for field {}", template.field);
            return Ok(());
        };
        debug!(
            "Field {}: {} anchor(s) with score {:.3}",
            template.field,
            candidates.len(),
            best.score
        );

        self.tree.detach(sentinel);
        for candidate in candidates {
            let mut line = template.sibling_at(candidate.line);
            line.anchor = Some(candidate.x);
            line.found = Some(ExtractedValue::Valid(candidate.value));
            self.tree.add_child(field, line)?;
        }
        self.tree.build_chain(field, spec, 0)?;
        Ok(())
    }

    fn resolve_node(
        &mut self,
        id: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<(), SearchError> {
        let node = &self.tree[id];
        if node.is_terminal() {
            return self.resolve_terminal(id, spec, scope);
        }
        if node.found.is_some() {
            return self.propagate(id, spec, scope);
        }

        let (line, status, phonetic) = (node.lines.primary(), node.status(), node.phonetic);
        let check = node.check.clone();
        let re = self.pattern(id)?;
        let anchor = self.parent_anchor(id);

        let matched = scope.text.line(line).and_then(|units| {
            let units = units_in_scope(units, status, anchor);
            self.matcher.test_contents(units, &re, check.as_deref(), phonetic)
        });

        match matched {
            Some(m) => {
                let node = &mut self.tree[id];
                node.anchor = Some(m.x);
                node.found = Some(ExtractedValue::Valid(m.value));
                self.propagate(id, spec, scope)
            }
            None => {
                trace!(
                    "{} of field {} did not match line {}",
                    self.tree[id].label, spec.name, line
                );
                self.offset_search(id, spec, scope)
            }
        }
    }

    /// Position every child relative to a matched node and resolve it.
    fn propagate(
        &mut self,
        id: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<(), SearchError> {
        let line = self.tree[id].lines.primary();
        let children = self.tree.children(id).to_vec();
        for child in children {
            let offset = self.tree[child].line_offset();
            let target = match line.checked_add_signed(offset) {
                Some(target) if target != UNKNOWN_LINE && scope.text.in_range(target) => target,
                _ => {
                    trace!("Line {} {:+} is outside the document", line, offset);
                    continue;
                }
            };
            self.tree[child].lines.set(target);
            self.resolve_node(child, spec, scope)?;
        }
        Ok(())
    }

    fn resolve_terminal(
        &mut self,
        id: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<(), SearchError> {
        let node = &self.tree[id];
        let (line, status, scalar) = (node.lines.primary(), node.status(), node.value_type.scalar);
        let re = self.pattern(id)?;
        let anchor = self.parent_anchor(id);

        let value = scope.text.line(line).and_then(|units| {
            self.extract_from_units(units_in_scope(units, status, anchor), &re, scalar)
        });

        match value {
            Some(value) => {
                trace!("Field {} extracted {:?} at line {}", spec.name, value, line);
                self.tree[id].found = Some(value);
                self.tree.mark_success(id);
                Ok(())
            }
            None => self.offset_search(id, spec, scope),
        }
    }

    /// First valid typed value in the units, else the first placeholder.
    fn extract_from_units(
        &self,
        units: &[TextUnit],
        re: &Regex,
        scalar: ScalarType,
    ) -> Option<ExtractedValue> {
        let mut fallback = None;
        for unit in units {
            for caps in re.captures_iter(&unit.text) {
                let value = self.values.extract(&caps, scalar);
                if value.is_valid() {
                    return Some(value);
                }
                fallback.get_or_insert(value);
            }
        }
        fallback
    }

    /// Try the lines around a failed node and add every match as a sibling.
    fn offset_search(
        &mut self,
        id: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<(), SearchError> {
        let Some(parent) = self.tree.parent(id) else {
            return Ok(());
        };
        let node = self.tree[id].clone();
        let re = self.patterns.get(&node.field, &node.pattern)?;
        let anchor = self.tree[parent].anchor;
        let line = node.lines.primary();
        let check = node.check.as_deref();

        let neighbors = scope.text.neighbors(line, OFFSET_WINDOW);
        let mut added = 0;
        for neighbor in neighbors {
            let Some(units) = scope.text.line(neighbor) else {
                continue;
            };
            let units = units_in_scope(units, node.status(), anchor);

            if node.is_terminal() {
                let Some(value) = self.extract_from_units(units, &re, node.value_type.scalar) else {
                    continue;
                };
                if self.tree.count_at_line(parent, node.label, neighbor) >= DUPLICATE_CAP {
                    continue;
                }
                let mut sibling = node.sibling_at(neighbor);
                sibling.found = Some(value);
                let sibling = self.tree.add_child(parent, sibling)?;
                self.tree.mark_success(sibling);
            } else {
                let Some(m) = self.matcher.test_contents(units, &re, check, node.phonetic) else {
                    continue;
                };
                if self.tree.count_at_line(parent, node.label, neighbor) >= DUPLICATE_CAP {
                    continue;
                }
                let mut sibling = node.sibling_at(neighbor);
                sibling.anchor = Some(m.x);
                sibling.found = Some(ExtractedValue::Valid(m.value));
                let sibling = self.tree.add_child(parent, sibling)?;
                if let Some(next) = self.tree[sibling].next_expression() {
                    self.tree.build_chain(sibling, spec, next)?;
                }
                self.propagate(sibling, spec, scope)?;
            }
            added += 1;
        }

        debug!(
            "Offset search for {} of field {} around line {}: {} sibling(s)",
            node.label, node.field, line, added
        );
        Ok(())
    }

    fn resolve_table_field(
        &mut self,
        field: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<(), SearchError> {
        let lines = self.tree.children(field).to_vec();
        for line in lines {
            if self.resolve_table_line(line, spec, scope)? {
                break;
            }
        }
        Ok(())
    }

    /// Match the anchor cell, then follow the chain's cell offsets.
    ///
    /// Only the first table holding a matching cell is used; when the chain
    /// does not resolve there the field stays empty.
    fn resolve_table_line(
        &mut self,
        line: NodeId,
        spec: &FieldSpec,
        scope: Scope<'_>,
    ) -> Result<bool, SearchError> {
        let node = self.tree[line].clone();
        let re = self.patterns.get(&node.field, &node.pattern)?;
        let matcher = self.matcher;

        let matched = scope.tables.iter().enumerate().find_map(|(index, table)| {
            table.cells().find_map(|cell| {
                matcher
                    .match_cell(&cell.content, &re, node.check.as_deref(), node.phonetic)
                    .map(|value| (index, table, (cell.row, cell.col), value))
            })
        });
        let Some((index, table, (row, col), value)) = matched else {
            debug!("No table cell matches field {}", spec.name);
            return Ok(false);
        };

        let snapshot = self.tree.snapshot(line);
        let anchor = &mut self.tree[line];
        anchor.cell = Some((row, col));
        anchor.anchor = Some(col as f64);
        anchor.found = Some(ExtractedValue::Valid(value));

        if self.walk_table_chain(line, table, (row, col))? {
            debug!(
                "Field {} resolved in table {} from cell ({}, {})",
                spec.name, index, row, col
            );
            return Ok(true);
        }
        debug!(
            "Field {} does not resolve in table {} from cell ({}, {})",
            spec.name, index, row, col
        );
        self.tree.restore(snapshot);
        Ok(false)
    }

    fn walk_table_chain(
        &mut self,
        from: NodeId,
        table: &Table,
        start: (usize, usize),
    ) -> Result<bool, SearchError> {
        let (mut current, (mut row, mut col)) = (from, start);
        loop {
            let Some(&next) = self.tree.children(current).first() else {
                return Ok(false);
            };
            let (dr, dc) = self.tree[next].cell_offset();
            let Some((r, c)) = table.offset(row, col, dr, dc) else {
                return Ok(false);
            };
            let text = table.text_at(r, c).unwrap_or("");
            let re = self.pattern(next)?;

            if self.tree[next].is_terminal() {
                let scalar = self.tree[next].value_type.scalar;
                let value = match re.captures(text) {
                    Some(caps) => self.values.extract(&caps, scalar),
                    None => self.values.extract_str(text, scalar),
                };
                let node = &mut self.tree[next];
                node.cell = Some((r, c));
                node.anchor = Some(c as f64);
                node.found = Some(value);
                self.tree.mark_success(next);
                return Ok(true);
            }

            let Some(value) = match_values(&re, text).into_iter().next() else {
                return Ok(false);
            };
            let node = &mut self.tree[next];
            node.cell = Some((r, c));
            node.anchor = Some(c as f64);
            node.found = Some(ExtractedValue::Valid(value));
            (current, row, col) = (next, r, c);
        }
    }

    fn pattern(&mut self, id: NodeId) -> Result<Regex, SearchError> {
        let node = &self.tree[id];
        self.patterns.get(&node.field, &node.pattern)
    }

    fn parent_anchor(&self, id: NodeId) -> Option<f64> {
        self.tree.parent(id).and_then(|p| self.tree[p].anchor)
    }
}
