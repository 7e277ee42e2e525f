//! Positioned text: lines of text units with page coordinates.

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::models::HorizontalStatus;
use crate::phonetic::PhoneticEncoder;

/// Line number marking a position that is not known yet.
pub const UNKNOWN_LINE: u32 = 0;

/// A run of text on one line with its page position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Text content.
    pub text: String,

    /// Horizontal coordinate of the left edge.
    pub x: f64,

    /// Vertical coordinate of the top edge.
    pub y: f64,

    /// Pre-computed phonetic codes of the whole text, primary code first.
    /// Empty until the model is encoded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phonetic: Vec<String>,
}

impl TextUnit {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            phonetic: Vec::new(),
        }
    }
}

/// Bounding rectangle of a set of coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of a single point.
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    /// Grow to include a point.
    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Ordered mapping from line number to the text units on that line.
///
/// Units within a line are kept sorted by their horizontal coordinate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextModel {
    lines: BTreeMap<u32, Vec<TextUnit>>,
}

impl TextModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from plain text.
    ///
    /// Lines are numbered from 1; blank lines leave gaps. Each line is split
    /// into units at runs of two or more spaces, with the character column as
    /// x and the line number as y.
    pub fn from_text(text: &str) -> Self {
        let mut model = Self::new();
        for (index, line) in text.lines().enumerate() {
            let number = index as u32 + 1;
            for (column, unit) in split_units(line) {
                model
                    .lines
                    .entry(number)
                    .or_default()
                    .push(TextUnit::new(unit, column as f64, number as f64));
            }
        }
        model
    }

    /// Add a unit to a line, keeping the line sorted by x.
    pub fn push(&mut self, line: u32, unit: TextUnit) -> Result<(), LayoutError> {
        if line == UNKNOWN_LINE {
            return Err(LayoutError::ReservedLine);
        }
        let units = self.lines.entry(line).or_default();
        let at = units.partition_point(|u| u.x <= unit.x);
        units.insert(at, unit);
        Ok(())
    }

    /// Units on a line.
    pub fn line(&self, line: u32) -> Option<&[TextUnit]> {
        self.lines.get(&line).map(Vec::as_slice)
    }

    pub fn contains(&self, line: u32) -> bool {
        self.lines.contains_key(&line)
    }

    pub fn first_line(&self) -> Option<u32> {
        self.lines.keys().next().copied()
    }

    pub fn last_line(&self) -> Option<u32> {
        self.lines.keys().next_back().copied()
    }

    /// Check if a line number lies between the first and last line.
    pub fn in_range(&self, line: u32) -> bool {
        match (self.first_line(), self.last_line()) {
            (Some(first), Some(last)) => line >= first && line <= last,
            _ => false,
        }
    }

    /// Iterate lines in order.
    pub fn lines(&self) -> impl Iterator<Item = (u32, &[TextUnit])> {
        self.lines.iter().map(|(n, units)| (*n, units.as_slice()))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Up to `window` line numbers before and after `line`, in mapping order.
    ///
    /// `line` itself is excluded; it does not need to be present.
    pub fn neighbors(&self, line: u32, window: usize) -> Vec<u32> {
        let mut before: Vec<u32> = self
            .lines
            .range(..line)
            .rev()
            .take(window)
            .map(|(n, _)| *n)
            .collect();
        before.reverse();

        let after = self
            .lines
            .range((Bound::Excluded(line), Bound::Unbounded))
            .take(window)
            .map(|(n, _)| *n);

        before.extend(after);
        before
    }

    /// Vertical position of a line (topmost unit).
    pub fn top(&self, line: u32) -> Option<f64> {
        self.lines
            .get(&line)?
            .iter()
            .map(|u| u.y)
            .reduce(f64::min)
    }

    /// Bounding rectangle of every unit origin.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut units = self.lines.values().flatten();
        let first = units.next()?;
        let mut bounds = Bounds::point(first.x, first.y);
        for unit in units {
            bounds.include(unit.x, unit.y);
        }
        Some(bounds)
    }

    /// Store the phonetic codes of every unit.
    pub fn encode_phonetic(&mut self, encoder: &dyn PhoneticEncoder) {
        for unit in self.lines.values_mut().flatten() {
            unit.phonetic = encoder.codes(&unit.text);
        }
    }
}

fn split_units(line: &str) -> Vec<(usize, String)> {
    let chars: Vec<char> = line.chars().collect();
    let mut units = Vec::new();
    let mut start: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let gap = chars[i] == ' ' && chars.get(i + 1) == Some(&' ') || chars[i] == '\t';
        if gap {
            if let Some(s) = start.take() {
                units.push((s, chars[s..i].iter().collect::<String>().trim_end().to_string()));
            }
        } else if start.is_none() && !chars[i].is_whitespace() {
            start = Some(i);
        }
        i += 1;
    }
    if let Some(s) = start {
        units.push((s, chars[s..].iter().collect::<String>().trim_end().to_string()));
    }
    units
}

/// Narrow a line to the units a horizontal status allows.
///
/// `Right` keeps units at or after the anchor, `Left` units at or before it;
/// `Whole` and a missing anchor keep the full line. Units must be sorted by x.
pub fn units_in_scope(
    units: &[TextUnit],
    status: HorizontalStatus,
    anchor: Option<f64>,
) -> &[TextUnit] {
    let Some(anchor) = anchor else {
        return units;
    };
    match status {
        HorizontalStatus::Whole => units,
        HorizontalStatus::Right => {
            let start = units.partition_point(|u| u.x < anchor);
            &units[start..]
        }
        HorizontalStatus::Left => {
            let end = units.partition_point(|u| u.x <= anchor);
            &units[..end]
        }
    }
}
