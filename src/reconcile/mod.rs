//! Column alignment across export pages.
//!
//! JIRA renders multi-valued fields (components, labels, fix versions, ...) as
//! a run of adjacent columns sharing one label, one column per value. The run
//! length depends on the largest value count among the issues of a page, so
//! two pages of the same filter can disagree on it. Every page is padded to the
//! widest run seen for each field so the concatenated rows line up.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::model::{Cell, Page, Row, UnifiedTable};

/// Identifies a field group across pages. `occurrence` counts the earlier
/// groups with the same label in the same header, so that a label split by
/// other columns keeps its two groups apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub label: String,
    pub occurrence: usize,
}

/// A maximal run of adjacent header cells carrying the same label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup {
    pub key: GroupKey,
    /// Index of the first column of the run within its page.
    pub start: usize,
    pub width: usize,
}

impl FieldGroup {
    pub fn label(&self) -> &str {
        &self.key.label
    }
}

/// Splits a header into field groups with a single left-to-right scan.
pub fn segment_header(header: &[String]) -> Vec<FieldGroup> {
    let mut groups: Vec<FieldGroup> = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for (index, label) in header.iter().enumerate() {
        if let Some(last) = groups.last_mut() {
            if last.key.label == *label {
                last.width += 1;
                continue;
            }
        }

        let occurrence = seen.entry(label.as_str()).or_insert(0);
        groups.push(FieldGroup {
            key: GroupKey {
                label: label.clone(),
                occurrence: *occurrence,
            },
            start: index,
            width: 1,
        });
        *occurrence += 1;
    }

    groups
}

/// Widest run observed for every field group, in unified column order.
///
/// The order is the group order of the first page that has a header; groups
/// that only show up on later pages are appended in the order they are first
/// seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnWidthTable {
    order: Vec<GroupKey>,
    widths: HashMap<GroupKey, usize>,
}

impl ColumnWidthTable {
    /// Builds the table from the segmented headers of all pages.
    pub fn from_layouts<'a, I>(layouts: I) -> Self
    where
        I: IntoIterator<Item = &'a [FieldGroup]>,
    {
        let mut table = Self::default();
        for groups in layouts {
            table.observe(groups);
        }
        table
    }

    /// Folds one page's groups into the running maxima.
    pub fn observe(&mut self, groups: &[FieldGroup]) {
        for group in groups {
            match self.widths.get_mut(&group.key) {
                Some(width) => *width = (*width).max(group.width),
                None => {
                    self.order.push(group.key.clone());
                    self.widths.insert(group.key.clone(), group.width);
                }
            }
        }
    }

    /// Maximum width recorded for the group, zero when it was never seen.
    pub fn width(&self, key: &GroupKey) -> usize {
        self.widths.get(key).copied().unwrap_or(0)
    }

    /// Maximum width recorded for the first group carrying `label`.
    pub fn width_of(&self, label: &str) -> usize {
        self.width(&GroupKey {
            label: label.to_string(),
            occurrence: 0,
        })
    }

    pub fn keys(&self) -> &[GroupKey] {
        &self.order
    }

    /// Total number of unified columns.
    pub fn total_width(&self) -> usize {
        self.order.iter().map(|key| self.width(key)).sum()
    }

    /// Unified header: every label repeated as often as its widest run.
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.total_width());
        for key in &self.order {
            header.extend(std::iter::repeat_n(key.label.clone(), self.width(key)));
        }
        header
    }
}

/// Where each unified group's cells live in one page's rows.
struct PageLayout {
    /// Per unified group: the page's run (start column, width), if it has one,
    /// and the unified width to fill.
    slots: Vec<(Option<(usize, usize)>, usize)>,
    header_width: usize,
}

impl PageLayout {
    fn new(groups: &[FieldGroup], header_width: usize, widths: &ColumnWidthTable) -> Self {
        let by_key: HashMap<&GroupKey, &FieldGroup> =
            groups.iter().map(|group| (&group.key, group)).collect();
        let slots = widths
            .keys()
            .iter()
            .map(|key| {
                let run = by_key.get(key).map(|group| (group.start, group.width));
                (run, widths.width(key))
            })
            .collect();

        Self {
            slots,
            header_width,
        }
    }

    fn expand(&self, row: &Row, total_width: usize) -> Row {
        let mut expanded = Vec::with_capacity(total_width);
        for (run, unified_width) in &self.slots {
            let taken = match run {
                Some((start, width)) => {
                    for column in *start..start + width {
                        expanded.push(row.get(column).cloned().unwrap_or_default());
                    }
                    *width
                }
                None => 0,
            };
            expanded.extend(std::iter::repeat_n(Cell::empty(), unified_width - taken));
        }
        expanded
    }
}

/// Pads every page to the widest layout and concatenates the rows in page
/// order, then row order within each page.
#[instrument(level = "debug", skip_all, fields(page_count = pages.len()))]
pub fn reconcile(pages: &[Page]) -> UnifiedTable {
    let layouts: Vec<Vec<FieldGroup>> = pages
        .iter()
        .map(|page| segment_header(&page.header))
        .collect();
    let widths = ColumnWidthTable::from_layouts(layouts.iter().map(Vec::as_slice));
    let header = widths.header();
    let total_width = header.len();

    let row_count = pages.iter().map(|page| page.rows.len()).sum();
    let mut rows = Vec::with_capacity(row_count);

    for (index, (page, groups)) in pages.iter().zip(&layouts).enumerate() {
        let layout = PageLayout::new(groups, page.header.len(), &widths);
        let mut truncated = 0usize;
        for row in &page.rows {
            if row.len() > layout.header_width {
                truncated += 1;
            }
            rows.push(layout.expand(row, total_width));
        }
        if truncated > 0 {
            warn!(
                page = index,
                rows = truncated,
                "dropped cells beyond the page header"
            );
        }
    }

    debug!(
        column_count = total_width,
        group_count = widths.keys().len(),
        row_count = rows.len(),
        "pages reconciled"
    );

    UnifiedTable { header, rows }
}
