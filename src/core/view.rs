//! Derived view state: highlights, active filter, sort order, grouping
use crate::core::condition::{CompositeCondition, matches_composite};
use crate::core::record::Record;
use crate::core::response::{GridOperationResponse, GroupSpec, SortDir, SortSpec};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Everything the renderer derives a frame from. Owned by the applier;
/// mutated only by [`ViewState::apply`] and [`ViewState::reset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub highlighted: BTreeSet<usize>,
    pub filter: Option<CompositeCondition>,
    pub sort: Vec<SortSpec>,
    pub group: Vec<GroupSpec>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one reply to the view. Each dimension follows the same
    /// tri-state policy: absent key = untouched, empty list (or explicit
    /// null for the filter) = clear, value = replace. New values are
    /// computed before anything is committed, so the renderer never
    /// observes a half-applied turn.
    pub fn apply(&mut self, response: &GridOperationResponse, records: &[Record]) {
        let next_highlight = response.highlight.as_ref().map(|rules| {
            if rules.is_empty() {
                BTreeSet::new()
            } else {
                records
                    .iter()
                    .enumerate()
                    .filter(|(_, record)| {
                        rules
                            .iter()
                            .any(|rule| matches_composite(record, &rule.condition))
                    })
                    .map(|(index, _)| index)
                    .collect()
            }
        });

        if let Some(highlighted) = next_highlight {
            self.highlighted = highlighted;
        }
        match &response.filter {
            None => {}
            Some(None) => self.filter = None,
            Some(Some(condition)) => self.filter = Some(condition.clone()),
        }
        if let Some(sort) = &response.sort {
            self.sort = sort.clone();
        }
        if let Some(group) = &response.group {
            self.group = group.clone();
        }
    }

    /// Explicit user reset: clears all four dimensions, restoring the
    /// original record ordering. Independent of any model turn.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether any dimension is active (drives the reset button's state)
    pub fn has_operations(&self) -> bool {
        !self.highlighted.is_empty()
            || self.filter.is_some()
            || !self.sort.is_empty()
            || !self.group.is_empty()
    }

    /// The row ordering the renderer consumes: filter predicate applied,
    /// then group keys as outer sort keys, then the sort specs. Stable with
    /// respect to original order on ties.
    pub fn project(&self, records: &[Record]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..records.len())
            .filter(|&i| {
                self.filter
                    .as_ref()
                    .is_none_or(|f| matches_composite(&records[i], f))
            })
            .collect();

        let keys: Vec<(&str, SortDir)> = self
            .group
            .iter()
            .map(|g| (g.field.as_str(), g.dir))
            .chain(self.sort.iter().map(|s| (s.field.as_str(), s.dir)))
            .collect();

        if !keys.is_empty() {
            indices.sort_by(|&a, &b| {
                for (field, dir) in &keys {
                    let ord = field_ordering(&records[a], &records[b], field);
                    let ord = match dir {
                        SortDir::Asc => ord,
                        SortDir::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        indices
    }
}

/// Order two records on one field: numbers, then dates, then
/// case-insensitive text. Missing or null values sort last.
fn field_ordering(a: &Record, b: &Record, field: &str) -> Ordering {
    let va = a.get(field).filter(|v| v.as_text().is_some());
    let vb = b.get(field).filter(|v| v.as_text().is_some());
    match (va, vb) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(va), Some(vb)) => {
            if let (Some(na), Some(nb)) = (va.as_number(), vb.as_number()) {
                return na.partial_cmp(&nb).unwrap_or(Ordering::Equal);
            }
            if let (Some(da), Some(db)) = (va.as_date(), vb.as_date()) {
                return da.cmp(&db);
            }
            let ta = va.as_text().unwrap_or_default().to_lowercase();
            let tb = vb.as_text().unwrap_or_default().to_lowercase();
            ta.cmp(&tb)
        }
    }
}
