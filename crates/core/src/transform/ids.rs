//! Identifier normalisation and de-duplication.

use crate::config::DuplicateIdHandling;
use crate::metadata::{DuplicateId, DuplicateOccurrence, OccurrenceStatus};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

static WHOLE_DECIMAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(-?[0-9]+)\.0+$").ok());

/// Canonical form of an identifier or dependency reference.
///
/// Whole-number decimals lose their fraction (`"61.0"` becomes `"61"`). With
/// `css_safe`, every character outside `[A-Za-z0-9_-]` is written as
/// `_xHH_` using its code point in lowercase hex.
pub fn normalize_id(raw: &str, css_safe: bool) -> String {
    let trimmed = raw.trim();
    let collapsed = WHOLE_DECIMAL
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    if css_safe {
        make_css_safe(collapsed)
    } else {
        collapsed.to_string()
    }
}

fn make_css_safe(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        } else {
            // writing to a String cannot fail
            let _ = write!(out, "_x{:02x}_", u32::from(c));
        }
    }
    out
}

/// Outcome of registering one row's identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// First use of the identifier
    Unique(String),
    /// Repeat, given a suffixed identifier
    Renamed {
        /// The identifier that collided
        original: String,
        /// The identifier assigned instead
        assigned: String,
    },
    /// Repeat, dropped
    Skipped {
        /// The identifier that collided
        original: String,
    },
}

/// Row holding an identifier, and whether the identifier was generated by a
/// rename rather than read from the input.
#[derive(Debug, Clone, Copy)]
struct Owner {
    row_index: usize,
    generated: bool,
}

/// Tracks identifiers handed out during one transformation.
///
/// Duplicate groups are keyed by input identifier. A literal identifier that
/// collides only with a generated one still gets renamed, but its group
/// holds just that row since no input row carried it before.
#[derive(Debug)]
pub struct IdRegistry {
    handling: DuplicateIdHandling,
    owners: HashMap<String, Owner>,
    next_suffix: HashMap<String, usize>,
    duplicates: IndexMap<String, Vec<DuplicateOccurrence>>,
}

impl IdRegistry {
    pub fn new(handling: DuplicateIdHandling) -> Self {
        Self {
            handling,
            owners: HashMap::new(),
            next_suffix: HashMap::new(),
            duplicates: IndexMap::new(),
        }
    }

    /// Register the identifier of row `row_index`.
    pub fn assign(&mut self, id: String, row_index: usize) -> Assignment {
        let Some(owner) = self.owners.get(&id).copied() else {
            self.owners.insert(
                id.clone(),
                Owner {
                    row_index,
                    generated: false,
                },
            );
            return Assignment::Unique(id);
        };

        let occurrences = self.duplicates.entry(id.clone()).or_insert_with(|| {
            if owner.generated {
                Vec::new()
            } else {
                vec![DuplicateOccurrence {
                    row_index: owner.row_index,
                    assigned_id: Some(id.clone()),
                    status: OccurrenceStatus::Kept,
                }]
            }
        });

        match self.handling {
            DuplicateIdHandling::Skip => {
                occurrences.push(DuplicateOccurrence {
                    row_index,
                    assigned_id: None,
                    status: OccurrenceStatus::Skipped,
                });
                Assignment::Skipped { original: id }
            }
            DuplicateIdHandling::Rename => {
                let counter = self.next_suffix.entry(id.clone()).or_insert(0);
                let assigned = loop {
                    *counter += 1;
                    let candidate = format!("{id}_{counter}");
                    if !self.owners.contains_key(&candidate) {
                        break candidate;
                    }
                };
                self.owners.insert(
                    assigned.clone(),
                    Owner {
                        row_index,
                        generated: true,
                    },
                );
                occurrences.push(DuplicateOccurrence {
                    row_index,
                    assigned_id: Some(assigned.clone()),
                    status: OccurrenceStatus::Renamed,
                });
                Assignment::Renamed {
                    original: id,
                    assigned,
                }
            }
        }
    }

    /// Whether `id` has a duplicate group, so references to it are ambiguous.
    pub fn has_duplicates(&self, id: &str) -> bool {
        self.duplicates.contains_key(id)
    }

    /// Every repeated identifier with all its occurrences, in order of first
    /// collision.
    pub fn into_duplicates(self) -> Vec<DuplicateId> {
        self.duplicates
            .into_iter()
            .map(|(original_id, occurrences)| DuplicateId {
                original_id,
                occurrences,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_decimal_collapses() {
        assert_eq!(normalize_id("61.0", true), "61");
        assert_eq!(normalize_id(" 7.00 ", false), "7");
        assert_eq!(normalize_id("-3.0", true), "-3");
        assert_eq!(normalize_id("007", true), "007");
    }

    #[test]
    fn test_css_safe_escaping() {
        assert_eq!(normalize_id("54.8", true), "54_x2e_8");
        assert_eq!(normalize_id("task 1", true), "task_x20_1");
        assert_eq!(normalize_id("item#5", true), "item_x23_5");
        assert_eq!(normalize_id("café", true), "caf_xe9_");
        assert_eq!(normalize_id("a-b_c", true), "a-b_c");
    }

    #[test]
    fn test_css_safe_disabled() {
        assert_eq!(normalize_id("task 1", false), "task 1");
    }

    #[test]
    fn test_rename_suffixes_in_order() {
        let mut registry = IdRegistry::new(DuplicateIdHandling::Rename);
        assert_eq!(registry.assign("T1".into(), 0), Assignment::Unique("T1".into()));
        assert!(matches!(
            registry.assign("T1".into(), 1),
            Assignment::Renamed { assigned, .. } if assigned == "T1_1"
        ));
        assert!(matches!(
            registry.assign("T1".into(), 2),
            Assignment::Renamed { assigned, .. } if assigned == "T1_2"
        ));
        assert!(registry.has_duplicates("T1"));

        let duplicates = registry.into_duplicates();
        assert_eq!(duplicates.len(), 1);
        let rows: Vec<usize> = duplicates[0].occurrences.iter().map(|o| o.row_index).collect();
        assert_eq!(rows, [0, 1, 2]);
        assert_eq!(duplicates[0].occurrences[0].status, OccurrenceStatus::Kept);
        assert_eq!(duplicates[0].occurrences[2].assigned_id.as_deref(), Some("T1_2"));
    }

    #[test]
    fn test_rename_skips_taken_suffix() {
        let mut registry = IdRegistry::new(DuplicateIdHandling::Rename);
        registry.assign("A_1".into(), 0);
        registry.assign("A".into(), 1);
        assert!(matches!(
            registry.assign("A".into(), 2),
            Assignment::Renamed { assigned, .. } if assigned == "A_2"
        ));
    }

    #[test]
    fn test_literal_id_colliding_with_generated_suffix() {
        let mut registry = IdRegistry::new(DuplicateIdHandling::Rename);
        registry.assign("A".into(), 0);
        registry.assign("A".into(), 1);
        let assignment = registry.assign("A_1".into(), 2);
        assert!(matches!(
            assignment,
            Assignment::Renamed { assigned, .. } if assigned == "A_1_1"
        ));
    }

    #[test]
    fn test_generated_id_collision_reports_each_row_once() {
        let mut registry = IdRegistry::new(DuplicateIdHandling::Rename);
        registry.assign("A".into(), 0);
        registry.assign("A".into(), 1);
        registry.assign("A_1".into(), 2);

        let duplicates = registry.into_duplicates();
        assert_eq!(duplicates.len(), 2);

        assert_eq!(duplicates[0].original_id, "A");
        let first: Vec<(usize, Option<&str>, OccurrenceStatus)> = duplicates[0]
            .occurrences
            .iter()
            .map(|o| (o.row_index, o.assigned_id.as_deref(), o.status))
            .collect();
        assert_eq!(
            first,
            [
                (0, Some("A"), OccurrenceStatus::Kept),
                (1, Some("A_1"), OccurrenceStatus::Renamed),
            ]
        );

        assert_eq!(duplicates[1].original_id, "A_1");
        assert_eq!(duplicates[1].occurrences.len(), 1);
        assert_eq!(duplicates[1].occurrences[0].row_index, 2);
        assert_eq!(duplicates[1].occurrences[0].assigned_id.as_deref(), Some("A_1_1"));
        assert_eq!(duplicates[1].occurrences[0].status, OccurrenceStatus::Renamed);
    }

    #[test]
    fn test_skip_mode() {
        let mut registry = IdRegistry::new(DuplicateIdHandling::Skip);
        registry.assign("X".into(), 0);
        assert_eq!(
            registry.assign("X".into(), 4),
            Assignment::Skipped {
                original: "X".into()
            }
        );
        let duplicates = registry.into_duplicates();
        assert_eq!(duplicates[0].occurrences[1].status, OccurrenceStatus::Skipped);
        assert_eq!(duplicates[0].occurrences[1].assigned_id, None);
    }
}
