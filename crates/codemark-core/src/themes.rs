//! Theme buckets: codes grouped into an ordered list of named themes.
//!
//! The board is seeded once from the counter's codes (all in the first
//! group, the second group empty). After that the arrangement is owned by
//! the sorting view, which hands back the complete partition whenever codes
//! are dragged between groups; the board never tracks individual moves.
//!
//! Export turns the groups into a rectangular table: one column per group,
//! shorter columns padded with empty cells.

use std::collections::HashMap;

use serde::Serialize;

/// Number of groups a freshly seeded board has.
pub const DEFAULT_GROUPS: usize = 2;

/// One named group of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeGroup {
    pub name: String,
    pub codes: Vec<String>,
}

/// Rectangular export of a [`ThemeBoard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeTable {
    /// One header per group, in board order.
    pub headers: Vec<String>,
    /// `rows[r][c]` is the `r`-th code of group `c`, or `""` past its end.
    pub rows: Vec<Vec<String>>,
}

/// Ordered, mutable list of theme groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeBoard {
    groups: Vec<ThemeGroup>,
}

fn default_name(position: usize) -> String {
    format!("Theme {}", position + 1)
}

impl ThemeBoard {
    /// Seed a board: every non-blank code in group one, group two empty.
    pub fn seed<'a, I>(codes: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let first: Vec<String> = codes
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .collect();
        let mut groups = vec![ThemeGroup {
            name: default_name(0),
            codes: first,
        }];
        for position in 1..DEFAULT_GROUPS {
            groups.push(ThemeGroup {
                name: default_name(position),
                codes: Vec::new(),
            });
        }
        Self { groups }
    }

    pub fn groups(&self) -> &[ThemeGroup] {
        &self.groups
    }

    /// The arrangement as plain code lists, one per group.
    pub fn partition(&self) -> Vec<Vec<String>> {
        self.groups.iter().map(|g| g.codes.clone()).collect()
    }

    /// Replace the whole arrangement.
    ///
    /// Group names stay attached to their positions; positions beyond the
    /// current groups get default names, and trailing groups missing from
    /// `partition` are dropped.
    pub fn set_partition(&mut self, partition: Vec<Vec<String>>) {
        let groups = partition
            .into_iter()
            .enumerate()
            .map(|(position, codes)| ThemeGroup {
                name: self
                    .groups
                    .get(position)
                    .map(|g| g.name.clone())
                    .unwrap_or_else(|| default_name(position)),
                codes,
            })
            .collect();
        self.groups = groups;
    }

    /// Append an empty group.
    ///
    /// A `live` arrangement is committed first, so moves made in the view
    /// right before the new group appears are not lost.
    pub fn add_bucket(&mut self, live: Option<Vec<Vec<String>>>) -> usize {
        if let Some(partition) = live {
            self.set_partition(partition);
        }
        let position = self.groups.len();
        self.groups.push(ThemeGroup {
            name: default_name(position),
            codes: Vec::new(),
        });
        position
    }

    /// Rename the group at 0-based `position`. Blank names are ignored.
    pub fn rename_bucket(&mut self, position: usize, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        match self.groups.get_mut(position) {
            Some(group) => {
                group.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Carry a code rename into the groups.
    ///
    /// If `new` is already placed somewhere, the renamed entry is removed
    /// instead so the code stays in a single group. A blank `new` removes
    /// the entry too, since blank codes are never placed.
    pub fn rename_code(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return false;
        }
        let drop_old = new.trim().is_empty()
            || self.groups.iter().any(|g| g.codes.iter().any(|c| c == new));
        let mut changed = false;
        for group in &mut self.groups {
            if drop_old {
                let before = group.codes.len();
                group.codes.retain(|c| c.as_str() != old);
                changed |= group.codes.len() != before;
            } else {
                for code in group.codes.iter_mut().filter(|c| c.as_str() == old) {
                    *code = new.to_string();
                    changed = true;
                }
            }
        }
        changed
    }

    /// Place codes that appeared after seeding into the first group.
    pub fn absorb_new_codes<'a, I>(&mut self, codes: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for code in codes {
            if code.trim().is_empty() || self.contains(code) {
                continue;
            }
            if let Some(first) = self.groups.first_mut() {
                first.codes.push(code.to_string());
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, code: &str) -> bool {
        self.groups.iter().any(|g| g.codes.iter().any(|c| c == code))
    }

    /// Code → group name, for writing themes back into the codebook.
    ///
    /// A code listed in several groups maps to the first one.
    pub fn assignments(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for group in &self.groups {
            for code in &group.codes {
                map.entry(code.clone()).or_insert_with(|| group.name.clone());
            }
        }
        map
    }

    /// Groups as columns, padded to the longest group.
    pub fn export(&self) -> ThemeTable {
        let height = self.groups.iter().map(|g| g.codes.len()).max().unwrap_or(0);
        let rows = (0..height)
            .map(|r| {
                self.groups
                    .iter()
                    .map(|g| g.codes.get(r).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        ThemeTable {
            headers: self.groups.iter().map(|g| g.name.clone()).collect(),
            rows,
        }
    }
}
