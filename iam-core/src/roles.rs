//! Configured roles and privilege selection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named role together with its configured priority (0 is highest).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub priority: usize,
}

/// Ordered set of role names. Position defines priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet {
    names: Vec<String>,
    priority: HashMap<String, usize>,
}

impl RoleSet {
    /// Duplicates keep their first (highest) position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut priority = HashMap::new();
        for name in names {
            let name = name.into();
            if priority.contains_key(&name) {
                continue;
            }
            priority.insert(name.clone(), ordered.len());
            ordered.push(name);
        }
        Self {
            names: ordered,
            priority,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn priority_of(&self, name: &str) -> Option<usize> {
        self.priority.get(name).copied()
    }

    /// The caller's privilege: of the groups that are configured roles,
    /// the one with the lowest index. Unknown groups are ignored.
    pub fn privilege<S: AsRef<str>>(&self, groups: &[S]) -> Option<Role> {
        groups
            .iter()
            .filter_map(|g| {
                let name = g.as_ref();
                self.priority_of(name).map(|priority| Role {
                    name: name.to_string(),
                    priority,
                })
            })
            .min_by_key(|r| r.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> RoleSet {
        RoleSet::new(["admin", "business", "user", "worker"])
    }

    #[test]
    fn highest_priority_group_wins() {
        let p = roles().privilege(&["worker", "user", "business"]).unwrap();
        assert_eq!(p.name, "business");
        assert_eq!(p.priority, 1);
    }

    #[test]
    fn unconfigured_groups_are_ignored() {
        assert_eq!(roles().privilege(&["staff", "ops"]), None);
        assert_eq!(roles().privilege::<&str>(&[]), None);

        let p = roles().privilege(&["staff", "worker"]).unwrap();
        assert_eq!(p.name, "worker");
    }

    #[test]
    fn every_subset_picks_lowest_index() {
        let set = roles();
        let all = set.names().to_vec();
        for mask in 1u32..(1 << all.len()) {
            let groups: Vec<&str> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, n)| n.as_str())
                .collect();
            let expected = mask.trailing_zeros() as usize;
            assert_eq!(set.privilege(&groups).unwrap().priority, expected);
        }
    }

    #[test]
    fn duplicates_keep_first_position() {
        let set = RoleSet::new(["user", "admin", "user"]);
        assert_eq!(set.names(), ["user", "admin"]);
        assert_eq!(set.priority_of("user"), Some(0));
    }
}
