/// EventDesk entities and their SQL
///
/// - `user`: Login identities
/// - `profile`: Display attributes and access levels
/// - `project`: The project tree
/// - `project_file`: Links and generated documents attached to projects
/// - `event`: Events with organizers, participants and linked projects
/// - `task`: Tasks belonging to events
///
/// Multi-statement writes run in their own transaction; callers pass a pool.

pub mod event;
pub mod profile;
pub mod project;
pub mod project_file;
pub mod task;
pub mod user;

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Groups `(owner_id, related_id)` rows by owner
pub(crate) fn group_pairs(rows: Vec<(i64, i64)>) -> HashMap<i64, Vec<i64>> {
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (owner, related) in rows {
        grouped.entry(owner).or_default().push(related);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_pairs() {
        let grouped = group_pairs(vec![(1, 10), (2, 20), (1, 11)]);
        assert_eq!(grouped[&1], vec![10, 11]);
        assert_eq!(grouped[&2], vec![20]);
        assert!(!grouped.contains_key(&3));
    }
}
