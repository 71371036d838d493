//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Permissions and roles are entities: renaming a role keeps it the same role.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Remove later duplicates (by id) while keeping first-seen order.
pub fn dedup_by_id<E: Entity>(items: &mut Vec<E>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.id().clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(u32, &'static str);

    impl Entity for Item {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.0
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut items = vec![Item(1, "a"), Item(2, "b"), Item(1, "c"), Item(3, "d"), Item(2, "e")];
        dedup_by_id(&mut items);
        assert_eq!(items, vec![Item(1, "a"), Item(2, "b"), Item(3, "d")]);
    }
}
