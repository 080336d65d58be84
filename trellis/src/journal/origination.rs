//! Instantiation-index bookkeeping for origins.
//!
//! For a given parent origin and child tool name, hands out a monotonically
//! increasing index starting at 0, so the k-th concurrent instance of the
//! same tool under the same parent gets a distinguishable origin.

use dashmap::DashMap;

use chat_event::{full_name_from_origin, OriginEntry};

/// Per-request origin allocator. One lives in each invocation context.
#[derive(Default)]
pub struct Origination {
    /// (parent full name, tool) -> next index to hand out.
    indices: DashMap<(String, String), u32>,
}

impl Origination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends `parent_origin` with an entry for `tool`, assigning the next
    /// instantiation index for that (parent, tool) pair.
    pub fn add_spec_name_to_origin(
        &self,
        parent_origin: &[OriginEntry],
        tool: &str,
    ) -> Vec<OriginEntry> {
        let parent_name = full_name_from_origin(parent_origin);
        let mut counter = self
            .indices
            .entry((parent_name, tool.to_string()))
            .or_insert(0);
        let index = *counter;
        *counter += 1;
        drop(counter);

        let mut origin = parent_origin.to_vec();
        origin.push(OriginEntry::new(tool, index));
        origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_instance_gets_index_zero() {
        let origination = Origination::new();
        let origin = origination.add_spec_name_to_origin(&[], "front_man");
        assert_eq!(origin, vec![OriginEntry::new("front_man", 0)]);
    }

    #[test]
    fn repeated_children_get_increasing_indices() {
        let origination = Origination::new();
        let parent = origination.add_spec_name_to_origin(&[], "front_man");
        let first = origination.add_spec_name_to_origin(&parent, "helper");
        let second = origination.add_spec_name_to_origin(&parent, "helper");
        assert_eq!(first.last().unwrap().instantiation_index, 0);
        assert_eq!(second.last().unwrap().instantiation_index, 1);
        assert_eq!(full_name_from_origin(&second), "front_man.helper-1");
    }

    #[test]
    fn indices_are_scoped_per_parent() {
        let origination = Origination::new();
        let parent_a = origination.add_spec_name_to_origin(&[], "a");
        let parent_b = origination.add_spec_name_to_origin(&[], "b");
        let under_a = origination.add_spec_name_to_origin(&parent_a, "helper");
        let under_b = origination.add_spec_name_to_origin(&parent_b, "helper");
        assert_eq!(under_a.last().unwrap().instantiation_index, 0);
        assert_eq!(under_b.last().unwrap().instantiation_index, 0);
    }
}
