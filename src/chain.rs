//! Immutable dependency chain used for cycle detection.
//!
//! The chain records the path of targets from a root `deps` call down to the
//! current execution point. It is never shared mutable state: extending a
//! chain produces a new value, so sibling targets running concurrently each
//! hold their own copy and never race on it.

use crate::target::{Target, TargetId};

#[derive(Debug, Clone)]
struct Link {
    id: TargetId,
    name: String,
}

/// Ordered sequence of the targets currently executing on the path from a
/// root call to the present point.
#[derive(Debug, Clone, Default)]
pub struct DependencyChain {
    links: Vec<Link>,
}

impl DependencyChain {
    /// An empty chain, as created at the first top-level `deps` call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a target id is already on this chain.
    pub fn contains(&self, id: &TargetId) -> bool {
        self.links.iter().any(|link| link.id == *id)
    }

    /// A new chain with `target` appended. The receiver is left unchanged.
    pub fn extended(&self, target: &Target) -> Self {
        let mut links = self.links.clone();
        links.push(Link {
            id: target.id().clone(),
            name: target.name().to_string(),
        });
        Self { links }
    }

    /// Target names on the chain, root first.
    pub fn names(&self) -> Vec<String> {
        self.links.iter().map(|link| link.name.clone()).collect()
    }

    /// Number of targets on the chain.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TaskContext;
    use crate::error::TaskResult;

    fn first(_ctx: &TaskContext) -> TaskResult {
        Ok(())
    }

    fn second(_ctx: &TaskContext) -> TaskResult {
        Ok(())
    }

    #[test]
    fn extending_leaves_parent_unchanged() {
        let a = Target::new(first).unwrap();
        let b = Target::new(second).unwrap();

        let root = DependencyChain::new();
        let child = root.extended(&a);
        let grandchild = child.extended(&b);

        assert!(root.is_empty());
        assert_eq!(child.len(), 1);
        assert_eq!(grandchild.names(), vec!["first", "second"]);
        assert!(!child.contains(b.id()));
    }

    #[test]
    fn contains_matches_by_id() {
        let a = Target::new(first).unwrap();
        let chain = DependencyChain::new().extended(&a);

        assert!(chain.contains(a.id()));
        assert!(chain.contains(Target::new(first).unwrap().id()));
        assert!(!chain.contains(Target::new(second).unwrap().id()));
    }
}
