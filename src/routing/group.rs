//! Route group registry.
//!
//! Groups scope middleware by path prefix. They are kept in one flat list in
//! registration order; a request collects the middleware of every group whose
//! prefix is a string prefix of its path, independently of group nesting.

/// Index of a group inside its [`GroupRegistry`].
pub type GroupId = usize;

/// The root group, whose prefix is empty.
pub const ROOT_GROUP: GroupId = 0;

/// Prefix-scoped middleware list.
#[derive(Debug, Clone)]
pub struct Group<M> {
    prefix: String,
    middlewares: Vec<M>,
    parent: Option<GroupId>,
}

impl<M> Group<M> {
    /// Effective prefix: the parent's prefix followed by this group's own.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn middlewares(&self) -> &[M] {
        &self.middlewares
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }
}

/// Flat, ordered list of every group, starting with the root group.
#[derive(Debug, Clone)]
pub struct GroupRegistry<M> {
    groups: Vec<Group<M>>,
}

impl<M> Default for GroupRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> GroupRegistry<M> {
    pub fn new() -> Self {
        Self {
            groups: vec![Group {
                prefix: String::new(),
                middlewares: Vec::new(),
                parent: None,
            }],
        }
    }

    /// Register a child of `parent`, returning its id.
    ///
    /// Panics if `parent` was not issued by this registry.
    pub fn add_group(&mut self, parent: GroupId, prefix: &str) -> GroupId {
        let prefix = format!("{}{}", self.groups[parent].prefix, prefix);
        tracing::debug!(prefix = %prefix, parent, "Group registered");
        self.groups.push(Group {
            prefix,
            middlewares: Vec::new(),
            parent: Some(parent),
        });
        self.groups.len() - 1
    }

    /// Append a middleware to a group.
    pub fn add_middleware(&mut self, group: GroupId, middleware: M) {
        self.groups[group].middlewares.push(middleware);
    }

    pub fn get(&self, group: GroupId) -> Option<&Group<M>> {
        self.groups.get(group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<M: Clone> GroupRegistry<M> {
    /// Middleware applying to `path`, in group registration order.
    pub fn middlewares_for(&self, path: &str) -> Vec<M> {
        self.groups
            .iter()
            .filter(|group| path.starts_with(&group.prefix))
            .flat_map(|group| group.middlewares.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_composition() {
        let mut registry: GroupRegistry<&str> = GroupRegistry::new();
        let v1 = registry.add_group(ROOT_GROUP, "/v1");
        let admin = registry.add_group(v1, "/admin");

        assert_eq!(registry.get(v1).unwrap().prefix(), "/v1");
        assert_eq!(registry.get(admin).unwrap().prefix(), "/v1/admin");
        assert_eq!(registry.get(admin).unwrap().parent(), Some(v1));
        assert_eq!(registry.get(ROOT_GROUP).unwrap().parent(), None);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_scoping_by_prefix() {
        let mut registry = GroupRegistry::new();
        registry.add_middleware(ROOT_GROUP, "global");
        let v1 = registry.add_group(ROOT_GROUP, "/v1");
        registry.add_middleware(v1, "v1");
        let v2 = registry.add_group(ROOT_GROUP, "/v2");
        registry.add_middleware(v2, "v2-a");
        registry.add_middleware(v2, "v2-b");

        assert_eq!(registry.middlewares_for("/v1/hello"), vec!["global", "v1"]);
        assert_eq!(registry.middlewares_for("/v2/hello/jack"), vec!["global", "v2-a", "v2-b"]);
        assert_eq!(registry.middlewares_for("/other"), vec!["global"]);
    }

    #[test]
    fn test_unrelated_groups_sharing_a_prefix_all_apply() {
        let mut registry = GroupRegistry::new();
        let api = registry.add_group(ROOT_GROUP, "/api");
        registry.add_middleware(api, "api");
        let apix = registry.add_group(ROOT_GROUP, "/apix");
        registry.add_middleware(apix, "apix");

        // Plain string prefix, not segment-aware.
        assert_eq!(registry.middlewares_for("/apix/a"), vec!["api", "apix"]);
        assert_eq!(registry.middlewares_for("/api/a"), vec!["api"]);
    }
}
