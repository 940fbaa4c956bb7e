//! Path-segment trie.
//!
//! # Responsibilities
//! - Tokenize patterns and paths into segments
//! - Insert patterns one segment per level
//! - Find the first registered pattern matching a path
//! - Enumerate registered patterns
//!
//! # Design Decisions
//! - Each node owns its children; no back pointers
//! - Literal and wildcard siblings coexist; candidates are tried in insertion order
//! - A node only proves a pattern exists; handlers live in the route table

/// Split a pattern or path into its non-empty `/` separated segments.
///
/// Tokenization stops right after the first segment beginning with `*`,
/// so anything declared after a catch-all is dropped.
pub fn parse_pattern(pattern: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for item in pattern.split('/').filter(|item| !item.is_empty()) {
        parts.push(item);
        if item.starts_with('*') {
            break;
        }
    }
    parts
}

/// One trie vertex.
#[derive(Debug, Default, Clone)]
pub struct Node {
    /// Full pattern, set only on nodes that terminate a registered route.
    pattern: Option<String>,
    /// Raw segment: a literal, `:name` or `*name`.
    segment: String,
    /// Children in insertion order.
    children: Vec<Node>,
    /// True when the segment starts with `:` or `*`.
    is_wild: bool,
}

impl Node {
    /// Create an empty root node.
    pub fn root() -> Self {
        Self::default()
    }

    fn with_segment(segment: &str) -> Self {
        Self {
            pattern: None,
            segment: segment.to_string(),
            children: Vec::new(),
            is_wild: segment.starts_with(':') || segment.starts_with('*'),
        }
    }

    /// The registered pattern terminating at this node, if any.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn is_wild(&self) -> bool {
        self.is_wild
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Insert `pattern`, whose tokenized form is `parts`, below this node.
    ///
    /// `depth` is the index of the segment this node stands for; call with 0 on the root.
    pub fn insert(&mut self, pattern: &str, parts: &[&str], depth: usize) {
        if parts.len() == depth {
            if !pattern.is_empty() {
                self.pattern = Some(pattern.to_string());
            }
            return;
        }

        let part = parts[depth];
        let index = match self.children.iter().position(|child| child.segment == part) {
            Some(index) => index,
            None => {
                self.children.push(Node::with_segment(part));
                self.children.len() - 1
            }
        };
        self.children[index].insert(pattern, parts, depth + 1);
    }

    /// Depth-first search for the node matching `parts`.
    ///
    /// Returns the first match found when trying literal-equal and wildcard
    /// children in insertion order.
    pub fn search(&self, parts: &[&str], depth: usize) -> Option<&Node> {
        if parts.len() == depth || self.segment.starts_with('*') {
            return self.pattern.as_ref().map(|_| self);
        }

        let part = parts[depth];
        self.children
            .iter()
            .filter(|child| child.segment == part || child.is_wild)
            .find_map(|child| child.search(parts, depth + 1))
    }

    /// Collect every node below (and including) this one that terminates a route.
    pub fn travel<'a>(&'a self, nodes: &mut Vec<&'a Node>) {
        if self.pattern.is_some() {
            nodes.push(self);
        }
        for child in &self.children {
            child.travel(nodes);
        }
    }
}
