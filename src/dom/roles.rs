//! Structural role classification.
//!
//! Roles are stored out of band in a [`RoleMap`] keyed by [`NodeId`], so the
//! document itself is never mutated. Classification runs in two passes:
//! intrinsic roles from the tag name, then structural roles for `div`
//! elements derived from the role of their parent.

use std::collections::HashMap;
use std::fmt;

use super::arena::{Document, NodeId};

/// Semantic role of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Page,
    Metadata,
    Content,
    Main,
    Section,
    Block,
    Row,
    Cell,
    /// Heading with its level (1-6).
    Heading(u8),
    Paragraph,
    List {
        ordered: bool,
    },
    ListItem,
    Link,
    Image,
    Table,
    TableRow,
    TableCell,
    Emphasis,
    Code,
    CodeBlock,
    Quote,
}

impl Role {
    /// Intrinsic role implied by a tag name alone.
    pub fn from_tag(tag: &str) -> Option<Role> {
        let role = match tag {
            "html" => Role::Page,
            "head" => Role::Metadata,
            "body" => Role::Content,
            "main" => Role::Main,

            "h1" => Role::Heading(1),
            "h2" => Role::Heading(2),
            "h3" => Role::Heading(3),
            "h4" => Role::Heading(4),
            "h5" => Role::Heading(5),
            "h6" => Role::Heading(6),

            "p" => Role::Paragraph,
            "ul" => Role::List { ordered: false },
            "ol" => Role::List { ordered: true },
            "li" => Role::ListItem,
            "a" => Role::Link,
            "picture" => Role::Image,

            "table" => Role::Table,
            "tr" => Role::TableRow,
            "td" | "th" => Role::TableCell,

            "strong" | "b" | "em" | "i" => Role::Emphasis,
            "code" => Role::Code,
            "pre" => Role::CodeBlock,
            "blockquote" => Role::Quote,

            _ => return None,
        };
        Some(role)
    }

    /// Structural role of a `div` whose parent has `parent` role.
    pub fn structural_child(parent: Option<Role>) -> Option<Role> {
        match parent? {
            Role::Main => Some(Role::Section),
            Role::Section => Some(Role::Block),
            Role::Block => Some(Role::Row),
            Role::Row => Some(Role::Cell),
            _ => None,
        }
    }

    /// Name used for the `data-role` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Page => "page",
            Role::Metadata => "metadata",
            Role::Content => "content",
            Role::Main => "main",
            Role::Section => "section",
            Role::Block => "block",
            Role::Row => "row",
            Role::Cell => "cell",
            Role::Heading(_) => "heading",
            Role::Paragraph => "paragraph",
            Role::List { .. } => "list",
            Role::ListItem => "list-item",
            Role::Link => "link",
            Role::Image => "image",
            Role::Table => "table",
            Role::TableRow => "table-row",
            Role::TableCell => "table-cell",
            Role::Emphasis => "emphasis",
            Role::Code => "code",
            Role::CodeBlock => "code-block",
            Role::Quote => "quote",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and options of a `block` div, taken from its class list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockInfo {
    /// First class token, if the div has any classes.
    pub name: Option<String>,
    /// Remaining class tokens in authored order, excluding the name.
    pub options: Vec<String>,
}

impl BlockInfo {
    pub fn from_classes(classes: &[String]) -> Self {
        let name = classes.first().cloned();
        let options = classes
            .iter()
            .filter(|c| Some(*c) != name.as_ref())
            .cloned()
            .collect();
        Self { name, options }
    }
}

/// Sparse node-to-role annotation.
#[derive(Debug, Default, Clone)]
pub struct RoleMap {
    roles: HashMap<NodeId, Role>,
    blocks: HashMap<NodeId, BlockInfo>,
}

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify every element of `doc` into a fresh map.
    pub fn classify(doc: &Document) -> Self {
        let mut map = Self::new();
        classify(doc, &mut map);
        map
    }

    pub fn role(&self, node: NodeId) -> Option<Role> {
        self.roles.get(&node).copied()
    }

    /// Block name and options, for nodes with the `block` role.
    pub fn block(&self, node: NodeId) -> Option<&BlockInfo> {
        self.blocks.get(&node)
    }

    /// Heading level, for nodes with the `heading` role.
    pub fn level(&self, node: NodeId) -> Option<u8> {
        match self.role(node)? {
            Role::Heading(level) => Some(level),
            _ => None,
        }
    }

    /// List ordering, for nodes with the `list` role.
    pub fn ordered(&self, node: NodeId) -> Option<bool> {
        match self.role(node)? {
            Role::List { ordered } => Some(ordered),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Nodes carrying `role`, in node id order.
    pub fn nodes_with(&self, role: Role) -> Vec<NodeId> {
        let mut nodes: Vec<_> = self
            .roles
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(id, _)| *id)
            .collect();
        nodes.sort();
        nodes
    }

    pub fn clear(&mut self) {
        self.roles.clear();
        self.blocks.clear();
    }

    fn set(&mut self, node: NodeId, role: Role) {
        self.roles.insert(node, role);
    }
}

/// Annotate every element of `doc` with its role.
///
/// `roles` is cleared first, so repeated classification of the same
/// document yields the same map.
pub fn classify(doc: &Document, roles: &mut RoleMap) {
    roles.clear();

    // Pass 1: intrinsic roles.
    for id in doc.descendants(doc.root()) {
        if let Some(role) = doc.tag_name(id).and_then(Role::from_tag) {
            roles.set(id, role);
        }
    }

    // Pass 2: div hierarchy below main. Each child sees the parent's final
    // role, whichever pass assigned it.
    let mut stack = vec![(doc.root(), None)];
    while let Some((id, parent_role)) = stack.pop() {
        if doc.is_tag(id, "div")
            && let Some(role) = Role::structural_child(parent_role)
        {
            roles.set(id, role);
            if role == Role::Block {
                roles
                    .blocks
                    .insert(id, BlockInfo::from_classes(doc.classes(id)));
            }
        }

        let role = roles.role(id);
        let children: Vec<_> = doc.element_children(id).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, role)));
    }
}
