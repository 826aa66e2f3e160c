//! Arena-backed document tree.
//!
//! Every node lives in one contiguous vector and links to its parent,
//! children and siblings by index. The selector adapter walks upward through
//! these links, so nodes never hold references to each other.

use html5ever::{LocalName, Namespace, QualName, ns};

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for a missing link.
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and ordered attributes.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Class list split once at creation, in authored order.
        classes: Vec<String>,
    },
    /// Literal text.
    Text(String),
    /// Comment. Kept for tree fidelity, ignored by extraction.
    Comment(String),
    /// Document type declaration.
    Doctype { name: String },
}

/// Element attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node and its structural links.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// A parsed (or programmatically built) HTML document.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create an empty document holding only the root node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::NONE,
        };
        doc.root = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let classes = attrs
            .iter()
            .find(|a| a.name.local.as_ref() == "class")
            .map(|a| a.value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        self.alloc(Node::new(NodeData::Element {
            name,
            attrs,
            classes,
        }))
    }

    /// Create a detached HTML element from a tag name and `(name, value)` pairs.
    pub fn create_html_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, ns!(), LocalName::from(*name)),
                value: (*value).to_string(),
            })
            .collect();
        self.create_element(QualName::new(None, ns!(html), LocalName::from(tag)), attrs)
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub fn create_doctype(&mut self, name: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype { name }))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self.get(parent).map_or(NodeId::NONE, |n| n.last_child);

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = last_child;
            node.next_sibling = NodeId::NONE;
        }

        if last_child.is_some()
            && let Some(last) = self.get_mut(last_child)
        {
            last.next_sibling = child;
        }

        if let Some(node) = self.get_mut(parent) {
            if node.first_child.is_none() {
                node.first_child = child;
            }
            node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(node) = self.get_mut(new_node) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = sibling;
        }
        if let Some(node) = self.get_mut(sibling) {
            node.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(node) = self.get_mut(prev) {
                node.next_sibling = new_node;
            }
        } else if let Some(node) = self.get_mut(parent) {
            node.first_child = new_node;
        }
    }

    /// Unlink a node from its parent and siblings.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(node) = self.get_mut(prev) {
                node.next_sibling = next;
            }
        } else if let Some(node) = self.get_mut(parent) {
            node.first_child = next;
        }

        if next.is_some() {
            if let Some(node) = self.get_mut(next) {
                node.prev_sibling = prev;
            }
        } else if let Some(node) = self.get_mut(parent) {
            node.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append text to `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map_or(NodeId::NONE, |n| n.last_child);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(existing) = &mut last.data
        {
            existing.push_str(text);
            return;
        }

        let node = self.create_text(text.to_string());
        self.append(parent, node);
    }

    /// Total number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All children of a node, in document order.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            doc: self,
            current: self.get(parent).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Element children of a node, in document order.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Parent of a node, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(NodeId::is_some)
    }

    /// First element (document order) with the given tag name.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|&id| self.tag_name(id) == Some(tag))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self.doc.get(id).map_or(NodeId::NONE, |n| n.next_sibling);
        Some(id)
    }
}

/// Depth-first, document-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(self.doc.children(id));
        self.stack[start..].reverse();
        Some(id)
    }
}

/// Element accessors.
impl Document {
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    pub fn element_namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.ns),
            _ => None,
        })
    }

    /// Tag name as a plain string.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element_name(id).map(|n| n.as_ref())
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Exact attribute lookup.
    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.as_str())
    }

    /// Attribute lookup ignoring ASCII case, as HTML attribute names are.
    pub fn attr_ignore_case(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(attr_name))
            .map(|a| a.value.as_str())
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id")
    }

    /// Class list in authored order.
    pub fn classes(&self, id: NodeId) -> &[String] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// True for an element with the given tag name.
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Contents of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of every text node in the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Concatenated text of the direct text children only.
    pub fn own_text(&self, id: NodeId) -> String {
        self.children(id).filter_map(|c| self.text(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_elements() {
        let mut doc = Document::new();
        let div = doc.create_html_element("div", &[("id", "main"), ("class", "hero dark")]);
        doc.append(doc.root(), div);

        assert_eq!(doc.tag_name(div), Some("div"));
        assert_eq!(doc.element_id(div), Some("main"));
        assert_eq!(doc.classes(div), ["hero", "dark"]);
        assert_eq!(doc.parent(div), Some(doc.root()));
    }

    #[test]
    fn test_append_children_keeps_order() {
        let mut doc = Document::new();
        let parent = doc.create_html_element("div", &[]);
        let first = doc.create_html_element("p", &[]);
        let second = doc.create_html_element("p", &[]);
        doc.append(doc.root(), parent);
        doc.append(parent, first);
        doc.append(parent, second);

        let children: Vec<_> = doc.children(parent).collect();
        assert_eq!(children, vec![first, second]);
        assert_eq!(doc.get(second).unwrap().prev_sibling, first);
    }

    #[test]
    fn test_text_merging() {
        let mut doc = Document::new();
        let p = doc.create_html_element("p", &[]);
        doc.append(doc.root(), p);
        doc.append_text(p, "Hello, ");
        doc.append_text(p, "World!");

        let children: Vec<_> = doc.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.text(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_descendants_document_order() {
        let mut doc = Document::new();
        let a = doc.create_html_element("a", &[]);
        let b = doc.create_html_element("b", &[]);
        let c = doc.create_html_element("c", &[]);
        let d = doc.create_html_element("d", &[]);
        doc.append(doc.root(), a);
        doc.append(a, b);
        doc.append(b, c);
        doc.append(a, d);

        let order: Vec<_> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![a, b, c, d]);
        let under_a: Vec<_> = doc.descendants(a).collect();
        assert_eq!(under_a, vec![b, c, d]);
    }

    #[test]
    fn test_text_content_flattens() {
        let mut doc = Document::new();
        let p = doc.create_html_element("p", &[]);
        let strong = doc.create_html_element("strong", &[]);
        doc.append(doc.root(), p);
        doc.append_text(p, "Hello ");
        doc.append(p, strong);
        doc.append_text(strong, "big");
        doc.append_text(p, " world");

        assert_eq!(doc.text_content(p), "Hello big world");
        assert_eq!(doc.own_text(p), "Hello  world");
    }

    #[test]
    fn test_detach() {
        let mut doc = Document::new();
        let parent = doc.create_html_element("div", &[]);
        let a = doc.create_html_element("p", &[]);
        let b = doc.create_html_element("p", &[]);
        let c = doc.create_html_element("p", &[]);
        doc.append(doc.root(), parent);
        doc.append(parent, a);
        doc.append(parent, b);
        doc.append(parent, c);

        doc.detach(b);
        let children: Vec<_> = doc.children(parent).collect();
        assert_eq!(children, vec![a, c]);
        assert_eq!(doc.parent(b), None);
    }

    #[test]
    fn test_attr_ignore_case() {
        let mut doc = Document::new();
        let source = doc.create_html_element("source", &[("srcset", "/a.webp")]);
        assert_eq!(doc.attr(source, "srcSet"), None);
        assert_eq!(doc.attr_ignore_case(source, "srcSet"), Some("/a.webp"));
    }
}
