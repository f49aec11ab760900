//! Arena-backed DOM tree for HTML to Markdown conversion.
//!
//! The conversion engine is parser-agnostic: any parser can populate a
//! [`DomTree`] through the builder methods and hand the result to the
//! service. Nodes are identified by [`NodeId`], a stable index that doubles
//! as the key of the whitespace-collapse side table, so the engine never
//! needs to mutate the tree it converts.

/// Node classification, mirroring the DOM node types the engine cares about.
///
/// Parsers fold whitespace and CDATA spans into `Text`; doctype and
/// processing-instruction nodes are not transferred into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text node (including whitespace-only spans)
    Text,
    /// Comment node
    Comment,
}

/// Payload of a single node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The document root
    Document,
    /// An element with a lowercased tag name and its attributes
    Element {
        /// Lowercased tag name
        tag: String,
        /// Attribute (name, value) pairs with lowercased names
        attrs: Vec<(String, String)>,
    },
    /// Raw text as written in the source (entities already decoded)
    Text(String),
    /// Comment contents, kept for raw HTML serialization
    Comment(String),
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    data: NodeData,
}

/// Stable identity of a node within its [`DomTree`].
///
/// Ids are plain indices: cheap to copy, hashable, and valid for the lifetime
/// of the tree, which is what the collapsed-whitespace table keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// An owned DOM tree rooted at a document node.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a tree containing only a document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                first_child: None,
                last_child: None,
                next_sibling: None,
                data: NodeData::Document,
            }],
        }
    }

    /// The document root id.
    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow the document root.
    pub fn root(&self) -> NodeRef<'_> {
        self.get(self.root_id())
    }

    /// Borrow a node by id.
    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        debug_assert!(id.0 < self.nodes.len());
        NodeRef { tree: self, id }
    }

    /// Append an element child. Tag and attribute names are lowercased.
    pub fn append_element<N, V>(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: impl IntoIterator<Item = (N, V)>,
    ) -> NodeId
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let attrs = attrs
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_lowercase(), value.as_ref().to_string()))
            .collect();
        self.append(
            parent,
            NodeData::Element {
                tag: tag.to_lowercase(),
                attrs,
            },
        )
    }

    /// Append a text child.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append(parent, NodeData::Text(text.to_string()))
    }

    /// Append a comment child.
    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append(parent, NodeData::Comment(text.to_string()))
    }

    fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            first_child: None,
            last_child: None,
            next_sibling: None,
            data,
        });
        let parent_node = &mut self.nodes[parent.0];
        match parent_node.last_child {
            Some(last) => {
                parent_node.last_child = Some(id);
                self.nodes[last.0].next_sibling = Some(id);
            }
            None => {
                parent_node.first_child = Some(id);
                parent_node.last_child = Some(id);
            }
        }
        id
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A borrowed view of a node, carrying its tree for navigation.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a DomTree,
    id: NodeId,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a Node {
        &self.tree.nodes[self.id.0]
    }

    /// The node's stable identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    pub fn tree(&self) -> &'a DomTree {
        self.tree
    }

    /// The node's data payload.
    pub fn data(&self) -> &'a NodeData {
        &self.node().data
    }

    /// The node's kind tag.
    pub fn kind(&self) -> NodeKind {
        match self.node().data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        }
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Check if this is a text node.
    pub fn is_text(&self) -> bool {
        self.kind() == NodeKind::Text
    }

    /// Check if this is the document root.
    pub fn is_document(&self) -> bool {
        self.kind() == NodeKind::Document
    }

    /// Parent node, if any.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.tree.get(id))
    }

    /// Next sibling, if any.
    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.node().next_sibling.map(|id| self.tree.get(id))
    }

    /// Previous sibling, found by scanning the parent's children.
    pub fn previous_sibling(&self) -> Option<NodeRef<'a>> {
        let parent = self.parent()?;
        let mut previous = None;
        for child in parent.children() {
            if child.id == self.id {
                return previous;
            }
            previous = Some(child);
        }
        None
    }

    /// First child, if any.
    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.node().first_child.map(|id| self.tree.get(id))
    }

    /// Iterate over all child nodes.
    pub fn children(&self) -> Children<'a> {
        Children {
            next: self.first_child(),
        }
    }

    /// Iterate over element children only.
    pub fn element_children(&self) -> impl Iterator<Item = NodeRef<'a>> {
        self.children().filter(NodeRef::is_element)
    }

    /// Lowercased tag name for elements.
    pub fn tag_name(&self) -> Option<&'a str> {
        match &self.node().data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Check whether this node is an element with the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_name().is_some_and(|t| t == tag)
    }

    /// First child element with the given tag, if any.
    pub fn find_child(&self, tag: &str) -> Option<NodeRef<'a>> {
        self.children().find(|child| child.has_tag(tag))
    }

    /// Attribute value by case-insensitive name.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match &self.node().data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Iterate over attribute (name, value) pairs.
    pub fn attrs(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        let attrs: &[(String, String)] = match &self.node().data {
            NodeData::Element { attrs, .. } => attrs.as_slice(),
            _ => &[],
        };
        attrs
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Raw text for text nodes.
    pub fn text(&self) -> Option<&'a str> {
        match &self.node().data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Comment contents for comment nodes.
    pub fn comment(&self) -> Option<&'a str> {
        match &self.node().data {
            NodeData::Comment(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Concatenated raw text of this node and its descendants.
    ///
    /// Comments contribute nothing.
    pub fn text_content(&self) -> String {
        match &self.node().data {
            NodeData::Text(text) => text.clone(),
            NodeData::Comment(_) => String::new(),
            NodeData::Document | NodeData::Element { .. } => {
                let mut out = String::new();
                collect_text(*self, &mut out);
                out
            }
        }
    }
}

fn collect_text(node: NodeRef<'_>, out: &mut String) {
    for child in node.children() {
        match child.data() {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(_) => {}
            NodeData::Document | NodeData::Element { .. } => collect_text(child, out),
        }
    }
}

/// Iterator over a node's children.
pub struct Children<'a> {
    next: Option<NodeRef<'a>>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next_sibling();
        Some(current)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("data", self.data())
            .finish()
    }
}
