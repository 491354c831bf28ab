/// In-memory preview document for E2E testing
/// A small element tree with just enough selector support for partials

use std::collections::{BTreeMap, BTreeSet};

use livesync_preview::{NodeId, PreviewDocument};

struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    html: String,
    hidden_inputs: BTreeMap<String, String>,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            classes: BTreeSet::new(),
            parent,
            children: Vec::new(),
            html: String::new(),
            hidden_inputs: BTreeMap::new(),
        }
    }

    fn matches(&self, selector: &str) -> bool {
        if let Some(class) = selector.strip_prefix('.') {
            return self.classes.contains(class);
        }
        if let Some(id) = selector.strip_prefix('#') {
            return self.attributes.get("id").map(String::as_str) == Some(id);
        }
        if let Some(attribute) = selector
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return self.attributes.contains_key(attribute);
        }
        self.tag == selector
    }
}

pub struct TestDocument {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    location: String,
    history: Vec<String>,
    title: String,
    scroll: i64,
}

impl TestDocument {
    pub fn new(location: &str) -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, Node::new("body", None));
        Self {
            nodes,
            root,
            next_id: 1,
            location: location.to_string(),
            history: Vec::new(),
            title: String::new(),
            scroll: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append an element below `parent`. A `class` attribute is split into
    /// classes.
    pub fn add_element(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = self.allocate(tag, parent);
        if let Some(node) = self.nodes.get_mut(&id) {
            for (name, value) in attributes {
                if *name == "class" {
                    node.classes
                        .extend(value.split_whitespace().map(str::to_string));
                } else {
                    node.attributes.insert(name.to_string(), value.to_string());
                }
            }
        }
        id
    }

    pub fn add_link(&mut self, parent: NodeId, href: &str) -> NodeId {
        self.add_element(parent, "a", &[("href", href)])
    }

    pub fn add_form(&mut self, parent: NodeId, action: Option<&str>) -> NodeId {
        match action {
            Some(action) => self.add_element(parent, "form", &[("action", action)]),
            None => self.add_element(parent, "form", &[]),
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Client-side navigation: the location changes without a reload and
    /// without any state parameters
    pub fn navigate(&mut self, url: &str) {
        self.location = url.to_string();
    }

    /// Every location written through `replace_location`, oldest first
    pub fn location_history(&self) -> &[String] {
        &self.history
    }

    pub fn html(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|node| node.html.as_str())
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// `href` of every link in the document, in document order
    pub fn hrefs(&self) -> Vec<String> {
        self.links(None)
            .into_iter()
            .filter_map(|link| self.attribute(link, "href"))
            .collect()
    }

    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes.get(&node).and_then(|node| node.parent) {
            if let Some(parent) = self.nodes.get_mut(&parent) {
                parent.children.retain(|child| *child != node);
            }
        }
        self.remove_subtree(node);
    }

    fn allocate(&mut self, tag: &str, parent: NodeId) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(tag, Some(parent)));
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }
        id
    }

    fn remove_subtree(&mut self, node: NodeId) {
        if let Some(removed) = self.nodes.remove(&node) {
            for child in removed.children {
                self.remove_subtree(child);
            }
        }
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![scope];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get(&next) else {
                continue;
            };
            found.push(next);
            stack.extend(node.children.iter().rev().copied());
        }
        found
    }

    fn with_tag(&self, scope: Option<NodeId>, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(scope.unwrap_or(self.root))
            .into_iter()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|node| tags.contains(&node.tag.as_str()))
            })
            .collect()
    }

    // every href="..." in a fragment becomes a link below `parent`
    fn insert_fragment(&mut self, parent: NodeId, html: &str) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.html = html.to_string();
        }
        let mut rest = html;
        while let Some(start) = rest.find("href=\"") {
            rest = &rest[start + 6..];
            let Some(end) = rest.find('"') else {
                break;
            };
            let href = rest[..end].to_string();
            self.add_link(parent, &href);
            rest = &rest[end..];
        }
    }
}

impl PreviewDocument for TestDocument {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn replace_location(&mut self, url: &str) {
        self.location = url.to_string();
        self.history.push(url.to_string());
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn scroll(&self) -> i64 {
        self.scroll
    }

    fn set_scroll(&mut self, scroll: i64) {
        self.scroll = scroll;
    }

    fn links(&self, scope: Option<NodeId>) -> Vec<NodeId> {
        self.with_tag(scope, &["a", "area"])
    }

    fn forms(&self, scope: Option<NodeId>) -> Vec<NodeId> {
        self.with_tag(scope, &["form"])
    }

    fn select(&self, selector: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|node| node.matches(selector)))
            .collect()
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let node = self.nodes.get(&node)?;
        if name == "class" {
            return Some(node.classes.iter().cloned().collect::<Vec<_>>().join(" "));
        }
        node.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|node| node.classes.contains(class))
    }

    fn set_class(&mut self, node: NodeId, class: &str, on: bool) {
        if let Some(node) = self.nodes.get_mut(&node) {
            if on {
                node.classes.insert(class.to_string());
            } else {
                node.classes.remove(class);
            }
        }
    }

    fn hidden_input(&self, form: NodeId, name: &str) -> Option<String> {
        self.nodes.get(&form)?.hidden_inputs.get(name).cloned()
    }

    fn set_hidden_input(&mut self, form: NodeId, name: &str, value: &str) {
        if let Some(form) = self.nodes.get_mut(&form) {
            form.hidden_inputs.insert(name.to_string(), value.to_string());
        }
    }

    fn replace_content(&mut self, node: NodeId, html: &str, inclusive: bool) -> Option<NodeId> {
        let old = self.nodes.get(&node)?;

        if !inclusive {
            let children = old.children.clone();
            for child in children {
                self.remove_subtree(child);
            }
            if let Some(old) = self.nodes.get_mut(&node) {
                old.children.clear();
            }
            self.insert_fragment(node, html);
            return Some(node);
        }

        // the new root takes the old element's place among its siblings
        let parent = old.parent?;
        let tag = old.tag.clone();
        let attributes = old.attributes.clone();
        let classes = old.classes.clone();

        let replacement = NodeId(self.next_id);
        self.next_id += 1;
        let mut fresh = Node::new(&tag, Some(parent));
        fresh.attributes = attributes;
        fresh.classes = classes;
        self.nodes.insert(replacement, fresh);
        if let Some(parent) = self.nodes.get_mut(&parent) {
            for child in parent.children.iter_mut() {
                if *child == node {
                    *child = replacement;
                }
            }
        }
        self.remove_subtree(node);
        self.insert_fragment(replacement, html);
        Some(replacement)
    }
}
