/// Handle to an element of a preview document
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

/// The slice of a rendered document the preview runtime works with.
///
/// Implemented over a real DOM by the host, and in memory for tests. The
/// runtime never observes the document on its own; the host reports new
/// content through `Preview::content_inserted`.
pub trait PreviewDocument {
    /// Current location, absolute
    fn location(&self) -> String;

    /// Replace the current history entry without navigating
    fn replace_location(&mut self, url: &str);

    fn title(&self) -> String;

    fn scroll(&self) -> i64;

    fn set_scroll(&mut self, scroll: i64);

    /// `<a>` and `<area>` elements at or below `scope`, or in the whole
    /// document when `scope` is `None`
    fn links(&self, scope: Option<NodeId>) -> Vec<NodeId>;

    /// `<form>` elements at or below `scope`
    fn forms(&self, scope: Option<NodeId>) -> Vec<NodeId>;

    /// Elements matching a CSS selector, in document order
    fn select(&self, selector: &str) -> Vec<NodeId>;

    fn contains(&self, node: NodeId) -> bool;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn set_class(&mut self, node: NodeId, class: &str, on: bool);

    /// Value of a hidden input named `name` inside `form`
    fn hidden_input(&self, form: NodeId, name: &str) -> Option<String>;

    /// Create or update a hidden input named `name` inside `form`
    fn set_hidden_input(&mut self, form: NodeId, name: &str, value: &str);

    /// Replace the content of `node` with `html`. With `inclusive` the node
    /// itself is replaced and the new root is returned; otherwise only its
    /// children change and `node` is returned. `None` if `node` is gone.
    fn replace_content(&mut self, node: NodeId, html: &str, inclusive: bool) -> Option<NodeId>;
}
