//! Page document model the widget reads and writes.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use super::ids;

/// The slice of a page's element tree the widget touches.
///
/// Operations on ids that do not exist are ignored, except the queries,
/// which return `None`/`false`.
pub trait Document: Send + Sync {
    /// Whether an element with this id exists.
    fn has_element(&self, id: &str) -> bool;

    /// Text content of an element.
    fn text_content(&self, id: &str) -> Option<String>;

    /// Replace an element's text content.
    fn set_text_content(&self, id: &str, text: &str);

    /// Value of a form control.
    fn value(&self, id: &str) -> Option<String>;

    /// Set the value of a form control.
    fn set_value(&self, id: &str, value: &str);

    /// Add a CSS class.
    fn add_class(&self, id: &str, class: &str);

    /// Remove a CSS class.
    fn remove_class(&self, id: &str, class: &str);

    /// Whether an element carries a CSS class.
    fn has_class(&self, id: &str, class: &str) -> bool;

    /// Append a child given as markup.
    fn append_html(&self, id: &str, html: &str);

    /// Scroll a container so its last child is visible.
    fn scroll_to_bottom(&self, id: &str);
}

#[derive(Debug, Default, Clone)]
struct Element {
    text: String,
    value: String,
    classes: BTreeSet<String>,
    children: Vec<String>,
    scroll_top: usize,
}

/// In-memory [`Document`] used by the page server and tests.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: RwLock<HashMap<String, Element>>,
}

impl MemoryDocument {
    /// Create a document with no elements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document containing the given element ids.
    #[must_use]
    pub fn with_elements(element_ids: &[&str]) -> Self {
        let elements = element_ids
            .iter()
            .map(|id| ((*id).to_string(), Element::default()))
            .collect();
        Self {
            elements: RwLock::new(elements),
        }
    }

    /// Create the chat page: every element the widget uses, with the schema
    /// panel shown or collapsed according to `mode`.
    #[must_use]
    pub fn chat_page(mode: &str) -> Self {
        let doc = Self::with_elements(&ids::ALL);
        doc.set_value(ids::CHAT_MODE, mode);
        if mode != super::ACCOUNTING_MODE {
            doc.add_class(ids::SCHEMA_INFO, super::COLLAPSE_CLASS);
        }
        doc
    }

    /// Children appended to a container, oldest first.
    #[must_use]
    pub fn children(&self, id: &str) -> Vec<String> {
        self.elements
            .read()
            .unwrap()
            .get(id)
            .map(|el| el.children.clone())
            .unwrap_or_default()
    }

    /// Index of the child scrolled into view; equals the child count after
    /// [`Document::scroll_to_bottom`].
    #[must_use]
    pub fn scroll_position(&self, id: &str) -> usize {
        self.elements
            .read()
            .unwrap()
            .get(id)
            .map_or(0, |el| el.scroll_top)
    }

    /// Space-separated class list.
    #[must_use]
    pub fn class_list(&self, id: &str) -> String {
        self.elements
            .read()
            .unwrap()
            .get(id)
            .map(|el| el.classes.iter().cloned().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }

    fn with_element(&self, id: &str, f: impl FnOnce(&mut Element)) {
        let mut guard = self.elements.write().unwrap();
        if let Some(el) = guard.get_mut(id) {
            f(el);
        } else {
            tracing::debug!(element = %id, "Element not found");
        }
    }

    fn read_element<T>(&self, id: &str, f: impl FnOnce(&Element) -> T) -> Option<T> {
        self.elements.read().unwrap().get(id).map(f)
    }
}

impl Document for MemoryDocument {
    fn has_element(&self, id: &str) -> bool {
        self.elements.read().unwrap().contains_key(id)
    }

    fn text_content(&self, id: &str) -> Option<String> {
        self.read_element(id, |el| el.text.clone())
    }

    fn set_text_content(&self, id: &str, text: &str) {
        self.with_element(id, |el| el.text = text.to_string());
    }

    fn value(&self, id: &str) -> Option<String> {
        self.read_element(id, |el| el.value.clone())
    }

    fn set_value(&self, id: &str, value: &str) {
        self.with_element(id, |el| el.value = value.to_string());
    }

    fn add_class(&self, id: &str, class: &str) {
        self.with_element(id, |el| {
            el.classes.insert(class.to_string());
        });
    }

    fn remove_class(&self, id: &str, class: &str) {
        self.with_element(id, |el| {
            el.classes.remove(class);
        });
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.read_element(id, |el| el.classes.contains(class))
            .unwrap_or(false)
    }

    fn append_html(&self, id: &str, html: &str) {
        self.with_element(id, |el| el.children.push(html.to_string()));
    }

    fn scroll_to_bottom(&self, id: &str) {
        self.with_element(id, |el| el.scroll_top = el.children.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_page_has_every_element() {
        let doc = MemoryDocument::chat_page("accounting");
        for id in ids::ALL {
            assert!(doc.has_element(id), "missing {id}");
        }
        assert!(!doc.has_class(ids::SCHEMA_INFO, "collapse"));
        assert_eq!(doc.value(ids::CHAT_MODE).as_deref(), Some("accounting"));
    }

    #[test]
    fn test_chat_page_collapses_schema_outside_accounting_mode() {
        let doc = MemoryDocument::chat_page("general");
        assert!(doc.has_class(ids::SCHEMA_INFO, "collapse"));
    }

    #[test]
    fn test_missing_elements_are_ignored() {
        let doc = MemoryDocument::new();
        doc.set_text_content("nope", "x");
        doc.append_html("nope", "<p></p>");
        assert!(doc.text_content("nope").is_none());
        assert!(doc.children("nope").is_empty());
        assert!(!doc.has_class("nope", "collapse"));
    }

    #[test]
    fn test_scroll_tracks_last_child() {
        let doc = MemoryDocument::with_elements(&[ids::CHAT_MESSAGES]);
        doc.append_html(ids::CHAT_MESSAGES, "<div>1</div>");
        doc.append_html(ids::CHAT_MESSAGES, "<div>2</div>");
        assert_eq!(doc.scroll_position(ids::CHAT_MESSAGES), 0);
        doc.scroll_to_bottom(ids::CHAT_MESSAGES);
        assert_eq!(doc.scroll_position(ids::CHAT_MESSAGES), 2);
    }
}
