use scraper::{ElementRef, Node};

/// Collapses every whitespace run (newlines included) into one space and trims the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A sibling following an element: either another element or a bare text node
pub enum Sibling<E> {
    Element(E),
    Text(String),
}

/// Read-only view of a parsed document node, enough to walk section headings.
pub trait Element: Copy {
    fn tag(&self) -> &str;

    /// Concatenated text of the element and its descendants
    fn text(&self) -> String;

    fn next_sibling_element(&self) -> Option<Self>;

    fn following_siblings(&self) -> Vec<Sibling<Self>>;
}

impl<'a> Element for ElementRef<'a> {
    fn tag(&self) -> &str {
        self.value().name()
    }

    fn text(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.next_siblings().find_map(ElementRef::wrap)
    }

    fn following_siblings(&self) -> Vec<Sibling<Self>> {
        self.next_siblings()
            .filter_map(|node| match node.value() {
                Node::Text(text) => Some(Sibling::Text(text.to_string())),
                Node::Element(_) => ElementRef::wrap(node).map(Sibling::Element),
                _ => None,
            })
            .collect()
    }
}

/**
Finds the first heading whose text contains `label` (case-insensitive) and returns the
normalized text of the block right after it.

When the heading has no following element, every following text up to the next heading
is used instead. That fallback can pick up unrelated trailing content on pages shaped
differently than expected.
*/
pub fn section_text<E: Element>(headings: impl IntoIterator<Item = E>, label: &str) -> String {
    let label = label.to_lowercase();
    for heading in headings {
        if !heading.text().to_lowercase().contains(&label) {
            continue;
        }

        if let Some(block) = heading.next_sibling_element() {
            return clean_text(&block.text());
        }

        let tag = heading.tag().to_string();
        let content = heading
            .following_siblings()
            .into_iter()
            .map_while(|sibling| match sibling {
                Sibling::Element(element) if element.tag() == tag => None,
                Sibling::Element(element) => Some(element.text()),
                Sibling::Text(text) => Some(text),
            })
            .collect::<Vec<_>>();

        if !content.is_empty() {
            return clean_text(&content.join(" "));
        }
    }

    String::new()
}
