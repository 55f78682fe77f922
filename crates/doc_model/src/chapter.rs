//! Chapter node - a leaf with content or a section containing chapters

use crate::{AttributeValue, Attributes, ChapterId, Content, TITLE};

/// A node in the chapter tree.
///
/// Children are owned by the [`ChapterTree`](crate::ChapterTree) arena; the
/// chapter only records their handles. The parent handle is a back-reference
/// used for lookups and path building.
#[derive(Debug, Clone)]
pub struct Chapter {
    id: ChapterId,
    parent: Option<ChapterId>,
    children: Vec<ChapterId>,
    attributes: Attributes,
    content: Content,
}

impl Chapter {
    pub(crate) fn new(id: ChapterId, attributes: Attributes, content: Content) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            attributes,
            content,
        }
    }

    pub fn id(&self) -> ChapterId {
        self.id
    }

    /// Get the parent chapter (None for the root or a detached chapter)
    pub fn parent(&self) -> Option<ChapterId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ChapterId>) {
        self.parent = parent;
    }

    pub fn children(&self) -> &[ChapterId] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ChapterId> {
        &mut self.children
    }

    /// A section is a chapter with at least one child
    pub fn is_section(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Set an attribute, returning the previous value
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.attributes.insert(key.into(), value.into())
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }

    /// Remove every attribute, returning the previous map
    pub fn clear_attributes(&mut self) -> Attributes {
        std::mem::take(&mut self.attributes)
    }

    /// Title attribute, or an empty string
    pub fn title(&self) -> &str {
        self.attributes
            .get(TITLE)
            .and_then(AttributeValue::as_text)
            .unwrap_or("")
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Replace the primary content, returning the previous one
    pub fn set_content(&mut self, content: Content) -> Content {
        std::mem::replace(&mut self.content, content)
    }
}
