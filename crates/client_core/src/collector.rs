//! Editable surface built from a projected document, and the scan that turns
//! it back into change records.

use shared::{
    change::ChangeRecord,
    domain::{Document, Element, ElementId, RgbColor, SlideId},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedNode {
    EditableText { element_id: ElementId, content: String },
    Image { element_id: ElementId, src: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlide {
    pub slide_id: SlideId,
    pub background: RgbColor,
    pub nodes: Vec<RenderedNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedSurface {
    slides: Vec<RenderedSlide>,
    image_changes: Vec<ChangeRecord>,
}

impl RenderedSurface {
    /// Text elements with visible content become editable nodes holding the
    /// trimmed text; blank ones are not rendered.
    pub fn render(document: &Document) -> Self {
        let slides = document
            .slides
            .iter()
            .map(|slide| RenderedSlide {
                slide_id: slide.slide_id.clone(),
                background: slide.background_color,
                nodes: slide
                    .elements
                    .iter()
                    .filter_map(|element| match element {
                        Element::Text { id, text, .. } if !text.trim().is_empty() => {
                            Some(RenderedNode::EditableText {
                                element_id: id.clone(),
                                content: text.trim().to_string(),
                            })
                        }
                        Element::Text { .. } => None,
                        Element::Image { id, image } => Some(RenderedNode::Image {
                            element_id: id.clone(),
                            src: image.clone(),
                        }),
                    })
                    .collect(),
            })
            .collect();
        Self {
            slides,
            image_changes: Vec::new(),
        }
    }

    pub fn slides(&self) -> &[RenderedSlide] {
        &self.slides
    }

    /// Returns false when no editable node carries `element_id`.
    pub fn set_text(&mut self, element_id: &ElementId, text: impl Into<String>) -> bool {
        let target = self.nodes_mut().find_map(|node| match node {
            RenderedNode::EditableText {
                element_id: id,
                content,
            } if id == element_id => Some(content),
            _ => None,
        });
        match target {
            Some(content) => {
                *content = text.into();
                true
            }
            None => false,
        }
    }

    /// Swaps the source of an image node and records the matching image
    /// change, superseding any earlier one for the same element.
    pub fn substitute_image(&mut self, element_id: &ElementId, url: impl Into<String>) -> bool {
        let url = url.into();
        let target = self.nodes_mut().find_map(|node| match node {
            RenderedNode::Image {
                element_id: id,
                src,
            } if id == element_id => Some(src),
            _ => None,
        });
        let Some(src) = target else {
            return false;
        };
        src.clone_from(&url);

        self.image_changes.retain(|change| {
            !matches!(change, ChangeRecord::Image { element_id: id, .. } if id == element_id)
        });
        self.image_changes
            .push(ChangeRecord::image(element_id.clone(), url));
        true
    }

    pub fn image_changes(&self) -> &[ChangeRecord] {
        &self.image_changes
    }

    fn nodes(&self) -> impl Iterator<Item = &RenderedNode> {
        self.slides.iter().flat_map(|slide| slide.nodes.iter())
    }

    fn nodes_mut(&mut self) -> impl Iterator<Item = &mut RenderedNode> {
        self.slides.iter_mut().flat_map(|slide| slide.nodes.iter_mut())
    }
}

/// One text change per editable node, in render order, whether or not the
/// user touched it.
pub fn collect(surface: &RenderedSurface) -> Vec<ChangeRecord> {
    surface
        .nodes()
        .filter_map(|node| match node {
            RenderedNode::EditableText {
                element_id,
                content,
            } => Some(ChangeRecord::text(element_id.clone(), content.trim())),
            RenderedNode::Image { .. } => None,
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/collector_tests.rs"]
mod tests;
