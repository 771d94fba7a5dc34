use provider::raw::{Page, PageElement, Presentation, Shape};
use shared::domain::{Document, Element, ElementId, RgbColor, Slide, SlideId};

/// Projects a provider presentation into the editor's document model.
///
/// Slide and element order follow the provider exactly. Elements that are
/// neither text-bearing shapes nor images are dropped.
pub fn project(presentation: &Presentation) -> Document {
    Document {
        slides: presentation.slides.iter().map(project_slide).collect(),
    }
}

fn project_slide(page: &Page) -> Slide {
    Slide {
        slide_id: SlideId(page.object_id.clone()),
        background_color: page.background_rgb().unwrap_or(RgbColor::WHITE),
        elements: page.page_elements.iter().filter_map(project_element).collect(),
    }
}

fn project_element(element: &PageElement) -> Option<Element> {
    let id = ElementId(element.object_id.clone());
    if let Some(shape) = element.shape.as_ref().filter(|s| s.text.is_some()) {
        return Some(project_text(id, shape));
    }
    let image = element.image.as_ref()?;
    let url = image.content_url.as_ref().or(image.source_url.as_ref())?;
    Some(Element::Image {
        id,
        image: url.clone(),
    })
}

fn project_text(id: ElementId, shape: &Shape) -> Element {
    let runs = shape
        .text
        .iter()
        .flat_map(|t| t.text_elements.iter())
        .filter_map(|e| e.text_run.as_ref());

    let mut text = String::new();
    let mut text_color = None;
    for run in runs {
        if let Some(content) = &run.content {
            text.push_str(content);
        }
        if text_color.is_none() {
            text_color = run.foreground_rgb();
        }
    }
    Element::Text {
        id,
        text,
        text_color,
    }
}

#[cfg(test)]
#[path = "tests/projector_tests.rs"]
mod tests;
