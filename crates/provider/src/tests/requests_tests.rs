use super::*;
use serde_json::json;

#[test]
fn delete_all_text_serializes_as_range_all() {
    let value = serde_json::to_value(Request::delete_all_text("e1")).expect("json");
    assert_eq!(
        value,
        json!({ "deleteText": { "objectId": "e1", "textRange": { "type": "ALL" } } })
    );
}

#[test]
fn insert_text_targets_index_zero() {
    let value = serde_json::to_value(Request::insert_text("e1", "Hello")).expect("json");
    assert_eq!(
        value,
        json!({ "insertText": { "objectId": "e1", "text": "Hello", "insertionIndex": 0 } })
    );
}

#[test]
fn background_update_is_masked_to_fill_color() {
    let color = RgbColor::from_components(255, 0, 0);
    let value = serde_json::to_value(Request::update_background("s1", color)).expect("json");
    assert_eq!(
        value,
        json!({
            "updatePageProperties": {
                "objectId": "s1",
                "pageProperties": {
                    "pageBackgroundFill": {
                        "solidFill": { "color": { "rgbColor": { "red": 1.0, "green": 0.0, "blue": 0.0 } } }
                    }
                },
                "fields": "pageBackgroundFill.solidFill.color"
            }
        })
    );
}

#[test]
fn text_style_carries_points_and_field_mask() {
    let request = Request::update_text_style(
        "e1",
        TextStyleUpdate {
            font_size: Dimension::points(16.0),
            bold: true,
            italic: false,
            underline: false,
        },
    );
    let value = serde_json::to_value(request).expect("json");
    let body = &value["updateTextStyle"];
    assert_eq!(body["style"]["fontSize"], json!({ "magnitude": 16.0, "unit": "PT" }));
    assert_eq!(body["style"]["bold"], true);
    assert_eq!(body["fields"], "fontSize,bold,italic,underline");
    assert_eq!(body["textRange"]["type"], "ALL");
}

#[test]
fn alignment_serializes_uppercase() {
    let value = serde_json::to_value(Request::update_alignment("e1", Alignment::Center)).expect("json");
    assert_eq!(value["updateParagraphStyle"]["style"]["alignment"], "CENTER");
    assert_eq!(value["updateParagraphStyle"]["fields"], "alignment");
}

#[test]
fn replace_all_text_matches_substring() {
    let value =
        serde_json::to_value(Request::replace_all_text("{{PLACEHOLDER}}", "Q3", false)).expect("json");
    assert_eq!(
        value,
        json!({
            "replaceAllText": {
                "containsText": { "text": "{{PLACEHOLDER}}", "matchCase": false },
                "replaceText": "Q3"
            }
        })
    );
}

#[test]
fn replace_image_keeps_aspect_inside_frame() {
    let value = serde_json::to_value(Request::replace_image("img1", "https://img")).expect("json");
    assert_eq!(
        value,
        json!({
            "replaceImage": {
                "imageObjectId": "img1",
                "url": "https://img",
                "imageReplaceMethod": "CENTER_INSIDE"
            }
        })
    );
}

#[test]
fn object_id_reports_target() {
    assert_eq!(Request::delete_all_text("e1").object_id(), Some("e1"));
    assert_eq!(Request::replace_image("i1", "u").object_id(), Some("i1"));
    assert_eq!(Request::replace_all_text("a", "b", true).object_id(), None);
}
