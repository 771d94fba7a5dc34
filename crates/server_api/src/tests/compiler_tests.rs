use provider::requests::{Request, TextStyleUpdate};
use shared::error::ErrorCode;

use super::*;

fn styled(text: &str, style: StyleChange) -> ChangeRecord {
    ChangeRecord::Text {
        element_id: "e1".into(),
        text: text.into(),
        style: Some(style),
    }
}

fn slides(ids: &[&str]) -> Vec<SlideId> {
    ids.iter().map(|id| SlideId::from(*id)).collect()
}

#[test]
fn text_change_is_delete_then_insert() {
    let ops = compile(
        &[ChangeRecord::text("e1", "Hello")],
        &CompileOptions::default(),
        &[],
    )
    .expect("compile");

    assert_eq!(
        ops,
        vec![
            Request::delete_all_text("e1"),
            Request::insert_text("e1", "Hello"),
        ]
    );
}

#[test]
fn empty_text_still_replaces_content() {
    let ops = compile(&[ChangeRecord::text("e1", "")], &CompileOptions::default(), &[])
        .expect("compile");
    assert_eq!(ops.len(), 2);
}

#[test]
fn style_follows_text_with_defaults() {
    let ops = compile(
        &[styled(
            "Title",
            StyleChange {
                bold: true,
                ..StyleChange::default()
            },
        )],
        &CompileOptions::default(),
        &[],
    )
    .expect("compile");

    assert_eq!(ops.len(), 4);
    assert_eq!(
        ops[2],
        Request::update_text_style(
            "e1",
            TextStyleUpdate {
                font_size: Dimension::points(DEFAULT_FONT_SIZE_PT),
                bold: true,
                italic: false,
                underline: false,
            }
        )
    );
    assert_eq!(ops[3], Request::update_alignment("e1", Alignment::Center));
}

#[test]
fn explicit_style_overrides_defaults() {
    let ops = compile(
        &[styled(
            "Body",
            StyleChange {
                font_size: Some(24.0),
                alignment: Some(Alignment::Start),
                ..StyleChange::default()
            },
        )],
        &CompileOptions::default(),
        &[],
    )
    .expect("compile");

    let Request::UpdateTextStyle(style) = &ops[2] else {
        panic!("expected text style, got {:?}", ops[2]);
    };
    assert_eq!(style.style.font_size.magnitude, 24.0);
    assert_eq!(ops[3], Request::update_alignment("e1", Alignment::Start));
}

#[test]
fn configured_defaults_apply() {
    let options = CompileOptions {
        default_font_size_pt: 12.0,
        default_alignment: Alignment::Justified,
    };
    let ops = compile(&[styled("x", StyleChange::default())], &options, &[]).expect("compile");

    let Request::UpdateTextStyle(style) = &ops[2] else {
        panic!("expected text style, got {:?}", ops[2]);
    };
    assert_eq!(style.style.font_size.magnitude, 12.0);
    assert_eq!(ops[3], Request::update_alignment("e1", Alignment::Justified));
}

#[test]
fn empty_text_never_carries_style() {
    let ops = compile(
        &[styled(
            "",
            StyleChange {
                bold: true,
                alignment: Some(Alignment::End),
                ..StyleChange::default()
            },
        )],
        &CompileOptions::default(),
        &[],
    )
    .expect("compile");

    assert!(ops.iter().all(|op| !matches!(
        op,
        Request::UpdateTextStyle(_) | Request::UpdateParagraphStyle(_)
    )));
    assert_eq!(ops.len(), 2);
}

#[test]
fn whitespace_only_text_never_carries_style() {
    let ops = compile(
        &[styled(
            "   ",
            StyleChange {
                bold: true,
                font_size: Some(24.0),
                ..StyleChange::default()
            },
        )],
        &CompileOptions::default(),
        &[],
    )
    .expect("compile");

    assert_eq!(
        ops,
        vec![
            Request::delete_all_text("e1"),
            Request::insert_text("e1", "   "),
        ]
    );
}

#[test]
fn null_slide_background_fans_out() {
    let all = slides(&["a", "b", "c"]);
    let ops = compile(
        &[ChangeRecord::background(None, "#336699")],
        &CompileOptions::default(),
        &all,
    )
    .expect("compile");

    assert_eq!(ops.len(), 3);
    let targets: Vec<_> = ops.iter().filter_map(Request::object_id).collect();
    assert_eq!(targets, vec!["a", "b", "c"]);
    assert!(ops
        .iter()
        .all(|op| matches!(op, Request::UpdatePageProperties(p) if p.fields == "pageBackgroundFill.solidFill.color")));
}

#[test]
fn fan_out_covers_any_slide_count() {
    for n in 0..6 {
        let ids: Vec<SlideId> = (0..n).map(|i| SlideId(format!("s{i}"))).collect();
        let ops = compile(
            &[ChangeRecord::background(None, "#000000")],
            &CompileOptions::default(),
            &ids,
        )
        .expect("compile");
        assert_eq!(ops.len(), n);
    }
}

#[test]
fn targeted_background_ignores_slide_list() {
    let ops = compile(
        &[ChangeRecord::background(Some(SlideId::from("b")), "ffffff")],
        &CompileOptions::default(),
        &slides(&["a", "b", "c"]),
    )
    .expect("compile");

    assert_eq!(ops, vec![Request::update_background("b", RgbColor::WHITE)]);
}

#[test]
fn malformed_hex_is_a_validation_error() {
    let err = compile(
        &[ChangeRecord::background(None, "blue")],
        &CompileOptions::default(),
        &slides(&["a"]),
    )
    .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[test]
fn record_order_is_preserved() {
    let ops = compile(
        &[
            ChangeRecord::text("t1", "one"),
            ChangeRecord::image("img", "https://img"),
            ChangeRecord::PlaceholderFill {
                find: "{{NAME}}".into(),
                replace: "Ada".into(),
                match_case: true,
            },
            ChangeRecord::text("t2", "two"),
        ],
        &CompileOptions::default(),
        &[],
    )
    .expect("compile");

    assert_eq!(
        ops,
        vec![
            Request::delete_all_text("t1"),
            Request::insert_text("t1", "one"),
            Request::replace_image("img", "https://img"),
            Request::replace_all_text("{{NAME}}", "Ada", true),
            Request::delete_all_text("t2"),
            Request::insert_text("t2", "two"),
        ]
    );
}
