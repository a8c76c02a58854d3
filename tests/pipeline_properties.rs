use std::collections::HashSet;
use std::fs;

use serde_json::json;
use sitecanvas::factory::create_element;
use sitecanvas::geometry::MIN_RENDERED_SIZE;
use sitecanvas::model::{Canvas, Dimension, ElementKind, ElementType, Hierarchy, Spacing};
use sitecanvas::rendering::layout::layout_elements;
use sitecanvas::{flatten, generate_id, resolve_actual_size, resolve_padding, FlatElement};

fn landing() -> Canvas {
    let raw = fs::read_to_string("tests/fixtures/landing.json").expect("read fixture");
    serde_json::from_str(&raw).expect("parse fixture")
}

#[test]
fn fixture_loads_with_unknown_variant() {
    let canvas = landing();
    assert_eq!(canvas.len(), 7);
    assert_eq!((canvas.width, canvas.height), (960.0, 640.0));
    assert!(matches!(canvas.get("mystery").unwrap().kind, ElementKind::Unknown(_)));
    assert!(canvas.validate().is_empty());

    // re-saving writes the unrecognised element back as it was read
    let saved = serde_json::to_string(&canvas).unwrap();
    let reloaded: Canvas = serde_json::from_str(&saved).unwrap();
    assert_eq!(reloaded, canvas);
    assert_eq!(reloaded.get("mystery").unwrap().kind.raw_tag(), Some("video"));
}

#[test]
fn actual_size_is_declared_plus_padding_with_floor() {
    let declared = [0.0, 1.0, 5.0, 19.0, 20.0, 64.5, 300.0];
    let paddings = [0.0, 2.0, 8.0, -4.0];
    for t in ElementType::ALL {
        for &w in &declared {
            for &p in &paddings {
                let mut el = create_element(t, "e", 0.0, 0.0);
                el.width = Dimension::Fixed(w);
                el.height = Dimension::Fixed(w);
                el.padding = Spacing::uniform(p);
                let size = resolve_actual_size(&el);
                let expected = (w + 2.0 * p).max(MIN_RENDERED_SIZE);
                assert_eq!(size.width, expected, "{} w={} p={}", t, w, p);
                assert_eq!(size.height, expected, "{} h={} p={}", t, w, p);
                assert!(size.width >= MIN_RENDERED_SIZE);
            }
        }
    }
}

#[test]
fn auto_dimensions_ignore_padding() {
    let mut button = create_element(ElementType::Button, "b", 0.0, 0.0);
    button.width = Dimension::Auto;
    button.height = Dimension::Auto;
    let size = resolve_actual_size(&button);
    assert_eq!((size.width, size.height), (100.0, 40.0));

    let canvas = landing();
    let faq = resolve_actual_size(canvas.get("faq").unwrap());
    assert_eq!((faq.width, faq.height), (300.0, 200.0));
}

#[test]
fn padding_normalization_is_total() {
    let cases = [
        (json!(12), 12.0),
        (json!(-3), -3.0),
        (json!("12px"), 12.0),
        (json!("  7.5 "), 7.5),
        (json!(""), 0.0),
        (json!("abc"), 0.0),
        (json!(null), 0.0),
        (json!(true), 0.0),
        (json!([1, 2]), 0.0),
        (json!({ "top": 1 }), 0.0),
    ];
    for (raw, expected) in cases {
        assert_eq!(resolve_padding(Some(&raw)), expected, "{}", raw);
    }
    assert_eq!(resolve_padding(None), 0.0);
}

#[test]
fn flatten_preserves_ids_order_and_parents() {
    let canvas = landing();
    let flat = flatten(&canvas);
    assert_eq!(flat.len(), canvas.len());
    for (el, f) in canvas.elements.iter().zip(&flat) {
        assert_eq!(el.id, f.id);
        assert_eq!(el.type_name(), f.element_type);
        assert_eq!(el.parent_id, f.parent_id);
        let size = resolve_actual_size(el);
        assert_eq!((f.width, f.height), (size.width, size.height));
    }

    let ids: HashSet<&str> = flat.iter().map(|f| f.id.as_str()).collect();
    for f in flat.iter().filter(|f| f.parent_id.is_some()) {
        assert!(ids.contains(f.parent_id.as_deref().unwrap()));
    }
}

#[test]
fn flatten_resolves_string_padding() {
    let flat = flatten(&landing());
    let cta = flat.iter().find(|f| f.id == "cta").unwrap();
    assert_eq!((cta.width, cta.height), (152.0, 56.0));
    assert_eq!(cta.style.f64("paddingTop"), Some(8.0));
    assert_eq!(cta.style.f64("paddingRight"), Some(16.0));
    assert_eq!(cta.props.str("href"), Some("example.com/start"));

    let mystery = flat.iter().find(|f| f.id == "mystery").unwrap();
    assert_eq!(mystery.element_type, "unknown");
    assert!(mystery.props.is_empty());
}

#[test]
fn flat_feed_survives_the_wire() {
    let flat = flatten(&landing());
    let wire = serde_json::to_string(&flat).unwrap();
    let back: Vec<FlatElement> = serde_json::from_str(&wire).unwrap();
    assert_eq!(back, flat);
    let value: serde_json::Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(value[0]["zIndex"], 1);
    assert_eq!(value[1]["parentId"], "hero");
}

#[test]
fn container_children_flow_inside_padding() {
    let flat = flatten(&landing());
    let hierarchy = Hierarchy::build(&flat);
    let rects = layout_elements(&flat, &hierarchy);
    let at = |id: &str| rects[flat.iter().position(|f| f.id == id).unwrap()];

    assert_eq!((at("hero").x, at("hero").y), (40.0, 40.0));
    assert_eq!((at("headline").x, at("headline").y), (56.0, 56.0));
    assert_eq!((at("cta").x, at("cta").y), (56.0, 104.0));
    assert_eq!((at("faq").x, at("faq").y), (480.0, 40.0));
}

#[test]
fn generated_ids_are_short_and_distinct() {
    let ids: HashSet<String> = (0..500).map(|_| generate_id()).collect();
    assert_eq!(ids.len(), 500);
    assert!(ids.iter().all(|id| id.len() == 9 && id.chars().all(|c| c.is_ascii_alphanumeric())));
}

#[test]
fn every_variant_has_a_factory_default() {
    for t in ElementType::ALL {
        let el = create_element(t, "x", 1.0, 2.0);
        assert_eq!(el.type_name(), t.as_str());
        assert_eq!((el.x, el.y, el.z_index), (1.0, 2.0, 0));
        assert!(!el.width.is_auto() && !el.height.is_auto());
    }
}
