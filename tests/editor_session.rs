use std::sync::Arc;

use scraper::{Html, Selector};
use serde_json::json;
use sitecanvas::model::{ElementKind, ElementType};
use sitecanvas::store::NewPage;
use sitecanvas::{EditorSession, PageStore, RenderMode, Renderer, SaveState};

fn store_with_page() -> (Arc<PageStore>, String) {
    let store = Arc::new(PageStore::new());
    let page = store
        .create_page(NewPage { title: Some("Landing".into()), ..Default::default() })
        .expect("create page");
    (store, page.id)
}

#[test]
fn drag_commits_snapped_position_at_zoom() {
    let (store, page_id) = store_with_page();
    let page = store.get_page(&page_id).unwrap();
    let mut session = EditorSession::new(page.id, page.content);
    let id = session.add_element_at(ElementType::Text, 100.0, 100.0).unwrap();
    session.set_zoom(2.0);
    session.set_grid_size(10.0);
    session.set_show_grid(false);

    assert!(session.pointer_down(&id, 300.0, 300.0));
    assert_eq!(session.pointer_move(301.0, 301.0), None);
    assert!(!session.is_dragging());
    assert!(!session.show_grid());

    assert!(session.pointer_move(340.0, 320.0).is_some());
    assert!(session.is_dragging());
    assert!(session.show_grid());

    // delta (47, 6) screen px at zoom 2 -> (123.5, 103) -> snapped
    let commit = session.pointer_up(347.0, 306.0).expect("commit");
    assert_eq!((commit.x, commit.y), (120.0, 100.0));
    let el = session.canvas().get(&id).unwrap();
    assert_eq!((el.x, el.y), (120.0, 100.0));
    assert!(!session.show_grid());
    assert!(session.is_dirty());
}

#[test]
fn click_without_movement_does_not_move() {
    let (store, page_id) = store_with_page();
    let content = store.get_page(&page_id).unwrap().content;
    let mut session = EditorSession::new(page_id, content);
    let id = session.add_element(ElementType::Shape).unwrap();
    session.pointer_down(&id, 10.0, 10.0);
    assert_eq!(session.pointer_up(12.0, 11.0), None);
    let el = session.canvas().get(&id).unwrap();
    assert_eq!((el.x, el.y), (100.0, 100.0));
}

#[test]
fn cancel_restores_grid_and_position() {
    let (store, page_id) = store_with_page();
    let content = store.get_page(&page_id).unwrap().content;
    let mut session = EditorSession::new(page_id, content);
    let id = session.add_element(ElementType::Button).unwrap();
    session.set_show_grid(true);
    session.pointer_down(&id, 0.0, 0.0);
    session.pointer_move(50.0, 50.0);
    assert!(session.drag_preview().is_some());
    session.cancel_drag();
    assert!(session.show_grid());
    assert!(session.drag_preview().is_none());
    assert_eq!(session.canvas().get(&id).unwrap().x, 100.0);
}

#[test]
fn save_round_trips_through_the_store() {
    let (store, page_id) = store_with_page();
    let page = store.get_page(&page_id).unwrap();
    let mut session = EditorSession::new(page.id.clone(), page.content);

    let box_id = session.add_element_at(ElementType::Container, 20.0, 20.0).unwrap();
    let link_id = session.add_element(ElementType::Button).unwrap();
    session.update_element(&link_id, &json!({ "text": "Docs", "href": "/docs", "id": "hijack" })).unwrap();
    session.move_into_container(&link_id, &box_id).unwrap();
    assert!(session.is_selected(&link_id));

    session.save(store.as_ref()).unwrap();
    assert_eq!(*session.save_state(), SaveState::Saved);
    assert!(!session.is_dirty());

    let saved = store.get_page(&page_id).unwrap().content;
    assert!(saved.selected_element_ids.is_empty());
    let link = saved.get(&link_id).expect("id survives update");
    assert_eq!(link.parent_id.as_deref(), Some(box_id.as_str()));
    match &link.kind {
        ElementKind::Button(b) => assert_eq!((b.text.as_str(), b.href.as_str()), ("Docs", "/docs")),
        other => panic!("expected button, got {:?}", other),
    }

    let out = Renderer::new(RenderMode::Preview).hydrate().render_canvas(&saved);
    let doc = Html::parse_fragment(&out.html);
    let sel = Selector::parse(&format!("[data-element-id=\"{}\"] > a[href=\"/docs\"]", box_id)).unwrap();
    assert_eq!(doc.select(&sel).count(), 1);
}

#[test]
fn failed_save_keeps_local_edits() {
    let store = PageStore::new();
    let mut session = EditorSession::new("missing", Default::default());
    session.add_element(ElementType::Text).unwrap();
    assert!(session.save(&store).is_err());
    assert!(matches!(session.save_state(), SaveState::Failed(_)));
    assert!(session.is_dirty());
    assert_eq!(session.canvas().len(), 1);
}

#[test]
fn session_render_shows_selection_only_in_editor() {
    let mut session = EditorSession::new("p", Default::default());
    let id = session.add_element(ElementType::Image).unwrap();
    let out = session.render();
    assert!(out.html.contains("sc-selected"));
    assert!(out.html.contains(&id));

    let preview = Renderer::new(RenderMode::Preview).hydrate().render_canvas(session.canvas());
    assert!(!preview.html.contains("sc-selected"));
}
