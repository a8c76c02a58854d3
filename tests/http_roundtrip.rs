#![cfg(all(feature = "server", feature = "client"))]

use std::sync::Arc;

use serde_json::{json, Value};
use sitecanvas::factory::create_element;
use sitecanvas::model::{Canvas, ElementType};
use sitecanvas::{EditorSession, Error, HttpPageClient, PageStore, Server, ServerConfig};

fn start() -> (Server, Arc<PageStore>) {
    let config = ServerConfig { bind: "127.0.0.1:0".into(), workers: Some(2), ..Default::default() };
    let store = Arc::new(config.open_store().expect("store"));
    let server = Server::bind(&config, Arc::clone(&store)).expect("bind");
    (server, store)
}

#[test]
fn page_lifecycle_over_http() {
    let (server, store) = start();
    let client = HttpPageClient::new(&server.url()).unwrap();

    let mut canvas = Canvas::default();
    canvas.push(create_element(ElementType::Button, "cta", 10.0, 10.0)).unwrap();
    let page = client.create_page("About us", Some(&canvas)).unwrap();
    assert_eq!(page.path, "/about-us");
    assert_eq!(store.page_count(), 1);

    let fetched = client.get_page(&page.id).unwrap().expect("page exists");
    assert_eq!(fetched.content.len(), 1);

    let (feed, etag) = client.render_feed(&page.id).unwrap();
    assert_eq!(feed.elements[0].id, "cta");
    assert_eq!(feed.elements[0].width, 152.0);
    assert_eq!(etag.as_deref(), Some(feed.etag().as_str()));

    canvas.get_mut("cta").unwrap().x = 90.0;
    let updated = client.update_page(&page.id, Some("About"), &canvas).unwrap();
    assert_eq!(updated.title, "About");
    assert!(updated.updated_at >= page.updated_at);
    let (moved, moved_etag) = client.render_feed(&page.id).unwrap();
    assert_eq!(moved.elements[0].x, 90.0);
    assert_ne!(moved_etag, etag);

    client.delete_page(&page.id).unwrap();
    assert!(client.get_page(&page.id).unwrap().is_none());
    assert!(matches!(client.delete_page(&page.id), Err(Error::NotFound { .. })));
}

#[test]
fn validation_errors_come_back_typed() {
    let (server, _store) = start();
    let client = HttpPageClient::new(&server.url()).unwrap();

    match client.create_page("   ", None) {
        Err(Error::Validation(fields)) => assert!(!fields.messages("title").is_empty()),
        other => panic!("expected validation error, got {:?}", other),
    }

    client.create_page("Pricing", None).unwrap();
    assert!(matches!(client.create_page("Pricing", None), Err(Error::Conflict(_))));
}

#[test]
fn editor_saves_through_the_client() {
    let (server, store) = start();
    let client = HttpPageClient::new(&server.url()).unwrap();
    let page = client.create_page("Home", None).unwrap();

    let mut session = EditorSession::new(page.id.clone(), page.content);
    let id = session.add_element(ElementType::Calendar).unwrap();
    session.save(&client).unwrap();

    let stored = store.get_page(&page.id).unwrap();
    assert!(stored.content.get(&id).is_some());
    assert!(stored.content.selected_element_ids.is_empty());

    let mut orphan = EditorSession::new("nope", Canvas::default());
    assert!(matches!(orphan.save(&client), Err(Error::NotFound { .. })));
}

#[test]
fn etag_revalidation_and_raw_routes() {
    let (server, _store) = start();
    let http = reqwest::blocking::Client::new();
    let base = server.url();

    let created: Value = http
        .post(format!("{}/pages", base))
        .json(&json!({ "title": "Blog" }))
        .send()
        .unwrap()
        .json()
        .unwrap();
    let id = created["page"]["id"].as_str().unwrap().to_string();

    let first = http.get(format!("{}/render/{}", base, id)).send().unwrap();
    assert_eq!(first.status(), 200);
    let etag = first.headers()["etag"].to_str().unwrap().to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));

    let again = http
        .get(format!("{}/render/{}", base, id))
        .header("If-None-Match", etag.as_str())
        .send()
        .unwrap();
    assert_eq!(again.status(), 304);

    let wrong = http.delete(format!("{}/websites", base)).send().unwrap();
    assert_eq!(wrong.status(), 405);
    let missing = http.get(format!("{}/nothing/here", base)).send().unwrap();
    assert_eq!(missing.status(), 404);
    let body: Value = missing.json().unwrap();
    assert!(body["error"].is_string());

    let presigned = HttpPageClient::new(&base).unwrap().presign_upload("My Logo.png").unwrap();
    assert!(presigned.key.ends_with("-My-Logo.png"));
    assert!(presigned.upload_url.contains("signature="));
}

#[test]
fn published_site_is_served_by_host() {
    let (server, store) = start();
    let http = reqwest::blocking::Client::new();
    let base = server.url();
    let host = format!("shop.localhost:{}", server.addr().port());

    let site: Value = http
        .post(format!("{}/websites", base))
        .json(&json!({ "name": "Shop", "subdomain": "shop" }))
        .send()
        .unwrap()
        .json()
        .unwrap();
    let site_id = site["website"]["id"].as_str().unwrap().to_string();

    let mut canvas = Canvas::default();
    canvas.push(create_element(ElementType::Text, "hello", 0.0, 0.0)).unwrap();
    let page: Value = http
        .post(format!("{}/pages", base))
        .json(&json!({ "title": "Welcome", "path": "/", "websiteId": site_id, "canvas": canvas }))
        .send()
        .unwrap()
        .json()
        .unwrap();
    let page_id = page["page"]["id"].as_str().unwrap().to_string();

    let hidden = http.get(format!("{}/", base)).header("Host", host.as_str()).send().unwrap();
    assert_eq!(hidden.status(), 404);

    for path in [format!("websites/{}/publish", site_id), format!("pages/{}/publish", page_id)] {
        let resp = http.post(format!("{}/{}", base, path)).send().unwrap();
        assert_eq!(resp.status(), 200, "{}", path);
    }

    let live = http.get(format!("{}/", base)).header("Host", host.as_str()).send().unwrap();
    assert_eq!(live.status(), 200);
    let html = live.text().unwrap();
    assert!(html.contains("<title>Welcome</title>"));
    assert!(html.contains("data-element-id=\"hello\""));

    let feed: Value = http.get(format!("{}/render/website/{}", base, site_id)).send().unwrap().json().unwrap();
    assert_eq!(feed["pages"].as_array().unwrap().len(), 1);

    store.teardown().unwrap();
    assert_eq!(store.page_count(), 0);
}
