//! Integration tests for the session layer
//!
//! Exercises the session lifecycle through the page driver seam, with the
//! fake page standing in for a live browser.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::query::ElementQuery;
use crate::session::launcher::Session;
use crate::session::mock::{FakeElement, FakePage};
use crate::session::traits::PageDriver;

fn shopping_page() -> FakePage {
    FakePage::new()
        .with_element(
            FakeElement::new("header", "h2")
                .role("heading")
                .text("Shopping List"),
        )
        .with_element(
            FakeElement::new("add", "button")
                .role("button")
                .name("Add item"),
        )
}

#[tokio::test]
async fn test_session_exposes_live_driver() {
    let page = Arc::new(shopping_page());
    let session = Session::with_driver(page.clone());

    assert!(session.is_active());

    let driver = session.driver();
    driver
        .navigate("http://localhost:5173/", Duration::from_secs(5))
        .await
        .expect("navigation against fake page");

    let matches = driver
        .find_all(&ElementQuery::role_with_name("button", "Add item"))
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);

    assert_eq!(
        page.calls().await,
        vec!["navigate http://localhost:5173/"]
    );
}

#[tokio::test]
async fn test_session_releases_page_exactly_once() {
    let page = Arc::new(shopping_page());
    let session = Session::with_driver(page.clone());

    session.close().await.unwrap();
    session.close().await.unwrap();
    session.close().await.unwrap();

    assert_eq!(page.close_count(), 1);
    assert!(!session.is_active());
}

#[tokio::test]
async fn test_closed_session_rejects_driver_use() {
    let page = Arc::new(shopping_page());
    let session = Session::with_driver(page.clone());
    let driver = session.driver();

    session.close().await.unwrap();

    let err = driver
        .find_all(&ElementQuery::role("button"))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::Error::SessionClosed(_)));
}

#[tokio::test]
async fn test_driver_reflects_mutated_page_state() {
    // Queries are data: the same query sees updated state on each use
    let page = Arc::new(
        shopping_page().on_click(|model, id| {
            if id == "add" {
                model.elements.push(
                    FakeElement::new("input", "input")
                        .role("textbox")
                        .name("New item name"),
                );
            }
        }),
    );
    let session = Session::with_driver(page.clone());
    let driver = session.driver();

    let input = ElementQuery::role_with_name("textbox", "New item name");
    assert!(driver.find_all(&input).await.unwrap().is_empty());

    driver
        .click(&ElementQuery::role_with_name("button", "Add item"), 0)
        .await
        .unwrap();

    assert_eq!(driver.find_all(&input).await.unwrap().len(), 1);
    session.close().await.unwrap();
}
