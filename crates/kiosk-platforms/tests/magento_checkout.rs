//! Magento guest-cart checkout against a local HTTP stub.
//!
//! The invariant under test: pushing cart items is all-or-nothing from the
//! caller's perspective. If any item POST fails, `create_checkout` errors
//! and the cart id never reaches the caller, so a half-filled cart can
//! never be paid for.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kiosk_core::basket::{Basket, BasketLedger, BasketLine};
use kiosk_core::types::{Platform, TaxRate};
use kiosk_platforms::adapters::MagentoAdapter;
use kiosk_platforms::service::CheckoutService;
use kiosk_platforms::PlatformError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// =============================================================================
// Minimal HTTP Stub
// =============================================================================

/// Reads one request head (and drains its body) off the stream.
async fn read_request_head(stream: &mut TcpStream) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await.expect("stub read failed");
        if n == 0 {
            return String::new();
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();

        // Drain the body so the client never sees a reset mid-send.
        let content_length = head
            .lines()
            .find(|l| l.to_ascii_lowercase().starts_with("content-length:"))
            .and_then(|l| l.split(':').nth(1))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut body_read = buf.len() - (head_end + 4);
        while body_read < content_length {
            let n = stream.read(&mut chunk).await.expect("stub read failed");
            if n == 0 {
                break;
            }
            body_read += n;
        }
        return head;
    }
}

/// Routes one request line to a canned Magento response.
fn route(request_line: &str, item_posts: &AtomicUsize, fail_second_item: bool) -> (&'static str, String) {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");

    if method == "POST" && path.contains("/guest-carts/") && path.ends_with("/items") {
        let already_posted = item_posts.fetch_add(1, Ordering::SeqCst);
        if fail_second_item && already_posted == 1 {
            return (
                "500 Internal Server Error",
                r#"{"message": "Product that you are trying to add is not available."}"#.to_string(),
            );
        }
        return ("200 OK", r#"{"item_id": 1}"#.to_string());
    }

    if method == "POST" && path.ends_with("/guest-carts") {
        return ("200 OK", "\"mc-1\"".to_string());
    }

    if method == "GET" && path.contains("/products") {
        // The adapter searches by entity_id; answer with the matching SKU.
        let (id, sku) = if path.contains("value%5D=2") || path.contains("[value]=2") {
            (2, "SKU-2")
        } else {
            (1, "SKU-1")
        };
        return (
            "200 OK",
            format!(r#"{{"items":[{{"id":{id},"sku":"{sku}","name":"Stub Product","price":3.5}}]}}"#),
        );
    }

    ("404 Not Found", "{}".to_string())
}

/// Spawns a one-shot Magento stub; returns its base URL.
async fn spawn_magento_stub(fail_second_item: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub bind failed");
    let addr = listener.local_addr().expect("stub addr");
    let item_posts = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let item_posts = Arc::clone(&item_posts);
            tokio::spawn(async move {
                let head = read_request_head(&mut stream).await;
                let request_line = head.lines().next().unwrap_or("");
                let (status, body) = route(request_line, &item_posts, fail_second_item);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

// =============================================================================
// Fixtures
// =============================================================================

fn two_line_basket() -> Basket {
    let mut ledger = BasketLedger::new(TaxRate::from_fraction(0.2), "GBP");
    ledger
        .add_line(BasketLine::new("1", "First", 1, 350))
        .unwrap();
    ledger
        .add_line(BasketLine::new("2", "Second", 2, 200))
        .unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn checkout_succeeds_when_every_item_push_succeeds() {
    let base_url = spawn_magento_stub(false).await;
    let adapter = MagentoAdapter::new(&base_url, "token", None, "GBP").unwrap();

    let cart_id = adapter.create_checkout(&two_line_basket()).await.unwrap();
    assert_eq!(cart_id, "mc-1");
}

#[tokio::test]
async fn failed_item_push_aborts_checkout_and_withholds_cart_id() {
    let base_url = spawn_magento_stub(true).await;
    let adapter = MagentoAdapter::new(&base_url, "token", None, "GBP").unwrap();

    let err = adapter.create_checkout(&two_line_basket()).await.unwrap_err();
    match err {
        PlatformError::Checkout { platform, reason } => {
            assert_eq!(platform, Platform::Magento);
            // The error names the dead cart so logs can trace it, and the
            // Ok path (the only way an id reaches the caller) was not taken.
            assert!(reason.contains("mc-1"));
            assert!(reason.contains("abandoned"));
        }
        other => panic!("expected a checkout error, got: {other}"),
    }
}
