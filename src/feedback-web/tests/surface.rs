//! Full sessions served over a real loopback socket.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use feedback_core::{FeedbackRequest, SessionController, SessionError, SurfaceConfig};
use feedback_web::WebSurface;
use pretty_assertions::assert_eq;

fn config(bind_addr: &str) -> SurfaceConfig {
    SurfaceConfig {
        bind_addr: bind_addr.to_string(),
        open_browser: false,
        ..SurfaceConfig::default()
    }
}

fn post_json(addr: SocketAddr, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    write!(
        stream,
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
    .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

fn surface_with_ready_channel() -> (WebSurface, mpsc::Receiver<SocketAddr>) {
    let (tx, rx) = mpsc::channel();
    let surface = WebSurface::new(config("127.0.0.1:0")).on_ready(move |addr| {
        let _ = tx.send(addr);
    });
    (surface, rx)
}

#[test]
fn submit_over_http_resolves_session() {
    let (surface, ready) = surface_with_ready_channel();
    let controller = SessionController::new(Arc::new(surface));

    let caller = thread::spawn(move || {
        controller.run(FeedbackRequest::new(
            "Implemented feature X",
            Duration::from_secs(10),
        ))
    });

    let addr = ready.recv_timeout(Duration::from_secs(5)).unwrap();
    let response = post_json(addr, "/api/submit", r#"{"text":"Looks good"}"#);
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    let result = caller.join().unwrap().unwrap();
    assert_eq!(result.text.as_deref(), Some("Looks good"));
    assert!(result.images.is_empty());
}

#[test]
fn cancel_over_http_reports_reason() {
    let (surface, ready) = surface_with_ready_channel();
    let controller = SessionController::new(Arc::new(surface));

    let caller = thread::spawn(move || {
        controller.run(FeedbackRequest::new("", Duration::from_secs(10)))
    });

    let addr = ready.recv_timeout(Duration::from_secs(5)).unwrap();
    let response = post_json(addr, "/api/cancel", r#"{"reason":"later"}"#);
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    let err = caller.join().unwrap().unwrap_err();
    assert_eq!(
        err,
        SessionError::UserCancelled {
            reason: Some("later".to_string())
        }
    );
}

#[test]
fn unanswered_page_times_out() {
    let (surface, ready) = surface_with_ready_channel();
    let controller = SessionController::new(Arc::new(surface));

    let err = controller
        .run(FeedbackRequest::new("", Duration::from_secs(1)))
        .unwrap_err();

    assert_eq!(err, SessionError::Timeout(Duration::from_secs(1)));
    assert!(ready.try_recv().is_ok());
}

#[test]
fn invalid_bind_address_fails_start() {
    let controller = SessionController::new(Arc::new(WebSurface::new(config("not an address"))));

    let err = controller
        .run(FeedbackRequest::new("", Duration::from_secs(5)))
        .unwrap_err();

    assert_eq!(err.error_code(), "invalid_configuration");
}

#[test]
fn occupied_port_fails_start() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();
    let controller = SessionController::new(Arc::new(WebSurface::new(config(&addr))));

    let err = controller
        .run(FeedbackRequest::new("", Duration::from_secs(5)))
        .unwrap_err();

    assert_eq!(err.error_code(), "internal_error");
    assert!(err.to_string().contains("failed to bind"), "{err}");
}
