//! Integration tests against a real headless Chrome
#![cfg(feature = "cdp")]

use iconshot::{CaptureConfig, CaptureEntry, CaptureJob, DocumentRef, Error, Resolution, Settle};
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tiny_http::{Response, Server};

static INIT: Once = Once::new();

const ICON_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Icon</title></head>
<body style="margin:0;background:#1565c0;width:100vw;height:100vh"></body>
</html>"#;

/// Start a simple test HTTP server
fn start_test_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18090").unwrap();
            for request in server.incoming_requests() {
                let response = match request.url() {
                    "/icon.html" => Response::from_string(ICON_PAGE).with_header(
                        "Content-Type: text/html; charset=utf-8"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
        // Give the server time to start
        std::thread::sleep(Duration::from_millis(100));
    });

    "http://127.0.0.1:18090".to_string()
}

fn config() -> CaptureConfig {
    CaptureConfig {
        sandbox: false,
        load_settle: Settle::Fixed(Duration::from_millis(500)),
        resize_settle: Settle::Poll {
            interval: Duration::from_millis(50),
            timeout: Duration::from_secs(1),
        },
        ..Default::default()
    }
}

fn decode(path: &Path) -> (u32, u32, Vec<u8>) {
    let bytes = std::fs::read(path).expect("output exists");
    assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n");
    let mut reader = png::Decoder::new(&bytes[..]).read_info().expect("decode");
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("frame");
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_local_icon_pair() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("icon.html");
    std::fs::write(&page, ICON_PAGE).unwrap();

    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    let job = CaptureJob::new(vec![
        CaptureEntry::new(Resolution::ICON_LARGE, &a),
        CaptureEntry::new(Resolution::ICON_SMALL, &b),
    ])
    .unwrap();

    let report = iconshot::new_capturer(config())
        .run_job(&DocumentRef::from_path(&page), &job)
        .expect("Failed to open session");
    assert!(report.is_success(), "{:?}", report);

    let (w, h, _) = decode(&a);
    assert_eq!((w, h), (512, 512));
    let (w, h, pixels) = decode(&b);
    assert_eq!((w, h), (192, 192));

    // Solid background: every pixel carries the page colour.
    let close = |a: u8, b: u8| a.abs_diff(b) <= 2;
    let channels = pixels.len() / (192 * 192) as usize;
    assert!(pixels
        .chunks(channels)
        .all(|px| close(px[0], 0x15) && close(px[1], 0x65) && close(px[2], 0xc0)));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_served_icon() {
    let base_url = start_test_server();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("icon-96.png");
    let document = DocumentRef::parse(&format!("{}/icon.html", base_url)).unwrap();
    let capturer = iconshot::new_capturer(config());
    let mut session = capturer.open(&document).expect("Failed to open session");
    let outcome = session
        .capture(Resolution::square(96).unwrap(), &out)
        .expect("Failed to capture");
    session.close();

    assert_eq!(outcome.destination, out);
    assert!(outcome.bytes > 100, "PNG data seems too small");
    let (w, h, _) = decode(&out);
    assert_eq!((w, h), (96, 96));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_unreachable_document() {
    let dir = tempfile::tempdir().unwrap();
    let job = CaptureJob::icon_pair(dir.path(), "icon").unwrap();
    let document = DocumentRef::parse("http://127.0.0.1:9/icon.html").unwrap();

    let err = iconshot::new_capturer(CaptureConfig {
        load_timeout_ms: 5000,
        ..config()
    })
    .run_job(&document, &job)
    .unwrap_err();

    assert!(matches!(err, Error::RenderInitError(_)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
