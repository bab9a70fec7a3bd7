// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Read as _;
use std::net::TcpListener;
use std::thread;

/// One-shot comm server stub: accepts a single connection, captures the
/// request, replies with `response`, and returns the request.
fn serve_once(response: &'static [u8]) -> (u16, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = String::new();
        stream.read_to_string(&mut request).unwrap();
        stream.write_all(response).unwrap();
        request
    });

    (port, handle)
}

#[test]
fn override_command_matches_the_wire_format() {
    let (port, server) = serve_once(b"\r\n");
    let client = TcpCommServer::new("127.0.0.1", port, 80);

    let accepted = client.set_door_state(3, 1, DoorState::Open).unwrap();
    assert!(accepted);

    let request = server.join().unwrap();
    assert_eq!(request, "6 80 3 1 0 1 3830202337 11 *Comm Server\r\n");
}

#[test]
fn override_reports_failure_on_an_empty_reply() {
    let (port, server) = serve_once(b"");
    let client = TcpCommServer::new("127.0.0.1", port, 80);

    let accepted = client.set_door_state(3, 2, DoorState::Secure).unwrap();
    assert!(!accepted);
    server.join().unwrap();
}

#[test]
fn override_rejects_unexpected_replies() {
    let (port, server) = serve_once(b"ERR nope\r\n");
    let client = TcpCommServer::new("127.0.0.1", port, 80);

    let result = client.set_door_state(3, 1, DoorState::Timezone);
    assert!(matches!(result, Err(CommError::UnexpectedResponse(_))));
    server.join().unwrap();
}

#[test]
fn event_query_sends_cursors_and_splits_lines() {
    let (port, server) = serve_once(b"1 10 3 0 0 0 8\r\n2 4 0\r\n");
    let client = TcpCommServer::new("127.0.0.1", port, 80);

    let lines = client
        .fetch_events(EventCursors {
            a: 9,
            b: 3,
            c: 0,
            d: 7,
        })
        .unwrap();

    assert_eq!(lines, vec!["1 10 3 0 0 0 8".to_string(), "2 4 0".to_string()]);
    assert_eq!(server.join().unwrap(), "0 80 3 9 3 0 7 0\r\n");
}

#[test]
fn connection_refused_surfaces_as_io_error() {
    // Bind then drop to get a port nothing is listening on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = TcpCommServer::new("127.0.0.1", port, 80);

    let result = client.fetch_events(EventCursors::default());
    assert!(matches!(result, Err(CommError::Io(_))));
}
