//! TCP Transport Tests
//!
//! Runs the transport against a loopback fake server speaking IPROTO frames.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use boxproto::network::{FrameHeader, TcpTransport, Transport, TransportError, HEADER_SIZE};
use boxproto::protocol::RequestType;
use boxproto::{BoxError, Config, Connection, Field};

/// One request as seen by the fake server
struct Received {
    header: FrameHeader,
    body: Vec<u8>,
}

fn read_frame(stream: &mut TcpStream) -> Option<Received> {
    let mut raw = [0u8; HEADER_SIZE];
    stream.read_exact(&mut raw).ok()?;
    let header = FrameHeader::decode(&raw);
    let mut body = vec![0u8; header.body_len as usize];
    stream.read_exact(&mut body).ok()?;
    Some(Received { header, body })
}

fn write_frame(stream: &mut TcpStream, request_type: u32, request_id: u32, body: &[u8]) {
    let header = FrameHeader {
        request_type,
        body_len: body.len() as u32,
        request_id,
    };
    stream.write_all(&header.encode()).unwrap();
    stream.write_all(body).unwrap();
    stream.flush().unwrap();
}

/// Serve one connection, answering each request with `respond`
///
/// Returns every request the server saw once the client hangs up.
fn serve<F>(respond: F) -> (String, JoinHandle<Vec<Received>>)
where
    F: Fn(&mut TcpStream, &Received) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut seen = Vec::new();
        while let Some(request) = read_frame(&mut stream) {
            respond(&mut stream, &request);
            seen.push(request);
        }
        seen
    });

    (addr, handle)
}

/// Echo the request header with an empty-result body (status 0, count 0)
fn empty_result(stream: &mut TcpStream, request: &Received) {
    let body: &[u8] = if request.header.request_type == RequestType::Ping.code() {
        &[]
    } else {
        &[0, 0, 0, 0, 0, 0, 0, 0]
    };
    write_frame(
        stream,
        request.header.request_type,
        request.header.request_id,
        body,
    );
}

fn config(addr: &str) -> Config {
    Config::builder()
        .addr(addr)
        .read_timeout_ms(2000)
        .write_timeout_ms(2000)
        .build()
}

// =============================================================================
// Exchange Tests
// =============================================================================

#[test]
fn test_ping_frame() {
    let (addr, server) = serve(empty_result);

    let transport = TcpTransport::connect(&config(&addr)).unwrap();
    let reply = transport.exchange(RequestType::Ping, &[]).unwrap();
    assert!(reply.is_empty());
    drop(transport);

    let seen = server.join().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].header.request_type, 65280);
    assert_eq!(seen[0].header.body_len, 0);
    assert!(seen[0].body.is_empty());
}

#[test]
fn test_request_ids_increase() {
    let (addr, server) = serve(empty_result);

    let transport = TcpTransport::connect(&config(&addr)).unwrap();
    for _ in 0..3 {
        transport.exchange(RequestType::Ping, &[]).unwrap();
    }
    drop(transport);

    let ids: Vec<u32> = server
        .join()
        .unwrap()
        .iter()
        .map(|r| r.header.request_id)
        .collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn test_body_sent_verbatim() {
    let (addr, server) = serve(empty_result);

    let conn = Connection::connect(&config(&addr)).unwrap();
    let tuple: [&dyn Field; 2] = [&1i32, &"Peter"];
    let response = conn.space(4).insert(&tuple, true).unwrap();
    assert_eq!(response.count, 0);
    drop(conn);

    let seen = server.join().unwrap();
    assert_eq!(seen[0].header.request_type, 13);
    #[rustfmt::skip]
    let expected: Vec<u8> = vec![
        4, 0, 0, 0,
        1, 0, 0, 0,
        2, 0, 0, 0,
        4, 1, 0, 0, 0,
        5, b'P', b'e', b't', b'e', b'r',
    ];
    assert_eq!(seen[0].body, expected);
    assert_eq!(seen[0].header.body_len as usize, expected.len());
}

#[test]
fn test_concurrent_callers_stay_paired() {
    // Reply body echoes the request id so each caller can check its own answer
    let (addr, server) = serve(|stream, request| {
        let id = request.header.request_id;
        write_frame(stream, request.header.request_type, id, &id.to_le_bytes());
    });

    let transport = TcpTransport::connect(&config(&addr)).unwrap();
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..25 {
                    let reply = transport.exchange(RequestType::Call, b"x").unwrap();
                    assert_eq!(reply.len(), 4);
                }
            });
        }
    });
    drop(transport);

    assert_eq!(server.join().unwrap().len(), 100);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_mismatched_request_id() {
    let (addr, _server) = serve(|stream, request| {
        write_frame(stream, request.header.request_type, request.header.request_id + 1, &[]);
    });

    let transport = TcpTransport::connect(&config(&addr)).unwrap();
    let result = transport.exchange(RequestType::Ping, &[]);
    assert!(matches!(result, Err(TransportError::UnexpectedReply(_))));

    let result = transport.exchange(RequestType::Ping, &[]);
    assert!(matches!(result, Err(TransportError::Closed)));
}

#[test]
fn test_mismatched_request_type() {
    let (addr, _server) = serve(|stream, request| {
        write_frame(stream, RequestType::Select.code(), request.header.request_id, &[]);
    });

    let transport = TcpTransport::connect(&config(&addr)).unwrap();
    let result = transport.exchange(RequestType::Ping, &[]);
    assert!(matches!(result, Err(TransportError::UnexpectedReply(_))));
}

#[test]
fn test_reply_too_large() {
    let (addr, _server) = serve(|stream, request| {
        write_frame(stream, request.header.request_type, request.header.request_id, &[0; 64]);
    });

    let config = Config::builder()
        .addr(addr.as_str())
        .read_timeout_ms(2000)
        .max_reply_size(16)
        .build();
    let transport = TcpTransport::connect(&config).unwrap();
    match transport.exchange(RequestType::Select, &[]) {
        Err(TransportError::ReplyTooLarge { size, max }) => {
            assert_eq!(size, 64);
            assert_eq!(max, 16);
        }
        other => panic!("Expected ReplyTooLarge, got {:?}", other),
    }

    // The unread body would otherwise be taken for the next reply header
    let result = transport.exchange(RequestType::Ping, &[]);
    assert!(matches!(result, Err(TransportError::Closed)));
}

#[test]
fn test_read_timeout_closes_transport() {
    let (addr, _server) = serve(|stream, request| {
        thread::sleep(Duration::from_millis(300));
        let _ = stream.write_all(&FrameHeader {
            request_type: request.header.request_type,
            body_len: 0,
            request_id: request.header.request_id,
        }
        .encode());
    });

    let config = Config::builder()
        .addr(addr.as_str())
        .read_timeout_ms(50)
        .build();
    let transport = TcpTransport::connect(&config).unwrap();

    let first = transport.exchange(RequestType::Ping, &[]);
    assert!(matches!(first, Err(TransportError::Io(_))));

    // A late reply must not be paired with a new request
    thread::sleep(Duration::from_millis(400));
    let second = transport.exchange(RequestType::Ping, &[]);
    assert!(matches!(second, Err(TransportError::Closed)));
}

#[test]
fn test_server_hangs_up() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        // Read the request, then close without answering
        read_frame(&mut stream);
    });

    let conn = Connection::connect(&config(&addr)).unwrap();
    let err = conn.ping().unwrap_err();
    assert!(err.is_transport());
    assert!(matches!(err, BoxError::Transport(TransportError::Closed)));
    server.join().unwrap();
}

#[test]
fn test_connect_refused() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    match Connection::connect(&config(&addr)) {
        Err(BoxError::Transport(TransportError::Connect { addr: failed, .. })) => {
            assert_eq!(failed, addr);
        }
        Err(other) => panic!("Expected Connect error, got {:?}", other),
        Ok(_) => panic!("Expected connect to fail"),
    }
}

#[test]
fn test_unresolvable_address() {
    let result = TcpTransport::connect(&config("not an address"));
    assert!(matches!(result, Err(TransportError::Connect { .. })));
}

#[test]
fn test_invalid_config_rejected_before_connecting() {
    let empty = Config::builder().addr("  ").build();
    assert!(matches!(Connection::connect(&empty), Err(BoxError::Config(_))));

    let no_room = Config::builder().max_reply_size(0).build();
    assert!(matches!(Connection::connect(&no_room), Err(BoxError::Config(_))));
}
