//! TCP Transport
//!
//! Blocking IPROTO transport over a single TCP stream.

use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::Config;
use crate::protocol::RequestType;
use super::transport::{FrameHeader, Transport, TransportError, HEADER_SIZE};

/// Buffered halves of the stream, held together under one lock
struct Stream {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Set once an exchange fails mid-frame; the byte stream is out of sync
    broken: bool,
}

/// Transport over one TCP connection
///
/// Exchanges are serialized: a caller holds the stream from the moment its
/// request is written until its reply is read. Any failed exchange leaves
/// the transport closed; later exchanges fail with `TransportError::Closed`.
pub struct TcpTransport {
    stream: Mutex<Stream>,

    /// Next request id to hand out
    next_request_id: AtomicU32,

    /// Largest reply body accepted
    max_reply_size: u32,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpTransport {
    /// Connect to `config.addr` and configure the socket
    pub fn connect(config: &Config) -> Result<Self, TransportError> {
        let stream = open_stream(&config.addr, config)?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| config.addr.clone());

        stream.set_nodelay(config.nodelay)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            stream: Mutex::new(Stream {
                reader: BufReader::new(read_stream),
                writer: BufWriter::new(write_stream),
                broken: false,
            }),
            next_request_id: AtomicU32::new(0),
            max_reply_size: config.max_reply_size,
            peer_addr,
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn open_stream(addr: &str, config: &Config) -> Result<TcpStream, TransportError> {
    let addrs: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?
        .collect();

    let mut last_error = None;
    for socket_addr in &addrs {
        let attempt = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(socket_addr, timeout),
            None => TcpStream::connect(socket_addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Connect attempt to {} failed: {}", socket_addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(TransportError::Connect {
        addr: addr.to_string(),
        reason: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "address resolved to nothing".to_string()),
    })
}

impl Transport for TcpTransport {
    fn exchange(&self, request_type: RequestType, body: &[u8]) -> Result<Bytes, TransportError> {
        let mut stream = self.stream.lock();
        if stream.broken {
            return Err(TransportError::Closed);
        }

        let result = self.round_trip(&mut stream, request_type, body);
        if let Err(e) = &result {
            tracing::warn!("Exchange with {} failed, closing transport: {}", self.peer_addr, e);
            stream.broken = true;
        }
        result
    }
}

impl TcpTransport {
    fn round_trip(
        &self,
        stream: &mut Stream,
        request_type: RequestType,
        body: &[u8],
    ) -> Result<Bytes, TransportError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let header = FrameHeader {
            request_type: request_type.code(),
            body_len: body.len() as u32,
            request_id,
        };

        tracing::trace!(
            "Sending {:?} #{} ({} bytes) to {}",
            request_type,
            request_id,
            body.len(),
            self.peer_addr
        );
        stream.writer.write_all(&header.encode()).map_err(closed_on_eof)?;
        stream.writer.write_all(body).map_err(closed_on_eof)?;
        stream.writer.flush().map_err(closed_on_eof)?;

        let mut raw_header = [0u8; HEADER_SIZE];
        stream.reader.read_exact(&mut raw_header).map_err(closed_on_eof)?;
        let reply = FrameHeader::decode(&raw_header);

        if reply.request_type != header.request_type || reply.request_id != request_id {
            return Err(TransportError::UnexpectedReply(format!(
                "expected type {} id {}, got type {} id {}",
                header.request_type, request_id, reply.request_type, reply.request_id
            )));
        }

        if reply.body_len > self.max_reply_size {
            return Err(TransportError::ReplyTooLarge {
                size: reply.body_len,
                max: self.max_reply_size,
            });
        }

        let mut payload = vec![0u8; reply.body_len as usize];
        if !payload.is_empty() {
            stream.reader.read_exact(&mut payload).map_err(closed_on_eof)?;
        }

        tracing::trace!("Received {} reply bytes for #{}", payload.len(), request_id);
        Ok(Bytes::from(payload))
    }
}

fn closed_on_eof(e: std::io::Error) -> TransportError {
    match e.kind() {
        ErrorKind::UnexpectedEof
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe => TransportError::Closed,
        _ => TransportError::Io(e),
    }
}
