//! Client Module
//!
//! Connection and space handles over a transport.
//!
//! Every operation is one round trip:
//! 1. Build the request body (`encode_request`)
//! 2. Exchange it through the transport
//! 3. Parse the reply (`parse_response`)

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::network::{TcpTransport, Transport};
use crate::protocol::{
    encode_request, parse_response, Field, Flags, InsertMode, Key, Request, ResponseMode,
    TupleResponse, UpdateOp,
};

/// A connection to one server
pub struct Connection<T: Transport = TcpTransport> {
    transport: Arc<T>,
    mode: ResponseMode,
}

impl Connection<TcpTransport> {
    /// Connect over TCP using `config`
    pub fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        let transport = TcpTransport::connect(config)?;
        Ok(Self::with_transport(transport, config.response_mode))
    }
}

impl<T: Transport> Connection<T> {
    /// Wrap an existing transport
    pub fn with_transport(transport: T, mode: ResponseMode) -> Self {
        Self {
            transport: Arc::new(transport),
            mode,
        }
    }

    /// Handle for space `space_no`
    pub fn space(&self, space_no: u32) -> Space<T> {
        Space {
            space_no,
            transport: Arc::clone(&self.transport),
            mode: self.mode,
        }
    }

    /// Invoke a stored procedure
    pub fn call(&self, proc_name: &str, args: &[&dyn Field], return_tuple: bool) -> Result<TupleResponse> {
        let request = Request::Call {
            flags: Flags::NONE.with_return_tuple(return_tuple),
            proc_name,
            args,
        };
        execute(&*self.transport, &request, self.mode)
    }

    /// Ping the server
    pub fn ping(&self) -> Result<TupleResponse> {
        execute(&*self.transport, &Request::Ping, self.mode)
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// A space bound to a connection's transport
pub struct Space<T: Transport = TcpTransport> {
    space_no: u32,
    transport: Arc<T>,
    mode: ResponseMode,
}

impl<T: Transport> Clone for Space<T> {
    fn clone(&self) -> Self {
        Self {
            space_no: self.space_no,
            transport: Arc::clone(&self.transport),
            mode: self.mode,
        }
    }
}

impl<T: Transport> Space<T> {
    pub fn space_no(&self) -> u32 {
        self.space_no
    }

    /// Select tuples matching any of `keys` through index `index_no`
    pub fn select(
        &self,
        index_no: u32,
        offset: u32,
        limit: u32,
        keys: &[&Key<'_>],
    ) -> Result<TupleResponse> {
        self.execute(&Request::Select {
            space_no: self.space_no,
            index_no,
            offset,
            limit,
            keys,
        })
    }

    /// Insert `tuple`, overwriting any tuple with the same key
    pub fn insert(&self, tuple: &[&dyn Field], return_tuple: bool) -> Result<TupleResponse> {
        self.store(InsertMode::Upsert, tuple, return_tuple)
    }

    /// Insert `tuple`; fails if the key already exists
    pub fn add(&self, tuple: &[&dyn Field], return_tuple: bool) -> Result<TupleResponse> {
        self.store(InsertMode::Add, tuple, return_tuple)
    }

    /// Replace the tuple with `tuple`'s key; fails if it does not exist
    pub fn replace(&self, tuple: &[&dyn Field], return_tuple: bool) -> Result<TupleResponse> {
        self.store(InsertMode::Replace, tuple, return_tuple)
    }

    /// Insert-family request with an explicit mode
    pub fn store(
        &self,
        mode: InsertMode,
        tuple: &[&dyn Field],
        return_tuple: bool,
    ) -> Result<TupleResponse> {
        self.execute(&Request::Insert {
            space_no: self.space_no,
            flags: mode.flags().with_return_tuple(return_tuple),
            tuple,
        })
    }

    /// Apply `ops` to the tuple identified by `key`
    pub fn update(
        &self,
        key: &Key<'_>,
        ops: &[UpdateOp<'_>],
        return_tuple: bool,
    ) -> Result<TupleResponse> {
        self.execute(&Request::Update {
            space_no: self.space_no,
            flags: Flags::NONE.with_return_tuple(return_tuple),
            key,
            ops,
        })
    }

    /// Delete the tuple identified by `key`
    pub fn delete(&self, key: &Key<'_>, return_tuple: bool) -> Result<TupleResponse> {
        self.execute(&Request::Delete {
            space_no: self.space_no,
            flags: Flags::NONE.with_return_tuple(return_tuple),
            key,
        })
    }

    /// Invoke a stored procedure (calls are not bound to a space)
    pub fn call(&self, proc_name: &str, args: &[&dyn Field], return_tuple: bool) -> Result<TupleResponse> {
        self.execute(&Request::Call {
            flags: Flags::NONE.with_return_tuple(return_tuple),
            proc_name,
            args,
        })
    }

    /// Ping the server
    pub fn ping(&self) -> Result<TupleResponse> {
        self.execute(&Request::Ping)
    }

    fn execute(&self, request: &Request<'_>) -> Result<TupleResponse> {
        execute(&*self.transport, request, self.mode)
    }
}

fn execute<T: Transport + ?Sized>(
    transport: &T,
    request: &Request<'_>,
    mode: ResponseMode,
) -> Result<TupleResponse> {
    let envelope = encode_request(request)?;
    tracing::debug!(
        "{:?} request: {} body bytes",
        envelope.request_type,
        envelope.body.len()
    );

    let reply = transport.exchange(envelope.request_type, &envelope.body)?;
    tracing::trace!("{:?} reply: {} bytes", envelope.request_type, reply.len());

    parse_response(envelope.request_type, envelope.flags, reply, mode)
}
