//! Request definitions
//!
//! Represents the operations a client can send to the server.

use super::field::Field;

/// Request types (the 32-bit operation selector in the frame header)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestType {
    Insert = 13,
    Select = 17,
    Update = 19,
    Delete = 21,
    Call = 22,
    Ping = 65280,
}

impl RequestType {
    /// Wire value of this request type
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a request type by its wire value
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            13 => Some(RequestType::Insert),
            17 => Some(RequestType::Select),
            19 => Some(RequestType::Update),
            21 => Some(RequestType::Delete),
            22 => Some(RequestType::Call),
            65280 => Some(RequestType::Ping),
            _ => None,
        }
    }
}

// =============================================================================
// Flags
// =============================================================================

/// Request flags bitfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0x00);
    /// Return the affected tuple(s) in the reply
    pub const RETURN_TUPLE: Flags = Flags(0x01);
    /// Fail if the key already exists
    pub const ADD: Flags = Flags(0x02);
    /// Fail if the key does not exist
    pub const REPLACE: Flags = Flags(0x04);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags with RETURN_TUPLE or'd in when `return_tuple` is set
    pub fn with_return_tuple(self, return_tuple: bool) -> Flags {
        if return_tuple {
            self | Flags::RETURN_TUPLE
        } else {
            self
        }
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// How an insert-family request treats an existing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    /// Insert or overwrite unconditionally
    #[default]
    Upsert,
    /// Fail if the key exists
    Add,
    /// Fail if the key is absent
    Replace,
}

impl InsertMode {
    pub fn flags(self) -> Flags {
        match self {
            InsertMode::Upsert => Flags::NONE,
            InsertMode::Add => Flags::ADD,
            InsertMode::Replace => Flags::REPLACE,
        }
    }
}

// =============================================================================
// Update Operations
// =============================================================================

/// Update operation codes (1 byte on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UpdateOpCode {
    Set = 0,
    Add = 1,
    And = 2,
    Xor = 3,
    Or = 4,
    /// Argument layout is up to the caller
    Splice = 5,
    Delete = 6,
    Insert = 7,
}

impl UpdateOpCode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(UpdateOpCode::Set),
            1 => Some(UpdateOpCode::Add),
            2 => Some(UpdateOpCode::And),
            3 => Some(UpdateOpCode::Xor),
            4 => Some(UpdateOpCode::Or),
            5 => Some(UpdateOpCode::Splice),
            6 => Some(UpdateOpCode::Delete),
            7 => Some(UpdateOpCode::Insert),
            _ => None,
        }
    }
}

/// One field modification inside an update request
#[derive(Clone, Copy)]
pub struct UpdateOp<'a> {
    /// Zero-based index of the field to modify
    pub field_no: u32,
    pub op: UpdateOpCode,
    pub arg: &'a dyn Field,
}

impl<'a> UpdateOp<'a> {
    pub fn new(field_no: u32, op: UpdateOpCode, arg: &'a dyn Field) -> Self {
        Self { field_no, op, arg }
    }

    pub fn set(field_no: u32, arg: &'a dyn Field) -> Self {
        Self::new(field_no, UpdateOpCode::Set, arg)
    }

    pub fn add(field_no: u32, arg: &'a dyn Field) -> Self {
        Self::new(field_no, UpdateOpCode::Add, arg)
    }
}

impl std::fmt::Debug for UpdateOp<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateOp")
            .field("field_no", &self.field_no)
            .field("op", &self.op)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A composite key: one encodable field per indexed part
pub type Key<'a> = [&'a dyn Field];

/// A request ready to be encoded
#[derive(Clone, Copy)]
pub enum Request<'a> {
    /// Fetch tuples matching any of `keys`
    Select {
        space_no: u32,
        index_no: u32,
        offset: u32,
        limit: u32,
        keys: &'a [&'a Key<'a>],
    },

    /// Insert, add or replace a whole tuple
    Insert {
        space_no: u32,
        flags: Flags,
        tuple: &'a [&'a dyn Field],
    },

    /// Apply `ops` to the tuple identified by `key`
    Update {
        space_no: u32,
        flags: Flags,
        key: &'a Key<'a>,
        ops: &'a [UpdateOp<'a>],
    },

    /// Delete the tuple identified by `key`
    Delete {
        space_no: u32,
        flags: Flags,
        key: &'a Key<'a>,
    },

    /// Invoke a stored procedure
    Call {
        flags: Flags,
        proc_name: &'a str,
        args: &'a [&'a dyn Field],
    },

    /// Ping (health check)
    Ping,
}

impl Request<'_> {
    /// Get the request type
    pub fn request_type(&self) -> RequestType {
        match self {
            Request::Select { .. } => RequestType::Select,
            Request::Insert { .. } => RequestType::Insert,
            Request::Update { .. } => RequestType::Update,
            Request::Delete { .. } => RequestType::Delete,
            Request::Call { .. } => RequestType::Call,
            Request::Ping => RequestType::Ping,
        }
    }

    /// Flags sent with the request (`NONE` for select and ping)
    pub fn flags(&self) -> Flags {
        match *self {
            Request::Insert { flags, .. }
            | Request::Update { flags, .. }
            | Request::Delete { flags, .. }
            | Request::Call { flags, .. } => flags,
            Request::Select { .. } | Request::Ping => Flags::NONE,
        }
    }
}

impl std::fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Select { space_no, index_no, offset, limit, keys } => f
                .debug_struct("Select")
                .field("space_no", space_no)
                .field("index_no", index_no)
                .field("offset", offset)
                .field("limit", limit)
                .field("keys", &keys.len())
                .finish(),
            Request::Insert { space_no, flags, tuple } => f
                .debug_struct("Insert")
                .field("space_no", space_no)
                .field("flags", flags)
                .field("fields", &tuple.len())
                .finish(),
            Request::Update { space_no, flags, key, ops } => f
                .debug_struct("Update")
                .field("space_no", space_no)
                .field("flags", flags)
                .field("key_fields", &key.len())
                .field("ops", ops)
                .finish(),
            Request::Delete { space_no, flags, key } => f
                .debug_struct("Delete")
                .field("space_no", space_no)
                .field("flags", flags)
                .field("key_fields", &key.len())
                .finish(),
            Request::Call { flags, proc_name, args } => f
                .debug_struct("Call")
                .field("flags", flags)
                .field("proc_name", proc_name)
                .field("args", &args.len())
                .finish(),
            Request::Ping => f.write_str("Ping"),
        }
    }
}
