// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{file_format::TableIndex, IndexKind};
use std::fmt;

pub type BinaryLoaderResult<T> = ::std::result::Result<T, PartialVMError>;

/// Status codes produced while loading a binary.
///
/// The numbering follows the deserialization range (3000-3999) of the Move VM status codes so
/// that hosts can forward them unchanged.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
#[repr(u64)]
pub enum StatusCode {
    UNKNOWN_BINARY_ERROR = 3000,
    MALFORMED = 3001,
    BAD_MAGIC = 3002,
    UNKNOWN_VERSION = 3003,
    UNKNOWN_TABLE_TYPE = 3004,
    UNKNOWN_SERIALIZED_TYPE = 3006,
    UNKNOWN_OPCODE = 3007,
    BAD_HEADER_TABLE = 3008,
    DUPLICATE_TABLE = 3010,
    INVALID_FLAG_BITS = 3012,
    UNKNOWN_ABILITY = 3013,
    UNKNOWN_NATIVE_STRUCT_FLAG = 3014,
    BAD_U16 = 3017,
    BAD_U32 = 3018,
    BAD_U64 = 3019,
    BAD_U128 = 3020,
    BAD_U256 = 3021,
    UNPUBLISHABLE_NOT_ALLOWED = 3022,
    INVALID_VARINT = 3023,
    SIGNATURE_DEPTH_EXCEEDED = 3024,
    TRAILING_BYTES = 3025,
}

impl StatusCode {
    pub fn code(self) -> u64 {
        self as u64
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PartialVMError(Box<PartialVMError_>);

#[derive(Clone, PartialEq, Eq)]
struct PartialVMError_ {
    major_status: StatusCode,
    message: Option<String>,
    indices: Vec<(IndexKind, TableIndex)>,
}

impl PartialVMError {
    pub fn new(major_status: StatusCode) -> Self {
        Self(Box::new(PartialVMError_ {
            major_status,
            message: None,
            indices: vec![],
        }))
    }

    pub fn major_status(&self) -> StatusCode {
        self.0.major_status
    }

    pub fn all_data(self) -> (StatusCode, Option<String>, Vec<(IndexKind, TableIndex)>) {
        let PartialVMError_ {
            major_status,
            message,
            indices,
        } = *self.0;
        (major_status, message, indices)
    }

    pub fn with_message(mut self, message: String) -> Self {
        debug_assert!(self.0.message.is_none());
        self.0.message = Some(message);
        self
    }

    /// Appends a message to the existing one, keeping earlier context first.
    pub fn append_message_with_separator(mut self, separator: char, message: String) -> Self {
        match self.0.message.as_mut() {
            Some(msg) => {
                if !msg.is_empty() {
                    msg.push(separator);
                }
                msg.push_str(&message);
            }
            None => self.0.message = Some(message),
        };
        self
    }

    pub fn at_index(mut self, kind: IndexKind, index: TableIndex) -> Self {
        self.0.indices.push((kind, index));
        self
    }
}

impl fmt::Debug for PartialVMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialVMError")
            .field("major_status", &self.0.major_status)
            .field("message", &self.0.message)
            .field("indices", &self.0.indices)
            .finish()
    }
}

impl fmt::Display for PartialVMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut status = format!("PartialVMError with status {:#?}", self.0.major_status);

        if let Some(msg) = &self.0.message {
            status = format!("{} and message {}", status, msg);
        }

        for (kind, index) in &self.0.indices {
            status = format!("{} at index {} for {}", status, index, kind);
        }

        write!(f, "{}", status)
    }
}

impl std::error::Error for PartialVMError {}
