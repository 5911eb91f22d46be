// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! Constants for the binary format.
//!
//! Definition for the constants of the binary format, used by the serializer and the
//! deserializer. This module also offers helpers for the serialization and deserialization of
//! certain integer indexes.
//!
//! We use LEB128 for integer compression. LEB128 is a representation from the DWARF3 spec,
//! http://dwarfstd.org/Dwarf3Std.php or https://en.wikipedia.org/wiki/LEB128.
//! It's used to compress mostly indexes into the main binary tables.

use crate::{
    errors::{BinaryLoaderResult, PartialVMError, StatusCode},
    file_format::Bytecode,
};
use anyhow::{bail, Result};
use std::io::{Cursor, Read};

/// Constant values for the binary format header.
///
/// The binary header is magic + version info + table count.
pub enum BinaryConstants {}
impl BinaryConstants {
    /// The blob that must start a binary.
    pub const MOVE_MAGIC_SIZE: usize = 4;
    pub const MOVE_MAGIC: [u8; BinaryConstants::MOVE_MAGIC_SIZE] = [0xA1, 0x1C, 0xEB, 0x0B];
    /// Magic of binaries that may be inspected but never published.
    pub const UNPUBLISHABLE_MAGIC: [u8; BinaryConstants::MOVE_MAGIC_SIZE] =
        [0xDE, 0xAD, 0xC0, 0xDE];
}

pub const TABLE_COUNT_MAX: u64 = 255;

pub const TABLE_OFFSET_MAX: u64 = 0xffff_ffff;
pub const TABLE_SIZE_MAX: u64 = 0xffff_ffff;

pub const TABLE_INDEX_MAX: u64 = 65535;
pub const SIGNATURE_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const ADDRESS_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const IDENTIFIER_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const MODULE_HANDLE_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const DATATYPE_HANDLE_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const STRUCT_DEF_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const ENUM_DEF_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const FUNCTION_HANDLE_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const FUNCTION_INST_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const FIELD_HANDLE_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const FIELD_INST_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const VARIANT_HANDLE_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const VARIANT_INST_HANDLE_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const VARIANT_JUMP_TABLE_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const STRUCT_DEF_INST_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const ENUM_DEF_INST_INDEX_MAX: u64 = TABLE_INDEX_MAX;
pub const CONSTANT_INDEX_MAX: u64 = TABLE_INDEX_MAX;

pub const BYTECODE_COUNT_MAX: u64 = 65535;
pub const BYTECODE_INDEX_MAX: u64 = 65535;

pub const IDENTIFIER_SIZE_MAX: u64 = 65535;

pub const CONSTANT_SIZE_MAX: u64 = 65535;

pub const METADATA_KEY_SIZE_MAX: u64 = 1023;
pub const METADATA_VALUE_SIZE_MAX: u64 = 65535;

pub const SIGNATURE_SIZE_MAX: u64 = 255;

pub const ACQUIRES_COUNT_MAX: u64 = 255;

pub const FIELD_COUNT_MAX: u64 = 255;
pub const FIELD_OFFSET_MAX: u64 = 255;

pub const VARIANT_COUNT_MAX: u64 = 127;
pub const VARIANT_TAG_MAX_VALUE: u64 = VARIANT_COUNT_MAX - 1;
pub const JUMP_TABLE_INDEX_MAX: u64 = 1024;

pub const TYPE_PARAMETER_COUNT_MAX: u64 = 255;
pub const TYPE_PARAMETER_INDEX_MAX: u64 = 65535;

pub const SIGNATURE_TOKEN_DEPTH_MAX: usize = 256;

/// Constants for table types in the binary.
///
/// The binary contains a subset of those tables. A table specification is a tuple (table type,
/// start offset, byte count) for a given table.
///
/// Variants are ordered by tag, which is also the order tables are written in.
#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableType {
    MODULE_HANDLES          = 0x1,
    DATATYPE_HANDLES        = 0x2,
    FUNCTION_HANDLES        = 0x3,
    FUNCTION_INST           = 0x4,
    SIGNATURES              = 0x5,
    CONSTANT_POOL           = 0x6,
    IDENTIFIERS             = 0x7,
    ADDRESS_IDENTIFIERS     = 0x8,
    STRUCT_DEFS             = 0xA,
    STRUCT_DEF_INST         = 0xB,
    FUNCTION_DEFS           = 0xC,
    FIELD_HANDLE            = 0xD,
    FIELD_INST              = 0xE,
    FRIEND_DECLS            = 0xF,
    METADATA                = 0x10,
    ENUM_DEFS               = 0x11,
    ENUM_DEF_INST           = 0x12,
    VARIANT_HANDLES         = 0x13,
    VARIANT_INST_HANDLES    = 0x14,
}

impl TableType {
    /// Every table kind, in ascending tag order.
    pub const ALL: [TableType; 19] = [
        TableType::MODULE_HANDLES,
        TableType::DATATYPE_HANDLES,
        TableType::FUNCTION_HANDLES,
        TableType::FUNCTION_INST,
        TableType::SIGNATURES,
        TableType::CONSTANT_POOL,
        TableType::IDENTIFIERS,
        TableType::ADDRESS_IDENTIFIERS,
        TableType::STRUCT_DEFS,
        TableType::STRUCT_DEF_INST,
        TableType::FUNCTION_DEFS,
        TableType::FIELD_HANDLE,
        TableType::FIELD_INST,
        TableType::FRIEND_DECLS,
        TableType::METADATA,
        TableType::ENUM_DEFS,
        TableType::ENUM_DEF_INST,
        TableType::VARIANT_HANDLES,
        TableType::VARIANT_INST_HANDLES,
    ];

    pub fn from_u8(value: u8) -> BinaryLoaderResult<TableType> {
        match value {
            0x1 => Ok(TableType::MODULE_HANDLES),
            0x2 => Ok(TableType::DATATYPE_HANDLES),
            0x3 => Ok(TableType::FUNCTION_HANDLES),
            0x4 => Ok(TableType::FUNCTION_INST),
            0x5 => Ok(TableType::SIGNATURES),
            0x6 => Ok(TableType::CONSTANT_POOL),
            0x7 => Ok(TableType::IDENTIFIERS),
            0x8 => Ok(TableType::ADDRESS_IDENTIFIERS),
            0xA => Ok(TableType::STRUCT_DEFS),
            0xB => Ok(TableType::STRUCT_DEF_INST),
            0xC => Ok(TableType::FUNCTION_DEFS),
            0xD => Ok(TableType::FIELD_HANDLE),
            0xE => Ok(TableType::FIELD_INST),
            0xF => Ok(TableType::FRIEND_DECLS),
            0x10 => Ok(TableType::METADATA),
            0x11 => Ok(TableType::ENUM_DEFS),
            0x12 => Ok(TableType::ENUM_DEF_INST),
            0x13 => Ok(TableType::VARIANT_HANDLES),
            0x14 => Ok(TableType::VARIANT_INST_HANDLES),
            _ => Err(PartialVMError::new(StatusCode::UNKNOWN_TABLE_TYPE)
                .with_message(format!("Unknown table type {:#x}", value))),
        }
    }
}

/// Constants for signature kinds (type, functions, locals). Those values start a signature blob.
#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerializedType {
    BOOL                    = 0x1,
    U8                      = 0x2,
    U64                     = 0x3,
    U128                    = 0x4,
    ADDRESS                 = 0x5,
    REFERENCE               = 0x6,
    MUTABLE_REFERENCE       = 0x7,
    DATATYPE                = 0x8,
    TYPE_PARAMETER          = 0x9,
    VECTOR                  = 0xA,
    DATATYPE_INST           = 0xB,
    SIGNER                  = 0xC,
    U16                     = 0xD,
    U32                     = 0xE,
    U256                    = 0xF,
}

impl SerializedType {
    pub fn from_u8(value: u8) -> BinaryLoaderResult<SerializedType> {
        match value {
            0x1 => Ok(SerializedType::BOOL),
            0x2 => Ok(SerializedType::U8),
            0x3 => Ok(SerializedType::U64),
            0x4 => Ok(SerializedType::U128),
            0x5 => Ok(SerializedType::ADDRESS),
            0x6 => Ok(SerializedType::REFERENCE),
            0x7 => Ok(SerializedType::MUTABLE_REFERENCE),
            0x8 => Ok(SerializedType::DATATYPE),
            0x9 => Ok(SerializedType::TYPE_PARAMETER),
            0xA => Ok(SerializedType::VECTOR),
            0xB => Ok(SerializedType::DATATYPE_INST),
            0xC => Ok(SerializedType::SIGNER),
            0xD => Ok(SerializedType::U16),
            0xE => Ok(SerializedType::U32),
            0xF => Ok(SerializedType::U256),
            _ => Err(PartialVMError::new(StatusCode::UNKNOWN_SERIALIZED_TYPE)),
        }
    }
}

#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerializedNativeStructFlag {
    NATIVE                  = 0x1,
    DECLARED                = 0x2,
}

impl SerializedNativeStructFlag {
    pub fn from_u8(value: u8) -> BinaryLoaderResult<SerializedNativeStructFlag> {
        match value {
            0x1 => Ok(SerializedNativeStructFlag::NATIVE),
            0x2 => Ok(SerializedNativeStructFlag::DECLARED),
            _ => Err(PartialVMError::new(StatusCode::UNKNOWN_NATIVE_STRUCT_FLAG)),
        }
    }
}

#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerializedEnumFlag {
    DECLARED                = 0x2,
}

impl SerializedEnumFlag {
    pub fn from_u8(value: u8) -> BinaryLoaderResult<SerializedEnumFlag> {
        match value {
            0x2 => Ok(SerializedEnumFlag::DECLARED),
            _ => Err(PartialVMError::new(StatusCode::MALFORMED)
                .with_message(format!("Invalid enum flag {:#x}", value))),
        }
    }
}

/// Discriminator byte written ahead of each jump table's offsets.
#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerializedJumpTableFlag {
    FULL                    = 0x1,
}

/// Legacy nominal resource flag of datatype handles (version 1 only).
#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeprecatedNominalResourceFlag {
    NOMINAL_RESOURCE        = 0x1,
    NORMAL_STRUCT           = 0x2,
}

impl DeprecatedNominalResourceFlag {
    pub fn from_u8(value: u8) -> BinaryLoaderResult<DeprecatedNominalResourceFlag> {
        match value {
            0x1 => Ok(DeprecatedNominalResourceFlag::NOMINAL_RESOURCE),
            0x2 => Ok(DeprecatedNominalResourceFlag::NORMAL_STRUCT),
            _ => Err(PartialVMError::new(StatusCode::UNKNOWN_ABILITY)),
        }
    }
}

/// Legacy kind of type parameters (version 1 only).
#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeprecatedKind {
    ALL                     = 0x1,
    COPYABLE                = 0x2,
    RESOURCE                = 0x3,
}

impl DeprecatedKind {
    pub fn from_u8(value: u8) -> BinaryLoaderResult<DeprecatedKind> {
        match value {
            0x1 => Ok(DeprecatedKind::ALL),
            0x2 => Ok(DeprecatedKind::COPYABLE),
            0x3 => Ok(DeprecatedKind::RESOURCE),
            _ => Err(PartialVMError::new(StatusCode::UNKNOWN_ABILITY)),
        }
    }
}

#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Opcodes {
    POP                         = 0x01,
    RET                         = 0x02,
    BR_TRUE                     = 0x03,
    BR_FALSE                    = 0x04,
    BRANCH                      = 0x05,
    LD_U64                      = 0x06,
    LD_CONST                    = 0x07,
    LD_TRUE                     = 0x08,
    LD_FALSE                    = 0x09,
    COPY_LOC                    = 0x0A,
    MOVE_LOC                    = 0x0B,
    ST_LOC                      = 0x0C,
    MUT_BORROW_LOC              = 0x0D,
    IMM_BORROW_LOC              = 0x0E,
    MUT_BORROW_FIELD            = 0x0F,
    IMM_BORROW_FIELD            = 0x10,
    CALL                        = 0x11,
    PACK                        = 0x12,
    UNPACK                      = 0x13,
    READ_REF                    = 0x14,
    WRITE_REF                   = 0x15,
    ADD                         = 0x16,
    SUB                         = 0x17,
    MUL                         = 0x18,
    MOD                         = 0x19,
    DIV                         = 0x1A,
    BIT_OR                      = 0x1B,
    BIT_AND                     = 0x1C,
    XOR                         = 0x1D,
    OR                          = 0x1E,
    AND                         = 0x1F,
    NOT                         = 0x20,
    EQ                          = 0x21,
    NEQ                         = 0x22,
    LT                          = 0x23,
    GT                          = 0x24,
    LE                          = 0x25,
    GE                          = 0x26,
    ABORT                       = 0x27,
    NOP                         = 0x28,
    EXISTS_DEPRECATED           = 0x29,
    MUT_BORROW_GLOBAL_DEPRECATED = 0x2A,
    IMM_BORROW_GLOBAL_DEPRECATED = 0x2B,
    MOVE_FROM_DEPRECATED        = 0x2C,
    MOVE_TO_DEPRECATED          = 0x2D,
    FREEZE_REF                  = 0x2E,
    SHL                         = 0x2F,
    SHR                         = 0x30,
    LD_U8                       = 0x31,
    LD_U128                     = 0x32,
    CAST_U8                     = 0x33,
    CAST_U64                    = 0x34,
    CAST_U128                   = 0x35,
    MUT_BORROW_FIELD_GENERIC    = 0x36,
    IMM_BORROW_FIELD_GENERIC    = 0x37,
    CALL_GENERIC                = 0x38,
    PACK_GENERIC                = 0x39,
    UNPACK_GENERIC              = 0x3A,
    EXISTS_GENERIC_DEPRECATED   = 0x3B,
    MUT_BORROW_GLOBAL_GENERIC_DEPRECATED = 0x3C,
    IMM_BORROW_GLOBAL_GENERIC_DEPRECATED = 0x3D,
    MOVE_FROM_GENERIC_DEPRECATED = 0x3E,
    MOVE_TO_GENERIC_DEPRECATED  = 0x3F,
    VEC_PACK                    = 0x40,
    VEC_LEN                     = 0x41,
    VEC_IMM_BORROW              = 0x42,
    VEC_MUT_BORROW              = 0x43,
    VEC_PUSH_BACK               = 0x44,
    VEC_POP_BACK                = 0x45,
    VEC_UNPACK                  = 0x46,
    VEC_SWAP                    = 0x47,
    LD_U16                      = 0x48,
    LD_U32                      = 0x49,
    LD_U256                     = 0x4A,
    CAST_U16                    = 0x4B,
    CAST_U32                    = 0x4C,
    CAST_U256                   = 0x4D,
    PACK_VARIANT                = 0x4E,
    PACK_VARIANT_GENERIC        = 0x4F,
    UNPACK_VARIANT              = 0x50,
    UNPACK_VARIANT_IMM_REF      = 0x51,
    UNPACK_VARIANT_MUT_REF      = 0x52,
    UNPACK_VARIANT_GENERIC      = 0x53,
    UNPACK_VARIANT_GENERIC_IMM_REF = 0x54,
    UNPACK_VARIANT_GENERIC_MUT_REF = 0x55,
    VARIANT_SWITCH              = 0x56,
}

impl Opcodes {
    pub fn from_u8(value: u8) -> BinaryLoaderResult<Opcodes> {
        use Opcodes::*;
        Ok(match value {
            0x01 => POP,
            0x02 => RET,
            0x03 => BR_TRUE,
            0x04 => BR_FALSE,
            0x05 => BRANCH,
            0x06 => LD_U64,
            0x07 => LD_CONST,
            0x08 => LD_TRUE,
            0x09 => LD_FALSE,
            0x0A => COPY_LOC,
            0x0B => MOVE_LOC,
            0x0C => ST_LOC,
            0x0D => MUT_BORROW_LOC,
            0x0E => IMM_BORROW_LOC,
            0x0F => MUT_BORROW_FIELD,
            0x10 => IMM_BORROW_FIELD,
            0x11 => CALL,
            0x12 => PACK,
            0x13 => UNPACK,
            0x14 => READ_REF,
            0x15 => WRITE_REF,
            0x16 => ADD,
            0x17 => SUB,
            0x18 => MUL,
            0x19 => MOD,
            0x1A => DIV,
            0x1B => BIT_OR,
            0x1C => BIT_AND,
            0x1D => XOR,
            0x1E => OR,
            0x1F => AND,
            0x20 => NOT,
            0x21 => EQ,
            0x22 => NEQ,
            0x23 => LT,
            0x24 => GT,
            0x25 => LE,
            0x26 => GE,
            0x27 => ABORT,
            0x28 => NOP,
            0x29 => EXISTS_DEPRECATED,
            0x2A => MUT_BORROW_GLOBAL_DEPRECATED,
            0x2B => IMM_BORROW_GLOBAL_DEPRECATED,
            0x2C => MOVE_FROM_DEPRECATED,
            0x2D => MOVE_TO_DEPRECATED,
            0x2E => FREEZE_REF,
            0x2F => SHL,
            0x30 => SHR,
            0x31 => LD_U8,
            0x32 => LD_U128,
            0x33 => CAST_U8,
            0x34 => CAST_U64,
            0x35 => CAST_U128,
            0x36 => MUT_BORROW_FIELD_GENERIC,
            0x37 => IMM_BORROW_FIELD_GENERIC,
            0x38 => CALL_GENERIC,
            0x39 => PACK_GENERIC,
            0x3A => UNPACK_GENERIC,
            0x3B => EXISTS_GENERIC_DEPRECATED,
            0x3C => MUT_BORROW_GLOBAL_GENERIC_DEPRECATED,
            0x3D => IMM_BORROW_GLOBAL_GENERIC_DEPRECATED,
            0x3E => MOVE_FROM_GENERIC_DEPRECATED,
            0x3F => MOVE_TO_GENERIC_DEPRECATED,
            0x40 => VEC_PACK,
            0x41 => VEC_LEN,
            0x42 => VEC_IMM_BORROW,
            0x43 => VEC_MUT_BORROW,
            0x44 => VEC_PUSH_BACK,
            0x45 => VEC_POP_BACK,
            0x46 => VEC_UNPACK,
            0x47 => VEC_SWAP,
            0x48 => LD_U16,
            0x49 => LD_U32,
            0x4A => LD_U256,
            0x4B => CAST_U16,
            0x4C => CAST_U32,
            0x4D => CAST_U256,
            0x4E => PACK_VARIANT,
            0x4F => PACK_VARIANT_GENERIC,
            0x50 => UNPACK_VARIANT,
            0x51 => UNPACK_VARIANT_IMM_REF,
            0x52 => UNPACK_VARIANT_MUT_REF,
            0x53 => UNPACK_VARIANT_GENERIC,
            0x54 => UNPACK_VARIANT_GENERIC_IMM_REF,
            0x55 => UNPACK_VARIANT_GENERIC_MUT_REF,
            0x56 => VARIANT_SWITCH,
            _ => {
                return Err(PartialVMError::new(StatusCode::UNKNOWN_OPCODE)
                    .with_message(format!("Unknown opcode {:#x}", value)))
            }
        })
    }
}

/// Upper limit of a ULEB128 encoded `u64`, in bytes.
pub const ULEB128_U64_MAX_BYTES: usize = 10;

/// Take a `Vec<u8>` and a value to write to that vector and applies LEB128 logic to
/// compress the u64.
pub fn write_u64_as_uleb128(binary: &mut Vec<u8>, mut val: u64) {
    loop {
        let cur = val & 0x7F;
        if cur != val {
            binary.push((cur | 0x80) as u8);
            val >>= 7;
        } else {
            binary.push(cur as u8);
            break;
        }
    }
}

/// Write a `u16` in Little Endian format.
pub fn write_u16(binary: &mut Vec<u8>, value: u16) {
    binary.extend_from_slice(&value.to_le_bytes());
}

/// Write a `u32` in Little Endian format.
pub fn write_u32(binary: &mut Vec<u8>, value: u32) {
    binary.extend_from_slice(&value.to_le_bytes());
}

/// Write a `u64` in Little Endian format.
pub fn write_u64(binary: &mut Vec<u8>, value: u64) {
    binary.extend_from_slice(&value.to_le_bytes());
}

/// Write a `u128` in Little Endian format.
pub fn write_u128(binary: &mut Vec<u8>, value: u128) {
    binary.extend_from_slice(&value.to_le_bytes());
}

/// Write a `u256` in Little Endian format.
pub fn write_u256(binary: &mut Vec<u8>, value: ethnum::U256) {
    binary.extend_from_slice(&value.to_le_bytes());
}

/// Reads a `u32` in Little Endian format.
pub fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    let mut buf = [0; 4];
    cursor.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads a ULEB128 encoded `u64`.
///
/// Fails on truncated input, on values that do not fit in 64 bits and on non-canonical
/// encodings (a trailing zero group).
pub fn read_uleb128_as_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0;
    let mut buf = [0u8; 1];
    while cursor.read_exact(&mut buf).is_ok() {
        let byte = buf[0];
        let cur = (byte & 0x7F) as u64;
        if (cur << shift) >> shift != cur {
            bail!("invalid ULEB128 repr for usize");
        }
        value |= cur << shift;

        if (byte & 0x80) == 0 {
            if shift > 0 && cur == 0 {
                bail!("invalid ULEB128 repr for usize");
            }
            return Ok(value);
        }

        shift += 7;
        if shift > u64::BITS {
            break;
        }
    }
    bail!("invalid ULEB128 repr for usize");
}

//
// Versioning
//

/// Version 1: the initial version
pub const VERSION_1: u32 = 1;

/// Version 2: changes compared with version 1
///  + function visibility stored in separate byte before the flags byte
///  + the flags byte now contains only the is_native information (at bit 0x2)
///  + new visibility modifiers for "friend" and "script" functions
///  + friend list for modules
pub const VERSION_2: u32 = 2;

/// Version 3: changes compared with version 2
///  + phantom type parameters
pub const VERSION_3: u32 = 3;

/// Version 4: changes compared with version 3
///  + bytecode for vector operations
pub const VERSION_4: u32 = 4;

/// Version 5: changes compared with version 4
///  +/- script and public(script) verification is now adapter specific
///  + metadata
pub const VERSION_5: u32 = 5;

/// Version 6: changes compared with version 5
///  + u16, u32, u256 integers and corresponding Ld, Cast bytecodes
pub const VERSION_6: u32 = 6;

/// Version 7: changes compared with version 6
///  + enums
///  + flavored version field
pub const VERSION_7: u32 = 7;

// Mark which version is the latest version
pub const VERSION_MAX: u32 = VERSION_7;

// Mark which oldest version is supported.
pub const VERSION_MIN: u32 = VERSION_1;

/// Packs a flavor tag into the high byte of the version field.
///
/// Versions up to 6 predate flavoring and are written as plain integers.
pub struct BinaryFlavor;

impl BinaryFlavor {
    pub const FLAVOR_MASK: u32 = 0xFF00_0000;
    pub const VERSION_MASK: u32 = 0x00FF_FFFF;
    pub const SUI_FLAVOR: u8 = 0x05;
    const LAST_UNFLAVORED_VERSION: u32 = VERSION_6;

    pub fn encode_version(unflavored_version: u32) -> u32 {
        if unflavored_version <= Self::LAST_UNFLAVORED_VERSION {
            return unflavored_version;
        }
        ((Self::SUI_FLAVOR as u32) << 24) | unflavored_version
    }

    pub fn decode_version(flavored_version: u32) -> u32 {
        if flavored_version <= Self::LAST_UNFLAVORED_VERSION {
            return flavored_version;
        }
        flavored_version & Self::VERSION_MASK
    }

    pub fn decode_flavor(flavored_version: u32) -> Option<u8> {
        if flavored_version <= Self::LAST_UNFLAVORED_VERSION {
            return None;
        }
        Some(((flavored_version & Self::FLAVOR_MASK) >> 24) as u8)
    }
}

/// Grammar features enabled by a binary format version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionFeatures {
    version: u32,
}

impl VersionFeatures {
    pub fn new(version: u32) -> Self {
        Self { version }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Ability sets are stored as deprecated kinds.
    pub fn legacy_ability_kinds(&self) -> bool {
        self.version < VERSION_2
    }

    /// Function visibility and native bit share a single flags byte.
    pub fn has_single_flags_byte(&self) -> bool {
        self.version == VERSION_1
    }

    pub fn has_friend_decls(&self) -> bool {
        self.version >= VERSION_2
    }

    pub fn has_phantom_flags(&self) -> bool {
        self.version >= VERSION_3
    }

    pub fn has_vector_ops(&self) -> bool {
        self.version >= VERSION_4
    }

    pub fn has_entry_bit(&self) -> bool {
        self.version >= VERSION_5
    }

    pub fn has_metadata(&self) -> bool {
        self.version >= VERSION_5
    }

    pub fn has_wide_integers(&self) -> bool {
        self.version >= VERSION_6
    }

    pub fn has_enums(&self) -> bool {
        self.version >= VERSION_7
    }

    pub fn has_jump_tables(&self) -> bool {
        self.version >= VERSION_7
    }

    pub fn has_flavor(&self) -> bool {
        self.version > BinaryFlavor::LAST_UNFLAVORED_VERSION
    }
}

/// Return the simplest opcode for an instruction, ignoring its operands.
pub fn instruction_opcode(instruction: &Bytecode) -> Opcodes {
    use Bytecode::*;

    match instruction {
        Pop => Opcodes::POP,
        Ret => Opcodes::RET,
        BrTrue(_) => Opcodes::BR_TRUE,
        BrFalse(_) => Opcodes::BR_FALSE,
        Branch(_) => Opcodes::BRANCH,
        LdU8(_) => Opcodes::LD_U8,
        LdU16(_) => Opcodes::LD_U16,
        LdU32(_) => Opcodes::LD_U32,
        LdU64(_) => Opcodes::LD_U64,
        LdU128(_) => Opcodes::LD_U128,
        LdU256(_) => Opcodes::LD_U256,
        CastU8 => Opcodes::CAST_U8,
        CastU16 => Opcodes::CAST_U16,
        CastU32 => Opcodes::CAST_U32,
        CastU64 => Opcodes::CAST_U64,
        CastU128 => Opcodes::CAST_U128,
        CastU256 => Opcodes::CAST_U256,
        LdConst(_) => Opcodes::LD_CONST,
        LdTrue => Opcodes::LD_TRUE,
        LdFalse => Opcodes::LD_FALSE,
        CopyLoc(_) => Opcodes::COPY_LOC,
        MoveLoc(_) => Opcodes::MOVE_LOC,
        StLoc(_) => Opcodes::ST_LOC,
        Call(_) => Opcodes::CALL,
        CallGeneric(_) => Opcodes::CALL_GENERIC,
        Pack(_) => Opcodes::PACK,
        PackGeneric(_) => Opcodes::PACK_GENERIC,
        Unpack(_) => Opcodes::UNPACK,
        UnpackGeneric(_) => Opcodes::UNPACK_GENERIC,
        ReadRef => Opcodes::READ_REF,
        WriteRef => Opcodes::WRITE_REF,
        FreezeRef => Opcodes::FREEZE_REF,
        MutBorrowLoc(_) => Opcodes::MUT_BORROW_LOC,
        ImmBorrowLoc(_) => Opcodes::IMM_BORROW_LOC,
        MutBorrowField(_) => Opcodes::MUT_BORROW_FIELD,
        MutBorrowFieldGeneric(_) => Opcodes::MUT_BORROW_FIELD_GENERIC,
        ImmBorrowField(_) => Opcodes::IMM_BORROW_FIELD,
        ImmBorrowFieldGeneric(_) => Opcodes::IMM_BORROW_FIELD_GENERIC,
        Add => Opcodes::ADD,
        Sub => Opcodes::SUB,
        Mul => Opcodes::MUL,
        Mod => Opcodes::MOD,
        Div => Opcodes::DIV,
        BitOr => Opcodes::BIT_OR,
        BitAnd => Opcodes::BIT_AND,
        Xor => Opcodes::XOR,
        Shl => Opcodes::SHL,
        Shr => Opcodes::SHR,
        Or => Opcodes::OR,
        And => Opcodes::AND,
        Not => Opcodes::NOT,
        Eq => Opcodes::EQ,
        Neq => Opcodes::NEQ,
        Lt => Opcodes::LT,
        Gt => Opcodes::GT,
        Le => Opcodes::LE,
        Ge => Opcodes::GE,
        Abort => Opcodes::ABORT,
        Nop => Opcodes::NOP,
        VecPack(..) => Opcodes::VEC_PACK,
        VecLen(_) => Opcodes::VEC_LEN,
        VecImmBorrow(_) => Opcodes::VEC_IMM_BORROW,
        VecMutBorrow(_) => Opcodes::VEC_MUT_BORROW,
        VecPushBack(_) => Opcodes::VEC_PUSH_BACK,
        VecPopBack(_) => Opcodes::VEC_POP_BACK,
        VecUnpack(..) => Opcodes::VEC_UNPACK,
        VecSwap(_) => Opcodes::VEC_SWAP,
        PackVariant(_) => Opcodes::PACK_VARIANT,
        PackVariantGeneric(_) => Opcodes::PACK_VARIANT_GENERIC,
        UnpackVariant(_) => Opcodes::UNPACK_VARIANT,
        UnpackVariantImmRef(_) => Opcodes::UNPACK_VARIANT_IMM_REF,
        UnpackVariantMutRef(_) => Opcodes::UNPACK_VARIANT_MUT_REF,
        UnpackVariantGeneric(_) => Opcodes::UNPACK_VARIANT_GENERIC,
        UnpackVariantGenericImmRef(_) => Opcodes::UNPACK_VARIANT_GENERIC_IMM_REF,
        UnpackVariantGenericMutRef(_) => Opcodes::UNPACK_VARIANT_GENERIC_MUT_REF,
        VariantSwitch(_) => Opcodes::VARIANT_SWITCH,
        ExistsDeprecated(_) => Opcodes::EXISTS_DEPRECATED,
        ExistsGenericDeprecated(_) => Opcodes::EXISTS_GENERIC_DEPRECATED,
        MutBorrowGlobalDeprecated(_) => Opcodes::MUT_BORROW_GLOBAL_DEPRECATED,
        MutBorrowGlobalGenericDeprecated(_) => Opcodes::MUT_BORROW_GLOBAL_GENERIC_DEPRECATED,
        ImmBorrowGlobalDeprecated(_) => Opcodes::IMM_BORROW_GLOBAL_DEPRECATED,
        ImmBorrowGlobalGenericDeprecated(_) => Opcodes::IMM_BORROW_GLOBAL_GENERIC_DEPRECATED,
        MoveFromDeprecated(_) => Opcodes::MOVE_FROM_DEPRECATED,
        MoveFromGenericDeprecated(_) => Opcodes::MOVE_FROM_GENERIC_DEPRECATED,
        MoveToDeprecated(_) => Opcodes::MOVE_TO_DEPRECATED,
        MoveToGenericDeprecated(_) => Opcodes::MOVE_TO_GENERIC_DEPRECATED,
    }
}

/// Return the opcode byte of an instruction.
pub fn instruction_key(instruction: &Bytecode) -> u8 {
    instruction_opcode(instruction) as u8
}
