// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

mod binary_config_tests;
mod compiled_module_tests;
mod instruction_tests;
mod module_editor_tests;
mod serializer_tests;

use crate::file_format_common::*;
use std::{collections::BTreeMap, io::Cursor};

/// Builds a binary from a raw directory and table region, followed by `trailer`.
pub(crate) fn raw_binary(
    magic: &[u8],
    version_field: u32,
    directory: &[(u8, u64, u64)],
    data: &[u8],
    trailer: &[u8],
) -> Vec<u8> {
    let mut binary = magic.to_vec();
    write_u32(&mut binary, version_field);
    write_u64_as_uleb128(&mut binary, directory.len() as u64);
    for (kind, offset, count) in directory {
        binary.push(*kind);
        write_u64_as_uleb128(&mut binary, *offset);
        write_u64_as_uleb128(&mut binary, *count);
    }
    binary.extend_from_slice(data);
    binary.extend_from_slice(trailer);
    binary
}

/// Lays out `tables` back to back in the given order and appends a zero self index.
pub(crate) fn binary_with_tables(version: u32, tables: &[(TableType, Vec<u8>)]) -> Vec<u8> {
    let mut directory = vec![];
    let mut data = vec![];
    for (kind, bytes) in tables {
        directory.push((*kind as u8, data.len() as u64, bytes.len() as u64));
        data.extend_from_slice(bytes);
    }
    raw_binary(
        &BinaryConstants::MOVE_MAGIC,
        BinaryFlavor::encode_version(version),
        &directory,
        &data,
        &[0],
    )
}

/// The minimal tables every module in these tests carries: a self handle named `<SELF>` at
/// the zero address and one empty signature.
pub(crate) fn self_tables() -> Vec<(TableType, Vec<u8>)> {
    let mut identifiers = vec![6];
    identifiers.extend_from_slice(b"<SELF>");
    vec![
        (TableType::MODULE_HANDLES, vec![0, 0]),
        (TableType::SIGNATURES, vec![0]),
        (TableType::IDENTIFIERS, identifiers),
        (TableType::ADDRESS_IDENTIFIERS, vec![0; 32]),
    ]
}

/// Parsed directory of a serialized module.
pub(crate) struct Directory {
    pub entries: Vec<(u8, u64, u64)>,
    pub tables: BTreeMap<u8, Vec<u8>>,
}

pub(crate) fn read_directory(binary: &[u8]) -> Directory {
    let mut cursor = Cursor::new(binary);
    cursor.set_position(BinaryConstants::MOVE_MAGIC_SIZE as u64);
    read_u32(&mut cursor).unwrap();
    let count = read_uleb128_as_u64(&mut cursor).unwrap();
    let mut entries = vec![];
    for _ in 0..count {
        let pos = cursor.position() as usize;
        let kind = binary[pos];
        cursor.set_position(pos as u64 + 1);
        let offset = read_uleb128_as_u64(&mut cursor).unwrap();
        let size = read_uleb128_as_u64(&mut cursor).unwrap();
        entries.push((kind, offset, size));
    }
    let data_offset = cursor.position() as usize;
    let tables = entries
        .iter()
        .map(|(kind, offset, size)| {
            let start = data_offset + *offset as usize;
            (*kind, binary[start..start + *size as usize].to_vec())
        })
        .collect();
    Directory { entries, tables }
}
