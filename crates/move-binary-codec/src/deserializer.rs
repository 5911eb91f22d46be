// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress, binary_config::BinaryConfig, compiled_module::CompiledModule,
    errors::*, file_format::*, file_format_common::*, identifier::Identifier, IndexKind,
};
use std::{
    collections::HashSet,
    io::{Cursor, Read},
};
use tracing::{debug, trace};

impl CompiledModule {
    /// Deserialize a &[u8] slice into a `CompiledModule` instance, using the standard
    /// `BinaryConfig`.
    pub fn deserialize(binary: &[u8]) -> BinaryLoaderResult<Self> {
        Self::deserialize_with_config(binary, &BinaryConfig::standard())
    }

    /// Deserialize a &[u8] slice into a `CompiledModule` instance, up to the specified version.
    pub fn deserialize_with_config(
        binary: &[u8],
        binary_config: &BinaryConfig,
    ) -> BinaryLoaderResult<Self> {
        deserialize_compiled_module(binary, binary_config)
    }
}

/// Table info: table type, offset where the table content starts from, count of bytes for
/// the table content.
#[derive(Clone, Debug)]
struct Table {
    kind: TableType,
    offset: u32,
    count: u32,
}

impl Table {
    fn new(kind: TableType, offset: u32, count: u32) -> Table {
        Table {
            kind,
            offset,
            count,
        }
    }
}

/// A binary whose header has been validated, positioned at the start of its table region.
pub(crate) struct VersionedBinary<'a> {
    binary_config: &'a BinaryConfig,
    binary: &'a [u8],
    version: u32,
    publishable: bool,
    tables: Vec<Table>,
    module_idx: ModuleHandleIndex,
    data_offset: usize,
}

/// A cursor over (a region of) a binary that knows the format version it is decoding.
pub(crate) struct VersionedCursor<'a> {
    features: VersionFeatures,
    cursor: Cursor<&'a [u8]>,
}

impl<'a> VersionedBinary<'a> {
    fn initialize(
        binary: &'a [u8],
        binary_config: &'a BinaryConfig,
    ) -> BinaryLoaderResult<Self> {
        let binary_len = binary.len();
        let mut cursor = Cursor::<&'a [u8]>::new(binary);

        // check magic
        let mut magic = [0u8; BinaryConstants::MOVE_MAGIC_SIZE];
        cursor.read_exact(&mut magic).map_err(|_| {
            PartialVMError::new(StatusCode::BAD_MAGIC)
                .with_message("Binary shorter than magic".to_string())
        })?;
        let publishable = if magic == BinaryConstants::MOVE_MAGIC {
            true
        } else if magic == BinaryConstants::UNPUBLISHABLE_MAGIC {
            if !binary_config.allow_unpublishable() {
                return Err(PartialVMError::new(StatusCode::UNPUBLISHABLE_NOT_ALLOWED));
            }
            false
        } else {
            return Err(PartialVMError::new(StatusCode::BAD_MAGIC));
        };

        // load binary version
        let flavored_version = read_u32(&mut cursor).map_err(|_| {
            PartialVMError::new(StatusCode::MALFORMED)
                .with_message("Bad binary header".to_string())
        })?;
        let version = BinaryFlavor::decode_version(flavored_version);
        if version == 0
            || version < binary_config.min_binary_format_version
            || version > u32::min(binary_config.max_binary_format_version, VERSION_MAX)
        {
            return Err(PartialVMError::new(StatusCode::UNKNOWN_VERSION)
                .with_message(format!("Unsupported binary format version {}", version)));
        }
        let features = VersionFeatures::new(version);
        if features.has_flavor() {
            match BinaryFlavor::decode_flavor(flavored_version) {
                Some(BinaryFlavor::SUI_FLAVOR) => (),
                flavor => {
                    return Err(PartialVMError::new(StatusCode::UNKNOWN_VERSION)
                        .with_message(format!(
                            "Unexpected binary flavor {:?} for version {}",
                            flavor, version
                        )))
                }
            }
        }

        let mut cursor = VersionedCursor { features, cursor };

        // load table info
        let table_count = load_table_count(&mut cursor)?;
        let mut tables: Vec<Table> = Vec::new();
        read_tables(&mut cursor, table_count, &mut tables)?;
        let table_size = check_tables(&mut tables, binary_len)?;
        let data_offset = cursor.position() as usize;
        if (table_size as u64) + (data_offset as u64) > binary_len as u64 {
            return Err(PartialVMError::new(StatusCode::MALFORMED)
                .with_message("Table size too big".to_string()));
        }

        // the self module handle index trails the table contents
        let binary_end_offset = data_offset + table_size as usize;
        cursor.set_position(binary_end_offset as u64);
        let module_idx = load_module_handle_index(&mut cursor).map_err(|e| {
            e.append_message_with_separator(' ', "Error reading module index".to_string())
        })?;

        if binary_config.check_no_extraneous_bytes && cursor.position() as usize != binary_len {
            return Err(PartialVMError::new(StatusCode::TRAILING_BYTES).with_message(format!(
                "{} extraneous bytes after the module index",
                binary_len - cursor.position() as usize
            )));
        }

        debug!(
            version,
            publishable,
            tables = tables.len(),
            "accepted module binary header"
        );

        Ok(Self {
            binary_config,
            binary,
            version,
            publishable,
            tables,
            module_idx,
            data_offset,
        })
    }

    pub(crate) fn version(&self) -> u32 {
        self.version
    }

    fn new_cursor(&self, start: usize, end: usize) -> VersionedCursor<'a> {
        VersionedCursor {
            features: VersionFeatures::new(self.version),
            cursor: Cursor::new(&self.binary[self.data_offset + start..self.data_offset + end]),
        }
    }
}

impl<'a> VersionedCursor<'a> {
    /// A cursor over a raw byte stream, for decoding pieces of a binary in isolation.
    pub(crate) fn new(version: u32, binary: &'a [u8]) -> Self {
        Self {
            features: VersionFeatures::new(version),
            cursor: Cursor::new(binary),
        }
    }

    pub(crate) fn version(&self) -> u32 {
        self.features.version()
    }

    pub(crate) fn features(&self) -> VersionFeatures {
        self.features
    }

    pub(crate) fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn set_position(&mut self, pos: u64) {
        self.cursor.set_position(pos)
    }

    fn read_u8(&mut self) -> std::io::Result<u8> {
        let mut buf = [0u8; 1];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.cursor.read_exact(buf)
    }

    fn read_uleb128_as_u64(&mut self) -> anyhow::Result<u64> {
        read_uleb128_as_u64(&mut self.cursor)
    }
}

fn read_u16_internal(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u16> {
    let mut u16_bytes = [0; 2];
    cursor
        .read_exact(&mut u16_bytes)
        .map_err(|_| PartialVMError::new(StatusCode::BAD_U16))?;
    Ok(u16::from_le_bytes(u16_bytes))
}

fn read_u32_internal(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u32> {
    let mut u32_bytes = [0; 4];
    cursor
        .read_exact(&mut u32_bytes)
        .map_err(|_| PartialVMError::new(StatusCode::BAD_U32))?;
    Ok(u32::from_le_bytes(u32_bytes))
}

fn read_u64_internal(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u64> {
    let mut u64_bytes = [0; 8];
    cursor
        .read_exact(&mut u64_bytes)
        .map_err(|_| PartialVMError::new(StatusCode::BAD_U64))?;
    Ok(u64::from_le_bytes(u64_bytes))
}

fn read_u128_internal(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u128> {
    let mut u128_bytes = [0; 16];
    cursor
        .read_exact(&mut u128_bytes)
        .map_err(|_| PartialVMError::new(StatusCode::BAD_U128))?;
    Ok(u128::from_le_bytes(u128_bytes))
}

fn read_u256_internal(cursor: &mut VersionedCursor) -> BinaryLoaderResult<ethnum::U256> {
    let mut u256_bytes = [0; 32];
    cursor
        .read_exact(&mut u256_bytes)
        .map_err(|_| PartialVMError::new(StatusCode::BAD_U256))?;
    Ok(ethnum::U256::from_le_bytes(u256_bytes))
}

//
// Helpers to read all uleb128 encoded integers.
//
fn read_uleb_internal<T>(cursor: &mut VersionedCursor, max: u64) -> BinaryLoaderResult<T>
where
    u64: TryInto<T>,
{
    let x = cursor.read_uleb128_as_u64().map_err(|e| {
        PartialVMError::new(StatusCode::INVALID_VARINT).with_message(format!("Bad Uleb: {}", e))
    })?;
    if x > max {
        return Err(PartialVMError::new(StatusCode::MALFORMED)
            .with_message("Uleb greater than max requested".to_string()));
    }

    x.try_into().map_err(|_| {
        PartialVMError::new(StatusCode::MALFORMED)
            .with_message("Failed to convert u64 to target integer type".to_string())
    })
}

fn load_u8(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u8> {
    cursor.read_u8().map_err(|_| {
        PartialVMError::new(StatusCode::MALFORMED).with_message("Unexpected EOF".to_string())
    })
}

fn load_signature_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<SignatureIndex> {
    Ok(SignatureIndex(read_uleb_internal(
        cursor,
        SIGNATURE_INDEX_MAX,
    )?))
}

fn load_module_handle_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<ModuleHandleIndex> {
    Ok(ModuleHandleIndex(read_uleb_internal(
        cursor,
        MODULE_HANDLE_INDEX_MAX,
    )?))
}

fn load_identifier_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<IdentifierIndex> {
    Ok(IdentifierIndex(read_uleb_internal(
        cursor,
        IDENTIFIER_INDEX_MAX,
    )?))
}

fn load_datatype_handle_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<DatatypeHandleIndex> {
    Ok(DatatypeHandleIndex(read_uleb_internal(
        cursor,
        DATATYPE_HANDLE_INDEX_MAX,
    )?))
}

fn load_address_identifier_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<AddressIdentifierIndex> {
    Ok(AddressIdentifierIndex(read_uleb_internal(
        cursor,
        ADDRESS_INDEX_MAX,
    )?))
}

fn load_struct_def_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<StructDefinitionIndex> {
    Ok(StructDefinitionIndex(read_uleb_internal(
        cursor,
        STRUCT_DEF_INDEX_MAX,
    )?))
}

fn load_enum_def_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<EnumDefinitionIndex> {
    Ok(EnumDefinitionIndex(read_uleb_internal(
        cursor,
        ENUM_DEF_INDEX_MAX,
    )?))
}

fn load_function_handle_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<FunctionHandleIndex> {
    Ok(FunctionHandleIndex(read_uleb_internal(
        cursor,
        FUNCTION_HANDLE_INDEX_MAX,
    )?))
}

fn load_field_handle_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<FieldHandleIndex> {
    Ok(FieldHandleIndex(read_uleb_internal(
        cursor,
        FIELD_HANDLE_INDEX_MAX,
    )?))
}

fn load_field_inst_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<FieldInstantiationIndex> {
    Ok(FieldInstantiationIndex(read_uleb_internal(
        cursor,
        FIELD_INST_INDEX_MAX,
    )?))
}

fn load_function_inst_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<FunctionInstantiationIndex> {
    Ok(FunctionInstantiationIndex(read_uleb_internal(
        cursor,
        FUNCTION_INST_INDEX_MAX,
    )?))
}

fn load_struct_def_inst_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<StructDefInstantiationIndex> {
    Ok(StructDefInstantiationIndex(read_uleb_internal(
        cursor,
        STRUCT_DEF_INST_INDEX_MAX,
    )?))
}

fn load_enum_def_inst_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<EnumDefInstantiationIndex> {
    Ok(EnumDefInstantiationIndex(read_uleb_internal(
        cursor,
        ENUM_DEF_INST_INDEX_MAX,
    )?))
}

fn load_variant_handle_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<VariantHandleIndex> {
    Ok(VariantHandleIndex(read_uleb_internal(
        cursor,
        VARIANT_HANDLE_INDEX_MAX,
    )?))
}

fn load_variant_inst_handle_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<VariantInstantiationHandleIndex> {
    Ok(VariantInstantiationHandleIndex(read_uleb_internal(
        cursor,
        VARIANT_INST_HANDLE_INDEX_MAX,
    )?))
}

fn load_variant_jump_table_index(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<VariantJumpTableIndex> {
    Ok(VariantJumpTableIndex(read_uleb_internal(
        cursor,
        VARIANT_JUMP_TABLE_INDEX_MAX,
    )?))
}

fn load_constant_pool_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<ConstantPoolIndex> {
    Ok(ConstantPoolIndex(read_uleb_internal(
        cursor,
        CONSTANT_INDEX_MAX,
    )?))
}

fn load_bytecode_count(cursor: &mut VersionedCursor) -> BinaryLoaderResult<usize> {
    read_uleb_internal(cursor, BYTECODE_COUNT_MAX)
}

fn load_bytecode_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u16> {
    read_uleb_internal(cursor, BYTECODE_INDEX_MAX)
}

fn load_acquires_count(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u64> {
    read_uleb_internal(cursor, ACQUIRES_COUNT_MAX)
}

fn load_field_count(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u64> {
    read_uleb_internal(cursor, FIELD_COUNT_MAX)
}

fn load_variant_count(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u64> {
    read_uleb_internal(cursor, VARIANT_COUNT_MAX)
}

fn load_variant_tag(cursor: &mut VersionedCursor) -> BinaryLoaderResult<VariantTag> {
    read_uleb_internal(cursor, VARIANT_TAG_MAX_VALUE)
}

fn load_jump_table_count(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u64> {
    read_uleb_internal(cursor, JUMP_TABLE_INDEX_MAX)
}

fn load_type_parameter_count(cursor: &mut VersionedCursor) -> BinaryLoaderResult<usize> {
    read_uleb_internal(cursor, TYPE_PARAMETER_COUNT_MAX)
}

fn load_signature_size(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u64> {
    read_uleb_internal(cursor, SIGNATURE_SIZE_MAX)
}

fn load_constant_size(cursor: &mut VersionedCursor) -> BinaryLoaderResult<usize> {
    read_uleb_internal(cursor, CONSTANT_SIZE_MAX)
}

fn load_metadata_key_size(cursor: &mut VersionedCursor) -> BinaryLoaderResult<usize> {
    read_uleb_internal(cursor, METADATA_KEY_SIZE_MAX)
}

fn load_metadata_value_size(cursor: &mut VersionedCursor) -> BinaryLoaderResult<usize> {
    read_uleb_internal(cursor, METADATA_VALUE_SIZE_MAX)
}

fn load_identifier_size(cursor: &mut VersionedCursor) -> BinaryLoaderResult<usize> {
    read_uleb_internal(cursor, IDENTIFIER_SIZE_MAX)
}

fn load_type_parameter_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u16> {
    read_uleb_internal(cursor, TYPE_PARAMETER_INDEX_MAX)
}

fn load_field_offset(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u16> {
    read_uleb_internal(cursor, FIELD_OFFSET_MAX)
}

fn load_table_count(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u8> {
    read_uleb_internal(cursor, TABLE_COUNT_MAX)
}

fn load_table_offset(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u32> {
    read_uleb_internal(cursor, TABLE_OFFSET_MAX)
}

fn load_table_size(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u32> {
    read_uleb_internal(cursor, TABLE_SIZE_MAX)
}

fn load_vector_length(cursor: &mut VersionedCursor) -> BinaryLoaderResult<u64> {
    read_uleb_internal(cursor, u64::MAX)
}

/// Locals are addressed by a single fixed-width byte.
fn load_local_index(cursor: &mut VersionedCursor) -> BinaryLoaderResult<LocalIndex> {
    cursor.read_u8().map_err(|_| {
        PartialVMError::new(StatusCode::MALFORMED)
            .with_message("Unexpected EOF reading local index".to_string())
    })
}

/// Module internal function that manages deserialization of modules.
fn deserialize_compiled_module(
    binary: &[u8],
    binary_config: &BinaryConfig,
) -> BinaryLoaderResult<CompiledModule> {
    let versioned_binary = VersionedBinary::initialize(binary, binary_config)?;
    let mut module = CompiledModule {
        version: versioned_binary.version(),
        publishable: versioned_binary.publishable,
        self_module_handle_idx: versioned_binary.module_idx,
        ..Default::default()
    };

    build_compiled_module(&mut module, &versioned_binary, &versioned_binary.tables)?;
    debug!(
        name = module.name().map(Identifier::as_str).unwrap_or("<dangling>"),
        version = module.version,
        "decoded module"
    );

    Ok(module)
}

/// Reads all the table headers.
///
/// Return a Vec<Table> that contains all the table headers defined and checked.
fn read_tables(
    cursor: &mut VersionedCursor,
    table_count: u8,
    tables: &mut Vec<Table>,
) -> BinaryLoaderResult<()> {
    for _count in 0..table_count {
        tables.push(read_table(cursor)?);
    }
    Ok(())
}

/// Reads a table from a slice at a given offset.
/// If a table is not recognized an error is returned.
fn read_table(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Table> {
    let kind = match cursor.read_u8() {
        Ok(kind) => kind,
        Err(_) => {
            return Err(PartialVMError::new(StatusCode::MALFORMED)
                .with_message("Error reading table".to_string()))
        }
    };
    let table_offset = load_table_offset(cursor)?;
    let count = load_table_size(cursor)?;
    Ok(Table::new(TableType::from_u8(kind)?, table_offset, count))
}

/// Verify correctness of tables.
///
/// Tables cannot have duplicates, must cover the entire blob and must be disjoint.
/// Returns the total size of the table region.
fn check_tables(tables: &mut Vec<Table>, binary_len: usize) -> BinaryLoaderResult<u32> {
    let mut table_types = HashSet::new();
    for table in tables.iter() {
        if !table_types.insert(table.kind) {
            return Err(PartialVMError::new(StatusCode::DUPLICATE_TABLE)
                .with_message(format!("{:?}", table.kind)));
        }
    }

    // there is no real reason to pass a mutable reference but we are sorting next line
    tables.sort_by(|t1, t2| t1.offset.cmp(&t2.offset));

    let mut current_offset: u32 = 0;
    for table in tables.iter() {
        if table.offset != current_offset {
            return Err(PartialVMError::new(StatusCode::BAD_HEADER_TABLE).with_message(format!(
                "{:?} starts at {} but the previous table ends at {}",
                table.kind, table.offset, current_offset
            )));
        }
        if table.count == 0 {
            return Err(PartialVMError::new(StatusCode::BAD_HEADER_TABLE)
                .with_message(format!("{:?} is empty", table.kind)));
        }
        match current_offset.checked_add(table.count) {
            Some(checked_offset) => current_offset = checked_offset,
            None => return Err(PartialVMError::new(StatusCode::BAD_HEADER_TABLE)),
        }
        if current_offset as usize > binary_len {
            return Err(PartialVMError::new(StatusCode::BAD_HEADER_TABLE)
                .with_message(format!("{:?} ends past the binary", table.kind)));
        }
    }
    Ok(current_offset)
}

impl Table {
    /// Generic function to deserialize a table into a vector of given type.
    fn load<T>(
        &self,
        binary: &VersionedBinary,
        result: &mut Vec<T>,
        deserializer: impl Fn(&mut VersionedCursor) -> BinaryLoaderResult<T>,
    ) -> BinaryLoaderResult<()> {
        let start = self.offset as usize;
        let end = start + self.count as usize;
        let mut cursor = binary.new_cursor(start, end);
        while cursor.position() < self.count as u64 {
            result.push(deserializer(&mut cursor)?)
        }
        trace!(table = ?self.kind, entries = result.len(), "loaded table");
        Ok(())
    }
}

fn check_table_size<T>(table: &[T], max: u16, kind: TableType) -> BinaryLoaderResult<()> {
    if table.len() > max as usize {
        return Err(PartialVMError::new(StatusCode::MALFORMED).with_message(format!(
            "Table size too big for {:?}: {} entries, max {}",
            kind,
            table.len(),
            max
        )));
    }
    Ok(())
}

fn check_table_version(
    binary: &VersionedBinary,
    kind: TableType,
    available: bool,
) -> BinaryLoaderResult<()> {
    if !available {
        return Err(PartialVMError::new(StatusCode::MALFORMED).with_message(format!(
            "{:?} table not supported in bytecode version {}",
            kind,
            binary.version()
        )));
    }
    Ok(())
}

/// Builds and returns a `CompiledModule`.
fn build_compiled_module(
    module: &mut CompiledModule,
    binary: &VersionedBinary,
    tables: &[Table],
) -> BinaryLoaderResult<()> {
    let config = &binary.binary_config.table_config;
    let features = VersionFeatures::new(binary.version());
    for table in tables {
        match table.kind {
            TableType::MODULE_HANDLES => {
                table.load(binary, &mut module.module_handles, load_module_handle)?;
                check_table_size(&module.module_handles, config.module_handles, table.kind)?;
            }
            TableType::DATATYPE_HANDLES => {
                table.load(binary, &mut module.datatype_handles, load_datatype_handle)?;
                check_table_size(&module.datatype_handles, config.datatype_handles, table.kind)?;
            }
            TableType::FUNCTION_HANDLES => {
                table.load(binary, &mut module.function_handles, load_function_handle)?;
                check_table_size(&module.function_handles, config.function_handles, table.kind)?;
            }
            TableType::FUNCTION_INST => {
                table.load(
                    binary,
                    &mut module.function_instantiations,
                    load_function_instantiation,
                )?;
                check_table_size(
                    &module.function_instantiations,
                    config.function_instantiations,
                    table.kind,
                )?;
            }
            TableType::SIGNATURES => {
                table.load(binary, &mut module.signatures, load_signature)?;
                check_table_size(&module.signatures, config.signatures, table.kind)?;
            }
            TableType::CONSTANT_POOL => {
                table.load(binary, &mut module.constant_pool, load_constant)?;
                check_table_size(&module.constant_pool, config.constant_pool, table.kind)?;
            }
            TableType::IDENTIFIERS => {
                table.load(binary, &mut module.identifiers, load_identifier)?;
                check_table_size(&module.identifiers, config.identifiers, table.kind)?;
            }
            TableType::ADDRESS_IDENTIFIERS => {
                table.load(
                    binary,
                    &mut module.address_identifiers,
                    load_address_identifier,
                )?;
                check_table_size(
                    &module.address_identifiers,
                    config.address_identifiers,
                    table.kind,
                )?;
            }
            TableType::STRUCT_DEFS => {
                table.load(binary, &mut module.struct_defs, load_struct_def)?;
                check_table_size(&module.struct_defs, config.struct_defs, table.kind)?;
            }
            TableType::STRUCT_DEF_INST => {
                table.load(
                    binary,
                    &mut module.struct_def_instantiations,
                    load_struct_instantiation,
                )?;
                check_table_size(
                    &module.struct_def_instantiations,
                    config.struct_def_instantiations,
                    table.kind,
                )?;
            }
            TableType::FUNCTION_DEFS => {
                table.load(binary, &mut module.function_defs, load_function_def)?;
                check_table_size(&module.function_defs, config.function_defs, table.kind)?;
            }
            TableType::FIELD_HANDLE => {
                table.load(binary, &mut module.field_handles, load_field_handle)?;
                check_table_size(&module.field_handles, config.field_handles, table.kind)?;
            }
            TableType::FIELD_INST => {
                table.load(
                    binary,
                    &mut module.field_instantiations,
                    load_field_instantiation,
                )?;
                check_table_size(
                    &module.field_instantiations,
                    config.field_instantiations,
                    table.kind,
                )?;
            }
            TableType::FRIEND_DECLS => {
                check_table_version(binary, table.kind, features.has_friend_decls())?;
                table.load(binary, &mut module.friend_decls, load_module_handle)?;
                check_table_size(&module.friend_decls, config.friend_decls, table.kind)?;
            }
            TableType::METADATA => {
                check_table_version(binary, table.kind, features.has_metadata())?;
                table.load(binary, &mut module.metadata, load_metadata_entry)?;
            }
            TableType::ENUM_DEFS => {
                check_table_version(binary, table.kind, features.has_enums())?;
                table.load(binary, &mut module.enum_defs, load_enum_def)?;
                check_table_size(&module.enum_defs, config.enum_defs, table.kind)?;
            }
            TableType::ENUM_DEF_INST => {
                check_table_version(binary, table.kind, features.has_enums())?;
                table.load(
                    binary,
                    &mut module.enum_def_instantiations,
                    load_enum_instantiation,
                )?;
                check_table_size(
                    &module.enum_def_instantiations,
                    config.enum_def_instantiations,
                    table.kind,
                )?;
            }
            TableType::VARIANT_HANDLES => {
                check_table_version(binary, table.kind, features.has_enums())?;
                table.load(binary, &mut module.variant_handles, load_variant_handle)?;
                check_table_size(&module.variant_handles, config.variant_handles, table.kind)?;
            }
            TableType::VARIANT_INST_HANDLES => {
                check_table_version(binary, table.kind, features.has_enums())?;
                table.load(
                    binary,
                    &mut module.variant_instantiation_handles,
                    load_variant_instantiation_handle,
                )?;
                check_table_size(
                    &module.variant_instantiation_handles,
                    config.variant_instantiation_handles,
                    table.kind,
                )?;
            }
        }
    }
    Ok(())
}

/// Builds the `ModuleHandle` table.
fn load_module_handle(cursor: &mut VersionedCursor) -> BinaryLoaderResult<ModuleHandle> {
    let address = load_address_identifier_index(cursor)?;
    let name = load_identifier_index(cursor)?;
    Ok(ModuleHandle { address, name })
}

/// Builds the `DatatypeHandle` table.
fn load_datatype_handle(cursor: &mut VersionedCursor) -> BinaryLoaderResult<DatatypeHandle> {
    let module = load_module_handle_index(cursor)?;
    let name = load_identifier_index(cursor)?;
    let abilities = load_ability_set(cursor, AbilitySetPosition::DatatypeHandle)?;
    let type_parameters = load_datatype_type_parameters(cursor)?;
    Ok(DatatypeHandle {
        module,
        name,
        abilities,
        type_parameters,
    })
}

/// Builds the `FunctionHandle` table.
fn load_function_handle(cursor: &mut VersionedCursor) -> BinaryLoaderResult<FunctionHandle> {
    let module = load_module_handle_index(cursor)?;
    let name = load_identifier_index(cursor)?;
    let parameters = load_signature_index(cursor)?;
    let return_ = load_signature_index(cursor)?;
    let type_parameters = load_ability_sets(cursor, AbilitySetPosition::FunctionTypeParameters)?;
    Ok(FunctionHandle {
        module,
        name,
        parameters,
        return_,
        type_parameters,
    })
}

/// Builds the `StructInstantiation` table.
fn load_struct_instantiation(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<StructDefInstantiation> {
    let def = load_struct_def_index(cursor)?;
    let type_parameters = load_signature_index(cursor)?;
    Ok(StructDefInstantiation {
        def,
        type_parameters,
    })
}

/// Builds the `EnumInstantiation` table.
fn load_enum_instantiation(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<EnumDefInstantiation> {
    let def = load_enum_def_index(cursor)?;
    let type_parameters = load_signature_index(cursor)?;
    Ok(EnumDefInstantiation {
        def,
        type_parameters,
    })
}

/// Builds the `FunctionInstantiation` table.
fn load_function_instantiation(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<FunctionInstantiation> {
    let handle = load_function_handle_index(cursor)?;
    let type_parameters = load_signature_index(cursor)?;
    Ok(FunctionInstantiation {
        handle,
        type_parameters,
    })
}

/// Builds the `IdentifierPool`.
fn load_identifier(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Identifier> {
    let size = load_identifier_size(cursor)?;
    let mut buffer: Vec<u8> = vec![0u8; size];
    cursor.read_exact(&mut buffer).map_err(|_| {
        PartialVMError::new(StatusCode::MALFORMED)
            .with_message("Bad Identifier pool size".to_string())
    })?;
    let ident = String::from_utf8(buffer)
        .ok()
        .and_then(|s| Identifier::new(s).ok())
        .ok_or_else(|| {
            PartialVMError::new(StatusCode::MALFORMED)
                .with_message("Invalid Identifier".to_string())
        })?;
    Ok(ident)
}

/// Builds the `AddressIdentifierPool`.
fn load_address_identifier(cursor: &mut VersionedCursor) -> BinaryLoaderResult<AccountAddress> {
    let mut buffer: [u8; AccountAddress::LENGTH] = [0u8; AccountAddress::LENGTH];
    cursor.read_exact(&mut buffer).map_err(|_| {
        PartialVMError::new(StatusCode::MALFORMED)
            .with_message("Bad Address pool size".to_string())
    })?;
    Ok(AccountAddress::new(buffer))
}

/// Builds the `ConstantPool`.
fn load_constant(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Constant> {
    let type_ = load_signature_token(cursor)?;
    let data = load_byte_blob(cursor, load_constant_size)?;
    Ok(Constant { type_, data })
}

/// Builds a metadata vector.
fn load_metadata_entry(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Metadata> {
    let key = load_byte_blob(cursor, load_metadata_key_size)?;
    let value = load_byte_blob(cursor, load_metadata_value_size)?;
    Ok(Metadata { key, value })
}

/// Helper to load a byte blob with specific size loader.
fn load_byte_blob(
    cursor: &mut VersionedCursor,
    size_loader: impl Fn(&mut VersionedCursor) -> BinaryLoaderResult<usize>,
) -> BinaryLoaderResult<Vec<u8>> {
    let size = size_loader(cursor)?;
    let mut data: Vec<u8> = vec![0u8; size];
    cursor.read_exact(&mut data).map_err(|_| {
        PartialVMError::new(StatusCode::MALFORMED)
            .with_message("Unexpected end of table".to_string())
    })?;
    Ok(data)
}

/// Builds a signature for the `SignaturePool`.
fn load_signature(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Signature> {
    Ok(Signature(load_signature_tokens(cursor)?))
}

fn load_signature_tokens(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Vec<SignatureToken>> {
    let len = load_signature_size(cursor)?;
    let mut tokens = vec![];
    for _ in 0..len {
        tokens.push(load_signature_token(cursor)?);
    }
    Ok(tokens)
}

/// Deserializes a single `SignatureToken` from `bytes` as if it were part of a binary of the
/// given version.
#[cfg(test)]
pub(crate) fn load_signature_token_test_entry(
    bytes: &[u8],
    version: u32,
) -> BinaryLoaderResult<SignatureToken> {
    load_signature_token(&mut VersionedCursor::new(version, bytes))
}

/// Deserializes a `SignatureToken`.
fn load_signature_token(cursor: &mut VersionedCursor) -> BinaryLoaderResult<SignatureToken> {
    // The following algorithm works by storing partially constructed types on a stack.
    //
    // Example:
    //
    //     SignatureToken: `Foo<u8, Foo<u64, bool, Bar>, address>`
    //     Byte Stream:    Foo u8 Foo u64 bool Bar address
    //
    // Stack Transitions:
    //     []
    //     [Foo<?, ?, ?>]
    //     [Foo<?, ?, ?>, u8]
    //     [Foo<u8, ?, ?>]
    //     [Foo<u8, ?, ?>, Foo<?, ?, ?>]
    //     [Foo<u8, ?, ?>, Foo<?, ?, ?>, u64]
    //     [Foo<u8, ?, ?>, Foo<u64, ?, ?>]
    //     [Foo<u8, ?, ?>, Foo<u64, ?, ?>, bool]
    //     [Foo<u8, ?, ?>, Foo<u64, bool, ?>]
    //     [Foo<u8, ?, ?>, Foo<u64, bool, ?>, Bar]
    //     [Foo<u8, ?, ?>, Foo<u64, bool, Bar>]
    //     [Foo<u8, Foo<u64, bool, Bar>, ?>]
    //     [Foo<u8, Foo<u64, bool, Bar>, ?>, address]
    //     [Foo<u8, Foo<u64, bool, Bar>, address>]        (done)

    use SerializedType as S;

    enum TypeBuilder {
        Saturated(SignatureToken),
        Vector,
        Reference,
        MutableReference,
        DatatypeInst {
            dt_idx: DatatypeHandleIndex,
            arity: usize,
            ty_args: Vec<SignatureToken>,
        },
    }

    impl TypeBuilder {
        fn apply(self, tok: SignatureToken) -> Self {
            match self {
                T::Vector => T::Saturated(SignatureToken::Vector(Box::new(tok))),
                T::Reference => T::Saturated(SignatureToken::Reference(Box::new(tok))),
                T::MutableReference => {
                    T::Saturated(SignatureToken::MutableReference(Box::new(tok)))
                }
                T::DatatypeInst {
                    dt_idx,
                    arity,
                    mut ty_args,
                } => {
                    ty_args.push(tok);
                    if ty_args.len() >= arity {
                        T::Saturated(SignatureToken::DatatypeInstantiation(Box::new((
                            dt_idx, ty_args,
                        ))))
                    } else {
                        T::DatatypeInst {
                            dt_idx,
                            arity,
                            ty_args,
                        }
                    }
                }
                T::Saturated(_) => unreachable!("invalid type constructor application"),
            }
        }

        fn is_saturated(&self) -> bool {
            matches!(self, T::Saturated(_))
        }
    }

    use TypeBuilder as T;

    let mut read_next = || {
        if let Ok(byte) = cursor.read_u8() {
            let ser_type = S::from_u8(byte)?;
            match ser_type {
                S::U16 | S::U32 | S::U256 if !cursor.features().has_wide_integers() => {
                    return Err(
                        PartialVMError::new(StatusCode::MALFORMED).with_message(format!(
                            "u16, u32, u256 integers not supported in bytecode version {}",
                            cursor.version()
                        )),
                    );
                }
                _ => (),
            };

            Ok(match ser_type {
                S::BOOL => T::Saturated(SignatureToken::Bool),
                S::U8 => T::Saturated(SignatureToken::U8),
                S::U16 => T::Saturated(SignatureToken::U16),
                S::U32 => T::Saturated(SignatureToken::U32),
                S::U64 => T::Saturated(SignatureToken::U64),
                S::U128 => T::Saturated(SignatureToken::U128),
                S::U256 => T::Saturated(SignatureToken::U256),
                S::ADDRESS => T::Saturated(SignatureToken::Address),
                S::SIGNER => T::Saturated(SignatureToken::Signer),
                S::VECTOR => T::Vector,
                S::REFERENCE => T::Reference,
                S::MUTABLE_REFERENCE => T::MutableReference,
                S::DATATYPE => {
                    let dt_idx = load_datatype_handle_index(cursor)?;
                    T::Saturated(SignatureToken::Datatype(dt_idx))
                }
                S::DATATYPE_INST => {
                    let dt_idx = load_datatype_handle_index(cursor)?;
                    let arity = load_type_parameter_count(cursor)?;
                    if arity == 0 {
                        return Err(PartialVMError::new(StatusCode::MALFORMED)
                            .with_message("Datatype inst with arity 0".to_string()));
                    }
                    T::DatatypeInst {
                        dt_idx,
                        arity,
                        ty_args: vec![],
                    }
                }
                S::TYPE_PARAMETER => {
                    let idx = load_type_parameter_index(cursor)?;
                    T::Saturated(SignatureToken::TypeParameter(idx))
                }
            })
        } else {
            Err(PartialVMError::new(StatusCode::MALFORMED)
                .with_message("Unexpected EOF".to_string()))
        }
    };

    let mut stack = match read_next()? {
        T::Saturated(tok) => return Ok(tok),
        t => vec![t],
    };

    loop {
        if stack.len() > SIGNATURE_TOKEN_DEPTH_MAX {
            return Err(PartialVMError::new(StatusCode::SIGNATURE_DEPTH_EXCEEDED)
                .with_message("Maximum recursion depth reached".to_string()));
        }
        match stack.pop() {
            Some(T::Saturated(tok)) => match stack.pop() {
                Some(t) => stack.push(t.apply(tok)),
                None => return Ok(tok),
            },
            Some(t) => {
                debug_assert!(!t.is_saturated());
                stack.push(t);
                stack.push(read_next()?)
            }
            None => unreachable!("signature token stack is never empty here"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum AbilitySetPosition {
    FunctionTypeParameters,
    DatatypeTyParameters,
    DatatypeHandle,
}

fn load_ability_set(
    cursor: &mut VersionedCursor,
    pos: AbilitySetPosition,
) -> BinaryLoaderResult<AbilitySet> {
    // If the module was on the old kind system:
    // - For datatype declarations
    //   - resource kind types become store+key types
    //   - copyable kind types become store+copy+drop types
    // - For function type parameter constraints
    //   - all kind becomes store, since it might be used in global storage
    //   - resource kind becomes store+key
    //   - copyable kind becomes store+copy+drop
    // - For datatype type parameter constraints
    //   - all kind becomes empty
    //   - resource kind becomes key
    //   - copyable kind becomes copy+drop
    if cursor.features().legacy_ability_kinds() {
        let byte = load_u8(cursor)?;
        match pos {
            AbilitySetPosition::DatatypeHandle => {
                Ok(match DeprecatedNominalResourceFlag::from_u8(byte)? {
                    DeprecatedNominalResourceFlag::NOMINAL_RESOURCE => {
                        AbilitySet::EMPTY | Ability::Store | Ability::Key
                    }
                    DeprecatedNominalResourceFlag::NORMAL_STRUCT => {
                        AbilitySet::EMPTY | Ability::Store | Ability::Copy | Ability::Drop
                    }
                })
            }
            AbilitySetPosition::FunctionTypeParameters
            | AbilitySetPosition::DatatypeTyParameters => {
                let set = match DeprecatedKind::from_u8(byte)? {
                    DeprecatedKind::ALL => AbilitySet::EMPTY,
                    DeprecatedKind::COPYABLE => AbilitySet::EMPTY | Ability::Copy | Ability::Drop,
                    DeprecatedKind::RESOURCE => AbilitySet::EMPTY | Ability::Key,
                };
                Ok(match pos {
                    AbilitySetPosition::FunctionTypeParameters => set | Ability::Store,
                    _ => set,
                })
            }
        }
    } else {
        // The uleb here doesn't really do anything as it is bounded currently to 0xF, but the
        // if we get many more constraints in the future, uleb will be helpful.
        let u = read_uleb_internal(cursor, AbilitySet::ALL.into_u8() as u64).map_err(|e| {
            if e.major_status() == StatusCode::MALFORMED {
                PartialVMError::new(StatusCode::UNKNOWN_ABILITY)
            } else {
                e
            }
        })?;
        match AbilitySet::from_u8(u) {
            Some(abilities) => Ok(abilities),
            None => Err(PartialVMError::new(StatusCode::UNKNOWN_ABILITY)),
        }
    }
}

/// Reads a single ability set at `pos`, as stored in a binary of the given version.
#[cfg(test)]
pub(crate) fn load_ability_set_test_entry(
    bytes: &[u8],
    version: u32,
    pos: AbilitySetPosition,
) -> BinaryLoaderResult<AbilitySet> {
    load_ability_set(&mut VersionedCursor::new(version, bytes), pos)
}

fn load_ability_sets(
    cursor: &mut VersionedCursor,
    pos: AbilitySetPosition,
) -> BinaryLoaderResult<Vec<AbilitySet>> {
    let len = load_type_parameter_count(cursor)?;
    let mut kinds = vec![];
    for _ in 0..len {
        kinds.push(load_ability_set(cursor, pos)?);
    }
    Ok(kinds)
}

fn load_datatype_type_parameters(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<Vec<DatatypeTyParameter>> {
    let len = load_type_parameter_count(cursor)?;
    let mut type_params = Vec::with_capacity(len);
    for _ in 0..len {
        type_params.push(load_datatype_type_parameter(cursor)?);
    }
    Ok(type_params)
}

fn load_datatype_type_parameter(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<DatatypeTyParameter> {
    let constraints = load_ability_set(cursor, AbilitySetPosition::DatatypeTyParameters)?;
    let is_phantom = if cursor.features().has_phantom_flags() {
        let byte: u8 = read_uleb_internal(cursor, 1)?;
        byte != 0
    } else {
        false
    };
    Ok(DatatypeTyParameter {
        constraints,
        is_phantom,
    })
}

/// Builds a `StructDefinition`.
fn load_struct_def(cursor: &mut VersionedCursor) -> BinaryLoaderResult<StructDefinition> {
    let struct_handle = load_datatype_handle_index(cursor)?;
    let field_information_flag = match cursor.read_u8() {
        Ok(byte) => SerializedNativeStructFlag::from_u8(byte)?,
        Err(_) => {
            return Err(PartialVMError::new(StatusCode::MALFORMED)
                .with_message("Invalid field info in struct".to_string()))
        }
    };
    let field_information = match field_information_flag {
        SerializedNativeStructFlag::NATIVE => StructFieldInformation::Native,
        SerializedNativeStructFlag::DECLARED => {
            let fields = load_field_defs(cursor)?;
            StructFieldInformation::Declared(fields)
        }
    };
    Ok(StructDefinition {
        struct_handle,
        field_information,
    })
}

/// Builds an `EnumDefinition`.
fn load_enum_def(cursor: &mut VersionedCursor) -> BinaryLoaderResult<EnumDefinition> {
    let enum_handle = load_datatype_handle_index(cursor)?;
    SerializedEnumFlag::from_u8(load_u8(cursor)?)?;
    let variants = load_variants(cursor)?;
    Ok(EnumDefinition {
        enum_handle,
        variants,
    })
}

fn load_variants(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Vec<VariantDefinition>> {
    let variant_count = load_variant_count(cursor)?;
    let mut variants = Vec::new();
    for _ in 0..variant_count {
        variants.push(load_variant(cursor)?);
    }
    Ok(variants)
}

fn load_variant(cursor: &mut VersionedCursor) -> BinaryLoaderResult<VariantDefinition> {
    let variant_name = load_identifier_index(cursor)?;
    let fields = load_field_defs(cursor)?;
    Ok(VariantDefinition {
        variant_name,
        fields,
    })
}

fn load_field_defs(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Vec<FieldDefinition>> {
    let mut fields = Vec::new();
    let field_count = load_field_count(cursor)?;
    for _ in 0..field_count {
        fields.push(load_field_def(cursor)?);
    }
    Ok(fields)
}

fn load_field_def(cursor: &mut VersionedCursor) -> BinaryLoaderResult<FieldDefinition> {
    let name = load_identifier_index(cursor)?;
    let signature = load_signature_token(cursor)?;
    Ok(FieldDefinition {
        name,
        signature: TypeSignature(signature),
    })
}

fn load_field_handle(cursor: &mut VersionedCursor) -> BinaryLoaderResult<FieldHandle> {
    let struct_idx = load_struct_def_index(cursor)?;
    let offset = load_field_offset(cursor)?;
    Ok(FieldHandle {
        owner: struct_idx,
        field: offset,
    })
}

fn load_field_instantiation(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<FieldInstantiation> {
    let handle = load_field_handle_index(cursor)?;
    let type_parameters = load_signature_index(cursor)?;
    Ok(FieldInstantiation {
        handle,
        type_parameters,
    })
}

fn load_variant_handle(cursor: &mut VersionedCursor) -> BinaryLoaderResult<VariantHandle> {
    let enum_def = load_enum_def_index(cursor)?;
    let variant = load_variant_tag(cursor)?;
    Ok(VariantHandle { enum_def, variant })
}

fn load_variant_instantiation_handle(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<VariantInstantiationHandle> {
    let enum_def = load_enum_def_inst_index(cursor)?;
    let variant = load_variant_tag(cursor)?;
    Ok(VariantInstantiationHandle { enum_def, variant })
}

/// Deserializes a `FunctionDefinition`.
fn load_function_def(cursor: &mut VersionedCursor) -> BinaryLoaderResult<FunctionDefinition> {
    let function = load_function_handle_index(cursor)?;

    let mut flags = load_u8(cursor)?;

    // NOTE: changes compared with VERSION_1
    // - in VERSION_1: the flags is a byte compositing both the visibility info and whether
    //                 the function is a native function
    // - in VERSION_2 onwards: the flags only represent the visibility info and we need to
    //                 advance the cursor to read up the next byte as flags
    // - in VERSION_5 onwards: script visibility has been deprecated for an entry function flag
    let features = cursor.features();
    let (visibility, is_entry, mut extra_flags) = if features.has_single_flags_byte() {
        let vis = if (flags & FunctionDefinition::DEPRECATED_PUBLIC_BIT) != 0 {
            flags ^= FunctionDefinition::DEPRECATED_PUBLIC_BIT;
            Visibility::Public
        } else {
            Visibility::Private
        };
        (vis, false, flags)
    } else if !features.has_entry_bit() {
        let (vis, is_entry) = if flags == Visibility::DEPRECATED_SCRIPT {
            (Visibility::Public, true)
        } else {
            let vis = flags.try_into().map_err(|_| {
                PartialVMError::new(StatusCode::MALFORMED)
                    .with_message("Invalid visibility byte".to_string())
            })?;
            (vis, false)
        };
        let extra_flags = load_u8(cursor)?;
        (vis, is_entry, extra_flags)
    } else {
        let vis = flags.try_into().map_err(|_| {
            PartialVMError::new(StatusCode::MALFORMED)
                .with_message("Invalid visibility byte".to_string())
        })?;

        let mut extra_flags = load_u8(cursor)?;
        let is_entry = (extra_flags & FunctionDefinition::ENTRY) != 0;
        if is_entry {
            extra_flags ^= FunctionDefinition::ENTRY;
        }
        (vis, is_entry, extra_flags)
    };

    let acquires_global_resources = load_struct_definition_indices(cursor)?;
    let code_unit = if (extra_flags & FunctionDefinition::NATIVE) != 0 {
        extra_flags ^= FunctionDefinition::NATIVE;
        None
    } else {
        Some(load_code_unit(cursor)?)
    };

    // check that the bits unused in the flags are not set, otherwise it might cause some trouble
    // if later we decide to assign meaning to these bits.
    if extra_flags != 0 {
        return Err(PartialVMError::new(StatusCode::INVALID_FLAG_BITS));
    }

    Ok(FunctionDefinition {
        function,
        visibility,
        is_entry,
        acquires_global_resources,
        code: code_unit,
    })
}

/// Deserializes a `Vec<StructDefinitionIndex>`.
fn load_struct_definition_indices(
    cursor: &mut VersionedCursor,
) -> BinaryLoaderResult<Vec<StructDefinitionIndex>> {
    let len = load_acquires_count(cursor)?;
    let mut indices = vec![];
    for _ in 0..len {
        indices.push(load_struct_def_index(cursor)?);
    }
    Ok(indices)
}

/// Deserializes a `CodeUnit`.
fn load_code_unit(cursor: &mut VersionedCursor) -> BinaryLoaderResult<CodeUnit> {
    let locals = load_signature_index(cursor)?;

    let mut code_unit = CodeUnit {
        locals,
        code: vec![],
        jump_tables: vec![],
    };

    load_code(cursor, &mut code_unit.code)?;
    if cursor.features().has_jump_tables() {
        code_unit.jump_tables = load_jump_tables(cursor)?;
    }
    Ok(code_unit)
}

fn load_jump_tables(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Vec<VariantJumpTable>> {
    let count = load_jump_table_count(cursor)?;
    let mut jump_tables = vec![];
    for _ in 0..count {
        jump_tables.push(load_jump_table(cursor)?);
    }
    Ok(jump_tables)
}

fn load_jump_table(cursor: &mut VersionedCursor) -> BinaryLoaderResult<VariantJumpTable> {
    let head_enum = load_enum_def_index(cursor)?;
    let branch_count = load_variant_count(cursor)?;
    // The discriminator byte only has a single encoding today, it is not interpreted.
    let _flag = load_u8(cursor)?;
    let mut offsets = Vec::with_capacity(branch_count as usize);
    for _ in 0..branch_count {
        offsets.push(load_bytecode_index(cursor)?);
    }
    Ok(VariantJumpTable {
        head_enum,
        jump_table: JumpTableInner::Full(offsets),
    })
}

/// Deserializes an instruction stream of `count` bytecodes from `bytes`, as stored in a binary
/// of the given version.
#[cfg(test)]
pub(crate) fn load_code_test_entry(bytes: &[u8], version: u32) -> BinaryLoaderResult<Vec<Bytecode>> {
    let mut code = vec![];
    load_code(&mut VersionedCursor::new(version, bytes), &mut code)?;
    Ok(code)
}

/// Deserializes a code stream (`Bytecode`s). Failures carry the offset of the instruction
/// being decoded.
fn load_code(cursor: &mut VersionedCursor, code: &mut Vec<Bytecode>) -> BinaryLoaderResult<()> {
    let bytecode_count = load_bytecode_count(cursor)?;

    while code.len() < bytecode_count {
        let offset = code.len() as TableIndex;
        let bytecode = load_instruction(cursor)
            .map_err(|err| err.at_index(IndexKind::CodeDefinition, offset))?;
        code.push(bytecode);
    }
    Ok(())
}

fn load_instruction(cursor: &mut VersionedCursor) -> BinaryLoaderResult<Bytecode> {
    let byte = cursor.read_u8().map_err(|_| {
        PartialVMError::new(StatusCode::MALFORMED).with_message("Unexpected EOF".to_string())
    })?;
    let opcode = Opcodes::from_u8(byte)?;
    check_opcode_version(cursor.features(), opcode)?;

    let bytecode = match opcode {
        Opcodes::POP => Bytecode::Pop,
        Opcodes::RET => Bytecode::Ret,
        Opcodes::BR_TRUE => Bytecode::BrTrue(load_bytecode_index(cursor)?),
        Opcodes::BR_FALSE => Bytecode::BrFalse(load_bytecode_index(cursor)?),
        Opcodes::BRANCH => Bytecode::Branch(load_bytecode_index(cursor)?),
        Opcodes::LD_U8 => {
            let value = cursor.read_u8().map_err(|_| {
                PartialVMError::new(StatusCode::MALFORMED)
                    .with_message("Unexpected EOF".to_string())
            })?;
            Bytecode::LdU8(value)
        }
        Opcodes::LD_U16 => Bytecode::LdU16(read_u16_internal(cursor)?),
        Opcodes::LD_U32 => Bytecode::LdU32(read_u32_internal(cursor)?),
        Opcodes::LD_U64 => Bytecode::LdU64(read_u64_internal(cursor)?),
        Opcodes::LD_U128 => Bytecode::LdU128(Box::new(read_u128_internal(cursor)?)),
        Opcodes::LD_U256 => Bytecode::LdU256(Box::new(read_u256_internal(cursor)?)),
        Opcodes::CAST_U8 => Bytecode::CastU8,
        Opcodes::CAST_U16 => Bytecode::CastU16,
        Opcodes::CAST_U32 => Bytecode::CastU32,
        Opcodes::CAST_U64 => Bytecode::CastU64,
        Opcodes::CAST_U128 => Bytecode::CastU128,
        Opcodes::CAST_U256 => Bytecode::CastU256,
        Opcodes::LD_CONST => Bytecode::LdConst(load_constant_pool_index(cursor)?),
        Opcodes::LD_TRUE => Bytecode::LdTrue,
        Opcodes::LD_FALSE => Bytecode::LdFalse,
        Opcodes::COPY_LOC => Bytecode::CopyLoc(load_local_index(cursor)?),
        Opcodes::MOVE_LOC => Bytecode::MoveLoc(load_local_index(cursor)?),
        Opcodes::ST_LOC => Bytecode::StLoc(load_local_index(cursor)?),
        Opcodes::MUT_BORROW_LOC => Bytecode::MutBorrowLoc(load_local_index(cursor)?),
        Opcodes::IMM_BORROW_LOC => Bytecode::ImmBorrowLoc(load_local_index(cursor)?),
        Opcodes::MUT_BORROW_FIELD => Bytecode::MutBorrowField(load_field_handle_index(cursor)?),
        Opcodes::MUT_BORROW_FIELD_GENERIC => {
            Bytecode::MutBorrowFieldGeneric(load_field_inst_index(cursor)?)
        }
        Opcodes::IMM_BORROW_FIELD => Bytecode::ImmBorrowField(load_field_handle_index(cursor)?),
        Opcodes::IMM_BORROW_FIELD_GENERIC => {
            Bytecode::ImmBorrowFieldGeneric(load_field_inst_index(cursor)?)
        }
        Opcodes::CALL => Bytecode::Call(load_function_handle_index(cursor)?),
        Opcodes::CALL_GENERIC => Bytecode::CallGeneric(load_function_inst_index(cursor)?),
        Opcodes::PACK => Bytecode::Pack(load_struct_def_index(cursor)?),
        Opcodes::PACK_GENERIC => Bytecode::PackGeneric(load_struct_def_inst_index(cursor)?),
        Opcodes::UNPACK => Bytecode::Unpack(load_struct_def_index(cursor)?),
        Opcodes::UNPACK_GENERIC => Bytecode::UnpackGeneric(load_struct_def_inst_index(cursor)?),
        Opcodes::READ_REF => Bytecode::ReadRef,
        Opcodes::WRITE_REF => Bytecode::WriteRef,
        Opcodes::ADD => Bytecode::Add,
        Opcodes::SUB => Bytecode::Sub,
        Opcodes::MUL => Bytecode::Mul,
        Opcodes::MOD => Bytecode::Mod,
        Opcodes::DIV => Bytecode::Div,
        Opcodes::BIT_OR => Bytecode::BitOr,
        Opcodes::BIT_AND => Bytecode::BitAnd,
        Opcodes::XOR => Bytecode::Xor,
        Opcodes::SHL => Bytecode::Shl,
        Opcodes::SHR => Bytecode::Shr,
        Opcodes::OR => Bytecode::Or,
        Opcodes::AND => Bytecode::And,
        Opcodes::NOT => Bytecode::Not,
        Opcodes::EQ => Bytecode::Eq,
        Opcodes::NEQ => Bytecode::Neq,
        Opcodes::LT => Bytecode::Lt,
        Opcodes::GT => Bytecode::Gt,
        Opcodes::LE => Bytecode::Le,
        Opcodes::GE => Bytecode::Ge,
        Opcodes::ABORT => Bytecode::Abort,
        Opcodes::NOP => Bytecode::Nop,
        Opcodes::FREEZE_REF => Bytecode::FreezeRef,
        Opcodes::VEC_PACK => Bytecode::VecPack(
            load_signature_index(cursor)?,
            load_vector_length(cursor)?,
        ),
        Opcodes::VEC_LEN => Bytecode::VecLen(load_signature_index(cursor)?),
        Opcodes::VEC_IMM_BORROW => Bytecode::VecImmBorrow(load_signature_index(cursor)?),
        Opcodes::VEC_MUT_BORROW => Bytecode::VecMutBorrow(load_signature_index(cursor)?),
        Opcodes::VEC_PUSH_BACK => Bytecode::VecPushBack(load_signature_index(cursor)?),
        Opcodes::VEC_POP_BACK => Bytecode::VecPopBack(load_signature_index(cursor)?),
        Opcodes::VEC_UNPACK => Bytecode::VecUnpack(
            load_signature_index(cursor)?,
            load_vector_length(cursor)?,
        ),
        Opcodes::VEC_SWAP => Bytecode::VecSwap(load_signature_index(cursor)?),
        Opcodes::PACK_VARIANT => Bytecode::PackVariant(load_variant_handle_index(cursor)?),
        Opcodes::PACK_VARIANT_GENERIC => {
            Bytecode::PackVariantGeneric(load_variant_inst_handle_index(cursor)?)
        }
        Opcodes::UNPACK_VARIANT => Bytecode::UnpackVariant(load_variant_handle_index(cursor)?),
        Opcodes::UNPACK_VARIANT_IMM_REF => {
            Bytecode::UnpackVariantImmRef(load_variant_handle_index(cursor)?)
        }
        Opcodes::UNPACK_VARIANT_MUT_REF => {
            Bytecode::UnpackVariantMutRef(load_variant_handle_index(cursor)?)
        }
        Opcodes::UNPACK_VARIANT_GENERIC => {
            Bytecode::UnpackVariantGeneric(load_variant_inst_handle_index(cursor)?)
        }
        Opcodes::UNPACK_VARIANT_GENERIC_IMM_REF => {
            Bytecode::UnpackVariantGenericImmRef(load_variant_inst_handle_index(cursor)?)
        }
        Opcodes::UNPACK_VARIANT_GENERIC_MUT_REF => {
            Bytecode::UnpackVariantGenericMutRef(load_variant_inst_handle_index(cursor)?)
        }
        Opcodes::VARIANT_SWITCH => {
            Bytecode::VariantSwitch(load_variant_jump_table_index(cursor)?)
        }
        Opcodes::EXISTS_DEPRECATED => Bytecode::ExistsDeprecated(load_struct_def_index(cursor)?),
        Opcodes::EXISTS_GENERIC_DEPRECATED => {
            Bytecode::ExistsGenericDeprecated(load_struct_def_inst_index(cursor)?)
        }
        Opcodes::MUT_BORROW_GLOBAL_DEPRECATED => {
            Bytecode::MutBorrowGlobalDeprecated(load_struct_def_index(cursor)?)
        }
        Opcodes::MUT_BORROW_GLOBAL_GENERIC_DEPRECATED => {
            Bytecode::MutBorrowGlobalGenericDeprecated(load_struct_def_inst_index(cursor)?)
        }
        Opcodes::IMM_BORROW_GLOBAL_DEPRECATED => {
            Bytecode::ImmBorrowGlobalDeprecated(load_struct_def_index(cursor)?)
        }
        Opcodes::IMM_BORROW_GLOBAL_GENERIC_DEPRECATED => {
            Bytecode::ImmBorrowGlobalGenericDeprecated(load_struct_def_inst_index(cursor)?)
        }
        Opcodes::MOVE_FROM_DEPRECATED => {
            Bytecode::MoveFromDeprecated(load_struct_def_index(cursor)?)
        }
        Opcodes::MOVE_FROM_GENERIC_DEPRECATED => {
            Bytecode::MoveFromGenericDeprecated(load_struct_def_inst_index(cursor)?)
        }
        Opcodes::MOVE_TO_DEPRECATED => Bytecode::MoveToDeprecated(load_struct_def_index(cursor)?),
        Opcodes::MOVE_TO_GENERIC_DEPRECATED => {
            Bytecode::MoveToGenericDeprecated(load_struct_def_inst_index(cursor)?)
        }
    };
    Ok(bytecode)
}

fn check_opcode_version(features: VersionFeatures, opcode: Opcodes) -> BinaryLoaderResult<()> {
    use Opcodes as O;
    let (available, introduced_in) = match opcode {
        O::VEC_PACK
        | O::VEC_LEN
        | O::VEC_IMM_BORROW
        | O::VEC_MUT_BORROW
        | O::VEC_PUSH_BACK
        | O::VEC_POP_BACK
        | O::VEC_UNPACK
        | O::VEC_SWAP => (features.has_vector_ops(), VERSION_4),
        O::LD_U16 | O::LD_U32 | O::LD_U256 | O::CAST_U16 | O::CAST_U32 | O::CAST_U256 => {
            (features.has_wide_integers(), VERSION_6)
        }
        O::PACK_VARIANT
        | O::PACK_VARIANT_GENERIC
        | O::UNPACK_VARIANT
        | O::UNPACK_VARIANT_IMM_REF
        | O::UNPACK_VARIANT_MUT_REF
        | O::UNPACK_VARIANT_GENERIC
        | O::UNPACK_VARIANT_GENERIC_IMM_REF
        | O::UNPACK_VARIANT_GENERIC_MUT_REF
        | O::VARIANT_SWITCH => (features.has_enums(), VERSION_7),
        _ => (true, VERSION_1),
    };
    if !available {
        return Err(
            PartialVMError::new(StatusCode::MALFORMED).with_message(format!(
                "{:?} not available before bytecode version {}",
                opcode, introduced_in
            )),
        );
    }
    Ok(())
}
