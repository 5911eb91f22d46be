// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! Serialization of transactions and modules.
//!
//! This module exposes a single entry point, `CompiledModule::serialize`. Tables are laid out
//! in ascending `TableType` order and empty tables are left out of the directory, so equal
//! modules always produce identical bytes.

use crate::{
    account_address::AccountAddress, compiled_module::CompiledModule,
    deserializer::AbilitySetPosition, file_format::*, file_format_common::*,
    identifier::Identifier, ModuleIndex,
};
use tracing::debug;

impl CompiledModule {
    /// Serializes a `CompiledModule` into a binary.
    ///
    /// Content that cannot be expressed at `self.version` is written in the closest form the
    /// version allows.
    pub fn serialize(&self) -> Vec<u8> {
        let mut ser = ModuleSerializer::new(self.version);
        let mut table_data: Vec<u8> = Vec::new();
        ser.serialize_tables(&mut table_data, self);

        let mut binary: Vec<u8> = Vec::with_capacity(table_data.len() + 64);
        ser.serialize_header(&mut binary, self.publishable);
        binary.extend_from_slice(&table_data);
        write_u64_as_uleb128(&mut binary, self.self_module_handle_idx.into_index() as u64);

        debug!(
            version = self.version,
            tables = ser.tables.len(),
            bytes = binary.len(),
            "serialized module"
        );
        binary
    }
}

/// Holds the directory of a module being serialized: one entry per non-empty table, recorded
/// as `(kind, offset, byte count)` relative to the start of the table region.
struct ModuleSerializer {
    features: VersionFeatures,
    tables: Vec<(TableType, u32, u32)>,
}

impl ModuleSerializer {
    fn new(version: u32) -> Self {
        Self {
            features: VersionFeatures::new(version),
            tables: vec![],
        }
    }

    fn serialize_header(&self, binary: &mut Vec<u8>, publishable: bool) {
        if publishable {
            binary.extend_from_slice(&BinaryConstants::MOVE_MAGIC);
        } else {
            binary.extend_from_slice(&BinaryConstants::UNPUBLISHABLE_MAGIC);
        }
        write_u32(binary, BinaryFlavor::encode_version(self.features.version()));
        write_u64_as_uleb128(binary, self.tables.len() as u64);
        for (kind, offset, count) in &self.tables {
            binary.push(*kind as u8);
            write_u64_as_uleb128(binary, *offset as u64);
            write_u64_as_uleb128(binary, *count as u64);
        }
    }

    fn serialize_tables(&mut self, binary: &mut Vec<u8>, module: &CompiledModule) {
        let f = self.features;
        for kind in TableType::ALL {
            let start = binary.len();
            match kind {
                TableType::MODULE_HANDLES => {
                    serialize_table(binary, &module.module_handles, f, serialize_module_handle)
                }
                TableType::DATATYPE_HANDLES => {
                    serialize_table(binary, &module.datatype_handles, f, serialize_datatype_handle)
                }
                TableType::FUNCTION_HANDLES => {
                    serialize_table(binary, &module.function_handles, f, serialize_function_handle)
                }
                TableType::FUNCTION_INST => serialize_table(
                    binary,
                    &module.function_instantiations,
                    f,
                    serialize_function_instantiation,
                ),
                TableType::SIGNATURES => {
                    serialize_table(binary, &module.signatures, f, serialize_signature)
                }
                TableType::CONSTANT_POOL => {
                    serialize_table(binary, &module.constant_pool, f, serialize_constant)
                }
                TableType::IDENTIFIERS => {
                    serialize_table(binary, &module.identifiers, f, serialize_identifier)
                }
                TableType::ADDRESS_IDENTIFIERS => serialize_table(
                    binary,
                    &module.address_identifiers,
                    f,
                    serialize_address,
                ),
                TableType::STRUCT_DEFS => {
                    serialize_table(binary, &module.struct_defs, f, serialize_struct_definition)
                }
                TableType::STRUCT_DEF_INST => serialize_table(
                    binary,
                    &module.struct_def_instantiations,
                    f,
                    serialize_struct_def_instantiation,
                ),
                TableType::FUNCTION_DEFS => {
                    serialize_table(binary, &module.function_defs, f, serialize_function_definition)
                }
                TableType::FIELD_HANDLE => {
                    serialize_table(binary, &module.field_handles, f, serialize_field_handle)
                }
                TableType::FIELD_INST => serialize_table(
                    binary,
                    &module.field_instantiations,
                    f,
                    serialize_field_instantiation,
                ),
                TableType::FRIEND_DECLS => {
                    serialize_table(binary, &module.friend_decls, f, serialize_module_handle)
                }
                TableType::METADATA => {
                    serialize_table(binary, &module.metadata, f, serialize_metadata_entry)
                }
                TableType::ENUM_DEFS => {
                    serialize_table(binary, &module.enum_defs, f, serialize_enum_definition)
                }
                TableType::ENUM_DEF_INST => serialize_table(
                    binary,
                    &module.enum_def_instantiations,
                    f,
                    serialize_enum_def_instantiation,
                ),
                TableType::VARIANT_HANDLES => {
                    serialize_table(binary, &module.variant_handles, f, serialize_variant_handle)
                }
                TableType::VARIANT_INST_HANDLES => serialize_table(
                    binary,
                    &module.variant_instantiation_handles,
                    f,
                    serialize_variant_instantiation_handle,
                ),
            }
            let count = binary.len() - start;
            if count > 0 {
                self.tables.push((kind, start as u32, count as u32));
            }
        }
    }
}

fn serialize_table<T>(
    binary: &mut Vec<u8>,
    table: &[T],
    features: VersionFeatures,
    serializer: impl Fn(&mut Vec<u8>, &T, VersionFeatures),
) {
    for entry in table {
        serializer(binary, entry, features);
    }
}

fn write_index<I: ModuleIndex>(binary: &mut Vec<u8>, idx: I) {
    write_u64_as_uleb128(binary, idx.into_index() as u64);
}

fn serialize_module_handle(binary: &mut Vec<u8>, module_handle: &ModuleHandle, _: VersionFeatures) {
    write_index(binary, module_handle.address);
    write_index(binary, module_handle.name);
}

fn serialize_datatype_handle(
    binary: &mut Vec<u8>,
    datatype_handle: &DatatypeHandle,
    features: VersionFeatures,
) {
    write_index(binary, datatype_handle.module);
    write_index(binary, datatype_handle.name);
    serialize_ability_set(
        binary,
        datatype_handle.abilities,
        AbilitySetPosition::DatatypeHandle,
        features,
    );
    write_u64_as_uleb128(binary, datatype_handle.type_parameters.len() as u64);
    for type_param in &datatype_handle.type_parameters {
        serialize_ability_set(
            binary,
            type_param.constraints,
            AbilitySetPosition::DatatypeTyParameters,
            features,
        );
        if features.has_phantom_flags() {
            write_u64_as_uleb128(binary, type_param.is_phantom as u64);
        }
    }
}

fn serialize_function_handle(
    binary: &mut Vec<u8>,
    function_handle: &FunctionHandle,
    features: VersionFeatures,
) {
    write_index(binary, function_handle.module);
    write_index(binary, function_handle.name);
    write_index(binary, function_handle.parameters);
    write_index(binary, function_handle.return_);
    write_u64_as_uleb128(binary, function_handle.type_parameters.len() as u64);
    for abilities in &function_handle.type_parameters {
        serialize_ability_set(
            binary,
            *abilities,
            AbilitySetPosition::FunctionTypeParameters,
            features,
        );
    }
}

fn serialize_function_instantiation(
    binary: &mut Vec<u8>,
    func_inst: &FunctionInstantiation,
    _: VersionFeatures,
) {
    write_index(binary, func_inst.handle);
    write_index(binary, func_inst.type_parameters);
}

fn serialize_struct_def_instantiation(
    binary: &mut Vec<u8>,
    struct_inst: &StructDefInstantiation,
    _: VersionFeatures,
) {
    write_index(binary, struct_inst.def);
    write_index(binary, struct_inst.type_parameters);
}

fn serialize_enum_def_instantiation(
    binary: &mut Vec<u8>,
    enum_inst: &EnumDefInstantiation,
    _: VersionFeatures,
) {
    write_index(binary, enum_inst.def);
    write_index(binary, enum_inst.type_parameters);
}

fn serialize_field_handle(binary: &mut Vec<u8>, field_handle: &FieldHandle, _: VersionFeatures) {
    write_index(binary, field_handle.owner);
    write_u64_as_uleb128(binary, field_handle.field as u64);
}

fn serialize_field_instantiation(
    binary: &mut Vec<u8>,
    field_inst: &FieldInstantiation,
    _: VersionFeatures,
) {
    write_index(binary, field_inst.handle);
    write_index(binary, field_inst.type_parameters);
}

fn serialize_variant_handle(binary: &mut Vec<u8>, handle: &VariantHandle, _: VersionFeatures) {
    write_index(binary, handle.enum_def);
    write_u64_as_uleb128(binary, handle.variant as u64);
}

fn serialize_variant_instantiation_handle(
    binary: &mut Vec<u8>,
    handle: &VariantInstantiationHandle,
    _: VersionFeatures,
) {
    write_index(binary, handle.enum_def);
    write_u64_as_uleb128(binary, handle.variant as u64);
}

fn serialize_identifier(binary: &mut Vec<u8>, identifier: &Identifier, _: VersionFeatures) {
    let bytes = identifier.as_str().as_bytes();
    write_u64_as_uleb128(binary, bytes.len() as u64);
    binary.extend_from_slice(bytes);
}

fn serialize_address(binary: &mut Vec<u8>, address: &AccountAddress, _: VersionFeatures) {
    binary.extend_from_slice(address.as_ref());
}

fn serialize_constant(binary: &mut Vec<u8>, constant: &Constant, _: VersionFeatures) {
    serialize_signature_token(binary, &constant.type_);
    serialize_byte_blob(binary, &constant.data);
}

fn serialize_metadata_entry(binary: &mut Vec<u8>, metadata: &Metadata, _: VersionFeatures) {
    serialize_byte_blob(binary, &metadata.key);
    serialize_byte_blob(binary, &metadata.value);
}

fn serialize_byte_blob(binary: &mut Vec<u8>, blob: &[u8]) {
    write_u64_as_uleb128(binary, blob.len() as u64);
    binary.extend_from_slice(blob);
}

fn serialize_signature(binary: &mut Vec<u8>, signature: &Signature, _: VersionFeatures) {
    write_u64_as_uleb128(binary, signature.len() as u64);
    for token in &signature.0 {
        serialize_signature_token(binary, token);
    }
}

/// Serializes a `SignatureToken`.
///
/// The wire form of a type is the preorder walk of its tree, so the tokens are written in the
/// order `preorder_traversal` yields them, without recursing.
pub(crate) fn serialize_signature_token(binary: &mut Vec<u8>, token: &SignatureToken) {
    for token in token.preorder_traversal() {
        serialize_signature_token_single_node_impl(binary, token);
    }
}

fn serialize_signature_token_single_node_impl(binary: &mut Vec<u8>, token: &SignatureToken) {
    match token {
        SignatureToken::Bool => binary.push(SerializedType::BOOL as u8),
        SignatureToken::U8 => binary.push(SerializedType::U8 as u8),
        SignatureToken::U16 => binary.push(SerializedType::U16 as u8),
        SignatureToken::U32 => binary.push(SerializedType::U32 as u8),
        SignatureToken::U64 => binary.push(SerializedType::U64 as u8),
        SignatureToken::U128 => binary.push(SerializedType::U128 as u8),
        SignatureToken::U256 => binary.push(SerializedType::U256 as u8),
        SignatureToken::Address => binary.push(SerializedType::ADDRESS as u8),
        SignatureToken::Signer => binary.push(SerializedType::SIGNER as u8),
        SignatureToken::Vector(_) => binary.push(SerializedType::VECTOR as u8),
        SignatureToken::Datatype(idx) => {
            binary.push(SerializedType::DATATYPE as u8);
            write_index(binary, *idx);
        }
        SignatureToken::DatatypeInstantiation(inst) => {
            let (idx, type_params) = &**inst;
            binary.push(SerializedType::DATATYPE_INST as u8);
            write_index(binary, *idx);
            write_u64_as_uleb128(binary, type_params.len() as u64);
        }
        SignatureToken::Reference(_) => binary.push(SerializedType::REFERENCE as u8),
        SignatureToken::MutableReference(_) => {
            binary.push(SerializedType::MUTABLE_REFERENCE as u8)
        }
        SignatureToken::TypeParameter(idx) => {
            binary.push(SerializedType::TYPE_PARAMETER as u8);
            write_u64_as_uleb128(binary, *idx as u64);
        }
    }
}

fn serialize_ability_set(
    binary: &mut Vec<u8>,
    set: AbilitySet,
    pos: AbilitySetPosition,
    features: VersionFeatures,
) {
    if !features.legacy_ability_kinds() {
        write_u64_as_uleb128(binary, set.into_u8() as u64);
        return;
    }
    // Version 1 only knows kinds, pick the kind that loads back as the closest set.
    let byte = match pos {
        AbilitySetPosition::DatatypeHandle => {
            if set.has_key() {
                DeprecatedNominalResourceFlag::NOMINAL_RESOURCE as u8
            } else {
                DeprecatedNominalResourceFlag::NORMAL_STRUCT as u8
            }
        }
        AbilitySetPosition::FunctionTypeParameters | AbilitySetPosition::DatatypeTyParameters => {
            if set.has_key() {
                DeprecatedKind::RESOURCE as u8
            } else if set.has_copy() {
                DeprecatedKind::COPYABLE as u8
            } else {
                DeprecatedKind::ALL as u8
            }
        }
    };
    binary.push(byte);
}

fn serialize_struct_definition(
    binary: &mut Vec<u8>,
    struct_definition: &StructDefinition,
    _: VersionFeatures,
) {
    write_index(binary, struct_definition.struct_handle);
    match &struct_definition.field_information {
        StructFieldInformation::Native => {
            binary.push(SerializedNativeStructFlag::NATIVE as u8);
        }
        StructFieldInformation::Declared(fields) => {
            binary.push(SerializedNativeStructFlag::DECLARED as u8);
            serialize_field_definitions(binary, fields);
        }
    }
}

fn serialize_enum_definition(
    binary: &mut Vec<u8>,
    enum_definition: &EnumDefinition,
    _: VersionFeatures,
) {
    write_index(binary, enum_definition.enum_handle);
    binary.push(SerializedEnumFlag::DECLARED as u8);
    write_u64_as_uleb128(binary, enum_definition.variants.len() as u64);
    for variant in &enum_definition.variants {
        write_index(binary, variant.variant_name);
        serialize_field_definitions(binary, &variant.fields);
    }
}

fn serialize_field_definitions(binary: &mut Vec<u8>, fields: &[FieldDefinition]) {
    write_u64_as_uleb128(binary, fields.len() as u64);
    for field in fields {
        write_index(binary, field.name);
        serialize_signature_token(binary, &field.signature.0);
    }
}

fn serialize_function_definition(
    binary: &mut Vec<u8>,
    function_definition: &FunctionDefinition,
    features: VersionFeatures,
) {
    write_index(binary, function_definition.function);

    let native = if function_definition.is_native() {
        FunctionDefinition::NATIVE
    } else {
        0
    };
    if features.has_single_flags_byte() {
        let public = if function_definition.visibility == Visibility::Public {
            FunctionDefinition::DEPRECATED_PUBLIC_BIT
        } else {
            0
        };
        binary.push(public | native);
    } else if !features.has_entry_bit() {
        if function_definition.is_entry {
            binary.push(Visibility::DEPRECATED_SCRIPT);
        } else {
            binary.push(function_definition.visibility as u8);
        }
        binary.push(native);
    } else {
        binary.push(function_definition.visibility as u8);
        let entry = if function_definition.is_entry {
            FunctionDefinition::ENTRY
        } else {
            0
        };
        binary.push(native | entry);
    }

    write_u64_as_uleb128(
        binary,
        function_definition.acquires_global_resources.len() as u64,
    );
    for struct_def in &function_definition.acquires_global_resources {
        write_index(binary, *struct_def);
    }
    if let Some(code) = &function_definition.code {
        serialize_code_unit(binary, code, features);
    }
}

fn serialize_code_unit(binary: &mut Vec<u8>, code: &CodeUnit, features: VersionFeatures) {
    write_index(binary, code.locals);
    serialize_code(binary, &code.code);
    if features.has_jump_tables() {
        serialize_jump_tables(binary, &code.jump_tables);
    }
}

fn serialize_jump_tables(binary: &mut Vec<u8>, jump_tables: &[VariantJumpTable]) {
    write_u64_as_uleb128(binary, jump_tables.len() as u64);
    for jump_table in jump_tables {
        write_index(binary, jump_table.head_enum);
        match &jump_table.jump_table {
            JumpTableInner::Full(offsets) => {
                write_u64_as_uleb128(binary, offsets.len() as u64);
                binary.push(SerializedJumpTableFlag::FULL as u8);
                for offset in offsets {
                    write_u64_as_uleb128(binary, *offset as u64);
                }
            }
        }
    }
}

/// Serializes a stream of `Bytecode`s, prefixed by their count.
pub(crate) fn serialize_code(binary: &mut Vec<u8>, code: &[Bytecode]) {
    write_u64_as_uleb128(binary, code.len() as u64);
    for instruction in code {
        serialize_instruction_inner(binary, instruction);
    }
}

/// Serializes a single `Bytecode` instruction.
fn serialize_instruction_inner(binary: &mut Vec<u8>, opcode: &Bytecode) {
    binary.push(instruction_key(opcode));
    match opcode {
        Bytecode::BrTrue(code_offset)
        | Bytecode::BrFalse(code_offset)
        | Bytecode::Branch(code_offset) => write_u64_as_uleb128(binary, *code_offset as u64),
        Bytecode::LdU8(value) => binary.push(*value),
        Bytecode::LdU16(value) => write_u16(binary, *value),
        Bytecode::LdU32(value) => write_u32(binary, *value),
        Bytecode::LdU64(value) => write_u64(binary, *value),
        Bytecode::LdU128(value) => write_u128(binary, **value),
        Bytecode::LdU256(value) => write_u256(binary, **value),
        Bytecode::LdConst(const_idx) => write_index(binary, *const_idx),
        Bytecode::CopyLoc(local_idx)
        | Bytecode::MoveLoc(local_idx)
        | Bytecode::StLoc(local_idx)
        | Bytecode::MutBorrowLoc(local_idx)
        | Bytecode::ImmBorrowLoc(local_idx) => binary.push(*local_idx),
        Bytecode::MutBorrowField(field_idx) | Bytecode::ImmBorrowField(field_idx) => {
            write_index(binary, *field_idx)
        }
        Bytecode::MutBorrowFieldGeneric(field_idx) | Bytecode::ImmBorrowFieldGeneric(field_idx) => {
            write_index(binary, *field_idx)
        }
        Bytecode::Call(method_idx) => write_index(binary, *method_idx),
        Bytecode::CallGeneric(method_idx) => write_index(binary, *method_idx),
        Bytecode::Pack(class_idx)
        | Bytecode::Unpack(class_idx)
        | Bytecode::ExistsDeprecated(class_idx)
        | Bytecode::MutBorrowGlobalDeprecated(class_idx)
        | Bytecode::ImmBorrowGlobalDeprecated(class_idx)
        | Bytecode::MoveFromDeprecated(class_idx)
        | Bytecode::MoveToDeprecated(class_idx) => write_index(binary, *class_idx),
        Bytecode::PackGeneric(class_idx)
        | Bytecode::UnpackGeneric(class_idx)
        | Bytecode::ExistsGenericDeprecated(class_idx)
        | Bytecode::MutBorrowGlobalGenericDeprecated(class_idx)
        | Bytecode::ImmBorrowGlobalGenericDeprecated(class_idx)
        | Bytecode::MoveFromGenericDeprecated(class_idx)
        | Bytecode::MoveToGenericDeprecated(class_idx) => write_index(binary, *class_idx),
        Bytecode::VecPack(sig_idx, num) | Bytecode::VecUnpack(sig_idx, num) => {
            write_index(binary, *sig_idx);
            write_u64_as_uleb128(binary, *num);
        }
        Bytecode::VecLen(sig_idx)
        | Bytecode::VecImmBorrow(sig_idx)
        | Bytecode::VecMutBorrow(sig_idx)
        | Bytecode::VecPushBack(sig_idx)
        | Bytecode::VecPopBack(sig_idx)
        | Bytecode::VecSwap(sig_idx) => write_index(binary, *sig_idx),
        Bytecode::PackVariant(handle_idx)
        | Bytecode::UnpackVariant(handle_idx)
        | Bytecode::UnpackVariantImmRef(handle_idx)
        | Bytecode::UnpackVariantMutRef(handle_idx) => write_index(binary, *handle_idx),
        Bytecode::PackVariantGeneric(handle_idx)
        | Bytecode::UnpackVariantGeneric(handle_idx)
        | Bytecode::UnpackVariantGenericImmRef(handle_idx)
        | Bytecode::UnpackVariantGenericMutRef(handle_idx) => write_index(binary, *handle_idx),
        Bytecode::VariantSwitch(jump_table_idx) => write_index(binary, *jump_table_idx),
        Bytecode::Pop
        | Bytecode::Ret
        | Bytecode::CastU8
        | Bytecode::CastU16
        | Bytecode::CastU32
        | Bytecode::CastU64
        | Bytecode::CastU128
        | Bytecode::CastU256
        | Bytecode::LdTrue
        | Bytecode::LdFalse
        | Bytecode::ReadRef
        | Bytecode::WriteRef
        | Bytecode::FreezeRef
        | Bytecode::Add
        | Bytecode::Sub
        | Bytecode::Mul
        | Bytecode::Mod
        | Bytecode::Div
        | Bytecode::BitOr
        | Bytecode::BitAnd
        | Bytecode::Xor
        | Bytecode::Shl
        | Bytecode::Shr
        | Bytecode::Or
        | Bytecode::And
        | Bytecode::Not
        | Bytecode::Eq
        | Bytecode::Neq
        | Bytecode::Lt
        | Bytecode::Gt
        | Bytecode::Le
        | Bytecode::Ge
        | Bytecode::Abort
        | Bytecode::Nop => (),
    }
}
