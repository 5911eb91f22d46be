// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use super::{binary_with_tables, read_directory, self_tables};
use crate::{
    account_address::AccountAddress,
    compiled_module::{basic_test_module, basic_test_module_with_enum, empty_module},
    file_format::*,
    file_format_common::*,
    identifier::Identifier,
    CompiledModule,
};

/// A module touching every table, every kind of record and the jump table trailer.
fn full_module() -> CompiledModule {
    let mut m = basic_test_module_with_enum();
    let ident = |m: &mut CompiledModule, s: &str| {
        m.identifiers.push(Identifier::new(s).unwrap());
        IdentifierIndex((m.identifiers.len() - 1) as TableIndex)
    };

    m.address_identifiers.push(AccountAddress::ONE);
    let std_name = ident(&mut m, "std");
    m.module_handles.push(ModuleHandle {
        address: AddressIdentifierIndex(1),
        name: std_name,
    });
    m.friend_decls.push(ModuleHandle {
        address: AddressIdentifierIndex(1),
        name: std_name,
    });

    m.signatures.push(Signature(vec![
        SignatureToken::U8,
        SignatureToken::Vector(Box::new(SignatureToken::U256)),
        SignatureToken::MutableReference(Box::new(SignatureToken::Datatype(
            DatatypeHandleIndex(0),
        ))),
    ]));
    m.signatures.push(Signature(vec![SignatureToken::TypeParameter(0)]));

    let generic_name = ident(&mut m, "Box");
    m.datatype_handles.push(DatatypeHandle {
        module: ModuleHandleIndex(0),
        name: generic_name,
        abilities: AbilitySet::EMPTY | Ability::Copy | Ability::Drop | Ability::Store,
        type_parameters: vec![DatatypeTyParameter {
            constraints: AbilitySet::EMPTY | Ability::Copy,
            is_phantom: true,
        }],
    });
    let value_name = ident(&mut m, "value");
    m.struct_defs.push(StructDefinition {
        struct_handle: DatatypeHandleIndex(2),
        field_information: StructFieldInformation::Declared(vec![FieldDefinition {
            name: value_name,
            signature: TypeSignature(SignatureToken::TypeParameter(0)),
        }]),
    });
    let native_name = ident(&mut m, "Native");
    m.datatype_handles.push(DatatypeHandle {
        module: ModuleHandleIndex(0),
        name: native_name,
        abilities: AbilitySet::ALL,
        type_parameters: vec![],
    });
    m.struct_defs.push(StructDefinition {
        struct_handle: DatatypeHandleIndex(3),
        field_information: StructFieldInformation::Native,
    });
    m.struct_def_instantiations.push(StructDefInstantiation {
        def: StructDefinitionIndex(1),
        type_parameters: SignatureIndex(2),
    });
    m.field_handles.push(FieldHandle {
        owner: StructDefinitionIndex(1),
        field: 0,
    });
    m.field_instantiations.push(FieldInstantiation {
        handle: FieldHandleIndex(0),
        type_parameters: SignatureIndex(2),
    });

    let some_name = ident(&mut m, "Some");
    m.enum_defs[0].variants.push(VariantDefinition {
        variant_name: some_name,
        fields: vec![FieldDefinition {
            name: value_name,
            signature: TypeSignature(SignatureToken::U64),
        }],
    });
    m.variant_handles.push(VariantHandle {
        enum_def: EnumDefinitionIndex(0),
        variant: 1,
    });
    m.enum_def_instantiations.push(EnumDefInstantiation {
        def: EnumDefinitionIndex(0),
        type_parameters: SignatureIndex(2),
    });
    m.variant_instantiation_handles
        .push(VariantInstantiationHandle {
            enum_def: EnumDefInstantiationIndex(0),
            variant: 0,
        });

    let bar_name = ident(&mut m, "bar");
    m.function_handles.push(FunctionHandle {
        module: ModuleHandleIndex(0),
        name: bar_name,
        parameters: SignatureIndex(1),
        return_: SignatureIndex(0),
        type_parameters: vec![AbilitySet::EMPTY, AbilitySet::EMPTY | Ability::Key],
    });
    m.function_instantiations.push(FunctionInstantiation {
        handle: FunctionHandleIndex(1),
        type_parameters: SignatureIndex(2),
    });
    m.function_defs.push(FunctionDefinition {
        function: FunctionHandleIndex(1),
        visibility: Visibility::Friend,
        is_entry: true,
        acquires_global_resources: vec![StructDefinitionIndex(0)],
        code: Some(CodeUnit {
            locals: SignatureIndex(1),
            code: vec![
                Bytecode::MoveLoc(0),
                Bytecode::VariantSwitch(VariantJumpTableIndex(0)),
                Bytecode::LdU256(Box::new(ethnum::U256::MAX)),
                Bytecode::Pop,
                Bytecode::VecPack(SignatureIndex(2), 0),
                Bytecode::Ret,
            ],
            jump_tables: vec![VariantJumpTable {
                head_enum: EnumDefinitionIndex(0),
                jump_table: JumpTableInner::Full(vec![2, 5]),
            }],
        }),
    });
    let native_fn = ident(&mut m, "native_fn");
    m.function_handles.push(FunctionHandle {
        module: ModuleHandleIndex(0),
        name: native_fn,
        parameters: SignatureIndex(0),
        return_: SignatureIndex(0),
        type_parameters: vec![],
    });
    m.function_defs.push(FunctionDefinition {
        function: FunctionHandleIndex(2),
        visibility: Visibility::Public,
        is_entry: false,
        acquires_global_resources: vec![],
        code: None,
    });

    m.constant_pool.push(Constant {
        type_: SignatureToken::Vector(Box::new(SignatureToken::U8)),
        data: vec![3, b'a', b'b', b'c'],
    });
    m.metadata.push(Metadata {
        key: b"key".to_vec(),
        value: vec![0xFF; 300],
    });
    m
}

#[test]
fn full_module_round_trip() {
    let module = full_module();
    let bytes = module.serialize();
    let decoded = CompiledModule::deserialize(&bytes).unwrap();
    assert_eq!(decoded, module);
    // constants compare by payload only, so check the types separately
    assert_eq!(decoded.constant_pool[0].type_, module.constant_pool[0].type_);
    assert_eq!(decoded.serialize(), bytes);
}

#[test]
fn every_table_is_written_in_ascending_order() {
    let bytes = full_module().serialize();
    let directory = read_directory(&bytes);
    let kinds: Vec<u8> = directory.entries.iter().map(|(kind, _, _)| *kind).collect();
    let all: Vec<u8> = TableType::ALL.iter().map(|kind| *kind as u8).collect();
    assert_eq!(kinds, all);

    let mut expected_offset = 0;
    for (_, offset, count) in &directory.entries {
        assert_eq!(*offset, expected_offset);
        expected_offset += count;
    }
}

#[test]
fn empty_tables_are_omitted() {
    let bytes = empty_module().serialize();
    let directory = read_directory(&bytes);
    assert_eq!(
        directory.entries,
        vec![
            (TableType::MODULE_HANDLES as u8, 0, 2),
            (TableType::SIGNATURES as u8, 2, 1),
            (TableType::IDENTIFIERS as u8, 3, 7),
            (TableType::ADDRESS_IDENTIFIERS as u8, 10, 32),
        ]
    );
    assert_eq!(bytes.len(), 64);
    assert_eq!(*bytes.last().unwrap(), 0);
}

#[test]
fn out_of_order_layout_is_canonicalized() {
    let mut tables = self_tables();
    tables.reverse();
    let bytes = binary_with_tables(VERSION_7, &tables);
    let module = CompiledModule::deserialize(&bytes).unwrap();
    assert_eq!(module, empty_module());

    let canonical = module.serialize();
    assert_ne!(canonical, bytes);
    assert_eq!(canonical, binary_with_tables(VERSION_7, &self_tables()));
}

#[test]
fn serialization_is_deterministic() {
    let module = basic_test_module_with_enum();
    assert_eq!(module.serialize(), module.clone().serialize());
}

#[test]
fn identifier_and_address_layout() {
    let bytes = basic_test_module().serialize();
    let directory = read_directory(&bytes);
    let identifiers = &directory.tables[&(TableType::IDENTIFIERS as u8)];
    let mut expected = vec![6];
    expected.extend_from_slice(b"<SELF>");
    expected.extend_from_slice(&[3, b'f', b'o', b'o', 3, b'B', b'a', b'r', 1, b'x']);
    assert_eq!(identifiers, &expected);
    assert_eq!(
        directory.tables[&(TableType::ADDRESS_IDENTIFIERS as u8)],
        vec![0; 32]
    );
}

#[test]
fn function_definition_layout() {
    let bytes = basic_test_module().serialize();
    let directory = read_directory(&bytes);
    // handle 0, private, no flags, no acquires, locals 0, one Ret, no jump tables
    assert_eq!(
        directory.tables[&(TableType::FUNCTION_DEFS as u8)],
        vec![0, 0, 0, 0, 0, 1, Opcodes::RET as u8, 0]
    );
    // handle 0, declared, one field named 3 of type u64
    assert_eq!(
        directory.tables[&(TableType::STRUCT_DEFS as u8)],
        vec![0, 2, 1, 3, SerializedType::U64 as u8]
    );
}

#[test]
fn enum_tables_round_trip_at_version_7() {
    let module = basic_test_module_with_enum();
    let bytes = module.serialize();
    let directory = read_directory(&bytes);
    // handle 1, declared, one variant named 5 without fields
    assert_eq!(
        directory.tables[&(TableType::ENUM_DEFS as u8)],
        vec![1, 2, 1, 5, 0]
    );
    assert_eq!(
        directory.tables[&(TableType::VARIANT_HANDLES as u8)],
        vec![0, 0]
    );
    assert_eq!(CompiledModule::deserialize(&bytes).unwrap(), module);
}

#[test]
fn jump_tables_trail_the_code() {
    let mut module = basic_test_module_with_enum();
    module.function_defs[0].code = Some(CodeUnit {
        locals: SignatureIndex(0),
        code: vec![Bytecode::VariantSwitch(VariantJumpTableIndex(0)), Bytecode::Ret],
        jump_tables: vec![VariantJumpTable {
            head_enum: EnumDefinitionIndex(0),
            jump_table: JumpTableInner::Full(vec![1]),
        }],
    });
    let bytes = module.serialize();
    let directory = read_directory(&bytes);
    assert_eq!(
        directory.tables[&(TableType::FUNCTION_DEFS as u8)],
        vec![
            0, // function handle
            0, // private
            0, // flags
            0, // acquires
            0, // locals
            2, // code length
            Opcodes::VARIANT_SWITCH as u8,
            0,
            Opcodes::RET as u8,
            1, // jump table count
            0, // head enum
            1, // branch count
            SerializedJumpTableFlag::FULL as u8,
            1,
        ]
    );
    assert_eq!(CompiledModule::deserialize(&bytes).unwrap(), module);
}

#[test]
fn jump_tables_are_dropped_before_version_7() {
    let mut module = basic_test_module();
    module.version = VERSION_6;
    module.function_defs[0].code = Some(CodeUnit {
        locals: SignatureIndex(0),
        code: vec![Bytecode::Ret],
        jump_tables: vec![VariantJumpTable {
            head_enum: EnumDefinitionIndex(0),
            jump_table: JumpTableInner::Full(vec![0]),
        }],
    });
    let decoded = CompiledModule::deserialize(&module.serialize()).unwrap();
    let code = decoded.function_defs[0].code.as_ref().unwrap();
    assert!(code.jump_tables.is_empty());
    assert_eq!(code.code, vec![Bytecode::Ret]);
}

#[test]
fn enums_cannot_be_read_back_below_version_7() {
    let mut module = basic_test_module_with_enum();
    module.version = VERSION_6;
    let bytes = module.serialize();
    let err = CompiledModule::deserialize(&bytes).unwrap_err();
    assert_eq!(err.major_status(), crate::StatusCode::MALFORMED);

    // without enums the same module is fine at version 6
    let mut module = basic_test_module();
    module.version = VERSION_6;
    assert_eq!(
        CompiledModule::deserialize(&module.serialize()).unwrap(),
        module
    );
}

#[test]
fn module_version_is_written_to_the_header() {
    let mut module = basic_test_module();
    for version in [VERSION_5, VERSION_6] {
        module.version = version;
        let bytes = module.serialize();
        assert_eq!(
            bytes[BinaryConstants::MOVE_MAGIC_SIZE..BinaryConstants::MOVE_MAGIC_SIZE + 4],
            version.to_le_bytes()
        );
    }
    module.version = VERSION_7;
    let bytes = module.serialize();
    assert_eq!(
        bytes[BinaryConstants::MOVE_MAGIC_SIZE..BinaryConstants::MOVE_MAGIC_SIZE + 4],
        BinaryFlavor::encode_version(VERSION_7).to_le_bytes()
    );
}

#[test]
fn native_function_has_no_code_unit() {
    let mut module = basic_test_module();
    module.function_defs[0].code = None;
    module.function_defs[0].visibility = Visibility::Public;
    let bytes = module.serialize();
    let directory = read_directory(&bytes);
    assert_eq!(
        directory.tables[&(TableType::FUNCTION_DEFS as u8)],
        vec![0, Visibility::Public as u8, FunctionDefinition::NATIVE, 0]
    );
    let decoded = CompiledModule::deserialize(&bytes).unwrap();
    assert!(decoded.function_defs[0].is_native());
}
