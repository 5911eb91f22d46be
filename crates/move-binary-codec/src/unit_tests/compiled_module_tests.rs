// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account_address::AccountAddress,
    compiled_module::{basic_test_module, basic_test_module_with_enum, empty_module},
    file_format::*,
    CompiledModule, IndexKind,
};

#[test]
fn self_handle_accessors() {
    let module = empty_module();
    assert_eq!(module.name().unwrap().as_str(), "<SELF>");
    assert_eq!(module.address(), Some(&AccountAddress::ZERO));
    assert_eq!(module.self_handle(), Some(&module.module_handles[0]));
    assert_eq!(module.self_handle_idx(), ModuleHandleIndex(0));
}

#[test]
fn find_function_by_name() {
    let module = basic_test_module();
    let (idx, def) = module.find_function_def_by_name("foo").unwrap();
    assert_eq!(idx, FunctionDefinitionIndex(0));
    assert_eq!(def.function, FunctionHandleIndex(0));
    assert!(module.find_function_def_by_name("Bar").is_none());
    assert!(module.find_function_def_by_name("missing").is_none());
}

#[test]
fn find_function_tolerates_dangling_indices() {
    let mut module = basic_test_module();
    module.function_defs[0].function = FunctionHandleIndex(42);
    assert!(module.find_function_def_by_name("foo").is_none());

    let mut module = basic_test_module();
    module.function_handles[0].name = IdentifierIndex(42);
    assert!(module.find_function_def_by_name("foo").is_none());
}

#[test]
fn kind_counts() {
    let module = basic_test_module_with_enum();
    for (kind, count) in [
        (IndexKind::ModuleHandle, 1),
        (IndexKind::DatatypeHandle, 2),
        (IndexKind::FunctionHandle, 1),
        (IndexKind::FunctionDefinition, 1),
        (IndexKind::StructDefinition, 1),
        (IndexKind::EnumDefinition, 1),
        (IndexKind::VariantHandle, 1),
        (IndexKind::Identifier, 6),
        (IndexKind::Signature, 1),
        (IndexKind::ConstantPool, 0),
    ] {
        assert_eq!(module.kind_count(kind), Some(count), "{}", kind);
    }
    for kind in [
        IndexKind::LocalPool,
        IndexKind::CodeDefinition,
        IndexKind::FieldDefinition,
        IndexKind::VariantTag,
    ] {
        assert_eq!(module.kind_count(kind), None, "{}", kind);
    }
}

#[test]
fn table_lookups() {
    let mut module = basic_test_module_with_enum();
    let handle = module.datatype_handle_at(DatatypeHandleIndex(1)).unwrap();
    assert_eq!(module.identifier_at(handle.name).unwrap().as_str(), "Option");
    let foo = module.function_handle_at(FunctionHandleIndex(0)).unwrap();
    assert_eq!(module.identifier_at(foo.name).unwrap().as_str(), "foo");
    assert_eq!(module.signature_at(SignatureIndex(0)).unwrap().len(), 0);

    module.constant_pool.push(Constant {
        type_: SignatureToken::Bool,
        data: vec![1],
    });
    assert_eq!(
        module.constant_at(ConstantPoolIndex(0)).map(|c| c.data.clone()),
        Some(vec![1])
    );
}

#[test]
fn lookups_past_the_end_are_none() {
    let module = basic_test_module();
    assert!(module.module_handle_at(ModuleHandleIndex(1)).is_none());
    assert!(module.datatype_handle_at(DatatypeHandleIndex(9)).is_none());
    assert!(module.function_handle_at(FunctionHandleIndex(9)).is_none());
    assert!(module.signature_at(SignatureIndex(9)).is_none());
    assert!(module.identifier_at(IdentifierIndex(u16::MAX)).is_none());
    assert!(module.address_identifier_at(AddressIdentifierIndex(1)).is_none());
    assert!(module.constant_at(ConstantPoolIndex(0)).is_none());
}

#[test]
fn dangling_self_handle_decodes_without_a_name() {
    let mut module = empty_module();
    module.self_module_handle_idx = ModuleHandleIndex(5);
    let decoded = CompiledModule::deserialize(&module.serialize()).unwrap();
    assert_eq!(decoded.self_handle_idx(), ModuleHandleIndex(5));
    assert!(decoded.self_handle().is_none());
    assert!(decoded.name().is_none());
    assert!(decoded.address().is_none());

    let mut module = empty_module();
    module.module_handles[0].name = IdentifierIndex(3);
    let decoded = CompiledModule::deserialize(&module.serialize()).unwrap();
    assert!(decoded.self_handle().is_some());
    assert!(decoded.name().is_none());
    assert_eq!(decoded.address(), Some(&AccountAddress::ZERO));
}
