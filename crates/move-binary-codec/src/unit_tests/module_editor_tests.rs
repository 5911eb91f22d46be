// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use super::read_directory;
use crate::{
    compiled_module::{basic_test_module, CompiledModule},
    file_format::*,
    file_format_common::TableType,
    identifier::Identifier,
    module_editor::{ModuleEditor, UnresolvedLookup},
};

fn string_constant(prefix: u8, payload: &[u8]) -> Constant {
    let mut data = vec![prefix];
    data.extend_from_slice(payload);
    Constant {
        type_: SignatureToken::Vector(Box::new(SignatureToken::U8)),
        data,
    }
}

/// A module shaped like a coin template: a `template` identifier and a name constant.
fn template_module() -> CompiledModule {
    let mut module = basic_test_module();
    module.identifiers.push(Identifier::new("template").unwrap());
    module
        .constant_pool
        .push(string_constant(0x0D, b"Template Coin"));
    module.constant_pool.push(Constant {
        type_: SignatureToken::U64,
        data: vec![1, 0, 0, 0, 0, 0, 0, 0],
    });
    module
}

#[test]
fn replace_constant_string() {
    let module = template_module();
    let edited = module
        .edit()
        .replace_constant_string("Template Coin", "My Coin")
        .finish();
    assert!(edited.unresolved.is_empty());

    let constant = &edited.module.constant_pool[0];
    let mut expected = vec![0x07];
    expected.extend_from_slice(b"My Coin");
    assert_eq!(constant.data, expected);
    assert_eq!(
        constant.type_,
        SignatureToken::Vector(Box::new(SignatureToken::U8))
    );
    assert_eq!(edited.module.constant_pool[1], module.constant_pool[1]);
}

#[test]
fn length_prefix_is_not_checked_against_the_payload() {
    let mut module = basic_test_module();
    module
        .constant_pool
        .push(string_constant(0x09, b"Template Coin"));
    let edited = ModuleEditor::new(&module)
        .replace_constant_string(b"Template Coin", b"My Coin")
        .finish();
    assert!(edited.unresolved.is_empty());
    assert_eq!(edited.module.constant_pool[0].data[0], 0x07);
    assert_eq!(&edited.module.constant_pool[0].data[1..], b"My Coin");
}

#[test]
fn only_the_constant_pool_changes() {
    let module = template_module();
    let before = read_directory(&module.serialize());
    let edited = module
        .edit()
        .replace_constant_string("Template Coin", "My Coin")
        .finish();
    let after = read_directory(&edited.module.serialize());

    for (kind, bytes) in &before.tables {
        if *kind == TableType::CONSTANT_POOL as u8 {
            assert_ne!(&after.tables[kind], bytes);
        } else {
            assert_eq!(&after.tables[kind], bytes, "table {:#x} changed", kind);
        }
    }
    assert_eq!(before.tables.len(), after.tables.len());
}

#[test]
fn edits_survive_a_round_trip() {
    let edited = template_module()
        .edit()
        .rename_identifier("template", "my_coin")
        .replace_constant_string("Template Coin", "My Coin")
        .set_function_visibility("foo", Visibility::Public)
        .finish();
    assert!(edited.unresolved.is_empty());

    let decoded = CompiledModule::deserialize(&edited.module.serialize()).unwrap();
    assert_eq!(decoded, edited.module);
    assert!(decoded.identifiers.iter().any(|ident| ident.as_str() == "my_coin"));
    assert!(!decoded.identifiers.iter().any(|ident| ident.as_str() == "template"));
    assert_eq!(decoded.function_defs[0].visibility, Visibility::Public);
}

#[test]
fn rename_keeps_the_identifier_slot() {
    let module = template_module();
    let idx = module
        .identifiers
        .iter()
        .position(|ident| ident.as_str() == "template")
        .unwrap();
    let edited = module.edit().rename_identifier("template", "my_coin").finish();
    assert_eq!(edited.module.identifiers.len(), module.identifiers.len());
    assert_eq!(edited.module.identifiers[idx].as_str(), "my_coin");
}

#[test]
fn invalid_new_identifier_is_reported() {
    let module = template_module();
    let edited = module.edit().rename_identifier("template", "1ab").finish();
    assert_eq!(
        edited.unresolved,
        vec![UnresolvedLookup::InvalidIdentifier("1ab".to_string())]
    );
    assert_eq!(edited.module, module);
}

#[test]
fn set_function_visibility() {
    let module = basic_test_module();
    let edited = module
        .edit()
        .set_function_visibility("foo", Visibility::Friend)
        .finish();
    assert_eq!(edited.module.function_defs[0].visibility, Visibility::Friend);
    // the original is untouched
    assert_eq!(module.function_defs[0].visibility, Visibility::Private);
}

#[test]
fn misses_are_collected_and_later_edits_still_apply() {
    let module = template_module();
    let edited = module
        .edit()
        .rename_identifier("missing", "present")
        .replace_constant_string("No Such Coin", "My Coin")
        .set_function_visibility("bar", Visibility::Public)
        .rename_identifier("template", "my_coin")
        .finish();
    assert_eq!(
        edited.unresolved,
        vec![
            UnresolvedLookup::Identifier("missing".to_string()),
            UnresolvedLookup::Constant(b"No Such Coin".to_vec()),
            UnresolvedLookup::Function("bar".to_string()),
        ]
    );
    assert!(edited
        .module
        .identifiers
        .iter()
        .any(|ident| ident.as_str() == "my_coin"));
    assert_eq!(edited.module.constant_pool, module.constant_pool);
    assert_eq!(
        edited.unresolved[1].to_string(),
        format!("no string constant with payload {:?}", b"No Such Coin".to_vec())
    );
}

#[test]
fn non_string_constants_are_not_matched() {
    let mut module = basic_test_module();
    module.constant_pool.push(Constant {
        type_: SignatureToken::U64,
        data: vec![],
    });
    let edited = module.edit().replace_constant_string("", "x").finish();
    assert_eq!(
        edited.unresolved,
        vec![UnresolvedLookup::Constant(vec![])]
    );
}
