// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Decoding and encoding of the Move module binary format.
//!
//! `decode` turns a serialized module into a [`CompiledModule`], `encode` turns it back into
//! bytes. The two are exact inverses for every module whose content can be expressed at its
//! declared format version.

use std::fmt;

pub mod account_address;
pub mod binary_config;
pub mod compiled_module;
pub mod deserializer;
pub mod errors;
pub mod file_format;
pub mod file_format_common;
pub mod identifier;
pub mod module_editor;
pub mod serializer;

#[cfg(test)]
mod unit_tests;

pub use binary_config::{BinaryConfig, TableConfig};
pub use compiled_module::CompiledModule;
pub use errors::{BinaryLoaderResult, PartialVMError, StatusCode};

/// Deserializes a module from `binary` under the limits of `binary_config`.
pub fn decode(binary: &[u8], binary_config: &BinaryConfig) -> BinaryLoaderResult<CompiledModule> {
    CompiledModule::deserialize_with_config(binary, binary_config)
}

/// Serializes `module` into its canonical binary form.
pub fn encode(module: &CompiledModule) -> Vec<u8> {
    module.serialize()
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum IndexKind {
    ModuleHandle,
    DatatypeHandle,
    FunctionHandle,
    FieldHandle,
    FriendDeclaration,
    FunctionInstantiation,
    FieldInstantiation,
    StructDefinition,
    StructDefInstantiation,
    FunctionDefinition,
    FieldDefinition,
    Signature,
    Identifier,
    AddressIdentifier,
    ConstantPool,
    LocalPool,
    CodeDefinition,
    TypeParameter,
    MemberCount,
    EnumDefinition,
    EnumDefInstantiation,
    VariantHandle,
    VariantInstantiationHandle,
    VariantJumpTable,
    VariantTag,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use IndexKind::*;

        let desc = match self {
            ModuleHandle => "module handle",
            DatatypeHandle => "datatype handle",
            FunctionHandle => "function handle",
            FieldHandle => "field handle",
            FriendDeclaration => "friend declaration",
            StructDefInstantiation => "struct instantiation",
            FunctionInstantiation => "function instantiation",
            FieldInstantiation => "field instantiation",
            StructDefinition => "struct definition",
            FunctionDefinition => "function definition",
            FieldDefinition => "field definition",
            Signature => "signature",
            Identifier => "identifier",
            AddressIdentifier => "address identifier",
            ConstantPool => "constant pool",
            LocalPool => "local pool",
            CodeDefinition => "code definition pool",
            TypeParameter => "type parameter",
            MemberCount => "field offset",
            EnumDefinition => "enum definition",
            EnumDefInstantiation => "enum instantiation",
            VariantHandle => "variant handle",
            VariantInstantiationHandle => "variant instantiation handle",
            VariantJumpTable => "jump table",
            VariantTag => "variant tag",
        };

        f.write_str(desc)
    }
}

/// Represents a module index.
mod internals {
    use crate::IndexKind;

    pub trait ModuleIndex {
        const KIND: IndexKind;

        fn into_index(self) -> usize;
    }
}

pub use internals::ModuleIndex;
