// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! The decoded form of a module binary.

use crate::{
    account_address::AccountAddress, file_format::*, file_format_common::VERSION_MAX,
    identifier::Identifier, internals::ModuleIndex, IndexKind,
};

/// A module held as one vector per table kind of the binary.
///
/// Entries reference each other by index. The loader bounds those indices by their encoding
/// only, never by the length of the table they point into, so every lookup here is checked and
/// a dangling index yields `None`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompiledModule {
    /// Format version the module was decoded from, and the one it encodes as.
    pub version: u32,
    /// `false` when the binary carries the unpublishable magic.
    pub publishable: bool,
    pub self_module_handle_idx: ModuleHandleIndex,

    pub module_handles: Vec<ModuleHandle>,
    pub datatype_handles: Vec<DatatypeHandle>,
    pub function_handles: Vec<FunctionHandle>,
    pub field_handles: Vec<FieldHandle>,
    /// Modules allowed to call the `friend` functions of this one.
    pub friend_decls: Vec<ModuleHandle>,

    pub struct_def_instantiations: Vec<StructDefInstantiation>,
    pub function_instantiations: Vec<FunctionInstantiation>,
    pub field_instantiations: Vec<FieldInstantiation>,

    pub signatures: SignaturePool,
    pub identifiers: IdentifierPool,
    pub address_identifiers: AddressIdentifierPool,
    pub constant_pool: ConstantPool,
    /// Opaque key/value pairs, encoded from version 5 on.
    pub metadata: Vec<Metadata>,

    pub struct_defs: Vec<StructDefinition>,
    pub function_defs: Vec<FunctionDefinition>,

    // enum tables, encoded from version 7 on
    pub enum_defs: Vec<EnumDefinition>,
    pub enum_def_instantiations: Vec<EnumDefInstantiation>,
    pub variant_handles: Vec<VariantHandle>,
    pub variant_instantiation_handles: Vec<VariantInstantiationHandle>,
}

impl CompiledModule {
    /// Number of entries in the table `kind` indexes into. `None` for kinds that point inside
    /// an entry (locals, code offsets, fields, type parameters, variant tags and jump tables)
    /// rather than at a module table.
    pub fn kind_count(&self, kind: IndexKind) -> Option<usize> {
        use IndexKind as K;
        let count = match kind {
            K::ModuleHandle => self.module_handles.len(),
            K::DatatypeHandle => self.datatype_handles.len(),
            K::FunctionHandle => self.function_handles.len(),
            K::FieldHandle => self.field_handles.len(),
            K::FriendDeclaration => self.friend_decls.len(),
            K::StructDefInstantiation => self.struct_def_instantiations.len(),
            K::FunctionInstantiation => self.function_instantiations.len(),
            K::FieldInstantiation => self.field_instantiations.len(),
            K::StructDefinition => self.struct_defs.len(),
            K::FunctionDefinition => self.function_defs.len(),
            K::Signature => self.signatures.len(),
            K::Identifier => self.identifiers.len(),
            K::AddressIdentifier => self.address_identifiers.len(),
            K::ConstantPool => self.constant_pool.len(),
            K::EnumDefinition => self.enum_defs.len(),
            K::EnumDefInstantiation => self.enum_def_instantiations.len(),
            K::VariantHandle => self.variant_handles.len(),
            K::VariantInstantiationHandle => self.variant_instantiation_handles.len(),
            K::LocalPool
            | K::CodeDefinition
            | K::FieldDefinition
            | K::TypeParameter
            | K::MemberCount
            | K::VariantTag
            | K::VariantJumpTable => return None,
        };
        Some(count)
    }

    pub fn self_handle_idx(&self) -> ModuleHandleIndex {
        self.self_module_handle_idx
    }

    pub fn self_handle(&self) -> Option<&ModuleHandle> {
        self.module_handle_at(self.self_handle_idx())
    }

    /// Name of the module, read through its self handle.
    pub fn name(&self) -> Option<&Identifier> {
        self.identifier_at(self.self_handle()?.name)
    }

    /// Address the module is published under, read through its self handle.
    pub fn address(&self) -> Option<&AccountAddress> {
        self.address_identifier_at(self.self_handle()?.address)
    }

    pub fn module_handle_at(&self, idx: ModuleHandleIndex) -> Option<&ModuleHandle> {
        self.module_handles.get(idx.into_index())
    }

    pub fn datatype_handle_at(&self, idx: DatatypeHandleIndex) -> Option<&DatatypeHandle> {
        self.datatype_handles.get(idx.into_index())
    }

    pub fn function_handle_at(&self, idx: FunctionHandleIndex) -> Option<&FunctionHandle> {
        self.function_handles.get(idx.into_index())
    }

    pub fn signature_at(&self, idx: SignatureIndex) -> Option<&Signature> {
        self.signatures.get(idx.into_index())
    }

    pub fn identifier_at(&self, idx: IdentifierIndex) -> Option<&Identifier> {
        self.identifiers.get(idx.into_index())
    }

    pub fn address_identifier_at(&self, idx: AddressIdentifierIndex) -> Option<&AccountAddress> {
        self.address_identifiers.get(idx.into_index())
    }

    pub fn constant_at(&self, idx: ConstantPoolIndex) -> Option<&Constant> {
        self.constant_pool.get(idx.into_index())
    }

    /// The first function definition whose handle is named `name`. Definitions with a dangling
    /// handle or name index are skipped.
    pub fn find_function_def_by_name(
        &self,
        name: impl AsRef<str>,
    ) -> Option<(FunctionDefinitionIndex, &FunctionDefinition)> {
        let name = name.as_ref();
        self.function_defs
            .iter()
            .enumerate()
            .find(|(_, def)| {
                self.function_handle_at(def.function)
                    .and_then(|handle| self.identifier_at(handle.name))
                    .is_some_and(|ident| ident.as_str() == name)
            })
            .map(|(idx, def)| (FunctionDefinitionIndex::new(idx as TableIndex), def))
    }
}

/// Name of the self module in the fixture modules below.
pub fn self_module_name() -> Identifier {
    Identifier::new_unchecked("<SELF>")
}

/// A module with a self handle at the zero address, one empty signature and nothing else.
pub fn empty_module() -> CompiledModule {
    CompiledModule {
        version: VERSION_MAX,
        publishable: true,
        module_handles: vec![ModuleHandle {
            address: AddressIdentifierIndex(0),
            name: IdentifierIndex(0),
        }],
        identifiers: vec![self_module_name()],
        address_identifiers: vec![AccountAddress::ZERO],
        signatures: vec![Signature(vec![])],
        ..CompiledModule::default()
    }
}

/// `empty_module` with a private function `foo` whose body is a single `Ret`, and a struct
/// `Bar { x: u64 }`.
pub fn basic_test_module() -> CompiledModule {
    let mut m = empty_module();

    let foo = push_identifier(&mut m, "foo");
    m.function_handles.push(FunctionHandle {
        module: m.self_module_handle_idx,
        name: foo,
        parameters: SignatureIndex(0),
        return_: SignatureIndex(0),
        type_parameters: vec![],
    });
    m.function_defs.push(FunctionDefinition {
        function: FunctionHandleIndex(0),
        visibility: Visibility::Private,
        is_entry: false,
        acquires_global_resources: vec![],
        code: Some(CodeUnit {
            locals: SignatureIndex(0),
            code: vec![Bytecode::Ret],
            jump_tables: vec![],
        }),
    });

    let bar = push_identifier(&mut m, "Bar");
    m.datatype_handles.push(DatatypeHandle {
        module: m.self_module_handle_idx,
        name: bar,
        abilities: AbilitySet::EMPTY,
        type_parameters: vec![],
    });
    let x = push_identifier(&mut m, "x");
    m.struct_defs.push(StructDefinition {
        struct_handle: DatatypeHandleIndex(0),
        field_information: StructFieldInformation::Declared(vec![FieldDefinition {
            name: x,
            signature: TypeSignature(SignatureToken::U64),
        }]),
    });
    m
}

/// `basic_test_module` with an enum `Option` holding one field-less variant `None`, and a
/// variant handle for it.
pub fn basic_test_module_with_enum() -> CompiledModule {
    let mut m = basic_test_module();

    let option = push_identifier(&mut m, "Option");
    m.datatype_handles.push(DatatypeHandle {
        module: m.self_module_handle_idx,
        name: option,
        abilities: AbilitySet::EMPTY,
        type_parameters: vec![],
    });
    let none = push_identifier(&mut m, "None");
    m.enum_defs.push(EnumDefinition {
        enum_handle: DatatypeHandleIndex(1),
        variants: vec![VariantDefinition {
            variant_name: none,
            fields: vec![],
        }],
    });
    m.variant_handles.push(VariantHandle {
        enum_def: EnumDefinitionIndex(0),
        variant: 0,
    });
    m
}

fn push_identifier(module: &mut CompiledModule, name: &str) -> IdentifierIndex {
    module.identifiers.push(Identifier::new_unchecked(name));
    IdentifierIndex((module.identifiers.len() - 1) as TableIndex)
}
