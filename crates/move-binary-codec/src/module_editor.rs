// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-place edits of a decoded module.
//!
//! Edits only replace values, they never add or remove table entries, so every index in the
//! module stays valid and an untouched table encodes to the same bytes it was decoded from.

use crate::{
    compiled_module::CompiledModule,
    file_format::{Constant, Visibility},
    file_format_common::{read_uleb128_as_u64, write_u64_as_uleb128},
    identifier::Identifier,
    internals::ModuleIndex,
};
use std::io::Cursor;
use tracing::warn;

/// An edit target that could not be found in the module.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum UnresolvedLookup {
    #[error("identifier `{0}` not found")]
    Identifier(String),
    #[error("no string constant with payload {0:?}")]
    Constant(Vec<u8>),
    #[error("no function definition named `{0}`")]
    Function(String),
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),
}

/// The result of a series of edits.
#[derive(Clone, Debug)]
pub struct EditedModule {
    pub module: CompiledModule,
    /// Edits that found nothing to change, in the order they were requested.
    pub unresolved: Vec<UnresolvedLookup>,
}

/// Applies value-level edits to a copy of a `CompiledModule`.
///
/// ```ignore
/// let edited = ModuleEditor::new(&module)
///     .rename_identifier("template", "my_coin")
///     .replace_constant_string("Template Coin", "My Coin")
///     .finish();
/// ```
pub struct ModuleEditor {
    module: CompiledModule,
    unresolved: Vec<UnresolvedLookup>,
}

impl ModuleEditor {
    pub fn new(module: &CompiledModule) -> Self {
        Self {
            module: module.clone(),
            unresolved: vec![],
        }
    }

    /// Replaces the identifier spelled exactly `old` with `new`.
    pub fn rename_identifier(&mut self, old: &str, new: &str) -> &mut Self {
        let new_ident = match Identifier::new(new) {
            Ok(ident) => ident,
            Err(_) => {
                warn!(new, "rejected rename to an invalid identifier");
                return self.unresolved(UnresolvedLookup::InvalidIdentifier(new.to_string()));
            }
        };
        match self.module.identifiers.iter().position(|ident| ident.as_str() == old) {
            Some(idx) => self.module.identifiers[idx] = new_ident,
            None => {
                warn!(old, "identifier to rename not found");
                return self.unresolved(UnresolvedLookup::Identifier(old.to_string()));
            }
        }
        self
    }

    /// Replaces the payload of the first string constant whose bytes, after the length prefix,
    /// are `old`. The new payload is length prefixed and the constant keeps its type.
    pub fn replace_constant_string(
        &mut self,
        old: impl AsRef<[u8]>,
        new: impl AsRef<[u8]>,
    ) -> &mut Self {
        let old = old.as_ref();
        let new = new.as_ref();
        let target = self
            .module
            .constant_pool
            .iter()
            .position(|constant| string_payload(constant) == Some(old));
        match target {
            Some(idx) => {
                let mut data = Vec::with_capacity(new.len() + 2);
                write_u64_as_uleb128(&mut data, new.len() as u64);
                data.extend_from_slice(new);
                self.module.constant_pool[idx].data = data;
            }
            None => {
                warn!(
                    old = %String::from_utf8_lossy(old),
                    "string constant to replace not found"
                );
                return self.unresolved(UnresolvedLookup::Constant(old.to_vec()));
            }
        }
        self
    }

    /// Sets the visibility of the function definition whose handle is named `name`.
    pub fn set_function_visibility(&mut self, name: &str, visibility: Visibility) -> &mut Self {
        let target = self
            .module
            .find_function_def_by_name(name)
            .map(|(idx, _)| idx.into_index());
        match target {
            Some(idx) => self.module.function_defs[idx].visibility = visibility,
            None => {
                warn!(function = name, "function to change visibility of not found");
                return self.unresolved(UnresolvedLookup::Function(name.to_string()));
            }
        }
        self
    }

    pub fn finish(&mut self) -> EditedModule {
        EditedModule {
            module: self.module.clone(),
            unresolved: std::mem::take(&mut self.unresolved),
        }
    }

    fn unresolved(&mut self, lookup: UnresolvedLookup) -> &mut Self {
        self.unresolved.push(lookup);
        self
    }
}

impl CompiledModule {
    /// Starts a series of edits on a copy of this module.
    pub fn edit(&self) -> ModuleEditor {
        ModuleEditor::new(self)
    }
}

/// The bytes of a constant after its ULEB128 length prefix. The prefix value itself is not
/// checked against the payload length.
fn string_payload(constant: &Constant) -> Option<&[u8]> {
    let mut cursor = Cursor::new(constant.data.as_slice());
    read_uleb128_as_u64(&mut cursor).ok()?;
    constant.data.get(cursor.position() as usize..)
}
