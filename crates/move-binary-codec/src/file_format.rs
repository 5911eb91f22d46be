// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

//! Binary format for modules.
//!
//! This module provides a simple Rust abstraction over the binary format. That is the format of
//! modules stored on chain.
//!
//! `file_format_common.rs` provides the constant values for entities in the binary format.
//!
//! Overall the binary format is structured in a number of sections:
//! - **Header**: this must start at offset 0 in the binary. It contains a blob that starts every
//!   Move binary, followed by the version of the format (flavored from version 7 on), and last is
//!   the number of tables present in this binary.
//! - **Table Specification**: it's a number of tuple of the form
//!   `(table type, starting_offset, byte_count)`. The number of entries is specified in the
//!   header (last entry in header). There can only be a single entry per table type. The
//!   `starting offset` is from the end of the table specifications. Tables must cover the entire
//!   table region and cannot overlap.
//! - **Table Content**: the serialized form of the specific entries in the table. Those roughly
//!   map to the structs defined in this module.
//! - **Self module handle**: a trailing ULEB128 index into the module handles table.

use crate::{
    account_address::AccountAddress, identifier::Identifier, internals::ModuleIndex, IndexKind,
};
use serde::{Deserialize, Serialize};
use std::{
    hash::{Hash, Hasher},
    ops::BitOr,
};

/// Generic index into one of the tables in the binary format.
pub type TableIndex = u16;

macro_rules! define_index {
    {
        name: $name: ident,
        kind: $kind: ident,
        doc: $comment: literal,
    } => {
        #[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[doc=$comment]
        pub struct $name(pub TableIndex);

        /// Returns an instance of the given `Index`.
        impl $name {
            pub fn new(idx: TableIndex) -> Self {
                Self(idx)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl ModuleIndex for $name {
            const KIND: IndexKind = IndexKind::$kind;

            #[inline]
            fn into_index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_index! {
    name: ModuleHandleIndex,
    kind: ModuleHandle,
    doc: "Index into the `ModuleHandle` table.",
}
define_index! {
    name: DatatypeHandleIndex,
    kind: DatatypeHandle,
    doc: "Index into the `DatatypeHandle` table.",
}
define_index! {
    name: FunctionHandleIndex,
    kind: FunctionHandle,
    doc: "Index into the `FunctionHandle` table.",
}
define_index! {
    name: FieldHandleIndex,
    kind: FieldHandle,
    doc: "Index into the `FieldHandle` table.",
}
define_index! {
    name: StructDefInstantiationIndex,
    kind: StructDefInstantiation,
    doc: "Index into the `StructInstantiation` table.",
}
define_index! {
    name: FunctionInstantiationIndex,
    kind: FunctionInstantiation,
    doc: "Index into the `FunctionInstantiation` table.",
}
define_index! {
    name: FieldInstantiationIndex,
    kind: FieldInstantiation,
    doc: "Index into the `FieldInstantiation` table.",
}
define_index! {
    name: IdentifierIndex,
    kind: Identifier,
    doc: "Index into the `Identifier` table.",
}
define_index! {
    name: AddressIdentifierIndex,
    kind: AddressIdentifier,
    doc: "Index into the `AddressIdentifier` table.",
}
define_index! {
    name: ConstantPoolIndex,
    kind: ConstantPool,
    doc: "Index into the `ConstantPool` table.",
}
define_index! {
    name: SignatureIndex,
    kind: Signature,
    doc: "Index into the `Signature` table.",
}
define_index! {
    name: StructDefinitionIndex,
    kind: StructDefinition,
    doc: "Index into the `StructDefinition` table.",
}
define_index! {
    name: FunctionDefinitionIndex,
    kind: FunctionDefinition,
    doc: "Index into the `FunctionDefinition` table.",
}
define_index! {
    name: EnumDefinitionIndex,
    kind: EnumDefinition,
    doc: "Index into the `EnumDefinition` table.",
}
define_index! {
    name: EnumDefInstantiationIndex,
    kind: EnumDefInstantiation,
    doc: "Index into the `EnumDefInstantiation` table.",
}
define_index! {
    name: VariantHandleIndex,
    kind: VariantHandle,
    doc: "Index into the `VariantHandle` table.",
}
define_index! {
    name: VariantInstantiationHandleIndex,
    kind: VariantInstantiationHandle,
    doc: "Index into the `VariantInstantiationHandle` table.",
}
define_index! {
    name: VariantJumpTableIndex,
    kind: VariantJumpTable,
    doc: "Index into the jump tables of a `CodeUnit`.",
}

/// Index of a local variable in a function.
///
/// Bytecodes that operate on locals carry indexes to the locals of a function.
pub type LocalIndex = u8;
/// Max number of fields in a `StructDefinition`.
pub type MemberCount = u16;
/// Index into the code stream for a jump. The offset is relative to the beginning of
/// the instruction stream.
pub type CodeOffset = u16;
/// The tag of an enum variant, its position in the enum definition.
pub type VariantTag = u16;

/// The pool of identifiers.
pub type IdentifierPool = Vec<Identifier>;
/// The pool of address identifiers (addresses used in ModuleHandles/ModuleIds).
/// Does not include runtime values. Those are placed in the `ConstantPool`
pub type AddressIdentifierPool = Vec<AccountAddress>;
/// The pool of `Constant` values
pub type ConstantPool = Vec<Constant>;
/// The pool of `Signature` instances. Every function definition must define the set of
/// locals used and their types.
pub type SignaturePool = Vec<Signature>;

// Handles refer to both internal and external "entities" and are embedded as indexes
// in the instruction stream.
// Handles define resolution. Resolution is assumed to be by (name, signature)

/// A `ModuleHandle` is a reference to a MOVE module. It is composed by an `address` and a `name`.
///
/// A `ModuleHandle` uniquely identifies a code entity in the blockchain.
/// The `address` is a reference to the account that holds the code and the `name` is used as a
/// key in order to load the module.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ModuleHandle {
    /// Index into the `AddressIdentifierIndex`. Identifies module-holding account's address.
    pub address: AddressIdentifierIndex,
    /// The name of the module published in the code section for the account in `address`.
    pub name: IdentifierIndex,
}

/// A `DatatypeHandle` is a reference to a user defined type. It is composed by a `ModuleHandle`
/// and the name of the type within that module.
///
/// The `DatatypeHandle` is polymorphic: it can have type parameters in its fields and carries the
/// ability constraints for these type parameters (empty list for non-generic types). It also
/// carries the abilities of the type itself.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DatatypeHandle {
    /// The module that defines the type.
    pub module: ModuleHandleIndex,
    /// The name of the type.
    pub name: IdentifierIndex,
    /// Contains the abilities for this type
    /// For any instantiation of this type, the abilities of this type are predicated on
    /// that ability being satisfied for all type parameters.
    pub abilities: AbilitySet,
    /// The type formals (identified by their index into the vec)
    pub type_parameters: Vec<DatatypeTyParameter>,
}

/// A type parameter used in the declaration of a struct or enum.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct DatatypeTyParameter {
    /// The type parameter constraints.
    pub constraints: AbilitySet,
    /// Whether the parameter is declared as phantom.
    pub is_phantom: bool,
}

/// A `FunctionHandle` is a reference to a function. It is composed by a
/// `ModuleHandle` and the name and signature of that function within the module.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FunctionHandle {
    /// The module that defines the function.
    pub module: ModuleHandleIndex,
    /// The name of the function.
    pub name: IdentifierIndex,
    /// The list of arguments to the function.
    pub parameters: SignatureIndex,
    /// The list of return types.
    pub return_: SignatureIndex,
    /// The type formals (identified by their index into the vec) and their constraints
    pub type_parameters: Vec<AbilitySet>,
}

/// A field access info (owner type and offset)
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FieldHandle {
    pub owner: StructDefinitionIndex,
    pub field: MemberCount,
}

/// A variant of an enum definition, used by the variant pack/unpack bytecodes.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct VariantHandle {
    pub enum_def: EnumDefinitionIndex,
    pub variant: VariantTag,
}

/// A variant of an enum instantiation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct VariantInstantiationHandle {
    pub enum_def: EnumDefInstantiationIndex,
    pub variant: VariantTag,
}

// DEFINITIONS:
// Definitions are the module code. So the set of types and functions in the module.

/// `StructFieldInformation` indicates whether a struct is native or has user-specified fields
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StructFieldInformation {
    Native,
    Declared(Vec<FieldDefinition>),
}

//
// Instantiations
//
// Instantiations point to a generic handle and its instantiation.
// The instantiation can be partial.
// So, for example, `S<T, W>`, `S<u8, bool>`, `S<T, u8>`, `S<X<T>, address>` are all
// `StructInstantiation`s

/// A complete or partial instantiation of a generic struct
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StructDefInstantiation {
    pub def: StructDefinitionIndex,
    pub type_parameters: SignatureIndex,
}

/// A complete or partial instantiation of a function
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FunctionInstantiation {
    pub handle: FunctionHandleIndex,
    pub type_parameters: SignatureIndex,
}

/// A complete or partial instantiation of a field (or the type of it).
///
/// A `FieldInstantiation` points to a generic `FieldHandle` and the instantiation
/// of the owner type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FieldInstantiation {
    pub handle: FieldHandleIndex,
    pub type_parameters: SignatureIndex,
}

/// A complete or partial instantiation of a generic enum
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EnumDefInstantiation {
    pub def: EnumDefinitionIndex,
    pub type_parameters: SignatureIndex,
}

/// A `StructDefinition` is a type definition. It either indicates it is native or defines all the
/// user-specified fields declared on the type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StructDefinition {
    /// The `DatatypeHandle` for this `StructDefinition`. This has the name and the abilities
    /// for the type.
    pub struct_handle: DatatypeHandleIndex,
    /// Contains either
    /// - Information indicating the struct is native and has no accessible fields
    /// - Information indicating the number of fields and the start `FieldDefinition`s
    pub field_information: StructFieldInformation,
}

/// A `FieldDefinition` is the definition of a field: its name and the field type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDefinition {
    /// The name of the field.
    pub name: IdentifierIndex,
    /// The type of the field.
    pub signature: TypeSignature,
}

/// An `EnumDefinition` is a type definition made of a list of variants, each with its own
/// fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumDefinition {
    pub enum_handle: DatatypeHandleIndex,
    pub variants: Vec<VariantDefinition>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantDefinition {
    pub variant_name: IdentifierIndex,
    pub fields: Vec<FieldDefinition>,
}

/// `Visibility` restricts the accessibility of the associated entity.
/// - For function visibility, it restricts who may call into the associated function.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Visibility {
    /// Accessible within its defining module only.
    #[default]
    Private = 0x0,
    /// Accessible by any module or script outside of its declaring module.
    Public = 0x1,
    // DEPRECATED for separate entry modifier
    // Accessible by any script or other `Script` functions from any module
    // Script = 0x2,
    /// Accessible by this module as well as modules declared in the friend list.
    Friend = 0x3,
}

impl Visibility {
    pub const DEPRECATED_SCRIPT: u8 = 0x2;
}

impl std::convert::TryFrom<u8> for Visibility {
    type Error = ();

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            x if x == Visibility::Private as u8 => Ok(Visibility::Private),
            x if x == Visibility::Public as u8 => Ok(Visibility::Public),
            x if x == Visibility::Friend as u8 => Ok(Visibility::Friend),
            _ => Err(()),
        }
    }
}

/// A `FunctionDefinition` is the implementation of a function. It defines
/// the *prototype* of the function and the function body.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FunctionDefinition {
    /// The prototype of the function (module, name, signature).
    pub function: FunctionHandleIndex,
    /// The visibility of this function.
    pub visibility: Visibility,
    /// Marker if the function is intended as an entry function.
    pub is_entry: bool,
    /// List of locally defined types (declared in this module) with the `Key` ability
    /// that the procedure might access. Only carried by binaries that still use the
    /// global storage bytecodes.
    pub acquires_global_resources: Vec<StructDefinitionIndex>,
    /// Code for this function.
    pub code: Option<CodeUnit>,
}

impl FunctionDefinition {
    // Deprecated public bit, deprecated in favor a the Visibility enum
    pub const DEPRECATED_PUBLIC_BIT: u8 = 0b01;
    /// A native function implemented in Rust.
    pub const NATIVE: u8 = 0b10;
    /// An entry function, intended to be used as an entry point to execution
    pub const ENTRY: u8 = 0b100;

    /// Returns whether the FunctionDefinition is native.
    pub fn is_native(&self) -> bool {
        self.code.is_none()
    }
}

// Signature
// A signature can be for a type (field, local) or for a function - return type: (arguments).
// Signature usually don't carry a size and you have to read them to get to the end.

/// A type definition. `SignatureToken` allows the definition of the set of known types and their
/// composition.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TypeSignature(pub SignatureToken);

/// A `Signature` is the list of locals used by a function.
///
/// Locals include the arguments to the function from position `0` to argument `count - 1`.
/// The remaining elements are the type of each local.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Signature(pub Vec<SignatureToken>);

impl Signature {
    /// Length of the `Signature`.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the function has no locals (both arguments or locals).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Type parameters are encoded as indices. This index can also be used to lookup the kind of a
/// type parameter in the `FunctionHandle` and `DatatypeHandle`.
pub type TypeParameterIndex = u16;

/// An `Ability` classifies what operations are permitted for a given type
#[repr(u8)]
#[derive(Debug, Clone, Eq, Copy, Hash, Ord, PartialEq, PartialOrd)]
pub enum Ability {
    /// Allows values of types with this ability to be copied, via CopyLoc or ReadRef
    Copy = 0x1,
    /// Allows values of types with this ability to be dropped, via Pop, WriteRef, StLoc, Eq, Neq,
    /// or if left in a local when Ret is invoked
    /// Technically also needed for numeric operations (Add, BitAnd, Shift, etc), but all
    /// of the types that can be used with those operations have Drop
    Drop = 0x2,
    /// Allows values of types with this ability to exist inside a struct in global storage
    Store = 0x4,
    /// Allows the type to serve as a key for global storage operations
    Key = 0x8,
}

impl Ability {
    fn from_u8(u: u8) -> Option<Self> {
        match u {
            0x1 => Some(Ability::Copy),
            0x2 => Some(Ability::Drop),
            0x4 => Some(Ability::Store),
            0x8 => Some(Ability::Key),
            _ => None,
        }
    }
}

/// A set of `Ability`s
#[derive(Clone, Eq, Copy, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct AbilitySet(u8);

impl AbilitySet {
    /// The empty ability set
    pub const EMPTY: Self = Self(0);
    /// Ability set containing all abilities
    pub const ALL: Self = Self(
        // Cannot use AbilitySet bitor because it is not const
        (Ability::Copy as u8)
            | (Ability::Drop as u8)
            | (Ability::Store as u8)
            | (Ability::Key as u8),
    );

    pub fn has_ability(self, ability: Ability) -> bool {
        let a = ability as u8;
        (a & self.0) == a
    }

    pub fn has_copy(self) -> bool {
        self.has_ability(Ability::Copy)
    }

    pub fn has_key(self) -> bool {
        self.has_ability(Ability::Key)
    }

    pub fn is_subset(self, other: Self) -> bool {
        (self.0 & other.0) == self.0
    }

    pub fn into_u8(self) -> u8 {
        self.0
    }

    pub fn from_u8(byte: u8) -> Option<Self> {
        // If there is a bit set in the read `byte`, that bit must be set in the
        // `AbilitySet` containing all `Ability`s
        // This corresponds the byte being a bit set subset of ALL
        // The byte is a subset of ALL if the intersection of the two is the original byte
        if Self(byte).is_subset(Self::ALL) {
            Some(Self(byte))
        } else {
            None
        }
    }

    pub fn iter(self) -> impl Iterator<Item = Ability> {
        [Ability::Copy, Ability::Drop, Ability::Store, Ability::Key]
            .into_iter()
            .filter(move |ability| self.has_ability(*ability))
    }
}

impl BitOr<Ability> for AbilitySet {
    type Output = Self;
    fn bitor(self, rhs: Ability) -> Self {
        AbilitySet(self.0 | (rhs as u8))
    }
}

impl BitOr<AbilitySet> for AbilitySet {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        AbilitySet(self.0 | rhs.0)
    }
}

impl FromIterator<Ability> for AbilitySet {
    fn from_iter<T: IntoIterator<Item = Ability>>(iter: T) -> Self {
        iter.into_iter().fold(AbilitySet::EMPTY, |set, a| set | a)
    }
}

impl std::fmt::Debug for AbilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, ability) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", ability)?;
        }
        write!(f, "]")
    }
}

/// A `SignatureToken` is a type declaration for a location.
///
/// Any location in the system has a TypeSignature.
/// A TypeSignature is also used in composed signatures.
///
/// A SignatureToken can express more types than the VM can handle safely, and correctness is
/// enforced by the verifier.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SignatureToken {
    /// Boolean, `true` or `false`.
    Bool,
    /// Unsigned integers, 8 bits length.
    U8,
    /// Unsigned integers, 64 bits length.
    U64,
    /// Unsigned integers, 128 bits length.
    U128,
    /// Address, a 32 bytes immutable type.
    Address,
    /// Signer, a 32 bytes immutable type representing the capability to publish at an address
    Signer,
    /// Vector
    Vector(Box<SignatureToken>),
    /// User defined type
    Datatype(DatatypeHandleIndex),
    DatatypeInstantiation(Box<(DatatypeHandleIndex, Vec<SignatureToken>)>),
    /// Reference to a type.
    Reference(Box<SignatureToken>),
    /// Mutable reference to a type.
    MutableReference(Box<SignatureToken>),
    /// Type parameter.
    TypeParameter(TypeParameterIndex),
    /// Unsigned integers, 16 bits length.
    U16,
    /// Unsigned integers, 32 bits length.
    U32,
    /// Unsigned integers, 256 bits length.
    U256,
}

/// An iterator to help traverse the `SignatureToken` in a non-recursive fashion to avoid
/// overflowing the stack.
///
/// Traversal order: root -> left -> right
pub struct SignatureTokenPreorderTraversalIter<'a> {
    stack: Vec<&'a SignatureToken>,
}

impl<'a> Iterator for SignatureTokenPreorderTraversalIter<'a> {
    type Item = &'a SignatureToken;

    fn next(&mut self) -> Option<Self::Item> {
        use SignatureToken::*;

        match self.stack.pop() {
            Some(tok) => {
                match tok {
                    Reference(inner_tok) | MutableReference(inner_tok) | Vector(inner_tok) => {
                        self.stack.push(inner_tok)
                    }

                    DatatypeInstantiation(inst) => {
                        let (_, inner_toks) = &**inst;
                        self.stack.extend(inner_toks.iter().rev())
                    }

                    Signer | Bool | Address | U8 | U16 | U32 | U64 | U128 | U256 | Datatype(_)
                    | TypeParameter(_) => (),
                }
                Some(tok)
            }
            None => None,
        }
    }
}

impl SignatureToken {
    pub fn preorder_traversal(&self) -> SignatureTokenPreorderTraversalIter<'_> {
        SignatureTokenPreorderTraversalIter { stack: vec![self] }
    }
}

/// A `Constant` is a serialized value along with its type. That type will be deserialized by the
/// loader/evaluator.
///
/// Two constants are the same constant when their payloads match; the type only describes how
/// to read the payload.
#[derive(Clone, Debug)]
pub struct Constant {
    pub type_: SignatureToken,
    pub data: Vec<u8>,
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Constant {}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

/// Opaque key/value pair attached to a module.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// The key identifying the type of metadata.
    pub key: Vec<u8>,
    /// The value of the metadata.
    pub value: Vec<u8>,
}

/// A `CodeUnit` is the body of a function. It has the function header and the instruction stream.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CodeUnit {
    /// List of locals type. All locals are typed.
    pub locals: SignatureIndex,
    /// Code stream, function body.
    pub code: Vec<Bytecode>,
    /// Jump tables used by `VariantSwitch` instructions, indexed by `VariantJumpTableIndex`.
    pub jump_tables: Vec<VariantJumpTable>,
}

/// A jump table for an enum: where to branch to for each variant of `head_enum`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantJumpTable {
    pub head_enum: EnumDefinitionIndex,
    pub jump_table: JumpTableInner,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JumpTableInner {
    /// One code offset per variant, in variant tag order.
    Full(Vec<CodeOffset>),
}

/// `Bytecode` is a VM instruction of variable size. The type of the bytecode (opcode) defines
/// the size of the bytecode.
///
/// Bytecodes operate on a stack machine and each bytecode has side effect on the stack and the
/// instruction stream.
#[derive(Clone, Hash, Eq, PartialEq, Debug)]
pub enum Bytecode {
    /// Pop and discard the value at the top of the stack.
    Pop,
    /// Return from function, possibly with values according to the return types in the
    /// function signature.
    Ret,
    /// Branch to the instruction at position `CodeOffset` if the value at the top of the stack
    /// is true. Code offsets are relative to the start of the instruction stream.
    BrTrue(CodeOffset),
    /// Branch to the instruction at position `CodeOffset` if the value at the top of the stack
    /// is false.
    BrFalse(CodeOffset),
    /// Branch unconditionally to the instruction at position `CodeOffset`.
    Branch(CodeOffset),
    /// Push a U8 constant onto the stack.
    LdU8(u8),
    /// Push a U64 constant onto the stack.
    LdU64(u64),
    /// Push a U128 constant onto the stack.
    LdU128(Box<u128>),
    /// Convert the value at the top of the stack into u8.
    CastU8,
    /// Convert the value at the top of the stack into u64.
    CastU64,
    /// Convert the value at the top of the stack into u128.
    CastU128,
    /// Push a `Constant` onto the stack.
    LdConst(ConstantPoolIndex),
    /// Push `true` onto the stack.
    LdTrue,
    /// Push `false` onto the stack.
    LdFalse,
    /// Push the local identified by `LocalIndex` onto the stack. The value is copied and the
    /// local is still safe to use.
    CopyLoc(LocalIndex),
    /// Push the local identified by `LocalIndex` onto the stack. The local is moved and it is
    /// invalid to use from that point on, unless a store operation writes to the local before
    /// any read to that local.
    MoveLoc(LocalIndex),
    /// Pop value from the top of the stack and store it into the function locals at
    /// position `LocalIndex`.
    StLoc(LocalIndex),
    /// Call a function. The stack has the arguments pushed first to last.
    Call(FunctionHandleIndex),
    CallGeneric(FunctionInstantiationIndex),
    /// Create an instance of the type specified via `StructDefinitionIndex` and push it on the
    /// stack. The values of the fields of the struct, in the order they appear in the struct
    /// declaration, must be pushed on the stack.
    Pack(StructDefinitionIndex),
    PackGeneric(StructDefInstantiationIndex),
    /// Destroy an instance of a type and push the values bound to each field on the stack.
    Unpack(StructDefinitionIndex),
    UnpackGeneric(StructDefInstantiationIndex),
    /// Read a reference. The reference is on the stack, it is consumed and the value read is
    /// pushed on the stack.
    ReadRef,
    /// Write to a reference. The reference and the value are on the stack and are consumed.
    WriteRef,
    /// Convert a mutable reference to an immutable reference.
    FreezeRef,
    /// Load a mutable reference to a local identified by LocalIndex.
    MutBorrowLoc(LocalIndex),
    /// Load an immutable reference to a local identified by LocalIndex.
    ImmBorrowLoc(LocalIndex),
    /// Load a mutable reference to a field identified by `FieldHandleIndex`.
    MutBorrowField(FieldHandleIndex),
    MutBorrowFieldGeneric(FieldInstantiationIndex),
    /// Load an immutable reference to a field identified by `FieldHandleIndex`.
    ImmBorrowField(FieldHandleIndex),
    ImmBorrowFieldGeneric(FieldInstantiationIndex),
    Add,
    Sub,
    Mul,
    Mod,
    Div,
    BitOr,
    BitAnd,
    Xor,
    Or,
    And,
    Not,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    /// Abort execution with errorcode.
    Abort,
    /// No operation.
    Nop,
    Shl,
    Shr,
    /// Create a vector by packing a statically known number of elements from the stack.
    VecPack(SignatureIndex, u64),
    /// Return the length of the vector.
    VecLen(SignatureIndex),
    /// Acquire an immutable reference to the element at a given index of the vector.
    VecImmBorrow(SignatureIndex),
    /// Acquire a mutable reference to the element at a given index of the vector.
    VecMutBorrow(SignatureIndex),
    /// Add an element to the end of the vector.
    VecPushBack(SignatureIndex),
    /// Pop an element from the end of vector.
    VecPopBack(SignatureIndex),
    /// Destroy the vector and unpack a statically known number of elements onto the stack.
    VecUnpack(SignatureIndex, u64),
    /// Swaps the elements at two indices in the vector.
    VecSwap(SignatureIndex),
    /// Push a U16 constant onto the stack.
    LdU16(u16),
    /// Push a U32 constant onto the stack.
    LdU32(u32),
    /// Push a U256 constant onto the stack.
    LdU256(Box<ethnum::U256>),
    CastU16,
    CastU32,
    CastU256,
    /// Create a variant of an enum and push it on the stack.
    PackVariant(VariantHandleIndex),
    PackVariantGeneric(VariantInstantiationHandleIndex),
    /// Destroy a variant value and push the values of its fields on the stack.
    UnpackVariant(VariantHandleIndex),
    UnpackVariantImmRef(VariantHandleIndex),
    UnpackVariantMutRef(VariantHandleIndex),
    UnpackVariantGeneric(VariantInstantiationHandleIndex),
    UnpackVariantGenericImmRef(VariantInstantiationHandleIndex),
    UnpackVariantGenericMutRef(VariantInstantiationHandleIndex),
    /// Branch on the tag of the enum reference on top of the stack, using the jump table
    /// at the given index of the enclosing `CodeUnit`.
    VariantSwitch(VariantJumpTableIndex),
    // ******** DEPRECATED BYTECODES ********
    // Global storage bytecodes. They are only decoded and encoded, never executed.
    ExistsDeprecated(StructDefinitionIndex),
    ExistsGenericDeprecated(StructDefInstantiationIndex),
    MutBorrowGlobalDeprecated(StructDefinitionIndex),
    MutBorrowGlobalGenericDeprecated(StructDefInstantiationIndex),
    ImmBorrowGlobalDeprecated(StructDefinitionIndex),
    ImmBorrowGlobalGenericDeprecated(StructDefInstantiationIndex),
    MoveFromDeprecated(StructDefinitionIndex),
    MoveFromGenericDeprecated(StructDefInstantiationIndex),
    MoveToDeprecated(StructDefinitionIndex),
    MoveToGenericDeprecated(StructDefInstantiationIndex),
}
