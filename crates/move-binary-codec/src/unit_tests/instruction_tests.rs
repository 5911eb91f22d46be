// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    deserializer::load_code_test_entry,
    errors::StatusCode,
    file_format::*,
    file_format_common::*,
    serializer::serialize_code,
    IndexKind,
};
use std::collections::BTreeSet;

fn encode(code: &[Bytecode]) -> Vec<u8> {
    let mut binary = vec![];
    serialize_code(&mut binary, code);
    binary
}

fn status(bytes: &[u8], version: u32) -> StatusCode {
    load_code_test_entry(bytes, version)
        .unwrap_err()
        .major_status()
}

/// Every instruction with its encoding: the opcode byte followed by its operands.
fn every_instruction() -> Vec<(Bytecode, Vec<u8>)> {
    use Bytecode as B;
    use Opcodes as O;
    let op = |opcode: Opcodes, operands: &[u8]| {
        let mut bytes = vec![opcode as u8];
        bytes.extend_from_slice(operands);
        bytes
    };
    vec![
        (B::Pop, op(O::POP, &[])),
        (B::Ret, op(O::RET, &[])),
        (B::BrTrue(7), op(O::BR_TRUE, &[7])),
        (B::BrFalse(300), op(O::BR_FALSE, &[0xAC, 0x02])),
        (B::Branch(0), op(O::BRANCH, &[0])),
        (B::LdU64(0x0102_0304_0506_0708), op(O::LD_U64, &[8, 7, 6, 5, 4, 3, 2, 1])),
        (B::LdConst(ConstantPoolIndex(2)), op(O::LD_CONST, &[2])),
        (B::LdTrue, op(O::LD_TRUE, &[])),
        (B::LdFalse, op(O::LD_FALSE, &[])),
        (B::CopyLoc(200), op(O::COPY_LOC, &[200])),
        (B::MoveLoc(255), op(O::MOVE_LOC, &[255])),
        (B::StLoc(1), op(O::ST_LOC, &[1])),
        (B::MutBorrowLoc(2), op(O::MUT_BORROW_LOC, &[2])),
        (B::ImmBorrowLoc(3), op(O::IMM_BORROW_LOC, &[3])),
        (B::MutBorrowField(FieldHandleIndex(4)), op(O::MUT_BORROW_FIELD, &[4])),
        (B::ImmBorrowField(FieldHandleIndex(5)), op(O::IMM_BORROW_FIELD, &[5])),
        (B::Call(FunctionHandleIndex(300)), op(O::CALL, &[0xAC, 0x02])),
        (B::Pack(StructDefinitionIndex(6)), op(O::PACK, &[6])),
        (B::Unpack(StructDefinitionIndex(7)), op(O::UNPACK, &[7])),
        (B::ReadRef, op(O::READ_REF, &[])),
        (B::WriteRef, op(O::WRITE_REF, &[])),
        (B::Add, op(O::ADD, &[])),
        (B::Sub, op(O::SUB, &[])),
        (B::Mul, op(O::MUL, &[])),
        (B::Mod, op(O::MOD, &[])),
        (B::Div, op(O::DIV, &[])),
        (B::BitOr, op(O::BIT_OR, &[])),
        (B::BitAnd, op(O::BIT_AND, &[])),
        (B::Xor, op(O::XOR, &[])),
        (B::Or, op(O::OR, &[])),
        (B::And, op(O::AND, &[])),
        (B::Not, op(O::NOT, &[])),
        (B::Eq, op(O::EQ, &[])),
        (B::Neq, op(O::NEQ, &[])),
        (B::Lt, op(O::LT, &[])),
        (B::Gt, op(O::GT, &[])),
        (B::Le, op(O::LE, &[])),
        (B::Ge, op(O::GE, &[])),
        (B::Abort, op(O::ABORT, &[])),
        (B::Nop, op(O::NOP, &[])),
        (
            B::ExistsDeprecated(StructDefinitionIndex(1)),
            op(O::EXISTS_DEPRECATED, &[1]),
        ),
        (
            B::MutBorrowGlobalDeprecated(StructDefinitionIndex(2)),
            op(O::MUT_BORROW_GLOBAL_DEPRECATED, &[2]),
        ),
        (
            B::ImmBorrowGlobalDeprecated(StructDefinitionIndex(3)),
            op(O::IMM_BORROW_GLOBAL_DEPRECATED, &[3]),
        ),
        (
            B::MoveFromDeprecated(StructDefinitionIndex(4)),
            op(O::MOVE_FROM_DEPRECATED, &[4]),
        ),
        (
            B::MoveToDeprecated(StructDefinitionIndex(5)),
            op(O::MOVE_TO_DEPRECATED, &[5]),
        ),
        (B::FreezeRef, op(O::FREEZE_REF, &[])),
        (B::Shl, op(O::SHL, &[])),
        (B::Shr, op(O::SHR, &[])),
        (B::LdU8(0xAB), op(O::LD_U8, &[0xAB])),
        (
            B::LdU128(Box::new(1)),
            op(O::LD_U128, &[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
        ),
        (B::CastU8, op(O::CAST_U8, &[])),
        (B::CastU64, op(O::CAST_U64, &[])),
        (B::CastU128, op(O::CAST_U128, &[])),
        (
            B::MutBorrowFieldGeneric(FieldInstantiationIndex(8)),
            op(O::MUT_BORROW_FIELD_GENERIC, &[8]),
        ),
        (
            B::ImmBorrowFieldGeneric(FieldInstantiationIndex(9)),
            op(O::IMM_BORROW_FIELD_GENERIC, &[9]),
        ),
        (
            B::CallGeneric(FunctionInstantiationIndex(10)),
            op(O::CALL_GENERIC, &[10]),
        ),
        (
            B::PackGeneric(StructDefInstantiationIndex(11)),
            op(O::PACK_GENERIC, &[11]),
        ),
        (
            B::UnpackGeneric(StructDefInstantiationIndex(12)),
            op(O::UNPACK_GENERIC, &[12]),
        ),
        (
            B::ExistsGenericDeprecated(StructDefInstantiationIndex(13)),
            op(O::EXISTS_GENERIC_DEPRECATED, &[13]),
        ),
        (
            B::MutBorrowGlobalGenericDeprecated(StructDefInstantiationIndex(14)),
            op(O::MUT_BORROW_GLOBAL_GENERIC_DEPRECATED, &[14]),
        ),
        (
            B::ImmBorrowGlobalGenericDeprecated(StructDefInstantiationIndex(15)),
            op(O::IMM_BORROW_GLOBAL_GENERIC_DEPRECATED, &[15]),
        ),
        (
            B::MoveFromGenericDeprecated(StructDefInstantiationIndex(16)),
            op(O::MOVE_FROM_GENERIC_DEPRECATED, &[16]),
        ),
        (
            B::MoveToGenericDeprecated(StructDefInstantiationIndex(17)),
            op(O::MOVE_TO_GENERIC_DEPRECATED, &[17]),
        ),
        (B::VecPack(SignatureIndex(1), 300), op(O::VEC_PACK, &[1, 0xAC, 0x02])),
        (B::VecLen(SignatureIndex(2)), op(O::VEC_LEN, &[2])),
        (B::VecImmBorrow(SignatureIndex(3)), op(O::VEC_IMM_BORROW, &[3])),
        (B::VecMutBorrow(SignatureIndex(4)), op(O::VEC_MUT_BORROW, &[4])),
        (B::VecPushBack(SignatureIndex(5)), op(O::VEC_PUSH_BACK, &[5])),
        (B::VecPopBack(SignatureIndex(6)), op(O::VEC_POP_BACK, &[6])),
        (B::VecUnpack(SignatureIndex(7), 2), op(O::VEC_UNPACK, &[7, 2])),
        (B::VecSwap(SignatureIndex(8)), op(O::VEC_SWAP, &[8])),
        (B::LdU16(0x0102), op(O::LD_U16, &[2, 1])),
        (B::LdU32(0x0102_0304), op(O::LD_U32, &[4, 3, 2, 1])),
        (
            B::LdU256(Box::new(ethnum::U256::from(2u8))),
            op(O::LD_U256, &{
                let mut bytes = [0u8; 32];
                bytes[0] = 2;
                bytes
            }),
        ),
        (B::CastU16, op(O::CAST_U16, &[])),
        (B::CastU32, op(O::CAST_U32, &[])),
        (B::CastU256, op(O::CAST_U256, &[])),
        (B::PackVariant(VariantHandleIndex(1)), op(O::PACK_VARIANT, &[1])),
        (
            B::PackVariantGeneric(VariantInstantiationHandleIndex(2)),
            op(O::PACK_VARIANT_GENERIC, &[2]),
        ),
        (B::UnpackVariant(VariantHandleIndex(3)), op(O::UNPACK_VARIANT, &[3])),
        (
            B::UnpackVariantImmRef(VariantHandleIndex(4)),
            op(O::UNPACK_VARIANT_IMM_REF, &[4]),
        ),
        (
            B::UnpackVariantMutRef(VariantHandleIndex(5)),
            op(O::UNPACK_VARIANT_MUT_REF, &[5]),
        ),
        (
            B::UnpackVariantGeneric(VariantInstantiationHandleIndex(6)),
            op(O::UNPACK_VARIANT_GENERIC, &[6]),
        ),
        (
            B::UnpackVariantGenericImmRef(VariantInstantiationHandleIndex(7)),
            op(O::UNPACK_VARIANT_GENERIC_IMM_REF, &[7]),
        ),
        (
            B::UnpackVariantGenericMutRef(VariantInstantiationHandleIndex(8)),
            op(O::UNPACK_VARIANT_GENERIC_MUT_REF, &[8]),
        ),
        (
            B::VariantSwitch(VariantJumpTableIndex(9)),
            op(O::VARIANT_SWITCH, &[9]),
        ),
    ]
}

#[test]
fn every_opcode_is_covered() {
    let opcodes: BTreeSet<u8> = every_instruction()
        .iter()
        .map(|(_, bytes)| bytes[0])
        .collect();
    assert_eq!(opcodes.len(), 86);
    assert_eq!(opcodes, (0x01..=0x56).collect::<BTreeSet<u8>>());
}

#[test]
fn instruction_encodings() {
    for (instruction, expected) in every_instruction() {
        assert_eq!(instruction_key(&instruction), expected[0]);

        let bytes = encode(std::slice::from_ref(&instruction));
        let mut framed = vec![1];
        framed.extend_from_slice(&expected);
        assert_eq!(bytes, framed, "encoding of {:?}", instruction);

        assert_eq!(
            load_code_test_entry(&bytes, VERSION_MAX).unwrap(),
            vec![instruction]
        );
    }
}

#[test]
fn whole_stream_round_trip() {
    let code: Vec<Bytecode> = every_instruction()
        .into_iter()
        .map(|(instruction, _)| instruction)
        .collect();
    let bytes = encode(&code);
    assert_eq!(&bytes[..2], &[86, 0x01]);
    assert_eq!(load_code_test_entry(&bytes, VERSION_MAX).unwrap(), code);
}

#[test]
fn wide_literals_at_their_limits() {
    let code = vec![
        Bytecode::LdU128(Box::new(u128::MAX)),
        Bytecode::LdU256(Box::new(ethnum::U256::MAX)),
        Bytecode::LdU64(u64::MAX),
        Bytecode::VecPack(SignatureIndex(0), u64::MAX),
    ];
    let bytes = encode(&code);
    assert_eq!(&bytes[2..18], &[0xFF; 16]);
    assert_eq!(&bytes[19..51], &[0xFF; 32]);
    assert_eq!(load_code_test_entry(&bytes, VERSION_MAX).unwrap(), code);
}

#[test]
fn unknown_opcodes() {
    assert_eq!(status(&[1, 0x00], VERSION_MAX), StatusCode::UNKNOWN_OPCODE);
    assert_eq!(status(&[1, 0x57], VERSION_MAX), StatusCode::UNKNOWN_OPCODE);
    assert_eq!(status(&[1, 0xFF], VERSION_MAX), StatusCode::UNKNOWN_OPCODE);
}

#[test]
fn truncated_operands() {
    assert_eq!(
        status(&[1, Opcodes::LD_U16 as u8, 0x01], VERSION_MAX),
        StatusCode::BAD_U16
    );
    assert_eq!(
        status(&[1, Opcodes::LD_U32 as u8, 0x01, 0x02], VERSION_MAX),
        StatusCode::BAD_U32
    );
    assert_eq!(
        status(&[1, Opcodes::LD_U64 as u8, 0, 0, 0], VERSION_MAX),
        StatusCode::BAD_U64
    );
    assert_eq!(
        status(&[1, Opcodes::LD_U128 as u8, 0], VERSION_MAX),
        StatusCode::BAD_U128
    );
    let mut ld_u256 = vec![1, Opcodes::LD_U256 as u8];
    ld_u256.extend_from_slice(&[0; 31]);
    assert_eq!(status(&ld_u256, VERSION_MAX), StatusCode::BAD_U256);

    assert_eq!(
        status(&[1, Opcodes::LD_U8 as u8], VERSION_MAX),
        StatusCode::MALFORMED
    );
    assert_eq!(
        status(&[1, Opcodes::COPY_LOC as u8], VERSION_MAX),
        StatusCode::MALFORMED
    );
    assert_eq!(
        status(&[1, Opcodes::CALL as u8, 0x80], VERSION_MAX),
        StatusCode::INVALID_VARINT
    );
}

#[test]
fn stream_shorter_than_its_count() {
    assert_eq!(
        status(&[2, Opcodes::RET as u8], VERSION_MAX),
        StatusCode::MALFORMED
    );
    assert_eq!(status(&[], VERSION_MAX), StatusCode::INVALID_VARINT);
}

#[test]
fn opcodes_are_gated_by_version() {
    let cases = [
        (Opcodes::VEC_LEN, vec![0], VERSION_4),
        (Opcodes::VEC_SWAP, vec![0], VERSION_4),
        (Opcodes::LD_U16, vec![0, 0], VERSION_6),
        (Opcodes::CAST_U256, vec![], VERSION_6),
        (Opcodes::PACK_VARIANT, vec![0], VERSION_7),
        (Opcodes::VARIANT_SWITCH, vec![0], VERSION_7),
    ];
    for (opcode, operands, introduced_in) in cases {
        let mut bytes = vec![1, opcode as u8];
        bytes.extend_from_slice(&operands);
        let err = load_code_test_entry(&bytes, introduced_in - 1).unwrap_err();
        assert_eq!(err.major_status(), StatusCode::MALFORMED);
        assert!(load_code_test_entry(&bytes, introduced_in).is_ok());
    }

    // available since the first version
    let mut ld_u128 = vec![1, Opcodes::LD_U128 as u8];
    ld_u128.extend_from_slice(&[0; 16]);
    assert!(load_code_test_entry(&ld_u128, VERSION_1).is_ok());
    assert!(load_code_test_entry(&[1, Opcodes::MOVE_TO_DEPRECATED as u8, 0], VERSION_1).is_ok());
}

#[test]
fn bytecode_count_limit() {
    let mut bytes = vec![];
    write_u64_as_uleb128(&mut bytes, BYTECODE_COUNT_MAX + 1);
    bytes.extend(std::iter::repeat(Opcodes::NOP as u8).take(BYTECODE_COUNT_MAX as usize + 1));
    assert_eq!(status(&bytes, VERSION_MAX), StatusCode::MALFORMED);

    let mut bytes = vec![];
    write_u64_as_uleb128(&mut bytes, BYTECODE_COUNT_MAX);
    bytes.extend(std::iter::repeat(Opcodes::NOP as u8).take(BYTECODE_COUNT_MAX as usize));
    assert_eq!(
        load_code_test_entry(&bytes, VERSION_MAX).unwrap().len(),
        BYTECODE_COUNT_MAX as usize
    );
}

#[test]
fn failures_carry_the_instruction_offset() {
    let bytes = [3, Opcodes::POP as u8, Opcodes::RET as u8, 0xFF];
    let (status, _, indices) = load_code_test_entry(&bytes, VERSION_MAX)
        .unwrap_err()
        .all_data();
    assert_eq!(status, StatusCode::UNKNOWN_OPCODE);
    assert_eq!(indices, vec![(IndexKind::CodeDefinition, 2)]);

    let bytes = [1, Opcodes::LD_U64 as u8, 1, 2];
    let (status, _, indices) = load_code_test_entry(&bytes, VERSION_MAX)
        .unwrap_err()
        .all_data();
    assert_eq!(status, StatusCode::BAD_U64);
    assert_eq!(indices, vec![(IndexKind::CodeDefinition, 0)]);
}
