// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    binary_config::{BinaryConfig, TableConfig},
    compiled_module::empty_module,
    errors::StatusCode,
    file_format_common::*,
    CompiledModule,
};

#[test]
fn standard_config() {
    let config = BinaryConfig::standard();
    assert_eq!(config.max_binary_format_version, VERSION_MAX);
    assert_eq!(config.min_binary_format_version, VERSION_1);
    assert!(config.check_no_extraneous_bytes);
    assert!(!config.allow_unpublishable());
    assert_eq!(config.table_config, TableConfig::legacy());

    assert!(BinaryConfig::new_unpublishable().allow_unpublishable());
    assert!(!BinaryConfig::with_extraneous_bytes_check(false).check_no_extraneous_bytes);
}

#[test]
fn config_json_round_trip() {
    let config = BinaryConfig::new_unpublishable();
    let json = serde_json::to_string(&config).unwrap();
    let decoded: BinaryConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, config);
    assert!(decoded.allow_unpublishable());
}

#[test]
fn unpublishable_flag_defaults_to_off() {
    let mut value = serde_json::to_value(BinaryConfig::standard()).unwrap();
    value
        .as_object_mut()
        .unwrap()
        .remove("allow_unpublishable");
    let decoded: BinaryConfig = serde_json::from_value(value).unwrap();
    assert!(!decoded.allow_unpublishable());
    assert_eq!(decoded, BinaryConfig::standard());
}

#[test]
fn extraneous_bytes_check_can_be_disabled() {
    let mut bytes = empty_module().serialize();
    bytes.extend_from_slice(&[0xDE, 0xAD]);
    assert_eq!(
        CompiledModule::deserialize(&bytes)
            .unwrap_err()
            .major_status(),
        StatusCode::TRAILING_BYTES
    );
    let module = CompiledModule::deserialize_with_config(
        &bytes,
        &BinaryConfig::with_extraneous_bytes_check(false),
    )
    .unwrap();
    assert_eq!(module, empty_module());
}

#[test]
fn max_version_is_capped_by_the_codec() {
    let config = BinaryConfig::legacy(VERSION_MAX + 10, VERSION_MIN, true);
    let mut bytes = empty_module().serialize();
    let flavored = BinaryFlavor::encode_version(VERSION_MAX + 1).to_le_bytes();
    bytes[BinaryConstants::MOVE_MAGIC_SIZE..BinaryConstants::MOVE_MAGIC_SIZE + 4]
        .copy_from_slice(&flavored);
    assert_eq!(
        CompiledModule::deserialize_with_config(&bytes, &config)
            .unwrap_err()
            .major_status(),
        StatusCode::UNKNOWN_VERSION
    );
}

#[test]
fn decode_and_encode_entry_points() {
    let module = empty_module();
    let bytes = crate::encode(&module);
    assert_eq!(bytes, module.serialize());
    assert_eq!(
        crate::decode(&bytes, &BinaryConfig::standard()).unwrap(),
        module
    );
}
