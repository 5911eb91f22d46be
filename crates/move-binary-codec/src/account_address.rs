// Copyright (c) The Diem Core Contributors
// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A struct that represents an account address.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccountAddress([u8; AccountAddress::LENGTH]);

impl AccountAddress {
    pub const fn new(address: [u8; Self::LENGTH]) -> Self {
        Self(address)
    }

    /// The number of bytes in an address.
    pub const LENGTH: usize = 32;

    /// Hex address: 0x0
    pub const ZERO: Self = Self([0u8; Self::LENGTH]);

    /// Hex address: 0x1
    pub const ONE: Self = Self::get_hex_address_one();

    const fn get_hex_address_one() -> Self {
        let mut addr = [0u8; AccountAddress::LENGTH];
        addr[AccountAddress::LENGTH - 1] = 1u8;
        Self(addr)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses an address with or without a leading `0x`, padding short literals with zeros.
    pub fn from_hex_literal(literal: &str) -> Result<Self, AccountAddressParseError> {
        let hex_part = literal.strip_prefix("0x").unwrap_or(literal);
        if hex_part.is_empty() || hex_part.len() > Self::LENGTH * 2 {
            return Err(AccountAddressParseError::InvalidLength(hex_part.len()));
        }
        let padded = format!("{:0>width$}", hex_part, width = Self::LENGTH * 2);
        let bytes = hex::decode(padded)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self, AccountAddressParseError> {
        <[u8; Self::LENGTH]>::try_from(bytes.as_ref())
            .map_err(|_| AccountAddressParseError::InvalidLength(bytes.as_ref().len()))
            .map(Self)
    }
}

impl AsRef<[u8]> for AccountAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; AccountAddress::LENGTH]> for AccountAddress {
    fn from(bytes: [u8; AccountAddress::LENGTH]) -> Self {
        Self::new(bytes)
    }
}

impl FromStr for AccountAddress {
    type Err = AccountAddressParseError;

    fn from_str(s: &str) -> Result<Self, AccountAddressParseError> {
        Self::from_hex_literal(s)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AccountAddressParseError {
    #[error("invalid address length {0}")]
    InvalidLength(usize),
    #[error("invalid hex in address: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

// `hex::FromHexError` implements `PartialEq` but not `Eq`; its equality is total.
impl Eq for AccountAddressParseError {}
