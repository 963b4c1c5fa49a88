/*******************************************************************************
*   (c) 2018 - 2023 Zondax AG
*
*  Licensed under the Apache License, Version 2.0 (the "License");
*  you may not use this file except in compliance with the License.
*  You may obtain a copy of the License at
*
*      http://www.apache.org/licenses/LICENSE-2.0
*
*  Unless required by applicable law or agreed to in writing, software
*  distributed under the License is distributed on an "AS IS" BASIS,
*  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
*  See the License for the specific language governing permissions and
*  limitations under the License.
********************************************************************************/
//! Protocol constants and static configuration of the Cosmos app family

use ledger_transport::APDUErrorCode;

use crate::response::Version;

/// APDU Class byte of the Cosmos app (and the legacy user app)
pub const CLA: u8 = 0x55;

/// APDU Class byte of the Tendermint validator app
pub const VALIDATOR_CLA: u8 = 0x56;

/// Maximum payload bytes carried by a single packet
pub const CHUNK_SIZE: usize = 250;

/// Largest payload the length byte of a packet can describe
pub const MAX_PACKET_PAYLOAD: usize = 255;

/// Largest number of packets a single operation may be split into
pub const MAX_PACKET_COUNT: usize = 255;

/// BIP44 hardened derivation flag
pub const HARDENED: u32 = 0x8000_0000;

/// Derivation depth used by the Cosmos and user apps
pub const DEFAULT_PATH_LENGTH: usize = 5;

/// Maximum derivation depth accepted by the legacy path layout
pub const MAX_PATH_DEPTH: usize = 10;

/// Maximum HRP length (BIP-173)
pub const HRP_MAX_LENGTH: usize = 83;

/// Lowest byte value a Ledger device can display
pub const MIN_DISPLAYABLE_CHAR: u8 = 33;

/// Highest byte value a Ledger device can display
pub const MAX_DISPLAYABLE_CHAR: u8 = 126;

/// Compressed secp256k1 public key length
pub const SECP256K1_COMPRESSED_PK_LEN: usize = 33;

/// Uncompressed (SEC1) secp256k1 public key length
pub const SECP256K1_UNCOMPRESSED_PK_LEN: usize = 65;

/// Ed25519 public key length
pub const ED25519_PK_LEN: usize = 32;

/// Cosmos app instruction codes
#[repr(u8)]
pub enum InstructionCode {
    /// Retrieve the app version
    GetVersion = 0,
    /// Sign a transaction (amino or textual)
    Sign = 2,
    /// Retrieve the compressed public key and the bech32 address
    GetAddressAndPubKey = 4,
}

/// Legacy user app instruction codes
#[repr(u8)]
pub enum UserInstruction {
    /// Retrieve the app version
    GetVersion = 0,
    /// Retrieve the uncompressed secp256k1 public key
    PublicKeySecp256k1 = 1,
    /// Sign a transaction with secp256k1
    SignSecp256k1 = 2,
    /// Display the bech32 address on the device
    ShowAddressSecp256k1 = 3,
    /// Hash an arbitrary buffer
    Hash = 100,
    /// Retrieve a fixed test public key
    TestPublicKeySecp256k1 = 101,
    /// Sign with the fixed test key
    TestSignSecp256k1 = 103,
}

/// Validator app instruction codes
#[repr(u8)]
pub enum ValidatorInstruction {
    /// Retrieve the app version
    GetVersion = 0,
    /// Retrieve the ed25519 public key
    PublicKeyEd25519 = 1,
    /// Sign a vote/proposal with ed25519
    SignEd25519 = 2,
}

/// Success status word
pub const SW_NO_ERROR: u16 = APDUErrorCode::NoError as u16;
/// The app selected by the class byte is not running
pub const SW_CLA_NOT_SUPPORTED: u16 = APDUErrorCode::ClaNotSupported as u16;
/// The transaction could not be parsed by the device
pub const SW_BAD_KEY_HANDLE: u16 = APDUErrorCode::BadKeyHandle as u16;
/// The device refused the transaction content
pub const SW_DATA_INVALID: u16 = APDUErrorCode::DataInvalid as u16;

/// App id of the Cosmos app
pub const APP_ID_COSMOS: u8 = 0x00;
/// App id of the Terra app
pub const APP_ID_TERRA: u8 = 0x01;
/// Mode byte reported by debug builds
pub const APP_MODE_DEBUG: u8 = 0xFF;

const fn min_version(mode: u8, major: u8, minor: u8, patch: u8) -> Version {
    Version {
        mode,
        major,
        minor,
        patch,
        locked: None,
        target_id: None,
    }
}

/// Minimum supported app versions, keyed by app id
pub const MIN_SUPPORTED_VERSIONS: &[Version] = &[
    min_version(APP_ID_COSMOS, 1, 5, 1),
    min_version(APP_ID_COSMOS, 2, 1, 0),
    min_version(APP_ID_TERRA, 1, 0, 0),
];

/// Minimum version of the legacy user app
pub const USER_REQUIRED_VERSION: Version = min_version(APP_ID_COSMOS, 1, 1, 0);

/// Minimum version of the validator app (only the major is enforced)
pub const VALIDATOR_REQUIRED_VERSION: Version = min_version(APP_ID_COSMOS, 1, 0, 0);
