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
//! Typed views over raw device responses

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::errors::AppError;

/// Layout of a get-version response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLayout {
    /// mode, major, minor, patch (trailing bytes ignored)
    Short,
    /// mode, major, minor, patch, locked flag and a 4 byte target id
    Extended,
}

/// App Version
///
/// `mode` is the operating mode (0 release, 0xFF debug) for the Cosmos app,
/// but an application identifier in the minimum-version table. The two are
/// never compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    /// Application Mode
    pub mode: u8,
    /// Version Major
    pub major: u8,
    /// Version Minor
    pub minor: u8,
    /// Version Patch
    pub patch: u8,
    /// Device locked flag (extended layout only)
    pub locked: Option<bool>,
    /// Target id of the device (extended layout only), read as a big-endian
    /// u32 from the four bytes after the locked flag
    pub target_id: Option<u32>,
}

impl Version {
    /// Parse a get-version response
    pub fn from_response(data: &[u8], layout: VersionLayout) -> Result<Self, AppError> {
        match layout {
            VersionLayout::Short => {
                if data.len() < 4 {
                    return Err(AppError::MalformedResponse(format!(
                        "version response has {} bytes, expected at least 4",
                        data.len()
                    )));
                }

                Ok(Version {
                    mode: data[0],
                    major: data[1],
                    minor: data[2],
                    patch: data[3],
                    locked: None,
                    target_id: None,
                })
            }
            VersionLayout::Extended => {
                if data.len() != 9 {
                    return Err(AppError::MalformedResponse(format!(
                        "version response has {} bytes, expected 9",
                        data.len()
                    )));
                }

                Ok(Version {
                    mode: data[0],
                    major: data[1],
                    minor: data[2],
                    patch: data[3],
                    locked: Some(data[4] != 0),
                    target_id: Some(BigEndian::read_u32(&data[5..9])),
                })
            }
        }
    }

    /// True when the app reports a debug build
    pub fn is_debug(&self) -> bool {
        self.mode == crate::params::APP_MODE_DEBUG
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Public key and address returned by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Public Key
    pub public_key: Vec<u8>,

    /// Address string format (bech32, not validated here)
    pub address: String,
}

impl Address {
    /// Split a `{pubkey}{address}` response. There is no delimiter, the
    /// boundary is the fixed public key size.
    pub fn from_response(data: &[u8], pk_len: usize, hrp: &str) -> Result<Self, AppError> {
        if data.len() < pk_len + hrp.len() {
            return Err(AppError::MalformedResponse(format!(
                "address response has {} bytes, expected at least {}",
                data.len(),
                pk_len + hrp.len()
            )));
        }

        let address = std::str::from_utf8(&data[pk_len..])
            .map_err(|err| {
                AppError::MalformedResponse(format!("address is not utf8: {}", err))
            })?
            .to_owned();

        Ok(Address {
            public_key: data[..pk_len].to_vec(),
            address,
        })
    }

    /// Interpret the public key as a SEC1 secp256k1 key
    pub fn secp256k1_public_key(&self) -> Result<k256::PublicKey, AppError> {
        Ok(k256::PublicKey::from_sec1_bytes(&self.public_key)?)
    }
}

/// Signature returned by the final packet of a sign operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// der signature (raw ed25519 bytes for the validator app)
    pub der: Vec<u8>,
}

impl Signature {
    /// The final answer is the signature itself, it only has to be non-empty
    pub fn from_response(data: &[u8]) -> Result<Self, AppError> {
        if data.is_empty() {
            return Err(AppError::MalformedResponse(
                "received no signature back".to_string(),
            ));
        }

        Ok(Signature { der: data.to_vec() })
    }

    /// Decode the DER bytes as a secp256k1 ECDSA signature
    pub fn to_ecdsa(&self) -> Result<k256::ecdsa::Signature, AppError> {
        Ok(k256::ecdsa::Signature::from_der(&self.der)?)
    }
}

/// Raw public key returned by the legacy public key instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(pub Vec<u8>);

impl PublicKey {
    /// Keep the first `pk_len` bytes, failing on shorter answers
    pub fn from_response(data: &[u8], pk_len: usize) -> Result<Self, AppError> {
        if data.len() < pk_len {
            return Err(AppError::MalformedResponse(format!(
                "public key response has {} bytes, expected {}",
                data.len(),
                pk_len
            )));
        }

        Ok(PublicKey(data[..pk_len].to_vec()))
    }
}
