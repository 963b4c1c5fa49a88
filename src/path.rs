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
//! BIP32/BIP44 derivation path serialization

use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::AppError;
use crate::params::{DEFAULT_PATH_LENGTH, HARDENED, MAX_PATH_DEPTH};

/// Single derivation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child {
    /// Raw index, without the hardened flag
    pub index: u32,
    /// Hardened marker written by the caller (`44'`)
    pub hardened: bool,
}

/// BIP32 Path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    children: Vec<Child>,
}

impl DerivationPath {
    /// Path from raw indices; hardening is left to the codec
    pub fn new(indices: &[u32]) -> Self {
        DerivationPath {
            children: indices
                .iter()
                .map(|&index| Child {
                    index,
                    hardened: false,
                })
                .collect(),
        }
    }

    /// Path steps
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Number of steps
    pub fn depth(&self) -> usize {
        self.children.len()
    }
}

impl From<[u32; DEFAULT_PATH_LENGTH]> for DerivationPath {
    fn from(indices: [u32; DEFAULT_PATH_LENGTH]) -> Self {
        DerivationPath::new(&indices)
    }
}

impl FromStr for DerivationPath {
    type Err = AppError;

    /// Parses `m/44'/118'/0'/0/0`
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let rest = path.strip_prefix("m/").ok_or_else(|| {
            AppError::InvalidPath(format!(
                "path should start with \"m/\" (e.g \"m/44'/118'/0'/0/3\"), got {:?}",
                path
            ))
        })?;

        let children = rest
            .split('/')
            .map(|component| -> Result<Child, AppError> {
                let (number, hardened) = match component.strip_suffix('\'') {
                    Some(number) => (number, true),
                    None => (component, false),
                };
                let index = number.parse::<u32>().map_err(|_| {
                    AppError::InvalidPath(format!(
                        "{} is not a number (e.g \"m/44'/118'/0'/0/3\")",
                        number
                    ))
                })?;
                Ok(Child { index, hardened })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DerivationPath { children })
    }
}

/// How many steps a path must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDepth {
    /// Exactly this many steps
    Exact(usize),
    /// Between one and this many steps
    UpTo(usize),
}

/// Which steps get the hardened flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hardening {
    /// The first `n` steps, plus any step marked by the caller
    Prefix(usize),
    /// Only the steps marked by the caller
    Marked,
}

/// Path serializer, fixed per app variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCodec {
    /// Accepted depth
    pub depth: PathDepth,
    /// Hardening policy
    pub hardening: Hardening,
    /// Legacy layout: depth byte followed by a zero padded 10 word buffer
    pub depth_prefix: bool,
}

impl PathCodec {
    /// Cosmos app: 5 steps, first 3 hardened, 20 bytes
    pub const COSMOS: PathCodec = PathCodec {
        depth: PathDepth::Exact(DEFAULT_PATH_LENGTH),
        hardening: Hardening::Prefix(3),
        depth_prefix: false,
    };

    /// Legacy user app: 5 steps, first 3 hardened, 41 bytes
    pub const USER: PathCodec = PathCodec {
        depth: PathDepth::Exact(DEFAULT_PATH_LENGTH),
        hardening: Hardening::Prefix(3),
        depth_prefix: true,
    };

    /// Validator app: up to 10 steps, all hardened (ed25519), 41 bytes
    pub const VALIDATOR: PathCodec = PathCodec {
        depth: PathDepth::UpTo(MAX_PATH_DEPTH),
        hardening: Hardening::Prefix(MAX_PATH_DEPTH),
        depth_prefix: true,
    };

    /// Serialized size in bytes for a path of `depth` steps
    pub fn encoded_len(&self, depth: usize) -> usize {
        if self.depth_prefix {
            1 + 4 * MAX_PATH_DEPTH
        } else {
            4 * depth
        }
    }

    /// Serialize a path, each step as a little-endian u32
    pub fn encode(&self, path: &DerivationPath) -> Result<Vec<u8>, AppError> {
        let depth = path.depth();
        match self.depth {
            PathDepth::Exact(n) if depth != n => {
                return Err(AppError::InvalidPath(format!(
                    "it must contain {} elements, got {}",
                    n, depth
                )));
            }
            PathDepth::UpTo(n) if depth == 0 || depth > n => {
                return Err(AppError::InvalidPath(format!(
                    "maximum bip32 depth = {}, got {}",
                    n, depth
                )));
            }
            _ => {}
        }
        if self.depth_prefix && depth > MAX_PATH_DEPTH {
            return Err(AppError::InvalidPath(format!(
                "maximum bip32 depth = {}, got {}",
                MAX_PATH_DEPTH, depth
            )));
        }

        let mut buffer = vec![0u8; self.encoded_len(depth)];
        let offset = if self.depth_prefix {
            buffer[0] = depth as u8;
            1
        } else {
            0
        };

        for (i, child) in path.children().iter().enumerate() {
            if child.index >= HARDENED {
                return Err(AppError::InvalidPath(
                    "incorrect child value (bigger or equal to 0x80000000)".to_string(),
                ));
            }

            let hardened = child.hardened
                || match self.hardening {
                    Hardening::Prefix(n) => i < n,
                    Hardening::Marked => false,
                };
            let value = if hardened {
                child.index | HARDENED
            } else {
                child.index
            };

            let pos = offset + 4 * i;
            LittleEndian::write_u32(&mut buffer[pos..pos + 4], value);
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bip44_cosmos() {
        let path = DerivationPath::from([44, 118, 0, 0, 0]);
        let serialized_path = PathCodec::COSMOS.encode(&path).unwrap();
        assert_eq!(serialized_path.len(), 20);
        assert_eq!(
            hex::encode(&serialized_path),
            "2c00008076000080000000800000000000000000"
        );
    }

    #[test]
    fn string_path_matches_raw_path() {
        let parsed: DerivationPath = "m/44'/118'/0'/0/0".parse().unwrap();
        assert_eq!(
            PathCodec::COSMOS.encode(&parsed).unwrap(),
            PathCodec::COSMOS
                .encode(&DerivationPath::from([44, 118, 0, 0, 0]))
                .unwrap()
        );
    }

    #[test]
    fn marked_hardening() {
        let codec = PathCodec {
            hardening: Hardening::Marked,
            ..PathCodec::COSMOS
        };

        let path: DerivationPath = "m/44'/100'/0/0/0".parse().unwrap();
        assert_eq!(
            hex::encode(codec.encode(&path).unwrap()),
            "2c00008064000080000000000000000000000000"
        );

        let path: DerivationPath = "m/44'/60'/0'/0/0".parse().unwrap();
        assert_eq!(
            hex::encode(codec.encode(&path).unwrap()),
            "2c0000803c000080000000800000000000000000"
        );
    }

    #[test]
    fn hardened_prefix_two_and_three() {
        let path = DerivationPath::from([44, 118, 5, 6, 7]);

        for k in 0..=5 {
            let codec = PathCodec {
                hardening: Hardening::Prefix(k),
                ..PathCodec::COSMOS
            };
            let bytes = codec.encode(&path).unwrap();
            assert_eq!(bytes.len(), 20);
            for (i, word) in bytes.chunks(4).enumerate() {
                let value = LittleEndian::read_u32(word);
                assert_eq!(value & HARDENED != 0, i < k, "k={} i={}", k, i);
                assert_eq!(value & !HARDENED, path.children()[i].index);
            }
        }
    }

    #[test]
    fn deterministic() {
        let path = DerivationPath::from([44, 118, 1, 0, 9]);
        assert_eq!(
            PathCodec::COSMOS.encode(&path).unwrap(),
            PathCodec::COSMOS.encode(&path).unwrap()
        );
    }

    #[test]
    fn wrong_depth() {
        let path = DerivationPath::new(&[44, 118, 0, 0]);
        assert!(matches!(
            PathCodec::COSMOS.encode(&path),
            Err(AppError::InvalidPath(_))
        ));

        let path = DerivationPath::new(&[44, 118, 0, 0, 0, 0]);
        assert!(matches!(
            PathCodec::COSMOS.encode(&path),
            Err(AppError::InvalidPath(_))
        ));
    }

    #[test]
    fn index_with_hardened_bit() {
        let path = DerivationPath::from([44, 118, 0x8000_0000, 0, 0]);
        assert!(matches!(
            PathCodec::COSMOS.encode(&path),
            Err(AppError::InvalidPath(_))
        ));

        let path: DerivationPath = "m/44'/118'/2147483648/0/0".parse().unwrap();
        assert!(PathCodec::COSMOS.encode(&path).is_err());
    }

    #[test]
    fn legacy_layout() {
        let path = DerivationPath::from([44, 118, 0, 0, 0]);
        let bytes = PathCodec::USER.encode(&path).unwrap();
        assert_eq!(bytes.len(), 41);
        assert_eq!(bytes[0], 5);
        assert_eq!(
            hex::encode(&bytes[1..21]),
            "2c00008076000080000000800000000000000000"
        );
        assert!(bytes[21..].iter().all(|b| *b == 0));
    }

    #[test]
    fn validator_layout() {
        let path = DerivationPath::new(&[44, 118, 0, 0, 0]);
        let bytes = PathCodec::VALIDATOR.encode(&path).unwrap();
        assert_eq!(bytes.len(), 41);
        assert_eq!(
            hex::encode(&bytes[1..21]),
            "2c00008076000080000000800000008000000080"
        );

        let deep = DerivationPath::new(&[1; 10]);
        assert!(PathCodec::VALIDATOR.encode(&deep).is_ok());

        let too_deep = DerivationPath::new(&[1; 11]);
        assert!(PathCodec::VALIDATOR.encode(&too_deep).is_err());
        assert!(PathCodec::VALIDATOR
            .encode(&DerivationPath::new(&[]))
            .is_err());
    }

    #[test]
    fn parse_errors() {
        assert!("".parse::<DerivationPath>().is_err());
        assert!("invalid_path".parse::<DerivationPath>().is_err());
        assert!("m/44'/abc/0/0/0".parse::<DerivationPath>().is_err());
    }
}
