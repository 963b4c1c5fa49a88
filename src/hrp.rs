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
//! Human readable prefix (bech32) validation

use crate::errors::AppError;
use crate::params::{HRP_MAX_LENGTH, MAX_DISPLAYABLE_CHAR, MIN_DISPLAYABLE_CHAR};

// https://github.com/bitcoin/bips/blob/master/bip-0173.mediawiki
fn valid_hrp_byte(b: u8) -> bool {
    (MIN_DISPLAYABLE_CHAR..=MAX_DISPLAYABLE_CHAR).contains(&b)
}

/// Validate an HRP and return its bytes.
///
/// The HRP must have 1 to 83 bytes, all of them displayable on the device.
pub fn encode_hrp(hrp: &str) -> Result<Vec<u8>, AppError> {
    if hrp.is_empty() {
        return Err(AppError::InvalidHrp("HRP cannot be empty".to_string()));
    }

    if hrp.len() > HRP_MAX_LENGTH {
        return Err(AppError::InvalidHrp(format!(
            "HRP len should be <= {}",
            HRP_MAX_LENGTH
        )));
    }

    if !hrp.bytes().all(valid_hrp_byte) {
        return Err(AppError::InvalidHrp(
            "all characters in the HRP must be in the [33, 126] range".to_string(),
        ));
    }

    Ok(hrp.as_bytes().to_vec())
}

/// `[len][hrp]`, as carried in packet headers
pub fn length_prefixed(hrp: &str) -> Result<Vec<u8>, AppError> {
    let bytes = encode_hrp(hrp)?;
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(bytes.len() as u8);
    out.extend_from_slice(&bytes);
    Ok(out)
}
