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
//! Error taxonomy and classification of device status words

use crate::params::{SW_BAD_KEY_HANDLE, SW_CLA_NOT_SUPPORTED, SW_DATA_INVALID, SW_NO_ERROR};
use crate::response::Version;

/// Ledger App Error
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid derivation path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid human readable prefix
    #[error("Invalid HRP: {0}")]
    InvalidHrp(String),

    /// A packet payload does not fit in a single packet
    #[error("payload of {size} bytes exceeds the packet budget of {max} bytes")]
    PayloadTooLarge {
        /// Payload size
        size: usize,
        /// Packet budget
        max: usize,
    },

    /// The message cannot be empty
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// The message to sign needs more packets than the device accepts
    #[error("message size is invalid (too big)")]
    InvalidMessageSize,

    /// Only amino and textual sign modes are understood by the app
    #[error("at the moment the Ledger app only works with Amino (0) and Textual (1) modes, got {0}")]
    InvalidSignMode(u8),

    /// The exchange session was abandoned after a failure
    #[error("exchange session aborted, the operation must be restarted")]
    SessionAborted,

    /// The response is shorter than (or shaped differently from) what the operation requires
    #[error("invalid response: {0}")]
    MalformedResponse(String),

    /// The Cosmos app is not running on the device
    #[error("are you sure the Cosmos app is open?")]
    ClassNotSupported,

    /// The device could not parse the transaction
    #[error("{reason}")]
    TransactionParse {
        /// Parser diagnostic
        reason: String,
    },

    /// The device rejected the transaction content
    #[error("{0}")]
    DataRejected(String),

    /// Unclassified status word returned by the device
    #[error("device returned status 0x{0:04X}")]
    DeviceStatus(u16),

    /// Invalid version error
    #[error("version {current} not supported. Required >v{required}")]
    UnsupportedVersion {
        /// Version reported by the device
        current: Version,
        /// Minimum version required
        required: Version,
    },

    /// No minimum version is known for this app id
    #[error("unknown app id 0x{0:02X}")]
    UnknownAppId(u8),

    /// The public key is not a valid SEC1 secp256k1 point
    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] k256::elliptic_curve::Error),

    /// The signature is not a valid DER ECDSA signature
    #[error("Ecdsa error: {0}")]
    Ecdsa(#[from] k256::ecdsa::Error),
}

/// Cosmos App Error
#[derive(Debug, thiserror::Error)]
pub enum CosmosError<E: std::error::Error> {
    /// Transport related errors
    #[error("Transport error: {0}")]
    Transport(E),

    /// Protocol and device related errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] AppError),
}

/// Known parser diagnostics reported together with a bad key handle status
const PARSER_ERRORS: &[(&str, &str)] = &[
    ("ERROR: JSMN_ERROR_NOMEM", "not enough tokens were provided"),
    (
        "PARSER ERROR: JSMN_ERROR_INVAL",
        "unexpected character in JSON string",
    ),
    (
        "PARSER ERROR: JSMN_ERROR_PART",
        "the JSON string is not a complete",
    ),
];

/// Maps a status word and the answer body into the error taxonomy.
///
/// Stateless: the same answer always classifies the same way, regardless of
/// which packet of a sequence produced it.
pub fn classify(retcode: u16, data: &[u8]) -> Result<(), AppError> {
    match retcode {
        SW_NO_ERROR => Ok(()),
        SW_CLA_NOT_SUPPORTED => Err(AppError::ClassNotSupported),
        SW_BAD_KEY_HANDLE => {
            let text = String::from_utf8_lossy(data);
            let reason = PARSER_ERRORS
                .iter()
                .find(|(tag, _)| *tag == text)
                .map(|(_, reason)| (*reason).to_string())
                .unwrap_or_else(|| text.into_owned());
            Err(AppError::TransactionParse { reason })
        }
        SW_DATA_INVALID => Err(AppError::DataRejected(
            String::from_utf8_lossy(data).into_owned(),
        )),
        other => Err(AppError::DeviceStatus(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes() {
        assert!(classify(0x9000, &[]).is_ok());
        assert!(classify(0x9000, b"anything").is_ok());
    }

    #[test]
    fn known_parser_errors() {
        match classify(0x6A80, b"ERROR: JSMN_ERROR_NOMEM") {
            Err(AppError::TransactionParse { reason }) => {
                assert_eq!(reason, "not enough tokens were provided")
            }
            other => panic!("unexpected {:?}", other),
        }

        match classify(0x6A80, b"PARSER ERROR: JSMN_ERROR_INVAL") {
            Err(AppError::TransactionParse { reason }) => {
                assert_eq!(reason, "unexpected character in JSON string")
            }
            other => panic!("unexpected {:?}", other),
        }

        match classify(0x6A80, b"PARSER ERROR: JSMN_ERROR_PART") {
            Err(AppError::TransactionParse { reason }) => {
                assert_eq!(reason, "the JSON string is not a complete")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_parser_error_is_verbatim() {
        match classify(0x6A80, b"Unexpected characters") {
            Err(AppError::TransactionParse { reason }) => {
                assert_eq!(reason, "Unexpected characters")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn data_invalid_is_rejected_verbatim() {
        let err = classify(0x6984, b"Chain ID not supported").unwrap_err();
        assert!(matches!(err, AppError::DataRejected(ref msg) if msg == "Chain ID not supported"));
        assert_eq!(err.to_string(), "Chain ID not supported");
    }

    #[test]
    fn class_not_supported_hint() {
        let err = classify(0x6E00, &[]).unwrap_err();
        assert!(matches!(err, AppError::ClassNotSupported));
        assert_eq!(err.to_string(), "are you sure the Cosmos app is open?");
    }

    #[test]
    fn other_status_unchanged() {
        let err = classify(0x6985, &[]).unwrap_err();
        assert!(matches!(err, AppError::DeviceStatus(0x6985)));
        assert_eq!(err.to_string(), "device returned status 0x6985");
    }
}
