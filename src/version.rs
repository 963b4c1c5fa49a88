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
//! Minimum version enforcement

use crate::errors::AppError;
use crate::params::MIN_SUPPORTED_VERSIONS;
use crate::response::Version;

/// How a device version is compared against a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPolicy {
    /// major, then minor, then patch; the first differing component decides
    Lexicographic,
    /// Only the major component is enforced
    MajorOnly,
}

fn satisfies(current: &Version, required: &Version, policy: VersionPolicy) -> bool {
    if current.major != required.major {
        return current.major > required.major;
    }

    if policy == VersionPolicy::MajorOnly {
        return true;
    }

    if current.minor != required.minor {
        return current.minor > required.minor;
    }

    current.patch >= required.patch
}

/// Fail with `UnsupportedVersion` when `current` is below `required`.
///
/// The mode byte does not take part in the comparison.
pub fn check_version(
    current: &Version,
    required: &Version,
    policy: VersionPolicy,
) -> Result<(), AppError> {
    if satisfies(current, required, policy) {
        Ok(())
    } else {
        Err(AppError::UnsupportedVersion {
            current: *current,
            required: *required,
        })
    }
}

/// Minimum version for an app id, from the static table.
///
/// Picks the highest entry whose major does not exceed `current.major`, or the
/// lowest entry when the device is older than every entry.
pub fn min_supported_version(app_id: u8, current: &Version) -> Result<Version, AppError> {
    let mut entries = MIN_SUPPORTED_VERSIONS
        .iter()
        .filter(|v| v.mode == app_id)
        .copied()
        .collect::<Vec<_>>();
    entries.sort_by_key(|v| (v.major, v.minor, v.patch));

    let lowest = *entries.first().ok_or(AppError::UnknownAppId(app_id))?;
    Ok(entries
        .into_iter()
        .filter(|v| v.major <= current.major)
        .last()
        .unwrap_or(lowest))
}

/// Check a device version against the static table
pub fn check_supported(app_id: u8, current: &Version) -> Result<(), AppError> {
    let required = min_supported_version(app_id, current)?;
    check_version(current, &required, VersionPolicy::Lexicographic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{APP_ID_COSMOS, APP_ID_TERRA};

    fn v(mode: u8, major: u8, minor: u8, patch: u8) -> Version {
        Version {
            mode,
            major,
            minor,
            patch,
            locked: None,
            target_id: None,
        }
    }

    #[test]
    fn lexicographic() {
        let current = v(0, 2, 1, 0);
        assert!(check_version(&current, &v(0, 2, 0, 0), VersionPolicy::Lexicographic).is_ok());
        assert!(check_version(&current, &v(0, 2, 1, 0), VersionPolicy::Lexicographic).is_ok());
        assert!(matches!(
            check_version(&current, &v(0, 2, 1, 1), VersionPolicy::Lexicographic),
            Err(AppError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn first_difference_decides() {
        // a greater major wins even with lower minor and patch
        assert!(check_version(&v(0, 3, 0, 0), &v(0, 2, 9, 9), VersionPolicy::Lexicographic).is_ok());
        assert!(check_version(&v(0, 1, 9, 9), &v(0, 2, 0, 0), VersionPolicy::Lexicographic).is_err());
        assert!(check_version(&v(0, 2, 2, 0), &v(0, 2, 1, 9), VersionPolicy::Lexicographic).is_ok());
        assert!(check_version(&v(0, 2, 0, 9), &v(0, 2, 1, 0), VersionPolicy::Lexicographic).is_err());
    }

    #[test]
    fn mode_is_ignored() {
        assert!(check_version(&v(0xFF, 2, 1, 0), &v(0, 2, 1, 0), VersionPolicy::Lexicographic).is_ok());
    }

    #[test]
    fn major_only() {
        assert!(check_version(&v(0, 1, 0, 0), &v(0, 1, 5, 5), VersionPolicy::MajorOnly).is_ok());
        assert!(check_version(&v(0, 2, 0, 0), &v(0, 1, 5, 5), VersionPolicy::MajorOnly).is_ok());
        assert!(check_version(&v(0, 0, 9, 9), &v(0, 1, 0, 0), VersionPolicy::MajorOnly).is_err());
    }

    #[test]
    fn error_message() {
        let err = check_version(&v(0, 1, 0, 0), &v(0, 1, 1, 0), VersionPolicy::Lexicographic)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "version 1.0.0 not supported. Required >v1.1.0"
        );
    }

    #[test]
    fn table_lookup() {
        assert_eq!(
            min_supported_version(APP_ID_COSMOS, &v(0, 1, 9, 0)).unwrap().to_string(),
            "1.5.1"
        );
        assert_eq!(
            min_supported_version(APP_ID_COSMOS, &v(0, 2, 0, 0)).unwrap().to_string(),
            "2.1.0"
        );
        assert_eq!(
            min_supported_version(APP_ID_COSMOS, &v(0, 3, 0, 0)).unwrap().to_string(),
            "2.1.0"
        );
        assert_eq!(
            min_supported_version(APP_ID_COSMOS, &v(0, 0, 1, 0)).unwrap().to_string(),
            "1.5.1"
        );
        assert_eq!(
            min_supported_version(APP_ID_TERRA, &v(1, 1, 0, 0)).unwrap().to_string(),
            "1.0.0"
        );
        assert!(matches!(
            min_supported_version(0x42, &v(0x42, 1, 0, 0)),
            Err(AppError::UnknownAppId(0x42))
        ));
    }

    #[test]
    fn table_check() {
        assert!(check_supported(APP_ID_COSMOS, &v(0, 2, 34, 12)).is_ok());
        assert!(check_supported(APP_ID_COSMOS, &v(0, 2, 0, 5)).is_err());
        assert!(check_supported(APP_ID_COSMOS, &v(0, 1, 5, 1)).is_ok());
        assert!(check_supported(APP_ID_COSMOS, &v(0, 1, 5, 0)).is_err());
    }
}
