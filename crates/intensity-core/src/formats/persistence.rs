//! Binary settings container.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────┬──────────┬──────────────────────────┐
//! │ magic "MIIS" │ revision │ postcard payload          │
//! │ 4 bytes      │ 1 byte   │ SettingsV1 / current      │
//! └──────────────┴──────────┴──────────────────────────┘
//! ```
//!
//! The payload type is chosen by the revision byte. Decoding any known
//! revision yields current settings; unknown revisions are rejected.

use crate::settings::{
    MeasureImageIntensitySettings, SettingsV1, VersionedSettings, SETTINGS_REVISION,
};
use crate::{IntensityError, Result};

/// Magic bytes at the start of every settings blob.
pub const SETTINGS_MAGIC: [u8; 4] = *b"MIIS";

/// Magic plus revision byte.
pub const HEADER_LEN: usize = SETTINGS_MAGIC.len() + 1;

// =============================================================================
// ENCODING
// =============================================================================

/// Encode settings at the revision they carry.
pub fn encode_versioned(settings: &VersionedSettings) -> Result<Vec<u8>> {
    let payload = match settings {
        VersionedSettings::V1(v1) => postcard::to_stdvec(v1)?,
        VersionedSettings::V2(current) => postcard::to_stdvec(current)?,
    };

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SETTINGS_MAGIC);
    bytes.push(settings.revision());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Encode settings at the current revision.
pub fn encode_settings(settings: &MeasureImageIntensitySettings) -> Result<Vec<u8>> {
    encode_versioned(&VersionedSettings::V2(settings.clone()))
}

// =============================================================================
// DECODING
// =============================================================================

/// Read the revision byte without decoding the payload.
pub fn revision_of(bytes: &[u8]) -> Result<u8> {
    if bytes.len() < HEADER_LEN {
        return Err(IntensityError::InvalidFormat(format!(
            "settings blob too short: {} bytes",
            bytes.len()
        )));
    }
    if bytes[..SETTINGS_MAGIC.len()] != SETTINGS_MAGIC {
        return Err(IntensityError::InvalidFormat(
            "missing settings magic".to_string(),
        ));
    }
    Ok(bytes[SETTINGS_MAGIC.len()])
}

/// Decode settings as stored, without upgrading.
pub fn decode_versioned(bytes: &[u8]) -> Result<VersionedSettings> {
    let revision = revision_of(bytes)?;
    let payload = &bytes[HEADER_LEN..];

    match revision {
        1 => Ok(VersionedSettings::V1(postcard::from_bytes::<SettingsV1>(
            payload,
        )?)),
        SETTINGS_REVISION => Ok(VersionedSettings::V2(postcard::from_bytes::<
            MeasureImageIntensitySettings,
        >(payload)?)),
        other => Err(IntensityError::UnsupportedRevision(other)),
    }
}

/// Decode settings and upgrade them to the current revision.
pub fn decode_settings(bytes: &[u8]) -> Result<MeasureImageIntensitySettings> {
    Ok(decode_versioned(bytes)?.upgrade())
}

// =============================================================================
// TESTS
// =============================================================================
