use crate::errors::CoreError;

/// Magic bytes identifying a PKLG (PocketLedger) snapshot file.
pub const MAGIC: &[u8; 4] = b"PKLG";

/// Current snapshot format version.
pub const CURRENT_VERSION: u16 = 1;

/// Header size in bytes: magic(4) + version(2) + payload_len(8) = 14
pub const HEADER_SIZE: usize = 14;

/// Write a complete snapshot file to bytes.
///
/// Layout:
/// ```text
/// [PKLG: 4B] [version: 2B LE] [payload_len: 8B LE] [payload: variable]
/// ```
/// The payload is the bincode-serialized snapshot.
pub fn write_file(version: u16, payload: &[u8]) -> Vec<u8> {
    let payload_len = payload.len() as u64;
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());

    // Magic
    buf.extend_from_slice(MAGIC);
    // Version
    buf.extend_from_slice(&version.to_le_bytes());
    // Payload length
    buf.extend_from_slice(&payload_len.to_le_bytes());
    // Payload
    buf.extend_from_slice(payload);

    buf
}

/// Parse the header from raw file bytes and return the payload slice.
pub fn read_file(data: &[u8]) -> Result<&[u8], CoreError> {
    if data.len() < HEADER_SIZE {
        return Err(CoreError::InvalidSnapshotFormat(
            "File too small to be a valid PKLG snapshot".into(),
        ));
    }

    // Validate magic bytes
    if &data[0..4] != MAGIC {
        return Err(CoreError::InvalidSnapshotFormat(
            "Invalid magic bytes, not a PKLG snapshot".into(),
        ));
    }

    let mut offset = 4;

    // Version
    let version = u16::from_le_bytes([data[offset], data[offset + 1]]);
    offset += 2;

    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    // Payload length
    let payload_len = u64::from_le_bytes(
        data[offset..offset + 8]
            .try_into()
            .map_err(|_| CoreError::InvalidSnapshotFormat("Failed to read payload length".into()))?,
    );
    offset += 8;

    // The length field comes from the file and may be arbitrary; validate
    // it against the bytes actually present before any usize arithmetic.
    let available = (data.len() - offset) as u64;
    if payload_len > available {
        return Err(CoreError::InvalidSnapshotFormat(format!(
            "File truncated: expected {payload_len} payload bytes, got {available}"
        )));
    }

    Ok(&data[offset..offset + payload_len as usize])
}
