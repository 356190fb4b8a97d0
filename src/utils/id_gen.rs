//! ID generation utilities

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Fixed base64 tail appended to every generated UUID
const UUID_SUFFIX: &str = "Ig==";

/// Generate a KeePass UUID (24 base64 characters encoding 16 bytes)
///
/// The random v4 UUID is base64-encoded, cut to the first 20 characters
/// (15 bytes) and completed with a fixed one-byte tail.
pub fn generate_uuid() -> String {
    let uuid = uuid::Uuid::new_v4();
    let encoded = STANDARD.encode(uuid.as_bytes());
    format!("{}{}", &encoded[..crate::UUID_BODY_LENGTH], UUID_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_uuid_length() {
        let id = generate_uuid();
        assert_eq!(id.len(), crate::UUID_BODY_LENGTH + UUID_SUFFIX.len());
        assert!(id.ends_with("Ig=="));
    }

    #[test]
    fn test_generate_uuid_decodes_to_16_bytes() {
        let id = generate_uuid();
        let bytes = STANDARD.decode(&id).unwrap();
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn test_generate_uuid_unique() {
        let ids: HashSet<String> = (0..5000).map(|_| generate_uuid()).collect();
        assert_eq!(ids.len(), 5000);
    }
}
