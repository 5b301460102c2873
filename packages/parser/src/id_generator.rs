use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Group lengths of the `{8-4-4-4-12}` identifier grammar
const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Length of a well-formed identifier, braces included
pub const IDENTIFIER_LEN: usize = 38;

const NULL_IDENTIFIER: &str = "{00000000-0000-0000-0000-000000000000}";

/// Entity identity token, e.g. `{0F8FAD5B-D9CB-469F-A165-70867728950E}`.
///
/// Values read from a source document are kept verbatim, even when they do
/// not satisfy [`is_valid`]. Only freshly generated values are guaranteed
/// to be well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Mint a new random identifier
    pub fn generate() -> Self {
        generate()
    }

    /// The all-zero "no identity" sentinel
    pub fn null() -> Self {
        null_identifier()
    }

    /// Wrap a value exactly as it appeared in a document
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Wrap a value only if it satisfies the identifier grammar
    pub fn parse(value: &str) -> Option<Self> {
        is_valid(value).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == NULL_IDENTIFIER
    }

    pub fn is_valid(&self) -> bool {
        is_valid(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generate a brace-delimited, uppercase v4 identifier
pub fn generate() -> Identifier {
    let uuid = Uuid::new_v4();
    Identifier(format!("{{{}}}", uuid.hyphenated()).to_uppercase())
}

/// Exact grammar check: braces, uppercase hex, 8-4-4-4-12 groups
pub fn is_valid(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != IDENTIFIER_LEN || bytes[0] != b'{' || bytes[IDENTIFIER_LEN - 1] != b'}' {
        return false;
    }

    let mut groups = value[1..IDENTIFIER_LEN - 1].split('-');
    for expected in GROUPS {
        match groups.next() {
            Some(group) if group.len() == expected => {
                if !group.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F')) {
                    return false;
                }
            }
            _ => return false,
        }
    }

    groups.next().is_none()
}

pub fn null_identifier() -> Identifier {
    Identifier(NULL_IDENTIFIER.to_string())
}

/// Generate document ID from file path using CRC32
pub fn get_document_id(path: &str) -> String {
    let mut buff = String::from(path);
    if !path.starts_with("file://") {
        buff = format!("file://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:08x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid() {
        for _ in 0..100 {
            let id = generate();
            assert!(is_valid(id.as_str()), "invalid: {}", id);
        }
    }

    #[test]
    fn test_generated_ids_differ() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_grammar_rejections() {
        // missing braces
        assert!(!is_valid("0F8FAD5B-D9CB-469F-A165-70867728950E"));
        assert!(!is_valid("{0F8FAD5B-D9CB-469F-A165-70867728950E"));
        // lowercase
        assert!(!is_valid("{0f8fad5b-d9cb-469f-a165-70867728950e}"));
        // wrong group lengths
        assert!(!is_valid("{0F8FAD5-BD9CB-469F-A165-70867728950E}"));
        assert!(!is_valid("{0F8FAD5B-D9CB-469F-A16570867728950E0}"));
        // not hex
        assert!(!is_valid("{0F8FAD5B-D9CB-469F-A165-7086772895GZ}"));
        assert!(!is_valid(""));

        assert!(is_valid("{0F8FAD5B-D9CB-469F-A165-70867728950E}"));
    }

    #[test]
    fn test_null_identifier() {
        let null = null_identifier();
        assert!(is_valid(null.as_str()));
        assert!(null.is_null());
        assert!(!generate().is_null());
    }

    #[test]
    fn test_parse_and_raw() {
        assert!(Identifier::parse("{abc}").is_none());
        let raw = Identifier::from_raw("{abc}");
        assert_eq!(raw.as_str(), "{abc}");
        assert!(!raw.is_valid());
    }

    #[test]
    fn test_document_id_generation() {
        let id1 = get_document_id("/procedures/34401A.msf");
        let id2 = get_document_id("/procedures/34401A.msf");
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 8);

        let id3 = get_document_id("/procedures/8846A.msf");
        assert_ne!(id1, id3);
    }
}
