//! Value Codec
//!
//! Marshals caller values to MessagePack bytes and back. Structs are written
//! with named fields, so the encoding is self-describing and needs no shared
//! schema between writer and reader.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Encodes any serializable value into bytes.
pub fn marshal<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decodes bytes produced by [`marshal`] into `T`.
pub fn unmarshal<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        roles: Vec<String>,
        expires: Option<u64>,
    }

    #[test]
    fn test_struct_round_trip() {
        let session = Session {
            user: "ada".to_string(),
            roles: vec!["admin".to_string()],
            expires: None,
        };

        let bytes = marshal(&session).unwrap();
        let decoded: Session = unmarshal(&bytes).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn test_named_fields_decode_as_map() {
        let mut map = HashMap::new();
        map.insert("user".to_string(), "ada".to_string());

        #[derive(Serialize)]
        struct User {
            user: String,
        }
        let bytes = marshal(&User {
            user: "ada".to_string(),
        })
        .unwrap();

        // Self-describing: a reader without the struct definition still sees field names
        let decoded: HashMap<String, String> = unmarshal(&bytes).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_type_mismatch_is_decode_error() {
        let bytes = marshal("bar").unwrap();
        let result: Result<u64> = unmarshal(&bytes);
        assert!(matches!(result, Err(CacheError::Decode(_))));
    }
}
