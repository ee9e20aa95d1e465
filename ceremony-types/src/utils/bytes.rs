use std::ops::{Deref, DerefMut};

use serde::{de::Visitor, Deserialize, Deserializer, Serialize};
use typeshare::typeshare;

use super::encoding;

/// A newtype around `Vec<u8>` which serializes as unpadded `base64url` text.
///
/// Every binary field on the ceremony wire (challenges, credential ids, user
/// handles, attestation and assertion payloads) is URL-safe base64 without
/// padding. Serializing always re-encodes with the `-`/`_` alphabet and no
/// `=` padding, so a value decoded from canonical input re-encodes to the
/// exact same text.
///
/// Deserializing additionally accepts standard `base64`, padded input, and a
/// plain array of numbers, so that payloads produced by permissive servers or
/// by platform authenticator bridges still parse.
#[typeshare(transparent)]
#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[repr(transparent)]
pub struct Bytes(Vec<u8>);

impl Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Bytes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(inner: Vec<u8>) -> Self {
        Bytes(inner)
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(src: Bytes) -> Self {
        src.0
    }
}

impl From<Bytes> for String {
    fn from(src: Bytes) -> Self {
        encoding::base64url(&src)
    }
}

/// The string given for decoding is not `base64url` nor `base64` encoded data.
#[derive(Debug)]
pub struct NotBase64Encoded;

impl TryFrom<&str> for Bytes {
    type Error = NotBase64Encoded;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        encoding::try_from_base64url(value)
            .or_else(|| encoding::try_from_base64(value))
            .ok_or(NotBase64Encoded)
            .map(Self)
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&encoding::base64url(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Base64Visitor;

        impl<'de> Visitor<'de> for Base64Visitor {
            type Value = Bytes;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a base64(url) encoded string or a vector of bytes")
            }

            fn visit_borrowed_str<E>(self, v: &'de str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(v)
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.try_into().map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Str(v),
                        &"a base64(url) encoded string",
                    )
                })
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut buf = Vec::with_capacity(seq.size_hint().unwrap_or_default());
                while let Some(byte) = seq.next_element()? {
                    buf.push(byte);
                }
                Ok(Bytes(buf))
            }
        }
        deserializer.deserialize_any(Base64Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand::random_vec;

    #[test]
    fn encode_decode_round_trip() {
        for len in [0, 1, 2, 3, 16, 32, 64] {
            let raw = random_vec(len);
            let text = String::from(Bytes::from(raw.clone()));
            let back = Bytes::try_from(text.as_str()).expect("failed to decode own encoding");
            assert_eq!(*back, raw);
            assert!(!text.contains('='), "encoding must not emit padding");
        }
    }

    #[test]
    fn canonical_text_round_trip() {
        // decode(x) then encode must reproduce x for canonical base64url input
        let text = "P76voTkd3es-HD_1reQLTCu37eYMTj5_ttNk0hZJoug";
        let bytes = Bytes::try_from(text).expect("valid base64url");
        assert_eq!(bytes.len(), 32);
        assert_eq!(String::from(bytes), text);
    }

    #[test]
    fn accepts_padded_and_standard_base64() {
        let canonical = Bytes::try_from("ZcPUob9wS72YNHkRPnFypA").unwrap();
        assert_eq!(Bytes::try_from("ZcPUob9wS72YNHkRPnFypA==").unwrap(), canonical);

        let json = r#"{
            "array": [101,195,212,161,191,112,75,189,152,52,121,17,62,113,114,164],
            "base64url": "ZcPUob9wS72YNHkRPnFypA"
        }"#;
        let decoded: std::collections::HashMap<&str, Bytes> =
            serde_json::from_str(json).expect("failed to deserialize");
        assert_eq!(decoded["array"], decoded["base64url"]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Bytes::try_from("not valid !!!").is_err());
        serde_json::from_str::<Bytes>(r#""%%%""#).expect_err("should not parse");
    }
}
