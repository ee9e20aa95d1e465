//! Serde adapters implementing the tolerant field rules of the ceremony wire
//! format: unknown values fall back to defaults, malformed list entries are
//! skipped, and numbers may arrive stringified.

use std::marker::PhantomData;

use serde::{
    de::{IgnoredAny, SeqAccess, Visitor},
    Deserialize, Deserializer,
};

/// Many fields in the webauthn spec have the following wording.
///
/// > The values SHOULD be members of `T` but client platforms MUST ignore unknown values.
///
/// This method is a simple way of ignoring unknown values without failing deserialization.
pub fn ignore_unknown<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(match T::deserialize(de) {
        Ok(val) => val,
        Err(_) => T::default(),
    })
}

/// An entry that either parsed fully or gets dropped from its list.
#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeKnown<T> {
    Known(T),
    Unknown(IgnoredAny),
}

/// Deserialize a list, dropping any entry that fails to parse instead of
/// failing the whole list. `null` and missing values yield an empty list.
///
/// This is how credential descriptor and parameter lists stay total: one
/// malformed `id` removes that entry, not the ceremony.
pub fn ignore_unknown_vec<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct TolerantSeq<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for TolerantSeq<T> {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a sequence or null")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut known = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            while let Some(entry) = seq.next_element::<MaybeKnown<T>>()? {
                match entry {
                    MaybeKnown::Known(value) => known.push(value),
                    MaybeKnown::Unknown(IgnoredAny) => {}
                }
            }
            Ok(known)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }
    }

    de.deserialize_any(TolerantSeq(PhantomData))
}

/// Deserialize a timeout that may arrive as a JSON number or a stringified
/// number. Values are milliseconds; fractional parts are preserved.
pub fn maybe_stringified<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrText>::deserialize(de)? {
        Some(NumberOrText::Number(value)) => Some(value),
        Some(NumberOrText::Text(text)) => text.parse().ok(),
        None => None,
    })
}

/// Serde adapter between a wire-level `i64` and a [`coset::iana`] algorithm
/// identifier, for use with `#[serde(with = "i64_to_iana")]`.
pub mod i64_to_iana {
    use coset::iana::EnumI64;

    /// Serialize the identifier as its `i64` value.
    pub fn serialize<S, T>(value: &T, ser: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: EnumI64,
    {
        ser.serialize_i64(value.to_i64())
    }

    /// Deserialize the identifier from its `i64` value, failing on values the
    /// identifier type does not know.
    pub fn deserialize<'de, D, T>(de: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: EnumI64,
    {
        let value: i64 = serde::Deserialize::deserialize(de)?;

        T::from_i64(value).ok_or_else(|| {
            <D::Error as serde::de::Error>::invalid_value(
                serde::de::Unexpected::Signed(value),
                &"An iana::Algorithm value",
            )
        })
    }
}
