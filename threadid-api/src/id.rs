//! The identifier type handed out by [`ThreadAbstraction`](crate::thread::ThreadAbstraction) implementations.

use core::fmt;
use core::num::NonZeroU64;
use core::str::FromStr;

use crate::Error;

/// An id identifying a thread within a process.
///
/// On a normal operating system this is the thread, on other systems it should be whatever is the closest equivalent,
/// e.g. for FreeRTOS it would be a task. On a single threaded bare-metal system it is a constant as there is only the
/// one callstack.
///
/// The id is unique among all threads that are alive at the same time within one process. Whether an id may be
/// reused after its thread terminates depends on the source that produced it. Nothing is guaranteed across process
/// restarts.
///
/// Zero is never a valid id, so `Option<ThreadId>` has the same size as `ThreadId`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ThreadId(NonZeroU64);

impl ThreadId {
    /// Creates a [`ThreadId`] from a raw value.
    ///
    /// Extra care needs to be taken that this is not a constant value or re-used within this process while the
    /// original thread is alive.
    pub const fn from_raw(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this id.
    pub const fn to_raw(self) -> NonZeroU64 {
        self.0
    }
}

impl TryFrom<u64> for ThreadId {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        NonZeroU64::new(raw).map(Self).ok_or(Error::InvalidId)
    }
}

impl From<ThreadId> for u64 {
    fn from(id: ThreadId) -> Self {
        id.0.get()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors that can occur while parsing [`ThreadId`] from a string.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ParseThreadIdError {
    /// The string is not exactly 16 hexadecimal digits.
    #[error("failed to parse thread id: {0}")]
    Invalid(hex::FromHexError),

    /// The string encodes zero, which no thread is ever assigned.
    #[error("thread id must not be zero")]
    Zero,
}

/// Parses the [`Display`](fmt::Display) form: exactly 16 hexadecimal digits, either case.
///
/// This accepts the same strings as the serde form.
impl FromStr for ThreadId {
    type Err = ParseThreadIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; size_of::<u64>()];
        hex::decode_to_slice(s, &mut bytes).map_err(ParseThreadIdError::Invalid)?;

        NonZeroU64::new(u64::from_be_bytes(bytes))
            .map(Self)
            .ok_or(ParseThreadIdError::Zero)
    }
}

impl serde::Serialize for ThreadId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::Error;

        let mut hex_bytes = [0u8; size_of::<u64>() * 2];
        hex::encode_to_slice(self.0.get().to_be_bytes(), &mut hex_bytes).map_err(S::Error::custom)?;

        serializer.serialize_str(core::str::from_utf8(&hex_bytes).map_err(S::Error::custom)?)
    }
}

impl<'de> serde::Deserialize<'de> for ThreadId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let bytes: [u8; size_of::<u64>()] = hex::serde::deserialize(deserializer)?;

        NonZeroU64::new(u64::from_be_bytes(bytes))
            .map(Self)
            .ok_or_else(|| D::Error::custom(ParseThreadIdError::Zero))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use core::num::NonZeroU64;
    use std::format;
    use std::string::ToString;

    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::{ParseThreadIdError, ThreadId};
    use crate::Error;

    fn id(raw: u64) -> ThreadId {
        ThreadId::from_raw(NonZeroU64::new(raw).unwrap())
    }

    #[test]
    fn niche_keeps_option_small() {
        assert_eq!(size_of::<Option<ThreadId>>(), size_of::<ThreadId>());
    }

    #[test]
    fn try_from_rejects_zero() {
        assert_eq!(ThreadId::try_from(0), Err(Error::InvalidId));
        assert_eq!(ThreadId::try_from(7), Ok(id(7)));
        assert_eq!(u64::from(id(7)), 7);
    }

    #[test_case(1, "0000000000000001")]
    #[test_case(0x2a, "000000000000002a")]
    #[test_case(u64::MAX, "ffffffffffffffff")]
    fn display(raw: u64, expected: &str) {
        assert_eq!(id(raw).to_string(), expected);
    }

    #[test_case("000000000000002a", 0x2a ; "lowercase")]
    #[test_case("000000000000002A", 0x2a ; "uppercase")]
    #[test_case("FFFFFFFFFFFFFFFF", u64::MAX ; "max")]
    fn from_str(input: &str, expected: u64) {
        assert_eq!(input.parse::<ThreadId>(), Ok(id(expected)));
    }

    #[test]
    fn from_str_rejects_zero() {
        assert_eq!(
            "0000000000000000".parse::<ThreadId>(),
            Err(ParseThreadIdError::Zero)
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("2a" ; "short")]
    #[test_case("+00000000000002a" ; "sign")]
    #[test_case("00000000000000xy" ; "not hex")]
    #[test_case("000000000000000001" ; "too long")]
    fn from_str_rejects_malformed(input: &str) {
        assert!(matches!(
            input.parse::<ThreadId>(),
            Err(ParseThreadIdError::Invalid(_))
        ));
    }

    #[test_case("000000000000002a" ; "lowercase")]
    #[test_case("000000000000002A" ; "uppercase")]
    #[test_case("2a" ; "short")]
    #[test_case("+00000000000002a" ; "sign")]
    #[test_case("0000000000000000" ; "zero")]
    #[test_case("000000000000000001" ; "too long")]
    fn from_str_agrees_with_deserialize(input: &str) {
        let parsed = input.parse::<ThreadId>().ok();
        let deserialized = serde_json::from_str::<ThreadId>(&format!("\"{input}\"")).ok();
        assert_eq!(parsed, deserialized);
    }

    #[test]
    fn serde_uses_display_form() {
        let value = id(0x1234);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"0000000000001234\"");
        assert_eq!(serde_json::from_str::<ThreadId>(&json).unwrap(), value);
    }

    #[test]
    fn deserialize_rejects_zero() {
        assert!(serde_json::from_str::<ThreadId>("\"0000000000000000\"").is_err());
    }

    #[test]
    fn deserialize_rejects_wrong_length() {
        assert!(serde_json::from_str::<ThreadId>("\"1234\"").is_err());
    }
}
