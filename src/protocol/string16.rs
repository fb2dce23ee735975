//! Length-prefixed UCS-2 text as it travels on the wire.

use std::fmt;

/// Text stored as raw 16-bit character units.
///
/// The codec treats the units as opaque: decoding never validates them, so a
/// value read from the wire always re-encodes to the same bytes. Conversions
/// to and from Rust strings go through UTF-16.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct String16 {
    units: Vec<u16>,
}

impl String16 {
    /// Largest number of units the 2-byte count can describe.
    pub const MAX_UNITS: usize = u16::MAX as usize;

    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap units read from the wire.
    ///
    /// Anything past [`Self::MAX_UNITS`] is dropped.
    pub fn from_units(mut units: Vec<u16>) -> Self {
        units.truncate(Self::MAX_UNITS);
        Self { units }
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// Number of character units, which is what the wire count holds.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Bytes this value occupies on the wire, count included.
    pub fn wire_len(&self) -> usize {
        2 + 2 * self.units.len()
    }

    /// Decode to a Rust string, replacing unpaired surrogates.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }
}

impl From<&str> for String16 {
    fn from(value: &str) -> Self {
        Self::from_units(value.encode_utf16().take(Self::MAX_UNITS).collect())
    }
}

impl From<String> for String16 {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl PartialEq<str> for String16 {
    fn eq(&self, other: &str) -> bool {
        self.units.iter().copied().eq(other.encode_utf16())
    }
}

impl PartialEq<&str> for String16 {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Display for String16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in char::decode_utf16(self.units.iter().copied()) {
            write!(f, "{}", c.unwrap_or(char::REPLACEMENT_CHARACTER))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_counts_units() {
        let s = String16::from("hi");
        assert_eq!(s.len(), 2);
        assert_eq!(s.units(), &[0x68, 0x69]);
        assert_eq!(s.wire_len(), 6);
    }

    #[test]
    fn test_empty() {
        let s = String16::new();
        assert!(s.is_empty());
        assert_eq!(s.wire_len(), 2);
        assert_eq!(s.to_string_lossy(), "");
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let s = String16::from("\u{a7}cRed \u{00e9}t\u{00e9}");
        assert_eq!(s.to_string_lossy(), "\u{a7}cRed \u{00e9}t\u{00e9}");
        assert!(s == "\u{a7}cRed \u{00e9}t\u{00e9}");
    }

    #[test]
    fn test_unpaired_surrogate_kept_verbatim() {
        let s = String16::from_units(vec![0xD800, 0x0041]);
        assert_eq!(s.units(), &[0xD800, 0x0041]);
        assert_eq!(s.to_string(), "\u{fffd}A");
    }

    #[test]
    fn test_truncates_to_max_units() {
        let long = "a".repeat(String16::MAX_UNITS + 10);
        let s = String16::from(long.as_str());
        assert_eq!(s.len(), String16::MAX_UNITS);
    }
}
