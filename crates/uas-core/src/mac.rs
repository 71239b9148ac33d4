//! # Hardware Address Newtype
//!
//! The controller reports client addresses as lowercase colon-separated hex,
//! but operators type them into configuration in whatever form their tools
//! print: `AA-BB-CC-DD-EE-FF`, `aa:bb:cc:dd:ee:ff`, mixed case. [`MacAddress`]
//! accepts either separator (used consistently) and stores the canonical
//! lowercase colon form.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A six-octet hardware address in canonical `aa:bb:cc:dd:ee:ff` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse a hardware address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidMac`] unless the input is six pairs
    /// of hex digits joined by five identical separators, each `:` or `-`.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = value.as_ref();
        let invalid = || ValidationError::InvalidMac(raw.to_string());

        let bytes = raw.as_bytes();
        if bytes.len() != 17 {
            return Err(invalid());
        }
        let separator = bytes[2];
        if separator != b':' && separator != b'-' {
            return Err(invalid());
        }

        let mut canonical = String::with_capacity(17);
        for (i, &b) in bytes.iter().enumerate() {
            if i % 3 == 2 {
                if b != separator {
                    return Err(invalid());
                }
                canonical.push(':');
            } else {
                if !b.is_ascii_hexdigit() {
                    return Err(invalid());
                }
                canonical.push(char::from(b.to_ascii_lowercase()));
            }
        }
        Ok(Self(canonical))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MacAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for MacAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_canonical_form() {
        let mac = MacAddress::new("90:04:e3:51:9d:a1").unwrap();
        assert_eq!(mac.as_str(), "90:04:e3:51:9d:a1");
    }

    #[test]
    fn canonicalizes_case_and_dashes() {
        let mac = MacAddress::new("9E-CC-A1-2F-0B-AA").unwrap();
        assert_eq!(mac.as_str(), "9e:cc:a1:2f:0b:aa");
        assert_eq!(mac, MacAddress::new("9e:cc:a1:2f:0b:aa").unwrap());
    }

    #[test]
    fn rejects_mixed_separators() {
        assert!(MacAddress::new("9e:cc-a1:2f:0b:aa").is_err());
        assert!(MacAddress::new("9e-cc-a1-2f-0b:aa").is_err());
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(MacAddress::new("").is_err());
        assert!(MacAddress::new("9e:cc:a1:2f:0b").is_err());
        assert!(MacAddress::new("9e:cc:a1:2f:0b:aa:01").is_err());
        assert!(MacAddress::new("9e:cc:a1:2f:0b:ag").is_err());
        assert!(MacAddress::new("9e.cc.a1.2f.0b.aa").is_err());
    }

    #[test]
    fn rejects_separator_in_pair_position() {
        assert!(MacAddress::new("9::cc:a1:2f:0b:aa").is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: MacAddress = serde_json::from_str("\"AA:BB:CC:DD:EE:FF\"").unwrap();
        assert_eq!(ok.as_str(), "aa:bb:cc:dd:ee:ff");
        let bad: Result<MacAddress, _> = serde_json::from_str("\"not-a-mac\"");
        assert!(bad.is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let mac = MacAddress::new("aa-bb-cc-dd-ee-ff").unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"aa:bb:cc:dd:ee:ff\"");
    }

    proptest! {
        /// Any six octets round-trip through either separator to the same canonical form.
        #[test]
        fn any_octets_parse(octets in proptest::array::uniform6(any::<u8>()), upper in any::<bool>()) {
            let colon: Vec<String> = octets.iter().map(|b| format!("{b:02x}")).collect();
            let expected = colon.join(":");
            let mut dashed = colon.join("-");
            if upper {
                dashed = dashed.to_uppercase();
            }
            let parsed = MacAddress::new(&dashed).unwrap();
            prop_assert_eq!(parsed.as_str(), expected.as_str());
        }
    }
}
