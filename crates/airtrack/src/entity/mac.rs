// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 airtrack.dev

//! Hardware (MAC) address scalar.

use std::fmt;
use std::str::FromStr;

/// 48-bit hardware address.
///
/// # Display Format
/// Colon-separated hex: `"AA:BB:CC:DD:EE:FF"`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MacAddr {
    octets: [u8; 6],
}

impl MacAddr {
    pub fn new(octets: [u8; 6]) -> Self {
        Self { octets }
    }
}

/// Parse failure for a hardware address literal.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MacParseError {
    input: String,
}

impl fmt::Display for MacParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hardware address '{}'", self.input)
    }
}

impl std::error::Error for MacParseError {}

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MacParseError {
            input: s.to_string(),
        };

        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in s.split(|c| c == ':' || c == '-') {
            if count == 6 || part.len() != 2 {
                return Err(err());
            }
            octets[count] = u8::from_str_radix(part, 16).map_err(|_| err())?;
            count += 1;
        }

        if count != 6 {
            return Err(err());
        }

        Ok(Self { octets })
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.octets;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let mac: MacAddr = "aa:bb:cc:00:11:22".parse().unwrap();
        assert_eq!(mac.to_string(), "AA:BB:CC:00:11:22");

        let dashed: MacAddr = "AA-BB-CC-00-11-22".parse().unwrap();
        assert_eq!(mac, dashed);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("aa:bb:cc".parse::<MacAddr>().is_err());
        assert!("aa:bb:cc:00:11:22:33".parse::<MacAddr>().is_err());
        assert!("zz:bb:cc:00:11:22".parse::<MacAddr>().is_err());
        assert!("aabbcc001122".parse::<MacAddr>().is_err());
        assert!("".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let a: MacAddr = "00:00:00:00:00:01".parse().unwrap();
        let b: MacAddr = "00:00:00:00:00:02".parse().unwrap();
        assert!(a < b);
    }
}
