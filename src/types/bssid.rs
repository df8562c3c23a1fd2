use core::fmt;

/// 6-byte IEEE 802.11 address identifying one access point radio.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct Bssid(pub [u8; 6]);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BssidParseError {
    WrongLength,
    InvalidHex,
}

impl BssidParseError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WrongLength => "wrong_length",
            Self::InvalidHex => "invalid_hex",
        }
    }
}

impl fmt::Display for BssidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Bssid {
    pub const ZERO: Self = Self([0; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Parses `aa:bb:cc:dd:ee:ff`; `-` is accepted as separator too.
    pub fn parse(s: &str) -> Result<Self, BssidParseError> {
        let mut bytes = [0u8; 6];
        let mut count = 0usize;
        for part in s.split(|c| c == ':' || c == '-') {
            if count >= bytes.len() || part.len() != 2 {
                return Err(BssidParseError::WrongLength);
            }
            bytes[count] =
                u8::from_str_radix(part, 16).map_err(|_| BssidParseError::InvalidHex)?;
            count += 1;
        }
        if count != bytes.len() {
            return Err(BssidParseError::WrongLength);
        }
        Ok(Self(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }

    pub(crate) const fn to_u64(self) -> u64 {
        let b = self.0;
        ((b[0] as u64) << 40)
            | ((b[1] as u64) << 32)
            | ((b[2] as u64) << 24)
            | ((b[3] as u64) << 16)
            | ((b[4] as u64) << 8)
            | (b[5] as u64)
    }

    pub(crate) const fn from_u64(raw: u64) -> Self {
        Self([
            (raw >> 40) as u8,
            (raw >> 32) as u8,
            (raw >> 24) as u8,
            (raw >> 16) as u8,
            (raw >> 8) as u8,
            raw as u8,
        ])
    }
}

impl fmt::Debug for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bssid({self})")
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_colon_and_dash_separators() {
        let expected = Bssid([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01]);
        assert_eq!(Bssid::parse("AA:BB:CC:DD:EE:01"), Ok(expected));
        assert_eq!(Bssid::parse("aa-bb-cc-dd-ee-01"), Ok(expected));
    }

    #[test]
    fn parse_rejects_short_and_non_hex_input() {
        assert_eq!(
            Bssid::parse("aa:bb:cc:dd:ee"),
            Err(BssidParseError::WrongLength)
        );
        assert_eq!(
            Bssid::parse("aa:bb:cc:dd:ee:01:02"),
            Err(BssidParseError::WrongLength)
        );
        assert_eq!(
            Bssid::parse("aa:bb:cc:dd:ee:zz"),
            Err(BssidParseError::InvalidHex)
        );
    }

    #[test]
    fn packed_u64_keeps_all_octets() {
        let bssid = Bssid([0x02, 0x11, 0x22, 0x33, 0x44, 0xFE]);
        assert_eq!(Bssid::from_u64(bssid.to_u64()), bssid);
    }
}
