//! `#RRGGBB` color parsing for the background and waveform colors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parses exactly `#` followed by six hex digits.
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid color: {code}");

        let hex = code.strip_prefix('#').ok_or_else(invalid)?;
        if code.len() != 7 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_colors() {
        assert_eq!("#4b5f76".parse::<Rgb>().unwrap(), Rgb::new(0x4b, 0x5f, 0x76));
        assert_eq!("#C2F1DB".parse::<Rgb>().unwrap(), Rgb::new(0xc2, 0xf1, 0xdb));
    }

    #[test]
    fn test_reject_malformed_colors() {
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#1234567".parse::<Rgb>().is_err());
        assert!("4b5f76a".parse::<Rgb>().is_err());
        assert!("#4b5g76".parse::<Rgb>().is_err());
        assert!("#+1+2+3".parse::<Rgb>().is_err());
        assert!("#ééé".parse::<Rgb>().is_err());
        assert!("".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_error_message_echoes_input() {
        assert_eq!("#12345".parse::<Rgb>().unwrap_err(), "invalid color: #12345");
    }

    #[test]
    fn test_display_is_lowercase_hex() {
        assert_eq!(Rgb::new(0xC2, 0xF1, 0xDB).to_string(), "#c2f1db");
    }
}
