use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;

/// Parse `#RRGGBB` / `#RRGGBBAA` (leading `#` optional, case-insensitive).
pub(crate) fn parse_hex(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ascii".to_owned());
    }

    match s.len() {
        6 => Ok(Rgba8::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(Rgba8::new(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}

pub(crate) fn to_hex(c: Rgba8) -> String {
    if c.a == 255 {
        format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
    }
}

/// Read a color from a JSON value: a hex string or a `[r, g, b]` / `[r, g, b, a]` byte array.
pub(crate) fn color_from_value(v: &serde_json::Value) -> Option<Rgba8> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Hex(String),
        Arr(Vec<u8>),
    }

    match Repr::deserialize(v).ok()? {
        Repr::Hex(s) => parse_hex(&s).ok(),
        Repr::Arr(v) => match v.as_slice() {
            [r, g, b] => Some(Rgba8::rgb(*r, *g, *b)),
            [r, g, b, a] => Some(Rgba8::new(*r, *g, *b, *a)),
            _ => None,
        },
    }
}

impl Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&to_hex(*self))
    }
}

impl<'de> Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        color_from_value(&v)
            .ok_or_else(|| serde::de::Error::custom("expected #RRGGBB, #RRGGBBAA or [r,g,b(,a)]"))
    }
}
