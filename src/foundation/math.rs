pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Scale an alpha value by a 0..=100 percentage, truncating.
pub(crate) fn scale_alpha_percent(a: u8, percent: u8) -> u8 {
    let percent = u32::from(percent.min(100));
    (u32::from(a) * percent / 100) as u8
}

/// `floor(n / 2)` for signed values, matching floor division on negative extents.
pub(crate) fn half_floor(n: i64) -> i64 {
    n.div_euclid(2)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
