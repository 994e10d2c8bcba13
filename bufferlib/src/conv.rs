//! ASCII hex digit helpers used by the Intel HEX codec.

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Returns the value of a single ASCII hex digit, or `None` for any other character.
#[must_use]
pub const fn hex_nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Decodes two ASCII hex digits (most significant first) into a byte.
#[must_use]
pub const fn hex_byte(hi: u8, lo: u8) -> Option<u8> {
    match (hex_nibble(hi), hex_nibble(lo)) {
        (Some(hi), Some(lo)) => Some((hi << 4) | lo),
        _ => None,
    }
}

/// Uppercase hex digit for the most significant nibble of `byte`.
#[must_use]
pub const fn upper_nibble_digit(byte: u8) -> u8 {
    HEX_DIGITS[(byte >> 4) as usize]
}

/// Uppercase hex digit for the least significant nibble of `byte`.
#[must_use]
pub const fn lower_nibble_digit(byte: u8) -> u8 {
    HEX_DIGITS[(byte & 0x0F) as usize]
}

/// Appends `byte` to `out` as two uppercase hex digits.
pub fn push_hex_byte(out: &mut String, byte: u8) {
    out.push(char::from(upper_nibble_digit(byte)));
    out.push(char::from(lower_nibble_digit(byte)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_nibble_valid() {
        let cases = [
            (b'0', 0x0),
            (b'9', 0x9),
            (b'a', 0xA),
            (b'f', 0xF),
            (b'A', 0xA),
            (b'F', 0xF),
        ];
        for (digit, expected) in cases {
            assert_eq!(hex_nibble(digit), Some(expected));
        }
    }

    #[test]
    fn test_hex_nibble_invalid() {
        for digit in [b'g', b'G', b'.', b' ', b':', b'/', b'@', b'`', b'\n', 0x00, 0xFF] {
            assert_eq!(hex_nibble(digit), None, "digit 0x{digit:02X}");
        }
    }

    #[test]
    fn test_hex_byte() {
        assert_eq!(hex_byte(b'0', b'0'), Some(0x00));
        assert_eq!(hex_byte(b'F', b'f'), Some(0xFF));
        assert_eq!(hex_byte(b'7', b'5'), Some(0x75));
        assert_eq!(hex_byte(b'b', b'E'), Some(0xBE));
        assert_eq!(hex_byte(b'.', b'0'), None);
        assert_eq!(hex_byte(b'0', b'.'), None);
    }

    #[test]
    fn test_nibble_digits_are_uppercase() {
        assert_eq!(upper_nibble_digit(0xAB), b'A');
        assert_eq!(lower_nibble_digit(0xAB), b'B');
        assert_eq!(upper_nibble_digit(0x0F), b'0');
        assert_eq!(lower_nibble_digit(0x0F), b'F');
    }

    #[test]
    fn test_every_byte_survives_digit_conversion() {
        for byte in 0..=u8::MAX {
            let hi = upper_nibble_digit(byte);
            let lo = lower_nibble_digit(byte);
            assert_eq!(hex_byte(hi, lo), Some(byte));
        }
    }

    #[test]
    fn test_push_hex_byte() {
        let mut s = String::from(":");
        push_hex_byte(&mut s, 0x04);
        push_hex_byte(&mut s, 0xE1);
        assert_eq!(s, ":04E1");
    }
}
