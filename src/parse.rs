//! Counts are read the way C's `strtoull(s, NULL, 0)` reads them: a `0x`
//! prefix selects hexadecimal and a leading `0` selects octal. Unlike
//! `strtoull`, the whole argument has to be consumed.

use std::num::IntErrorKind;

use crate::error::ParseCountError;

fn split_radix(s: &str) -> (u32, &str) {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, hex)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    }
}

/// Parses a non-negative count, accepting hex (`0x1f`), octal (`017`) and
/// decimal literals with an optional leading `+`.
pub fn parse_count<T: TryFrom<u64>>(input: &str) -> Result<T, ParseCountError> {
    if input.is_empty() {
        return Err(ParseCountError::Empty);
    }

    let unsigned = input.strip_prefix('+').unwrap_or(input);
    let (radix, digits) = split_radix(unsigned);

    // from_str_radix takes its own sign, which would let "0x+1" through.
    if digits.is_empty() || digits.starts_with('+') {
        return Err(ParseCountError::InvalidDigit(input.to_owned()));
    }

    let value = u64::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ParseCountError::Overflow(input.to_owned()),
        _ => ParseCountError::InvalidDigit(input.to_owned()),
    })?;

    T::try_from(value).map_err(|_| ParseCountError::Overflow(input.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radix_prefixes() {
        assert_eq!(parse_count::<u64>("10000"), Ok(10000));
        assert_eq!(parse_count::<u64>("0x10"), Ok(16));
        assert_eq!(parse_count::<u64>("0XfF"), Ok(255));
        assert_eq!(parse_count::<u64>("010"), Ok(8));
        assert_eq!(parse_count::<u64>("0"), Ok(0));
        assert_eq!(parse_count::<u64>("+7"), Ok(7));
        assert_eq!(parse_count::<usize>("+0x2"), Ok(2));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_count::<u64>(""), Err(ParseCountError::Empty));
        for bad in &["abc", "-1", "12abc", "0x", "+", "08", "0x+1", "++1", " 1"] {
            assert_eq!(
                parse_count::<u64>(bad),
                Err(ParseCountError::InvalidDigit(bad.to_string())),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            parse_count::<u64>("0x10000000000000000"),
            Err(ParseCountError::Overflow("0x10000000000000000".to_owned()))
        );
        assert_eq!(
            parse_count::<u8>("256"),
            Err(ParseCountError::Overflow("256".to_owned()))
        );
        assert_eq!(parse_count::<u8>("0377"), Ok(255));
    }
}
