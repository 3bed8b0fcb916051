//! Validated, auto-zeroizing wrapper around the TBR admin code (ePSKc).
use zeroize::Zeroize;

use crate::error::TransportError;

/// A 6-12 digit decimal admin code, validated and never logged.
///
/// The backing bytes are zeroized on drop. `Debug` deliberately never prints the digits.
pub struct AdminCode(String);

impl AdminCode {
    /// Validates `raw` against `^[0-9]{6,12}$` after trimming ASCII whitespace.
    ///
    /// Trimming happens first so `" 123456789 "` is accepted per S1 in the spec's boundary
    /// scenarios, while an internal space such as `"12a456"` is still rejected.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace());
        if is_valid_admin_code(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TransportError::InvalidAdminCode)
        }
    }

    /// Returns the admin code as ASCII bytes, suitable for installing as the EC-JPAKE secret.
    pub fn as_ascii_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for AdminCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminCode(<{} digits redacted>)", self.0.len())
    }
}

impl Drop for AdminCode {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

fn is_valid_admin_code(s: &str) -> bool {
    let len = s.len();
    (6..=12).contains(&len) && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_boundary_scenarios() {
        assert!(AdminCode::parse("12345").is_err());
        assert!(AdminCode::parse("123456").is_ok());
        assert!(AdminCode::parse("1234567890123").is_err());
        assert!(AdminCode::parse(" 123456789 ").is_ok());
        assert!(AdminCode::parse("12a456").is_err());
    }

    #[test]
    fn trims_surrounding_whitespace_but_not_internal() {
        let trimmed = AdminCode::parse("\t 987654 \n").unwrap();
        assert_eq!(trimmed.as_ascii_bytes(), b"987654");
    }

    #[test]
    fn debug_never_prints_digits() {
        let code = AdminCode::parse("123456").unwrap();
        let formatted = format!("{:?}", code);
        assert!(!formatted.contains("123456"));
    }

    #[test]
    fn exact_boundary_lengths() {
        assert!(AdminCode::parse("000000").is_ok());
        assert!(AdminCode::parse("000000000000").is_ok());
        assert!(AdminCode::parse("0000000000000").is_err());
        assert!(AdminCode::parse("00000").is_err());
    }
}
