//! # Document Number Formats
//!
//! Orders, invoices and generated SKUs are numbered from a pattern stored in
//! settings, e.g. `INV-{n:6}` renders sequence 42 as `INV-000042`. The
//! settings page calls [`NumberFormat::preview`] so the admin sees the next
//! number before saving a format change.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// A parsed document number format: literal prefix, zero-padded sequence,
/// literal suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NumberFormat {
    pub prefix: String,

    /// Minimum digits for the sequence. Wider sequences are never truncated.
    pub pad_width: usize,

    pub suffix: String,
}

impl NumberFormat {
    /// Parses a pattern of the form `<prefix>{n:<width>}<suffix>`.
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::numbering::NumberFormat;
    ///
    /// let format = NumberFormat::parse("INV-{n:6}").unwrap();
    /// assert_eq!(format.render(42), "INV-000042");
    /// ```
    ///
    /// ## Errors
    /// - no `{n:width}` placeholder
    /// - width not a number, or outside 1..=10
    /// - more than one placeholder
    pub fn parse(pattern: &str) -> Result<Self, ValidationError> {
        let start = pattern
            .find("{n:")
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "format".to_string(),
                reason: "missing {n:width} placeholder".to_string(),
            })?;

        let end = pattern[start..]
            .find('}')
            .map(|rel| start + rel)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "format".to_string(),
                reason: "unterminated {n:width} placeholder".to_string(),
            })?;

        let width: usize =
            pattern[start + 3..end]
                .parse()
                .map_err(|_| ValidationError::InvalidFormat {
                    field: "format".to_string(),
                    reason: "placeholder width must be a number".to_string(),
                })?;

        if !(1..=10).contains(&width) {
            return Err(ValidationError::OutOfRange {
                field: "format width".to_string(),
                min: 1,
                max: 10,
            });
        }

        let suffix = &pattern[end + 1..];
        if suffix.contains("{n:") {
            return Err(ValidationError::InvalidFormat {
                field: "format".to_string(),
                reason: "only one {n:width} placeholder is allowed".to_string(),
            });
        }

        Ok(NumberFormat {
            prefix: pattern[..start].to_string(),
            pad_width: width,
            suffix: suffix.to_string(),
        })
    }

    /// Renders a sequence number through this format.
    pub fn render(&self, seq: i64) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            seq,
            self.suffix,
            width = self.pad_width
        )
    }

    /// What the next issued number will look like. Same as [`render`],
    /// named for the settings page's preview box.
    ///
    /// [`render`]: NumberFormat::render
    pub fn preview(&self, next_seq: i64) -> String {
        self.render(next_seq)
    }

    /// The compact pattern string this format round-trips to.
    pub fn pattern(&self) -> String {
        format!("{}{{n:{}}}{}", self.prefix, self.pad_width, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let f = NumberFormat::parse("INV-{n:6}").unwrap();
        assert_eq!(f.prefix, "INV-");
        assert_eq!(f.pad_width, 6);
        assert_eq!(f.suffix, "");
        assert_eq!(f.render(42), "INV-000042");
        assert_eq!(f.render(1), "INV-000001");
    }

    #[test]
    fn test_suffix_and_bare_placeholder() {
        let f = NumberFormat::parse("{n:4}/A").unwrap();
        assert_eq!(f.prefix, "");
        assert_eq!(f.suffix, "/A");
        assert_eq!(f.render(7), "0007/A");

        let f = NumberFormat::parse("{n:1}").unwrap();
        assert_eq!(f.render(3), "3");
    }

    #[test]
    fn test_wide_sequences_not_truncated() {
        let f = NumberFormat::parse("ORD-{n:4}").unwrap();
        assert_eq!(f.render(123456), "ORD-123456");
    }

    #[test]
    fn test_parse_errors() {
        assert!(NumberFormat::parse("INV-").is_err());
        assert!(NumberFormat::parse("INV-{n:}").is_err());
        assert!(NumberFormat::parse("INV-{n:abc}").is_err());
        assert!(NumberFormat::parse("INV-{n:0}").is_err());
        assert!(NumberFormat::parse("INV-{n:11}").is_err());
        assert!(NumberFormat::parse("INV-{n:6").is_err());
        assert!(NumberFormat::parse("{n:3}-{n:3}").is_err());
    }

    #[test]
    fn test_pattern_round_trip() {
        for pattern in ["INV-{n:6}", "SKU-{n:5}", "{n:4}/A", "W{n:2}E"] {
            let f = NumberFormat::parse(pattern).unwrap();
            assert_eq!(f.pattern(), pattern);
            assert_eq!(NumberFormat::parse(&f.pattern()).unwrap(), f);
        }
    }

    #[test]
    fn test_preview_matches_render() {
        let f = NumberFormat::parse("ORD-{n:6}").unwrap();
        assert_eq!(f.preview(1044), f.render(1044));
        assert_eq!(f.preview(1044), "ORD-001044");
    }
}
