//! Low-level nom parser functions for CSS-like length values.
//!
//! Used when page masters are loaded from JSON, where margins are written as
//! shorthands such as `"2cm"` or `"10pt 20pt"`.

use crate::dimension::Margins;
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{space0, space1};
use nom::combinator::opt;
use nom::multi::separated_list1;
use nom::number::complete::float;
use nom::sequence::delimited;
use nom::{IResult, Parser};
use thiserror::Error;

/// Errors that can occur during style parsing.
#[derive(Error, Debug, Clone)]
pub enum StyleParseError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value for '{property}': {value}")]
    InvalidValue { property: String, value: String },
}

/// Parses a number with an optional unit and converts it to points.
pub fn parse_length(input: &str) -> IResult<&str, f32> {
    let parsed: IResult<&str, (f32, Option<&str>)> = (
        float,
        opt(alt((
            tag_no_case("pt"),
            tag_no_case("px"),
            tag_no_case("in"),
            tag_no_case("cm"),
            tag_no_case("mm"),
        ))),
    )
        .parse(input);
    let (rest, (value, unit)) = parsed?;

    let factor = match unit.map(|u| u.to_ascii_lowercase()).as_deref() {
        Some("in") => 72.0,
        Some("cm") => 28.35,
        Some("mm") => 2.835,
        _ => 1.0,
    };
    Ok((rest, value * factor))
}

/// Parses a single length such as `"12pt"`, rejecting trailing garbage.
pub fn parse_single_length(input: &str) -> Result<f32, StyleParseError> {
    match delimited(space0, parse_length, space0).parse(input) {
        Ok(("", value)) => Ok(value),
        _ => Err(StyleParseError::InvalidValue {
            property: "length".to_string(),
            value: input.to_string(),
        }),
    }
}

/// Parses the 1/2/4-value margin shorthand.
pub fn parse_shorthand_margins(input: &str) -> Result<Margins, StyleParseError> {
    let parts_res = separated_list1(space1, parse_length).parse(input.trim());

    match parts_res {
        Ok(("", parts)) => match parts.len() {
            1 => Ok(Margins::all(parts[0])),
            2 => Ok(Margins {
                top: parts[0],
                right: parts[1],
                bottom: parts[0],
                left: parts[1],
            }),
            4 => Ok(Margins {
                top: parts[0],
                right: parts[1],
                bottom: parts[2],
                left: parts[3],
            }),
            _ => Err(StyleParseError::Parse(format!(
                "Invalid number of values for margin shorthand: got {}, expected 1, 2, or 4.",
                parts.len()
            ))),
        },
        _ => Err(StyleParseError::Parse(format!(
            "Failed to parse margins value: '{}'",
            input
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(parse_single_length("10pt").unwrap(), 10.0);
        assert_eq!(parse_single_length("1in").unwrap(), 72.0);
        assert!((parse_single_length("2cm").unwrap() - 56.7).abs() < 0.01);
        assert_eq!(parse_single_length(" 12 ").unwrap(), 12.0);
        assert!(parse_single_length("12furlongs").is_err());
    }

    #[test]
    fn parses_margin_shorthands() {
        let m = parse_shorthand_margins("10pt 20pt").unwrap();
        assert_eq!((m.top, m.right, m.bottom, m.left), (10.0, 20.0, 10.0, 20.0));
        let m = parse_shorthand_margins("1 2 3 4").unwrap();
        assert_eq!((m.top, m.right, m.bottom, m.left), (1.0, 2.0, 3.0, 4.0));
        assert!(parse_shorthand_margins("1 2 3").is_err());
    }
}
