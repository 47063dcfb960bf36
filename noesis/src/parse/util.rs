//! Utility to make parsing easier.

use nom::{error::ErrorKind, Err as NomError, IResult};
use regex::Regex;

/// Wraps an anchored terminal regex as a `nom` parser.
///
/// The expression must be anchored with `^`: a match is consumed from
/// the front of the input and returned. A match that does not begin at
/// the front would mean silently skipping significant content, so it is
/// treated like no match at all. Either failure is an ordinary
/// recoverable error, which lets terminals compose under `alt`.
pub fn terminal(re: &'static Regex) -> impl Fn(&str) -> IResult<&str, &str> {
    move |i: &str| match re.find(i) {
        Some(found) if found.start() == 0 => Ok((&i[found.end()..], found.as_str())),
        _ => Err(NomError::Error((i, ErrorKind::Verify))),
    }
}

/// Strips `margin` characters from both ends of the input.
#[inline]
pub fn unwrap_str(i: &str, margin: usize) -> &str {
    &i[margin..i.len() - margin]
}

#[cfg(test)]
mod test {
    use super::*;
    use lazy_static::lazy_static;
    use test_case::test_case;

    lazy_static! {
        static ref ANCHORED: Regex = Regex::new(r#"^a+b"#).unwrap();
        static ref FLOATING: Regex = Regex::new(r#"a+b"#).unwrap();
    }

    #[test]
    fn consumes_anchored_matches() {
        let parser = terminal(&ANCHORED);
        let (rest, found) = parser("aabt").unwrap();
        assert_eq!(found, "aab");
        assert_eq!(rest, "t");
        assert!(parser("taab").is_err());
    }

    #[test]
    fn never_skips_input_before_a_match() {
        let parser = terminal(&FLOATING);
        assert!(parser("aabt").is_ok());
        // the leftmost match starts past the front: refused, not skipped
        assert!(parser("taab").is_err());
    }

    #[test_case("\"quoted\"", 1 => "quoted" ; "margin 1")]
    #[test_case("'''long'''", 3 => "long" ; "margin 3")]
    fn check_unwrap_str(i: &str, margin: usize) -> &str {
        unwrap_str(i, margin)
    }
}
