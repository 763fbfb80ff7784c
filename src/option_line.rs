//! Grammar for a single line of a descriptor's `Options:` section.
//!
//! ```text
//! line    = ws name ws sep ws value comment?
//! sep     = ':' | '='
//! value   = quoted junk | bare
//! quoted  = '"' [^"]* '"' | "'" [^']* "'" | '“' [^”]* '”' | '‘' [^’]* '’'
//! junk    = [^#]*
//! bare    = [^#]*
//! comment = '#' any*
//! ```
//!
//! A `#` inside a quoted value does not start a comment. Uses [`chumsky`].

use chumsky::prelude::*;

/// How the value was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    None,
    Double,
    Single,
    /// Typographic quotes, as pasted from word processors.
    Smart,
}

/// A parsed option line, borrowing from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionLine<'a> {
    pub name: &'a str,
    /// The value with quotes removed and, for bare values, surrounding
    /// whitespace trimmed.
    pub value: &'a str,
    pub quote: Quote,
    /// Trailing comment text, without the `#` and trimmed.
    pub comment: Option<&'a str>,
}

type ParseError<'a> = extra::Err<Simple<'a, char>>;

fn quoted<'a>(open: char, close: char) -> impl Parser<'a, &'a str, &'a str, ParseError<'a>> {
    just(open)
        .ignore_then(none_of(close).repeated().to_slice())
        .then_ignore(just(close))
}

fn option_line_parser<'a>() -> impl Parser<'a, &'a str, OptionLine<'a>, ParseError<'a>> {
    let ws = one_of(" \t").repeated();

    let name = any()
        .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .to_slice();

    let quoted_value = choice((
        quoted('"', '"').map(|v| (v, Quote::Double)),
        quoted('\'', '\'').map(|v| (v, Quote::Single)),
        quoted('\u{201C}', '\u{201D}').map(|v| (v, Quote::Smart)),
        quoted('\u{2018}', '\u{2019}').map(|v| (v, Quote::Smart)),
    ))
    // Anything between the closing quote and the comment is dropped.
    .then_ignore(none_of('#').repeated());

    let bare_value = none_of('#')
        .repeated()
        .to_slice()
        .map(|v: &'a str| (v.trim(), Quote::None));

    let comment = just('#')
        .ignore_then(any().repeated().to_slice())
        .map(|c: &'a str| c.trim());

    ws.clone()
        .ignore_then(name)
        .then_ignore(ws.clone())
        .then_ignore(one_of(":="))
        .then_ignore(ws)
        .then(quoted_value.or(bare_value))
        .then(comment.or_not())
        .map(|((name, (value, quote)), comment)| OptionLine {
            name,
            value,
            quote,
            comment,
        })
}

/// Parse one option line.
///
/// # Example
/// ```
/// use srcfiles_rs::option_line::parse_option_line;
///
/// let line = parse_option_line(r#"    CFlags_cmn: "-DNAME=#1"   # quoted"#).unwrap();
/// assert_eq!(line.name, "CFlags_cmn");
/// assert_eq!(line.value, "-DNAME=#1");
/// assert_eq!(line.comment, Some("quoted"));
/// ```
pub fn parse_option_line(input: &str) -> Result<OptionLine<'_>, String> {
    option_line_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| {
            let messages: Vec<String> = errs.iter().map(|e| format!("{e}")).collect();
            format!("malformed option line '{}': {}", input.trim(), messages.join("; "))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_value_with_comment() {
        let line = parse_option_line("    Warn: 4    # [1-4] warning level").unwrap();
        assert_eq!(
            line,
            OptionLine {
                name: "Warn",
                value: "4",
                quote: Quote::None,
                comment: Some("[1-4] warning level"),
            }
        );
    }

    #[test]
    fn equals_separator() {
        let line = parse_option_line("Project=demo").unwrap();
        assert_eq!(line.name, "Project");
        assert_eq!(line.value, "demo");
        assert_eq!(line.comment, None);
    }

    #[test]
    fn quoted_hash_is_not_a_comment() {
        let line = parse_option_line(r#"    name: "a # b"  # real comment"#).unwrap();
        assert_eq!(line.value, "a # b");
        assert_eq!(line.quote, Quote::Double);
        assert_eq!(line.comment, Some("real comment"));
    }

    #[test]
    fn single_and_smart_quotes() {
        let line = parse_option_line("IncDirs: '../inc;#weird'").unwrap();
        assert_eq!(line.value, "../inc;#weird");
        assert_eq!(line.quote, Quote::Single);

        let line = parse_option_line("Natvis: \u{201C}my # file.natvis\u{201D} # vis").unwrap();
        assert_eq!(line.value, "my # file.natvis");
        assert_eq!(line.quote, Quote::Smart);
        assert_eq!(line.comment, Some("vis"));
    }

    #[test]
    fn value_may_contain_separator_characters() {
        let line = parse_option_line("TargetDir: C:/out=here").unwrap();
        assert_eq!(line.value, "C:/out=here");
    }

    #[test]
    fn empty_value() {
        let line = parse_option_line("    CFlags_cmn:   # nothing yet").unwrap();
        assert_eq!(line.value, "");
        assert_eq!(line.comment, Some("nothing yet"));
    }

    #[test]
    fn unterminated_quote_falls_back_to_bare() {
        let line = parse_option_line(r#"Project: "demo"#).unwrap();
        assert_eq!(line.value, "\"demo");
        assert_eq!(line.quote, Quote::None);
    }

    #[test]
    fn missing_separator_is_an_error() {
        assert!(parse_option_line("    Project demo").is_err());
        assert!(parse_option_line("    : demo").is_err());
    }
}
