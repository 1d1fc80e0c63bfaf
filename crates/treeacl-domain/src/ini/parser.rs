//! Parser for section-based ini text.
//!
//! Example:
//! ```text
//! ; flat-file ACL
//! [alice]
//! groups = admins
//! deny = secret
//!
//! [admins]
//! allow = secret, reports
//! ```
//!
//! Supported lines: `[Section]` headers, `key = value` entries, bare `key`
//! lines (empty value), blank lines and `;`/`#` comments. Headers and bare
//! keys may end in a comment; a value runs to the end of its line. Values
//! are trimmed and may be wrapped in double quotes. Repeated sections merge;
//! a repeated key keeps its last value.

use std::collections::BTreeMap;

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, one_of, space0},
    combinator::{all_consuming, eof, map, opt, rest, value},
    error::{context, ContextError, ParseError, VerboseError},
    sequence::{delimited, pair, preceded, separated_pair, terminated},
    IResult,
};

use crate::error::{DomainError, DomainResult};

/// One classified line.
#[derive(Debug, Clone, PartialEq)]
enum Line<'a> {
    Blank,
    Section(&'a str),
    Entry(&'a str, &'a str),
}

/// Parsed ini document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniDocument {
    /// Entries appearing before the first section header.
    globals: BTreeMap<String, String>,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl IniDocument {
    /// Value of `key` in `section`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    /// Value of a key declared before any section.
    pub fn global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(String::as_str)
    }

    /// Sections with their entries, ordered by name.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, String>)> {
        self.sections.iter().map(|(name, entries)| (name.as_str(), entries))
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }
}

// ============ Line Parsers ============

/// Parse a comment (`;` or `#` to end of line)
fn comment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), pair(one_of(";#"), rest))(input)
}

/// Parse a `[name]` header, allowing a trailing comment
fn section_header<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    context(
        "section header",
        terminated(
            delimited(
                char('['),
                take_while1(|c: char| c != '[' && c != ']'),
                char(']'),
            ),
            pair(space0, opt(comment)),
        ),
    )(input)
}

/// Parse a key: everything up to `=`, excluding section and comment markers
fn key<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    context(
        "key",
        take_while1(|c: char| !matches!(c, '=' | '[' | ']' | ';' | '#')),
    )(input)
}

/// Parse `key = value` or a bare `key`, which may carry a trailing comment.
/// Everything after `=` belongs to the value.
fn entry<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (&'a str, &'a str), E> {
    alt((
        separated_pair(key, char('='), rest),
        map(terminated(key, opt(comment)), |k| (k, "")),
    ))(input)
}

fn line<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Line<'a>, E> {
    preceded(
        space0,
        alt((
            value(Line::Blank, eof),
            value(Line::Blank, comment),
            map(section_header, |name| Line::Section(name.trim())),
            map(entry, |(k, v)| Line::Entry(k.trim(), unquote(v.trim()))),
        )),
    )(input)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parses ini text into an [`IniDocument`].
///
/// Fails with [`DomainError::IniParse`] naming the first malformed line (1-based).
pub fn parse(input: &str) -> DomainResult<IniDocument> {
    let mut document = IniDocument::default();
    let mut current: Option<String> = None;

    for (index, raw) in input.lines().enumerate() {
        let parsed = match all_consuming(line::<VerboseError<&str>>)(raw) {
            Ok((_, parsed)) => parsed,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(DomainError::IniParse {
                    line: index + 1,
                    message: nom::error::convert_error(raw, e),
                });
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(DomainError::IniParse {
                    line: index + 1,
                    message: "incomplete input".to_string(),
                });
            }
        };

        match parsed {
            Line::Blank => {}
            Line::Section(name) => {
                if name.is_empty() {
                    return Err(DomainError::IniParse {
                        line: index + 1,
                        message: "section name cannot be empty".to_string(),
                    });
                }
                document.sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
            }
            Line::Entry(k, v) => {
                let entries = match &current {
                    Some(section) => document.sections.entry(section.clone()).or_default(),
                    None => &mut document.globals,
                };
                entries.insert(k.to_string(), v.to_string());
            }
        }
    }

    Ok(document)
}
