//! Logical-line assembly and lexical helpers built on `nom`.
//!
//! Recipes are line-oriented: `#` comment lines are discarded, backslash
//! continuations are joined, and each remaining logical line is split into
//! an uppercased instruction keyword and its raw argument text. Exec-form
//! JSON arrays and `--flag=value` options are tokenized here for the
//! parser to consume.

use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::opt,
    multi::separated_list0,
};
use shipshape_common::error::{Result, ShipshapeError};

/// A comment- and continuation-free instruction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based source line where the instruction starts.
    pub number: usize,
    /// Uppercased instruction keyword.
    pub keyword: String,
    /// Raw argument text, leading/trailing whitespace trimmed.
    pub args: String,
}

/// Assembles raw recipe text into logical instruction lines.
///
/// Comment lines (first non-blank character `#`) are discarded, including
/// inside continuations. A trailing backslash joins the next line.
///
/// # Errors
///
/// Returns an error if a line does not start with an instruction keyword.
pub fn lex(input: &str) -> Result<Vec<LogicalLine>> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in input.lines().enumerate() {
        let number = idx + 1;
        let trimmed = raw.trim();

        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed.is_empty() {
            // Blank lines never terminate an open continuation.
            continue;
        }

        let (fragment, continues) = trimmed
            .strip_suffix('\\')
            .map_or((trimmed, false), |rest| (rest.trim_end(), true));

        match pending.take() {
            Some((start, mut acc)) => {
                if !fragment.is_empty() {
                    if !acc.is_empty() {
                        acc.push(' ');
                    }
                    acc.push_str(fragment);
                }
                if continues {
                    pending = Some((start, acc));
                } else {
                    lines.push(split_keyword(start, &acc)?);
                }
            }
            None => {
                if continues {
                    pending = Some((number, fragment.to_owned()));
                } else {
                    lines.push(split_keyword(number, fragment)?);
                }
            }
        }
    }

    if let Some((start, acc)) = pending {
        // Trailing backslash on the last line: treat as complete.
        lines.push(split_keyword(start, &acc)?);
    }

    Ok(lines)
}

fn split_keyword(number: usize, text: &str) -> Result<LogicalLine> {
    let (rest, keyword) = instruction_keyword(text).map_err(|_| ShipshapeError::Parse {
        line: number,
        message: format!(
            "expected an instruction keyword, got \"{}\"",
            text.chars().take(20).collect::<String>()
        ),
    })?;
    Ok(LogicalLine {
        number,
        keyword: keyword.to_ascii_uppercase(),
        args: rest.trim().to_owned(),
    })
}

fn instruction_keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphabetic())(input)
}

/// Parses an exec-form JSON array: `["binary", "arg", …]`.
///
/// Returns `None` without consuming input when the text does not start
/// with `[`, so callers can fall back to shell form.
///
/// # Errors
///
/// Returns an error when text starting with `[` is not a valid array.
pub fn exec_array(line: usize, input: &str) -> Result<Option<Vec<String>>> {
    if !input.trim_start().starts_with('[') {
        return Ok(None);
    }
    let (rest, items) = parse_array(input.trim_start()).map_err(|_| ShipshapeError::Parse {
        line,
        message: format!("malformed exec-form array: {input}"),
    })?;
    if !rest.trim().is_empty() {
        return Err(ShipshapeError::Parse {
            line,
            message: format!("trailing text after exec-form array: \"{}\"", rest.trim()),
        });
    }
    Ok(Some(items))
}

fn parse_array(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = char('[')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, items) =
        separated_list0((multispace0, char(','), multispace0), json_string).parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = opt((char(','), multispace0)).parse(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, items))
}

/// Parses a double-quoted string literal with basic escape support.
fn json_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.char_indices();
    loop {
        match chars.next() {
            Some((idx, '"')) => return Ok((&input[idx + 1..], result)),
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => result.push('\n'),
                Some((_, 't')) => result.push('\t'),
                Some((_, '\\')) => result.push('\\'),
                Some((_, '"')) => result.push('"'),
                Some((_, '/')) => result.push('/'),
                Some((_, c)) => {
                    result.push('\\');
                    result.push(c);
                }
                None => {
                    return Err(nom::Err::Failure(nom::error::Error::new(
                        input,
                        nom::error::ErrorKind::Char,
                    )));
                }
            },
            Some((_, c)) => result.push(c),
            None => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }
}

/// Parses a leading `--name=value` option, returning the remaining text.
pub(crate) fn leading_flag(input: &str) -> Option<(&str, &str, &str)> {
    let rest = input.trim_start().strip_prefix("--")?;
    let (name, after) = rest.split_once('=')?;
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    let end = after
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(after.len());
    let value = &after[..end];
    if value.is_empty() {
        return None;
    }
    Some((name, value, after[end..].trim_start()))
}

/// Splits argument text into whitespace-separated words, honoring single
/// and double quotes.
#[must_use]
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                in_word = true;
                let quote = c;
                for q in chars.by_ref() {
                    if q == quote {
                        break;
                    }
                    current.push(q);
                }
            }
            c if c.is_ascii_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\\' => {
                in_word = true;
                if let Some(&next) = chars.peek() {
                    current.push(next);
                    let _ = chars.next();
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}
