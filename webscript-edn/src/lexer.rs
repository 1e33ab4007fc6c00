// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::{borrow::Cow, fmt};

pub type ParserError = String;
pub type ParserResult<T> = Result<T, ParserError>;

struct ParserOutput<'a, T> {
    parsed: T,
    remaining: &'a str,
}
impl<'a, T> ParserOutput<'a, T> {
    fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ParserOutput<'a, U> {
        ParserOutput {
            parsed: f(self.parsed),
            remaining: self.remaining,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum SyntaxDatum<'a> {
    IntegerLiteral(&'a str),
    DecimalLiteral(&'a str),
    CharacterLiteral(char),
    StringLiteral(String),
    Keyword(&'a str),
    Symbol(&'a str),
    Tagged(&'a str, Box<SyntaxDatum<'a>>),
    List(Vec<SyntaxDatum<'a>>),
    Vector(Vec<SyntaxDatum<'a>>),
    Set(Vec<SyntaxDatum<'a>>),
    Map(Vec<(SyntaxDatum<'a>, SyntaxDatum<'a>)>),
}
impl<'a> fmt::Display for SyntaxDatum<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self, f)
    }
}

const EOF: &'static str = "end of input";

pub fn parse_syntax<'a>(input: &'a str) -> ParserResult<SyntaxDatum<'a>> {
    let input = consume_whitespace(input);
    let ParserOutput {
        parsed,
        remaining: input,
    } = match consume_syntax(input)? {
        Some(result) => Ok(result),
        None => Err(format!("Expected expression, received '{}'", describe_next(input))),
    }?;
    let input = consume_whitespace(input);
    if input.len() > 0 {
        return Err(format!(
            "Expected {}, received '{}'",
            EOF,
            describe_next(input)
        ));
    }
    return Ok(parsed);
}

fn describe_next(input: &str) -> String {
    peek_next_char(input)
        .map(String::from)
        .unwrap_or(String::from(EOF))
}

fn consume_syntax<'a>(input: &'a str) -> ParserResult<Option<ParserOutput<SyntaxDatum<'a>>>> {
    match consume_primitive(input)? {
        Some(result) => Ok(Some(result)),
        _ => match consume_keyword(input) {
            Some(result) => Ok(Some(result)),
            _ => match consume_symbol(input) {
                Some(result) => Ok(Some(result)),
                _ => match consume_dispatch(input)? {
                    Some(result) => Ok(Some(result)),
                    _ => match consume_collection(input)? {
                        Some(result) => Ok(Some(result)),
                        _ => Ok(None),
                    },
                },
            },
        },
    }
}

/// Commas and line comments are treated as whitespace
fn consume_whitespace(input: &str) -> &str {
    let input = input.trim_start_matches(|char: char| char.is_whitespace() || char == ',');
    match consume_char(';', input) {
        Some(comment) => consume_whitespace(
            comment
                .find('\n')
                .map(|index| &comment[index..])
                .unwrap_or(""),
        ),
        None => input,
    }
}

fn consume_char(char: char, input: &str) -> Option<&str> {
    input
        .chars()
        .next()
        .filter(|value| *value == char)
        .map(|value| &input[value.len_utf8()..])
}

fn consume_while(predicate: impl Fn(char) -> bool, input: &str) -> Option<ParserOutput<&str>> {
    let length = input
        .char_indices()
        .find_map(
            |(index, char)| {
                if predicate(char) {
                    None
                } else {
                    Some(index)
                }
            },
        )
        .unwrap_or_else(|| input.len());
    if length > 0 {
        Some(ParserOutput {
            parsed: &input[0..length],
            remaining: &input[length..],
        })
    } else {
        None
    }
}

fn peek_next_char(input: &str) -> Option<char> {
    input.chars().next()
}

fn consume_identifier(input: &str) -> Option<ParserOutput<&str>> {
    let first_char = peek_next_char(input)?;
    if !is_valid_symbol_start_char(first_char) {
        return None;
    }
    if is_sign_char(first_char) && input[1..].starts_with(|char: char| char.is_ascii_digit()) {
        return None;
    }
    consume_while(is_valid_symbol_char, input)
}

fn consume_symbol(input: &str) -> Option<ParserOutput<SyntaxDatum>> {
    consume_identifier(input).map(|result| result.map(SyntaxDatum::Symbol))
}

fn consume_keyword(input: &str) -> Option<ParserOutput<SyntaxDatum>> {
    let input = consume_char(':', input)?;
    consume_while(is_valid_symbol_char, input).map(|result| result.map(SyntaxDatum::Keyword))
}

fn is_valid_symbol_start_char(char: char) -> bool {
    if char.is_alphabetic() {
        return true;
    }
    match char {
        '.' | '*' | '+' | '!' | '-' | '_' | '?' | '$' | '%' | '&' | '=' | '<' | '>' | '/' => true,
        _ => false,
    }
}

fn is_valid_symbol_char(char: char) -> bool {
    is_valid_symbol_start_char(char) || char.is_ascii_digit() || char == ':' || char == '#'
}

fn is_sign_char(char: char) -> bool {
    char == '-' || char == '+'
}

fn consume_primitive(input: &str) -> ParserResult<Option<ParserOutput<SyntaxDatum>>> {
    match consume_number_literal(input).or_else(|| consume_character_literal(input)) {
        Some(result) => Ok(Some(result)),
        None => consume_string_literal(input),
    }
}

fn consume_number_literal(input: &str) -> Option<ParserOutput<SyntaxDatum>> {
    let source = input;
    let input = consume_char('-', input)
        .or_else(|| consume_char('+', input))
        .unwrap_or(input);
    let ParserOutput {
        remaining: input, ..
    } = consume_while(is_digit_char, input)?;
    let (is_fraction, input) = match consume_char('.', input) {
        Some(remaining) => (
            true,
            consume_while(is_digit_char, remaining)
                .map(|result| result.remaining)
                .unwrap_or(remaining),
        ),
        None => (false, input),
    };
    let (is_exponent, input) = match consume_char('e', input).or_else(|| consume_char('E', input))
    {
        Some(remaining) => {
            let remaining = consume_char('-', remaining)
                .or_else(|| consume_char('+', remaining))
                .unwrap_or(remaining);
            (true, consume_while(is_digit_char, remaining)?.remaining)
        }
        None => (false, input),
    };
    let literal = &source[0..(source.len() - input.len())];
    if let Some(remaining) = consume_char('M', input) {
        Some(ParserOutput {
            parsed: SyntaxDatum::DecimalLiteral(literal),
            remaining,
        })
    } else if is_fraction || is_exponent {
        Some(ParserOutput {
            parsed: SyntaxDatum::DecimalLiteral(literal),
            remaining: input,
        })
    } else {
        Some(ParserOutput {
            parsed: SyntaxDatum::IntegerLiteral(literal),
            remaining: consume_char('N', input).unwrap_or(input),
        })
    }
}

fn is_digit_char(char: char) -> bool {
    char.is_ascii_digit()
}

fn consume_character_literal(input: &str) -> Option<ParserOutput<SyntaxDatum>> {
    let input = consume_char('\\', input)?;
    let named = consume_while(char::is_alphabetic, input).and_then(|result| {
        let value = match result.parsed {
            "newline" => Some('\n'),
            "space" => Some(' '),
            "tab" => Some('\t'),
            "return" => Some('\r'),
            _ => None,
        }?;
        Some(ParserOutput {
            parsed: SyntaxDatum::CharacterLiteral(value),
            remaining: result.remaining,
        })
    });
    named.or_else(|| {
        let value = peek_next_char(input)?;
        Some(ParserOutput {
            parsed: SyntaxDatum::CharacterLiteral(value),
            remaining: &input[value.len_utf8()..],
        })
    })
}

fn consume_string_literal(input: &str) -> ParserResult<Option<ParserOutput<SyntaxDatum>>> {
    let input = match consume_char('"', input) {
        Some(input) => input,
        None => return Ok(None),
    };
    let ParserOutput {
        parsed,
        remaining: input,
    } = consume_string_contents(input);
    match consume_char('"', input) {
        None => Err(format!("Expected '\"', received '{}'", describe_next(input))),
        Some(input) => Ok(Some(ParserOutput {
            parsed: SyntaxDatum::StringLiteral(match parsed {
                Cow::Borrowed(value) => String::from(value),
                Cow::Owned(value) => value,
            }),
            remaining: input,
        })),
    }
}

fn consume_string_contents(input: &str) -> ParserOutput<Cow<str>> {
    let result = consume_while(is_string_char, input).map_or_else(
        || ParserOutput {
            parsed: Cow::Borrowed(""),
            remaining: input,
        },
        |result| result.map(Cow::Borrowed),
    );
    let mut lookahead_iter = result.remaining.chars();
    match lookahead_iter.next() {
        Some('\\') => {
            let escaped_char = lookahead_iter.next();
            match escaped_char {
                Some(char) => {
                    let next = consume_string_contents(&result.remaining[1 + char.len_utf8()..]);
                    ParserOutput {
                        parsed: Cow::Owned(format!(
                            "{}{}{}",
                            result.parsed,
                            parse_escape_code(char)
                                .map(String::from)
                                .unwrap_or(char.to_string()),
                            next.parsed
                        )),
                        remaining: next.remaining,
                    }
                }
                None => result,
            }
        }
        _ => result,
    }
}

fn parse_escape_code(char: char) -> Option<&'static str> {
    match char {
        '\\' => Some("\\"),
        '"' => Some("\""),
        'n' => Some("\n"),
        't' => Some("\t"),
        'r' => Some("\r"),
        _ => None,
    }
}

fn is_string_char(char: char) -> bool {
    match char {
        '"' | '\\' => false,
        _ => true,
    }
}

fn consume_dispatch<'a>(input: &'a str) -> ParserResult<Option<ParserOutput<SyntaxDatum<'a>>>> {
    let input = match consume_char('#', input) {
        Some(input) => input,
        None => return Ok(None),
    };
    if let Some(input) = consume_char('{', input) {
        return consume_delimited('}', input).map(|result| Some(result.map(SyntaxDatum::Set)));
    }
    let ParserOutput {
        parsed: tag,
        remaining: input,
    } = match consume_identifier(input) {
        Some(result) => result,
        None => {
            return Err(format!(
                "Expected tag or '{{', received '{}'",
                describe_next(input)
            ))
        }
    };
    let input = consume_whitespace(input);
    match consume_syntax(input)? {
        Some(result) => Ok(Some(
            result.map(|value| SyntaxDatum::Tagged(tag, Box::new(value))),
        )),
        None => Err(format!(
            "Expected tagged expression, received '{}'",
            describe_next(input)
        )),
    }
}

fn consume_collection<'a>(input: &'a str) -> ParserResult<Option<ParserOutput<SyntaxDatum<'a>>>> {
    if let Some(input) = consume_char('(', input) {
        consume_delimited(')', input).map(|result| Some(result.map(SyntaxDatum::List)))
    } else if let Some(input) = consume_char('[', input) {
        consume_delimited(']', input).map(|result| Some(result.map(SyntaxDatum::Vector)))
    } else if let Some(input) = consume_char('{', input) {
        let ParserOutput {
            parsed: items,
            remaining,
        } = consume_delimited('}', input)?;
        if items.len() % 2 != 0 {
            return Err(format!(
                "Expected an even number of map entries, received {}",
                items.len()
            ));
        }
        let mut items = items.into_iter();
        let mut entries = Vec::new();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            entries.push((key, value));
        }
        Ok(Some(ParserOutput {
            parsed: SyntaxDatum::Map(entries),
            remaining,
        }))
    } else {
        Ok(None)
    }
}

fn consume_delimited<'a>(
    terminator: char,
    input: &'a str,
) -> ParserResult<ParserOutput<'a, Vec<SyntaxDatum<'a>>>> {
    let input = consume_whitespace(input);
    let ParserOutput {
        parsed: items,
        remaining: input,
    } = consume_list_items(input, Vec::new())?;
    let input = consume_whitespace(input);
    match consume_char(terminator, input) {
        None => Err(format!(
            "Expected '{}', received '{}'",
            terminator,
            describe_next(input)
        )),
        Some(input) => Ok(ParserOutput {
            parsed: items,
            remaining: input,
        }),
    }
}

fn consume_list_items<'a>(
    input: &'a str,
    mut results: Vec<SyntaxDatum<'a>>,
) -> ParserResult<ParserOutput<'a, Vec<SyntaxDatum<'a>>>> {
    match consume_syntax(input)? {
        None => Ok(ParserOutput {
            parsed: results,
            remaining: input,
        }),
        Some(ParserOutput {
            parsed: expression,
            remaining: input,
        }) => {
            results.push(expression);
            let input = consume_whitespace(input);
            consume_list_items(input, results)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_syntax, SyntaxDatum};

    #[test]
    fn primitives() {
        assert_eq!(parse_syntax("3"), Ok(SyntaxDatum::IntegerLiteral("3")));
        assert_eq!(parse_syntax("-3"), Ok(SyntaxDatum::IntegerLiteral("-3")));
        assert_eq!(parse_syntax("3N"), Ok(SyntaxDatum::IntegerLiteral("3")));
        assert_eq!(parse_syntax("1.5"), Ok(SyntaxDatum::DecimalLiteral("1.5")));
        assert_eq!(parse_syntax("2M"), Ok(SyntaxDatum::DecimalLiteral("2")));
        assert_eq!(
            parse_syntax("1e-3"),
            Ok(SyntaxDatum::DecimalLiteral("1e-3"))
        );
        assert_eq!(
            parse_syntax("\"foo\\\"bar\\n\""),
            Ok(SyntaxDatum::StringLiteral(String::from("foo\"bar\n")))
        );
        assert_eq!(parse_syntax("\\a"), Ok(SyntaxDatum::CharacterLiteral('a')));
        assert_eq!(
            parse_syntax("\\newline"),
            Ok(SyntaxDatum::CharacterLiteral('\n'))
        );
    }

    #[test]
    fn identifiers() {
        assert_eq!(
            parse_syntax("sys.net.http/get"),
            Ok(SyntaxDatum::Symbol("sys.net.http/get"))
        );
        assert_eq!(parse_syntax("%0"), Ok(SyntaxDatum::Symbol("%0")));
        assert_eq!(parse_syntax("-"), Ok(SyntaxDatum::Symbol("-")));
        assert_eq!(
            parse_syntax(":local/a"),
            Ok(SyntaxDatum::Keyword("local/a"))
        );
    }

    #[test]
    fn collections() {
        assert_eq!(
            parse_syntax("(sys/list 1, [2] #{3} {:a 4}) ; trailing comment"),
            Ok(SyntaxDatum::List(vec![
                SyntaxDatum::Symbol("sys/list"),
                SyntaxDatum::IntegerLiteral("1"),
                SyntaxDatum::Vector(vec![SyntaxDatum::IntegerLiteral("2")]),
                SyntaxDatum::Set(vec![SyntaxDatum::IntegerLiteral("3")]),
                SyntaxDatum::Map(vec![(
                    SyntaxDatum::Keyword("a"),
                    SyntaxDatum::IntegerLiteral("4")
                )]),
            ]))
        );
        assert_eq!(
            parse_syntax("#error {}"),
            Ok(SyntaxDatum::Tagged("error", Box::new(SyntaxDatum::Map(vec![]))))
        );
    }

    #[test]
    fn invalid_syntax() {
        assert_eq!(
            parse_syntax("(foo"),
            Err(String::from("Expected ')', received 'end of input'"))
        );
        assert_eq!(
            parse_syntax("{:a}"),
            Err(String::from("Expected an even number of map entries, received 1"))
        );
        assert_eq!(
            parse_syntax("1 2"),
            Err(String::from("Expected end of input, received '2'"))
        );
        assert_eq!(
            parse_syntax("\"foo"),
            Err(String::from("Expected '\"', received 'end of input'"))
        );
        assert_eq!(
            parse_syntax(")"),
            Err(String::from("Expected expression, received ')'"))
        );
    }
}
