// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
// SPDX-FileContributor: Chris Campbell <c.campbell@mwam.com> https://github.com/c-campbell-mwam
use std::str::FromStr;

use webscript::{BigDecimal, BigInt, Bindings, ErrorInfo, Keyword, Symbol, Term};

mod lexer;
use lexer::{parse_syntax, SyntaxDatum};

pub use lexer::{ParserError, ParserResult};

const ERROR_TAG: &'static str = "error";

/// Parse a single term from its text representation.
pub fn parse(input: &str) -> ParserResult<Term> {
    parse_syntax(input).and_then(|syntax| parse_term(&syntax))
}

/// Parse a symbol environment written as a map from symbols to terms, e.g. `{a 1, double (f %0)}`
pub fn parse_bindings(input: &str) -> ParserResult<Bindings> {
    match parse_syntax(input)? {
        SyntaxDatum::Map(entries) => entries
            .iter()
            .map(|(key, value)| match key {
                SyntaxDatum::Symbol(name) if !is_reserved_word(name) => {
                    parse_term(value).map(|value| (Symbol::parse(name), value))
                }
                _ => Err(format!("Expected binding symbol, received {}", key)),
            })
            .collect(),
        syntax => Err(format!("Expected bindings map, received {}", syntax)),
    }
}

fn is_reserved_word(name: &str) -> bool {
    matches!(name, "nil" | "true" | "false")
}

fn parse_term(syntax: &SyntaxDatum) -> ParserResult<Term> {
    match syntax {
        SyntaxDatum::IntegerLiteral(value) => BigInt::from_str(value.trim_start_matches('+'))
            .map(Term::Integer)
            .map_err(|err| format!("Invalid integer literal {}: {}", value, err)),
        SyntaxDatum::DecimalLiteral(value) => BigDecimal::from_str(value.trim_start_matches('+'))
            .map(Term::Decimal)
            .map_err(|err| format!("Invalid decimal literal {}: {}", value, err)),
        SyntaxDatum::CharacterLiteral(value) => Ok(Term::Character(*value)),
        SyntaxDatum::StringLiteral(value) => Ok(Term::String(value.clone())),
        SyntaxDatum::Keyword(name) => Ok(Term::Keyword(Keyword::parse(name))),
        SyntaxDatum::Symbol(name) => Ok(match *name {
            "nil" => Term::Nil,
            "true" => Term::Boolean(true),
            "false" => Term::Boolean(false),
            _ => Term::Symbol(Symbol::parse(name)),
        }),
        SyntaxDatum::List(items) => parse_application(syntax, items),
        SyntaxDatum::Vector(items) => items
            .iter()
            .map(parse_term)
            .collect::<ParserResult<Vec<_>>>()
            .map(Term::list),
        SyntaxDatum::Set(items) => items
            .iter()
            .map(parse_term)
            .collect::<ParserResult<Vec<_>>>()
            .map(Term::set),
        SyntaxDatum::Map(entries) => entries
            .iter()
            .map(|(key, value)| Ok((parse_term(key)?, parse_term(value)?)))
            .collect::<ParserResult<Vec<_>>>()
            .and_then(|entries| Term::hashmap(entries).map_err(|err| format!("{}", err))),
        SyntaxDatum::Tagged(tag, value) => match *tag {
            ERROR_TAG => parse_error(value),
            _ => Err(format!("Unknown tag: #{}", tag)),
        },
    }
}

fn parse_application(syntax: &SyntaxDatum, items: &[SyntaxDatum]) -> ParserResult<Term> {
    let (target, args) = match items.split_first() {
        Some(result) => result,
        None => return Err(format!("Expected function symbol, received {}", syntax)),
    };
    let symbol = match parse_term(target)? {
        Term::Symbol(symbol) => Ok(symbol),
        target => Err(format!("Expected function symbol, received {}", target)),
    }?;
    let args = args
        .iter()
        .map(parse_term)
        .collect::<ParserResult<Vec<_>>>()?;
    Ok(Term::application(symbol, args))
}

fn parse_error(value: &SyntaxDatum) -> ParserResult<Term> {
    let fields = match parse_term(value)? {
        Term::Map(fields) => fields,
        value => return Err(format!("Expected error fields, received {}", value)),
    };
    let field = |name: &str| -> ParserResult<String> {
        match fields.get(&Term::keyword(name)) {
            Some(Term::String(value)) => Ok(value.clone()),
            Some(value) => Err(format!(
                "Expected String for error field :{}, received {}",
                name, value
            )),
            None => Err(format!("Missing error field :{}", name)),
        }
    };
    Ok(Term::Error(ErrorInfo::new(field("code")?, field("message")?)))
}
