// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
// SPDX-FileContributor: Jordan Hall <j.hall@mwam.com> https://github.com/j-hall-mwam
use std::{convert::TryFrom, fmt, str::FromStr};

use bigdecimal::BigDecimal;
use im::{OrdMap, OrdSet, Vector};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ErrorInfo, SyntaxError},
    hash::{hash_object, HashId},
};

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Symbol {
    namespace: Option<String>,
    name: String,
}
impl Symbol {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(String::from),
            name: String::from(name),
        }
    }
    /// Split a qualified identifier such as `sys.net.http/get` on its first namespace separator.
    pub fn parse(text: &str) -> Self {
        match text.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Self::new(Some(namespace), name)
            }
            _ => Self::new(None, text),
        }
    }
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        format!("{}", value)
    }
}
impl TryFrom<String> for Symbol {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(String::from("Invalid symbol: empty identifier"))
        } else {
            Ok(Self::parse(&value))
        }
    }
}
impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Keyword {
    namespace: Option<String>,
    name: String,
}
impl Keyword {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(String::from),
            name: String::from(name),
        }
    }
    /// Parse a keyword identifier, with or without its leading colon.
    pub fn parse(text: &str) -> Self {
        let Symbol { namespace, name } = Symbol::parse(text.strip_prefix(':').unwrap_or(text));
        Self { namespace, name }
    }
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Qualified name without the leading colon
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}/{}", namespace, self.name),
            None => self.name.clone(),
        }
    }
}
impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.qualified_name())
    }
}
impl From<Keyword> for String {
    fn from(value: Keyword) -> Self {
        format!("{}", value)
    }
}
impl TryFrom<String> for Keyword {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.strip_prefix(':') {
            Some(name) if !name.is_empty() => Ok(Self::parse(name)),
            _ => Err(format!("Invalid keyword: {}", value)),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct ApplicationTerm {
    symbol: Symbol,
    args: Vector<Term>,
}
impl ApplicationTerm {
    pub fn new(symbol: Symbol, args: impl IntoIterator<Item = Term>) -> Self {
        Self {
            symbol,
            args: args.into_iter().collect(),
        }
    }
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
    pub fn args(&self) -> &Vector<Term> {
        &self.args
    }
    pub fn arg(&self, index: usize) -> Option<&Term> {
        self.args.get(index)
    }
    pub fn with_args(&self, args: impl IntoIterator<Item = Term>) -> Self {
        Self::new(self.symbol.clone(), args)
    }
}
impl fmt::Display for ApplicationTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.symbol)?;
        for arg in self.args.iter() {
            write!(f, " {}", arg)?;
        }
        write!(f, ")")
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Term {
    Nil,
    Boolean(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    Character(char),
    String(String),
    Keyword(Keyword),
    Symbol(Symbol),
    Error(ErrorInfo),
    List(Vector<Term>),
    Set(OrdSet<Term>),
    Map(#[serde(with = "map_entries")] OrdMap<Term, Term>),
    Application(ApplicationTerm),
}
impl Term {
    pub fn nil() -> Self {
        Self::Nil
    }
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::Integer(value.into())
    }
    pub fn decimal(value: impl Into<BigDecimal>) -> Self {
        Self::Decimal(value.into())
    }
    pub fn character(value: char) -> Self {
        Self::Character(value)
    }
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }
    pub fn keyword(value: &str) -> Self {
        Self::Keyword(Keyword::parse(value))
    }
    pub fn symbol(value: &str) -> Self {
        Self::Symbol(Symbol::parse(value))
    }
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error(ErrorInfo::new(code, message))
    }
    pub fn list(items: impl IntoIterator<Item = Term>) -> Self {
        Self::List(items.into_iter().collect())
    }
    pub fn set(items: impl IntoIterator<Item = Term>) -> Self {
        Self::Set(items.into_iter().collect())
    }
    /// Construct a map term, rejecting keys that are not constant.
    pub fn hashmap(entries: impl IntoIterator<Item = (Term, Term)>) -> Result<Self, SyntaxError> {
        entries
            .into_iter()
            .map(|(key, value)| {
                if key.is_constant() {
                    Ok((key, value))
                } else {
                    Err(SyntaxError::InvalidMapKey(key))
                }
            })
            .collect::<Result<OrdMap<_, _>, _>>()
            .map(Self::Map)
    }
    pub fn keyword_map<'a>(entries: impl IntoIterator<Item = (&'a str, Term)>) -> Self {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (Self::keyword(key), value))
                .collect(),
        )
    }
    pub fn application(symbol: Symbol, args: impl IntoIterator<Item = Term>) -> Self {
        Self::Application(ApplicationTerm::new(symbol, args))
    }

    /// Derived recursively: symbols and applications are never constant, and a collection is
    /// constant only when everything it contains is constant.
    pub fn is_constant(&self) -> bool {
        match self {
            Self::Symbol(_) | Self::Application(_) => false,
            Self::List(items) => items.iter().all(Self::is_constant),
            Self::Set(items) => items.iter().all(Self::is_constant),
            Self::Map(entries) => entries
                .iter()
                .all(|(key, value)| key.is_constant() && value.is_constant()),
            _ => true,
        }
    }
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map(_))
    }
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
    pub fn id(&self) -> HashId {
        hash_object(self)
    }

    /// Rebuild a collection term by transforming each of its children in order.
    ///
    /// Map keys are left untouched. Leaf terms are returned unchanged.
    pub fn map_children<E>(
        &self,
        mut transform: impl FnMut(&Term) -> Result<Term, E>,
    ) -> Result<Term, E> {
        match self {
            Self::List(items) => items
                .iter()
                .map(|item| transform(item))
                .collect::<Result<Vector<_>, _>>()
                .map(Self::List),
            Self::Set(items) => items
                .iter()
                .map(|item| transform(item))
                .collect::<Result<OrdSet<_>, _>>()
                .map(Self::Set),
            Self::Map(entries) => entries
                .iter()
                .map(|(key, value)| transform(value).map(|value| (key.clone(), value)))
                .collect::<Result<OrdMap<_, _>, _>>()
                .map(Self::Map),
            _ => Ok(self.clone()),
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }
    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Self::Integer(value) => Some(value),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&Vector<Term>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
    pub fn as_map(&self) -> Option<&OrdMap<Term, Term>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
    pub fn as_application(&self) -> Option<&ApplicationTerm> {
        match self {
            Self::Application(term) => Some(term),
            _ => None,
        }
    }
    pub fn as_error(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Text representation, readable back by the EDN reader.
    pub fn to_text(&self) -> String {
        format!("{}", self)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Boolean(value) => write!(f, "{}", value),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Decimal(value) => write!(f, "{}M", value),
            Self::Character(value) => match value {
                '\n' => write!(f, "\\newline"),
                ' ' => write!(f, "\\space"),
                '\t' => write!(f, "\\tab"),
                '\r' => write!(f, "\\return"),
                _ => write!(f, "\\{}", value),
            },
            Self::String(value) => write!(f, "\"{}\"", escape_string(value)),
            Self::Keyword(value) => write!(f, "{}", value),
            Self::Symbol(value) => write!(f, "{}", value),
            Self::Error(error) => write!(
                f,
                "#error {{:code \"{}\" :message \"{}\"}}",
                escape_string(error.code()),
                escape_string(error.message())
            ),
            Self::List(items) => {
                write!(f, "[")?;
                write_separated(f, items.iter(), " ")?;
                write!(f, "]")
            }
            Self::Set(items) => {
                write!(f, "#{{")?;
                write_separated(f, items.iter(), " ")?;
                write!(f, "}}")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", key, value)?;
                }
                write!(f, "}}")
            }
            Self::Application(term) => write!(f, "{}", term),
        }
    }
}

fn write_separated<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a Term>,
    separator: &str,
) -> fmt::Result {
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn escape_string(value: &str) -> String {
    value
        .chars()
        .fold(String::with_capacity(value.len()), |mut result, char| {
            match char {
                '\\' => result.push_str("\\\\"),
                '"' => result.push_str("\\\""),
                '\n' => result.push_str("\\n"),
                '\t' => result.push_str("\\t"),
                '\r' => result.push_str("\\r"),
                _ => result.push(char),
            }
            result
        })
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}
impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Self::Integer(value.into())
    }
}
impl From<u64> for Term {
    fn from(value: u64) -> Self {
        Self::Integer(value.into())
    }
}
impl From<usize> for Term {
    fn from(value: usize) -> Self {
        Self::Integer(value.into())
    }
}
impl From<BigInt> for Term {
    fn from(value: BigInt) -> Self {
        Self::Integer(value)
    }
}
impl From<BigDecimal> for Term {
    fn from(value: BigDecimal) -> Self {
        Self::Decimal(value)
    }
}
impl TryFrom<f64> for Term {
    type Error = String;
    fn try_from(value: f64) -> Result<Self, String> {
        BigDecimal::from_str(&format!("{}", value))
            .map(Self::Decimal)
            .map_err(|_| format!("Invalid decimal value: {}", value))
    }
}
impl From<char> for Term {
    fn from(value: char) -> Self {
        Self::Character(value)
    }
}
impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Self::String(String::from(value))
    }
}
impl From<String> for Term {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
impl From<Symbol> for Term {
    fn from(value: Symbol) -> Self {
        Self::Symbol(value)
    }
}
impl From<Keyword> for Term {
    fn from(value: Keyword) -> Self {
        Self::Keyword(value)
    }
}
impl From<ErrorInfo> for Term {
    fn from(value: ErrorInfo) -> Self {
        Self::Error(value)
    }
}
impl From<ApplicationTerm> for Term {
    fn from(value: ApplicationTerm) -> Self {
        Self::Application(value)
    }
}
impl<T: Into<Term>> From<Option<T>> for Term {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Nil)
    }
}

// JSON object keys must be strings, so map entries are serialized as a sequence of pairs
mod map_entries {
    use im::OrdMap;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Term;

    pub fn serialize<S: Serializer>(
        value: &OrdMap<Term, Term>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(value.iter().map(|(key, value)| (key, value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OrdMap<Term, Term>, D::Error> {
        let entries = Vec::<(Term, Term)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_symbols() {
        let symbol = Symbol::parse("sys.net.http/get");
        assert_eq!(symbol.namespace(), Some("sys.net.http"));
        assert_eq!(symbol.name(), "get");
        assert_eq!(format!("{}", symbol), "sys.net.http/get");
        assert_eq!(Symbol::parse("%0"), Symbol::new(None, "%0"));
        assert_eq!(Symbol::parse("/"), Symbol::new(None, "/"));
        assert_eq!(Keyword::parse(":local/a").qualified_name(), "local/a");
        assert_eq!(format!("{}", Keyword::parse("url")), ":url");
    }

    #[test]
    fn constant_terms() {
        assert!(Term::nil().is_constant());
        assert!(Term::integer(3).is_constant());
        assert!(Term::error("Foo", "bar").is_constant());
        assert!(!Term::symbol("a").is_constant());
        assert!(!Term::application(Symbol::parse("sys/list"), []).is_constant());
        assert!(Term::list([Term::integer(1), Term::string("a")]).is_constant());
        assert!(!Term::list([Term::integer(1), Term::symbol("a")]).is_constant());
        assert!(!Term::keyword_map([("a", Term::symbol("b"))]).is_constant());
        assert!(Term::set([Term::keyword("a")]).is_constant());
    }

    #[test]
    fn non_constant_map_keys() {
        assert_eq!(
            Term::hashmap([(Term::symbol("a"), Term::integer(1))]),
            Err(SyntaxError::InvalidMapKey(Term::symbol("a")))
        );
        assert!(Term::hashmap([(Term::keyword("a"), Term::symbol("b"))]).is_ok());
    }

    #[test]
    fn map_children() {
        let term = Term::list([Term::integer(1), Term::symbol("a")]);
        let result = term.map_children(|child| {
            Ok::<_, ()>(match child {
                Term::Symbol(_) => Term::integer(2),
                _ => child.clone(),
            })
        });
        assert_eq!(result, Ok(Term::list([Term::integer(1), Term::integer(2)])));
        let term = Term::keyword_map([("a", Term::symbol("x"))]);
        let result = term.map_children(|_| Ok::<_, ()>(Term::nil()));
        assert_eq!(result, Ok(Term::keyword_map([("a", Term::nil())])));
        assert_eq!(
            Term::string("foo").map_children(|_| Err("unreachable")),
            Ok(Term::string("foo"))
        );
    }

    #[test]
    fn text_representation() {
        assert_eq!(Term::nil().to_text(), "nil");
        assert_eq!(Term::integer(-3).to_text(), "-3");
        assert_eq!(
            Term::decimal(BigDecimal::from_str("1.5").unwrap()).to_text(),
            "1.5M"
        );
        assert_eq!(Term::character('a').to_text(), "\\a");
        assert_eq!(Term::character('\n').to_text(), "\\newline");
        assert_eq!(Term::string("a \"b\"").to_text(), "\"a \\\"b\\\"\"");
        assert_eq!(Term::keyword("local/a").to_text(), ":local/a");
        assert_eq!(
            Term::list([Term::integer(1), Term::integer(2)]).to_text(),
            "[1 2]"
        );
        assert_eq!(Term::set([Term::integer(1)]).to_text(), "#{1}");
        assert_eq!(
            Term::keyword_map([("a", Term::integer(1)), ("b", Term::integer(2))]).to_text(),
            "{:a 1, :b 2}"
        );
        assert_eq!(
            Term::application(
                Symbol::parse("sys/list"),
                [Term::integer(1), Term::symbol("x")]
            )
            .to_text(),
            "(sys/list 1 x)"
        );
        assert_eq!(
            Term::error("UnknownSymbol", "x").to_text(),
            "#error {:code \"UnknownSymbol\" :message \"x\"}"
        );
    }

    #[test]
    fn structural_identity() {
        let left = Term::list([Term::integer(1), Term::keyword("a")]);
        let right = Term::list([Term::integer(1), Term::keyword("a")]);
        assert_eq!(left, right);
        assert_eq!(left.id(), right.id());
        assert_ne!(left.id(), Term::list([Term::integer(1)]).id());
    }

    #[test]
    fn native_values() {
        assert_eq!(Term::from(3), Term::integer(3));
        assert_eq!(Term::from("foo"), Term::string("foo"));
        assert_eq!(Term::from(None::<bool>), Term::nil());
        assert_eq!(
            Term::try_from(0.5),
            Ok(Term::decimal(BigDecimal::from_str("0.5").unwrap()))
        );
        assert_eq!(
            Term::try_from(f64::NAN),
            Err(String::from("Invalid decimal value: NaN"))
        );
    }

    #[test]
    fn serialized_map_entries() {
        let term = Term::keyword_map([("a", Term::integer(1))]);
        let json = serde_json::to_string(&term).unwrap();
        let parsed: Term = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, term);
    }
}
