// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::{fmt, iter::FromIterator};

use im::OrdMap;
use serde::{Deserialize, Serialize};

use crate::term::{Symbol, Term};

/// Immutable symbol environment for a single evaluation.
///
/// Bound values are not required to be constant: a symbol bound to an application term acts as a
/// macro when applied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindings(OrdMap<Symbol, Term>);
impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, symbol: &Symbol) -> Option<&Term> {
        self.0.get(symbol)
    }
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.0.contains_key(symbol)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Term)> {
        self.0.iter()
    }
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.0.keys()
    }
    pub fn with(&self, symbol: Symbol, value: Term) -> Self {
        Self(self.0.update(symbol, value))
    }
    pub fn extend(&self, entries: impl IntoIterator<Item = (Symbol, Term)>) -> Self {
        entries
            .into_iter()
            .fold(self.clone(), |result, (symbol, value)| {
                result.with(symbol, value)
            })
    }
    /// Combine two environments; entries already present in `self` take precedence.
    pub fn union(&self, other: &Bindings) -> Self {
        if other.is_empty() {
            self.clone()
        } else if self.is_empty() {
            other.clone()
        } else {
            Self(self.0.clone().union(other.0.clone()))
        }
    }
    pub fn without<'a>(&self, symbols: impl IntoIterator<Item = &'a Symbol>) -> Self {
        symbols.into_iter().fold(self.clone(), |result, symbol| {
            Self(result.0.without(symbol))
        })
    }
    /// Whether every entry of this subset is present with an equal value in `bindings`.
    pub fn is_satisfied_by(&self, bindings: &Bindings) -> bool {
        self.len() <= bindings.len()
            && self
                .0
                .iter()
                .all(|(symbol, value)| bindings.get(symbol) == Some(value))
    }
}
impl FromIterator<(Symbol, Term)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (Symbol, Term)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
impl<'a> FromIterator<(&'a str, Term)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (&'a str, Term)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(symbol, value)| (Symbol::parse(symbol), value))
            .collect()
    }
}
impl<'a> IntoIterator for &'a Bindings {
    type Item = (&'a Symbol, &'a Term);
    type IntoIter = im::ordmap::Iter<'a, Symbol, Term>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (symbol, value)) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", symbol, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfied_subsets() {
        let bindings = Bindings::from_iter([("a", Term::integer(1)), ("b", Term::integer(2))]);
        assert!(Bindings::new().is_satisfied_by(&bindings));
        assert!(Bindings::from_iter([("a", Term::integer(1))]).is_satisfied_by(&bindings));
        assert!(!Bindings::from_iter([("a", Term::integer(2))]).is_satisfied_by(&bindings));
        assert!(!Bindings::from_iter([("c", Term::integer(1))]).is_satisfied_by(&bindings));
        assert!(!bindings.is_satisfied_by(&Bindings::from_iter([("a", Term::integer(1))])));
    }

    #[test]
    fn persistent_updates() {
        let bindings = Bindings::from_iter([("a", Term::integer(1))]);
        let extended = bindings.extend([(Symbol::parse("b"), Term::integer(2))]);
        assert_eq!(bindings.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(
            extended.without([&Symbol::parse("b")]),
            Bindings::from_iter([("a", Term::integer(1))])
        );
        assert_eq!(
            bindings.union(&Bindings::from_iter([("a", Term::integer(2))])),
            bindings
        );
    }

    #[test]
    fn symbol_keyed_json() {
        let bindings = Bindings::from_iter([("local/a", Term::integer(1))]);
        let json = serde_json::to_value(&bindings).unwrap();
        assert!(json.get("local/a").is_some());
    }
}
