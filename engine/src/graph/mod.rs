//! Triple model and in-memory fact graph.
//!
//! A [`Graph`] is an ordered set of [`Triple`]s with a predicate index.
//! Ordering makes iteration, query rows and every rendered artifact
//! deterministic; `Clone` is a full deep copy with no shared structure.

pub mod store;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::vocab;

/// A literal value with its datatype and optional language tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    /// Lexical form.
    pub lexical: String,
    /// Datatype IRI (`rdf:langString` for tagged strings).
    pub datatype: String,
    /// Language tag, lower-cased.
    pub language: Option<String>,
}

/// An RDF term: named node, blank node or literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// A named node.
    Iri(String),
    /// A blank node, labelled uniquely within one graph.
    Blank(String),
    /// A literal.
    Literal(Literal),
}

impl Term {
    /// Creates a named node.
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Creates a blank node.
    pub fn blank(label: impl Into<String>) -> Self {
        Term::Blank(label.into())
    }

    /// Creates an `xsd:string` literal.
    pub fn string(value: impl Into<String>) -> Self {
        Term::typed(value, vocab::XSD_STRING)
    }

    /// Creates a literal with an explicit datatype.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal {
            lexical: value.into(),
            datatype: datatype.into(),
            language: None,
        })
    }

    /// Creates an `xsd:integer` literal.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Term::typed(value.to_string(), vocab::XSD_INTEGER)
    }

    /// Returns the IRI if this is a named node.
    #[must_use]
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Returns the literal if this is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// True for named nodes.
    #[must_use]
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    /// True for blank nodes.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    /// True for literals.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// True if this is the named node `iri`.
    #[must_use]
    pub fn is(&self, iri: &str) -> bool {
        self.as_iri() == Some(iri)
    }

    /// Short display name: IRI local part, blank label or lexical form.
    #[must_use]
    pub fn short_name(&self) -> String {
        match self {
            Term::Iri(iri) => vocab::short_name(iri).to_owned(),
            Term::Blank(label) => format!("_:{label}"),
            Term::Literal(lit) => lit.lexical.clone(),
        }
    }
}

/// N-Triples rendering.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(label) => write!(f, "_:{label}"),
            Term::Literal(lit) => {
                write!(f, "\"{}\"", escape_literal(&lit.lexical))?;
                match &lit.language {
                    Some(lang) => write!(f, "@{lang}"),
                    None if lit.datatype == vocab::XSD_STRING => Ok(()),
                    None => write!(f, "^^<{}>", lit.datatype),
                }
            }
        }
    }
}

/// Escapes a lexical form for a double-quoted N-Triples/Turtle string.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// An immutable (subject, predicate, object) statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    /// Subject.
    pub subject: Term,
    /// Predicate.
    pub predicate: Term,
    /// Object.
    pub object: Term,
}

impl Triple {
    /// Creates a triple.
    #[must_use]
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// `subject predicate object` with short names, for reports.
    #[must_use]
    pub fn short_form(&self) -> String {
        let predicate = match &self.predicate {
            Term::Iri(iri) => vocab::relation_label(iri).to_owned(),
            other => other.short_name(),
        };
        format!(
            "{} --{}--> {}",
            self.subject.short_name(),
            predicate,
            self.object.short_name()
        )
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A set of triples, no duplicates, deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
    by_predicate: BTreeMap<Term, BTreeSet<Triple>>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// True when the graph holds no triples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Adds a triple. Returns false if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.triples.contains(&triple) {
            return false;
        }
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .insert(triple.clone());
        self.triples.insert(triple)
    }

    /// Removes a triple. Returns false if it was absent.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        if !self.triples.remove(triple) {
            return false;
        }
        if let Some(set) = self.by_predicate.get_mut(&triple.predicate) {
            set.remove(triple);
            if set.is_empty() {
                self.by_predicate.remove(&triple.predicate);
            }
        }
        true
    }

    /// True if the triple is present.
    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Iterates all triples in order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Iterates the triples matching a pattern; `None` is a wildcard.
    pub fn matching<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Term>,
        object: Option<&'a Term>,
    ) -> Box<dyn Iterator<Item = &'a Triple> + 'a> {
        let candidates: Box<dyn Iterator<Item = &'a Triple> + 'a> = match predicate {
            Some(p) => match self.by_predicate.get(p) {
                Some(set) => Box::new(set.iter()),
                None => Box::new(std::iter::empty()),
            },
            None => Box::new(self.triples.iter()),
        };
        Box::new(candidates.filter(move |t| {
            subject.map_or(true, |s| &t.subject == s) && object.map_or(true, |o| &t.object == o)
        }))
    }

    /// Objects of `subject predicate ?o`.
    pub fn objects<'a>(
        &'a self,
        subject: &'a Term,
        predicate: &'a Term,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.matching(Some(subject), Some(predicate), None)
            .map(|t| &t.object)
    }

    /// Subjects of `?s predicate object`.
    pub fn subjects<'a>(
        &'a self,
        predicate: &'a Term,
        object: &'a Term,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.matching(None, Some(predicate), Some(object))
            .map(|t| &t.subject)
    }

    /// First object of `subject predicate ?o`, if any.
    #[must_use]
    pub fn object<'a>(&'a self, subject: &'a Term, predicate: &'a Term) -> Option<&'a Term> {
        self.objects(subject, predicate).next()
    }

    /// True if `node rdf:type class` is present.
    #[must_use]
    pub fn has_type(&self, node: &Term, class: &Term) -> bool {
        self.contains(&Triple::new(
            node.clone(),
            Term::iri(vocab::RDF_TYPE),
            class.clone(),
        ))
    }

    /// True if every triple of `self` is also in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Graph) -> bool {
        self.len() <= other.len() && self.triples.iter().all(|t| other.contains(t))
    }

    /// Triples in `self` that are not in `other`.
    pub fn difference<'a>(&'a self, other: &'a Graph) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.difference(&other.triples)
    }

    /// Reads an RDF collection starting at `head`. Returns `None` for
    /// malformed or cyclic lists.
    #[must_use]
    pub fn list_items(&self, head: &Term) -> Option<Vec<Term>> {
        let first = Term::iri(vocab::RDF_FIRST);
        let rest = Term::iri(vocab::RDF_REST);
        let mut items = Vec::new();
        let mut seen = BTreeSet::new();
        let mut node = head.clone();
        while !node.is(vocab::RDF_NIL) {
            if !seen.insert(node.clone()) {
                return None;
            }
            items.push(self.object(&node, &first)?.clone());
            node = self.object(&node, &rest)?.clone();
        }
        Some(items)
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Graph::new();
        graph.extend(iter);
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::iri(s), Term::iri(p), Term::iri(o))
    }

    #[test]
    fn insert_deduplicates_and_remove_updates_index() {
        let mut g = Graph::new();
        assert!(g.insert(t("urn:a", "urn:p", "urn:b")));
        assert!(!g.insert(t("urn:a", "urn:p", "urn:b")));
        assert_eq!(g.len(), 1);
        assert!(g.remove(&t("urn:a", "urn:p", "urn:b")));
        assert!(!g.remove(&t("urn:a", "urn:p", "urn:b")));
        assert_eq!(g.matching(None, Some(&Term::iri("urn:p")), None).count(), 0);
        assert!(g.is_empty());
    }

    #[test]
    fn matching_filters_on_bound_positions() {
        let g: Graph = [
            t("urn:a", "urn:p", "urn:b"),
            t("urn:a", "urn:q", "urn:c"),
            t("urn:d", "urn:p", "urn:b"),
        ]
        .into_iter()
        .collect();
        let p = Term::iri("urn:p");
        let b = Term::iri("urn:b");
        let a = Term::iri("urn:a");
        assert_eq!(g.matching(None, Some(&p), Some(&b)).count(), 2);
        assert_eq!(g.matching(Some(&a), None, None).count(), 2);
        assert_eq!(g.subjects(&p, &b).count(), 2);
        assert_eq!(g.objects(&a, &p).collect::<Vec<_>>(), vec![&b]);
    }

    #[test]
    fn clone_is_independent() {
        let original: Graph = [t("urn:a", "urn:p", "urn:b")].into_iter().collect();
        let mut copy = original.clone();
        copy.insert(t("urn:x", "urn:p", "urn:y"));
        assert_eq!(original.len(), 1);
        assert_eq!(copy.len(), 2);
        assert!(original.is_subset_of(&copy));
        assert!(!copy.is_subset_of(&original));
        assert_eq!(copy.difference(&original).count(), 1);
    }

    #[test]
    fn list_items_rejects_cycles() {
        let first = vocab::RDF_FIRST;
        let rest = vocab::RDF_REST;
        let mut g = Graph::new();
        g.insert(Triple::new(Term::blank("l1"), Term::iri(first), Term::iri("urn:a")));
        g.insert(Triple::new(Term::blank("l1"), Term::iri(rest), Term::blank("l2")));
        g.insert(Triple::new(Term::blank("l2"), Term::iri(first), Term::iri("urn:b")));
        g.insert(Triple::new(Term::blank("l2"), Term::iri(rest), Term::iri(vocab::RDF_NIL)));
        assert_eq!(
            g.list_items(&Term::blank("l1")),
            Some(vec![Term::iri("urn:a"), Term::iri("urn:b")])
        );

        g.remove(&Triple::new(Term::blank("l2"), Term::iri(rest), Term::iri(vocab::RDF_NIL)));
        g.insert(Triple::new(Term::blank("l2"), Term::iri(rest), Term::blank("l1")));
        assert_eq!(g.list_items(&Term::blank("l1")), None);
    }

    #[test]
    fn literals_render_as_ntriples() {
        assert_eq!(Term::string("a \"b\"").to_string(), "\"a \\\"b\\\"\"");
        assert_eq!(
            Term::integer(3).to_string(),
            "\"3\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }
}
