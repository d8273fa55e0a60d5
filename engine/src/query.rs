//! Pattern-query service.
//!
//! [`QueryService`] is the seam the Evidence Extractor and Gate Evaluator
//! query through. [`SparqlEngine`] answers SPARQL `ASK` and `SELECT` with
//! oxigraph, over an in-memory store loaded from the graph being queried:
//!
//! ```text
//! PREFIX : <https://arco.ai/ontology/core#>
//! PREFIX bfo: <http://purl.obolibrary.org/obo/BFO_>
//! SELECT DISTINCT ?component WHERE { ?system bfo:0000051 ?component . }
//! ```
//!
//! Pre-bound variables become a trailing `VALUES` clause. Malformed text
//! is an [`EngineError::Query`]; an empty result is not.

use std::collections::BTreeMap;

use oxigraph::model::{
    BlankNode, GraphName, Literal as OxLiteral, NamedNode, Quad, Subject, Term as OxTerm,
};
use oxigraph::sparql::{Query as SparqlQuery, QueryResults};
use oxigraph::store::Store;
use regex::Regex;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::graph::{Graph, Literal, Term, Triple};
use crate::vocab;

/// Prefix prologue shared by the engine's fixed query set.
pub const PROLOGUE: &str = "\
PREFIX : <https://arco.ai/ontology/core#>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX bfo: <http://purl.obolibrary.org/obo/BFO_>
PREFIX ro: <http://purl.obolibrary.org/obo/RO_>
PREFIX iao: <http://purl.obolibrary.org/obo/IAO_>
";

/// One solution: variable name (without `?`) to bound term.
pub type Row = BTreeMap<String, Term>;

/// Syntax-checked query text plus pre-bound variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    bindings: Row,
}

impl Query {
    /// Parses query text.
    ///
    /// # Errors
    ///
    /// [`EngineError::Query`] when the text is not valid SPARQL.
    pub fn parse(text: &str) -> Result<Self> {
        SparqlQuery::parse(text, None).map_err(|e| EngineError::query(text, e.to_string()))?;
        Ok(Self {
            text: text.to_owned(),
            bindings: Row::new(),
        })
    }

    /// Pre-binds a variable, as if every solution started with it.
    ///
    /// # Errors
    ///
    /// [`EngineError::Query`] if the variable does not occur in the text or
    /// the value is a blank node.
    pub fn with_binding(mut self, variable: &str, value: Term) -> Result<Self> {
        let occurs = Regex::new(&format!(r"[?$]{}\b", regex::escape(variable)))
            .map_err(|e| EngineError::query(&self.text, e.to_string()))?;
        if !occurs.is_match(&self.text) {
            return Err(EngineError::query(
                &self.text,
                format!("cannot bind ?{variable}: it does not occur in the query"),
            ));
        }
        if value.is_blank() {
            return Err(EngineError::query(
                &self.text,
                format!("cannot bind ?{variable} to blank node {value}"),
            ));
        }
        self.bindings.insert(variable.to_owned(), value);
        Ok(self)
    }

    /// The source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Pre-bound variables.
    #[must_use]
    pub fn bindings(&self) -> &Row {
        &self.bindings
    }

    /// The text with its bindings appended as a `VALUES` clause.
    #[must_use]
    pub fn to_sparql(&self) -> String {
        if self.bindings.is_empty() {
            return self.text.clone();
        }
        let variables: Vec<String> = self.bindings.keys().map(|v| format!("?{v}")).collect();
        let values: Vec<String> = self.bindings.values().map(Term::to_string).collect();
        format!(
            "{}\nVALUES ({}) {{ ({}) }}",
            self.text.trim_end(),
            variables.join(" "),
            values.join(" ")
        )
    }
}

/// Evaluates structural queries against a graph.
pub trait QueryService {
    /// True if the pattern has at least one solution.
    ///
    /// # Errors
    ///
    /// [`EngineError::Query`] if the query is not an `ASK` or cannot be
    /// evaluated.
    fn ask(&self, graph: &Graph, query: &Query) -> Result<bool>;

    /// All solutions, sorted and without duplicates.
    ///
    /// # Errors
    ///
    /// [`EngineError::Query`] if the query is not a `SELECT` or cannot be
    /// evaluated.
    fn select(&self, graph: &Graph, query: &Query) -> Result<Vec<Row>>;
}

/// SPARQL evaluation backed by an in-memory oxigraph store.
#[derive(Debug, Default, Clone, Copy)]
pub struct SparqlEngine;

impl SparqlEngine {
    fn run<T>(
        &self,
        graph: &Graph,
        query: &Query,
        collect: impl FnOnce(QueryResults, &str) -> Result<T>,
    ) -> Result<T> {
        let sparql = query.to_sparql();
        let store = load(graph).map_err(|reason| EngineError::query(&sparql, reason))?;
        let results = store
            .query(sparql.as_str())
            .map_err(|e| EngineError::query(&sparql, e.to_string()))?;
        collect(results, &sparql)
    }
}

impl QueryService for SparqlEngine {
    fn ask(&self, graph: &Graph, query: &Query) -> Result<bool> {
        let found = self.run(graph, query, |results, sparql| match results {
            QueryResults::Boolean(found) => Ok(found),
            _ => Err(EngineError::query(sparql, "ask() needs an ASK query")),
        })?;
        debug!(query = %first_line(query.text()), found, "ask");
        Ok(found)
    }

    fn select(&self, graph: &Graph, query: &Query) -> Result<Vec<Row>> {
        let mut rows = self.run(graph, query, |results, sparql| {
            let QueryResults::Solutions(solutions) = results else {
                return Err(EngineError::query(sparql, "select() needs a SELECT query"));
            };
            let mut rows = Vec::new();
            for solution in solutions {
                let solution = solution.map_err(|e| EngineError::query(sparql, e.to_string()))?;
                rows.push(
                    solution
                        .iter()
                        .filter_map(|(var, term)| {
                            Some((var.as_str().to_owned(), from_oxigraph(term)?))
                        })
                        .collect::<Row>(),
                );
            }
            Ok(rows)
        })?;
        rows.sort();
        rows.dedup();
        debug!(query = %first_line(query.text()), rows = rows.len(), "select");
        Ok(rows)
    }
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.to_ascii_uppercase().starts_with("PREFIX"))
        .unwrap_or("")
}

fn load(graph: &Graph) -> std::result::Result<Store, String> {
    let store = Store::new().map_err(|e| e.to_string())?;
    let mut quads = Vec::with_capacity(graph.len());
    for triple in graph.iter() {
        if let Some(quad) = to_quad(triple)? {
            quads.push(quad);
        }
    }
    store.extend(quads).map_err(|e| e.to_string())?;
    Ok(store)
}

/// `None` for triples RDF cannot store: literal subjects, non-IRI predicates.
fn to_quad(triple: &Triple) -> std::result::Result<Option<Quad>, String> {
    let subject: Subject = match to_oxigraph(&triple.subject)? {
        OxTerm::NamedNode(node) => node.into(),
        OxTerm::BlankNode(node) => node.into(),
        _ => return Ok(None),
    };
    let OxTerm::NamedNode(predicate) = to_oxigraph(&triple.predicate)? else {
        return Ok(None);
    };
    Ok(Some(Quad::new(
        subject,
        predicate,
        to_oxigraph(&triple.object)?,
        GraphName::DefaultGraph,
    )))
}

fn to_oxigraph(term: &Term) -> std::result::Result<OxTerm, String> {
    Ok(match term {
        Term::Iri(iri) => NamedNode::new(iri.as_str())
            .map_err(|e| format!("{term}: {e}"))?
            .into(),
        Term::Blank(label) => BlankNode::new(label.as_str())
            .map_err(|e| format!("{term}: {e}"))?
            .into(),
        Term::Literal(lit) => match &lit.language {
            Some(lang) => OxLiteral::new_language_tagged_literal(lit.lexical.as_str(), lang.as_str())
                .map_err(|e| format!("{term}: {e}"))?
                .into(),
            None => {
                let datatype = NamedNode::new(lit.datatype.as_str())
                    .map_err(|e| format!("{term}: {e}"))?;
                OxLiteral::new_typed_literal(lit.lexical.as_str(), datatype).into()
            }
        },
    })
}

fn from_oxigraph(term: &OxTerm) -> Option<Term> {
    match term {
        OxTerm::NamedNode(node) => Some(Term::iri(node.as_str())),
        OxTerm::BlankNode(node) => Some(Term::blank(node.as_str())),
        OxTerm::Literal(lit) => Some(match lit.language() {
            Some(lang) => Term::Literal(Literal {
                lexical: lit.value().to_owned(),
                datatype: vocab::RDF_LANG_STRING.to_owned(),
                language: Some(lang.to_ascii_lowercase()),
            }),
            None => Term::typed(lit.value(), lit.datatype().as_str()),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EX: &str = "PREFIX ex: <https://example.org/>\n";

    fn ex(local: &str) -> Term {
        Term::iri(format!("https://example.org/{local}"))
    }

    fn graph() -> Graph {
        let t = |s: &str, p: &str, o: &str| Triple::new(ex(s), ex(p), ex(o));
        [
            t("sys", "part", "c1"),
            t("sys", "part", "c2"),
            t("c1", "disp", "d1"),
            t("c2", "disp", "d2"),
            t("c2", "disp", "d1"),
        ]
        .into_iter()
        .collect()
    }

    fn q(body: &str) -> Query {
        Query::parse(&format!("{EX}{body}")).unwrap()
    }

    #[test]
    fn ask_is_false_on_no_match() {
        let g = graph();
        assert!(SparqlEngine.ask(&g, &q("ASK { ex:sys ex:part ?c . ?c ex:disp ex:d2 }")).unwrap());
        assert!(!SparqlEngine.ask(&g, &q("ASK { ex:sys ex:part ?c . ?c ex:disp ex:d9 }")).unwrap());
        assert!(!SparqlEngine.ask(&Graph::new(), &q("ASK { ?s ?p ?o }")).unwrap());
    }

    #[test]
    fn select_rows_are_sorted_and_deduplicated() {
        let rows = SparqlEngine
            .select(&graph(), &q("SELECT ?c WHERE { ex:sys ex:part ?c . ?c ex:disp ?d }"))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["c"], ex("c1"));
        assert_eq!(rows[1]["c"], ex("c2"));

        let limited = SparqlEngine
            .select(&graph(), &q("SELECT * WHERE { ?c ex:disp ?d } LIMIT 1"))
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].len(), 2);
    }

    #[test]
    fn pre_bound_variables_constrain_solutions() {
        let g = graph();
        let query = q("SELECT ?d WHERE { ?c ex:disp ?d }")
            .with_binding("c", ex("c1"))
            .unwrap();
        assert!(query.to_sparql().ends_with("VALUES (?c) { (<https://example.org/c1>) }"));
        let rows = SparqlEngine.select(&g, &query).unwrap();
        assert_eq!(rows, vec![Row::from([("d".to_owned(), ex("d1"))])]);

        let ask = q("ASK { ex:sys ex:part ?c }").with_binding("c", ex("d1")).unwrap();
        assert!(!SparqlEngine.ask(&g, &ask).unwrap());
    }

    #[test]
    fn binding_needs_a_named_variable_of_the_query() {
        assert!(q("ASK { ?c ex:disp ?d }").with_binding("x", ex("x")).is_err());
        assert!(q("ASK { ?cc ex:disp ?d }").with_binding("c", ex("x")).is_err());
        assert!(q("ASK { ?c ex:disp ?d }").with_binding("c", Term::blank("b0")).is_err());
    }

    #[test]
    fn terms_come_back_as_stored() {
        let mut g = Graph::new();
        let label = Term::Literal(Literal {
            lexical: "Sentinel".to_owned(),
            datatype: vocab::RDF_LANG_STRING.to_owned(),
            language: Some("en".to_owned()),
        });
        g.insert(Triple::new(Term::blank("s0_b1"), ex("label"), label.clone()));
        g.insert(Triple::new(Term::blank("s0_b1"), ex("count"), Term::integer(3)));
        g.insert(Triple::new(Term::blank("s0_b1"), ex("name"), Term::string("plain")));

        let rows = SparqlEngine.select(&g, &q("SELECT ?s ?p ?o WHERE { ?s ?p ?o }")).unwrap();
        let objects: Vec<&Term> = rows.iter().map(|r| &r["o"]).collect();
        assert!(objects.contains(&&label));
        assert!(objects.contains(&&Term::integer(3)));
        assert!(objects.contains(&&Term::string("plain")));
        assert!(rows.iter().all(|r| r["s"] == Term::blank("s0_b1")));
    }

    #[test]
    fn malformed_queries_are_query_errors() {
        for bad in [
            "ASK { ?x undeclared:p ?y }",
            "ASK { ?x \"lit\" ?y }",
            "ASK { ?x ex:p <https://unterminated }",
            "ASK { ?x ex:p ?y } trailing",
            "SELECT WHERE { ?x ex:p ?y }",
        ] {
            let result = Query::parse(&format!("{EX}{bad}"));
            assert!(
                matches!(result, Err(EngineError::Query { .. })),
                "expected a query error for `{bad}`"
            );
        }
    }

    #[test]
    fn query_form_must_match_the_call() {
        let err = SparqlEngine.select(&graph(), &q("ASK { ?s ?p ?o }")).unwrap_err();
        assert!(matches!(err, EngineError::Query { .. }));
        let err = SparqlEngine.ask(&graph(), &q("SELECT ?s WHERE { ?s ?p ?o }")).unwrap_err();
        assert!(matches!(err, EngineError::Query { .. }));
    }
}
