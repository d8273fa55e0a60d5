//! Fact Store Adapter: loads Turtle sources into one [`Graph`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sophia_api::source::TripleSource;
use sophia_api::term::{Term as _, TermKind};
use sophia_api::triple::Triple as _;
use sophia_turtle::parser::turtle;
use tracing::{debug, info};

use super::{Graph, Literal, Term, Triple};
use crate::error::{EngineError, Result, SourceKind};
use crate::vocab;

/// Where a Turtle document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactSource {
    /// A file on disk.
    File(PathBuf),
    /// An in-memory document with a display name.
    Inline {
        /// Name used in diagnostics and run metadata.
        name: String,
        /// Turtle text.
        turtle: String,
    },
}

impl FactSource {
    /// A file source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        FactSource::File(path.into())
    }

    /// An inline source.
    pub fn inline(name: impl Into<String>, turtle: impl Into<String>) -> Self {
        FactSource::Inline {
            name: name.into(),
            turtle: turtle.into(),
        }
    }

    /// Display name for diagnostics and run metadata.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            FactSource::File(path) => path.display().to_string(),
            FactSource::Inline { name, .. } => name.clone(),
        }
    }

    fn read(&self, kind: SourceKind) -> Result<String> {
        match self {
            FactSource::Inline { turtle, .. } => Ok(turtle.clone()),
            FactSource::File(path) => read_file(path, kind),
        }
    }
}

fn read_file(path: &Path, kind: SourceKind) -> Result<String> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            EngineError::MissingSource {
                kind,
                path: path.to_path_buf(),
            }
        } else {
            EngineError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Loads the union of the given fact sources.
///
/// Every source is checked for existence before any is parsed, so a missing
/// file is reported even when an earlier source is malformed.
///
/// # Errors
///
/// [`EngineError::MissingSource`] if a path does not resolve,
/// [`EngineError::Parse`] if a document is not valid Turtle.
pub fn load(sources: &[FactSource]) -> Result<Graph> {
    load_as(sources, SourceKind::Facts)
}

/// Loads a shapes source for the constraint stage.
///
/// # Errors
///
/// As [`load`], with the shapes source kind in diagnostics.
pub fn load_shapes(source: &FactSource) -> Result<Graph> {
    load_as(std::slice::from_ref(source), SourceKind::Shapes)
}

fn load_as(sources: &[FactSource], kind: SourceKind) -> Result<Graph> {
    for source in sources {
        if let FactSource::File(path) = source {
            if !path.exists() {
                return Err(EngineError::MissingSource {
                    kind,
                    path: path.clone(),
                });
            }
        }
    }

    let mut graph = Graph::new();
    for (index, source) in sources.iter().enumerate() {
        let text = source.read(kind)?;
        let added = parse_into(&mut graph, &source.name(), &text, index)?;
        debug!(source = %source.name(), triples = added, "parsed {kind} source");
    }
    info!(sources = sources.len(), triples = graph.len(), "loaded {kind} graph");
    Ok(graph)
}

/// Parses Turtle into `graph`, scoping blank nodes by `scope` so that
/// documents merged into one graph never share blank nodes.
/// Returns the number of new triples.
///
/// # Errors
///
/// [`EngineError::Parse`] if the text is not valid Turtle.
pub fn parse_into(graph: &mut Graph, name: &str, text: &str, scope: usize) -> Result<usize> {
    let before = graph.len();
    let mut failure: Option<String> = None;
    turtle::parse_str(text)
        .for_each_triple(|t| {
            if failure.is_some() {
                return;
            }
            let converted = (
                convert(t.s(), scope),
                convert(t.p(), scope),
                convert(t.o(), scope),
            );
            match converted {
                (Ok(s), Ok(p), Ok(o)) => {
                    graph.insert(Triple::new(s, p, o));
                }
                (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => failure = Some(e),
            }
        })
        .map_err(|e| EngineError::Parse {
            source_name: name.to_owned(),
            message: e.to_string(),
        })?;
    if let Some(message) = failure {
        return Err(EngineError::Parse {
            source_name: name.to_owned(),
            message,
        });
    }
    Ok(graph.len() - before)
}

fn convert<T: sophia_api::term::Term>(term: T, scope: usize) -> std::result::Result<Term, String> {
    match term.kind() {
        TermKind::Iri => term
            .iri()
            .map(|iri| Term::iri(iri.as_str()))
            .ok_or_else(|| "IRI term without an IRI".to_owned()),
        TermKind::BlankNode => term
            .bnode_id()
            .map(|id| Term::blank(format!("s{scope}_{}", id.as_str())))
            .ok_or_else(|| "blank node without a label".to_owned()),
        TermKind::Literal => {
            let lexical = term
                .lexical_form()
                .ok_or_else(|| "literal without a lexical form".to_owned())?;
            let language = term.language_tag().map(|tag| tag.as_str().to_ascii_lowercase());
            let datatype = match (&language, term.datatype()) {
                (Some(_), _) => vocab::RDF_LANG_STRING.to_owned(),
                (None, Some(dt)) => dt.as_str().to_owned(),
                (None, None) => vocab::XSD_STRING.to_owned(),
            };
            Ok(Term::Literal(Literal {
                lexical: String::from(&*lexical),
                datatype,
                language,
            }))
        }
        other => Err(format!("unsupported term kind {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
@prefix ex: <https://example.org/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
ex:a ex:p ex:b ;
     rdfs:label "A"@EN , "plain" ;
     ex:n 3 ;
     ex:q [ ex:r ex:c ] .
"#;

    #[test]
    fn parses_terms_into_owned_model() {
        let g = load(&[FactSource::inline("doc", DOC)]).unwrap();
        assert_eq!(g.len(), 6);
        let label = Term::iri(vocab::RDFS_LABEL);
        let a = Term::iri("https://example.org/a");
        let labels: Vec<_> = g.objects(&a, &label).cloned().collect();
        assert!(labels.contains(&Term::string("plain")));
        assert!(labels.iter().any(|l| matches!(
            l,
            Term::Literal(Literal { language: Some(lang), datatype, .. })
                if lang == "en" && datatype == vocab::RDF_LANG_STRING
        )));
        assert!(g
            .objects(&a, &Term::iri("https://example.org/n"))
            .any(|n| n == &Term::integer(3)));
    }

    #[test]
    fn blank_nodes_are_scoped_per_source() {
        let doc = "@prefix ex: <https://example.org/> . _:x ex:p ex:o .";
        let g = load(&[FactSource::inline("one", doc), FactSource::inline("two", doc)]).unwrap();
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = load(&[FactSource::file("/definitely/not/here.ttl")]).unwrap_err();
        match err {
            EngineError::MissingSource { kind, path } => {
                assert_eq!(kind, SourceKind::Facts);
                assert_eq!(path, PathBuf::from("/definitely/not/here.ttl"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_shapes_file_names_the_shapes_kind() {
        let err = load_shapes(&FactSource::file("/nowhere/shapes.ttl")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingSource { kind: SourceKind::Shapes, .. }
        ));
    }

    #[test]
    fn malformed_turtle_fails_the_load() {
        let err = load(&[FactSource::inline("bad", "ex:a ex:b .")]).unwrap_err();
        assert!(matches!(err, EngineError::Parse { source_name, .. } if source_name == "bad"));
    }
}
