//! Constraint Stage: SHACL Core subset.
//!
//! Supported targets: `sh:targetClass` (instances through `rdfs:subClassOf*`),
//! `sh:targetNode`, `sh:targetSubjectsOf`, `sh:targetObjectsOf`.
//! Property paths are a predicate IRI or `[ sh:inversePath <p> ]`.
//! Components: `minCount`, `maxCount`, `class`, `datatype`, `nodeKind`,
//! `hasValue`, `in`, `pattern` (+ `flags`), `minLength`, `maxLength`.
//! Anything a shape says that cannot be interpreted is a
//! [`EngineError::MalformedShape`], never a silent pass.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::graph::{Graph, Term};
use crate::vocab;

/// Validates a data graph against a shapes graph.
pub trait ShapeValidator {
    /// Name recorded in run metadata.
    fn name(&self) -> &str;

    /// Pure function of its two inputs.
    ///
    /// # Errors
    ///
    /// [`EngineError::MalformedShape`] if a shape cannot be interpreted.
    fn validate(&self, data: &Graph, shapes: &Graph) -> Result<ConstraintOutcome>;
}

/// `sh:severity` of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResultSeverity {
    /// `sh:Violation` (the default). Breaks conformance.
    Violation,
    /// `sh:Warning`.
    Warning,
    /// `sh:Info`.
    Info,
}

impl ResultSeverity {
    fn from_term(term: Option<&Term>, shape: &Term) -> Result<Self> {
        match term.and_then(Term::as_iri) {
            None => match term {
                None => Ok(ResultSeverity::Violation),
                Some(other) => Err(malformed(shape, format!("sh:severity {other} is not an IRI"))),
            },
            Some(iri) if iri == sh("Violation") => Ok(ResultSeverity::Violation),
            Some(iri) if iri == sh("Warning") => Ok(ResultSeverity::Warning),
            Some(iri) if iri == sh("Info") => Ok(ResultSeverity::Info),
            Some(iri) => Err(malformed(shape, format!("unknown severity <{iri}>"))),
        }
    }

    /// `sh:` local name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResultSeverity::Violation => "Violation",
            ResultSeverity::Warning => "Warning",
            ResultSeverity::Info => "Info",
        }
    }
}

/// One validation result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValidationResult {
    /// Shape that produced the result.
    pub source_shape: Term,
    /// Focus node.
    pub focus_node: Term,
    /// Rendered result path, if the shape has one.
    pub path: Option<String>,
    /// Constraint component local name, e.g. `MinCountConstraintComponent`.
    pub component: &'static str,
    /// Offending value, when the component is value-based.
    pub value: Option<Term>,
    /// Result severity.
    pub severity: ResultSeverity,
    /// `sh:message`, or a generated description.
    pub message: String,
}

/// Output of the constraint stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintOutcome {
    /// True when no result has violation severity.
    pub conforms: bool,
    /// Number of violation-severity results.
    pub violation_count: usize,
    /// Human-readable validation report.
    pub report_text: String,
    /// All results, ordered.
    pub results: Vec<ValidationResult>,
}

impl ConstraintOutcome {
    fn from_results(mut results: Vec<ValidationResult>) -> Self {
        results.sort();
        results.dedup();
        let violation_count = results
            .iter()
            .filter(|r| r.severity == ResultSeverity::Violation)
            .count();
        let conforms = violation_count == 0;
        let report_text = render_report(conforms, &results);
        Self {
            conforms,
            violation_count,
            report_text,
            results,
        }
    }
}

fn render_report(conforms: bool, results: &[ValidationResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Validation Report");
    let _ = writeln!(out, "Conforms: {}", if conforms { "True" } else { "False" });
    if results.is_empty() {
        return out;
    }
    let _ = writeln!(out, "Results ({}):", results.len());
    for r in results {
        let kind = match r.severity {
            ResultSeverity::Violation => "Constraint Violation",
            ResultSeverity::Warning => "Validation Warning",
            ResultSeverity::Info => "Validation Info",
        };
        let _ = writeln!(out, "{kind} in {} ({}):", r.component, sh(r.component));
        let _ = writeln!(out, "\tSeverity: sh:{}", r.severity.as_str());
        let _ = writeln!(out, "\tSource Shape: {}", r.source_shape);
        let _ = writeln!(out, "\tFocus Node: {}", r.focus_node);
        if let Some(value) = &r.value {
            let _ = writeln!(out, "\tValue Node: {value}");
        }
        if let Some(path) = &r.path {
            let _ = writeln!(out, "\tResult Path: {path}");
        }
        let _ = writeln!(out, "\tMessage: {}", r.message);
    }
    out
}

fn sh(local: &str) -> String {
    format!("{}{local}", vocab::SH)
}

fn malformed(shape: &Term, detail: impl Into<String>) -> EngineError {
    EngineError::MalformedShape {
        shape: shape.to_string(),
        detail: detail.into(),
    }
}

/// Runs the constraint stage with logging.
///
/// # Errors
///
/// As [`ShapeValidator::validate`].
pub fn check(
    validator: &dyn ShapeValidator,
    data: &Graph,
    shapes: &Graph,
) -> Result<ConstraintOutcome> {
    let outcome = validator.validate(data, shapes)?;
    info!(
        validator = validator.name(),
        conforms = outcome.conforms,
        violations = outcome.violation_count,
        results = outcome.results.len(),
        "constraints checked"
    );
    Ok(outcome)
}

/// Reference SHACL Core subset validator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShaclValidator;

impl ShapeValidator for ShaclValidator {
    fn name(&self) -> &str {
        "shacl-core"
    }

    fn validate(&self, data: &Graph, shapes: &Graph) -> Result<ConstraintOutcome> {
        let ctx = Context::new(data, shapes);
        let mut results = Vec::new();
        for shape in ctx.node_shapes() {
            if ctx.deactivated(&shape) {
                debug!(shape = %shape, "shape deactivated");
                continue;
            }
            let focus_nodes = ctx.focus_nodes(&shape)?;
            debug!(shape = %shape, focus = focus_nodes.len(), "node shape");
            for focus in &focus_nodes {
                ctx.check_values(&shape, focus, None, std::slice::from_ref(focus), &mut results)?;
                for property in shapes.objects(&shape, &ctx.t.property) {
                    if ctx.deactivated(property) {
                        continue;
                    }
                    let (label, values) = ctx.path_values(property, focus)?;
                    ctx.check_values(property, focus, Some(&label), &values, &mut results)?;
                }
            }
        }
        Ok(ConstraintOutcome::from_results(results))
    }
}

struct Terms {
    ty: Term,
    sco: Term,
    node_shape: Term,
    property: Term,
    path: Term,
    inverse_path: Term,
    target_class: Term,
    target_node: Term,
    target_subjects_of: Term,
    target_objects_of: Term,
    deactivated: Term,
    severity: Term,
    message: Term,
    min_count: Term,
    max_count: Term,
    class: Term,
    datatype: Term,
    node_kind: Term,
    has_value: Term,
    in_: Term,
    pattern: Term,
    flags: Term,
    min_length: Term,
    max_length: Term,
}

impl Terms {
    fn new() -> Self {
        let s = |local: &str| Term::iri(sh(local));
        Self {
            ty: Term::iri(vocab::RDF_TYPE),
            sco: Term::iri(vocab::RDFS_SUBCLASS_OF),
            node_shape: s("NodeShape"),
            property: s("property"),
            path: s("path"),
            inverse_path: s("inversePath"),
            target_class: s("targetClass"),
            target_node: s("targetNode"),
            target_subjects_of: s("targetSubjectsOf"),
            target_objects_of: s("targetObjectsOf"),
            deactivated: s("deactivated"),
            severity: s("severity"),
            message: s("message"),
            min_count: s("minCount"),
            max_count: s("maxCount"),
            class: s("class"),
            datatype: s("datatype"),
            node_kind: s("nodeKind"),
            has_value: s("hasValue"),
            in_: s("in"),
            pattern: s("pattern"),
            flags: s("flags"),
            min_length: s("minLength"),
            max_length: s("maxLength"),
        }
    }
}

struct Context<'g> {
    data: &'g Graph,
    shapes: &'g Graph,
    t: Terms,
}

impl<'g> Context<'g> {
    fn new(data: &'g Graph, shapes: &'g Graph) -> Self {
        Self {
            data,
            shapes,
            t: Terms::new(),
        }
    }

    /// Declared node shapes plus anything carrying a target.
    fn node_shapes(&self) -> BTreeSet<Term> {
        let mut shapes: BTreeSet<Term> = self
            .shapes
            .subjects(&self.t.ty, &self.t.node_shape)
            .cloned()
            .collect();
        for target in [
            &self.t.target_class,
            &self.t.target_node,
            &self.t.target_subjects_of,
            &self.t.target_objects_of,
        ] {
            shapes.extend(
                self.shapes
                    .matching(None, Some(target), None)
                    .map(|t| t.subject.clone()),
            );
        }
        shapes
    }

    fn deactivated(&self, shape: &Term) -> bool {
        self.shapes
            .object(shape, &self.t.deactivated)
            .and_then(Term::as_literal)
            .is_some_and(|l| l.lexical == "true")
    }

    fn focus_nodes(&self, shape: &Term) -> Result<BTreeSet<Term>> {
        let mut focus = BTreeSet::new();
        for class in self.shapes.objects(shape, &self.t.target_class) {
            focus.extend(self.instances_of(class));
        }
        focus.extend(self.shapes.objects(shape, &self.t.target_node).cloned());
        for p in self.shapes.objects(shape, &self.t.target_subjects_of) {
            if !p.is_iri() {
                return Err(malformed(shape, "sh:targetSubjectsOf needs an IRI"));
            }
            focus.extend(self.data.matching(None, Some(p), None).map(|t| t.subject.clone()));
        }
        for p in self.shapes.objects(shape, &self.t.target_objects_of) {
            if !p.is_iri() {
                return Err(malformed(shape, "sh:targetObjectsOf needs an IRI"));
            }
            focus.extend(self.data.matching(None, Some(p), None).map(|t| t.object.clone()));
        }
        Ok(focus)
    }

    /// `class` and all its transitive subclasses in the data graph.
    fn subclasses(&self, class: &Term) -> BTreeSet<Term> {
        let mut seen = BTreeSet::from([class.clone()]);
        let mut stack = vec![class.clone()];
        while let Some(c) = stack.pop() {
            for sub in self.data.subjects(&self.t.sco, &c) {
                if seen.insert(sub.clone()) {
                    stack.push(sub.clone());
                }
            }
        }
        seen
    }

    fn instances_of(&self, class: &Term) -> BTreeSet<Term> {
        self.subclasses(class)
            .iter()
            .flat_map(|c| self.data.subjects(&self.t.ty, c).cloned().collect::<Vec<_>>())
            .collect()
    }

    fn is_instance(&self, node: &Term, class: &Term) -> bool {
        self.subclasses(class).iter().any(|c| self.data.has_type(node, c))
    }

    fn path_values(&self, property: &Term, focus: &Term) -> Result<(String, Vec<Term>)> {
        let path = self
            .shapes
            .object(property, &self.t.path)
            .ok_or_else(|| malformed(property, "property shape without sh:path"))?;
        if path.is_iri() {
            let values = self.data.objects(focus, path).cloned().collect();
            return Ok((path.to_string(), values));
        }
        match self.shapes.object(path, &self.t.inverse_path) {
            Some(p) if p.is_iri() => {
                let values = self.data.subjects(p, focus).cloned().collect();
                Ok((format!("[ sh:inversePath {p} ]"), values))
            }
            _ => Err(malformed(
                property,
                "only predicate and sh:inversePath paths are supported",
            )),
        }
    }

    fn integer(&self, shape: &Term, predicate: &Term) -> Result<Option<usize>> {
        match self.shapes.object(shape, predicate) {
            None => Ok(None),
            Some(term) => term
                .as_literal()
                .and_then(|l| l.lexical.trim().parse::<usize>().ok())
                .map(Some)
                .ok_or_else(|| {
                    malformed(shape, format!("{predicate} expects a non-negative integer, got {term}"))
                }),
        }
    }

    fn pattern(&self, shape: &Term) -> Result<Option<Regex>> {
        let Some(term) = self.shapes.object(shape, &self.t.pattern) else {
            return Ok(None);
        };
        let source = term
            .as_literal()
            .ok_or_else(|| malformed(shape, "sh:pattern must be a literal"))?;
        let flags = self
            .shapes
            .object(shape, &self.t.flags)
            .and_then(Term::as_literal)
            .map(|l| l.lexical.clone())
            .unwrap_or_default();
        RegexBuilder::new(&source.lexical)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .ignore_whitespace(flags.contains('x'))
            .build()
            .map(Some)
            .map_err(|e| malformed(shape, format!("invalid sh:pattern: {e}")))
    }

    fn check_values(
        &self,
        shape: &Term,
        focus: &Term,
        path: Option<&str>,
        values: &[Term],
        out: &mut Vec<ValidationResult>,
    ) -> Result<()> {
        let severity = ResultSeverity::from_term(self.shapes.object(shape, &self.t.severity), shape)?;
        let custom = self
            .shapes
            .object(shape, &self.t.message)
            .and_then(Term::as_literal)
            .map(|l| l.lexical.clone());
        let mut push = |component: &'static str, value: Option<&Term>, default: String| {
            out.push(ValidationResult {
                source_shape: shape.clone(),
                focus_node: focus.clone(),
                path: path.map(str::to_owned),
                component,
                value: value.cloned(),
                severity,
                message: custom.clone().unwrap_or(default),
            });
        };
        let on = path.map_or_else(|| focus.to_string(), |p| format!("{focus}->{p}"));

        if let Some(min) = self.integer(shape, &self.t.min_count)? {
            if values.len() < min {
                push("MinCountConstraintComponent", None, format!("Less than {min} values on {on}"));
            }
        }
        if let Some(max) = self.integer(shape, &self.t.max_count)? {
            if values.len() > max {
                push("MaxCountConstraintComponent", None, format!("More than {max} values on {on}"));
            }
        }
        for class in self.shapes.objects(shape, &self.t.class) {
            for v in values.iter().filter(|v| !self.is_instance(v, class)) {
                push(
                    "ClassConstraintComponent",
                    Some(v),
                    format!("Value does not have class {class}"),
                );
            }
        }
        if let Some(datatype) = self.shapes.object(shape, &self.t.datatype) {
            let expected = datatype
                .as_iri()
                .ok_or_else(|| malformed(shape, "sh:datatype must be an IRI"))?;
            for v in values {
                let ok = v.as_literal().is_some_and(|l| l.datatype == expected);
                if !ok {
                    push(
                        "DatatypeConstraintComponent",
                        Some(v),
                        format!("Value is not Literal with datatype {datatype}"),
                    );
                }
            }
        }
        if let Some(kind) = self.shapes.object(shape, &self.t.node_kind) {
            let kind_iri = kind
                .as_iri()
                .ok_or_else(|| malformed(shape, "sh:nodeKind must be an IRI"))?;
            let accepts = node_kind_predicate(kind_iri)
                .ok_or_else(|| malformed(shape, format!("unknown sh:nodeKind {kind}")))?;
            for v in values.iter().filter(|v| !accepts(v)) {
                push(
                    "NodeKindConstraintComponent",
                    Some(v),
                    format!("Value is not of Node Kind {kind}"),
                );
            }
        }
        for expected in self.shapes.objects(shape, &self.t.has_value) {
            if !values.contains(expected) {
                push(
                    "HasValueConstraintComponent",
                    None,
                    format!("Node {on} does not contain Value {expected}"),
                );
            }
        }
        if let Some(list) = self.shapes.object(shape, &self.t.in_) {
            let allowed = self
                .shapes
                .list_items(list)
                .ok_or_else(|| malformed(shape, "sh:in must be a well-formed RDF list"))?;
            for v in values.iter().filter(|v| !allowed.contains(v)) {
                push(
                    "InConstraintComponent",
                    Some(v),
                    format!("Value {v} not in list {}", render_list(&allowed)),
                );
            }
        }
        if let Some(regex) = self.pattern(shape)? {
            for v in values {
                if !string_value(v).is_some_and(|s| regex.is_match(s)) {
                    push(
                        "PatternConstraintComponent",
                        Some(v),
                        format!("Value does not match pattern \"{}\"", regex.as_str()),
                    );
                }
            }
        }
        if let Some(min) = self.integer(shape, &self.t.min_length)? {
            for v in values {
                if !string_value(v).is_some_and(|s| s.chars().count() >= min) {
                    push(
                        "MinLengthConstraintComponent",
                        Some(v),
                        format!("String length not >= {min}"),
                    );
                }
            }
        }
        if let Some(max) = self.integer(shape, &self.t.max_length)? {
            for v in values {
                if !string_value(v).is_some_and(|s| s.chars().count() <= max) {
                    push(
                        "MaxLengthConstraintComponent",
                        Some(v),
                        format!("String length not <= {max}"),
                    );
                }
            }
        }
        Ok(())
    }
}

/// String form for pattern and length checks; blank nodes have none.
fn string_value(term: &Term) -> Option<&str> {
    match term {
        Term::Iri(iri) => Some(iri),
        Term::Literal(l) => Some(&l.lexical),
        Term::Blank(_) => None,
    }
}

fn node_kind_predicate(kind: &str) -> Option<fn(&Term) -> bool> {
    let local = kind.strip_prefix(vocab::SH)?;
    Some(match local {
        "IRI" => |t: &Term| t.is_iri(),
        "BlankNode" => |t: &Term| t.is_blank(),
        "Literal" => |t: &Term| t.is_literal(),
        "BlankNodeOrIRI" => |t: &Term| !t.is_literal(),
        "BlankNodeOrLiteral" => |t: &Term| !t.is_iri(),
        "IRIOrLiteral" => |t: &Term| !t.is_blank(),
        _ => return None,
    })
}

fn render_list(items: &[Term]) -> String {
    let inner: Vec<String> = items.iter().map(Term::to_string).collect();
    format!("( {} )", inner.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::store::parse_into;

    const PREFIXES: &str = "@prefix : <https://example.org/> .\n\
        @prefix sh: <http://www.w3.org/ns/shacl#> .\n\
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n";

    fn graph(turtle: &str) -> Graph {
        let mut g = Graph::new();
        parse_into(&mut g, "test", &format!("{PREFIXES}{turtle}"), 0).unwrap();
        g
    }

    fn run(data: &str, shapes: &str) -> ConstraintOutcome {
        ShaclValidator.validate(&graph(data), &graph(shapes)).unwrap()
    }

    #[test]
    fn conforming_data_reports_true() {
        let outcome = run(
            ":Sub rdfs:subClassOf :Thing . :x a :Sub ; rdfs:label \"x\" .",
            ":S a sh:NodeShape ; sh:targetClass :Thing ;
                sh:property [ sh:path rdfs:label ; sh:minCount 1 ; sh:datatype xsd:string ] .",
        );
        assert!(outcome.conforms);
        assert_eq!(outcome.violation_count, 0);
        assert_eq!(outcome.report_text, "Validation Report\nConforms: True\n");
    }

    #[test]
    fn min_count_through_subclass_target_is_violated() {
        let outcome = run(
            ":Sub rdfs:subClassOf :Thing . :x a :Sub .",
            ":S a sh:NodeShape ; sh:targetClass :Thing ;
                sh:property [ sh:path rdfs:label ; sh:minCount 1 ; sh:message \"needs a label\" ] .",
        );
        assert!(!outcome.conforms);
        assert_eq!(outcome.violation_count, 1);
        assert_eq!(outcome.results[0].component, "MinCountConstraintComponent");
        assert!(outcome.report_text.contains("Results (1):"));
        assert!(outcome.report_text.contains("Message: needs a label"));
        assert!(outcome.report_text.contains("Focus Node: <https://example.org/x>"));
    }

    #[test]
    fn value_components_fire() {
        let outcome = run(
            ":x :p :y , \"lit\" ; :q \"ab\" ; :r :z .",
            ":S sh:targetNode :x ;
                sh:property [ sh:path :p ; sh:nodeKind sh:IRI ; sh:maxCount 1 ] ;
                sh:property [ sh:path :q ; sh:minLength 3 ; sh:pattern \"^A\" ; sh:flags \"i\" ] ;
                sh:property [ sh:path :r ; sh:in ( :a :b ) ; sh:hasValue :a ; sh:class :K ] .",
        );
        let components: BTreeSet<_> = outcome.results.iter().map(|r| r.component).collect();
        assert_eq!(
            components,
            BTreeSet::from([
                "NodeKindConstraintComponent",
                "MaxCountConstraintComponent",
                "MinLengthConstraintComponent",
                "InConstraintComponent",
                "HasValueConstraintComponent",
                "ClassConstraintComponent",
            ])
        );
        assert_eq!(outcome.violation_count, 6);
    }

    #[test]
    fn inverse_paths_and_subjects_of_targets() {
        let outcome = run(
            ":a :about :sys .",
            ":S sh:targetObjectsOf :about ;
                sh:property [ sh:path [ sh:inversePath :about ] ; sh:minCount 2 ] .",
        );
        assert_eq!(outcome.violation_count, 1);
        assert_eq!(
            outcome.results[0].path.as_deref(),
            Some("[ sh:inversePath <https://example.org/about> ]")
        );
    }

    #[test]
    fn warnings_and_deactivated_shapes_keep_conformance() {
        let outcome = run(
            ":x :p \"nope\" .",
            ":S sh:targetSubjectsOf :p ;
                sh:property [ sh:path :p ; sh:pattern \"^yes\" ; sh:severity sh:Warning ] .
             :D sh:targetNode :x ; sh:deactivated true ;
                sh:property [ sh:path :missing ; sh:minCount 1 ] .",
        );
        assert!(outcome.conforms);
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.report_text.contains("Validation Warning in PatternConstraintComponent"));
    }

    #[test]
    fn malformed_shapes_are_errors() {
        for shapes in [
            ":S sh:targetNode :x ; sh:property [ sh:minCount 1 ] .",
            ":S sh:targetNode :x ; sh:property [ sh:path :p ; sh:minCount \"many\" ] .",
            ":S sh:targetNode :x ; sh:property [ sh:path :p ; sh:pattern \"(\" ] .",
            ":S sh:targetNode :x ; sh:nodeKind sh:Nothing .",
        ] {
            let err = ShaclValidator
                .validate(&graph(":x :p \"v\" ."), &graph(shapes))
                .unwrap_err();
            assert!(matches!(err, EngineError::MalformedShape { .. }), "{shapes}");
        }
    }
}
