//! Boolean-query clauses and the compiled query accumulator.

use serde_json::{json, Map, Value};

/// The backend's boolean clause categories. Every predicate is filed under
/// exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    /// Equivalent match; no relevance scoring (backend `filter`).
    Equivalent,
    /// Must-not match (backend `must_not`).
    Exclude,
    /// Scored match (backend `must`).
    Scored,
    /// Optional match (backend `should`).
    Optional,
}

impl ClauseKind {
    /// Key of this clause group inside the backend's boolean query.
    pub fn document_key(&self) -> &'static str {
        match self {
            Self::Equivalent => "filter",
            Self::Exclude => "must_not",
            Self::Scored => "must",
            Self::Optional => "should",
        }
    }
}

/// One backend query clause, filed under a [`ClauseKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Bucket the clause is filed under.
    pub kind: ClauseKind,
    /// Backend query fragment, e.g. a `range`, `term` or `geo_shape` object.
    pub body: Value,
}

impl Clause {
    /// Files `body` under the equivalent-match bucket.
    pub fn equivalent(body: Value) -> Self {
        Self { kind: ClauseKind::Equivalent, body }
    }

    /// Files `body` under the must-not-match bucket.
    pub fn exclude(body: Value) -> Self {
        Self { kind: ClauseKind::Exclude, body }
    }
}

/// Accumulator of ordered clause lists, one per [`ClauseKind`], plus an
/// optional field-selection filter.
///
/// Built fresh per request and threaded functionally through the filter
/// builders; nothing is shared or mutated after compilation completes. The
/// final backend document is produced once by [`CompiledQuery::to_document`].
#[derive(Debug, Clone, Default)]
pub struct CompiledQuery {
    equivalent: Vec<Value>,
    exclude: Vec<Value>,
    scored: Vec<Value>,
    optional: Vec<Value>,
    source_fields: Option<Vec<String>>,
}

impl CompiledQuery {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the accumulator with `clause` appended to its bucket.
    pub fn with_clause(mut self, clause: Clause) -> Self {
        match clause.kind {
            ClauseKind::Equivalent => self.equivalent.push(clause.body),
            ClauseKind::Exclude => self.exclude.push(clause.body),
            ClauseKind::Scored => self.scored.push(clause.body),
            ClauseKind::Optional => self.optional.push(clause.body),
        }
        self
    }

    /// Returns the accumulator with every clause appended in order.
    pub fn with_clauses<I: IntoIterator<Item = Clause>>(self, clauses: I) -> Self {
        clauses.into_iter().fold(self, Self::with_clause)
    }

    /// Returns the accumulator with a field-selection filter attached.
    pub fn with_source_fields(mut self, fields: Vec<String>) -> Self {
        self.source_fields = Some(fields);
        self
    }

    /// Fields the response should be projected to, when selection was requested.
    pub fn source_fields(&self) -> Option<&[String]> {
        self.source_fields.as_deref()
    }

    /// Number of clauses filed under `kind`.
    pub fn clause_count(&self, kind: ClauseKind) -> usize {
        self.bucket(kind).len()
    }

    /// Clauses filed under `kind`, in filing order.
    pub fn clauses(&self, kind: ClauseKind) -> &[Value] {
        self.bucket(kind)
    }

    fn bucket(&self, kind: ClauseKind) -> &Vec<Value> {
        match kind {
            ClauseKind::Equivalent => &self.equivalent,
            ClauseKind::Exclude => &self.exclude,
            ClauseKind::Scored => &self.scored,
            ClauseKind::Optional => &self.optional,
        }
    }

    /// Assembles the final backend query document.
    ///
    /// Only non-empty buckets contribute a clause group; an empty bucket is
    /// omitted entirely rather than emitted as an empty array.
    pub fn to_document(&self) -> Value {
        let mut bool_query = Map::new();
        for kind in [
            ClauseKind::Equivalent,
            ClauseKind::Exclude,
            ClauseKind::Scored,
            ClauseKind::Optional,
        ] {
            let bucket = self.bucket(kind);
            if !bucket.is_empty() {
                bool_query.insert(kind.document_key().to_string(), json!(bucket));
            }
        }
        json!({ "bool": bool_query })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buckets_contribute_nothing() {
        let query = CompiledQuery::new()
            .with_clause(Clause::equivalent(json!({"term": {"id": "x"}})));
        let doc = query.to_document();
        let bool_query = doc.get("bool").unwrap().as_object().unwrap();
        assert!(bool_query.contains_key("filter"));
        assert!(!bool_query.contains_key("must_not"));
        assert!(!bool_query.contains_key("must"));
        assert!(!bool_query.contains_key("should"));
    }

    #[test]
    fn test_clause_order_is_preserved() {
        let query = CompiledQuery::new().with_clauses(vec![
            Clause::equivalent(json!({"term": {"a": 1}})),
            Clause::equivalent(json!({"term": {"b": 2}})),
        ]);
        let doc = query.to_document();
        let filters = doc.pointer("/bool/filter").unwrap().as_array().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0], json!({"term": {"a": 1}}));
        assert_eq!(filters[1], json!({"term": {"b": 2}}));
    }

    #[test]
    fn test_exclude_clause_lands_in_must_not() {
        let query =
            CompiledQuery::new().with_clause(Clause::exclude(json!({"term": {"x": "y"}})));
        let doc = query.to_document();
        assert!(doc.pointer("/bool/must_not/0").is_some());
        assert!(doc.pointer("/bool/filter").is_none());
    }

    #[test]
    fn test_source_fields_roundtrip() {
        let query = CompiledQuery::new()
            .with_source_fields(vec!["id".to_string(), "referenceLevel".to_string()]);
        assert_eq!(
            query.source_fields(),
            Some(&["id".to_string(), "referenceLevel".to_string()][..])
        );
    }
}
