//! Flat query-fragment builder.
//!
//! Produces literal JSON fragments for boolean, term, range, wildcard and
//! prefix conditions. Fragments carry no tree structure of their own; they are
//! embedded verbatim into filter aggregations or a top-level `query`.

use serde_json::{Map, Value, json};

fn keyed(key: impl Into<String>, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}

/// Clauses of a `bool` query. Empty clause lists are omitted from the output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    filter: Vec<Value>,
    must: Vec<Value>,
    should: Vec<Value>,
    must_not: Vec<Value>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, queries: impl IntoIterator<Item = Value>) -> Self {
        self.filter.extend(queries);
        self
    }

    pub fn must(mut self, queries: impl IntoIterator<Item = Value>) -> Self {
        self.must.extend(queries);
        self
    }

    pub fn should(mut self, queries: impl IntoIterator<Item = Value>) -> Self {
        self.should.extend(queries);
        self
    }

    pub fn must_not(mut self, queries: impl IntoIterator<Item = Value>) -> Self {
        self.must_not.extend(queries);
        self
    }

    /// Render as `{"bool": {...}}`, or `{}` when every clause list is empty.
    pub fn build(self) -> Value {
        let mut clauses = Map::new();
        for (name, queries) in [
            ("filter", self.filter),
            ("must", self.must),
            ("should", self.should),
            ("must_not", self.must_not),
        ] {
            if !queries.is_empty() {
                clauses.insert(name.to_string(), Value::Array(queries));
            }
        }
        if clauses.is_empty() {
            Value::Object(Map::new())
        } else {
            keyed("bool", Value::Object(clauses))
        }
    }
}

/// Query-fragment constructors.
pub struct Query;

impl Query {
    pub fn filter(queries: impl IntoIterator<Item = Value>) -> Value {
        BoolQuery::new().filter(queries).build()
    }

    pub fn must(queries: impl IntoIterator<Item = Value>) -> Value {
        BoolQuery::new().must(queries).build()
    }

    pub fn should(queries: impl IntoIterator<Item = Value>) -> Value {
        BoolQuery::new().should(queries).build()
    }

    pub fn must_not(queries: impl IntoIterator<Item = Value>) -> Value {
        BoolQuery::new().must_not(queries).build()
    }

    pub fn term(field: &str, term: impl Into<Value>) -> Value {
        keyed("term", keyed(field, term.into()))
    }

    pub fn terms<T: Into<Value>>(field: &str, terms: impl IntoIterator<Item = T>) -> Value {
        let terms = terms.into_iter().map(Into::into).collect();
        keyed("terms", keyed(field, Value::Array(terms)))
    }

    /// Range condition with optional inclusive bounds merged into `options`.
    pub fn range(
        field: &str,
        gte: Option<Value>,
        lte: Option<Value>,
        mut options: Map<String, Value>,
    ) -> Value {
        if let Some(gte) = gte {
            options.insert("gte".to_string(), gte);
        }
        if let Some(lte) = lte {
            options.insert("lte".to_string(), lte);
        }
        keyed("range", keyed(field, Value::Object(options)))
    }

    /// Nested query over `path`; without an inner query it matches everything.
    pub fn nest(path: &str, query: Option<Value>) -> Value {
        json!({
            "nested": {
                "path": path,
                "query": Self::query(query),
            }
        })
    }

    /// Wildcard matching `search` anywhere in the field.
    pub fn full_wildcard(field: &str, search: &str) -> Value {
        keyed("wildcard", keyed(field, Value::String(format!("*{search}*"))))
    }

    /// Wildcard with the caller's own `*` placement. A trailing-only `*` is
    /// better expressed as [`Query::prefix`].
    pub fn wildcard(field: &str, search: &str) -> Value {
        keyed("wildcard", keyed(field, Value::String(search.to_string())))
    }

    pub fn suggest(field: &str, search: &str) -> Value {
        keyed("suggest", Self::prefix(field, search))
    }

    pub fn prefix(field: &str, search: impl Into<Value>) -> Value {
        keyed("prefix", keyed(field, search.into()))
    }

    pub fn multi_match<S: Into<String>>(
        fields: impl IntoIterator<Item = S>,
        query: &str,
        match_type: &str,
        max_expansions: u32,
    ) -> Value {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        json!({
            "multi_match": {
                "query": query,
                "fields": fields,
                "type": match_type,
                "max_expansions": max_expansions,
            }
        })
    }

    pub fn exists(field: &str) -> Value {
        json!({ "exists": { "field": field } })
    }

    /// The given query, or `match_all` when none is provided.
    pub fn query(query: Option<Value>) -> Value {
        query.unwrap_or_else(|| json!({ "match_all": {} }))
    }
}
