//! PostgREST query parameters
//!
//! Filters are encoded as `column=op.value` pairs; reqwest takes care of
//! percent-encoding when they are attached with `.query()`.

/// Query string builder for one table request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn gte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filter(column, "gte", value)
    }

    /// `column=in.(a,b,c)`
    pub fn in_list<T: std::fmt::Display>(self, column: &str, values: &[T]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", format!("({})", joined))
    }

    /// Order clause such as `created_at.desc` or `like_count.desc,created_at.desc`
    pub fn order(mut self, clause: &str) -> Self {
        self.params.push(("order".to_string(), clause.to_string()));
        self
    }

    /// Rows `offset..offset + limit`
    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.params.push(("offset".to_string(), offset.to_string()));
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    fn filter(mut self, column: &str, op: &str, value: impl std::fmt::Display) -> Self {
        self.params
            .push((column.to_string(), format!("{}.{}", op, value)));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Value of the first parameter named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
