use std::fmt;

use promql_parser::parser::{self, Expr};

use super::matchers::{self, LabelFilter, MatchType};
use super::placeholder::{self, Placeholder};
use crate::error::{Error, Result};

/// A PromQL expression ready for label injection and rendering.
///
/// Built either from dashboard text (template variables are hidden from the
/// parser behind placeholders) or from an AST produced in code. `Display`
/// prints the canonical PromQL form with template variables restored.
#[derive(Debug, Clone)]
pub struct Query {
    expr: Expr,
    placeholders: Vec<&'static Placeholder>,
}

impl Query {
    /// Parse dashboard query text.
    pub fn parse(text: &str) -> Result<Self> {
        let (encoded, placeholders) = placeholder::encode(text);
        let expr = parser::parse(&encoded).map_err(|message| {
            tracing::error!("failed to parse query `{text}`: {message}");
            Error::Parse {
                query: text.to_string(),
                message,
            }
        })?;
        Ok(Self { expr, placeholders })
    }

    /// Wrap a copy of an AST built in code. The caller's expression is never touched.
    pub fn from_expr(expr: &Expr) -> Self {
        Self {
            expr: expr.clone(),
            placeholders: placeholder::PLACEHOLDERS.to_vec(),
        }
    }

    pub fn merge_matcher(&mut self, filter: &LabelFilter) -> &mut Self {
        matchers::merge(&mut self.expr, filter);
        self
    }

    pub fn merge_matchers(&mut self, filters: &[LabelFilter]) -> &mut Self {
        matchers::merge_all(&mut self.expr, filters);
        self
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let canonical = self.expr.to_string();
        f.write_str(&placeholder::decode(&canonical, &self.placeholders))
    }
}

/// Inject `filters` into every selector of `query` and return the canonical text.
///
/// With no filters this only normalizes the query.
pub fn rewrite(query: &str, filters: &[LabelFilter]) -> Result<String> {
    let mut parsed = Query::parse(query)?;
    if !filters.is_empty() {
        parsed.merge_matchers(filters);
    }
    let rendered = parsed.to_string();
    tracing::debug!(input = query, output = %rendered, "rewrote query");
    Ok(rendered)
}

/// Single-matcher form of [`rewrite`].
pub fn rewrite_with(
    query: &str,
    name: &str,
    match_type: MatchType,
    value: &str,
) -> Result<String> {
    rewrite(query, &[LabelFilter::new(name, match_type, value)])
}

/// Inject `filters` into a copy of `expr`.
pub fn rewrite_expr(expr: &Expr, filters: &[LabelFilter]) -> Expr {
    let mut query = Query::from_expr(expr);
    query.merge_matchers(filters);
    query.into_expr()
}

/// Render an AST built in code as dashboard query text.
pub fn render_expr(expr: &Expr) -> String {
    placeholder::decode_all(&expr.to_string())
}
