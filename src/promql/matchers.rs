use promql_parser::label::{MatchOp, Matcher, Matchers};
use promql_parser::parser::{Expr, VectorSelector};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Equal,
    NotEqual,
    RegexMatch,
    RegexNotMatch,
}

/// A label matcher to inject into every selector of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFilter {
    pub name: String,
    #[serde(default = "default_match_type")]
    pub match_type: MatchType,
    pub value: String,
}

fn default_match_type() -> MatchType {
    MatchType::Equal
}

impl LabelFilter {
    pub fn new(name: impl Into<String>, match_type: MatchType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            match_type,
            value: value.into(),
        }
    }

    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, MatchType::Equal, value)
    }

    pub fn regex(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, MatchType::RegexMatch, value)
    }

    /// Filters with an empty name or value are accepted and ignored.
    pub fn is_noop(&self) -> bool {
        self.name.is_empty() || self.value.is_empty()
    }

    fn match_op(&self) -> MatchOp {
        match self.match_type {
            MatchType::Equal => MatchOp::Equal,
            MatchType::NotEqual => MatchOp::NotEqual,
            MatchType::RegexMatch => compile_regex(&self.value).map_or(MatchOp::Equal, MatchOp::Re),
            MatchType::RegexNotMatch => {
                compile_regex(&self.value).map_or(MatchOp::NotEqual, MatchOp::NotRe)
            }
        }
    }

    pub fn to_matcher(&self) -> Matcher {
        Matcher::new(self.match_op(), &self.name, &self.value)
    }
}

/// Anchored the same way Prometheus anchors label regexes. Template forms such
/// as `${cluster:pipe}` are not valid regexes before the dashboard platform
/// interpolates them; those fall back to a literal match. Only the textual
/// value is ever serialized.
fn compile_regex(value: &str) -> Option<Regex> {
    match Regex::new(&format!("^(?:{value})$")) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::debug!("label value {value:?} is not a valid regex, matching it literally");
            match Regex::new(&format!("^{}$", regex::escape(value))) {
                Ok(re) => Some(re),
                Err(_) => {
                    tracing::warn!("cannot compile label value {value:?}: {err}");
                    None
                }
            }
        }
    }
}

/// Merge `filter` into every vector selector reachable from `expr`.
///
/// An existing matcher on the same label is overwritten in place; otherwise
/// the matcher is appended.
pub fn merge(expr: &mut Expr, filter: &LabelFilter) {
    if filter.is_noop() {
        return;
    }
    for_each_selector(expr, &mut |vs| merge_selector(vs, filter));
}

/// Apply `filters` in order; a later filter for the same label wins.
pub fn merge_all(expr: &mut Expr, filters: &[LabelFilter]) {
    for filter in filters {
        merge(expr, filter);
    }
}

pub fn merge_selector(vs: &mut VectorSelector, filter: &LabelFilter) {
    if filter.is_noop() {
        return;
    }
    merge_matchers(&mut vs.matchers, filter);
}

fn merge_matchers(matchers: &mut Matchers, filter: &LabelFilter) {
    // `{a="1" or b="2"}` is a union of groups, so each group needs the filter.
    if matchers.or_matchers.is_empty() {
        upsert(&mut matchers.matchers, filter);
    } else {
        for group in matchers.or_matchers.iter_mut() {
            upsert(group, filter);
        }
    }
}

fn upsert(matchers: &mut Vec<Matcher>, filter: &LabelFilter) {
    match matchers.iter_mut().find(|m| m.name == filter.name) {
        Some(existing) => {
            existing.op = filter.match_op();
            existing.value = filter.value.clone();
        }
        None => matchers.push(filter.to_matcher()),
    }
}

/// Visit every vector selector in the tree, including the ones wrapped by
/// matrix selectors, subqueries, calls, aggregations and binary operands.
pub fn for_each_selector(expr: &mut Expr, f: &mut dyn FnMut(&mut VectorSelector)) {
    match expr {
        Expr::VectorSelector(vs) => f(vs),
        Expr::MatrixSelector(ms) => f(&mut ms.vs),
        Expr::Call(call) => {
            for arg in call.args.args.iter_mut() {
                for_each_selector(arg, f);
            }
        }
        Expr::Aggregate(agg) => {
            for_each_selector(&mut agg.expr, f);
            if let Some(param) = agg.param.as_mut() {
                for_each_selector(param, f);
            }
        }
        Expr::Binary(bin) => {
            for_each_selector(&mut bin.lhs, f);
            for_each_selector(&mut bin.rhs, f);
        }
        Expr::Unary(u) => for_each_selector(&mut u.expr, f),
        Expr::Paren(p) => for_each_selector(&mut p.expr, f),
        Expr::Subquery(sq) => for_each_selector(&mut sq.expr, f),
        _ => {}
    }
}

/// Read-only counterpart of [`for_each_selector`].
pub fn visit_selectors(expr: &Expr, f: &mut dyn FnMut(&VectorSelector)) {
    match expr {
        Expr::VectorSelector(vs) => f(vs),
        Expr::MatrixSelector(ms) => f(&ms.vs),
        Expr::Call(call) => {
            for arg in &call.args.args {
                visit_selectors(arg, f);
            }
        }
        Expr::Aggregate(agg) => {
            visit_selectors(&agg.expr, f);
            if let Some(param) = &agg.param {
                visit_selectors(param, f);
            }
        }
        Expr::Binary(bin) => {
            visit_selectors(&bin.lhs, f);
            visit_selectors(&bin.rhs, f);
        }
        Expr::Unary(u) => visit_selectors(&u.expr, f),
        Expr::Paren(p) => visit_selectors(&p.expr, f),
        Expr::Subquery(sq) => visit_selectors(&sq.expr, f),
        _ => {}
    }
}

/// Matcher groups of every selector in the tree, in traversal order. A
/// selector written with `or` contributes one entry per group.
pub fn collect_selector_matchers(expr: &Expr) -> Vec<Vec<Matcher>> {
    let mut out = Vec::new();
    visit_selectors(expr, &mut |vs| {
        if vs.matchers.or_matchers.is_empty() {
            out.push(vs.matchers.matchers.clone());
        } else {
            out.extend(vs.matchers.or_matchers.iter().cloned());
        }
    });
    out
}
