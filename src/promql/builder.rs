//! Constructors for the aggregation shapes dashboards use over and over.
//!
//! Everything here returns a `promql_parser` AST. Ranges use the
//! `$__rate_interval` placeholder duration, so render results with
//! [`render_expr`](super::query::render_expr) or a [`Query`](super::query::Query).

use promql_parser::label::{Labels, Matchers};
use promql_parser::parser::token::{self, TokenId, TokenType};
use promql_parser::parser::value::ValueType;
use promql_parser::parser::{
    AggregateExpr, BinModifier, BinaryExpr, Call, Expr, Function, FunctionArgs, LabelModifier,
    MatrixSelector, NumberLiteral, VectorMatchCardinality, VectorSelector,
};

use super::matchers::{merge_selector, LabelFilter};
use super::placeholder::RATE_INTERVAL_DURATION;

/// One side of a ratio: `sum by (<by>) (rate(<metric>{<filters>}[$__rate_interval]))`.
#[derive(Debug, Clone, Copy)]
pub struct RateTerm<'a> {
    pub metric: &'a str,
    pub by: &'a [&'a str],
    pub filters: &'a [LabelFilter],
}

impl<'a> RateTerm<'a> {
    pub fn new(metric: &'a str, by: &'a [&'a str], filters: &'a [LabelFilter]) -> Self {
        Self { metric, by, filters }
    }
}

pub fn sum_by(metric: &str, by: &[&str], filters: &[LabelFilter]) -> Expr {
    aggregate(token::T_SUM, by, Expr::VectorSelector(selector(metric, filters)))
}

pub fn avg_by(metric: &str, by: &[&str], filters: &[LabelFilter]) -> Expr {
    aggregate(token::T_AVG, by, Expr::VectorSelector(selector(metric, filters)))
}

pub fn max_by(metric: &str, by: &[&str], filters: &[LabelFilter]) -> Expr {
    aggregate(token::T_MAX, by, Expr::VectorSelector(selector(metric, filters)))
}

pub fn min_by(metric: &str, by: &[&str], filters: &[LabelFilter]) -> Expr {
    aggregate(token::T_MIN, by, Expr::VectorSelector(selector(metric, filters)))
}

pub fn sum_by_rate(metric: &str, by: &[&str], filters: &[LabelFilter]) -> Expr {
    aggregate(token::T_SUM, by, range_call("rate", metric, filters))
}

pub fn sum_by_increase(metric: &str, by: &[&str], filters: &[LabelFilter]) -> Expr {
    aggregate(token::T_SUM, by, range_call("increase", metric, filters))
}

/// `numerator / denominator`, each side a summed rate.
pub fn error_case_ratio(numerator: RateTerm<'_>, denominator: RateTerm<'_>) -> Expr {
    binary(
        token::T_DIV,
        sum_by_rate(numerator.metric, numerator.by, numerator.filters),
        sum_by_rate(denominator.metric, denominator.by, denominator.filters),
    )
}

/// [`error_case_ratio`] scaled to a percentage.
pub fn error_case_percentage(numerator: RateTerm<'_>, denominator: RateTerm<'_>) -> Expr {
    binary(
        token::T_MUL,
        error_case_ratio(numerator, denominator),
        Expr::NumberLiteral(NumberLiteral { val: 100.0 }),
    )
}

/// `<lhs> <op> on(<on>) group_left(<group>) <rhs>`.
pub fn on_group_left(expr: Expr, on: &[&str], group: &[&str]) -> Expr {
    with_group_left(expr, LabelModifier::Include(labels(on)), group)
}

/// `<lhs> <op> ignoring(<ignoring>) group_left(<group>) <rhs>`.
pub fn ignoring_group_left(expr: Expr, ignoring: &[&str], group: &[&str]) -> Expr {
    with_group_left(expr, LabelModifier::Exclude(labels(ignoring)), group)
}

/// Binary expression without vector matching modifiers.
pub fn binary(op: TokenId, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(BinaryExpr {
        op: TokenType::new(op),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        modifier: None,
    })
}

fn with_group_left(mut expr: Expr, matching: LabelModifier, group: &[&str]) -> Expr {
    match &mut expr {
        Expr::Binary(bin) => {
            let return_bool = bin.modifier.as_ref().is_some_and(|m| m.return_bool);
            bin.modifier = Some(BinModifier {
                card: VectorMatchCardinality::ManyToOne(labels(group)),
                matching: Some(matching),
                return_bool,
            });
        }
        other => {
            tracing::warn!(
                "group_left applies to binary expressions only, leaving `{other}` unchanged"
            );
        }
    }
    expr
}

fn selector(metric: &str, filters: &[LabelFilter]) -> VectorSelector {
    let mut vs = VectorSelector {
        name: Some(metric.to_string()),
        matchers: Matchers::empty(),
        offset: None,
        at: None,
    };
    for filter in filters {
        merge_selector(&mut vs, filter);
    }
    vs
}

fn range_call(func: &'static str, metric: &str, filters: &[LabelFilter]) -> Expr {
    let range = MatrixSelector {
        vs: selector(metric, filters),
        range: RATE_INTERVAL_DURATION,
    };
    Expr::Call(Call {
        func: Function::new(func, vec![ValueType::Matrix], false, ValueType::Vector),
        args: FunctionArgs::new_args(Expr::MatrixSelector(range)),
    })
}

fn aggregate(op: TokenId, by: &[&str], expr: Expr) -> Expr {
    let modifier = if by.is_empty() {
        None
    } else {
        Some(LabelModifier::Include(labels(by)))
    };
    Expr::Aggregate(AggregateExpr {
        op: TokenType::new(op),
        expr: Box::new(expr),
        param: None,
        modifier,
    })
}

fn labels(names: &[&str]) -> Labels {
    Labels {
        labels: names.iter().map(|n| n.to_string()).collect(),
    }
}
