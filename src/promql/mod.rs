pub mod builder;
pub mod matchers;
pub mod placeholder;
pub mod query;

// Re-export the public API
pub use matchers::{LabelFilter, MatchType};
pub use query::{render_expr, rewrite, rewrite_expr, rewrite_with, Query};
