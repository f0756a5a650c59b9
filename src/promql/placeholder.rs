use std::time::Duration;

/// How a placeholder literal behaves inside PromQL text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaceholderKind {
    /// Range, offset and subquery positions. Holds the duration the literal parses to.
    Duration(Duration),
    /// Scalar positions.
    Number,
    /// Scalar or `@` modifier positions. After `@` the serializer prints the
    /// value as seconds with a millisecond fraction.
    Timestamp,
    /// Bare identifiers or string contents.
    Name,
}

/// A dashboard template variable and the PromQL-legal literal that stands in for it.
#[derive(Debug, PartialEq)]
pub struct Placeholder {
    pub token: &'static str,
    pub literal: &'static str,
    pub kind: PlaceholderKind,
}

impl Placeholder {
    pub fn duration(&self) -> Option<Duration> {
        match self.kind {
            PlaceholderKind::Duration(d) => Some(d),
            _ => None,
        }
    }
}

pub const RATE_INTERVAL_DURATION: Duration = Duration::from_secs(245_287);

// Duration literals are written in the serializer's canonical form so they
// survive a parse/print cycle byte for byte. Scalar literals carry an odd
// fraction so whole-number thresholds in real queries never decode as tokens.
pub const RATE_INTERVAL: Placeholder = Placeholder {
    token: "$__rate_interval",
    literal: "2d20h8m7s",
    kind: PlaceholderKind::Duration(RATE_INTERVAL_DURATION),
};

pub const INTERVAL_MS: Placeholder = Placeholder {
    token: "$__interval_ms",
    literal: "7357861.0937",
    kind: PlaceholderKind::Number,
};

pub const DASHBOARD: Placeholder = Placeholder {
    token: "$__dashboard",
    literal: "__placeholder_dashboard__",
    kind: PlaceholderKind::Name,
};

pub const RANGE_MS: Placeholder = Placeholder {
    token: "$__range_ms",
    literal: "9579083.1846",
    kind: PlaceholderKind::Number,
};

pub const INTERVAL: Placeholder = Placeholder {
    token: "$__interval",
    literal: "3d21h9m8s",
    kind: PlaceholderKind::Duration(Duration::from_secs(335_348)),
};

pub const RANGE_S: Placeholder = Placeholder {
    token: "$__range_s",
    literal: "8468972.2755",
    kind: PlaceholderKind::Number,
};

pub const PROJECT: Placeholder = Placeholder {
    token: "$__project",
    literal: "__placeholder_project__",
    kind: PlaceholderKind::Name,
};

pub const RANGE: Placeholder = Placeholder {
    token: "$__range",
    literal: "4d22h10m9s",
    kind: PlaceholderKind::Duration(Duration::from_secs(425_409)),
};

pub const FROM: Placeholder = Placeholder {
    token: "$__from",
    literal: "1357924680135",
    kind: PlaceholderKind::Timestamp,
};

pub const TO: Placeholder = Placeholder {
    token: "$__to",
    literal: "1468035791246",
    kind: PlaceholderKind::Timestamp,
};

/// Every known template variable, longest token first.
///
/// `$__range` is a prefix of `$__range_s` and `$__range_ms` (and `$__interval`
/// of `$__interval_ms`), so substitution must walk this table in order.
pub static PLACEHOLDERS: &[&Placeholder] = &[
    &RATE_INTERVAL,
    &INTERVAL_MS,
    &DASHBOARD,
    &RANGE_MS,
    &INTERVAL,
    &RANGE_S,
    &PROJECT,
    &RANGE,
    &FROM,
    &TO,
];

/// Replace every known template variable in `query` with its placeholder literal.
///
/// Returns the encoded text and the placeholders that were actually substituted.
/// Unknown `$__` tokens are left alone and will be rejected by the parser.
pub fn encode(query: &str) -> (String, Vec<&'static Placeholder>) {
    let mut encoded = query.to_string();
    let mut mapping = Vec::new();
    for &placeholder in PLACEHOLDERS {
        if encoded.contains(placeholder.token) {
            encoded = encoded.replace(placeholder.token, placeholder.literal);
            mapping.push(placeholder);
        }
    }
    (encoded, mapping)
}

/// Restore the template variables recorded in `mapping`, longest literal first.
pub fn decode(text: &str, mapping: &[&'static Placeholder]) -> String {
    let mut ordered = mapping.to_vec();
    ordered.sort_by(|a, b| b.literal.len().cmp(&a.literal.len()));
    let mut decoded = text.to_string();
    for placeholder in ordered {
        if placeholder.kind == PlaceholderKind::Timestamp {
            let at_form = format!("{}.000", placeholder.literal);
            decoded = decoded.replace(&at_form, placeholder.token);
        }
        decoded = decoded.replace(placeholder.literal, placeholder.token);
    }
    decoded
}

/// Restore every known template variable. Used for ASTs that were built in
/// code rather than parsed, which carry no mapping of their own.
///
/// A literal in the expression that happens to equal a placeholder literal is
/// decoded too; the literals are chosen so that real queries do not contain them.
pub fn decode_all(text: &str) -> String {
    decode(text, PLACEHOLDERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promql_parser::parser::{self, Expr};

    #[test]
    fn table_is_longest_token_first() {
        for pair in PLACEHOLDERS.windows(2) {
            assert!(
                pair[0].token.len() >= pair[1].token.len(),
                "{} must come before {}",
                pair[1].token,
                pair[0].token
            );
        }
    }

    #[test]
    fn literals_never_contain_each_other() {
        for a in PLACEHOLDERS {
            for b in PLACEHOLDERS {
                if a.token != b.token {
                    assert!(!a.literal.contains(b.literal), "{} contains {}", a.literal, b.literal);
                    assert!(!a.literal.contains(b.token));
                }
            }
        }
    }

    #[test]
    fn duration_literals_print_back_verbatim() {
        for p in PLACEHOLDERS.iter().filter(|p| p.duration().is_some()) {
            let query = format!("m[{}]", p.literal);
            let expr = parser::parse(&query).unwrap();
            match &expr {
                Expr::MatrixSelector(ms) => assert_eq!(Some(ms.range), p.duration()),
                other => panic!("expected matrix selector, got {other:?}"),
            }
            assert_eq!(expr.to_string(), query);
        }
    }

    #[test]
    fn number_literals_print_back_verbatim() {
        let scalars = PLACEHOLDERS
            .iter()
            .filter(|p| matches!(p.kind, PlaceholderKind::Number | PlaceholderKind::Timestamp));
        for p in scalars {
            let query = format!("m / {}", p.literal);
            assert_eq!(parser::parse(&query).unwrap().to_string(), query);
        }
    }

    #[test]
    fn timestamps_decode_from_at_modifier_form() {
        for p in PLACEHOLDERS.iter().filter(|p| p.kind == PlaceholderKind::Timestamp) {
            let printed = parser::parse(&format!("m @ {}", p.literal)).unwrap().to_string();
            assert_eq!(printed, format!("m @ {}.000", p.literal));
            assert_eq!(decode(&printed, &[*p]), format!("m @ {}", p.token));
        }
    }

    #[test]
    fn encode_records_only_present_tokens() {
        let (encoded, mapping) = encode("rate(m[$__rate_interval]) / $__interval_ms");
        assert_eq!(encoded, "rate(m[2d20h8m7s]) / 7357861.0937");
        assert_eq!(mapping, vec![&RATE_INTERVAL, &INTERVAL_MS]);
    }

    #[test]
    fn encode_replaces_every_occurrence() {
        let (encoded, mapping) = encode("rate(a[$__range]) + rate(b[$__range])");
        assert_eq!(encoded, "rate(a[4d22h10m9s]) + rate(b[4d22h10m9s])");
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn prefix_tokens_are_not_split() {
        let (encoded, mapping) = encode("metric[$__range_s]");
        assert_eq!(encoded, "metric[8468972.2755]");
        assert_eq!(mapping, vec![&RANGE_S]);

        let (encoded, mapping) = encode("metric[$__range]");
        assert_eq!(encoded, "metric[4d22h10m9s]");
        assert_eq!(mapping, vec![&RANGE]);

        let (encoded, _) = encode("x / $__interval_ms + y[$__interval]");
        assert_eq!(encoded, "x / 7357861.0937 + y[3d21h9m8s]");
    }

    #[test]
    fn decode_inverts_encode() {
        let cases = [
            "rate(m[$__rate_interval])",
            "sum_over_time(m[$__range]) / $__range_s * $__range_ms",
            r#"up{dashboard="$__dashboard", project="$__project"}"#,
            "m[$__interval] offset $__interval / $__interval_ms",
            "m / ($__to - $__from)",
            r#"m{cluster="$cluster"}"#,
        ];
        for case in cases {
            let (encoded, mapping) = encode(case);
            assert_eq!(decode(&encoded, &mapping), case, "case: {case}");
        }
    }

    #[test]
    fn unknown_tokens_pass_through() {
        let (encoded, mapping) = encode("m[$__not_a_token]");
        assert_eq!(encoded, "m[$__not_a_token]");
        assert!(mapping.is_empty());
    }
}
