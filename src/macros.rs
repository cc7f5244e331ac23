#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declare a [`RuleMatcher`](crate::RuleMatcher).
///
/// Only `name` and `claims` are required; `normalizer` defaults to the generic
/// pipeline, `reduction` to exact matching and `fallback` to none (the chain's
/// generic device).
#[macro_export]
macro_rules! matcher {
    (
        name: $name:expr,
        $(signals: $signals:expr,)?
        claims: $claims:expr
        $(, normalizer: $normalizer:expr)?
        $(, reduction: $reduction:expr)?
        $(, fallback: $fallback:expr)?
        $(,)?
    ) => {{
        $crate::RuleMatcher::new($name, $claims)
            $(.signals($signals))?
            $(.normalizer($normalizer))?
            $(.reduction($reduction))?
            $(.fallback($fallback))?
    }};
}
