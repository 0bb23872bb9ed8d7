//! Turns a loosely-typed [`RawParams`] bag into a minimal [`QueryParameterSet`].
//!
//! Rules, in priority order:
//!
//! 1. A date range wins over a single `date`; the two are never sent together.
//! 2. Without a range, `date` is used and `limit` is honored.
//! 3. `null`, missing and blank strings are dropped; `0` and `false` are kept.
//! 4. `order` survives only as exactly `asc` or `desc`.
//! 5. Lists are sent comma-joined, and omitted when empty.
//! 6. Strings are trimmed.

use std::collections::BTreeSet;

use tracing::trace;

use super::params::{ParamValue, QueryParameterSet, RawParams, RawValue};
use crate::{TradeDate, ValidationError};

pub mod keys {
    pub const DATE: &str = "date";
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";
    pub const LIMIT: &str = "limit";
    pub const ORDER: &str = "order";
    pub const SORT_BY: &str = "sort_by";
    pub const PAGE: &str = "page";
    pub const PAGE_SIZE: &str = "page_size";
}

/// How an endpoint treats the date selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePolicy {
    /// Range or single date, neither required.
    Optional,
    /// Same selection as `Optional`, but one of them must be supplied.
    RequireAny,
    /// Only ranges go on the wire. Both bounds are needed; a lone `date`
    /// becomes the one-day range `date..=date`.
    RequireRange,
    /// Like `RequireRange`, falling back to the given date when nothing is supplied.
    RangeOrDefault(TradeDate),
    /// Like `RangeOrDefault`, but the fallback is the local date at the
    /// moment each query is normalized.
    RangeOrToday,
}

#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    date_policy: DatePolicy,
    allowed_keys: Option<BTreeSet<String>>,
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self {
            date_policy: DatePolicy::Optional,
            allowed_keys: None,
        }
    }
}

impl QueryNormalizer {
    pub fn new(date_policy: DatePolicy) -> Self {
        Self {
            date_policy,
            ..Self::default()
        }
    }

    /// Restrict non-date parameters to a whitelist. Date selectors and
    /// `limit` are governed by the date policy alone.
    pub fn with_allowed_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub const fn date_policy(&self) -> DatePolicy {
        self.date_policy
    }

    pub fn normalize(&self, raw: &RawParams) -> Result<QueryParameterSet, ValidationError> {
        let mut out = QueryParameterSet::new();

        let start = raw.get(keys::START_DATE).and_then(clean);
        let end = raw.get(keys::END_DATE).and_then(clean);
        let date = raw.get(keys::DATE).and_then(clean);
        let limit = raw.get(keys::LIMIT).and_then(clean);

        match self.date_policy {
            DatePolicy::Optional | DatePolicy::RequireAny => {
                if start.is_some() || end.is_some() {
                    if let Some(start) = start {
                        out.insert(keys::START_DATE, start);
                    }
                    if let Some(end) = end {
                        out.insert(keys::END_DATE, end);
                    }
                } else {
                    let has_date = date.is_some();
                    if let Some(date) = date {
                        out.insert(keys::DATE, date);
                    }
                    if self.date_policy == DatePolicy::RequireAny && !has_date {
                        return Err(ValidationError::MissingRequiredDate);
                    }
                    if let Some(limit) = limit {
                        out.insert(keys::LIMIT, limit);
                    }
                }
            }
            DatePolicy::RequireRange
            | DatePolicy::RangeOrDefault(_)
            | DatePolicy::RangeOrToday => {
                let (start, end) = match (start, end, date) {
                    (Some(start), Some(end), _) => (start, end),
                    (_, _, Some(date)) => (date.clone(), date),
                    _ => {
                        let fallback = match self.date_policy {
                            DatePolicy::RangeOrDefault(fallback) => fallback,
                            DatePolicy::RangeOrToday => TradeDate::today(),
                            _ => return Err(ValidationError::MissingRequiredDate),
                        };
                        let fallback = ParamValue::Text(fallback.format());
                        (fallback.clone(), fallback)
                    }
                };
                out.insert(keys::START_DATE, start);
                out.insert(keys::END_DATE, end);
            }
        }

        for (key, value) in raw.iter() {
            if is_date_selector(key) {
                continue;
            }
            if !self.is_allowed(key) {
                trace!(key, "dropping parameter not accepted by endpoint");
                continue;
            }

            let Some(cleaned) = clean(value) else {
                trace!(key, "dropping unset parameter");
                continue;
            };

            if key == keys::ORDER && !matches!(cleaned.as_str(), Some("asc" | "desc")) {
                trace!(key, value = %cleaned, "dropping invalid sort order");
                continue;
            }

            out.insert(key, cleaned);
        }

        Ok(out)
    }

    fn is_allowed(&self, key: &str) -> bool {
        self.allowed_keys
            .as_ref()
            .is_none_or(|allowed| allowed.contains(key))
    }
}

fn is_date_selector(key: &str) -> bool {
    matches!(
        key,
        keys::DATE | keys::START_DATE | keys::END_DATE | keys::LIMIT
    )
}

/// Applies the inclusion policy to a single raw value.
fn clean(value: &RawValue) -> Option<ParamValue> {
    match value {
        RawValue::List(items) => {
            let joined = items
                .iter()
                .filter_map(clean_scalar)
                .map(|item| item.to_string())
                .collect::<Vec<_>>();
            (!joined.is_empty()).then(|| ParamValue::Text(joined.join(",")))
        }
        other => clean_scalar(other),
    }
}

fn clean_scalar(value: &RawValue) -> Option<ParamValue> {
    match value {
        RawValue::Null | RawValue::List(_) => None,
        RawValue::Bool(flag) => Some(ParamValue::Bool(*flag)),
        RawValue::Int(number) => Some(ParamValue::Int(*number)),
        RawValue::Float(number) if number.is_finite() => Some(ParamValue::Float(*number)),
        RawValue::Float(_) => None,
        RawValue::Text(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| ParamValue::Text(trimmed.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> ParamValue {
        ParamValue::Text(value.to_owned())
    }

    #[test]
    fn single_date_with_limit_passes_through() {
        let raw = RawParams::new().with("date", "2024-05-10").with("limit", 50);
        let params = QueryNormalizer::default().normalize(&raw).expect("valid");

        let expected: QueryParameterSet = [
            ("date", text("2024-05-10")),
            ("limit", ParamValue::Int(50)),
        ]
        .into_iter()
        .collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn range_drops_single_date_and_limit() {
        let raw = RawParams::new()
            .with("start_date", "2024-05-01")
            .with("end_date", "2024-05-10")
            .with("date", "2024-05-10")
            .with("limit", 50);
        let params = QueryNormalizer::default().normalize(&raw).expect("valid");

        let expected: QueryParameterSet = [
            ("start_date", text("2024-05-01")),
            ("end_date", text("2024-05-10")),
        ]
        .into_iter()
        .collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn zero_and_false_are_retained() {
        let raw = RawParams::new()
            .with("date", "2024-05-10")
            .with("consecutive_limit_count", 0)
            .with("is_lhb", false)
            .with("min_amount", 0.0);
        let params = QueryNormalizer::default().normalize(&raw).expect("valid");

        assert_eq!(params.get("consecutive_limit_count"), Some(&ParamValue::Int(0)));
        assert_eq!(params.get("is_lhb"), Some(&ParamValue::Bool(false)));
        assert_eq!(params.get("min_amount"), Some(&ParamValue::Float(0.0)));
    }

    #[test]
    fn null_and_blank_strings_are_dropped_and_text_is_trimmed() {
        let raw = RawParams::new()
            .with("stock_code", "   ")
            .with("industry", RawValue::Null)
            .with("stock_name", "  平安银行 ");
        let params = QueryNormalizer::default().normalize(&raw).expect("valid");

        assert!(!params.contains_key("stock_code"));
        assert!(!params.contains_key("industry"));
        assert_eq!(params.get("stock_name"), Some(&text("平安银行")));
    }

    #[test]
    fn invalid_order_is_dropped_silently() {
        let normalizer = QueryNormalizer::default();

        let dropped = normalizer
            .normalize(&RawParams::new().with("order", "descending"))
            .expect("invalid order is not an error");
        assert!(!dropped.contains_key("order"));

        let kept = normalizer
            .normalize(&RawParams::new().with("order", "asc"))
            .expect("valid");
        assert_eq!(kept.get("order"), Some(&text("asc")));
    }

    #[test]
    fn lists_are_comma_joined_and_empty_lists_omitted() {
        let raw = RawParams::new()
            .with("concept_ids", vec![1_i64, 2, 3])
            .with("concept_names", Vec::<String>::new())
            .with("tags", vec!["  ", "龙头"]);
        let params = QueryNormalizer::default().normalize(&raw).expect("valid");

        assert_eq!(params.get("concept_ids"), Some(&text("1,2,3")));
        assert!(!params.contains_key("concept_names"));
        assert_eq!(params.get("tags"), Some(&text("龙头")));
    }

    #[test]
    fn non_finite_floats_are_absent() {
        let raw = RawParams::new().with("min_amount", f64::NAN);
        let params = QueryNormalizer::default().normalize(&raw).expect("valid");
        assert!(params.is_empty());
    }

    #[test]
    fn require_any_fails_without_dates() {
        let error = QueryNormalizer::new(DatePolicy::RequireAny)
            .normalize(&RawParams::new().with("page", 1))
            .expect_err("must fail");
        assert_eq!(error, ValidationError::MissingRequiredDate);
    }

    #[test]
    fn require_range_expands_single_date() {
        let params = QueryNormalizer::new(DatePolicy::RequireRange)
            .normalize(&RawParams::new().with("date", "2024-05-10").with("limit", 20))
            .expect("valid");

        let expected: QueryParameterSet = [
            ("start_date", text("2024-05-10")),
            ("end_date", text("2024-05-10")),
        ]
        .into_iter()
        .collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn require_range_rejects_missing_dates() {
        let error = QueryNormalizer::new(DatePolicy::RequireRange)
            .normalize(&RawParams::new().with("start_date", "2024-05-01"))
            .expect_err("half range without date must fail");
        assert_eq!(error, ValidationError::MissingRequiredDate);
    }

    #[test]
    fn range_or_default_falls_back_to_given_date() {
        let today = TradeDate::parse("2024-05-10").expect("valid date");
        let params = QueryNormalizer::new(DatePolicy::RangeOrDefault(today))
            .normalize(&RawParams::new())
            .expect("valid");

        assert_eq!(params.get("start_date"), Some(&text("2024-05-10")));
        assert_eq!(params.get("end_date"), Some(&text("2024-05-10")));
    }

    #[test]
    fn range_or_today_resolves_the_date_per_call() {
        let normalizer = QueryNormalizer::new(DatePolicy::RangeOrToday);

        let before = TradeDate::today();
        let params = normalizer.normalize(&RawParams::new()).expect("valid");
        let after = TradeDate::today();

        let start = params.get("start_date").expect("start bound");
        assert!(
            [text(&before.format()), text(&after.format())].contains(start),
            "fallback {start:?} is the current date"
        );
        assert_eq!(params.get("end_date"), Some(start));
    }

    #[test]
    fn range_or_today_prefers_supplied_dates() {
        let params = QueryNormalizer::new(DatePolicy::RangeOrToday)
            .normalize(&RawParams::new().with("date", "2024-05-10"))
            .expect("valid");

        assert_eq!(params.get("start_date"), Some(&text("2024-05-10")));
        assert_eq!(params.get("end_date"), Some(&text("2024-05-10")));
    }

    #[test]
    fn whitelist_drops_unknown_keys_but_keeps_date_selectors() {
        let normalizer =
            QueryNormalizer::default().with_allowed_keys(["concept", "page", "page_size"]);
        let raw = RawParams::new()
            .with("date", "2024-05-10")
            .with("limit", 100)
            .with("concept", "算力")
            .with("stock_code", "600000");
        let params = normalizer.normalize(&raw).expect("valid");

        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["concept", "date", "limit"]);
    }
}
