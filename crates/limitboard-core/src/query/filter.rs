//! Multi-condition fund-flow filters evaluated server-side.
//!
//! Each condition pairs a date window with bounds on named metrics. The
//! server evaluates every condition on its own window and keeps entities
//! satisfying all of them; results point back at conditions by index, so
//! condition order is part of the contract.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::{TradeDate, ValidationError};

/// Optional date window. Both bounds absent means "unset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<TradeDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<TradeDate>,
}

impl DateRange {
    pub const fn new(start: Option<TradeDate>, end: Option<TradeDate>) -> Self {
        Self { start, end }
    }

    pub const fn between(start: TradeDate, end: TradeDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub const fn is_unset(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: TradeDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Inclusive bounds on a metric. An absent side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumericRange {
    pub const fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub const fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub const fn at_most(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    pub const fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Well-known metric names accepted by the filter endpoints.
pub mod metrics {
    pub const MAIN_NET_INFLOW: &str = "main_net_inflow";
    pub const LIMIT_UP_COUNT: &str = "limit_up_count";
    pub const NET_AMOUNT: &str = "net_amount";
    pub const INFLOW: &str = "inflow";
    pub const OUTFLOW: &str = "outflow";
    pub const INDEX_CHANGE_PERCENT: &str = "index_change_percent";
    pub const STOCK_COUNT: &str = "stock_count";
}

/// One row of a multi-row filter as entered by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionDraft {
    pub date_range: DateRange,
    pub metric_ranges: BTreeMap<String, NumericRange>,
}

impl ConditionDraft {
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            metric_ranges: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>, range: NumericRange) -> Self {
        self.metric_ranges.insert(metric.into(), range);
        self
    }
}

/// Condition as transmitted: unset windows and unbounded metrics removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(flatten)]
    pub metric_ranges: BTreeMap<String, NumericRange>,
}

impl From<ConditionDraft> for FilterCondition {
    fn from(draft: ConditionDraft) -> Self {
        let date_range = (!draft.date_range.is_unset()).then_some(draft.date_range);
        let metric_ranges = draft
            .metric_ranges
            .into_iter()
            .filter(|(_, range)| !range.is_unbounded())
            .collect();

        Self {
            date_range,
            metric_ranges,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Accepts exactly `asc` or `desc`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities the filter is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EntityScope {
    #[default]
    All,
    Ids(Vec<i64>),
    Names(Vec<String>),
}

impl EntityScope {
    /// Identifiers take precedence over names; the two are never merged.
    pub fn resolve(ids: Vec<i64>, names: Vec<String>) -> Self {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .collect();

        if !ids.is_empty() {
            if !names.is_empty() {
                debug!(
                    ids = ids.len(),
                    names = names.len(),
                    "entity identifiers supplied; ignoring names"
                );
            }
            Self::Ids(ids)
        } else if !names.is_empty() {
            Self::Names(names)
        } else {
            Self::All
        }
    }
}

/// Which history a filter runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterTarget {
    /// Per-stock fund flow joined with limit-up history.
    Stocks,
    /// Per-concept fund flow.
    Concepts,
}

impl FilterTarget {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Stocks => "/stock-fund-flow/filter",
            Self::Concepts => "/stock-fund-flow/concept/filter",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stocks => "stock",
            Self::Concepts => "concept",
        }
    }

    /// Every stock condition must carry a date window.
    pub const fn requires_date_range(self) -> bool {
        matches!(self, Self::Stocks)
    }

    /// Concept filters only scope by (fuzzy) name.
    pub const fn accepts_entity_ids(self) -> bool {
        matches!(self, Self::Stocks)
    }

    pub const fn max_page_size(self) -> u32 {
        match self {
            Self::Stocks => 100,
            Self::Concepts => 200,
        }
    }

    const fn names_field(self) -> &'static str {
        match self {
            Self::Stocks => "concept_names",
            Self::Concepts => "concepts",
        }
    }
}

pub const DEFAULT_FILTER_PAGE_SIZE: u32 = 20;

/// Validated filter request. Only obtainable through [`FilterRequestBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    target: FilterTarget,
    conditions: Vec<FilterCondition>,
    entity_scope: EntityScope,
    page: u32,
    page_size: u32,
    sort_by: Option<String>,
    order: SortOrder,
}

impl FilterRequest {
    pub fn builder(target: FilterTarget) -> FilterRequestBuilder {
        FilterRequestBuilder::new(target)
    }

    pub const fn target(&self) -> FilterTarget {
        self.target
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub const fn entity_scope(&self) -> &EntityScope {
        &self.entity_scope
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub const fn order(&self) -> SortOrder {
        self.order
    }
}

impl Serialize for FilterRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("conditions", &self.conditions)?;
        match &self.entity_scope {
            EntityScope::All => {}
            EntityScope::Ids(ids) => map.serialize_entry("concept_ids", ids)?,
            EntityScope::Names(names) => {
                map.serialize_entry(self.target.names_field(), names)?;
            }
        }
        map.serialize_entry("page", &self.page)?;
        map.serialize_entry("page_size", &self.page_size)?;
        if let Some(sort_by) = &self.sort_by {
            map.serialize_entry("sort_by", sort_by)?;
        }
        map.serialize_entry("order", &self.order)?;
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct FilterRequestBuilder {
    target: FilterTarget,
    drafts: Vec<ConditionDraft>,
    entity_ids: Vec<i64>,
    entity_names: Vec<String>,
    page: u32,
    page_size: u32,
    sort_by: Option<String>,
    order: SortOrder,
}

impl FilterRequestBuilder {
    pub fn new(target: FilterTarget) -> Self {
        Self {
            target,
            drafts: Vec::new(),
            entity_ids: Vec::new(),
            entity_names: Vec::new(),
            page: 1,
            page_size: DEFAULT_FILTER_PAGE_SIZE,
            sort_by: None,
            order: SortOrder::Desc,
        }
    }

    pub fn condition(mut self, draft: ConditionDraft) -> Self {
        self.drafts.push(draft);
        self
    }

    pub fn conditions(mut self, drafts: impl IntoIterator<Item = ConditionDraft>) -> Self {
        self.drafts.extend(drafts);
        self
    }

    pub fn entity_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.entity_ids.extend(ids);
        self
    }

    pub fn entity_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.entity_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn build(self) -> Result<FilterRequest, ValidationError> {
        if self.drafts.is_empty() {
            return Err(ValidationError::EmptyConditionSet);
        }
        if self.target.requires_date_range() {
            if let Some(index) = self
                .drafts
                .iter()
                .position(|draft| draft.date_range.is_unset())
            {
                return Err(ValidationError::MissingConditionDateRange { index });
            }
        }
        if !self.target.accepts_entity_ids() && !self.entity_ids.is_empty() {
            return Err(ValidationError::EntityIdsUnsupported {
                target: self.target.as_str(),
            });
        }
        if self.page == 0 {
            return Err(ValidationError::InvalidPage { page: self.page });
        }
        let max = self.target.max_page_size();
        if self.page_size == 0 || self.page_size > max {
            return Err(ValidationError::PageSizeOutOfRange {
                page_size: self.page_size,
                max,
            });
        }

        let sort_by = self
            .sort_by
            .map(|field| field.trim().to_owned())
            .filter(|field| !field.is_empty());

        Ok(FilterRequest {
            target: self.target,
            conditions: self.drafts.into_iter().map(FilterCondition::from).collect(),
            entity_scope: EntityScope::resolve(self.entity_ids, self.entity_names),
            page: self.page,
            page_size: self.page_size,
            sort_by,
            order: self.order,
        })
    }
}

/// Identity of a matched stock or concept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityKey {
    #[serde(default, alias = "stock_code", alias = "concept_code")]
    pub code: String,
    #[serde(alias = "stock_name", alias = "concept")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRecord {
    pub date: TradeDate,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedCondition {
    pub condition_index: usize,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub matched_count: u32,
    #[serde(default)]
    pub matched_records: Vec<MatchedRecord>,
}

/// One entity that satisfied every condition of a [`FilterRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResultItem {
    #[serde(flatten)]
    pub entity: EntityKey,
    #[serde(default, alias = "match_conditions")]
    pub matched_conditions: Vec<MatchedCondition>,
    #[serde(default)]
    pub latest_date: Option<TradeDate>,
    #[serde(default, alias = "latest_main_net_inflow", alias = "latest_net_amount")]
    pub latest_value: Option<f64>,
}

impl FilterResultItem {
    /// Checks that matched conditions reference the originating request:
    /// at most `condition_count` of them, 0-based, strictly increasing.
    pub fn check_matches(&self, condition_count: usize) -> Result<(), ValidationError> {
        if self.matched_conditions.len() > condition_count {
            return Err(ValidationError::TooManyMatchedConditions {
                matched: self.matched_conditions.len(),
                count: condition_count,
            });
        }

        let mut previous: Option<usize> = None;
        for matched in &self.matched_conditions {
            let index = matched.condition_index;
            let ordered = previous.is_none_or(|prev| index > prev);
            if !ordered || index >= condition_count {
                return Err(ValidationError::MatchedConditionIndex {
                    index,
                    count: condition_count,
                });
            }
            previous = Some(index);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> TradeDate {
        TradeDate::parse(value).expect("valid date")
    }

    #[test]
    fn empty_condition_set_is_rejected() {
        let error = FilterRequest::builder(FilterTarget::Concepts)
            .build()
            .expect_err("must fail");
        assert_eq!(error, ValidationError::EmptyConditionSet);
    }

    #[test]
    fn unbounded_metrics_and_unset_ranges_are_stripped() {
        let request = FilterRequest::builder(FilterTarget::Concepts)
            .condition(
                ConditionDraft::new(DateRange::default())
                    .with_metric(metrics::MAIN_NET_INFLOW, NumericRange::at_least(1e8))
                    .with_metric(metrics::LIMIT_UP_COUNT, NumericRange::default()),
            )
            .build()
            .expect("valid");

        let condition = &request.conditions()[0];
        assert_eq!(condition.date_range, None);
        assert_eq!(condition.metric_ranges.len(), 1);
        assert!(condition.metric_ranges.contains_key(metrics::MAIN_NET_INFLOW));
    }

    #[test]
    fn condition_order_is_preserved() {
        let first = DateRange::between(date("2024-05-01"), date("2024-05-05"));
        let second = DateRange::between(date("2024-04-01"), date("2024-04-30"));
        let request = FilterRequest::builder(FilterTarget::Stocks)
            .condition(ConditionDraft::new(first))
            .condition(ConditionDraft::new(second))
            .build()
            .expect("valid");

        assert_eq!(request.conditions()[0].date_range, Some(first));
        assert_eq!(request.conditions()[1].date_range, Some(second));
    }

    #[test]
    fn identifiers_take_precedence_over_names() {
        let request = FilterRequest::builder(FilterTarget::Stocks)
            .condition(ConditionDraft::new(DateRange::new(Some(date("2024-05-01")), None)))
            .entity_ids([3, 9])
            .entity_names(["人工智能"])
            .build()
            .expect("valid");

        assert_eq!(request.entity_scope(), &EntityScope::Ids(vec![3, 9]));
    }

    #[test]
    fn page_size_is_bounded_per_target() {
        let error = FilterRequest::builder(FilterTarget::Stocks)
            .condition(ConditionDraft::new(DateRange::new(Some(date("2024-05-01")), None)))
            .page_size(150)
            .build()
            .expect_err("stocks cap at 100");
        assert_eq!(
            error,
            ValidationError::PageSizeOutOfRange {
                page_size: 150,
                max: 100
            }
        );

        FilterRequest::builder(FilterTarget::Concepts)
            .condition(ConditionDraft::default())
            .page_size(150)
            .build()
            .expect("concepts allow up to 200");
    }

    #[test]
    fn stock_conditions_without_a_date_range_are_rejected() {
        let error = FilterRequest::builder(FilterTarget::Stocks)
            .condition(ConditionDraft::new(DateRange::between(
                date("2024-05-01"),
                date("2024-05-10"),
            )))
            .condition(
                ConditionDraft::default()
                    .with_metric(metrics::MAIN_NET_INFLOW, NumericRange::at_least(1e8)),
            )
            .build()
            .expect_err("second condition has no window");

        assert_eq!(error, ValidationError::MissingConditionDateRange { index: 1 });
    }

    #[test]
    fn concept_filters_reject_identifiers() {
        let error = FilterRequest::builder(FilterTarget::Concepts)
            .condition(ConditionDraft::default())
            .entity_ids([3, 9])
            .entity_names(["人工智能"])
            .build()
            .expect_err("concepts scope by name only");

        assert_eq!(
            error,
            ValidationError::EntityIdsUnsupported { target: "concept" }
        );
    }

    #[test]
    fn concept_body_never_carries_identifier_keys() {
        let request = FilterRequest::builder(FilterTarget::Concepts)
            .condition(ConditionDraft::default())
            .entity_names(["算力"])
            .build()
            .expect("valid");

        let json = serde_json::to_value(&request).expect("serializable");
        let body = json.as_object().expect("object body");
        assert!(!body.contains_key("concept_ids"));
        assert!(!body.contains_key("concept_names"));
        assert_eq!(body["concepts"], serde_json::json!(["算力"]));
    }

    #[test]
    fn zero_page_is_rejected() {
        let error = FilterRequest::builder(FilterTarget::Concepts)
            .condition(ConditionDraft::default())
            .page(0)
            .build()
            .expect_err("must fail");
        assert_eq!(error, ValidationError::InvalidPage { page: 0 });
    }

    #[test]
    fn concept_request_serializes_names_as_concepts() {
        let request = FilterRequest::builder(FilterTarget::Concepts)
            .condition(
                ConditionDraft::new(DateRange::new(Some(date("2024-05-01")), None))
                    .with_metric(metrics::NET_AMOUNT, NumericRange::between(0.0, 5e8)),
            )
            .entity_names(["  算力 ", ""])
            .sort_by("net_amount")
            .build()
            .expect("valid");

        let json = serde_json::to_value(&request).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({
                "conditions": [{
                    "date_range": {"start": "2024-05-01"},
                    "net_amount": {"min": 0.0, "max": 500000000.0}
                }],
                "concepts": ["算力"],
                "page": 1,
                "page_size": 20,
                "sort_by": "net_amount",
                "order": "desc"
            })
        );
    }

    #[test]
    fn result_item_decodes_server_field_names() {
        let item: FilterResultItem = serde_json::from_value(serde_json::json!({
            "stock_code": "600000",
            "stock_name": "浦发银行",
            "match_conditions": [{
                "condition_index": 0,
                "date_range": {"start": "2024-05-01", "end": "2024-05-10"},
                "matched_count": 2,
                "matched_records": [{"date": "2024-05-06", "value": 120000000.0}]
            }],
            "latest_date": "2024-05-10",
            "latest_main_net_inflow": 0.0
        }))
        .expect("decodes");

        assert_eq!(item.entity.code, "600000");
        assert_eq!(item.matched_conditions[0].matched_records.len(), 1);
        assert_eq!(item.latest_value, Some(0.0));
        item.check_matches(1).expect("consistent with one condition");
    }

    #[test]
    fn out_of_order_matches_are_rejected() {
        let matched = |index| MatchedCondition {
            condition_index: index,
            date_range: DateRange::default(),
            matched_count: 1,
            matched_records: Vec::new(),
        };
        let item = FilterResultItem {
            entity: EntityKey::default(),
            matched_conditions: vec![matched(1), matched(0)],
            latest_date: None,
            latest_value: None,
        };

        assert_eq!(
            item.check_matches(2),
            Err(ValidationError::MatchedConditionIndex { index: 0, count: 2 })
        );
        assert_eq!(
            item.check_matches(1),
            Err(ValidationError::TooManyMatchedConditions {
                matched: 2,
                count: 1
            })
        );
    }

    #[test]
    fn ranges_are_inclusive() {
        assert!(NumericRange::between(1.0, 5.0).contains(5.0));
        assert!(!NumericRange::at_least(1.0).contains(0.0));
        let window = DateRange::new(None, Some(date("2024-05-10")));
        assert!(window.contains(date("2024-05-10")));
        assert!(!window.contains(date("2024-05-11")));
    }
}
