//! # Query Composition
//!
//! Everything between a caller's loose parameter bag and a canonical page
//! of results.
//!
//! | Stage | Entry point |
//! |-------|-------------|
//! | Normalize GET parameters | [`QueryNormalizer::normalize`] |
//! | Build a multi-condition filter | [`FilterRequestBuilder::build`] |
//! | Collapse response shapes | [`reconcile`] |

mod filter;
mod normalizer;
mod params;
mod reconcile;

pub use filter::{
    metrics, ConditionDraft, DateRange, EntityKey, EntityScope, FilterCondition, FilterRequest,
    FilterRequestBuilder, FilterResultItem, FilterTarget, MatchedCondition, MatchedRecord,
    NumericRange, SortOrder, DEFAULT_FILTER_PAGE_SIZE,
};
pub use normalizer::{keys, DatePolicy, QueryNormalizer};
pub use params::{ParamValue, QueryParameterSet, RawParams, RawValue};
pub use reconcile::{reconcile, PageEnvelope, PaginatedResult, QueryResult, DEFAULT_PAGE_SIZE};
