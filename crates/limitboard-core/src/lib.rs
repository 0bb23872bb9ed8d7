//! Core client library for limitboard.
//!
//! This crate contains:
//! - Query composition: parameter normalization, multi-condition filters and
//!   response reconciliation
//! - Per-view query state with stale-response protection
//! - REST transport boundary and typed endpoint clients
//! - Dashboard aggregation, watchlist persistence and display helpers

pub mod api_client;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod endpoints;
pub mod error;
pub mod format;
pub mod http_client;
pub mod index_filter;
pub mod logging;
pub mod query;
pub mod store;
pub mod watchlist;

pub use api_client::{ApiClient, ApiError, CredentialStore};
pub use config::ClientConfig;
pub use dashboard::{Dashboard, DashboardSummary, SectorStats};
pub use domain::{
    ConceptFundFlowItem, FundFlowItem, IndexSnapshot, IndustryFundFlowItem, InstitutionActivity,
    InstitutionTradingAggregate, InstitutionTradingStat, LhbInstitution, LhbItem,
    NewTradingCalendarEntry, SectorItem, StockConcept, TaskCatalog, TaskExecution, TaskResult,
    TaskRunRequest, TaskRunResponse, TaskStatus, TaskStatusEntry, TradeDate, TradeDirection,
    TradeStrategy, Trader, TraderBranch, TradingCalendarEntry, TradingCalendarUpdate,
    ZtPoolAnalysis, ZtPoolItem, ZtPoolUpdate,
};
pub use endpoints::{
    EndpointSource, FundFlowApi, InstitutionTradingApi, LhbApi, MarketApi, PoolDirection,
    StockConceptApi, TaskApi, TraderApi, TradingCalendarApi, ZtPoolApi,
};
pub use error::{CoreError, ValidationError};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};
pub use logging::{init_logging, LogFormat};
pub use query::{
    reconcile, ConditionDraft, DatePolicy, DateRange, EntityScope, FilterCondition, FilterRequest,
    FilterRequestBuilder, FilterResultItem, FilterTarget, NumericRange, PaginatedResult,
    ParamValue, QueryNormalizer, QueryParameterSet, QueryResult, RawParams, RawValue, SortOrder,
};
pub use store::{PageSource, Pagination, QueryState, QueryStore};
pub use watchlist::Watchlist;
