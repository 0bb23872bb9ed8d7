//! # Domain Models
//!
//! Wire records served by the market surveillance backend.
//!
//! Optional metrics are modelled as `Option` so an absent value is never
//! confused with a reported zero.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TradeDate`] | Exchange session date (`YYYY-MM-DD`) |
//! | [`FundFlowItem`] | Per-stock fund flow |
//! | [`ConceptFundFlowItem`] | Concept fund flow |
//! | [`IndustryFundFlowItem`] | Industry fund flow |
//! | [`ZtPoolItem`] | Limit-up / limit-down pool row |
//! | [`LhbItem`] | Dragon-tiger board row |
//! | [`InstitutionActivity`] | Institution seat trade on a listed stock |
//! | [`InstitutionTradingStat`] | Daily institution statistics per stock |
//! | [`Trader`] | Hot-money trader and their branches |
//! | [`StockConcept`] | Concept board catalog entry |
//! | [`TaskExecution`] | Synchronization job run |
//! | [`IndexSnapshot`] | Index daily snapshot |
//! | [`SectorItem`] | Sector breadth snapshot |
//! | [`TradingCalendarEntry`] | Trading calendar record |

mod models;
mod trade_date;

pub use models::{
    ConceptFundFlowItem, FundFlowItem, IndexSnapshot, IndustryFundFlowItem, InstitutionActivity,
    InstitutionTradingAggregate, InstitutionTradingStat, LhbInstitution, LhbItem,
    NewTradingCalendarEntry, SectorItem, StockConcept, TaskCatalog, TaskExecution, TaskResult,
    TaskRunRequest, TaskRunResponse, TaskStatus, TaskStatusEntry, TradeDirection, TradeStrategy,
    Trader, TraderBranch, TradingCalendarEntry, TradingCalendarUpdate, ZtPoolAnalysis, ZtPoolItem,
    ZtPoolUpdate,
};
pub use trade_date::TradeDate;
