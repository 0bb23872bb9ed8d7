use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TradeDate;

/// Per-stock fund flow row for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundFlowItem {
    pub id: i64,
    pub date: TradeDate,
    pub stock_code: String,
    pub stock_name: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub turnover_rate: Option<f64>,
    #[serde(default)]
    pub main_inflow: Option<f64>,
    #[serde(default)]
    pub main_outflow: Option<f64>,
    #[serde(default)]
    pub main_net_inflow: Option<f64>,
    #[serde(default)]
    pub turnover_amount: Option<f64>,
    #[serde(default)]
    pub is_limit_up: Option<bool>,
    #[serde(default)]
    pub is_lhb: Option<bool>,
}

/// Aggregated capital flow of a thematic concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptFundFlowItem {
    pub concept: String,
    #[serde(default)]
    pub date: Option<TradeDate>,
    #[serde(default)]
    pub index_value: Option<f64>,
    #[serde(default)]
    pub index_change_percent: Option<f64>,
    #[serde(default)]
    pub inflow: Option<f64>,
    #[serde(default)]
    pub outflow: Option<f64>,
    #[serde(default)]
    pub net_amount: Option<f64>,
    #[serde(default)]
    pub stock_count: Option<u32>,
    #[serde(default)]
    pub leader_stock: Option<String>,
    #[serde(default)]
    pub leader_change_percent: Option<f64>,
    #[serde(default)]
    pub leader_price: Option<f64>,
}

/// Aggregated capital flow of an industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryFundFlowItem {
    pub id: i64,
    pub date: TradeDate,
    pub industry: String,
    #[serde(default)]
    pub index_value: Option<f64>,
    #[serde(default)]
    pub index_change_percent: Option<f64>,
    #[serde(default)]
    pub inflow: Option<f64>,
    #[serde(default)]
    pub outflow: Option<f64>,
    #[serde(default)]
    pub net_amount: Option<f64>,
    #[serde(default)]
    pub stock_count: Option<u32>,
    #[serde(default)]
    pub leader_stock: Option<String>,
    #[serde(default)]
    pub leader_change_percent: Option<f64>,
    #[serde(default)]
    pub leader_price: Option<f64>,
}

/// Concept board. Pool rows embed the short form; the concept catalog
/// also fills in the description and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConcept {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Row of the limit-up or limit-down pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZtPoolItem {
    pub id: i64,
    pub date: TradeDate,
    pub stock_code: String,
    pub stock_name: String,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub latest_price: Option<f64>,
    #[serde(default)]
    pub turnover_amount: Option<f64>,
    #[serde(default)]
    pub circulation_market_value: Option<f64>,
    #[serde(default)]
    pub total_market_value: Option<f64>,
    #[serde(default)]
    pub turnover_rate: Option<f64>,
    #[serde(default)]
    pub limit_up_capital: Option<f64>,
    #[serde(default)]
    pub first_limit_time: Option<String>,
    #[serde(default)]
    pub last_limit_time: Option<String>,
    #[serde(default)]
    pub explosion_count: Option<u32>,
    #[serde(default)]
    pub limit_up_statistics: Option<String>,
    #[serde(default)]
    pub consecutive_limit_count: Option<u32>,
    #[serde(default)]
    pub industry: Option<String>,
    /// Legacy free-text concept; prefer `concepts`.
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub concepts: Vec<StockConcept>,
    #[serde(default)]
    pub limit_up_reason: Option<String>,
    #[serde(default)]
    pub is_lhb: Option<bool>,
    /// Only populated for date-range queries.
    #[serde(default)]
    pub limit_up_count: Option<u32>,
}

/// Editable fields of a pool row. Absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZtPoolUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_up_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZtPoolAnalysis {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub industry_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub concept_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub reason_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub consecutive_limit_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LhbInstitution {
    pub id: i64,
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub buy_amount: Option<f64>,
    #[serde(default)]
    pub sell_amount: Option<f64>,
    #[serde(default)]
    pub net_buy_amount: Option<f64>,
    #[serde(default)]
    pub flag: Option<String>,
}

/// Dragon-tiger board disclosure row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LhbItem {
    pub id: i64,
    pub date: TradeDate,
    pub stock_code: String,
    pub stock_name: String,
    #[serde(default)]
    pub close_price: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub net_buy_amount: Option<f64>,
    #[serde(default)]
    pub buy_amount: Option<f64>,
    #[serde(default)]
    pub sell_amount: Option<f64>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub turnover_rate: Option<f64>,
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub institutions_summary: Option<String>,
    #[serde(default)]
    pub institutions: Vec<LhbInstitution>,
}

/// One institution seat's trade on a disclosed stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionActivity {
    pub id: i64,
    pub date: TradeDate,
    pub stock_code: String,
    #[serde(default)]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub institution_name: Option<String>,
    /// `买入` or `卖出`.
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub buy_amount: Option<f64>,
    #[serde(default)]
    pub sell_amount: Option<f64>,
    #[serde(default)]
    pub net_buy_amount: Option<f64>,
}

/// Daily institution trading statistics for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionTradingStat {
    pub id: i64,
    pub date: TradeDate,
    pub stock_code: String,
    pub stock_name: String,
    #[serde(default)]
    pub close_price: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub buyer_institution_count: Option<u32>,
    #[serde(default)]
    pub seller_institution_count: Option<u32>,
    #[serde(default)]
    pub institution_buy_amount: Option<f64>,
    #[serde(default)]
    pub institution_sell_amount: Option<f64>,
    #[serde(default)]
    pub institution_net_buy_amount: Option<f64>,
    #[serde(default)]
    pub market_total_amount: Option<f64>,
    #[serde(default)]
    pub net_buy_ratio: Option<f64>,
    #[serde(default)]
    pub turnover_rate: Option<f64>,
    #[serde(default)]
    pub circulation_market_value: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Institution statistics of one stock summed over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionTradingAggregate {
    pub stock_code: String,
    pub stock_name: String,
    /// Sessions in the range on which the stock was listed.
    pub appear_count: u32,
    #[serde(default)]
    pub total_buy_amount: Option<f64>,
    #[serde(default)]
    pub total_sell_amount: Option<f64>,
    #[serde(default)]
    pub total_net_buy_amount: Option<f64>,
    #[serde(default)]
    pub total_market_amount: Option<f64>,
    #[serde(default)]
    pub net_buy_ratio: Option<f64>,
    #[serde(default)]
    pub avg_close_price: Option<f64>,
    #[serde(default)]
    pub avg_circulation_market_value: Option<f64>,
    #[serde(default)]
    pub avg_turnover_rate: Option<f64>,
    #[serde(default)]
    pub max_change_percent: Option<f64>,
    #[serde(default)]
    pub min_change_percent: Option<f64>,
    pub earliest_date: TradeDate,
    pub latest_date: TradeDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderBranch {
    pub id: i64,
    pub trader_id: i64,
    pub institution_name: String,
    #[serde(default)]
    pub institution_code: Option<String>,
}

/// Known hot-money trader and the brokerage branches they trade through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trader {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub aka: Option<String>,
    #[serde(default)]
    pub branches: Vec<TraderBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub id: i64,
    pub date: TradeDate,
    pub index_code: String,
    pub index_name: String,
    #[serde(default)]
    pub close_price: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
    /// Volume change against the previous session.
    #[serde(default)]
    pub volume_change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorItem {
    pub id: i64,
    pub date: TradeDate,
    pub sector_code: String,
    pub sector_name: String,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub rise_count: Option<u64>,
    #[serde(default)]
    pub fall_count: Option<u64>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    #[serde(rename = "买入")]
    Buy,
    #[serde(rename = "卖出")]
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStrategy {
    /// Buy on a pullback.
    #[serde(rename = "低吸")]
    Dip,
    /// Queue at the limit-up price.
    #[serde(rename = "排板")]
    LimitQueue,
}

/// Planned or executed trade recorded on the trading calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingCalendarEntry {
    pub id: i64,
    pub date: TradeDate,
    pub stock_name: String,
    pub direction: TradeDirection,
    pub strategy: TradeStrategy,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub is_executed: Option<bool>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTradingCalendarEntry {
    pub date: TradeDate,
    pub stock_name: String,
    pub direction: TradeDirection,
    pub strategy: TradeStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_executed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update; `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradingCalendarUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<TradeDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<TradeDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<TradeStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_executed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub success_count: Option<u64>,
    #[serde(default)]
    pub total_count: Option<u64>,
    /// Per-task detail, shaped by each task type.
    #[serde(default)]
    pub task_results: Option<serde_json::Value>,
}

/// One run of the backend's data synchronization jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecution {
    pub id: i64,
    pub task_name: String,
    pub task_type: String,
    pub status: TaskStatus,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// `manual` or `scheduled`.
    pub triggered_by: String,
    #[serde(default)]
    pub target_date: Option<String>,
    pub created_at: String,
}

/// Latest known state of one task type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusEntry {
    pub task_name: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub last_run_time: Option<String>,
    #[serde(default)]
    pub last_success_time: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Manual run request. Empty task types run every task; no date means the
/// latest session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskRunRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<TradeDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunResponse {
    pub execution_id: i64,
    pub message: String,
    #[serde(default)]
    pub task_types: Vec<String>,
}

/// Task types the backend can run, with their display names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCatalog {
    #[serde(default)]
    pub task_types: Vec<String>,
    #[serde(default)]
    pub task_names: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_item_tolerates_missing_optional_fields() {
        let item: ZtPoolItem = serde_json::from_str(
            r#"{"id":1,"date":"2024-05-10","stock_code":"600000","stock_name":"浦发银行"}"#,
        )
        .expect("minimal row should decode");

        assert_eq!(item.consecutive_limit_count, None);
        assert!(item.concepts.is_empty());
    }

    #[test]
    fn zero_amounts_are_kept_distinct_from_absent() {
        let item: FundFlowItem = serde_json::from_str(
            r#"{"id":7,"date":"2024-05-10","stock_code":"000001","stock_name":"平安银行","main_net_inflow":0}"#,
        )
        .expect("row should decode");

        assert_eq!(item.main_net_inflow, Some(0.0));
        assert_eq!(item.main_inflow, None);
    }

    #[test]
    fn calendar_update_omits_absent_fields() {
        let update = TradingCalendarUpdate {
            is_executed: Some(false),
            ..TradingCalendarUpdate::default()
        };

        let json = serde_json::to_string(&update).expect("serializable");
        assert_eq!(json, r#"{"is_executed":false}"#);
    }

    #[test]
    fn task_execution_decodes_lowercase_status_and_partial_result() {
        let execution: TaskExecution = serde_json::from_str(
            r#"{"id":3,"task_name":"龙虎榜同步","task_type":"lhb","status":"failed",
                "start_time":"2024-05-10T15:30:00","result":{"total_count":4},
                "error_message":"timeout","triggered_by":"scheduled",
                "created_at":"2024-05-10T15:30:00"}"#,
        )
        .expect("execution should decode");

        assert_eq!(execution.status, TaskStatus::Failed);
        let result = execution.result.expect("result present");
        assert_eq!(result.total_count, Some(4));
        assert_eq!(result.success_count, None);
        assert_eq!(execution.end_time, None);
    }

    #[test]
    fn run_request_sends_only_supplied_fields() {
        let request = TaskRunRequest {
            task_types: Some(vec![String::from("zt_pool")]),
            target_date: None,
        };

        let json = serde_json::to_string(&request).expect("serializable");
        assert_eq!(json, r#"{"task_types":["zt_pool"]}"#);
        assert_eq!(
            serde_json::to_string(&TaskRunRequest::default()).expect("serializable"),
            "{}"
        );
    }

    #[test]
    fn trade_direction_uses_exchange_labels() {
        let json = serde_json::to_string(&TradeDirection::Buy).expect("serializable");
        assert_eq!(json, "\"买入\"");
    }
}
