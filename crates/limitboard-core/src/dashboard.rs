//! Best-effort dashboard summary.
//!
//! Four independent sources are fetched concurrently. A failing source
//! contributes its default (empty list or zero) and never fails the summary.

use serde::Serialize;
use tracing::{debug, warn};

use crate::api_client::ApiClient;
use crate::endpoints::{LhbApi, MarketApi, ZtPoolApi};
use crate::query::{keys, RawParams};
use crate::{CoreError, IndexSnapshot, SectorItem, TradeDate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectorStats {
    pub rise_count: u64,
    pub fall_count: u64,
    pub total_count: u64,
}

impl SectorStats {
    /// Sums breadth over sectors; absent counts add nothing. Sums saturate.
    pub fn from_sectors(sectors: &[SectorItem]) -> Self {
        sectors.iter().fold(Self::default(), |stats, sector| Self {
            rise_count: stats.rise_count.saturating_add(sector.rise_count.unwrap_or(0)),
            fall_count: stats.fall_count.saturating_add(sector.fall_count.unwrap_or(0)),
            total_count: stats.total_count.saturating_add(sector.total_count.unwrap_or(0)),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub index_data: Vec<IndexSnapshot>,
    pub lhb_count: u64,
    pub zt_pool_count: u64,
    pub sector_stats: SectorStats,
}

#[derive(Clone)]
pub struct Dashboard {
    market: MarketApi,
    lhb: LhbApi,
    zt_pool: ZtPoolApi,
}

impl Dashboard {
    pub fn new(client: ApiClient) -> Self {
        Self {
            market: MarketApi::new(client.clone()),
            lhb: LhbApi::new(client.clone()),
            zt_pool: ZtPoolApi::new(client),
        }
    }

    /// Summary for `date`. An unparseable date yields the all-default summary.
    pub async fn summary(&self, date: &str) -> DashboardSummary {
        match TradeDate::parse(date) {
            Ok(date) => self.summary_for(date).await,
            Err(error) => {
                warn!(error = %error, "invalid dashboard date; returning empty summary");
                DashboardSummary::default()
            }
        }
    }

    pub async fn summary_for(&self, date: TradeDate) -> DashboardSummary {
        let by_date = RawParams::new().with(keys::DATE, date.format());
        let first_row = by_date
            .clone()
            .with(keys::PAGE, 1)
            .with(keys::PAGE_SIZE, 1);

        let (indices, lhb, zt_pool, sectors) = tokio::join!(
            self.market.indices(&by_date),
            async { self.lhb.list(&first_row).await.map(|page| page.total) },
            async { self.zt_pool.limit_up(&first_row).await.map(|page| page.total) },
            self.market.sectors(&by_date),
        );

        let summary = DashboardSummary {
            index_data: settle("index", indices),
            lhb_count: settle("lhb", lhb),
            zt_pool_count: settle("zt_pool", zt_pool),
            sector_stats: SectorStats::from_sectors(&settle("sector", sectors)),
        };
        debug!(
            %date,
            indices = summary.index_data.len(),
            lhb_count = summary.lhb_count,
            zt_pool_count = summary.zt_pool_count,
            "dashboard summary assembled"
        );
        summary
    }
}

fn settle<T: Default>(source: &'static str, result: Result<T, CoreError>) -> T {
    result.unwrap_or_else(|error| {
        warn!(source, error = %error, "dashboard source failed; using default");
        T::default()
    })
}
