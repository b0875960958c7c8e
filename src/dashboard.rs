use tracing::info;

use crate::error::ReportError;
use crate::metrics;
use crate::models::MetricReport;
use crate::period::{self, PeriodFilter};
use crate::sfmc::SfmcClient;

/// Everything the presentation layer needs for one request.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub periods: Vec<PeriodFilter>,
    pub selected: PeriodFilter,
    pub report: MetricReport,
}

/// Authenticates, fetches the Data Extension and aggregates the selected
/// period. The period list always comes from the unfiltered rows.
pub async fn load(client: &SfmcClient, selected: &PeriodFilter) -> Result<Dashboard, ReportError> {
    let token = client.get_access_token().await?;
    let records = client.get_rows(&token).await?;

    let periods = period::available_periods(&records);
    let filtered = period::filter(&records, selected);
    let report = metrics::aggregate(&filtered);

    info!(
        period = %selected,
        records = report.record_count,
        "metrics aggregated"
    );

    Ok(Dashboard {
        periods,
        selected: selected.clone(),
        report,
    })
}
