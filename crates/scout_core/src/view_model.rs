use crate::{
    analyze, ComponentState, EngineState, ItemId, LoopMode, StateBucket, StockWaitMode,
    StopReason,
};

/// How many missing ids are offered as links before collapsing into a count.
pub const MISSING_LINK_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineViewModel {
    pub mode: LoopMode,
    pub stock_wait: StockWaitMode,
    pub stop_reason: Option<StopReason>,
    pub on_product_page: bool,
    pub toggle_enabled: bool,
    pub product_page_link: String,
    pub records: Vec<RecordRow>,
    pub total_records: usize,
    pub range: Option<RangeSummary>,
    pub last_payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub id: ItemId,
    pub numeric: Option<u32>,
    pub count: u32,
    pub components: Vec<(ComponentState, StateBucket)>,
    pub is_recent: bool,
    pub age_label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSummary {
    pub low: u32,
    pub high: u32,
    pub total_range: u32,
    pub discovered_count: u32,
    pub missing_count: usize,
    /// `(numeric, url)` for the first `MISSING_LINK_LIMIT` gaps.
    pub missing_links: Vec<(u32, String)>,
    pub more_missing: usize,
}

impl EngineViewModel {
    pub(crate) fn build(state: &EngineState, now_ms: u64) -> Self {
        let profile = state.profile();
        let current_url = state.current_url();
        let on_product_page = state.on_product_page();

        let mut records: Vec<RecordRow> = state
            .ledger()
            .iter()
            .map(|(id, record)| RecordRow {
                id: id.clone(),
                numeric: id.numeric(),
                count: record.count,
                components: record
                    .component_states
                    .iter()
                    .map(|s| (*s, s.bucket()))
                    .collect(),
                is_recent: state.last_discovered() == Some(id),
                age_label: age_label(now_ms.saturating_sub(record.first_discovered)),
                url: profile.candidate_url(current_url, id),
            })
            .collect();
        // Highest segment first; ids outside the pattern sort by reverse string order.
        records.sort_by(|a, b| match (a.numeric, b.numeric) {
            (Some(x), Some(y)) => y.cmp(&x),
            _ => b.id.cmp(&a.id),
        });

        let range = analyze(state.ledger()).map(|report| {
            let missing_count = report.missing.len();
            let missing_links = report
                .missing
                .iter()
                .take(MISSING_LINK_LIMIT)
                .map(|m| (m.numeric, profile.candidate_url(current_url, &m.id)))
                .collect();
            RangeSummary {
                low: report.low,
                high: report.high,
                total_range: report.total_range,
                discovered_count: report.discovered_count,
                missing_count,
                missing_links,
                more_missing: missing_count.saturating_sub(MISSING_LINK_LIMIT),
            }
        });

        Self {
            mode: state.mode(),
            stock_wait: state.stock_wait(),
            stop_reason: state.stop_reason(),
            on_product_page,
            toggle_enabled: state.mode() != LoopMode::Idle || on_product_page,
            product_page_link: profile.product_page_link(current_url),
            total_records: records.len(),
            records,
            range,
            last_payload: state.last_payload().map(str::to_string),
        }
    }

    pub fn all_discovered(&self) -> bool {
        self.range
            .as_ref()
            .is_some_and(|range| range.missing_count == 0)
    }
}

fn age_label(elapsed_ms: u64) -> String {
    const MINUTE: u64 = 60 * 1000;
    const HOUR: u64 = 60 * MINUTE;
    let hours = elapsed_ms / HOUR;
    let minutes = (elapsed_ms % HOUR) / MINUTE;
    if hours > 0 {
        format!("{hours}h ago")
    } else if minutes > 0 {
        format!("{minutes}m ago")
    } else {
        "Just now".to_string()
    }
}
