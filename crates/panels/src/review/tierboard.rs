use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{grade_number, Tier, UserId},
    protocol::Embed,
};
use storage::{Storage, TierboardFilter, TierboardRow};

use crate::{
    error::PanelResult,
    handler::Panel,
    page_source::{PageSource, Pages},
    session::{PanelOptions, PanelSession},
    transport::MessageTransport,
};

pub const TIERBOARD_PAGE_LEN: usize = 10;

/// Subjects ranked by average review tier, queried one page at a time.
pub struct TierboardSource {
    storage: Storage,
    filter: TierboardFilter,
    total: usize,
    header: Embed,
}

impl TierboardSource {
    pub async fn new(storage: Storage, filter: TierboardFilter) -> Result<Self> {
        let total = storage.tierboard_count(&filter).await?;
        let mut header = Embed::new("Tierboard").with_timestamp(Utc::now());
        header.add_field("Type", filter.kind.clone(), true);
        header.add_field("Semester", filter.semester.code(), true);
        if let Some(degree) = &filter.degree {
            header.add_field("Degree", degree.clone(), true);
        }
        if let Some(year) = &filter.year {
            header.add_field("Year", year.clone(), true);
        }
        Ok(Self {
            storage,
            filter,
            total,
            header,
        })
    }
}

fn board_line(position: usize, row: &TierboardRow) -> String {
    let tier = Tier::from_average(row.avg_tier);
    format!(
        "{position} - **{}**: {}({:.1})",
        row.shortcut,
        tier.name(),
        grade_number(row.avg_tier)
    )
}

#[async_trait]
impl PageSource for TierboardSource {
    type Record = (usize, Vec<TierboardRow>);

    /// An empty board still renders one empty page.
    fn max_pages(&self) -> usize {
        self.total.div_ceil(TIERBOARD_PAGE_LEN).max(1)
    }

    async fn get_page(&self, index: usize) -> Result<Option<Self::Record>> {
        if index >= self.max_pages() {
            return Ok(None);
        }
        let offset = index * TIERBOARD_PAGE_LEN;
        let rows = self
            .storage
            .tierboard(&self.filter, offset, TIERBOARD_PAGE_LEN)
            .await?;
        Ok(Some((offset, rows)))
    }

    fn format_page(&self, (offset, rows): Self::Record) -> Embed {
        let description = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| board_line(offset + idx + 1, row))
            .collect::<Vec<_>>()
            .join("\n");
        self.header.clone().with_description(description)
    }
}

pub async fn tierboard_panel(
    transport: Arc<dyn MessageTransport>,
    source: TierboardSource,
    owner: UserId,
    options: PanelOptions,
) -> PanelResult<Panel> {
    let session = PanelSession::new(transport, owner, Pages::from_source(source), options).await?;
    Ok(Panel::new(session))
}

#[cfg(test)]
#[path = "../tests/tierboard_tests.rs"]
mod tests;
