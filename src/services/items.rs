//! Item lookups for officers and the public feed

use crate::{
    error::AppResult,
    models::{
        enums::ItemState,
        item::{ItemDetails, ItemPage, ItemQuery, RecentItems},
    },
    repository::Repository,
};

/// Entries per column of the public feed
const RECENT_LIMIT: i64 = 6;

#[derive(Clone)]
pub struct ItemsService {
    repository: Repository,
}

impl ItemsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_details(&self, id: i32) -> AppResult<ItemDetails> {
        self.repository.items.get_details(id).await
    }

    pub async fn search(&self, query: &ItemQuery) -> AppResult<ItemPage> {
        let window = query.window()?;
        let (items, total) = self.repository.items.search(query, window).await?;
        Ok(ItemPage {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
        })
    }

    pub async fn recent(&self) -> AppResult<RecentItems> {
        let lost = self
            .repository
            .items
            .recent(&[ItemState::Lost, ItemState::Claimed], RECENT_LIMIT)
            .await?;
        let found = self
            .repository
            .items
            .recent(&[ItemState::Found], RECENT_LIMIT)
            .await?;
        Ok(RecentItems { lost, found })
    }

    pub async fn delete(&self, officer_id: i32, id: i32) -> AppResult<()> {
        self.repository.items.delete(id).await?;
        tracing::info!(item_id = id, officer_id, "Item deleted");
        Ok(())
    }
}
