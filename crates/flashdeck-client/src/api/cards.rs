use flashdeck_api_models::{Card, CardPayload, Id, ReorderRequest};
use tracing::debug;

use crate::api::ANY_FOLDER;
use crate::error::ApiResult;
use crate::http::{ApiClient, ApiRequest};

/// Rows requested per page when loading a whole set; matches the server default.
pub const CARD_PAGE_SIZE: u32 = 100;

fn cards_path(set_id: Id) -> String {
    format!("folders/{ANY_FOLDER}/sets/{set_id}/cards")
}

impl ApiClient {
    /// One page of a set's cards in display order.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn list_cards(&self, set_id: Id, skip: u32, limit: u32) -> ApiResult<Vec<Card>> {
        let request = ApiRequest::get(cards_path(set_id))
            .query("skip", skip)
            .query("limit", limit);
        self.fetch_json(request).await
    }

    /// Every card of a set, paging until a short page comes back.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError) from the first failing page.
    pub async fn list_all_cards(&self, set_id: Id) -> ApiResult<Vec<Card>> {
        let mut cards = Vec::new();
        loop {
            let skip = u32::try_from(cards.len()).unwrap_or(u32::MAX);
            let page = self.list_cards(set_id, skip, CARD_PAGE_SIZE).await?;
            let full = page.len() == CARD_PAGE_SIZE as usize;
            cards.extend(page);
            if !full {
                break;
            }
        }
        debug!(set_id, count = cards.len(), "loaded cards");
        Ok(cards)
    }

    /// Append a card to a set.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn create_card(&self, set_id: Id, payload: &CardPayload) -> ApiResult<Card> {
        self.fetch_json(ApiRequest::post(cards_path(set_id)).json(payload)?)
            .await
    }

    /// `PUT /cards/{id}`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn update_card(&self, id: Id, payload: &CardPayload) -> ApiResult<Card> {
        self.fetch_json(ApiRequest::put(format!("cards/{id}")).json(payload)?)
            .await
    }

    /// `DELETE /cards/{id}`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn delete_card(&self, id: Id) -> ApiResult<()> {
        self.fetch_empty(ApiRequest::delete(format!("cards/{id}")))
            .await
    }

    /// Submit the complete ordering of a set; card `i` gets order `i`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn reorder_cards(&self, set_id: Id, card_ids: &[Id]) -> ApiResult<()> {
        let payload = ReorderRequest {
            card_ids: card_ids.to_vec(),
        };
        let request =
            ApiRequest::post(format!("folders/{ANY_FOLDER}/sets/{set_id}/reorder")).json(&payload)?;
        self.fetch_empty(request).await
    }

    /// `DELETE /sets/{set_id}/cards`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn delete_all_cards(&self, set_id: Id) -> ApiResult<()> {
        self.fetch_empty(ApiRequest::delete(format!("sets/{set_id}/cards")))
            .await
    }
}
