use flashdeck_api_models::{CardSet, Id, SetPayload};

use crate::api::SetListParams;
use crate::error::ApiResult;
use crate::http::{ApiClient, ApiRequest};

impl ApiClient {
    /// `GET /folders/{folder_id}/sets`: one page of a folder's sets.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn list_sets(&self, folder_id: Id, params: &SetListParams) -> ApiResult<Vec<CardSet>> {
        let request = params.apply(ApiRequest::get(format!("folders/{folder_id}/sets")));
        self.fetch_json(request).await
    }

    /// `GET /sets/{id}`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError); sets owned by others yield `403`/`404`.
    pub async fn get_set(&self, id: Id) -> ApiResult<CardSet> {
        self.fetch_json(ApiRequest::get(format!("sets/{id}"))).await
    }

    /// `POST /folders/{folder_id}/sets`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn create_set(&self, folder_id: Id, payload: &SetPayload) -> ApiResult<CardSet> {
        let request = ApiRequest::post(format!("folders/{folder_id}/sets")).json(payload)?;
        self.fetch_json(request).await
    }

    /// `PUT /sets/{id}`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn update_set(&self, id: Id, payload: &SetPayload) -> ApiResult<CardSet> {
        self.fetch_json(ApiRequest::put(format!("sets/{id}")).json(payload)?)
            .await
    }

    /// `DELETE /sets/{id}`, removing its cards with it.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn delete_set(&self, id: Id) -> ApiResult<()> {
        self.fetch_empty(ApiRequest::delete(format!("sets/{id}")))
            .await
    }
}
