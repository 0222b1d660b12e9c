use flashdeck_api_models::{Folder, FolderPayload, Id};

use crate::api::ListParams;
use crate::error::ApiResult;
use crate::http::{ApiClient, ApiRequest};

impl ApiClient {
    /// `GET /folders/`: one page of the caller's folders.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn list_folders(&self, params: &ListParams) -> ApiResult<Vec<Folder>> {
        self.fetch_json(params.apply(ApiRequest::get("folders/")))
            .await
    }

    /// `POST /folders/`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn create_folder(&self, payload: &FolderPayload) -> ApiResult<Folder> {
        self.fetch_json(ApiRequest::post("folders/").json(payload)?)
            .await
    }

    /// `PUT /folders/{id}`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn update_folder(&self, id: Id, payload: &FolderPayload) -> ApiResult<Folder> {
        self.fetch_json(ApiRequest::put(format!("folders/{id}")).json(payload)?)
            .await
    }

    /// `DELETE /folders/{id}`. The server refuses folders that still hold sets.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::error::ApiError).
    pub async fn delete_folder(&self, id: Id) -> ApiResult<()> {
        self.fetch_empty(ApiRequest::delete(format!("folders/{id}")))
            .await
    }
}
