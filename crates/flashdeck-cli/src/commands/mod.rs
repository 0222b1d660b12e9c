//! Command handlers grouped by resource.

pub(crate) mod auth;
pub(crate) mod cards;
pub(crate) mod folders;
pub(crate) mod sets;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use flashdeck_client::{ApiClient, AuthStore, MemorySessionStorage, Navigator};
    use flashdeck_config::{ClientConfig, parse_api_url};
    use httpmock::MockServer;
    use serde_json::{Value, json};

    use crate::client::AppContext;

    /// Context pointed at the mock server with short debounce delays.
    pub(crate) async fn context_for(server: &MockServer, token: Option<&str>) -> AppContext {
        let mut config =
            ClientConfig::with_session_dir(std::env::temp_dir().join("flashdeck-cli-tests"));
        config.api_url =
            parse_api_url(&format!("{}/api/v1", server.base_url())).expect("mock server url");
        config.autosave_debounce = Duration::from_millis(20);
        config.search_debounce = Duration::from_millis(20);
        let storage = token.map_or_else(MemorySessionStorage::default, |token| {
            MemorySessionStorage::with_token(token)
        });
        let auth = AuthStore::new(Arc::new(storage));
        auth.hydrate().await;
        let client = ApiClient::from_config(&config, auth, Navigator::default()).expect("client");
        AppContext { client, config }
    }

    pub(crate) fn folder_json(id: i64, name: &str, set_count: u32) -> Value {
        json!({"id": id, "name": name, "is_public": false, "set_count": set_count})
    }

    pub(crate) fn set_json(id: i64, folder_id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "description": "Greetings",
            "is_public": false,
            "owner_id": 1,
            "folder_id": folder_id,
            "created_at": "2024-03-01T10:15:00",
            "tags": [{"id": 1, "name": "spanish"}],
            "card_count": 3
        })
    }

    pub(crate) fn card_json(id: i64, term: &str, order: u32) -> Value {
        json!({
            "id": id,
            "term": term,
            "definition": format!("def {id}"),
            "example": null,
            "translation": null,
            "order": order,
            "set_id": 5
        })
    }
}
