use flashdeck_api_models::{Folder, Id};
use flashdeck_client::LibraryPage;

use crate::cli::{FolderAddArgs, FolderEditArgs, FolderListArgs, FolderRemoveArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_folders, visibility};

pub(crate) async fn handle_folder_list(
    ctx: &AppContext,
    args: FolderListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    ctx.require_session()?;
    let library = ctx.library();
    let search = args.search.unwrap_or_default();
    if search.trim().is_empty() {
        library.load_folders(true).await?;
    } else {
        library.set_search(&search).await?;
    }
    for _ in 1..args.pages {
        if !library.load_folders(false).await? {
            break;
        }
    }
    render_folders(&library.folders(), format)
}

pub(crate) async fn handle_folder_add(ctx: &AppContext, args: FolderAddArgs) -> CliResult<()> {
    ctx.require_session()?;
    let folder = ctx.library().create_folder(&args.name, args.public).await?;
    println!(
        "Created {} folder '{}' (id: {})",
        visibility(folder.is_public),
        folder.name,
        folder.id
    );
    Ok(())
}

pub(crate) async fn handle_folder_edit(ctx: &AppContext, args: FolderEditArgs) -> CliResult<()> {
    ctx.require_session()?;
    let folder = ctx
        .library()
        .update_folder(args.id, &args.name, args.public)
        .await?;
    println!("Updated folder '{}' (id: {})", folder.name, folder.id);
    Ok(())
}

pub(crate) async fn handle_folder_remove(
    ctx: &AppContext,
    args: FolderRemoveArgs,
) -> CliResult<()> {
    ctx.require_session()?;
    let library = ctx.library();
    let folder = find_folder(&library, args.id).await?;
    library.delete_folder(&folder).await?;
    println!("Deleted folder '{}' (id: {})", folder.name, folder.id);
    Ok(())
}

/// Page through the folder list until `folder_id` shows up.
async fn find_folder(library: &LibraryPage, folder_id: Id) -> CliResult<Folder> {
    let mut loaded = library.load_folders(true).await?;
    loop {
        if let Some(folder) = library
            .folders()
            .into_iter()
            .find(|folder| folder.id == folder_id)
        {
            return Ok(folder);
        }
        if !loaded {
            return Err(CliError::validation(format!(
                "folder {folder_id} not found"
            )));
        }
        loaded = library.load_folders(false).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LOGIN_REQUIRED;
    use crate::commands::test_support::{context_for, folder_json};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn list_requires_a_session() {
        let server = MockServer::start_async().await;
        let ctx = context_for(&server, None).await;

        let err = handle_folder_list(&ctx, FolderListArgs::default(), OutputFormat::Table)
            .await
            .expect_err("should need a session");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), LOGIN_REQUIRED);
    }

    #[tokio::test]
    async fn list_sends_search_and_paging() {
        let server = MockServer::start_async().await;
        let list = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/folders/")
                .header("authorization", "Bearer tok")
                .query_param("skip", "0")
                .query_param("limit", "20")
                .query_param("search", "span");
            then.status(200)
                .json_body(json!([folder_json(1, "Spanish", 2)]));
        });

        let ctx = context_for(&server, Some("tok")).await;
        handle_folder_list(
            &ctx,
            FolderListArgs {
                search: Some("  span ".into()),
                pages: 3,
            },
            OutputFormat::Json,
        )
        .await
        .expect("list should succeed");

        // A short first page ends paging.
        list.assert_calls(1);
    }

    #[tokio::test]
    async fn add_posts_payload() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/folders/")
                .json_body(json!({"name": "Spanish", "is_public": true}));
            then.status(200).json_body(json!({
                "id": 4, "name": "Spanish", "is_public": true, "set_count": 0
            }));
        });

        let ctx = context_for(&server, Some("tok")).await;
        handle_folder_add(
            &ctx,
            FolderAddArgs {
                name: " Spanish ".into(),
                public: true,
            },
        )
        .await
        .expect("add should succeed");
        create.assert();
    }

    #[tokio::test]
    async fn blank_name_is_rejected_locally() {
        let server = MockServer::start_async().await;
        let update = server.mock(|when, then| {
            when.method(PUT).path("/api/v1/folders/4");
            then.status(200);
        });

        let ctx = context_for(&server, Some("tok")).await;
        let err = handle_folder_edit(
            &ctx,
            FolderEditArgs {
                id: 4,
                name: "   ".into(),
                public: false,
            },
        )
        .await
        .expect_err("blank name should fail");
        assert_eq!(err.display_message(), "name is required");
        update.assert_calls(0);
    }

    #[tokio::test]
    async fn remove_refuses_folders_with_sets() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/folders/");
            then.status(200).json_body(json!([
                folder_json(1, "Spanish", 2),
                folder_json(2, "Empty", 0)
            ]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/v1/folders/1");
            then.status(204);
        });

        let ctx = context_for(&server, Some("tok")).await;
        let err = handle_folder_remove(&ctx, FolderRemoveArgs { id: 1 })
            .await
            .expect_err("non-empty folder should be refused");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "Cannot delete a folder that contains card sets."
        );
        delete.assert_calls(0);
    }

    #[tokio::test]
    async fn remove_deletes_empty_folder() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/folders/");
            then.status(200)
                .json_body(json!([folder_json(2, "Empty", 0)]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/v1/folders/2");
            then.status(204);
        });

        let ctx = context_for(&server, Some("tok")).await;
        handle_folder_remove(&ctx, FolderRemoveArgs { id: 2 })
            .await
            .expect("empty folder should be deleted");
        delete.assert();

        let err = handle_folder_remove(&ctx, FolderRemoveArgs { id: 9 })
            .await
            .expect_err("unknown folder");
        assert_eq!(err.display_message(), "folder 9 not found");
    }
}
