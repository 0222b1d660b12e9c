use flashdeck_api_models::split_tags;
use flashdeck_client::{ListParams, SetDraft, SetListParams};

use crate::cli::{OutputFormat, SetAddArgs, SetEditArgs, SetListArgs, SetRemoveArgs, SetShowArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_set_detail, render_sets};

pub(crate) async fn handle_set_list(
    ctx: &AppContext,
    args: SetListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    ctx.require_session()?;
    let limit = ctx.config.page_size;
    let list = ListParams::page(args.page.saturating_mul(limit), limit)
        .with_search(args.search.unwrap_or_default());
    let params = SetListParams {
        list,
        tags: split_tags(&args.tags.join(",")),
    };
    let sets = ctx.client.list_sets(args.folder, &params).await?;
    render_sets(&sets, format)
}

pub(crate) async fn handle_set_show(
    ctx: &AppContext,
    args: SetShowArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let editor = ctx.editor(args.id).await?;
    render_set_detail(&editor.set(), &editor.cards(), format)
}

pub(crate) async fn handle_set_add(ctx: &AppContext, args: SetAddArgs) -> CliResult<()> {
    ctx.require_session()?;
    let library = ctx.library();
    library.select_folder(Some(args.folder)).await?;
    let draft = SetDraft {
        name: args.name,
        description: args.description,
        is_public: args.public,
        tags: args.tags,
    };
    let set = library.create_set(&draft).await?;
    println!(
        "Created set '{}' (id: {}) in folder {}",
        set.name, set.id, set.folder_id
    );
    Ok(())
}

pub(crate) async fn handle_set_edit(ctx: &AppContext, args: SetEditArgs) -> CliResult<()> {
    if args.name.is_none() && args.description.is_none() && args.tags.is_none() {
        return Err(CliError::validation(
            "nothing to change; pass --name, --description, or --tags",
        ));
    }
    let editor = ctx.editor(args.id).await?;
    if let Some(name) = args.name {
        editor.set_name(name);
    }
    if let Some(description) = args.description {
        editor.set_description(description);
    }
    if let Some(tags) = args.tags {
        editor.set_tags(tags);
    }
    let set = editor.save().await?;
    println!("Saved set '{}' (id: {})", set.name, set.id);
    Ok(())
}

pub(crate) async fn handle_set_remove(ctx: &AppContext, args: SetRemoveArgs) -> CliResult<()> {
    ctx.require_session()?;
    let set = ctx.client.get_set(args.id).await?;
    ctx.library().delete_set(&set).await?;
    println!("Deleted set '{}' (id: {})", set.name, set.id);
    Ok(())
}
