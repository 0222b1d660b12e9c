use anyhow::anyhow;
use flashdeck_api_models::Id;
use flashdeck_client::EditorPage;

use crate::cli::{
    CardAddArgs, CardClearArgs, CardEditArgs, CardListArgs, CardMoveArgs, CardRemoveArgs,
    OutputFormat,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_cards, render_order};

pub(crate) async fn handle_card_list(
    ctx: &AppContext,
    args: CardListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let editor = ctx.editor(args.set).await?;
    render_cards(&editor.cards(), format)
}

pub(crate) async fn handle_card_add(ctx: &AppContext, args: CardAddArgs) -> CliResult<()> {
    let editor = ctx.editor(args.set).await?;
    let card = editor.add_card().await?;
    apply_edits(&editor, card.id, args.term, args.definition).await?;
    println!("Added card {} to set {}", card.id, args.set);
    Ok(())
}

pub(crate) async fn handle_card_edit(ctx: &AppContext, args: CardEditArgs) -> CliResult<()> {
    if args.term.is_none() && args.definition.is_none() {
        return Err(CliError::validation(
            "nothing to change; pass --term or --definition",
        ));
    }
    let editor = ctx.editor(args.set).await?;
    apply_edits(&editor, args.card, args.term, args.definition).await?;
    println!("Saved card {}", args.card);
    Ok(())
}

pub(crate) async fn handle_card_remove(ctx: &AppContext, args: CardRemoveArgs) -> CliResult<()> {
    let editor = ctx.editor(args.set).await?;
    editor.delete_card(args.card).await?;
    println!("Deleted card {} from set {}", args.card, args.set);
    Ok(())
}

pub(crate) async fn handle_card_move(
    ctx: &AppContext,
    args: CardMoveArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let editor = ctx.editor(args.set).await?;
    let order = editor.move_card(args.from, args.to).await?;
    render_order(&order, format)
}

pub(crate) async fn handle_card_clear(ctx: &AppContext, args: CardClearArgs) -> CliResult<()> {
    if !args.yes {
        return Err(CliError::validation(format!(
            "refusing to delete every card of set {} without --yes",
            args.set
        )));
    }
    let editor = ctx.editor(args.set).await?;
    let count = editor.cards().len();
    editor.delete_all_cards().await?;
    println!("Deleted {count} cards from set {}", args.set);
    Ok(())
}

/// Stage edits through autosave and wait for them to reach the server.
async fn apply_edits(
    editor: &EditorPage,
    card_id: Id,
    term: Option<String>,
    definition: Option<String>,
) -> CliResult<()> {
    if let Some(term) = term {
        editor.edit_term(card_id, term)?;
    }
    if let Some(definition) = definition {
        editor.edit_definition(card_id, definition)?;
    }
    editor.flush().await;
    let unsaved = editor
        .entries()
        .iter()
        .any(|entry| entry.card.id == card_id && entry.is_dirty());
    if unsaved {
        return Err(CliError::failure(anyhow!(
            "card {card_id} could not be saved"
        )));
    }
    Ok(())
}
