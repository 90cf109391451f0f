use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use list_core::{
    config::load_settings_from, CardView, HassGateway, Intent, MutationCoordinator, Outcome,
    RenderSink,
};
use shared::domain::{ItemId, ListType};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cozi", about = "Show and edit Cozi lists published through Home Assistant")]
struct Args {
    /// Settings file with base_url, token, sensor_entity, service_domain and name.
    #[arg(long, default_value = list_core::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Index of the list to work on; the first list is used otherwise.
    #[arg(long)]
    list: Option<usize>,
    /// Print the card state as JSON instead of text.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the selected list.
    Show,
    /// Add an item, optionally below the header at `position`.
    Add {
        text: String,
        #[arg(long, default_value_t = 0)]
        position: i64,
    },
    /// Replace the text of an item.
    Edit { item_id: String, text: String },
    /// Toggle an item between complete and incomplete.
    Mark { item_id: String },
    /// Remove every completed item.
    Clear,
    /// Move an active item from one position to another.
    Reorder { from: usize, to: usize },
    /// Create a new list.
    CreateList {
        title: String,
        #[arg(long, default_value = "shopping")]
        list_type: ListType,
    },
    /// Ask the integration to resync with Cozi.
    Refresh,
}

struct TerminalRender;

impl RenderSink for TerminalRender {
    fn request_render(&self) {
        tracing::trace!("render requested");
    }

    fn reset_reorder_container(&self) {
        tracing::debug!("reorder container reset");
    }

    fn repopulate_reorder_container(&self) {
        tracing::debug!("reorder container repopulated");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let settings = load_settings_from(&args.config);
    let gateway = Arc::new(HassGateway::from_settings(&settings)?);
    let coordinator = MutationCoordinator::from_settings(gateway, &settings)
        .with_render_sink(Arc::new(TerminalRender));

    coordinator.reload_directory().await;
    if coordinator.lists().await.is_empty() {
        bail!(
            "no lists published by {} at {}",
            settings.sensor_entity,
            settings.base_url
        );
    }
    if let Some(index) = args.list {
        coordinator.dispatch(Intent::SelectList { index }).await;
    }

    let outcome = match args.command.unwrap_or(Command::Show) {
        Command::Show => None,
        Command::Add { text, position } => {
            Some(coordinator.dispatch(Intent::AddItem { text, position }).await)
        }
        Command::Edit { item_id, text } => Some(
            coordinator
                .dispatch(Intent::EditItem {
                    item_id: ItemId::new(item_id),
                    text,
                })
                .await,
        ),
        Command::Mark { item_id } => {
            let item_id = ItemId::new(item_id);
            let Some(status) = coordinator
                .snapshot()
                .await
                .find(&item_id)
                .map(|item| item.status)
            else {
                bail!("item {item_id} is not in the selected list");
            };
            Some(coordinator.dispatch(Intent::MarkItem { item_id, status }).await)
        }
        Command::Clear => Some(coordinator.dispatch(Intent::ClearCompleted).await),
        Command::Reorder { from, to } => {
            coordinator.dispatch(Intent::ToggleReorder).await;
            let outcome = coordinator
                .dispatch(Intent::CompleteDrag {
                    old_index: Some(from),
                    new_index: Some(to),
                })
                .await;
            coordinator.dispatch(Intent::ToggleReorder).await;
            Some(outcome)
        }
        Command::CreateList { title, list_type } => {
            Some(coordinator.dispatch(Intent::CreateList { title, list_type }).await)
        }
        Command::Refresh => Some(coordinator.dispatch(Intent::RefreshAll).await),
    };

    match outcome {
        Some(Outcome::Declined) => println!("Nothing to do."),
        Some(Outcome::Reconciled) => {
            println!("The list service rejected the change; showing its current state.")
        }
        _ => {}
    }

    let view = coordinator.view().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

fn print_view(view: &CardView) {
    let kind = view.list_type.map(ListType::as_str).unwrap_or_default();
    println!("{} ({kind})", view.title);
    for choice in &view.lists {
        let marker = if choice.selected { '*' } else { ' ' };
        println!("  {marker} [{}] {}", choice.index, choice.title);
    }
    println!();
    for item in &view.active {
        if item.is_header() {
            println!("## {}  <pos {}>", item.text, item.item_pos);
        } else {
            println!("[ ] {}  <{}>", item.text, item.item_id);
        }
    }
    if view.has_completed() {
        println!("--- Checked items");
        for item in &view.completed {
            println!("[x] {}  <{}>", item.text, item.item_id);
        }
    }
}
