//! Tracked-entity command handlers.

use chrono::Utc;
use clap::Subcommand;
use shelfwise_core::{EntityId, EntityKind, NewTrackedEntity};
use shelfwise_db::{DbError, DocumentStore};

use crate::print_json;

/// Sub-commands available under `entity`.
#[derive(Debug, Subcommand)]
pub enum EntityCommands {
    /// Register a new entity in `pending` status
    Add {
        #[arg(long)]
        name: String,
        /// product, brand, or category
        #[arg(long, default_value = "product")]
        kind: EntityKind,
        /// Platform to track on (repeatable or comma-separated)
        #[arg(long = "platform", value_delimiter = ',', required = true)]
        platforms: Vec<String>,
        /// Owning account id; a fresh one is generated when omitted
        #[arg(long)]
        owner: Option<EntityId>,
    },
    /// List every tracked entity
    List,
    /// Show one entity
    Show { id: EntityId },
    /// Replace an entity's name, kind, and platforms
    Update {
        id: EntityId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        kind: EntityKind,
        #[arg(long = "platform", value_delimiter = ',', required = true)]
        platforms: Vec<String>,
    },
    /// Delete an entity registration
    Delete { id: EntityId },
}

fn not_found(id: EntityId) -> impl FnOnce(DbError) -> anyhow::Error {
    move |err| match err {
        DbError::NotFound => anyhow::anyhow!("entity {id} not found"),
        other => other.into(),
    }
}

pub(crate) async fn run(store: &dyn DocumentStore, command: EntityCommands) -> anyhow::Result<()> {
    match command {
        EntityCommands::Add {
            name,
            kind,
            platforms,
            owner,
        } => {
            let entity = NewTrackedEntity {
                owner_id: owner,
                name,
                kind,
                platforms: platforms.into_iter().collect(),
            }
            .into_entity(Utc::now());
            shelfwise_db::insert_entity(store, &entity).await?;
            tracing::info!(entity_id = %entity.id, name = %entity.name, "entity registered");
            print_json(&entity)
        }
        EntityCommands::List => print_json(&shelfwise_db::list_entities(store).await?),
        EntityCommands::Show { id } => {
            let entity = shelfwise_db::get_entity(store, id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("entity {id} not found"))?;
            print_json(&entity)
        }
        EntityCommands::Update {
            id,
            name,
            kind,
            platforms,
        } => {
            let platforms: Vec<String> = platforms
                .iter()
                .map(|p| p.trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect();
            let entity =
                shelfwise_db::update_entity(store, id, &name, kind, &platforms, Utc::now())
                    .await
                    .map_err(not_found(id))?;
            print_json(&entity)
        }
        EntityCommands::Delete { id } => {
            shelfwise_db::delete_entity(store, id)
                .await
                .map_err(not_found(id))?;
            println!("deleted {id}");
            Ok(())
        }
    }
}
