use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Product,
    Brand,
    Category,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Product => write!(f, "product"),
            EntityKind::Brand => write!(f, "brand"),
            EntityKind::Category => write!(f, "category"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Self::Product),
            "brand" => Ok(Self::Brand),
            "category" => Ok(Self::Category),
            other => Err(CoreError::InvalidKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    #[default]
    Pending,
    Scraped,
    Analyzed,
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityStatus::Pending => write!(f, "pending"),
            EntityStatus::Scraped => write!(f, "scraped"),
            EntityStatus::Analyzed => write!(f, "analyzed"),
        }
    }
}

impl FromStr for EntityStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "scraped" => Ok(Self::Scraped),
            "analyzed" => Ok(Self::Analyzed),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// A product, brand, or category whose marketplace presence is tracked.
///
/// `status` and `last_updated` are only moved by the scrape driver after a
/// scrape attempt, or by an explicit update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub owner_id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    /// Platform names, e.g. `amazon`. Validated against the extractor registry
    /// at scrape time, not here.
    pub platforms: BTreeSet<String>,
    #[serde(default)]
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Registration payload for a [`TrackedEntity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrackedEntity {
    pub owner_id: Option<EntityId>,
    pub name: String,
    pub kind: EntityKind,
    pub platforms: BTreeSet<String>,
}

impl NewTrackedEntity {
    /// Materialize a pending entity with fresh ids and timestamps.
    #[must_use]
    pub fn into_entity(self, now: DateTime<Utc>) -> TrackedEntity {
        TrackedEntity {
            id: EntityId::at(now),
            owner_id: self.owner_id.unwrap_or_else(|| EntityId::at(now)),
            name: self.name,
            kind: self.kind,
            platforms: self
                .platforms
                .into_iter()
                .map(|p| p.trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            status: EntityStatus::Pending,
            created_at: now,
            last_updated: Some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entity() -> NewTrackedEntity {
        NewTrackedEntity {
            owner_id: None,
            name: "Sony WH-1000XM5".to_string(),
            kind: EntityKind::Product,
            platforms: ["Amazon", " ebay ", ""]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    #[test]
    fn into_entity_starts_pending_with_normalized_platforms() {
        let now = Utc::now();
        let entity = new_entity().into_entity(now);
        assert_eq!(entity.status, EntityStatus::Pending);
        assert_eq!(entity.created_at, now);
        assert_eq!(entity.last_updated, Some(now));
        let platforms: Vec<&str> = entity.platforms.iter().map(String::as_str).collect();
        assert_eq!(platforms, vec!["amazon", "ebay"]);
    }

    #[test]
    fn serializes_with_document_field_names() {
        let entity = new_entity().into_entity(Utc::now());
        let json = serde_json::to_value(&entity).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("ownerId").is_some());
        assert_eq!(json["kind"], "product");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn kind_and_status_parse_case_insensitively() {
        assert_eq!("Brand".parse::<EntityKind>().unwrap(), EntityKind::Brand);
        assert_eq!(
            "SCRAPED".parse::<EntityStatus>().unwrap(),
            EntityStatus::Scraped
        );
        assert!("widget".parse::<EntityKind>().is_err());
    }
}
