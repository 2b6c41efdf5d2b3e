//! The two interchangeable layouts. Both are pure functions of the same collection and
//! keep its order.

use shared::{Collection, EntityType, Item};

use crate::mode::PresentationMode;

pub const CARD_IMAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub url: String,
    /// Accessible label; always the card title.
    pub alt: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardUnit {
    /// Position in the collection.
    pub key: usize,
    pub title: String,
    pub description: String,
    pub image: CardImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub key: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub aria_label: String,
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Cards(Vec<CardUnit>),
    Table(TableModel),
}

pub fn present(
    mode: PresentationMode,
    collection: &Collection,
    entity: EntityType,
) -> Presentation {
    match mode {
        PresentationMode::Card => Presentation::Cards(render_cards(collection)),
        PresentationMode::Table => Presentation::Table(render_table(collection, entity)),
    }
}

pub fn render_cards(collection: &Collection) -> Vec<CardUnit> {
    collection
        .iter()
        .enumerate()
        .map(|(key, item)| {
            let title = field(item, "title");
            CardUnit {
                key,
                description: field(item, "description"),
                image: CardImage {
                    url: field(item, "image"),
                    alt: title.clone(),
                    width: CARD_IMAGE_SIZE,
                    height: CARD_IMAGE_SIZE,
                },
                title,
            }
        })
        .collect()
}

/// Header comes from the first item only. Items with a different field set produce
/// misaligned rows; mixed shapes are not supported.
pub fn render_table(collection: &Collection, entity: EntityType) -> TableModel {
    let header = collection
        .first()
        .map(|first| first.field_names().map(str::to_string).collect())
        .unwrap_or_default();

    let rows = collection
        .iter()
        .enumerate()
        .map(|(index, item)| TableRow {
            key: item
                .get("title")
                .map_or_else(|| index.to_string(), str::to_string),
            cells: item.values().map(str::to_string).collect(),
        })
        .collect();

    TableModel {
        aria_label: format!("table-{entity}"),
        header,
        rows,
    }
}

fn field(item: &Item, name: &str) -> String {
    item.get(name).unwrap_or_default().to_string()
}

#[cfg(test)]
#[path = "tests/strategy_tests.rs"]
mod tests;
