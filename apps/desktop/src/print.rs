//! Text rendering of the two presentations for terminal output.

use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL_CONDENSED, ContentArrangement, Table,
};
use entity_view::{CardUnit, Presentation, TableModel};

pub fn format_presentation(presentation: &Presentation) -> String {
    match presentation {
        Presentation::Cards(cards) => format_cards(cards),
        Presentation::Table(table) => format_table(table),
    }
}

pub fn format_cards(cards: &[CardUnit]) -> String {
    cards
        .iter()
        .map(|card| {
            format!(
                "#{} {}\n   {}\n   [image: {} ({}x{})]",
                card.key + 1,
                card.title,
                card.description,
                card.image.alt,
                card.image.width,
                card.image.height,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_table(model: &TableModel) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    table.set_header(model.header.clone());
    for row in &model.rows {
        table.add_row(row.cells.clone());
    }
    table.to_string()
}
