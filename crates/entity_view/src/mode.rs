/// How a fetched collection is laid out. Local to one mounted view; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresentationMode {
    #[default]
    Card,
    Table,
}

impl PresentationMode {
    pub fn toggled(self) -> Self {
        match self {
            PresentationMode::Card => PresentationMode::Table,
            PresentationMode::Table => PresentationMode::Card,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PresentationMode::Card => "card",
            PresentationMode::Table => "table",
        }
    }

    /// Caption for the switch, naming the mode it switches to.
    pub fn toggle_label(self) -> &'static str {
        match self {
            PresentationMode::Card => "Toggle to table",
            PresentationMode::Table => "Toggle to card",
        }
    }
}
