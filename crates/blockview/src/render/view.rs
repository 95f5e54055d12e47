//! Renderer output.

use serde::Serialize;

use crate::component::ComponentKind;
use crate::registry::{Rendered, Row};

/// What a renderer produced for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub component: ComponentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: ViewBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewBody {
    /// Tabular data. `data_type` scopes formatter and row-click lookup.
    Table {
        #[serde(skip_serializing_if = "Option::is_none")]
        data_type: Option<String>,
        columns: Vec<Column>,
        rows: Vec<ViewRow>,
    },
    Cards { cards: Vec<Card> },
    /// One-line description (media and charts).
    Summary { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub key: String,
    pub label: String,
}

/// A table row: formatted cells plus the raw row for click handlers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub cells: Vec<Rendered>,
    pub data: Row,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub fields: Vec<LabeledValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: Rendered,
}

impl View {
    pub fn summary(component: ComponentKind, title: Option<String>, text: impl Into<String>) -> Self {
        Self {
            component,
            title,
            body: ViewBody::Summary { text: text.into() },
        }
    }

    /// Plain-text rendering. Tables are column-aligned on character count.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            out.push_str(&format!("{title}\n"));
        }
        match &self.body {
            ViewBody::Summary { text } => {
                out.push_str(text);
                out.push('\n');
            }
            ViewBody::Cards { cards } => {
                for (i, card) in cards.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    if let Some(title) = &card.title {
                        out.push_str(&format!("  ┌ {title}\n"));
                    }
                    for field in &card.fields {
                        out.push_str(&format!(
                            "  {}: {}\n",
                            field.label,
                            field.value.to_plain_text()
                        ));
                    }
                }
            }
            ViewBody::Table { columns, rows, .. } => {
                let cells: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| row.cells.iter().map(Rendered::to_plain_text).collect())
                    .collect();
                let widths: Vec<usize> = columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        cells
                            .iter()
                            .filter_map(|row| row.get(i))
                            .map(|c| c.chars().count())
                            .chain(std::iter::once(col.label.chars().count()))
                            .max()
                            .unwrap_or(0)
                    })
                    .collect();

                let header: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
                out.push_str(&table_line(&header, &widths));
                let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
                out.push_str(&table_line(&rule, &widths));
                for row in &cells {
                    out.push_str(&table_line(row, &widths));
                }
            }
        }
        out
    }
}

fn table_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    format!("  {}\n", padded.join("  ").trim_end())
}
