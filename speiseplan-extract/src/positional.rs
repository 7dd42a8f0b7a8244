use chrono::Datelike;
use tracing::{debug, warn};

use crate::document::MenuDocument;
use crate::error::ExtractError;
use crate::model::{DishPair, GridRow, Weekday, WeeklyMenu};
use crate::normalize::dish_tokens;
use crate::options::{ExtractOptions, OverflowPolicy};
use crate::pipeline::MenuStrategy;
use crate::table_parse::build_grid;
use crate::warning::{ExtractWarning, WarningCode};
use crate::week::{find_date_token, parse_menu_date};

const NAME: &str = "positional";

const CHECKBOX_GLYPH: char = '\u{25a1}';
const HOMEMADE_MARKER: &str = "hausgemacht";

/// Reads the page as a positional text grid and locates each day by the
/// non-blank cells of the week column.
///
/// Day labels are often printed on the last line of their block rather
/// than the first, so every block is realigned upward to the first row
/// after the preceding blank row before its dishes are collected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalStrategy;

impl MenuStrategy for PositionalStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extract(
        &self,
        document: &MenuDocument,
        options: &ExtractOptions,
        warnings: &mut Vec<ExtractWarning>,
    ) -> Result<WeeklyMenu, ExtractError> {
        let layout = document
            .first_page_layout()
            .map_err(|error| ExtractError::failed(NAME, format!("page layout: {error}")))?;
        let grid = build_grid(&layout.spans, options.column_tolerance);
        debug!(rows = grid.len(), "built positional grid");
        menu_from_grid(grid, options, warnings)
    }
}

fn is_blank(cell: Option<&Option<String>>) -> bool {
    cell.is_none_or(Option::is_none)
}

fn cell_text(cell: &Option<String>) -> &str {
    cell.as_deref().unwrap_or_default()
}

fn clean_cell(cell: Option<String>) -> Option<String> {
    let text = cell?.replace(CHECKBOX_GLYPH, "");
    (!text.trim().is_empty()).then_some(text)
}

fn is_blank_row(row: &GridRow) -> bool {
    row.iter().all(Option::is_none)
}

/// First row of the block containing `start`: walks upward until the row
/// above has no cell at all. Short dish lines such as "Ei" still count.
fn block_start(rows: &[GridRow], start: usize) -> usize {
    let mut cursor = start;
    while cursor > 0 && !is_blank_row(&rows[cursor - 1]) {
        cursor -= 1;
    }
    cursor
}

/// Collects meat and vegetarian cells downward from `start` until a row
/// has neither.
fn collect_block(rows: &[GridRow], start: usize, meat_column: usize) -> (String, String) {
    let mut meat = Vec::new();
    let mut vegetarian = Vec::new();
    for row in &rows[start..] {
        let meat_cell = row.get(meat_column);
        let vegetarian_cell = row.last();
        if is_blank(meat_cell) && is_blank(vegetarian_cell) {
            break;
        }
        if let Some(Some(text)) = meat_cell {
            meat.push(text.as_str());
        }
        if let Some(Some(text)) = vegetarian_cell {
            vegetarian.push(text.as_str());
        }
    }
    (meat.join(" "), vegetarian.join(" "))
}

enum DayLabel {
    Day(Weekday),
    Weekend,
    Unreadable,
}

fn read_day_label(label: &str) -> DayLabel {
    if let Some(day) = Weekday::from_label(label) {
        return DayLabel::Day(day);
    }
    match find_date_token(label).map(parse_menu_date) {
        Some(Ok(date)) => {
            Weekday::from_chrono(date.weekday()).map_or(DayLabel::Weekend, DayLabel::Day)
        }
        _ => DayLabel::Unreadable,
    }
}

pub(crate) fn menu_from_grid(
    grid: Vec<GridRow>,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<WeeklyMenu, ExtractError> {
    let mut rows = grid.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| ExtractError::failed(NAME, "page has no text"))?;
    if header.len() < 2 {
        return Err(ExtractError::failed(
            NAME,
            format!("grid has {} column(s), need at least 2", header.len()),
        ));
    }
    let week_column = header
        .iter()
        .position(|cell| cell_text(cell).trim_start().starts_with('W'))
        .ok_or_else(|| ExtractError::failed(NAME, "no week column in the header row"))?;

    let rows = rows
        .map(|row| row.into_iter().map(clean_cell).collect::<GridRow>())
        .filter(|row| !cell_text(&row[0]).contains(HOMEMADE_MARKER))
        .collect::<Vec<_>>();
    let day_rows = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !is_blank(row.get(week_column)))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    debug!(week_column, days = day_rows.len(), "located day rows");

    let explicit_labels = header.len() > 2;
    let meat_column = usize::from(explicit_labels);
    let mut positional = Weekday::ALL.into_iter();
    let mut menu = WeeklyMenu::default();

    for index in day_rows {
        let next_day = if explicit_labels {
            let label = cell_text(&rows[index][0]);
            match read_day_label(label) {
                DayLabel::Day(day) => Some(day),
                DayLabel::Weekend => {
                    debug!(row = index, label, "skipping weekend row");
                    continue;
                }
                DayLabel::Unreadable => {
                    let fallback = positional.next();
                    warn!(row = index, label, "unreadable day label, counting positionally");
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::UnparsedDayLabel,
                            format!("unreadable day label '{label}'"),
                        )
                        .with_strategy(NAME)
                        .with_row(index),
                    );
                    fallback
                }
            }
        } else {
            positional.next()
        };

        let Some(day) = next_day else {
            if options.overflow == OverflowPolicy::Strict {
                return Err(ExtractError::failed(
                    NAME,
                    format!("row {index} holds a sixth day"),
                ));
            }
            warn!(row = index, "dropping day block after Friday");
            warnings.push(
                ExtractWarning::new(
                    WarningCode::ExtraDayRowsDropped,
                    "day block after Friday dropped",
                )
                .with_strategy(NAME)
                .with_row(index),
            );
            continue;
        };

        let start = block_start(&rows, index);
        let (meat, vegetarian) = collect_block(&rows, start, meat_column);
        let dishes = DishPair::new(
            dish_tokens(&meat, &options.boilerplate),
            dish_tokens(&vegetarian, &options.boilerplate),
        );
        if menu.insert(day, dishes).is_some() {
            warn!(row = index, %day, "day appears twice, keeping the later block");
            warnings.push(
                ExtractWarning::new(WarningCode::DuplicateWeekday, format!("{day} appears twice"))
                    .with_strategy(NAME)
                    .with_row(index)
                    .with_weekday(day),
            );
        }
    }

    Ok(menu)
}
