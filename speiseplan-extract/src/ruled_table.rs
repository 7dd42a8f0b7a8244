use tracing::{debug, warn};

use crate::document::MenuDocument;
use crate::error::ExtractError;
use crate::model::{DishPair, PageLayout, RawTableRow, Weekday, WeeklyMenu};
use crate::normalize::{dish_tokens, is_row_empty};
use crate::options::{ExtractOptions, OverflowPolicy};
use crate::pipeline::MenuStrategy;
use crate::table_detect::detect_ruled_tables;
use crate::warning::{ExtractWarning, WarningCode};

const NAME: &str = "ruled";

/// Reads the first ruled table on the page. Non-empty rows are taken as
/// Monday through Friday in order; the last two columns hold the meat and
/// vegetarian dishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuledTableStrategy;

impl MenuStrategy for RuledTableStrategy {
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
        let rows = ruled_rows(&layout)?;
        debug!(rows = rows.len(), "read ruled table");
        menu_from_rows(&rows, options, warnings)
    }
}

pub(crate) fn ruled_rows(layout: &PageLayout) -> Result<Vec<RawTableRow>, ExtractError> {
    let tables = detect_ruled_tables(&layout.segments);
    let Some(table) = tables.first() else {
        return Err(ExtractError::failed(
            NAME,
            "no ruled table found on the first page",
        ));
    };
    if table.column_count() < 2 {
        return Err(ExtractError::failed(
            NAME,
            format!("table has {} column(s), need at least 2", table.column_count()),
        ));
    }
    Ok(table.fill(&layout.spans))
}

pub(crate) fn menu_from_rows(
    rows: &[RawTableRow],
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<WeeklyMenu, ExtractError> {
    let mut menu = WeeklyMenu::default();
    let mut days = Weekday::ALL.into_iter();

    for (index, row) in rows.iter().enumerate() {
        if is_row_empty(row) {
            debug!(row = index, "skipping empty table row");
            continue;
        }
        let Some(day) = days.next() else {
            match options.overflow {
                OverflowPolicy::Strict => {
                    return Err(ExtractError::failed(
                        NAME,
                        format!("row {index} holds a sixth day"),
                    ));
                }
                OverflowPolicy::Truncate => {
                    warn!(row = index, "dropping day row after Friday");
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::ExtraDayRowsDropped,
                            "day row after Friday dropped",
                        )
                        .with_strategy(NAME)
                        .with_row(index),
                    );
                    continue;
                }
            }
        };

        let [meat, vegetarian] = last_two_cells(row);
        menu.insert(
            day,
            DishPair::new(
                dish_tokens(meat, &options.boilerplate),
                dish_tokens(vegetarian, &options.boilerplate),
            ),
        );
    }

    Ok(menu)
}

fn last_two_cells(row: &[String]) -> [&str; 2] {
    match row {
        [.., meat, vegetarian] => [meat.as_str(), vegetarian.as_str()],
        [only] => [only.as_str(), ""],
        [] => ["", ""],
    }
}
