mod crop;
mod csv_out;
mod document;
mod error;
mod model;
mod normalize;
mod options;
mod pdf_reader;
mod pipeline;
mod positional;
mod publish;
mod render;
mod ruled_table;
mod table_detect;
mod table_parse;
mod warning;
mod week;

use std::path::Path;

use tracing::info;

pub use crop::{CropBox, DailyDishes, crop_dishes, daily_dishes, dish_file_name, encode_png};
pub use csv_out::{menu_to_csv_string, write_menu_csv};
pub use document::{DocumentSource, FileSource, MenuDocument};
pub use error::ExtractError;
pub use model::{DishPair, PageLayout, Segment, TextSpan, Weekday, WeeklyMenu};
pub use normalize::{
    BOILERPLATE_PHRASE, blank_allergen_tokens, collapse_spaces, dish_tokens, is_allergen_token,
    is_row_empty, strip_artifacts,
};
pub use options::{CropLayout, ExtractOptions, OverflowPolicy, StrategyKind};
pub use pipeline::{ExtractionReport, MenuExtraction, MenuPipeline, MenuStrategy, PipelineState};
pub use positional::PositionalStrategy;
pub use publish::{DirectoryPublisher, ImagePublisher};
pub use render::{
    DISH_EMOJI, DISH_KINDS, RATING_REACTIONS, announcement_message, feedback_message,
    menu_to_json, render_chat_table, wrap_text,
};
pub use ruled_table::RuledTableStrategy;
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};
pub use week::{
    DocumentUrlCache, WeekKey, find_date_token, is_menu_link, link_file_name, menu_week_start,
    monday_of, parse_menu_date, resolve_menu_link, select_menu_link, unknown_week_start,
    week_start_from_text,
};

fn validate_options(options: &ExtractOptions) -> Result<(), ExtractError> {
    if options.strategies.is_empty() {
        return Err(ExtractError::InvalidOption(
            "at least one extraction strategy is required".to_string(),
        ));
    }
    if !options.column_tolerance.is_finite() || options.column_tolerance <= 0.0 {
        return Err(ExtractError::InvalidOption(
            "column tolerance must be a positive number".to_string(),
        ));
    }
    Ok(())
}

pub fn extract_from_document(
    document: &MenuDocument,
    options: &ExtractOptions,
) -> Result<MenuExtraction, ExtractError> {
    validate_options(options)?;
    MenuPipeline::from_kinds(&options.strategies).extract(document, options)
}

pub fn extract_weekly_menu(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<MenuExtraction, ExtractError> {
    validate_options(options)?;
    let document = MenuDocument::from_bytes(input_pdf)?;
    extract_from_document(&document, options)
}

pub fn extract_weekly_menu_from_path(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<MenuExtraction, ExtractError> {
    let bytes = FileSource::new(input_pdf).fetch()?;
    extract_weekly_menu(&bytes, options)
}

pub fn extract_weekly_menu_from_source(
    source: &dyn DocumentSource,
    options: &ExtractOptions,
) -> Result<MenuExtraction, ExtractError> {
    let bytes = source.fetch()?;
    info!(bytes = bytes.len(), "fetched menu document");
    extract_weekly_menu(&bytes, options)
}
