use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExtractError;
use crate::model::WeeklyMenu;

const HEADERS: [&str; 4] = ["weekday", "date", "meat", "vegetarian"];

fn write_menu<W: std::io::Write>(
    writer: &mut Writer<W>,
    menu: &WeeklyMenu,
) -> Result<(), ExtractError> {
    writer.write_record(HEADERS)?;
    for (day, dishes) in menu.iter() {
        let date = menu
            .date_of(day)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        writer.write_record([
            day.short_label(),
            date.as_str(),
            dishes.meat_text().as_str(),
            dishes.vegetarian_text().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_menu_csv(path: &Path, menu: &WeeklyMenu, delimiter: u8) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_menu(&mut writer, menu)
}

pub fn menu_to_csv_string(menu: &WeeklyMenu, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_menu(&mut writer, menu)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
