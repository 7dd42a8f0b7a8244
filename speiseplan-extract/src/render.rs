use chrono::{Datelike, NaiveDate};

use crate::error::ExtractError;
use crate::model::{Weekday, WeeklyMenu};

const DAY_WIDTH: usize = 3;
const DISH_WIDTH: usize = 22;

pub const DISH_KINDS: [&str; 2] = ["Fleisch/Fisch", "Veggy"];
pub const DISH_EMOJI: [&str; 2] = [":cut_of_meat:", ":leafy_green:"];
pub const RATING_REACTIONS: [&str; 5] = [
    "frowning2",
    "neutral_face",
    "slightly_smiling_face",
    "smile",
    "star_struck",
];

/// Greedy word wrap; words longer than `width` are split.
#[must_use]
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word.chars().collect::<Vec<_>>();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }

        let used = line.chars().count();
        if used > 0 && used + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn rule(left: char, fill: char, middle: char, right: char) -> String {
    let fill = fill.to_string();
    format!(
        "{left}{}{middle}{}{right}\n",
        fill.repeat(DAY_WIDTH + 2),
        fill.repeat(DISH_WIDTH + 2)
    )
}

fn push_row(out: &mut String, day: &[String], dish: &[String]) {
    let height = day.len().max(dish.len()).max(1);
    for index in 0..height {
        let left = day.get(index).map_or("", String::as_str);
        let right = dish.get(index).map_or("", String::as_str);
        out.push_str(&format!(
            "│ {left:<day_width$} │ {right:<dish_width$} │\n",
            day_width = DAY_WIDTH,
            dish_width = DISH_WIDTH
        ));
    }
}

fn day_lines(menu: &WeeklyMenu, day: Weekday) -> Vec<String> {
    let mut lines = vec![day.short_label().to_string()];
    if let Some(date) = menu.date_of(day) {
        lines.push(date.format("%d.").to_string());
    }
    lines
}

/// Narrow two-column box table of the week, fenced as a code block so chat
/// clients render it monospaced.
#[must_use]
pub fn render_chat_table(menu: &WeeklyMenu) -> String {
    let month = menu
        .week_start
        .map(|date| date.format("%b").to_string())
        .unwrap_or_default();

    let mut table = rule('╒', '═', '╤', '╕');
    push_row(&mut table, &[month], &["Choices".to_string()]);
    table.push_str(&rule('╞', '═', '╪', '╡'));

    let rows = menu
        .iter()
        .flat_map(|(day, dishes)| {
            [
                (day_lines(menu, day), wrap_text(&dishes.meat_text(), DISH_WIDTH)),
                (Vec::new(), wrap_text(&dishes.vegetarian_text(), DISH_WIDTH)),
            ]
        })
        .collect::<Vec<_>>();
    for (index, (day, dish)) in rows.iter().enumerate() {
        if index > 0 {
            table.push_str(&rule('├', '─', '┼', '┤'));
        }
        push_row(&mut table, day, dish);
    }
    table.push_str(&rule('╘', '═', '╧', '╛'));

    format!("```\n{table}```")
}

#[must_use]
pub fn announcement_message(week_start: NaiveDate) -> String {
    format!(
        "Woche startet am {}. Auf den Plan klicken um Details zu sehen.",
        week_start.format("%d. %b")
    )
}

/// Feedback post for one dish of `date`; `dish` is 0 for meat and 1 for
/// vegetarian.
pub fn feedback_message(
    date: NaiveDate,
    dish: usize,
    image_url: &str,
) -> Result<String, ExtractError> {
    let weekday = date.weekday();
    let day = Weekday::from_chrono(weekday)
        .ok_or(ExtractError::Weekend(weekday.num_days_from_monday()))?;
    let kind = DISH_KINDS.get(dish).ok_or_else(|| {
        ExtractError::InvalidOption(format!("dish index {dish} out of range"))
    })?;
    Ok(format!(
        "**{} {}**\t- {kind} - {}. \nBenutze die Emojis um zu bewerten.\n\n{image_url}",
        day.german_name(),
        dish + 1,
        date.format("%d. %b")
    ))
}

pub fn menu_to_json(menu: &WeeklyMenu) -> Result<String, ExtractError> {
    Ok(serde_json::to_string_pretty(menu)?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::{
        announcement_message, feedback_message, menu_to_json, render_chat_table, wrap_text,
    };
    use crate::error::ExtractError;
    use crate::model::{DishPair, Weekday, WeeklyMenu};

    fn words(text: &str) -> Vec<String> {
        text.split(' ').map(str::to_string).collect()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 14).expect("valid date")
    }

    #[test]
    fn wraps_words_and_splits_long_ones() {
        assert_eq!(
            wrap_text("Schweinebraten mit Knödeln und Rotkohl", 22),
            vec!["Schweinebraten mit", "Knödeln und Rotkohl"]
        );
        assert_eq!(
            wrap_text("Donaudampfschifffahrtsgesellschaft", 22),
            vec!["Donaudampfschifffahrts", "gesellschaft"]
        );
        assert!(wrap_text("", 22).is_empty());
    }

    #[test]
    fn renders_fenced_box_table() {
        let mut menu = WeeklyMenu {
            week_start: Some(monday()),
            ..WeeklyMenu::default()
        };
        menu.insert(
            Weekday::Mo,
            DishPair::new(words("Gulasch mit Reis"), words("Linsen mit Brot")),
        );

        let table = render_chat_table(&menu);
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines.first(), Some(&"```"));
        assert_eq!(lines.last(), Some(&"```"));
        assert_eq!(lines[2], "│ Oct │ Choices                │");
        assert_eq!(lines[4], "│ Mo  │ Gulasch mit Reis       │");
        assert_eq!(lines[5], "│ 14. │                        │");
        assert_eq!(lines[7], "│     │ Linsen mit Brot        │");
        let widths = lines[1..lines.len() - 1]
            .iter()
            .map(|line| line.chars().count())
            .collect::<Vec<_>>();
        assert!(widths.iter().all(|width| *width == 32));
    }

    #[test]
    fn formats_chat_messages() {
        assert_eq!(
            announcement_message(monday()),
            "Woche startet am 14. Oct. Auf den Plan klicken um Details zu sehen."
        );
        let thursday = NaiveDate::from_ymd_opt(2024, 10, 17).expect("valid date");
        assert_eq!(
            feedback_message(thursday, 1, "https://cdn.example.org/x.png").expect("weekday"),
            "**Donnerstag 2**\t- Veggy - 17. Oct. \nBenutze die Emojis um zu bewerten.\n\nhttps://cdn.example.org/x.png"
        );
    }

    #[test]
    fn feedback_rejects_weekend_and_bad_dish() {
        let saturday = NaiveDate::from_ymd_opt(2024, 10, 19).expect("valid date");
        assert!(matches!(
            feedback_message(saturday, 0, "u"),
            Err(ExtractError::Weekend(5))
        ));
        assert!(matches!(
            feedback_message(monday(), 2, "u"),
            Err(ExtractError::InvalidOption(_))
        ));
    }

    #[test]
    fn serializes_menu_as_json() {
        let mut menu = WeeklyMenu::default();
        menu.insert(Weekday::Fr, DishPair::new(words("Lachs"), words("Risotto")));
        let json = menu_to_json(&menu).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["days"]["Fr"]["meat"][0], "Lachs");
        assert_eq!(value["week_start"], serde_json::Value::Null);
    }
}
