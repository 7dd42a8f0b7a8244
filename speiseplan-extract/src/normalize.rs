//! Cleaning rules for menu cell text.
//!
//! Menu cells carry layout artifacts (line breaks, brackets, digits), allergen
//! and additive markers such as `GLUTEN` or `A3`, and recurring boilerplate.
//! Everything here is a pure function of its input.

pub const BOILERPLATE_PHRASE: &str = "Heute hausgemacht!";

const ARTIFACT_PATTERNS: [&str; 16] = [
    "\n", "(", ")", ",", ";", "   ", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
];

const EMPTY_ROW_MARKERS: [&str; 2] = ["hausgemacht", "heute"];
const EMPTY_ROW_MAX_LEN: usize = 5;

fn is_kept_char(ch: char) -> bool {
    ch.is_ascii() || ch.to_lowercase().all(|lower| matches!(lower, 'ä' | 'ü' | 'ö' | 'ß'))
}

#[must_use]
pub fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if previous_space {
                continue;
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
        out.push(ch);
    }
    out
}

/// Replaces layout artifacts with spaces, drops characters outside ASCII and
/// the German umlauts, and collapses space runs. Idempotent.
#[must_use]
pub fn strip_artifacts(cell: &str) -> String {
    let mut text = cell.to_string();
    for pattern in ARTIFACT_PATTERNS {
        text = text.replace(pattern, " ");
    }
    let kept = text.chars().filter(|ch| is_kept_char(*ch)).collect::<String>();
    collapse_spaces(&kept)
}

/// Allergen and additive markers are all-uppercase or purely numeric tokens.
#[must_use]
pub fn is_allergen_token(word: &str) -> bool {
    let token = word.replace([',', ';'], "");
    if token.is_empty() {
        return false;
    }

    let has_cased = token.chars().any(|ch| ch.is_uppercase() || ch.is_lowercase());
    let all_upper = has_cased && !token.chars().any(char::is_lowercase);
    let numeric = token.chars().all(char::is_numeric);
    all_upper || numeric
}

/// A row is noise when fewer than six letters remain once the `hausgemacht`
/// and `heute` markers are removed.
#[must_use]
pub fn is_row_empty<S: AsRef<str>>(cells: &[S]) -> bool {
    let joined = cells
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");
    let mut letters = joined
        .chars()
        .filter(char::is_ascii_alphabetic)
        .collect::<String>()
        .to_ascii_lowercase();
    for marker in EMPTY_ROW_MARKERS {
        letters = letters.replace(marker, "");
    }
    letters.len() <= EMPTY_ROW_MAX_LEN
}

/// Replaces allergen tokens with empty slots so the join keeps its spacing.
#[must_use]
pub fn blank_allergen_tokens(text: &str) -> String {
    let joined = text
        .split(' ')
        .map(|word| if is_allergen_token(word) { "" } else { word })
        .collect::<Vec<_>>()
        .join(" ");
    collapse_spaces(&joined)
}

/// Full cell-to-token cleaning shared by both extraction strategies.
#[must_use]
pub fn dish_tokens(cell: &str, boilerplate: &str) -> Vec<String> {
    let stripped = strip_artifacts(cell);
    let without_boilerplate = if boilerplate.is_empty() {
        stripped
    } else {
        stripped.replace(boilerplate, "")
    };

    blank_allergen_tokens(&without_boilerplate)
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .map(str::to_string)
        .collect()
}
