use std::str::FromStr;

use crate::normalize::BOILERPLATE_PHRASE;
use crate::table_parse::DEFAULT_COLUMN_TOLERANCE;

/// What to do with day rows found after Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    Truncate,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Ruled,
    Positional,
}

impl StrategyKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ruled => "ruled",
            Self::Positional => "positional",
        }
    }

    /// Parses a comma separated, ordered strategy list such as `ruled,positional`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, String> {
        let kinds = list
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Self::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if kinds.is_empty() {
            return Err("strategy list cannot be empty".to_string());
        }
        Ok(kinds)
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ruled" | "layout" | "lattice" => Ok(Self::Ruled),
            "positional" | "text" | "stream" => Ok(Self::Positional),
            other => Err(format!(
                "unknown strategy '{other}', expected ruled or positional"
            )),
        }
    }
}

/// Pixel geometry of the five-row weekly menu image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropLayout {
    pub padding_top: u32,
    pub padding_left: u32,
    pub padding: u32,
    pub box_height: u32,
    pub box_width: u32,
}

impl Default for CropLayout {
    fn default() -> Self {
        Self {
            padding_top: 265,
            padding_left: 118,
            padding: 9,
            box_height: 90,
            box_width: 210,
        }
    }
}

impl FromStr for CropLayout {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts = raw.split(',').map(str::trim).collect::<Vec<_>>();
        if parts.len() != 5 {
            return Err(format!(
                "invalid crop layout '{raw}', expected top,left,padding,height,width"
            ));
        }

        let mut values = [0_u32; 5];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid crop layout value: '{part}'"))?;
        }
        let [padding_top, padding_left, padding, box_height, box_width] = values;

        if box_height == 0 || box_width == 0 {
            return Err("crop boxes need a non-zero height and width".to_string());
        }

        Ok(Self {
            padding_top,
            padding_left,
            padding,
            box_height,
            box_width,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub strategies: Vec<StrategyKind>,
    pub overflow: OverflowPolicy,
    pub column_tolerance: f64,
    pub boilerplate: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strategies: vec![StrategyKind::Ruled, StrategyKind::Positional],
            overflow: OverflowPolicy::Truncate,
            column_tolerance: DEFAULT_COLUMN_TOLERANCE,
            boilerplate: BOILERPLATE_PHRASE.to_string(),
        }
    }
}
