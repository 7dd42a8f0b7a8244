use crate::model::Weekday;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    StrategyFallback,
    ExtraDayRowsDropped,
    DuplicateWeekday,
    UnparsedDayLabel,
    UnknownWeekDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub strategy: Option<&'static str>,
    pub row: Option<usize>,
    pub weekday: Option<Weekday>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            strategy: None,
            row: None,
            weekday: None,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: &'static str) -> Self {
        self.strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    #[must_use]
    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekday = Some(weekday);
        self
    }
}
