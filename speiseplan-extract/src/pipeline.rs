use tracing::{debug, info, warn};

use crate::document::MenuDocument;
use crate::error::ExtractError;
use crate::model::WeeklyMenu;
use crate::options::{ExtractOptions, StrategyKind};
use crate::positional::PositionalStrategy;
use crate::ruled_table::RuledTableStrategy;
use crate::warning::{ExtractWarning, WarningCode};
use crate::week::week_start_from_text;

/// One way of turning a menu document into a weekly menu.
pub trait MenuStrategy {
    fn name(&self) -> &'static str;

    fn extract(
        &self,
        document: &MenuDocument,
        options: &ExtractOptions,
        warnings: &mut Vec<ExtractWarning>,
    ) -> Result<WeeklyMenu, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    TryLayout,
    TryPositional,
    Done,
    Failed,
}

impl PipelineState {
    fn attempting(strategy: &str) -> Self {
        if strategy == StrategyKind::Ruled.name() {
            Self::TryLayout
        } else {
            Self::TryPositional
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub strategy: &'static str,
    pub attempts: Vec<&'static str>,
    pub state: PipelineState,
    pub day_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuExtraction {
    pub menu: WeeklyMenu,
    pub report: ExtractionReport,
}

/// Ordered strategy chain. The first strategy that yields a non-empty menu
/// wins; recoverable failures fall through to the next one.
pub struct MenuPipeline {
    strategies: Vec<Box<dyn MenuStrategy>>,
}

impl Default for MenuPipeline {
    fn default() -> Self {
        Self::from_kinds(&ExtractOptions::default().strategies)
    }
}

impl MenuPipeline {
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn MenuStrategy>>) -> Self {
        Self { strategies }
    }

    #[must_use]
    pub fn from_kinds(kinds: &[StrategyKind]) -> Self {
        let strategies = kinds
            .iter()
            .map(|kind| -> Box<dyn MenuStrategy> {
                match kind {
                    StrategyKind::Ruled => Box::new(RuledTableStrategy),
                    StrategyKind::Positional => Box::new(PositionalStrategy),
                }
            })
            .collect();
        Self::new(strategies)
    }

    pub fn extract(
        &self,
        document: &MenuDocument,
        options: &ExtractOptions,
    ) -> Result<MenuExtraction, ExtractError> {
        if self.strategies.is_empty() {
            return Err(ExtractError::InvalidOption(
                "at least one extraction strategy is required".to_string(),
            ));
        }

        let mut warnings = Vec::new();
        let mut attempts = Vec::new();
        let mut last_error = None;

        for strategy in &self.strategies {
            let name = strategy.name();
            let state = PipelineState::attempting(name);
            debug!(strategy = name, ?state, "trying extraction strategy");
            attempts.push(name);

            let result = strategy
                .extract(document, options, &mut warnings)
                .and_then(|menu| {
                    if menu.is_empty() {
                        Err(ExtractError::failed(name, "no menu rows found"))
                    } else {
                        Ok(menu)
                    }
                });

            match result {
                Ok(mut menu) => {
                    menu.week_start = detect_week_start(document, &mut warnings);
                    info!(strategy = name, days = menu.len(), "extracted weekly menu");
                    let report = ExtractionReport {
                        strategy: name,
                        attempts,
                        state: PipelineState::Done,
                        day_count: menu.len(),
                        warnings,
                    };
                    return Ok(MenuExtraction { menu, report });
                }
                Err(error) if error.is_recoverable() => {
                    warn!(strategy = name, %error, "extraction strategy failed, falling back");
                    warnings.push(
                        ExtractWarning::new(WarningCode::StrategyFallback, error.to_string())
                            .with_strategy(name),
                    );
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        debug!(state = ?PipelineState::Failed, ?attempts, "every extraction strategy failed");
        Err(last_error.unwrap_or_else(|| {
            ExtractError::InvalidOption("no extraction strategy ran".to_string())
        }))
    }
}

/// Monday of the week printed in the document text.
///
/// An unreadable date yields `None` plus an `UnknownWeekDate` warning. The
/// `unknown_week_start` sentinel is reserved for link dating in
/// [`crate::week::menu_week_start`].
fn detect_week_start(
    document: &MenuDocument,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<chrono::NaiveDate> {
    let found = document
        .text()
        .ok_or_else(|| ExtractError::FormatMismatch("document text unavailable".to_string()))
        .and_then(week_start_from_text);
    match found {
        Ok(date) => Some(date),
        Err(error) => {
            debug!(%error, "week start unknown");
            warnings.push(ExtractWarning::new(
                WarningCode::UnknownWeekDate,
                format!("week start unknown: {error}"),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::{MenuPipeline, MenuStrategy, PipelineState};
    use crate::document::MenuDocument;
    use crate::error::ExtractError;
    use crate::model::{DishPair, PageLayout, Weekday, WeeklyMenu};
    use crate::options::ExtractOptions;
    use crate::warning::{ExtractWarning, WarningCode};

    enum Outcome {
        Fail,
        Empty,
        Menu,
        Fatal,
    }

    struct Stub {
        name: &'static str,
        outcome: Outcome,
    }

    impl Stub {
        fn boxed(name: &'static str, outcome: Outcome) -> Box<dyn MenuStrategy> {
            Box::new(Self { name, outcome })
        }
    }

    impl MenuStrategy for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn extract(
            &self,
            _document: &MenuDocument,
            _options: &ExtractOptions,
            _warnings: &mut Vec<ExtractWarning>,
        ) -> Result<WeeklyMenu, ExtractError> {
            match self.outcome {
                Outcome::Fail => Err(ExtractError::failed(self.name, "no table")),
                Outcome::Empty => Ok(WeeklyMenu::default()),
                Outcome::Fatal => Err(ExtractError::InvalidOption("broken".to_string())),
                Outcome::Menu => {
                    let mut menu = WeeklyMenu::default();
                    menu.insert(
                        Weekday::Mo,
                        DishPair::new(vec![self.name.to_string()], Vec::new()),
                    );
                    Ok(menu)
                }
            }
        }
    }

    fn document() -> MenuDocument {
        MenuDocument::from_layout(PageLayout::default()).with_text("Speiseplan 16.10.2024")
    }

    #[test]
    fn first_success_wins() {
        let pipeline = MenuPipeline::new(vec![
            Stub::boxed("ruled", Outcome::Menu),
            Stub::boxed("positional", Outcome::Menu),
        ]);
        let extraction = pipeline
            .extract(&document(), &ExtractOptions::default())
            .expect("first strategy succeeds");

        assert_eq!(extraction.report.strategy, "ruled");
        assert_eq!(extraction.report.attempts, vec!["ruled"]);
        assert_eq!(extraction.report.state, PipelineState::Done);
        assert_eq!(
            extraction.menu.week_start,
            NaiveDate::from_ymd_opt(2024, 10, 14)
        );
    }

    #[test]
    fn failure_and_empty_menu_fall_back() {
        let pipeline = MenuPipeline::new(vec![
            Stub::boxed("ruled", Outcome::Fail),
            Stub::boxed("positional", Outcome::Empty),
            Stub::boxed("third", Outcome::Menu),
        ]);
        let extraction = pipeline
            .extract(&document(), &ExtractOptions::default())
            .expect("third strategy succeeds");

        assert_eq!(extraction.report.strategy, "third");
        assert_eq!(extraction.report.attempts, vec!["ruled", "positional", "third"]);
        let fallbacks = extraction
            .report
            .warnings
            .iter()
            .filter(|warning| warning.code == WarningCode::StrategyFallback)
            .count();
        assert_eq!(fallbacks, 2);
    }

    #[test]
    fn all_failures_surface_last_error() {
        let pipeline = MenuPipeline::new(vec![
            Stub::boxed("ruled", Outcome::Fail),
            Stub::boxed("positional", Outcome::Fail),
        ]);
        let error = pipeline
            .extract(&document(), &ExtractOptions::default())
            .expect_err("both strategies fail");
        assert!(matches!(
            error,
            ExtractError::ExtractionFailed { strategy: "positional", .. }
        ));
    }

    #[test]
    fn fatal_errors_stop_the_chain() {
        let pipeline = MenuPipeline::new(vec![
            Stub::boxed("ruled", Outcome::Fatal),
            Stub::boxed("positional", Outcome::Menu),
        ]);
        let error = pipeline
            .extract(&document(), &ExtractOptions::default())
            .expect_err("fatal error propagates");
        assert!(matches!(error, ExtractError::InvalidOption(_)));
    }

    #[test]
    fn missing_week_date_is_a_warning() {
        let pipeline = MenuPipeline::new(vec![Stub::boxed("ruled", Outcome::Menu)]);
        let extraction = pipeline
            .extract(
                &MenuDocument::from_layout(PageLayout::default()),
                &ExtractOptions::default(),
            )
            .expect("strategy succeeds");

        assert_eq!(extraction.menu.week_start, None);
        assert_eq!(extraction.report.warnings[0].code, WarningCode::UnknownWeekDate);
    }

    #[test]
    fn empty_chain_is_invalid() {
        let error = MenuPipeline::new(Vec::new())
            .extract(&document(), &ExtractOptions::default())
            .expect_err("empty chain fails");
        assert!(matches!(error, ExtractError::InvalidOption(_)));
    }
}
