//! The dashboard: static figures plus the interactive breakdown
//!
//! [`Dashboard::new`] builds every static figure once from the shared
//! [`Dataset`]. [`Dashboard::breakdown`] re-aggregates on each selection and
//! returns a fresh figure; nothing per-request is cached.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{count_by, mean_by, COUNT_COLUMN};
use crate::dataset::Dataset;
use crate::field::{AttitudeField, BreakdownRequest, Field, GroupField};
use crate::figure::{build_figure, BarMode, DisplayConfig, FacetConfig, Figure, FigureKind};
use crate::{DashError, Result};

/// Height of the interactive breakdown chart
pub const BREAKDOWN_HEIGHT: u32 = 600;

/// Figures computed once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticFigure {
    MeansBySex,
    Breadwinner,
    PrestigeIncome,
    IncomeBox,
    PrestigeBox,
    IncomeByPrestige,
}

impl StaticFigure {
    /// Page order
    pub const ALL: [StaticFigure; 6] = [
        StaticFigure::MeansBySex,
        StaticFigure::Breadwinner,
        StaticFigure::PrestigeIncome,
        StaticFigure::IncomeBox,
        StaticFigure::PrestigeBox,
        StaticFigure::IncomeByPrestige,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StaticFigure::MeansBySex => "means_by_sex",
            StaticFigure::Breadwinner => "breadwinner",
            StaticFigure::PrestigeIncome => "prestige_income",
            StaticFigure::IncomeBox => "income_box",
            StaticFigure::PrestigeBox => "prestige_box",
            StaticFigure::IncomeByPrestige => "income_by_prestige",
        }
    }

    /// Section heading shown above the figure
    pub fn heading(&self) -> &'static str {
        match self {
            StaticFigure::MeansBySex => {
                "Mean income, Occupational prestige, Socioeconomic index, and Years of Education across Sexes"
            }
            StaticFigure::Breadwinner => "Sentiment of Men as Breadwinners by Sex",
            StaticFigure::PrestigeIncome => "Income vs. Job Prestige",
            StaticFigure::IncomeBox => "Distribution of Income by Sex",
            StaticFigure::PrestigeBox => "Distribution of Job Prestige by Sex",
            StaticFigure::IncomeByPrestige => "Income Distribution by Sex and Job Prestige Category",
        }
    }
}

impl fmt::Display for StaticFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StaticFigure {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        StaticFigure::ALL
            .iter()
            .copied()
            .find(|figure| figure.name() == s)
            .ok_or_else(|| DashError::InvalidFieldError(format!("Unknown figure '{}'", s)))
    }
}

pub struct Dashboard {
    dataset: Arc<Dataset>,
    figures: Vec<(StaticFigure, Figure)>,
}

impl Dashboard {
    /// Build every static figure from `dataset`
    pub fn new(dataset: Arc<Dataset>) -> Result<Self> {
        let mut figures = Vec::with_capacity(StaticFigure::ALL.len());
        for which in StaticFigure::ALL {
            let figure = build_static(&dataset, which)?;
            debug!("Built static figure {} ({})", which, figure.kind());
            figures.push((which, figure));
        }
        info!(
            "Dashboard ready: {} static figures over {} respondents",
            figures.len(),
            dataset.height()
        );
        Ok(Self { dataset, figures })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// A static figure by name
    pub fn figure(&self, name: &str) -> Option<&Figure> {
        let which: StaticFigure = name.parse().ok()?;
        self.figures
            .iter()
            .find(|(key, _)| *key == which)
            .map(|(_, figure)| figure)
    }

    /// Static figures in page order
    pub fn figures(&self) -> impl Iterator<Item = (StaticFigure, &Figure)> {
        self.figures.iter().map(|(which, figure)| (*which, figure))
    }

    /// Count `request.feature` per `request.group` and chart it as grouped bars
    pub fn breakdown(&self, request: BreakdownRequest) -> Result<Figure> {
        let counts = count_by(&self.dataset, request.feature, request.group)?;
        debug!(
            "Breakdown {} by {}: {} bars",
            request.feature,
            request.group,
            counts.height()
        );
        let config = DisplayConfig::new()
            .x(request.feature.name())
            .y(COUNT_COLUMN)
            .color(request.group.name())
            .bar_mode(BarMode::Group);
        let mut figure = build_figure(&counts, FigureKind::GroupedBar, &config)?;
        figure.set_height(BREAKDOWN_HEIGHT);
        Ok(figure)
    }
}

fn build_static(dataset: &Dataset, which: StaticFigure) -> Result<Figure> {
    match which {
        StaticFigure::MeansBySex => {
            let means = mean_by(
                dataset,
                &[
                    Field::Income,
                    Field::JobPrestige,
                    Field::SocioeconomicIndex,
                    Field::Education,
                ],
                Field::Sex,
            )?;
            build_figure(&means, FigureKind::SummaryTable, &DisplayConfig::new())
        }
        StaticFigure::Breadwinner => {
            let counts = count_by(dataset, AttitudeField::MaleBreadwinner, GroupField::Sex)?;
            let config = DisplayConfig::new()
                .x(Field::MaleBreadwinner.name())
                .y(COUNT_COLUMN)
                .color(Field::Sex.name())
                .label(Field::MaleBreadwinner.name(), "Sentiment of Men as Breadwinners")
                .label(COUNT_COLUMN, "Number of Respondents")
                .bar_mode(BarMode::Stack);
            build_figure(&counts, FigureKind::GroupedBar, &config)
        }
        StaticFigure::PrestigeIncome => {
            let config = DisplayConfig::new()
                .x(Field::JobPrestige.name())
                .y(Field::Income.name())
                .color(Field::Sex.name())
                .tooltip(Field::Education.name())
                .tooltip(Field::SocioeconomicIndex.name())
                .label(Field::JobPrestige.name(), "Job Prestige")
                .label(Field::Income.name(), "Income");
            build_figure(dataset.frame(), FigureKind::ScatterWithTrend, &config)
        }
        StaticFigure::IncomeBox | StaticFigure::PrestigeBox => {
            let value = if which == StaticFigure::IncomeBox {
                Field::Income
            } else {
                Field::JobPrestige
            };
            let config = DisplayConfig::new()
                .x(Field::Sex.name())
                .y(value.name())
                .color(Field::Sex.name())
                .label(Field::Sex.name(), "Sex")
                .label(Field::Income.name(), "Income")
                .label(Field::JobPrestige.name(), "Job Prestige")
                .show_legend(false);
            build_figure(&income_prestige(dataset)?, FigureKind::Box, &config)
        }
        StaticFigure::IncomeByPrestige => {
            let facet = FacetConfig::new(Field::JobPrestige.name());
            let config = DisplayConfig::new()
                .x(Field::Sex.name())
                .y(Field::Income.name())
                .color(Field::Sex.name())
                .label(Field::Sex.name(), "Sex")
                .label(Field::Income.name(), "Income")
                .label(facet.bucket_column(), "Job Prestige Category")
                .facet(facet);
            // Buckets come from the whole job_prestige column
            let frame = dataset.frame().select([
                Field::Sex.name(),
                Field::Income.name(),
                Field::JobPrestige.name(),
            ])?;
            build_figure(&frame, FigureKind::FacetedBox, &config)
        }
    }
}

/// Respondents with sex, income and job prestige all present
fn income_prestige(dataset: &Dataset) -> Result<DataFrame> {
    let (sex, income, prestige) = (
        Field::Sex.name(),
        Field::Income.name(),
        Field::JobPrestige.name(),
    );
    for field in [Field::Sex, Field::Income, Field::JobPrestige] {
        dataset.column(field)?;
    }
    Ok(dataset
        .frame()
        .clone()
        .lazy()
        .select([col(sex), col(income), col(prestige)])
        .filter(
            col(sex)
                .is_not_null()
                .and(col(income).is_not_null())
                .and(col(prestige).is_not_null()),
        )
        .collect()?)
}
