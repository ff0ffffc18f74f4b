//! View model for a committed risk report.
//!
//! Every optional part of the response degrades to a placeholder or to an
//! omitted section; a report with only a severity still renders.

use std::fmt;

use chrono::NaiveDate;
use shared::domain::{Field, ForecastDay, ReliefLogistics, RiskReport};

use crate::{catalog::Catalog, dispatch::DispatchState};

pub const PLACEHOLDER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerTone {
    Danger,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityBanner {
    pub severity: String,
    pub tone: BannerTone,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPanel {
    pub city: String,
    pub province: String,
    pub population: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherPanel {
    pub temperature: String,
    pub condition: String,
    pub aqi: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastTile {
    pub day: String,
    pub max_temp: String,
    pub min_temp: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvacuationPlan {
    pub destination: Option<String>,
    pub plan: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTerminal {
    pub message: String,
    pub logistics: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchButton {
    pub label: &'static str,
    pub enabled: bool,
}

impl DispatchButton {
    pub fn for_state(state: DispatchState) -> Self {
        Self {
            label: state.button_label(),
            enabled: state.can_dispatch(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportView {
    pub banner: SeverityBanner,
    pub location: LocationPanel,
    pub weather: WeatherPanel,
    pub risk_levels: Vec<(String, String)>,
    pub recommendations: Vec<String>,
    pub forecast: Option<Vec<ForecastTile>>,
    pub survival_kit: Option<Vec<String>>,
    pub evacuation: Option<EvacuationPlan>,
    pub dispatch_terminal: Option<DispatchTerminal>,
}

impl ReportView {
    pub fn build(report: &RiskReport) -> Self {
        let high = report.is_high_severity();
        let city = display_name(Field::City, &report.city);
        let profession = display_name(Field::Profession, &report.profession);

        let banner = SeverityBanner {
            severity: text_or_placeholder(Some(report.overall_severity.as_str())),
            tone: if high {
                BannerTone::Danger
            } else {
                BannerTone::Warning
            },
            subtitle: format!("Personalized for a {profession} in {city}"),
        };

        let baseline = report.city_baseline.clone().unwrap_or_default();
        let location = LocationPanel {
            city,
            province: text_or_placeholder(baseline.province.as_deref()),
            population: baseline
                .population
                .map(group_thousands)
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        };

        let live = report.live_weather.clone().unwrap_or_default();
        let weather = WeatherPanel {
            temperature: live
                .temp
                .map(|t| format!("{}°C", format_number(t)))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            condition: text_or_placeholder(live.condition.as_deref()),
            aqi: live
                .aqi
                .map(|aqi| aqi.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        };

        let forecast = (!report.forecast_weather.is_empty())
            .then(|| report.forecast_weather.iter().map(forecast_tile).collect());

        let evacuation = if high {
            report
                .safe_cities
                .as_ref()
                .and_then(|targets| targets.first())
                .map(|target| EvacuationPlan {
                    destination: target.city.clone(),
                    plan: target.plan.clone(),
                })
        } else {
            None
        };

        let dispatch_terminal = if high {
            report
                .official_dispatch
                .as_ref()
                .map(|message| DispatchTerminal {
                    message: message.clone(),
                    logistics: report
                        .relief_logistics
                        .as_ref()
                        .map(logistics_lines)
                        .unwrap_or_default(),
                })
        } else {
            None
        };

        Self {
            banner,
            location,
            weather,
            risk_levels: report
                .risk_assessments
                .iter()
                .map(|(hazard, level)| (hazard.clone(), level.clone()))
                .collect(),
            recommendations: report
                .personalized_recommendations
                .iter()
                .map(|rec| rec.replacen("• ", "", 1).trim().to_string())
                .collect(),
            forecast,
            survival_kit: report.survival_kit.clone(),
            evacuation,
            dispatch_terminal,
        }
    }

    pub fn render(&self, dispatch: DispatchState) -> String {
        ReportText {
            view: self,
            dispatch,
        }
        .to_string()
    }
}

/// Plain-text layout of a report with the dispatch button in a given state.
pub struct ReportText<'a> {
    view: &'a ReportView,
    dispatch: DispatchState,
}

impl fmt::Display for ReportText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;
        let marker = match view.banner.tone {
            BannerTone::Danger => "!!",
            BannerTone::Warning => "!",
        };
        writeln!(f, "{marker} OVERALL SEVERITY: {}", view.banner.severity)?;
        writeln!(f, "   {}", view.banner.subtitle)?;
        writeln!(f)?;

        writeln!(f, "LOCATION")?;
        writeln!(f, "  {} ({}, PK)", view.location.city, view.location.province)?;
        writeln!(f, "  Pop: {}", view.location.population)?;
        writeln!(f, "LIVE WEATHER")?;
        writeln!(
            f,
            "  {}  {}  AQI: {}",
            view.weather.temperature, view.weather.condition, view.weather.aqi
        )?;

        if !view.risk_levels.is_empty() {
            writeln!(f, "RISK LEVELS")?;
            for (hazard, level) in &view.risk_levels {
                writeln!(f, "  {hazard}: {level}")?;
            }
        }

        if let Some(tiles) = &view.forecast {
            writeln!(f, "3-DAY FORECAST")?;
            for tile in tiles {
                writeln!(
                    f,
                    "  {:<8} {:>6} / {:<6} {}",
                    tile.day, tile.max_temp, tile.min_temp, tile.condition
                )?;
            }
        }

        writeln!(f, "SAFETY MEASURES")?;
        for (idx, rec) in view.recommendations.iter().enumerate() {
            writeln!(f, "  {}. {rec}", idx + 1)?;
        }

        if let Some(items) = &view.survival_kit {
            writeln!(f, "SURVIVAL KIT")?;
            for item in items {
                writeln!(f, "  [ ] {item}")?;
            }
        }

        if let Some(evacuation) = &view.evacuation {
            writeln!(f, "EVACUATION PLAN")?;
            if let Some(destination) = &evacuation.destination {
                writeln!(f, "  Destination: {destination}")?;
            }
            writeln!(f, "  {}", evacuation.plan)?;
        }

        if let Some(terminal) = &view.dispatch_terminal {
            let button = DispatchButton::for_state(self.dispatch);
            writeln!(f, "OFFICIAL DISPATCH")?;
            writeln!(f, "  > {}", terminal.message)?;
            for (label, value) in &terminal.logistics {
                writeln!(f, "  {label}: {value}")?;
            }
            let state = if button.enabled { "" } else { " (disabled)" };
            writeln!(f, "  [ {} ]{state}", button.label)?;
        }

        Ok(())
    }
}

fn forecast_tile(day: &ForecastDay) -> ForecastTile {
    ForecastTile {
        day: format_forecast_date(&day.date),
        max_temp: day
            .max_temp
            .map(|t| format!("{}°", format_number(t)))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        min_temp: day
            .min_temp
            .map(|t| format!("{}°", format_number(t)))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        condition: text_or_placeholder(day.condition.as_deref()),
    }
}

fn logistics_lines(tally: &ReliefLogistics) -> Vec<(&'static str, String)> {
    let count = |value: Option<u64>| {
        value
            .map(group_thousands)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    };
    vec![
        ("Water (L)", count(tally.water_liters)),
        ("Tents", count(tally.tents)),
        ("Medical kits", count(tally.medical_kits)),
    ]
}

/// Short weekday and day of month; the raw string when it is not a date.
pub fn format_forecast_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return PLACEHOLDER.to_string();
    }
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%a %-d").to_string(),
        Err(_) => trimmed.to_string(),
    }
}

fn display_name(field: Field, raw: &str) -> String {
    if let Some(entry) = Catalog::for_field(field).canonical(raw) {
        return entry.to_string();
    }
    let titled = raw
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    text_or_placeholder(Some(titled.as_str()))
}

fn text_or_placeholder(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
#[path = "tests/report_view_tests.rs"]
mod tests;
