// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fmt, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr, VariantArray};

use crate::jalali::{JalaliDate, YearMonth};

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    IntoStaticStr,
    VariantArray,
)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    #[strum(serialize = "Single Month")]
    Month,
    #[strum(serialize = "Full Year")]
    Year,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.into())
    }
}

/// UI state that persists between application runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub last_year: Option<i32>,
    #[serde(default)]
    pub last_month: Option<u32>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub view_mode: ViewMode,
}

impl Settings {
    /// Reads the settings file. A missing file gives the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let reader = std::fs::File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
        let settings = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse settings in {path:?}"))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {path:?}"))?;
        log::debug!("Saved settings to {path:?}");
        Ok(())
    }

    /// The month to open on: the last one shown, or the current one.
    pub fn start_month(&self, today: JalaliDate) -> YearMonth {
        match (self.last_year, self.last_month) {
            (Some(year), Some(month)) => YearMonth::new(year, month).unwrap_or_else(|err| {
                log::warn!("Ignoring stored month: {err}");
                today.year_month()
            }),
            _ => today.year_month(),
        }
    }

    pub fn remember(&mut self, shown: YearMonth) {
        self.last_year = Some(shown.year);
        self.last_month = Some(shown.month);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> JalaliDate {
        JalaliDate::new(1404, 7, 25).unwrap()
    }

    #[test]
    fn reads_two_field_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"last_year": 1402, "last_month": 11}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.view_mode, ViewMode::Month);
        assert!(!settings.dark_mode);
        assert_eq!(
            settings.start_month(today()),
            YearMonth::new(1402, 11).unwrap()
        );
    }

    #[test]
    fn falls_back_to_today() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.start_month(today()), YearMonth::new(1404, 7).unwrap());

        let partial = Settings {
            last_year: Some(1400),
            ..Settings::default()
        };
        assert_eq!(partial.start_month(today()), YearMonth::new(1404, 7).unwrap());

        let broken = Settings {
            last_year: Some(1400),
            last_month: Some(0),
            ..Settings::default()
        };
        assert_eq!(broken.start_month(today()), YearMonth::new(1404, 7).unwrap());

        let far = Settings {
            last_year: Some(300_000),
            last_month: Some(1),
            ..Settings::default()
        };
        assert_eq!(far.start_month(today()), YearMonth::new(1404, 7).unwrap());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings {
            dark_mode: true,
            view_mode: ViewMode::Year,
            ..Settings::default()
        };
        settings.remember(YearMonth::new(1403, 12).unwrap());
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"view_mode\": \"year\""));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn view_mode_labels() {
        assert_eq!(ViewMode::Month.to_string(), "Single Month");
        assert_eq!(ViewMode::VARIANTS, &[ViewMode::Month, ViewMode::Year]);
    }
}
