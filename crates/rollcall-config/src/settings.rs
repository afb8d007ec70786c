//! Validated settings (converted from the raw schema)

use crate::schema::RawConfig;
use rollcall_util::{AcademicCalendar, MatricCodeTable};
use std::path::PathBuf;

/// Validated runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Data directory override, if configured
    pub data_dir: Option<PathBuf>,

    /// Academic calendar rules
    pub calendar: AcademicCalendar,

    /// Department code table for the matric parser
    pub matric_codes: MatricCodeTable,
}

impl Settings {
    /// Convert a validated raw config into settings, applying defaults.
    pub fn from_raw(raw: RawConfig) -> Self {
        let defaults = AcademicCalendar::default();
        let calendar = AcademicCalendar {
            cutover_month: raw.calendar.cutover_month.unwrap_or(defaults.cutover_month),
            transfer_credit_years: raw
                .calendar
                .transfer_credit_years
                .unwrap_or(defaults.transfer_credit_years),
        };

        let matric_codes = if raw.matric.codes.is_empty() {
            MatricCodeTable::builtin()
        } else {
            MatricCodeTable::new(raw.matric.codes)
        };

        Self {
            data_dir: raw.service.data_dir,
            calendar,
            matric_codes,
        }
    }

    /// Effective data directory, falling back to the platform default.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(rollcall_util::default_data_dir)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            calendar: AcademicCalendar::default(),
            matric_codes: MatricCodeTable::builtin(),
        }
    }
}
