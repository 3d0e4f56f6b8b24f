use crate::utils::error::{EtlError, Result};
use chrono::{Datelike, NaiveDate, Weekday};

const WEEKDAY_NAMES: [(&str, Weekday); 7] = [
    ("Monday", Weekday::Mon),
    ("Tuesday", Weekday::Tue),
    ("Wednesday", Weekday::Wed),
    ("Thursday", Weekday::Thu),
    ("Friday", Weekday::Fri),
    ("Saturday", Weekday::Sat),
    ("Sunday", Weekday::Sun),
];

/// Parses one of the seven canonical English weekday names. Case-sensitive.
pub fn parse_weekday(name: &str) -> Result<Weekday> {
    WEEKDAY_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, weekday)| *weekday)
        .ok_or_else(|| EtlError::MalformedRecordError {
            field: "day".to_string(),
            value: name.to_string(),
            reason: "expected a weekday name such as 'Monday'".to_string(),
        })
}

/// Days from a start date to the nearest date on or after it falling on each weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayOffsets {
    start: NaiveDate,
    offsets: [u32; 7],
}

impl WeekdayOffsets {
    pub fn from_start(start: NaiveDate) -> Self {
        let base = start.weekday().num_days_from_monday();
        let mut offsets = [0; 7];
        for (_, weekday) in WEEKDAY_NAMES {
            let index = weekday.num_days_from_monday();
            offsets[index as usize] = (index + 7 - base) % 7;
        }
        Self { start, offsets }
    }

    pub fn offset(&self, weekday: Weekday) -> u32 {
        self.offsets[weekday.num_days_from_monday() as usize]
    }

    pub fn offset_for_name(&self, name: &str) -> Result<u32> {
        parse_weekday(name).map(|weekday| self.offset(weekday))
    }

    pub fn first_occurrence(&self, name: &str) -> Result<NaiveDate> {
        let offset = self.offset_for_name(name)?;
        self.start
            .checked_add_days(chrono::Days::new(u64::from(offset)))
            .ok_or_else(|| EtlError::MalformedRecordError {
                field: "day".to_string(),
                value: name.to_string(),
                reason: format!("no date {} days after {}", offset, self.start),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_land_on_matching_weekday_for_every_start() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for shift in 0..14 {
            let start = first + chrono::Duration::days(shift);
            let offsets = WeekdayOffsets::from_start(start);
            for (name, weekday) in WEEKDAY_NAMES {
                let offset = offsets.offset_for_name(name).unwrap();
                assert!(offset < 7, "offset {} for {} from {}", offset, name, start);
                let date = offsets.first_occurrence(name).unwrap();
                assert_eq!(date.weekday(), weekday);
                assert!(date >= start);
            }
        }
    }

    #[test]
    fn test_start_weekday_has_zero_offset() {
        // 2024-01-03 is a Wednesday
        let offsets = WeekdayOffsets::from_start(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(offsets.offset(Weekday::Wed), 0);
        assert_eq!(offsets.offset(Weekday::Sun), 4);
        assert_eq!(offsets.offset(Weekday::Mon), 5);
        assert_eq!(offsets.offset(Weekday::Tue), 6);
    }

    #[test]
    fn test_unknown_day_name_is_malformed() {
        let offsets = WeekdayOffsets::from_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(matches!(
            offsets.offset_for_name("monday"),
            Err(EtlError::MalformedRecordError { .. })
        ));
        assert!(offsets.offset_for_name("Mon").is_err());
        assert!(offsets.offset_for_name("").is_err());
    }
}
