use chrono::{Days, Local, NaiveDate};

/// Tracks which day's readings are displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayNavigator {
    current: NaiveDate,
    today: NaiveDate,
}

impl DayNavigator {
    /// Start on the local calendar day
    pub fn new() -> Self {
        Self::starting_at(Local::now().date_naive())
    }

    pub fn starting_at(today: NaiveDate) -> Self {
        Self {
            current: today,
            today,
        }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    pub fn is_today(&self) -> bool {
        self.current == self.today
    }

    /// Advance one day. Saturates at the end of chrono's calendar.
    pub fn next_day(&mut self) -> NaiveDate {
        if let Some(date) = self.current.checked_add_days(Days::new(1)) {
            self.current = date;
        }
        self.current
    }

    pub fn previous_day(&mut self) -> NaiveDate {
        if let Some(date) = self.current.checked_sub_days(Days::new(1)) {
            self.current = date;
        }
        self.current
    }

    pub fn go_to_today(&mut self) -> NaiveDate {
        self.current = self.today;
        self.current
    }

    pub fn jump_to(&mut self, date: NaiveDate) -> NaiveDate {
        self.current = date;
        self.current
    }

    /// Long natural-language label sent to the generator, e.g. "Wednesday 14 October 2026"
    pub fn label(&self) -> String {
        long_label(self.current)
    }

    /// Short header label, e.g. "Wed 14 Oct"
    pub fn short_label(&self) -> String {
        self.current.format("%a %-d %b").to_string()
    }
}

impl Default for DayNavigator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn long_label(date: NaiveDate) -> String {
    date.format("%A %-d %B %Y").to_string()
}

/// Parse a `YYYY-MM-DD` date as typed on the command line
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_navigation_steps() {
        let mut nav = DayNavigator::starting_at(date(2026, 10, 14));
        assert!(nav.is_today());

        assert_eq!(nav.next_day(), date(2026, 10, 15));
        assert!(!nav.is_today());
        assert_eq!(nav.previous_day(), date(2026, 10, 14));
        assert_eq!(nav.previous_day(), date(2026, 10, 13));

        assert_eq!(nav.go_to_today(), date(2026, 10, 14));
        assert!(nav.is_today());
    }

    #[test]
    fn test_navigation_crosses_month_and_year() {
        let mut nav = DayNavigator::starting_at(date(2026, 12, 31));
        assert_eq!(nav.next_day(), date(2027, 1, 1));

        nav.jump_to(date(2024, 3, 1));
        assert_eq!(nav.previous_day(), date(2024, 2, 29));
    }

    #[test]
    fn test_labels() {
        let nav = DayNavigator::starting_at(date(2026, 10, 4));
        assert_eq!(nav.label(), "Sunday 4 October 2026");
        assert_eq!(nav.short_label(), "Sun 4 Oct");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2026-12-25"), Some(date(2026, 12, 25)));
        assert_eq!(parse_date(" 2026-01-02 "), Some(date(2026, 1, 2)));
        assert_eq!(parse_date("25/12/2026"), None);
        assert_eq!(parse_date("2026-02-30"), None);
    }
}
