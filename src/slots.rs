//! Slot grid generator and canonical/display time conversion.
//!
//! Every bookable day has the same fixed grid: four morning slots
//! (08:00–12:00) and four afternoon slots (14:00–18:00), one hour each.
//! Slots are stateless value objects regenerated per viewed date — the
//! grid itself never consults reservations or the clock. Filtering
//! elapsed morning slots on "today" is the availability resolver's job.
//!
//! Two forms of every slot time:
//! - canonical: 24-hour `HH:MM` string (`"08:00"`) — the wire format
//! - display: 12-hour range (`"8:00 AM - 9:00 AM"`) — what the patient sees
//!
//! Conversion is an exact inverse both ways for all grid times, with the
//! noon/midnight ambiguity handled explicitly (hour 0 → 12 AM, hour 12 → 12 PM).

use chrono::{NaiveTime, Timelike};

/// Starting hours of the fixed daily grid, chronological.
const GRID_HOURS: [u32; 8] = [8, 9, 10, 11, 14, 15, 16, 17];

/// First afternoon hour — anything earlier is a morning slot.
pub const AFTERNOON_START_HOUR: u32 = 14;

/// Hour at which morning slots stop being offered for "today".
pub const MORNING_CUTOFF_HOUR: u32 = 12;

// ═══════════════════════════════════════════════════════════
// TimeSlot
// ═══════════════════════════════════════════════════════════

/// A half-open one-hour interval identified by its start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    start: NaiveTime,
}

impl TimeSlot {
    /// Build a slot from a grid hour. Returns None for hours outside the grid.
    pub fn from_hour(hour: u32) -> Option<Self> {
        if !GRID_HOURS.contains(&hour) {
            return None;
        }
        Some(Self {
            start: NaiveTime::from_hms_opt(hour, 0, 0)?,
        })
    }

    /// Parse a canonical `HH:MM` string. Returns None for non-grid times.
    pub fn from_canonical(canonical: &str) -> Option<Self> {
        let time = NaiveTime::parse_from_str(canonical, "%H:%M").ok()?;
        if time.minute() != 0 {
            return None;
        }
        Self::from_hour(time.hour())
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn hour(&self) -> u32 {
        self.start.hour()
    }

    pub fn is_morning(&self) -> bool {
        self.hour() < AFTERNOON_START_HOUR
    }

    /// Canonical 24-hour wire form, e.g. `"08:00"`.
    pub fn canonical(&self) -> String {
        format!("{:02}:00", self.hour())
    }

    /// Human display range, e.g. `"8:00 AM - 9:00 AM"`.
    pub fn display(&self) -> String {
        format!(
            "{} - {}",
            format_12h(self.hour()),
            format_12h(self.hour() + 1)
        )
    }
}

// ═══════════════════════════════════════════════════════════
// Grid
// ═══════════════════════════════════════════════════════════

/// The full fixed grid for any day: 8 slots, 4 morning + 4 afternoon,
/// chronological. Pure — no date, no clock, no I/O.
pub fn slot_grid() -> Vec<TimeSlot> {
    GRID_HOURS
        .iter()
        .map(|&h| TimeSlot::from_hour(h).expect("grid hour is always valid"))
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Canonical ⇄ display conversion
// ═══════════════════════════════════════════════════════════

/// Format an hour-on-the-hour in 12-hour clock form.
///
/// Hour 0 is `12:00 AM`, hour 12 is `12:00 PM` — the two faces of "12"
/// that make the 12-hour clock ambiguous without a meridiem.
fn format_12h(hour: u32) -> String {
    let hour = hour % 24;
    let (h12, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{}:00 {}", h12, meridiem)
}

/// Parse a 12-hour `H:MM AM/PM` string back to a 24-hour hour value.
fn parse_12h(text: &str) -> Option<u32> {
    let (time_part, meridiem) = text.trim().rsplit_once(' ')?;
    let (hour_str, minute_str) = time_part.split_once(':')?;
    let h12: u32 = hour_str.parse().ok()?;
    if minute_str != "00" || h12 == 0 || h12 > 12 {
        return None;
    }
    match meridiem {
        "AM" => Some(if h12 == 12 { 0 } else { h12 }),
        "PM" => Some(if h12 == 12 { 12 } else { h12 + 12 }),
        _ => None,
    }
}

/// Canonical `"08:00"` → display `"8:00 AM - 9:00 AM"`.
pub fn canonical_to_display(canonical: &str) -> Option<String> {
    TimeSlot::from_canonical(canonical).map(|s| s.display())
}

/// Display `"8:00 AM - 9:00 AM"` → canonical `"08:00"`.
pub fn display_to_canonical(display: &str) -> Option<String> {
    let (start_part, _end_part) = display.split_once(" - ")?;
    let hour = parse_12h(start_part)?;
    let slot = TimeSlot::from_hour(hour)?;
    Some(slot.canonical())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_exactly_eight_slots() {
        let grid = slot_grid();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid.iter().filter(|s| s.is_morning()).count(), 4);
        assert_eq!(grid.iter().filter(|s| !s.is_morning()).count(), 4);
    }

    #[test]
    fn grid_is_chronological() {
        let grid = slot_grid();
        for pair in grid.windows(2) {
            assert!(pair[0].start() < pair[1].start());
        }
    }

    #[test]
    fn canonical_forms_match_wire_contract() {
        let canonicals: Vec<String> = slot_grid().iter().map(|s| s.canonical()).collect();
        assert_eq!(
            canonicals,
            vec!["08:00", "09:00", "10:00", "11:00", "14:00", "15:00", "16:00", "17:00"]
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(
            TimeSlot::from_hour(8).unwrap().display(),
            "8:00 AM - 9:00 AM"
        );
        assert_eq!(
            TimeSlot::from_hour(11).unwrap().display(),
            "11:00 AM - 12:00 PM",
            "end of last morning slot crosses noon"
        );
        assert_eq!(
            TimeSlot::from_hour(14).unwrap().display(),
            "2:00 PM - 3:00 PM"
        );
        assert_eq!(
            TimeSlot::from_hour(17).unwrap().display(),
            "5:00 PM - 6:00 PM"
        );
    }

    #[test]
    fn canonical_display_round_trip_all_grid_times() {
        for slot in slot_grid() {
            let canonical = slot.canonical();
            let display = canonical_to_display(&canonical).unwrap();
            assert_eq!(display_to_canonical(&display).unwrap(), canonical);
        }
    }

    #[test]
    fn twelve_hour_boundaries() {
        // Midnight and noon are the ambiguous 12s.
        assert_eq!(format_12h(0), "12:00 AM");
        assert_eq!(format_12h(12), "12:00 PM");
        assert_eq!(parse_12h("12:00 AM"), Some(0));
        assert_eq!(parse_12h("12:00 PM"), Some(12));
    }

    #[test]
    fn non_grid_times_rejected() {
        assert!(TimeSlot::from_hour(12).is_none(), "noon is the lunch gap");
        assert!(TimeSlot::from_hour(13).is_none());
        assert!(TimeSlot::from_hour(7).is_none());
        assert!(TimeSlot::from_canonical("08:30").is_none());
        assert!(TimeSlot::from_canonical("18:00").is_none());
        assert!(TimeSlot::from_canonical("garbage").is_none());
    }

    #[test]
    fn malformed_display_rejected() {
        assert!(display_to_canonical("8:00 AM").is_none(), "missing range");
        assert!(display_to_canonical("0:00 AM - 1:00 AM").is_none());
        assert!(display_to_canonical("13:00 PM - 14:00 PM").is_none());
    }
}
