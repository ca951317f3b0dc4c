//! Selection cart — the ordered set of chosen (date, slot) pairs.
//!
//! The cart is session-scoped and transient: built from the availability
//! view by user interaction, destroyed on submission, cancellation,
//! explicit clear, or cache expiry. `toggle` is the sole mutation entry
//! point, which keeps the exactly-once-per-slot invariant by construction:
//! no add/remove pair can ever disagree about membership.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::slots::TimeSlot;

/// One chosen appointment slot, carrying both wire and display forms so
/// the confirmation view and error messages never re-derive them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub date: NaiveDate,
    /// Canonical `HH:MM` start.
    pub canonical: String,
    /// e.g. `"Mon, Mar 10"`.
    pub display_date: String,
    /// e.g. `"9:00 AM - 10:00 AM"`.
    pub display_time: String,
}

impl Selection {
    fn new(date: NaiveDate, slot: &TimeSlot) -> Self {
        Self {
            date,
            canonical: slot.canonical(),
            display_date: date.format("%a, %b %-d").to_string(),
            display_time: slot.display(),
        }
    }
}

/// Ordered collection of selections, unique per (date, canonical time).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionCart {
    items: Vec<Selection>,
}

impl SelectionCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from cached selections (wizard cache restore).
    pub fn from_items(items: Vec<Selection>) -> Self {
        Self { items }
    }

    /// Add the slot if absent, remove it if present. The only mutation
    /// besides `clear`.
    pub fn toggle(&mut self, date: NaiveDate, slot: &TimeSlot) {
        let canonical = slot.canonical();
        if let Some(pos) = self
            .items
            .iter()
            .position(|s| s.date == date && s.canonical == canonical)
        {
            self.items.remove(pos);
        } else {
            self.items.push(Selection::new(date, slot));
        }
    }

    /// Membership by (date, canonical time).
    pub fn is_selected(&self, date: NaiveDate, slot: &TimeSlot) -> bool {
        let canonical = slot.canonical();
        self.items
            .iter()
            .any(|s| s.date == date && s.canonical == canonical)
    }

    /// True if any selection falls on the date — drives the calendar's
    /// "has bookings" marker.
    pub fn date_has_selections(&self, date: NaiveDate) -> bool {
        self.items.iter().any(|s| s.date == date)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Selections in the order they were chosen.
    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.items.iter()
    }

    /// Confirmation summary: all slots share the chosen service's price.
    pub fn total_price(&self, unit_price: f64) -> f64 {
        unit_price * self.items.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::slot_grid;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn slot(hour: u32) -> TimeSlot {
        TimeSlot::from_hour(hour).unwrap()
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut cart = SelectionCart::new();
        let d = date("2025-03-10");

        cart.toggle(d, &slot(9));
        assert!(cart.is_selected(d, &slot(9)));
        assert_eq!(cart.len(), 1);

        cart.toggle(d, &slot(9));
        assert!(!cart.is_selected(d, &slot(9)));
        assert!(cart.is_empty(), "toggle twice is identity");
    }

    #[test]
    fn no_duplicates_after_any_toggle_sequence() {
        let mut cart = SelectionCart::new();
        let d1 = date("2025-03-10");
        let d2 = date("2025-03-11");

        for _ in 0..3 {
            cart.toggle(d1, &slot(9));
        }
        cart.toggle(d2, &slot(9));
        cart.toggle(d1, &slot(14));

        // d1/09:00 toggled odd times -> present exactly once
        assert_eq!(cart.len(), 3);
        let count = cart
            .iter()
            .filter(|s| s.date == d1 && s.canonical == "09:00")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn same_time_different_dates_are_distinct() {
        let mut cart = SelectionCart::new();
        cart.toggle(date("2025-03-10"), &slot(9));
        cart.toggle(date("2025-03-11"), &slot(9));
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn date_has_selections_marker() {
        let mut cart = SelectionCart::new();
        cart.toggle(date("2025-03-10"), &slot(9));

        assert!(cart.date_has_selections(date("2025-03-10")));
        assert!(!cart.date_has_selections(date("2025-03-11")));
    }

    #[test]
    fn selection_carries_both_forms() {
        let mut cart = SelectionCart::new();
        cart.toggle(date("2025-03-10"), &slot(14));

        let s = cart.iter().next().unwrap();
        assert_eq!(s.canonical, "14:00");
        assert_eq!(s.display_time, "2:00 PM - 3:00 PM");
        assert_eq!(s.display_date, "Mon, Mar 10");
    }

    #[test]
    fn insertion_order_preserved() {
        let mut cart = SelectionCart::new();
        let d = date("2025-03-10");
        cart.toggle(d, &slot(14));
        cart.toggle(d, &slot(8));

        let order: Vec<&str> = cart.iter().map(|s| s.canonical.as_str()).collect();
        assert_eq!(order, vec!["14:00", "08:00"], "chosen order, not clock order");
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = SelectionCart::new();
        for s in slot_grid() {
            cart.toggle(date("2025-03-10"), &s);
        }
        assert_eq!(cart.len(), 8);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn total_price_scales_with_count() {
        let mut cart = SelectionCart::new();
        cart.toggle(date("2025-03-10"), &slot(9));
        cart.toggle(date("2025-03-11"), &slot(14));
        assert_eq!(cart.total_price(100.0), 200.0);
    }
}
