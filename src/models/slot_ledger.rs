//! Per-doctor record of booked slots: slot date (`D_M_YYYY`) to the
//! ordered list of booked slot times on that date.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotLedger(BTreeMap<String, Vec<String>>);

impl SlotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_booked(&self, slot_date: &str, slot_time: &str) -> bool {
        self.0
            .get(slot_date)
            .is_some_and(|times| times.iter().any(|t| t == slot_time))
    }

    /// Record a booking. Returns `false` if the slot was already taken.
    pub fn book(&mut self, slot_date: &str, slot_time: &str) -> bool {
        let times = self.0.entry(slot_date.to_string()).or_default();
        if times.iter().any(|t| t == slot_time) {
            return false;
        }
        times.push(slot_time.to_string());
        true
    }

    /// Release a booked slot. Releasing an absent slot is a no-op and
    /// returns `false`. A date left with no bookings is dropped.
    pub fn release(&mut self, slot_date: &str, slot_time: &str) -> bool {
        let Some(times) = self.0.get_mut(slot_date) else {
            return false;
        };
        let before = times.len();
        times.retain(|t| t != slot_time);
        let removed = times.len() != before;
        if times.is_empty() {
            self.0.remove(slot_date);
        }
        removed
    }

    pub fn times(&self, slot_date: &str) -> &[String] {
        self.0.get(slot_date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_keeps_insertion_order() {
        let mut ledger = SlotLedger::new();
        assert!(ledger.book("5_3_2025", "10:30 AM"));
        assert!(ledger.book("5_3_2025", "09:00 AM"));
        assert_eq!(ledger.times("5_3_2025"), ["10:30 AM", "09:00 AM"]);
    }

    #[test]
    fn double_booking_is_rejected() {
        let mut ledger = SlotLedger::new();
        assert!(ledger.book("5_3_2025", "10:30 AM"));
        assert!(!ledger.book("5_3_2025", "10:30 AM"));
        assert_eq!(ledger.times("5_3_2025").len(), 1);
    }

    #[test]
    fn release_removes_only_that_time() {
        let mut ledger = SlotLedger::new();
        ledger.book("5_3_2025", "10:30 AM");
        ledger.book("5_3_2025", "11:00 AM");
        assert!(ledger.release("5_3_2025", "10:30 AM"));
        assert!(!ledger.is_booked("5_3_2025", "10:30 AM"));
        assert!(ledger.is_booked("5_3_2025", "11:00 AM"));
    }

    #[test]
    fn release_absent_slot_is_noop() {
        let mut ledger = SlotLedger::new();
        ledger.book("5_3_2025", "10:30 AM");
        let before = ledger.clone();
        assert!(!ledger.release("5_3_2025", "04:00 PM"));
        assert!(!ledger.release("6_3_2025", "10:30 AM"));
        assert_eq!(ledger, before);
    }

    #[test]
    fn emptied_date_is_dropped() {
        let mut ledger = SlotLedger::new();
        ledger.book("5_3_2025", "10:30 AM");
        ledger.release("5_3_2025", "10:30 AM");
        assert!(ledger.is_empty());
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut ledger = SlotLedger::new();
        ledger.book("5_3_2025", "10:30 AM");
        let json = serde_json::to_string(&ledger).unwrap();
        assert_eq!(json, r#"{"5_3_2025":["10:30 AM"]}"#);
        let back: SlotLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
