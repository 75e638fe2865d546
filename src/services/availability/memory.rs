use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AvailabilityBackend, AvailabilityError};
use crate::models::BookingRecord;

/// Booked-slot index held entirely in process memory. Used when no remote
/// store is configured, or when the remote store fails to initialize.
#[derive(Default)]
pub struct InMemoryBackend {
    booked: Mutex<HashSet<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityBackend for InMemoryBackend {
    async fn check_availability(&self, slot: &str) -> Result<bool, AvailabilityError> {
        Ok(!self.booked.lock().unwrap().contains(slot))
    }

    async fn book_slot(&self, record: &BookingRecord) -> Result<(), AvailabilityError> {
        // Membership test and insert under one lock, so two racing bookings
        // cannot both observe the slot as free.
        let mut booked = self.booked.lock().unwrap();
        if booked.contains(&record.slot) {
            return Err(AvailabilityError::Conflict);
        }
        booked.insert(record.slot.clone());
        Ok(())
    }

    async fn list_booked(&self) -> Result<Vec<String>, AvailabilityError> {
        let mut slots: Vec<String> = self.booked.lock().unwrap().iter().cloned().collect();
        slots.sort();
        Ok(slots)
    }

    async fn reset_bookings(&self) {
        self.booked.lock().unwrap().clear();
    }
}
