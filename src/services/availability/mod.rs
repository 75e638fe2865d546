pub mod memory;
pub mod sheets;

pub use memory::InMemoryBackend;
pub use sheets::SheetsBackend;

use async_trait::async_trait;

use crate::models::BookingRecord;

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    /// The slot is already held by another booking. User-recoverable.
    #[error("slot already booked")]
    Conflict,

    /// The remote store could not be reached or rejected the request.
    /// The booking did not happen; the caller may retry.
    #[error("availability backend failure: {0}")]
    Backend(String),
}

/// Returned when the remote backend cannot be initialized at startup.
/// The caller decides whether to fall back to the in-memory strategy.
#[derive(Debug, thiserror::Error)]
#[error("could not reach spreadsheet {spreadsheet_id}: {reason}")]
pub struct BackendConfigError {
    pub spreadsheet_id: String,
    pub reason: String,
}

/// Index of booked slots. A slot present in the index is taken; absence
/// means available. Chosen once at startup and held for the process
/// lifetime.
#[async_trait]
pub trait AvailabilityBackend: Send + Sync {
    /// Advisory read. `book_slot` re-checks under its own lock and stays
    /// authoritative.
    async fn check_availability(&self, slot: &str) -> Result<bool, AvailabilityError>;

    /// Reserves the slot and appends the booking record. The existence
    /// check and the write form one critical section per backend.
    async fn book_slot(&self, record: &BookingRecord) -> Result<(), AvailabilityError>;

    /// Currently booked slots, sorted ascending.
    async fn list_booked(&self) -> Result<Vec<String>, AvailabilityError>;

    /// Test/debug hook. In-memory: drops the whole index. Remote: drops
    /// only the local cache; remote rows are never deleted from here.
    async fn reset_bookings(&self);
}
