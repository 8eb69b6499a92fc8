//! Donations module - payload normalization and webhook ingestion.

mod donations_model;
mod donations_service;
mod donations_traits;
mod normalizer;


pub use donations_model::{Donation, IngestOutcome};
pub use donations_service::DonationService;
pub use donations_traits::DonationServiceTrait;
pub use normalizer::{assign_id, coerce_amount, normalize, normalize_value};
