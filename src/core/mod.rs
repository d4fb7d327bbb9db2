//! Core conversion logic and its supporting abstractions

pub mod config;
pub mod conversion;
pub mod currency;
pub mod log;
pub mod quote;
pub mod rate;

// Re-export main types for cleaner imports
pub use conversion::{ConversionError, ConversionResult, Converter};
pub use currency::{CurrencyCode, Money, ValidationError};
pub use quote::{Quote, QuoteProvider, QuoteSet};
pub use rate::RateError;
