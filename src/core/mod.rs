pub mod aggregator;
pub mod interaction;
pub mod normalizer;

pub use crate::domain::model::{Posting, RawRecord};
pub use crate::domain::ports::{CurrencyConverter, PostingStore, VacancySource};
pub use crate::utils::error::Result;
