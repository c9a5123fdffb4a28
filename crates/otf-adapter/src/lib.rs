/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public OTF adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod classification;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use classification::{
    body_fat_percent_dividers,
    body_fat_percent_indicator,
    relative_descriptor,
    DEFAULT_BODY_FAT_MASS_DIVIDERS,
    DEFAULT_SKELETAL_MUSCLE_MASS_DIVIDERS,
    DEFAULT_WEIGHT_DIVIDERS,
};

pub use config::{ParseConfig, UnknownKeyPolicy};

pub use error::{
    BookingError,
    BookingErrorKind,
    OtfError,
    ParseError,
    RatingError,
    RequestError,
    Result,
};

pub use http::{RequestSnapshot, ResponseSnapshot};

// Re-export all types
pub use types::*;
