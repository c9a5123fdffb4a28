/*
[INPUT]:  Failed HTTP exchanges, booking/rating rejections, malformed payloads
[OUTPUT]: Structured error types carrying identifiers and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new failure kinds or improving error messages
*/

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use crate::http::{RequestSnapshot, ResponseSnapshot};

/// Statuses that signal a transient condition worth retrying.
const RETRYABLE_STATUSES: &[StatusCode] = &[
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Main error type for the OTF adapter
#[derive(Error, Debug)]
pub enum OtfError {
    /// Unqualified library-level failure
    #[error("{0}")]
    Generic(String),

    /// HTTP exchange failed
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Booking was rejected
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// Class lies beyond the advance-booking horizon
    #[error("Outside scheduling window: {message}")]
    OutsideSchedulingWindow { message: String },

    /// Referenced entity does not exist
    #[error("Resource not found: {message}")]
    ResourceNotFound { message: String },

    /// Rating was rejected
    #[error(transparent)]
    Rating(#[from] RatingError),

    /// Payload could not be turned into a model
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OtfError {
    pub fn generic(message: impl Into<String>) -> Self {
        OtfError::Generic(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        OtfError::ResourceNotFound {
            message: message.into(),
        }
    }

    pub fn outside_scheduling_window(message: impl Into<String>) -> Self {
        OtfError::OutsideSchedulingWindow {
            message: message.into(),
        }
    }

    /// Classify a failed exchange into a (possibly retryable) request error
    pub fn from_exchange(request: RequestSnapshot, response: ResponseSnapshot) -> Self {
        OtfError::Request(RequestError::from_exchange(request, response))
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, OtfError::Request(err) if err.is_retryable())
    }

    /// HTTP status of the failed exchange, if this is a request failure
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            OtfError::Request(err) => Some(err.response.status),
            _ => None,
        }
    }

    /// `(booking_uuid, booking_id)` of a booking failure
    pub fn booking_ids(&self) -> Option<(Option<&str>, Option<&str>)> {
        match self {
            OtfError::Booking(err) => Some((err.booking_uuid.as_deref(), err.booking_id.as_deref())),
            _ => None,
        }
    }

    pub fn is_booking_error(&self) -> bool {
        matches!(self, OtfError::Booking(_))
    }

    pub fn is_rating_error(&self) -> bool {
        matches!(self, OtfError::Rating(_))
    }
}

/// A failed request, with the exchange kept for diagnosis.
///
/// `retryable` distinguishes a transient failure (rate limiting, a flaky
/// upstream) from one that will fail the same way again.
#[derive(Error, Debug)]
#[error(
    "{message} ({method} {url} -> {status})",
    method = .request.method,
    url = .request.url,
    status = .response.status
)]
pub struct RequestError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub request: RequestSnapshot,
    pub response: ResponseSnapshot,
    retryable: bool,
}

impl RequestError {
    pub fn new(
        message: impl Into<String>,
        request: RequestSnapshot,
        response: ResponseSnapshot,
    ) -> Self {
        Self {
            message: message.into(),
            source: None,
            request,
            response,
            retryable: false,
        }
    }

    pub fn retryable(
        message: impl Into<String>,
        request: RequestSnapshot,
        response: ResponseSnapshot,
    ) -> Self {
        Self {
            retryable: true,
            ..Self::new(message, request, response)
        }
    }

    /// Build from an exchange, marking 429 and transient 5xx as retryable
    pub fn from_exchange(request: RequestSnapshot, response: ResponseSnapshot) -> Self {
        let message = format!("Request failed with status {}", response.status.as_u16());
        if RETRYABLE_STATUSES.contains(&response.status) {
            Self::retryable(message, request, response)
        } else {
            Self::new(message, request, response)
        }
    }

    /// Attach the underlying cause
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Suggested delay in seconds before retrying, from `Retry-After`
    pub fn retry_delay(&self) -> Option<u64> {
        if self.retryable {
            self.response.retry_after()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingErrorKind {
    Other,
    AlreadyBooked,
    Conflicting,
    AlreadyCancelled,
}

impl fmt::Display for BookingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingErrorKind::Other => "Booking failed",
            BookingErrorKind::AlreadyBooked => "Class already booked",
            BookingErrorKind::Conflicting => "Conflicting booking",
            BookingErrorKind::AlreadyCancelled => "Booking already cancelled",
        };
        f.write_str(label)
    }
}

/// A booking-domain failure, identifying the booking it concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct BookingError {
    pub kind: BookingErrorKind,
    pub message: String,
    pub booking_uuid: Option<String>,
    /// Secondary identifier, usually the class id
    pub booking_id: Option<String>,
}

impl BookingError {
    pub fn new(kind: BookingErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            booking_uuid: None,
            booking_id: None,
        }
    }

    pub fn already_booked(message: impl Into<String>) -> Self {
        Self::new(BookingErrorKind::AlreadyBooked, message)
    }

    pub fn conflicting(message: impl Into<String>) -> Self {
        Self::new(BookingErrorKind::Conflicting, message)
    }

    pub fn already_cancelled(message: impl Into<String>) -> Self {
        Self::new(BookingErrorKind::AlreadyCancelled, message)
    }

    pub fn with_booking_uuid(mut self, booking_uuid: impl Into<String>) -> Self {
        self.booking_uuid = Some(booking_uuid.into());
        self
    }

    pub fn with_booking_id(mut self, booking_id: impl Into<String>) -> Self {
        self.booking_id = Some(booking_id.into());
        self
    }
}

/// A class-rating failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("Class already rated: {message}")]
    AlreadyRated {
        message: String,
        performance_summary_id: Option<String>,
    },

    #[error("Class not ratable: {message}")]
    NotRatable {
        message: String,
        performance_summary_id: Option<String>,
    },
}

impl RatingError {
    pub fn performance_summary_id(&self) -> Option<&str> {
        match self {
            RatingError::AlreadyRated {
                performance_summary_id,
                ..
            }
            | RatingError::NotRatable {
                performance_summary_id,
                ..
            } => performance_summary_id.as_deref(),
        }
    }
}

/// Payload could not be turned into a model. Fields are named by their wire key.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` is not {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid graph scale in `{field}`: {reason}")]
    InvalidGraphScale { field: &'static str, reason: String },

    #[error("unknown field `{field}`")]
    UnknownField { field: String },

    #[error("item {index}: {source}")]
    Item {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ParseError {
    /// Wire key of the offending field, when one is known
    pub fn field(&self) -> Option<&str> {
        match self {
            ParseError::MissingField { field }
            | ParseError::InvalidField { field, .. }
            | ParseError::InvalidGraphScale { field, .. } => Some(*field),
            ParseError::UnknownField { field } => Some(field.as_str()),
            ParseError::Item { source, .. } => source.field(),
            ParseError::NotAnObject | ParseError::Payload(_) => None,
        }
    }
}

/// Result type alias for OTF operations
pub type Result<T> = std::result::Result<T, OtfError>;
