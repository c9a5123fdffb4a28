/*
[INPUT]:  Requests attempted and responses received by the transport layer
[OUTPUT]: Owned snapshots suitable for embedding in request failures
[POS]:    HTTP layer - diagnostic view of a failed exchange
[UPDATE]: When request failures need more exchange detail
*/

pub mod exchange;

pub use exchange::{RequestSnapshot, ResponseSnapshot};
