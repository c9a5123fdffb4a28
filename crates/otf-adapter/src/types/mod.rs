/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

pub mod body_composition;
pub mod challenge_tracker;
pub mod enums;
pub(crate) mod serde_helpers;
pub mod telemetry;

pub use body_composition::*;
pub use challenge_tracker::*;
pub use enums::*;
pub use telemetry::*;
