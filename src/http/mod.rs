//! HTTP protocol layer.
//!
//! Range grammar, response builders, body streaming, and MIME detection,
//! decoupled from path resolution and the server harness.

pub mod body;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use body::ResponseBody;
pub use range::{evaluate_range, ActiveRange, RangeOutcome};
pub use response::{
    build_404_response, build_405_response, build_416_response, build_options_response,
};
