//! Wire types shared between the Nexia console and the learning platform backend.
//!
//! The backend exposes a small REST surface that the console consumes: remote code
//! execution for the server-delegated console variant, and exercise submission for
//! recording a run. Keeping the payloads here lets the HTTP client and its tests
//! agree on one contract.
//!
//! ## Example
//!
//! ```rust
//! use nexia_api_types::{ExecuteRequest, ExecuteResponse};
//!
//! let request = ExecuteRequest::new("print('hi')");
//! assert_eq!(request.code, "print('hi')");
//!
//! let response: ExecuteResponse =
//!     serde_json::from_str(r#"{"success": true, "output": "hi\n"}"#).unwrap();
//! assert!(response.success);
//! ```

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
