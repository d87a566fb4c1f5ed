//! Gateway API contract
//!
//! Request bodies and response envelopes for the remote mutation/aggregation
//! gateway. Only the types live here; the HTTP client is in `pa-dash`.
//!
//! Every endpoint authenticates with the shared secret passed as the
//! [`KEY_PARAM`] query parameter and answers with an [`ApiEnvelope`].

pub mod types;

pub use types::{
    ApiEnvelope, BatchDetails, BatchOutcome, BatchRequest, DataQuery, GalleryPage, ReviewRequest,
    SignedUpload, UploadKind, UploadRequest,
};

/// Query parameter carrying the shared secret
pub const KEY_PARAM: &str = "key";

/// Message used when the gateway rejects a request without a `detail`
pub const DEFAULT_REJECTION: &str = "server error";
