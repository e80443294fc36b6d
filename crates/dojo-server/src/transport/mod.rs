pub mod http_sse;

pub use http_sse::{sse_body_stream, sse_frame, sse_response};
