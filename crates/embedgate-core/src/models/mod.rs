mod request_context;
mod vector_or_error;

pub use request_context::RequestContext;
pub use vector_or_error::{VectorOrError, EMPTY_INPUT_ERROR};
