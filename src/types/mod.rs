//! Value types shared by the builder, the encoders and the transport.

mod response;
mod values;

pub use response::Response;
pub use values::Values;
