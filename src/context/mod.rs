//! Per-request state and the handler contract.

mod context;

pub use self::context::{BoxFut, Context, Handle};
