//! Route registration and lookup.

mod router;
mod trie;

pub use self::router::{Param, Params, Router};
