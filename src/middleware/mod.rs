//! Built-in middleware and bundled handlers.

mod logger;
mod recovery;
mod static_dir;

pub use self::logger::Logger;
pub use self::recovery::Recovery;
pub use self::static_dir::StaticDir;
