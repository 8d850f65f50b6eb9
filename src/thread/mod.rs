//! Thread input: the post model, the JSON loader and whole-thread checks.

pub mod analysis;
mod collect;
mod parse;
mod post;

pub use self::analysis::ThreadReport;
pub use self::collect::load_thread;
pub use self::parse::parse_thread;
pub use self::post::{Post, Thread};
