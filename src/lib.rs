pub mod engine;
pub mod thread;
pub mod util;
