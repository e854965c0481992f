pub mod editing;
pub mod io;
pub mod session;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{
    autoformat::*, commands::*, document::*, history::*, selection::*, snapshot::*, EditError,
};
pub use io::*;
pub use session::*;
