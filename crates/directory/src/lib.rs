pub mod backend;
pub mod fixed;
pub mod policy;
pub mod postgrest;
pub(crate) mod util;

pub use backend::{DirectoryBackend, DirectoryEntry, DirectoryError};
pub use fixed::StaticDirectory;
pub use policy::MatchPolicy;
pub use postgrest::{PostgrestDirectory, PostgrestSettings};
