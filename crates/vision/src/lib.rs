pub mod backend;
pub mod hash;
pub mod openai;
pub mod parse;
pub mod payload;
pub mod prompt;

pub use backend::{MockReply, MockVision, VisionBackend, VisionError};
pub use hash::{fingerprint, sha256_bytes};
pub use openai::OpenAiVision;
pub use parse::{parse_completion, parse_extraction};
pub use payload::{LabelImage, PayloadError};
