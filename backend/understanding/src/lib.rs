//! Reading slips: the vision oracle call, the literal-list parser for its
//! reply, and normalization of the parsed pairs into an [`ExtractedRecord`].
//!
//! [`ExtractedRecord`]: scaleslip_core::ExtractedRecord

pub mod literal;
pub mod mock;
pub mod normalize;
pub mod prompt;
pub mod response_parser;
pub mod vision;

pub use mock::MockOracle;
pub use normalize::normalize_entries;
pub use prompt::WEIGH_SCALE_PROMPT;
pub use response_parser::parse_response;
pub use vision::OpenAiVisionOracle;
