//! The execution engine (spec §4.3–§4.5, §2 "Parse driver / Skip strategies
//! / Error recovery / Barrier tokens"): the mutable per-parse state, the
//! settings it's configured with, and the driver that ties them together.

pub mod barrier;
pub mod cache;
pub mod context;
pub mod driver;
pub mod recovery;
pub mod settings;
pub mod skip;

pub use driver::Parser;
pub use driver::ParseOptions;
pub use driver::ParseOutcome;
pub use driver::enter_rule;
