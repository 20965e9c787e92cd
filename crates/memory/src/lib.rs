//! Memory store implementations for Switchboard.

pub mod long_term;
pub mod short_term;

pub use long_term::InMemoryLongTerm;
pub use short_term::InMemoryShortTerm;
