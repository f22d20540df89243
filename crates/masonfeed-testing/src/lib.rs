//! Testing utilities and harness for masonfeed.

pub mod scripted_source;
pub mod test_rule;

pub use scripted_source::*;
pub use test_rule::*;
