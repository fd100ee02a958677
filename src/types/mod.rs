//! Shared vocabulary for generation targets
//!
//! Frameworks, languages and browsers are closed sets. Every component that
//! branches on them matches exhaustively, so adding a variant surfaces every
//! place that needs a new template at compile time.

mod target;

pub use target::{Browser, Framework, Language};
