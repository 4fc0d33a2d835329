//! Error handling foundation for mon.
//!
//! Only the `Result` alias lives here. Each crate defines its own domain
//! error enums and adds layer-appropriate context with rootcause's
//! `.context()` as a report travels up the stack.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
