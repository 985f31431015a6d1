//! Arithmetic tools.
//!
//! - `add`: sum of two numbers
//! - `calculate`: add, subtract, multiply or divide two numbers
//!
//! All arithmetic is IEEE-754 double precision; results are rendered with
//! [`format_number`](crate::domains::tools::envelope::format_number).

pub mod add;
pub mod calculate;

pub use add::{AddParams, AddTool};
pub use calculate::{CalculateParams, CalculateTool, DIVIDE_BY_ZERO_MESSAGE, Operation};
