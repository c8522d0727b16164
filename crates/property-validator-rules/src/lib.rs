// Property Validator Rules - Leaf rules for common property checks
// Required, length, numeric range, email and pattern rules

//! Ready-made [`ValidationRule`](property_validator::ValidationRule)
//! implementations.
//!
//! Apart from the required rules, string rules treat an empty value as valid
//! so they compose with a required rule instead of duplicating it.

pub mod email;
pub mod numeric;
pub mod pattern;
pub mod string;

pub use email::{is_valid_email, EmailFormatRule};
pub use numeric::{MaxRule, MinRule, RangeRule};
pub use pattern::PatternRule;
pub use string::{MaxLengthRule, MinLengthRule, RangeLengthRule, RequiredRule, StringRequiredRule};
