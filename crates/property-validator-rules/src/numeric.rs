// File: property-validator-rules/src/numeric.rs
// Purpose: Bound checks for numeric properties

use std::fmt::Display;

use property_validator::ValidationRule;

/// Value must be at least `min`
#[derive(Debug, Clone, Copy)]
pub struct MinRule<T> {
    min: T,
}

impl<T> MinRule<T> {
    pub fn new(min: T) -> Self {
        Self { min }
    }
}

impl<T> ValidationRule<T> for MinRule<T>
where
    T: PartialOrd + Display + Send + Sync,
{
    fn is_valid(&self, value: &T) -> bool {
        *value >= self.min
    }

    fn error_message(&self) -> String {
        format!("Must be at least {}", self.min)
    }
}

/// Value must be at most `max`
#[derive(Debug, Clone, Copy)]
pub struct MaxRule<T> {
    max: T,
}

impl<T> MaxRule<T> {
    pub fn new(max: T) -> Self {
        Self { max }
    }
}

impl<T> ValidationRule<T> for MaxRule<T>
where
    T: PartialOrd + Display + Send + Sync,
{
    fn is_valid(&self, value: &T) -> bool {
        *value <= self.max
    }

    fn error_message(&self) -> String {
        format!("Must be at most {}", self.max)
    }
}

/// Value must lie within `min..=max`
#[derive(Debug, Clone, Copy)]
pub struct RangeRule<T> {
    min: T,
    max: T,
}

impl<T> RangeRule<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T> ValidationRule<T> for RangeRule<T>
where
    T: PartialOrd + Display + Send + Sync,
{
    fn is_valid(&self, value: &T) -> bool {
        *value >= self.min && *value <= self.max
    }

    fn error_message(&self) -> String {
        format!("Must be between {} and {}", self.min, self.max)
    }
}
