// Domain layer - Core types and pure logic
pub mod coordinate;
pub mod error;
pub mod reading;
pub mod station;
pub mod units;
