//! Storage module for grid fixture files

mod fixture;

pub use fixture::{GridFixture, load_fixture, parse_fixture};
