// builders + the experiment sequence + helpers
pub mod builders;
pub mod commands;
pub mod error;
pub mod experiment;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
