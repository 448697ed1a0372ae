pub mod error;
pub mod glue;
pub mod ipc;
pub mod network;
pub mod rng;
pub mod task_spec;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
