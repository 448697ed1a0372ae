pub mod return_stats;
