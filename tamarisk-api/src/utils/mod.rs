pub mod evaluator;
pub mod experiment_log;
