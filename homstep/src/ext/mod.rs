//! Circuits built on top of [`EvaluatorOps`](crate::EvaluatorOps).

pub mod step;
pub mod trig;
