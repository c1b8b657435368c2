// src/lib.rs

pub mod core;
pub mod engine;
pub mod logging;
pub mod pipeline;
pub mod strategy;
pub mod transforms;

pub use crate::core::config::FuzzConfig;
pub use crate::core::dataset::{
    ColumnRef, DataSet, DataSetOptions, Matrix, Records, Representation, Row, Source, Table,
};
pub use crate::core::error::{FuzzError, Result, TransformError};
pub use crate::core::output::{Output, Sink};
pub use crate::core::value::{Value, ValueType};
pub use engine::{Diagnostic, MutationOutcome, RunReport};
pub use pipeline::{run_pipeline, PipelineReport, PipelineSpec};
pub use strategy::{
    build_strategy, Duplicator, Fuzzer, NoiseMaker, NoiseOp, Strategy, StrategyConfig,
};
pub use transforms::Transform;
