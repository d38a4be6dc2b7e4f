pub mod orchestrator;
pub mod report;
pub mod sample;

pub use orchestrator::{BenchmarkOrchestrator, BenchmarkParams, TrialError};
pub use report::{BenchmarkRecord, BenchmarkReport, DepositBreakdown, WithdrawalSummary};
pub use sample::{Average, BenchmarkMatrix, BenchmarkSample, ColumnAnalysis, PositionViews};
