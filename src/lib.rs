//! Systematic-error correction and hit scoring for high-throughput
//! screening plates.

pub mod config;
pub mod correction;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod result;
pub mod score;
pub mod stats;
pub mod tracing;
pub mod well;

pub use config::{AnalysisConfig, CorrectionMethod, ScoringConfig};
pub use correction::{CancelToken, CorrectionKind};
pub use error::{HtsError, Result};
pub use model::{Controls, Plate, PlateSetup, RawTable, Replicat, Screen, SummaryMethod, WellMatrix};
pub use pipeline::{PlateReport, ScreenReport, analyze_plate};
pub use result::{AggregationPolicy, ResultRow, ResultTable};
pub use well::{PlateFormat, WellPos, index_to_label, label_to_index};
