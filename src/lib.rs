// Library exports for toolchart

pub mod analysis;
pub mod config;
pub mod csv_reader;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod palette;
pub mod payload;
pub mod runtime;
pub mod trend;
pub mod value;

// Rendering pipeline: resolve -> transform -> scale -> compiler
pub mod ir;
pub mod resolve;
pub mod transform;
pub mod scale;
pub mod compiler;

pub use config::{EngineConfig, FailurePolicy};
pub use error::{ChartError, ChartResult};
pub use payload::ChartRequest;
pub use runtime::{render_chart, render_or_placeholder, Rendered};
