//! reportline-core - template binding, pagination, recomputation and report orchestration.

pub mod binder;
pub mod error;
pub mod model;
pub mod paginate;
pub mod recompute;
pub mod report;
pub mod storage;
pub mod template;

pub use binder::{bind, resolve_pattern};
pub use error::{ReportError, Result};
pub use model::{Model, ModelBuilder, ModelValue};
pub use paginate::{Page, paginate};
pub use recompute::{RecomputePlan, RecomputeReport, RowTarget, recompute};
pub use report::{RenderedReport, ReportDefinition, ReportGenerator, page_model};
pub use template::{DirTemplateLoader, MemoryTemplateLoader, Template, TemplateLoader};

pub use reportline_engine::engine::{CellRef, Workbook};
