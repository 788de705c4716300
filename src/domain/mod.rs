// ==========================================
// 租赁清单抽取引擎 - 领域模型层
// ==========================================
// 职责: 定义工作簿、记录、结果等领域类型
// 红线: 不含文件访问逻辑，不含抽取逻辑
// ==========================================

pub mod record;
pub mod types;
pub mod workbook;

// 重导出核心类型
pub use record::{
    ExtractionMetadata, ExtractionResult, FieldValue, ParsedValue, Provenance, Record,
    ValidationIssue,
};
pub use types::{FieldClass, ParseMode, Severity};
pub use workbook::{CellValue, Grid, Sheet, Workbook};
