// ==========================================
// 租赁清单抽取引擎 - 核心库
// ==========================================
// 输入: 多语言、多格式的租赁清单工作簿
// 输出: 规范化记录（数值与原始单位/币种分离保存，绝不换算）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 工作簿 / 记录 / 结果
pub mod domain;

// 导入层 - 文件解析与抽取管道
pub mod importer;

// 配置层 - 抽取参数
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FieldClass, ParseMode, Severity};

// 领域实体
pub use domain::{
    CellValue, ExtractionMetadata, ExtractionResult, FieldValue, Grid, ParsedValue, Record,
    Sheet, ValidationIssue, Workbook,
};

// 抽取管道
pub use importer::{
    DataValidator, DocumentReader, HeaderMapper, ImportError, ImportResult, NumberUnitParser,
    RentRollImporter, RentRollImporterImpl, SynonymTable,
};

// 配置
pub use config::ExtractorConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "租赁清单抽取引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
