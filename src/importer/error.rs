// ==========================================
// 租赁清单抽取引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 字段级解析失败不是错误（降级为 null / 原文），不在此列
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xlsb/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作簿无工作表: {0}")]
    EmptyWorkbook(String),

    // ===== 工作表级错误（可恢复，转为警告）=====
    #[error("工作表 '{sheet}' 读取失败: {message}")]
    SheetReadError { sheet: String, message: String },

    #[error("工作表 '{0}' 未识别到表头行")]
    HeaderNotFound(String),

    // ===== 配置错误 =====
    #[error("同义词文件加载失败 ({path}): {message}")]
    SynonymFileError { path: String, message: String },

    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 工作表级错误：记为警告，兄弟工作表继续处理
    pub fn is_sheet_level(&self) -> bool {
        matches!(
            self,
            ImportError::SheetReadError { .. } | ImportError::HeaderNotFound(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::ConfigReadError {
            key: "json".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
