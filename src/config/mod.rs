// ==========================================
// 租赁清单抽取引擎 - 配置层
// ==========================================
// 职责: 抽取参数加载，支持文件 + 环境变量覆写
// ==========================================

pub mod extractor_config;

// 重导出核心配置
pub use extractor_config::{config_keys, ExtractorConfig};
