// ==========================================
// 租赁清单抽取引擎 - 导入器 Trait
// ==========================================
// 职责: 定义异步导入接口（不包含实现）
// ==========================================

use crate::domain::record::ExtractionResult;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// RentRollImporter Trait
// ==========================================
// 用途: 租赁清单导入主接口
// 实现者: RentRollImporterImpl
#[async_trait]
pub trait RentRollImporter: Send + Sync {
    /// 导入单个文件
    ///
    /// # 参数
    /// - file_path: .xlsx/.xlsm/.xlsb/.xls/.ods/.csv 文件路径
    ///
    /// # 返回
    /// - Ok(ExtractionResult): 抽取结果（工作簿打不开时 success=false、无记录）
    /// - Err: 仅在工作线程异常等内部错误时返回
    ///
    /// # 流程
    /// 1. 文件读取与解析（阻塞线程）
    /// 2. 工作表选择 / 表头识别 / 逐行抽取
    /// 3. 标识解析
    /// 4. 校验（结果附带 validation_issues）
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ExtractionResult>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 返回
    /// - 每个文件一个结果，顺序与输入一致；单个文件失败不影响其他文件
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<Result<ExtractionResult, String>>;
}
