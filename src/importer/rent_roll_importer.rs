// ==========================================
// 租赁清单抽取引擎 - 导入器实现
// ==========================================
// 职责: 异步外壳；每个文件在独立的阻塞线程上完整抽取，
//       同义词表经 Arc 只读共享，记录累积器各自独立
// ==========================================

use crate::config::ExtractorConfig;
use crate::domain::record::ExtractionResult;
use crate::importer::data_validator::DataValidator;
use crate::importer::document_reader::DocumentReader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::RentRollImporter;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

// ==========================================
// RentRollImporterImpl
// ==========================================
pub struct RentRollImporterImpl {
    reader: Arc<DocumentReader>,
    validator: Arc<DataValidator>,
    process_all_sheets: bool,
}

impl RentRollImporterImpl {
    /// 按配置构建（加载同义词覆盖文件）
    pub fn new(config: &ExtractorConfig) -> ImportResult<Self> {
        let table = config.build_synonym_table()?;
        info!(
            synonyms = table.len(),
            process_all_sheets = config.process_all_sheets,
            "导入器初始化完成"
        );

        Ok(Self::from_parts(
            DocumentReader::new(table, config),
            DataValidator::new(config.magnitude_threshold),
            config.process_all_sheets,
        ))
    }

    pub fn from_parts(
        reader: DocumentReader,
        validator: DataValidator,
        process_all_sheets: bool,
    ) -> Self {
        Self {
            reader: Arc::new(reader),
            validator: Arc::new(validator),
            process_all_sheets,
        }
    }

    /// 同步抽取 + 校验（在阻塞线程内执行）
    fn extract_blocking(
        reader: &DocumentReader,
        validator: &DataValidator,
        path: &Path,
        process_all_sheets: bool,
    ) -> ExtractionResult {
        let mut result = reader.read_path(path, process_all_sheets);
        if result.success {
            result.validation_issues = validator.validate(&result.records);
            let summary = DataValidator::summarize(&result.validation_issues);
            if summary.warnings > 0 || summary.errors > 0 {
                warn!(
                    file = %result.metadata.source_file,
                    errors = summary.errors,
                    warnings = summary.warnings,
                    "校验发现问题"
                );
            }
        }
        result
    }
}

#[async_trait]
impl RentRollImporter for RentRollImporterImpl {
    #[instrument(skip(self, file_path))]
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ExtractionResult> {
        let path = file_path.as_ref().to_path_buf();
        let reader = Arc::clone(&self.reader);
        let validator = Arc::clone(&self.validator);
        let process_all_sheets = self.process_all_sheets;

        info!(file = %path.display(), "开始导入文件");

        let result = tokio::task::spawn_blocking(move || {
            Self::extract_blocking(&reader, &validator, &path, process_all_sheets)
        })
        .await
        .map_err(|e| ImportError::InternalError(format!("抽取线程异常: {}", e)))?;

        info!(
            file = %result.metadata.source_file,
            success = result.success,
            records = result.total_rows,
            warnings = result.warnings.len(),
            issues = result.validation_issues.len(),
            "文件导入完成"
        );

        Ok(result)
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<Result<ExtractionResult, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        // 为每个文件创建导入任务
        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                match self.import_file(path).await {
                    Ok(result) => Ok(result),
                    Err(e) => {
                        error!(file = %path_str, error = %e, "文件导入失败");
                        Err(format!("{}: {}", path_str, e))
                    }
                }
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results
                .iter()
                .filter(|r| matches!(r, Ok(res) if res.success))
                .count(),
            failed = results
                .iter()
                .filter(|r| !matches!(r, Ok(res) if res.success))
                .count(),
            "批量导入完成"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[tokio::test]
    async fn test_import_file_attaches_validation_issues() {
        let file = csv_file("Mieter;Miete\nA GmbH;-100 €\n");
        let importer = RentRollImporterImpl::new(&ExtractorConfig::default()).unwrap();

        let result = importer.import_file(file.path()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.validation_issues.len(), 1);
        assert_eq!(result.validation_issues[0].field, "monthly_rent_value");
    }

    #[tokio::test]
    async fn test_import_missing_file_is_not_an_error() {
        let importer = RentRollImporterImpl::new(&ExtractorConfig::default()).unwrap();

        let result = importer.import_file("/nonexistent/rr.xlsx").await.unwrap();
        assert!(!result.success);
        assert!(result.records.is_empty());
        assert!(result.validation_issues.is_empty());
    }

    #[tokio::test]
    async fn test_batch_import_keeps_input_order() {
        let first = csv_file("Tenant,Unit ID\nA Ltd,U1\nB Ltd,U2\n");
        let second = csv_file("Mieter;Einheit\nC GmbH;E1\n");
        let importer = RentRollImporterImpl::new(&ExtractorConfig::default()).unwrap();

        let results = importer
            .batch_import(vec![
                first.path().to_path_buf(),
                std::path::PathBuf::from("/nonexistent/x.csv"),
                second.path().to_path_buf(),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().records.len(), 2);
        assert!(!results[1].as_ref().unwrap().success);
        assert_eq!(results[2].as_ref().unwrap().records.len(), 1);
    }
}
