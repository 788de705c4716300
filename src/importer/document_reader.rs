// ==========================================
// 租赁清单抽取引擎 - 文档读取编排器
// ==========================================
// 流程:
//   Workbook → SheetSelector → {逐表: HeaderDetector → HeaderMapper →
//   DataExtractor} → 累积记录 → IdentityResolver → ExtractionResult
// 错误分级:
// - 工作簿无法打开 / 无工作表 → 致命，无记录
// - 单表读不出 / 找不到表头 → 警告，兄弟表继续
// ==========================================

use crate::config::ExtractorConfig;
use crate::domain::record::{ExtractionMetadata, ExtractionResult, Record};
use crate::domain::workbook::{Sheet, Workbook};
use crate::i18n::{t, t_with_args};
use crate::importer::data_extractor::DataExtractor;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::header_detector::HeaderDetector;
use crate::importer::header_mapper::HeaderMapper;
use crate::importer::identity_resolver::IdentityResolver;
use crate::importer::sheet_selector::SheetSelector;
use crate::importer::synonyms::SynonymTable;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 语言识别只看前几张已选工作表
const LANGUAGE_SAMPLE_SHEETS: usize = 3;

/// 单表处理结果
struct SheetOutcome {
    records: Vec<Record>,
    header_cells: Vec<String>,
}

pub struct DocumentReader {
    mapper: HeaderMapper,
    selector: SheetSelector,
    detector: HeaderDetector,
    extractor: DataExtractor,
    resolver: IdentityResolver,
    header_scan_rows: usize,
}

impl DocumentReader {
    pub fn new(table: Arc<SynonymTable>, config: &ExtractorConfig) -> Self {
        let mapper = HeaderMapper::new(table);
        Self {
            selector: SheetSelector::new(mapper.clone(), config.header_scan_rows),
            detector: HeaderDetector::new(mapper.clone(), config.min_header_matches),
            extractor: DataExtractor::new(mapper.clone()),
            resolver: IdentityResolver::default(),
            header_scan_rows: config.header_scan_rows,
            mapper,
        }
    }

    /// 内置同义词表 + 默认配置
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(SynonymTable::defaults()),
            &ExtractorConfig::default(),
        )
    }

    /// 替换标识解析器（如自定义电话号码判定）
    pub fn with_resolver(mut self, resolver: IdentityResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn mapper(&self) -> &HeaderMapper {
        &self.mapper
    }

    /// 从文件读取：加载失败即致命结果
    pub fn read_path<P: AsRef<Path>>(&self, path: P, process_all_sheets: bool) -> ExtractionResult {
        let path = path.as_ref();
        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        match UniversalFileParser.parse(path) {
            Ok(workbook) => self.read_workbook(&workbook, &source_file, process_all_sheets),
            Err(e) => {
                warn!(file = %source_file, error = %e, "工作簿打开失败");
                ExtractionResult::failed(
                    Uuid::new_v4().to_string(),
                    &source_file,
                    t_with_args("extract.open_failed", &[("error", e.to_string().as_str())]),
                    e.to_string(),
                )
            }
        }
    }

    /// 核心入口：不做 I/O，工作簿已完整物化
    pub fn read_workbook(
        &self,
        workbook: &Workbook,
        source_file: &str,
        process_all_sheets: bool,
    ) -> ExtractionResult {
        let extraction_id = Uuid::new_v4().to_string();

        let selected: Vec<String> = if process_all_sheets {
            self.selector.get_all_data_sheets(workbook)
        } else {
            self.selector.select_best_sheet(workbook).into_iter().collect()
        };

        if selected.is_empty() {
            warn!(file = %source_file, "未找到可处理的工作表");
            let message = t("extract.no_sheets");
            return ExtractionResult::failed(
                extraction_id,
                source_file,
                message.clone(),
                message,
            );
        }

        info!(
            file = %source_file,
            sheets = ?selected,
            process_all_sheets,
            "开始抽取"
        );

        let mut warnings = Vec::new();
        let mut records = Vec::new();
        let mut language_headers: Vec<String> = Vec::new();
        let mut sheets_processed = 0;

        for (position, sheet_name) in selected.iter().enumerate() {
            let Some(sheet) = workbook.sheet(sheet_name) else {
                continue;
            };

            match self.process_sheet(sheet) {
                Ok(outcome) => {
                    // 同一张表共用一个抽取时间戳
                    let extracted_at = Utc::now();
                    let mut sheet_records = outcome.records;
                    for record in &mut sheet_records {
                        record.stamp_source(source_file, sheet_name, extracted_at);
                    }

                    debug!(sheet = %sheet_name, records = sheet_records.len(), "工作表抽取完成");

                    if position < LANGUAGE_SAMPLE_SHEETS {
                        language_headers.extend(outcome.header_cells);
                    }
                    records.extend(sheet_records);
                    sheets_processed += 1;
                }
                Err(e) => {
                    if e.is_sheet_level() {
                        warn!(sheet = %sheet_name, error = %e, "工作表跳过");
                    } else {
                        error!(sheet = %sheet_name, error = %e, "工作表处理异常，已跳过");
                    }
                    warnings.push(Self::sheet_warning(sheet_name, &e));
                }
            }
        }

        let detected_language = self.mapper.detect_language(&language_headers);

        self.resolver.resolve(&mut records);

        let total_rows = records.len();
        info!(
            file = %source_file,
            records = total_rows,
            sheets_processed,
            warnings = warnings.len(),
            language = %detected_language,
            "抽取完成"
        );

        ExtractionResult {
            success: !records.is_empty(),
            message: t_with_args(
                "extract.summary",
                &[
                    ("records", total_rows.to_string().as_str()),
                    ("sheets", sheets_processed.to_string().as_str()),
                ],
            ),
            records,
            warnings,
            metadata: ExtractionMetadata {
                extraction_id,
                source_file: source_file.to_string(),
                sheets_available: workbook.sheet_names(),
                sheets_processed,
                detected_language: Some(detected_language),
                total_rows,
            },
            sheets_processed,
            total_rows,
            validation_issues: Vec::new(),
        }
    }

    fn process_sheet(&self, sheet: &Sheet) -> ImportResult<SheetOutcome> {
        if let Some(reason) = &sheet.read_error {
            return Err(ImportError::SheetReadError {
                sheet: sheet.name.clone(),
                message: reason.clone(),
            });
        }

        let header = self
            .detector
            .find_header_row(&sheet.grid, self.header_scan_rows)
            .ok_or_else(|| ImportError::HeaderNotFound(sheet.name.clone()))?;

        let mapped = if header.index > 0 {
            // 叠放表头：合并文本能映射则用合并结果，否则退回表头行本身
            let merged = self
                .detector
                .handle_multi_level_headers(&sheet.grid, header.index);
            let width = merged.len().max(header.cells.len());
            (0..width)
                .map(|col| {
                    merged
                        .get(col)
                        .and_then(|h| self.mapper.map_header(h))
                        .or_else(|| header.cells.get(col).and_then(|h| self.mapper.map_header(h)))
                })
                .collect()
        } else {
            self.mapper.map_headers(&header.cells)
        };

        debug!(
            sheet = %sheet.name,
            header_row = header.index,
            mapped = ?mapped,
            "表头映射完成"
        );

        let records = self.extractor.extract_data(&sheet.grid, header.index, &mapped);

        Ok(SheetOutcome {
            records,
            header_cells: header.cells,
        })
    }

    fn sheet_warning(sheet_name: &str, error: &ImportError) -> String {
        match error {
            ImportError::HeaderNotFound(_) => {
                t_with_args("extract.header_not_found", &[("sheet", sheet_name)])
            }
            ImportError::SheetReadError { message, .. } => t_with_args(
                "extract.sheet_error",
                &[("sheet", sheet_name), ("error", message.as_str())],
            ),
            other => t_with_args(
                "extract.sheet_error",
                &[("sheet", sheet_name), ("error", other.to_string().as_str())],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workbook::{CellValue, Grid};

    fn sheet(name: &str, rows: Vec<Vec<&str>>) -> Sheet {
        Sheet::new(
            name,
            Grid::new(
                rows.into_iter()
                    .map(|r| r.into_iter().map(CellValue::from).collect())
                    .collect(),
            ),
        )
    }

    #[test]
    fn test_empty_workbook_is_fatal() {
        let result = DocumentReader::with_defaults().read_workbook(&Workbook::default(), "x.xlsx", true);
        assert!(!result.success);
        assert!(result.records.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = DocumentReader::with_defaults().read_path("/nonexistent/rent_roll.xlsx", true);
        assert!(!result.success);
        assert!(result.records.is_empty());
        assert_eq!(result.metadata.source_file, "rent_roll.xlsx");
    }

    #[test]
    fn test_provenance_stamped() {
        let wb = Workbook::new(vec![sheet(
            "Mieterliste",
            vec![vec!["Mieter", "Miete"], vec!["A GmbH", "500 €"]],
        )]);

        let result = DocumentReader::with_defaults().read_workbook(&wb, "rr.xlsx", true);
        assert!(result.success);

        let r = &result.records[0];
        assert_eq!(r.provenance.source_file, "rr.xlsx");
        assert_eq!(r.provenance.source_sheet, "Mieterliste");
        assert_eq!(r.provenance.source_row, 2);
        assert_eq!(result.metadata.detected_language.as_deref(), Some("de"));
    }

    #[test]
    fn test_stacked_header_prefers_merged_mapping() {
        let wb = Workbook::new(vec![sheet(
            "Tenants",
            vec![
                vec!["", "Annual", ""],
                vec!["Tenant", "Rent", "Unit ID"],
                vec!["A GmbH", "12.000 €", "A-01"],
            ],
        )]);

        let result = DocumentReader::with_defaults().read_workbook(&wb, "rr.xlsx", false);
        let r = &result.records[0];
        assert_eq!(r.number("annual_rent_value"), Some(12000.0));
        assert_eq!(r.text("unit_id").as_deref(), Some("A-01"));
        assert_eq!(r.text("tenant_name").as_deref(), Some("A GmbH"));
    }

    #[test]
    fn test_unreadable_sheet_becomes_warning() {
        let wb = Workbook::new(vec![
            sheet("Haus A", vec![vec!["Mieter", "Miete"], vec!["A GmbH", "500"]]),
            Sheet::unreadable("Haus B", "corrupt"),
        ]);

        let result = DocumentReader::with_defaults().read_workbook(&wb, "rr.xlsx", true);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Haus B"));
        assert_eq!(result.sheets_processed, 1);
    }

    #[test]
    fn test_language_sampled_from_first_three_sheets_only() {
        let english = |name: &str, tenant: &str| {
            sheet(
                name,
                vec![vec!["Tenant", "Monthly Rent"], vec![tenant, "500"]],
            )
        };
        // 第 4 张表单独看是德语（de 7 分 > en 6 分）
        let german = sheet(
            "Haus 4",
            vec![
                vec!["Mieter", "Einheit", "Fläche m²", "Monatsmiete", "Nutzung", "Vertragsende"],
                vec!["D GmbH", "E1", "80 m²", "950 €", "Büro", "31.12.2030"],
            ],
        );

        let reader = DocumentReader::with_defaults();
        let only_german = reader.read_workbook(&Workbook::new(vec![german.clone()]), "rr.xlsx", true);
        assert_eq!(only_german.metadata.detected_language.as_deref(), Some("de"));

        let wb = Workbook::new(vec![
            english("Building 1", "Acme Ltd"),
            english("Building 2", "Beta plc"),
            english("Building 3", "Gamma Inc"),
            german,
        ]);
        let result = reader.read_workbook(&wb, "rr.xlsx", true);
        assert_eq!(result.sheets_processed, 4);
        assert_eq!(result.records.len(), 4);
        assert_eq!(result.metadata.detected_language.as_deref(), Some("en"));
    }
}
