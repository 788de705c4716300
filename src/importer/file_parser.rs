// ==========================================
// 租赁清单抽取引擎 - 文件解析器实现
// ==========================================
// 职责: 文件 → 完整物化的 Workbook（抽取核心之前唯一的 I/O 环节）
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls/.ods) / CSV (.csv)
// ==========================================

use crate::domain::workbook::{CellValue, Grid, Sheet, Workbook};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::Timelike;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, warn};

const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
const CSV_DELIMITERS: &[u8] = &[b';', b',', b'\t'];

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为工作簿
    ///
    /// # 返回
    /// - Ok(Workbook): 所有工作表的单元格网格
    /// - Err: 文件不存在 / 格式不支持 / 无法打开
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Workbook>;
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV Parser 实现
// ==========================================
// 单工作表，表名取文件名（不含扩展名）；不把首行当表头
pub struct CsvParser;

impl CsvParser {
    /// 根据首行各候选分隔符出现次数选择分隔符；平局取靠前者
    fn sniff_delimiter(content: &[u8]) -> u8 {
        let first_line = content
            .split(|b| *b == b'\n')
            .next()
            .unwrap_or_default();

        let mut best = (b',', 0usize);
        for &delimiter in CSV_DELIMITERS {
            let count = first_line.iter().filter(|b| **b == delimiter).count();
            if count > best.1 {
                best = (delimiter, count);
            }
        }
        best.0
    }

    fn parse_bytes(&self, sheet_name: &str, content: &[u8]) -> ImportResult<Workbook> {
        let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
        let delimiter = Self::sniff_delimiter(content);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(content);

        let mut rows = Vec::new();
        for result in reader.byte_records() {
            let record = result?;
            let row: Vec<CellValue> = record
                .iter()
                .map(|field| CellValue::from(&*String::from_utf8_lossy(field)))
                .collect();
            rows.push(row);
        }

        debug!(
            sheet = sheet_name,
            rows = rows.len(),
            delimiter = %(delimiter as char).escape_default(),
            "CSV 解析完成"
        );

        Ok(Workbook::new(vec![Sheet::new(sheet_name, Grid::new(rows))]))
    }
}

impl FileParser for CsvParser {
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Workbook> {
        ensure_exists(file_path)?;

        let ext = file_extension(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let content = std::fs::read(file_path)?;
        let sheet_name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Sheet1".to_string());

        self.parse_bytes(&sheet_name, &content)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// calamine 单元格 → CellValue
    pub fn cell_from_data(cell: &Data) -> CellValue {
        match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::from(s.as_str()),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(datetime) if datetime.num_seconds_from_midnight() == 0 => {
                    CellValue::Text(datetime.format("%Y-%m-%d").to_string())
                }
                Some(datetime) => CellValue::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }

    /// Range → Grid；按 range 起点补齐，使网格第 n 行对应表格第 n+1 行
    fn grid_from_range(range: &Range<Data>) -> Grid {
        if range.is_empty() {
            return Grid::default();
        }

        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];

        for data_row in range.rows() {
            let mut row = vec![CellValue::Empty; start_col as usize];
            row.extend(data_row.iter().map(Self::cell_from_data));
            rows.push(row);
        }

        Grid::new(rows)
    }
}

impl FileParser for ExcelParser {
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Workbook> {
        ensure_exists(file_path)?;

        let ext = file_extension(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::EmptyWorkbook(file_path.display().to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            match workbook.worksheet_range(&name) {
                Ok(range) => {
                    let grid = Self::grid_from_range(&range);
                    debug!(sheet = %name, rows = grid.row_count(), "工作表读取完成");
                    sheets.push(Sheet::new(name, grid));
                }
                Err(e) => {
                    // 单表读取失败不影响其他表
                    warn!(sheet = %name, error = %e, "工作表读取失败");
                    sheets.push(Sheet::unreadable(name, e.to_string()));
                }
            }
        }

        Ok(Workbook::new(sheets))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Workbook> {
        let path = file_path.as_ref();
        ensure_exists(path)?;

        let ext = file_extension(path);
        match ext.as_str() {
            "csv" => CsvParser.parse_workbook(path),
            e if EXCEL_EXTENSIONS.contains(&e) => ExcelParser.parse_workbook(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Workbook> {
        self.parse(file_path)
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

    #[test]
    fn test_csv_parser_semicolon_file() {
        let file = csv_file("Mieter;Miete;Fläche\nBäckerei Schmidt;1.234,56 €;120\n");

        let wb = CsvParser.parse_workbook(file.path()).unwrap();
        assert_eq!(wb.len(), 1);

        let grid = &wb.first().unwrap().grid;
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.cell(0, 0), &CellValue::Text("Mieter".to_string()));
        assert_eq!(grid.cell(1, 1), &CellValue::Text("1.234,56 €".to_string()));
    }

    #[test]
    fn test_csv_parser_comma_file_with_bom_and_ragged_rows() {
        let file = csv_file("\u{feff}Tenant,Rent\nA GmbH,500,extra\n,\n");

        let wb = CsvParser.parse_workbook(file.path()).unwrap();
        let grid = &wb.first().unwrap().grid;
        assert_eq!(grid.cell(0, 0), &CellValue::Text("Tenant".to_string()));
        assert_eq!(grid.row(1).len(), 3);
        assert!(grid.row(2).iter().all(CellValue::is_blank));
    }

    #[test]
    fn test_csv_sheet_named_after_file_stem() {
        let file = csv_file("a,b\n");
        let stem = file.path().file_stem().unwrap().to_string_lossy().to_string();

        let wb = CsvParser.parse_workbook(file.path()).unwrap();
        assert_eq!(wb.sheet_names(), vec![stem]);
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(CsvParser::sniff_delimiter(b"a;b;c\n1,5;2;3"), b';');
        assert_eq!(CsvParser::sniff_delimiter(b"a,b,c\n"), b',');
        assert_eq!(CsvParser::sniff_delimiter(b"a\tb\n"), b'\t');
        assert_eq!(CsvParser::sniff_delimiter(b"single\n"), b',');
    }

    #[test]
    fn test_file_not_found() {
        let result = UniversalFileParser.parse("non_existent.xlsx");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = Builder::new().suffix(".pdf").tempfile().unwrap();
        let result = UniversalFileParser.parse(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "pdf"));
    }

    #[test]
    fn test_cell_mapping() {
        assert_eq!(ExcelParser::cell_from_data(&Data::Int(42)), CellValue::Number(42.0));
        assert_eq!(ExcelParser::cell_from_data(&Data::Float(3.5)), CellValue::Number(3.5));
        assert_eq!(
            ExcelParser::cell_from_data(&Data::Bool(true)),
            CellValue::Text("true".to_string())
        );
        assert_eq!(ExcelParser::cell_from_data(&Data::String(String::new())), CellValue::Empty);
        assert_eq!(ExcelParser::cell_from_data(&Data::Empty), CellValue::Empty);
    }
}
