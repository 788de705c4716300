// ==========================================
// 租赁清单抽取引擎 - 数据行抽取
// ==========================================
// 职责: 表头行之后的数据行 → Record 列表
// 红线: 带单位的值拆成 _value / _unit / _original 三个字段，绝不换算
// ==========================================
// 流程:
// 1. 首列命中汇总关键词 → 停止（其后行全部丢弃）
// 2. 全空行 → 跳过
// 3. 按列映射字段：文本类原样 / 日期类规范化 / 数值类走解析器
// 4. 无任何有意义字段的行 → 丢弃
// ==========================================

use crate::domain::record::{FieldValue, Record};
use crate::domain::types::FieldClass;
use crate::domain::workbook::{CellValue, Grid};
use crate::importer::header_mapper::HeaderMapper;
use crate::importer::number_parser::NumberUnitParser;
use chrono::{NaiveDate, NaiveDateTime};

/// 首列出现以下关键词视为汇总 / 合计 / 空置区起点
const SUMMARY_KEYWORDS: &[&str] = &[
    "total",
    "totals",
    "gesamt",
    "summe",
    "ergebnis",
    "total général",
    "sous-total",
    "totale",
    "totaal",
    "razem",
    "totalt",
    "summa",
    "grand total",
    "subtotal",
    "zwischensumme",
    "vacant",
    "vacancy",
    "leerstand",
];

/// 至少一个非空非零才保留该行
const MEANINGFUL_FIELDS: &[&str] = &[
    "tenant_name",
    "tenant_id",
    "unit_id",
    "monthly_rent_value",
    "annual_rent_value",
    "monthly_rent",
    "annual_rent",
    "area_sqm_value",
    "area_sqft_value",
    "area_sqm",
    "area_sqft",
    "contractual_partner",
    "contract_id",
    "asset_id",
    "sap_object_number",
    "composite_unit_id",
    "mo_number",
    "bookkeeping_area",
    "business_unit",
    "business_unit_code",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M"];

/// 日期文本 → ISO（YYYY-MM-DD）；无法识别返回 None
pub fn normalize_date(text: &str) -> Option<String> {
    let text = text.trim();

    if text.len() == 8 && text.chars().all(|c| c.is_ascii_digit()) {
        let year = text[0..4].parse::<i32>().ok()?;
        let month = text[4..6].parse::<u32>().ok()?;
        let day = text[6..8].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .map(|d| d.format("%Y-%m-%d").to_string())
}

pub struct DataExtractor {
    mapper: HeaderMapper,
    parser: NumberUnitParser,
}

impl DataExtractor {
    pub fn new(mapper: HeaderMapper) -> Self {
        Self {
            mapper,
            parser: NumberUnitParser::new(),
        }
    }

    /// 抽取表头行之后的记录；source_row 为 1 起始行号
    pub fn extract_data(
        &self,
        grid: &Grid,
        header_row: usize,
        mapped_headers: &[Option<String>],
    ) -> Vec<Record> {
        let mut records = Vec::new();

        for row_index in (header_row + 1)..grid.row_count() {
            let row = grid.row(row_index);

            if self.is_summary_row(grid.cell(row_index, 0)) {
                break;
            }

            if row.iter().all(CellValue::is_blank) {
                continue;
            }

            let record = self.process_row(row, mapped_headers, row_index + 1);
            if Self::has_meaningful_data(&record) {
                records.push(record);
            }
        }

        records
    }

    pub fn is_summary_row(&self, first_cell: &CellValue) -> bool {
        let lower = first_cell.as_text().trim().to_lowercase();
        if lower.is_empty() {
            return false;
        }
        SUMMARY_KEYWORDS.iter().any(|kw| lower.contains(kw))
    }

    fn process_row(
        &self,
        row: &[CellValue],
        mapped_headers: &[Option<String>],
        source_row: usize,
    ) -> Record {
        let mut record = Record::new(source_row);

        for (col, tag) in mapped_headers.iter().enumerate() {
            let Some(tag) = tag else { continue };
            let Some(cell) = row.get(col) else { continue };
            if cell.is_blank() {
                continue;
            }

            // 同一字段多列映射时，第一个非空列胜出
            if record.has(tag) || record.get(&format!("{}_value", tag)).is_some() {
                continue;
            }

            // 所有列先走解析器；带单位一律拆成三元组
            let hint = self.mapper.get_field_type_hint(tag);
            let parsed = self.parser.parse(cell, hint);

            if let Some(unit) = parsed.unit {
                let value = parsed.value.map_or(FieldValue::Null, FieldValue::Number);
                record.set(format!("{}_value", tag), value);
                record.set(format!("{}_unit", tag), unit);
                record.set(format!("{}_original", tag), parsed.original_text);
                continue;
            }

            match self.mapper.field_class(tag) {
                FieldClass::Text => {
                    record.set(tag.as_str(), cell.as_text().trim().to_string());
                }
                FieldClass::Date => {
                    let value = match cell {
                        CellValue::Number(n) => FieldValue::Number(*n),
                        other => {
                            let text = other.as_text();
                            let trimmed = text.trim();
                            FieldValue::Text(
                                normalize_date(trimmed).unwrap_or_else(|| trimmed.to_string()),
                            )
                        }
                    };
                    record.set(tag.as_str(), value);
                }
                FieldClass::Value => {
                    if let Some(value) = parsed.value {
                        record.set(tag.as_str(), value);
                    } else if !parsed.original_text.is_empty() {
                        record.set(tag.as_str(), parsed.original_text);
                    }
                }
            }
        }

        record
    }

    fn has_meaningful_data(record: &Record) -> bool {
        MEANINGFUL_FIELDS
            .iter()
            .any(|field| {
                record
                    .get(field)
                    .or_else(|| record.get(&format!("{}_value", field)))
                    .is_some_and(FieldValue::is_meaningful)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: Vec<Vec<CellValue>>) -> Grid {
        Grid::new(rows)
    }

    fn t(s: &str) -> CellValue {
        CellValue::from(s)
    }

    fn extractor() -> DataExtractor {
        DataExtractor::new(HeaderMapper::default())
    }

    fn mapped(tags: &[Option<&str>]) -> Vec<Option<String>> {
        tags.iter().map(|t| t.map(str::to_string)).collect()
    }

    #[test]
    fn test_unit_separation_triad() {
        let g = grid(vec![
            vec![t("Tenant"), t("Monthly Rent"), t("Area")],
            vec![t("Bäckerei Schmidt"), t("1.234,56 €"), t("7,200 sqft")],
        ]);
        let headers = mapped(&[Some("tenant_name"), Some("monthly_rent"), Some("area_sqft")]);

        let records = extractor().extract_data(&g, 0, &headers);
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.text("tenant_name").as_deref(), Some("Bäckerei Schmidt"));
        assert_eq!(r.number("monthly_rent_value"), Some(1234.56));
        assert_eq!(r.text("monthly_rent_unit").as_deref(), Some("EUR"));
        assert_eq!(r.text("monthly_rent_original").as_deref(), Some("1.234,56 €"));
        assert_eq!(r.number("area_sqft_value"), Some(7200.0));
        assert_eq!(r.text("area_sqft_unit").as_deref(), Some("sqft"));
        assert!(r.get("monthly_rent").is_none());
        assert_eq!(r.source_row(), 2);
    }

    #[test]
    fn test_summary_row_stops_extraction() {
        let g = grid(vec![
            vec![t("Tenant"), t("Rent")],
            vec![t("A GmbH"), CellValue::Number(1000.0)],
            vec![t("Gesamt"), CellValue::Number(1000.0)],
            vec![t("B GmbH"), CellValue::Number(500.0)],
        ]);
        let headers = mapped(&[Some("tenant_name"), Some("monthly_rent")]);

        let records = extractor().extract_data(&g, 0, &headers);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("tenant_name").as_deref(), Some("A GmbH"));
        assert_eq!(records[0].number("monthly_rent"), Some(1000.0));
    }

    #[test]
    fn test_blank_and_meaningless_rows_skipped() {
        let g = grid(vec![
            vec![t("Tenant"), t("Rent"), t("Status")],
            vec![CellValue::Empty, t("  "), CellValue::Empty],
            vec![t("A GmbH"), t("500"), t("vermietet")],
            vec![CellValue::Empty, CellValue::Number(0.0), t("leer")],
        ]);
        let headers = mapped(&[Some("tenant_name"), Some("monthly_rent"), Some("status")]);

        let records = extractor().extract_data(&g, 0, &headers);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_row(), 3);
    }

    #[test]
    fn test_text_fields_keep_text_unless_unit_found() {
        let g = grid(vec![
            vec![t("Tenant"), t("Unit")],
            vec![t("  Bäckerei Schmidt "), CellValue::Number(62210.0)],
            vec![t("EG-01 "), t("100 m2")],
        ]);
        let headers = mapped(&[Some("tenant_name"), Some("unit_id")]);

        let records = extractor().extract_data(&g, 0, &headers);
        let r = &records[0];
        assert_eq!(r.text("tenant_name").as_deref(), Some("Bäckerei Schmidt"));
        assert!(r.get("tenant_name_unit").is_none());
        // 无单位的数字保持文本
        assert_eq!(r.get("unit_id"), Some(&FieldValue::Text("62210".to_string())));

        let r = &records[1];
        assert_eq!(r.text("tenant_name").as_deref(), Some("EG-01"));
        assert!(r.get("unit_id").is_none());
        assert_eq!(r.number("unit_id_value"), Some(100.0));
        assert_eq!(r.text("unit_id_unit").as_deref(), Some("m²"));
        assert_eq!(r.text("unit_id_original").as_deref(), Some("100 m2"));
    }

    #[test]
    fn test_row_with_only_business_unit_is_kept() {
        let g = grid(vec![
            vec![t("WE"), t("Bemerkung")],
            vec![t("WE12"), t("Parkplatz")],
        ]);
        let headers = mapped(&[Some("business_unit_code"), None]);

        let records = extractor().extract_data(&g, 0, &headers);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("business_unit_code").as_deref(), Some("WE12"));

        let mut records = records;
        crate::importer::identity_resolver::IdentityResolver::default().resolve(&mut records);
        assert_eq!(records[0].text("unit_id").as_deref(), Some("WE12"));
    }

    #[test]
    fn test_unparseable_value_keeps_original_text() {
        let g = grid(vec![
            vec![t("Tenant"), t("Rent")],
            vec![t("A GmbH"), t("auf Anfrage")],
        ]);
        let headers = mapped(&[Some("tenant_name"), Some("monthly_rent")]);

        let records = extractor().extract_data(&g, 0, &headers);
        assert_eq!(records[0].text("monthly_rent").as_deref(), Some("auf Anfrage"));
    }

    #[test]
    fn test_first_non_empty_duplicate_column_wins() {
        let g = grid(vec![
            vec![t("Mieter"), t("Tenant")],
            vec![CellValue::Empty, t("B GmbH")],
            vec![t("C GmbH"), t("D GmbH")],
        ]);
        let headers = mapped(&[Some("tenant_name"), Some("tenant_name")]);

        let records = extractor().extract_data(&g, 0, &headers);
        assert_eq!(records[0].text("tenant_name").as_deref(), Some("B GmbH"));
        assert_eq!(records[1].text("tenant_name").as_deref(), Some("C GmbH"));
    }

    #[test]
    fn test_dates_normalized() {
        assert_eq!(normalize_date("31.12.2025").as_deref(), Some("2025-12-31"));
        assert_eq!(normalize_date("01/02/2024").as_deref(), Some("2024-02-01"));
        assert_eq!(normalize_date("2024-03-15").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("20240315").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("2024-03-15 00:00:00").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("unbefristet"), None);

        let g = grid(vec![
            vec![t("Tenant"), t("Lease End")],
            vec![t("A GmbH"), t("31.12.2025")],
            vec![t("B GmbH"), t("unbefristet")],
        ]);
        let headers = mapped(&[Some("tenant_name"), Some("lease_end")]);
        let records = extractor().extract_data(&g, 0, &headers);
        assert_eq!(records[0].text("lease_end").as_deref(), Some("2025-12-31"));
        assert_eq!(records[1].text("lease_end").as_deref(), Some("unbefristet"));
    }

    #[test]
    fn test_summary_keyword_detection() {
        let e = extractor();
        assert!(e.is_summary_row(&t("Total")));
        assert!(e.is_summary_row(&t("  Zwischensumme Haus A")));
        assert!(e.is_summary_row(&t("Leerstand")));
        assert!(!e.is_summary_row(&t("Bäckerei Schmidt")));
        assert!(!e.is_summary_row(&CellValue::Empty));
    }
}
