// ==========================================
// 租赁清单抽取引擎 - 工作表选择器
// ==========================================
// 职责: 判定哪些工作表是值得处理的数据表
// 规则: 名称跳过词 → 名称正向词（+10）→ 前 N 行可识别表头数
// ==========================================

use crate::domain::workbook::{Grid, Sheet, Workbook};
use crate::importer::header_mapper::HeaderMapper;

/// 名称含以下关键词的工作表不处理（不区分大小写，子串匹配）
const SKIP_KEYWORDS: &[&str] = &[
    "summary",
    "total",
    "totals",
    "zusammenfassung",
    "übersicht",
    "notes",
    "notizen",
    "hinweise",
    "instructions",
    "anleitung",
    "index",
    "inhaltsverzeichnis",
    "cover",
    "deckblatt",
    "template",
    "vorlage",
    "example",
    "beispiel",
    "récapitulatif",
    "riepilogo",
    "samenvatting",
];

/// 名称含以下关键词的工作表很可能是租赁清单
const RENT_ROLL_KEYWORDS: &[&str] = &[
    "rent roll",
    "rentroll",
    "rent_roll",
    "mieterliste",
    "mieter",
    "mieterübersicht",
    "tenancy",
    "tenant",
    "tenants",
    "état locatif",
    "locataire",
    "elenco locatari",
    "inquilini",
    "huurderslijst",
    "huurders",
    "lista najemców",
    "najemcy",
    "hyresgäster",
    "hyresförteckning",
    "stacking plan",
    "schedule",
];

const NAME_MATCH_SCORE: usize = 10;

pub struct SheetSelector {
    mapper: HeaderMapper,
    scan_rows: usize,
}

impl SheetSelector {
    pub fn new(mapper: HeaderMapper, scan_rows: usize) -> Self {
        Self { mapper, scan_rows }
    }

    pub fn should_skip_sheet(&self, name: &str) -> bool {
        let lower = name.trim().to_lowercase();
        SKIP_KEYWORDS.iter().any(|kw| lower.contains(kw))
    }

    pub fn is_likely_rent_roll(&self, name: &str) -> bool {
        let lower = name.trim().to_lowercase();
        RENT_ROLL_KEYWORDS.iter().any(|kw| lower.contains(kw))
    }

    /// 前 scan_rows 行中可映射为规范字段的单元格数
    pub fn count_header_matches(&self, grid: &Grid) -> usize {
        grid.rows()
            .take(self.scan_rows)
            .flat_map(|row| row.iter())
            .filter(|cell| !cell.is_blank())
            .filter(|cell| self.mapper.map_header(&cell.as_text()).is_some())
            .count()
    }

    fn score(&self, sheet: &Sheet) -> usize {
        let name_score = if self.is_likely_rent_roll(&sheet.name) {
            NAME_MATCH_SCORE
        } else {
            0
        };
        name_score + self.count_header_matches(&sheet.grid)
    }

    /// 单表模式：选出得分最高的一张表
    ///
    /// 平局取先出现者；只有一张表或没有正分表时回退到第一张表
    pub fn select_best_sheet(&self, workbook: &Workbook) -> Option<String> {
        let first = workbook.first()?;
        if workbook.len() == 1 {
            return Some(first.name.clone());
        }

        let mut best: Option<(&Sheet, usize)> = None;
        for sheet in workbook.sheets() {
            if self.should_skip_sheet(&sheet.name) {
                continue;
            }
            let score = self.score(sheet);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((sheet, score));
            }
        }

        Some(best.map_or(first, |(sheet, _)| sheet).name.clone())
    }

    /// 多表模式：所有非跳过且前 N 行含可识别表头的表
    ///
    /// 读不出单元格的表也保留，由编排器记为警告
    pub fn get_all_data_sheets(&self, workbook: &Workbook) -> Vec<String> {
        let candidates: Vec<&Sheet> = workbook
            .sheets()
            .iter()
            .filter(|s| !self.should_skip_sheet(&s.name))
            .collect();

        let data_sheets: Vec<String> = candidates
            .iter()
            .filter(|s| s.read_error.is_some() || self.count_header_matches(&s.grid) > 0)
            .map(|s| s.name.clone())
            .collect();
        if !data_sheets.is_empty() {
            return data_sheets;
        }

        if !candidates.is_empty() {
            return candidates.iter().map(|s| s.name.clone()).collect();
        }

        workbook.first().map(|s| vec![s.name.clone()]).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workbook::CellValue;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|r| r.iter().map(|c| CellValue::from(*c)).collect())
                .collect(),
        )
    }

    fn selector() -> SheetSelector {
        SheetSelector::new(HeaderMapper::default(), 30)
    }

    fn header_grid() -> Grid {
        grid(&[&["Mieter", "Fläche m²", "Monatsmiete"], &["A GmbH", "100", "1.000"]])
    }

    #[test]
    fn test_skip_and_positive_keywords() {
        let s = selector();
        assert!(s.should_skip_sheet("Summary"));
        assert!(s.should_skip_sheet("  Deckblatt 2024"));
        assert!(!s.should_skip_sheet("Mieterliste"));
        assert!(s.is_likely_rent_roll("Mieterliste"));
        assert!(s.is_likely_rent_roll("Rent Roll Q4"));
        assert!(!s.is_likely_rent_roll("Tabelle1"));
    }

    #[test]
    fn test_select_best_sheet_prefers_name_and_headers() {
        let wb = Workbook::new(vec![
            Sheet::new("Summary", header_grid()),
            Sheet::new("Tabelle1", grid(&[&["foo", "bar"]])),
            Sheet::new("Mieterliste", header_grid()),
        ]);
        assert_eq!(selector().select_best_sheet(&wb).as_deref(), Some("Mieterliste"));
    }

    #[test]
    fn test_select_best_sheet_falls_back_to_first() {
        let wb = Workbook::new(vec![
            Sheet::new("Blatt A", grid(&[&["foo"]])),
            Sheet::new("Blatt B", grid(&[&["bar"]])),
        ]);
        assert_eq!(selector().select_best_sheet(&wb).as_deref(), Some("Blatt A"));

        let single = Workbook::new(vec![Sheet::new("Summary", Grid::default())]);
        assert_eq!(selector().select_best_sheet(&single).as_deref(), Some("Summary"));

        assert_eq!(selector().select_best_sheet(&Workbook::default()), None);
    }

    #[test]
    fn test_get_all_data_sheets_filters_by_headers() {
        let wb = Workbook::new(vec![
            Sheet::new("Summary", header_grid()),
            Sheet::new("Haus A", header_grid()),
            Sheet::new("Notizen", header_grid()),
            Sheet::new("Leer", grid(&[&["foo"]])),
            Sheet::new("Haus B", header_grid()),
        ]);
        assert_eq!(selector().get_all_data_sheets(&wb), vec!["Haus A", "Haus B"]);
    }

    #[test]
    fn test_get_all_data_sheets_fallbacks() {
        let no_headers = Workbook::new(vec![
            Sheet::new("Summary", grid(&[&["foo"]])),
            Sheet::new("Blatt", grid(&[&["bar"]])),
        ]);
        assert_eq!(selector().get_all_data_sheets(&no_headers), vec!["Blatt"]);

        let all_skipped = Workbook::new(vec![
            Sheet::new("Summary", grid(&[&["foo"]])),
            Sheet::new("Notes", grid(&[&["bar"]])),
        ]);
        assert_eq!(selector().get_all_data_sheets(&all_skipped), vec!["Summary"]);

        assert!(selector().get_all_data_sheets(&Workbook::default()).is_empty());
    }

    #[test]
    fn test_scan_depth_is_bounded() {
        let filler: &[&str] = &["x"];
        let mut rows: Vec<&[&str]> = vec![filler; 5];
        rows.push(&["Mieter", "Miete"]);
        let deep = grid(&rows);

        assert_eq!(SheetSelector::new(HeaderMapper::default(), 5).count_header_matches(&deep), 0);
        assert_eq!(SheetSelector::new(HeaderMapper::default(), 30).count_header_matches(&deep), 2);
    }
}
