// ==========================================
// 租赁清单抽取引擎 - 表头映射器
// ==========================================
// 职责: 原始表头文本 → 规范字段；文档语言识别
// 匹配: 精确匹配优先 → 子串匹配（按字段优先级）
// ==========================================

use crate::domain::types::{FieldClass, ParseMode};
use crate::importer::synonyms::{self, SynonymTable};
use std::sync::Arc;

/// 语言关键词（权重 1）；顺序即平局时的优先顺序
const LANGUAGE_KEYWORDS: &[(&str, &[&str])] = &[
    ("en", &["tenant", "rent", "lease", "area", "unit", "occupancy"]),
    ("de", &["mieter", "fläche", "miete", "vertrag", "einheit", "nutzung"]),
    ("fr", &["locataire", "loyer", "bail", "surface", "unité"]),
    ("it", &["inquilino", "affitto", "locazione", "superficie"]),
    ("nl", &["huurder", "huur", "oppervlakte", "eenheid"]),
    ("pl", &["najemca", "czynsz", "powierzchnia", "umowa"]),
    ("sv", &["hyresgäst", "hyra", "yta", "avtal"]),
];

const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone)]
pub struct HeaderMapper {
    table: Arc<SynonymTable>,
}

impl Default for HeaderMapper {
    fn default() -> Self {
        Self::new(Arc::new(SynonymTable::defaults()))
    }
}

impl HeaderMapper {
    pub fn new(table: Arc<SynonymTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    pub fn normalize_header(&self, text: &str) -> String {
        synonyms::normalize_header(text)
    }

    /// 表头 → 规范字段
    ///
    /// 先做全表精确匹配，再做子串匹配；子串匹配时字段优先级决定归属
    pub fn map_header(&self, raw: &str) -> Option<String> {
        let normalized = synonyms::normalize_header(raw);
        if normalized.is_empty() {
            return None;
        }

        self.table
            .exact_match(&normalized)
            .or_else(|| self.table.substring_match(&normalized))
            .map(str::to_string)
    }

    pub fn map_headers(&self, headers: &[String]) -> Vec<Option<String>> {
        headers.iter().map(|h| self.map_header(h)).collect()
    }

    pub fn get_field_type_hint(&self, tag: &str) -> Option<ParseMode> {
        self.table.field_type_hint(tag)
    }

    pub fn field_class(&self, tag: &str) -> FieldClass {
        self.table.field_class(tag)
    }

    /// 关键词直方图识别主语言；全部为 0 时返回 "en"
    pub fn detect_language<S: AsRef<str>>(&self, headers: &[S]) -> String {
        let mut scores = vec![0usize; LANGUAGE_KEYWORDS.len()];

        for header in headers {
            let lower = header.as_ref().to_lowercase();
            for (index, (_, words)) in LANGUAGE_KEYWORDS.iter().enumerate() {
                scores[index] += words.iter().filter(|w| lower.contains(*w)).count();
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (index, &score) in scores.iter().enumerate() {
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((index, score));
            }
        }

        best.map(|(index, _)| LANGUAGE_KEYWORDS[index].0)
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string()
    }
}
