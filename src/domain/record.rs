// ==========================================
// 租赁清单抽取引擎 - 记录与结果模型
// ==========================================
// 红线: 不做任何单位 / 币种换算
// 用途: DataExtractor 创建 → IdentityResolver 原地修正一次 → 只读输出
// ==========================================

use crate::domain::types::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ParsedValue - 数值与单位分离结果
// ==========================================
// unit / original_text 原样反映源单元格；value 为尽力而为的数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedValue {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub original_text: String,
}

impl ParsedValue {
    pub fn empty(original_text: impl Into<String>) -> Self {
        Self {
            value: None,
            unit: None,
            original_text: original_text.into(),
        }
    }

    pub fn new(value: Option<f64>, unit: Option<String>, original_text: impl Into<String>) -> Self {
        Self {
            value,
            unit,
            original_text: original_text.into(),
        }
    }
}

// ==========================================
// FieldValue - 记录中的标量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 非空（Null / 空白文本视为缺失）
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Number(n) => !n.is_nan(),
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Null => false,
        }
    }

    /// 非空且非零
    pub fn is_meaningful(&self) -> bool {
        match self {
            FieldValue::Number(n) => !n.is_nan() && *n != 0.0,
            other => other.is_present(),
        }
    }

    /// 标识符文本：数值转为文本，文本去首尾空白
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Number(n) if !n.is_nan() => Some(n.to_string()),
            FieldValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

// ==========================================
// Provenance - 来源信息（输出键以 _ 开头）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(rename = "_source_file")]
    pub source_file: String,
    #[serde(rename = "_source_sheet")]
    pub source_sheet: String,
    /// 1 起始的表格行号
    #[serde(rename = "_source_row")]
    pub source_row: usize,
    #[serde(rename = "_extraction_timestamp")]
    pub extraction_timestamp: DateTime<Utc>,
}

// ==========================================
// Record - 一行租赁数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl Record {
    pub fn new(source_row: usize) -> Self {
        Self {
            fields: BTreeMap::new(),
            provenance: Provenance {
                source_file: String::new(),
                source_sheet: String::new(),
                source_row,
                extraction_timestamp: Utc::now(),
            },
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// 字段存在且非空
    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(FieldValue::is_present)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(FieldValue::to_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(FieldValue::as_number)
    }

    pub fn source_row(&self) -> usize {
        self.provenance.source_row
    }

    /// 写入文件 / 工作表 / 抽取时间
    pub fn stamp_source(&mut self, source_file: &str, source_sheet: &str, at: DateTime<Utc>) {
        self.provenance.source_file = source_file.to_string();
        self.provenance.source_sheet = source_sheet.to_string();
        self.provenance.extraction_timestamp = at;
    }
}

// ==========================================
// ValidationIssue - 校验发现（仅提示，不阻断）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// 记录在结果列表中的位置（0 起始）
    pub row_index: usize,
    pub field: String,
    pub message: String,
    pub value: Option<FieldValue>,
}

// ==========================================
// ExtractionMetadata / ExtractionResult
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub extraction_id: String,
    pub source_file: String,
    pub sheets_available: Vec<String>,
    pub sheets_processed: usize,
    pub detected_language: Option<String>,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub message: String,
    pub records: Vec<Record>,
    pub warnings: Vec<String>,
    pub metadata: ExtractionMetadata,
    pub sheets_processed: usize,
    pub total_rows: usize,
    /// 由导入门面填充
    pub validation_issues: Vec<ValidationIssue>,
}

impl ExtractionResult {
    /// 致命失败（工作簿无法打开）：无记录，无部分结果
    pub fn failed(
        extraction_id: String,
        source_file: &str,
        message: String,
        warning: String,
    ) -> Self {
        Self {
            success: false,
            message,
            records: Vec::new(),
            warnings: vec![warning],
            metadata: ExtractionMetadata {
                extraction_id,
                source_file: source_file.to_string(),
                sheets_available: Vec::new(),
                sheets_processed: 0,
                detected_language: None,
                total_rows: 0,
            },
            sheets_processed: 0,
            total_rows: 0,
            validation_issues: Vec::new(),
        }
    }
}
