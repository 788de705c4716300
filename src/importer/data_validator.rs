// ==========================================
// 租赁清单抽取引擎 - 数据校验器
// ==========================================
// 职责: 对抽取结果做提示性校验（不阻断、不修改记录）
// 规则:
// - 缺少全部标识字段 → warning
// - 租金为负 → warning
// - 租金 / 面积超过量级阈值（疑似解析错误）→ warning
// ==========================================

use crate::domain::record::{FieldValue, Record, ValidationIssue};
use crate::domain::types::Severity;
use crate::i18n::{t, t_with_args};
use serde::Serialize;

/// 默认量级阈值（10 亿）
pub const DEFAULT_MAGNITUDE_THRESHOLD: f64 = 1e9;

const IDENTIFIER_FIELDS: &[&str] = &["tenant_name", "tenant_id", "unit_id", "contract_id", "asset_id"];
const IDENTIFIER_LABEL: &str = "tenant/unit identifiers";

/// (三元组数值字段, 无单位字段)，前者优先
const RENT_FIELDS: &[(&str, &str)] = &[
    ("monthly_rent_value", "monthly_rent"),
    ("annual_rent_value", "annual_rent"),
];

const MAGNITUDE_FIELDS: &[&str] = &[
    "monthly_rent_value",
    "monthly_rent",
    "annual_rent_value",
    "annual_rent",
    "area_sqm_value",
    "area_sqm",
    "area_sqft_value",
    "area_sqft",
];

/// 校验结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone)]
pub struct DataValidator {
    magnitude_threshold: f64,
}

impl Default for DataValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAGNITUDE_THRESHOLD)
    }
}

impl DataValidator {
    pub fn new(magnitude_threshold: f64) -> Self {
        Self {
            magnitude_threshold,
        }
    }

    /// row_index 为记录在列表中的 0 起始位置
    pub fn validate(&self, records: &[Record]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (row_index, record) in records.iter().enumerate() {
            if IDENTIFIER_FIELDS.iter().all(|f| !record.has(f)) {
                issues.push(ValidationIssue {
                    severity: Severity::Warning,
                    row_index,
                    field: IDENTIFIER_LABEL.to_string(),
                    message: t("validation.missing_identifiers"),
                    value: None,
                });
            }

            for (value_field, plain_field) in RENT_FIELDS {
                let found = [*value_field, *plain_field]
                    .into_iter()
                    .find_map(|f| record.number(f).map(|v| (f, v)));

                if let Some((field, rent)) = found {
                    if rent < 0.0 {
                        issues.push(ValidationIssue {
                            severity: Severity::Warning,
                            row_index,
                            field: field.to_string(),
                            message: t("validation.negative_rent"),
                            value: Some(FieldValue::Number(rent)),
                        });
                    }
                }
            }

            for field in MAGNITUDE_FIELDS {
                if let Some(value) = record.number(field) {
                    if value > self.magnitude_threshold {
                        issues.push(ValidationIssue {
                            severity: Severity::Warning,
                            row_index,
                            field: field.to_string(),
                            message: t_with_args(
                                "validation.large_value",
                                &[("value", value.to_string().as_str())],
                            ),
                            value: Some(FieldValue::Number(value)),
                        });
                    }
                }
            }
        }

        issues
    }

    pub fn summarize(issues: &[ValidationIssue]) -> ValidationSummary {
        ValidationSummary {
            errors: issues
                .iter()
                .filter(|i| matches!(i.severity, Severity::Error))
                .count(),
            warnings: issues
                .iter()
                .filter(|i| matches!(i.severity, Severity::Warning))
                .count(),
        }
    }
}
