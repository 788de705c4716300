// ==========================================
// 租赁清单抽取引擎 - 领域类型定义
// ==========================================
// 职责: 表头映射与数值解析之间的显式枚举边界
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 解析模式 (Parse Mode)
// ==========================================
// 由字段目录给出，传给 NumberUnitParser 作为检测优先级提示
// 红线: 提示只改变检测顺序，不会凭空生成单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    Currency,   // 金额（租金 / 服务费 / 押金）
    Area,       // 面积（m² / sqft）
    Percentage, // 百分比（出租率 / 递增率）
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMode::Currency => write!(f, "currency"),
            ParseMode::Area => write!(f, "area"),
            ParseMode::Percentage => write!(f, "percentage"),
        }
    }
}

// ==========================================
// 字段类别 (Field Class)
// ==========================================
// Text: 标识 / 名称 / 状态，永不做数值解析
// Date: 日期列，可识别时规范化为 ISO 文本
// Value: 数值列，走 NumberUnitParser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldClass {
    Text,
    Date,
    Value,
}

// ==========================================
// 校验严重级别 (Severity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}
