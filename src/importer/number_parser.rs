// ==========================================
// 租赁清单抽取引擎 - 数值 / 单位解析器
// ==========================================
// 职责: 单元格 → (数值, 单位, 原文)
// 红线: 永不换算单位或币种；sqft 与 m² 互不转换
// ==========================================
// 检测顺序（先命中者胜出）:
//   百分号 → 币种符号 / ISO 代码 → 面积单位 → 时长 / 数量级关键词 → 纯数字
// ==========================================

use crate::domain::record::ParsedValue;
use crate::domain::types::ParseMode;
use crate::domain::workbook::CellValue;
use regex::Regex;
use std::sync::LazyLock;

// ==========================================
// 词表与模式
// ==========================================

/// 空值哨兵（小写比较）
const NULL_SENTINELS: &[&str] = &["", "-", "–", "—", "n/a", "na", "null", "none", "00:00:00"];

/// 近似值前缀（小写，按顺序匹配一次）
const APPROX_PREFIXES: &[&str] = &[
    "approx.", "approx", "ca.", "~", "circa", "ungefähr", "etwa", "environ", "about", "roughly",
    "ongeveer", "około",
];

/// 比较运算符前缀
const OPERATOR_PREFIXES: &[&str] = &[">=", "<=", "≥", "≤", ">", "<", "="];

static CURRENCY_SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(€|\$|£|¥|₹|元|zł)").expect("invalid currency symbol regex"));

static KRONA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\p{L}])(kr)(?:$|[^\p{L}])").expect("invalid krona regex")
});

static ISO_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^\p{L}])(EUR|USD|GBP|CHF|PLN|SEK|DKK|NOK|CZK|HUF|CAD|AUD|INR|JPY|CNY|NZD)(?:$|[^\p{L}])",
    )
    .expect("invalid currency code regex")
});

static AREA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^\p{L}])(m²|m2|sqm|qm|sqft|sq\s*ft|sf|ft²|ft2|square\s*(?:feet|foot|metres?|meters?))(?:$|[^\p{L}])",
    )
    .expect("invalid area unit regex")
});

static GENERIC_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^\p{L}])(jahre|jahr|years|year|yrs|yr|monate|monat|months|month|mo|tage|tag|days|day|wochen|woche|weeks|week|ans|mois|jours|millionen|million|mio|milliarden|mrd|billion|tsd|thousand|k)(?:$|[^\p{L}])",
    )
    .expect("invalid generic unit regex")
});

// ==========================================
// 单位族（检测顺序单元）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitFamily {
    Percentage,
    Currency,
    Area,
    Generic,
}

const DEFAULT_ORDER: [UnitFamily; 4] = [
    UnitFamily::Percentage,
    UnitFamily::Currency,
    UnitFamily::Area,
    UnitFamily::Generic,
];

/// 有提示时先试提示族，其余保持默认顺序
fn detection_order(hint: Option<ParseMode>) -> Vec<UnitFamily> {
    let preferred = hint.map(|mode| match mode {
        ParseMode::Currency => UnitFamily::Currency,
        ParseMode::Area => UnitFamily::Area,
        ParseMode::Percentage => UnitFamily::Percentage,
    });

    let mut order = Vec::with_capacity(DEFAULT_ORDER.len());
    if let Some(family) = preferred {
        order.push(family);
    }
    order.extend(DEFAULT_ORDER.iter().copied().filter(|f| Some(*f) != preferred));
    order
}

// ==========================================
// NumberUnitParser
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberUnitParser;

impl NumberUnitParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析单元格；数值单元格不做单位推断
    pub fn parse(&self, cell: &CellValue, hint: Option<ParseMode>) -> ParsedValue {
        match cell {
            CellValue::Empty => ParsedValue::empty(""),
            CellValue::Number(n) if n.is_nan() => ParsedValue::empty(""),
            CellValue::Number(n) => ParsedValue::new(Some(*n), None, n.to_string()),
            CellValue::Text(text) => self.parse_text(text, hint),
        }
    }

    /// 解析文本单元格；original_text 保留源文本原样
    pub fn parse_text(&self, text: &str, hint: Option<ParseMode>) -> ParsedValue {
        let trimmed = text.trim();
        if is_null_sentinel(trimmed) {
            return ParsedValue::empty(text);
        }

        let cleaned = clean_prefixes(trimmed);

        for family in detection_order(hint) {
            let parsed = match family {
                UnitFamily::Percentage => parse_percentage(text, cleaned),
                UnitFamily::Currency => parse_currency(text, cleaned),
                UnitFamily::Area => parse_area(text, cleaned),
                UnitFamily::Generic => parse_generic_unit(text, cleaned),
            };
            if let Some(parsed) = parsed {
                return parsed;
            }
        }

        ParsedValue::new(parse_numeric_string(cleaned), None, text)
    }
}

fn is_null_sentinel(trimmed: &str) -> bool {
    let lower = trimmed.to_lowercase();
    NULL_SENTINELS.contains(&lower.as_str())
}

/// 大小写不敏感的前缀剥离
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.to_lowercase() == prefix {
        text.get(prefix.len()..)
    } else {
        None
    }
}

/// 去掉近似前缀与比较运算符（各至多一次）
fn clean_prefixes(text: &str) -> &str {
    let mut cleaned = text.trim();

    for prefix in APPROX_PREFIXES {
        if let Some(rest) = strip_prefix_ci(cleaned, prefix) {
            cleaned = rest.trim();
            break;
        }
    }

    for op in OPERATOR_PREFIXES {
        if let Some(rest) = cleaned.strip_prefix(op) {
            cleaned = rest.trim();
            break;
        }
    }

    cleaned
}

/// 第一个命中的单位记号（捕获组 1）
fn first_token<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// 删除所有命中的单位记号（仅删捕获组 1，保留边界字符）
fn strip_tokens(re: &Regex, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            out.push_str(&text[last..m.start()]);
            last = m.end();
        }
    }
    out.push_str(&text[last..]);
    out
}

/// 删除全部单位族记号，只留数字部分（"12,50 €/m2" → "12,50 /"）
fn strip_unit_tokens(text: &str) -> String {
    let remainder = text.replace('%', "");
    [
        &*CURRENCY_SYMBOL_RE,
        &*KRONA_RE,
        &*ISO_CODE_RE,
        &*AREA_RE,
        &*GENERIC_UNIT_RE,
    ]
    .into_iter()
    .fold(remainder, |acc, re| strip_tokens(re, &acc))
}

fn parse_percentage(source: &str, cleaned: &str) -> Option<ParsedValue> {
    if !cleaned.contains('%') {
        return None;
    }
    let number = parse_numeric_string(&strip_unit_tokens(cleaned));
    Some(ParsedValue::new(number, Some("%".to_string()), source))
}

fn symbol_to_iso(symbol: &str) -> String {
    match symbol.to_lowercase().as_str() {
        "€" => "EUR".to_string(),
        "$" => "USD".to_string(),
        "£" => "GBP".to_string(),
        "zł" => "PLN".to_string(),
        "kr" => "SEK".to_string(),
        "₹" => "INR".to_string(),
        "¥" => "JPY".to_string(),
        "元" => "CNY".to_string(),
        other => other.to_string(),
    }
}

fn parse_currency(source: &str, cleaned: &str) -> Option<ParsedValue> {
    let symbol =
        first_token(&CURRENCY_SYMBOL_RE, cleaned).or_else(|| first_token(&KRONA_RE, cleaned));
    let code = first_token(&ISO_CODE_RE, cleaned);
    if symbol.is_none() && code.is_none() {
        return None;
    }

    // ISO 代码优先于符号
    let currency = code
        .map(|c| c.to_uppercase())
        .or_else(|| symbol.map(symbol_to_iso));

    // 复合单位（€/m²）的分母记号不参与数字解析
    Some(ParsedValue::new(
        parse_numeric_string(&strip_unit_tokens(cleaned)),
        currency,
        source,
    ))
}

/// 面积单位拼写规范化（只改写法，不换算）
fn normalize_area_unit(token: &str) -> String {
    let lower = token
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    match lower.as_str() {
        "m²" | "m2" | "sqm" | "qm" => "m²".to_string(),
        "sqft" | "sq ft" | "sf" | "ft²" | "ft2" => "sqft".to_string(),
        s if s.starts_with("square") && s.contains("f") => "sqft".to_string(),
        s if s.starts_with("square") => "m²".to_string(),
        other => other.to_string(),
    }
}

fn parse_area(source: &str, cleaned: &str) -> Option<ParsedValue> {
    let token = first_token(&AREA_RE, cleaned)?;
    let unit = normalize_area_unit(token);
    Some(ParsedValue::new(
        parse_numeric_string(&strip_unit_tokens(cleaned)),
        Some(unit),
        source,
    ))
}

fn normalize_generic_unit(token: &str) -> String {
    match token.to_lowercase().as_str() {
        "jahre" | "jahr" => "Jahre",
        "years" | "year" | "yrs" | "yr" => "years",
        "monate" | "monat" => "Monate",
        "months" | "month" | "mo" => "months",
        "tage" | "tag" => "Tage",
        "days" | "day" => "days",
        "wochen" | "woche" => "Wochen",
        "weeks" | "week" => "weeks",
        "ans" => "ans",
        "mois" => "mois",
        "jours" => "jours",
        "millionen" | "million" | "mio" => "mio",
        "milliarden" | "mrd" => "mrd",
        "billion" => "billion",
        "tsd" => "tsd",
        "thousand" => "thousand",
        "k" => "k",
        other => return other.to_string(),
    }
    .to_string()
}

fn parse_generic_unit(source: &str, cleaned: &str) -> Option<ParsedValue> {
    let token = first_token(&GENERIC_UNIT_RE, cleaned)?;
    let unit = normalize_generic_unit(token);
    Some(ParsedValue::new(
        parse_numeric_string(&strip_unit_tokens(cleaned)),
        Some(unit),
        source,
    ))
}

// ==========================================
// 数字字符串的区域格式判定
// ==========================================

/// 按区域格式解析数字字符串，无法解析时返回 None（预期情况，不是错误）
///
/// # 规则
/// - 括号包裹（会计负数）或前导负号 → 负数
/// - 撇号为千分位，直接删除（1'234.56）
/// - 逗号与点同时出现：靠后的是小数点
/// - 仅逗号：逗号后恰为 3 位 → 千分位；1–2 位 → 小数点；多个逗号 → 千分位
/// - 仅点：每个点后恰为 3 位 → 千分位；否则为小数点
///
/// "1,234" 按千分位解析为 1234（固定策略）
pub fn parse_numeric_string(text: &str) -> Option<f64> {
    let mut cleaned = text.trim();
    if cleaned.is_empty() {
        return None;
    }

    let mut negative = false;
    if let Some(inner) = cleaned
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        negative = true;
        cleaned = inner.trim();
    } else if let Some(rest) = cleaned
        .strip_prefix('-')
        .or_else(|| cleaned.strip_prefix('−'))
    {
        negative = true;
        cleaned = rest.trim_start();
    }

    let kept: String = cleaned
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '\'' | '’'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let num_str = kept.replace(['\'', '’'], "");
    let has_comma = num_str.contains(',');
    let has_dot = num_str.contains('.');

    let normalized = match (has_comma, has_dot) {
        (true, true) => {
            let last_comma = num_str.rfind(',').unwrap_or(0);
            let last_dot = num_str.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                num_str.replace('.', "").replace(',', ".")
            } else {
                num_str.replace(',', "")
            }
        }
        (true, false) => {
            let parts: Vec<&str> = num_str.split(',').collect();
            if parts.len() == 2 && parts[1].len() == 3 {
                num_str.replace(',', "")
            } else if parts.len() == 2 && parts[1].len() <= 2 {
                num_str.replace(',', ".")
            } else {
                num_str.replace(',', "")
            }
        }
        (false, true) => {
            let parts: Vec<&str> = num_str.split('.').collect();
            let all_groups = parts.len() >= 2 && parts[1..].iter().all(|p| p.len() == 3);
            if all_groups {
                num_str.replace('.', "")
            } else {
                num_str
            }
        }
        (false, false) => num_str,
    };

    let value = normalized.parse::<f64>().ok()?;
    Some(if negative { -value.abs() } else { value })
}
