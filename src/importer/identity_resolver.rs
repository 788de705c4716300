// ==========================================
// 租赁清单抽取引擎 - 标识解析（跨记录一次性修正）
// ==========================================
// 职责:
// 1. 纯数字租户名 → tenant_id（电话号码除外）
// 2. 租户名缺失 → 回退到 contractual_partner
// 3. unit_id 缺失 → composite / SAP 对象号 / 合同号 / BK-WE-MO 组合
// 4. asset_id 缺失 → SAP 对象号
// ==========================================

use crate::domain::record::Record;
use tracing::warn;

// ==========================================
// PhoneNumberClassifier - 电话号码判定
// ==========================================
pub trait PhoneNumberClassifier: Send + Sync {
    fn is_phone_number(&self, text: &str) -> bool;
}

/// 启发式判定：'+' 开头或国内长途前缀 01–09 开头，且数字位数 ≥ 9
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPhoneClassifier;

const TRUNK_PREFIXES: &[&str] = &["01", "02", "03", "04", "05", "06", "07", "08", "09"];
const MIN_PHONE_DIGITS: usize = 9;

impl PhoneNumberClassifier for HeuristicPhoneClassifier {
    fn is_phone_number(&self, text: &str) -> bool {
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '/' | '(' | ')'))
            .collect();
        if cleaned.is_empty() {
            return false;
        }

        let digits = cleaned.chars().filter(char::is_ascii_digit).count();
        let has_prefix =
            cleaned.starts_with('+') || TRUNK_PREFIXES.iter().any(|p| cleaned.starts_with(p));

        has_prefix && digits >= MIN_PHONE_DIGITS
    }
}

/// "62210.0" → "62210"；其他文本原样返回
fn strip_integral_fraction(text: &str) -> &str {
    match text.split_once('.') {
        Some((int, frac)) if !int.is_empty() && !frac.is_empty() && frac.chars().all(|c| c == '0') => {
            int
        }
        _ => text,
    }
}

// ==========================================
// IdentityResolver
// ==========================================
pub struct IdentityResolver {
    classifier: Box<dyn PhoneNumberClassifier>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(Box::new(HeuristicPhoneClassifier))
    }
}

impl IdentityResolver {
    pub fn new(classifier: Box<dyn PhoneNumberClassifier>) -> Self {
        Self { classifier }
    }

    /// 对完整记录集原地修正一次
    pub fn resolve(&self, records: &mut [Record]) {
        for record in records.iter_mut() {
            self.resolve_tenant(record);
            Self::resolve_unit(record);
            Self::resolve_asset(record);
        }
    }

    fn resolve_tenant(&self, record: &mut Record) {
        if let Some(name) = record.text("tenant_name") {
            let candidate = strip_integral_fraction(&name);
            let is_numeric =
                !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_digit());

            if is_numeric && !self.classifier.is_phone_number(candidate) {
                // 已有不同的 tenant_id 时两者都保留，只记告警
                match record.text("tenant_id") {
                    None => {
                        record.set("tenant_id", candidate.to_string());
                        record.remove("tenant_name");
                    }
                    Some(existing) if existing == candidate => {
                        record.remove("tenant_name");
                    }
                    Some(existing) => {
                        warn!(
                            tenant_name = %name,
                            tenant_id = %existing,
                            source_row = record.source_row(),
                            "纯数字租户名与已有租户编号冲突，保持原样"
                        );
                    }
                }
            }
        }

        if !record.has("tenant_name") && !record.has("tenant_id") {
            if let Some(partner) = record.get("contractual_partner").cloned() {
                if partner.is_present() {
                    record.set("tenant_name", partner);
                }
            }
        }
    }

    fn resolve_unit(record: &mut Record) {
        if record.has("unit_id") {
            return;
        }

        for source in ["composite_unit_id", "sap_object_number", "contract_id"] {
            if let Some(value) = record.get(source).filter(|v| v.is_present()).cloned() {
                record.set("unit_id", value);
                return;
            }
        }

        let business_unit = record
            .text("business_unit")
            .or_else(|| record.text("business_unit_code"));
        let parts: Vec<String> = [
            record.text("bookkeeping_area"),
            business_unit,
            record.text("mo_number"),
        ]
        .into_iter()
        .flatten()
        .map(|part| strip_integral_fraction(&part).to_string())
        .collect();

        if !parts.is_empty() {
            record.set("unit_id", parts.join("-"));
        }
    }

    fn resolve_asset(record: &mut Record) {
        if record.has("asset_id") {
            return;
        }
        if let Some(sap) = record
            .get("sap_object_number")
            .filter(|v| v.is_present())
            .cloned()
        {
            record.set("asset_id", sap);
        }
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}
