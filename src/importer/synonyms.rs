// ==========================================
// 租赁清单抽取引擎 - 同义词表（字段目录）
// ==========================================
// 职责: 规范字段 → 多语言表头别名；字段类别与解析提示
// 红线: 构建后不可变，多文档并发共享只读（Arc）
// ==========================================
// 顺序即优先级：具体字段在前，泛化字段在后
//   例: annual_rent 在 monthly_rent 之前（"annual rent" 含 "rent"）
//       occupancy_rate 在 status 之前（"occupancy rate" 含 "occupancy"）
// ==========================================

use crate::domain::types::{FieldClass, ParseMode};
use crate::importer::error::{ImportError, ImportResult};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// 表头规范化：小写、标点转空格、合并空白
///
/// 上标数字（m² 的 ²）属于字母数字字符，保留
pub fn normalize_header(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ==========================================
// 内置字段目录
// ==========================================
struct BuiltinField {
    tag: &'static str,
    class: FieldClass,
    hint: Option<ParseMode>,
    aliases: &'static [&'static str],
}

const fn text(tag: &'static str, aliases: &'static [&'static str]) -> BuiltinField {
    BuiltinField {
        tag,
        class: FieldClass::Text,
        hint: None,
        aliases,
    }
}

const fn date(tag: &'static str, aliases: &'static [&'static str]) -> BuiltinField {
    BuiltinField {
        tag,
        class: FieldClass::Date,
        hint: None,
        aliases,
    }
}

const fn value(
    tag: &'static str,
    hint: Option<ParseMode>,
    aliases: &'static [&'static str],
) -> BuiltinField {
    BuiltinField {
        tag,
        class: FieldClass::Value,
        hint,
        aliases,
    }
}

const BUILTIN_FIELDS: &[BuiltinField] = &[
    // ===== 标识符 =====
    text(
        "composite_unit_id",
        &[
            "mo/bk/wirtschaftseinheit/mo-nr",
            "mo/bk/wirtschaftseinheit/mo",
            "mo/bk/wi/mo-nr",
            "mo-bk-wirtschaftseinheit-mo-nr",
            "mo / bk / wirtschaftseinheit / mo-nr",
            "composite unit id",
            "composite unit",
        ],
    ),
    text(
        "sap_object_number",
        &[
            "sap objektnummer",
            "sap-objektnummer",
            "sap object number",
            "sap object",
            "sap-objektnr",
            "sap objektnr",
            "sap id",
            "sap-object",
            "sap objekt id",
            "sap-objekt",
        ],
    ),
    text(
        "mo_number",
        &[
            "mo nummer",
            "mo-nummer",
            "mo nr",
            "mo-nr",
            "mo number",
            "mo no",
            "mietobjekt nummer",
            "mietobjekt-nr",
            "mietobjekt-nr.",
        ],
    ),
    text(
        "asset_id",
        &[
            "asset id",
            "asset number",
            "property id",
            "property number",
            "objekt id",
            "objektnummer",
            "liegenschaft",
            "liegenschaftsnummer",
            "id immeuble",
            "id immobile",
        ],
    ),
    text(
        "contract_id",
        &[
            "contract id",
            "stammvertrag-id",
            "vertragsnummer",
            "vertrags-nr",
            "vertragsnr",
            "vertrags nr",
            "contract number",
            "contract no.",
            "lease id",
            "numéro de bail",
            "u",
        ],
    ),
    text(
        "tenant_id",
        &[
            "tenant id",
            "tenant number",
            "tenant no",
            "mieter id",
            "mieter-nr",
            "mieternummer",
            "debitor",
            "debitorennummer",
            "id locataire",
            "id inquilino",
        ],
    ),
    text(
        "contractual_partner",
        &[
            "vertragspartner",
            "vrtragspartner",
            "contractual partner",
            "contract partner",
        ],
    ),
    text(
        "tenant_name",
        &[
            "tenant",
            "tenant name",
            "mieter",
            "mietername",
            "locataire",
            "nom du locataire",
            "inquilino",
            "huurder",
            "najemca",
            "hyresgäst",
            "customer",
            "kunde",
            "client",
        ],
    ),
    text(
        "business_unit_code",
        &[
            "kürzel der wirtschaftseinheit",
            "wirtschaftseinheit kürzel",
            "we kürzel",
            "unit code",
            "einheitskürzel",
            "c",
            "we code",
        ],
    ),
    text(
        "business_unit",
        &[
            "wirtschaftseinheit",
            "business unit",
            "wirtschafts einheit",
            "wi einheit",
            "we",
            "we einheit",
        ],
    ),
    text(
        "bookkeeping_area",
        &["bk", "buchungskreis", "booking area", "buchungsbereich"],
    ),
    text(
        "unit_id",
        &[
            "unit id",
            "unit-id",
            "unit number",
            "einheit",
            "einheit nr",
            "unit no",
            "mieteinheit",
            "numéro d'unité",
            "numero unità",
            "eenheidnummer",
        ],
    ),
    // ===== 面积 =====
    value(
        "area_sqft",
        Some(ParseMode::Area),
        &["area sqft", "area (sqft)", "sqft", "sq ft", "square feet", "sf"],
    ),
    value(
        "area_sqm",
        Some(ParseMode::Area),
        &[
            "area sqm",
            "area (sqm)",
            "fläche m²",
            "fläche (m²)",
            "mietfläche",
            "sqm",
            "m²",
            "m2",
            "superficie (m²)",
            "oppervlakte (m²)",
            "powierzchnia (m²)",
        ],
    ),
    // ===== 日期（在租金之前: "rent start date" 归 lease_start）=====
    date(
        "lease_start",
        &[
            "lease start",
            "lease start date",
            "start date",
            "mietbeginn",
            "vertragsbeginn",
            "début du bail",
            "inizio locazione",
            "startdatum",
        ],
    ),
    date(
        "lease_end",
        &[
            "lease end",
            "lease end date",
            "end date",
            "expiry",
            "mietende",
            "vertragsende",
            "laufzeitende",
            "fin du bail",
            "fine locazione",
            "einddatum",
        ],
    ),
    date(
        "break_date",
        &[
            "break date",
            "break option",
            "sonderkündigungsrecht",
            "kündigungsoption",
            "option de résiliation",
        ],
    ),
    // ===== 金额 =====
    value(
        "annual_rent",
        Some(ParseMode::Currency),
        &[
            "annual rent",
            "yearly rent",
            "jahresmiete",
            "loyer annuel",
            "affitto annuale",
            "jaarlijkse huur",
            "roczny czynsz",
        ],
    ),
    value(
        "market_rent",
        Some(ParseMode::Currency),
        &[
            "market rent",
            "erv",
            "estimated rental value",
            "marktmiete",
            "loyer de marché",
            "canone di mercato",
            "markthuur",
        ],
    ),
    value(
        "rent_reduction",
        Some(ParseMode::Currency),
        &[
            "rent reduction",
            "rent free",
            "mietminderung",
            "mietnachlass",
            "réduction de loyer",
        ],
    ),
    value(
        "rent_parking_monthly",
        Some(ParseMode::Currency),
        &[
            "parking rent",
            "parking rent monthly",
            "stellplatzmiete",
            "parkplatzmiete",
            "loyer parking",
        ],
    ),
    value(
        "rent_other_income",
        Some(ParseMode::Currency),
        &[
            "other income",
            "other rent",
            "sonstige erlöse",
            "sonstige einnahmen",
            "autres revenus",
        ],
    ),
    value(
        "service_charge",
        Some(ParseMode::Currency),
        &[
            "service charge",
            "nebenkosten",
            "betriebskosten",
            "nk",
            "charges",
            "oneri accessori",
            "servicekosten",
        ],
    ),
    value(
        "deposit",
        Some(ParseMode::Currency),
        &[
            "deposit",
            "security deposit",
            "kaution",
            "mietsicherheit",
            "dépôt de garantie",
            "deposito cauzionale",
            "waarborgsom",
            "kaucja",
        ],
    ),
    value(
        "monthly_rent",
        Some(ParseMode::Currency),
        &[
            "monthly rent",
            "rent",
            "miete",
            "monatliche miete",
            "monatsmiete",
            "loyer mensuel",
            "affitto mensile",
            "maandelijkse huur",
            "czynsz miesięczny",
            "nkm",
            "nkm ist-miete",
            "netto kaltmiete",
            "cold rent",
        ],
    ),
    // ===== 比率 =====
    value(
        "occupancy_rate",
        Some(ParseMode::Percentage),
        &["occupancy rate", "belegungsquote", "taux d'occupation", "vermietungsquote"],
    ),
    value(
        "escalation_rate",
        Some(ParseMode::Percentage),
        &["escalation rate", "escalation", "rent escalation", "staffelmiete", "steigerung"],
    ),
    value(
        "indexation_rate",
        Some(ParseMode::Percentage),
        &["indexation rate", "indexation", "indexierung", "index rate", "cpi", "vpi"],
    ),
    value(
        "vacancy_rate",
        Some(ParseMode::Percentage),
        &["vacancy rate", "leerstandsquote", "taux de vacance"],
    ),
    // ===== 分类属性 =====
    text("lease_type", &["lease type", "vertragsart", "mietvertragsart", "type de bail"]),
    text(
        "usage_type",
        &["usage type", "nutzungsart", "type d'utilisation", "uso", "nutzung"],
    ),
    text(
        "status",
        &["status", "occupancy", "belegung", "état", "stato", "bezettingsstatus"],
    ),
    text(
        "currency",
        &["currency", "währung", "devise", "valuta", "moneda", "waluta"],
    ),
    value(
        "parking_spaces",
        None,
        &[
            "parking",
            "parking spaces",
            "parkplätze",
            "stellplätze",
            "places de parking",
            "posti auto",
            "parkeerplaatsen",
        ],
    ),
];

// ==========================================
// FieldSpec - 单个规范字段
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub tag: String,
    pub class: FieldClass,
    pub hint: Option<ParseMode>,
    /// 已规范化、去重的别名
    pub aliases: Vec<String>,
}

impl FieldSpec {
    fn push_alias(&mut self, raw: &str) {
        let alias = normalize_header(raw);
        if !alias.is_empty() && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
    }
}

// ==========================================
// SynonymTable
// ==========================================
#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: Vec<FieldSpec>,
    /// 规范化别名 → entries 下标（先声明者优先）
    exact: HashMap<String, usize>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::defaults()
    }
}

impl SynonymTable {
    /// 内置目录
    pub fn defaults() -> Self {
        let entries = BUILTIN_FIELDS
            .iter()
            .map(|field| {
                let mut spec = FieldSpec {
                    tag: field.tag.to_string(),
                    class: field.class,
                    hint: field.hint,
                    aliases: Vec::with_capacity(field.aliases.len()),
                };
                for alias in field.aliases {
                    spec.push_alias(alias);
                }
                spec
            })
            .collect();

        let mut table = Self {
            entries,
            exact: HashMap::new(),
        };
        table.rebuild_index();
        table
    }

    /// 内置目录 + 覆盖文件（追加别名，不替换）
    ///
    /// 文件无法读取或不是合法 JSON 对象时返回 SynonymFileError
    pub fn from_override_file(path: &Path) -> ImportResult<Self> {
        let to_error = |message: String| ImportError::SynonymFileError {
            path: path.display().to_string(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| to_error(e.to_string()))?;
        let document: Value = serde_json::from_str(&content).map_err(|e| to_error(e.to_string()))?;

        let mut table = Self::defaults();
        table
            .merge_json(&document)
            .map_err(|e| to_error(e.to_string()))?;
        Ok(table)
    }

    /// 合并覆盖文档 `{ "<tag>": ["alias", ...] }`
    ///
    /// - 以 `_` 开头的键为元数据，忽略
    /// - 已知字段：追加别名
    /// - 新字段：按键名排序追加在内置字段之后（Value 类别，无解析提示）
    pub fn merge_json(&mut self, document: &Value) -> ImportResult<()> {
        let object = document.as_object().ok_or_else(|| ImportError::ConfigValueError {
            key: "synonyms".to_string(),
            value: document.to_string(),
            message: "同义词覆盖文档必须是 JSON 对象".to_string(),
        })?;

        // serde_json::Map 默认按键排序，这里显式用 BTreeMap 固定顺序
        let ordered: BTreeMap<&String, &Value> = object.iter().collect();

        for (tag, aliases) in ordered {
            if tag.starts_with('_') {
                continue;
            }

            let aliases = aliases.as_array().ok_or_else(|| ImportError::ConfigValueError {
                key: tag.clone(),
                value: aliases.to_string(),
                message: "别名列表必须是字符串数组".to_string(),
            })?;

            let index = match self.entries.iter().position(|e| &e.tag == tag) {
                Some(index) => index,
                None => {
                    self.entries.push(FieldSpec {
                        tag: tag.clone(),
                        class: FieldClass::Value,
                        hint: None,
                        aliases: Vec::new(),
                    });
                    self.entries.len() - 1
                }
            };

            for alias in aliases.iter().filter_map(Value::as_str) {
                self.entries[index].push_alias(alias);
            }
        }

        self.rebuild_index();
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.exact.clear();
        for (index, entry) in self.entries.iter().enumerate() {
            for alias in &entry.aliases {
                self.exact.entry(alias.clone()).or_insert(index);
            }
        }
    }

    /// 按优先级排列的字段
    pub fn entries(&self) -> &[FieldSpec] {
        &self.entries
    }

    pub fn field(&self, tag: &str) -> Option<&FieldSpec> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    /// 精确匹配（参数须已规范化）
    pub fn exact_match(&self, normalized: &str) -> Option<&str> {
        self.exact
            .get(normalized)
            .map(|&index| self.entries[index].tag.as_str())
    }

    /// 子串匹配：仅长度 > 3 的别名参与，按字段优先级取第一个
    pub fn substring_match(&self, normalized: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .aliases
                    .iter()
                    .any(|alias| alias.chars().count() > 3 && normalized.contains(alias.as_str()))
            })
            .map(|entry| entry.tag.as_str())
    }

    /// 未知字段按数值类处理
    pub fn field_class(&self, tag: &str) -> FieldClass {
        self.field(tag).map(|e| e.class).unwrap_or(FieldClass::Value)
    }

    pub fn field_type_hint(&self, tag: &str) -> Option<ParseMode> {
        self.field(tag).and_then(|e| e.hint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Monthly   Rent (EUR) "), "monthly rent eur");
        assert_eq!(normalize_header("Fläche (m²)"), "fläche m²");
        assert_eq!(normalize_header("MO/BK/Wirtschaftseinheit/MO-Nr"), "mo bk wirtschaftseinheit mo nr");
        assert_eq!(normalize_header("---"), "");
    }

    #[test]
    fn test_priority_order_specific_before_generic() {
        let table = SynonymTable::defaults();
        let position = |tag: &str| table.entries().iter().position(|e| e.tag == tag).unwrap();

        assert!(position("annual_rent") < position("monthly_rent"));
        assert!(position("occupancy_rate") < position("status"));
        assert!(position("rent_parking_monthly") < position("parking_spaces"));
        assert!(position("tenant_id") < position("tenant_name"));
    }

    #[test]
    fn test_exact_and_substring_lookup() {
        let table = SynonymTable::defaults();
        assert_eq!(table.exact_match("mieter"), Some("tenant_name"));
        assert_eq!(table.exact_match("bk"), Some("bookkeeping_area"));
        assert_eq!(table.substring_match("annual rent eur"), Some("annual_rent"));
        // 短别名不参与子串匹配
        assert_eq!(table.substring_match("bkx total"), None);
    }

    #[test]
    fn test_field_classes_and_hints() {
        let table = SynonymTable::defaults();
        assert_eq!(table.field_class("tenant_name"), FieldClass::Text);
        assert_eq!(table.field_class("lease_end"), FieldClass::Date);
        assert_eq!(table.field_class("monthly_rent"), FieldClass::Value);
        assert_eq!(table.field_type_hint("monthly_rent"), Some(ParseMode::Currency));
        assert_eq!(table.field_type_hint("area_sqft"), Some(ParseMode::Area));
        assert_eq!(table.field_type_hint("vacancy_rate"), Some(ParseMode::Percentage));
        assert_eq!(table.field_type_hint("tenant_name"), None);
    }

    #[test]
    fn test_merge_appends_aliases_and_new_tags() {
        let mut table = SynonymTable::defaults();
        let builtin_len = table.len();

        table
            .merge_json(&json!({
                "_comment": "custom aliases",
                "tenant_name": ["Firma"],
                "zeta_field": ["Zeta Spalte"],
                "alpha_field": ["Alpha Spalte"]
            }))
            .unwrap();

        assert_eq!(table.exact_match("firma"), Some("tenant_name"));
        assert_eq!(table.exact_match("mieter"), Some("tenant_name"));
        assert_eq!(table.len(), builtin_len + 2);
        assert_eq!(table.entries()[builtin_len].tag, "alpha_field");
        assert_eq!(table.entries()[builtin_len + 1].tag, "zeta_field");
        assert!(table.field("_comment").is_none());
    }

    #[test]
    fn test_merge_rejects_non_array_aliases() {
        let mut table = SynonymTable::defaults();
        let result = table.merge_json(&json!({ "tenant_name": "Firma" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_override_file_loading() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "unit_id": ["Objekt-Ref"] }}"#).unwrap();

        let table = SynonymTable::from_override_file(file.path()).unwrap();
        assert_eq!(table.exact_match("objekt ref"), Some("unit_id"));
    }

    #[test]
    fn test_override_file_errors_are_construction_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let err = SynonymTable::from_override_file(file.path()).unwrap_err();
        assert!(matches!(err, ImportError::SynonymFileError { .. }));

        let missing = SynonymTable::from_override_file(Path::new("/nonexistent/synonyms.json"));
        assert!(matches!(missing, Err(ImportError::SynonymFileError { .. })));
    }
}
