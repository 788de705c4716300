// ==========================================
// 租赁清单抽取引擎 - 抽取配置
// ==========================================
// 加载顺序（后者覆盖前者）:
//   内置默认值 → JSON 配置文件 → 环境变量
// 配置文件: 显式路径；否则 <config_dir>/rent-roll/config.json（存在时）
// ==========================================

use crate::importer::data_validator::DEFAULT_MAGNITUDE_THRESHOLD;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::synonyms::SynonymTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 同义词覆盖文件路径
    pub const SYNONYMS_FILE: &str = "RENT_ROLL_SYNONYMS";
    // 消息语言
    pub const LOCALE: &str = "RENT_ROLL_LOCALE";
    // 只处理最佳工作表
    pub const SINGLE_SHEET: &str = "RENT_ROLL_SINGLE_SHEET";
}

const CONFIG_DIR_NAME: &str = "rent-roll";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// true: 处理全部数据表；false: 只处理得分最高的一张
    pub process_all_sheets: bool,
    /// 表头扫描行数（工作表选择与表头识别共用）
    pub header_scan_rows: usize,
    /// 表头行最少识别列数
    pub min_header_matches: usize,
    /// 租金/面积量级告警阈值
    pub magnitude_threshold: f64,
    /// 同义词覆盖文件（JSON）
    pub synonyms_file: Option<PathBuf>,
    pub locale: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            process_all_sheets: true,
            header_scan_rows: 30,
            min_header_matches: 2,
            magnitude_threshold: DEFAULT_MAGNITUDE_THRESHOLD,
            synonyms_file: None,
            locale: "en".to_string(),
        }
    }
}

impl ExtractorConfig {
    /// 默认配置文件位置
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// 加载配置文件（不含环境变量覆写）
    ///
    /// # 参数
    /// - path: 显式路径（必须存在）；None 时尝试默认位置，不存在则用默认值
    pub fn load(path: Option<&Path>) -> ImportResult<Self> {
        let resolved = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_config_path().filter(|p| p.exists()),
        };

        let Some(path) = resolved else {
            debug!("未找到配置文件，使用默认配置");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|e| ImportError::ConfigReadError {
            key: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json_str(&content)?;

        info!(path = %path.display(), "配置文件加载完成");
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> ImportResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// 从进程环境变量覆写
    pub fn apply_env_overrides(&mut self) -> ImportResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// 按 lookup 覆写（测试可注入）
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ImportResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(config_keys::SYNONYMS_FILE).filter(|v| !v.trim().is_empty()) {
            self.synonyms_file = Some(PathBuf::from(path.trim()));
        }

        if let Some(locale) = lookup(config_keys::LOCALE).filter(|v| !v.trim().is_empty()) {
            self.locale = locale.trim().to_string();
        }

        if let Some(raw) = lookup(config_keys::SINGLE_SHEET) {
            let single = parse_flag(config_keys::SINGLE_SHEET, &raw)?;
            self.process_all_sheets = !single;
        }

        Ok(())
    }

    /// 构建同义词表：内置默认 + 可选覆盖文件
    pub fn build_synonym_table(&self) -> ImportResult<Arc<SynonymTable>> {
        let table = match &self.synonyms_file {
            Some(path) => SynonymTable::from_override_file(path)?,
            None => SynonymTable::defaults(),
        };
        Ok(Arc::new(table))
    }
}

fn parse_flag(key: &str, raw: &str) -> ImportResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "y" | "yes" | "true" => Ok(true),
        "0" | "n" | "no" | "false" => Ok(false),
        _ => Err(ImportError::ConfigValueError {
            key: key.to_string(),
            value: raw.to_string(),
            message: "期望布尔值 (1/0, y/n, yes/no, true/false)".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::default();
        assert!(config.process_all_sheets);
        assert_eq!(config.header_scan_rows, 30);
        assert_eq!(config.min_header_matches, 2);
        assert_eq!(config.magnitude_threshold, 1e9);
        assert_eq!(config.locale, "en");
        assert!(config.synonyms_file.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ExtractorConfig::from_json_str(r#"{"min_header_matches": 3}"#).unwrap();
        assert_eq!(config.min_header_matches, 3);
        assert_eq!(config.header_scan_rows, 30);
        assert!(config.process_all_sheets);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let result = ExtractorConfig::from_json_str("{not json");
        assert!(matches!(result, Err(ImportError::ConfigReadError { .. })));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"locale": "de", "process_all_sheets": false}}"#).unwrap();

        let config = ExtractorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.locale, "de");
        assert!(!config.process_all_sheets);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = ExtractorConfig::load(Some(Path::new("/nonexistent/rent-roll.json")));
        assert!(matches!(result, Err(ImportError::ConfigReadError { .. })));
    }

    #[test]
    fn test_overrides() {
        let mut config = ExtractorConfig::default();
        config
            .apply_overrides(lookup(&[
                (config_keys::SYNONYMS_FILE, "/etc/rr/synonyms.json"),
                (config_keys::LOCALE, " de "),
                (config_keys::SINGLE_SHEET, "yes"),
            ]))
            .unwrap();

        assert_eq!(config.synonyms_file, Some(PathBuf::from("/etc/rr/synonyms.json")));
        assert_eq!(config.locale, "de");
        assert!(!config.process_all_sheets);

        config
            .apply_overrides(lookup(&[(config_keys::SINGLE_SHEET, "0")]))
            .unwrap();
        assert!(config.process_all_sheets);
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let mut config = ExtractorConfig::default();
        let result = config.apply_overrides(lookup(&[(config_keys::SINGLE_SHEET, "maybe")]));
        assert!(matches!(
            result,
            Err(ImportError::ConfigValueError { key, .. }) if key == config_keys::SINGLE_SHEET
        ));
    }

    #[test]
    fn test_build_synonym_table_with_override() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"tenant_name": ["Firma"]}}"#).unwrap();

        let config = ExtractorConfig {
            synonyms_file: Some(file.path().to_path_buf()),
            ..ExtractorConfig::default()
        };
        let table = config.build_synonym_table().unwrap();
        assert_eq!(table.exact_match("firma"), Some("tenant_name"));
    }

    #[test]
    fn test_build_synonym_table_missing_file() {
        let config = ExtractorConfig {
            synonyms_file: Some(PathBuf::from("/nonexistent/synonyms.json")),
            ..ExtractorConfig::default()
        };
        assert!(matches!(
            config.build_synonym_table(),
            Err(ImportError::SynonymFileError { .. })
        ));
    }
}
