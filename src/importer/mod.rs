// ==========================================
// 租赁清单抽取引擎 - 导入层
// ==========================================
// 职责: 工作簿 → 规范化租赁记录
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_extractor;
pub mod data_validator;
pub mod document_reader;
pub mod error;
pub mod file_parser;
pub mod header_detector;
pub mod header_mapper;
pub mod identity_resolver;
pub mod importer_trait;
pub mod number_parser;
pub mod rent_roll_importer;
pub mod sheet_selector;
pub mod synonyms;

// 重导出核心类型
pub use data_extractor::DataExtractor;
pub use data_validator::{DataValidator, ValidationSummary};
pub use document_reader::DocumentReader;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use header_detector::{HeaderDetector, HeaderRow};
pub use header_mapper::HeaderMapper;
pub use identity_resolver::{HeuristicPhoneClassifier, IdentityResolver, PhoneNumberClassifier};
pub use number_parser::NumberUnitParser;
pub use rent_roll_importer::RentRollImporterImpl;
pub use sheet_selector::SheetSelector;
pub use synonyms::{FieldSpec, SynonymTable};

// 重导出 Trait 接口
pub use importer_trait::RentRollImporter;
