//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。
//! 顶层每个 table 是一个 section，`global` 为保留名，其余按文件顺序成为数据源。

use contracts::{
    AcquisitionConfig, ContractError, GlobalSettings, SourceConfig, GLOBAL_SECTION_NAME,
};
use serde_json::{Map, Value};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Section 名 -> 原始内容 (保持文件顺序)
pub type RawSections = Map<String, Value>;

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<AcquisitionConfig, ContractError> {
    let sections: RawSections = toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })?;
    from_sections(sections)
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<AcquisitionConfig, ContractError> {
    let sections: RawSections =
        serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("JSON parse error: {e}"),
            source: Some(Box::new(e)),
        })?;
    from_sections(sections)
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<AcquisitionConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// 将 section 表转换为 `AcquisitionConfig`
fn from_sections(sections: RawSections) -> Result<AcquisitionConfig, ContractError> {
    let mut config = AcquisitionConfig::default();

    for (name, body) in sections {
        if !body.is_object() {
            return Err(ContractError::config_parse(format!(
                "section '{name}' must be a table"
            )));
        }

        if name == GLOBAL_SECTION_NAME {
            config.global =
                serde_json::from_value::<GlobalSettings>(body).map_err(|e| {
                    ContractError::ConfigParse {
                        message: format!("invalid [{name}] section: {e}"),
                        source: Some(Box::new(e)),
                    }
                })?;
            continue;
        }

        let mut source = serde_json::from_value::<SourceConfig>(body).map_err(|e| {
            ContractError::ConfigParse {
                message: format!("invalid [{name}] section: {e}"),
                source: Some(Box::new(e)),
            }
        })?;
        source.label = name;
        config.sources.push(source);
    }

    Ok(config)
}

/// 将 `AcquisitionConfig` 还原为 section 表
pub fn to_sections(config: &AcquisitionConfig) -> Result<RawSections, ContractError> {
    let mut sections = RawSections::new();

    let global = serde_json::to_value(&config.global)
        .map_err(|e| ContractError::config_parse(format!("serialize [global] error: {e}")))?;
    sections.insert(GLOBAL_SECTION_NAME.to_string(), global);

    for source in &config.sources {
        let body = serde_json::to_value(source).map_err(|e| {
            ContractError::config_parse(format!("serialize [{}] error: {e}", source.label))
        })?;
        sections.insert(source.label.clone(), body);
    }

    Ok(sections)
}
