//! 配置校验模块
//!
//! 校验规则 (失败则拒绝整个文件)：
//! - source label 唯一且非空
//! - max_entries > 0
//! - rawlog_prefix 去除非法字符后非空
//!
//! 单个数据源的问题 (采样率、driver 缺失) 只生成诊断信息，
//! 由对应 worker 在启动时作为配置错误处理，不影响其它数据源。

use std::collections::HashSet;

use contracts::{AcquisitionConfig, ContractError, GLOBAL_SECTION_NAME};

/// 校验 AcquisitionConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AcquisitionConfig) -> Result<(), ContractError> {
    validate_labels(config)?;
    validate_global(config)?;
    Ok(())
}

/// 单个数据源的诊断信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDiagnostic {
    /// 数据源 label
    pub label: String,
    /// 诊断内容
    pub message: String,
}

/// 收集不会导致整体失败的数据源问题
pub fn diagnose(config: &AcquisitionConfig) -> Vec<SourceDiagnostic> {
    let mut diagnostics = Vec::new();

    for source in &config.sources {
        if source.ignore {
            diagnostics.push(SourceDiagnostic {
                label: source.label.clone(),
                message: "section is marked grabber_ignore and will not be launched".into(),
            });
            continue;
        }
        if let Err(e) = source.check() {
            diagnostics.push(SourceDiagnostic {
                label: source.label.clone(),
                message: e.to_string(),
            });
        }
    }

    if config.active_sources().next().is_none() {
        diagnostics.push(SourceDiagnostic {
            label: GLOBAL_SECTION_NAME.into(),
            message: "no launchable source sections".into(),
        });
    }

    diagnostics
}

/// 校验 label 唯一性
fn validate_labels(config: &AcquisitionConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, source) in config.sources.iter().enumerate() {
        if source.label.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sources[{idx}].label"),
                "section name cannot be empty",
            ));
        }
        if !seen.insert(source.label.as_str()) {
            return Err(ContractError::config_validation(
                format!("sources[label={}]", source.label),
                "duplicate source label",
            ));
        }
    }
    Ok(())
}

/// 校验全局设置
fn validate_global(config: &AcquisitionConfig) -> Result<(), ContractError> {
    let global = &config.global;

    if global.max_entries == 0 {
        return Err(ContractError::config_validation(
            "global.max_entries",
            "max_entries must be > 0",
        ));
    }

    if !global
        .rawlog_prefix
        .chars()
        .any(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ContractError::config_validation(
            "global.rawlog_prefix",
            format!(
                "rawlog_prefix '{}' has no usable file name characters",
                global.rawlog_prefix
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GlobalSettings, SourceConfig};

    fn minimal_config() -> AcquisitionConfig {
        AcquisitionConfig {
            global: GlobalSettings::default(),
            sources: vec![
                SourceConfig::new("cam", "mock", 20.0),
                SourceConfig::new("imu", "mock", 100.0),
            ],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
        assert!(diagnose(&minimal_config()).is_empty());
    }

    #[test]
    fn test_duplicate_label() {
        let mut config = minimal_config();
        config.sources.push(SourceConfig::new("cam", "mock", 5.0));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_zero_max_entries() {
        let mut config = minimal_config();
        config.global.max_entries = 0;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { ref field, .. } if field == "global.max_entries"));
    }

    #[test]
    fn test_bad_prefix() {
        let mut config = minimal_config();
        config.global.rawlog_prefix = "///".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_rate_is_only_a_diagnostic() {
        let mut config = minimal_config();
        config.sources[1].poll_rate_hz = 0.0;
        assert!(validate(&config).is_ok());

        let diagnostics = diagnose(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].label, "imu");
        assert!(diagnostics[0].message.contains("process_rate"));
    }

    #[test]
    fn test_all_ignored_is_reported() {
        let mut config = minimal_config();
        for source in &mut config.sources {
            source.ignore = true;
        }
        let diagnostics = diagnose(&config);
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("no launchable")));
    }
}
