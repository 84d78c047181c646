//! 配置校验模块
//!
//! 校验规则：
//! - name / subject 非空
//! - output_template 可解析 (含时间戳格式与 UTC 偏移)
//! - max_buffered_lines > 0
//! - delivery.port > 0

use contracts::{TranscriptConfig, TranscriptError};
use formatter::Formatter;

/// 校验 TranscriptConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &TranscriptConfig) -> Result<(), TranscriptError> {
    validate_names(config)?;
    validate_template(config)?;
    validate_buffer(config)?;
    validate_delivery(config)?;
    Ok(())
}

/// 校验名称与主题
fn validate_names(config: &TranscriptConfig) -> Result<(), TranscriptError> {
    if config.name.trim().is_empty() {
        return Err(TranscriptError::configuration(
            "name",
            "sink name cannot be empty",
        ));
    }
    if config.subject.trim().is_empty() {
        return Err(TranscriptError::configuration(
            "subject",
            "subject cannot be empty",
        ));
    }
    Ok(())
}

/// 校验输出模板
fn validate_template(config: &TranscriptConfig) -> Result<(), TranscriptError> {
    Formatter::new(&config.output_template, config.format_provider.clone()).map(|_| ())
}

/// 校验缓冲上限
fn validate_buffer(config: &TranscriptConfig) -> Result<(), TranscriptError> {
    if config.max_buffered_lines == Some(0) {
        return Err(TranscriptError::configuration(
            "max_buffered_lines",
            "max_buffered_lines must be > 0",
        ));
    }
    Ok(())
}

/// 校验投递端点
fn validate_delivery(config: &TranscriptConfig) -> Result<(), TranscriptError> {
    if config.delivery.port == 0 {
        return Err(TranscriptError::configuration(
            "delivery.port",
            "port must be > 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&TranscriptConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_name() {
        let config = TranscriptConfig {
            name: "  ".into(),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_empty_subject() {
        let config = TranscriptConfig {
            subject: String::new(),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("subject"), "got: {err}");
    }

    #[test]
    fn test_malformed_template() {
        let config = TranscriptConfig {
            output_template: "{Timestamp:yyyy".into(),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("output_template"), "got: {err}");
    }

    #[test]
    fn test_zero_buffer_bound() {
        let config = TranscriptConfig {
            max_buffered_lines: Some(0),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_buffered_lines"), "got: {err}");
    }

    #[test]
    fn test_zero_port() {
        let mut config = TranscriptConfig::default();
        config.delivery.port = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("port must be > 0"), "got: {err}");
    }
}
