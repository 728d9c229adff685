//! Engine output parsing

use crate::container::ContainerDetails;
use crate::error::{EngineError, Result};

/// Remove every whitespace and control character
pub fn sanitize_string(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect()
}

/// Output split into lines, with CRLF treated as LF
pub fn lines(output: &str) -> Vec<&str> {
    output.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line)).collect()
}

/// First line of the output, CRLF-normalised
pub fn first_line(output: &str) -> String {
    lines(output).first().copied().unwrap_or_default().to_string()
}

/// Output with one trailing line ending removed
pub fn trim_line(output: &str) -> &str {
    output
        .strip_suffix("\r\n")
        .or_else(|| output.strip_suffix('\n'))
        .unwrap_or(output)
}

/// Exit code printed by `wait`
pub fn parse_exit_code(output: &str) -> Result<i64> {
    let value = trim_line(output).trim();
    value
        .parse::<i64>()
        .map_err(|e| EngineError::Parse(format!("invalid exit code '{}': {}", value, e)))
}

/// Host port from `port` output such as `0.0.0.0:32768`
pub fn parse_host_port(output: &str) -> Result<String> {
    let line = lines(output)
        .into_iter()
        .map(sanitize_string)
        .find(|line| !line.is_empty())
        .ok_or_else(|| EngineError::Parse("no port mapping in output".to_string()))?;

    match line.rsplit_once(':') {
        Some((_, port)) if !port.is_empty() => Ok(port.to_string()),
        _ => Err(EngineError::Parse(format!("invalid port mapping '{}'", line))),
    }
}

/// Details from `inspect` JSON, either an object or a one-element array
pub fn parse_container_details(output: &[u8]) -> Result<ContainerDetails> {
    let value: serde_json::Value = serde_json::from_slice(output)?;
    let value = match value {
        serde_json::Value::Array(mut items) => {
            if items.is_empty() {
                return Err(EngineError::Parse("inspect returned no containers".to_string()));
            }
            items.swap_remove(0)
        }
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

/// Version string with surrounding whitespace and quotes removed
pub fn clean_version(output: &str) -> String {
    output.trim().trim_matches(|c| c == '\'' || c == '"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_all_whitespace() {
        assert_eq!(sanitize_string(" a\tb\nc "), "abc");
        assert_eq!(sanitize_string("sha256:1b2c\r\n"), "sha256:1b2c");
        assert_eq!(sanitize_string("\u{7}id"), "id");
    }

    #[test]
    fn test_first_line_normalises_crlf() {
        assert_eq!(first_line("4f66ad9a\r\nwarning\r\n"), "4f66ad9a");
        assert_eq!(first_line("4f66ad9a\n"), "4f66ad9a");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_trim_line() {
        assert_eq!(trim_line("9.4.0.0\n"), "9.4.0.0");
        assert_eq!(trim_line("9.4.0.0\r\n"), "9.4.0.0");
        assert_eq!(trim_line("a\n\n"), "a\n");
    }

    #[test]
    fn test_parse_exit_code() {
        assert_eq!(parse_exit_code("0\n").unwrap(), 0);
        assert_eq!(parse_exit_code("137\r\n").unwrap(), 137);
        assert!(matches!(parse_exit_code("exited\n"), Err(EngineError::Parse(_))));
        assert!(parse_exit_code("").is_err());
    }

    #[test]
    fn test_parse_host_port() {
        assert_eq!(parse_host_port("0.0.0.0:32768\n").unwrap(), "32768");
        assert_eq!(parse_host_port("\n0.0.0.0:32768\n[::]:32768\n").unwrap(), "32768");
        assert_eq!(parse_host_port("[::]:40001").unwrap(), "40001");
        assert!(parse_host_port("").is_err());
        assert!(parse_host_port("32768").is_err());
    }

    #[test]
    fn test_parse_container_details_array_or_object() {
        let array = br#"[{"Id": "abc", "Name": "qm", "Args": ["-i"]}]"#;
        let details = parse_container_details(array).unwrap();
        assert_eq!(details.id, "abc");
        assert_eq!(details.args, vec!["-i"]);

        let object = br#"{"Id": "def", "Name": "qm2"}"#;
        assert_eq!(parse_container_details(object).unwrap().name, "qm2");

        assert!(matches!(parse_container_details(b"[]"), Err(EngineError::Parse(_))));
        assert!(matches!(parse_container_details(b"not json"), Err(EngineError::Json(_))));
    }

    #[test]
    fn test_clean_version() {
        assert_eq!(clean_version("'24.0.7'\n"), "24.0.7");
        assert_eq!(clean_version("4.9.3\n"), "4.9.3");
    }
}
