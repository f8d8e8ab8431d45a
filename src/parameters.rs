use crate::error::{ErrorCode, ScanError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;
pub const DEFAULT_REPORT_ROWS_PER_PAGE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParameters {
    /// Worker threads; `None` uses the available parallelism.
    pub threads: Option<usize>,
    pub worker_stack_size: usize,
    /// Abort a multi-file scan on the first failing file.
    pub atomic: bool,
    pub report_rows_per_page: usize,
}

impl Default for ScanParameters {
    fn default() -> Self {
        Self {
            threads: None,
            worker_stack_size: DEFAULT_WORKER_STACK_SIZE,
            atomic: false,
            report_rows_per_page: DEFAULT_REPORT_ROWS_PER_PAGE,
        }
    }
}

impl ScanParameters {
    pub fn load_from_path(path: &str) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path).map_err(|e| ScanError {
            code: ErrorCode::Io,
            message: format!("Could not read config file '{path}': {e}"),
        })?;
        let ret: Self = serde_json::from_str(&text).map_err(|e| ScanError {
            code: ErrorCode::InvalidInput,
            message: format!("Could not parse config JSON '{path}': {e}"),
        })?;
        ret.validate()?;
        Ok(ret)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.threads == Some(0) {
            return Err(ScanError::invalid_input("threads must be at least 1"));
        }
        if self.report_rows_per_page == 0 {
            return Err(ScanError::invalid_input(
                "report_rows_per_page must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_fields_use_defaults() {
        let params: ScanParameters = serde_json::from_str(r#"{"threads": 2}"#).unwrap();
        assert_eq!(params.threads, Some(2));
        assert_eq!(params.worker_stack_size, DEFAULT_WORKER_STACK_SIZE);
        assert!(!params.atomic);
        assert_eq!(params.report_rows_per_page, DEFAULT_REPORT_ROWS_PER_PAGE);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"atomic": true, "report_rows_per_page": 10}}"#).unwrap();
        let params = ScanParameters::load_from_path(file.path().to_str().unwrap()).unwrap();
        assert!(params.atomic);
        assert_eq!(params.report_rows_per_page, 10);
        assert_eq!(params.threads, None);
    }

    #[test]
    fn test_load_rejects_bad_json_and_zero_threads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = ScanParameters::load_from_path(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"threads": 0}}"#).unwrap();
        let err = ScanParameters::load_from_path(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScanParameters::load_from_path("/nonexistent/motifscan.json").unwrap_err();
        assert_eq!(err.code, ErrorCode::Io);
    }
}
