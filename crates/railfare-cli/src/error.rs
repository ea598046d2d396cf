use thiserror::Error;

use railfare_core::CoreError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] railfare_core::ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Core(CoreError::Validation(_) | CoreError::EmptyRouteList) => 2,
            Self::Core(
                CoreError::Serialization(_)
                | CoreError::Csv(_)
                | CoreError::Workbook(_)
                | CoreError::Spreadsheet(_),
            ) => 4,
            Self::Core(CoreError::Io(_)) => 10,
            Self::Serialization(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railfare_core::ValidationError;

    #[test]
    fn configuration_problems_exit_with_two() {
        assert_eq!(CliError::from(ValidationError::ZeroConcurrency).exit_code(), 2);
        assert_eq!(CliError::from(CoreError::EmptyRouteList).exit_code(), 2);
    }

    #[test]
    fn spreadsheet_failures_exit_with_four() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let error = workbook
            .add_worksheet()
            .set_name("")
            .map(|_| ())
            .expect_err("blank sheet name");
        assert_eq!(CliError::from(CoreError::from(error)).exit_code(), 4);

        let Err(error) = calamine::open_workbook_auto("missing-parameters.xlsx") else {
            panic!("missing workbook must not open");
        };
        assert_eq!(CliError::from(CoreError::from(error)).exit_code(), 4);
    }

    #[test]
    fn io_failures_exit_with_ten() {
        let error = CoreError::from(std::io::Error::other("disk full"));
        assert_eq!(CliError::from(error).exit_code(), 10);
    }
}
