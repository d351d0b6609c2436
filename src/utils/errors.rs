#![forbid(unsafe_code)]

use thiserror::Error;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("wiki_server input parameters:\n{}", .0)]
    InputParms(String),

    /// Inaccessible logger configuration file.
    #[error("Unable to access the Log4rs configuration file: {}", .0)]
    Log4rsInitialization(String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    /// Template loading or rendering failures.
    #[error("Template error: {}", .0)]
    TemplateError(#[from] tera::Error),

    /// A page could not be written to the data directory.
    #[error("Unable to save page '{title}': {source}")]
    PageSave {
        title: String,
        #[source]
        source: std::io::Error,
    },

    /// The title cannot be mapped to a file in the data directory.
    #[error("Invalid page title: '{}'", .0)]
    InvalidTitle(String),

    #[error("Wiki Error: {}", .0)]
    WikiError(String),
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::Errors;

    #[test]
    fn page_save_names_title() {
        let e = Errors::PageSave {
            title: "my page".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(e.to_string(), "Unable to save page 'my page': denied");
    }

    #[test]
    fn invalid_title_message() {
        let e = Errors::InvalidTitle("../etc".to_string());
        assert!(e.to_string().contains("../etc"));
    }
}
