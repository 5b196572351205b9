use std::path::PathBuf;

#[derive(Debug)]
/// Represents failures while reading or writing files.
pub enum LoadError {
    /// The file could not be opened, read or written.
    Io {
        /// The path involved.
        path:   PathBuf,
        /// The underlying cause.
        source: std::io::Error,
    },
    /// The configuration file is not valid YAML for the expected schema.
    Yaml {
        /// The path involved.
        path:   PathBuf,
        /// The underlying cause.
        source: serde_yaml::Error,
    },
    /// A record could not be serialized.
    Json {
        /// The underlying cause.
        source: serde_json::Error,
    },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Yaml { path, source } => {
                write!(f, "Invalid configuration in {}: {source}", path.display())
            },
            Self::Json { source } => write!(f, "Failed to serialize record: {source}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Yaml { source, .. } => Some(source),
            Self::Json { source } => Some(source),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source }
    }
}
