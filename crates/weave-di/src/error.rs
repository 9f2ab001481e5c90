//! Error types for container operations

use thiserror::Error;

/// Errors that can occur during dependency injection operations
#[derive(Debug, Error)]
pub enum DIError {
    #[error("{}", invalid_argument_message(.parameter, .declaring_type, .type_name, .chain))]
    InvalidArgument {
        parameter: String,
        declaring_type: String,
        type_name: Option<String>,
        chain: Vec<String>,
    },

    #[error("{}", not_found_message(.type_name, .suggestions))]
    DependencyNotFound {
        type_name: String,
        suggestions: Vec<String>,
    },

    #[error("Circular dependency detected: {}", join_chain(.chain))]
    CircularDependency { chain: Vec<String> },

    #[error("Service '{id}' is frozen and cannot be overridden; remove it before setting a new value")]
    FrozenInstanceOverride { id: String },

    #[error("Service '{id}' is frozen and cannot be extended; extend it before the first read")]
    FrozenInstanceExtend { id: String },

    #[error("Service '{id}' is protected and cannot be extended")]
    InstanceProtected { id: String },

    #[error("Service '{id}' is not extendable: only closures, objects, arrays and maps can be extended")]
    InstanceNotExtendable { id: String },

    #[error("Invalid service type: {message}")]
    InvalidServiceType { message: String },

    #[error("Service already registered: {service_type}")]
    ServiceAlreadyRegistered { service_type: String },

    #[error("Failed to construct '{type_name}': {message}")]
    ConstructionFailed { type_name: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DIResult<T> = Result<T, DIError>;

impl DIError {
    /// Shorthand for a constructor reporting its own failure.
    pub fn construction(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        DIError::ConstructionFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// The resolution chain attached to the error, if any.
    pub fn chain(&self) -> &[String] {
        match self {
            DIError::InvalidArgument { chain, .. } | DIError::CircularDependency { chain } => chain,
            _ => &[],
        }
    }
}

fn join_chain(chain: &[String]) -> String {
    chain.join(" -> ")
}

fn format_chain(chain: &[String]) -> String {
    if chain.is_empty() {
        String::new()
    } else {
        format!(" (resolution chain: {})", join_chain(chain))
    }
}

fn invalid_argument_message(
    parameter: &str,
    declaring_type: &str,
    type_name: &Option<String>,
    chain: &[String],
) -> String {
    match type_name {
        None => format!(
            "No type declared for parameter '{}' of '{}'{}",
            parameter,
            declaring_type,
            format_chain(chain)
        ),
        Some(type_name) => format!(
            "Unable to resolve parameter '{}' of builtin type '{}' in '{}'{}: builtin types need a default value",
            parameter,
            type_name,
            declaring_type,
            format_chain(chain)
        ),
    }
}

fn not_found_message(type_name: &str, suggestions: &[String]) -> String {
    let mut message = format!(
        "No concrete type was found for '{}'; is a binding missing?",
        type_name
    );
    if !suggestions.is_empty() {
        message.push_str(&format!(" Did you mean: {}?", suggestions.join(", ")));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message_lists_cycle() {
        let err = DIError::CircularDependency {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
    }

    #[test]
    fn test_not_found_message_includes_suggestions() {
        let err = DIError::DependencyNotFound {
            type_name: "PersonInterface".into(),
            suggestions: vec!["PersonInterfce".into()],
        };
        assert!(err.to_string().contains("Did you mean: PersonInterfce?"));
    }

    #[test]
    fn test_invalid_argument_message_names_parameter_and_chain() {
        let err = DIError::InvalidArgument {
            parameter: "name".into(),
            declaring_type: "Person".into(),
            type_name: Some("string".into()),
            chain: vec!["Team".into(), "Person".into()],
        };
        let message = err.to_string();
        assert!(message.contains("'name'"));
        assert!(message.contains("'Person'"));
        assert!(message.contains("Team -> Person"));
        assert_eq!(err.chain().len(), 2);
    }
}
