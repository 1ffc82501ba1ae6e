use serde::{Deserialize, Serialize};

/// Body returned by a remote validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Validity annotation attached to an input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Annotation {
    /// No feedback shown.
    #[default]
    None,
    Valid {
        message: Option<String>,
    },
    Invalid {
        message: Option<String>,
    },
}

impl Annotation {
    /// Class applied to the input itself.
    pub fn input_class(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Valid { .. } => Some("is-valid"),
            Self::Invalid { .. } => Some("is-invalid"),
        }
    }

    /// Class of the feedback element shown after the input, when there is a message.
    pub fn feedback_class(&self) -> Option<&'static str> {
        match self {
            Self::Valid { message: Some(_) } => Some("valid-feedback"),
            Self::Invalid { message: Some(_) } => Some("invalid-feedback"),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Valid { message } | Self::Invalid { message } => message.as_deref(),
        }
    }
}

impl From<ValidationResponse> for Annotation {
    fn from(response: ValidationResponse) -> Self {
        let message = response.message.filter(|message| !message.is_empty());
        if response.valid {
            Self::Valid { message }
        } else {
            Self::Invalid { message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_maps_to_annotation_classes() {
        let invalid: Annotation = ValidationResponse {
            valid: false,
            message: Some("slug already taken".into()),
        }
        .into();
        assert_eq!(invalid.input_class(), Some("is-invalid"));
        assert_eq!(invalid.feedback_class(), Some("invalid-feedback"));
        assert_eq!(invalid.message(), Some("slug already taken"));

        let valid: Annotation = ValidationResponse {
            valid: true,
            message: Some(String::new()),
        }
        .into();
        assert_eq!(valid, Annotation::Valid { message: None });
        assert_eq!(valid.feedback_class(), None);
        assert_eq!(Annotation::None.input_class(), None);
    }
}
