use validator::{ValidationErrors, ValidationErrorsKind};

use crate::models::validation::ValidationErrorSet;

/// Flattens `validator` errors into the field -> message shape the wizard
/// reports. Struct-level errors land under `payload`.
pub fn to_error_set(errors: &ValidationErrors) -> ValidationErrorSet {
    let mut set = ValidationErrorSet::new();
    collect(errors, "", &mut set);
    set
}

fn collect(errors: &ValidationErrors, prefix: &str, set: &mut ValidationErrorSet) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let name = if field == "__all__" { "payload".to_string() } else { field };
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{}.{}", prefix, name)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", err.code));
                    set.add(key, message);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &key, set),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect(inner, &format!("{}.{}", key, idx), set);
                }
            }
        }
    }
}
