//! Body templating for outgoing emails

use std::collections::HashMap;

use handlebars::Handlebars;
use serde_json::Value;

use crate::errors::DispatchError;

/// Render a template body against the supplied variables.
///
/// Strict mode: a reference to a missing variable fails the render instead
/// of silently expanding to an empty string, so typos surface before
/// anything is persisted or handed to a provider.
pub fn render_body(
    template: &str,
    variables: &HashMap<String, Value>,
) -> Result<String, DispatchError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);

    handlebars.render_template(template, variables).map_err(|e| {
        let mut supplied: Vec<&str> = variables.keys().map(String::as_str).collect();
        supplied.sort_unstable();
        DispatchError::TemplateRender {
            reason: e.to_string(),
            supplied_keys: supplied.join(", "),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn variables(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_variables() {
        let rendered = render_body(
            "Hello {{name}}, your order {{order_id}} shipped.",
            &variables(&[("name", json!("Ada")), ("order_id", json!("o-42"))]),
        )
        .unwrap();
        assert_eq!(rendered, "Hello Ada, your order o-42 shipped.");
    }

    #[test]
    fn test_render_without_placeholders_is_passthrough() {
        let rendered = render_body("Plain body", &HashMap::new()).unwrap();
        assert_eq!(rendered, "Plain body");
    }

    #[test]
    fn test_missing_variable_fails_and_names_supplied_keys() {
        let result = render_body(
            "Hello {{name}}",
            &variables(&[("zip", json!("12345")), ("city", json!("Berlin"))]),
        );

        match result {
            Err(DispatchError::TemplateRender { reason, supplied_keys }) => {
                assert!(reason.contains("name"), "reason should name the variable: {reason}");
                assert_eq!(supplied_keys, "city, zip");
            }
            other => panic!("expected TemplateRender error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_variable_with_empty_bag() {
        let result = render_body("Hi {{name}}", &HashMap::new());
        match result {
            Err(DispatchError::TemplateRender { supplied_keys, .. }) => {
                assert_eq!(supplied_keys, "");
            }
            other => panic!("expected TemplateRender error, got {other:?}"),
        }
    }
}
