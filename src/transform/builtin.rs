//! Built-in transforms

use anyhow::{Context, Result};

use super::Transform;

/// Turns a JSON document into a CommonJS module exporting it
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTransform;

impl Transform for JsonTransform {
    fn transform(&self, source: &str) -> Result<String> {
        serde_json::from_str::<serde_json::Value>(source).context("Invalid JSON")?;
        Ok(format!("module.exports = {};", source.trim()))
    }
}

/// Wraps a stylesheet in a module that injects it into the document head
#[derive(Debug, Clone, Copy, Default)]
pub struct CssTransform;

impl Transform for CssTransform {
    fn transform(&self, source: &str) -> Result<String> {
        let css = serde_json::to_string(source)?;

        Ok(format!(
            r#"(function() {{
  var style = document.createElement('style');
  style.textContent = {};
  document.head.appendChild(style);
}})();
module.exports = {{}};
"#,
            css
        ))
    }
}

/// Exports the source text itself as a string
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTransform;

impl Transform for RawTransform {
    fn transform(&self, source: &str) -> Result<String> {
        Ok(format!("module.exports = {};", serde_json::to_string(source)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_json() {
        let result = JsonTransform.transform(r#"{"key": "value", "num": 42}"#).unwrap();
        assert_eq!(result, r#"module.exports = {"key": "value", "num": 42};"#);
    }

    #[test]
    fn test_transform_invalid_json() {
        assert!(JsonTransform.transform("{ nope").is_err());
    }

    #[test]
    fn test_transform_css() {
        let result = CssTransform.transform("body { color: red; }").unwrap();

        assert!(result.contains("document.createElement('style')"));
        assert!(result.contains(r#""body { color: red; }""#));
    }

    #[test]
    fn test_transform_raw_escapes() {
        let result = RawTransform.transform("say \"hi\"\n").unwrap();
        assert_eq!(result, r#"module.exports = "say \"hi\"\n";"#);
    }
}
