//! Output formatting

use serde_json::{json, Map, Value};

/// Output builder for formatted CLI output
pub struct Output {
    json_mode: bool,
    fields: Map<String, Value>,
    lines: Vec<String>,
}

impl Output {
    /// Create a new output builder
    pub fn new(json_mode: bool) -> Self {
        Self {
            json_mode,
            fields: Map::new(),
            lines: Vec::new(),
        }
    }

    /// Add a string field to the output
    pub fn field(mut self, key: &str, value: &str) -> Self {
        self.fields
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Add a u64 field to the output
    pub fn field_u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), Value::Number(value.into()));
        self
    }

    /// Add a bool field to the output
    pub fn field_bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), Value::Bool(value));
        self
    }

    /// Add a JSON value field to the output
    pub fn field_value(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Add a field only when it is present
    pub fn field_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    /// Append one line of human-readable text
    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(text.into());
        self
    }

    /// Set the human-readable message
    pub fn message(mut self, msg: &str) -> Self {
        self.lines = vec![msg.to_string()];
        self
    }

    /// Render without printing
    pub fn render(&self) -> String {
        if self.json_mode {
            serde_json::to_string_pretty(&json!(self.fields)).unwrap_or_default()
        } else {
            self.lines.join("\n")
        }
    }

    /// Print the output
    pub fn print(self) {
        let text = self.render();
        if !text.is_empty() {
            println!("{}", text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mode_prints_fields_only() {
        let out = Output::new(true)
            .field("tx_hash", "0xab")
            .field_u64("block_number", 16)
            .field_bool("success", true)
            .line("ignored in json mode");
        let text = out.render();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["block_number"], 16);
        assert_eq!(value["tx_hash"], "0xab");
        assert_eq!(value["success"], true);
        assert!(!text.contains("ignored"));
    }

    #[test]
    fn test_text_mode_joins_lines() {
        let out = Output::new(false)
            .field("status", "confirmed")
            .line("Operation: deposit")
            .line("Status: confirmed");
        assert_eq!(out.render(), "Operation: deposit\nStatus: confirmed");
    }

    #[test]
    fn test_field_opt_skips_none() {
        let out = Output::new(true).field_opt("asset", None);
        assert_eq!(out.render(), "{}");
    }
}
