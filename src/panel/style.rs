//! Custom style blocks registered by panels under a style id.
//!
//! The block is CSS-like text. Only declarations are read; selectors and
//! braces are skipped. Recognised properties override the panel palette.

use super::theme::{parse_color, Palette};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    pub id: String,
    pub source: String,
    declarations: Vec<(String, String)>,
}

impl StyleSheet {
    pub fn parse(id: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut declarations = Vec::new();
        for block in source.split('}') {
            let body = block.rsplit('{').next().unwrap_or(block);
            for declaration in body.split(';') {
                if let Some((name, value)) = declaration.split_once(':') {
                    let name = name.trim().to_ascii_lowercase();
                    let value = value.trim().trim_end_matches("!important").trim();
                    if !name.is_empty() && !value.is_empty() {
                        declarations.push((name, value.to_string()));
                    }
                }
            }
        }
        Self {
            id: id.into(),
            source,
            declarations,
        }
    }

    pub fn declarations(&self) -> &[(String, String)] {
        &self.declarations
    }

    pub fn apply(&self, palette: &mut Palette) {
        for (name, value) in &self.declarations {
            let key = match name.as_str() {
                "background" | "background-color" => "bg",
                "color" => "text",
                "border-color" => "border",
                "header-background" => "headerBg",
                "header-color" => "headerColor",
                "accent-color" => "primary",
                _ => continue,
            };
            match parse_color(value) {
                Ok(color) => {
                    palette.set(key, color);
                }
                Err(err) => log::debug!("Style block {}: {err}", self.id),
            }
        }
    }
}
