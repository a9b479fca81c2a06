//! User-facing controls
//!
//! The controller reads the four parameter fields and the scene editor
//! through [`ControlPanel`] at the moment a render is triggered.

use std::collections::HashMap;

use rtw_core::{FieldConstraints, FieldInput, ParamField};

use crate::config::RenderConfig;

/// Parameter fields and the editable scene text
pub trait ControlPanel {
    /// Current raw value and constraints of a parameter field
    fn field_input(&self, field: ParamField) -> FieldInput;

    /// Current content of the scene editor
    fn scene_text(&self) -> String;

    /// Replace the content of the scene editor
    fn set_scene_text(&mut self, text: &str);
}

/// In-memory control panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    fields: HashMap<ParamField, FieldInput>,
    scene_text: String,
}

impl FormState {
    /// Fields filled with the configured default values
    pub fn from_config(config: &RenderConfig) -> Self {
        let fields = ParamField::ALL
            .iter()
            .map(|&field| {
                let field_config = config.field(field);
                (
                    field,
                    FieldInput::new(field_config.value.to_string(), field_config.constraints),
                )
            })
            .collect();

        Self {
            fields,
            scene_text: String::new(),
        }
    }

    /// Set the raw text of a field, keeping its constraints
    pub fn set_field(&mut self, field: ParamField, raw: impl Into<String>) {
        self.fields
            .entry(field)
            .or_insert_with(|| FieldInput::new("", FieldConstraints::default()))
            .raw = raw.into();
    }

    /// Replace the constraints of a field
    pub fn set_constraints(&mut self, field: ParamField, constraints: FieldConstraints) {
        self.fields
            .entry(field)
            .or_insert_with(|| FieldInput::new("", constraints))
            .constraints = constraints;
    }

    /// Raw text of a field
    pub fn field_text(&self, field: ParamField) -> &str {
        self.fields.get(&field).map(|f| f.raw.as_str()).unwrap_or("")
    }
}

impl ControlPanel for FormState {
    fn field_input(&self, field: ParamField) -> FieldInput {
        self.fields
            .get(&field)
            .cloned()
            .unwrap_or_else(|| FieldInput::new("", FieldConstraints::default()))
    }

    fn scene_text(&self) -> String {
        self.scene_text.clone()
    }

    fn set_scene_text(&mut self, text: &str) {
        self.scene_text = text.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_defaults() {
        let form = FormState::from_config(&RenderConfig::default());

        assert_eq!(form.field_text(ParamField::ImageWidth), "400");
        assert_eq!(form.field_text(ParamField::ImageHeight), "300");
        assert_eq!(form.field_text(ParamField::SamplesPerPixel), "10");
        assert_eq!(form.field_text(ParamField::MaxBounces), "5");
        assert!(form.scene_text().is_empty());
    }

    #[test]
    fn test_set_field_keeps_constraints() {
        let mut form = FormState::from_config(&RenderConfig::default());
        let before = form.field_input(ParamField::MaxBounces).constraints;

        form.set_field(ParamField::MaxBounces, "7");

        let input = form.field_input(ParamField::MaxBounces);
        assert_eq!(input.raw, "7");
        assert_eq!(input.constraints, before);
    }

    #[test]
    fn test_missing_field_is_blank() {
        let form = FormState::default();
        let input = form.field_input(ParamField::ImageWidth);
        assert!(input.raw.is_empty());
        assert!(input.constraints.required);
    }
}
