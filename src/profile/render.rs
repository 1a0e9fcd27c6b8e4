//! Display rules for the profile forms.
//!
//! Masking and the fixed `country` literal are applied here, on the way to
//! the screen, so records always keep the real values.

use std::cmp;

use crate::config::{Config, DEFAULT_COUNTRY_DISPLAY, DEFAULT_MASK};
use crate::domain::{FormKind, FormRecord};
use crate::profile::fields::{self, FieldDescriptor, InputKind};
use crate::profile::form::{EditableForm, FormMode};

pub const ACTION_EDIT: &str = "Cambiar";
pub const ACTION_CANCEL: &str = "Cancelar";
pub const ACTION_SAVE: &str = "Guardar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub mask: String,
    pub fixed_display: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            mask: DEFAULT_MASK.into(),
            fixed_display: DEFAULT_COUNTRY_DISPLAY.into(),
        }
    }
}

impl From<&Config> for DisplayOptions {
    fn from(config: &Config) -> Self {
        Self {
            mask: config.mask.clone(),
            fixed_display: config.country_display.clone(),
        }
    }
}

/// Value shown for `raw` under the given field and edit state.
pub fn display_value(
    descriptor: &FieldDescriptor,
    editable: bool,
    raw: &str,
    options: &DisplayOptions,
) -> String {
    if !descriptor.editable {
        options.fixed_display.clone()
    } else if descriptor.mask_when_readonly && !editable {
        options.mask.clone()
    } else {
        raw.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_kind: InputKind,
    pub value: String,
    /// Rendered as a live input rather than a label.
    pub input: bool,
    pub disabled: bool,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub kind: FormKind,
    pub title: &'static str,
    pub mode: FormMode,
    pub fields: Vec<FieldView>,
    pub save_enabled: bool,
    pub notice: Option<String>,
}

impl FormView {
    pub fn build<R: FormRecord>(form: &EditableForm<R>, options: &DisplayOptions) -> Self {
        let editable = form.is_editable();
        let fields = fields::descriptors(R::FORM)
            .iter()
            .map(|descriptor| {
                let raw = form.record().get(descriptor.name).unwrap_or_default();
                FieldView {
                    name: descriptor.name,
                    label: descriptor.label,
                    input_kind: descriptor.input_kind,
                    value: display_value(descriptor, editable, raw, options),
                    input: editable && descriptor.editable,
                    disabled: !descriptor.editable,
                    error: form.errors().get(descriptor.name).to_string(),
                }
            })
            .collect();
        Self {
            kind: R::FORM,
            title: fields::form_title(R::FORM),
            mode: form.mode(),
            fields,
            save_enabled: form.can_save(),
            notice: form.last_error().map(str::to_string),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn actions(&self) -> String {
        match self.mode {
            FormMode::Viewing => format!("[{}]", ACTION_EDIT),
            FormMode::Editing if self.save_enabled => {
                format!("[{}] [{}]", ACTION_CANCEL, ACTION_SAVE)
            }
            FormMode::Editing => format!("[{}] [{} (disabled)]", ACTION_CANCEL, ACTION_SAVE),
        }
    }

    /// Plain-text rendering: heading with actions, a rule, then one line per field.
    pub fn render(&self) -> String {
        let label_width = self
            .fields
            .iter()
            .map(|field| field.label.chars().count())
            .max()
            .unwrap_or(0);

        let mut lines = Vec::with_capacity(self.fields.len() + 3);
        lines.push(format!("{}  {}", self.title, self.actions()));
        for field in &self.fields {
            let marker = if field.input { ">" } else { ":" };
            let padding = label_width.saturating_sub(field.label.chars().count());
            let mut line = format!(
                "  {}{} {} {}",
                field.label,
                " ".repeat(padding),
                marker,
                field.value
            );
            if field.input && field.input_kind != InputKind::Text {
                line.push_str(&format!("  <{}>", field.input_kind.as_str()));
            }
            if field.disabled && self.mode == FormMode::Editing {
                line.push_str("  (locked)");
            }
            if !field.error.is_empty() {
                line.push_str(&format!("  ! {}", field.error));
            }
            lines.push(line);
        }
        if let Some(notice) = &self.notice {
            lines.push(format!("  save failed: {}", notice));
        }

        let rule_len = cmp::max(
            lines
                .iter()
                .map(|line| line.chars().count())
                .max()
                .unwrap_or(0),
            40,
        );
        lines.insert(1, "─".repeat(rule_len));
        lines.join("\n")
    }
}
