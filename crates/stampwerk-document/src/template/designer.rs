// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Designer: the mounted editing surface for one template. Owns the working
// copy; callers only ever receive clones.

use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::template::DocumentTemplate;
use tracing::{debug, info};

/// One row of the field listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub name: String,
    pub kind: &'static str,
    pub page: u32,
    pub has_content: bool,
}

#[derive(Debug)]
pub struct Designer {
    template: DocumentTemplate,
}

impl Designer {
    pub fn new(template: DocumentTemplate) -> Result<Self> {
        template.validate()?;
        info!(fields = template.fields.len(), "Designer mounted");
        Ok(Self { template })
    }

    /// Current template, including any edits.
    pub fn get_template(&self) -> DocumentTemplate {
        self.template.clone()
    }

    /// Replace the working template. Invalid templates are rejected and the
    /// previous one is kept.
    pub fn update_template(&mut self, template: DocumentTemplate) -> Result<()> {
        template.validate()?;
        debug!(fields = template.fields.len(), "Template replaced");
        self.template = template;
        Ok(())
    }

    pub fn set_field_content(&mut self, name: &str, content: impl Into<String>) -> Result<()> {
        let field = self
            .template
            .field_mut(name)
            .ok_or_else(|| StampwerkError::Template(format!("no field named `{name}`")))?;
        field.content.set_content(content);
        Ok(())
    }

    pub fn fields(&self) -> Vec<FieldSummary> {
        self.template
            .fields
            .iter()
            .map(|f| FieldSummary {
                name: f.name.clone(),
                kind: f.type_name(),
                page: f.page,
                has_content: !f.content.content().is_empty(),
            })
            .collect()
    }

    /// Unmount and release the surface.
    pub fn destroy(self) {
        info!(fields = self.template.fields.len(), "Designer destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampwerk_core::presets::{PHOTO_FIELD, TemplatePreset};
    use stampwerk_core::session::SessionSnapshot;
    use stampwerk_core::types::PaperSize;

    fn template() -> DocumentTemplate {
        TemplatePreset::StampCard.template(&SessionSnapshot::default(), PaperSize::A4)
    }

    #[test]
    fn get_template_round_trips_structure() {
        let original = template();
        let designer = Designer::new(original.clone()).unwrap();
        assert!(designer.get_template().same_structure(&original));
        assert_eq!(designer.get_template(), original);
    }

    #[test]
    fn field_listing_matches_template() {
        let designer = Designer::new(template()).unwrap();
        let fields = designer.fields();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Text", "qrCode", PHOTO_FIELD, "dateTime"]);
        assert_eq!(fields[1].kind, "qrcode");
        assert!(!fields[2].has_content);
    }

    #[test]
    fn set_field_content_edits_working_copy() {
        let mut designer = Designer::new(template()).unwrap();
        designer.set_field_content("Text", "Grace").unwrap();
        assert_eq!(designer.get_template().field("Text").unwrap().content.content(), "Grace");
        assert!(matches!(
            designer.set_field_content("missing", "x"),
            Err(StampwerkError::Template(_))
        ));
    }

    #[test]
    fn invalid_update_keeps_previous_template() {
        let mut designer = Designer::new(template()).unwrap();
        let mut broken = template();
        broken.fields[0].width = -1.0;
        assert!(designer.update_template(broken).is_err());
        assert!(designer.get_template().same_structure(&template()));
        designer.destroy();
    }
}
