//! Mapping from (template name, language tag) to SendCloud templates.
//!
//! All template id references are checked once, when the resolver is built.
//! Resolution at request time is a pair of map lookups and only fails for an
//! unknown template name.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sms_core::{ConfigurationError, SmsError};

/// Opaque SendCloud identifier of a message template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl Borrow<str> for TemplateId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SendCloud `msgType` of a template, e.g. "0" (SMS), "2" (international SMS).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateMessageType(pub String);

impl TemplateMessageType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A template as declared in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub template_id: String,
    pub template_msg_type: String,
}

/// Per-language override inside an assignment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ByLanguageConfig {
    pub authgear_language: String,
    pub template_id: String,
}

/// Binds one template name to a default template and per-language overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateAssignmentConfig {
    pub authgear_template_name: String,
    pub default_template_id: String,
    #[serde(default)]
    pub by_languages: Vec<ByLanguageConfig>,
}

/// A resolved template reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCloudTemplate {
    pub template_id: TemplateId,
    pub template_msg_type: TemplateMessageType,
}

impl From<&TemplateConfig> for SendCloudTemplate {
    fn from(template: &TemplateConfig) -> Self {
        Self {
            template_id: TemplateId(template.template_id.clone()),
            template_msg_type: TemplateMessageType(template.template_msg_type.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SendCloudTemplateAssignment {
    pub authgear_template_name: String,
    pub default_template: SendCloudTemplate,
    pub by_language: HashMap<String, SendCloudTemplate>,
}

impl SendCloudTemplateAssignment {
    fn new(
        assignment: &TemplateAssignmentConfig,
        templates: &HashMap<TemplateId, SendCloudTemplate>,
    ) -> Result<Self, ConfigurationError> {
        let lookup = |id: &str| {
            templates
                .get(id)
                .cloned()
                .ok_or_else(|| ConfigurationError::TemplateNotFound {
                    template_id: id.to_string(),
                })
        };

        let mut by_language = HashMap::with_capacity(assignment.by_languages.len());
        for entry in &assignment.by_languages {
            by_language.insert(entry.authgear_language.clone(), lookup(&entry.template_id)?);
        }

        Ok(Self {
            authgear_template_name: assignment.authgear_template_name.clone(),
            default_template: lookup(&assignment.default_template_id)?,
            by_language,
        })
    }

    /// Exact-match override for `language_tag`, or the default template.
    pub fn template_for(&self, language_tag: &str) -> &SendCloudTemplate {
        self.by_language
            .get(language_tag)
            .unwrap_or(&self.default_template)
    }
}

#[derive(Debug, Clone)]
pub struct SendCloudTemplateResolver {
    templates: HashMap<TemplateId, SendCloudTemplate>,
    assignments: HashMap<String, SendCloudTemplateAssignment>,
}

impl SendCloudTemplateResolver {
    /// Build the resolver, failing if any assignment references a template id
    /// missing from `templates`, or if an id or template name is declared twice.
    pub fn new(
        templates: &[TemplateConfig],
        assignments: &[TemplateAssignmentConfig],
    ) -> Result<Self, ConfigurationError> {
        let mut template_map = HashMap::with_capacity(templates.len());
        for template in templates {
            let template = SendCloudTemplate::from(template);
            if template_map.contains_key(&template.template_id) {
                return Err(ConfigurationError::Invalid(format!(
                    "template id {} is declared more than once",
                    template.template_id
                )));
            }
            template_map.insert(template.template_id.clone(), template);
        }

        let mut assignment_map = HashMap::with_capacity(assignments.len());
        for assignment in assignments {
            let assignment = SendCloudTemplateAssignment::new(assignment, &template_map)?;
            if assignment_map.contains_key(&assignment.authgear_template_name) {
                return Err(ConfigurationError::Invalid(format!(
                    "template name {} is assigned more than once",
                    assignment.authgear_template_name
                )));
            }
            assignment_map.insert(assignment.authgear_template_name.clone(), assignment);
        }

        Ok(Self {
            templates: template_map,
            assignments: assignment_map,
        })
    }

    pub fn resolve(
        &self,
        template_name: &str,
        language_tag: &str,
    ) -> Result<&SendCloudTemplate, SmsError> {
        let assignment = self
            .assignments
            .get(template_name)
            .ok_or_else(|| SmsError::UnknownTemplate(template_name.to_string()))?;
        Ok(assignment.template_for(language_tag))
    }

    pub fn template(&self, id: &str) -> Option<&SendCloudTemplate> {
        self.templates.get(id)
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.assignments.keys().map(String::as_str)
    }
}
