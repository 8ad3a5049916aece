//! Prompt builder for rendering templates.

use crate::loader::resolve_prompt;
use crate::types::{BuiltPrompt, PromptDefinition};
use catalog_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;
use std::path::Path;

/// Identifier of the answer-synthesis prompt.
pub const GENERATE_PROMPT_ID: &str = "catalog.generate";

/// Build a prompt from a definition and input variables.
///
/// Every variable listed in the definition's `input.variables` must be
/// supplied; the rendered text is placed according to the definition's role.
///
/// # Arguments
/// * `definition` - Prompt definition loaded from YAML
/// * `variables` - Template variables (e.g., "context" -> retrieved digests)
///
/// # Example
/// ```no_run
/// use catalog_prompt::{build_prompt, builtin_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt("catalog.generate")?;
/// let mut vars = HashMap::new();
/// vars.insert("context".to_string(), "(Similarity: 0.120) Black and silver...".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("System prompt: {:?}", built.system);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    for required in &definition.input.variables {
        if !variables.contains_key(required) {
            return Err(AppError::Prompt(format!(
                "Prompt {} requires variable '{}'",
                definition.id, required
            )));
        }
    }

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        definition.role,
        rendered,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

/// The system instruction used when synthesizing an answer from retrieved context.
#[derive(Debug, Clone)]
pub struct GeneratePrompt {
    definition: PromptDefinition,
}

impl GeneratePrompt {
    /// Wrap an already loaded definition.
    pub fn new(definition: PromptDefinition) -> Self {
        Self { definition }
    }

    /// The definition shipped with the binary.
    pub fn builtin() -> AppResult<Self> {
        crate::loader::builtin_prompt(GENERATE_PROMPT_ID).map(Self::new)
    }

    /// The workspace override at `.catalog/prompts/catalog.generate.yml`, or the built-in.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        resolve_prompt(workspace_path, GENERATE_PROMPT_ID).map(Self::new)
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Render the system instruction for the given context block.
    pub fn render(&self, context: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context.to_string());

        let built = build_prompt(&self.definition, variables)?;
        built
            .system
            .or(built.user)
            .ok_or_else(|| AppError::Prompt(format!("Prompt {} rendered nothing", self.id())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptBehavior, PromptInputSpec, PromptOutputSpec, PromptRole};

    fn create_test_definition(template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            role: PromptRole::User,
            behavior: PromptBehavior {
                tone: "professional".to_string(),
                style: "concise".to_string(),
            },
            input: PromptInputSpec {
                variables: vec!["prompt".to_string()],
            },
            template: template.to_string(),
            output: PromptOutputSpec {
                format: "markdown".to_string(),
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("prompt".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{prompt}}", &vars);
        assert_eq!(result.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("prompt".to_string(), "<b>\"Pro\" & co</b>".to_string());

        let result = render_template("{{prompt}}", &vars).unwrap();
        assert_eq!(result, "<b>\"Pro\" & co</b>");
    }

    #[test]
    fn test_build_prompt_requires_declared_variables() {
        let def = create_test_definition("Question: {{prompt}}");
        let result = build_prompt(&def, HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_build_prompt_user_role() {
        let def = create_test_definition("Question: {{prompt}}");
        let mut vars = HashMap::new();
        vars.insert("prompt".to_string(), "Test question".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user.as_deref(), Some("Question: Test question"));
        assert!(built.system.is_none());
    }

    #[test]
    fn test_generate_prompt_render() {
        let prompt = GeneratePrompt::builtin().unwrap();
        let rendered = prompt.render("(Similarity: 0.100) Ships in black...").unwrap();

        assert_eq!(
            rendered,
            "You are a Q&A assistant. Answer concisely (max 3 sentences), using only the context below:\n\n(Similarity: 0.100) Ships in black..."
        );
    }

    #[test]
    fn test_generate_prompt_with_empty_context() {
        let prompt = GeneratePrompt::builtin().unwrap();
        let rendered = prompt.render("").unwrap();
        assert!(rendered.ends_with("below:\n\n"));
    }
}
