//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docforge_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the optional system template and the user template are rendered
/// with the same variables.
///
/// # Example
/// ```no_run
/// use docforge_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = PromptDefinition::builtin("demo", "Demo", "Rewrite: {{content}}");
/// let mut vars = HashMap::new();
/// vars.insert("content".to_string(), "Some text".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = definition
        .system_template
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Source content is HTML or plain text and must pass through untouched
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
