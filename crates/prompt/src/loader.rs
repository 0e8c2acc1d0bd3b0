//! Prompt loader for YAML prompt definitions.
//!
//! Workspaces may override built-in prompts by dropping `<id>.yml` files into
//! `.docforge/prompts/`.

use crate::types::PromptDefinition;
use docforge_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Directory holding prompt overrides for a workspace.
pub fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".docforge/prompts")
}

/// Load a prompt definition by ID from the workspace.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.docforge/`
/// * `prompt_id` - Prompt identifier (e.g., "article.generate")
///
/// # Returns
/// A parsed `PromptDefinition` or an error if not found/invalid.
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load a workspace override, or fall back to the built-in definition.
///
/// A missing override is normal; an override that exists but does not parse
/// or validate is reported and the built-in is used instead.
pub fn load_prompt_or_builtin(workspace_path: &Path, builtin: PromptDefinition) -> PromptDefinition {
    let path = prompts_dir(workspace_path).join(format!("{}.yml", builtin.id));
    if !path.exists() {
        return builtin;
    }

    match load_prompt(workspace_path, &builtin.id) {
        Ok(definition) => definition,
        Err(e) => {
            tracing::warn!("Ignoring prompt override for '{}': {}", builtin.id, e);
            builtin
        }
    }
}

/// List all available prompt IDs in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let dir = prompts_dir(workspace_path);

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
