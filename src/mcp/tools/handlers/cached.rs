//! Reference-data cache and prompt catalog handlers.
//!
//! None of these touch NetBox, so they work while the inventory is
//! unavailable.

use super::{ToolContext, ToolResult, parse_args};
use crate::Result;
use crate::cache::{ResourceKind, summarize};
use crate::mcp::PromptRegistry;
use crate::mcp::tool_types::{AvailablePromptsArgs, CachedResourcesArgs, ResourceSummaryArgs};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

/// Resolves the optional `resource_type` argument.
fn resource_kinds(resource_type: Option<&str>) -> std::result::Result<Vec<ResourceKind>, String> {
    match resource_type {
        None => Ok(ResourceKind::ALL.to_vec()),
        Some(name) => ResourceKind::parse(name).map(|kind| vec![kind]).ok_or_else(|| {
            format!(
                "Invalid resource type: {name}. Available types: {:?}",
                ResourceKind::names()
            )
        }),
    }
}

/// Executes `get_cached_resources`.
pub fn execute_get_cached_resources(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: CachedResourcesArgs = parse_args(arguments)?;
    let include_metadata = args.include_metadata.unwrap_or(true);
    let kinds = match resource_kinds(args.resource_type.as_deref()) {
        Ok(kinds) => kinds,
        Err(message) => {
            return Ok(ToolResult::error_json(&json!({
                "error": message,
                "resources": {},
                "metadata": { "total_count": 0 },
            })));
        },
    };

    let mut resources = Map::new();
    let mut total_count = 0;
    let mut successful_loads = 0;
    for kind in &kinds {
        let entry = match ctx.cache.load(*kind) {
            Ok(Some(snapshot)) => {
                total_count += snapshot.metadata.count;
                successful_loads += 1;
                json!({
                    "data": snapshot.data,
                    "count": snapshot.metadata.count,
                    "source": "cached",
                    "file_path": ctx.cache.path(*kind).display().to_string(),
                    "last_updated": snapshot.metadata.last_updated,
                })
            },
            Ok(None) => json!({
                "error": format!("Cache file not found: {}", kind.file_name()),
                "data": [],
                "count": 0,
            }),
            Err(e) => {
                tracing::warn!(resource = %kind, error = %e, "Failed to load snapshot");
                json!({ "error": e.to_string(), "data": [], "count": 0 })
            },
        };
        resources.insert(kind.as_str().to_string(), entry);
    }

    let mut metadata = json!({
        "total_count": total_count,
        "resource_types": kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "source": "cached",
        "include_metadata": include_metadata,
    });
    if include_metadata {
        metadata["cache_status"] = json!(if successful_loads > 0 { "available" } else { "unavailable" });
        metadata["resource_count"] = json!(kinds.len());
        metadata["successful_loads"] = json!(successful_loads);
    }
    tracing::info!(total_count, successful_loads, "Returning cached resources");

    Ok(ToolResult::json(&json!({ "resources": resources, "metadata": metadata })))
}

/// Executes `get_resource_summary`.
pub fn execute_get_resource_summary(ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: ResourceSummaryArgs = parse_args(arguments)?;
    let kinds = match resource_kinds(args.resource_type.as_deref()) {
        Ok(kinds) => kinds,
        Err(message) => {
            return Ok(ToolResult::error_json(&json!({
                "error": message,
                "summaries": {},
                "metadata": { "total_count": 0 },
            })));
        },
    };

    let mut summaries = Map::new();
    for kind in &kinds {
        let summary = match ctx.cache.load(*kind) {
            Ok(Some(snapshot)) => summarize(*kind, &snapshot.data),
            Ok(None) => json!({ "error": format!("Cache file not found: {}", kind.file_name()) }),
            Err(e) => json!({ "error": e.to_string() }),
        };
        summaries.insert(kind.as_str().to_string(), summary);
    }

    Ok(ToolResult::json(&json!({
        "summaries": summaries,
        "metadata": {
            "total_count": kinds.len(),
            "resource_types": kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            "source": "cached_summary",
        },
    })))
}

/// Executes `get_available_prompts`.
pub fn execute_get_available_prompts(_ctx: &ToolContext, arguments: Value) -> Result<ToolResult> {
    let args: AvailablePromptsArgs = parse_args(arguments)?;
    let include_examples = args.include_examples.unwrap_or(true);
    let registry = PromptRegistry::new();

    let selected = match args.prompt_type.as_deref() {
        None => registry.list_prompts(),
        Some(name) => match registry.get_prompt(name) {
            Some(prompt) => vec![prompt],
            None => {
                return Ok(ToolResult::error_json(&json!({
                    "error": format!(
                        "Invalid prompt type: {name}. Available types: {:?}",
                        registry.names()
                    ),
                    "prompts": {},
                    "metadata": { "total_count": 0 },
                })));
            },
        },
    };

    let mut prompts = Map::new();
    for prompt in &selected {
        let mut entry = json!({
            "description": prompt.description,
            "parameters": prompt.arguments.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            "category": prompt.category,
            "use_case": prompt.use_case,
        });
        if include_examples {
            entry["example"] = json!(prompt.example);
        }
        prompts.insert(prompt.name.clone(), entry);
    }
    let categories: BTreeSet<&str> = selected.iter().map(|p| p.category.as_str()).collect();

    Ok(ToolResult::json(&json!({
        "metadata": {
            "total_count": prompts.len(),
            "prompt_types": selected.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "categories": categories,
            "include_examples": include_examples,
        },
        "prompts": prompts,
    })))
}
