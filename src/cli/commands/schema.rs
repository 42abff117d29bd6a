//! `stagecraft schema` command - print the embedded JSON Schemas

use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::schema::registry::SchemaRegistry;

#[derive(clap::Args, Debug)]
pub struct SchemaArgs {
    /// Schema name (event.form, event.record); lists schemas when omitted
    pub name: Option<String>,

    /// Show raw JSON schema instead of formatted summary
    #[arg(long)]
    pub raw: bool,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    let registry = SchemaRegistry::default();
    match args.name {
        None => list_schemas(&registry),
        Some(ref name) => show_schema(&registry, name, args.raw),
    }
}

fn list_schemas(registry: &SchemaRegistry) -> Result<()> {
    println!("Available schemas:\n");
    println!("{:<14} {:<24} {}", "NAME", "TITLE", "DESCRIPTION");
    println!("{}", "-".repeat(78));

    for name in registry.names() {
        let schema = registry
            .get_json(name)
            .ok_or_else(|| miette::miette!("embedded schema '{}' is not valid JSON", name))?;
        let title = schema["title"].as_str().unwrap_or(name);
        let desc = schema["description"].as_str().unwrap_or("");
        let desc_short = if desc.chars().count() > 40 {
            format!("{}...", desc.chars().take(37).collect::<String>())
        } else {
            desc.to_string()
        };
        println!("{:<14} {:<24} {}", name, title, desc_short);
    }

    println!("\nUse 'stagecraft schema <name>' for field details");
    Ok(())
}

fn show_schema(registry: &SchemaRegistry, name: &str, raw: bool) -> Result<()> {
    let Some(content) = registry.get(name) else {
        let available: Vec<&str> = registry.names().collect();
        return Err(miette::miette!(
            help = format!("available schemas: {}", available.join(", ")),
            "unknown schema '{}'",
            name
        ));
    };

    if raw {
        println!("{}", content);
        return Ok(());
    }

    let schema: Value = serde_json::from_str(content).into_diagnostic()?;

    let title = schema["title"].as_str().unwrap_or(name);
    let desc = schema["description"].as_str().unwrap_or("");
    println!("{}", title);
    println!("{}", "=".repeat(title.chars().count()));
    if !desc.is_empty() {
        println!("{}\n", desc);
    }

    let required: Vec<&str> = schema["required"]
        .as_array()
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    if let Some(props) = schema["properties"].as_object() {
        println!("Fields:");
        println!("{:<20} {:<12} {:<8} {}", "NAME", "TYPE", "REQ", "DESCRIPTION");
        println!("{}", "-".repeat(80));

        let sorted: BTreeMap<_, _> = props.iter().collect();

        for (field, prop) in &sorted {
            let is_required = if required.contains(&field.as_str()) {
                "yes"
            } else {
                ""
            };
            let prop_desc = prop["description"].as_str().unwrap_or("");
            println!(
                "{:<20} {:<12} {:<8} {}",
                field,
                type_str(prop),
                is_required,
                prop_desc
            );
        }

        let enums: Vec<(&&String, Vec<&str>)> = sorted
            .iter()
            .filter_map(|(field, prop)| {
                let values = prop["enum"].as_array()?;
                Some((field, values.iter().filter_map(|v| v.as_str()).collect()))
            })
            .collect();
        if !enums.is_empty() {
            println!("\nEnum Values:");
            for (field, values) in enums {
                println!("  {}: {}", field, values.join(", "));
            }
        }
    }

    println!("\nUse --raw for full JSON schema");
    Ok(())
}

fn type_str(prop: &Value) -> String {
    match prop["type"].as_str() {
        Some("array") => match prop["items"]["type"].as_str() {
            Some(item) => format!("{}[]", item),
            None => "array".to_string(),
        },
        Some(t) => match prop["format"].as_str() {
            Some(format) => format.to_string(),
            None => t.to_string(),
        },
        None => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_str() {
        assert_eq!(type_str(&json!({ "type": "string", "format": "date" })), "date");
        assert_eq!(type_str(&json!({ "type": "array", "items": { "type": "string" } })), "string[]");
        assert_eq!(type_str(&json!({ "type": "boolean" })), "boolean");
        assert_eq!(type_str(&json!({})), "any");
    }
}
