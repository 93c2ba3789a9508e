//! Template catalog subcommand handlers.

use bootstrapper_catalog::TemplateRecord;
use bootstrapper_config::Config;

use crate::cli::TemplatesAction;
use crate::components::build_catalog;

/// Handle templates subcommands.
pub(crate) async fn handle_templates_command(
    action: TemplatesAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TemplatesAction::List { label, format } => template_list(config, label, &format).await,
    }
}

async fn template_list(
    config: &Config,
    label: Option<String>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = build_catalog(config);

    let templates: Vec<TemplateRecord> = match label {
        Some(label) => {
            let (key, value) = parse_label(&label)
                .ok_or_else(|| format!("Label filter must look like key=value, got {}", label))?;
            catalog.load(key, value).await?
        }
        None => catalog.all().await?,
    };

    if templates.is_empty() {
        println!("No templates found.");
        return Ok(());
    }

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&templates)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<28} {:<36} {}", "NAME", "LABEL", "VARIABLES");
            println!("{}", "-".repeat(80));
            for template in &templates {
                println!(
                    "{:<28} {:<36} {}",
                    template.name,
                    template.label,
                    template.variables.len()
                );
            }
        }
    }

    Ok(())
}

fn parse_label(label: &str) -> Option<(&str, &str)> {
    let (key, value) = label.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
