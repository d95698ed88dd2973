use console::style;
use gcoder_core::tools::ToolDescriptor;
use serde_json::Value;

/// One entry per tool: name, description and the parameter names, required
/// ones marked with `*`.
pub fn format_catalog(catalog: &[ToolDescriptor]) -> String {
    catalog
        .iter()
        .map(|tool| {
            let required: Vec<&str> = tool
                .parameters
                .get("required")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let params: Vec<String> = tool
                .parameters
                .get("properties")
                .and_then(Value::as_object)
                .map(|props| {
                    props
                        .keys()
                        .map(|key| {
                            if required.contains(&key.as_str()) {
                                format!("{key}*")
                            } else {
                                key.clone()
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();

            let mut entry = format!(
                "  {} - {}",
                style(tool.name).cyan().bold(),
                tool.description
            );
            if !params.is_empty() {
                entry.push_str(&format!("\n      {}", style(params.join(", ")).dim()));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_catalog(catalog: &[ToolDescriptor]) {
    println!("{}", style(format!("Available tools ({}):", catalog.len())).bold());
    println!("{}", format_catalog(catalog));
}
