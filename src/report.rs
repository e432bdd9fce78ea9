//! Markdown report for AI coding assistants.

use crate::dom::ElementDescriptor;
use crate::framework::{ComponentNode, FrameworkSignal, Origin};
use crate::inspect::{PropertyMap, SerializedValue};

/// Everything the report is composed from
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub instruction: &'a str,
    pub page_url: &'a str,
    pub page_title: &'a str,
    pub framework: Option<&'a FrameworkSignal>,
    pub element: &'a ElementDescriptor,
    pub component: Option<&'a ComponentNode>,
}

/// Compose the report. Sections are separated by a blank line; the
/// instruction and component sections are left out when they are empty.
pub fn compose_report(input: &ReportInput<'_>) -> String {
    let mut sections = Vec::with_capacity(4);

    let instruction = input.instruction.trim();
    if !instruction.is_empty() {
        sections.push(format!("## User Instruction\n{}", instruction));
    }

    sections.push(page_context(input));
    sections.push(selected_element(input.element));

    if let Some(component) = input.component {
        sections.push(component_tree(component));
    }

    sections.join("\n\n")
}

fn page_context(input: &ReportInput<'_>) -> String {
    let mut lines = vec![format!("- **URL**: {}", input.page_url)];
    if let Some(signal) = input.framework {
        if let Some(base) = signal.base {
            lines.push(format!("- **Framework**: {}", base));
        }
        if let Some(meta) = signal.meta {
            lines.push(format!("- **Meta Framework**: {}", meta));
        }
    }
    lines.push(format!("- **Page Title**: {}", input.page_title));

    format!("## Page Context\n{}", lines.join("\n"))
}

fn selected_element(element: &ElementDescriptor) -> String {
    let mut lines = vec![
        format!("- **Selector**: `{}`", element.selector),
        format!("- **Tag**: `<{}>`", element.tag),
    ];
    if !element.text.is_empty() {
        lines.push(format!("- **Text**: \"{}\"", element.text));
    }
    if !element.attributes.is_empty() {
        lines.push("- **Attributes**:".to_string());
        for (name, value) in &element.attributes {
            lines.push(format!("  - {}: `{}`", name, value));
        }
    }

    format!("## Selected Element\n{}", lines.join("\n"))
}

fn component_tree(component: &ComponentNode) -> String {
    let (heading, state_label) = match component.origin {
        Origin::React => ("Component Tree (React)", "State"),
        Origin::Vue => ("Component Tree (Vue)", "Data"),
    };

    let mut lines = Vec::new();
    if !component.hierarchy.is_empty() {
        lines.push(format!("- `{}`", component.hierarchy.join("` → `")));
    }
    if let Some(props) = &component.props {
        lines.push(format!("- **Props**: `{}`", format_mapping(props)));
    }
    if let Some(state) = &component.state {
        lines.push(format!("- **{}**: `{}`", state_label, format_mapping(state)));
    }

    format!("## {}\n{}", heading, lines.join("\n"))
}

/// `{ k: v, ... }`, or `{}` when empty
pub fn format_mapping(map: &PropertyMap) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }
    let parts: Vec<String> = map
        .iter()
        .map(|(key, value)| format!("{}: {}", key, format_value(value)))
        .collect();
    format!("{{ {} }}", parts.join(", "))
}

/// Render one serialized value the way it reads in JavaScript source
pub fn format_value(value: &SerializedValue) -> String {
    match value {
        SerializedValue::Null => "null".to_string(),
        SerializedValue::Undefined => "undefined".to_string(),
        SerializedValue::Bool(b) => b.to_string(),
        SerializedValue::Number(n) => format_number(*n),
        SerializedValue::Numeric(text) => text.clone(),
        SerializedValue::Function => SerializedValue::FUNCTION_MARKER.to_string(),
        SerializedValue::Circular => SerializedValue::CIRCULAR_MARKER.to_string(),
        SerializedValue::Truncated => SerializedValue::TRUNCATED_MARKER.to_string(),
        SerializedValue::Element(tag) => format!("<{}>", tag),
        SerializedValue::String(s) => format_string(s),
        SerializedValue::Sequence(items) => {
            let parts: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", parts.join(", "))
        }
        SerializedValue::Mapping(map) => format_mapping(map),
    }
}

/// Marker text and `<tag>`-looking strings are written bare, anything else quoted
fn format_string(s: &str) -> String {
    let is_marker = [
        SerializedValue::FUNCTION_MARKER,
        SerializedValue::CIRCULAR_MARKER,
        SerializedValue::TRUNCATED_MARKER,
    ]
    .contains(&s);

    if is_marker || (s.starts_with('<') && s.ends_with('>')) {
        s.to_string()
    } else {
        format!("\"{}\"", s)
    }
}

/// `String(n)` for the common cases: integral values have no fraction
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{:.0}", n);
    }
    n.to_string()
}
