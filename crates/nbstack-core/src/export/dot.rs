// ABOUTME: Exports a synthesized Template as a DOT graph of resources and their references.
// ABOUTME: Edges point from a resource to every resource or parameter it refers to.

use std::fmt::Write;

use crate::template::Template;

/// Render the template's dependency graph in Graphviz DOT.
///
/// Parameters are drawn as notes, resources as boxes coloured by service.
/// Node and edge order follow logical ID order, so output is deterministic.
pub fn export_dot(template: &Template, graph_name: &str) -> String {
    let mut out = String::new();

    writeln!(out, "digraph {} {{", to_snake_case(graph_name)).unwrap();
    writeln!(out, "    rankdir=LR;").unwrap();
    writeln!(out, "    node [fontname=\"Helvetica\", fontsize=10];").unwrap();

    for (id, parameter) in &template.parameters {
        writeln!(
            out,
            "    {} [shape=note, label=\"{}\\n{}\"];",
            id,
            escape(id),
            escape(&parameter.kind)
        )
        .unwrap();
    }

    for (id, resource) in &template.resources {
        writeln!(
            out,
            "    {} [shape=box, style=filled, fillcolor=\"{}\", label=\"{}\\n{}\"];",
            id,
            service_colour(&resource.kind),
            escape(id),
            escape(&resource.kind)
        )
        .unwrap();
    }

    writeln!(out).unwrap();

    for (id, resource) in &template.resources {
        for target in resource.references() {
            if template.resources.contains_key(&target) || template.parameters.contains_key(&target)
            {
                writeln!(out, "    {} -> {};", id, target).unwrap();
            }
        }
    }

    writeln!(out, "}}").unwrap();
    out
}

fn service_colour(kind: &str) -> &'static str {
    let service = kind.split("::").nth(1).unwrap_or("");
    match service {
        "Lambda" => "#fde9c9",
        "IAM" => "#f4d6d6",
        "ApiGateway" | "ApiGatewayV2" => "#d6e4f4",
        _ => "#eeeeee",
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Convert a stack name to a valid DOT identifier.
fn to_snake_case(s: &str) -> String {
    let snake: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if snake.starts_with(|c: char| c.is_ascii_digit()) || snake.is_empty() {
        format!("stack_{}", snake)
    } else {
        snake
    }
}
