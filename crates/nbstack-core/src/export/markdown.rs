// ABOUTME: Exports a human-readable Markdown summary of a stack and its synthesized template.
// ABOUTME: Sections: overview, function, front door (domain, CORS, authorizer), resources, outputs.

use std::fmt::Write;

use crate::front_door::FrontDoorRevision;
use crate::stack::StackDefinition;
use crate::template::Template;

/// Render the stack summary as Markdown with deterministic ordering.
pub fn export_markdown(stack: &StackDefinition, template: &Template) -> String {
    let mut out = String::new();
    let compute = &stack.compute;
    let front_door = &stack.front_door;

    writeln!(out, "# {}", stack.stack_name).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "> {}", template.description).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "- Environment: `{}`", stack.environment).unwrap();
    writeln!(out, "- Front door: `{}`", front_door.revision).unwrap();

    writeln!(out).unwrap();
    writeln!(out, "## Function").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "- Name: `{}`", compute.name).unwrap();
    writeln!(out, "- Image directory: `{}`", compute.image_directory.display()).unwrap();
    if let Some(architecture) = compute.architecture {
        writeln!(out, "- Architecture: `{}`", architecture.as_str()).unwrap();
    }
    writeln!(out, "- Timeout: {} s", compute.timeout_seconds()).unwrap();

    writeln!(out).unwrap();
    writeln!(out, "## Front door").unwrap();
    writeln!(out).unwrap();
    match front_door.revision {
        // A function URL serves every path; there is no route to list
        FrontDoorRevision::FunctionUrl => {
            writeln!(out, "- Public function URL, all paths, no authorization").unwrap();
        }
        FrontDoorRevision::RestApi | FrontDoorRevision::HttpApi => {
            writeln!(out, "- Route: `{}`", front_door.route_key()).unwrap();
        }
    }

    if let Some(ref domain) = front_door.custom_domain {
        writeln!(out, "- Custom domain: `{}`", domain.domain_name).unwrap();
        writeln!(out, "- Certificate: `{}`", domain.certificate_arn).unwrap();
        writeln!(out, "- URL: {}", domain.route_url()).unwrap();
    }

    if let Some(ref cors) = front_door.cors {
        writeln!(out).unwrap();
        writeln!(out, "### CORS").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "- Origins: {}", code_list(&cors.allow_origins)).unwrap();
        writeln!(out, "- Methods: {}", code_list(&cors.allow_methods)).unwrap();
        writeln!(out, "- Headers: {}", code_list(&cors.allow_headers)).unwrap();
    }

    if let Some(ref authorizer) = front_door.authorizer {
        writeln!(out).unwrap();
        writeln!(out, "### JWT authorizer").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "- Issuer: {}", authorizer.issuer).unwrap();
        writeln!(out, "- Audience: {}", code_list(&authorizer.audience)).unwrap();
        writeln!(out, "- Identity source: `{}`", authorizer.identity_source).unwrap();
    }

    writeln!(out).unwrap();
    writeln!(out, "## Resources").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "| Logical ID | Type |").unwrap();
    writeln!(out, "|---|---|").unwrap();
    for (id, resource) in &template.resources {
        writeln!(out, "| {} | `{}` |", id, resource.kind).unwrap();
    }

    if !template.outputs.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "## Outputs").unwrap();
        writeln!(out).unwrap();
        for (name, output) in &template.outputs {
            writeln!(out, "- **{}**: {}", name, output.description).unwrap();
        }
    }

    out
}

fn code_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("`{}`", i))
        .collect::<Vec<_>>()
        .join(", ")
}
