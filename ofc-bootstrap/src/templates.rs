//! Tera rendering of plan templates into the output directory

use crate::plan::Plan;
use snafu::{ResultExt, Snafu};
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

#[derive(Debug, Snafu)]
pub enum RenderError {
    #[snafu(display("failed to read template {}: {source}", path.display()))]
    ReadTemplate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to render template {}: {source}", path.display()))]
    Template { path: PathBuf, source: tera::Error },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Values every template can use
pub fn plan_context(plan: &Plan) -> Context {
    let mut ctx = Context::new();
    ctx.insert("orchestration", &plan.orchestration);
    ctx.insert("root_domain", &plan.root_domain.clone().unwrap_or_default());
    ctx.insert("registry", &plan.registry.clone().unwrap_or_default());
    ctx.insert("tls", &plan.tls);
    ctx.insert("secrets", &plan.secrets);
    ctx
}

/// Render `templates_dir/name` into `output_dir/name`, returning the output path
pub fn render_to_file(
    plan: &Plan,
    templates_dir: &Path,
    output_dir: &Path,
    name: &str,
) -> Result<PathBuf, RenderError> {
    let template_path = templates_dir.join(name);
    let source = fs::read_to_string(&template_path).context(ReadTemplateSnafu {
        path: &template_path,
    })?;

    let rendered = Tera::one_off(&source, &plan_context(plan), false).context(TemplateSnafu {
        path: &template_path,
    })?;

    fs::create_dir_all(output_dir).context(WriteOutputSnafu { path: output_dir })?;
    let output_path = output_dir.join(name);
    fs::write(&output_path, rendered).context(WriteOutputSnafu {
        path: &output_path,
    })?;

    tracing::debug!(
        "Rendered {} -> {}",
        template_path.display(),
        output_path.display()
    );
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Orchestration, SecretSpec};

    fn plan() -> Plan {
        Plan {
            orchestration: Orchestration::Kubernetes,
            secrets: vec![SecretSpec {
                name: "s3".to_string(),
                namespace: Some("openfaas".to_string()),
                key: None,
            }],
            root_domain: Some("o6s.io".to_string()),
            registry: Some("docker.io/ofc/".to_string()),
            tls: true,
        }
    }

    #[test]
    fn test_render_to_file_substitutes_plan_values() {
        let templates = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            templates.path().join("stack.yml"),
            "domain: {{ root_domain }}\nregistry: {{ registry }}\n{% if tls %}scheme: https{% endif %}\n{% for s in secrets %}- {{ s.name }}\n{% endfor %}",
        )
        .unwrap();

        let path = render_to_file(&plan(), templates.path(), &output.path().join("tmp"), "stack.yml")
            .unwrap();

        let rendered = fs::read_to_string(path).unwrap();
        assert!(rendered.contains("domain: o6s.io"));
        assert!(rendered.contains("registry: docker.io/ofc/"));
        assert!(rendered.contains("scheme: https"));
        assert!(rendered.contains("- s3"));
    }

    #[test]
    fn test_missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_to_file(&plan(), dir.path(), dir.path(), "absent.yml").unwrap_err();
        assert!(matches!(err, RenderError::ReadTemplate { .. }));
    }

    #[test]
    fn test_broken_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yml"), "{{ root_domain").unwrap();

        let err = render_to_file(&plan(), dir.path(), &dir.path().join("out"), "bad.yml")
            .unwrap_err();
        assert!(matches!(err, RenderError::Template { .. }));
    }
}
