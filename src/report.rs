//! HTML-отчёт о дрейфе признаков

use std::path::Path;

use handlebars::Handlebars;
use serde_json::json;

use crate::error::Result;
use crate::validation::DriftReport;

const DRIFT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Feature Drift</title>
<style>
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ccc; padding: 4px 12px; text-align: left; }
.fail { color: #b00020; }
.pass { color: #1b5e20; }
</style>
</head>
<body>
<h1>Feature Drift</h1>
<p>Generated at {{generated_at}}. Threshold: {{threshold}}.</p>
<p class="{{#if passed}}pass{{else}}fail{{/if}}">
{{#if passed}}All features below the drift threshold.{{else}}Drift detected in {{drifted}}.{{/if}}
</p>
<table>
<tr><th>Feature</th><th>Drift score</th><th>Status</th></tr>
{{#each rows}}
<tr><td>{{feature}}</td><td>{{score}}</td><td class="{{status}}">{{status}}</td></tr>
{{/each}}
</table>
</body>
</html>
"#;

pub fn render_drift_report(report: &DriftReport) -> Result<String> {
    let rows: Vec<_> = report
        .scores
        .iter()
        .map(|(feature, score)| {
            json!({
                "feature": feature,
                "score": format!("{:.4}", score),
                "status": if *score < report.threshold { "pass" } else { "fail" },
            })
        })
        .collect();

    let context = json!({
        "generated_at": report.generated_at.to_rfc3339(),
        "threshold": report.threshold,
        "passed": report.passed,
        "drifted": report.drifted_features().join(", "),
        "rows": rows,
    });

    let handlebars = Handlebars::new();
    Ok(handlebars.render_template(DRIFT_TEMPLATE, &context)?)
}

/// Пишет отчёт, заменяя предыдущий файл по тому же пути
pub fn write_drift_report(report: &DriftReport, path: &Path) -> Result<()> {
    let html = render_drift_report(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    tracing::info!("Drift report written to '{}'", path.display());
    Ok(())
}
