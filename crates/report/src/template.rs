use std::collections::HashMap;

/// Built-in template used when no custom template exists in the Archive at
/// `reports/templates/base.html`.
pub const BUILTIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Test run {{ run_id }}</title>
</head>
<body>
<h1>{{ service_name }} &mdash; {{ run_status }}</h1>
<dl>
  <dt>Run ID</dt><dd>{{ run_id }}</dd>
  <dt>Started</dt><dd>{{ started_at }}</dd>
  <dt>Verified</dt><dd>{{ verified_at }}</dd>
  <dt>Matched</dt><dd>{{ matched_count }} / {{ total_expected }}</dd>
  <dt>Missing</dt><dd>{{ missing_count }}</dd>
  <dt>Unexpected</dt><dd>{{ unexpected_count }}</dd>
</dl>
<h2>Matched</h2>
<table>{{ matched_rows }}</table>
<h2>Missing</h2>
<table>{{ missing_rows }}</table>
<h2>Unexpected</h2>
<table>{{ unexpected_rows }}</table>
</body>
</html>
"#;

/// Substitutes every `{{ token }}` occurrence (whitespace around the token
/// name is ignored) with its value from `tokens`. An unrecognised token is
/// left in place rather than erroring — the renderer favours an
/// incomplete-looking report over a panic on a custom template that was
/// hand-edited incorrectly.
#[must_use]
pub fn render(template: &str, tokens: &HashMap<&str, String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            output.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let key = after_open[..end].trim();
        match tokens.get(key) {
            Some(value) => output.push_str(value),
            None => {
                output.push_str("{{ ");
                output.push_str(key);
                output.push_str(" }}");
            }
        }
        rest = &after_open[end + 2..];
    }
    output.push_str(rest);
    output
}
