use super::Renderer;
use crate::error::{Error, Result};
use crate::interfaces::{FlatRow, Output};
use crate::resolver::ModuleDescriptor;

/// Rendered in place of an empty table
pub const NO_DATA: &str = "No data available.";

const CSV_DELIMITER: &str = ";";

/// Flat rows of the module's own result inside the wrapped output
fn flat_rows(descriptor: &ModuleDescriptor, output: &Output) -> Result<Vec<FlatRow>> {
    let result = module_result(descriptor, output)?;
    descriptor.module_type.flat_output(result).ok_or_else(|| {
        Error::Render(format!(
            "module {} does not support flat output",
            descriptor.name
        ))
    })
}

fn module_result<'o>(descriptor: &ModuleDescriptor, output: &'o Output) -> Result<&'o Output> {
    output
        .get(&descriptor.name)
        .and_then(|value| value.as_object())
        .ok_or_else(|| Error::Render(format!("output holds no result for {}", descriptor.name)))
}

/// Column names, taken from the first row
fn headers(rows: &[FlatRow]) -> Vec<&str> {
    rows.first()
        .map(|row| row.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// `;`-separated values with a header line
#[derive(Debug)]
pub struct CsvRenderer<'a> {
    descriptor: &'a ModuleDescriptor,
}

impl<'a> CsvRenderer<'a> {
    pub fn new(descriptor: &'a ModuleDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Renderer for CsvRenderer<'_> {
    fn content_type(&self) -> &'static str {
        "text/csv"
    }

    fn render(&self, output: &Output) -> Result<Vec<u8>> {
        let rows = flat_rows(self.descriptor, output)?;
        if rows.is_empty() {
            return Ok(NO_DATA.as_bytes().to_vec());
        }

        let headers = headers(&rows);
        let mut csv = csv_line(headers.iter().copied());
        for row in &rows {
            csv.push_str(&csv_line(
                headers
                    .iter()
                    .map(|h| row.get(*h).map(String::as_str).unwrap_or_default()),
            ));
        }
        Ok(csv.into_bytes())
    }
}

fn csv_line<'s>(cells: impl Iterator<Item = &'s str>) -> String {
    let mut line = cells.map(csv_cell).collect::<Vec<_>>().join(CSV_DELIMITER);
    line.push_str("\r\n");
    line
}

fn csv_cell(cell: &str) -> String {
    if cell.contains(CSV_DELIMITER) || cell.contains(['"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Generic striped HTML table, unless the module renders its own HTML
#[derive(Debug)]
pub struct HtmlRenderer<'a> {
    descriptor: &'a ModuleDescriptor,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(descriptor: &'a ModuleDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Renderer for HtmlRenderer<'_> {
    fn content_type(&self) -> &'static str {
        "text/html"
    }

    fn render(&self, output: &Output) -> Result<Vec<u8>> {
        let result = module_result(self.descriptor, output)?;
        let custom = self
            .descriptor
            .module_type
            .html_output(result)
            .map_err(|e| Error::Render(format!("{}: {e:#}", self.descriptor.name)))?;
        if let Some(html) = custom {
            return Ok(html.into_bytes());
        }

        let rows = flat_rows(self.descriptor, output)?;
        if rows.is_empty() {
            return Ok(format!("<p>{NO_DATA}</p>").into_bytes());
        }

        let headers = headers(&rows);
        let mut html = String::from("<table class='table table-striped'>\n<thead><tr>");
        for header in &headers {
            html.push_str(&format!("<th>{}</th>", escape(header)));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in &rows {
            html.push_str("<tr>");
            for header in &headers {
                let cell = row.get(*header).map(String::as_str).unwrap_or_default();
                html.push_str(&format!("<td>{}</td>", escape(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>");
        Ok(html.into_bytes())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{ExecutionContext, Module, ModuleType};
    use crate::resolver::{BuiltinCatalogue, Resolver};
    use crate::schema::{BoundArguments, Schema, SchemaError};
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct Report;

    impl ModuleType for Report {
        fn help(&self) -> &str {
            "report with custom html"
        }

        fn schema(&self) -> std::result::Result<Schema, SchemaError> {
            Ok(Schema::empty())
        }

        fn instantiate(&self, _args: BoundArguments, _context: ExecutionContext) -> Box<dyn Module> {
            unimplemented!("rendering tests never run the module")
        }

        fn html_output(&self, output: &Output) -> anyhow::Result<Option<String>> {
            Ok(Some(format!("<b>{}</b>", output.len())))
        }
    }

    fn descriptor(name: &str) -> ModuleDescriptor {
        let mut builtins = BuiltinCatalogue::standard().unwrap();
        builtins.register("report", Arc::new(Report)).unwrap();
        Resolver::new(builtins, Vec::new()).unwrap().resolve(name).unwrap()
    }

    fn wrapped(name: &str, result: Value) -> Output {
        let mut output = Output::new();
        output.insert(name.to_string(), result);
        output
    }

    fn echo_output(input: Value) -> Output {
        wrapped("builtin.echo", json!({ "input": input }))
    }

    #[test]
    fn test_csv() {
        let descriptor = descriptor("builtin.echo");
        let output = echo_output(json!([
            {"name": "alice", "note": "a;b"},
            {"name": "bob \"b\"", "note": ""}
        ]));
        let csv = CsvRenderer::new(&descriptor).render(&output).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "name;note\r\nalice;\"a;b\"\r\n\"bob \"\"b\"\"\";\r\n"
        );
    }

    #[test]
    fn test_html_escapes_cells() {
        let descriptor = descriptor("builtin.echo");
        let output = echo_output(json!([{"tag": "<script>"}]));
        let html = String::from_utf8(HtmlRenderer::new(&descriptor).render(&output).unwrap()).unwrap();
        insta::assert_snapshot!(html, @r"
        <table class='table table-striped'>
        <thead><tr><th>tag</th></tr></thead>
        <tbody>
        <tr><td>&lt;script&gt;</td></tr>
        </tbody>
        </table>
        ");
    }

    #[test]
    fn test_empty_rows() {
        let descriptor = descriptor("builtin.sample");
        let output = wrapped("builtin.sample", json!({"test": "x", "other": null}));
        let csv = CsvRenderer::new(&descriptor).render(&output).unwrap();
        assert_eq!(csv, NO_DATA.as_bytes());
        let html = HtmlRenderer::new(&descriptor).render(&output).unwrap();
        assert_eq!(String::from_utf8(html).unwrap(), "<p>No data available.</p>");
    }

    #[test]
    fn test_module_html_takes_precedence() {
        let descriptor = descriptor("builtin.report");
        let output = wrapped("builtin.report", json!({"a": 1, "b": 2}));
        let html = HtmlRenderer::new(&descriptor).render(&output).unwrap();
        assert_eq!(html, b"<b>2</b>");
        assert!(matches!(
            CsvRenderer::new(&descriptor).render(&output),
            Err(Error::Render(_))
        ));
    }

    #[test]
    fn test_missing_result_is_render_error() {
        let descriptor = descriptor("builtin.echo");
        let output = wrapped("builtin.sample", json!({}));
        assert!(matches!(
            CsvRenderer::new(&descriptor).render(&output),
            Err(Error::Render(_))
        ));
    }
}
