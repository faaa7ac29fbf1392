//! HTML structure summary used as selector hints for Selenium generation.

use std::path::Path;

use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AgentError, Result};

/// Selector hints for one element.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ElementSelector {
    pub id: Option<String>,
    pub name: Option<String>,
    /// `#id`, else `tag.class1.class2`, else `tag`.
    pub css: String,
    /// `//*[@id='..']`, else `//tag[@name='..']`, else `//tag`.
    pub xpath: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputField {
    pub input_type: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    pub selector: ElementSelector,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Button {
    pub tag: String,
    pub text: String,
    pub id: Option<String>,
    pub selector: ElementSelector,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PageSummary {
    pub title: Option<String>,
    pub total_inputs: usize,
    pub total_buttons: usize,
    pub total_forms: usize,
    pub total_links: usize,
    pub total_images: usize,
    pub has_javascript: bool,
}

/// Parsed page with extraction helpers.
pub struct HtmlAnalyzer {
    doc: Html,
}

impl HtmlAnalyzer {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// Reads and parses a page from disk (invalid UTF-8 is replaced).
    ///
    /// # Errors
    /// `NotFound` when `path` does not exist, `Io` on read failures.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AgentError::NotFound(format!("HTML file {}", path.display())));
            }
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), bytes = bytes.len(), "HTML page loaded");
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.doc.root_element().descendants().filter_map(ElementRef::wrap)
    }

    fn named<'a>(&'a self, tag: &'static str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.elements().filter(move |e| e.value().name() == tag)
    }

    pub fn inputs(&self) -> Vec<InputField> {
        let out: Vec<InputField> = self
            .named("input")
            .map(|e| {
                let el = e.value();
                InputField {
                    input_type: el.attr("type").unwrap_or("text").to_string(),
                    id: attr(&e, "id"),
                    name: attr(&e, "name"),
                    placeholder: attr(&e, "placeholder"),
                    required: el.attr("required").is_some(),
                    selector: selector_for(&e),
                }
            })
            .collect();
        debug!(count = out.len(), "input elements found");
        out
    }

    /// `<button>` elements plus `<input type="button|submit">`.
    pub fn buttons(&self) -> Vec<Button> {
        self.elements()
            .filter(|e| is_button(e))
            .map(|e| {
                let tag = e.value().name().to_string();
                let text = if tag == "button" {
                    collapse(&e.text().collect::<String>())
                } else {
                    e.value().attr("value").unwrap_or_default().trim().to_string()
                };
                Button {
                    tag,
                    text,
                    id: attr(&e, "id"),
                    selector: selector_for(&e),
                }
            })
            .collect()
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            title: self
                .named("title")
                .next()
                .map(|t| collapse(&t.text().collect::<String>()))
                .filter(|t| !t.is_empty()),
            total_inputs: self.named("input").count(),
            total_buttons: self.elements().filter(is_button).count(),
            total_forms: self.named("form").count(),
            total_links: self.named("a").count(),
            total_images: self.named("img").count(),
            has_javascript: self.named("script").next().is_some(),
        }
    }

    /// Text block for the Selenium prompt: summary, input fields and buttons.
    pub fn selenium_context(&self) -> String {
        let s = self.summary();
        let mut lines = vec![
            "=== PAGE SUMMARY ===".to_string(),
            format!("title: {}", s.title.as_deref().unwrap_or("-")),
            format!("total_inputs: {}", s.total_inputs),
            format!("total_buttons: {}", s.total_buttons),
            format!("total_forms: {}", s.total_forms),
            format!("total_links: {}", s.total_links),
            format!("total_images: {}", s.total_images),
            format!("has_javascript: {}", s.has_javascript),
        ];

        let inputs = self.inputs();
        if !inputs.is_empty() {
            lines.push(String::new());
            lines.push("=== INPUT FIELDS ===".into());
            for i in &inputs {
                let sel = i.selector.id.as_ref().or(i.selector.name.as_ref()).unwrap_or(&i.selector.css);
                lines.push(format!(
                    "- {} input: id='{}', name='{}', selector='{}'",
                    i.input_type,
                    i.id.as_deref().unwrap_or("-"),
                    i.name.as_deref().unwrap_or("-"),
                    sel
                ));
            }
        }

        let buttons = self.buttons();
        if !buttons.is_empty() {
            lines.push(String::new());
            lines.push("=== BUTTONS ===".into());
            for b in &buttons {
                let sel = b.selector.id.as_ref().unwrap_or(&b.selector.css);
                lines.push(format!(
                    "- Button '{}': id='{}', selector='{}'",
                    b.text,
                    b.id.as_deref().unwrap_or("-"),
                    sel
                ));
            }
        }
        lines.join("\n")
    }
}

fn is_button(e: &ElementRef<'_>) -> bool {
    match e.value().name() {
        "button" => true,
        "input" => matches!(e.value().attr("type"), Some("button" | "submit")),
        _ => false,
    }
}

fn attr(e: &ElementRef<'_>, name: &str) -> Option<String> {
    e.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn selector_for(e: &ElementRef<'_>) -> ElementSelector {
    let tag = e.value().name();
    let id = attr(e, "id");
    let name = attr(e, "name");
    let classes: Vec<&str> = e.value().classes().collect();

    let css = match (&id, classes.is_empty()) {
        (Some(id), _) => format!("#{id}"),
        (None, false) => format!("{tag}.{}", classes.join(".")),
        (None, true) => tag.to_string(),
    };
    let xpath = match (&id, &name) {
        (Some(id), _) => format!("//*[@id='{id}']"),
        (None, Some(n)) => format!("//{tag}[@name='{n}']"),
        (None, None) => format!("//{tag}"),
    };
    ElementSelector { id, name, css, xpath }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Checkout</title><script>init()</script></head>
<body>
  <form id="checkout">
    <input type="text" id="username" name="username" required>
    <input type="email" name="email" class="field wide">
    <input type="submit" value="Pay now">
    <button id="apply-discount" type="button">Apply <b>Code</b></button>
  </form>
  <a href="/help">Help</a>
  <button class="btn primary">Cancel</button>
</body></html>"#;

    #[test]
    fn summary_counts() {
        let s = HtmlAnalyzer::parse(PAGE).summary();
        assert_eq!(s.title.as_deref(), Some("Checkout"));
        assert_eq!(s.total_inputs, 3);
        assert_eq!(s.total_buttons, 3);
        assert_eq!(s.total_forms, 1);
        assert_eq!(s.total_links, 1);
        assert!(s.has_javascript);
    }

    #[test]
    fn selectors_prefer_id_then_name_then_classes() {
        let a = HtmlAnalyzer::parse(PAGE);
        let inputs = a.inputs();
        assert_eq!(inputs[0].selector.css, "#username");
        assert!(inputs[0].required);
        assert_eq!(inputs[1].selector.css, "input.field.wide");
        assert_eq!(inputs[1].selector.xpath, "//input[@name='email']");

        let buttons = a.buttons();
        assert_eq!(buttons[0].text, "Pay now");
        assert_eq!(buttons[1].text, "Apply Code");
        assert_eq!(buttons[2].selector.css, "button.btn.primary");
    }

    #[test]
    fn selenium_context_layout() {
        let ctx = HtmlAnalyzer::parse(PAGE).selenium_context();
        assert!(ctx.starts_with("=== PAGE SUMMARY ===\ntitle: Checkout\n"));
        assert!(ctx.contains("=== INPUT FIELDS ===\n- text input: id='username', name='username', selector='username'"));
        assert!(ctx.contains("- email input: id='-', name='email', selector='email'"));
        assert!(ctx.contains("=== BUTTONS ===\n- Button 'Pay now': id='-', selector='input'"));
        assert!(ctx.contains("- Button 'Apply Code': id='apply-discount', selector='apply-discount'"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = HtmlAnalyzer::load(Path::new("/definitely/not/here.html")).await.err();
        assert!(matches!(err, Some(AgentError::NotFound(_))));
    }
}
