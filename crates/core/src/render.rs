//! HTML rendering.
//!
//! All pages and fragments are produced here, through [`HtmlBuf`]: markup
//! goes in via [`HtmlBuf::raw`] (static, trusted strings only) and every
//! user- or server-supplied value goes in via [`HtmlBuf::text`], which
//! escapes. No call site interpolates an untrusted value into markup
//! directly; that is the whole XSS contract, enforced in one place.

use mrp_types::{AnalysisResult, EncounterInfo, Insight, PatientInfo, Theme};

use crate::view::{build_sections, Section};

/// Escapes a string for insertion into HTML text or attribute content.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Accumulates an HTML document or fragment.
///
/// `raw` is for markup literals; `text` is the only way values reach the
/// output, and it always escapes.
pub struct HtmlBuf {
    out: String,
}

impl HtmlBuf {
    pub fn new() -> Self {
        Self { out: String::new() }
    }

    /// Appends trusted markup verbatim.
    pub fn raw(&mut self, markup: &str) -> &mut Self {
        self.out.push_str(markup);
        self
    }

    /// Appends untrusted content, escaped.
    pub fn text(&mut self, content: &str) -> &mut Self {
        self.out.push_str(&escape(content));
        self
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl Default for HtmlBuf {
    fn default() -> Self {
        Self::new()
    }
}

const STYLE: &str = r#"
:root { --bg:#f4f6f8; --card:#ffffff; --border:#d8dee4; --text:#1c2430;
  --dim:#5b6775; --accent:#0a6cbd; --danger:#b3261e; --warn:#9a6700;
  --badge:#eef2f6; }
[data-theme="dark"] { --bg:#11161c; --card:#1a222c; --border:#2c3643;
  --text:#e6ebf0; --dim:#93a1b0; --accent:#4da3e8; --danger:#f28b82;
  --warn:#e3b341; --badge:#242f3b; }
* { box-sizing:border-box; }
body { margin:0; background:var(--bg); color:var(--text);
  font-family:system-ui,-apple-system,"Segoe UI",Roboto,sans-serif;
  line-height:1.5; }
header { display:flex; align-items:center; justify-content:space-between;
  padding:0.9rem 1.5rem; border-bottom:1px solid var(--border);
  background:var(--card); }
header .brand { font-weight:700; font-size:1.1rem; }
main { max-width:960px; margin:0 auto; padding:1.5rem; }
section, .card { background:var(--card); border:1px solid var(--border);
  border-radius:10px; padding:1.1rem 1.3rem; margin-bottom:1.1rem; }
h2 { margin:0 0 0.6rem; font-size:1.05rem; }
table { width:100%; border-collapse:collapse; }
th, td { text-align:left; padding:0.4rem 0.6rem;
  border-bottom:1px solid var(--border); vertical-align:top; }
th { color:var(--dim); font-size:0.82rem; text-transform:uppercase; }
ul { margin:0; padding-left:1.2rem; }
.badge { display:inline-block; padding:0.05rem 0.5rem; border-radius:999px;
  background:var(--badge); font-size:0.75rem; font-weight:600;
  margin-left:0.4rem; }
.badge.priority-high { color:var(--danger); }
.badge.priority-medium { color:var(--warn); }
.badge.priority-low { color:var(--accent); }
.grid { display:grid; grid-template-columns:repeat(auto-fill,minmax(240px,1fr));
  gap:0.9rem; }
.grid .card { margin:0; }
.cols { display:grid; grid-template-columns:1fr 1fr; gap:0.2rem 1.4rem; }
.cols dt { color:var(--dim); font-size:0.8rem; }
.cols dd { margin:0 0 0.5rem; }
.notice { text-align:center; color:var(--dim); padding:2.5rem 1rem; }
.error { border-color:var(--danger); color:var(--danger); }
.toolbar { display:flex; gap:0.6rem; margin-bottom:1.1rem; }
button, .button { cursor:pointer; border:1px solid var(--border);
  border-radius:8px; padding:0.45rem 0.9rem; background:var(--card);
  color:var(--text); font:inherit; }
button.primary { background:var(--accent); border-color:var(--accent);
  color:#fff; }
button:disabled { opacity:0.55; cursor:wait; }
input, textarea { width:100%; padding:0.5rem 0.6rem; margin:0.25rem 0 0.9rem;
  border:1px solid var(--border); border-radius:8px; background:var(--bg);
  color:var(--text); font:inherit; }
label { font-size:0.85rem; color:var(--dim); }
.dropzone { border:2px dashed var(--border); border-radius:10px;
  padding:1.6rem; text-align:center; color:var(--dim); cursor:pointer;
  margin-bottom:0.9rem; }
.dropzone.active { border-color:var(--accent); color:var(--accent); }
#progress { position:fixed; inset:0; display:none; align-items:center;
  justify-content:center; background:rgba(0,0,0,0.45); color:#fff;
  font-size:1.1rem; }
#progress.visible { display:flex; }
pre { white-space:pre-wrap; word-break:break-word; background:var(--bg);
  padding:0.8rem; border-radius:8px; }
details summary { cursor:pointer; font-weight:600; }
.snippets { color:var(--dim); font-size:0.8rem; margin-top:0.5rem; }
@media print { header, .toolbar, form { display:none; } }
"#;

fn page(title: &str, theme: Theme, body: &str, script: &str) -> String {
    let mut html = HtmlBuf::new();
    html.raw("<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"");
    html.raw(theme.as_str());
    html.raw("\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.raw("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>");
    html.text(title);
    html.raw("</title>\n<style>");
    html.raw(STYLE);
    html.raw("</style>\n</head>\n<body>\n<header>\n<span class=\"brand\">Medical Report Portal</span>\n");
    html.raw("<form method=\"post\" action=\"/theme\"><button type=\"submit\" title=\"Toggle theme\">");
    html.raw(match theme {
        Theme::Light => "Dark mode",
        Theme::Dark => "Light mode",
    });
    html.raw("</button></form>\n</header>\n<main>\n");
    html.raw(body);
    html.raw("\n</main>\n");
    if !script.is_empty() {
        html.raw("<script>");
        html.raw(script);
        html.raw("</script>\n");
    }
    html.raw("</body>\n</html>\n");
    html.into_string()
}

const LANDING_SCRIPT: &str = r#"
const zone = document.getElementById('dropzone');
const input = document.getElementById('file-input');
const label = document.getElementById('file-label');
zone.addEventListener('click', () => input.click());
zone.addEventListener('dragover', (e) => { e.preventDefault(); zone.classList.add('active'); });
zone.addEventListener('dragleave', () => zone.classList.remove('active'));
zone.addEventListener('drop', (e) => {
  e.preventDefault();
  zone.classList.remove('active');
  if (e.dataTransfer.files.length) { input.files = e.dataTransfer.files; showName(); }
});
input.addEventListener('change', showName);
function showName() {
  if (input.files.length) label.textContent = input.files[0].name;
}
document.getElementById('upload-form').addEventListener('submit', () => {
  document.getElementById('progress').classList.add('visible');
});
const askForm = document.getElementById('ask-form');
askForm.addEventListener('submit', async (e) => {
  e.preventDefault();
  const button = document.getElementById('ask-button');
  const panel = document.getElementById('answer-panel');
  button.disabled = true;
  try {
    const body = {
      patient_id: document.getElementById('ask-patient').value || null,
      question: document.getElementById('ask-question').value,
      top_k: document.getElementById('ask-topk').value
    };
    const res = await fetch('/query', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(body)
    });
    if (res.status !== 204) panel.innerHTML = await res.text();
  } catch (err) {
    console.error(err);
  } finally {
    button.disabled = false;
  }
});
"#;

/// Renders the landing page: upload form plus Q&A form, with an optional
/// inline error from a failed upload attempt.
pub fn render_landing(theme: Theme, flash: Option<&str>) -> String {
    let mut body = HtmlBuf::new();
    if let Some(message) = flash {
        body.raw("<section class=\"error\" role=\"alert\">");
        body.text(message);
        body.raw("</section>\n");
    }
    body.raw(concat!(
        "<section>\n<h2>Analyse a medical report</h2>\n",
        "<form id=\"upload-form\" method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n",
        "<div id=\"dropzone\" class=\"dropzone\"><span id=\"file-label\">",
        "Drop a PDF, JPEG or PNG here, or click to choose</span></div>\n",
        "<input id=\"file-input\" type=\"file\" name=\"file\" ",
        "accept=\".pdf,.jpg,.jpeg,.png\" hidden>\n",
        "<label for=\"upload-patient\">Patient ID (optional)</label>\n",
        "<input id=\"upload-patient\" name=\"patient_id\" ",
        "placeholder=\"e.g. P-1042\">\n",
        "<button class=\"primary\" type=\"submit\">Analyse report</button>\n",
        "</form>\n</section>\n",
        "<section>\n<h2>Ask about a patient</h2>\n",
        "<form id=\"ask-form\">\n",
        "<label for=\"ask-question\">Question</label>\n",
        "<textarea id=\"ask-question\" rows=\"3\"></textarea>\n",
        "<label for=\"ask-patient\">Patient ID (optional)</label>\n",
        "<input id=\"ask-patient\">\n",
        "<label for=\"ask-topk\">Context snippets</label>\n",
        "<input id=\"ask-topk\" value=\"5\">\n",
        "<button id=\"ask-button\" class=\"primary\" type=\"submit\">Ask</button>\n",
        "</form>\n<div id=\"answer-panel\"></div>\n</section>\n",
        "<div id=\"progress\">Analysing report&hellip;</div>"
    ));
    page(
        "Medical Report Portal",
        theme,
        &body.into_string(),
        LANDING_SCRIPT,
    )
}

const RESULTS_SCRIPT: &str = r#"
document.getElementById('print-button').addEventListener('click', () => window.print());
document.getElementById('copy-button').addEventListener('click', async () => {
  try {
    await navigator.clipboard.writeText(document.getElementById('raw-json').textContent);
    flash('copy-button', 'Copied');
  } catch (err) { console.error(err); }
});
document.getElementById('share-button').addEventListener('click', async () => {
  try {
    if (navigator.share) {
      await navigator.share({ title: document.title, url: window.location.href });
    } else {
      await navigator.clipboard.writeText(window.location.href);
      flash('share-button', 'Link copied');
    }
  } catch (err) { console.error(err); }
});
function flash(id, label) {
  const el = document.getElementById(id);
  const old = el.textContent;
  el.textContent = label;
  setTimeout(() => { el.textContent = old; }, 1500);
}
const askForm = document.getElementById('ask-form');
if (askForm) askForm.addEventListener('submit', async (e) => {
  e.preventDefault();
  const button = document.getElementById('ask-button');
  const panel = document.getElementById('answer-panel');
  button.disabled = true;
  try {
    const body = {
      patient_id: document.getElementById('ask-patient').value || null,
      question: document.getElementById('ask-question').value,
      top_k: document.getElementById('ask-topk').value
    };
    const res = await fetch('/query', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(body)
    });
    if (res.status !== 204) panel.innerHTML = await res.text();
  } catch (err) {
    console.error(err);
  } finally {
    button.disabled = false;
  }
});
"#;

/// Renders the results page for a deserialised analysis document.
///
/// `raw_json` is the pretty-printed original payload, embedded for the
/// copy-to-clipboard action.
pub fn render_results(theme: Theme, result: &AnalysisResult, raw_json: &str) -> String {
    let mut body = HtmlBuf::new();

    body.raw("<div class=\"toolbar\">\n");
    body.raw("<button id=\"print-button\">Print</button>\n");
    body.raw("<button id=\"copy-button\">Copy JSON</button>\n");
    body.raw("<button id=\"share-button\">Share</button>\n");
    body.raw("<a class=\"button\" href=\"/\">New upload</a>\n</div>\n");

    body.raw("<section>\n<h2>Report</h2>\n<p>");
    body.text(&result.filename);
    if let Some(patient_id) = result.patient_id.as_deref() {
        body.raw(" &middot; Patient ");
        body.text(patient_id);
    }
    body.raw("</p>\n</section>\n");

    for section in build_sections(result) {
        render_section(&mut body, &section);
    }

    render_ask_panel(&mut body, result.patient_id.as_deref());

    body.raw("<pre id=\"raw-json\" hidden>");
    body.text(raw_json);
    body.raw("</pre>");

    page(
        "Analysis Results",
        theme,
        &body.into_string(),
        RESULTS_SCRIPT,
    )
}

/// Renders the notice shown when no analysis has been stored yet.
pub fn render_no_results(theme: Theme) -> String {
    let body = concat!(
        "<section class=\"notice\">\n",
        "<p>No analysis results found.</p>\n",
        "<p><a class=\"button\" href=\"/\">Upload a report</a></p>\n",
        "</section>"
    );
    page("Analysis Results", theme, body, "")
}

/// Renders a generic error page (used when a stored document cannot be
/// read back).
pub fn render_error_page(theme: Theme, message: &str) -> String {
    let mut body = HtmlBuf::new();
    body.raw("<section class=\"error\" role=\"alert\"><p>");
    body.text(message);
    body.raw("</p><p><a class=\"button\" href=\"/\">Upload a report</a></p></section>");
    page("Analysis Results", theme, &body.into_string(), "")
}

/// Renders the answer fragment injected into the Q&A panel.
pub fn render_answer_panel(answer: &str, snippets_used: u32) -> String {
    let mut html = HtmlBuf::new();
    html.raw("<div class=\"card\"><p>");
    html.text(answer);
    html.raw("</p><p class=\"snippets\">Based on ");
    html.text(&snippets_used.to_string());
    html.raw(" context snippet(s)</p></div>");
    html.into_string()
}

/// Renders the error fragment injected into the Q&A panel.
pub fn render_query_error(message: &str) -> String {
    let mut html = HtmlBuf::new();
    html.raw("<div class=\"card error\" role=\"alert\">");
    html.text(message);
    html.raw("</div>");
    html.into_string()
}

fn render_ask_panel(body: &mut HtmlBuf, patient_id: Option<&str>) {
    body.raw(concat!(
        "<section>\n<h2>Ask about this report</h2>\n",
        "<form id=\"ask-form\">\n",
        "<label for=\"ask-question\">Question</label>\n",
        "<textarea id=\"ask-question\" rows=\"3\"></textarea>\n",
        "<label for=\"ask-patient\">Patient ID</label>\n",
        "<input id=\"ask-patient\" value=\""
    ));
    body.text(patient_id.unwrap_or(""));
    body.raw(concat!(
        "\">\n<label for=\"ask-topk\">Context snippets</label>\n",
        "<input id=\"ask-topk\" value=\"5\">\n",
        "<button id=\"ask-button\" class=\"primary\" type=\"submit\">Ask</button>\n",
        "</form>\n<div id=\"answer-panel\"></div>\n</section>\n"
    ));
}

fn render_section(body: &mut HtmlBuf, section: &Section<'_>) {
    match section {
        Section::Patient { patient, encounter } => {
            render_patient(body, patient, *encounter);
        }
        Section::Summary(summary) => {
            body.raw("<section>\n<h2>Clinical Summary</h2>\n<p>");
            body.text(summary);
            body.raw("</p>\n</section>\n");
        }
        Section::Table {
            title,
            headers,
            rows,
        } => {
            body.raw("<section>\n<h2>");
            body.raw(title);
            body.raw("</h2>\n<table>\n<thead><tr>");
            for header in headers {
                body.raw("<th>");
                body.raw(header);
                body.raw("</th>");
            }
            body.raw("</tr></thead>\n<tbody>\n");
            for row in *rows {
                body.raw("<tr><td>");
                body.text(row.name.as_deref().unwrap_or(""));
                body.raw("</td><td>");
                body.text(row.display_value());
                body.raw("</td><td>");
                body.text(row.display_unit());
                body.raw("</td><td>");
                body.text(row.notes.as_deref().unwrap_or(""));
                if let Some(flag) = row.flag.as_deref() {
                    body.raw("<span class=\"badge\">");
                    body.text(&flag.to_uppercase());
                    body.raw("</span>");
                }
                body.raw("</td></tr>\n");
            }
            body.raw("</tbody>\n</table>\n</section>\n");
        }
        Section::List { title, items } => {
            body.raw("<section>\n<h2>");
            body.raw(title);
            body.raw("</h2>\n<ul>\n");
            for item in *items {
                body.raw("<li>");
                body.text(item);
                body.raw("</li>\n");
            }
            body.raw("</ul>\n</section>\n");
        }
        Section::Lifestyle(entries) => {
            body.raw("<section>\n<h2>Lifestyle Recommendations</h2>\n<div class=\"grid\">\n");
            for entry in *entries {
                body.raw("<div class=\"card\"><h3>");
                body.text(entry.category.as_deref().unwrap_or(""));
                body.raw("</h3><p>");
                body.text(entry.suggestion.as_deref().unwrap_or(""));
                body.raw("</p></div>\n");
            }
            body.raw("</div>\n</section>\n");
        }
        Section::Disclaimer(disclaimer) => {
            body.raw("<section class=\"notice\">");
            body.text(disclaimer);
            body.raw("</section>\n");
        }
        Section::ExtractedText(text) => {
            body.raw("<section>\n<details><summary>Extracted text</summary>\n<pre>");
            body.text(text);
            body.raw("</pre>\n</details>\n</section>\n");
        }
        Section::Insights(insights) => {
            body.raw("<section>\n<h2>Health Insights</h2>\n<div class=\"grid\">\n");
            for insight in *insights {
                render_insight(body, insight);
            }
            body.raw("</div>\n</section>\n");
        }
    }
}

fn render_patient(body: &mut HtmlBuf, patient: &PatientInfo, encounter: Option<&EncounterInfo>) {
    body.raw("<section>\n<h2>Patient Information</h2>\n<dl class=\"cols\">\n");
    render_field(body, "Name", patient.name.as_deref());
    render_field(body, "Age", patient.age.as_deref());
    render_field(body, "Sex", patient.sex.as_deref());
    render_field(body, "UHID", patient.uhid.as_deref());
    render_field(body, "MRN", patient.mrn.as_deref());
    if let Some(encounter) = encounter {
        render_field(body, "Admitted", encounter.admission_date.as_deref());
        render_field(body, "Discharged", encounter.discharge_date.as_deref());
        render_field(body, "Department", encounter.department.as_deref());
        render_field(body, "Discharge type", encounter.discharge_type.as_deref());
    }
    body.raw("</dl>\n</section>\n");
}

fn render_field(body: &mut HtmlBuf, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        body.raw("<dt>");
        body.raw(label);
        body.raw("</dt><dd>");
        body.text(value);
        body.raw("</dd>\n");
    }
}

fn render_insight(body: &mut HtmlBuf, insight: &Insight) {
    body.raw("<div class=\"card\"><h3>");
    body.text(&insight.category);
    body.raw("<span class=\"badge priority-");
    body.raw(&priority_class(&insight.priority));
    body.raw("\">");
    body.text(&insight.priority);
    body.raw("</span></h3><p>");
    body.text(&insight.recommendation);
    body.raw("</p></div>\n");
}

/// Derives a CSS class suffix from a free-form priority label: lower-cased
/// and restricted to ASCII alphanumerics so arbitrary input cannot break
/// out of the attribute.
fn priority_class(priority: &str) -> String {
    let class: String = priority
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if class.is_empty() {
        "none".to_string()
    } else {
        class
    }
}
