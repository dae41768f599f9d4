//! JavaScript generation for element queries
//!
//! This module builds the self-contained scripts the page driver evaluates
//! to locate elements and act on them. Each script re-runs the query against
//! the live DOM, so results always reflect the current page state.

use crate::engine::query::{ElementQuery, QueryKind};
use crate::error::Result;

/// Shared helpers embedded at the top of every query script.
///
/// Roles and accessible names follow the common implicit-role mapping;
/// visibility means rendered with a non-zero box, independent of scroll
/// position.
const HELPERS: &str = r#"
const SKIP_TAGS = new Set(['SCRIPT','STYLE','NOSCRIPT','TEMPLATE','META','LINK','HEAD','TITLE']);
const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();

function getInputRole(el) {
    const type = (el.getAttribute('type') || 'text').toLowerCase();
    const map = {'text':'textbox','email':'textbox','password':'textbox','search':'searchbox','tel':'textbox','url':'textbox','number':'spinbutton','checkbox':'checkbox','radio':'radio','submit':'button','reset':'button','button':'button','range':'slider'};
    return map[type] || 'textbox';
}

function getRole(el) {
    const explicit = el.getAttribute('role');
    if (explicit) return explicit.toLowerCase();
    const tag = el.tagName.toUpperCase();
    const roleMap = {
        'A': el.hasAttribute('href') ? 'link' : 'generic',
        'BUTTON': 'button', 'INPUT': getInputRole(el), 'SELECT': 'combobox', 'TEXTAREA': 'textbox', 'IMG': 'img',
        'H1':'heading','H2':'heading','H3':'heading','H4':'heading','H5':'heading','H6':'heading',
        'NAV':'navigation','MAIN':'main','HEADER':'banner','FOOTER':'contentinfo','ASIDE':'complementary',
        'FORM':'form','TABLE':'table','UL':'list','OL':'list','LI':'listitem',
        'DETAILS':'group','SUMMARY':'button','DIALOG':'dialog'
    };
    return roleMap[tag] || 'generic';
}

function accName(el) {
    const labelledby = el.getAttribute('aria-labelledby');
    if (labelledby) {
        const parts = labelledby.split(/\s+/)
            .map((id) => document.getElementById(id))
            .filter(Boolean)
            .map((ref) => norm(ref.textContent));
        if (parts.length) return parts.join(' ');
    }
    const direct = el.getAttribute('aria-label') || el.getAttribute('title') || el.getAttribute('placeholder');
    if (direct) return norm(direct);
    if (el.id) {
        const label = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
        if (label) return norm(label.textContent);
    }
    const tag = el.tagName.toUpperCase();
    if (tag === 'IMG') return norm(el.getAttribute('alt') || '');
    return norm(el.textContent || '');
}

function isVisible(el) {
    const rect = el.getBoundingClientRect();
    if (rect.width <= 0 || rect.height <= 0) return false;
    return getComputedStyle(el).visibility !== 'hidden';
}

function isDisabled(el) {
    if (el.disabled === true) return true;
    if (el.getAttribute('aria-disabled') === 'true') return true;
    let parent = el.parentElement;
    while (parent) {
        if (parent.tagName === 'FIELDSET' && parent.disabled) return true;
        parent = parent.parentElement;
    }
    return false;
}

function snap(el) {
    const rect = el.getBoundingClientRect();
    const attrs = {};
    for (const a of el.attributes) attrs[a.name] = a.value;
    const role = getRole(el);
    const name = accName(el);
    return {
        tag: el.tagName.toLowerCase(),
        role: role === 'generic' ? null : role,
        name: name || null,
        text: norm(el.textContent || ''),
        value: ('value' in el && typeof el.value === 'string') ? el.value : null,
        visible: isVisible(el),
        disabled: isDisabled(el),
        attributes: attrs,
        rect: {x: rect.x, y: rect.y, width: rect.width, height: rect.height},
    };
}
"#;

/// Script builder for one element query
#[derive(Debug, Clone, Copy)]
pub struct ScriptBuilder<'a> {
    query: &'a ElementQuery,
}

impl<'a> ScriptBuilder<'a> {
    /// Create a builder for `query`
    pub fn new(query: &'a ElementQuery) -> Self {
        Self { query }
    }

    /// Escape a string for embedding inside a single-quoted JS literal
    pub fn escape_js_str(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('\'', "\\'")
            .replace('"', r#"\""#)
            .replace('\n', "\\n")
            .replace('\r', "\\r")
    }

    /// JS statements that leave the matching elements in `candidates`,
    /// in document order
    fn collect_js(&self) -> String {
        let collect = match &self.query.kind {
            QueryKind::Role { role, name, exact } => {
                let name_filter = match name {
                    Some(name) if *exact => format!(
                        "&& accName(el) === norm('{}')",
                        Self::escape_js_str(name)
                    ),
                    Some(name) => format!(
                        "&& accName(el).toLowerCase() === norm('{}').toLowerCase()",
                        Self::escape_js_str(name)
                    ),
                    None => String::new(),
                };
                format!(
                    "let candidates = Array.from(document.querySelectorAll('*'))\
                     .filter((el) => getRole(el) === '{}' {});",
                    Self::escape_js_str(role),
                    name_filter
                )
            }
            QueryKind::Text { text } => format!(
                "let candidates = Array.from(document.querySelectorAll('*'))\
                 .filter((el) => !SKIP_TAGS.has(el.tagName.toUpperCase()) \
                 && norm(el.textContent) === norm('{}'));",
                Self::escape_js_str(text)
            ),
            QueryKind::TextContains { text } => format!(
                "let candidates = Array.from(document.querySelectorAll('*'))\
                 .filter((el) => !SKIP_TAGS.has(el.tagName.toUpperCase()) \
                 && norm(el.textContent).includes(norm('{}')));",
                Self::escape_js_str(text)
            ),
            QueryKind::Css { selector } => format!(
                "let candidates = Array.from(document.querySelectorAll('{}'));",
                Self::escape_js_str(selector)
            ),
        };

        let mut js = collect;

        // Text matches bubble up through every ancestor; keep only the
        // innermost elements
        if matches!(
            self.query.kind,
            QueryKind::Text { .. } | QueryKind::TextContains { .. }
        ) {
            js.push_str(
                "\ncandidates = candidates.filter((el) => \
                 !candidates.some((other) => other !== el && el.contains(other)));",
            );
        }

        if let Some(has_text) = &self.query.has_text {
            js.push_str(&format!(
                "\ncandidates = candidates.filter((el) => \
                 norm(el.textContent).includes(norm('{}')));",
                Self::escape_js_str(has_text)
            ));
        }

        js
    }

    /// Script returning snapshots of all matches
    pub fn find_all_script(&self) -> String {
        format!(
            "(() => {{\n{}\n{}\nreturn candidates.map(snap);\n}})()",
            HELPERS,
            self.collect_js()
        )
    }

    /// Wrap `body` so it runs with the match at `index` bound to `el`.
    ///
    /// The body must return an object; an `error` property signals failure.
    fn on_element_script(&self, index: usize, body: &str) -> String {
        format!(
            "(() => {{\n{}\n{}\nif ({index} >= candidates.length) {{\n\
             return {{error: 'index {index} out of range: ' + candidates.length + ' matches'}};\n\
             }}\nconst el = candidates[{index}];\n{body}\n}})()",
            HELPERS,
            self.collect_js(),
            index = index,
            body = body
        )
    }

    /// Script that scrolls the match into view and returns its center.
    ///
    /// Scrolls instantly so the returned rect is settled.
    pub fn click_point_script(&self, index: usize) -> String {
        self.on_element_script(
            index,
            "el.scrollIntoView({block: 'center'});\n\
             const rect = el.getBoundingClientRect();\n\
             return {ok: true, x: rect.x + rect.width / 2, y: rect.y + rect.height / 2};",
        )
    }

    /// Script that focuses the match
    pub fn focus_script(&self, index: usize) -> String {
        self.on_element_script(
            index,
            "el.scrollIntoView({block: 'center'});\nel.focus();\nreturn {ok: true};",
        )
    }

    /// Script that focuses the match and selects its current content, so a
    /// following text insertion replaces it
    pub fn prepare_fill_script(&self, index: usize) -> String {
        self.on_element_script(
            index,
            "el.scrollIntoView({block: 'center'});\nel.focus();\n\
             if (typeof el.select === 'function') {\nel.select();\n} else {\n\
             const range = document.createRange();\nrange.selectNodeContents(el);\n\
             const sel = window.getSelection();\nsel.removeAllRanges();\nsel.addRange(range);\n}\n\
             return {ok: true};",
        )
    }
}

/// Wrap a scenario script so positional arguments are applied to it.
///
/// Without arguments the script evaluates as a bare expression; with
/// arguments it must be a function expression.
pub fn apply_script(script: &str, args: &[serde_json::Value]) -> Result<String> {
    if args.is_empty() {
        Ok(script.to_string())
    } else {
        let args_json = serde_json::to_string(args)?;
        Ok(format!("({}).apply(null, {})", script, args_json))
    }
}
