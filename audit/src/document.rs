//! Audit documents and the read-only query seam over their markup tree.
//!
//! Extraction never touches `scraper` types directly. Everything that needs
//! structure goes through [`DocumentQuery`], which hands out owned views of
//! tables, rows, cells and requirement containers.

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{AuditError, ErrorCode};
use crate::normalize::normalize_text;

/// Tags whose text never belongs to the visible report.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Populated cells a row needs before it counts as a transcript row.
pub const MIN_ROW_CELLS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellView {
    pub classes: Vec<String>,
    /// Normalized text, excluding any table nested inside the cell.
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowView {
    pub classes: Vec<String>,
    pub cells: Vec<CellView>,
}

impl RowView {
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        has_class_token(&self.classes, class)
    }

    #[must_use]
    pub fn populated_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.text.is_empty()).count()
    }
}

/// A table with only its own rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    pub rows: Vec<RowView>,
}

impl TableView {
    /// Whether any own row is wide enough to be data rather than layout.
    #[must_use]
    pub fn carries_rows(&self) -> bool {
        self.rows.iter().any(|row| row.populated_cells() >= MIN_ROW_CELLS)
    }
}

/// A requirement block selected by a [`DocumentQuery::containers`] predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerView {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    /// Every row inside the container, nested tables included.
    pub rows: Vec<RowView>,
}

impl ContainerView {
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        has_class_token(&self.classes, class)
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Borrowed element metadata handed to container predicates.
#[derive(Debug, Clone)]
pub struct ElementMeta<'a> {
    pub tag: &'a str,
    pub classes: Vec<&'a str>,
    pub attrs: Vec<(&'a str, &'a str)>,
}

impl ElementMeta<'_> {
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(class))
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

/// Read-only access to a parsed document tree.
pub trait DocumentQuery {
    /// Normalized visible text of the whole document.
    fn text(&self) -> &str;

    /// Tables in document order, minus tables nested inside a data table.
    ///
    /// Layout tables (no row with [`MIN_ROW_CELLS`] populated cells) do not
    /// hide the tables they wrap.
    fn tables(&self) -> Vec<TableView>;

    /// Every element accepted by `predicate`, in document order.
    fn containers(&self, predicate: &dyn Fn(&ElementMeta<'_>) -> bool) -> Vec<ContainerView>;
}

/// An audit report rendered as HTML.
#[derive(Debug)]
pub struct HtmlDocument {
    html: Html,
    text: String,
}

impl HtmlDocument {
    pub fn parse(raw: &str) -> Result<Self, AuditError> {
        let raw = strip_bom_and_whitespace(raw);
        if raw.is_empty() {
            return Err(AuditError::new(ErrorCode::EmptyDocument, "audit document is empty"));
        }
        if !raw.starts_with('<') {
            return Err(AuditError::new(
                ErrorCode::UnsupportedDocument,
                "audit document is not markup",
            ));
        }

        let html = Html::parse_document(raw);
        if !html.errors.is_empty() {
            tracing::debug!(errors = html.errors.len(), "audit markup parsed with recoveries");
        }

        let mut text = String::new();
        collect_text(&mut text, html.root_element(), false);
        let text = normalize_text(&text);
        if text.is_empty() {
            return Err(AuditError::new(
                ErrorCode::UnsupportedDocument,
                "audit markup has no readable text",
            ));
        }

        Ok(Self { html, text })
    }
}

impl DocumentQuery for HtmlDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn tables(&self) -> Vec<TableView> {
        let Ok(table_sel) = Selector::parse("table") else {
            return Vec::new();
        };
        let Ok(tr_sel) = Selector::parse("tr") else {
            return Vec::new();
        };

        let all: Vec<(ElementRef<'_>, TableView)> = self
            .html
            .select(&table_sel)
            .map(|table| (table, own_rows(table, &tr_sel)))
            .collect();
        let data_tables: Vec<_> = all
            .iter()
            .filter(|(_, view)| view.carries_rows())
            .map(|(table, _)| table.id())
            .collect();

        all.into_iter()
            .filter(|(table, _)| {
                !table
                    .ancestors()
                    .any(|ancestor| data_tables.contains(&ancestor.id()))
            })
            .map(|(_, view)| view)
            .collect()
    }

    fn containers(&self, predicate: &dyn Fn(&ElementMeta<'_>) -> bool) -> Vec<ContainerView> {
        let Ok(tr_sel) = Selector::parse("tr") else {
            return Vec::new();
        };

        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| {
                let value = element.value();
                let meta = ElementMeta {
                    tag: value.name(),
                    classes: value.classes().collect(),
                    attrs: value.attrs().collect(),
                };
                predicate(&meta)
            })
            .map(|element| {
                let value = element.value();
                let mut text = String::new();
                collect_text(&mut text, element, false);
                ContainerView {
                    tag: value.name().to_string(),
                    classes: value.classes().map(ToString::to_string).collect(),
                    attrs: value
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    text: normalize_text(&text),
                    rows: element.select(&tr_sel).map(row_view).collect(),
                }
            })
            .collect()
    }
}

/// A document as handed over by the caller: flat text or a markup tree.
#[derive(Debug)]
pub enum AuditDocument {
    /// Normalized free text (PDF-to-text output, copy-paste).
    Text(String),
    Html(HtmlDocument),
}

impl AuditDocument {
    /// Detect the document kind: markup when it starts with `<`, text otherwise.
    pub fn parse(raw: &str) -> Result<Self, AuditError> {
        if strip_bom_and_whitespace(raw).starts_with('<') {
            HtmlDocument::parse(raw).map(AuditDocument::Html)
        } else {
            Self::from_text(raw)
        }
    }

    pub fn from_text(raw: &str) -> Result<Self, AuditError> {
        let raw = strip_bom_and_whitespace(raw);
        if raw.starts_with("%PDF-") {
            return Err(AuditError::new(
                ErrorCode::UnsupportedDocument,
                "binary PDF must be converted to text before import",
            ));
        }
        if raw.contains('\0') {
            return Err(AuditError::new(
                ErrorCode::UnsupportedDocument,
                "audit document contains binary data",
            ));
        }
        let text = normalize_text(raw);
        if text.is_empty() {
            return Err(AuditError::new(ErrorCode::EmptyDocument, "audit document is empty"));
        }
        Ok(AuditDocument::Text(text))
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            AuditDocument::Text(text) => text,
            AuditDocument::Html(doc) => doc.text(),
        }
    }

    /// The markup tree, when there is one.
    #[must_use]
    pub fn query(&self) -> Option<&dyn DocumentQuery> {
        match self {
            AuditDocument::Text(_) => None,
            AuditDocument::Html(doc) => Some(doc),
        }
    }
}

fn strip_bom_and_whitespace(raw: &str) -> &str {
    raw.strip_prefix('\u{FEFF}').unwrap_or(raw).trim_start()
}

fn has_class_token(classes: &[String], class: &str) -> bool {
    classes.iter().any(|c| c.eq_ignore_ascii_case(class))
}

/// Closest enclosing `<table>`, if any.
fn nearest_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "table")
}

fn own_rows(table: ElementRef<'_>, tr_sel: &Selector) -> TableView {
    TableView {
        rows: table
            .select(tr_sel)
            .filter(|tr| nearest_table(*tr).is_some_and(|owner| owner.id() == table.id()))
            .map(row_view)
            .collect(),
    }
}

fn row_view(tr: ElementRef<'_>) -> RowView {
    let cells = tr
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| {
            let mut text = String::new();
            collect_text(&mut text, cell, true);
            CellView {
                classes: cell.value().classes().map(ToString::to_string).collect(),
                text: normalize_text(&text),
            }
        })
        .collect();

    RowView {
        classes: tr.value().classes().map(ToString::to_string).collect(),
        cells,
    }
}

/// Append visible text, separating text nodes with spaces.
fn collect_text(output: &mut String, element: ElementRef<'_>, skip_tables: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                output.push_str(text);
                output.push(' ');
            }
            Node::Element(el) => {
                let name = el.name();
                if INVISIBLE_TAGS.contains(&name) || (skip_tables && name == "table") {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(output, child_el, skip_tables);
                }
            }
            _ => {}
        }
    }
}
