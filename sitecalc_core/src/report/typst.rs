//! # Typst Report Rendering
//!
//! Renders a composed [`ReportDoc`] to PDF bytes through Typst. The block
//! tree is serialized to Typst markup, schematic figures are attached as
//! virtual files, and the document is compiled in-memory against the
//! bundled fonts.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::{CalcError, CalcResult};

use super::{CellMerge, DocBlock, ReportDoc};

/// Renders a composed document to output bytes.
///
/// The composer never talks to a concrete back end; anything that can turn
/// the block tree into bytes (PDF today, possibly HTML later) plugs in
/// here.
pub trait ReportRenderer {
    fn render(&self, doc: &ReportDoc) -> CalcResult<Vec<u8>>;
}

/// PDF renderer backed by Typst.
#[derive(Debug, Default)]
pub struct TypstRenderer;

impl TypstRenderer {
    pub fn new() -> Self {
        TypstRenderer
    }
}

impl ReportRenderer for TypstRenderer {
    fn render(&self, doc: &ReportDoc) -> CalcResult<Vec<u8>> {
        let (source, files) = build_source(doc);
        let world = PdfWorld::new(source, files);

        let warned = typst::compile(&world);
        let document = warned.output.map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
            CalcError::internal(format!("Typst compilation failed: {}", messages.join("; ")))
        })?;

        let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
            CalcError::internal(format!("PDF rendering failed: {}", messages.join("; ")))
        })?;

        Ok(pdf_bytes)
    }
}

/// Render the document and write it to `path`.
pub fn write_report(
    doc: &ReportDoc,
    renderer: &dyn ReportRenderer,
    path: &Path,
) -> CalcResult<()> {
    let bytes = renderer.render(doc)?;
    fs::write(path, &bytes)
        .map_err(|e| CalcError::report_io(path.display().to_string(), e.to_string()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(())
}

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world: one main source plus the attached figure files.
struct PdfWorld {
    main: Source,
    files: HashMap<FileId, Bytes>,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String, files: HashMap<FileId, Bytes>) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);
        let main_id = FileId::new(None, VirtualPath::new("/main.typ"));

        PdfWorld {
            main: Source::new(main_id, source),
            files,
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }

    fn load_fonts() -> Vec<Font> {
        let mut fonts = Vec::new();
        for font_bytes in typst_assets::fonts() {
            let buffer = Bytes::new(font_bytes.to_vec());
            for font in Font::iter(buffer) {
                fonts.push(font);
            }
        }
        fonts
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.files
            .get(&id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// Markup Generation
// ============================================================================

fn build_source(doc: &ReportDoc) -> (String, HashMap<FileId, Bytes>) {
    let mut files = HashMap::new();
    let mut image_count = 0usize;

    let mut src = format!(
        r##"#set page(
  paper: "a4",
  margin: (top: 2.5cm, bottom: 2.5cm, left: 2.5cm, right: 2.5cm),
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr),
      align(left)[#text(size: 9pt)[{title}]],
      align(right)[#text(size: 9pt)[Page #counter(page).display() / {date}]],
    )
  ]
)

#set text(size: 11pt)

"##,
        title = escape_typst(&doc.title),
        date = Utc::now().format("%Y-%m-%d"),
    );

    for block in &doc.blocks {
        match block {
            DocBlock::Title { level: 1, text } => {
                src.push_str(&format!(
                    "#align(center)[\n  #block(width: 100%, fill: rgb(\"#f0f0f0\"), \
                     inset: 12pt, radius: 4pt)[\n    #text(size: 18pt, weight: \"bold\")[{}]\n  ]\n]\n\n",
                    escape_typst(text)
                ));
            }
            DocBlock::Title { level, text } => {
                let marker = if *level == 2 { "==" } else { "===" };
                src.push_str(&format!("{marker} {}\n\n", escape_typst(text)));
            }
            DocBlock::Paragraph { text } => {
                src.push_str(&escape_typst(text));
                src.push_str("\n\n");
            }
            DocBlock::Table { header, rows, merges } => {
                emit_table(&mut src, *header, rows, merges);
            }
            DocBlock::Formula { formula } => {
                src.push_str(&format!(
                    "#block(inset: (left: 12pt))[\n  {} \\\n  {} = {} {}\n]\n\n",
                    escape_typst(&formula.expression),
                    escape_typst(&formula.substitution),
                    formula.value,
                    escape_typst(&formula.unit),
                ));
            }
            DocBlock::Image { path } => match fs::read(path) {
                Ok(bytes) => {
                    let vpath = format!("/figure-{image_count}.png");
                    image_count += 1;
                    let id = FileId::new(None, VirtualPath::new(&vpath));
                    files.insert(id, Bytes::new(bytes));
                    src.push_str(&format!(
                        "#align(center)[#image(\"{vpath}\", width: 60%)]\n\n"
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "schematic not found, figure skipped"
                    );
                }
            },
        }
    }

    (src, files)
}

fn emit_table(src: &mut String, header: bool, rows: &[Vec<String>], merges: &[CellMerge]) {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if columns == 0 {
        return;
    }

    src.push_str(&format!(
        "#block[\n#set text(size: 10.5pt)\n#table(\n  columns: {columns},\n  inset: 8pt,\n  stroke: 0.5pt,\n"
    ));

    for (ri, row) in rows.iter().enumerate() {
        let row_no = ri + 1;
        src.push_str("  ");
        for (ci, cell) in row.iter().enumerate() {
            let col_no = ci + 1;
            // A cell inside a merged region but not at its anchor is
            // swallowed by the anchor's span.
            if merges.iter().any(|m| {
                (m.first_row..=m.last_row).contains(&row_no)
                    && (m.first_col..=m.last_col).contains(&col_no)
                    && !(m.first_row == row_no && m.first_col == col_no)
            }) {
                continue;
            }

            let mut text = escape_typst(cell);
            if header && ri == 0 {
                text = format!("*{text}*");
            }

            let anchor = merges
                .iter()
                .find(|m| m.first_row == row_no && m.first_col == col_no);
            match anchor {
                Some(m) => {
                    let colspan = m.last_col - m.first_col + 1;
                    let rowspan = m.last_row - m.first_row + 1;
                    src.push_str(&format!(
                        "table.cell(colspan: {colspan}, rowspan: {rowspan})[{text}], "
                    ));
                }
                None => {
                    src.push_str(&format!("[{text}], "));
                }
            }
        }
        src.push('\n');
    }

    src.push_str(")\n]\n\n");
}

/// Escape special Typst characters in user-provided text
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' => "\\*".to_string(),
            '_' => "\\_".to_string(),
            '#' => "\\#".to_string(),
            '$' => "\\$".to_string(),
            '@' => "\\@".to_string(),
            '<' => "\\<".to_string(),
            '>' => "\\>".to_string(),
            '\\' => "\\\\".to_string(),
            '`' => "\\`".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crane_db::MemoryCraneStore;
    use crate::dispatch::calculate;
    use crate::params::ParameterModel;
    use crate::report::compose;

    #[test]
    fn test_slope_report_renders_to_pdf() {
        let model = ParameterModel::new_slope("Pit A");
        let store = MemoryCraneStore::new();
        let result = calculate(&model, &store).unwrap();
        let doc = compose(&model, &result).unwrap();

        let pdf = TypstRenderer::new().render(&doc).unwrap();
        assert!(pdf.starts_with(b"%PDF"), "output is not a valid PDF");
        assert!(pdf.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_missing_schematic_is_skipped() {
        let doc = ReportDoc {
            title: "Figures".to_string(),
            blocks: vec![
                DocBlock::Paragraph {
                    text: "Before figure".to_string(),
                },
                DocBlock::Image {
                    path: "does/not/exist.png".into(),
                },
            ],
        };
        let pdf = TypstRenderer::new().render(&doc).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_merged_cells_render() {
        let doc = ReportDoc {
            title: "Merges".to_string(),
            blocks: vec![DocBlock::Table {
                header: false,
                rows: vec![
                    vec!["a".to_string(), "b".to_string(), "c".to_string()],
                    vec!["d".to_string(), String::new(), String::new()],
                ],
                merges: vec![CellMerge {
                    first_row: 2,
                    last_row: 2,
                    first_col: 2,
                    last_col: 3,
                }],
            }],
        };
        let pdf = TypstRenderer::new().render(&doc).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_markup_escapes_user_text() {
        let (src, _) = build_source(&ReportDoc {
            title: "T".to_string(),
            blocks: vec![DocBlock::Paragraph {
                text: "load #3 *heavy*".to_string(),
            }],
        });
        assert!(src.contains("load \\#3 \\*heavy\\*"));
    }
}
