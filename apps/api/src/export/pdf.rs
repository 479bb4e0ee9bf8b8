//! PDF exporter.
//!
//! Each non-blank line becomes one paragraph: escaped (`&` only by default),
//! parsed as inline markup, greedily word-wrapped to the frame width using the
//! Helvetica metric tables, and followed by `paragraph_spacing_pt` of space.
//! Paragraphs are wrapped in `/P` marked-content sequences whose MCID is the
//! paragraph index, so a paragraph broken across pages keeps one identity.

use std::io::BufWriter;
use std::path::Path;

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use tracing::debug;

use crate::export::font_metrics::{encode_win_ansi_char, get_metrics, FontFace, PdfLayout};
use crate::export::markup::{escape_line, parse_paragraph, Inline};
use crate::export::{paragraph_lines, write_temp_file, ExportError};
use crate::models::resume::{ExportFormat, ExportedFile};

const PRODUCER: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Options that change how paragraph text is interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfOptions {
    pub escape_angle_brackets: bool,
}

/// Renders `text` and writes it to a new `resume-*.pdf` file in `dir`.
pub fn export_pdf(
    text: &str,
    dir: &Path,
    layout: &PdfLayout,
    options: PdfOptions,
) -> Result<ExportedFile, ExportError> {
    let mut doc = build_document(text, layout, options)?;
    write_temp_file(dir, ExportFormat::Pdf, |file| {
        let mut writer = BufWriter::new(file);
        doc.save_to(&mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?;
        Ok(())
    })
}

/// Builds the in-memory PDF document. Always has at least one page.
pub fn build_document(
    text: &str,
    layout: &PdfLayout,
    options: PdfOptions,
) -> Result<Document, ExportError> {
    let mut pages = PageWriter::new(layout);

    for (index, line) in paragraph_lines(text).enumerate() {
        let inlines = parse_paragraph(&escape_line(line, options.escape_angle_brackets))?;
        let lines = wrap_words(tokenize(&inlines), layout);
        pages.paragraph(index as i64, &lines);
    }

    let pages = pages.finish();
    debug!("PDF laid out on {} page(s)", pages.len());
    assemble(pages, layout)
}

// ────────────────────────────────────────────────────────────────────────────
// Tokenizing and wrapping
// ────────────────────────────────────────────────────────────────────────────

/// Encoded text in a single face.
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    face: FontFace,
    bytes: Vec<u8>,
}

/// A run of non-whitespace characters, possibly spanning several faces.
#[derive(Debug, Clone, Default, PartialEq)]
struct Word {
    fragments: Vec<Fragment>,
}

impl Word {
    fn push(&mut self, face: FontFace, byte: u8) {
        match self.fragments.last_mut() {
            Some(last) if last.face == face => last.bytes.push(byte),
            _ => self.fragments.push(Fragment {
                face,
                bytes: vec![byte],
            }),
        }
    }

    fn width(&self, size_pt: f32) -> f32 {
        self.fragments
            .iter()
            .map(|f| get_metrics(f.face).measure_pt(&f.bytes, size_pt))
            .sum()
    }

    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Face of the last character; the space after this word is set in it.
    fn trailing_face(&self) -> FontFace {
        self.fragments
            .last()
            .map_or(FontFace::Regular, |f| f.face)
    }
}

/// Width of the space that follows `word` on a line.
fn space_after(word: &Word, size_pt: f32) -> f32 {
    get_metrics(word.trailing_face()).space_width * size_pt
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(Word),
    Break,
}

/// Splits inline runs on whitespace. Whitespace collapses; line-break tags survive.
fn tokenize(inlines: &[Inline]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = Word::default();

    for inline in inlines {
        match inline {
            Inline::Text { text, face } => {
                for c in text.chars() {
                    if c.is_whitespace() {
                        if !word.is_empty() {
                            tokens.push(Token::Word(std::mem::take(&mut word)));
                        }
                    } else {
                        word.push(*face, encode_win_ansi_char(c));
                    }
                }
            }
            Inline::LineBreak => {
                if !word.is_empty() {
                    tokens.push(Token::Word(std::mem::take(&mut word)));
                }
                tokens.push(Token::Break);
            }
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

/// Greedy word wrap at the frame width. A single word wider than the frame
/// gets a line to itself and overflows.
fn wrap_words(tokens: Vec<Token>, layout: &PdfLayout) -> Vec<Vec<Word>> {
    let size = layout.font_size_pt;
    let max_width = layout.frame_width();

    let mut lines = Vec::new();
    let mut current: Vec<Word> = Vec::new();
    let mut current_width = 0.0_f32;

    for token in tokens {
        match token {
            Token::Break => {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            Token::Word(word) => {
                let word_width = word.width(size);
                match current.last() {
                    None => {
                        current_width = word_width;
                    }
                    Some(prev) => {
                        let space_width = space_after(prev, size);
                        if current_width + space_width + word_width > max_width {
                            lines.push(std::mem::take(&mut current));
                            current_width = word_width;
                        } else {
                            current_width += space_width + word_width;
                        }
                    }
                }
                current.push(word);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Flattens a line into face runs, with single spaces between words.
fn line_segments(words: &[Word]) -> Vec<Fragment> {
    let mut segments: Vec<Fragment> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            if let Some(last) = segments.last_mut() {
                last.bytes.push(b' ');
            }
        }
        for fragment in &word.fragments {
            match segments.last_mut() {
                Some(last) if last.face == fragment.face => {
                    last.bytes.extend_from_slice(&fragment.bytes)
                }
                _ => segments.push(fragment.clone()),
            }
        }
    }
    segments
}

// ────────────────────────────────────────────────────────────────────────────
// Page layout
// ────────────────────────────────────────────────────────────────────────────

/// Numbers that are whole stay integers in the content stream.
fn number(value: f32) -> Object {
    if value.fract() == 0.0 {
        Object::Integer(value as i64)
    } else {
        Object::Real(value.into())
    }
}

struct PageWriter<'a> {
    layout: &'a PdfLayout,
    pages: Vec<Vec<Operation>>,
    cursor_y: f32,
}

impl<'a> PageWriter<'a> {
    fn new(layout: &'a PdfLayout) -> Self {
        Self {
            layout,
            pages: vec![Vec::new()],
            cursor_y: layout.frame_top(),
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // `pages` is never empty: created with one page, only ever pushed to.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn begin_mark(&mut self, mcid: i64) {
        self.ops().push(Operation::new(
            "BDC",
            vec![
                Object::Name(b"P".to_vec()),
                Object::Dictionary(dictionary! { "MCID" => mcid }),
            ],
        ));
    }

    fn end_mark(&mut self) {
        self.ops().push(Operation::new("EMC", vec![]));
    }

    fn line_fits(&self) -> bool {
        self.cursor_y - self.layout.leading_pt >= self.layout.frame_bottom()
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor_y = self.layout.frame_top();
    }

    fn paragraph(&mut self, mcid: i64, lines: &[Vec<Word>]) {
        if lines.is_empty() {
            self.begin_mark(mcid);
            self.end_mark();
        }

        for (i, words) in lines.iter().enumerate() {
            if !self.line_fits() {
                if i > 0 {
                    self.end_mark();
                }
                self.new_page();
                if i > 0 {
                    self.begin_mark(mcid);
                }
            }
            if i == 0 {
                self.begin_mark(mcid);
            }
            self.cursor_y -= self.layout.leading_pt;
            self.draw_line(words);
        }

        if !lines.is_empty() {
            self.end_mark();
        }
        self.cursor_y -= self.layout.paragraph_spacing_pt;
    }

    fn draw_line(&mut self, words: &[Word]) {
        let size = self.layout.font_size_pt;
        let x = self.layout.frame_left();
        let baseline = self.cursor_y + (self.layout.leading_pt - size);

        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![number(x), number(baseline)]),
        ];
        for segment in line_segments(words) {
            ops.push(Operation::new(
                "Tf",
                vec![
                    Object::Name(segment.face.resource_name().as_bytes().to_vec()),
                    number(size),
                ],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(segment.bytes)],
            ));
        }
        ops.push(Operation::new("ET", vec![]));

        self.ops().extend(ops);
    }

    fn finish(self) -> Vec<Vec<Operation>> {
        self.pages
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document assembly
// ────────────────────────────────────────────────────────────────────────────

fn assemble(pages: Vec<Vec<Operation>>, layout: &PdfLayout) -> Result<Document, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let media_box = vec![
        0.into(),
        0.into(),
        number(layout.page_width_pt),
        number(layout.page_height_pt),
    ];

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box.clone(),
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "MarkInfo" => dictionary! { "Marked" => true },
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(
            Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()
        ),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    Ok(doc)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
