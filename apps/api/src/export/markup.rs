//! Inline paragraph markup for the PDF exporter.
//!
//! Each paragraph line is escaped, wrapped in `<para>…</para>` and read as XML.
//! Recognised tags: `b`, `strong`, `i`, `em`, `br/`. Anything else that looks
//! like a tag (`Vec<String>` in generated text) fails the export. A `<` that
//! cannot open a tag, as in `<5 ms` or `a < b`, is kept as text.
//! `escape_angle_brackets` escapes every `<` and `>` so no markup is read at all.

use std::borrow::Cow;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::export::font_metrics::FontFace;
use crate::export::ExportError;

/// A piece of paragraph content after markup has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text { text: String, face: FontFace },
    LineBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Para,
    Bold,
    Italic,
}

impl Tag {
    fn from_name(name: &[u8]) -> Result<Self, ExportError> {
        let name = String::from_utf8_lossy(name).to_ascii_lowercase();
        match name.as_str() {
            "para" => Ok(Tag::Para),
            "b" | "strong" => Ok(Tag::Bold),
            "i" | "em" => Ok(Tag::Italic),
            other => Err(ExportError::Markup(format!("unsupported tag <{other}>"))),
        }
    }
}

/// Escapes a raw line before it is handed to `parse_paragraph`.
///
/// `&` is always escaped. A `<` is only read as markup when it opens a tag
/// (followed by a letter, `/`, `!` or `?`); any other `<` is literal text.
pub fn escape_line(line: &str, escape_angle_brackets: bool) -> Cow<'_, str> {
    let needs_escape = line.char_indices().any(|(i, c)| match c {
        '&' => true,
        '<' => escape_angle_brackets || !opens_tag(&line[i + 1..]),
        '>' => escape_angle_brackets,
        _ => false,
    });
    if !needs_escape {
        return Cow::Borrowed(line);
    }

    let mut escaped = String::with_capacity(line.len() + 8);
    for (i, c) in line.char_indices() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' if escape_angle_brackets || !opens_tag(&line[i + 1..]) => {
                escaped.push_str("&lt;")
            }
            '>' if escape_angle_brackets => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn opens_tag(rest: &str) -> bool {
    rest.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

fn markup_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Markup(e.to_string())
}

/// Parses one escaped paragraph into styled inline runs.
pub fn parse_paragraph(markup: &str) -> Result<Vec<Inline>, ExportError> {
    let wrapped = format!("<para>{markup}</para>");
    let mut reader = Reader::from_str(&wrapped);

    let mut inlines: Vec<Inline> = Vec::new();
    let mut open: Vec<Tag> = Vec::new();

    loop {
        match reader.read_event().map_err(markup_err)? {
            Event::Start(e) => {
                let tag = Tag::from_name(e.name().as_ref())?;
                if tag == Tag::Para && !open.is_empty() {
                    return Err(ExportError::Markup("nested <para>".to_string()));
                }
                open.push(tag);
            }
            Event::End(e) => {
                let tag = Tag::from_name(e.name().as_ref())?;
                if open.pop() != Some(tag) {
                    return Err(ExportError::Markup(format!(
                        "unbalanced closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref().eq_ignore_ascii_case(b"br") {
                    inlines.push(Inline::LineBreak);
                } else {
                    return Err(ExportError::Markup(format!(
                        "unsupported tag <{}/>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
            }
            Event::Text(e) => {
                let text = e.decode().map_err(markup_err)?;
                push_text(&mut inlines, &text, current_face(&open));
            }
            Event::GeneralRef(e) => {
                let face = current_face(&open);
                if let Some(ch) = e.resolve_char_ref().map_err(markup_err)? {
                    push_text(&mut inlines, ch.encode_utf8(&mut [0u8; 4]), face);
                } else {
                    let name = e.decode().map_err(markup_err)?;
                    let resolved = resolve_predefined_entity(&name)
                        .ok_or_else(|| ExportError::Markup(format!("unknown entity &{name};")))?;
                    push_text(&mut inlines, resolved, face);
                }
            }
            Event::Eof => break,
            _ => {
                return Err(ExportError::Markup(
                    "comments, CDATA and processing instructions are not supported".to_string(),
                ))
            }
        }
    }

    if !open.is_empty() {
        return Err(ExportError::Markup("unclosed tag at end of paragraph".to_string()));
    }

    Ok(inlines)
}

fn current_face(open: &[Tag]) -> FontFace {
    let bold = open.contains(&Tag::Bold);
    let italic = open.contains(&Tag::Italic);
    FontFace::from_style(bold, italic)
}

/// Appends text, merging with the previous run when the face is unchanged.
fn push_text(inlines: &mut Vec<Inline>, text: &str, face: FontFace) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text {
        text: last,
        face: last_face,
    }) = inlines.last_mut()
    {
        if *last_face == face {
            last.push_str(text);
            return;
        }
    }
    inlines.push(Inline::Text {
        text: text.to_string(),
        face,
    });
}
