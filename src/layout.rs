//! Page geometry and paragraph layout
//!
//! Paragraphs are broken into lines greedily at spaces, lines are stacked down
//! the page and a new page starts whenever the next line would cross the bottom
//! margin. Coordinates in the output are PDF points with the origin at the
//! bottom-left corner of the page.

use crate::docx::{Alignment, Color, Document, LineSpacing, Paragraph, PAGE_BREAK};
use crate::error::{Error, Result};
use crate::fonts::{FontKey, FontSet};

/// Spaces a tab character expands to
const TAB_WIDTH_SPACES: usize = 4;

/// Natural line height as a multiple of the font size
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Length stored in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Length(f32);

impl Length {
    /// Create a length from points
    pub fn from_pt(pt: f32) -> Self {
        Length(pt)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f32) -> Self {
        Length(inches * 72.0)
    }

    /// Get the value in points
    pub fn pt(&self) -> f32 {
        self.0
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11"), Word's default for new documents
    pub fn letter() -> Self {
        Self {
            width: Length::from_pt(612.0),
            height: Length::from_pt(792.0),
        }
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// Standard 1-inch margins on all sides
    pub fn standard() -> Self {
        Self::uniform(Length::from_inches(1.0))
    }
}

/// A piece of text drawn with a single font, size and color
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub font: FontKey,
    pub size: f32,
    /// Left edge of the text
    pub x: f32,
    /// Baseline
    pub y: f32,
    pub width: f32,
    pub text: String,
    pub color: Color,
    pub underline: bool,
}

/// Positioned content of one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub fragments: Vec<TextFragment>,
}

impl PageLayout {
    fn new(dimensions: &PageDimensions) -> Self {
        Self {
            width: dimensions.width.pt(),
            height: dimensions.height.pt(),
            fragments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word { text: String, run: usize },
    Space { text: String, run: usize },
    LineBreak,
    PageBreak,
}

/// Split paragraph text into words, spaces and explicit breaks
fn tokenize(paragraph: &Paragraph) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (run_index, run) in paragraph.runs.iter().enumerate() {
        let mut word = String::new();
        let flush = |word: &mut String, tokens: &mut Vec<Token>| {
            if !word.is_empty() {
                tokens.push(Token::Word {
                    text: std::mem::take(word),
                    run: run_index,
                });
            }
        };

        for c in run.text.chars() {
            match c {
                '\n' => {
                    flush(&mut word, &mut tokens);
                    tokens.push(Token::LineBreak);
                }
                PAGE_BREAK => {
                    flush(&mut word, &mut tokens);
                    tokens.push(Token::PageBreak);
                }
                ' ' | '\t' => {
                    flush(&mut word, &mut tokens);
                    let text = if c == '\t' {
                        " ".repeat(TAB_WIDTH_SPACES)
                    } else {
                        " ".to_string()
                    };
                    tokens.push(Token::Space { text, run: run_index });
                }
                _ => word.push(c),
            }
        }
        flush(&mut word, &mut tokens);
    }

    tokens
}

#[derive(Debug, Clone)]
struct Piece {
    run: usize,
    text: String,
    width: f32,
    is_space: bool,
}

#[derive(Debug, Clone, Default)]
struct Line {
    pieces: Vec<Piece>,
    width: f32,
    page_break_after: bool,
}

impl Line {
    fn push(&mut self, piece: Piece) {
        self.width += piece.width;
        self.pieces.push(piece);
    }

    /// Drop trailing spaces so alignment ignores them
    fn trim_end(&mut self) {
        while self.pieces.last().is_some_and(|p| p.is_space) {
            if let Some(piece) = self.pieces.pop() {
                self.width -= piece.width;
            }
        }
    }
}

struct ParagraphLayout<'a> {
    paragraph: &'a Paragraph,
    fonts: &'a FontSet,
    run_fonts: Vec<FontKey>,
}

impl<'a> ParagraphLayout<'a> {
    fn new(paragraph: &'a Paragraph, fonts: &'a FontSet) -> Result<Self> {
        let run_fonts = paragraph
            .runs
            .iter()
            .map(|run| {
                fonts
                    .key(&run.font_family, run.bold, run.italic)
                    .ok_or_else(|| Error::Font(format!("no font resolved for '{}'", run.font_family)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            paragraph,
            fonts,
            run_fonts,
        })
    }

    fn measure(&self, run: usize, text: &str) -> f32 {
        let size = self.paragraph.runs[run].font_size;
        self.fonts.get(self.run_fonts[run]).text_width(text, size)
    }

    /// Width available to a line, given whether it is the paragraph's first line
    fn available(content_width: f32, paragraph: &Paragraph, first: bool) -> f32 {
        let first_line = if first { paragraph.indent_first_line } else { 0.0 };
        (content_width - paragraph.indent_left - paragraph.indent_right - first_line).max(1.0)
    }

    /// Greedy line breaking
    fn break_lines(&self, content_width: f32) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut line = Line::default();
        let mut available = Self::available(content_width, self.paragraph, true);
        let mut wrapped = false;

        for token in tokenize(self.paragraph) {
            match token {
                Token::LineBreak | Token::PageBreak => {
                    line.page_break_after = token == Token::PageBreak;
                    line.trim_end();
                    lines.push(std::mem::take(&mut line));
                    available = Self::available(content_width, self.paragraph, false);
                    wrapped = false;
                }
                Token::Space { text, run } => {
                    // Spaces never start a wrapped line
                    if line.pieces.is_empty() && wrapped {
                        continue;
                    }
                    let width = self.measure(run, &text);
                    line.push(Piece { run, text, width, is_space: true });
                }
                Token::Word { text, run } => {
                    let width = self.measure(run, &text);
                    if line.width + width > available && !line.pieces.is_empty() {
                        line.trim_end();
                        lines.push(std::mem::take(&mut line));
                        available = Self::available(content_width, self.paragraph, false);
                        wrapped = true;
                    }
                    if width > available {
                        // Each chunk is sized for the line it lands on
                        let mut rest = text.as_str();
                        while !rest.is_empty() {
                            if !line.pieces.is_empty() {
                                lines.push(std::mem::take(&mut line));
                                available = Self::available(content_width, self.paragraph, false);
                                wrapped = true;
                            }
                            let (chunk, tail) = self.take_chunk(run, rest, available);
                            line.push(chunk);
                            rest = tail;
                        }
                    } else {
                        line.push(Piece { run, text, width, is_space: false });
                    }
                }
            }
        }

        line.trim_end();
        lines.push(line);
        lines
    }

    /// Longest prefix of `word` that fits `available`, at least one character
    fn take_chunk<'w>(&self, run: usize, word: &'w str, available: f32) -> (Piece, &'w str) {
        let mut end = 0;
        for (i, c) in word.char_indices() {
            let next = i + c.len_utf8();
            if end > 0 && self.measure(run, &word[..next]) > available {
                break;
            }
            end = next;
        }

        let (head, tail) = word.split_at(end);
        let piece = Piece {
            run,
            text: head.to_string(),
            width: self.measure(run, head),
            is_space: false,
        };
        (piece, tail)
    }

    /// Largest font size and ascent on the line; empty lines use the first run
    fn line_metrics(&self, line: &Line, default_size: f32) -> (f32, f32) {
        let mut size: f32 = 0.0;
        let mut ascent: f32 = 0.0;

        let runs: Vec<usize> = if line.pieces.is_empty() {
            if self.paragraph.runs.is_empty() { Vec::new() } else { vec![0] }
        } else {
            line.pieces.iter().map(|p| p.run).collect()
        };

        for run in runs {
            let run_size = self.paragraph.runs[run].font_size;
            let font = self.fonts.get(self.run_fonts[run]);
            size = size.max(run_size);
            ascent = ascent.max(font.ascent(run_size));
        }

        if size == 0.0 {
            size = default_size;
            ascent = default_size * 0.8;
        }

        (size, ascent)
    }
}

fn line_height(spacing: LineSpacing, size: f32) -> f32 {
    let natural = size * LINE_HEIGHT_FACTOR;
    match spacing {
        LineSpacing::Multiple(m) => natural * m,
        LineSpacing::Exact(h) => h,
        LineSpacing::AtLeast(h) => natural.max(h),
    }
}

/// Lay out the whole document into pages
///
/// Every run's font must already be present in `fonts`. An empty document
/// still produces one blank page.
pub fn layout_document(document: &Document, fonts: &FontSet) -> Result<Vec<PageLayout>> {
    let dims = document.page.dimensions;
    let margins = document.page.margins;
    let content_left = margins.left.pt();
    let content_width = (dims.width.pt() - margins.left.pt() - margins.right.pt()).max(1.0);
    let top = dims.height.pt() - margins.top.pt();
    let bottom = margins.bottom.pt();

    let mut pages = vec![PageLayout::new(&dims)];
    // Distance below the top margin
    let mut cursor: f32 = 0.0;

    for paragraph in &document.paragraphs {
        let layout = ParagraphLayout::new(paragraph, fonts)?;

        if paragraph.page_break_before && cursor > 0.0 {
            pages.push(PageLayout::new(&dims));
            cursor = 0.0;
        }
        if cursor > 0.0 {
            cursor += paragraph.space_before;
        }

        let lines = layout.break_lines(content_width);
        for (index, line) in lines.iter().enumerate() {
            let (size, ascent) = layout.line_metrics(line, document.default_font_size);
            let height = line_height(paragraph.line_spacing, size);

            if cursor > 0.0 && top - cursor - height < bottom {
                pages.push(PageLayout::new(&dims));
                cursor = 0.0;
            }

            let first = index == 0;
            let available = ParagraphLayout::available(content_width, paragraph, first);
            let slack = (available - line.width).max(0.0);
            let offset = match paragraph.alignment {
                Alignment::Left | Alignment::Justify => 0.0,
                Alignment::Center => slack / 2.0,
                Alignment::Right => slack,
            };
            let indent = paragraph.indent_left + if first { paragraph.indent_first_line } else { 0.0 };
            let baseline = top - cursor - ascent.min(height);

            let page = pages.last_mut().ok_or_else(|| Error::General("no page".to_string()))?;
            emit_line(page, paragraph, &layout.run_fonts, line, content_left + indent + offset, baseline);

            cursor += height;
            if line.page_break_after {
                pages.push(PageLayout::new(&dims));
                cursor = 0.0;
            }
        }

        cursor += paragraph.space_after;
    }

    Ok(pages)
}

/// Merge adjacent pieces of the same run into fragments
fn emit_line(
    page: &mut PageLayout,
    paragraph: &Paragraph,
    run_fonts: &[FontKey],
    line: &Line,
    start_x: f32,
    baseline: f32,
) {
    let mut x = start_x;
    let mut current: Option<TextFragment> = None;

    for piece in &line.pieces {
        let run = &paragraph.runs[piece.run];
        match current.as_mut() {
            Some(fragment) if fragment.font == run_fonts[piece.run]
                && fragment.size == run.font_size
                && fragment.color == run.color
                && fragment.underline == run.underline =>
            {
                fragment.text.push_str(&piece.text);
                fragment.width += piece.width;
            }
            _ => {
                if let Some(done) = current.take() {
                    page.fragments.push(done);
                }
                current = Some(TextFragment {
                    font: run_fonts[piece.run],
                    size: run.font_size,
                    x,
                    y: baseline,
                    width: piece.width,
                    text: piece.text.clone(),
                    color: run.color,
                    underline: run.underline,
                });
            }
        }
        x += piece.width;
    }

    if let Some(done) = current {
        page.fragments.push(done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{PageSetup, Run};
    use crate::fonts::{PdfFont, StandardFont};

    fn run(text: &str) -> Run {
        Run {
            text: text.to_string(),
            font_family: "Helvetica".to_string(),
            font_size: 10.0,
            bold: false,
            italic: false,
            underline: false,
            color: Color::BLACK,
        }
    }

    fn paragraph(runs: Vec<Run>) -> Paragraph {
        Paragraph {
            alignment: Alignment::Left,
            space_before: 0.0,
            space_after: 0.0,
            line_spacing: LineSpacing::default(),
            indent_left: 0.0,
            indent_right: 0.0,
            indent_first_line: 0.0,
            page_break_before: false,
            runs,
        }
    }

    fn document(paragraphs: Vec<Paragraph>) -> Document {
        Document {
            page: PageSetup::default(),
            paragraphs,
            default_font_family: "Helvetica".to_string(),
            default_font_size: 10.0,
            declared_fonts: Vec::new(),
        }
    }

    fn fonts() -> FontSet {
        let mut set = FontSet::new();
        set.insert("Helvetica", false, false, PdfFont::Standard(StandardFont::Helvetica));
        set
    }

    #[test]
    fn test_length_conversions() {
        let len = Length::from_inches(1.0);
        assert!((len.pt() - 72.0).abs() < 0.01);
        assert_eq!(Length::from_pt(36.0), Length::from_inches(0.5));
    }

    #[test]
    fn test_page_sizes() {
        let letter = PageDimensions::letter();
        assert_eq!(letter.width, Length::from_inches(8.5));
        assert_eq!(letter.height, Length::from_inches(11.0));
    }

    #[test]
    fn test_standard_margins() {
        let margins = Margins::standard();
        assert_eq!(margins.top.pt(), 72.0);
        assert_eq!(margins.left.pt(), 72.0);
    }

    #[test]
    fn test_tokenize() {
        let p = paragraph(vec![run("ab cd\tx\ny"), run("\u{c}z")]);
        let tokens = tokenize(&p);
        assert_eq!(
            tokens,
            vec![
                Token::Word { text: "ab".into(), run: 0 },
                Token::Space { text: " ".into(), run: 0 },
                Token::Word { text: "cd".into(), run: 0 },
                Token::Space { text: "    ".into(), run: 0 },
                Token::Word { text: "x".into(), run: 0 },
                Token::LineBreak,
                Token::Word { text: "y".into(), run: 0 },
                Token::PageBreak,
                Token::Word { text: "z".into(), run: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let pages = layout_document(&document(Vec::new()), &fonts()).expect("layout");
        assert_eq!(pages.len(), 1);
        assert!(pages[0].fragments.is_empty());
        assert_eq!(pages[0].width, 612.0);
    }

    #[test]
    fn test_first_line_position() {
        let pages = layout_document(&document(vec![paragraph(vec![run("Hello world")])]), &fonts())
            .expect("layout");
        let fragment = &pages[0].fragments[0];
        assert_eq!(fragment.text, "Hello world");
        assert_eq!(fragment.x, 72.0);
        assert!(fragment.y < 792.0 - 72.0);
        assert!(fragment.y > 792.0 - 72.0 - 12.0);
    }

    #[test]
    fn test_long_paragraph_wraps_within_margins() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let pages = layout_document(&document(vec![paragraph(vec![run(&text)])]), &fonts())
            .expect("layout");
        let fragments = &pages[0].fragments;

        assert!(fragments.len() > 1, "text should wrap onto several lines");
        for fragment in fragments {
            assert!(fragment.x + fragment.width <= 612.0 - 72.0 + 0.01);
            assert!(!fragment.text.ends_with(' '));
        }
        let ys: Vec<f32> = fragments.iter().map(|f| f.y).collect();
        assert!(ys.windows(2).all(|w| w[1] < w[0]), "lines go down the page");
    }

    #[test]
    fn test_long_word_with_hanging_indent_stays_in_margins() {
        let word = "W".repeat(200);
        let mut p = paragraph(vec![run(&word)]);
        p.indent_left = 72.0;
        p.indent_first_line = -72.0;

        let pages = layout_document(&document(vec![p]), &fonts()).expect("layout");
        let fragments = &pages[0].fragments;

        assert!(fragments.len() > 2, "word should split over several lines");
        assert_eq!(fragments[0].x, 72.0);
        for fragment in &fragments[1..] {
            assert_eq!(fragment.x, 144.0);
        }
        for fragment in fragments {
            assert!(
                fragment.x + fragment.width <= 612.0 - 72.0 + 0.01,
                "fragment overflows right margin: {}",
                fragment.x + fragment.width
            );
        }
        let joined: String = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(joined, word);
    }

    #[test]
    fn test_overflow_paginates() {
        let paragraphs = (0..200).map(|i| paragraph(vec![run(&format!("line {}", i))])).collect();
        let pages = layout_document(&document(paragraphs), &fonts()).expect("layout");
        assert!(pages.len() >= 3);
        for page in &pages {
            for fragment in &page.fragments {
                assert!(fragment.y >= 72.0 - 0.01, "text crossed bottom margin");
            }
        }
    }

    #[test]
    fn test_explicit_page_break() {
        let pages = layout_document(&document(vec![paragraph(vec![run("one\u{c}two")])]), &fonts())
            .expect("layout");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].fragments[0].text, "one");
        assert_eq!(pages[1].fragments[0].text, "two");
    }

    #[test]
    fn test_center_and_right_alignment() {
        let mut centered = paragraph(vec![run("mid")]);
        centered.alignment = Alignment::Center;
        let mut right = paragraph(vec![run("end")]);
        right.alignment = Alignment::Right;

        let pages = layout_document(&document(vec![centered, right]), &fonts()).expect("layout");
        let mid = &pages[0].fragments[0];
        let end = &pages[0].fragments[1];

        let center_of_mid = mid.x + mid.width / 2.0;
        assert!((center_of_mid - 306.0).abs() < 0.01);
        assert!((end.x + end.width - 540.0).abs() < 0.01);
    }

    #[test]
    fn test_unresolved_run_font_is_error() {
        let mut r = run("x");
        r.font_family = "Missing".into();
        let result = layout_document(&document(vec![paragraph(vec![r])]), &fonts());
        assert!(matches!(result, Err(Error::Font(_))));
    }
}
