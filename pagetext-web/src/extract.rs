//! Paragraph text extraction from HTML.
//!
//! Markup is tokenized by html5ever, which never fails and decodes character
//! references, but the tree is built here with as-written nesting instead of
//! the HTML5 tree-construction rules:
//!
//! - a start tag opens an element inside whatever is currently open, so a
//!   `<p>` inside a `<p>` (or a `<div>` inside a `<p>`) stays nested;
//! - an end tag closes the most recent open element with that name and
//!   everything opened after it; an end tag with no open match is ignored;
//! - void elements (`<br>`, `<img>`, ...) and self-closing tags never hold
//!   content;
//! - elements still open at the end of input are closed there.
//!
//! Text of a nested paragraph therefore counts for the inner and the outer
//! element alike. `<script>` and `<style>` bodies are raw text and never part
//! of a paragraph's text.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "command", "embed", "frame", "hr",
    "image", "img", "input", "isindex", "keygen", "link", "menuitem", "meta", "nextid",
    "param", "source", "spacer", "track", "wbr",
];

struct OpenElement {
    name: String,
    /// Index into `ParagraphSink::paragraphs` when this element is a `<p>`.
    paragraph: Option<usize>,
}

/// Collects the raw text of every `<p>` while tracking the open-element stack.
#[derive(Default)]
struct ParagraphSink {
    open: Vec<OpenElement>,
    paragraphs: Vec<String>,
    /// Depth of open `<script>`/`<style>` elements.
    raw_depth: usize,
}

impl ParagraphSink {
    fn start(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        let name: &str = &tag.name;
        if VOID_ELEMENTS.contains(&name) {
            return TokenSinkResult::Continue;
        }

        let paragraph = (name == "p").then(|| {
            self.paragraphs.push(String::new());
            self.paragraphs.len() - 1
        });
        if tag.self_closing {
            return TokenSinkResult::Continue;
        }

        self.open.push(OpenElement {
            name: name.to_string(),
            paragraph,
        });
        match name {
            "script" => {
                self.raw_depth += 1;
                TokenSinkResult::RawData(RawKind::ScriptData)
            }
            "style" => {
                self.raw_depth += 1;
                TokenSinkResult::RawData(RawKind::Rawtext)
            }
            _ => TokenSinkResult::Continue,
        }
    }

    fn end(&mut self, tag: &Tag) {
        let name: &str = &tag.name;
        let Some(pos) = self.open.iter().rposition(|el| el.name == name) else {
            return;
        };
        for el in self.open.drain(pos..) {
            if el.name == "script" || el.name == "style" {
                self.raw_depth -= 1;
            }
        }
    }

    fn text(&mut self, chunk: &str) {
        if self.raw_depth > 0 {
            return;
        }
        for idx in self.open.iter().filter_map(|el| el.paragraph) {
            self.paragraphs[idx].push_str(chunk);
        }
    }
}

impl TokenSink for ParagraphSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => return self.start(&tag),
                TagKind::EndTag => self.end(&tag),
            },
            Token::CharacterTokens(chunk) => self.text(&chunk),
            Token::DoctypeToken(_)
            | Token::CommentToken(_)
            | Token::NullCharacterToken
            | Token::EOFToken
            | Token::ParseError(_) => {}
        }
        TokenSinkResult::Continue
    }
}

fn collect(html: &str) -> Vec<String> {
    let mut input = BufferQueue::new();
    input.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(ParagraphSink::default(), TokenizerOpts::default());
    // The sink never hands back a script handle, so feeding always runs to completion.
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
    tokenizer.sink.paragraphs
}

/// Trimmed text of every `<p>` element, in document order.
///
/// Each entry is the concatenation of the element's descendant text with
/// leading and trailing whitespace removed. Empty paragraphs yield empty
/// strings; nothing is deduplicated.
pub fn paragraphs(html: &str) -> Vec<String> {
    collect(html)
        .into_iter()
        .map(|p| p.trim().to_string())
        .collect()
}

/// Concatenation of [`paragraphs`] with no separator.
///
/// ```
/// use pagetext_web::extract::paragraph_text;
///
/// assert_eq!(paragraph_text("<p> A </p><p>B</p>"), "AB");
/// assert_eq!(paragraph_text("<div>no paragraphs</div>"), "");
/// ```
pub fn paragraph_text(html: &str) -> String {
    collect(html).iter().map(|p| p.trim()).collect()
}
