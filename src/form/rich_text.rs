use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

fn parser(markdown: &str) -> Parser<'_> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    Parser::new_ext(markdown, options)
}

/// Visible text of a markdown document, with block boundaries collapsed to
/// single spaces.
pub fn plain_text(markdown: &str) -> String {
    let mut out = String::new();
    for event in parser(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => {
                out.push_str(&text);
            }
            Event::SoftBreak | Event::HardBreak => push_gap(&mut out),
            Event::End(end) if ends_block(&end) => push_gap(&mut out),
            _ => {}
        }
    }
    out.trim_end().to_owned()
}

fn push_gap(out: &mut String) {
    if !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
}

fn ends_block(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::Item
            | TagEnd::CodeBlock
            | TagEnd::TableCell
            | TagEnd::BlockQuote(_)
    )
}

/// True when the document holds nothing but whitespace or bare block
/// syntax. Raw HTML counts as content.
pub fn is_blank(markdown: &str) -> bool {
    for event in parser(markdown) {
        match event {
            Event::Text(text)
            | Event::Code(text)
            | Event::InlineMath(text)
            | Event::Html(text)
            | Event::InlineHtml(text)
                if !text.trim().is_empty() =>
            {
                return false;
            }
            Event::Rule | Event::Start(Tag::Image { .. }) => return false,
            _ => {}
        }
    }
    true
}

/// HTML preview of a rich text value.
pub fn to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser(markdown));
    out
}

pub(crate) fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}
