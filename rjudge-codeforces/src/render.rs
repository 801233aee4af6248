use rjudge_util::regex;
use rjudge_util::service::scrape::Scrape as _;
use scraper::{ElementRef, Node};

/// Renders the children of `elem` as markdown, skipping `.section-title` headings.
pub fn render_section(elem: ElementRef) -> String {
    let mut out = String::new();
    render_children(elem, &mut out, true);
    sanitize(out.trim())
}

/// Collapses `$$$` math delimiters to `$` and drops every backslash that is
/// not followed by an ASCII letter.
pub fn sanitize(text: &str) -> String {
    let text = text.replace("$$$", "$");
    let mut ret = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let next_is_letter = chars.peek().map_or(false, |n| n.is_ascii_alphabetic());
        if c != '\\' || next_is_letter {
            ret.push(c);
        }
    }
    ret
}

/// Text of a sample `pre` block. Line `div`s and `br`s become newlines.
pub fn sample_text(pre: ElementRef) -> String {
    let lines = pre
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|elem| elem.value().name() == "div")
        .map(|elem| elem.inner_text())
        .collect::<Vec<_>>();
    if !lines.is_empty() {
        return lines.join("\n");
    }

    let mut text = String::new();
    for child in pre.descendants() {
        match child.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text.trim().to_owned()
}

fn render_children(elem: ElementRef, out: &mut String, skip_title: bool) {
    for child in elem.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    let is_title = child.value().classes().any(|c| c == "section-title");
                    if !(skip_title && is_title) {
                        render_element(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn render_element(elem: ElementRef, out: &mut String) {
    match elem.value().name() {
        "br" => out.push('\n'),
        "p" | "div" | "center" | "ul" | "ol" => {
            break_block(out);
            render_children(elem, out, false);
            break_block(out);
        }
        "li" => {
            break_line(out);
            out.push_str("- ");
            render_children(elem, out, false);
            break_line(out);
        }
        "b" | "strong" => wrap(elem, out, "**"),
        "i" | "em" => wrap(elem, out, "*"),
        "pre" => {
            break_block(out);
            out.push_str("```\n");
            out.push_str(sample_text(elem).trim_end());
            out.push_str("\n```");
            break_block(out);
        }
        "img" => {
            if let Some(src) = elem.value().attr("src") {
                out.push_str(&format!("![]({})", src));
            }
        }
        "script" | "style" => {}
        _ => render_children(elem, out, false),
    }
}

fn wrap(elem: ElementRef, out: &mut String, mark: &str) {
    out.push_str(mark);
    render_children(elem, out, false);
    out.push_str(mark);
}

fn push_text(out: &mut String, text: &str) {
    let text = regex!(r"\s+").replace_all(text, " ");
    if out.is_empty() || out.ends_with('\n') {
        out.push_str(text.trim_start());
    } else {
        out.push_str(&text);
    }
}

fn break_line(out: &mut String) {
    trim_end_spaces(out);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn break_block(out: &mut String) {
    trim_end_spaces(out);
    if out.is_empty() {
        return;
    }
    while !out.ends_with("\n\n") {
        out.push('\n');
    }
}

fn trim_end_spaces(out: &mut String) {
    let len = out.trim_end_matches(' ').len();
    out.truncate(len);
}
