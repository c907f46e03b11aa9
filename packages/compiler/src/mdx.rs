//! # MDX Block Compiler
//!
//! Line-oriented compiler from MDX body text (frontmatter already removed)
//! to a `RenderTree`.
//!
//! Recognized blocks, checked in this order for each line:
//!
//! ```text
//! blank           ends paragraph / list / quote
//! ``` or ~~~      fenced code (language normalized)
//! import/export   module statements (top level only)
//! # .. ######     heading
//! --- *** ___     thematic break
//! - * + 1.        list items (indented lines continue an item)
//! >               blockquote
//! <Tag ...>       JSX element, may span lines and nest
//! {...}           expression block, may span lines
//! anything else   paragraph text
//! ```
//!
//! Structural problems (unterminated fence, unbalanced tags or braces) are
//! reported with 1-based line numbers relative to the body.

use crate::headings::{parse_heading, AnchorAllocator};
use crate::render::{PropValue, RenderNode, RenderTree};
use crate::{CompileError, CompileResult};
use folio_fences::Fence;
use std::collections::BTreeMap;

const FRAGMENT: &str = "Fragment";

/// Compile an MDX body into a render tree
pub fn compile_mdx(body: &str) -> CompileResult<RenderTree> {
    let lines: Vec<&str> = body.lines().collect();
    let mut compiler = BlockCompiler::default();
    let mut index = 0;

    while index < lines.len() {
        index = compiler.line(&lines, index)?;
    }

    compiler.finish()
}

#[derive(Debug)]
struct OpenComponent {
    name: String,
    props: BTreeMap<String, PropValue>,
    children: Vec<RenderNode>,
    line: usize,
}

#[derive(Debug)]
struct ListBuilder {
    ordered: bool,
    items: Vec<String>,
}

#[derive(Debug, Default)]
struct BlockCompiler<'a> {
    anchors: AnchorAllocator,
    root: Vec<RenderNode>,
    stack: Vec<OpenComponent>,
    module_statements: Vec<String>,
    paragraph: Vec<&'a str>,
    paragraph_line: usize,
    list: Option<ListBuilder>,
    quote: Vec<&'a str>,
}

impl<'a> BlockCompiler<'a> {
    /// Consume the block starting at `lines[index]`; returns the next index
    fn line(&mut self, lines: &[&'a str], index: usize) -> CompileResult<usize> {
        let line = lines[index];
        let trimmed = line.trim_start();
        let line_no = index + 1;

        if trimmed.is_empty() {
            self.flush()?;
            return Ok(index + 1);
        }

        if let Some(open) = Fence::open(line) {
            self.flush()?;
            let (_, meta) = open.tag();
            let close = lines[index + 1..]
                .iter()
                .position(|l| open.fence.is_closed_by(l))
                .map(|offset| index + 1 + offset)
                .ok_or(CompileError::UnterminatedFence { line: line_no })?;

            self.push(RenderNode::CodeBlock {
                language: open.language(),
                meta: (!meta.is_empty()).then(|| meta.to_string()),
                code: lines[index + 1..close].join("\n"),
            });
            return Ok(close + 1);
        }

        if self.stack.is_empty() && (line.starts_with("import ") || line.starts_with("export ")) {
            self.flush()?;
            let end = balanced_end(lines, index)?;
            self.module_statements.push(lines[index..=end].join("\n"));
            return Ok(end + 1);
        }

        if let Some((depth, text)) = parse_heading(line) {
            self.flush()?;
            let anchor = self.anchors.allocate(text);
            self.push(RenderNode::Heading {
                depth,
                text: text.to_string(),
                anchor,
            });
            return Ok(index + 1);
        }

        if is_thematic_break(line) {
            self.flush()?;
            self.push(RenderNode::ThematicBreak);
            return Ok(index + 1);
        }

        if self.list.is_some() && line.starts_with([' ', '\t']) {
            if let Some(item) = self.list.as_mut().and_then(|l| l.items.last_mut()) {
                item.push(' ');
                item.push_str(trimmed.trim_end());
            }
            return Ok(index + 1);
        }

        if let Some((ordered, item)) = list_item(line) {
            self.flush_paragraph()?;
            self.flush_quote();
            if self.list.as_ref().is_some_and(|l| l.ordered != ordered) {
                self.flush_list();
            }
            self.list
                .get_or_insert_with(|| ListBuilder {
                    ordered,
                    items: Vec::new(),
                })
                .items
                .push(item.trim_end().to_string());
            return Ok(index + 1);
        }

        if let Some(quoted) = trimmed.strip_prefix('>') {
            self.flush_paragraph()?;
            self.flush_list();
            self.quote.push(quoted.strip_prefix(' ').unwrap_or(quoted));
            return Ok(index + 1);
        }

        if is_tag_start(trimmed) {
            self.flush()?;
            return self.tag(lines, index);
        }

        if trimmed.starts_with('{') {
            self.flush()?;
            let end = balanced_end(lines, index)?;
            let code = lines[index..=end].join("\n");
            let code = code.trim();
            let code = code
                .strip_prefix('{')
                .and_then(|c| c.strip_suffix('}'))
                .unwrap_or(code);
            self.push(RenderNode::Expression {
                code: code.trim().to_string(),
            });
            return Ok(end + 1);
        }

        self.flush_list();
        self.flush_quote();
        if self.paragraph.is_empty() {
            self.paragraph_line = line_no;
        }
        self.paragraph.push(trimmed.trim_end());
        Ok(index + 1)
    }

    fn tag(&mut self, lines: &[&'a str], index: usize) -> CompileResult<usize> {
        let line_no = index + 1;
        let trimmed = lines[index].trim();

        if let Some(rest) = trimmed.strip_prefix("</") {
            let name = rest.trim_end_matches('>').trim();
            let name = if name.is_empty() { FRAGMENT } else { name };
            self.close(name, line_no)?;
            return Ok(index + 1);
        }

        // Opening tag, possibly spanning several lines
        let mut text = String::from(trimmed);
        let mut last = index;
        let end = loop {
            if let Some(end) = tag_end(&text) {
                break end;
            }
            last += 1;
            match lines.get(last) {
                Some(next) => {
                    text.push('\n');
                    text.push_str(next.trim());
                }
                None => {
                    return Err(CompileError::UnclosedTag {
                        name: tag_name(&text).to_string(),
                        line: line_no,
                    })
                }
            }
        };

        let tag_src = &text[..=end];
        let rest = text[end + 1..].trim();
        let self_closing = tag_src.ends_with("/>");
        let name = tag_name(tag_src).to_string();
        let inner = tag_src
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/');
        let props = parse_props(&inner[inner.find(char::is_whitespace).unwrap_or(inner.len())..]);

        if self_closing {
            self.push(RenderNode::Component {
                name,
                props,
                children: Vec::new(),
            });
            if !rest.is_empty() {
                self.push(RenderNode::paragraph(rest));
            }
            return Ok(last + 1);
        }

        let closing = format!("</{}>", if name == FRAGMENT { "" } else { name.as_str() });
        if let Some(content) = rest.strip_suffix(closing.as_str()) {
            let content = content.trim();
            let children = if content.is_empty() {
                Vec::new()
            } else {
                vec![RenderNode::paragraph(content)]
            };
            self.push(RenderNode::Component {
                name,
                props,
                children,
            });
            return Ok(last + 1);
        }

        self.stack.push(OpenComponent {
            name,
            props,
            children: Vec::new(),
            line: line_no,
        });
        if !rest.is_empty() {
            if !braces_balanced(rest) {
                return Err(CompileError::UnbalancedExpression { line: last + 1 });
            }
            self.push(RenderNode::paragraph(rest));
        }
        Ok(last + 1)
    }

    fn close(&mut self, name: &str, line: usize) -> CompileResult<()> {
        let Some(open) = self.stack.pop() else {
            return Err(CompileError::UnexpectedClosingTag {
                name: name.to_string(),
                line,
            });
        };

        if open.name != name {
            return Err(CompileError::MismatchedTag {
                expected: open.name,
                found: name.to_string(),
                line,
            });
        }

        self.push(RenderNode::Component {
            name: open.name,
            props: open.props,
            children: open.children,
        });
        Ok(())
    }

    fn push(&mut self, node: RenderNode) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.root.push(node),
        }
    }

    fn flush(&mut self) -> CompileResult<()> {
        self.flush_paragraph()?;
        self.flush_list();
        self.flush_quote();
        Ok(())
    }

    fn flush_paragraph(&mut self) -> CompileResult<()> {
        if self.paragraph.is_empty() {
            return Ok(());
        }

        let text = std::mem::take(&mut self.paragraph).join(" ");
        if !braces_balanced(&text) {
            return Err(CompileError::UnbalancedExpression {
                line: self.paragraph_line,
            });
        }
        if !text.is_empty() {
            self.push(RenderNode::Paragraph { text });
        }
        Ok(())
    }

    fn flush_list(&mut self) {
        if let Some(list) = self.list.take() {
            self.push(RenderNode::List {
                ordered: list.ordered,
                items: list.items,
            });
        }
    }

    fn flush_quote(&mut self) {
        if !self.quote.is_empty() {
            let text = std::mem::take(&mut self.quote).join(" ").trim().to_string();
            self.push(RenderNode::Blockquote { text });
        }
    }

    fn finish(mut self) -> CompileResult<RenderTree> {
        self.flush()?;

        if let Some(open) = self.stack.pop() {
            return Err(CompileError::UnclosedTag {
                name: open.name,
                line: open.line,
            });
        }

        Ok(RenderTree {
            nodes: self.root,
            module_statements: self.module_statements,
        })
    }
}

fn is_thematic_break(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && line.len() - line.trim_start().len() <= 3
        && ['-', '*', '_']
            .iter()
            .any(|marker| compact.chars().all(|c| c == *marker))
}

/// `(ordered, item text)` for a list item line
fn list_item(line: &str) -> Option<(bool, &str)> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }

    for bullet in ["- ", "* ", "+ "] {
        if let Some(item) = trimmed.strip_prefix(bullet) {
            return Some((false, item.trim_start()));
        }
    }

    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let rest = &trimmed[digits..];
    rest.strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))
        .map(|item| (true, item.trim_start()))
}

fn is_tag_start(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    chars.next() == Some('<')
        && matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '>')
}

fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<');
    let end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':')))
        .unwrap_or(inner.len());
    if end == 0 {
        FRAGMENT
    } else {
        &inner[..end]
    }
}

/// Index of the `>` ending the opening tag in `text`, skipping quoted and
/// braced attribute values
fn tag_end(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for (i, c) in text.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if depth == 0 => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => depth = depth.saturating_sub(1),
            (None, '>') if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_props(src: &str) -> BTreeMap<String, PropValue> {
    let mut props = BTreeMap::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '=' {
            i += 1;
        }
        let name: String = chars[start..i].iter().collect();
        if name.is_empty() {
            i += 1;
            continue;
        }

        if i >= chars.len() || chars[i] != '=' {
            props.insert(name, PropValue::Flag);
            continue;
        }
        i += 1;

        match chars.get(i) {
            Some(&q @ ('"' | '\'')) => {
                let value_start = i + 1;
                i = value_start;
                while i < chars.len() && chars[i] != q {
                    i += 1;
                }
                props.insert(name, PropValue::Literal(chars[value_start..i.min(chars.len())].iter().collect()));
                i += 1;
            }
            Some('{') => {
                let value_start = i + 1;
                let mut depth = 0usize;
                while i < chars.len() {
                    match chars[i] {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                let value: String = chars[value_start..i.min(chars.len())].iter().collect();
                props.insert(name, PropValue::Expression(value.trim().to_string()));
                i += 1;
            }
            _ => {
                let value_start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                props.insert(name, PropValue::Literal(chars[value_start..i].iter().collect()));
            }
        }
    }

    props
}

/// Brace balance outside inline code spans
fn braces_balanced(text: &str) -> bool {
    let mut depth = 0i64;
    let mut in_code = false;

    for c in text.chars() {
        match c {
            '`' => in_code = !in_code,
            '{' if !in_code => depth += 1,
            '}' if !in_code => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Last line index of a brace-balanced block starting at `start`
fn balanced_end(lines: &[&str], start: usize) -> CompileResult<usize> {
    let mut depth = 0i64;

    for (offset, line) in lines[start..].iter().enumerate() {
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(CompileError::UnbalancedExpression {
                    line: start + offset + 1,
                });
            }
        }
        if depth == 0 {
            return Ok(start + offset);
        }
    }

    Err(CompileError::UnbalancedExpression { line: start + 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_fences::Language;

    #[test]
    fn test_headings_paragraphs_and_code() {
        let tree = compile_mdx("# Hi\n\nSome text\nwrapped.\n\n```js\nconsole.log(1)\n```\n").unwrap();

        assert_eq!(
            tree.nodes,
            vec![
                RenderNode::Heading {
                    depth: 1,
                    text: "Hi".to_string(),
                    anchor: "hi".to_string(),
                },
                RenderNode::paragraph("Some text wrapped."),
                RenderNode::CodeBlock {
                    language: Language::Javascript,
                    meta: None,
                    code: "console.log(1)".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_nested_components() {
        let source = "<Tabs>\n<Tab label=\"One\" default>\n## Inside\n</Tab>\n</Tabs>\n";
        let tree = compile_mdx(source).unwrap();

        let RenderNode::Component { name, children, .. } = &tree.nodes[0] else {
            panic!("expected component, got {:?}", tree.nodes[0]);
        };
        assert_eq!(name, "Tabs");

        let RenderNode::Component { name, props, children } = &children[0] else {
            panic!("expected nested component");
        };
        assert_eq!(name, "Tab");
        assert_eq!(props.get("label"), Some(&PropValue::Literal("One".to_string())));
        assert_eq!(props.get("default"), Some(&PropValue::Flag));
        assert!(matches!(children[0], RenderNode::Heading { depth: 2, .. }));
    }

    #[test]
    fn test_self_closing_and_inline_components() {
        let source = "<Image src=\"/a.png\" width={320} />\n<Badge>New</Badge>\n";
        let tree = compile_mdx(source).unwrap();

        assert_eq!(tree.nodes.len(), 2);
        let RenderNode::Component { props, children, .. } = &tree.nodes[0] else {
            panic!("expected component");
        };
        assert_eq!(props.get("width"), Some(&PropValue::Expression("320".to_string())));
        assert!(children.is_empty());

        let RenderNode::Component { children, .. } = &tree.nodes[1] else {
            panic!("expected component");
        };
        assert_eq!(children, &vec![RenderNode::paragraph("New")]);
    }

    #[test]
    fn test_multiline_opening_tag() {
        let source = "<Callout\n  type=\"warn\"\n  title=\"Heads up\">\nCareful.\n</Callout>\n";
        let tree = compile_mdx(source).unwrap();

        let RenderNode::Component { props, children, .. } = &tree.nodes[0] else {
            panic!("expected component");
        };
        assert_eq!(props.len(), 2);
        assert_eq!(children, &vec![RenderNode::paragraph("Careful.")]);
    }

    #[test]
    fn test_module_statements_are_not_rendered() {
        let source = "import { Callout } from './callout'\nexport const meta = {\n  a: 1,\n}\n\n# Doc\n";
        let tree = compile_mdx(source).unwrap();

        assert_eq!(tree.module_statements.len(), 2);
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_lists_quotes_and_breaks() {
        let source = "- one\n- two\n  continued\n1. first\n> quoted\n> more\n\n***\n";
        let tree = compile_mdx(source).unwrap();

        assert_eq!(
            tree.nodes,
            vec![
                RenderNode::List {
                    ordered: false,
                    items: vec!["one".to_string(), "two continued".to_string()],
                },
                RenderNode::List {
                    ordered: true,
                    items: vec!["first".to_string()],
                },
                RenderNode::Blockquote {
                    text: "quoted more".to_string(),
                },
                RenderNode::ThematicBreak,
            ]
        );
    }

    #[test]
    fn test_expression_block() {
        let tree = compile_mdx("{items.map(i => (\n  i.name\n))}\n").unwrap();
        assert_eq!(
            tree.nodes,
            vec![RenderNode::Expression {
                code: "items.map(i => (\n  i.name\n))".to_string(),
            }]
        );
    }

    #[test]
    fn test_unterminated_fence() {
        let err = compile_mdx("text\n\n```js\nlet a\n").unwrap_err();
        assert_eq!(err, CompileError::UnterminatedFence { line: 3 });
    }

    #[test]
    fn test_unclosed_component() {
        let err = compile_mdx("<Note>\ntext\n").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnclosedTag {
                name: "Note".to_string(),
                line: 1,
            }
        );
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = compile_mdx("<Note>\ntext\n</Warning>\n").unwrap_err();
        assert!(matches!(err, CompileError::MismatchedTag { line: 3, .. }));
    }

    #[test]
    fn test_stray_closing_tag() {
        let err = compile_mdx("text\n\n</Note>\n").unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedClosingTag { line: 3, .. }));
    }

    #[test]
    fn test_unbalanced_inline_expression() {
        let err = compile_mdx("Hello {name\n").unwrap_err();
        assert_eq!(err, CompileError::UnbalancedExpression { line: 1 });

        // Braces inside inline code are literal
        assert!(compile_mdx("Use `{` to open.\n").is_ok());
    }

    #[test]
    fn test_less_than_in_prose_is_text() {
        let tree = compile_mdx("<3 this\n").unwrap();
        assert_eq!(tree.nodes, vec![RenderNode::paragraph("<3 this")]);
    }
}
