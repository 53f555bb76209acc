//! Reads the XHTML projection back into a flat list of text blocks.
//!
//! Only the structural elements the resume templates emit are recognised:
//! `h1` (name), `p.role`, `p.contact`, `h2` (section heading), `p`, `li`.
//! Everything inside `head`, `style`, `script` and `title` is skipped; any
//! other element is transparent and contributes its text to the enclosing block.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Title,
    Role,
    Contact,
    Heading,
    Paragraph,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

const SKIPPED: &[&[u8]] = &[b"head", b"style", b"script", b"title"];

fn block_kind(element: &BytesStart<'_>) -> Result<Option<BlockKind>, quick_xml::Error> {
    let kind = match element.local_name().as_ref() {
        b"h1" => Some(BlockKind::Title),
        b"h2" | b"h3" => Some(BlockKind::Heading),
        b"li" => Some(BlockKind::Bullet),
        b"p" => {
            let class = match element.try_get_attribute("class")? {
                Some(attr) => attr.unescape_value()?.into_owned(),
                None => String::new(),
            };
            let classes: Vec<&str> = class.split_whitespace().collect();
            if classes.contains(&"role") {
                Some(BlockKind::Role)
            } else if classes.contains(&"contact") {
                Some(BlockKind::Contact)
            } else {
                Some(BlockKind::Paragraph)
            }
        }
        _ => None,
    };
    Ok(kind)
}

struct OpenBlock {
    kind: BlockKind,
    tag: Vec<u8>,
    depth: usize,
    text: String,
}

/// Parses well-formed XHTML into ordered blocks with whitespace collapsed.
/// Blocks whose text is empty are dropped.
pub fn parse_blocks(xhtml: &str) -> Result<Vec<Block>, quick_xml::Error> {
    let mut reader = Reader::from_str(xhtml);
    reader.trim_text(false);
    reader.check_end_names(true);

    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut skip_until: Option<usize> = None;
    let mut open: Option<OpenBlock> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                if skip_until.is_some() {
                    continue;
                }
                if SKIPPED.contains(&e.local_name().as_ref()) {
                    skip_until = Some(depth);
                    continue;
                }
                if open.is_none() {
                    if let Some(kind) = block_kind(&e)? {
                        open = Some(OpenBlock {
                            kind,
                            tag: e.local_name().as_ref().to_vec(),
                            depth,
                            text: String::new(),
                        });
                    }
                }
            }
            Event::End(e) => {
                if skip_until == Some(depth) {
                    skip_until = None;
                } else if skip_until.is_none() {
                    let closes_block = open
                        .as_ref()
                        .is_some_and(|b| b.depth == depth && b.tag == e.local_name().as_ref());
                    if closes_block {
                        if let Some(block) = open.take() {
                            let text = block.text.split_whitespace().collect::<Vec<_>>().join(" ");
                            if !text.is_empty() {
                                blocks.push(Block {
                                    kind: block.kind,
                                    text,
                                });
                            }
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Empty(e) => {
                // <br/> inside a block separates words
                if skip_until.is_none() && e.local_name().as_ref() == b"br" {
                    if let Some(block) = open.as_mut() {
                        block.text.push(' ');
                    }
                }
            }
            Event::Text(t) => {
                if skip_until.is_none() {
                    if let Some(block) = open.as_mut() {
                        block.text.push_str(&t.unescape()?);
                    }
                }
            }
            Event::CData(t) => {
                if skip_until.is_none() {
                    if let Some(block) = open.as_mut() {
                        block.text.push_str(&String::from_utf8_lossy(&t));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(blocks)
}
