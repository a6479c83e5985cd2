//! A forward-only tag scanner for server-rendered HTML.
//!
//! This is not an HTML parser. It recognizes start tags (with attributes),
//! end tags and comments, skips text, doctype and processing instructions,
//! and treats `<script>`/`<style>` bodies as opaque. Every token carries its
//! byte span in the source so callers can slice or splice the original text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Lowercased attribute name
    pub name: String,
    pub value: Option<&'a str>,
    /// Byte span of the whole attribute, `name="value"` included
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    StartTag {
        name: String,
        attributes: Vec<Attribute<'a>>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Comment {
        body: &'a str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    pub fn is_start(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::StartTag { name, .. } if name == tag)
    }

    pub fn is_end(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::EndTag { name } if name == tag)
    }

    pub fn is_self_closing(&self) -> bool {
        matches!(&self.kind, TokenKind::StartTag { self_closing: true, .. })
    }

    pub fn attributes(&self) -> &[Attribute<'a>] {
        match &self.kind {
            TokenKind::StartTag { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes()
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn attr_value(&self, name: &str) -> Option<&'a str> {
        self.attribute(name).and_then(|a| a.value)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Whitespace-separated `class` entries contain `class_name`.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr_value("class")
            .is_some_and(|c| c.split_whitespace().any(|entry| entry == class_name))
    }
}

pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Scanner { src, pos: 0 }
    }

    /// Start scanning at byte offset `pos`. Must lie on a tag boundary.
    pub fn at(src: &'a str, pos: usize) -> Self {
        Scanner {
            src,
            pos: pos.min(src.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn find_from(&self, from: usize, needle: &str) -> Option<usize> {
        self.src.get(from..)?.find(needle).map(|i| from + i)
    }

    fn skip_whitespace(&self, mut i: usize) -> usize {
        let bytes = self.bytes();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    }

    fn read_name(&self, mut i: usize) -> usize {
        let bytes = self.bytes();
        while i < bytes.len() {
            let b = bytes[i];
            if b.is_ascii_whitespace() || b == b'>' || b == b'/' || b == b'=' {
                break;
            }
            i += 1;
        }
        i
    }

    fn scan_comment(&mut self, start: usize) -> Option<Token<'a>> {
        let src = self.src;
        let body_start = start + 4;
        let close = self.find_from(body_start, "-->")?;
        self.pos = close + 3;
        Some(Token {
            kind: TokenKind::Comment {
                body: &src[body_start..close],
            },
            start,
            end: self.pos,
        })
    }

    fn scan_end_tag(&mut self, start: usize) -> Option<Token<'a>> {
        let name_start = start + 2;
        let name_end = self.read_name(name_start);
        let close = self.find_from(name_end, ">")?;
        self.pos = close + 1;
        Some(Token {
            kind: TokenKind::EndTag {
                name: self.src[name_start..name_end].to_ascii_lowercase(),
            },
            start,
            end: self.pos,
        })
    }

    fn scan_start_tag(&mut self, start: usize) -> Option<Token<'a>> {
        let src = self.src;
        let bytes = self.bytes();
        let name_start = start + 1;
        let name_end = self.read_name(name_start);
        let name = self.src[name_start..name_end].to_ascii_lowercase();

        let mut attributes = Vec::new();
        let mut i = name_end;
        let self_closing;

        loop {
            i = self.skip_whitespace(i);
            match bytes.get(i) {
                None => return None,
                Some(b'>') => {
                    self_closing = false;
                    i += 1;
                    break;
                }
                Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                    self_closing = true;
                    i += 2;
                    break;
                }
                Some(b'/') => {
                    i += 1;
                    continue;
                }
                Some(_) => {}
            }

            let attr_start = i;
            let attr_name_end = self.read_name(i).max(i + 1);
            let attr_name = self.src[attr_start..attr_name_end].to_ascii_lowercase();
            i = self.skip_whitespace(attr_name_end);

            if bytes.get(i) != Some(&b'=') {
                attributes.push(Attribute {
                    name: attr_name,
                    value: None,
                    start: attr_start,
                    end: attr_name_end,
                });
                continue;
            }

            i = self.skip_whitespace(i + 1);
            let (value, value_end) = match bytes.get(i) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let close = src.get(i + 1..)?.find(quote as char)? + i + 1;
                    (&src[i + 1..close], close + 1)
                }
                Some(_) => {
                    let mut j = i;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    (&src[i..j], j)
                }
                None => return None,
            };

            attributes.push(Attribute {
                name: attr_name,
                value: Some(value),
                start: attr_start,
                end: value_end,
            });
            i = value_end;
        }

        self.pos = i;

        // Raw text elements: their bodies may contain anything tag-like
        if !self_closing && (name == "script" || name == "style") {
            let closing = format!("</{}", name);
            if let Some(offset) = find_ignore_ascii_case(&bytes[self.pos..], closing.as_bytes()) {
                let token = Token {
                    kind: TokenKind::StartTag {
                        name,
                        attributes,
                        self_closing,
                    },
                    start,
                    end: self.pos,
                };
                self.pos += offset;
                return Some(token);
            }
        }

        Some(Token {
            kind: TokenKind::StartTag {
                name,
                attributes,
                self_closing,
            },
            start,
            end: i,
        })
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let start = self.find_from(self.pos, "<")?;
            let rest = &self.src[start..];
            let next = rest.as_bytes().get(1).copied();

            if rest.starts_with("<!--") {
                return self.scan_comment(start);
            }

            match next {
                Some(b'/') => return self.scan_end_tag(start),
                Some(b) if b.is_ascii_alphabetic() => return self.scan_start_tag(start),
                Some(b'!') | Some(b'?') => {
                    // Doctype, CDATA or processing instruction
                    self.pos = self.find_from(start, ">")? + 1;
                }
                _ => {
                    // Stray '<' in text
                    self.pos = start + 1;
                }
            }
        }
    }
}

fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Byte offset just past the `</tag>` that balances the start tag ending at
/// `content_start`, tracking nesting of the same tag name.
pub fn matching_close(src: &str, tag: &str, content_start: usize) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    for token in Scanner::at(src, content_start) {
        if token.is_start(tag) && !token.is_self_closing() {
            depth += 1;
        } else if token.is_end(tag) {
            depth -= 1;
            if depth == 0 {
                return Some((token.start, token.end));
            }
        }
    }
    None
}
