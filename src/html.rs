use super::*;

fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    fn decode_numeric(value: &str) -> Option<char> {
        let codepoint =
            if let Some(hex) = value.strip_prefix('x').or_else(|| value.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                value.parse::<u32>().ok()?
            };
        char::from_u32(codepoint)
    }

    fn decode_named(value: &str) -> Option<char> {
        match value {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "copy" => Some('©'),
            "hellip" => Some('…'),
            "middot" => Some('·'),
            "times" => Some('×'),
            "larr" => Some('←'),
            "rarr" => Some('→'),
            _ => None,
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail.find(';').and_then(|semicolon| {
            let raw = &tail[..semicolon];
            let value = match raw.strip_prefix('#') {
                Some(numeric) => decode_numeric(numeric),
                None => decode_named(raw),
            };
            value.map(|ch| (ch, semicolon + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Builds a document from report markup. Report generators emit well-formed
/// tables, but hand-edited pages drop `</tr>`/`</td>`, so those end tags are
/// implied the way browsers imply them.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut cursor = Cursor { src: html, pos: 0 };
    let mut builder = TreeBuilder::new();

    while !cursor.at_end() {
        if cursor.eat("<!--") {
            cursor
                .skip_past("-->")
                .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
        } else if cursor.opens_markup() {
            if cursor.starts_with("</") {
                let tag = cursor.end_tag()?;
                builder.close(&tag);
            } else if cursor.eat("<!") {
                cursor.declaration()?;
            } else {
                let tag = cursor.start_tag()?;
                let raw_text = (RAW_TEXT_TAGS.contains(&tag.name.as_str()) && !tag.self_closing)
                    .then(|| tag.name.clone());
                let node = builder.open(tag);
                if let Some(name) = raw_text {
                    let body = cursor.raw_text(&name)?;
                    if !body.is_empty() {
                        builder.dom.create_text(node, body.to_string());
                    }
                }
            }
        } else {
            let text = decode_html_character_references(cursor.text());
            if !text.is_empty() {
                let parent = builder.current();
                builder.dom.create_text(parent, text);
            }
        }
    }

    Ok(builder.dom)
}

const RAW_TEXT_TAGS: &[&str] = &["script", "style", "title", "textarea"];

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

/// Document under construction plus the stack of elements still open.
struct TreeBuilder {
    dom: Dom,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let dom = Dom::new();
        let open = vec![dom.root];
        Self { dom, open }
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.dom.root)
    }

    fn open(&mut self, tag: StartTag) -> NodeId {
        let name = tag.name.as_str();
        if matches!(name, "td" | "th" | "tr" | "tbody" | "thead" | "tfoot") {
            self.pop_to_nearest(&["td", "th"], &["tr", "table"]);
        }
        if matches!(name, "tr" | "tbody" | "thead" | "tfoot") {
            self.pop_to_nearest(&["tr"], &["table"]);
        }

        let keeps_open =
            !tag.self_closing && !RAW_TEXT_TAGS.contains(&name) && !is_void_tag(name);
        let parent = self.current();
        let node = self.dom.create_element(parent, tag.name, tag.attrs);
        if keeps_open {
            self.open.push(node);
        }
        node
    }

    /// Closes the innermost open `tag` and everything inside it. End tags
    /// with nothing to close are dropped.
    fn close(&mut self, tag: &str) {
        if let Some(index) = self.open.iter().rposition(|node| self.dom.is_tag(*node, tag)) {
            self.open.truncate(index);
        }
    }

    /// Pops up to and including the nearest open element named in `targets`,
    /// unless an element named in `barriers` is reached first.
    fn pop_to_nearest(&mut self, targets: &[&str], barriers: &[&str]) {
        for index in (1..self.open.len()).rev() {
            let node = self.open[index];
            if targets.iter().any(|tag| self.dom.is_tag(node, tag)) {
                self.open.truncate(index);
                return;
            }
            if barriers.iter().any(|tag| self.dom.is_tag(node, tag)) {
                return;
            }
        }
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        let matched = self.starts_with(prefix);
        if matched {
            self.pos += prefix.len();
        }
        matched
    }

    fn skip_past(&mut self, needle: &str) -> Option<()> {
        let found = self.rest().find(needle)?;
        self.pos += found + needle.len();
        Some(())
    }

    /// `<` followed by a name, `/` or `!`; any other `<` is plain text.
    fn opens_markup(&self) -> bool {
        let bytes = self.rest().as_bytes();
        bytes.first() == Some(&b'<')
            && bytes
                .get(1)
                .is_some_and(|b| *b == b'/' || *b == b'!' || b.is_ascii_alphabetic())
    }

    fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn skip_ws(&mut self) {
        self.take_while(|b| b.is_ascii_whitespace());
    }

    fn next_char_len(&self) -> usize {
        self.rest().chars().next().map_or(1, char::len_utf8)
    }

    /// Text up to the next `<` after the current character.
    fn text(&mut self) -> &'a str {
        let start = self.pos;
        let first = self.next_char_len();
        let end = self.rest()[first..]
            .find('<')
            .map_or(self.src.len(), |offset| start + first + offset);
        self.pos = end;
        &self.src[start..end]
    }

    fn start_tag(&mut self) -> Result<StartTag> {
        self.pos += 1;
        let name = self.take_while(is_tag_char).to_ascii_lowercase();
        if name.is_empty() {
            return Err(Error::HtmlParse("empty tag name".into()));
        }

        let mut attrs: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_ws();
            if self.at_end() {
                return Err(Error::HtmlParse(format!("unclosed start tag <{name}>")));
            }
            if self.eat(">") {
                return Ok(StartTag {
                    name,
                    attrs,
                    self_closing: false,
                });
            }
            if self.eat("/>") {
                return Ok(StartTag {
                    name,
                    attrs,
                    self_closing: true,
                });
            }

            let attr_name = self.take_while(is_attr_name_char).to_ascii_lowercase();
            if attr_name.is_empty() {
                // Junk inside a tag is skipped up to the next break.
                self.pos += self.next_char_len();
                self.unquoted_value();
                continue;
            }
            self.skip_ws();
            let value = if self.eat("=") {
                self.skip_ws();
                self.attr_value()?
            } else {
                String::new()
            };
            if !attrs.iter().any(|(existing, _)| *existing == attr_name) {
                attrs.push((attr_name, value));
            }
        }
    }

    fn attr_value(&mut self) -> Result<String> {
        let raw = match self.peek() {
            None => return Err(Error::HtmlParse("missing attribute value".into())),
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let len = self
                    .rest()
                    .find(char::from(quote))
                    .ok_or_else(|| Error::HtmlParse("unclosed quoted attribute value".into()))?;
                let value = &self.rest()[..len];
                self.pos += len + 1;
                value
            }
            Some(_) => self.unquoted_value(),
        };
        Ok(decode_html_character_references(raw))
    }

    /// Runs to whitespace, `>` or `/>`.
    fn unquoted_value(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b'>' || self.starts_with("/>") {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn end_tag(&mut self) -> Result<String> {
        self.pos += 2;
        self.skip_ws();
        let name = self.take_while(is_tag_char).to_ascii_lowercase();
        self.skip_past(">")
            .ok_or_else(|| Error::HtmlParse(format!("unclosed end tag </{name}")))?;
        Ok(name)
    }

    /// Skips `<!DOCTYPE ...>` and similar, honoring quoted `>`.
    fn declaration(&mut self) -> Result<()> {
        let mut quote: Option<u8> = None;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match quote {
                Some(open) if b == open => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => return Ok(()),
                None => {}
            }
        }
        Err(Error::HtmlParse("unclosed declaration tag".into()))
    }

    /// Body of a raw-text element up to its end tag, which is consumed too.
    fn raw_text(&mut self, tag: &str) -> Result<&'a str> {
        let start = self.pos;
        loop {
            let offset = self.rest().find("</").ok_or_else(|| {
                Error::HtmlParse(format!("unclosed <{tag}>"))
            })?;
            self.pos += offset;
            let after = self.rest()[2..].trim_start();
            let closes = after
                .get(..tag.len())
                .is_some_and(|name| name.eq_ignore_ascii_case(tag))
                && !after
                    .as_bytes()
                    .get(tag.len())
                    .is_some_and(u8::is_ascii_alphanumeric);
            if closes {
                let body = &self.src[start..self.pos];
                self.end_tag()?;
                return Ok(body);
            }
            self.pos += 2;
        }
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    is_tag_char(b) || b == b':'
}
