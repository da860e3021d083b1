//! Byte-level PDF envelope probes.
//!
//! These helpers locate the handful of structures a metadata edit needs: the
//! header, the last trailer dictionary, `startxref`, indirect object bodies,
//! stream payloads, and individual dictionary values. They work on raw bytes
//! and never build a full object graph.
//!
//! Every probe returns `None` instead of failing when its target is absent or
//! malformed, and none of them can panic on arbitrary input.
//!
//! # Whitespace and delimiters
//!
//! PDF whitespace is NUL, TAB, LF, FF, CR and SPACE (ISO 32000-1, Table 1).
//! Delimiters are `( ) < > [ ] { } / %` (Table 2).

use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::digit1,
    combinator::map_res,
    sequence::{preceded, tuple},
    IResult,
};

/// Only the first 1024 bytes are searched for the `%PDF-` marker.
pub const HEADER_SCAN_LIMIT: usize = 1024;

/// The `%PDF-` header marker.
pub const PDF_HEADER: &[u8] = b"%PDF-";

/// An indirect reference `obj gen R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    /// Object number
    pub obj: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjRef {
    /// Create a reference.
    pub fn new(obj: u32, gen: u16) -> Self {
        Self { obj, gen }
    }
}

impl std::fmt::Display for ObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.obj, self.gen)
    }
}

/// PDF whitespace (space, \t, \r, \n, \0, \f).
#[inline]
pub fn is_pdf_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters.
#[inline]
pub fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Whitespace or delimiter: anything that ends a name token.
#[inline]
pub fn is_name_terminator(c: u8) -> bool {
    is_pdf_whitespace(c) || is_delimiter(c)
}

#[inline]
fn is_word_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// First occurrence of `needle` in `hay`.
pub fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

/// First occurrence of `needle` at or after `from`.
pub fn find_from(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    hay.get(from..).and_then(|tail| find(tail, needle)).map(|i| i + from)
}

/// Last occurrence of `needle` in `hay`.
pub fn rfind(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    hay.windows(needle.len()).rposition(|w| w == needle)
}

fn pdf_ws0(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while(is_pdf_whitespace)(input)
}

fn pdf_ws1(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(is_pdf_whitespace)(input)
}

fn unsigned<T: std::str::FromStr>(input: &[u8]) -> IResult<&[u8], T> {
    map_res(map_res(digit1, std::str::from_utf8), |s: &str| s.parse::<T>())(input)
}

/// `obj gen R`
fn reference(input: &[u8]) -> IResult<&[u8], ObjRef> {
    let (rest, (obj, _, gen, _, _)) =
        tuple((unsigned::<u32>, pdf_ws1, unsigned::<u16>, pdf_ws1, tag("R")))(input)?;
    Ok((rest, ObjRef { obj, gen }))
}

/// `obj gen obj` followed by a word boundary.
fn object_header(input: &[u8]) -> IResult<&[u8], (u32, u16)> {
    let (rest, (obj, _, gen, _, _)) =
        tuple((unsigned::<u32>, pdf_ws1, unsigned::<u16>, pdf_ws1, tag("obj")))(input)?;
    if rest.first().is_some_and(|c| is_word_byte(*c)) {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }
    Ok((rest, (obj, gen)))
}

/// Offset of `%PDF-` within the first [`HEADER_SCAN_LIMIT`] bytes.
pub fn find_header_offset(bytes: &[u8]) -> Option<usize> {
    let window = &bytes[..bytes.len().min(HEADER_SCAN_LIMIT)];
    find(window, PDF_HEADER)
}

/// Version string following the header, up to the next space, tab, CR or LF.
pub fn parse_version_at(bytes: &[u8], header_offset: usize) -> String {
    let start = header_offset + PDF_HEADER.len();
    let Some(tail) = bytes.get(start..) else {
        return String::new();
    };
    let end = tail
        .iter()
        .position(|c| matches!(c, b'\n' | b'\r' | b' ' | b'\t'))
        .unwrap_or(tail.len());
    String::from_utf8_lossy(&tail[..end]).into_owned()
}

/// Integer after the last `startxref` keyword.
pub fn parse_start_xref(bytes: &[u8]) -> Option<u64> {
    let idx = rfind(bytes, b"startxref")?;
    let tail = &bytes[idx + b"startxref".len()..];
    let (_, token) = preceded(pdf_ws0, take_while1(|c| !is_pdf_whitespace(c)))(tail).ok()?;
    match unsigned::<u64>(token) {
        Ok((rest, value)) if rest.is_empty() => Some(value),
        _ => None,
    }
}

/// Skip a literal string starting at `open` (which must be `(`).
/// Returns the index just past the matching `)`.
fn skip_literal(s: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < s.len() {
        match s[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            },
            _ => {},
        }
        i += 1;
    }
    None
}

/// Index of the `>>` that closes the dictionary opened at `start`.
///
/// Nested `<<`/`>>` pairs are counted. Hex strings and literal strings are
/// stepped over so that `>` or `)` inside them cannot unbalance the count.
pub fn match_dict_end(s: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < s.len() {
        match (s[i], s[i + 1]) {
            (b'<', b'<') => {
                depth += 1;
                i += 2;
            },
            (b'>', b'>') => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 2;
            },
            (b'<', _) => {
                i = find_from(s, b">", i + 1)? + 1;
            },
            (b'(', _) if depth > 0 => {
                i = skip_literal(s, i)?;
            },
            _ => i += 1,
        }
    }
    None
}

/// The balanced dictionary starting at the first `<<` in `body`.
pub fn first_dict(body: &[u8]) -> Option<&[u8]> {
    let start = find(body, b"<<")?;
    let end = match_dict_end(body, start)?;
    Some(&body[start..end + 2])
}

/// The balanced `<< ... >>` following the last `trailer` keyword.
pub fn last_trailer_dict(bytes: &[u8]) -> Option<&[u8]> {
    let idx = rfind(bytes, b"trailer")?;
    first_dict(&bytes[idx + b"trailer".len()..])
}

/// Occurrences of `/name` in `dict` that are followed by a non-name byte.
fn name_positions<'a>(dict: &'a [u8], name: &'a str) -> impl Iterator<Item = usize> + 'a {
    let mut needle = Vec::with_capacity(name.len() + 1);
    needle.push(b'/');
    needle.extend_from_slice(name.as_bytes());
    let mut from = 0;
    std::iter::from_fn(move || {
        while let Some(pos) = find_from(dict, &needle, from) {
            from = pos + 1;
            let after = pos + needle.len();
            if dict.get(after).map_or(true, |c| is_name_terminator(*c)) {
                return Some(after);
            }
        }
        None
    })
}

/// Reference value of `/name obj gen R` inside a dictionary.
pub fn parse_named_ref(dict: &[u8], name: &str) -> Option<ObjRef> {
    name_positions(dict, name)
        .find_map(|after| preceded(pdf_ws1, reference)(&dict[after..]).ok().map(|(_, r)| r))
}

/// Raw lexeme of the value stored under `/key`: `(literal)`, `<hex>` or `/Name`.
pub fn find_dict_value<'a>(dict: &'a [u8], key: &str) -> Option<&'a [u8]> {
    name_positions(dict, key).find_map(|after| {
        let (rest, _) = pdf_ws0(&dict[after..]).ok()?;
        let start = dict.len() - rest.len();
        let end = match rest.first()? {
            b'(' => start + skip_literal(rest, 0)?,
            b'<' if rest.get(1) != Some(&b'<') => start + find(rest, b">")? + 1,
            b'/' => {
                let len = rest[1..].iter().position(|c| is_name_terminator(*c)).unwrap_or(rest.len() - 1);
                if len == 0 {
                    return None;
                }
                start + 1 + len
            },
            _ => return None,
        };
        Some(&dict[start..end])
    })
}

/// Body of indirect object `obj gen` up to its `endobj`.
///
/// The header must start the buffer or follow a CR or LF.
pub fn object_body(bytes: &[u8], obj: u32, gen: u16) -> Option<&[u8]> {
    let digits = obj.to_string();
    let mut from = 0;
    while let Some(pos) = find_from(bytes, digits.as_bytes(), from) {
        from = pos + 1;
        if pos > 0 && !matches!(bytes[pos - 1], b'\n' | b'\r') {
            continue;
        }
        let Ok((rest, (o, g))) = object_header(&bytes[pos..]) else {
            continue;
        };
        if o != obj || g != gen {
            continue;
        }
        let body_start = bytes.len() - rest.len();
        return object_end(bytes, body_start).map(|end| &bytes[body_start..end]);
    }
    None
}

/// Offset of the `endobj` closing the body at `start`.
///
/// Literal strings and stream payloads are stepped over, so `endobj` written
/// inside a value does not end the object. An unterminated string or stream
/// falls back to a plain keyword search.
fn object_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    while i < bytes.len() {
        let at_word_start = i == 0 || !is_word_byte(bytes[i - 1]);
        let tail = &bytes[i..];
        if tail[0] == b'(' {
            i = skip_literal(bytes, i).unwrap_or(i + 1);
        } else if at_word_start && tail.starts_with(b"endobj") {
            return Some(i);
        } else if at_word_start && tail.starts_with(b"stream") {
            i = match find_from(bytes, b"endstream", i + b"stream".len()) {
                Some(end) => end + b"endstream".len(),
                None => i + 1,
            };
        } else {
            i += 1;
        }
    }
    None
}

/// Stream payload of an object body.
///
/// Exactly one EOL (`\n` or `\r\n`) after `stream` is skipped; trailing CR/LF
/// before `endstream` are dropped.
pub fn stream_content(body: &[u8]) -> Option<&[u8]> {
    let kw = find(body, b"stream")?;
    let mut start = kw + b"stream".len();
    let end = find_from(body, b"endstream", start)?;
    if body[start..end].starts_with(b"\r\n") {
        start += 2;
    } else if body[start..end].starts_with(b"\n") {
        start += 1;
    }
    let mut stop = end;
    while stop > start && matches!(body[stop - 1], b'\r' | b'\n') {
        stop -= 1;
    }
    Some(&body[start..stop])
}

/// Largest object number among all `N G obj` headers.
pub fn max_object_number(bytes: &[u8]) -> u32 {
    let mut max = 0;
    let mut from = 0;
    while let Some(pos) = find_from(bytes, b"obj", from) {
        from = pos + 1;
        if bytes.get(pos + 3).is_some_and(|c| is_word_byte(*c)) {
            continue;
        }
        // Walk back over `ws gen ws obj-number`.
        let mut i = pos;
        let ws_end = i;
        while i > 0 && is_pdf_whitespace(bytes[i - 1]) {
            i -= 1;
        }
        if i == ws_end {
            continue;
        }
        let gen_end = i;
        while i > 0 && bytes[i - 1].is_ascii_digit() {
            i -= 1;
        }
        if i == gen_end {
            continue;
        }
        let ws_end = i;
        while i > 0 && is_pdf_whitespace(bytes[i - 1]) {
            i -= 1;
        }
        if i == ws_end {
            continue;
        }
        let num_end = i;
        while i > 0 && bytes[i - 1].is_ascii_digit() {
            i -= 1;
        }
        if i == num_end {
            continue;
        }
        if let Ok((_, n)) = unsigned::<u32>(&bytes[i..num_end]) {
            max = max.max(n);
        }
    }
    max
}

/// True iff the last trailer (up to the following `startxref`) names `/Encrypt`.
pub fn has_encrypt_marker_in_trailer(bytes: &[u8]) -> bool {
    let Some(idx) = rfind(bytes, b"trailer") else {
        return false;
    };
    let mut space = &bytes[idx..];
    if let Some(sx) = find(space, b"startxref") {
        space = &space[..sx];
    }
    has_name_key(space, b"/Encrypt")
}

/// Whether `key` occurs as a complete name token.
pub fn has_name_key(bytes: &[u8], key: &[u8]) -> bool {
    let mut from = 0;
    while let Some(pos) = find_from(bytes, key, from) {
        let next = pos + key.len();
        if bytes.get(next).map_or(true, |c| is_name_terminator(*c)) {
            return true;
        }
        from = pos + 1;
    }
    false
}

/// Decode a raw `(literal)`, `<hex>` or `/Name` lexeme to text.
///
/// Text strings starting with a UTF-16BE byte order mark are decoded as
/// UTF-16; anything else is taken as UTF-8 when valid and Latin-1 otherwise.
pub fn decode_pdf_string(raw: &[u8]) -> String {
    let raw = trim_pdf_whitespace(raw);
    if raw.is_empty() {
        return String::new();
    }
    let bytes = if raw.len() >= 2 && raw[0] == b'(' && raw[raw.len() - 1] == b')' {
        unescape_literal(&raw[1..raw.len() - 1])
    } else if raw[0] == b'<' && raw[raw.len() - 1] == b'>' && raw.len() >= 2 {
        match decode_hex(&raw[1..raw.len() - 1]) {
            Some(b) => b,
            None => return String::new(),
        }
    } else if raw[0] == b'/' {
        raw[1..].to_vec()
    } else {
        raw.to_vec()
    };
    text_from_bytes(&bytes)
}

fn trim_pdf_whitespace(b: &[u8]) -> &[u8] {
    let start = b.iter().position(|c| !is_pdf_whitespace(*c)).unwrap_or(b.len());
    let end = b.iter().rposition(|c| !is_pdf_whitespace(*c)).map_or(start, |i| i + 1);
    &b[start..end]
}

fn unescape_literal(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        let c = s[i];
        if c != b'\\' || i + 1 >= s.len() {
            out.push(c);
            i += 1;
            continue;
        }
        let next = s[i + 1];
        i += 2;
        match next {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'(' | b')' | b'\\' => out.push(next),
            b'0'..=b'7' => {
                let mut value = u32::from(next - b'0');
                let mut taken = 1;
                while taken < 3 && i < s.len() && (b'0'..=b'7').contains(&s[i]) {
                    value = value * 8 + u32::from(s[i] - b'0');
                    i += 1;
                    taken += 1;
                }
                out.push((value & 0xFF) as u8);
            },
            // Line continuation.
            b'\r' => {
                if s.get(i) == Some(&b'\n') {
                    i += 1;
                }
            },
            b'\n' => {},
            other => out.push(other),
        }
    }
    out
}

fn decode_hex(hex: &[u8]) -> Option<Vec<u8>> {
    let mut digits: Vec<u8> = hex.iter().copied().filter(|c| !is_pdf_whitespace(*c)).collect();
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    digits
        .chunks_exact(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}

fn text_from_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Escape text for use inside a `( ... )` literal.
pub fn escape_pdf_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Point `/key` at `r`: replace every existing `/key N G R` or insert a new
/// entry on its own line before the dictionary's final `>>`.
pub fn upsert_named_ref(dict: &[u8], key: &str, r: ObjRef) -> Vec<u8> {
    let replacement = format!("/{} {} {} R", key, r.obj, r.gen);
    let spans: Vec<(usize, usize)> = name_positions(dict, key)
        .filter_map(|after| {
            let (rest, _) = preceded(pdf_ws1, reference)(&dict[after..]).ok()?;
            Some((after - key.len() - 1, dict.len() - rest.len()))
        })
        .collect();
    if !spans.is_empty() {
        let mut out = Vec::with_capacity(dict.len() + replacement.len() * spans.len());
        let mut copied = 0;
        for (start, end) in spans {
            out.extend_from_slice(&dict[copied..start]);
            out.extend_from_slice(replacement.as_bytes());
            copied = end;
        }
        out.extend_from_slice(&dict[copied..]);
        return out;
    }
    let Some(close) = rfind(dict, b">>") else {
        return dict.to_vec();
    };
    let mut out = Vec::with_capacity(dict.len() + replacement.len() + 2);
    out.extend_from_slice(&dict[..close]);
    out.push(b'\n');
    out.extend_from_slice(replacement.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(&dict[close..]);
    out
}
