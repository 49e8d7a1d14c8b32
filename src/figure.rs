use crate::error::{PixelError, Result};
use crate::image::{Image, Pixel};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref COMMENT_REGEX: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref ROOT_REGEX: Regex =
        Regex::new(r"(?s)^\s*(?:<\?xml[^>]*\?>\s*)?<([A-Za-z_][\w.-]*)\b[^>]*>(.*)</([A-Za-z_][\w.-]*)>\s*$")
            .unwrap();
    static ref NAME_REGEX: Regex = Regex::new(r"(?s)<nombre\b[^>]*>(.*?)</nombre>").unwrap();
    static ref DESIGN_REGEX: Regex =
        Regex::new(r"(?s)<diseño\b[^>]*?(?:/>|>(.*?)</diseño>)").unwrap();
    static ref PIXEL_REGEX: Regex =
        Regex::new(r"(?s)<pixel\b([^>]*?)(?:/>|>(.*?)</pixel>)").unwrap();
    static ref ATTR_REGEX: Regex =
        Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
}

/// Parses an uploaded figure document into an unsaved [`Image`].
///
/// The expected shape is
///
/// ```text
/// <figura>
///   <nombre>heart</nombre>
///   <diseño>
///     <pixel fila="0" col="1">#FF0000</pixel>
///   </diseño>
/// </figura>
/// ```
///
/// Pixels are returned in document order; duplicates are kept here and
/// resolved when the matrix is built.
pub fn parse_figure(xml: &str, user_id: &str) -> Result<Image> {
    let (tag, body) = root_element(xml)
        .ok_or_else(|| PixelError::figure("Invalid XML format: no root element"))?;
    if tag != "figura" {
        return Err(PixelError::figure("Root tag must be 'figura'"));
    }
    let body = body.as_str();

    let name = NAME_REGEX
        .captures(body)
        .map(|c| unescape(c[1].trim()))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| PixelError::figure("Missing or invalid 'nombre' tag"))?;

    let design = DESIGN_REGEX
        .captures(body)
        .ok_or_else(|| PixelError::figure("Missing 'diseño' tag"))?;
    let design = design.get(1).map_or("", |m| m.as_str());

    let mut pixels = Vec::new();
    for pixel in PIXEL_REGEX.captures_iter(design) {
        let attrs = attributes(&pixel[1]);
        let row = int_attr(&attrs, "fila")?;
        let column = int_attr(&attrs, "col")?;
        let color = pixel.get(2).map_or(String::new(), |m| unescape(m.as_str().trim()));
        if color.is_empty() {
            return Err(PixelError::figure(format!(
                "Invalid pixel data: color missing at ({}, {})",
                row, column
            )));
        }
        pixels.push(Pixel::new(row, column, color));
    }

    Ok(Image::new(user_id, name, pixels))
}

/// Tag name and inner text of the document element, comments removed.
pub(crate) fn root_element(xml: &str) -> Option<(String, String)> {
    let xml = COMMENT_REGEX.replace_all(xml, "");
    let root = ROOT_REGEX.captures(&xml)?;
    if root[1] != root[3] {
        return None;
    }
    let body = root.get(2).map_or("", |m| m.as_str());
    Some((root[1].to_string(), body.to_string()))
}

pub(crate) fn attributes(raw: &str) -> HashMap<String, String> {
    ATTR_REGEX
        .captures_iter(raw)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).map_or("", |m| m.as_str());
            (c[1].to_string(), unescape(value))
        })
        .collect()
}

fn int_attr(attrs: &HashMap<String, String>, key: &str) -> Result<i32> {
    let raw = attrs
        .get(key)
        .ok_or_else(|| PixelError::figure(format!("Invalid pixel data: missing '{}'", key)))?;
    raw.trim().parse::<i32>().map_err(|_| {
        PixelError::figure(format!(
            "Invalid pixel data: '{}' is not an integer ({})",
            key, raw
        ))
    })
}

/// Escapes text for use in element content or a double-quoted attribute.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Resolves the predefined XML entities and numeric character references.
pub(crate) fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .map(|hex| u32::from_str_radix(hex, 16).ok())
                .unwrap_or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
