//! User profiles, bulk applicant lists and the XML export of users with
//! their drawings.

use crate::error::{PixelError, Result};
use crate::figure::{attributes, escape, root_element, unescape};
use crate::image::Image;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write;

lazy_static! {
    static ref APPLICANT_REGEX: Regex =
        Regex::new(r"(?s)<solicitante\b([^>]*?)(?:/>|>(.*?)</solicitante>)").unwrap();
    static ref CHILD_REGEX: Regex =
        Regex::new(r"(?s)<([A-Za-z_][\w.-]*)\b[^>]*>(.*?)</([A-Za-z_][\w.-]*)>").unwrap();
    static ref USER_ID_REGEX: Regex = Regex::new(r"^IPC-\d+$").unwrap();
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"^\d{8}$").unwrap();
}

/// Contact details kept next to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub profile_url: String,
}

/// One entry of a bulk user list, with its plain-text password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub user_id: String,
    pub password: String,
    pub profile: Profile,
}

impl Applicant {
    /// `IPC-<digits>` id, non-empty password, plausible email, 8-digit phone.
    pub fn is_valid(&self) -> bool {
        valid_user_id(&self.user_id)
            && !self.password.is_empty()
            && valid_email(&self.profile.email)
            && valid_phone(&self.profile.phone_number)
    }
}

pub fn valid_user_id(user_id: &str) -> bool {
    USER_ID_REGEX.is_match(user_id)
}

pub fn valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// Parses a bulk user list and keeps only the valid entries.
///
/// ```text
/// <solicitantes>
///   <solicitante id="IPC-001" pwd="secret">
///     <NombreCompleto>Ana Pérez</NombreCompleto>
///     <CorreoElectronico>ana@example.com</CorreoElectronico>
///     <NumeroTelefono>55551234</NumeroTelefono>
///     <Direccion>Zona 1</Direccion>
///     <perfil>https://example.com/ana.png</perfil>
///   </solicitante>
/// </solicitantes>
/// ```
///
/// Missing child elements read as empty text. Entries that fail
/// [`Applicant::is_valid`] are dropped rather than failing the document.
pub fn parse_applicants(xml: &str) -> Result<Vec<Applicant>> {
    let (_, body) =
        root_element(xml).ok_or_else(|| PixelError::roster("Invalid XML format: no root element"))?;

    let mut applicants = Vec::new();
    for entry in APPLICANT_REGEX.captures_iter(&body) {
        let attrs = attributes(&entry[1]);
        let fields = children(entry.get(2).map_or("", |m| m.as_str()));
        let field = |name: &str| fields.get(name).cloned().unwrap_or_default();

        let applicant = Applicant {
            user_id: attrs.get("id").cloned().unwrap_or_default(),
            password: attrs.get("pwd").cloned().unwrap_or_default(),
            profile: Profile {
                full_name: field("NombreCompleto"),
                email: field("CorreoElectronico"),
                phone_number: field("NumeroTelefono"),
                address: field("Direccion"),
                profile_url: field("perfil"),
            },
        };
        if applicant.is_valid() {
            applicants.push(applicant);
        } else {
            log::debug!("skipping invalid applicant {:?}", applicant.user_id);
        }
    }
    Ok(applicants)
}

fn children(body: &str) -> HashMap<String, String> {
    CHILD_REGEX
        .captures_iter(body)
        .filter(|c| c[1] == c[3])
        .map(|c| (c[1].to_string(), unescape(c[2].trim())))
        .collect()
}

/// Writes every user with their profile and drawings as one XML document.
///
/// `users` is written in the given order; each user's images follow the
/// order of `images`.
pub fn export_users(users: &[(String, Profile)], images: &[Image]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<usuarios>\n");

    for (user_id, profile) in users {
        let _ = writeln!(out, "\t<usuario id=\"{}\">", escape(user_id));
        for (tag, value) in [
            ("NombreCompleto", &profile.full_name),
            ("CorreoElectronico", &profile.email),
            ("NumeroTelefono", &profile.phone_number),
            ("Direccion", &profile.address),
            ("perfil", &profile.profile_url),
        ] {
            let _ = writeln!(out, "\t\t<{0}>{1}</{0}>", tag, escape(value));
        }

        out.push_str("\t\t<imagenes>\n");
        for image in images.iter().filter(|image| &image.user_id == user_id) {
            let _ = writeln!(
                out,
                "\t\t\t<imagen id=\"{}\">",
                escape(image.id.as_deref().unwrap_or_default())
            );
            let _ = writeln!(out, "\t\t\t\t<nombre>{}</nombre>", escape(&image.name));
            out.push_str("\t\t\t\t<diseño>\n");
            for pixel in &image.pixels {
                let _ = writeln!(
                    out,
                    "\t\t\t\t\t<pixel fila=\"{}\" col=\"{}\">{}</pixel>",
                    pixel.row,
                    pixel.column,
                    escape(&pixel.color)
                );
            }
            out.push_str("\t\t\t\t</diseño>\n\t\t\t</imagen>\n");
        }
        out.push_str("\t\t</imagenes>\n\t</usuario>\n");
    }

    out.push_str("</usuarios>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::parse_figure;
    use crate::image::Pixel;

    const APPLICANTS: &str = r#"<?xml version="1.0"?>
<solicitantes>
  <solicitante id="IPC-001" pwd="uno">
    <NombreCompleto>Ana &amp; Co</NombreCompleto>
    <CorreoElectronico>ana@example.com</CorreoElectronico>
    <NumeroTelefono>55551234</NumeroTelefono>
    <Direccion>Zona 1</Direccion>
    <perfil>https://example.com/ana.png</perfil>
  </solicitante>
  <solicitante id="USR-2" pwd="dos">
    <CorreoElectronico>bob@example.com</CorreoElectronico>
    <NumeroTelefono>55551234</NumeroTelefono>
  </solicitante>
  <solicitante id="IPC-3" pwd="tres">
    <CorreoElectronico>not-an-email</CorreoElectronico>
    <NumeroTelefono>55551234</NumeroTelefono>
  </solicitante>
  <solicitante id="IPC-4" pwd="">
    <CorreoElectronico>dan@example.com</CorreoElectronico>
    <NumeroTelefono>55551234</NumeroTelefono>
  </solicitante>
  <solicitante id="IPC-5" pwd="cinco">
    <CorreoElectronico>eva@example.com</CorreoElectronico>
    <NumeroTelefono>5555</NumeroTelefono>
  </solicitante>
  <solicitante id="IPC-6" pwd="seis">
    <CorreoElectronico>fer@example.com</CorreoElectronico>
    <NumeroTelefono>12345678</NumeroTelefono>
  </solicitante>
</solicitantes>"#;

    #[test]
    fn keeps_only_valid_applicants() {
        let applicants = parse_applicants(APPLICANTS).unwrap();
        let ids: Vec<&str> = applicants.iter().map(|a| a.user_id.as_str()).collect();
        assert_eq!(ids, vec!["IPC-001", "IPC-6"]);

        let ana = &applicants[0];
        assert_eq!(ana.password, "uno");
        assert_eq!(ana.profile.full_name, "Ana & Co");
        assert_eq!(ana.profile.profile_url, "https://example.com/ana.png");
        assert_eq!(applicants[1].profile.full_name, "");
    }

    #[test]
    fn rejects_documents_without_a_root() {
        assert!(matches!(
            parse_applicants("just text"),
            Err(PixelError::Roster { .. })
        ));
        assert!(parse_applicants("<solicitantes/>").is_err());
        assert!(parse_applicants("<solicitantes></solicitantes>").unwrap().is_empty());
    }

    #[test]
    fn validators() {
        assert!(valid_user_id("IPC-42"));
        assert!(!valid_user_id("IPC-"));
        assert!(!valid_user_id("ipc-42"));
        assert!(valid_email("a.b+c@d-e.org"));
        assert!(!valid_email("a@b"));
        assert!(valid_phone("01234567"));
        assert!(!valid_phone("123456789"));
    }

    #[test]
    fn export_nests_images_in_figure_layout() {
        let profile = Profile {
            full_name: "Ana <A>".to_string(),
            ..Profile::default()
        };
        let mut heart = Image::new("IPC-1", "heart", vec![Pixel::new(-1, 2, "#FF0000")]);
        heart.id = Some("0001".to_string());
        let mut other = Image::new("IPC-2", "other", Vec::new());
        other.id = Some("0002".to_string());

        let xml = export_users(
            &[("IPC-1".to_string(), profile), ("IPC-2".to_string(), Profile::default())],
            &[heart, other],
        );
        assert!(xml.contains("<NombreCompleto>Ana &lt;A&gt;</NombreCompleto>"));
        assert!(xml.contains("<pixel fila=\"-1\" col=\"2\">#FF0000</pixel>"));
        assert_eq!(xml.matches("<imagen ").count(), 2);

        // each exported image reads back as a figure
        let start = xml.find("<nombre>heart").unwrap();
        let end = xml[start..].find("</imagen>").unwrap() + start;
        let figure = format!("<figura>{}</figura>", &xml[start..end]);
        let image = parse_figure(&figure, "IPC-1").unwrap();
        assert_eq!(image.pixels, vec![Pixel::new(-1, 2, "#FF0000")]);
    }
}
