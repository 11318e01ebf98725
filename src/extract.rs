//! Extracción de texto plano de los ficheros subidos (PDF y TXT).

use anyhow::{anyhow, Result};

/// Tipos de documento aceptados, decididos por el sufijo del nombre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Sufijo sensible a mayúsculas: `informe.PDF` no se acepta.
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if filename.ends_with(".txt") {
            Some(Self::Text)
        } else {
            None
        }
    }
}

/// Extrae el texto de `bytes`. Los PDF se leen página a página y se unen
/// con un espacio; los TXT deben ser UTF-8 válido.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    match kind {
        DocumentKind::Text => String::from_utf8(bytes.to_vec())
            .map_err(|e| anyhow!("El fichero no es UTF-8 válido: {e}")),
        DocumentKind::Pdf => {
            let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
                .map_err(|e| anyhow!("No se pudo extraer texto del PDF: {e}"))?;
            Ok(pages.join(" "))
        }
    }
}

/// Igual que [`extract_text`], pero en el pool de hilos bloqueantes de Tokio.
pub async fn extract_text_blocking(kind: DocumentKind, bytes: Vec<u8>) -> Result<String> {
    tokio::task::spawn_blocking(move || extract_text(kind, &bytes)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_case_sensitive_suffix() {
        assert_eq!(DocumentKind::from_filename("a.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_filename("notas.txt"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_filename("notes.csv"), None);
        assert_eq!(DocumentKind::from_filename("INFORME.PDF"), None);
        assert_eq!(DocumentKind::from_filename("txt"), None);
    }

    #[test]
    fn text_files_are_decoded_as_utf8() {
        let text = extract_text(DocumentKind::Text, "Canción. Árbol".as_bytes()).unwrap();
        assert_eq!(text, "Canción. Árbol");
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(extract_text(DocumentKind::Text, &[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn garbage_pdf_is_an_error() {
        assert!(extract_text(DocumentKind::Pdf, b"not a pdf at all").is_err());
    }

    /// PDF mínimo con una página por texto, fuente Type1 estándar.
    fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pdf_pages_are_joined_with_a_single_space() {
        let bytes = pdf_with_pages(&["First page text.", "Second page text."]);

        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 2);

        let text = extract_text(DocumentKind::Pdf, &bytes).unwrap();
        assert_eq!(text, format!("{} {}", pages[0], pages[1]));

        let first = text.find("First page text.").unwrap();
        let second = text.find("Second page text.").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn blocking_extraction_matches_direct() {
        let text = extract_text_blocking(DocumentKind::Text, b"hola mundo".to_vec())
            .await
            .unwrap();
        assert_eq!(text, "hola mundo");
    }
}
