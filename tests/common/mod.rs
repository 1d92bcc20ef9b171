//! PDF byte builders shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

/// A file with a valid `%PDF` header followed by bytes no parser accepts.
pub fn unparseable_pdf() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(b"%PDF-1.4\n\x00\x01garbage that is not an object\n%%EOF\n")
        .unwrap();
    file
}

/// A well-formed PDF whose page tree is empty (`/Kids []`, `/Count 0`).
pub fn zero_page_pdf() -> NamedTempFile {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [] /Count 0 >>",
    ];

    let mut body = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(body.len());
        body.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
    }

    let xref_at = body.len();
    body.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    body.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        body.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    body.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );

    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(&body).unwrap();
    file
}
