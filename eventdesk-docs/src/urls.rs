/// Canonical document URLs
///
/// Generated documents are stored by their edit URL. The document id is the
/// second-to-last path segment, which is how it is recovered on delete:
///
/// ```text
/// https://docs.google.com/document/d/{id}/edit
///                                    ^^^^
/// ```

use eventdesk_shared::models::project_file::FileType;

/// Edit URL for a generated document, `None` for links
pub fn view_url(kind: FileType, file_id: &str) -> Option<String> {
    let path = match kind {
        FileType::Link => return None,
        FileType::Document => "document",
        FileType::Spreadsheet => "spreadsheets",
        FileType::Presentation => "presentation",
        FileType::Form => "forms",
    };

    Some(format!("https://docs.google.com/{}/d/{}/edit", path, file_id))
}

/// Second-to-last `/`-separated segment of `url`
pub fn extract_file_id(url: &str) -> Option<&str> {
    let mut segments = url.rsplit('/');
    segments.next()?;
    segments.next().filter(|id| !id.is_empty())
}
