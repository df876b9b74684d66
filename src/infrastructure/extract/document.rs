use super::{clean_text, ExtractError};
use regex::Regex;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::OnceLock;
use tokio::process::Command;

/// Read the text of a local document, chosen by file extension
pub async fn read_document(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    tracing::debug!(path = %path.display(), format = %extension, "Reading document");

    match extension.as_str() {
        "txt" | "md" => read_utf8(path).await,
        "html" | "htm" => Ok(clean_text(&read_utf8(path).await?)),
        "pdf" => {
            let raw = run_tool("pdftotext", &["-enc", "UTF-8"], path, &["-"]).await?;
            Ok(unwrap_pdf_lines(&raw))
        }
        "doc" => run_tool("antiword", &[], path, &[]).await,
        "docx" => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || read_docx(&path))
                .await
                .map_err(|e| ExtractError::Tool {
                    tool: "docx reader".to_string(),
                    message: e.to_string(),
                })?
        }
        "" => Err(ExtractError::UnsupportedFormat(format!(
            "{} has no file extension",
            path.display()
        ))),
        other => Err(ExtractError::UnsupportedFormat(format!(".{}", other))),
    }
}

async fn read_utf8(path: &Path) -> Result<String, ExtractError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Join lines wrapped by the PDF layout back into running sentences:
/// hyphenated line breaks are glued, other line breaks become spaces.
fn unwrap_pdf_lines(text: &str) -> String {
    text.replace("-\n", "").replace('\n', " ")
}

/// Run an external converter and capture its stdout as text
async fn run_tool(tool: &str, before: &[&str], path: &Path, after: &[&str]) -> Result<String, ExtractError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ExtractError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::NotFound, "file not found"),
        });
    }

    let output = Command::new(tool)
        .args(before)
        .arg(path)
        .args(after)
        .output()
        .await
        .map_err(|e| ExtractError::Tool {
            tool: tool.to_string(),
            message: if e.kind() == ErrorKind::NotFound {
                format!("{} not found on PATH", tool)
            } else {
                e.to_string()
            },
        })?;

    if !output.status.success() {
        return Err(ExtractError::Tool {
            tool: tool.to_string(),
            message: format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Paragraph text of a .docx, one paragraph per line
fn read_docx(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let malformed = |message: String| ExtractError::Document {
        path: path.to_path_buf(),
        message,
    };

    let mut archive = zip::ZipArchive::new(file).map_err(|e| malformed(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| malformed(format!("word/document.xml: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| malformed(e.to_string()))?;

    Ok(docx_paragraphs(&xml).join("\n"))
}

fn docx_paragraphs(xml: &str) -> Vec<String> {
    // Run text, or a tab/break element standing between runs
    static RUN_TEXT: OnceLock<Regex> = OnceLock::new();
    let run_text = RUN_TEXT.get_or_init(|| {
        Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:(?:tab|br|cr)(?:\s[^>]*)?/>").expect("valid regex")
    });

    xml.split("</w:p>")
        .filter(|fragment| fragment.contains("<w:p"))
        .map(|paragraph| {
            run_text
                .captures_iter(paragraph)
                .map(|c| match c.get(1) {
                    Some(text) => unescape_xml(text.as_str()),
                    None => " ".to_string(),
                })
                .collect::<String>()
        })
        .collect()
}

/// Decodes the predefined entities and numeric character references
fn unescape_xml(text: &str) -> String {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let entity = ENTITY.get_or_init(|| {
        Regex::new(r"&(?:#x([0-9A-Fa-f]+)|#([0-9]+)|(lt|gt|quot|apos|amp));").expect("valid regex")
    });

    entity
        .replace_all(text, |c: &regex::Captures| {
            let code = match (c.get(1), c.get(2), c.get(3)) {
                (Some(hex), _, _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, Some(dec), _) => dec.as_str().parse().ok(),
                (_, _, Some(name)) => {
                    return match name.as_str() {
                        "lt" => "<",
                        "gt" => ">",
                        "quot" => "\"",
                        "apos" => "'",
                        _ => "&",
                    }
                    .to_string()
                }
                _ => None,
            };
            // Out-of-range references stay as written
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| c[0].to_string())
        })
        .into_owned()
}
