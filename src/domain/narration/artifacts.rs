use super::model::ChunkArtifact;
use std::path::{Path, PathBuf};

/// File names derived from the final output path.
///
/// For an output `dir/book.mp3`, chunk `i` (1-based in file names) lives at
/// `dir/book_part{i}.mp3` with its text at `dir/book_part{i}-text.txt`, the
/// progress record at `dir/book-state.json` and the extracted text at
/// `dir/book-text.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    output_path: PathBuf,
    dir: PathBuf,
    stem: String,
    extension: Option<String>,
}

impl ArtifactLayout {
    pub fn for_output(output_path: &Path) -> Self {
        let dir = output_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let extension = output_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned());

        Self {
            output_path: output_path.to_path_buf(),
            dir,
            stem,
            extension,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn chunk(&self, index: usize) -> ChunkArtifact {
        let part = format!("{}_part{}", self.stem, index + 1);
        let audio_name = match &self.extension {
            Some(ext) => format!("{}.{}", part, ext),
            None => part.clone(),
        };

        ChunkArtifact {
            index,
            audio_path: self.dir.join(audio_name),
            text_sidecar_path: self.dir.join(format!("{}-text.txt", part)),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(format!("{}-state.json", self.stem))
    }

    pub fn text_path(&self) -> PathBuf {
        self.dir.join(format!("{}-text.txt", self.stem))
    }
}
