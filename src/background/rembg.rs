//! [`BackgroundRemover`] backed by the `rembg` command-line tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use image::ImageFormat;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{BackgroundError, BackgroundRemover};

/// Program looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_PROGRAM: &str = "rembg";

/// Runs `rembg i <input> <output>` and normalizes the result to PNG.
#[derive(Debug, Clone)]
pub struct RembgCommand {
    program: PathBuf,
}

impl Default for RembgCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl RembgCommand {
    /// Uses `rembg` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Uses the given program name or path.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the configured program.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn locate(&self) -> Result<PathBuf, BackgroundError> {
        which::which(&self.program)
            .map_err(|_| BackgroundError::unavailable(self.program.display().to_string()))
    }
}

#[async_trait]
impl BackgroundRemover for RembgCommand {
    async fn ensure_available(&self) -> Result<(), BackgroundError> {
        let resolved = self.locate()?;
        debug!(program = %resolved.display(), "background removal tool found");
        Ok(())
    }

    #[instrument(skip(self), fields(input = %input.display()))]
    async fn remove_background(&self, input: &Path, output: &Path) -> Result<(), BackgroundError> {
        let program = self.locate()?;
        let raw_output = raw_output_path(output);

        let result = Command::new(&program)
            .arg("i")
            .arg(input)
            .arg(&raw_output)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| BackgroundError::io(&program, e))?;

        if !result.status.success() {
            let _ = tokio::fs::remove_file(&raw_output).await;
            return Err(BackgroundError::command(
                input,
                result.status.to_string(),
                &String::from_utf8_lossy(&result.stderr),
            ));
        }

        let converted = reencode_png(&raw_output, output);
        let _ = tokio::fs::remove_file(&raw_output).await;
        converted?;
        debug!(output = %output.display(), "background removed");
        Ok(())
    }
}

/// Scratch file next to `output` that receives the tool's raw result.
fn raw_output_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map_or_else(|| "output".into(), |name| name.to_string_lossy());
    output.with_file_name(format!(".{name}.rembg"))
}

/// Decodes whatever the tool produced and writes it as PNG.
fn reencode_png(raw: &Path, output: &Path) -> Result<(), BackgroundError> {
    let image = image::ImageReader::open(raw)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| BackgroundError::io(raw, e))?
        .decode()
        .map_err(|e| BackgroundError::image(raw, e))?;
    image
        .save_with_format(output, ImageFormat::Png)
        .map_err(|e| BackgroundError::image(output, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::images;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_raw_output_path_is_hidden_sibling() {
        let raw = raw_output_path(Path::new("/out/processed/image_01_transparent.png"));
        assert_eq!(
            raw,
            PathBuf::from("/out/processed/.image_01_transparent.png.rembg")
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let remover = RembgCommand::with_program("/nonexistent/definitely-not-rembg");
        let err = remover.ensure_available().await.unwrap_err();
        assert!(matches!(err, BackgroundError::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_writes_png() {
        let temp_dir = TempDir::new().unwrap();
        // Stand-in tool: copies its input (a JPEG) to the requested output.
        let script = write_script(temp_dir.path(), "fake-rembg", r#"cp "$2" "$3""#);
        let input = temp_dir.path().join("image_01.jpg");
        std::fs::write(&input, images::jpeg(16, 9)).unwrap();
        let output = temp_dir.path().join("image_01_transparent.png");

        let remover = RembgCommand::with_program(&script);
        remover.ensure_available().await.unwrap();
        remover.remove_background(&input, &output).await.unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        assert!(!raw_output_path(&output).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_run_reports_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_script(temp_dir.path(), "fake-rembg", "echo 'model missing' >&2; exit 3");
        let input = temp_dir.path().join("image_01.jpg");
        std::fs::write(&input, images::jpeg(4, 4)).unwrap();
        let output = temp_dir.path().join("image_01_transparent.png");

        let err = RembgCommand::with_program(&script)
            .remove_background(&input, &output)
            .await
            .unwrap_err();

        match err {
            BackgroundError::Command { stderr, .. } => assert_eq!(stderr, "model missing"),
            other => panic!("Expected Command error, got: {other:?}"),
        }
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_garbage_output_is_image_error() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_script(temp_dir.path(), "fake-rembg", r#"echo garbage > "$3""#);
        let input = temp_dir.path().join("image_01.jpg");
        std::fs::write(&input, images::jpeg(4, 4)).unwrap();
        let output = temp_dir.path().join("image_01_transparent.png");

        let err = RembgCommand::with_program(&script)
            .remove_background(&input, &output)
            .await
            .unwrap_err();
        assert!(matches!(err, BackgroundError::Image { .. }));
        assert!(!raw_output_path(&output).exists());
    }
}
