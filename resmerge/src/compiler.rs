//! Compilation of file-based resources into the output tree.
//!
//! The writer fans compile requests out as futures and awaits them all at
//! the end of a merge session, so a slow external compiler overlaps with
//! the rest of the write work.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::MergeError;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One file to compile and the output folder it belongs in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompileRequest {
    /// Source file (a scanned resource or a preprocessor output).
    pub input: PathBuf,
    /// Destination folder under the merged output root.
    pub output_dir: PathBuf,
    /// Whether the compiler should emit pseudo-localized variants.
    pub pseudo_localize: bool,
    /// Whether PNG outputs should be crunched.
    pub crunch_png: bool,
}

impl CompileRequest {
    /// Creates a request with both processing flags off.
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            pseudo_localize: false,
            crunch_png: false,
        }
    }

    /// Enables or disables pseudo-localization for this request.
    pub fn with_pseudo_localize(mut self, enabled: bool) -> Self {
        self.pseudo_localize = enabled;
        self
    }

    /// Enables or disables PNG crunching for this request.
    pub fn with_png_crunch(mut self, enabled: bool) -> Self {
        self.crunch_png = enabled;
        self
    }

    /// Output path for compilers that keep the input file name.
    pub fn default_output(&self) -> PathBuf {
        match self.input.file_name() {
            Some(name) => self.output_dir.join(name),
            None => self.output_dir.clone(),
        }
    }
}

/// Turns resource files into their merged-output form.
pub trait ResourceCompiler: Send + Sync {
    /// Compiles one file.
    ///
    /// Resolves to the produced output path, or `None` when the file needs
    /// no compilation at all (nothing is written, nothing is tracked).
    fn compile(&self, request: CompileRequest) -> BoxFuture<'static, Result<Option<PathBuf>, MergeError>>;

    /// Where [`compile`](Self::compile) would place the output.
    ///
    /// Used to locate stale outputs of removed sources without recompiling.
    fn compile_output_for(&self, request: &CompileRequest) -> PathBuf {
        request.default_output()
    }
}

impl<T: ResourceCompiler + ?Sized> ResourceCompiler for Arc<T> {
    fn compile(&self, request: CompileRequest) -> BoxFuture<'static, Result<Option<PathBuf>, MergeError>> {
        (**self).compile(request)
    }

    fn compile_output_for(&self, request: &CompileRequest) -> PathBuf {
        (**self).compile_output_for(request)
    }
}

/// Default compiler: copies the file into the output folder unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyCompiler;

impl ResourceCompiler for CopyCompiler {
    fn compile(&self, request: CompileRequest) -> BoxFuture<'static, Result<Option<PathBuf>, MergeError>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&request.output_dir)
                .await
                .map_err(|e| MergeError::io(&request.output_dir, e))?;
            let output = request.default_output();
            tokio::fs::copy(&request.input, &output)
                .await
                .map_err(|e| MergeError::io(&request.input, e))?;
            Ok(Some(output))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_compiler_copies_into_output_dir() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let input = source_dir.path().join("icon.png");
        std::fs::write(&input, "png bytes").unwrap();

        let request = CompileRequest::new(&input, out_dir.path().join("drawable"));
        let compiler = CopyCompiler;
        let output = compiler.compile(request.clone()).await.unwrap().unwrap();

        assert_eq!(output, compiler.compile_output_for(&request));
        assert_eq!(std::fs::read_to_string(output).unwrap(), "png bytes");
    }

    #[tokio::test]
    async fn test_copy_compiler_missing_input_is_an_io_error() {
        let out_dir = TempDir::new().unwrap();
        let request = CompileRequest::new("/nonexistent/icon.png", out_dir.path());
        let err = CopyCompiler.compile(request).await.unwrap_err();
        assert!(matches!(err, MergeError::Io { .. }));
    }
}
