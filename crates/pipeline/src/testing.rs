use refile_convert::Converter;
use refile_convert::error::{ErrorKind as ConvertErrorKind, Result as ConvertResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub(crate) const PDF: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";
pub(crate) const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0DIHDR\x00\x00";
/// Spooled PostScript; matches no signature.
pub(crate) const PS: &[u8] = b"%!PS-Adobe-3.0\n%%Creator: spooler\n";

/// Write `contents` to `dir/name`, returning the full path.
pub(crate) fn touch(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Stands in for Ghostscript: writes a tiny PDF, or fails for any input whose
/// file name it was told to fail on.
#[derive(Default)]
pub(crate) struct FakeConverter {
    calls: Mutex<Vec<PathBuf>>,
    fail: HashSet<String>,
}

impl FakeConverter {
    pub(crate) fn failing<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self { fail: names.into_iter().map(str::to_string).collect(), ..Self::default() }
    }

    pub(crate) fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl Converter for FakeConverter {
    fn convert(&self, input: &Path, output: &Path) -> ConvertResult<()> {
        self.calls.lock().unwrap().push(input.to_path_buf());
        let name = input.file_name().unwrap().to_string_lossy();
        if self.fail.contains(name.as_ref()) {
            exn::bail!(ConvertErrorKind::Failed { code: 1, stderr: "Error: /undefined in %!PS".to_string() });
        }
        std::fs::write(output, PDF).unwrap();
        Ok(())
    }
}
