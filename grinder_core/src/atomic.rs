use std::{fs, io::Write, path::Path};

/// Replace `path` with `bytes` so readers see either the old or the new
/// contents, never a torn write. The temp file sits next to the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}
