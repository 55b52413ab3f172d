//! Streaming content digest.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Read size for digest computation.
const DIGEST_READ_SIZE: usize = 4096;

/// MD5 of `data`, hex-encoded lowercase.
pub fn digest_bytes(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// MD5 of a file, folded over fixed-size sequential reads, hex-encoded
/// lowercase.
pub async fn file_digest(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path).await?;
    let mut context = md5::Context::new();
    let mut buf = [0u8; DIGEST_READ_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }
    Ok(format!("{:x}", context.compute()))
}
