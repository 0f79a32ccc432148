use std::path::Path;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Read a whole file into memory
pub async fn read_file(path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
    fs::read(path).await
}

/// Create or truncate `path` and write `data`
pub async fn write_data(path: impl AsRef<Path>, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

/// Append `data` to `path`, creating it if needed
pub async fn append_data(path: impl AsRef<Path>, data: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}
