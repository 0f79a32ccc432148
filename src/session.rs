use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::engine::{compress, decompress_with_limit, error::CodecResult};
use crate::metrics::MetricsCollector;
use crate::protocol::{multipart, read_request, ProtocolError, Request, Response, StatusCode};
use crate::router::Router;
use crate::storage::{is_valid_key, ObjectMetadata, Service, StorageEngine};

/// One HTTP exchange: read a request, answer it, close.
pub struct Session<S: StorageEngine, IO> {
    stream: IO,
    storage: Arc<S>,
    router: Arc<Router>,
    metrics: Arc<MetricsCollector>,
    config: Arc<ServerConfig>,
}

impl<S: StorageEngine, IO: AsyncRead + AsyncWrite + Unpin> Session<S, IO> {
    pub fn new(
        stream: IO,
        storage: Arc<S>,
        router: Arc<Router>,
        metrics: Arc<MetricsCollector>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            stream,
            storage,
            router,
            metrics,
            config,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let request = match read_request(&mut self.stream, self.config.max_upload_size).await {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => {
                debug!("Client closed connection without a request");
                return Ok(());
            }
            Err(ProtocolError::Io(e)) => return Err(e.into()),
            Err(e) => {
                warn!("Rejecting request: {}", e);
                self.metrics.record_failure();
                Response::error(e.status(), &e).write_to(&mut self.stream).await?;
                return Ok(());
            }
        };

        info!("{} {}", request.method, request.path);
        let response = self.dispatch(&request).await;
        if response.status != StatusCode::Ok {
            self.metrics.record_failure();
        }

        response.write_to(&mut self.stream).await?;
        debug!("Session ended with {}", response.status.code());
        Ok(())
    }

    async fn dispatch(&self, request: &Request) -> Response {
        match (request.method.as_str(), request.path.as_str()) {
            ("POST", "/upload") => self.handle_upload(request).await,
            ("GET", "/download") => self.handle_download(request).await,
            ("GET", "/metrics") => self.handle_metrics(),
            ("GET", "/health") => Response::ok("OK"),
            ("GET", path) => self.router.render(&self.config.templates_directory, path).await,
            (method, path) => {
                warn!("Unsupported method {} for {}", method, path);
                Response::error(StatusCode::MethodNotAllowed, "Method Not Allowed")
            }
        }
    }

    async fn handle_upload(&self, request: &Request) -> Response {
        let key = match request.query_param("out_file") {
            Some(key) if is_valid_key(key) => key.to_string(),
            Some(key) => {
                warn!("Invalid out_file {:?}", key);
                return Response::error(StatusCode::BadRequest, format!("invalid out_file {:?}", key));
            }
            None => return Response::error(StatusCode::BadRequest, "missing out_file"),
        };

        let service = match request.query_param("service_type").map(str::parse::<Service>) {
            Some(Ok(service)) => service,
            Some(Err(e)) => return Response::error(StatusCode::BadRequest, e),
            None => return Response::error(StatusCode::BadRequest, "missing service_type"),
        };

        let Some(boundary) = request.header("content-type").and_then(multipart::boundary) else {
            return Response::error(StatusCode::BadRequest, "expected a multipart/form-data body");
        };
        let input = match multipart::extract_file(&request.body, boundary) {
            Ok(content) => content.to_vec(),
            Err(e) => {
                warn!("Bad upload body for '{}': {}", key, e);
                return Response::error(e.status(), e);
            }
        };

        let input_size = input.len() as u64;
        info!("Processing upload: key='{}', service={}, size={} bytes", key, service, input_size);

        let max_output = self.config.max_upload_size;
        let (output, ratio) = match tokio::task::spawn_blocking(move || apply(service, &input, max_output)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("{} failed for '{}': {}", service, key, e);
                return Response::error(StatusCode::UnprocessableEntity, e);
            }
            Err(e) => {
                error!("Codec task for '{}' did not finish: {}", key, e);
                return Response::error(StatusCode::InternalServerError, "codec task failed");
            }
        };

        let meta = ObjectMetadata::new(key.clone(), service, input_size, &output);
        if let Err(e) = self.storage.put(&key, &output, &meta).await {
            error!("Storing '{}' failed: {}", key, e);
            return Response::error(StatusCode::InternalServerError, "storage failure");
        }

        self.metrics.record_upload(service, input_size, output.len() as u64, ratio);
        info!("Upload stored: key='{}', {} -> {} bytes", key, input_size, output.len());
        Response::ok("Done")
    }

    async fn handle_download(&self, request: &Request) -> Response {
        let Some(key) = request.query_param("out_file") else {
            return Response::error(StatusCode::BadRequest, "missing out_file");
        };

        let object = match self.storage.get(key).await {
            Ok(Some(object)) => object,
            Ok(None) => {
                warn!("Key not found: {}", key);
                return Response::not_found();
            }
            Err(e) => {
                error!("Reading '{}' failed: {}", key, e);
                return Response::error(StatusCode::InternalServerError, "storage failure");
            }
        };

        if let Some(meta) = &object.metadata {
            if !meta.verify_integrity(&object.data) {
                error!("Integrity check failed for '{}'", key);
                return Response::error(StatusCode::InternalServerError, "stored object is corrupt");
            }
        }

        self.metrics.record_download(object.data.len() as u64);
        info!("Download completed for key: {}", key);
        Response::attachment(key, object.data)
    }

    fn handle_metrics(&self) -> Response {
        match serde_json::to_string_pretty(&self.metrics.get_metrics()) {
            Ok(json) => Response::json(json),
            Err(e) => Response::error(StatusCode::InternalServerError, e),
        }
    }
}

/// Run the requested codec direction; compressions also report their ratio.
/// Decompressed output is capped at `max_output` bytes.
fn apply(service: Service, input: &[u8], max_output: usize) -> CodecResult<(Vec<u8>, Option<f64>)> {
    match service {
        Service::Compress => {
            let artifact = compress(input)?;
            Ok((artifact.to_bytes(), Some(artifact.header.ratio)))
        }
        Service::Decompress => Ok((decompress_with_limit(input, max_output)?, None)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::decompress;
    use crate::storage::local::LocalStorage;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    pub(crate) fn upload_request(out_file: &str, service: &str, content: &[u8]) -> Vec<u8> {
        let mut body = b"--BOUNDARY\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"input.bin\"\r\n\
Content-Type: application/octet-stream\r\n\r\n"
            .to_vec();
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

        let mut request = format!(
            "POST /upload?out_file={}&service_type={} HTTP/1.1\r\n\
Host: localhost\r\n\
Content-Type: multipart/form-data; boundary=BOUNDARY\r\n\
Content-Length: {}\r\n\r\n",
            out_file,
            service,
            body.len()
        )
        .into_bytes();
        request.extend_from_slice(&body);
        request
    }

    /// Status code and body of a raw response
    pub(crate) fn split_response(raw: &[u8]) -> (u16, Vec<u8>) {
        let head_end = crate::protocol::find(raw, b"\r\n\r\n").expect("response head");
        let head = std::str::from_utf8(&raw[..head_end]).expect("utf-8 head");
        let code = head
            .split(' ')
            .nth(1)
            .and_then(|code| code.parse().ok())
            .expect("status code");
        (code, raw[head_end + 4..].to_vec())
    }

    struct Fixture {
        root: PathBuf,
        storage: Arc<LocalStorage>,
        metrics: Arc<MetricsCollector>,
        config: Arc<ServerConfig>,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let root = std::env::temp_dir().join(format!("huffpack-session-{}-{}", name, std::process::id()));
            let config = ServerConfig {
                downloads_directory: root.join("downloads"),
                templates_directory: root.join("templates"),
                max_upload_size: 4096,
                ..ServerConfig::default()
            };
            Self {
                storage: Arc::new(LocalStorage::new(config.downloads_directory.clone())),
                metrics: Arc::new(MetricsCollector::new()),
                config: Arc::new(config),
                root,
            }
        }

        async fn exchange(&self, request: &[u8]) -> (u16, Vec<u8>) {
            let (mut client, server) = tokio::io::duplex(64 * 1024);
            let session = Session::new(
                server,
                Arc::clone(&self.storage),
                Arc::new(Router::with_defaults()),
                Arc::clone(&self.metrics),
                Arc::clone(&self.config),
            );
            let handle = tokio::spawn(session.run());

            client.write_all(request).await.unwrap();
            let mut raw = Vec::new();
            client.read_to_end(&mut raw).await.unwrap();
            handle.await.unwrap().unwrap();

            split_response(&raw)
        }

        async fn cleanup(self) {
            tokio::fs::remove_dir_all(&self.root).await.ok();
        }
    }

    #[tokio::test]
    async fn compress_upload_then_download() {
        let fixture = Fixture::new("compress");

        let (code, body) = fixture
            .exchange(&upload_request("out.huff", "compress", b"abracadabra"))
            .await;
        assert_eq!(code, 200);
        assert_eq!(body, b"Done");

        let (code, body) = fixture.exchange(b"GET /download?out_file=out.huff HTTP/1.1\r\n\r\n").await;
        assert_eq!(code, 200);
        assert_eq!(decompress(&body).unwrap(), b"abracadabra");

        let metrics = fixture.metrics.get_metrics();
        assert_eq!(metrics.total_compressions, 1);
        assert_eq!(metrics.total_downloads, 1);
        fixture.cleanup().await;
    }

    #[tokio::test]
    async fn decompress_upload_restores_original() {
        let fixture = Fixture::new("decompress");
        let artifact = compress(b"hello, huffman").unwrap().to_bytes();

        let (code, _) = fixture
            .exchange(&upload_request("plain.txt", "decompress", &artifact))
            .await;
        assert_eq!(code, 200);

        let stored = tokio::fs::read(fixture.config.downloads_directory.join("plain.txt")).await.unwrap();
        assert_eq!(stored, b"hello, huffman");
        fixture.cleanup().await;
    }

    #[tokio::test]
    async fn rejects_bad_uploads() {
        let fixture = Fixture::new("bad");

        let (code, _) = fixture.exchange(&upload_request("../escape", "compress", b"x")).await;
        assert_eq!(code, 400);

        let (code, _) = fixture.exchange(&upload_request("a.huff", "zip", b"x")).await;
        assert_eq!(code, 400);

        let (code, _) = fixture
            .exchange(&upload_request("a.txt", "decompress", b"not an artifact"))
            .await;
        assert_eq!(code, 422);

        let (code, _) = fixture.exchange(&upload_request("big", "compress", &[b'x'; 8192])).await;
        assert_eq!(code, 413);

        // small artifact that would expand past the upload limit
        let bomb = b"61=\nUncompressed Length: 1000000\nCompressed Length: 0\nCompression Ratio: 0.000000\n";
        let (code, _) = fixture.exchange(&upload_request("bomb.txt", "decompress", bomb)).await;
        assert_eq!(code, 422);
        assert!(!fixture.config.downloads_directory.join("bomb.txt").exists());

        assert_eq!(fixture.metrics.get_metrics().failed_requests, 5);
        fixture.cleanup().await;
    }

    #[tokio::test]
    async fn missing_download_and_routes() {
        let fixture = Fixture::new("routes");

        let (code, _) = fixture.exchange(b"GET /download?out_file=nothing HTTP/1.1\r\n\r\n").await;
        assert_eq!(code, 404);

        let (code, body) = fixture.exchange(b"GET /health HTTP/1.1\r\n\r\n").await;
        assert_eq!((code, body), (200, b"OK".to_vec()));

        let (code, body) = fixture.exchange(b"GET /metrics HTTP/1.1\r\n\r\n").await;
        assert_eq!(code, 200);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total_compressions"], 0);

        let (code, _) = fixture.exchange(b"DELETE /upload HTTP/1.1\r\n\r\n").await;
        assert_eq!(code, 405);

        let (code, _) = fixture.exchange(b"GET /no-such-page HTTP/1.1\r\n\r\n").await;
        assert_eq!(code, 404);
        fixture.cleanup().await;
    }
}
