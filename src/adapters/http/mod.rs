//! HTTP inbound adapter: upload, status, download.

use crate::adapters::redis::RedisPool;
use crate::application::orchestrator::SubmissionService;
use crate::config::{flag_is_true, Settings};
use crate::domain::jobs::{JobData, JobRecord, MergeMode};
use crate::ports::repository::JobRepository;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    BoxError, Json, Router,
};
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs::File, io::BufWriter};
use tokio_util::io::StreamReader;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

pub struct AppState {
    pub submissions: SubmissionService<RedisPool>,
    pub repo: RedisPool,
    pub settings: Arc<Settings>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/upload", post(upload_media))
        .route("/job/:id", get(job_status))
        .route("/download/:name", get(download));

    if state.settings.is_test {
        router = router.route("/", get(root));
    }

    router
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    job_id: String,
    status: &'static str,
}

/// Handler that accepts a multipart form upload: the `file` field streams to
/// the upload directory, the flag fields override env defaults for this job.
async fn upload_media(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut saved: Option<(PathBuf, String)> = None;
    let mut merge_mode = None;
    let mut burn_subtitles = None;
    let mut enhance = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let original = field
                    .file_name()
                    .map(sanitize_filename)
                    .unwrap_or_else(|| String::from("upload.bin"));
                // Timestamp prefix keeps stems unique across submissions
                let stored = format!("{}-{}", now_millis(), original);
                let path = state.settings.upload_dir.join(&stored);
                if !path_is_valid(&path) {
                    return Err((StatusCode::BAD_REQUEST, "Invalid path".to_owned()));
                }
                stream_to_file(&path, field).await?;
                saved = Some((path, original));
            }
            Some("mergeMode") => {
                if let Ok(value) = field.text().await {
                    merge_mode = Some(MergeMode::parse(&value));
                }
            }
            Some("burnSubtitles") => {
                if let Ok(value) = field.text().await {
                    burn_subtitles = Some(flag_is_true(&value));
                }
            }
            Some("enhance") => {
                if let Ok(value) = field.text().await {
                    enhance = Some(flag_is_true(&value));
                }
            }
            _ => {}
        }
    }

    let Some((source_path, original_name)) = saved else {
        return Err((StatusCode::BAD_REQUEST, "missing file field".to_owned()));
    };

    let data = JobData {
        source_path,
        original_name,
        merge_mode,
        burn_subtitles,
        enhance,
    };
    let job_id = state
        .submissions
        .submit(data)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(UploadResponse {
        job_id,
        status: "queued",
    }))
}

async fn job_status(
    State(state): State<Arc<AppState>>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<JobRecord>, StatusCode> {
    match state.repo.get(&id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("job lookup failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Serve an artifact by filename. The name is reduced to its basename so a
/// crafted path cannot escape the upload directory.
async fn download(
    State(state): State<Arc<AppState>>,
    UrlPath(name): UrlPath<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let name = Path::new(&name)
        .file_name()
        .ok_or(StatusCode::NOT_FOUND)?
        .to_owned();
    let path = state.settings.upload_dir.join(name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

// Save a `Stream` to a file
async fn stream_to_file<S, E>(path: &PathBuf, stream: S) -> Result<(), (StatusCode, String)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    async {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        tokio::io::copy(&mut body_reader, &mut file).await?;

        Ok::<_, io::Error>(())
    }
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}

/// Keep only the basename of a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("upload.bin"))
}

fn path_is_valid(path: &PathBuf) -> bool {
    for component in path.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return false;
        }
    }
    true
}

fn now_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

async fn root(State(state): State<Arc<AppState>>) -> Html<String> {
    let files = match std::fs::read_dir(&state.settings.upload_dir) {
        Ok(entries) => entries
            .filter_map(|entry| {
                entry
                    .ok()
                    .and_then(|e| e.file_name().to_str().map(String::from))
            })
            .collect::<Vec<String>>(),
        Err(_) => vec!["Error reading directory".to_string()],
    };

    let file_list = files
        .iter()
        .map(|file| format!("<li><a href=\"/download/{0}\">{0}</a></li>", file))
        .collect::<String>();

    Html(format!(
        r#"
        <!doctype html>
        <html>
            <head>
                <title>Dub something!</title>
            </head>
            <body>
                <h1>Files in upload directory:</h1>
                <ul>{}</ul>
                <form action="/upload" method="post" enctype="multipart/form-data">
                    <div>
                        <label>
                            Upload video:
                            <input type="file" name="file">
                        </label>
                    </div>
                    <div>
                        <label>Merge mode: <input type="text" name="mergeMode" placeholder="replace"></label>
                        <label>Burn subtitles: <input type="text" name="burnSubtitles" placeholder="false"></label>
                        <label>Enhance: <input type="text" name="enhance" placeholder="false"></label>
                    </div>
                    <div>
                        <input type="submit" value="Upload">
                    </div>
                </form>
            </body>
        </html>
        "#,
        file_list
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stream_to_file() {
        // Create a temporary directory for the test
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test_file.txt");

        type E = std::io::Error;

        let test_data = "Hello, world!";
        let mock_stream = stream::iter(vec![Ok::<bytes::Bytes, E>(Bytes::from(test_data))]);

        let result = stream_to_file(&file_path, mock_stream).await;
        assert!(result.is_ok());

        let file_contents = fs::read_to_string(file_path).unwrap();
        assert_eq!(file_contents, test_data);
    }

    #[tokio::test]
    async fn test_stream_to_file_error() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test_file.txt");

        // A stream that fails mid-transfer must surface the error
        let mock_stream = stream::iter(vec![Err("Test error")]);

        let result = stream_to_file(&file_path, mock_stream).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err(),
            (StatusCode::INTERNAL_SERVER_ERROR, "Test error".to_string())
        );
    }

    #[test]
    fn test_valid_path() {
        let valid_path = PathBuf::from("uploads/1700-clip.mp4");
        assert!(path_is_valid(&valid_path));
    }

    #[test]
    fn test_invalid_path_with_parent() {
        let invalid_path = PathBuf::from("../invalid_directory");
        assert!(!path_is_valid(&invalid_path));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("a/b/../c.mp4"), "c.mp4");
    }
}
