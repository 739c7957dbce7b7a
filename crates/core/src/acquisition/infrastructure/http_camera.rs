use std::time::Duration;

use reqwest::StatusCode;

use crate::acquisition::domain::camera_source::{CameraSource, FetchError};

/// Snapshot-over-HTTP camera (e.g. IP Webcam's `/shot.jpg`).
///
/// One client is kept for the camera's lifetime so connections are reused.
pub struct HttpCamera {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpCamera {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl CameraSource for HttpCamera {
    fn fetch(&mut self) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let header = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(body);
            }
        });
        format!("http://{addr}/shot.jpg")
    }

    #[test]
    fn test_fetch_returns_body_on_200() {
        let url = serve_once("200 OK", b"jpeg bytes");
        let mut camera = HttpCamera::new(&url, Duration::from_secs(1)).unwrap();
        assert_eq!(camera.fetch().unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_non_200_is_status_error() {
        let url = serve_once("503 Service Unavailable", b"");
        let mut camera = HttpCamera::new(&url, Duration::from_secs(1)).unwrap();
        assert!(matches!(camera.fetch(), Err(FetchError::Status(503))));
    }

    #[test]
    fn test_unreachable_camera_is_request_error() {
        // Bind then drop to get a port nothing listens on.
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let mut camera =
            HttpCamera::new(&format!("http://{addr}/shot.jpg"), Duration::from_millis(200)).unwrap();
        assert!(matches!(camera.fetch(), Err(FetchError::Request(_))));
    }
}
